//! Detection of external changes to the managed file.
//!
//! Other tools (DHCP clients, network managers) may rewrite resolv.conf
//! behind our back. A [`Repair`] watches the file after each write and
//! hands back a [`ReapplyRequest`] when the applied settings are gone.
//! The configurator always stops the watcher before its own writes.

use crate::parser;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::JoinHandle;
use std::time::Duration;

/// Default delay between two checks of the managed file.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Settings the watcher re-applies after drift.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReapplyRequest {
    /// Search domains of the desired policy.
    pub search_domains: Vec<String>,
    /// Nameserver of the desired policy.
    pub name_server: String,
}

/// Watches the managed file for external modification.
pub trait Repair {
    /// Starts watching; `request` is handed back if the file drifts.
    /// Replaces any previous watch.
    fn watch(&mut self, request: ReapplyRequest);

    /// Stops watching.
    ///
    /// Must return only once watching has ceased; afterwards
    /// [`try_recv`](Self::try_recv) yields nothing until the next
    /// [`watch`](Self::watch).
    fn stop(&mut self);

    /// Returns a pending reapply request, if drift was detected.
    fn try_recv(&mut self) -> Option<ReapplyRequest>;
}

/// Returns `true` if `content` no longer carries the applied settings.
///
/// The applied nameserver must be the first one and every applied search
/// domain must still be listed.
#[must_use]
pub fn is_params_missing(search_domains: &[String], name_server: &str, content: &str) -> bool {
    let current = parser::parse(content);
    match current.name_servers.first() {
        Some(first) if first == name_server => {}
        _ => return true,
    }
    !search_domains
        .iter()
        .all(|d| current.search_domains.contains(d))
}

/// Polling [`Repair`] backed by a background thread.
///
/// The worker checks the file every interval. On drift it sends a single
/// request and exits; the next [`watch`](Repair::watch) arms a new one.
pub struct FileWatcher {
    path: PathBuf,
    interval: Duration,
    worker: Option<Worker>,
    tx: Sender<ReapplyRequest>,
    rx: Receiver<ReapplyRequest>,
}

struct Worker {
    stop_tx: Sender<()>,
    handle: JoinHandle<()>,
}

impl FileWatcher {
    /// Creates a watcher for `path` with [`DEFAULT_POLL_INTERVAL`].
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            path: path.into(),
            interval: DEFAULT_POLL_INTERVAL,
            worker: None,
            tx,
            rx,
        }
    }

    /// Overrides the poll interval.
    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Returns `true` while a worker is armed.
    #[must_use]
    pub const fn is_watching(&self) -> bool {
        self.worker.is_some()
    }
}

impl Repair for FileWatcher {
    fn watch(&mut self, request: ReapplyRequest) {
        self.stop();

        let (stop_tx, stop_rx) = mpsc::channel();
        let path = self.path.clone();
        let interval = self.interval;
        let tx = self.tx.clone();

        let handle = std::thread::spawn(move || {
            loop {
                match stop_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {}
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => return,
                }

                let content = match std::fs::read_to_string(&path) {
                    Ok(c) => c,
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
                    Err(e) => {
                        tracing::debug!(
                            path = %path.display(),
                            error = %e,
                            "Unable to read resolver file, retrying"
                        );
                        continue;
                    }
                };

                if is_params_missing(&request.search_domains, &request.name_server, &content) {
                    tracing::warn!(
                        path = %path.display(),
                        "Resolver file changed externally, requesting reapply"
                    );
                    let _ = tx.send(request);
                    return;
                }
            }
        });

        tracing::debug!(path = %self.path.display(), "Watching resolver file");
        self.worker = Some(Worker { stop_tx, handle });
    }

    fn stop(&mut self) {
        if let Some(worker) = self.worker.take() {
            let _ = worker.stop_tx.send(());
            if worker.handle.join().is_err() {
                tracing::warn!(path = %self.path.display(), "Resolver file watcher panicked");
            }
            tracing::debug!(path = %self.path.display(), "Stopped watching resolver file");
        }
        // Requests from the stopped worker are stale.
        while self.rx.try_recv().is_ok() {}
    }

    fn try_recv(&mut self) -> Option<ReapplyRequest> {
        self.rx.try_recv().ok()
    }
}

impl Drop for FileWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}
