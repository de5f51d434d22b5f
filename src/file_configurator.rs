//! Takeover of the host resolv.conf.
//!
//! The first apply backs the original file up next to it. Every apply
//! then merges the desired policy with the configuration found in that
//! backup and rewrites the managed file. A [`Repair`] watcher is stopped
//! around each write and re-armed afterwards, so it never reacts to our
//! own changes.

use crate::backup::BackupFile;
use crate::config::DesiredDnsConfig;
use crate::content;
use crate::error::{ResolvConfError, Result};
use crate::merge::{self, MergedOutput};
use crate::parser::{self, PreexistingConfig};
use crate::repair::{FileWatcher, ReapplyRequest, Repair};
use std::fs::Permissions;
use std::path::{Path, PathBuf};

/// Default system resolver configuration file.
pub const DEFAULT_RESOLV_CONF_PATH: &str = "/etc/resolv.conf";

/// Tool name written into the managed file header.
pub const DEFAULT_TOOL_NAME: &str = "NetBird";

/// Whether the managed file is under our control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagedState {
    /// No backup exists; the file is the host's own.
    Unmanaged,
    /// A backup exists and the file carries our configuration.
    Managed,
}

/// Manages resolv.conf on behalf of the client.
///
/// # Lifecycle
///
/// 1. [`apply_dns_config`](Self::apply_dns_config) backs up and rewrites the file.
/// 2. [`process_repairs`](Self::process_repairs) rewrites it again if another
///    tool changed it.
/// 3. [`restore_host_dns`](Self::restore_host_dns) puts the original back.
///
/// All operations take `&mut self`; callers must not run them concurrently
/// against the same file from different configurators.
///
/// # Example
///
/// ```rust,ignore
/// use resolvconf_manager::{DesiredDnsConfig, DomainEntry, FileConfigurator};
///
/// let mut configurator = FileConfigurator::new();
/// configurator.apply_dns_config(
///     &DesiredDnsConfig::new("100.64.0.1").with_domain(DomainEntry::new("corp.example")),
/// )?;
/// // ...
/// configurator.restore_host_dns()?;
/// ```
pub struct FileConfigurator<R: Repair = FileWatcher> {
    backup: BackupFile,
    repair: R,
    tool_name: String,
    original_perms: Option<Permissions>,
}

impl FileConfigurator<FileWatcher> {
    /// Creates a configurator for `/etc/resolv.conf`.
    #[must_use]
    pub fn new() -> Self {
        Self::with_path(DEFAULT_RESOLV_CONF_PATH)
    }

    /// Creates a configurator for a custom file (useful for testing).
    #[must_use]
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let watcher = FileWatcher::new(path.clone());
        Self::with_repair(path, watcher)
    }
}

impl Default for FileConfigurator<FileWatcher> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Repair> FileConfigurator<R> {
    /// Creates a configurator for `path` using the given watcher.
    #[must_use]
    pub fn with_repair(path: impl Into<PathBuf>, repair: R) -> Self {
        Self {
            backup: BackupFile::for_target(path),
            repair,
            tool_name: DEFAULT_TOOL_NAME.to_string(),
            original_perms: None,
        }
    }

    /// Overrides the tool name in the managed file header.
    #[must_use]
    pub fn with_tool_name(mut self, name: impl Into<String>) -> Self {
        self.tool_name = name.into();
        self
    }

    /// Returns the managed file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.backup.target()
    }

    /// Returns the backup path.
    #[must_use]
    pub fn backup_path(&self) -> &Path {
        self.backup.path()
    }

    /// Returns the watcher.
    #[must_use]
    pub const fn repair(&self) -> &R {
        &self.repair
    }

    /// Returns whether the file is currently managed.
    #[must_use]
    pub fn state(&self) -> ManagedState {
        if self.backup.exists() {
            ManagedState::Managed
        } else {
            ManagedState::Unmanaged
        }
    }

    /// Returns `true` if a backup exists.
    #[must_use]
    pub fn is_managed(&self) -> bool {
        self.state() == ManagedState::Managed
    }

    /// resolv.conf has no port directive, so only port 53 can be used.
    #[must_use]
    pub const fn supports_custom_port(&self) -> bool {
        false
    }

    /// Installs `config` into the managed file.
    ///
    /// A policy that does not route all domains cannot own the file: any
    /// previous takeover is undone and [`ResolvConfError::NoRouteAll`] is
    /// returned.
    ///
    /// # Errors
    ///
    /// - [`ResolvConfError::NoRouteAll`] if `config.route_all` is false.
    /// - [`ResolvConfError::RestoreFailed`] if undoing a takeover failed.
    /// - [`ResolvConfError::Stat`] or [`ResolvConfError::Copy`] if the
    ///   original file cannot be backed up.
    /// - [`ResolvConfError::Write`] if the managed file cannot be written.
    pub fn apply_dns_config(&mut self, config: &DesiredDnsConfig) -> Result<()> {
        let managed = self.is_managed();

        if !config.route_all {
            if managed {
                self.repair.stop();
                self.restore().map_err(|e| ResolvConfError::RestoreFailed {
                    source: Box::new(e),
                })?;
            }
            return Err(ResolvConfError::NoRouteAll);
        }

        if !managed {
            self.original_perms = Some(self.backup.backup()?);
        }

        let request = ReapplyRequest {
            search_domains: config.search_domains(),
            name_server: config.server_ip.clone(),
        };
        self.write_and_watch(request)
    }

    /// Re-applies settings after the watcher reported drift.
    ///
    /// Never creates a backup. Does nothing if the file is no longer managed.
    ///
    /// # Errors
    ///
    /// Returns [`ResolvConfError::Write`] if the managed file cannot be written.
    pub fn reapply(&mut self, request: ReapplyRequest) -> Result<()> {
        if !self.is_managed() {
            tracing::debug!(
                path = %self.path().display(),
                "Resolver file no longer managed, ignoring reapply"
            );
            self.repair.stop();
            return Ok(());
        }
        self.write_and_watch(request)
    }

    /// Handles one pending reapply request from the watcher.
    ///
    /// Returns `true` if a request was handled.
    ///
    /// # Errors
    ///
    /// Returns [`ResolvConfError::Write`] if the managed file cannot be written.
    pub fn process_repairs(&mut self) -> Result<bool> {
        match self.repair.try_recv() {
            Some(request) => self.reapply(request).map(|()| true),
            None => Ok(false),
        }
    }

    /// Stops watching and restores the original file.
    ///
    /// # Errors
    ///
    /// Returns [`ResolvConfError::Copy`] or [`ResolvConfError::Remove`] if
    /// the restore fails.
    pub fn restore_host_dns(&mut self) -> Result<()> {
        self.repair.stop();
        self.restore()
    }

    fn restore(&mut self) -> Result<()> {
        self.backup.restore()?;
        self.original_perms = None;
        Ok(())
    }

    fn write_and_watch(&mut self, request: ReapplyRequest) -> Result<()> {
        let existing = match parser::parse_file(self.backup.path()) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    "Unable to parse backup, ignoring previous configuration"
                );
                PreexistingConfig::default()
            }
        };

        self.repair.stop();

        let merged = self.update_config(&request, &existing)?;

        // Only expect what was written, otherwise skipped domains look like drift.
        let search_domains = request
            .search_domains
            .into_iter()
            .filter(|d| merged.search_domains.contains(d))
            .collect();
        self.repair.watch(ReapplyRequest {
            search_domains,
            name_server: request.name_server,
        });
        Ok(())
    }

    fn update_config(
        &mut self,
        request: &ReapplyRequest,
        existing: &PreexistingConfig,
    ) -> Result<MergedOutput> {
        let merged = merge::merge(&request.search_domains, &request.name_server, existing);
        let buf = content::render(&self.tool_name, self.backup.path(), &merged);

        tracing::debug!(path = %self.path().display(), "Creating managed resolver file");
        if let Err(source) = self.write_file(buf.as_bytes()) {
            let restore_error = match self.restore() {
                Ok(()) => None,
                Err(e) => {
                    tracing::error!(
                        error = %e,
                        "Attempt to restore the original resolver file failed"
                    );
                    Some(Box::new(e))
                }
            };
            return Err(ResolvConfError::Write {
                path: self.path().to_path_buf(),
                source,
                restore_error,
            });
        }

        tracing::info!(
            path = %self.path().display(),
            search_domains = ?merged.search_domains,
            count = merged.search_domains.len(),
            "Created managed resolver file"
        );
        Ok(merged)
    }

    fn write_file(&mut self, buf: &[u8]) -> std::io::Result<()> {
        let perms = self
            .original_perms
            .clone()
            .or_else(|| self.backup.permissions().ok());

        std::fs::write(self.backup.target(), buf)?;
        if let Some(perms) = perms {
            std::fs::set_permissions(self.backup.target(), perms.clone())?;
            self.original_perms = Some(perms);
        }
        Ok(())
    }
}
