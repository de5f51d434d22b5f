//! # resolvconf-manager
//!
//! Take over the host's `/etc/resolv.conf` on behalf of a VPN client.
//!
//! The client hands over a [`DesiredDnsConfig`]: a nameserver and a list
//! of search domains. [`FileConfigurator`] backs the original file up to
//! `/etc/resolv.conf.original.netbird`, merges the desired values with
//! whatever the original file configured, and writes the result. The
//! original can be put back at any time, byte-for-byte.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use resolvconf_manager::{DesiredDnsConfig, DomainEntry, FileConfigurator};
//!
//! let mut configurator = FileConfigurator::new();
//!
//! // Take over resolv.conf (requires root).
//! configurator.apply_dns_config(
//!     &DesiredDnsConfig::new("100.64.0.1").with_domain(DomainEntry::new("corp.example")),
//! )?;
//!
//! // Periodically re-apply if another tool rewrote the file.
//! configurator.process_repairs()?;
//!
//! // Put the original back on shutdown.
//! configurator.restore_host_dns()?;
//! ```
//!
//! ## Merge rules
//!
//! - The desired nameserver is always first; previous nameservers follow.
//! - Desired search domains come before previous ones, duplicates are
//!   dropped, and the list is capped at 6 entries and a 256-character
//!   `search` line.
//! - Every other directive of the original file is kept verbatim.
//!
//! ## Drift repair
//!
//! After each write a [`FileWatcher`] polls the file. When the applied
//! nameserver or search domains disappear it queues a [`ReapplyRequest`],
//! which [`FileConfigurator::process_repairs`] picks up. The watcher is
//! stopped around every write so it never sees our own changes.
//!
//! ## Crash recovery
//!
//! The backup file outlives the process. Its presence alone marks the
//! file as managed, so a restarted client keeps merging against the true
//! original instead of backing up generated content.

#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod backup;
pub mod config;
pub mod content;
pub mod error;
pub mod file_configurator;
pub mod merge;
pub mod parser;
pub mod repair;

pub use backup::BackupFile;
pub use config::{DesiredDnsConfig, DomainEntry};
pub use error::{ResolvConfError, Result};
pub use file_configurator::{FileConfigurator, ManagedState};
pub use merge::{MergedOutput, SkipReason, SkippedDomain};
pub use parser::PreexistingConfig;
pub use repair::{FileWatcher, ReapplyRequest, Repair};
