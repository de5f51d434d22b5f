//! Backup and restore of the original resolv.conf.
//!
//! The backup lives next to the managed file and keeps its permission
//! bits. Its presence is what marks the managed file as taken over.

use crate::error::{ResolvConfError, Result};
use std::fs::Permissions;
use std::path::{Path, PathBuf};

/// Suffix appended to the managed file's name to form the backup path.
pub const BACKUP_SUFFIX: &str = ".original.netbird";

/// A managed file paired with its backup location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupFile {
    target: PathBuf,
    backup: PathBuf,
}

impl BackupFile {
    /// Pairs `target` with `<target>.original.netbird`.
    #[must_use]
    pub fn for_target(target: impl Into<PathBuf>) -> Self {
        let target = target.into();
        let mut backup = target.clone().into_os_string();
        backup.push(BACKUP_SUFFIX);
        Self {
            target,
            backup: backup.into(),
        }
    }

    /// Returns the managed file path.
    #[must_use]
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Returns the backup file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.backup
    }

    /// Returns `true` if a backup is present on disk.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.backup.exists()
    }

    /// Copies the managed file to the backup path and returns its permissions.
    ///
    /// Callers must only back up a file that is not managed yet, otherwise
    /// the generated content would replace the original.
    ///
    /// # Errors
    ///
    /// Returns [`ResolvConfError::Stat`] if the managed file's metadata
    /// cannot be read, or [`ResolvConfError::Copy`] if the copy fails.
    pub fn backup(&self) -> Result<Permissions> {
        let meta = std::fs::metadata(&self.target).map_err(|source| ResolvConfError::Stat {
            path: self.target.clone(),
            source,
        })?;

        copy_file(&self.target, &self.backup)?;
        tracing::debug!(
            target_path = %self.target.display(),
            backup = %self.backup.display(),
            "Backed up resolver file"
        );
        Ok(meta.permissions())
    }

    /// Copies the backup over the managed file and deletes the backup.
    ///
    /// # Errors
    ///
    /// Returns [`ResolvConfError::Copy`] if the backup cannot be copied back,
    /// or [`ResolvConfError::Remove`] if it cannot be deleted afterwards.
    pub fn restore(&self) -> Result<()> {
        copy_file(&self.backup, &self.target)?;
        std::fs::remove_file(&self.backup).map_err(|source| ResolvConfError::Remove {
            path: self.backup.clone(),
            source,
        })?;
        tracing::info!(
            target_path = %self.target.display(),
            backup = %self.backup.display(),
            "Restored original resolver file"
        );
        Ok(())
    }

    /// Returns the permissions recorded on the backup.
    ///
    /// # Errors
    ///
    /// Returns [`ResolvConfError::Stat`] if the backup's metadata cannot be read.
    pub fn permissions(&self) -> Result<Permissions> {
        std::fs::metadata(&self.backup)
            .map(|m| m.permissions())
            .map_err(|source| ResolvConfError::Stat {
                path: self.backup.clone(),
                source,
            })
    }
}

/// Copies `from` to `to` byte-for-byte, carrying the permission bits over.
fn copy_file(from: &Path, to: &Path) -> Result<()> {
    let copy_err = |source| ResolvConfError::Copy {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source,
    };

    let perms = std::fs::metadata(from).map_err(copy_err)?.permissions();
    let content = std::fs::read(from).map_err(copy_err)?;
    std::fs::write(to, content).map_err(copy_err)?;
    std::fs::set_permissions(to, perms).map_err(copy_err)
}
