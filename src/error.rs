//! Error types.

use std::path::PathBuf;
use thiserror::Error;

/// Result alias for resolv.conf operations.
pub type Result<T> = std::result::Result<T, ResolvConfError>;

/// Errors returned by resolv.conf management.
#[derive(Debug, Error)]
pub enum ResolvConfError {
    /// The metadata of a file could not be read.
    #[error("unable to stat {}: {source}", .path.display())]
    Stat {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A file could not be read.
    #[error("unable to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A backup could be read but its content is unusable.
    #[error("unable to parse {}: {reason}", .path.display())]
    Parse { path: PathBuf, reason: String },

    /// Writing the managed file failed.
    ///
    /// `restore_error` is set when the automatic restore that follows a
    /// failed write also failed. The write error stays the primary cause.
    #[error("unable to write resolver file {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
        restore_error: Option<Box<ResolvConfError>>,
    },

    /// Copying between the managed file and its backup failed.
    #[error("unable to copy {} to {}: {source}", .from.display(), .to.display())]
    Copy {
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
    },

    /// The backup was restored but could not be deleted.
    #[error("unable to remove backup {}: {source}", .path.display())]
    Remove {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The policy does not route all domains, so the file cannot be taken over.
    #[error(
        "unable to configure DNS using the file manager without a nameserver group with all domains configured"
    )]
    NoRouteAll,

    /// The policy could not be honoured and restoring the original file failed too.
    #[error("unable to configure DNS without a primary nameserver group, restoring the original file failed: {source}")]
    RestoreFailed { source: Box<ResolvConfError> },
}

impl ResolvConfError {
    /// Returns `true` if the underlying I/O error is `PermissionDenied`.
    #[must_use]
    pub fn is_permission_denied(&self) -> bool {
        self.io_error()
            .is_some_and(|e| e.kind() == std::io::ErrorKind::PermissionDenied)
    }

    /// Returns the restore failure attached to a failed write, if any.
    #[must_use]
    pub fn restore_error(&self) -> Option<&Self> {
        match self {
            Self::Write { restore_error, .. } => restore_error.as_deref(),
            Self::RestoreFailed { source } => Some(&**source),
            _ => None,
        }
    }

    fn io_error(&self) -> Option<&std::io::Error> {
        match self {
            Self::Stat { source, .. }
            | Self::Read { source, .. }
            | Self::Write { source, .. }
            | Self::Copy { source, .. }
            | Self::Remove { source, .. } => Some(source),
            Self::RestoreFailed { source } => source.io_error(),
            Self::Parse { .. } | Self::NoRouteAll => None,
        }
    }
}
