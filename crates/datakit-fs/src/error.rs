//! Error types for datakit-fs

use std::path::PathBuf;

/// Result type for datakit-fs operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in datakit-fs operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Lock acquisition failed for {}", path.display())]
    LockFailed { path: PathBuf },

    #[error("Home directory could not be determined")]
    HomeDirUnavailable,

    #[error("Path {} is not inside {}", path.display(), start.display())]
    NotRelative { path: PathBuf, start: PathBuf },

    #[error("Cannot delete {}: only files and directories can be deleted", path.display())]
    NotDeletable { path: PathBuf },
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
