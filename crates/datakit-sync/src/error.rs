//! Error types for datakit-sync

use std::path::PathBuf;

/// Result type for datakit-sync operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in datakit-sync operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Specify a remote URI or an existing local file or folder: {value}")]
    NotUriOrLocalPath { value: String },

    #[error("Could not determine a local path for {uri}: {reason}")]
    CannotPlaceResource { uri: String, reason: String },

    #[error("URI {uri} does not match the adapter scheme {adapter_scheme}")]
    UnsupportedScheme { uri: String, adapter_scheme: String },

    #[error("Project has no remote project URI; cannot push")]
    MissingProjectUri,

    #[error("Remote name {name} is already taken by another entity: {entity_id}")]
    RemoteNameTaken { name: String, entity_id: String },

    #[error("Remote entity not found: {id}")]
    RemoteEntityNotFound { id: String },

    #[error("Local path does not exist: {}", path.display())]
    LocalPathMissing { path: PathBuf },

    /// Adapter-originated failure; propagated untranslated.
    #[error("Remote adapter error: {message}")]
    Adapter { message: String },

    #[error(transparent)]
    Manifest(#[from] datakit_manifest::Error),

    #[error(transparent)]
    Fs(#[from] datakit_fs::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn adapter(message: impl Into<String>) -> Self {
        Self::Adapter {
            message: message.into(),
        }
    }
}
