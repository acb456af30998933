//! Error types for datakit-manifest

use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid data type: {name}. Must be one of: {}", valid.join(", "))]
    InvalidDataType { name: String, valid: Vec<String> },

    #[error("Path {} must be inside one of the data type directories: {}", path.display(), roots.join(", "))]
    NotADataTypePath { path: PathBuf, roots: Vec<String> },

    #[error("Data type {given} does not match {derived} derived from the path")]
    DataTypeMismatch { given: String, derived: String },

    #[error("Invalid data URI {uri}: {reason}")]
    InvalidDataUri { uri: String, reason: String },

    #[error("Resource not found: {value}")]
    ResourceNotFound { value: String },

    #[error("Expected one resource matching {value} but found {count}")]
    AmbiguousResourceMatch { value: String, count: usize },

    #[error("Data type template not found: {name}")]
    TemplateNotFound { name: String },

    #[error("Manifest not found at {}", path.display())]
    ManifestNotFound { path: PathBuf },

    #[error(transparent)]
    Fs(#[from] datakit_fs::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
