//! Data URI parsing
//!
//! URI format: `<scheme>:<id>` (e.g. `syn:syn123456`, `osf:z7s4a`).

use crate::{Error, Result};

/// Schemes this build knows how to address.
pub const REGISTERED_SCHEMES: &[&str] = &["syn", "osf"];

/// The scheme used when none is specified.
pub const DEFAULT_SCHEME: &str = "syn";

/// A parsed `scheme:id` remote identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DataUri {
    scheme: String,
    id: String,
}

impl DataUri {
    pub fn new(scheme: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            id: id.into(),
        }
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Render back to the `scheme:id` form.
    pub fn uri(&self) -> String {
        format!("{}:{}", self.scheme, self.id)
    }

    /// Parse a `scheme:id` string.
    ///
    /// Trims surrounding whitespace and strips interior spaces; the scheme
    /// is case-insensitive. Rejects multi-colon and missing-id forms and
    /// unregistered schemes.
    pub fn parse(value: &str) -> Result<DataUri> {
        let cleaned = value.trim().replace(' ', "");

        let invalid = |reason: &str| Error::InvalidDataUri {
            uri: value.to_string(),
            reason: reason.to_string(),
        };

        let mut segments = cleaned.split(':');
        let (scheme, id) = match (segments.next(), segments.next(), segments.next()) {
            (Some(scheme), Some(id), None) => (scheme.to_ascii_lowercase(), id.to_string()),
            _ => return Err(invalid("expected exactly one ':' separator")),
        };

        if scheme.is_empty() {
            return Err(invalid("scheme must be provided"));
        }
        if id.is_empty() {
            return Err(invalid("id must be provided"));
        }
        if !REGISTERED_SCHEMES.contains(&scheme.as_str()) {
            return Err(invalid("unregistered scheme"));
        }

        Ok(DataUri { scheme, id })
    }

    /// Non-raising predicate for URI-shaped values.
    pub fn is_uri(value: &str) -> bool {
        Self::parse(value).is_ok()
    }
}

impl std::fmt::Display for DataUri {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.scheme, self.id)
    }
}
