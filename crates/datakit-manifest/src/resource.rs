//! Tracked resources
//!
//! A [`Resource`] is a file-or-directory pairing with an identity
//! independent of either location: it may exist only remotely (not yet
//! pulled), only locally (not yet pushed), or both.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use datakit_fs::NormalizedPath;

/// A tracked local/remote file-or-directory pairing.
///
/// `root_id` is a non-owning back-reference to the resource this one was
/// discovered under; it is resolved by lookup in the owning
/// [`Project`](crate::Project), never by traversal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    /// Stable identity, generated at creation.
    pub id: Uuid,
    /// Id of the root resource that discovered this one, if any.
    #[serde(default)]
    pub root_id: Option<Uuid>,
    /// Name of the data type bucket this resource lives in.
    #[serde(default)]
    pub data_type: Option<String>,
    /// `scheme:id` remote identifier; absent until pushed.
    #[serde(default)]
    pub remote_uri: Option<String>,
    /// Project-relative path, forward slashes; absent until pulled.
    #[serde(default)]
    pub rel_path: Option<NormalizedPath>,
    /// Human-friendly label.
    #[serde(default)]
    pub name: Option<String>,
    /// Pinned remote version; `None` tracks the latest.
    #[serde(default)]
    pub version: Option<String>,
}

impl Resource {
    /// Create an empty resource with a fresh id.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            root_id: None,
            data_type: None,
            remote_uri: None,
            rel_path: None,
            name: None,
            version: None,
        }
    }

    pub fn with_root_id(mut self, root_id: Uuid) -> Self {
        self.root_id = Some(root_id);
        self
    }

    pub fn with_data_type(mut self, data_type: impl Into<String>) -> Self {
        self.data_type = Some(data_type.into());
        self
    }

    pub fn with_remote_uri(mut self, remote_uri: impl Into<String>) -> Self {
        self.remote_uri = Some(remote_uri.into());
        self
    }

    pub fn with_rel_path(mut self, rel_path: impl Into<NormalizedPath>) -> Self {
        self.rel_path = Some(rel_path.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_version(mut self, version: impl ToString) -> Self {
        self.set_version(Some(version));
        self
    }

    /// Set or clear the pinned version. Values are string-normalized.
    pub fn set_version(&mut self, version: Option<impl ToString>) {
        self.version = version.map(|v| v.to_string()).filter(|v| !v.is_empty());
    }

    /// Absolute local path under `project_root`, when `rel_path` is set.
    pub fn abs_path(&self, project_root: &Path) -> Option<PathBuf> {
        self.rel_path.as_ref().map(|rel| rel.resolve(project_root))
    }

    /// True for resources with no parent.
    pub fn is_root(&self) -> bool {
        self.root_id.is_none()
    }
}

impl Default for Resource {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_resources_get_unique_ids() {
        assert_ne!(Resource::new().id, Resource::new().id);
    }

    #[test]
    fn test_version_is_string_normalized() {
        let mut resource = Resource::new();
        resource.set_version(Some(3));
        assert_eq!(resource.version.as_deref(), Some("3"));

        resource.set_version(None::<String>);
        assert_eq!(resource.version, None);

        resource.set_version(Some(""));
        assert_eq!(resource.version, None);
    }

    #[test]
    fn test_abs_path_derived_from_rel_path() {
        let resource = Resource::new().with_rel_path("data/core/f.csv");
        let abs = resource.abs_path(Path::new("/project")).unwrap();
        assert_eq!(abs, Path::new("/project").join("data/core/f.csv"));

        assert_eq!(Resource::new().abs_path(Path::new("/project")), None);
    }

    #[test]
    fn test_serialized_shape() {
        let resource = Resource::new()
            .with_data_type("core")
            .with_rel_path(r"data\core\f.csv")
            .with_name("f.csv");

        let json = serde_json::to_value(&resource).unwrap();
        assert_eq!(json["rel_path"], "data/core/f.csv");
        assert_eq!(json["root_id"], serde_json::Value::Null);
        assert_eq!(json["remote_uri"], serde_json::Value::Null);
    }
}
