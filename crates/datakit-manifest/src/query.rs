//! Typed resource queries
//!
//! Replaces attribute-name lookups with a filter builder enumerating the
//! legal fields, combined with an explicit AND/OR operator. Unknown fields
//! are unrepresentable.

use std::path::{Path, PathBuf};

use uuid::Uuid;

use datakit_fs::NormalizedPath;

use crate::resource::Resource;

/// How multiple filters combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Operator {
    /// Every set filter must match.
    #[default]
    And,
    /// At least one set filter must match.
    Or,
}

/// A filter over the queryable resource fields.
///
/// A query with no filters matches every resource regardless of operator.
/// The `data_type` filter compares by data type name.
#[derive(Debug, Clone, Default)]
pub struct ResourceQuery {
    operator: Operator,
    id: Option<Uuid>,
    root_id: Option<Uuid>,
    data_type: Option<String>,
    remote_uri: Option<String>,
    rel_path: Option<NormalizedPath>,
    abs_path: Option<PathBuf>,
    name: Option<String>,
    version: Option<String>,
}

impl ResourceQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn operator(mut self, operator: Operator) -> Self {
        self.operator = operator;
        self
    }

    pub fn id(mut self, id: Uuid) -> Self {
        self.id = Some(id);
        self
    }

    pub fn root_id(mut self, root_id: Uuid) -> Self {
        self.root_id = Some(root_id);
        self
    }

    pub fn data_type(mut self, name: impl Into<String>) -> Self {
        self.data_type = Some(name.into());
        self
    }

    pub fn remote_uri(mut self, uri: impl Into<String>) -> Self {
        self.remote_uri = Some(uri.into());
        self
    }

    pub fn rel_path(mut self, rel_path: impl Into<NormalizedPath>) -> Self {
        self.rel_path = Some(rel_path.into());
        self
    }

    pub fn abs_path(mut self, abs_path: impl Into<PathBuf>) -> Self {
        self.abs_path = Some(abs_path.into());
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Evaluate the query against one resource.
    ///
    /// `project_root` anchors the `abs_path` comparison.
    pub fn matches(&self, resource: &Resource, project_root: &Path) -> bool {
        let mut results = Vec::new();

        if let Some(id) = &self.id {
            results.push(resource.id == *id);
        }
        if let Some(root_id) = &self.root_id {
            results.push(resource.root_id.as_ref() == Some(root_id));
        }
        if let Some(data_type) = &self.data_type {
            results.push(resource.data_type.as_deref() == Some(data_type.as_str()));
        }
        if let Some(remote_uri) = &self.remote_uri {
            results.push(resource.remote_uri.as_deref() == Some(remote_uri.as_str()));
        }
        if let Some(rel_path) = &self.rel_path {
            results.push(resource.rel_path.as_ref() == Some(rel_path));
        }
        if let Some(abs_path) = &self.abs_path {
            results.push(resource.abs_path(project_root).as_deref() == Some(abs_path.as_path()));
        }
        if let Some(name) = &self.name {
            results.push(resource.name.as_deref() == Some(name.as_str()));
        }
        if let Some(version) = &self.version {
            results.push(resource.version.as_deref() == Some(version.as_str()));
        }

        if results.is_empty() {
            return true;
        }

        match self.operator {
            Operator::And => results.iter().all(|m| *m),
            Operator::Or => results.iter().any(|m| *m),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Resource {
        Resource::new()
            .with_data_type("core")
            .with_rel_path("data/core/f.csv")
            .with_remote_uri("syn:syn123")
            .with_name("f.csv")
    }

    #[test]
    fn test_empty_query_matches_all() {
        let resource = sample();
        let root = Path::new("/project");
        assert!(ResourceQuery::new().matches(&resource, root));
        assert!(
            ResourceQuery::new()
                .operator(Operator::Or)
                .matches(&resource, root)
        );
    }

    #[test]
    fn test_and_requires_every_filter() {
        let resource = sample();
        let root = Path::new("/project");

        let query = ResourceQuery::new().data_type("core").name("f.csv");
        assert!(query.matches(&resource, root));

        let query = ResourceQuery::new().data_type("core").name("other.csv");
        assert!(!query.matches(&resource, root));
    }

    #[test]
    fn test_or_requires_any_filter() {
        let resource = sample();
        let root = Path::new("/project");

        let query = ResourceQuery::new()
            .operator(Operator::Or)
            .remote_uri("syn:other")
            .name("f.csv");
        assert!(query.matches(&resource, root));

        let query = ResourceQuery::new()
            .operator(Operator::Or)
            .remote_uri("syn:other")
            .name("other.csv");
        assert!(!query.matches(&resource, root));
    }

    #[test]
    fn test_abs_path_filter_anchored_at_root() {
        let resource = sample();
        let root = Path::new("/project");

        let query = ResourceQuery::new().abs_path(root.join("data/core/f.csv"));
        assert!(query.matches(&resource, root));
        assert!(!query.matches(&resource, Path::new("/other")));
    }
}
