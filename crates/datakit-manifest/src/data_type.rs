//! Named data-type buckets and path classification
//!
//! A [`DataType`] binds a logical name (e.g. "core") to a directory under
//! the project root. Local paths are classified into data types by
//! longest-prefix match over the project-relative form, so nested roots
//! like `results` and `results/drafts` resolve unambiguously.

use std::path::Path;

use serde::{Deserialize, Serialize};

use datakit_fs::NormalizedPath;

/// A named logical bucket bound to a project-relative directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataType {
    /// Logical bucket name (e.g. "core", "results")
    pub name: String,
    /// Project-root-relative directory, persisted with forward slashes
    pub rel_path: NormalizedPath,
}

impl DataType {
    pub fn new(name: impl Into<String>, rel_path: impl Into<NormalizedPath>) -> Self {
        Self {
            name: name.into(),
            rel_path: rel_path.into(),
        }
    }

    /// Absolute directory for this bucket under `project_root`.
    pub fn abs_path(&self, project_root: &Path) -> std::path::PathBuf {
        self.rel_path.resolve(project_root)
    }
}

/// Classify an absolute path into a data type.
///
/// Selects the data type whose `rel_path` is a segment-wise prefix of the
/// path's project-relative form, preferring the longest matching prefix.
/// Returns `None` for paths outside the project root or outside every
/// bucket.
pub fn classify<'a>(
    data_types: &'a [DataType],
    project_root: &Path,
    path: &Path,
) -> Option<&'a DataType> {
    let rel = project_relative(project_root, path)?;
    classify_rel(data_types, &rel)
}

/// Classify an already project-relative path.
pub fn classify_rel<'a>(
    data_types: &'a [DataType],
    rel: &NormalizedPath,
) -> Option<&'a DataType> {
    data_types
        .iter()
        .filter(|dt| dt.rel_path.is_prefix_of(rel))
        .max_by_key(|dt| dt.rel_path.segment_count())
}

/// True iff the path classifies into a data type and is not itself a
/// bucket root. A bucket root is a container, not a trackable leaf.
pub fn is_data_type_path(data_types: &[DataType], project_root: &Path, path: &Path) -> bool {
    let Some(rel) = project_relative(project_root, path) else {
        return false;
    };
    match classify_rel(data_types, &rel) {
        Some(data_type) => data_type.rel_path != rel,
        None => false,
    }
}

/// The forward-slash project-relative form of `path`, or `None` when the
/// path does not fall under the project root.
pub fn project_relative(project_root: &Path, path: &Path) -> Option<NormalizedPath> {
    path.strip_prefix(project_root)
        .ok()
        .map(NormalizedPath::new)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn fixture() -> (PathBuf, Vec<DataType>) {
        let root = PathBuf::from("/project");
        let data_types = vec![
            DataType::new("core", "data/core"),
            DataType::new("auxiliary", "data/auxiliary"),
            DataType::new("results", "results"),
            DataType::new("drafts", "results/drafts"),
        ];
        (root, data_types)
    }

    #[test]
    fn test_classify_simple() {
        let (root, data_types) = fixture();
        let found = classify(&data_types, &root, Path::new("/project/data/core/f.csv"));
        assert_eq!(found.unwrap().name, "core");
    }

    #[test]
    fn test_classify_longest_prefix_wins() {
        let (root, data_types) = fixture();

        let nested = classify(&data_types, &root, Path::new("/project/results/drafts/x.csv"));
        assert_eq!(nested.unwrap().name, "drafts");

        let shallow = classify(&data_types, &root, Path::new("/project/results/x.csv"));
        assert_eq!(shallow.unwrap().name, "results");
    }

    #[test]
    fn test_classify_outside_buckets() {
        let (root, data_types) = fixture();
        assert!(classify(&data_types, &root, Path::new("/project/scripts/run.sh")).is_none());
        assert!(classify(&data_types, &root, Path::new("/elsewhere/data/core/f.csv")).is_none());
    }

    #[test]
    fn test_bucket_root_is_not_a_data_type_path() {
        let (root, data_types) = fixture();
        assert!(!is_data_type_path(
            &data_types,
            &root,
            Path::new("/project/data/core")
        ));
        assert!(is_data_type_path(
            &data_types,
            &root,
            Path::new("/project/data/core/f.csv")
        ));
    }

    #[test]
    fn test_partial_segment_is_not_a_prefix() {
        let (root, data_types) = fixture();
        assert!(classify(&data_types, &root, Path::new("/project/data/core2/f.csv")).is_none());
    }
}
