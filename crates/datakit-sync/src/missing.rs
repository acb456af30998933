//! Untracked local file detection
//!
//! Walks the data type directories breadth-first and reports every entry
//! that no manifest resource claims, honoring the manifest's glob ignore
//! patterns.

use std::collections::{HashSet, VecDeque};
use std::fs;
use std::path::PathBuf;

use datakit_manifest::Project;

use crate::Result;

/// Local entries under the data type directories that no resource tracks.
///
/// Directories are descended into even when tracked, since new files can
/// appear inside an already-tracked folder. Missing data type directories
/// are skipped without error. The result is sorted for stable output.
pub fn find_missing_resources(project: &Project) -> Result<Vec<PathBuf>> {
    let tracked: HashSet<PathBuf> = project
        .resources
        .iter()
        .filter_map(|r| r.abs_path(project.root()))
        .collect();

    let mut queue: VecDeque<PathBuf> = project
        .data_types
        .iter()
        .map(|dt| dt.abs_path(project.root()))
        .filter(|p| p.is_dir())
        .collect();

    let mut missing = Vec::new();
    while let Some(dir) = queue.pop_front() {
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if project.is_ignored(&path) {
                tracing::debug!(path = %path.display(), "Ignoring local entry");
                continue;
            }
            if !tracked.contains(&path) {
                missing.push(path.clone());
            }
            if path.is_dir() {
                queue.push_back(path);
            }
        }
    }

    missing.sort();
    Ok(missing)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::fs;

    use datakit_manifest::{InitParams, Resource};
    use tempfile::TempDir;

    fn init_project(tmp: &TempDir) -> Project {
        Project::init(
            tmp.path(),
            InitParams {
                title: Some("scan-test".to_string()),
                ..Default::default()
            },
        )
        .unwrap()
    }

    #[test]
    fn test_untracked_files_reported() {
        let tmp = TempDir::new().unwrap();
        let mut project = init_project(&tmp);

        let core = project.root().join("data").join("core");
        fs::write(core.join("tracked.csv"), "a,b\n").unwrap();
        fs::write(core.join("stray.csv"), "c,d\n").unwrap();

        project.add_resource(
            Resource::new()
                .with_data_type("core")
                .with_rel_path("data/core/tracked.csv")
                .with_name("tracked.csv"),
        );

        let missing = find_missing_resources(&project).unwrap();
        assert_eq!(missing, vec![core.join("stray.csv")]);
    }

    #[test]
    fn test_descends_into_tracked_directories() {
        let tmp = TempDir::new().unwrap();
        let mut project = init_project(&tmp);

        let folder = project.root().join("data").join("core").join("batch");
        fs::create_dir_all(&folder).unwrap();
        fs::write(folder.join("new.csv"), "x\n").unwrap();

        project.add_resource(
            Resource::new()
                .with_data_type("core")
                .with_rel_path("data/core/batch")
                .with_name("batch"),
        );

        let missing = find_missing_resources(&project).unwrap();
        assert_eq!(missing, vec![folder.join("new.csv")]);
    }

    #[test]
    fn test_ignore_patterns_honored() {
        let tmp = TempDir::new().unwrap();
        let mut project = init_project(&tmp);
        project.add_data_ignore("*.log");

        let core = project.root().join("data").join("core");
        fs::write(core.join("run.log"), "noise\n").unwrap();
        fs::write(core.join("keep.csv"), "a\n").unwrap();

        let missing = find_missing_resources(&project).unwrap();
        assert_eq!(missing, vec![core.join("keep.csv")]);
    }

    #[test]
    fn test_clean_project_has_no_missing_resources() {
        let tmp = TempDir::new().unwrap();
        let project = init_project(&tmp);
        assert!(find_missing_resources(&project).unwrap().is_empty());
    }
}
