//! [`TestProject`] builder for datakit test scenarios.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use datakit_manifest::{InitParams, Project};

/// A temporary project directory with an initialized manifest and helper
/// methods for file setup and assertion.
///
/// # Example
///
/// ```rust,no_run
/// use datakit_test_utils::TestProject;
///
/// let test = TestProject::new();
/// test.write_file("data/core/f.csv", "a,b\n1,2\n");
/// test.assert_file_exists("data/core/f.csv");
/// ```
pub struct TestProject {
    temp_dir: TempDir,
    project: Project,
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}

impl TestProject {
    /// Initialize a manifest in a fresh temporary directory using the
    /// default data type template.
    pub fn new() -> Self {
        Self::with_params(InitParams {
            title: Some("test-project".to_string()),
            ..Default::default()
        })
    }

    /// Initialize with a remote project URI set, as pushes require one.
    pub fn with_project_uri(uri: &str) -> Self {
        Self::with_params(InitParams {
            title: Some("test-project".to_string()),
            project_uri: Some(uri.to_string()),
            ..Default::default()
        })
    }

    pub fn with_params(params: InitParams) -> Self {
        let temp_dir = TempDir::new().unwrap();
        let project = Project::init(temp_dir.path(), params)
            .expect("TestProject: failed to initialize manifest");
        Self { temp_dir, project }
    }

    /// The canonicalized project root.
    pub fn root(&self) -> &Path {
        self.project.root()
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn project_mut(&mut self) -> &mut Project {
        &mut self.project
    }

    /// Consume the fixture, keeping the temporary directory alive through
    /// the returned guard.
    pub fn into_parts(self) -> (TempDir, Project) {
        (self.temp_dir, self.project)
    }

    /// Write `content` to `rel_path` below the root, creating parent
    /// directories. Returns the absolute path.
    pub fn write_file(&self, rel_path: &str, content: &str) -> PathBuf {
        let full_path = self.root().join(rel_path);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&full_path, content).unwrap();
        full_path
    }

    /// Create a directory at `rel_path` below the root. Returns the
    /// absolute path.
    pub fn create_dir(&self, rel_path: &str) -> PathBuf {
        let full_path = self.root().join(rel_path);
        fs::create_dir_all(&full_path).unwrap();
        full_path
    }

    /// Assert that `rel_path` exists below the root.
    ///
    /// # Panics
    /// Panics with a descriptive message if the path does not exist.
    pub fn assert_file_exists(&self, rel_path: &str) {
        let full_path = self.root().join(rel_path);
        assert!(
            full_path.exists(),
            "Expected file to exist: {}",
            full_path.display()
        );
    }

    /// Assert that `rel_path` does **not** exist below the root.
    ///
    /// # Panics
    /// Panics with a descriptive message if the path exists.
    pub fn assert_file_not_exists(&self, rel_path: &str) {
        let full_path = self.root().join(rel_path);
        assert!(
            !full_path.exists(),
            "Expected file NOT to exist: {}",
            full_path.display()
        );
    }

    /// Assert that the file at `rel_path` contains `content`.
    ///
    /// # Panics
    /// Panics if the file cannot be read or does not contain `content`.
    pub fn assert_file_contains(&self, rel_path: &str, content: &str) {
        let full_path = self.root().join(rel_path);
        let file_content = fs::read_to_string(&full_path)
            .unwrap_or_else(|_| panic!("Could not read file: {}", full_path.display()));
        assert!(
            file_content.contains(content),
            "Expected {} to contain {:?}, got:\n{}",
            full_path.display(),
            content,
            file_content
        );
    }

    /// Read the persisted manifest document as a string.
    pub fn manifest_text(&self) -> String {
        fs::read_to_string(Project::manifest_path(self.root())).unwrap()
    }
}
