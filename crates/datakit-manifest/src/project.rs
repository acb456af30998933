//! The persisted project manifest
//!
//! A [`Project`] owns the full resource collection, the data type set and
//! the ignore patterns for one project root, and persists itself as a JSON
//! document (`datakit.json`) at that root. Every mutating operation is
//! followed by a full re-serialization; resources are sorted
//! deterministically before each save to keep document diffs stable.

use std::path::{Path, PathBuf};

use glob::Pattern;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use datakit_fs::{NormalizedPath, SysPath, io};

use crate::data_type::{self, DataType};
use crate::query::ResourceQuery;
use crate::resource::Resource;
use crate::uri::DataUri;
use crate::{Error, Result, template};

/// File name of the manifest document, one per project root.
pub const MANIFEST_FILENAME: &str = "datakit.json";

/// Parameters for creating a new manifest.
#[derive(Debug, Clone, Default)]
pub struct InitParams {
    pub title: Option<String>,
    pub description: Option<String>,
    pub project_uri: Option<String>,
    /// Name of a registered data type template; the default template when
    /// unset.
    pub template: Option<String>,
}

/// On-disk shape of the manifest document.
#[derive(Debug, Serialize, Deserialize)]
struct Document {
    title: Option<String>,
    description: Option<String>,
    project_uri: Option<String>,
    #[serde(default)]
    data_ignores: Vec<String>,
    #[serde(default)]
    data_types: Vec<DataType>,
    #[serde(default)]
    resources: Vec<Resource>,
}

/// The persisted registry of a project's data types, ignore patterns and
/// resources.
#[derive(Debug, Clone, PartialEq)]
pub struct Project {
    root: PathBuf,
    pub title: Option<String>,
    pub description: Option<String>,
    pub project_uri: Option<String>,
    pub data_ignores: Vec<String>,
    pub data_types: Vec<DataType>,
    pub resources: Vec<Resource>,
}

impl Project {
    /// Path of the manifest document under `root`.
    pub fn manifest_path(root: &Path) -> PathBuf {
        root.join(MANIFEST_FILENAME)
    }

    /// Load an existing manifest from `root`.
    pub fn load(root: impl AsRef<Path>) -> Result<Self> {
        let root = SysPath::new(root.as_ref())?.abs_path().to_path_buf();
        let path = Self::manifest_path(&root);
        if !path.is_file() {
            return Err(Error::ManifestNotFound { path });
        }

        let document: Document = serde_json::from_str(&io::read_text(&path)?)?;
        tracing::debug!(path = %path.display(), resources = document.resources.len(), "Loaded manifest");

        Ok(Self {
            root,
            title: document.title,
            description: document.description,
            project_uri: document.project_uri,
            data_ignores: document.data_ignores,
            data_types: document.data_types,
            resources: document.resources,
        })
    }

    /// Create a new manifest at `root` and persist it immediately.
    ///
    /// Data types come from the named template (the default template when
    /// unnamed); their directories are scaffolded on disk. Ignore patterns
    /// are seeded from the built-in OS defaults.
    pub fn init(root: impl AsRef<Path>, params: InitParams) -> Result<Self> {
        let root_sys = SysPath::new(root.as_ref())?;
        root_sys.ensure_dirs()?;
        // Re-resolve so a root created just now is canonicalized the same
        // way `load` will canonicalize it later.
        let root = SysPath::new(root_sys.abs_path())?.abs_path().to_path_buf();

        let template = match &params.template {
            Some(name) => template::get(name)?,
            None => template::default(),
        };

        let mut project = Self {
            root,
            title: params.title,
            description: params.description,
            project_uri: params.project_uri,
            data_ignores: default_ignores(),
            data_types: template.data_types(),
            resources: Vec::new(),
        };

        project.scaffold_data_type_dirs()?;
        project.save()?;
        Ok(project)
    }

    /// Load the manifest when present, otherwise initialize a new one.
    pub fn load_or_init(root: impl AsRef<Path>, params: InitParams) -> Result<Self> {
        match Self::load(root.as_ref()) {
            Ok(project) => Ok(project),
            Err(Error::ManifestNotFound { .. }) => Self::init(root, params),
            Err(e) => Err(e),
        }
    }

    /// Serialize and atomically write the manifest document.
    pub fn save(&mut self) -> Result<()> {
        self.sort_resources();
        let document = Document {
            title: self.title.clone(),
            description: self.description.clone(),
            project_uri: self.project_uri.clone(),
            data_ignores: self.data_ignores.clone(),
            data_types: self.data_types.clone(),
            resources: self.resources.clone(),
        };

        let mut content = serde_json::to_vec_pretty(&document)?;
        content.push(b'\n');
        io::write_atomic(&Self::manifest_path(&self.root), &content)?;
        tracing::debug!(resources = self.resources.len(), "Saved manifest");
        Ok(())
    }

    /// The project root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    // ----- data types -------------------------------------------------

    /// Look a data type up by name.
    pub fn data_type(&self, name: &str) -> Option<&DataType> {
        self.data_types.iter().find(|dt| dt.name == name)
    }

    /// Look a data type up by name, failing with the valid names listed.
    pub fn require_data_type(&self, name: &str) -> Result<&DataType> {
        self.data_type(name).ok_or_else(|| Error::InvalidDataType {
            name: name.to_string(),
            valid: self.data_types.iter().map(|dt| dt.name.clone()).collect(),
        })
    }

    /// Classify an absolute path into this project's data types.
    pub fn classify(&self, path: &Path) -> Option<&DataType> {
        data_type::classify(&self.data_types, &self.root, path)
    }

    /// True iff `path` is strictly inside a data type directory.
    pub fn is_data_type_path(&self, path: &Path) -> bool {
        data_type::is_data_type_path(&self.data_types, &self.root, path)
    }

    /// The forward-slash project-relative form of an absolute path.
    pub fn project_relative(&self, path: &Path) -> Option<NormalizedPath> {
        data_type::project_relative(&self.root, path)
    }

    // ----- resource lookup --------------------------------------------

    /// All resources matching the query.
    pub fn find_resources(&self, query: &ResourceQuery) -> Vec<&Resource> {
        self.resources
            .iter()
            .filter(|r| query.matches(r, &self.root))
            .collect()
    }

    /// The single resource matching the query, or `None`.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::AmbiguousResourceMatch`] when more than one
    /// resource matches.
    pub fn find_resource(&self, query: &ResourceQuery) -> Result<Option<&Resource>> {
        let matches = self.find_resources(query);
        match matches.len() {
            0 => Ok(None),
            1 => Ok(Some(matches[0])),
            count => Err(Error::AmbiguousResourceMatch {
                value: format!("{query:?}"),
                count,
            }),
        }
    }

    /// Look a resource up by id.
    pub fn resource(&self, id: Uuid) -> Option<&Resource> {
        self.resources.iter().find(|r| r.id == id)
    }

    /// Mutable lookup by id.
    pub fn resource_mut(&mut self, id: Uuid) -> Option<&mut Resource> {
        self.resources.iter_mut().find(|r| r.id == id)
    }

    /// Disambiguate a caller-supplied value into a resource.
    ///
    /// Precedence, stopping at the first applicable rule: a syntactically
    /// valid data URI is matched by `remote_uri`; a UUID-shaped value by
    /// `id`; a value resolving to an existing local path by absolute path;
    /// anything else by `name`.
    pub fn resolve_identifier(&self, value: &str) -> Result<&Resource> {
        let not_found = || Error::ResourceNotFound {
            value: value.to_string(),
        };

        if DataUri::is_uri(value) {
            let uri = DataUri::parse(value)?.uri();
            return self
                .find_resource(&ResourceQuery::new().remote_uri(uri))?
                .ok_or_else(not_found);
        }

        if let Ok(id) = Uuid::parse_str(value) {
            return self.resource(id).ok_or_else(not_found);
        }

        if let Ok(sys) = SysPath::with_base(value, &self.root)
            && sys.exists()
        {
            return self
                .find_resource(&ResourceQuery::new().abs_path(sys.abs_path()))?
                .ok_or_else(not_found);
        }

        self.find_resource(&ResourceQuery::new().name(value))?
            .ok_or_else(not_found)
    }

    // ----- mutation ---------------------------------------------------

    /// Add a resource to the collection. The caller persists.
    pub fn add_resource(&mut self, resource: Resource) -> Uuid {
        let id = resource.id;
        self.resources.push(resource);
        id
    }

    /// Remove a resource and every resource rooted at it.
    ///
    /// Manifest-only: neither local files nor remote objects are touched.
    /// Returns the removed resources, children first.
    pub fn remove_resource(&mut self, id: Uuid) -> Vec<Resource> {
        let mut removed = Vec::new();

        let child_ids: Vec<Uuid> = self
            .resources
            .iter()
            .filter(|r| r.root_id == Some(id))
            .map(|r| r.id)
            .collect();
        for child_id in child_ids {
            if let Some(pos) = self.resources.iter().position(|r| r.id == child_id) {
                removed.push(self.resources.remove(pos));
            }
        }

        if let Some(pos) = self.resources.iter().position(|r| r.id == id) {
            removed.push(self.resources.remove(pos));
        }

        removed
    }

    // ----- ignore patterns --------------------------------------------

    /// Add an ignore pattern if not already present.
    pub fn add_data_ignore(&mut self, pattern: impl Into<String>) {
        let pattern = pattern.into();
        if !self.data_ignores.contains(&pattern) {
            self.data_ignores.push(pattern);
        }
    }

    /// Remove an ignore pattern. Returns whether it was present.
    pub fn remove_data_ignore(&mut self, pattern: &str) -> bool {
        let before = self.data_ignores.len();
        self.data_ignores.retain(|p| p != pattern);
        self.data_ignores.len() != before
    }

    /// True when an absolute path matches any ignore pattern.
    ///
    /// Each pattern is matched against the entry's file name, against the
    /// project-relative path, and expanded under every data type root.
    pub fn is_ignored(&self, path: &Path) -> bool {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let rel = self.project_relative(path);

        for raw in &self.data_ignores {
            let Ok(pattern) = Pattern::new(raw) else {
                tracing::warn!(pattern = raw, "Skipping malformed ignore pattern");
                continue;
            };

            if pattern.matches(&file_name) {
                return true;
            }

            if let Some(rel) = &rel {
                if pattern.matches(rel.as_str()) {
                    return true;
                }
                for data_type in &self.data_types {
                    let expanded = format!("{}/{}", data_type.rel_path.as_str(), raw);
                    if Pattern::new(&expanded)
                        .map(|p| p.matches(rel.as_str()))
                        .unwrap_or(false)
                    {
                        return true;
                    }
                }
            }
        }

        false
    }

    // ----- internals --------------------------------------------------

    fn scaffold_data_type_dirs(&self) -> Result<()> {
        for data_type in &self.data_types {
            SysPath::new(data_type.abs_path(&self.root))?.ensure_dirs()?;
        }
        Ok(())
    }

    /// Deterministic resource order for stable manifest diffs.
    fn sort_resources(&mut self) {
        self.resources.sort_by(|a, b| {
            (
                &a.rel_path,
                &a.data_type,
                &a.name,
                &a.remote_uri,
                a.id,
            )
                .cmp(&(&b.rel_path, &b.data_type, &b.name, &b.remote_uri, b.id))
        });
    }
}

/// Built-in ignore patterns for the host OS.
fn default_ignores() -> Vec<String> {
    let mut ignores = vec![".git".to_string(), "*.tmp".to_string()];
    if cfg!(target_os = "macos") {
        ignores.push(".DS_Store".to_string());
    }
    if cfg!(target_os = "windows") {
        ignores.push("Thumbs.db".to_string());
        ignores.push("desktop.ini".to_string());
    }
    ignores
}
