//! The synchronization engine
//!
//! Orchestrates the manifest, data type classification and the remote
//! adapter: add/pull/push/remove/change operations plus their recursive
//! whole-manifest variants. Strictly synchronous depth-first recursion;
//! child resources are registered in the manifest (and the manifest saved)
//! before the child itself is pulled or pushed, which is what makes
//! re-running any operation idempotent.

use std::fs;
use std::path::{Path, PathBuf};

use uuid::Uuid;

use datakit_fs::{NormalizedPath, SysPath};
use datakit_manifest::{DataUri, Project, Resource, ResourceQuery, data_type};

use crate::adapter::{RemoteAdapter, RemoteEntity};
use crate::missing;
use crate::{Error, Result};

/// Optional arguments for [`SyncEngine::data_add`].
#[derive(Debug, Clone, Default)]
pub struct AddOptions {
    /// Human-friendly label; defaults to the URI or the basename.
    pub name: Option<String>,
    /// Pin a remote version.
    pub version: Option<String>,
    /// Explicit data type name, required only for remote-only resources
    /// whose remote layout does not mirror the data type directories.
    pub data_type: Option<String>,
}

impl AddOptions {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn version(mut self, version: impl ToString) -> Self {
        self.version = Some(version.to_string());
        self
    }

    pub fn data_type(mut self, data_type: impl Into<String>) -> Self {
        self.data_type = Some(data_type.into());
        self
    }
}

/// Field updates for [`SyncEngine::data_change`].
#[derive(Debug, Clone, Default)]
pub struct ChangeOptions {
    pub name: Option<String>,
    pub version: Option<String>,
    /// Explicitly clear a pinned version. `version` wins when both are set.
    pub clear_version: bool,
}

/// The resource synchronization engine.
///
/// Owns the [`Project`] manifest and a boxed [`RemoteAdapter`] for its
/// lifetime; the adapter is an explicit constructed dependency, connected
/// and torn down by the caller.
pub struct SyncEngine {
    project: Project,
    adapter: Box<dyn RemoteAdapter>,
}

impl SyncEngine {
    pub fn new(project: Project, adapter: Box<dyn RemoteAdapter>) -> Self {
        Self { project, adapter }
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    /// Mutable manifest access; the caller is responsible for saving.
    pub fn project_mut(&mut self) -> &mut Project {
        &mut self.project
    }

    pub fn adapter(&self) -> &dyn RemoteAdapter {
        self.adapter.as_ref()
    }

    /// Give the manifest back, dropping the adapter.
    pub fn into_project(self) -> Project {
        self.project
    }

    // ----- add --------------------------------------------------------

    /// Track a remote URI or an existing local file/folder.
    ///
    /// When a resource with the same remote URI or relative path already
    /// exists the call becomes an update: each supplied field overwrites
    /// the stored one, and every individual change is reported as an
    /// advisory notice. Re-adding identical values changes nothing.
    pub fn data_add(&mut self, value: &str, opts: AddOptions) -> Result<Resource> {
        if DataUri::is_uri(value) {
            return self.add_remote(value, opts);
        }

        let sys = SysPath::with_base(value, self.project.root())?;
        if sys.exists() {
            return self.add_local(&sys, opts);
        }

        Err(Error::NotUriOrLocalPath {
            value: value.to_string(),
        })
    }

    fn add_remote(&mut self, value: &str, opts: AddOptions) -> Result<Resource> {
        let uri = DataUri::parse(value)?;
        self.check_scheme(&uri)?;
        if let Some(name) = &opts.data_type {
            self.project.require_data_type(name)?;
        }

        let existing = self
            .project
            .find_resource(&ResourceQuery::new().remote_uri(uri.uri()))?
            .map(|r| r.id);

        match existing {
            Some(id) => self.apply_add_updates(id, &opts),
            None => {
                let resource = Resource::new()
                    .with_remote_uri(uri.uri())
                    .with_name(opts.name.unwrap_or_else(|| uri.uri()));
                let resource = match opts.data_type {
                    Some(data_type) => resource.with_data_type(data_type),
                    None => resource,
                };
                let resource = match opts.version {
                    Some(version) => resource.with_version(version),
                    None => resource,
                };
                self.insert_and_save(resource)
            }
        }
    }

    fn add_local(&mut self, sys: &SysPath, opts: AddOptions) -> Result<Resource> {
        let abs = sys.abs_path();
        let (rel, derived) = match self.project.project_relative(abs) {
            Some(rel) => match data_type::classify_rel(&self.project.data_types, &rel) {
                // A bucket root is a container, not a trackable leaf.
                Some(dt) if dt.rel_path != rel => {
                    let derived = dt.name.clone();
                    (rel, derived)
                }
                _ => return Err(self.not_a_data_type_path(abs)),
            },
            None => return Err(self.not_a_data_type_path(abs)),
        };

        if let Some(given) = &opts.data_type
            && given != &derived
        {
            return Err(datakit_manifest::Error::DataTypeMismatch {
                given: given.clone(),
                derived,
            }
            .into());
        }

        let existing = self
            .project
            .find_resource(&ResourceQuery::new().rel_path(rel.clone()))?
            .map(|r| r.id);

        match existing {
            Some(id) => self.apply_add_updates(id, &opts),
            None => {
                let resource = Resource::new()
                    .with_data_type(derived)
                    .with_rel_path(rel)
                    .with_name(
                        opts.name
                            .or_else(|| sys.basename())
                            .unwrap_or_default(),
                    );
                let resource = match opts.version {
                    Some(version) => resource.with_version(version),
                    None => resource,
                };
                self.insert_and_save(resource)
            }
        }
    }

    fn insert_and_save(&mut self, resource: Resource) -> Result<Resource> {
        let id = self.project.add_resource(resource);
        self.project.save()?;
        self.resource_snapshot(id)
    }

    /// Update an existing resource from add arguments. Supplied fields
    /// overwrite; unsupplied fields are left unchanged (fields cannot be
    /// cleared through add). Saves only when something changed.
    fn apply_add_updates(&mut self, id: Uuid, opts: &AddOptions) -> Result<Resource> {
        let mut changed = false;
        {
            let resource = self.lookup_mut(id)?;

            if let Some(name) = &opts.name
                && resource.name.as_ref() != Some(name)
            {
                tracing::info!(resource = %id, old = ?resource.name, new = %name, "Updating resource name");
                resource.name = Some(name.clone());
                changed = true;
            }
            if let Some(version) = &opts.version
                && resource.version.as_ref() != Some(version)
            {
                tracing::info!(resource = %id, old = ?resource.version, new = %version, "Updating resource version");
                resource.set_version(Some(version));
                changed = true;
            }
            if let Some(data_type) = &opts.data_type
                && resource.data_type.as_ref() != Some(data_type)
            {
                tracing::info!(resource = %id, old = ?resource.data_type, new = %data_type, "Updating resource data type");
                resource.data_type = Some(data_type.clone());
                changed = true;
            }
        }

        if changed {
            self.project.save()?;
        }
        self.resource_snapshot(id)
    }

    // ----- pull -------------------------------------------------------

    /// Pull one resource (and, for containers, its children) from the
    /// remote store.
    ///
    /// Returns `Ok(None)` as an advisory skip when the resource has never
    /// been pushed.
    pub fn data_pull(&mut self, value: &str) -> Result<Option<RemoteEntity>> {
        let resource = self.project.resolve_identifier(value)?;
        let id = resource.id;
        if resource.remote_uri.is_none() {
            tracing::warn!(resource = %describe(resource), "Resource cannot be pulled until it has been pushed");
            return Ok(None);
        }
        Ok(Some(self.pull_resource(id)?))
    }

    /// Pull every root-level resource; children synchronize transitively.
    pub fn data_pull_all(&mut self) -> Result<Vec<RemoteEntity>> {
        let roots: Vec<Uuid> = self
            .project
            .resources
            .iter()
            .filter(|r| r.is_root())
            .map(|r| r.id)
            .collect();

        let mut results = Vec::new();
        for id in roots {
            let resource = self.resource_snapshot(id)?;
            if resource.remote_uri.is_none() {
                tracing::warn!(resource = %describe(&resource), "Resource cannot be pulled until it has been pushed");
                continue;
            }
            results.push(self.pull_resource(id)?);
        }
        Ok(results)
    }

    fn pull_resource(&mut self, id: Uuid) -> Result<RemoteEntity> {
        let resource = self.resource_snapshot(id)?;
        let uri = DataUri::parse(resource.remote_uri.as_deref().unwrap_or_default())?;
        self.check_scheme(&uri)?;

        let mut entity = self
            .adapter
            .get_entity(uri.id(), resource.version.as_deref())?;

        if resource.rel_path.is_none() {
            self.place_resource(id, &entity, uri.id())?;
        }

        let resource = self.resource_snapshot(id)?;
        let abs = resource
            .abs_path(self.project.root())
            .ok_or_else(|| Error::CannotPlaceResource {
                uri: uri.uri(),
                reason: "no local path could be resolved".to_string(),
            })?;

        if entity.is_file() {
            let dest_dir = abs.parent().map(Path::to_path_buf).unwrap_or_default();
            SysPath::new(&dest_dir)?.ensure_dirs()?;
            self.adapter
                .download_file(uri.id(), resource.version.as_deref(), &dest_dir)?;
            tracing::debug!(path = %abs.display(), "Pulled file");
        } else {
            SysPath::new(&abs)?.ensure_dirs()?;
            self.pull_children(id, uri.id())?;
        }

        // The caller gets the entity with its synchronized local path.
        entity.local_path = Some(abs);
        Ok(entity)
    }

    /// Discover a container's children, registering a child resource for
    /// each remote child not already tracked, then pull each child.
    ///
    /// Children are matched by data type, remote URI or relative path, and
    /// root id, so repeated pulls never create duplicates. Every resource
    /// in a hierarchy carries the id of the top root resource, which is
    /// what lets removal take out a whole subtree at once.
    fn pull_children(&mut self, parent_id: Uuid, remote_id: &str) -> Result<()> {
        let parent = self.resource_snapshot(parent_id)?;
        let parent_rel = parent.rel_path.clone().unwrap_or_default();
        let root_id = parent.root_id.unwrap_or(parent_id);

        for child in self.adapter.list_children(remote_id)? {
            let child_uri = DataUri::new(self.adapter.scheme(), &child.id).uri();
            let child_rel = parent_rel.join(&child.name);

            let existing = self.find_child(root_id, &parent, &child_uri, &child_rel);
            let child_id = match existing {
                Some(child_id) => child_id,
                None => {
                    let resource = Resource::new()
                        .with_root_id(root_id)
                        .with_remote_uri(child_uri)
                        .with_rel_path(child_rel)
                        .with_name(child.name.clone());
                    let resource = match &parent.data_type {
                        Some(data_type) => resource.with_data_type(data_type.clone()),
                        None => resource,
                    };
                    // Register before recursing so a failed branch leaves
                    // the already-created children committed.
                    let child_id = self.project.add_resource(resource);
                    self.project.save()?;
                    child_id
                }
            };

            self.pull_resource(child_id)?;
        }
        Ok(())
    }

    fn find_child(
        &self,
        root_id: Uuid,
        parent: &Resource,
        child_uri: &str,
        child_rel: &NormalizedPath,
    ) -> Option<Uuid> {
        self.project
            .resources
            .iter()
            .find(|r| {
                r.root_id == Some(root_id)
                    && r.data_type == parent.data_type
                    && (r.remote_uri.as_deref() == Some(child_uri)
                        || r.rel_path.as_ref() == Some(child_rel))
            })
            .map(|r| r.id)
    }

    /// Resolve where a never-pulled resource lives locally: first from the
    /// adapter-reported remote hierarchy position matched against the data
    /// type directories, then from the resource's own data type plus the
    /// entity name.
    fn place_resource(&mut self, id: Uuid, entity: &RemoteEntity, remote_id: &str) -> Result<()> {
        let resource = self.resource_snapshot(id)?;

        let mut rel: Option<NormalizedPath> = None;
        let mut data_type: Option<String> = None;

        if let Some(remote_path) = self.adapter.remote_path(remote_id)? {
            let candidate = NormalizedPath::new(&remote_path);
            if let Some(dt) = data_type::classify_rel(&self.project.data_types, &candidate)
                && dt.rel_path != candidate
            {
                data_type = Some(dt.name.clone());
                rel = Some(candidate);
            }
        }

        if rel.is_none()
            && let Some(name) = &resource.data_type
        {
            let dt = self.project.require_data_type(name)?;
            rel = Some(dt.rel_path.join(&entity.name));
            data_type = Some(dt.name.clone());
        }

        let Some(rel) = rel else {
            return Err(Error::CannotPlaceResource {
                uri: resource.remote_uri.clone().unwrap_or_default(),
                reason: "the remote layout does not mirror any data type directory \
                         and no data type is set on the resource"
                    .to_string(),
            });
        };

        tracing::debug!(resource = %id, rel_path = %rel, "Resolved local path from remote position");
        {
            let stored = self.lookup_mut(id)?;
            stored.rel_path = Some(rel);
            stored.data_type = data_type;
        }
        self.project.save()?;
        Ok(())
    }

    // ----- push -------------------------------------------------------

    /// Push one resource (and, for directories, its children) to the
    /// remote store.
    ///
    /// Returns `Ok(None)` as an advisory skip when the resource has no
    /// local path yet.
    pub fn data_push(&mut self, value: &str) -> Result<Option<RemoteEntity>> {
        let resource = self.project.resolve_identifier(value)?;
        let id = resource.id;
        if resource.rel_path.is_none() {
            tracing::warn!(resource = %describe(resource), "Resource cannot be pushed until it has been pulled or added");
            return Ok(None);
        }
        Ok(Some(self.push_resource(id)?))
    }

    /// Push every resource that has never been pushed.
    ///
    /// Non-root resources whose root resource is itself unpushed are
    /// skipped; the root's push will include them.
    pub fn data_push_all(&mut self) -> Result<Vec<RemoteEntity>> {
        let candidates: Vec<Uuid> = self
            .project
            .resources
            .iter()
            .filter(|r| r.remote_uri.is_none())
            .map(|r| r.id)
            .collect();

        let mut results = Vec::new();
        for id in candidates {
            let resource = self.resource_snapshot(id)?;
            if resource.remote_uri.is_some() {
                // Already pushed transitively by an earlier root.
                continue;
            }
            if let Some(root_id) = resource.root_id {
                let root_pushed = self
                    .project
                    .resource(root_id)
                    .map(|r| r.remote_uri.is_some())
                    .unwrap_or(false);
                if !root_pushed {
                    tracing::debug!(resource = %describe(&resource), "Skipping child; its root resource has not been pushed yet");
                    continue;
                }
            }
            if resource.rel_path.is_none() {
                tracing::warn!(resource = %describe(&resource), "Resource cannot be pushed until it has been pulled or added");
                continue;
            }
            results.push(self.push_resource(id)?);
        }
        Ok(results)
    }

    fn push_resource(&mut self, id: Uuid) -> Result<RemoteEntity> {
        let resource = self.resource_snapshot(id)?;
        let rel = resource
            .rel_path
            .clone()
            .ok_or_else(|| Error::LocalPathMissing {
                path: PathBuf::new(),
            })?;
        let abs = rel.resolve(self.project.root());
        if !abs.exists() {
            return Err(Error::LocalPathMissing { path: abs });
        }

        let mut entity = if abs.is_dir() {
            let folder = match &resource.remote_uri {
                // Existing remote position is preserved, not relocated.
                Some(uri) => {
                    let uri = DataUri::parse(uri)?;
                    self.adapter.get_entity(uri.id(), None)?
                }
                None => {
                    let parent_id = self.remote_parent(&rel)?;
                    let name = rel.file_name().unwrap_or_default().to_string();
                    self.adapter.find_or_create_folder(&parent_id, &name)?
                }
            };
            self.push_children(id, &rel, &abs)?;
            folder
        } else {
            let parent_id = match &resource.remote_uri {
                Some(uri) => {
                    let uri = DataUri::parse(uri)?;
                    let existing = self.adapter.get_entity(uri.id(), None)?;
                    match existing.parent_id {
                        Some(parent_id) => parent_id,
                        None => self.remote_parent(&rel)?,
                    }
                }
                None => self.remote_parent(&rel)?,
            };
            self.adapter.upload_file(&parent_id, &abs)?
        };

        // First-push bookkeeping: record the remote position and drop any
        // version pin, since a push targets the latest version.
        let mut changed = false;
        let scheme = self.adapter.scheme().to_string();
        {
            let stored = self.lookup_mut(id)?;
            if stored.remote_uri.is_none() {
                let uri = DataUri::new(scheme.as_str(), &entity.id).uri();
                tracing::debug!(resource = %id, uri = %uri, "Recorded remote URI after first push");
                stored.remote_uri = Some(uri);
                changed = true;
            }
            if stored.version.is_some() {
                tracing::debug!(resource = %id, "Clearing pinned version after push");
                stored.set_version(None::<String>);
                changed = true;
            }
        }
        if changed {
            self.project.save()?;
        }

        entity.local_path = Some(abs);
        Ok(entity)
    }

    /// Walk the relative path's parent segments, finding or creating a
    /// remote folder for each, starting from the project root.
    fn remote_parent(&mut self, rel: &NormalizedPath) -> Result<String> {
        let project_uri = self
            .project
            .project_uri
            .clone()
            .ok_or(Error::MissingProjectUri)?;
        let uri = DataUri::parse(&project_uri)?;
        self.check_scheme(&uri)?;

        let mut parent_id = uri.id().to_string();
        if let Some(parent_rel) = rel.parent() {
            for segment in parent_rel.segments() {
                parent_id = self.adapter.find_or_create_folder(&parent_id, segment)?.id;
            }
        }
        Ok(parent_id)
    }

    /// Push a directory's local entries, registering a child resource for
    /// each entry not already tracked. Files first, then directories, each
    /// in name order.
    fn push_children(&mut self, parent_id: Uuid, parent_rel: &NormalizedPath, abs: &Path) -> Result<()> {
        let parent = self.resource_snapshot(parent_id)?;
        let root_id = parent.root_id.unwrap_or(parent_id);
        let (dirs, files) = dirs_and_files(abs)?;

        for entry in files.into_iter().chain(dirs) {
            let name = entry
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let child_rel = parent_rel.join(&name);

            let existing = self.find_child(root_id, &parent, "", &child_rel);
            let child_id = match existing {
                Some(child_id) => child_id,
                None => {
                    let resource = Resource::new()
                        .with_root_id(root_id)
                        .with_rel_path(child_rel)
                        .with_name(name);
                    let resource = match &parent.data_type {
                        Some(data_type) => resource.with_data_type(data_type.clone()),
                        None => resource,
                    };
                    let child_id = self.project.add_resource(resource);
                    self.project.save()?;
                    child_id
                }
            };

            self.push_resource(child_id)?;
        }
        Ok(())
    }

    // ----- remove / change --------------------------------------------

    /// Untrack a resource and everything rooted at it.
    ///
    /// Manifest-only: neither the local files nor the remote objects are
    /// deleted. Returns the removed resources.
    pub fn data_remove(&mut self, value: &str) -> Result<Vec<Resource>> {
        let id = self.project.resolve_identifier(value)?.id;
        let removed = self.project.remove_resource(id);
        self.project.save()?;
        tracing::debug!(count = removed.len(), "Removed resources from manifest");
        Ok(removed)
    }

    /// Overwrite a resource's name and/or version.
    pub fn data_change(&mut self, value: &str, opts: ChangeOptions) -> Result<Resource> {
        let id = self.project.resolve_identifier(value)?.id;
        {
            let resource = self.lookup_mut(id)?;
            if let Some(name) = opts.name {
                resource.name = Some(name);
            }
            if let Some(version) = opts.version {
                resource.set_version(Some(version));
            } else if opts.clear_version {
                resource.set_version(None::<String>);
            }
        }
        self.project.save()?;
        self.resource_snapshot(id)
    }

    // ----- missing resources ------------------------------------------

    /// Local entries under the data type directories that no resource
    /// tracks yet, honoring the manifest's ignore patterns.
    pub fn find_missing_resources(&self) -> Result<Vec<PathBuf>> {
        missing::find_missing_resources(&self.project)
    }

    // ----- internals --------------------------------------------------

    fn not_a_data_type_path(&self, abs: &Path) -> Error {
        datakit_manifest::Error::NotADataTypePath {
            path: abs.to_path_buf(),
            roots: self
                .project
                .data_types
                .iter()
                .map(|dt| dt.rel_path.as_str().to_string())
                .collect(),
        }
        .into()
    }

    fn check_scheme(&self, uri: &DataUri) -> Result<()> {
        if uri.scheme() != self.adapter.scheme() {
            return Err(Error::UnsupportedScheme {
                uri: uri.uri(),
                adapter_scheme: self.adapter.scheme().to_string(),
            });
        }
        Ok(())
    }

    fn resource_snapshot(&self, id: Uuid) -> Result<Resource> {
        self.project
            .resource(id)
            .cloned()
            .ok_or_else(|| not_found(id))
    }

    fn lookup_mut(&mut self, id: Uuid) -> Result<&mut Resource> {
        self.project.resource_mut(id).ok_or_else(|| not_found(id))
    }
}

fn not_found(id: Uuid) -> Error {
    datakit_manifest::Error::ResourceNotFound {
        value: id.to_string(),
    }
    .into()
}

fn describe(resource: &Resource) -> String {
    resource
        .rel_path
        .as_ref()
        .map(|p| p.as_str().to_string())
        .or_else(|| resource.remote_uri.clone())
        .or_else(|| resource.name.clone())
        .unwrap_or_else(|| resource.id.to_string())
}

/// Local directory entries split into sorted (dirs, files).
fn dirs_and_files(path: &Path) -> Result<(Vec<PathBuf>, Vec<PathBuf>)> {
    let mut dirs = Vec::new();
    let mut files = Vec::new();
    for entry in fs::read_dir(path)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            dirs.push(entry.path());
        } else {
            files.push(entry.path());
        }
    }
    dirs.sort();
    files.sort();
    Ok((dirs, files))
}
