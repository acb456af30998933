//! The remote adapter boundary
//!
//! A [`RemoteAdapter`] performs the actual remote entity CRUD and transfer
//! for one storage backend. The engine drives all recursion; the adapter
//! only exposes flat primitives over single entities. Adapters are
//! explicit, constructed dependencies injected into the
//! [`SyncEngine`](crate::SyncEngine).

use std::path::{Path, PathBuf};

use crate::Result;

/// What a remote entity is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Project,
    Directory,
    File,
}

/// A project, folder or file held in the remote object store.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteEntity {
    /// Backend-assigned identifier (the `id` part of a data URI).
    pub id: String,
    pub name: String,
    pub kind: EntityKind,
    pub version: Option<String>,
    /// Id of the containing entity; `None` for projects.
    pub parent_id: Option<String>,
    /// Where the entity was materialized locally, if it was.
    pub local_path: Option<PathBuf>,
}

impl RemoteEntity {
    pub fn is_project(&self) -> bool {
        self.kind == EntityKind::Project
    }

    pub fn is_directory(&self) -> bool {
        self.kind == EntityKind::Directory
    }

    pub fn is_file(&self) -> bool {
        self.kind == EntityKind::File
    }
}

/// One remote storage backend.
///
/// All operations are synchronous; failures propagate untranslated to the
/// engine caller. Implementations must make `find_or_create_folder`
/// idempotent, since recursive pushes walk the same parent chains
/// repeatedly.
pub trait RemoteAdapter {
    /// Backend name, e.g. "Synapse".
    fn name(&self) -> &str;

    /// The data URI scheme this adapter serves, e.g. "syn".
    fn scheme(&self) -> &str;

    /// Whether the backend is up and reachable.
    fn connected(&self) -> bool;

    /// Create a new remote project. Fails if a project with that name
    /// already exists.
    fn create_project(&self, name: &str) -> Result<RemoteEntity>;

    /// Fetch an entity's metadata.
    fn get_entity(&self, id: &str, version: Option<&str>) -> Result<RemoteEntity>;

    /// Slash-joined position of the entity below its project root
    /// (e.g. `data/core/f.csv`), or `None` for the project itself.
    fn remote_path(&self, id: &str) -> Result<Option<String>>;

    /// Direct children of a container, in deterministic name order.
    fn list_children(&self, id: &str) -> Result<Vec<RemoteEntity>>;

    /// Find a child folder by name, creating it when absent. Fails when
    /// the name is taken by a non-folder entity.
    fn find_or_create_folder(&self, parent_id: &str, name: &str) -> Result<RemoteEntity>;

    /// Download a file entity into `dest_dir`, overwriting any local copy.
    fn download_file(&self, id: &str, version: Option<&str>, dest_dir: &Path)
    -> Result<RemoteEntity>;

    /// Upload or replace a file under `parent_id`, keyed by file name.
    fn upload_file(&self, parent_id: &str, local_path: &Path) -> Result<RemoteEntity>;
}
