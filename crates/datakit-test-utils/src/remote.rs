//! [`MemoryAdapter`], an in-process remote object store.
//!
//! Implements the full adapter contract against a `Mutex`-guarded entity
//! map so engine behavior can be exercised hermetically. File versions are
//! kept in full, and uploads bump the version only when the content digest
//! actually changed.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

use sha2::{Digest, Sha256};

use datakit_sync::{EntityKind, Error, RemoteAdapter, RemoteEntity, Result};

#[derive(Debug, Clone)]
struct Entity {
    id: String,
    name: String,
    kind: EntityKind,
    parent_id: Option<String>,
    /// Full content per version, oldest first. Empty for non-files.
    versions: Vec<Vec<u8>>,
}

impl Entity {
    fn latest_version(&self) -> Option<String> {
        match self.kind {
            EntityKind::File => Some(self.versions.len().to_string()),
            _ => None,
        }
    }

    fn to_remote(&self) -> RemoteEntity {
        RemoteEntity {
            id: self.id.clone(),
            name: self.name.clone(),
            kind: self.kind,
            version: self.latest_version(),
            parent_id: self.parent_id.clone(),
            local_path: None,
        }
    }
}

#[derive(Debug, Default)]
struct State {
    entities: HashMap<String, Entity>,
    next_id: u64,
}

impl State {
    fn mint_id(&mut self) -> String {
        self.next_id += 1;
        format!("syn{}", self.next_id)
    }

    fn get(&self, id: &str) -> Result<&Entity> {
        self.entities
            .get(id)
            .ok_or_else(|| Error::RemoteEntityNotFound { id: id.to_string() })
    }

    fn child_named(&self, parent_id: &str, name: &str) -> Option<&Entity> {
        self.entities
            .values()
            .find(|e| e.parent_id.as_deref() == Some(parent_id) && e.name == name)
    }
}

/// An in-memory remote store serving the `syn` scheme.
///
/// Clones share the same store, so a test can keep a handle for seeding
/// and assertions while the engine owns a boxed clone.
#[derive(Debug, Clone, Default)]
pub struct MemoryAdapter {
    state: Arc<Mutex<State>>,
}

impl MemoryAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest stored bytes of a file entity, for test assertions.
    pub fn file_bytes(&self, id: &str) -> Option<Vec<u8>> {
        let state = self.state.lock().unwrap();
        state
            .entities
            .get(id)
            .and_then(|e| e.versions.last().cloned())
    }

    /// Look up a direct child by name, for test assertions.
    pub fn child_named(&self, parent_id: &str, name: &str) -> Option<RemoteEntity> {
        let state = self.state.lock().unwrap();
        state.child_named(parent_id, name).map(Entity::to_remote)
    }

    /// Seed a folder under `parent_id` without going through the engine.
    pub fn seed_folder(&self, parent_id: &str, name: &str) -> RemoteEntity {
        self.find_or_create_folder(parent_id, name).unwrap()
    }

    /// Seed a file with `content` under `parent_id` without going through
    /// the engine.
    pub fn seed_file(&self, parent_id: &str, name: &str, content: &[u8]) -> RemoteEntity {
        let mut state = self.state.lock().unwrap();
        let id = state.mint_id();
        let entity = Entity {
            id: id.clone(),
            name: name.to_string(),
            kind: EntityKind::File,
            parent_id: Some(parent_id.to_string()),
            versions: vec![content.to_vec()],
        };
        state.entities.insert(id.clone(), entity);
        state.entities[&id].to_remote()
    }
}

impl RemoteAdapter for MemoryAdapter {
    fn name(&self) -> &str {
        "Memory"
    }

    fn scheme(&self) -> &str {
        "syn"
    }

    fn connected(&self) -> bool {
        true
    }

    fn create_project(&self, name: &str) -> Result<RemoteEntity> {
        let mut state = self.state.lock().unwrap();
        if let Some(existing) = state
            .entities
            .values()
            .find(|e| e.kind == EntityKind::Project && e.name == name)
        {
            return Err(Error::RemoteNameTaken {
                name: name.to_string(),
                entity_id: existing.id.clone(),
            });
        }

        let id = state.mint_id();
        let entity = Entity {
            id: id.clone(),
            name: name.to_string(),
            kind: EntityKind::Project,
            parent_id: None,
            versions: Vec::new(),
        };
        state.entities.insert(id.clone(), entity);
        Ok(state.entities[&id].to_remote())
    }

    fn get_entity(&self, id: &str, version: Option<&str>) -> Result<RemoteEntity> {
        let state = self.state.lock().unwrap();
        let entity = state.get(id)?;
        let mut remote = entity.to_remote();
        if let Some(version) = version {
            let number: usize = version
                .parse()
                .map_err(|_| Error::adapter(format!("invalid version {version} for {id}")))?;
            if entity.kind != EntityKind::File || number == 0 || number > entity.versions.len() {
                return Err(Error::adapter(format!(
                    "version {version} does not exist for {id}"
                )));
            }
            remote.version = Some(version.to_string());
        }
        Ok(remote)
    }

    fn remote_path(&self, id: &str) -> Result<Option<String>> {
        let state = self.state.lock().unwrap();
        let mut entity = state.get(id)?;
        if entity.kind == EntityKind::Project {
            return Ok(None);
        }

        let mut segments = vec![entity.name.clone()];
        while let Some(parent_id) = &entity.parent_id {
            entity = state.get(parent_id)?;
            if entity.kind == EntityKind::Project {
                break;
            }
            segments.push(entity.name.clone());
        }
        segments.reverse();
        Ok(Some(segments.join("/")))
    }

    fn list_children(&self, id: &str) -> Result<Vec<RemoteEntity>> {
        let state = self.state.lock().unwrap();
        state.get(id)?;
        let mut children: Vec<RemoteEntity> = state
            .entities
            .values()
            .filter(|e| e.parent_id.as_deref() == Some(id))
            .map(Entity::to_remote)
            .collect();
        children.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(children)
    }

    fn find_or_create_folder(&self, parent_id: &str, name: &str) -> Result<RemoteEntity> {
        let mut state = self.state.lock().unwrap();
        state.get(parent_id)?;

        if let Some(existing) = state.child_named(parent_id, name) {
            if existing.kind != EntityKind::Directory {
                return Err(Error::RemoteNameTaken {
                    name: name.to_string(),
                    entity_id: existing.id.clone(),
                });
            }
            return Ok(existing.to_remote());
        }

        let id = state.mint_id();
        let entity = Entity {
            id: id.clone(),
            name: name.to_string(),
            kind: EntityKind::Directory,
            parent_id: Some(parent_id.to_string()),
            versions: Vec::new(),
        };
        state.entities.insert(id.clone(), entity);
        Ok(state.entities[&id].to_remote())
    }

    fn download_file(
        &self,
        id: &str,
        version: Option<&str>,
        dest_dir: &Path,
    ) -> Result<RemoteEntity> {
        let state = self.state.lock().unwrap();
        let entity = state.get(id)?;
        if entity.kind != EntityKind::File {
            return Err(Error::adapter(format!("{id} is not a file")));
        }

        let index = match version {
            Some(version) => {
                let number: usize = version
                    .parse()
                    .map_err(|_| Error::adapter(format!("invalid version {version} for {id}")))?;
                if number == 0 || number > entity.versions.len() {
                    return Err(Error::adapter(format!(
                        "version {version} does not exist for {id}"
                    )));
                }
                number - 1
            }
            None => entity.versions.len() - 1,
        };

        let dest = dest_dir.join(&entity.name);
        fs::write(&dest, &entity.versions[index])?;

        let mut remote = entity.to_remote();
        remote.version = Some((index + 1).to_string());
        remote.local_path = Some(dest);
        Ok(remote)
    }

    fn upload_file(&self, parent_id: &str, local_path: &Path) -> Result<RemoteEntity> {
        let content = fs::read(local_path)?;
        let name = local_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| Error::adapter(format!("no file name in {}", local_path.display())))?;

        let mut state = self.state.lock().unwrap();
        state.get(parent_id)?;

        let id = match state.child_named(parent_id, &name) {
            Some(existing) if existing.kind != EntityKind::File => {
                return Err(Error::RemoteNameTaken {
                    name,
                    entity_id: existing.id.clone(),
                });
            }
            Some(existing) => existing.id.clone(),
            None => {
                let id = state.mint_id();
                let entity = Entity {
                    id: id.clone(),
                    name: name.clone(),
                    kind: EntityKind::File,
                    parent_id: Some(parent_id.to_string()),
                    versions: Vec::new(),
                };
                state.entities.insert(id.clone(), entity);
                id
            }
        };

        let entity = state.entities.get_mut(&id).unwrap();
        let unchanged = entity
            .versions
            .last()
            .map(|previous| digest(previous) == digest(&content))
            .unwrap_or(false);
        if !unchanged {
            entity.versions.push(content);
        }

        let mut remote = entity.to_remote();
        remote.local_path = Some(local_path.to_path_buf());
        Ok(remote)
    }
}

fn digest(content: &[u8]) -> [u8; 32] {
    Sha256::digest(content).into()
}
