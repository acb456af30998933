//! Resource synchronization between a local project tree and a remote
//! hierarchical object store.
//!
//! The manifest declares what is tracked; this crate moves the bytes. The
//! [`SyncEngine`] owns a [`Project`](datakit_manifest::Project) and a
//! [`RemoteAdapter`] and implements the add, pull, push, remove and change
//! operations, plus detection of local files nothing tracks yet.

pub mod adapter;
pub mod engine;
pub mod error;
pub mod logging;
pub mod missing;

pub use adapter::{EntityKind, RemoteAdapter, RemoteEntity};
pub use engine::{AddOptions, ChangeOptions, SyncEngine};
pub use error::{Error, Result};
pub use missing::find_missing_resources;
