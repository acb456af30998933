//! Manifest layer for datakit
//!
//! Owns the data model for tracked resources: named data type buckets and
//! their path classification, `scheme:id` remote URIs, the [`Resource`]
//! collection, and the persisted [`Project`] manifest document with its
//! lookup and query surface.
//!
//! The synchronization algorithms that move bytes live in `datakit-sync`;
//! this crate only knows how to describe, persist and query the mapping.

pub mod data_type;
pub mod error;
pub mod project;
pub mod query;
pub mod resource;
pub mod template;
pub mod uri;

pub use data_type::DataType;
pub use error::{Error, Result};
pub use project::{InitParams, MANIFEST_FILENAME, Project};
pub use query::{Operator, ResourceQuery};
pub use resource::Resource;
pub use template::{DataTypeTemplate, TemplatePath};
pub use uri::{DataUri, DEFAULT_SCHEME, REGISTERED_SCHEMES};
