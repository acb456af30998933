//! Data type templates
//!
//! A template is a named, registrable set of data type buckets used to
//! initialize a new project manifest. Templates live in a process-wide
//! registry seeded with the built-ins on first use; registration is the
//! only mutation after that.

use std::sync::{OnceLock, RwLock};

use crate::data_type::DataType;
use crate::{Error, Result};

/// One `(name, rel_path)` entry of a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplatePath {
    pub name: String,
    pub rel_path: String,
}

impl TemplatePath {
    pub fn new(name: impl Into<String>, rel_path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rel_path: rel_path.into(),
        }
    }
}

/// A named, registrable set of data type buckets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataTypeTemplate {
    pub name: String,
    pub description: String,
    pub paths: Vec<TemplatePath>,
    pub is_default: bool,
}

impl DataTypeTemplate {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        paths: Vec<TemplatePath>,
        is_default: bool,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            paths,
            is_default,
        }
    }

    /// Materialize the template into manifest data types.
    pub fn data_types(&self) -> Vec<DataType> {
        self.paths
            .iter()
            .map(|p| DataType::new(p.name.clone(), p.rel_path.as_str()))
            .collect()
    }
}

fn registry() -> &'static RwLock<Vec<DataTypeTemplate>> {
    static REGISTRY: OnceLock<RwLock<Vec<DataTypeTemplate>>> = OnceLock::new();
    REGISTRY.get_or_init(|| RwLock::new(builtins()))
}

fn builtins() -> Vec<DataTypeTemplate> {
    vec![
        DataTypeTemplate::new(
            "rally",
            "Data types for rally projects",
            vec![
                TemplatePath::new("core", "data/core"),
                TemplatePath::new("auxiliary", "data/auxiliary"),
                TemplatePath::new("results", "results"),
            ],
            true,
        ),
        DataTypeTemplate::new(
            "generic",
            "Data type for generic projects",
            vec![TemplatePath::new("data", "data")],
            false,
        ),
    ]
}

/// Register a template. A template with an existing name is replaced.
pub fn register(template: DataTypeTemplate) {
    let mut templates = registry().write().expect("template registry poisoned");
    templates.retain(|t| t.name != template.name);
    templates.push(template);
}

/// Look a template up by name.
pub fn get(name: &str) -> Result<DataTypeTemplate> {
    registry()
        .read()
        .expect("template registry poisoned")
        .iter()
        .find(|t| t.name == name)
        .cloned()
        .ok_or_else(|| Error::TemplateNotFound {
            name: name.to_string(),
        })
}

/// The template flagged as default.
pub fn default() -> DataTypeTemplate {
    registry()
        .read()
        .expect("template registry poisoned")
        .iter()
        .find(|t| t.is_default)
        .cloned()
        .expect("no default template registered")
}

/// All registered templates.
pub fn all() -> Vec<DataTypeTemplate> {
    registry()
        .read()
        .expect("template registry poisoned")
        .clone()
}
