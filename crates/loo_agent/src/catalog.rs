//! Model-listing collaborator.
//!
//! The interactive surface only consumes a mapping of model id to metadata. Fetching that
//! mapping over the network is someone else's job; the static catalog here serves it from memory
//! or from a JSON file.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub name: String,
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read model catalog {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse model catalog {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("model catalog unavailable: {0}")]
    Unavailable(String),
}

pub trait ModelCatalog {
    /// All known models keyed by id.
    fn list_models(&self) -> Result<BTreeMap<String, ModelInfo>, CatalogError>;
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawModel {
    Name(String),
    Info(ModelInfo),
}

impl From<RawModel> for ModelInfo {
    fn from(raw: RawModel) -> Self {
        match raw {
            RawModel::Name(name) => Self { name },
            RawModel::Info(info) => info,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct StaticModelCatalog {
    models: BTreeMap<String, ModelInfo>,
}

impl StaticModelCatalog {
    pub fn new(models: BTreeMap<String, ModelInfo>) -> Self {
        Self { models }
    }

    /// Parses `{"id": {"name": "..."}}` or the shorthand `{"id": "name"}`.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        let raw: BTreeMap<String, RawModel> = serde_json::from_str(json)?;
        Ok(Self::new(
            raw.into_iter()
                .map(|(id, model)| (id, ModelInfo::from(model)))
                .collect(),
        ))
    }

    pub fn from_path(path: &Path) -> Result<Self, CatalogError> {
        let json = fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json).map_err(|source| CatalogError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl ModelCatalog for StaticModelCatalog {
    fn list_models(&self) -> Result<BTreeMap<String, ModelInfo>, CatalogError> {
        Ok(self.models.clone())
    }
}

/// Models whose id or display name contains `search`, ignoring case. Empty search keeps all.
pub fn filter_models(
    models: &BTreeMap<String, ModelInfo>,
    search: &str,
) -> Vec<(String, ModelInfo)> {
    let needle = search.trim().to_lowercase();
    models
        .iter()
        .filter(|(id, info)| {
            needle.is_empty()
                || id.to_lowercase().contains(&needle)
                || info.name.to_lowercase().contains(&needle)
        })
        .map(|(id, info)| (id.clone(), info.clone()))
        .collect()
}
