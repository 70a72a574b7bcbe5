use crate::core::signature::Signature;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{error, info};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to write catalog {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize catalog: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Known device signatures and the friendly names assigned to them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    entries: BTreeMap<Signature, String>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, signature: &Signature) -> bool {
        self.entries.contains_key(signature)
    }

    pub fn name_of(&self, signature: &Signature) -> Option<&str> {
        self.entries.get(signature).map(String::as_str)
    }

    pub fn insert(&mut self, signature: Signature, name: impl Into<String>) {
        self.entries.insert(signature, name.into());
    }

    /// Merge name assignments, overwriting existing names. Returns how many were merged.
    pub fn merge<I>(&mut self, assignments: I) -> usize
    where
        I: IntoIterator<Item = (Signature, String)>,
    {
        let mut merged = 0;
        for (signature, name) in assignments {
            self.entries.insert(signature, name);
            merged += 1;
        }
        merged
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Signature, &str)> {
        self.entries.iter().map(|(sig, name)| (sig, name.as_str()))
    }
}

/// JSON file holding the catalog.
#[derive(Debug, Clone)]
pub struct CatalogStore {
    path: PathBuf,
}

impl CatalogStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the catalog, falling back to an empty one when the file is missing or unreadable.
    pub fn load(&self) -> Catalog {
        if !self.path.exists() {
            return Catalog::new();
        }

        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) => {
                error!("Failed to load catalog {}: {}", self.path.display(), e);
                return Catalog::new();
            }
        };

        match serde_json::from_str::<Catalog>(&content) {
            Ok(catalog) => catalog,
            Err(e) => {
                error!("Failed to load catalog {}: {}", self.path.display(), e);
                Catalog::new()
            }
        }
    }

    /// Overwrite the catalog file with the full mapping.
    pub fn save(&self, catalog: &Catalog) -> Result<(), CatalogError> {
        let json = serde_json::to_string_pretty(catalog)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| self.write_error(source))?;
        }
        fs::write(&self.path, json + "\n").map_err(|source| self.write_error(source))?;

        info!("Catalog saved to {}", self.path.display());
        Ok(())
    }

    fn write_error(&self, source: std::io::Error) -> CatalogError {
        CatalogError::Write {
            path: self.path.to_string_lossy().to_string(),
            source,
        }
    }
}
