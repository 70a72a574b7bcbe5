use crate::core::sampler::Targets;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = "devcat.json";
pub const SAMPLE_CONFIG_FILE: &str = "devcat.sample.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(
        "Configuration file {path} not found. Copy 'devcat.sample.json' to '{path}' and edit it, or pass --source"
    )]
    NotFound { path: String },

    #[error("Configuration {path} does not set source_path. Add it to the file or pass --source")]
    MissingSource { path: String },

    #[error("Failed to read configuration {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse configuration {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid configuration: {message}")]
    Invalid { message: String },
}

/// Settings as written in the JSON config file; every field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub source_path: Option<PathBuf>,
    pub catalog_file: Option<PathBuf>,
    pub extensions: Option<Vec<String>>,
    pub target_file_count: Option<usize>,
    pub target_vendor_count: Option<usize>,
}

impl ConfigFile {
    pub fn load(path: &Path) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_string_lossy().to_string(),
            source,
        })?;
        let file = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_string_lossy().to_string(),
            source,
        })?;
        Ok(Some(file))
    }
}

/// Values given on the command line; these win over the config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub source_path: Option<PathBuf>,
    pub catalog_file: Option<PathBuf>,
    pub target_file_count: Option<usize>,
    pub target_vendor_count: Option<usize>,
}

/// Resolved settings for one sampling run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SamplerConfig {
    pub source_path: PathBuf,
    pub catalog_file: PathBuf,
    pub extensions: Vec<String>,
    pub target_file_count: usize,
    pub target_vendor_count: usize,
}

impl SamplerConfig {
    pub fn default_catalog_file() -> PathBuf {
        PathBuf::from("catalog.json")
    }

    pub fn default_extensions() -> Vec<String> {
        [".jpg", ".jpeg", ".png", ".mp4", ".mov", ".avi", ".m4v"]
            .iter()
            .map(|ext| ext.to_string())
            .collect()
    }

    /// Read `path` (if present) and apply `overrides` on top.
    pub fn load(path: &Path, overrides: Overrides) -> Result<Self, ConfigError> {
        let file = match ConfigFile::load(path)? {
            Some(file) => file,
            None if overrides.source_path.is_some() => ConfigFile::default(),
            None => {
                return Err(ConfigError::NotFound {
                    path: path.to_string_lossy().to_string(),
                });
            }
        };

        Self::resolve(file, overrides, path)
    }

    fn resolve(file: ConfigFile, overrides: Overrides, path: &Path) -> Result<Self, ConfigError> {
        let source_path = overrides
            .source_path
            .or(file.source_path)
            .ok_or_else(|| ConfigError::MissingSource {
                path: path.to_string_lossy().to_string(),
            })?;

        let config = Self {
            source_path,
            catalog_file: overrides
                .catalog_file
                .or(file.catalog_file)
                .unwrap_or_else(Self::default_catalog_file),
            extensions: file.extensions.unwrap_or_else(Self::default_extensions),
            target_file_count: overrides
                .target_file_count
                .or(file.target_file_count)
                .unwrap_or(500),
            target_vendor_count: overrides
                .target_vendor_count
                .or(file.target_vendor_count)
                .unwrap_or(5),
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.target_file_count == 0 {
            return Err(ConfigError::Invalid {
                message: "target_file_count must be at least 1".to_string(),
            });
        }
        if self.target_vendor_count == 0 {
            return Err(ConfigError::Invalid {
                message: "target_vendor_count must be at least 1".to_string(),
            });
        }
        if self.extensions.iter().all(|ext| ext.trim().trim_start_matches('.').is_empty()) {
            return Err(ConfigError::Invalid {
                message: "extensions must name at least one file type".to_string(),
            });
        }
        Ok(())
    }

    pub fn targets(&self) -> Targets {
        Targets {
            files: self.target_file_count,
            vendors: self.target_vendor_count,
        }
    }
}
