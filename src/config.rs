use std::{fs, path::{Path, PathBuf}};

use directories::ProjectDirs;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::{NotesError, Result};

/// Application configuration settings.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Directory holding the persisted blobs
    pub data_dir: PathBuf,

    /// Characters of body text shown per note in listings
    pub preview_length: usize,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = ProjectDirs::from("", "", "pinnotes")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from(".pinnotes"));

        Self {
            data_dir,
            preview_length: 80,
        }
    }
}

impl Config {
    /// Location of the config file when none is given on the command line.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "pinnotes").map(|dirs| dirs.config_dir().join("config.json"))
    }

    /// Loads the config from `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config = serde_json::from_str(&content).map_err(|e| NotesError::Config {
            message: format!("{}: {}", path.display(), e),
        })?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }
}
