//! Key-value persistence port.
//!
//! Everything pinnotes persists is an opaque string stored under a key. The
//! store layers above never touch files directly, so tests can swap in
//! [`MemoryBlobStore`].
use std::{
    collections::HashMap,
    fs,
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};

use log::{debug, error, trace};
use tempfile::NamedTempFile;

use crate::{NotesError, Result};

/// Key under which the note collection is stored.
pub const NOTES_KEY: &str = "notes";

/// Key under which the theme preference is stored.
pub const THEME_KEY: &str = "theme";

/// Get/set access to opaque string blobs.
pub trait BlobStore {
    /// Returns the blob stored under `key`, or `None` if nothing was stored yet.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Replaces the blob stored under `key`. On error the previous value is kept.
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

/// Stores each key as `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct DirBlobStore {
    dir: PathBuf,
}

impl DirBlobStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl BlobStore for DirBlobStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        trace!("Reading blob '{}' from {}", key, path.display());

        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No blob stored under '{}'", key);
                Ok(None)
            }
            Err(e) => {
                error!("Failed to read {}: {}", path.display(), e);
                Err(NotesError::StorageUnavailable {
                    message: format!("{}: {}", path.display(), e),
                })
            }
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let write_failed = |e: std::io::Error| {
            error!("Failed to write blob '{}': {}", key, e);
            NotesError::StorageWriteFailed {
                key: key.to_string(),
                message: e.to_string(),
            }
        };

        if !self.dir.exists() {
            debug!("Creating data directory: {}", self.dir.display());
            fs::create_dir_all(&self.dir).map_err(write_failed)?;
        }

        // Write next to the target so the final rename stays on one filesystem
        let mut temp_file = NamedTempFile::new_in(&self.dir).map_err(write_failed)?;
        temp_file.write_all(value.as_bytes()).map_err(write_failed)?;
        temp_file.flush().map_err(write_failed)?;

        let path = self.path_for(key);
        debug!("Persisting blob '{}' to {}", key, path.display());
        temp_file.persist(&path).map_err(|e| write_failed(e.error))?;

        Ok(())
    }
}

/// In-memory blobs with an optional byte quota, for tests and ephemeral sessions.
#[derive(Debug, Clone, Default)]
pub struct MemoryBlobStore {
    blobs: HashMap<String, String>,
    capacity: Option<usize>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that rejects writes once the stored values would exceed `bytes`.
    pub fn with_capacity_limit(bytes: usize) -> Self {
        Self {
            blobs: HashMap::new(),
            capacity: Some(bytes),
        }
    }

    fn used_bytes_without(&self, key: &str) -> usize {
        self.blobs
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(_, v)| v.len())
            .sum()
    }
}

impl BlobStore for MemoryBlobStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.blobs.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        if let Some(capacity) = self.capacity {
            let needed = self.used_bytes_without(key) + value.len();
            if needed > capacity {
                error!(
                    "Quota exceeded writing '{}': {} bytes needed, {} available",
                    key, needed, capacity
                );
                return Err(NotesError::StorageWriteFailed {
                    key: key.to_string(),
                    message: format!("quota of {} bytes exceeded", capacity),
                });
            }
        }

        self.blobs.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
