use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use crate::model::{Device, ModelHandle};

/// Identity of a loaded model: which checkpoint, in which state on disk, and
/// with which configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModelKey {
    pub checkpoint: PathBuf,
    pub checkpoint_len: u64,
    pub modified: Option<SystemTime>,
    pub chunk_size: usize,
    pub device: Device,
}

impl ModelKey {
    pub fn for_checkpoint(path: &Path, chunk_size: usize, device: Device) -> Result<Self, String> {
        let metadata = match std::fs::metadata(path) {
            Ok(metadata) if metadata.is_file() => metadata,
            Ok(_) => return Err(format!("Checkpoint is not a file: {}", path.display())),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(format!("Checkpoint not found: {}", path.display()));
            }
            Err(err) => return Err(format!("Checkpoint unreadable: {}: {err}", path.display())),
        };
        Ok(Self {
            checkpoint: path.to_path_buf(),
            checkpoint_len: metadata.len(),
            modified: metadata.modified().ok(),
            chunk_size,
            device,
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModelCacheStats {
    pub hits: u64,
    pub misses: u64,
}

/// Loaded models keyed by [`ModelKey`], owned by the host context.
///
/// Holds at most `capacity` models; the least recently used one is dropped
/// when a new key arrives.
pub struct ModelCache {
    capacity: usize,
    entries: VecDeque<(ModelKey, ModelHandle)>,
    pub stats: ModelCacheStats,
}

impl Default for ModelCache {
    fn default() -> Self {
        Self::with_capacity(1)
    }
}

impl ModelCache {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: VecDeque::new(),
            stats: ModelCacheStats::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: &ModelKey) -> bool {
        self.entries.iter().any(|(existing, _)| existing == key)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn get_or_load<F>(&mut self, key: ModelKey, load: F) -> Result<ModelHandle, String>
    where
        F: FnOnce() -> Result<ModelHandle, String>,
    {
        if let Some(pos) = self.entries.iter().position(|(existing, _)| *existing == key) {
            self.stats.hits += 1;
            if let Some(entry) = self.entries.remove(pos) {
                let handle = Arc::clone(&entry.1);
                self.entries.push_back(entry);
                return Ok(handle);
            }
        }

        self.stats.misses += 1;
        let handle = load()?;
        while self.entries.len() >= self.capacity {
            if let Some((evicted, _)) = self.entries.pop_front() {
                tracing::info!("dropping cached model {}", evicted.checkpoint.display());
            }
        }
        self.entries.push_back((key, Arc::clone(&handle)));
        Ok(handle)
    }
}
