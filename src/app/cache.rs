// SuburbExplorer - app/cache.rs
//
// Explicit cache for the loaded workbook.
//
// The dataset is keyed by canonical path, file modification time, and the
// sheet names read. Touching the file (or pointing at another one) forces a
// reload on the next request; anything else returns the same Arc.
//
// The slot stays locked while a dataset is being built, and only a finished
// `Arc<Dataset>` is ever stored, so a concurrent caller waits for the load
// instead of seeing a half-built table.

use crate::core::loader::{self, SheetNames};
use crate::core::model::Dataset;
use crate::util::error::LoadError;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

/// Identity of a loaded workbook.
#[derive(Debug, Clone, PartialEq, Eq)]
struct CacheKey {
    path: PathBuf,
    modified: SystemTime,
    sheets: SheetNames,
}

#[derive(Debug)]
struct CacheEntry {
    key: CacheKey,
    dataset: Arc<Dataset>,
    loaded_at: DateTime<Utc>,
}

/// A loaded dataset together with the time it was read from disk.
#[derive(Debug, Clone)]
pub struct CachedDataset {
    pub dataset: Arc<Dataset>,
    pub loaded_at: DateTime<Utc>,
    /// True when this call was served without reading the workbook.
    pub hit: bool,
}

/// Single-slot cache of the most recently loaded workbook.
#[derive(Debug, Default)]
pub struct LoadCache {
    slot: Mutex<Option<CacheEntry>>,
}

impl LoadCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached dataset for `path`, loading the workbook if the
    /// file changed since the last load.
    pub fn get_or_load(
        &self,
        path: &Path,
        sheets: &SheetNames,
    ) -> Result<CachedDataset, LoadError> {
        self.get_or_load_with(path, sheets, loader::load_workbook)
    }

    /// As [`LoadCache::get_or_load`], with the load step supplied by the caller.
    pub fn get_or_load_with<F>(
        &self,
        path: &Path,
        sheets: &SheetNames,
        load: F,
    ) -> Result<CachedDataset, LoadError>
    where
        F: FnOnce(&Path, &SheetNames) -> Result<Dataset, LoadError>,
    {
        let key = cache_key(path, sheets)?;

        // A poisoned lock only means an earlier load panicked; the slot
        // still holds either nothing or a complete entry.
        let mut slot = self.slot.lock().unwrap_or_else(|p| p.into_inner());

        if let Some(entry) = slot.as_ref().filter(|e| e.key == key) {
            tracing::debug!(path = %path.display(), "Workbook served from cache");
            return Ok(CachedDataset {
                dataset: Arc::clone(&entry.dataset),
                loaded_at: entry.loaded_at,
                hit: true,
            });
        }

        let dataset = Arc::new(load(path, sheets)?);
        let loaded_at = Utc::now();
        tracing::info!(
            path = %path.display(),
            regions = dataset.regions.len(),
            suburbs = dataset.suburbs.len(),
            "Dataset cached"
        );

        *slot = Some(CacheEntry {
            key,
            dataset: Arc::clone(&dataset),
            loaded_at,
        });

        Ok(CachedDataset {
            dataset,
            loaded_at,
            hit: false,
        })
    }

    /// Drop the cached dataset.
    pub fn invalidate(&self) {
        let mut slot = self.slot.lock().unwrap_or_else(|p| p.into_inner());
        *slot = None;
    }
}

fn cache_key(path: &Path, sheets: &SheetNames) -> Result<CacheKey, LoadError> {
    let meta = std::fs::metadata(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => LoadError::NotFound {
            path: path.to_path_buf(),
        },
        _ => LoadError::Io {
            path: path.to_path_buf(),
            source: e,
        },
    })?;
    let modified = meta.modified().map_err(|e| LoadError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let canonical = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());

    Ok(CacheKey {
        path: canonical,
        modified,
        sheets: sheets.clone(),
    })
}
