// Local disk cache for schedule, roster and telemetry data

use std::fs;
use std::path::PathBuf;

use log::{debug, warn};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::{TelemetrySample, TelemetrySeries};
use crate::errors::ApexviewError;

/// File-based cache below an explicit root directory.
///
/// Small documents (schedule, roster, session keys) are stored as JSON,
/// telemetry series as JSON-lines with one sample per line. A cache entry
/// that fails to read or parse is treated as absent so the caller refetches
/// it; the cache never fails a load.
pub struct CacheStore {
    root: PathBuf,
}

impl CacheStore {
    /// Create a cache rooted at `root`, creating the directory if absent.
    pub fn new(root: PathBuf) -> Result<Self, ApexviewError> {
        if !root.exists() {
            fs::create_dir_all(&root).map_err(|e| ApexviewError::CacheIOError { source: e })?;
        }
        Ok(Self { root })
    }

    /// Create a cache in the platform cache directory.
    pub fn new_default() -> Result<Self, ApexviewError> {
        Self::new(Self::default_cache_path()?)
    }

    pub fn default_cache_path() -> Result<PathBuf, ApexviewError> {
        let cache_dir = dirs::cache_dir().ok_or(ApexviewError::NoCacheDir)?;
        Ok(cache_dir.join("apexview"))
    }

    pub fn root(&self) -> &PathBuf {
        &self.root
    }

    fn path_for(&self, key: &str, extension: &str) -> PathBuf {
        self.root
            .join(format!("{}.{}", Self::normalize_key(key), extension))
    }

    /// Normalize a cache key for consistent, filesystem-safe file naming.
    fn normalize_key(key: &str) -> String {
        key.to_lowercase()
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { '_' })
            .collect()
    }

    pub fn load_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let path = self.path_for(key, "json");
        if !path.exists() {
            return None;
        }
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) => {
                warn!("Could not read cache entry {:?}: {}", path, e);
                return None;
            }
        };
        match serde_json::from_str(&content) {
            Ok(value) => {
                debug!("Cache hit for {}", key);
                Some(value)
            }
            Err(e) => {
                warn!("Corrupt cache entry {:?}, refetching: {}", path, e);
                None
            }
        }
    }

    pub fn save_json<T: Serialize>(&self, key: &str, value: &T) -> Result<(), ApexviewError> {
        let file = fs::File::create(self.path_for(key, "json"))
            .map_err(|e| ApexviewError::CacheIOError { source: e })?;
        serde_json::to_writer(file, value)
            .map_err(|e| ApexviewError::CacheSerializeError { source: e })
    }

    pub fn load_series(&self, key: &str) -> Option<TelemetrySeries> {
        let path = self.path_for(key, "jsonl");
        if !path.exists() {
            return None;
        }
        let samples = match serde_jsonlines::json_lines(&path) {
            Ok(lines) => match lines.collect::<Result<Vec<TelemetrySample>, std::io::Error>>() {
                Ok(samples) => samples,
                Err(e) => {
                    warn!("Corrupt telemetry cache {:?}, refetching: {}", path, e);
                    return None;
                }
            },
            Err(e) => {
                warn!("Could not read telemetry cache {:?}: {}", path, e);
                return None;
            }
        };
        match TelemetrySeries::new(samples) {
            Ok(series) => {
                debug!("Cache hit for series {}", key);
                Some(series)
            }
            Err(e) => {
                warn!("Invalid telemetry cache {:?}, refetching: {}", path, e);
                None
            }
        }
    }

    pub fn save_series(&self, key: &str, series: &TelemetrySeries) -> Result<(), ApexviewError> {
        serde_jsonlines::write_json_lines(self.path_for(key, "jsonl"), series.samples())
            .map_err(|e| ApexviewError::CacheIOError { source: e })
    }
}
