//! Persisted-region abstraction
//!
//! The core keeps four independent named regions: list entries, reviews,
//! recent search terms, and recommendation-history sets. Each region is one
//! JSON document, read and replaced as a whole — there are no incremental
//! appends, so a crash mid-write can never corrupt previously-committed
//! state.
//!
//! Stores receive a `Region` by injection and never touch the underlying
//! persistence mechanism directly, which keeps them testable against the
//! in-memory fake.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde::de::DeserializeOwned;
use tracing::warn;

use crate::{Error, Result};

/// Region name for the user's anime list
pub const LIST_REGION: &str = "anidojo_list";
/// Region name for reviews
pub const REVIEWS_REGION: &str = "anidojo_reviews";
/// Region name for recent search terms
pub const SEARCH_HISTORY_REGION: &str = "anidojo_search_history";
/// Region name for saved recommendation sets
pub const RECOMMENDATION_HISTORY_REGION: &str = "anidojo_recommendation_history";

/// One named, independently readable/writable persisted region.
///
/// `read` returns `None` when the region has never been written. `write`
/// replaces the whole region atomically.
pub trait Region: Send + Sync {
    fn read(&self) -> Result<Option<String>>;
    fn write(&self, payload: &str) -> Result<()>;
}

/// File-backed region: one JSON file per region under the data directory.
///
/// Writes go to a temp file first and are moved into place with an atomic
/// rename, so the committed document is always either the old or the new
/// version in full.
pub struct FileRegion {
    path: PathBuf,
}

impl FileRegion {
    /// Region stored at `dir/<name>.json`
    pub fn new(dir: &Path, name: &str) -> Self {
        Self {
            path: dir.join(format!("{}.json", name)),
        }
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Region for FileRegion {
    fn read(&self) -> Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(payload) => Ok(Some(payload)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::Storage(format!(
                "failed to read region {:?}: {}",
                self.path, e
            ))),
        }
    }

    fn write(&self, payload: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                Error::Storage(format!("failed to create data dir {:?}: {}", parent, e))
            })?;
        }

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, payload)
            .map_err(|e| Error::Storage(format!("failed to write region {:?}: {}", tmp, e)))?;
        fs::rename(&tmp, &self.path).map_err(|e| {
            Error::Storage(format!("failed to commit region {:?}: {}", self.path, e))
        })?;
        Ok(())
    }
}

/// In-memory region for tests and ephemeral sessions
#[derive(Default)]
pub struct MemoryRegion {
    payload: RwLock<Option<String>>,
}

impl MemoryRegion {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populated region, for corrupt-data and migration tests
    pub fn with_payload(payload: &str) -> Self {
        Self {
            payload: RwLock::new(Some(payload.to_string())),
        }
    }
}

impl Region for MemoryRegion {
    fn read(&self) -> Result<Option<String>> {
        Ok(self
            .payload
            .read()
            .map_err(|_| Error::Storage("region lock poisoned".to_string()))?
            .clone())
    }

    fn write(&self, payload: &str) -> Result<()> {
        *self
            .payload
            .write()
            .map_err(|_| Error::Storage("region lock poisoned".to_string()))? =
            Some(payload.to_string());
        Ok(())
    }
}

/// Load a whole-collection region, tolerating absence and corruption.
///
/// An unreadable or unparsable region starts the store empty rather than
/// failing: a corrupt document must never brick the application. The
/// corruption is logged; the next successful mutation overwrites it.
pub fn load_collection<T: DeserializeOwned>(region: &dyn Region, name: &str) -> Vec<T> {
    let payload = match region.read() {
        Ok(Some(payload)) => payload,
        Ok(None) => return Vec::new(),
        Err(e) => {
            warn!(region = name, error = %e, "region unreadable, starting empty");
            return Vec::new();
        }
    };

    match serde_json::from_str(&payload) {
        Ok(items) => items,
        Err(e) => {
            warn!(region = name, error = %e, "region corrupt, starting empty");
            Vec::new()
        }
    }
}
