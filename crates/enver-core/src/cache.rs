//! Persistent catalog snapshot.
//!
//! The snapshot stores every known release (minus install state) together
//! with the per-stream release counts that were current when it was written.
//! Those counts are the only signal used to decide whether the snapshot can
//! be reused: if any stream reports a different count the whole snapshot is
//! considered stale.

use chrono::{DateTime, Utc};
use enver_schema::{ReleaseRecord, StreamSummary};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{CatalogError, Result};

/// Per-stream fingerprint stored in the snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedStream {
    pub total_count: u64,
    #[serde(default)]
    pub latest_version: String,
    #[serde(default)]
    pub lts: bool,
}

impl From<&StreamSummary> for CachedStream {
    fn from(stream: &StreamSummary) -> Self {
        Self {
            total_count: stream.total_count,
            latest_version: stream.latest_version.clone(),
            lts: stream.is_lts,
        }
    }
}

/// On-disk catalog snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheSnapshot {
    #[serde(default)]
    pub streams: BTreeMap<String, CachedStream>,
    #[serde(default)]
    pub releases: Vec<ReleaseRecord>,
    pub updated_at: DateTime<Utc>,
}

impl CacheSnapshot {
    /// Every `major.minor` line mentioned by the snapshot, from stream keys
    /// and from cached release versions.
    pub fn major_minors(&self) -> impl Iterator<Item = &str> {
        self.streams
            .keys()
            .map(String::as_str)
            .chain(self.releases.iter().map(ReleaseRecord::major_minor))
    }
}

/// Reads and writes the catalog snapshot file.
#[derive(Debug, Clone)]
pub struct CacheStore {
    path: PathBuf,
}

impl CacheStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `$ENVER_HOME/cache/releases.json`.
    pub fn open_default() -> Self {
        Self::new(crate::paths::catalog_cache_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the snapshot.
    ///
    /// Returns `Ok(None)` when no snapshot has been written yet.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::CorruptCache`] if the file exists but cannot be
    /// parsed, or an IO error if it cannot be read.
    pub fn load(&self) -> Result<Option<CacheSnapshot>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no catalog cache");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let snapshot: CacheSnapshot =
            serde_json::from_str(&content).map_err(|source| CatalogError::CorruptCache {
                path: self.path.clone(),
                source,
            })?;
        debug!(
            releases = snapshot.releases.len(),
            streams = snapshot.streams.len(),
            "loaded catalog cache"
        );
        Ok(Some(snapshot))
    }

    /// Write a new snapshot, replacing any previous one.
    ///
    /// The JSON is written to a temporary file in the same directory and then
    /// renamed over the target, so readers never see a partial file.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache directory cannot be created or the file
    /// cannot be written.
    pub fn save(
        &self,
        streams: &[StreamSummary],
        releases: &[ReleaseRecord],
    ) -> Result<CacheSnapshot> {
        let snapshot = CacheSnapshot {
            streams: streams
                .iter()
                .map(|s| (s.major_minor.clone(), CachedStream::from(s)))
                .collect(),
            releases: releases.to_vec(),
            updated_at: Utc::now(),
        };

        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir)?;

        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut tmp, &snapshot)?;
        tmp.flush()?;
        tmp.persist(&self.path).map_err(|e| CatalogError::Io(e.error))?;

        info!(
            releases = snapshot.releases.len(),
            path = %self.path.display(),
            "catalog cache written"
        );
        Ok(snapshot)
    }

    /// Delete the snapshot. A missing file is not an error.
    ///
    /// # Errors
    ///
    /// Returns an IO error if the file exists but cannot be removed.
    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Whether `snapshot` can be reused given the streams currently reported.
///
/// All-or-nothing: a snapshot without streams is never valid, and a single
/// stream whose count differs (or is missing) invalidates everything.
pub fn is_valid(snapshot: &CacheSnapshot, current: &[StreamSummary]) -> bool {
    if snapshot.streams.is_empty() {
        return false;
    }
    current.iter().all(|stream| {
        snapshot
            .streams
            .get(&stream.major_minor)
            .is_some_and(|cached| cached.total_count == stream.total_count)
    })
}
