//! File-based cache implementation.
//!
//! [`FileCache`] stores one file per entry, organized into buckets
//! (subdirectories). Entries are sharded by the first two characters of their
//! key so that large documentation sets do not end up with tens of thousands
//! of files in one directory:
//!
//! ```text
//! {root}/
//! +-- VERSION                  # cache format version
//! +-- diagrams/                # bucket "diagrams"
//!     +-- 3f/
//!         +-- 3fa94c...e1      # raw image bytes
//! ```
//!
//! Entries are written to a temporary file and renamed into place, so a
//! concurrent reader never sees a half-written image.
//!
//! On construction, [`FileCache`] validates the `VERSION` file in the cache
//! root. If the version mismatches or is missing, the entire cache directory
//! is wiped and recreated.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::{Cache, CacheBucket};

/// File-based [`Cache`] rooted at a directory on disk.
pub struct FileCache {
    root: PathBuf,
}

impl FileCache {
    /// Create a file-based cache at `root`, validating the cache version.
    ///
    /// Errors during validation are logged but never fatal; a cache that
    /// cannot be written simply misses.
    #[must_use]
    pub fn new(root: PathBuf, version: &str) -> Self {
        validate_version(&root, version);
        Self { root }
    }
}

impl Cache for FileCache {
    fn bucket(&self, name: &str) -> Box<dyn CacheBucket> {
        Box::new(FileCacheBucket {
            dir: self.root.join(name),
        })
    }
}

/// A single bucket backed by a directory on disk.
struct FileCacheBucket {
    dir: PathBuf,
}

impl FileCacheBucket {
    /// Location of `key`, or `None` for keys that could escape the bucket.
    fn entry_path(&self, key: &str) -> Option<PathBuf> {
        let valid = key.len() > 2
            && key
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
        if !valid {
            tracing::debug!(key, "rejected cache key");
            return None;
        }
        Some(self.dir.join(&key[..2]).join(key))
    }
}

impl CacheBucket for FileCacheBucket {
    fn get(&self, key: &str) -> Option<Vec<u8>> {
        fs::read(self.entry_path(key)?).ok()
    }

    fn set(&self, key: &str, value: &[u8]) {
        let Some(path) = self.entry_path(key) else {
            return;
        };
        if let Err(e) = write_atomic(&path, value) {
            tracing::debug!(path = %path.display(), "failed to store cache entry: {e}");
        }
    }
}

fn write_atomic(path: &Path, value: &[u8]) -> std::io::Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| std::io::Error::other("cache entry has no parent directory"))?;
    fs::create_dir_all(parent)?;
    let mut file = NamedTempFile::new_in(parent)?;
    file.write_all(value)?;
    file.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Validate the cache version, wiping the directory on mismatch.
fn validate_version(root: &Path, version: &str) {
    let version_file = root.join("VERSION");

    match fs::read_to_string(&version_file) {
        Ok(stored) if stored == version => {
            tracing::debug!("cache version matches: {version}");
            return;
        }
        Ok(stored) => {
            tracing::info!(
                "cache version mismatch (stored={stored}, current={version}), wiping cache"
            );
        }
        Err(_) => {
            tracing::info!("no cache VERSION file found, initializing cache");
        }
    }

    if root.exists()
        && let Err(e) = fs::remove_dir_all(root)
    {
        tracing::warn!("failed to remove cache directory: {e}");
    }
    if let Err(e) = fs::create_dir_all(root) {
        tracing::warn!("failed to create cache directory: {e}");
        return;
    }
    if let Err(e) = fs::write(&version_file, version) {
        tracing::warn!("failed to write cache VERSION file: {e}");
    }
}
