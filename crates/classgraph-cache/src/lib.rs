//! Cross-run cache for rendered diagrams.
//!
//! Rendering a diagram through PlantUML is the slow part of a documentation
//! run. Images are content addressed (the key is a hash of the markup and the
//! output format), so an entry never goes stale and needs no validation
//! beyond the cache format version.
//!
//! - [`Cache`]: Factory for named cache buckets
//! - [`CacheBucket`]: Key-value store for image bytes
//!
//! # Implementations
//!
//! - [`NullCache`] / [`NullCacheBucket`]: No-op implementations (always miss)
//! - [`FileCache`]: File-based implementation with version validation
//!
//! # Example
//!
//! ```
//! use classgraph_cache::{Cache, NullCache};
//!
//! let cache = NullCache;
//! let bucket = cache.bucket("diagrams");
//! bucket.set("3f2a", b"<svg/>");
//! assert_eq!(bucket.get("3f2a"), None); // NullCache always misses
//! ```

mod file;
pub use file::FileCache;

/// A named partition within a [`Cache`].
///
/// Failures never surface to the caller: a broken entry is a miss and a
/// failed store is dropped.
pub trait CacheBucket: Send + Sync {
    /// Retrieve the bytes stored under `key`, if any.
    fn get(&self, key: &str) -> Option<Vec<u8>>;

    /// Store `value` under `key`, replacing any previous entry.
    fn set(&self, key: &str, value: &[u8]);
}

/// Factory for named cache [`CacheBucket`]s.
///
/// Buckets with different names never see each other's entries.
pub trait Cache: Send + Sync {
    /// Open or create a named bucket (e.g. `"diagrams"`).
    fn bucket(&self, name: &str) -> Box<dyn CacheBucket>;
}

/// No-op [`CacheBucket`] that never stores or retrieves data.
pub struct NullCacheBucket;

impl CacheBucket for NullCacheBucket {
    fn get(&self, _key: &str) -> Option<Vec<u8>> {
        None
    }

    fn set(&self, _key: &str, _value: &[u8]) {}
}

/// No-op [`Cache`] used when caching is disabled.
pub struct NullCache;

impl Cache for NullCache {
    fn bucket(&self, _name: &str) -> Box<dyn CacheBucket> {
        Box::new(NullCacheBucket)
    }
}
