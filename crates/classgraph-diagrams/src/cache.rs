//! Rendered image cache key computation.
//!
//! Provides [`DiagramKey`] for computing content-based hashes used as cache keys.

use sha2::{Digest, Sha256};

use crate::format::RenderFormat;

/// Parameters that determine a rendered image.
#[derive(Debug, Clone, Copy)]
pub struct DiagramKey<'a> {
    /// Complete markup document (`@startuml` .. `@enduml`).
    pub markup: &'a str,
    /// Output format.
    pub format: RenderFormat,
}

impl DiagramKey<'_> {
    /// Compute a content hash for this diagram key.
    ///
    /// # Hash Format
    ///
    /// SHA-256 of `"{format}:{markup}"`, hex encoded.
    #[must_use]
    pub fn compute_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.format.as_str().as_bytes());
        hasher.update(b":");
        hasher.update(self.markup.as_bytes());
        hex::encode(hasher.finalize())
    }
}
