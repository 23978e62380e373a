//! Run-scoped memoization of box markup.
//!
//! A base class shared by many subclasses shows up in every one of their
//! diagrams. [`CodeGenCache`] stores the formatted box per [`CacheKey`] so it
//! is formatted once per documentation run. The cache is owned by one
//! generator; a new run creates a new cache.

use std::collections::HashMap;

use crate::boxes::BoxFormatter;
use crate::model::{Node, NodeId};

/// Identity of one formatted box.
///
/// `type_arguments` is the comma-joined argument list applied at the use site,
/// empty for non-generic nodes and raw templates.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub node: NodeId,
    pub type_arguments: String,
}

impl CacheKey {
    #[must_use]
    pub fn new(node: NodeId, type_arguments: &[String]) -> Self {
        Self {
            node,
            type_arguments: type_arguments.join(", "),
        }
    }
}

/// Write-once map from [`CacheKey`] to box lines.
#[derive(Debug, Default)]
pub struct CodeGenCache {
    entries: HashMap<CacheKey, Vec<String>>,
}

impl CodeGenCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the lines stored for `key`, computing and storing them on first use.
    ///
    /// `compute` runs at most once per key for the lifetime of the cache.
    pub fn get_or_create<F>(&mut self, key: CacheKey, compute: F) -> &[String]
    where
        F: FnOnce() -> Vec<String>,
    {
        self.entries.entry(key).or_insert_with(compute)
    }

    /// Number of stored boxes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// [`BoxFormatter`] decorator that consults a [`CodeGenCache`] before
/// delegating to the wrapped formatter.
#[derive(Debug)]
pub struct CachingBoxFormatter<F> {
    inner: F,
    cache: CodeGenCache,
}

impl<F: BoxFormatter> CachingBoxFormatter<F> {
    #[must_use]
    pub fn new(inner: F) -> Self {
        Self {
            inner,
            cache: CodeGenCache::new(),
        }
    }

    /// The cache filled so far.
    #[must_use]
    pub fn cache(&self) -> &CodeGenCache {
        &self.cache
    }
}

impl<F: BoxFormatter> BoxFormatter for CachingBoxFormatter<F> {
    fn format_box(&mut self, node: &Node, type_arguments: &[String]) -> Vec<String> {
        let Self { inner, cache } = self;
        cache
            .get_or_create(CacheKey::new(node.id, type_arguments), || {
                inner.format_box(node, type_arguments)
            })
            .to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NodeKind;

    /// Formatter that counts how often it is asked for a box.
    #[derive(Default)]
    struct CountingFormatter {
        calls: usize,
    }

    impl BoxFormatter for CountingFormatter {
        fn format_box(&mut self, node: &Node, type_arguments: &[String]) -> Vec<String> {
            self.calls += 1;
            vec![format!("class {}<{}> {{", node.name, type_arguments.join(", ")), "}".to_owned()]
        }
    }

    #[test]
    fn test_get_or_create_computes_once() {
        let mut cache = CodeGenCache::new();
        let mut calls = 0;
        let key = CacheKey::new(NodeId(7), &[]);

        let first = cache
            .get_or_create(key.clone(), || {
                calls += 1;
                vec!["class Super {".to_owned(), "}".to_owned()]
            })
            .to_vec();
        let second = cache
            .get_or_create(key, || {
                calls += 1;
                vec!["something else".to_owned()]
            })
            .to_vec();

        assert_eq!(first, second);
        assert_eq!(calls, 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_type_arguments_are_part_of_the_key() {
        let mut cache = CodeGenCache::new();
        cache.get_or_create(CacheKey::new(NodeId(1), &[]), Vec::new);
        cache.get_or_create(CacheKey::new(NodeId(1), &["string".to_owned()]), Vec::new);
        cache.get_or_create(CacheKey::new(NodeId(2), &[]), Vec::new);

        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn test_caching_formatter_delegates_once_per_key() {
        let node = Node::new(1, "Base", NodeKind::Class);
        let mut formatter = CachingBoxFormatter::new(CountingFormatter::default());

        let first = formatter.format_box(&node, &[]);
        let second = formatter.format_box(&node, &[]);
        let generic = formatter.format_box(&node, &["number".to_owned()]);

        assert_eq!(first, second);
        assert_ne!(first, generic);
        assert_eq!(formatter.inner.calls, 2);
        assert_eq!(formatter.cache().len(), 2);
    }

    #[test]
    fn test_new_cache_starts_empty() {
        let node = Node::new(1, "Base", NodeKind::Class);
        let mut run = CachingBoxFormatter::new(CountingFormatter::default());
        run.format_box(&node, &[]);

        let next_run = CachingBoxFormatter::new(CountingFormatter::default());
        assert!(next_run.cache().is_empty());
    }
}
