//! Cache of loaded template lines.
//!
//! Templates are loaded lazily the first time they are rendered or
//! included and are immutable afterwards, so a loader keeps them here and
//! hands out shared references for every later use within a build.

use std::collections::HashMap;
use std::sync::Arc;

/// Loaded templates keyed by template name, with hit/miss accounting.
#[derive(Debug, Default)]
pub(crate) struct TemplateCache {
    cache: HashMap<String, Arc<[String]>>,
    hits: usize,
    misses: usize,
}

impl TemplateCache {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn get(&mut self, name: &str) -> Option<Arc<[String]>> {
        if let Some(lines) = self.cache.get(name) {
            self.hits += 1;
            Some(Arc::clone(lines))
        } else {
            self.misses += 1;
            None
        }
    }

    pub(crate) fn insert(&mut self, name: String, lines: Arc<[String]>) {
        self.cache.insert(name, lines);
    }

    pub(crate) fn clear(&mut self) {
        self.cache.clear();
        self.hits = 0;
        self.misses = 0;
    }

    /// `(hits, misses)` since creation or the last [`clear`](Self::clear).
    pub(crate) fn stats(&self) -> (usize, usize) {
        (self.hits, self.misses)
    }

    pub(crate) fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}
