//! Compiled `patternProperties` regexes, shared by every query on a document.

use std::collections::HashMap;
use std::sync::RwLock;

use regex::Regex;
use tracing::debug;

use crate::document::SchemaDocument;

/// Per-document cache of compiled patterns, failures included.
///
/// Cloning a document starts the clone with an empty cache.
#[derive(Debug, Default)]
pub(crate) struct PatternCache {
    compiled: RwLock<HashMap<String, Result<Regex, regex::Error>>>,
}

impl Clone for PatternCache {
    fn clone(&self) -> Self {
        Self::default()
    }
}

impl PatternCache {
    fn get(&self, source: &str) -> Result<Regex, regex::Error> {
        let cached = self
            .compiled
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(source)
            .cloned();
        if let Some(entry) = cached {
            return entry;
        }

        let entry = Regex::new(source);
        if let Err(e) = &entry {
            debug!(pattern = %source, error = %e, "invalid patternProperties regex");
        }
        self.compiled
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .entry(source.to_string())
            .or_insert(entry)
            .clone()
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.compiled
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}

impl SchemaDocument {
    /// The compiled form of a `patternProperties` key, compiled at most once.
    pub(crate) fn pattern(&self, source: &str) -> Result<Regex, regex::Error> {
        self.patterns().get(source)
    }
}
