//! Read-through cache of parsed schema documents.
//!
//! The engine itself never owns documents. A [`SchemaRegistry`] is what a
//! caller holds: it asks a [`SchemaSource`] for raw text the first time a type
//! is requested, parses it once, and hands out shared `Arc`s afterwards.
//! A type whose schema is missing or fails to parse is remembered as having
//! no schema, so one broken document never takes the session down.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use tracing::{debug, warn};

use crate::document::SchemaDocument;
use crate::error::LoadError;
use crate::loader::{load_document, schema_file_name};

/// Supplies schema documents by resource type name.
pub trait SchemaSource {
    /// Returns the document for `type_name`, or `Ok(None)` if the source
    /// does not know the type.
    fn load(&self, type_name: &str) -> Result<Option<SchemaDocument>, LoadError>;
}

/// [`SchemaSource`] backed by a directory of published schema files.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl SchemaSource for DirectorySource {
    fn load(&self, type_name: &str) -> Result<Option<SchemaDocument>, LoadError> {
        match load_document(&self.root.join(schema_file_name(type_name))) {
            Ok(doc) => Ok(Some(doc)),
            Err(LoadError::FileNotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// [`SchemaSource`] backed by schema texts held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    texts: HashMap<String, String>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register raw schema text under a type name.
    pub fn with_schema(mut self, type_name: impl Into<String>, text: impl Into<String>) -> Self {
        self.texts.insert(type_name.into(), text.into());
        self
    }
}

impl SchemaSource for MemorySource {
    fn load(&self, type_name: &str) -> Result<Option<SchemaDocument>, LoadError> {
        self.texts
            .get(type_name)
            .map(|text| SchemaDocument::parse(text).map_err(LoadError::from))
            .transpose()
    }
}

/// Caller-owned cache of parsed documents, safe to share across threads.
pub struct SchemaRegistry<S> {
    source: S,
    cache: RwLock<HashMap<String, Option<Arc<SchemaDocument>>>>,
}

impl<S: SchemaSource> SchemaRegistry<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// The document for `type_name`, loading it on first use.
    ///
    /// Returns `None` when the source has no schema for the type or the
    /// schema failed to load; that outcome is cached too.
    pub fn get(&self, type_name: &str) -> Option<Arc<SchemaDocument>> {
        if let Some(entry) = self.read_cache().get(type_name) {
            return entry.clone();
        }

        let entry = match self.source.load(type_name) {
            Ok(Some(doc)) => {
                debug!(type_name, "loaded resource schema");
                Some(Arc::new(doc))
            }
            Ok(None) => {
                debug!(type_name, "no schema available");
                None
            }
            Err(e) => {
                warn!(type_name, error = %e, "failed to load resource schema, treating type as unknown");
                None
            }
        };

        self.write_cache()
            .entry(type_name.to_string())
            .or_insert(entry)
            .clone()
    }

    /// Drop the cached entry for `type_name`; the next `get` reloads it.
    pub fn invalidate(&self, type_name: &str) -> bool {
        self.write_cache().remove(type_name).is_some()
    }

    /// Type names with a cached entry, schema or not, sorted.
    pub fn cached_types(&self) -> Vec<String> {
        let mut names: Vec<String> = self.read_cache().keys().cloned().collect();
        names.sort();
        names
    }

    fn read_cache(
        &self,
    ) -> std::sync::RwLockReadGuard<'_, HashMap<String, Option<Arc<SchemaDocument>>>> {
        self.cache.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_cache(
        &self,
    ) -> std::sync::RwLockWriteGuard<'_, HashMap<String, Option<Arc<SchemaDocument>>>> {
        self.cache.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
