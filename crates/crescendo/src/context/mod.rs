//! The execution context: mutable state shared across a command chain.
//!
//! One context exists per external invocation. Commands read what earlier
//! commands wrote, add their own entries, and occasionally remove or
//! replace values. When a request forwards into another request the *same*
//! context is threaded through, so accumulated state survives the jump.
//!
//! Beyond its ordered key/value store the context carries handles to the
//! collaborators every command may need: the logger set, the datasource
//! manager, the cache manager, the request mapper, and the output channel.

use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;

use crate::cache::CacheManager;
use crate::datasource::{Datasource, DatasourceManager};
use crate::log::{LogCategory, LoggerSet};
use crate::mapper::{IdentityMapper, RequestMapper};
use crate::output::OutputChannel;

/// Mutable, insertion-ordered state store spanning one or more chained
/// requests within a single external invocation.
///
/// # Example
///
/// ```
/// use crescendo::ExecutionContext;
/// use serde_json::json;
///
/// let mut cxt = ExecutionContext::default();
/// cxt.add("user", json!("alice"));
/// assert!(cxt.has("user"));
/// assert_eq!(cxt.get("user"), Some(&json!("alice")));
/// ```
pub struct ExecutionContext {
    entries: IndexMap<String, Value>,
    loggers: Arc<LoggerSet>,
    datasources: Arc<DatasourceManager>,
    caches: Arc<CacheManager>,
    mapper: Arc<dyn RequestMapper>,
    output: OutputChannel,
}

impl Default for ExecutionContext {
    /// A detached context: empty store, no-op collaborators, output to a
    /// null sink. Useful for unit tests and standalone command execution.
    fn default() -> Self {
        Self::new(
            Arc::new(LoggerSet::new()),
            Arc::new(DatasourceManager::new()),
            Arc::new(CacheManager::new()),
            Arc::new(IdentityMapper),
        )
    }
}

impl ExecutionContext {
    /// Creates an empty context wired to the given collaborators.
    #[must_use]
    pub fn new(
        loggers: Arc<LoggerSet>,
        datasources: Arc<DatasourceManager>,
        caches: Arc<CacheManager>,
        mapper: Arc<dyn RequestMapper>,
    ) -> Self {
        Self {
            entries: IndexMap::new(),
            loggers,
            datasources,
            caches,
            mapper,
            output: OutputChannel::new(Box::new(std::io::sink())),
        }
    }

    /// Seeds the context with initial entries.
    #[must_use]
    pub fn with_seed(mut self, seed: impl IntoIterator<Item = (String, Value)>) -> Self {
        for (name, value) in seed {
            self.entries.insert(name, value);
        }
        self
    }

    /// Returns `true` when an entry with the given name exists.
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Looks up an entry by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.get(name)
    }

    /// Looks up an entry for in-place replacement. This is the supported
    /// way for a command to modify a value it previously fetched.
    #[must_use]
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.entries.get_mut(name)
    }

    /// Adds an entry, replacing any existing entry with the same name.
    pub fn add(&mut self, name: impl Into<String>, value: Value) {
        self.entries.insert(name.into(), value);
    }

    /// Merges entries into the context. Existing entries win: incoming
    /// values fill gaps and never override current state.
    pub fn add_all(&mut self, entries: impl IntoIterator<Item = (String, Value)>) {
        for (name, value) in entries {
            self.entries.entry(name).or_insert(value);
        }
    }

    /// Removes an entry, returning it if it was present.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.entries.shift_remove(name)
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns a copy of the store as an ordered map.
    #[must_use]
    pub fn to_map(&self) -> IndexMap<String, Value> {
        self.entries.clone()
    }

    /// Replaces the whole store with the given entries.
    pub fn replace_with(&mut self, entries: impl IntoIterator<Item = (String, Value)>) {
        self.entries = entries.into_iter().collect();
    }

    /// Logs a message through the logger collaborator.
    pub fn log(&self, message: &str, category: LogCategory) {
        self.loggers.log(message, category);
    }

    /// Retrieves a named datasource, or the default when no name is given.
    #[must_use]
    pub fn datasource(&self, name: Option<&str>) -> Option<Arc<dyn Datasource>> {
        self.datasources.datasource(name)
    }

    /// Returns the logger set.
    #[must_use]
    pub fn logger_set(&self) -> &Arc<LoggerSet> {
        &self.loggers
    }

    /// Returns the datasource manager.
    #[must_use]
    pub fn datasource_manager(&self) -> &Arc<DatasourceManager> {
        &self.datasources
    }

    /// Returns the cache manager. Cacheable commands store and fetch their
    /// own results through this handle.
    #[must_use]
    pub fn cache_manager(&self) -> &Arc<CacheManager> {
        &self.caches
    }

    /// Returns the request mapper for this invocation.
    #[must_use]
    pub fn request_mapper(&self) -> &Arc<dyn RequestMapper> {
        &self.mapper
    }

    /// Writes bytes to the invocation's output channel.
    ///
    /// # Errors
    ///
    /// Propagates the output sink's I/O error.
    pub fn write_output(&self, bytes: &[u8]) -> std::io::Result<()> {
        self.output.write(bytes)
    }

    /// Writes a string to the invocation's output channel.
    ///
    /// # Errors
    ///
    /// Propagates the output sink's I/O error.
    pub fn write_output_str(&self, text: &str) -> std::io::Result<()> {
        self.output.write_str(text)
    }

    /// Rebinds the context to the dispatcher's output channel. Called at
    /// context setup so buffering captures everything commands render, even
    /// on a caller-supplied context.
    pub(crate) fn attach_output(&mut self, output: OutputChannel) {
        self.output = output;
    }
}

impl std::fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("entries", &self.entries)
            .field("loggers", &self.loggers)
            .finish_non_exhaustive()
    }
}
