//! Read-only snapshot of the host-supplied input sources.
//!
//! The host environment — a web gateway, a CLI wrapper, a test harness —
//! assembles one [`InputSources`] per external invocation: query and form
//! parameters, cookies, session entries, environment variables, server
//! metadata, uploaded-file descriptors, and positional arguments. The
//! parameter resolver reads from this snapshot and never mutates it.

use std::collections::HashMap;

use serde_json::Value;

/// Snapshot of every host-supplied input space.
///
/// # Example
///
/// ```
/// use crescendo::InputSources;
/// use serde_json::json;
///
/// let sources = InputSources::new()
///     .with_get("foo", json!("bar"))
///     .with_argv(vec![json!("fort"), json!("run")]);
/// assert_eq!(sources.get("foo"), Some(&json!("bar")));
/// assert_eq!(sources.argv(1), Some(&json!("run")));
/// ```
#[derive(Debug, Clone, Default)]
pub struct InputSources {
    get: HashMap<String, Value>,
    post: HashMap<String, Value>,
    cookie: HashMap<String, Value>,
    session: HashMap<String, Value>,
    env: HashMap<String, Value>,
    server: HashMap<String, Value>,
    files: HashMap<String, Value>,
    argv: Vec<Value>,
}

impl InputSources {
    /// Creates an empty snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a query-string entry.
    #[must_use]
    pub fn with_get(mut self, key: impl Into<String>, value: Value) -> Self {
        self.get.insert(key.into(), value);
        self
    }

    /// Adds a form-post entry.
    #[must_use]
    pub fn with_post(mut self, key: impl Into<String>, value: Value) -> Self {
        self.post.insert(key.into(), value);
        self
    }

    /// Adds a cookie entry.
    #[must_use]
    pub fn with_cookie(mut self, key: impl Into<String>, value: Value) -> Self {
        self.cookie.insert(key.into(), value);
        self
    }

    /// Adds a session entry.
    #[must_use]
    pub fn with_session(mut self, key: impl Into<String>, value: Value) -> Self {
        self.session.insert(key.into(), value);
        self
    }

    /// Adds an environment entry.
    #[must_use]
    pub fn with_env(mut self, key: impl Into<String>, value: Value) -> Self {
        self.env.insert(key.into(), value);
        self
    }

    /// Adds a server-metadata entry.
    #[must_use]
    pub fn with_server(mut self, key: impl Into<String>, value: Value) -> Self {
        self.server.insert(key.into(), value);
        self
    }

    /// Adds an uploaded-file descriptor.
    #[must_use]
    pub fn with_file(mut self, key: impl Into<String>, value: Value) -> Self {
        self.files.insert(key.into(), value);
        self
    }

    /// Replaces the positional-argument vector.
    #[must_use]
    pub fn with_argv(mut self, argv: Vec<Value>) -> Self {
        self.argv = argv;
        self
    }

    /// Snapshots the process environment into the `env` space.
    #[must_use]
    pub fn capture_env(mut self) -> Self {
        for (key, value) in std::env::vars() {
            self.env.insert(key, Value::String(value));
        }
        self
    }

    /// Snapshots the process arguments into the `argv` space.
    #[must_use]
    pub fn capture_argv(mut self) -> Self {
        self.argv = std::env::args().map(Value::String).collect();
        self
    }

    /// Looks up a query-string entry.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.get.get(key)
    }

    /// Looks up a form-post entry.
    #[must_use]
    pub fn post(&self, key: &str) -> Option<&Value> {
        self.post.get(key)
    }

    /// Looks up a cookie entry.
    #[must_use]
    pub fn cookie(&self, key: &str) -> Option<&Value> {
        self.cookie.get(key)
    }

    /// Looks up a session entry.
    #[must_use]
    pub fn session(&self, key: &str) -> Option<&Value> {
        self.session.get(key)
    }

    /// Looks up an environment entry.
    #[must_use]
    pub fn env(&self, key: &str) -> Option<&Value> {
        self.env.get(key)
    }

    /// Looks up a server-metadata entry.
    #[must_use]
    pub fn server(&self, key: &str) -> Option<&Value> {
        self.server.get(key)
    }

    /// Looks up an uploaded-file descriptor.
    #[must_use]
    pub fn file(&self, key: &str) -> Option<&Value> {
        self.files.get(key)
    }

    /// Looks up a positional argument by zero-based index.
    #[must_use]
    pub fn argv(&self, index: usize) -> Option<&Value> {
        self.argv.get(index)
    }

    /// Looks up the merged request space: query string first, then form
    /// post.
    #[must_use]
    pub fn request(&self, key: &str) -> Option<&Value> {
        self.get.get(key).or_else(|| self.post.get(key))
    }
}
