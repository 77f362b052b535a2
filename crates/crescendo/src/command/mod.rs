//! The command contract: one unit of work in a request chain.
//!
//! Commands are polymorphic by capability, not by hierarchy. Every command
//! executes against a resolved parameter set and the shared execution
//! context; beyond that, a command *may* describe itself for explain mode
//! and *may* accept event listeners. Both extras are probed through default
//! trait methods, so plain commands implement nothing but [`Command::execute`].
//!
//! Control flow out of a command is a value, not an exception: `execute`
//! returns `Err(CommandSignal)` to interrupt the chain, forward to another
//! request, or report a recoverable failure. Only the dispatcher interprets
//! these signals.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;

use crate::context::ExecutionContext;
use crate::error::CommandSignal;

/// One unit of work in a request chain.
///
/// # Example
///
/// ```
/// use crescendo::{Command, CommandSignal, ExecutionContext, ParameterSet};
/// use serde_json::json;
///
/// #[derive(Default)]
/// struct Greet;
///
/// impl Command for Greet {
///     fn execute(
///         &mut self,
///         params: &ParameterSet,
///         cxt: &mut ExecutionContext,
///     ) -> Result<(), CommandSignal> {
///         let name = params.get_str("who").unwrap_or("world");
///         cxt.add("greeting", json!(format!("hello {name}")));
///         Ok(())
///     }
/// }
/// ```
pub trait Command: Send {
    /// Executes against the resolved parameters and the shared context.
    ///
    /// # Errors
    ///
    /// Returns a [`CommandSignal`] to interrupt, forward, or mark this
    /// command as failed. Returning `Ok(())` continues the chain.
    fn execute(
        &mut self,
        params: &ParameterSet,
        cxt: &mut ExecutionContext,
    ) -> Result<(), CommandSignal>;

    /// Declares whether this command's own results are eligible for
    /// command-level caching. The dispatcher does not cache for commands;
    /// cacheable commands reach the cache manager through the context.
    fn is_cacheable(&self) -> bool {
        false
    }

    /// Self-description rendered in explain mode. Commands returning `None`
    /// get a synthesised line built from their descriptor.
    fn explain(&self) -> Option<String> {
        None
    }

    /// Capability probe for event registration. Commands that accept
    /// listeners return `Some(self)`.
    fn as_observable(&mut self) -> Option<&mut dyn Observable> {
        None
    }
}

/// Capability for commands that accept lifecycle event listeners.
pub trait Observable {
    /// Hands the configured listeners to the command before execution. The
    /// command fires them itself via [`ListenerSet::fire`].
    fn set_event_handlers(&mut self, listeners: ListenerSet);
}

/// Shared handler invoked when a command fires a named event.
pub type Listener = Arc<dyn Fn(&str, &Value) + Send + Sync>;

/// Listeners configured for one command, keyed by event name.
#[derive(Clone, Default)]
pub struct ListenerSet {
    handlers: HashMap<String, Vec<Listener>>,
}

impl ListenerSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a handler for the named event.
    pub fn insert(&mut self, event: impl Into<String>, listener: Listener) {
        self.handlers.entry(event.into()).or_default().push(listener);
    }

    /// Invokes every handler registered for the named event.
    pub fn fire(&self, event: &str, payload: &Value) {
        if let Some(listeners) = self.handlers.get(event) {
            for listener in listeners {
                listener(event, payload);
            }
        }
    }

    /// Returns `true` when no handlers are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Returns the number of events with at least one handler.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }
}

impl fmt::Debug for ListenerSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let events: Vec<(&str, usize)> = self
            .handlers
            .iter()
            .map(|(event, listeners)| (event.as_str(), listeners.len()))
            .collect();
        f.debug_struct("ListenerSet").field("events", &events).finish()
    }
}

/// Resolved parameters handed to a command for one execution.
///
/// A parameter whose whole fallback chain came up absent — and that has no
/// static default — is *omitted* from the set, never stored as null.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterSet {
    values: IndexMap<String, Value>,
}

impl ParameterSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up a parameter value.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Looks up a parameter as a string slice, when it is a JSON string.
    #[must_use]
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.values.get(name).and_then(Value::as_str)
    }

    /// Returns `true` when a value is present for `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Returns the number of resolved parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` when no parameters resolved.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates parameters in resolution order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub(crate) fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }
}
