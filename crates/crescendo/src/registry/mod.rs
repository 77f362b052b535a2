//! The request registry: the explicitly constructed mapping from request
//! names to command chains.
//!
//! Nothing here is ambient or global. An application builds one [`Registry`]
//! at startup, registers its [`RequestSpec`]s, and hands the registry to the
//! dispatcher. A spec stores command *factories*; looking a request up
//! materialises a fresh [`Request`] whose command instances are constructed
//! once and reused for that dispatch.
//!
//! Requests marked internal are reachable only when internal resolution is
//! permitted — which the dispatcher grants to forwards, so applications can
//! declare continuation requests that assume earlier chains already ran.

use std::sync::Arc;

use indexmap::IndexMap;

use crate::command::{Command, Listener, ListenerSet};
use crate::error::DispatchError;
use crate::params::ParamSpec;
use crate::request::{CommandDescriptor, Request};

type CommandFactory = Arc<dyn Fn() -> Box<dyn Command> + Send + Sync>;

/// Registration-side description of one command slot: a factory plus the
/// declarative parameter and listener configuration.
///
/// # Example
///
/// ```
/// use crescendo::{Command, CommandSignal, CommandSpec, ExecutionContext, ParamSpec, ParameterSet};
/// use serde_json::json;
///
/// #[derive(Default)]
/// struct Hello;
/// impl Command for Hello {
///     fn execute(&mut self, p: &ParameterSet, cxt: &mut ExecutionContext)
///         -> Result<(), CommandSignal>
///     {
///         cxt.add("hello", p.get("who").cloned().unwrap_or(json!(null)));
///         Ok(())
///     }
/// }
///
/// let spec = CommandSpec::new("hello", Hello::default)
///     .param(ParamSpec::new("who").from("get:who").default_value(json!("world")));
/// assert_eq!(spec.name(), "hello");
/// ```
#[derive(Clone)]
pub struct CommandSpec {
    name: String,
    kind: String,
    factory: CommandFactory,
    params: Vec<ParamSpec>,
    listeners: ListenerSet,
}

impl CommandSpec {
    /// Creates a command slot with the given name and instance factory.
    /// The command's type name is recorded for explain mode.
    #[must_use]
    pub fn new<C, F>(name: impl Into<String>, factory: F) -> Self
    where
        C: Command + 'static,
        F: Fn() -> C + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            kind: short_type_name::<C>().to_owned(),
            factory: Arc::new(move || Box::new(factory())),
            params: Vec::new(),
            listeners: ListenerSet::new(),
        }
    }

    /// Adds a parameter declaration.
    #[must_use]
    pub fn param(mut self, spec: ParamSpec) -> Self {
        self.params.push(spec);
        self
    }

    /// Adds an event listener for this slot.
    #[must_use]
    pub fn listener(mut self, event: impl Into<String>, listener: Listener) -> Self {
        self.listeners.insert(event, listener);
        self
    }

    /// Returns the slot name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    fn materialise(&self) -> CommandDescriptor {
        CommandDescriptor::new(
            self.name.clone(),
            self.kind.clone(),
            (self.factory)(),
            self.params.clone(),
            self.listeners.clone(),
        )
    }
}

impl std::fmt::Debug for CommandSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandSpec")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// Registration-side description of a request: an ordered command chain
/// plus the caching, explain, and internal flags.
#[derive(Debug, Clone)]
pub struct RequestSpec {
    name: String,
    commands: Vec<CommandSpec>,
    caching: bool,
    explaining: bool,
    internal: bool,
}

impl RequestSpec {
    /// Creates an empty request spec with all flags off.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            commands: Vec::new(),
            caching: false,
            explaining: false,
            internal: false,
        }
    }

    /// Appends a command slot; registration order is execution order.
    #[must_use]
    pub fn command(mut self, spec: CommandSpec) -> Self {
        self.commands.push(spec);
        self
    }

    /// Enables or disables request-level output caching.
    #[must_use]
    pub const fn caching(mut self, caching: bool) -> Self {
        self.caching = caching;
        self
    }

    /// Enables or disables explain mode.
    #[must_use]
    pub const fn explaining(mut self, explaining: bool) -> Self {
        self.explaining = explaining;
        self
    }

    /// Marks the request internal-only: unreachable from external
    /// identifiers, reachable from forwards.
    #[must_use]
    pub const fn internal(mut self, internal: bool) -> Self {
        self.internal = internal;
        self
    }

    /// Returns the request name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    fn validate(&self) -> Result<(), DispatchError> {
        for (index, spec) in self.commands.iter().enumerate() {
            let clash = self
                .commands
                .iter()
                .take(index)
                .any(|earlier| earlier.name() == spec.name());
            if clash {
                return Err(DispatchError::duplicate(format!(
                    "command '{}' appears twice in request '{}'",
                    spec.name(),
                    self.name
                )));
            }
        }
        Ok(())
    }
}

/// The explicit request registry handed to the dispatcher at startup.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    requests: IndexMap<String, RequestSpec>,
}

impl Registry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a request spec.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::DuplicateRegistration`] when a request with
    /// the same name already exists or the spec repeats a command name.
    pub fn register(&mut self, spec: RequestSpec) -> Result<(), DispatchError> {
        spec.validate()?;
        if self.requests.contains_key(spec.name()) {
            return Err(DispatchError::duplicate(format!(
                "request '{}' is already registered",
                spec.name()
            )));
        }
        self.requests.insert(spec.name().to_owned(), spec);
        Ok(())
    }

    /// Returns `true` when a request with the given name is resolvable
    /// under the given internal-permission level.
    #[must_use]
    pub fn has_request(&self, name: &str, allow_internal: bool) -> bool {
        self.requests
            .get(name)
            .is_some_and(|spec| allow_internal || !spec.internal)
    }

    /// Materialises a fresh [`Request`] for the given name. Each command
    /// slot's instance is constructed exactly once per materialisation.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::RequestNotFound`] when the name is unknown
    /// or names an internal request while `allow_internal` is `false`.
    pub fn request(&self, name: &str, allow_internal: bool) -> Result<Request, DispatchError> {
        let spec = self
            .requests
            .get(name)
            .filter(|spec| allow_internal || !spec.internal)
            .ok_or_else(|| DispatchError::request_not_found(name))?;
        let commands = spec.commands.iter().map(CommandSpec::materialise).collect();
        Ok(Request::new(
            spec.name.clone(),
            commands,
            spec.caching,
            spec.explaining,
        ))
    }

    /// Returns the number of registered requests.
    #[must_use]
    pub fn len(&self) -> usize {
        self.requests.len()
    }

    /// Returns `true` when no requests are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}

fn short_type_name<C>() -> &'static str {
    let full = std::any::type_name::<C>();
    full.rsplit("::").next().unwrap_or(full)
}

#[cfg(test)]
mod tests;
