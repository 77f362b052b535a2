//! The request data model: a named, ordered chain of command descriptors.
//!
//! A [`Request`] is materialised from the registry once per dispatch. Its
//! shape is read-only during execution — the descriptor sequence, parameter
//! specs, and flags never change mid-chain — while the command *instances*
//! inside the descriptors carry whatever state they accumulate. Iteration
//! order is insertion order is execution order.

use crate::command::{Command, ListenerSet};
use crate::params::ParamSpec;

/// One command slot in a request chain.
///
/// The instance is constructed once, when the request is materialised, and
/// reused for the descriptor's lifetime. The resolved parameter mapping is
/// recomputed fresh on every execution.
pub struct CommandDescriptor {
    name: String,
    kind: String,
    instance: Box<dyn Command>,
    params: Vec<ParamSpec>,
    listeners: ListenerSet,
}

impl CommandDescriptor {
    pub(crate) fn new(
        name: String,
        kind: String,
        instance: Box<dyn Command>,
        params: Vec<ParamSpec>,
        listeners: ListenerSet,
    ) -> Self {
        Self {
            name,
            kind,
            instance,
            params,
            listeners,
        }
    }

    /// Returns the descriptor name, unique within its request.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the command kind recorded at registration (the command's
    /// type name).
    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Returns the parameter declarations for this slot.
    #[must_use]
    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    /// Returns the listeners configured for this slot.
    #[must_use]
    pub fn listeners(&self) -> &ListenerSet {
        &self.listeners
    }

    /// Returns the command instance.
    #[must_use]
    pub fn instance(&self) -> &dyn Command {
        self.instance.as_ref()
    }

    pub(crate) fn instance_mut(&mut self) -> &mut dyn Command {
        self.instance.as_mut()
    }

    /// Renders the explain-mode line for this slot: the command's own
    /// [`Command::explain`] text, or a synthesised description when the
    /// command has none.
    #[must_use]
    pub fn explain_line(&self) -> String {
        self.instance.explain().unwrap_or_else(|| {
            format!(
                "CMD: {} ({}): unexplainable command, unknown parameters.",
                self.name, self.kind
            )
        })
    }
}

impl std::fmt::Debug for CommandDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandDescriptor")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("params", &self.params)
            .field("listeners", &self.listeners)
            .finish_non_exhaustive()
    }
}

/// A named, ordered chain of command descriptors plus the caching and
/// explain flags.
#[derive(Debug)]
pub struct Request {
    name: String,
    commands: Vec<CommandDescriptor>,
    caching: bool,
    explaining: bool,
}

impl Request {
    pub(crate) fn new(
        name: String,
        commands: Vec<CommandDescriptor>,
        caching: bool,
        explaining: bool,
    ) -> Self {
        Self {
            name,
            commands,
            caching,
            explaining,
        }
    }

    /// Returns the request name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns `true` when request-level output caching is enabled.
    #[must_use]
    pub const fn is_caching(&self) -> bool {
        self.caching
    }

    /// Returns `true` when the request is in explain mode.
    #[must_use]
    pub const fn is_explaining(&self) -> bool {
        self.explaining
    }

    /// Returns the descriptors in execution order.
    #[must_use]
    pub fn commands(&self) -> &[CommandDescriptor] {
        &self.commands
    }

    pub(crate) fn commands_mut(&mut self) -> &mut [CommandDescriptor] {
        &mut self.commands
    }

    /// Returns the number of command slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Returns `true` when the chain has no commands.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}
