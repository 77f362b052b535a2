//! Failure taxonomy for command execution and request dispatch.
//!
//! Two enums cover the two audiences. [`CommandSignal`] is what a command
//! returns to steer the chain: interrupts, forwards, and recoverable errors
//! are deliberate control flow, not infrastructure failures. The dispatcher
//! is the only component that interprets these signals; commands never see
//! the signals raised by their siblings.
//!
//! [`DispatchError`] covers failures the dispatcher surfaces to its caller:
//! registry misconfiguration, output I/O, an exceeded forward bound, and
//! the unclassified command failure that stops a chain dead.

use std::io;

use thiserror::Error;

/// A boxed error source attached to an unclassified failure.
pub type FailureSource = Box<dyn std::error::Error + Send + Sync>;

/// Control-flow signal returned by a command to the dispatcher.
///
/// The variants map one-to-one onto the chain transitions: a signal either
/// stops the chain, redirects it, or marks a single command as failed while
/// the chain continues.
#[derive(Debug, Error)]
pub enum CommandSignal {
    /// Intentional early termination. The chain stops without logging.
    #[error("chain interrupted")]
    Interrupt,

    /// Termination that must be recorded. Logged at FATAL, then the chain
    /// stops.
    #[error("chain interrupted: {message}")]
    FatalInterrupt {
        /// Reason recorded in the fatal log entry.
        message: String,
    },

    /// Deliberate redirect into another request, preserving the live
    /// context. The dispatcher re-enters the full dispatch procedure with
    /// internal requests allowed.
    #[error("forward to request '{destination}'")]
    Forward {
        /// Name of the request to dispatch next.
        destination: String,
    },

    /// Failure scoped to this command alone. Logged at RECOVERABLE; the
    /// chain continues with the next command and any pending request-level
    /// cache write is cancelled.
    #[error("recoverable error: {message}")]
    Recoverable {
        /// Description of the failure.
        message: String,
    },

    /// Anything not recognised as one of the designed signals. Treated as
    /// fatal: logged, the chain stops, and the failure is surfaced to the
    /// dispatcher's caller.
    #[error("command failed: {message}")]
    Failed {
        /// Description of the failure.
        message: String,
        /// Optional underlying error.
        #[source]
        source: Option<FailureSource>,
    },
}

impl CommandSignal {
    /// Creates a fatal interrupt carrying the given reason.
    pub fn fatal(message: impl Into<String>) -> Self {
        Self::FatalInterrupt {
            message: message.into(),
        }
    }

    /// Creates a forward to the named request.
    pub fn forward(destination: impl Into<String>) -> Self {
        Self::Forward {
            destination: destination.into(),
        }
    }

    /// Creates a recoverable error with the given description.
    pub fn recoverable(message: impl Into<String>) -> Self {
        Self::Recoverable {
            message: message.into(),
        }
    }

    /// Creates an unclassified failure with the given description.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an unclassified failure wrapping an underlying error.
    pub fn failed_with(message: impl Into<String>, source: FailureSource) -> Self {
        Self::Failed {
            message: message.into(),
            source: Some(source),
        }
    }
}

/// Errors surfaced by the dispatcher and the registry.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// No request with the given name is registered (or it is internal-only
    /// and internal resolution was not permitted).
    #[error("request '{name}' not found")]
    RequestNotFound {
        /// Name that was looked up.
        name: String,
    },

    /// A request or logger/cache/datasource name was registered twice.
    #[error("duplicate registration: {message}")]
    DuplicateRegistration {
        /// Description of the collision.
        message: String,
    },

    /// A forward chain exceeded the configured depth bound.
    #[error("forward to '{destination}' exceeds depth limit of {limit}")]
    ForwardDepthExceeded {
        /// Destination of the forward that tripped the bound.
        destination: String,
        /// Configured maximum number of forwards per dispatch.
        limit: usize,
    },

    /// A command failed with an unclassified error; the chain was stopped.
    #[error("command '{command}' in request '{request}' failed: {message}")]
    CommandFailed {
        /// Request whose chain was executing.
        request: String,
        /// Name of the failing command descriptor.
        command: String,
        /// Description of the failure.
        message: String,
        /// Optional underlying error.
        #[source]
        source: Option<FailureSource>,
    },

    /// Writing to the output sink failed.
    #[error("output error: {0}")]
    Output(#[from] io::Error),
}

impl DispatchError {
    /// Creates a request-not-found error.
    pub fn request_not_found(name: impl Into<String>) -> Self {
        Self::RequestNotFound { name: name.into() }
    }

    /// Creates a duplicate-registration error.
    pub fn duplicate(message: impl Into<String>) -> Self {
        Self::DuplicateRegistration {
            message: message.into(),
        }
    }

    /// Creates a forward-depth error.
    pub fn forward_depth_exceeded(destination: impl Into<String>, limit: usize) -> Self {
        Self::ForwardDepthExceeded {
            destination: destination.into(),
            limit,
        }
    }

    pub(crate) fn command_failed(
        request: impl Into<String>,
        command: impl Into<String>,
        signal: CommandSignal,
    ) -> Self {
        let (message, source) = match signal {
            CommandSignal::Failed { message, source } => (message, source),
            other => (other.to_string(), None),
        };
        Self::CommandFailed {
            request: request.into(),
            command: command.into(),
            message,
            source,
        }
    }
}
