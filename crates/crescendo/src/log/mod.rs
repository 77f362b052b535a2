//! Logger collaborator: severity categories, the logger contract, and the
//! fan-out set the dispatcher and context write through.
//!
//! The engine itself classifies failures into three categories: FATAL for
//! chain-stopping errors, RECOVERABLE for single-command failures the chain
//! survives, and USER for feedback such as a missing request. Applications
//! can interpret further categories however their backends see fit; the
//! core only ever emits these three.

use std::fmt;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::error::DispatchError;

/// Tracing target for the bundled [`TracingLogger`] adapter.
const LOG_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::log");

/// Severity category attached to every log entry the engine emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogCategory {
    /// Error that rightly stops chain execution.
    Fatal,
    /// Error scoped to one command; something could have caught it.
    Recoverable,
    /// Feedback meant for the user, such as a failed lookup.
    User,
}

impl LogCategory {
    /// Returns the canonical display string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fatal => "Fatal Error",
            Self::Recoverable => "Recoverable Error",
            Self::User => "User Error",
        }
    }
}

impl fmt::Display for LogCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Contract for a logging backend.
///
/// Backends receive every message with its category and decide routing and
/// formatting themselves. Implementations must tolerate concurrent external
/// invocations or be scoped per invocation; the engine adds no locking of
/// its own.
pub trait Logger: Send + Sync {
    /// Records a message under the given category.
    fn log(&self, message: &str, category: LogCategory);
}

/// Named fan-out over a set of logging backends.
///
/// Every message is delivered to every registered logger, in registration
/// order. Individual loggers can be retrieved by name, which test code uses
/// to inspect a [`MemoryLogger`] after a dispatch.
#[derive(Clone, Default)]
pub struct LoggerSet {
    loggers: Vec<(String, Arc<dyn Logger>)>,
}

impl LoggerSet {
    /// Creates an empty set. Logging through an empty set is a no-op.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a named logger.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::DuplicateRegistration`] if a logger with the
    /// same name is already present.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        logger: Arc<dyn Logger>,
    ) -> Result<(), DispatchError> {
        let name = name.into();
        if self.by_name(&name).is_some() {
            return Err(DispatchError::duplicate(format!(
                "logger '{name}' is already registered"
            )));
        }
        self.loggers.push((name, logger));
        Ok(())
    }

    /// Looks up a logger by its registered name.
    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<Arc<dyn Logger>> {
        self.loggers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, l)| Arc::clone(l))
    }

    /// Delivers a message to every registered logger.
    pub fn log(&self, message: &str, category: LogCategory) {
        for (_, logger) in &self.loggers {
            logger.log(message, category);
        }
    }

    /// Returns the number of registered loggers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.loggers.len()
    }

    /// Returns `true` when no loggers are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.loggers.is_empty()
    }
}

impl fmt::Debug for LoggerSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.loggers.iter().map(|(n, _)| n.as_str()).collect();
        f.debug_struct("LoggerSet").field("loggers", &names).finish()
    }
}

/// Logger that routes categories onto `tracing` levels.
///
/// FATAL maps to `error!`, RECOVERABLE to `warn!`, and USER to `info!`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn log(&self, message: &str, category: LogCategory) {
        match category {
            LogCategory::Fatal => {
                tracing::error!(target: LOG_TARGET, category = category.as_str(), message);
            }
            LogCategory::Recoverable => {
                tracing::warn!(target: LOG_TARGET, category = category.as_str(), message);
            }
            LogCategory::User => {
                tracing::info!(target: LOG_TARGET, category = category.as_str(), message);
            }
        }
    }
}

/// Logger that retains every entry in memory for later inspection.
#[derive(Debug, Default)]
pub struct MemoryLogger {
    entries: Mutex<Vec<(LogCategory, String)>>,
}

impl MemoryLogger {
    /// Creates an empty memory logger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of all recorded entries, oldest first.
    #[must_use]
    pub fn entries(&self) -> Vec<(LogCategory, String)> {
        self.entries.lock().map_or_else(|_| Vec::new(), |e| e.clone())
    }

    /// Returns the messages recorded under the given category.
    #[must_use]
    pub fn messages(&self, category: LogCategory) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter(|(c, _)| *c == category)
            .map(|(_, m)| m)
            .collect()
    }
}

impl Logger for MemoryLogger {
    fn log(&self, message: &str, category: LogCategory) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push((category, message.to_owned()));
        }
    }
}
