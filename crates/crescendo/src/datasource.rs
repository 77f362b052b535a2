//! Datasource collaborator: opaque handles the core threads through to
//! commands without interpreting.
//!
//! A datasource is whatever the application says it is: a connection pool,
//! a file handle, a fixture. Commands downcast through [`Datasource::as_any`]
//! to recover the concrete type they registered.

use std::any::Any;
use std::sync::Arc;

use crate::error::DispatchError;

/// Contract for an opaque datasource handle.
pub trait Datasource: Send + Sync {
    /// Returns the handle as [`Any`] so callers can downcast to the
    /// concrete type they registered.
    fn as_any(&self) -> &dyn Any;
}

/// Named set of datasources with one designated default.
#[derive(Clone, Default)]
pub struct DatasourceManager {
    sources: Vec<(String, Arc<dyn Datasource>)>,
    default_name: Option<String>,
}

impl DatasourceManager {
    /// Creates a manager with no datasources.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a named datasource. The first datasource registered with
    /// `is_default` set becomes the default.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::DuplicateRegistration`] if a datasource
    /// with the same name is already present.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        source: Arc<dyn Datasource>,
        is_default: bool,
    ) -> Result<(), DispatchError> {
        let name = name.into();
        if self.lookup(&name).is_some() {
            return Err(DispatchError::duplicate(format!(
                "datasource '{name}' is already registered"
            )));
        }
        if is_default && self.default_name.is_none() {
            self.default_name = Some(name.clone());
        }
        self.sources.push((name, source));
        Ok(())
    }

    /// Retrieves a datasource by name, or the default when no name is
    /// given. Returns `None` when nothing matches.
    #[must_use]
    pub fn datasource(&self, name: Option<&str>) -> Option<Arc<dyn Datasource>> {
        match name {
            Some(n) => self.lookup(n),
            None => self.default_name.as_deref().and_then(|n| self.lookup(n)),
        }
    }

    /// Returns the number of registered datasources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Returns `true` when no datasources are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    fn lookup(&self, name: &str) -> Option<Arc<dyn Datasource>> {
        self.sources
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, s)| Arc::clone(s))
    }
}

impl std::fmt::Debug for DatasourceManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.sources.iter().map(|(n, _)| n.as_str()).collect();
        f.debug_struct("DatasourceManager")
            .field("sources", &names)
            .field("default", &self.default_name)
            .finish()
    }
}
