//! The front controller: request resolution and chain execution.
//!
//! [`Dispatcher::handle_request`] is the entry point for one external
//! invocation. The dispatcher maps the external identifier to a request
//! name, materialises the request from the registry, honours explain mode
//! and the request-level output cache, then runs the command chain in
//! order: resolve parameters against the live context, attach any
//! configured listeners, execute, and classify the outcome.
//!
//! Classification is the heart of the control-flow contract. A command's
//! signal either stops the chain (interrupt, fatal interrupt, unclassified
//! failure), redirects it (forward — the same context threads into a full
//! re-dispatch with internal requests allowed), or marks the single command
//! as failed while the chain continues (recoverable). Only the dispatcher
//! interprets signals; commands never see what their siblings raised.
//!
//! Output buffering is a scoped resource: it begins only on a cache miss
//! for a caching request, and every exit path either commits it (store and
//! flush) or discards it. A forward always discards before delegating, so
//! at most one buffer is live at a time.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error, warn};

use crate::cache::{CacheManager, request_cache_key};
use crate::context::ExecutionContext;
use crate::datasource::DatasourceManager;
use crate::error::{CommandSignal, DispatchError};
use crate::log::{LogCategory, LoggerSet};
use crate::mapper::{IdentityMapper, NOT_FOUND_REQUEST, RequestMapper};
use crate::output::OutputChannel;
use crate::params::ParameterResolver;
use crate::registry::Registry;
use crate::request::Request;
use crate::sources::InputSources;

/// Tracing target for dispatch diagnostics.
pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");

/// Default bound on forward chains per external invocation.
pub const DEFAULT_MAX_FORWARD_DEPTH: usize = 32;

/// Body emitted when neither the request nor the `"404"` fallback exists.
const NOT_FOUND_BODY: &str = "Not Found\n";

/// Terminal state of one dispatch.
///
/// The final execution context is returned to the caller on the outcomes
/// that ran commands; the engine keeps no state between invocations. The
/// outcomes that never reach the command loop hand back the caller-supplied
/// context unchanged, so a resumed invocation cannot lose accumulated
/// state.
#[derive(Debug)]
pub enum Dispatched {
    /// The chain (and any chain it forwarded into) ran to completion.
    Completed {
        /// Context as the last command left it.
        context: ExecutionContext,
    },
    /// A command interrupted the chain, silently or fatally.
    Interrupted {
        /// Context at the point of interruption.
        context: ExecutionContext,
    },
    /// Explain mode rendered descriptions; no command executed.
    Explained {
        /// Caller-supplied context, returned untouched.
        context: Option<ExecutionContext>,
    },
    /// The request-level cache answered; no command executed.
    CacheHit {
        /// Caller-supplied context, returned untouched.
        context: Option<ExecutionContext>,
    },
    /// Neither the request nor the not-found fallback exists; a minimal
    /// not-found body was emitted.
    NotFound {
        /// Caller-supplied context, returned untouched.
        context: Option<ExecutionContext>,
    },
}

impl Dispatched {
    /// Returns the final context, when this outcome carries one.
    #[must_use]
    pub const fn context(&self) -> Option<&ExecutionContext> {
        match self {
            Self::Completed { context } | Self::Interrupted { context } => Some(context),
            Self::Explained { context }
            | Self::CacheHit { context }
            | Self::NotFound { context } => context.as_ref(),
        }
    }

    /// Consumes the outcome, returning the final context when present.
    #[must_use]
    pub fn into_context(self) -> Option<ExecutionContext> {
        match self {
            Self::Completed { context } | Self::Interrupted { context } => Some(context),
            Self::Explained { context }
            | Self::CacheHit { context }
            | Self::NotFound { context } => context,
        }
    }

    /// Returns `true` for [`Dispatched::Completed`].
    #[must_use]
    pub const fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}

/// Result of the request-level cache check.
enum CacheCheck {
    /// Cached bytes were emitted; the dispatch is done.
    Hit,
    /// No hit. Carries the cache key when buffering began, or `None` when
    /// caching is off for this request or no default cache is configured.
    Miss(Option<String>),
}

/// The front controller for one application.
///
/// Built once at startup from an explicit [`Registry`] and the collaborator
/// set, then invoked once per external request. Invocations are independent;
/// each owns its execution context exclusively.
///
/// # Example
///
/// ```
/// use crescendo::{
///     Command, CommandSignal, CommandSpec, Dispatcher, ExecutionContext,
///     ParamSpec, ParameterSet, Registry, RequestSpec,
/// };
/// use serde_json::json;
///
/// #[derive(Default)]
/// struct Mark;
/// impl Command for Mark {
///     fn execute(&mut self, p: &ParameterSet, cxt: &mut ExecutionContext)
///         -> Result<(), CommandSignal>
///     {
///         cxt.add("mark", p.get("value").cloned().unwrap_or(json!(null)));
///         Ok(())
///     }
/// }
///
/// let mut registry = Registry::new();
/// registry.register(
///     RequestSpec::named("front").command(
///         CommandSpec::new("mark", Mark::default)
///             .param(ParamSpec::new("value").default_value(json!("test"))),
///     ),
/// ).expect("register");
///
/// let dispatcher = Dispatcher::new(registry);
/// let outcome = dispatcher.handle_request("front").expect("dispatch");
/// let context = outcome.into_context().expect("completed");
/// assert_eq!(context.get("mark"), Some(&json!("test")));
/// ```
pub struct Dispatcher {
    registry: Registry,
    loggers: Arc<LoggerSet>,
    datasources: Arc<DatasourceManager>,
    caches: Arc<CacheManager>,
    mapper: Arc<dyn RequestMapper>,
    sources: InputSources,
    output: OutputChannel,
    seed: Vec<(String, Value)>,
    max_forward_depth: usize,
}

impl Dispatcher {
    /// Creates a dispatcher with default collaborators: no loggers, no
    /// caches, no datasources, the identity mapper, an empty input
    /// snapshot, and output to standard out.
    #[must_use]
    pub fn new(registry: Registry) -> Self {
        Self {
            registry,
            loggers: Arc::new(LoggerSet::new()),
            datasources: Arc::new(DatasourceManager::new()),
            caches: Arc::new(CacheManager::new()),
            mapper: Arc::new(IdentityMapper),
            sources: InputSources::new(),
            output: OutputChannel::stdout(),
            seed: Vec::new(),
            max_forward_depth: DEFAULT_MAX_FORWARD_DEPTH,
        }
    }

    /// Replaces the logger set.
    #[must_use]
    pub fn with_loggers(mut self, loggers: LoggerSet) -> Self {
        self.loggers = Arc::new(loggers);
        self
    }

    /// Replaces the datasource manager.
    #[must_use]
    pub fn with_datasources(mut self, datasources: DatasourceManager) -> Self {
        self.datasources = Arc::new(datasources);
        self
    }

    /// Replaces the cache manager. Request-level caching uses its default
    /// cache; without one the cache step is skipped entirely.
    #[must_use]
    pub fn with_caches(mut self, caches: CacheManager) -> Self {
        self.caches = Arc::new(caches);
        self
    }

    /// Replaces the request mapper.
    #[must_use]
    pub fn with_mapper(mut self, mapper: impl RequestMapper + 'static) -> Self {
        self.mapper = Arc::new(mapper);
        self
    }

    /// Replaces the input-source snapshot.
    #[must_use]
    pub fn with_sources(mut self, sources: InputSources) -> Self {
        self.sources = sources;
        self
    }

    /// Replaces the output channel.
    #[must_use]
    pub fn with_output(mut self, output: OutputChannel) -> Self {
        self.output = output;
        self
    }

    /// Sets entries seeded into every fresh execution context.
    #[must_use]
    pub fn with_seed(mut self, seed: impl IntoIterator<Item = (String, Value)>) -> Self {
        self.seed = seed.into_iter().collect();
        self
    }

    /// Sets the bound on forward chains per invocation.
    #[must_use]
    pub const fn with_max_forward_depth(mut self, depth: usize) -> Self {
        self.max_forward_depth = depth;
        self
    }

    /// Returns the registry.
    #[must_use]
    pub const fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Handles one external invocation.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError`] when a command fails with an unclassified
    /// error, a forward chain exceeds the configured bound, or output I/O
    /// fails. Interrupts and recoverable errors are not `Err` outcomes.
    pub fn handle_request(&self, identifier: &str) -> Result<Dispatched, DispatchError> {
        self.dispatch(identifier, None, false, 0)
    }

    /// Handles an invocation with a caller-supplied context, for resumed
    /// execution. `allow_internal` additionally permits resolving
    /// internal-only requests, as a CLI runner would. The context comes
    /// back in every [`Dispatched`] outcome, untouched when no command ran.
    ///
    /// # Errors
    ///
    /// Same contract as [`Self::handle_request`].
    pub fn handle_request_with(
        &self,
        identifier: &str,
        context: ExecutionContext,
        allow_internal: bool,
    ) -> Result<Dispatched, DispatchError> {
        self.dispatch(identifier, Some(context), allow_internal, 0)
    }

    fn dispatch(
        &self,
        identifier: &str,
        initial: Option<ExecutionContext>,
        allow_internal: bool,
        depth: usize,
    ) -> Result<Dispatched, DispatchError> {
        let Some(mut request) = self.resolve_request(identifier, allow_internal)? else {
            return Ok(Dispatched::NotFound { context: initial });
        };

        if request.is_explaining() {
            self.explain(&request)?;
            return Ok(Dispatched::Explained { context: initial });
        }

        let cache_key = match self.check_cache(&request)? {
            CacheCheck::Hit => return Ok(Dispatched::CacheHit { context: initial }),
            CacheCheck::Miss(key) => key,
        };

        let mut context = initial.unwrap_or_else(|| self.fresh_context());
        context.attach_output(self.output.clone());

        self.run_chain(&mut request, context, cache_key, depth)
    }

    /// Maps the identifier and materialises the request, falling back to
    /// the `"404"` request on a miss. Returns `Ok(None)` after emitting the
    /// minimal not-found body when the fallback is absent too.
    fn resolve_request(
        &self,
        identifier: &str,
        allow_internal: bool,
    ) -> Result<Option<Request>, DispatchError> {
        let request_name = self.mapper.uri_to_request(identifier);
        match self.registry.request(&request_name, allow_internal) {
            Ok(request) => Ok(Some(request)),
            Err(DispatchError::RequestNotFound { .. }) => {
                self.loggers.log(
                    &format!("request '{request_name}' not found"),
                    LogCategory::User,
                );
                warn!(target: DISPATCH_TARGET, request = %request_name, "request not found");

                let fallback = self.mapper.uri_to_request(NOT_FOUND_REQUEST);
                match self.registry.request(&fallback, allow_internal) {
                    Ok(request) => Ok(Some(request)),
                    Err(DispatchError::RequestNotFound { .. }) => {
                        self.output.write_str(NOT_FOUND_BODY)?;
                        Ok(None)
                    }
                    Err(other) => Err(other),
                }
            }
            Err(other) => Err(other),
        }
    }

    /// Renders the explain text for every command, in chain order, without
    /// executing anything.
    fn explain(&self, request: &Request) -> Result<(), DispatchError> {
        self.output
            .write_str(&format!("REQUEST: {}\n", request.name()))?;
        for descriptor in request.commands() {
            self.output.write_str(&descriptor.explain_line())?;
            self.output.write_str("\n")?;
        }
        Ok(())
    }

    /// Serves the request from cache when possible; otherwise begins
    /// buffering when this request should be cached on completion.
    fn check_cache(&self, request: &Request) -> Result<CacheCheck, DispatchError> {
        if !request.is_caching() {
            return Ok(CacheCheck::Miss(None));
        }
        let Some(cache) = self.caches.default_cache() else {
            return Ok(CacheCheck::Miss(None));
        };

        let key = request_cache_key(request.name());
        if let Some(bytes) = cache.get(&key) {
            debug!(
                target: DISPATCH_TARGET,
                request = request.name(),
                "serving request from cache"
            );
            self.output.write(&bytes)?;
            return Ok(CacheCheck::Hit);
        }

        self.output.begin_buffering();
        Ok(CacheCheck::Miss(Some(key)))
    }

    /// Runs the command chain, classifying each signalled failure, then
    /// commits any pending cache write.
    fn run_chain(
        &self,
        request: &mut Request,
        mut context: ExecutionContext,
        mut cache_key: Option<String>,
        depth: usize,
    ) -> Result<Dispatched, DispatchError> {
        let request_name = request.name().to_owned();

        for descriptor in request.commands_mut() {
            let params =
                ParameterResolver::new(&self.sources, &context).fetch(descriptor.params());

            if !descriptor.listeners().is_empty() {
                let listeners = descriptor.listeners().clone();
                if let Some(observable) = descriptor.instance_mut().as_observable() {
                    observable.set_event_handlers(listeners);
                }
            }

            debug!(
                target: DISPATCH_TARGET,
                request = %request_name,
                command = descriptor.name(),
                "executing command"
            );

            match descriptor.instance_mut().execute(&params, &mut context) {
                Ok(()) => {}
                Err(CommandSignal::Interrupt) => {
                    self.output.discard();
                    debug!(
                        target: DISPATCH_TARGET,
                        request = %request_name,
                        command = descriptor.name(),
                        "chain interrupted"
                    );
                    return Ok(Dispatched::Interrupted { context });
                }
                Err(signal @ CommandSignal::FatalInterrupt { .. }) => {
                    self.output.discard();
                    self.loggers.log(&signal.to_string(), LogCategory::Fatal);
                    error!(
                        target: DISPATCH_TARGET,
                        request = %request_name,
                        command = descriptor.name(),
                        %signal,
                        "fatal interrupt"
                    );
                    return Ok(Dispatched::Interrupted { context });
                }
                Err(CommandSignal::Forward { destination }) => {
                    self.output.discard();
                    if depth + 1 > self.max_forward_depth {
                        return Err(DispatchError::forward_depth_exceeded(
                            destination,
                            self.max_forward_depth,
                        ));
                    }
                    debug!(
                        target: DISPATCH_TARGET,
                        request = %request_name,
                        command = descriptor.name(),
                        destination = %destination,
                        "forwarding request"
                    );
                    return self.dispatch(&destination, Some(context), true, depth + 1);
                }
                Err(signal @ CommandSignal::Recoverable { .. }) => {
                    self.output.discard();
                    cache_key = None;
                    self.loggers
                        .log(&signal.to_string(), LogCategory::Recoverable);
                    warn!(
                        target: DISPATCH_TARGET,
                        request = %request_name,
                        command = descriptor.name(),
                        %signal,
                        "recoverable error, continuing chain"
                    );
                }
                Err(signal @ CommandSignal::Failed { .. }) => {
                    self.output.discard();
                    self.loggers.log(&signal.to_string(), LogCategory::Fatal);
                    error!(
                        target: DISPATCH_TARGET,
                        request = %request_name,
                        command = descriptor.name(),
                        %signal,
                        "unclassified failure, stopping chain"
                    );
                    return Err(DispatchError::command_failed(
                        request_name,
                        descriptor.name(),
                        signal,
                    ));
                }
            }
        }

        if let Some(key) = cache_key {
            let bytes = self.output.commit()?;
            if let Some(cache) = self.caches.default_cache() {
                cache.set(&key, bytes, None);
            }
        }

        Ok(Dispatched::Completed { context })
    }

    fn fresh_context(&self) -> ExecutionContext {
        ExecutionContext::new(
            Arc::clone(&self.loggers),
            Arc::clone(&self.datasources),
            Arc::clone(&self.caches),
            Arc::clone(&self.mapper),
        )
        .with_seed(self.seed.iter().cloned())
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("registry", &self.registry)
            .field("max_forward_depth", &self.max_forward_depth)
            .finish_non_exhaustive()
    }
}
