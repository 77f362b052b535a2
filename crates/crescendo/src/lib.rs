//! Front-controller request engine built on chains of commands.
//!
//! The `crescendo` crate routes every external invocation — a web hit or a
//! CLI run — through a single entry point. Each named request maps to an
//! ordered chain of [`Command`] implementations; applications are composed
//! by wiring small reusable commands into chains rather than by writing
//! per-endpoint controllers.
//!
//! Commands share state through an [`ExecutionContext`] that travels down
//! the chain, and declare their inputs as [`ParamSpec`] fallback chains
//! resolved against HTTP-style input sources, the context, the environment,
//! and CLI arguments. A command never reads its inputs directly; the
//! [`Dispatcher`] resolves them and hands over an immutable
//! [`ParameterSet`].
//!
//! Control flow is explicit: commands return [`CommandSignal`] values to
//! interrupt the chain, forward the invocation to another request, or mark
//! a failure as recoverable. The dispatcher interprets the signal, logs
//! through the configured [`LoggerSet`], and manages request-level output
//! caching.
//!
//! # Example
//!
//! ```rust
//! use crescendo::{
//!     Command, CommandSignal, CommandSpec, Dispatcher, ExecutionContext,
//!     ParamSpec, ParameterSet, Registry, RequestSpec, sources::InputSources,
//! };
//! use serde_json::json;
//!
//! struct Greet;
//!
//! impl Command for Greet {
//!     fn execute(
//!         &mut self,
//!         params: &ParameterSet,
//!         cxt: &mut ExecutionContext,
//!     ) -> Result<(), CommandSignal> {
//!         let name = params.get_str("name").unwrap_or("world");
//!         cxt.add("greeting", json!(format!("Hello, {name}!")));
//!         Ok(())
//!     }
//! }
//!
//! let mut registry = Registry::new();
//! registry.register(
//!     RequestSpec::named("hello").command(
//!         CommandSpec::new("greet", || Greet)
//!             .param(ParamSpec::new("name").from("get:name cxt:name")),
//!     ),
//! ).expect("registration succeeds");
//!
//! let dispatcher = Dispatcher::new(registry)
//!     .with_sources(InputSources::new().with_get("name", json!("Ada")));
//!
//! let outcome = dispatcher.handle_request("hello").expect("dispatch succeeds");
//! let context = outcome.into_context().expect("chain completed");
//! assert_eq!(context.get("greeting"), Some(&json!("Hello, Ada!")));
//! ```

pub mod cache;
pub mod command;
pub mod context;
pub mod datasource;
pub mod dispatch;
pub mod error;
pub mod log;
pub mod mapper;
pub mod output;
pub mod params;
pub mod registry;
pub mod request;
pub mod sources;

pub use self::cache::{CacheManager, MemoryCache, RequestCache, request_cache_key};
pub use self::command::{Command, Listener, ListenerSet, Observable, ParameterSet};
pub use self::context::ExecutionContext;
pub use self::datasource::{Datasource, DatasourceManager};
pub use self::dispatch::{DEFAULT_MAX_FORWARD_DEPTH, Dispatched, Dispatcher};
pub use self::error::{CommandSignal, DispatchError, FailureSource};
pub use self::log::{LogCategory, Logger, LoggerSet, MemoryLogger, TracingLogger};
pub use self::mapper::{IdentityMapper, NOT_FOUND_REQUEST, RequestMapper};
pub use self::output::{OutputCapture, OutputChannel};
pub use self::params::{ParamSpec, ParameterResolver, SourceSpec, SourceTag};
pub use self::registry::{CommandSpec, Registry, RequestSpec};
pub use self::request::{CommandDescriptor, Request};
pub use self::sources::InputSources;
