//! The parameter-resolution protocol.
//!
//! A command's parameters are declared, not coded: each parameter carries a
//! space-separated fallback chain of `"source:key"` tokens plus an optional
//! static default. At execution time the resolver walks the chain in order
//! against the input-source snapshot and the live context, takes the first
//! non-absent value, falls back to the default when every token misses, and
//! *omits* the parameter entirely when there is no default either.
//!
//! Source tags are case-insensitive and accept the short aliases of the
//! original configuration language (`g`, `p`, `c`, `s`, `x`, `e`, `r`,
//! `a`, `f`). An unknown tag is not an error; the token is simply absent.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::command::ParameterSet;
use crate::context::ExecutionContext;
use crate::sources::InputSources;

/// Input space a `"source:key"` token reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceTag {
    /// Query-string parameters.
    Get,
    /// Form-post parameters.
    Post,
    /// Cookies.
    Cookie,
    /// Session entries.
    Session,
    /// The live execution context.
    Context,
    /// Environment variables.
    Env,
    /// Server metadata.
    Server,
    /// Merged query-string and form-post view, query string first.
    Request,
    /// Positional arguments; the key is a zero-based index.
    Argv,
    /// Uploaded-file descriptors.
    Files,
}

impl SourceTag {
    /// Parses a source tag, case-insensitively, accepting long and short
    /// aliases. Returns `None` for unknown tags.
    #[must_use]
    pub fn parse(tag: &str) -> Option<Self> {
        match tag.to_ascii_lowercase().as_str() {
            "g" | "get" => Some(Self::Get),
            "p" | "post" => Some(Self::Post),
            "c" | "cookie" | "cookies" => Some(Self::Cookie),
            "s" | "session" => Some(Self::Session),
            "x" | "cmd" | "cxt" | "context" => Some(Self::Context),
            "e" | "env" | "environment" => Some(Self::Env),
            "server" => Some(Self::Server),
            "r" | "request" => Some(Self::Request),
            "a" | "arg" | "argv" => Some(Self::Argv),
            "f" | "file" | "files" => Some(Self::Files),
            _ => None,
        }
    }

    /// Returns the canonical tag string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Post => "post",
            Self::Cookie => "cookie",
            Self::Session => "session",
            Self::Context => "context",
            Self::Env => "env",
            Self::Server => "server",
            Self::Request => "request",
            Self::Argv => "argv",
            Self::Files => "files",
        }
    }
}

impl std::fmt::Display for SourceTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One parsed `"source:key"` token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSpec {
    tag: SourceTag,
    key: String,
}

impl SourceSpec {
    /// Parses a token. Returns `None` when the token has no colon or its
    /// source tag is unknown — both mean "absent", never an error.
    #[must_use]
    pub fn parse(token: &str) -> Option<Self> {
        let (tag, key) = token.split_once(':')?;
        Some(Self {
            tag: SourceTag::parse(tag)?,
            key: key.to_owned(),
        })
    }

    /// Returns the source space this token reads from.
    #[must_use]
    pub const fn tag(&self) -> SourceTag {
        self.tag
    }

    /// Returns the lookup key within the source space.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }
}

/// Declaration of one command parameter: an ordered fallback chain and an
/// optional static default.
///
/// # Example
///
/// ```
/// use crescendo::ParamSpec;
/// use serde_json::json;
///
/// let spec = ParamSpec::new("who")
///     .from("get:who post:who")
///     .default_value(json!("world"));
/// assert_eq!(spec.tokens().len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ParamSpec {
    name: String,
    tokens: Vec<String>,
    default: Option<Value>,
}

impl ParamSpec {
    /// Creates a parameter declaration with no sources and no default.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tokens: Vec::new(),
            default: None,
        }
    }

    /// Appends `"source:key"` tokens to the fallback chain. The spec string
    /// is split on whitespace, so `"get:id post:id"` adds two tokens.
    #[must_use]
    pub fn from(mut self, spec: &str) -> Self {
        self.tokens
            .extend(spec.split_whitespace().map(str::to_owned));
        self
    }

    /// Sets the static default used when every token is absent.
    #[must_use]
    pub fn default_value(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    /// Returns the parameter name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the raw fallback tokens in declared order.
    #[must_use]
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Returns the static default, if any.
    #[must_use]
    pub fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }
}

/// Resolves parameter declarations against an input snapshot and the live
/// context. Resolution never mutates either.
#[derive(Debug)]
pub struct ParameterResolver<'a> {
    sources: &'a InputSources,
    context: &'a ExecutionContext,
}

impl<'a> ParameterResolver<'a> {
    /// Creates a resolver over the given snapshot and context.
    #[must_use]
    pub const fn new(sources: &'a InputSources, context: &'a ExecutionContext) -> Self {
        Self { sources, context }
    }

    /// Resolves one `"source:key"` token. Unknown tags, malformed tokens,
    /// and missing keys all yield `None`.
    #[must_use]
    pub fn resolve(&self, token: &str) -> Option<Value> {
        let spec = SourceSpec::parse(token)?;
        let value = match spec.tag() {
            SourceTag::Get => self.sources.get(spec.key()),
            SourceTag::Post => self.sources.post(spec.key()),
            SourceTag::Cookie => self.sources.cookie(spec.key()),
            SourceTag::Session => self.sources.session(spec.key()),
            SourceTag::Context => self.context.get(spec.key()),
            SourceTag::Env => self.sources.env(spec.key()),
            SourceTag::Server => self.sources.server(spec.key()),
            SourceTag::Request => self.sources.request(spec.key()),
            SourceTag::Argv => spec
                .key()
                .parse::<usize>()
                .ok()
                .and_then(|index| self.sources.argv(index)),
            SourceTag::Files => self.sources.file(spec.key()),
        };
        value.cloned()
    }

    /// Resolves a full parameter declaration set into a [`ParameterSet`].
    ///
    /// For each declaration the fallback chain is walked in order and the
    /// first non-absent value wins; the static default applies only when
    /// every token misses; a parameter with neither is omitted.
    #[must_use]
    pub fn fetch(&self, specs: &[ParamSpec]) -> ParameterSet {
        let mut params = ParameterSet::new();
        for spec in specs {
            let resolved = spec
                .tokens()
                .iter()
                .find_map(|token| self.resolve(token))
                .or_else(|| spec.default().cloned());
            if let Some(value) = resolved {
                params.insert(spec.name(), value);
            }
        }
        params
    }
}

#[cfg(test)]
mod tests;
