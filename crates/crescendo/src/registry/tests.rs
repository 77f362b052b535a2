//! Unit tests for the request registry.

use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::json;

use super::*;
use crate::command::ParameterSet;
use crate::context::ExecutionContext;
use crate::error::CommandSignal;

static CONSTRUCTED: AtomicUsize = AtomicUsize::new(0);

#[derive(Default)]
struct Counted;

impl Counted {
    fn build() -> Self {
        CONSTRUCTED.fetch_add(1, Ordering::SeqCst);
        Self
    }
}

impl Command for Counted {
    fn execute(
        &mut self,
        _params: &ParameterSet,
        cxt: &mut ExecutionContext,
    ) -> Result<(), CommandSignal> {
        cxt.add("counted", json!(true));
        Ok(())
    }
}

fn simple_spec(request: &str, command: &str) -> RequestSpec {
    RequestSpec::named(request).command(CommandSpec::new(command, Counted::default))
}

#[test]
fn register_and_materialise() {
    let mut registry = Registry::new();
    registry.register(simple_spec("front", "only")).expect("register");
    assert_eq!(registry.len(), 1);

    let request = registry.request("front", false).expect("materialise");
    assert_eq!(request.name(), "front");
    assert_eq!(request.len(), 1);
}

#[test]
fn lookup_of_unknown_request_fails() {
    let registry = Registry::new();
    assert!(registry.is_empty());
    assert!(!registry.has_request("ghost", true));
    let err = registry.request("ghost", false).expect_err("should miss");
    assert!(matches!(err, DispatchError::RequestNotFound { .. }));
}

#[test]
fn duplicate_request_name_is_rejected() {
    let mut registry = Registry::new();
    registry.register(simple_spec("front", "a")).expect("first");
    let err = registry
        .register(simple_spec("front", "b"))
        .expect_err("duplicate should fail");
    assert!(matches!(err, DispatchError::DuplicateRegistration { .. }));
}

#[test]
fn duplicate_command_name_within_a_request_is_rejected() {
    let mut registry = Registry::new();
    let spec = RequestSpec::named("front")
        .command(CommandSpec::new("twice", Counted::default))
        .command(CommandSpec::new("twice", Counted::default));
    let err = registry.register(spec).expect_err("should fail validation");
    assert!(err.to_string().contains("appears twice"));
}

#[test]
fn internal_requests_need_permission() {
    let mut registry = Registry::new();
    registry
        .register(simple_spec("hidden", "only").internal(true))
        .expect("register");

    assert!(!registry.has_request("hidden", false));
    assert!(registry.has_request("hidden", true));
    assert!(registry.request("hidden", false).is_err());
    assert!(registry.request("hidden", true).is_ok());
}

#[test]
fn each_materialisation_constructs_instances_once() {
    let mut registry = Registry::new();
    registry
        .register(RequestSpec::named("front").command(CommandSpec::new("only", Counted::build)))
        .expect("register");

    let before = CONSTRUCTED.load(Ordering::SeqCst);
    let _first = registry.request("front", false).expect("first");
    let _second = registry.request("front", false).expect("second");
    assert_eq!(CONSTRUCTED.load(Ordering::SeqCst), before + 2);
}

#[test]
fn materialised_flags_match_the_spec() {
    let mut registry = Registry::new();
    registry
        .register(simple_spec("front", "only").caching(true).explaining(true))
        .expect("register");

    let request = registry.request("front", false).expect("materialise");
    assert!(request.is_caching());
    assert!(request.is_explaining());
}
