//! Unit tests for the parameter-resolution protocol.

use rstest::{fixture, rstest};
use serde_json::json;

use super::*;

#[fixture]
fn snapshot() -> InputSources {
    InputSources::new()
        .with_get("foo", json!("bar"))
        .with_get("shared", json!("from get"))
        .with_post("shared", json!("from post"))
        .with_post("postOnly", json!("posted"))
        .with_cookie("session_id", json!("abc123"))
        .with_session("last_page", json!("/home"))
        .with_env("HOME", json!("/root"))
        .with_server("REQUEST_METHOD", json!("GET"))
        .with_file("upload", json!({"name": "report.pdf"}))
        .with_argv(vec![json!("fort"), json!("run")])
}

#[fixture]
fn context() -> ExecutionContext {
    let mut cxt = ExecutionContext::default();
    cxt.add("lastCmd", json!("previous output"));
    cxt
}

#[rstest]
#[case::long("get:foo")]
#[case::short("g:foo")]
#[case::upper("GET:foo")]
#[case::mixed("Get:foo")]
fn tag_parsing_is_case_insensitive(
    snapshot: InputSources,
    context: ExecutionContext,
    #[case] token: &str,
) {
    let resolver = ParameterResolver::new(&snapshot, &context);
    assert_eq!(resolver.resolve(token), Some(json!("bar")));
}

#[rstest]
#[case::post("post:postOnly", json!("posted"))]
#[case::cookie("cookie:session_id", json!("abc123"))]
#[case::cookies_alias("cookies:session_id", json!("abc123"))]
#[case::session("s:last_page", json!("/home"))]
#[case::env("env:HOME", json!("/root"))]
#[case::environment_alias("environment:HOME", json!("/root"))]
#[case::server("server:REQUEST_METHOD", json!("GET"))]
#[case::files("files:upload", json!({"name": "report.pdf"}))]
#[case::context_long("context:lastCmd", json!("previous output"))]
#[case::context_cmd("cmd:lastCmd", json!("previous output"))]
#[case::context_cxt("cxt:lastCmd", json!("previous output"))]
#[case::context_x("x:lastCmd", json!("previous output"))]
fn every_source_space_resolves(
    snapshot: InputSources,
    context: ExecutionContext,
    #[case] token: &str,
    #[case] expected: serde_json::Value,
) {
    let resolver = ParameterResolver::new(&snapshot, &context);
    assert_eq!(resolver.resolve(token), Some(expected));
}

#[rstest]
fn request_space_prefers_get(snapshot: InputSources, context: ExecutionContext) {
    let resolver = ParameterResolver::new(&snapshot, &context);
    assert_eq!(resolver.resolve("request:shared"), Some(json!("from get")));
    assert_eq!(resolver.resolve("r:postOnly"), Some(json!("posted")));
    assert!(resolver.resolve("request:noSuchThing").is_none());
}

#[rstest]
fn argv_key_is_a_zero_based_index(snapshot: InputSources, context: ExecutionContext) {
    let resolver = ParameterResolver::new(&snapshot, &context);
    assert_eq!(resolver.resolve("argv:0"), Some(json!("fort")));
    assert_eq!(resolver.resolve("a:1"), Some(json!("run")));
    assert!(resolver.resolve("argv:9").is_none());
    assert!(resolver.resolve("argv:one").is_none());
}

#[rstest]
#[case::unknown_tag("bogus:foo")]
#[case::no_colon("foo")]
#[case::missing_key("get:noSuchThing")]
fn absent_tokens_resolve_to_none(
    snapshot: InputSources,
    context: ExecutionContext,
    #[case] token: &str,
) {
    let resolver = ParameterResolver::new(&snapshot, &context);
    assert!(resolver.resolve(token).is_none());
}

#[rstest]
fn fallback_chain_takes_first_present_value(snapshot: InputSources, context: ExecutionContext) {
    let resolver = ParameterResolver::new(&snapshot, &context);
    let specs = vec![ParamSpec::new("value").from("get:foo post:postOnly")];
    let params = resolver.fetch(&specs);
    assert_eq!(params.get("value"), Some(&json!("bar")));
}

#[rstest]
fn fallback_chain_falls_through_in_order(snapshot: InputSources, context: ExecutionContext) {
    let resolver = ParameterResolver::new(&snapshot, &context);
    let specs = vec![ParamSpec::new("value").from("get:missing post:postOnly")];
    let params = resolver.fetch(&specs);
    assert_eq!(params.get("value"), Some(&json!("posted")));
}

#[rstest]
fn default_applies_only_when_all_tokens_miss(snapshot: InputSources, context: ExecutionContext) {
    let resolver = ParameterResolver::new(&snapshot, &context);

    let miss = vec![
        ParamSpec::new("value")
            .from("get:missing post:missing")
            .default_value(json!("fallback")),
    ];
    assert_eq!(resolver.fetch(&miss).get("value"), Some(&json!("fallback")));

    let hit = vec![
        ParamSpec::new("value")
            .from("get:foo")
            .default_value(json!("fallback")),
    ];
    assert_eq!(resolver.fetch(&hit).get("value"), Some(&json!("bar")));
}

#[rstest]
fn parameter_without_value_or_default_is_omitted(
    snapshot: InputSources,
    context: ExecutionContext,
) {
    let resolver = ParameterResolver::new(&snapshot, &context);
    let specs = vec![
        ParamSpec::new("gone").from("get:missing"),
        ParamSpec::new("kept").from("get:foo"),
    ];
    let params = resolver.fetch(&specs);
    assert!(!params.contains("gone"));
    assert!(params.contains("kept"));
    assert_eq!(params.len(), 1);
}

#[rstest]
fn default_only_parameter_resolves_to_default(snapshot: InputSources, context: ExecutionContext) {
    let resolver = ParameterResolver::new(&snapshot, &context);
    let specs = vec![ParamSpec::new("value").default_value(json!("test"))];
    assert_eq!(resolver.fetch(&specs).get("value"), Some(&json!("test")));
}

#[test]
fn source_spec_exposes_tag_and_key() {
    let spec = SourceSpec::parse("CMD:lastCmd").expect("parse");
    assert_eq!(spec.tag(), SourceTag::Context);
    assert_eq!(spec.key(), "lastCmd");
    assert_eq!(spec.tag().to_string(), "context");
}
