use std::time::Duration;

use jqpipe_core::{parse_document_str, DocumentFormat, Step, Vars};
use jqpipe_exec::executor::{execute_steps, StepError, StepErrorKind, StepsOutcome};
use jqpipe_exec::{CompiledSpec, Compiler};
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;

fn compile(doc: &str, vars: &[&str]) -> CompiledSpec {
    let parsed = parse_document_str(doc, DocumentFormat::Json).unwrap();
    Compiler::new()
        .with_vars(vars.iter().copied())
        .compile_document("test", &parsed.document)
        .unwrap()
}

fn response_spec(steps: Value, vars: &[&str]) -> CompiledSpec {
    let doc = json!([{ "url": "https://api.example.com", "response": steps }]);
    compile(&doc.to_string(), vars)
}

async fn run(
    spec: &CompiledSpec,
    steps: &[Step],
    payload: Vec<u8>,
    vars: &Vars,
) -> Result<StepsOutcome, StepError> {
    execute_steps(spec, steps, payload, &spec.bind(vars), &CancellationToken::new()).await
}

fn as_json(bytes: &[u8]) -> Value {
    serde_json::from_slice(bytes).unwrap()
}

#[tokio::test]
async fn split_then_filter_runs_in_order() {
    let spec = response_spec(json!([{ "split": "\n" }, { "jq": ".[1]" }]), &[]);
    let steps = &spec.pipeline().items[0].response_steps;
    let out = run(&spec, steps, b"a\nb\nc".to_vec(), &Vars::new()).await.unwrap();
    assert_eq!(as_json(&out.payload), json!("b"));
    assert!(!out.short_circuit);
}

#[tokio::test]
async fn raw_output_writes_strings_unquoted() {
    let spec = response_spec(json!([{ "jq": ".name", "rawOutput": true }]), &[]);
    let steps = &spec.pipeline().items[0].response_steps;
    let out = run(&spec, steps, br#"{"name":"widget"}"#.to_vec(), &Vars::new()).await.unwrap();
    assert_eq!(out.payload, b"widget".to_vec());
}

#[tokio::test]
async fn raw_output_leaves_non_strings_encoded() {
    let spec = response_spec(json!([{ "jq": ".n", "rawOutput": true }]), &[]);
    let steps = &spec.pipeline().items[0].response_steps;
    let out = run(&spec, steps, br#"{"n":3}"#.to_vec(), &Vars::new()).await.unwrap();
    assert_eq!(out.payload, b"3".to_vec());
}

#[tokio::test]
async fn empty_payload_is_seen_as_null() {
    let spec = response_spec(json!([{ "jq": ". == null" }]), &[]);
    let steps = &spec.pipeline().items[0].response_steps;
    let out = run(&spec, steps, Vec::new(), &Vars::new()).await.unwrap();
    assert_eq!(as_json(&out.payload), json!(true));
}

#[tokio::test]
async fn return_if_true_short_circuits_remaining_steps() {
    let spec = response_spec(
        json!([
            { "returnIf": { "if": "true", "return": { "ok": true } } },
            { "jq": "error(\"must not run\")" }
        ]),
        &[],
    );
    let steps = &spec.pipeline().items[0].response_steps;
    let out = run(&spec, steps, b"{}".to_vec(), &Vars::new()).await.unwrap();
    assert_eq!(as_json(&out.payload), json!({ "ok": true }));
    assert!(out.short_circuit);
}

#[tokio::test]
async fn return_if_false_keeps_payload() {
    let spec = response_spec(
        json!([{ "returnIf": { "if": ".items | length == 0", "return": [] } }]),
        &[],
    );
    let steps = &spec.pipeline().items[0].response_steps;
    let input = br#"{"items":[1]}"#.to_vec();
    let out = run(&spec, steps, input.clone(), &Vars::new()).await.unwrap();
    assert_eq!(out.payload, input);
    assert!(!out.short_circuit);
}

#[tokio::test]
async fn numeric_condition_uses_boolean_text_forms() {
    let spec = response_spec(json!([{ "returnIf": { "if": "length", "return": "one" } }]), &[]);
    let steps = &spec.pipeline().items[0].response_steps;
    let out = run(&spec, steps, b"[7]".to_vec(), &Vars::new()).await.unwrap();
    assert_eq!(as_json(&out.payload), json!("one"));
}

#[tokio::test]
async fn non_boolean_condition_is_a_type_error() {
    let spec = response_spec(
        json!([{ "jq": "." }, { "returnIf": { "if": ".status", "return": null } }]),
        &[],
    );
    let steps = &spec.pipeline().items[0].response_steps;
    let err = run(&spec, steps, br#"{"status":"ok"}"#.to_vec(), &Vars::new())
        .await
        .unwrap_err();
    assert_eq!(err.index, 1);
    assert_eq!(err.step, "returnIf");
    assert!(matches!(err.kind, StepErrorKind::Type(ref s) if s == "\"ok\""));
}

#[tokio::test]
async fn non_json_payload_fails_to_decode() {
    let spec = response_spec(json!([{ "jq": "." }]), &[]);
    let steps = &spec.pipeline().items[0].response_steps;
    let err = run(&spec, steps, b"<html>".to_vec(), &Vars::new()).await.unwrap_err();
    assert!(matches!(err.kind, StepErrorKind::Decode(_)));
}

#[tokio::test]
async fn filter_error_surfaces_as_runtime_error() {
    let spec = response_spec(json!([{ "jq": "error(\"boom\")" }]), &[]);
    let steps = &spec.pipeline().items[0].response_steps;
    let err = run(&spec, steps, b"null".to_vec(), &Vars::new()).await.unwrap_err();
    assert!(matches!(err.kind, StepErrorKind::FilterRuntime(_)));
    assert!(err.to_string().starts_with("step 0: jq:"));
}

#[tokio::test]
async fn variables_bind_only_when_requested() {
    let spec = response_spec(
        json!([{ "jq": "[$id, .]", "bindVars": true }, { "jq": "[$id, .[0]]" }]),
        &["id"],
    );
    let steps = &spec.pipeline().items[0].response_steps;
    let mut vars = Vars::new();
    vars.insert("id".to_string(), "42".to_string());
    let out = run(&spec, steps, b"1".to_vec(), &vars).await.unwrap();
    assert_eq!(as_json(&out.payload), json!([null, "42"]));
}

#[tokio::test]
async fn split_requires_utf8() {
    let spec = response_spec(json!([{ "split": "," }]), &[]);
    let steps = &spec.pipeline().items[0].response_steps;
    let err = run(&spec, steps, vec![0xff, 0xfe], &Vars::new()).await.unwrap_err();
    assert!(matches!(err.kind, StepErrorKind::Split(_)));
}

#[tokio::test]
async fn cancelled_token_stops_before_the_first_step() {
    let spec = response_spec(json!([{ "split": "," }, { "jq": "." }]), &[]);
    let steps = &spec.pipeline().items[0].response_steps;
    let token = CancellationToken::new();
    token.cancel();
    let err = execute_steps(&spec, steps, b"a,b".to_vec(), &spec.bind(&Vars::new()), &token)
        .await
        .unwrap_err();
    assert_eq!(err.index, 0);
    assert!(matches!(err.kind, StepErrorKind::Cancelled));
}

#[tokio::test(flavor = "multi_thread")]
async fn cancellation_abandons_a_slow_filter() {
    let spec = response_spec(json!([{ "jq": "last(range(2000000))" }]), &[]);
    let steps = &spec.pipeline().items[0].response_steps;
    let token = CancellationToken::new();
    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(10)).await;
        canceller.cancel();
    });

    let err = execute_steps(&spec, steps, b"null".to_vec(), &spec.bind(&Vars::new()), &token)
        .await
        .unwrap_err();
    assert!(matches!(err.kind, StepErrorKind::Cancelled));
}
