use std::io::Write;
use std::sync::Arc;

use jqpipe_core::{InitialParams, RequestParams};
use jqpipe_exec::executor::{ExecutorConfig, NoOpEventSink, ReqwestHttpClient};
use jqpipe_exec::{Engine, EngineError, FetchError};
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_string, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn engine() -> Engine {
    Engine::new(
        ExecutorConfig::default(),
        Arc::new(ReqwestHttpClient::default()),
        Arc::new(NoOpEventSink),
    )
}

fn spec_file(doc: &Value) -> tempfile::NamedTempFile {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    f.write_all(doc.to_string().as_bytes()).unwrap();
    f
}

async fn serve_spec(server: &MockServer, doc: &Value) -> String {
    Mock::given(method("GET"))
        .and(path("/spec.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string(doc.to_string()))
        .mount(server)
        .await;
    format!("{}/spec.json", server.uri())
}

#[tokio::test]
async fn remote_spec_runs_end_to_end() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/42"))
        .and(query_param("fields", "name"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "name": "Ada" })))
        .expect(1)
        .mount(&server)
        .await;

    let doc = json!([{
        "url": format!("{}/users/$id", server.uri()),
        "request": [{ "jq": "{path: {id: .path.id}, query: .query}" }],
        "response": [{ "jq": "{user: .name}" }]
    }]);
    let location = serve_spec(&server, &doc).await;

    let mut params = RequestParams::default();
    params.path.insert("id".to_string(), "42".to_string());
    params.query.insert("fields".to_string(), "name".to_string());

    let out = engine()
        .execute(&location, &InitialParams::Request(params))
        .await
        .unwrap();
    let payload: Value = serde_json::from_slice(&out.payload).unwrap();
    assert_eq!(payload, json!({ "user": "Ada" }));
}

#[tokio::test]
async fn local_legacy_spec_posts_form_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/search"))
        .and(body_string("q=rust"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "hits": 3 })))
        .expect(1)
        .mount(&server)
        .await;

    let doc = json!({
        "url": format!("{}/search", server.uri()),
        "request": [{ "jq": "\"q=\" + $term", "rawOutput": true }],
        "response": [{ "jq": ".hits" }]
    });
    let file = spec_file(&doc);

    let out = engine()
        .execute_value(file.path().to_str().unwrap(), json!({ "term": "rust" }))
        .await
        .unwrap();
    assert_eq!(out.payload, b"3".to_vec());
}

#[tokio::test]
async fn yaml_spec_is_accepted() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ping"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"ok\":true}"))
        .mount(&server)
        .await;

    let yaml = format!(
        "- url: {}/ping\n  response:\n    - jq: .ok\n",
        server.uri()
    );
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(yaml.as_bytes()).unwrap();
    let location = format!("file://{}", file.path().display());

    let out = engine()
        .execute(&location, &InitialParams::default())
        .await
        .unwrap();
    assert_eq!(out.payload, b"true".to_vec());
}

#[tokio::test]
async fn bad_filter_fails_before_any_call() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/never"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let doc = json!([
        { "url": format!("{}/never", server.uri()) },
        { "url": format!("{}/never", server.uri()), "response": [{ "jq": ".a | | .b" }] }
    ]);
    let file = spec_file(&doc);

    let err = engine()
        .execute(file.path().to_str().unwrap(), &InitialParams::default())
        .await
        .unwrap_err();
    match err {
        EngineError::Prepare(e) => {
            assert_eq!(e.location.item, 1);
            assert!(e.to_string().starts_with("item 1: response steps: step 0:"));
        }
        other => panic!("expected prepare error, got {other}"),
    }
}

#[tokio::test]
async fn invalid_document_is_rejected() {
    let file = spec_file(&json!([{ "url": "" }]));
    let err = engine()
        .execute(file.path().to_str().unwrap(), &InitialParams::default())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
    assert_eq!(
        err.to_string(),
        "invalid spec: 1 violation(s): $[0].url: must not be empty"
    );
}

#[tokio::test]
async fn unreachable_spec_is_a_fetch_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = engine()
        .execute(&format!("{}/missing.json", server.uri()), &InitialParams::default())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Fetch(FetchError::Status { status: 404, .. })
    ));

    let err = engine()
        .execute("/definitely/not/here.json", &InitialParams::default())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Fetch(FetchError::Io { .. })));
}

#[tokio::test]
async fn non_string_vars_are_rejected() {
    let file = spec_file(&json!([]));
    let err = engine()
        .execute_value(file.path().to_str().unwrap(), json!({ "count": 3 }))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Params(_)));
}

#[tokio::test]
async fn cancelled_token_stops_the_run() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("true"))
        .expect(0)
        .mount(&server)
        .await;

    let file = spec_file(&json!([{ "url": server.uri(), "retry": [{ "jq": "." }] }]));
    let token = CancellationToken::new();
    token.cancel();

    let err = engine()
        .execute_with_cancel(file.path().to_str().unwrap(), &InitialParams::default(), &token)
        .await
        .unwrap_err();
    assert!(err.is_cancelled());
}

#[tokio::test]
async fn cancellation_interrupts_a_slow_spec_fetch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow.json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("[]")
                .set_delay(std::time::Duration::from_secs(10)),
        )
        .mount(&server)
        .await;

    let token = CancellationToken::new();
    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        canceller.cancel();
    });

    let started = std::time::Instant::now();
    let err = engine()
        .execute_with_cancel(
            &format!("{}/slow.json", server.uri()),
            &InitialParams::default(),
            &token,
        )
        .await
        .unwrap_err();
    assert!(err.is_cancelled());
    assert!(started.elapsed() < std::time::Duration::from_secs(5));
}
