use jqpipe_core::{parse_document_str, validate_document, DocumentFormat, PipelineDocument};

fn two_item_pipeline_json() -> &'static str {
    r#"
[
  {
    "url": "https://api.example.com/users/$id",
    "request": [{ "jq": "{path: {id: .query.id}}" }],
    "response": [{ "jq": ".name" }],
    "retry": []
  },
  {
    "url": "https://api.example.com/search",
    "request": [{ "jq": "{query: {q: .}}" }],
    "response": [
      { "returnIf": { "if": ".total == 0", "return": { "found": false } } }
    ]
  }
]
"#
}

#[test]
fn parse_json_pipeline_and_validate_ok() {
    let parsed = parse_document_str(two_item_pipeline_json(), DocumentFormat::Json).unwrap();
    validate_document(&parsed.document).unwrap();
    match &parsed.document {
        PipelineDocument::Pipeline(items) => {
            assert_eq!(items.len(), 2);
            assert_eq!(items[0].url, "https://api.example.com/users/$id");
            assert!(items[1].retry.is_empty());
            let ri = items[1].response[0].return_if.as_ref().unwrap();
            assert_eq!(ri.condition, ".total == 0");
            assert_eq!(ri.value, serde_json::json!({"found": false}));
        }
        PipelineDocument::Legacy(_) => panic!("expected pipeline form"),
    }
}

#[test]
fn parse_auto_detects_json() {
    let parsed = parse_document_str(two_item_pipeline_json(), DocumentFormat::Auto).unwrap();
    assert_eq!(parsed.format, DocumentFormat::Json);
}

#[test]
fn parse_auto_detects_yaml() {
    let yaml = r#"
- url: https://api.example.com/items
  response:
    - jq: .items
    - split: ","
"#;
    let parsed = parse_document_str(yaml, DocumentFormat::Auto).unwrap();
    assert_eq!(parsed.format, DocumentFormat::Yaml);
    assert_eq!(parsed.document.item_count(), 1);
}

#[test]
fn null_step_lists_are_accepted() {
    let json = r#"[{"url": "https://example.com", "request": null, "response": null, "retry": null}]"#;
    let parsed = parse_document_str(json, DocumentFormat::Json).unwrap();
    match parsed.document {
        PipelineDocument::Pipeline(items) => {
            assert!(items[0].request.is_empty());
            assert!(items[0].response.is_empty());
            assert!(items[0].retry.is_empty());
        }
        PipelineDocument::Legacy(_) => panic!("expected pipeline form"),
    }
}

#[test]
fn object_document_is_legacy() {
    let json = r#"
{
  "url": "https://example.com/form",
  "request": [{ "jq": "\"name=\" + $name", "rawOutput": true }],
  "response": [{ "jq": ".ok" }]
}
"#;
    let parsed = parse_document_str(json, DocumentFormat::Json).unwrap();
    assert!(parsed.document.is_legacy());
    validate_document(&parsed.document).unwrap();
}

#[test]
fn scalar_document_is_rejected() {
    let err = parse_document_str("42", DocumentFormat::Json).unwrap_err();
    assert!(err.to_string().contains("legacy item object"));
}

#[test]
fn empty_input_is_unknown_format() {
    let err = parse_document_str("   ", DocumentFormat::Auto).unwrap_err();
    assert!(matches!(err, jqpipe_core::ParseError::UnknownFormat));
}

#[test]
fn validate_reports_empty_url_and_condition() {
    let json = r#"
[
  {
    "url": "",
    "response": [{ "returnIf": { "return": 1 } }]
  }
]
"#;
    let parsed = parse_document_str(json, DocumentFormat::Json).unwrap();
    let err = validate_document(&parsed.document).unwrap_err();
    let paths: Vec<&str> = err.violations.iter().map(|v| v.path.as_str()).collect();
    assert!(paths.contains(&"$[0].url"));
    assert!(paths.contains(&"$[0].response[0].returnIf.if"));
}

#[test]
fn validate_rejects_relative_url_template() {
    let json = r#"[{ "url": "api/users/$id" }]"#;
    let parsed = parse_document_str(json, DocumentFormat::Json).unwrap();
    let err = validate_document(&parsed.document).unwrap_err();
    assert_eq!(err.violations.len(), 1);
    assert_eq!(err.violations[0].path, "$[0].url");
}

#[test]
fn validate_allows_leading_placeholder() {
    let json = r#"[{ "url": "$base/users" }]"#;
    let parsed = parse_document_str(json, DocumentFormat::Json).unwrap();
    validate_document(&parsed.document).unwrap();
}

#[test]
fn validate_flags_raw_output_without_filter() {
    let json = r#"[{ "url": "https://example.com", "request": [{ "split": ",", "rawOutput": true }] }]"#;
    let parsed = parse_document_str(json, DocumentFormat::Json).unwrap();
    let err = validate_document(&parsed.document).unwrap_err();
    assert_eq!(err.violations[0].path, "$[0].request[0].rawOutput");
}
