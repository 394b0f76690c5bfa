use std::num::NonZeroUsize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use jqpipe_core::{parse_document_bytes, DocumentFormat, ParsedDocument};
use jqpipe_exec::executor::{
    CompositeEventSink, EventSink, ExecutorConfig, NoOpEventSink, ReqwestHttpClient, StderrEventSink, StdoutEventSink,
};
use jqpipe_exec::load_spec;

use super::progress::ProgressEventSink;
use crate::exit_codes;
use crate::output::print_error;
use crate::{EventsTarget, ExecArgs, OutputArgs};

pub fn load_params(path: Option<&Path>, output: &OutputArgs) -> Option<serde_json::Value> {
    let path = path?;
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            print_error(output.format, output.quiet, &format!("failed to read params: {e}"));
            return None;
        }
    };
    if let Ok(v) = serde_json::from_str(&content) {
        return Some(v);
    }
    if let Ok(v) = serde_yaml::from_str(&content) {
        return Some(v);
    }
    print_error(output.format, output.quiet, "params file is neither valid JSON nor YAML");
    None
}

pub fn merge_set_params(params: &mut Option<serde_json::Value>, set_params: &[(String, String)]) {
    if set_params.is_empty() {
        return;
    }
    let obj = params.get_or_insert(serde_json::json!({}));
    if let Some(map) = obj.as_object_mut() {
        for (k, v) in set_params {
            map.insert(k.clone(), serde_json::Value::String(v.clone()));
        }
    }
}

pub fn build_executor_config(exec: &ExecArgs) -> ExecutorConfig {
    ExecutorConfig {
        request_timeout: Duration::from_millis(exec.request_timeout_ms),
        max_response_bytes: exec.max_response_bytes,
        max_item_attempts: exec.max_item_attempts.map(NonZeroUsize::get),
    }
}

pub fn build_event_sink(target: EventsTarget, show_progress: bool) -> Arc<dyn EventSink> {
    let base: Box<dyn EventSink> = match target {
        EventsTarget::None => Box::new(NoOpEventSink),
        EventsTarget::Stdout => Box::new(StdoutEventSink),
        EventsTarget::Stderr => Box::new(StderrEventSink),
    };
    if !show_progress {
        return Arc::from(base);
    }
    let mut sink = CompositeEventSink::new();
    sink.add(Box::new(ProgressEventSink::new()));
    sink.add(base);
    Arc::new(sink)
}

/// Fetches and parses the spec at `location`, reporting failures and
/// returning the exit code to use.
pub async fn load_document(location: &str, output: &OutputArgs) -> Result<ParsedDocument, i32> {
    let config = ExecutorConfig::default();
    let bytes = match load_spec(
        &ReqwestHttpClient::default(),
        location,
        config.request_timeout,
        config.max_response_bytes,
    )
    .await
    {
        Ok(b) => b,
        Err(e) => {
            print_error(output.format, output.quiet, &format!("{e}"));
            return Err(exit_codes::RUNTIME_ERROR);
        }
    };

    parse_document_bytes(&bytes, DocumentFormat::Auto).map_err(|e| {
        print_error(output.format, output.quiet, &format!("parse failed: {e}"));
        exit_codes::VALIDATION_FAILED
    })
}
