use std::io::IsTerminal;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use jqpipe_core::InitialParams;
use jqpipe_exec::executor::ReqwestHttpClient;
use jqpipe_exec::{Engine, EngineError};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::exit_codes;
use crate::output::{print_error, print_payload, print_result, OutputFormat};
use crate::{EventsTarget, ExecArgs, OutputArgs};

use super::config::{build_event_sink, build_executor_config, load_params, merge_set_params};

#[derive(Serialize)]
struct RunResult {
    run_id: String,
    status: &'static str,
    short_circuited: bool,
    items_run: usize,
    /// Parsed when the payload is JSON, otherwise carried as a string.
    payload: serde_json::Value,
}

pub async fn run_cmd(
    location: &str,
    params_path: Option<&Path>,
    set_params: &[(String, String)],
    output: OutputArgs,
    exec: ExecArgs,
) -> i32 {
    let mut params = load_params(params_path, &output);
    if params.is_none() && params_path.is_some() {
        return exit_codes::RUNTIME_ERROR;
    }
    merge_set_params(&mut params, set_params);

    let params = match InitialParams::from_value(params.unwrap_or(serde_json::Value::Null)) {
        Ok(p) => p,
        Err(e) => {
            print_error(output.format, output.quiet, &format!("initial params: {e}"));
            return exit_codes::VALIDATION_FAILED;
        }
    };

    let show_progress = output.format == OutputFormat::Text
        && !output.quiet
        && exec.events != EventsTarget::Stderr
        && std::io::stderr().is_terminal();
    let engine = Engine::new(
        build_executor_config(&exec),
        Arc::new(ReqwestHttpClient::default()),
        build_event_sink(exec.events, show_progress),
    );

    let cancel = CancellationToken::new();
    spawn_cancel_triggers(&cancel, exec.timeout_ms);

    let result = engine.execute_with_cancel(location, &params, &cancel).await;
    cancel.cancel();

    match result {
        Ok(outcome) => {
            if output.format == OutputFormat::Text {
                if !output.quiet {
                    print_payload(&outcome.payload);
                }
            } else {
                let payload = serde_json::from_slice(&outcome.payload).unwrap_or_else(|_| {
                    serde_json::Value::String(String::from_utf8_lossy(&outcome.payload).into_owned())
                });
                let res = RunResult {
                    run_id: outcome.run_id.to_string(),
                    status: "succeeded",
                    short_circuited: outcome.short_circuited,
                    items_run: outcome.items_run,
                    payload,
                };
                print_result(output.format, output.quiet, &res);
            }
            exit_codes::SUCCESS
        }
        Err(e) => {
            print_error(output.format, output.quiet, &e.to_string());
            exit_code_for(&e)
        }
    }
}

/// Ctrl-C and the optional whole-run deadline both cancel `cancel`.
fn spawn_cancel_triggers(cancel: &CancellationToken, timeout_ms: Option<u64>) {
    let token = cancel.clone();
    tokio::spawn(async move {
        tokio::select! {
            _ = token.cancelled() => {}
            r = tokio::signal::ctrl_c() => {
                if r.is_ok() {
                    token.cancel();
                }
            }
        }
    });

    if let Some(ms) = timeout_ms {
        let token = cancel.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(Duration::from_millis(ms)) => token.cancel(),
            }
        });
    }
}

fn exit_code_for(err: &EngineError) -> i32 {
    match err {
        EngineError::Parse(_)
        | EngineError::Validation(_)
        | EngineError::Prepare(_)
        | EngineError::Params(_) => exit_codes::VALIDATION_FAILED,
        EngineError::Execution(_) => exit_codes::RUN_FAILED,
        EngineError::Fetch(_) | EngineError::Encode(_) => exit_codes::RUNTIME_ERROR,
    }
}
