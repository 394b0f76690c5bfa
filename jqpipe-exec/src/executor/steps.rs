//! Runs one ordered list of steps over a payload.

use std::sync::Arc;

use jqpipe_core::{FilterStep, ReturnIfStep, Step};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::compile::{BoundVars, CompiledSpec};
use crate::executor::result::{preview, StepError, StepErrorKind};
use crate::executor::types::StepsOutcome;
use crate::filter::{parse_bool, FilterProgram, FilterRuntimeError};

/// Executes `steps` strictly in order. A `ReturnIf` whose condition holds
/// replaces the payload with its configured value and stops the list.
///
/// `cancel` is checked before every step and raced against every filter
/// evaluation; either way the step fails with [`StepErrorKind::Cancelled`].
pub async fn execute_steps(
    spec: &CompiledSpec,
    steps: &[Step],
    payload: Vec<u8>,
    vars: &BoundVars,
    cancel: &CancellationToken,
) -> Result<StepsOutcome, StepError> {
    let mut payload = payload;

    for (index, step) in steps.iter().enumerate() {
        let fail = |kind: StepErrorKind| StepError {
            index,
            step: step.kind(),
            kind,
        };
        if cancel.is_cancelled() {
            return Err(fail(StepErrorKind::Cancelled));
        }

        match step {
            Step::Split { delimiter } => {
                payload = split(&payload, delimiter).map_err(fail)?;
            }
            Step::Filter(f) => {
                payload = run_filter(spec, f, &payload, vars, cancel).await.map_err(fail)?;
            }
            Step::ReturnIf(r) => {
                if let Some(value) = return_if(spec, r, &payload, vars, cancel).await.map_err(fail)? {
                    return Ok(StepsOutcome {
                        payload: value,
                        short_circuit: true,
                    });
                }
            }
        }
    }

    Ok(StepsOutcome {
        payload,
        short_circuit: false,
    })
}

fn split(payload: &[u8], delimiter: &str) -> Result<Vec<u8>, StepErrorKind> {
    let text = std::str::from_utf8(payload).map_err(StepErrorKind::Split)?;
    let parts: Vec<&str> = text.split(delimiter).collect();
    serde_json::to_vec(&parts).map_err(StepErrorKind::Encode)
}

async fn run_filter(
    spec: &CompiledSpec,
    step: &FilterStep,
    payload: &[u8],
    vars: &BoundVars,
    cancel: &CancellationToken,
) -> Result<Vec<u8>, StepErrorKind> {
    let result = eval(spec, &step.expression, payload, vars.values(step.bind_vars), cancel).await?;
    match result {
        Value::String(s) if step.raw_output => Ok(s.into_bytes()),
        other => serde_json::to_vec(&other).map_err(StepErrorKind::Encode),
    }
}

async fn return_if(
    spec: &CompiledSpec,
    step: &ReturnIfStep,
    payload: &[u8],
    vars: &BoundVars,
    cancel: &CancellationToken,
) -> Result<Option<Vec<u8>>, StepErrorKind> {
    let result = eval(spec, &step.condition, payload, vars.values(false), cancel).await?;
    let encoded = serde_json::to_vec(&result).map_err(StepErrorKind::Encode)?;
    match parse_bool(&encoded) {
        Some(true) => serde_json::to_vec(&step.value)
            .map(Some)
            .map_err(StepErrorKind::Encode),
        Some(false) => Ok(None),
        None => Err(StepErrorKind::Type(preview(&encoded))),
    }
}

/// Evaluates on the blocking pool. On cancellation the evaluation is
/// abandoned and finishes in the background.
async fn eval(
    spec: &CompiledSpec,
    expression: &str,
    payload: &[u8],
    vars: &[Value],
    cancel: &CancellationToken,
) -> Result<Value, StepErrorKind> {
    let program: Arc<FilterProgram> = spec
        .filter(expression)
        .cloned()
        .ok_or_else(|| StepErrorKind::MissingFilter(expression.to_string()))?;
    let input = decode_payload(payload)?;
    let vars = vars.to_vec();

    let task = tokio::task::spawn_blocking(move || program.run_first(input, &vars));
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(StepErrorKind::Cancelled),
        joined = task => match joined {
            Ok(result) => result.map_err(StepErrorKind::FilterRuntime),
            Err(e) => Err(StepErrorKind::FilterRuntime(FilterRuntimeError(format!(
                "filter evaluation aborted: {e}"
            )))),
        },
    }
}

/// An empty payload decodes to "no value", which filters see as `null`.
fn decode_payload(payload: &[u8]) -> Result<Value, StepErrorKind> {
    if payload.is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_slice(payload).map_err(StepErrorKind::Decode)
}
