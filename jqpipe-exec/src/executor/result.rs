use jqpipe_core::Phase;

use crate::executor::http::HttpError;
use crate::executor::request::RequestError;
use crate::filter::FilterRuntimeError;

#[derive(Debug, thiserror::Error)]
#[error("step {index}: {step}: {kind}")]
pub struct StepError {
    pub index: usize,
    pub step: &'static str,
    pub kind: StepErrorKind,
}

#[derive(Debug, thiserror::Error)]
pub enum StepErrorKind {
    #[error("payload is not valid UTF-8: {0}")]
    Split(std::str::Utf8Error),
    #[error("payload is not valid JSON: {0}")]
    Decode(serde_json::Error),
    #[error("{0}")]
    FilterRuntime(FilterRuntimeError),
    #[error("expected a boolean, got `{0}`")]
    Type(String),
    #[error("failed to encode result: {0}")]
    Encode(serde_json::Error),
    #[error("filter `{0}` was not compiled for this spec")]
    MissingFilter(String),
    #[error("cancelled")]
    Cancelled,
}

#[derive(Debug, thiserror::Error)]
pub enum ItemError {
    #[error("{phase}: {source}")]
    Steps { phase: Phase, source: StepError },
    #[error("request params: {0}")]
    DecodeParams(#[source] serde_json::Error),
    #[error("fetch: {0}")]
    Request(#[from] RequestError),
    #[error("fetch: {0}")]
    Network(#[source] HttpError),
    #[error("retry: output: expected a boolean, got `{0}`")]
    RetryCondition(String),
    #[error("cancelled")]
    Cancelled,
    #[error("retry limit exceeded after {attempts} attempts")]
    RetryLimitExceeded { attempts: usize },
}

#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    #[error("item {index}: {source}")]
    Item { index: usize, source: ItemError },
    #[error("cancelled")]
    Cancelled,
    #[error("no item at index {index}")]
    NoSuchItem { index: usize },
}

impl ExecutionError {
    pub fn is_cancelled(&self) -> bool {
        matches!(
            self,
            ExecutionError::Cancelled
                | ExecutionError::Item {
                    source: ItemError::Cancelled,
                    ..
                }
        )
    }
}

/// Renders a payload for error messages, truncated to keep messages readable.
pub(crate) fn preview(payload: &[u8]) -> String {
    const MAX: usize = 64;
    let s = String::from_utf8_lossy(payload);
    if s.chars().count() > MAX {
        let head: String = s.chars().take(MAX).collect();
        format!("{head}...")
    } else {
        s.into_owned()
    }
}
