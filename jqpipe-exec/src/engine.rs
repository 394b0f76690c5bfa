//! Entry point tying loading, parsing, validation, preparation and execution together.

use std::sync::Arc;

use jqpipe_core::{
    parse_document_bytes, validate_document, DocumentFormat, InitialParams, ParamsError, ParseError,
    ValidationError,
};
use tokio_util::sync::CancellationToken;

use crate::compile::{CompiledSpec, Compiler, PrepareError};
use crate::executor::{EventSink, ExecutionError, Executor, ExecutorConfig, HttpClient, NoOpEventSink, ReqwestHttpClient, RunOutcome};
use crate::loader::{load_spec, FetchError};

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("parse spec: {0}")]
    Parse(#[from] ParseError),
    #[error("invalid spec: {0}")]
    Validation(#[from] ValidationError),
    #[error("prepare spec: {0}")]
    Prepare(#[from] PrepareError),
    #[error("initial params: {0}")]
    Params(#[from] ParamsError),
    #[error("encode initial payload: {0}")]
    Encode(#[source] serde_json::Error),
    #[error(transparent)]
    Execution(#[from] ExecutionError),
}

impl EngineError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, EngineError::Execution(e) if e.is_cancelled())
    }
}

pub struct Engine {
    http: Arc<dyn HttpClient>,
    executor: Executor,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(
            ExecutorConfig::default(),
            Arc::new(ReqwestHttpClient::default()),
            Arc::new(NoOpEventSink),
        )
    }
}

impl Engine {
    pub fn new(config: ExecutorConfig, http: Arc<dyn HttpClient>, event_sink: Arc<dyn EventSink>) -> Self {
        let executor = Executor::new(config, http.clone(), event_sink);
        Self { http, executor }
    }

    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    /// Loads, parses, validates and compiles the spec at `location`,
    /// declaring `var_names` as the variables its filters may reference.
    pub async fn prepare<I, S>(&self, location: &str, var_names: I) -> Result<CompiledSpec, EngineError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let config = self.executor.config();
        let bytes = load_spec(
            self.http.as_ref(),
            location,
            config.request_timeout,
            config.max_response_bytes,
        )
        .await?;
        let parsed = parse_document_bytes(&bytes, DocumentFormat::Auto)?;
        validate_document(&parsed.document)?;
        let spec = Compiler::new()
            .with_vars(var_names)
            .compile_document(location, &parsed.document)?;
        Ok(spec)
    }

    pub async fn execute(&self, location: &str, params: &InitialParams) -> Result<RunOutcome, EngineError> {
        self.execute_with_cancel(location, params, &CancellationToken::new())
            .await
    }

    pub async fn execute_with_cancel(
        &self,
        location: &str,
        params: &InitialParams,
        cancel: &CancellationToken,
    ) -> Result<RunOutcome, EngineError> {
        let spec = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ExecutionError::Cancelled.into()),
            spec = self.prepare(location, params.vars().keys().cloned()) => spec?,
        };
        let input = params.payload().map_err(EngineError::Encode)?;
        let outcome = self
            .executor
            .run_with_cancel(&spec, input, params.vars(), cancel)
            .await?;
        Ok(outcome)
    }

    /// Like [`Engine::execute`], taking raw JSON initial parameters.
    pub async fn execute_value(
        &self,
        location: &str,
        params: serde_json::Value,
    ) -> Result<RunOutcome, EngineError> {
        let params = InitialParams::from_value(params)?;
        self.execute(location, &params).await
    }
}
