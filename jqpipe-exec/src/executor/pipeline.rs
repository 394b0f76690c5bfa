use std::sync::Arc;

use jqpipe_core::{Item, Vars};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::compile::{BoundVars, CompiledSpec};
use crate::executor::events::{Event, EventSink, NoOpEventSink};
use crate::executor::http::HttpClient;
use crate::executor::item::ItemRunner;
use crate::executor::result::{ExecutionError, ItemError};
use crate::executor::types::{ExecutorConfig, ItemOutcome, RunOutcome};

/// Runs prepared pipelines. Holds no per-run state, so one executor can
/// serve any number of concurrent runs.
pub struct Executor {
    config: ExecutorConfig,
    http: Arc<dyn HttpClient>,
    event_sink: Arc<dyn EventSink>,
}

impl Executor {
    pub fn new(config: ExecutorConfig, http: Arc<dyn HttpClient>, event_sink: Arc<dyn EventSink>) -> Self {
        Self {
            config,
            http,
            event_sink,
        }
    }

    pub fn with_http(http: Arc<dyn HttpClient>) -> Self {
        Self::new(ExecutorConfig::default(), http, Arc::new(NoOpEventSink))
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    pub async fn run(&self, spec: &CompiledSpec, input: Vec<u8>, vars: &Vars) -> Result<RunOutcome, ExecutionError> {
        self.run_with_cancel(spec, input, vars, &CancellationToken::new()).await
    }

    /// Threads the payload through every item in order. The first item to
    /// short-circuit ends the run with its payload; zero items return `input`.
    pub async fn run_with_cancel(
        &self,
        spec: &CompiledSpec,
        input: Vec<u8>,
        vars: &Vars,
        cancel: &CancellationToken,
    ) -> Result<RunOutcome, ExecutionError> {
        let run_id = Uuid::new_v4();
        let bound = spec.bind(vars);
        let items = &spec.pipeline().items;

        self.event_sink
            .emit(Event::RunStarted {
                run_id,
                location: spec.location().to_string(),
                items: items.len(),
            })
            .await;

        let result = self.run_items(run_id, spec, items, input, &bound, cancel).await;

        self.event_sink
            .emit(Event::RunFinished {
                run_id,
                succeeded: result.is_ok(),
                short_circuited: result.as_ref().is_ok_and(|o| o.short_circuited),
            })
            .await;
        result
    }

    async fn run_items(
        &self,
        run_id: Uuid,
        spec: &CompiledSpec,
        items: &[Item],
        input: Vec<u8>,
        vars: &BoundVars,
        cancel: &CancellationToken,
    ) -> Result<RunOutcome, ExecutionError> {
        let runner = self.runner(run_id, spec, vars, cancel);
        let mut payload = input;
        let mut items_run = 0;

        for (index, item) in items.iter().enumerate() {
            if cancel.is_cancelled() {
                return Err(ExecutionError::Cancelled);
            }
            let outcome = runner
                .run(index, item, &payload)
                .await
                .map_err(|source| ExecutionError::Item { index, source })?;
            items_run += 1;
            payload = outcome.payload;
            if outcome.short_circuit {
                return Ok(RunOutcome {
                    run_id,
                    payload,
                    short_circuited: true,
                    items_run,
                });
            }
        }

        Ok(RunOutcome {
            run_id,
            payload,
            short_circuited: false,
            items_run,
        })
    }

    /// Runs a single item of `spec` outside a full pipeline run.
    pub async fn run_item(
        &self,
        spec: &CompiledSpec,
        index: usize,
        input: &[u8],
        vars: &Vars,
        cancel: &CancellationToken,
    ) -> Result<ItemOutcome, ExecutionError> {
        let item = spec.pipeline().items.get(index).ok_or(ExecutionError::NoSuchItem { index })?;
        let bound = spec.bind(vars);
        self.runner(Uuid::new_v4(), spec, &bound, cancel)
            .run(index, item, input)
            .await
            .map_err(|source| match source {
                ItemError::Cancelled => ExecutionError::Cancelled,
                source => ExecutionError::Item { index, source },
            })
    }

    fn runner<'a>(
        &'a self,
        run_id: Uuid,
        spec: &'a CompiledSpec,
        vars: &'a BoundVars,
        cancel: &'a CancellationToken,
    ) -> ItemRunner<'a> {
        ItemRunner {
            config: &self.config,
            http: self.http.as_ref(),
            event_sink: self.event_sink.as_ref(),
            spec,
            vars,
            cancel,
            run_id,
        }
    }
}
