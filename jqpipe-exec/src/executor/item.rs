use jqpipe_core::{Item, Phase, RequestMode, RequestParams};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::compile::{BoundVars, CompiledSpec};
use crate::executor::events::{Event, EventSink};
use crate::executor::http::{HttpClient, HttpRequestParts, HttpResponseParts};
use crate::executor::request::{build_form_post, build_request};
use crate::executor::result::{preview, ItemError, StepErrorKind};
use crate::executor::steps::execute_steps;
use crate::executor::types::{ExecutorConfig, ItemOutcome, StepsOutcome};
use crate::filter::parse_bool;

pub struct ItemRunner<'a> {
    pub config: &'a ExecutorConfig,
    pub http: &'a dyn HttpClient,
    pub event_sink: &'a dyn EventSink,
    pub spec: &'a CompiledSpec,
    pub vars: &'a BoundVars,
    pub cancel: &'a CancellationToken,
    pub run_id: Uuid,
}

impl ItemRunner<'_> {
    /// Runs one item to completion: request steps, the HTTP call, response
    /// steps, then the retry condition. Every attempt starts again from `input`.
    pub async fn run(&self, index: usize, item: &Item, input: &[u8]) -> Result<ItemOutcome, ItemError> {
        let max = self.config.max_item_attempts.unwrap_or(usize::MAX).max(1);

        for attempt in 1..=max {
            if self.cancel.is_cancelled() {
                return Err(ItemError::Cancelled);
            }
            self.event_sink
                .emit(Event::ItemStarted {
                    run_id: self.run_id,
                    item: index,
                    attempt,
                })
                .await;

            let prep = self.phase(item, Phase::Request, input.to_vec()).await?;
            if prep.short_circuit {
                return Ok(self.short_circuit(index, Phase::Request, prep.payload, attempt).await);
            }

            let req = match item.mode {
                RequestMode::Templated => {
                    // A `null` payload means a plain call to the template.
                    let params = serde_json::from_slice::<Option<RequestParams>>(&prep.payload)
                        .map_err(ItemError::DecodeParams)?
                        .unwrap_or_default();
                    build_request(&item.url_template, &params)?
                }
                RequestMode::FormPost => build_form_post(&item.url_template, prep.payload)?,
            };

            let resp = self.send(index, attempt, req).await?;

            let post = self.phase(item, Phase::Response, resp.body).await?;
            if post.short_circuit {
                return Ok(self.short_circuit(index, Phase::Response, post.payload, attempt).await);
            }
            if item.retry_steps.is_empty() {
                return Ok(self.finish(index, post.payload, attempt).await);
            }

            let decision = self.phase(item, Phase::Retry, post.payload.clone()).await?;
            if decision.short_circuit {
                return Ok(self.short_circuit(index, Phase::Retry, decision.payload, attempt).await);
            }

            match parse_bool(&decision.payload) {
                Some(true) => {
                    self.event_sink
                        .emit(Event::RetryRequested {
                            run_id: self.run_id,
                            item: index,
                            attempt,
                        })
                        .await;
                }
                Some(false) => return Ok(self.finish(index, post.payload, attempt).await),
                None => return Err(ItemError::RetryCondition(preview(&decision.payload))),
            }
        }

        Err(ItemError::RetryLimitExceeded { attempts: max })
    }

    /// Runs one phase's steps. A cancelled token fails the phase even when
    /// it has no steps.
    async fn phase(&self, item: &Item, phase: Phase, payload: Vec<u8>) -> Result<StepsOutcome, ItemError> {
        if self.cancel.is_cancelled() {
            return Err(ItemError::Cancelled);
        }
        execute_steps(self.spec, item.steps(phase), payload, self.vars, self.cancel)
            .await
            .map_err(|source| match source.kind {
                StepErrorKind::Cancelled => ItemError::Cancelled,
                _ => ItemError::Steps { phase, source },
            })
    }

    async fn send(
        &self,
        index: usize,
        attempt: usize,
        req: HttpRequestParts,
    ) -> Result<HttpResponseParts, ItemError> {
        self.event_sink
            .emit(Event::RequestSent {
                run_id: self.run_id,
                item: index,
                attempt,
                method: req.method.clone(),
                url: req.url.to_string(),
            })
            .await;

        let resp = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(ItemError::Cancelled),
            r = self.http.send(req, self.config.request_timeout, self.config.max_response_bytes) => {
                r.map_err(ItemError::Network)?
            }
        };

        self.event_sink
            .emit(Event::ResponseReceived {
                run_id: self.run_id,
                item: index,
                attempt,
                status: resp.status,
                bytes: resp.body.len(),
            })
            .await;
        Ok(resp)
    }

    async fn short_circuit(&self, index: usize, phase: Phase, payload: Vec<u8>, attempts: usize) -> ItemOutcome {
        self.event_sink
            .emit(Event::ShortCircuited {
                run_id: self.run_id,
                item: index,
                phase,
            })
            .await;
        let mut out = self.finish(index, payload, attempts).await;
        out.short_circuit = true;
        out
    }

    async fn finish(&self, index: usize, payload: Vec<u8>, attempts: usize) -> ItemOutcome {
        self.event_sink
            .emit(Event::ItemFinished {
                run_id: self.run_id,
                item: index,
                attempts,
            })
            .await;
        ItemOutcome {
            payload,
            short_circuit: false,
            attempts,
        }
    }
}
