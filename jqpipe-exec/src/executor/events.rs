use async_trait::async_trait;
use jqpipe_core::Phase;
use serde_json::json;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub enum Event {
    RunStarted {
        run_id: Uuid,
        location: String,
        items: usize,
    },
    RunFinished {
        run_id: Uuid,
        succeeded: bool,
        short_circuited: bool,
    },
    ItemStarted {
        run_id: Uuid,
        item: usize,
        attempt: usize,
    },
    RequestSent {
        run_id: Uuid,
        item: usize,
        attempt: usize,
        method: String,
        url: String,
    },
    ResponseReceived {
        run_id: Uuid,
        item: usize,
        attempt: usize,
        status: u16,
        bytes: usize,
    },
    RetryRequested {
        run_id: Uuid,
        item: usize,
        attempt: usize,
    },
    ShortCircuited {
        run_id: Uuid,
        item: usize,
        phase: Phase,
    },
    ItemFinished {
        run_id: Uuid,
        item: usize,
        attempts: usize,
    },
}

impl Event {
    pub fn event_type(&self) -> &'static str {
        match self {
            Event::RunStarted { .. } => "run.started",
            Event::RunFinished { .. } => "run.finished",
            Event::ItemStarted { .. } => "item.started",
            Event::RequestSent { .. } => "request.sent",
            Event::ResponseReceived { .. } => "response.received",
            Event::RetryRequested { .. } => "item.retry_requested",
            Event::ShortCircuited { .. } => "item.short_circuited",
            Event::ItemFinished { .. } => "item.finished",
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        let ty = self.event_type();
        match self {
            Event::RunStarted { run_id, location, items } => {
                json!({ "type": ty, "run_id": run_id.to_string(), "location": location, "items": items })
            }
            Event::RunFinished { run_id, succeeded, short_circuited } => {
                json!({ "type": ty, "run_id": run_id.to_string(), "succeeded": succeeded, "short_circuited": short_circuited })
            }
            Event::ItemStarted { run_id, item, attempt } => {
                json!({ "type": ty, "run_id": run_id.to_string(), "item": item, "attempt": attempt })
            }
            Event::RequestSent { run_id, item, attempt, method, url } => {
                json!({ "type": ty, "run_id": run_id.to_string(), "item": item, "attempt": attempt, "method": method, "url": url })
            }
            Event::ResponseReceived { run_id, item, attempt, status, bytes } => {
                json!({ "type": ty, "run_id": run_id.to_string(), "item": item, "attempt": attempt, "status": status, "bytes": bytes })
            }
            Event::RetryRequested { run_id, item, attempt } => {
                json!({ "type": ty, "run_id": run_id.to_string(), "item": item, "attempt": attempt })
            }
            Event::ShortCircuited { run_id, item, phase } => {
                json!({ "type": ty, "run_id": run_id.to_string(), "item": item, "phase": phase.as_str() })
            }
            Event::ItemFinished { run_id, item, attempts } => {
                json!({ "type": ty, "run_id": run_id.to_string(), "item": item, "attempts": attempts })
            }
        }
    }
}

#[async_trait]
pub trait EventSink: Send + Sync {
    async fn emit(&self, event: Event);
}

pub struct CompositeEventSink {
    sinks: Vec<Box<dyn EventSink>>,
}

impl Default for CompositeEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl CompositeEventSink {
    pub fn new() -> Self {
        Self { sinks: Vec::new() }
    }

    pub fn add(&mut self, sink: Box<dyn EventSink>) {
        self.sinks.push(sink);
    }
}

#[async_trait]
impl EventSink for CompositeEventSink {
    async fn emit(&self, event: Event) {
        for sink in &self.sinks {
            sink.emit(event.clone()).await;
        }
    }
}

/// Writes one JSON object per event to stdout.
pub struct StdoutEventSink;

#[async_trait]
impl EventSink for StdoutEventSink {
    async fn emit(&self, event: Event) {
        println!("{}", serde_json::to_string(&event.to_json()).unwrap_or_default());
    }
}

/// Writes one JSON object per event to stderr, keeping stdout for the run output.
pub struct StderrEventSink;

#[async_trait]
impl EventSink for StderrEventSink {
    async fn emit(&self, event: Event) {
        eprintln!("{}", serde_json::to_string(&event.to_json()).unwrap_or_default());
    }
}

pub struct NoOpEventSink;

#[async_trait]
impl EventSink for NoOpEventSink {
    async fn emit(&self, _event: Event) {}
}
