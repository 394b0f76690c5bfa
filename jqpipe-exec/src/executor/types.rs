use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Per-request timeout for every outbound HTTP call.
    pub request_timeout: Duration,
    pub max_response_bytes: usize,
    /// Cap on attempts per item when its retry condition keeps asking to loop.
    /// `None` keeps looping until cancelled.
    pub max_item_attempts: Option<usize>,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            max_response_bytes: 16 * 1024 * 1024,
            max_item_attempts: None,
        }
    }
}

/// Output of one ordered list of steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepsOutcome {
    pub payload: Vec<u8>,
    pub short_circuit: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemOutcome {
    pub payload: Vec<u8>,
    pub short_circuit: bool,
    pub attempts: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    pub run_id: uuid::Uuid,
    pub payload: Vec<u8>,
    pub short_circuited: bool,
    pub items_run: usize,
}
