use std::num::NonZeroUsize;

use clap::Args;

use crate::output::OutputFormat;

#[derive(Debug, Args, Clone)]
pub struct OutputArgs {
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    pub format: OutputFormat,
    #[arg(long, short, global = true)]
    pub quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum EventsTarget {
    None,
    Stdout,
    Stderr,
}

#[derive(Debug, Args, Clone)]
pub struct ExecArgs {
    /// Where run events are written as JSON lines.
    #[arg(long, value_enum, default_value_t = EventsTarget::None)]
    pub events: EventsTarget,
    /// Cancels the whole run after this many milliseconds.
    #[arg(long)]
    pub timeout_ms: Option<u64>,
    #[arg(long, default_value_t = 30_000)]
    pub request_timeout_ms: u64,
    #[arg(long, default_value_t = 16 * 1024 * 1024)]
    pub max_response_bytes: usize,
    /// Upper bound on attempts per item; unbounded when omitted.
    #[arg(long)]
    pub max_item_attempts: Option<NonZeroUsize>,
}

/// Parses a `--set KEY=VALUE` argument. The value may itself contain `=`.
pub fn parse_key_val(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((k, _)) if k.is_empty() => Err(format!("missing key in `{s}`")),
        Some((k, v)) => Ok((k.to_string(), v.to_string())),
        None => Err(format!("expected KEY=VALUE, got `{s}`")),
    }
}
