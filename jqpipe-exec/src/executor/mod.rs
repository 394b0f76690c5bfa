pub mod events;
pub mod http;
mod item;
mod pipeline;
pub mod request;
mod result;
mod steps;
mod types;

pub use events::{CompositeEventSink, Event, EventSink, NoOpEventSink, StderrEventSink, StdoutEventSink};
pub use http::{HttpClient, HttpError, HttpRequestParts, HttpResponseParts, ReqwestHttpClient};
pub use item::ItemRunner;
pub use pipeline::Executor;
pub use request::RequestError;
pub use result::{ExecutionError, ItemError, StepError, StepErrorKind};
pub use steps::execute_steps;
pub use types::{ExecutorConfig, ItemOutcome, RunOutcome, StepsOutcome};
