mod common;
mod document;
mod item;
mod params;
mod step;

pub use common::{nullable, AnyValue};
pub use document::{LegacyDoc, PipelineDocument};
pub use item::ItemDoc;
pub use params::{InitialParams, ParamsError, RequestParams, Vars};
pub use step::{ReturnIfDoc, StepDoc};
