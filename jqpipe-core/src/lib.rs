#![forbid(unsafe_code)]

pub mod error;
pub mod model;
pub mod parser;
pub mod types;
pub mod validate;

pub use crate::error::{JqpipeError, ParseError, ValidationError, Violation};
pub use crate::model::{
    FilterStep, Item, Phase, Pipeline, RequestMode, ReturnIfStep, Step, StepLocation,
};
pub use crate::parser::{parse_document_bytes, parse_document_str, DocumentFormat, ParsedDocument};
pub use crate::types::{InitialParams, ParamsError, PipelineDocument, RequestParams, Vars};
pub use crate::validate::{validate_document, Validate};
