#![forbid(unsafe_code)]

//! Runtime engine for jq-driven HTTP pipelines.
//!
//! Document parsing and validation live in `jqpipe-core`.

pub mod compile;
pub mod engine;
pub mod executor;
pub mod filter;
pub mod loader;

pub use crate::compile::{BoundVars, CompiledSpec, Compiler, PrepareError};
pub use crate::engine::{Engine, EngineError};
pub use crate::executor::Executor;
pub use crate::filter::{parse_bool, CompileError, FilterProgram, FilterRuntimeError};
pub use crate::loader::{load_spec, FetchError};
