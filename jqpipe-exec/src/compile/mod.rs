use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use jqpipe_core::{Pipeline, PipelineDocument, StepLocation, Vars};
use serde_json::Value;

use crate::filter::{CompileError, FilterProgram};

/// A pipeline together with every filter it references, compiled up front.
///
/// Immutable once built; concurrent runs share it read-only.
#[derive(Debug)]
pub struct CompiledSpec {
    location: String,
    pipeline: Pipeline,
    var_names: Vec<String>,
    filters: HashMap<String, Arc<FilterProgram>>,
}

#[derive(Debug, thiserror::Error)]
#[error("{location}: {source}")]
pub struct PrepareError {
    pub location: StepLocation,
    #[source]
    pub source: CompileError,
}

/// Variable values for one run, laid out in the spec's declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundVars {
    bound: Vec<Value>,
    unbound: Vec<Value>,
}

impl BoundVars {
    pub fn values(&self, bind: bool) -> &[Value] {
        if bind {
            &self.bound
        } else {
            &self.unbound
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Compiler {
    var_names: BTreeSet<String>,
}

impl Compiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares the external variables filters may reference as `$name`.
    pub fn with_vars<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.var_names.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn compile_document(
        &self,
        location: impl Into<String>,
        doc: &PipelineDocument,
    ) -> Result<CompiledSpec, PrepareError> {
        self.compile(location, Pipeline::from_document(doc))
    }

    /// Compiles every distinct expression once; the first failure aborts preparation.
    pub fn compile(
        &self,
        location: impl Into<String>,
        pipeline: Pipeline,
    ) -> Result<CompiledSpec, PrepareError> {
        let var_names: Vec<String> = self.var_names.iter().cloned().collect();
        let mut filters = HashMap::<String, Arc<FilterProgram>>::new();

        for (loc, step) in pipeline.expressions() {
            let Some(expr) = step.expression() else {
                continue;
            };
            if filters.contains_key(expr) {
                continue;
            }
            let program = FilterProgram::compile(expr, &var_names).map_err(|source| PrepareError {
                location: loc,
                source,
            })?;
            filters.insert(expr.to_string(), Arc::new(program));
        }

        Ok(CompiledSpec {
            location: location.into(),
            pipeline,
            var_names,
            filters,
        })
    }
}

impl CompiledSpec {
    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub fn var_names(&self) -> &[String] {
        &self.var_names
    }

    pub fn filter(&self, expression: &str) -> Option<&Arc<FilterProgram>> {
        self.filters.get(expression)
    }

    pub fn filter_count(&self) -> usize {
        self.filters.len()
    }

    /// Lays out `vars` for this spec; names not supplied bind to `null`.
    pub fn bind(&self, vars: &Vars) -> BoundVars {
        let bound = self
            .var_names
            .iter()
            .map(|n| vars.get(n).map_or(Value::Null, |v| Value::String(v.clone())))
            .collect();
        BoundVars {
            bound,
            unbound: vec![Value::Null; self.var_names.len()],
        }
    }
}
