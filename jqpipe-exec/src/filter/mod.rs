//! JQ filter programs backed by `jaq`.
//!
//! A program is compiled once with the names of the external variables it may
//! reference; values for those variables are supplied on every run.

use std::fmt;

use jaq_core::load::{Arena, File, Loader};
use jaq_core::{Compiler, Ctx, FilterT, Native, RcIter};
use jaq_json::Val;
use serde_json::Value;

#[derive(Debug, Clone, thiserror::Error)]
#[error("failed to compile filter `{expression}`: {message}")]
pub struct CompileError {
    pub expression: String,
    pub message: String,
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct FilterRuntimeError(pub String);

pub struct FilterProgram {
    source: String,
    var_count: usize,
    filter: jaq_core::Filter<Native<Val>>,
}

impl fmt::Debug for FilterProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterProgram")
            .field("source", &self.source)
            .field("var_count", &self.var_count)
            .finish_non_exhaustive()
    }
}

impl FilterProgram {
    /// Compiles `source`, declaring `$name` for every entry of `var_names`.
    pub fn compile(source: &str, var_names: &[String]) -> Result<Self, CompileError> {
        let globals: Vec<String> = var_names.iter().map(|n| format!("${n}")).collect();

        let arena = Arena::default();
        let loader = Loader::new(jaq_std::defs().chain(jaq_json::defs()));
        let modules = loader
            .load(&arena, File { code: source, path: () })
            .map_err(|errs| CompileError {
                expression: source.to_string(),
                message: format!("parse: {errs:?}"),
            })?;

        let filter = Compiler::default()
            .with_funs(jaq_std::funs().chain(jaq_json::funs()))
            .with_global_vars(globals.iter().map(|g| g.as_str()))
            .compile(modules)
            .map_err(|errs| CompileError {
                expression: source.to_string(),
                message: format!("undefined: {errs:?}"),
            })?;

        Ok(Self {
            source: source.to_string(),
            var_count: globals.len(),
            filter,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Runs the program and returns only its first result.
    ///
    /// `vars` must hold one value per declared variable, in declaration order.
    /// A program that yields nothing produces `null`.
    pub fn run_first(&self, input: Value, vars: &[Value]) -> Result<Value, FilterRuntimeError> {
        if vars.len() != self.var_count {
            return Err(FilterRuntimeError(format!(
                "expected {} variable values, got {}",
                self.var_count,
                vars.len()
            )));
        }

        let inputs = RcIter::new(core::iter::empty());
        let ctx = Ctx::new(vars.iter().cloned().map(Val::from), &inputs);
        let mut out = self.filter.run((ctx, Val::from(input)));
        match out.next() {
            None => Ok(Value::Null),
            Some(Ok(v)) => Ok(Value::from(v)),
            Some(Err(e)) => Err(FilterRuntimeError(e.to_string())),
        }
    }
}

/// Parses a payload as a boolean using the textual forms
/// `1 t T TRUE true True` and `0 f F FALSE false False`.
pub fn parse_bool(payload: &[u8]) -> Option<bool> {
    match payload {
        b"1" | b"t" | b"T" | b"TRUE" | b"true" | b"True" => Some(true),
        b"0" | b"f" | b"F" | b"FALSE" | b"false" | b"False" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn first_result_only() {
        let p = FilterProgram::compile(".[]", &[]).unwrap();
        assert_eq!(p.run_first(json!([1, 2, 3]), &[]).unwrap(), json!(1));
    }

    #[test]
    fn no_result_is_null() {
        let p = FilterProgram::compile("empty", &[]).unwrap();
        assert_eq!(p.run_first(json!({"a": 1}), &[]).unwrap(), json!(null));
    }

    #[test]
    fn declared_variables_are_bound_in_order() {
        let names = vec!["a".to_string(), "b".to_string()];
        let p = FilterProgram::compile("[$a, $b]", &names).unwrap();
        let out = p.run_first(json!(null), &[json!("x"), json!(null)]).unwrap();
        assert_eq!(out, json!(["x", null]));
    }

    #[test]
    fn undeclared_variable_fails_to_compile() {
        let err = FilterProgram::compile("$missing", &[]).unwrap_err();
        assert_eq!(err.expression, "$missing");
    }

    #[test]
    fn malformed_syntax_fails_to_compile() {
        assert!(FilterProgram::compile(".a | | .b", &[]).is_err());
    }

    #[test]
    fn error_value_is_runtime_error() {
        let p = FilterProgram::compile("error(\"boom\")", &[]).unwrap();
        assert!(p.run_first(json!(null), &[]).is_err());
    }

    #[test]
    fn bool_forms() {
        assert_eq!(parse_bool(b"true"), Some(true));
        assert_eq!(parse_bool(b"1"), Some(true));
        assert_eq!(parse_bool(b"False"), Some(false));
        assert_eq!(parse_bool(b"null"), None);
        assert_eq!(parse_bool(b"\"true\""), None);
    }
}
