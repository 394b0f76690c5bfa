use jqpipe_core::{Pipeline, Validate};
use jqpipe_exec::Compiler;
use serde::Serialize;

use crate::exit_codes;
use crate::output::{print_result, OutputFormat};
use crate::OutputArgs;

use super::config::load_document;

#[derive(Serialize)]
struct ValidateResult {
    valid: bool,
    format: String,
    legacy: bool,
    items: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    errors: Vec<String>,
}

pub async fn validate_cmd(location: &str, output: OutputArgs) -> i32 {
    let parsed = match load_document(location, &output).await {
        Ok(p) => p,
        Err(code) => return code,
    };

    // Filters only compile on a structurally valid document. Variables are
    // supplied at run time, so every referenced name is declared here.
    let errors: Vec<String> = match parsed.document.validate() {
        Ok(()) => {
            let pipeline = Pipeline::from_document(&parsed.document);
            let compiler = Compiler::new().with_vars(pipeline.variable_references());
            match compiler.compile(location, pipeline) {
                Ok(_) => vec![],
                Err(e) => vec![e.to_string()],
            }
        }
        Err(err) => err.violations.iter().map(ToString::to_string).collect(),
    };

    let result = ValidateResult {
        valid: errors.is_empty(),
        format: format!("{:?}", parsed.format),
        legacy: parsed.document.is_legacy(),
        items: parsed.document.item_count(),
        errors,
    };

    if output.format == OutputFormat::Text && !output.quiet {
        if result.valid {
            println!("ok: valid pipeline ({} items, {:?})", result.items, parsed.format);
        } else {
            eprintln!("error: validation failed");
            for e in &result.errors {
                eprintln!("- {e}");
            }
        }
    } else {
        print_result(output.format, output.quiet, &result);
    }

    if result.valid {
        exit_codes::SUCCESS
    } else {
        exit_codes::VALIDATION_FAILED
    }
}
