use jqpipe_core::{Phase, Pipeline, RequestMode, Step};
use serde::Serialize;

use crate::exit_codes;
use crate::output::{print_result, OutputFormat};
use crate::OutputArgs;

use super::config::load_document;

#[derive(Serialize)]
struct StepInfo {
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    expression: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    delimiter: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    raw_output: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    bind_vars: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    returns: Option<serde_json::Value>,
}

#[derive(Serialize)]
struct ItemInfo {
    url: String,
    mode: &'static str,
    request: Vec<StepInfo>,
    response: Vec<StepInfo>,
    retry: Vec<StepInfo>,
}

#[derive(Serialize)]
struct InspectResult {
    location: String,
    legacy: bool,
    items: Vec<ItemInfo>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    variables: Vec<String>,
}

fn step_info(step: &Step) -> StepInfo {
    let mut info = StepInfo {
        kind: step.kind(),
        expression: step.expression().map(String::from),
        delimiter: None,
        raw_output: false,
        bind_vars: false,
        returns: None,
    };
    match step {
        Step::Split { delimiter } => info.delimiter = Some(delimiter.clone()),
        Step::Filter(f) => {
            info.raw_output = f.raw_output;
            info.bind_vars = f.bind_vars;
        }
        Step::ReturnIf(r) => info.returns = Some(r.value.clone()),
    }
    info
}

pub async fn inspect_cmd(location: &str, output: OutputArgs) -> i32 {
    let parsed = match load_document(location, &output).await {
        Ok(p) => p,
        Err(code) => return code,
    };

    let pipeline = Pipeline::from_document(&parsed.document);
    let items: Vec<ItemInfo> = pipeline
        .items
        .iter()
        .map(|item| ItemInfo {
            url: item.url_template.clone(),
            mode: match item.mode {
                RequestMode::Templated => "templated",
                RequestMode::FormPost => "form-post",
            },
            request: item.steps(Phase::Request).iter().map(step_info).collect(),
            response: item.steps(Phase::Response).iter().map(step_info).collect(),
            retry: item.steps(Phase::Retry).iter().map(step_info).collect(),
        })
        .collect();

    let result = InspectResult {
        location: location.to_string(),
        legacy: parsed.document.is_legacy(),
        items,
        variables: pipeline.variable_references().into_iter().collect(),
    };

    if output.format == OutputFormat::Text && !output.quiet {
        println!("Pipeline: {}", result.location);
        if result.legacy {
            println!("(legacy single-item document)");
        }
        for (i, item) in result.items.iter().enumerate() {
            println!("\nItem {i}: {} [{}]", item.url, item.mode);
            for (name, steps) in [
                ("request", &item.request),
                ("response", &item.response),
                ("retry", &item.retry),
            ] {
                if steps.is_empty() {
                    continue;
                }
                println!("  {name}:");
                for s in steps {
                    let detail = s
                        .expression
                        .as_deref()
                        .or(s.delimiter.as_deref())
                        .unwrap_or("");
                    println!("    - {} {detail}", s.kind);
                }
            }
        }
        if !result.variables.is_empty() {
            println!("\nVariables: {}", result.variables.join(", "));
        }
    } else {
        print_result(output.format, output.quiet, &result);
    }

    exit_codes::SUCCESS
}
