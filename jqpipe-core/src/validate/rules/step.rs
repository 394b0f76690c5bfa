use crate::types::StepDoc;
use crate::validate::validator::Validator;

pub(crate) fn validate_step_list(v: &mut Validator, path: &str, steps: &[StepDoc]) {
    for (idx, step) in steps.iter().enumerate() {
        validate_step(v, step, &format!("{path}[{idx}]"));
    }
}

fn validate_step(v: &mut Validator, step: &StepDoc, path: &str) {
    if let Some(ri) = &step.return_if {
        if ri.condition.trim().is_empty() {
            v.push(format!("{path}.returnIf.if"), "must not be empty");
        }
    }

    let has_filter = step.jq.as_deref().is_some_and(|s| !s.is_empty());
    if step.raw_output && !has_filter {
        v.push(format!("{path}.rawOutput"), "only applies to a step with a jq filter");
    }
    if step.bind_vars && !has_filter {
        v.push(format!("{path}.bindVars"), "only applies to a step with a jq filter");
    }
}
