use crate::types::PipelineDocument;
use crate::validate::rules::{item, step};
use crate::validate::validator::Validator;

pub(crate) fn validate_document(v: &mut Validator, doc: &PipelineDocument) {
    match doc {
        PipelineDocument::Pipeline(items) => {
            for (idx, it) in items.iter().enumerate() {
                item::validate_item(v, it, &format!("$[{idx}]"));
            }
        }
        PipelineDocument::Legacy(legacy) => {
            item::validate_url_template(v, "$.url", &legacy.url);
            step::validate_step_list(v, "$.request", &legacy.request);
            step::validate_step_list(v, "$.response", &legacy.response);
        }
    }
}
