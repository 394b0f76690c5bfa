use crate::types::ItemDoc;
use crate::validate::rules::step::validate_step_list;
use crate::validate::validator::{Validator, PLACEHOLDER_RE};

pub(crate) fn validate_item(v: &mut Validator, item: &ItemDoc, path: &str) {
    validate_url_template(v, &format!("{path}.url"), &item.url);
    validate_step_list(v, &format!("{path}.request"), &item.request);
    validate_step_list(v, &format!("{path}.response"), &item.response);
    validate_step_list(v, &format!("{path}.retry"), &item.retry);
}

pub(crate) fn validate_url_template(v: &mut Validator, path: &str, template: &str) {
    let template = template.trim();
    if template.is_empty() {
        v.push(path, "must not be empty");
        return;
    }

    // A leading placeholder may expand to a whole base URL; nothing to check statically.
    if template.starts_with('$') {
        return;
    }

    let stubbed = PLACEHOLDER_RE.replace_all(template, "x");
    match url::Url::parse(&stubbed) {
        Ok(u) if u.cannot_be_a_base() => {
            v.push(path, "must be an absolute URL with an authority (e.g. https://host/path)");
        }
        Ok(_) => {}
        Err(e) => v.push(path, format!("invalid URL template: {e}")),
    }
}
