//! Builds outbound requests from an item's URL template and the decoded
//! output of its request phase.

use jqpipe_core::RequestParams;

use crate::executor::http::HttpRequestParts;

pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("parse url `{url}`: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

/// Replaces every `$key` in `template` with its value.
///
/// Longer keys are substituted first so `$id` never clobbers part of `$idx`.
pub fn substitute_path(template: &str, path: &std::collections::BTreeMap<String, String>) -> String {
    let mut keys: Vec<(&String, &String)> = path.iter().collect();
    keys.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(b.0)));

    let mut out = template.to_string();
    for (k, v) in keys {
        out = out.replace(&format!("${k}"), v);
    }
    out
}

/// Method rule: explicit method, else POST when a body is present, else GET.
pub fn effective_method(params: &RequestParams) -> String {
    if !params.method.is_empty() {
        params.method.clone()
    } else if !params.body.is_empty() {
        "POST".to_string()
    } else {
        "GET".to_string()
    }
}

pub fn build_request(template: &str, params: &RequestParams) -> Result<HttpRequestParts, RequestError> {
    let resolved = substitute_path(template, &params.path);
    let mut url = parse_url(&resolved)?;

    // Additive merge: existing pairs are kept and repeated keys are not collapsed.
    if !params.query.is_empty() {
        let mut qp = url.query_pairs_mut();
        for (k, v) in &params.query {
            qp.append_pair(k, v);
        }
    }

    Ok(HttpRequestParts {
        method: effective_method(params),
        url,
        headers: params
            .headers
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
        body: params.body.clone().into_bytes(),
    })
}

/// Legacy items POST the request-phase output verbatim as a form body.
pub fn build_form_post(template: &str, body: Vec<u8>) -> Result<HttpRequestParts, RequestError> {
    Ok(HttpRequestParts {
        method: "POST".to_string(),
        url: parse_url(template)?,
        headers: vec![("Content-Type".to_string(), FORM_CONTENT_TYPE.to_string())],
        body,
    })
}

fn parse_url(raw: &str) -> Result<url::Url, RequestError> {
    url::Url::parse(raw).map_err(|source| RequestError::InvalidUrl {
        url: raw.to_string(),
        source,
    })
}
