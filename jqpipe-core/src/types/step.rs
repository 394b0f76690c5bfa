use crate::types::common::{is_false, nullable, AnyValue};

/// One step object as written in a pipeline document.
///
/// Every field is optional; absent or empty fields are no-ops. When several
/// fields are set they run in the fixed order split, jq, returnIf.
#[derive(Debug, Clone, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct StepDoc {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub split: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jq: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[serde(rename = "returnIf")]
    pub return_if: Option<ReturnIfDoc>,

    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "is_false")]
    #[serde(rename = "rawOutput")]
    pub raw_output: bool,

    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "is_false")]
    #[serde(rename = "bindVars")]
    pub bind_vars: bool,
}

#[derive(Debug, Clone, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct ReturnIfDoc {
    #[serde(rename = "return", default)]
    pub value: AnyValue,

    #[serde(rename = "if", default, deserialize_with = "nullable")]
    pub condition: String,
}
