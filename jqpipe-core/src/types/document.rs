use serde::de::{self, Deserializer};
use serde::Deserialize;
use serde_json::Value;

use crate::types::common::nullable;
use crate::types::{ItemDoc, StepDoc};

/// A parsed pipeline document.
///
/// The current format is a JSON array of items. The older single-item format is
/// an object whose request phase produces a form-encoded POST body.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(untagged)]
pub enum PipelineDocument {
    Pipeline(Vec<ItemDoc>),
    Legacy(LegacyDoc),
}

#[derive(Debug, Clone, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct LegacyDoc {
    #[serde(default, deserialize_with = "nullable")]
    pub url: String,

    #[serde(default, deserialize_with = "nullable")]
    pub request: Vec<StepDoc>,

    #[serde(default, deserialize_with = "nullable")]
    pub response: Vec<StepDoc>,
}

impl PipelineDocument {
    pub fn is_legacy(&self) -> bool {
        matches!(self, PipelineDocument::Legacy(_))
    }

    pub fn item_count(&self) -> usize {
        match self {
            PipelineDocument::Pipeline(items) => items.len(),
            PipelineDocument::Legacy(_) => 1,
        }
    }
}

impl<'de> Deserialize<'de> for PipelineDocument {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        match value {
            Value::Array(_) => serde_json::from_value::<Vec<ItemDoc>>(value)
                .map(PipelineDocument::Pipeline)
                .map_err(de::Error::custom),
            Value::Object(_) => serde_json::from_value::<LegacyDoc>(value)
                .map(PipelineDocument::Legacy)
                .map_err(de::Error::custom),
            other => Err(de::Error::custom(format!(
                "expected an array of pipeline items or a legacy item object, found {}",
                json_kind(&other)
            ))),
        }
    }
}

pub(crate) fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
