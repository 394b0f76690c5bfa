use crate::types::common::nullable;
use crate::types::StepDoc;

#[derive(Debug, Clone, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct ItemDoc {
    #[serde(default, deserialize_with = "nullable")]
    pub url: String,

    #[serde(default, deserialize_with = "nullable")]
    pub request: Vec<StepDoc>,

    #[serde(default, deserialize_with = "nullable")]
    pub response: Vec<StepDoc>,

    #[serde(default, deserialize_with = "nullable")]
    pub retry: Vec<StepDoc>,
}
