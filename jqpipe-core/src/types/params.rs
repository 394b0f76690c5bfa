use std::collections::BTreeMap;

use serde_json::Value;

use crate::types::common::nullable;
use crate::types::document::json_kind;

/// Variables bound into filters as `$name`.
pub type Vars = BTreeMap<String, String>;

/// Shape of one outbound HTTP call, decoded from the output of an item's request phase.
///
/// `null` maps and strings decode as empty.
#[derive(Debug, Clone, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub struct RequestParams {
    #[serde(default, deserialize_with = "nullable")]
    pub path: BTreeMap<String, String>,

    #[serde(default, deserialize_with = "nullable")]
    pub query: BTreeMap<String, String>,

    #[serde(default, deserialize_with = "nullable")]
    pub body: String,

    #[serde(default, deserialize_with = "nullable")]
    pub headers: BTreeMap<String, String>,

    #[serde(default, deserialize_with = "nullable")]
    pub method: String,
}

const REQUEST_PARAM_KEYS: [&str; 5] = ["path", "query", "body", "headers", "method"];

/// Parameters supplied by the caller when a pipeline is executed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitialParams {
    /// Templated-path form; `query` entries double as filter variables.
    Request(RequestParams),
    /// Flat variable map used by legacy documents.
    Vars(Vars),
}

#[derive(Debug, thiserror::Error)]
pub enum ParamsError {
    #[error("initial parameters must be a JSON object, found {0}")]
    NotAnObject(&'static str),
    #[error("invalid request parameters: {0}")]
    Request(#[source] serde_json::Error),
    #[error("variable '{name}' must be a string, found {kind}")]
    NonStringVar { name: String, kind: &'static str },
}

impl Default for InitialParams {
    fn default() -> Self {
        InitialParams::Request(RequestParams::default())
    }
}

impl InitialParams {
    /// Picks the request form when every key is a `RequestParams` field, the flat form otherwise.
    pub fn from_value(value: Value) -> Result<Self, ParamsError> {
        let map = match value {
            Value::Object(map) => map,
            Value::Null => return Ok(Self::default()),
            other => return Err(ParamsError::NotAnObject(json_kind(&other))),
        };

        if map.keys().all(|k| REQUEST_PARAM_KEYS.contains(&k.as_str())) {
            return serde_json::from_value(Value::Object(map))
                .map(InitialParams::Request)
                .map_err(ParamsError::Request);
        }

        let mut vars = Vars::new();
        for (name, v) in map {
            match v {
                Value::String(s) => {
                    vars.insert(name, s);
                }
                other => {
                    return Err(ParamsError::NonStringVar {
                        name,
                        kind: json_kind(&other),
                    })
                }
            }
        }
        Ok(InitialParams::Vars(vars))
    }

    /// JSON encoding used as the first item's input payload.
    pub fn payload(&self) -> Result<Vec<u8>, serde_json::Error> {
        match self {
            InitialParams::Request(p) => serde_json::to_vec(p),
            InitialParams::Vars(v) => serde_json::to_vec(v),
        }
    }

    pub fn vars(&self) -> &Vars {
        match self {
            InitialParams::Request(p) => &p.query,
            InitialParams::Vars(v) => v,
        }
    }
}
