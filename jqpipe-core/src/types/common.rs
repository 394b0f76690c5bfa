use serde::{Deserialize, Deserializer};

pub type AnyValue = serde_json::Value;

/// Deserializes `null` (or a missing field, together with `#[serde(default)]`) as `T::default()`.
pub fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

pub(crate) fn is_false(v: &bool) -> bool {
    !*v
}
