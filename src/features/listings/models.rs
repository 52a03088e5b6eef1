use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// A listing as the search backend returns it.
///
/// Only `id` is read by the search core, for stable list keys. Every other
/// field is carried through untouched for the rendering layer.
#[derive(Deserialize, Serialize, Clone, PartialEq, Debug)]
pub struct ListingSummary {
    #[serde(alias = "_id", deserialize_with = "deserialize_id_from_any")]
    pub id: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl ListingSummary {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: Map::new(),
        }
    }

    pub fn title(&self) -> Option<&str> {
        self.fields.get("title").and_then(Value::as_str)
    }
}

fn deserialize_id_from_any<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(id) => Ok(id),
        Value::Number(id) => Ok(id.to_string()),
        _ => Err(serde::de::Error::custom("expected a string or numeric id")),
    }
}
