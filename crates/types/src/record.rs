use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One fetched entity instance, keyed by attribute name.
///
/// Attribute order follows the payload the record was built from. Records are
/// read-only once constructed; the engine only ever borrows them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    attributes: IndexMap<String, Value>,
}

impl Record {
    /// Build a record from `(attribute, value)` pairs.
    pub fn from_pairs<I, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Self {
            attributes: pairs.into_iter().map(|(name, value)| (name.into(), value)).collect(),
        }
    }

    /// Convert a JSON object into a record. Non-object payloads yield `None`.
    pub fn from_json(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self {
                attributes: map.into_iter().collect(),
            }),
            _ => None,
        }
    }

    /// Raw attribute lookup.
    pub fn get(&self, attribute: &str) -> Option<&Value> {
        self.attributes.get(attribute)
    }

    /// String form of an attribute, or `None` when the record does not carry it.
    pub fn text(&self, attribute: &str) -> Option<String> {
        self.get(attribute).map(scalar_text)
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    pub fn attribute_names(&self) -> impl Iterator<Item = &str> {
        self.attributes.keys().map(String::as_str)
    }
}

/// Render an attribute value the way it appears inside an option key or label.
///
/// Strings are used verbatim, numbers and booleans use their canonical JSON
/// text, and `null` collapses to an empty string. Arrays and objects are not
/// expected in option payloads; they render as compact JSON.
pub fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Number(number) => number.to_string(),
        Value::Bool(flag) => flag.to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
