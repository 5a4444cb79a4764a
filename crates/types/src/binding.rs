use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Pointer to another entity, as stored in a lookup field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityReference {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub entity_type: String,
}

/// Value currently held by the control's bound field.
///
/// The variant in use is fixed by the field's declared type; only the payload
/// changes over the lifetime of a binding.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundValue {
    Scalar(Value),
    Reference(EntityReference),
    #[default]
    Empty,
}

impl BoundValue {
    /// `Empty`, or a scalar holding `null`.
    pub fn is_empty(&self) -> bool {
        matches!(self, BoundValue::Empty | BoundValue::Scalar(Value::Null))
    }
}

/// How a selected option is written back to the bound field.
///
/// Chosen once from the field's declared type when the control is configured.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum BindingMode {
    /// The option key is stored directly.
    #[default]
    Scalar,
    /// The option becomes a reference to a record of `target_entity_type`.
    Reference { target_entity_type: String },
}
