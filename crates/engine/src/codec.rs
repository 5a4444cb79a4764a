//! Conversion between the bound field's native value and UI option keys.

use picklist_types::{BindingMode, BoundValue, EntityReference, OptionEntry, SelectionEvent, scalar_text};
use serde_json::Value;

/// Turn a chosen option into the value written back to the bound field.
pub fn decode_selection(entry: &OptionEntry, mode: &BindingMode) -> BoundValue {
    match mode {
        BindingMode::Scalar => BoundValue::Scalar(Value::String(entry.key.clone())),
        BindingMode::Reference { target_entity_type } => BoundValue::Reference(EntityReference {
            id: entry.key.clone(),
            name: Some(entry.text.clone()),
            entity_type: target_entity_type.clone(),
        }),
    }
}

/// Decode a UI event. Clearing the selection empties the field in either mode.
pub fn decode_event(event: &SelectionEvent, mode: &BindingMode) -> BoundValue {
    match event {
        SelectionEvent::Selected { key, text } => decode_selection(&OptionEntry::new(key.as_str(), text.as_str()), mode),
        SelectionEvent::Cleared => BoundValue::Empty,
    }
}

/// Option key the bound value corresponds to, or `None` when nothing is bound.
///
/// A `null` scalar counts as nothing bound.
pub fn current_key(bound: &BoundValue) -> Option<String> {
    match bound {
        BoundValue::Scalar(Value::Null) => None,
        BoundValue::Scalar(value) => Some(scalar_text(value)),
        BoundValue::Reference(reference) => Some(reference.id.clone()),
        BoundValue::Empty => None,
    }
}
