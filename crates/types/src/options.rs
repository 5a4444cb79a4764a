use serde::{Deserialize, Serialize};

/// One selectable entry of the drop-down, derived from a fetched record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionEntry {
    pub key: String,
    pub text: String,
}

impl OptionEntry {
    pub fn new(key: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            text: text.into(),
        }
    }
}

/// Outcome of matching the bound value against a freshly fetched option list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconciliationResult {
    pub options: Vec<OptionEntry>,
    /// Key of the option that corresponds to the bound value, if any.
    pub selected_key: Option<String>,
    /// The bound value points at a record that is no longer in the result set
    /// and must be reset to empty by the caller.
    pub should_clear_bound_value: bool,
    /// Keys that appear on more than one option. Only the first occurrence can
    /// ever be selected.
    pub duplicate_keys: Vec<String>,
}

/// Read/edit permissions of the bound field for the current user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSecurity {
    pub editable: bool,
    pub readable: bool,
}

impl Default for FieldSecurity {
    fn default() -> Self {
        Self {
            editable: true,
            readable: true,
        }
    }
}

/// Everything the UI layer needs to draw the control for one cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RenderState {
    pub options: Vec<OptionEntry>,
    pub selected_key: Option<String>,
    pub disabled: bool,
    pub masked: bool,
    pub error_message: Option<String>,
}

/// Input reported by the UI layer when the user changes the selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionEvent {
    Selected { key: String, text: String },
    Cleared,
}

impl SelectionEvent {
    /// Interpret the UI's `(key, text)` pair; a missing key means the selection was cleared.
    pub fn from_pair(key: Option<String>, text: Option<String>) -> Self {
        match key {
            Some(key) => SelectionEvent::Selected {
                key,
                text: text.unwrap_or_default(),
            },
            None => SelectionEvent::Cleared,
        }
    }
}
