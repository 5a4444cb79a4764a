//! Control configuration documents.
//!
//! A control document bundles the static control configuration with a
//! snapshot of the host state (parameters, bound value, security) so a cycle
//! can be reproduced outside the host:
//!
//! ```yaml
//! control:
//!   entity_type: contact
//!   query: "?$select=contactid,fullname&$filter=_parentcustomerid_value eq ${1}"
//!   key_field: contactid
//!   text_field: "${fullname} (${emailaddress1})"
//!   binding:
//!     mode: reference
//!     target_entity_type: contact
//! parameters:
//!   1: { reference: ["5f1c0d8e-7a1b-4c3d-9e2f-0a1b2c3d4e5f"] }
//! bound_value: empty
//! ```

use std::{fs, path::Path};

use anyhow::{Context, Result};
use picklist_types::{BindingMode, BoundValue, FieldSecurity, ParameterSet};
use serde::{Deserialize, Serialize};

use crate::session::ViewInput;

/// Static configuration of one control instance.
///
/// Missing or blank values are accepted here and reported per cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlConfig {
    #[serde(default)]
    pub entity_type: String,
    #[serde(default)]
    pub query: String,
    /// Template producing the option key (the stored value).
    #[serde(default, alias = "value_field")]
    pub key_field: Option<String>,
    /// Template producing the option label.
    #[serde(default)]
    pub text_field: Option<String>,
    #[serde(default)]
    pub binding: BindingMode,
}

/// Control configuration plus the host state of a single cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ControlDocument {
    pub control: ControlConfig,
    #[serde(default)]
    pub parameters: ParameterSet,
    #[serde(default)]
    pub bound_value: BoundValue,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub security: Option<FieldSecurity>,
}

impl ControlDocument {
    pub fn view_input(&self) -> ViewInput {
        ViewInput {
            parameters: self.parameters.clone(),
            control_disabled: self.disabled,
            security: self.security,
        }
    }
}

/// Loads a control document, choosing the parser by file extension.
///
/// `.json` files are parsed as JSON; everything else as YAML. YAML documents
/// write enum values as single-key maps (`{ scalar: 1 }`), the same shape JSON
/// uses, rather than `!tag` syntax.
pub fn parse_control_file(file_path: impl AsRef<Path>) -> Result<ControlDocument> {
    let file_path = file_path.as_ref();
    let content = fs::read_to_string(file_path).with_context(|| format!("Failed to read control file: {}", file_path.display()))?;

    let is_json = file_path
        .extension()
        .and_then(|extension| extension.to_str())
        .is_some_and(|extension| extension.eq_ignore_ascii_case("json"));

    if is_json {
        serde_json::from_str(&content).with_context(|| format!("Invalid JSON control document: {}", file_path.display()))
    } else {
        serde_yaml::with::singleton_map_recursive::deserialize(serde_yaml::Deserializer::from_str(&content))
            .with_context(|| format!("Invalid YAML control document: {}", file_path.display()))
    }
}
