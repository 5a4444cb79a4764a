//! Shared data model for the picklist engine.
//!
//! Everything in this crate is plain data: records delivered by a fetch,
//! query parameters supplied by the host, the value bound to the control's
//! field, and the option/render structures handed to the UI layer.

mod binding;
mod options;
mod parameter;
mod record;

pub use binding::{BindingMode, BoundValue, EntityReference};
pub use options::{FieldSecurity, OptionEntry, ReconciliationResult, RenderState, SelectionEvent};
pub use parameter::{MAX_PARAMETERS, Parameter, ParameterIndexError, ParameterSet};
pub use record::{Record, scalar_text};
