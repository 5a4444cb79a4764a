//! # Picklist Engine
//!
//! Resolves dynamic drop-down options from fetched records and keeps a bound
//! field consistent with them.
//!
//! ## Key Features
//!
//! - **Field Templates**: Option keys and labels from plain attribute names or
//!   `${attribute}` interpolation
//! - **Query Materialization**: Positional `${1}`..`${5}` substitution with
//!   reference-aware parameters
//! - **Reconciliation**: First-match detection of the bound value, with a clear
//!   signal when its record is gone
//! - **Value Codec**: Scalar and reference bindings written back from the
//!   user's selection
//!
//! ## Usage
//!
//! ```rust
//! use picklist_engine::reconcile::reconcile;
//! use picklist_engine::templates::FieldTemplate;
//! use picklist_types::{BoundValue, Record};
//! use serde_json::json;
//!
//! let records = vec![
//!     Record::from_json(json!({"id": "1", "name": "A"})).unwrap(),
//!     Record::from_json(json!({"id": "2", "name": "B"})).unwrap(),
//! ];
//! let key = FieldTemplate::parse("id");
//! let text = FieldTemplate::parse("${name} (#${id})");
//!
//! let result = reconcile(&BoundValue::Scalar(json!("2")), &records, Some(&key), Some(&text))?;
//! assert_eq!(result.selected_key.as_deref(), Some("2"));
//! assert_eq!(result.options[1].text, "B (#2)");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! - **`templates`**: Field template parsing and resolution
//! - **`query`**: Positional query materialization
//! - **`mapping`**: Records to option entries
//! - **`codec`**: Bound value <-> option key conversion
//! - **`reconcile`**: Selection reconciliation state machine
//! - **`session`**: Host adapter (cycles, side effects, render state)
//! - **`provider`**: Record fetch collaborators
//! - **`config`**: Control configuration documents

pub mod codec;
pub mod config;
pub mod error;
pub mod mapping;
pub mod provider;
pub mod query;
pub mod reconcile;
pub mod session;
pub mod templates;

pub use codec::{current_key, decode_event, decode_selection};
pub use config::{ControlConfig, ControlDocument, parse_control_file};
pub use error::{ConfigurationError, EngineError, FetchError};
pub use mapping::{OptionMapper, map_records};
pub use provider::{RecordFetcher, StaticFetcher, WebApiFetcher, records_from_json};
pub use query::{EMPTY_REFERENCE_ID, QueryTemplate, build_query};
pub use reconcile::{CycleState, SelectionReconciler, reconcile};
pub use session::{CompletedCycle, ControlSession, HostBinding, PendingCycle, ViewInput};
pub use templates::FieldTemplate;
