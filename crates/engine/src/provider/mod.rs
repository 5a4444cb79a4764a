//! Record fetch collaborators.
//!
//! Modules:
//! - `memory`: In-memory record sets for tests and file-backed runs
//! - `fetch`: Web API fetcher issuing OData queries over HTTP

mod fetch;
mod memory;

use async_trait::async_trait;
use picklist_types::Record;

pub use fetch::{DEFAULT_API_VERSION, WebApiFetcher};
pub use memory::{FetchRequest, StaticFetcher};

use crate::error::FetchError;

/// Source of records for a materialized query.
///
/// Implementations own transport concerns. The engine only consumes the
/// resolved or rejected outcome.
#[async_trait]
pub trait RecordFetcher: Send + Sync {
    async fn fetch_records(&self, entity_type: &str, query: &str) -> Result<Vec<Record>, FetchError>;
}

/// Convert a JSON payload into records.
///
/// Accepts a bare array of objects or an OData collection (`{"value": [...]}`).
/// Entries that are not objects are skipped.
pub fn records_from_json(payload: serde_json::Value) -> Result<Vec<Record>, FetchError> {
    let items = match payload {
        serde_json::Value::Array(items) => items,
        serde_json::Value::Object(mut map) => match map.remove("value") {
            Some(serde_json::Value::Array(items)) => items,
            _ => return Err(FetchError::new("response does not contain a 'value' array")),
        },
        _ => return Err(FetchError::new("expected an array of records")),
    };
    let total = items.len();
    let records: Vec<Record> = items.into_iter().filter_map(Record::from_json).collect();
    if records.len() != total {
        tracing::warn!(skipped = total - records.len(), "ignored non-object entries in record payload");
    }
    Ok(records)
}
