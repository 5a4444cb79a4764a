use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use indexmap::IndexMap;
use picklist_types::Record;

use super::RecordFetcher;
use crate::error::FetchError;

/// A fetch issued against a [`StaticFetcher`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub entity_type: String,
    pub query: String,
}

/// Serves fixed record sets keyed by entity type.
///
/// The query is not evaluated; every request for an entity type returns the
/// full set registered for it. Requests are recorded for inspection.
#[derive(Debug, Default)]
pub struct StaticFetcher {
    record_sets: IndexMap<String, Vec<Record>>,
    failure: Option<FetchError>,
    requests: Mutex<Vec<FetchRequest>>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(mut self, entity_type: impl Into<String>, records: Vec<Record>) -> Self {
        self.record_sets.insert(entity_type.into(), records);
        self
    }

    /// Reject every request with `error`.
    pub fn failing(error: FetchError) -> Self {
        Self {
            failure: Some(error),
            ..Self::default()
        }
    }

    /// Requests received so far, oldest first.
    pub fn requests(&self) -> Vec<FetchRequest> {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

#[async_trait]
impl RecordFetcher for StaticFetcher {
    async fn fetch_records(&self, entity_type: &str, query: &str) -> Result<Vec<Record>, FetchError> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(FetchRequest {
                entity_type: entity_type.to_string(),
                query: query.to_string(),
            });
        if let Some(error) = &self.failure {
            return Err(error.clone());
        }
        self.record_sets
            .get(entity_type)
            .cloned()
            .ok_or_else(|| FetchError::new(format!("entity type '{entity_type}' is not available")))
    }
}
