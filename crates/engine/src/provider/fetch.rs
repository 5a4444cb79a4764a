use async_trait::async_trait;
use indexmap::IndexMap;
use picklist_types::Record;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use serde_json::Value;
use tracing::{debug, info};
use url::Url;

use super::{RecordFetcher, records_from_json};
use crate::error::FetchError;

/// Web API version used when none is configured.
pub const DEFAULT_API_VERSION: &str = "v9.2";

/// Fetches records from an OData Web API (`{base}/api/data/{version}/{entity_set}{query}`).
///
/// Entity set names default to a pluralized entity type and can be mapped
/// explicitly for irregular names.
#[derive(Debug, Clone)]
pub struct WebApiFetcher {
    client: reqwest::Client,
    base_url: Url,
    api_version: String,
    bearer_token: Option<String>,
    entity_sets: IndexMap<String, String>,
}

impl WebApiFetcher {
    pub fn new(base_url: &str) -> Result<Self, FetchError> {
        let base_url = Url::parse(base_url).map_err(|error| FetchError::new(format!("invalid base URL '{base_url}': {error}")))?;
        Ok(Self {
            client: reqwest::Client::new(),
            base_url,
            api_version: DEFAULT_API_VERSION.to_string(),
            bearer_token: None,
            entity_sets: IndexMap::new(),
        })
    }

    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    pub fn with_entity_set(mut self, entity_type: impl Into<String>, entity_set: impl Into<String>) -> Self {
        self.entity_sets.insert(entity_type.into(), entity_set.into());
        self
    }

    /// Collection name addressed for `entity_type`.
    pub fn entity_set_for(&self, entity_type: &str) -> String {
        self.entity_sets
            .get(entity_type)
            .cloned()
            .unwrap_or_else(|| pluralize(entity_type))
    }

    /// Full request URL for a query. A leading `?` on the query is optional.
    pub fn request_url(&self, entity_type: &str, query: &str) -> Result<Url, FetchError> {
        let mut url = self.base_url.clone();
        let entity_set = self.entity_set_for(entity_type);
        url.path_segments_mut()
            .map_err(|_| FetchError::new(format!("base URL '{}' cannot carry a path", self.base_url)))?
            .pop_if_empty()
            .extend(["api", "data", self.api_version.as_str(), entity_set.as_str()]);

        let query = query.trim().trim_start_matches('?');
        url.set_query((!query.is_empty()).then_some(query));
        Ok(url)
    }

    fn default_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert("odata-maxversion", HeaderValue::from_static("4.0"));
        headers.insert("odata-version", HeaderValue::from_static("4.0"));
        headers.insert("prefer", HeaderValue::from_static("odata.include-annotations=\"*\""));
        headers
    }
}

#[async_trait]
impl RecordFetcher for WebApiFetcher {
    async fn fetch_records(&self, entity_type: &str, query: &str) -> Result<Vec<Record>, FetchError> {
        let url = self.request_url(entity_type, query)?;
        debug!(entity_type = %entity_type, url = %url, "record fetch started");

        let mut request = self.client.get(url).headers(Self::default_headers());
        if let Some(token) = &self.bearer_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|error| FetchError::new(format!("request failed: {error}")))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::new(error_message(&body, status.as_u16())).with_status(status.as_u16()));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|error| FetchError::new(format!("invalid response payload: {error}")))?;
        let records = records_from_json(payload)?;
        info!(entity_type = %entity_type, record_count = records.len(), "record fetch completed");
        Ok(records)
    }
}

/// Prefer the service's own message (`{"error": {"message": ...}}`) over the raw body.
fn error_message(body: &str, status: u16) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|payload| payload.pointer("/error/message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                format!("request failed with status {status}")
            } else {
                format!("request failed with status {status}: {}", body.trim())
            }
        })
}

fn pluralize(entity_type: &str) -> String {
    let lower = entity_type.to_ascii_lowercase();
    if let Some(stem) = lower.strip_suffix('y')
        && !stem.ends_with(|character: char| "aeiou".contains(character))
    {
        return format!("{stem}ies");
    }
    if lower.ends_with('s') || lower.ends_with('x') || lower.ends_with("ch") || lower.ends_with("sh") {
        return format!("{lower}es");
    }
    format!("{lower}s")
}
