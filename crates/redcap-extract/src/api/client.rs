//! HTTP client for the REDCap API
//!
//! REDCap exposes a single endpoint; the form field `content` selects what is
//! exported. Both exports used here come back as JSON arrays.

use crate::api::types::{ExportRequest, MetadataEntry, Record};
use crate::error::{ExtractError, Result};
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

/// Default REDCap API endpoint when `--redcap-url` is not given
pub const DEFAULT_REDCAP_URL: &str = "https://127.0.0.1/redcap/api/";

/// Client for one REDCap API endpoint
pub struct RedcapClient {
    client: Client,
    api_url: String,
}

impl RedcapClient {
    /// Create a client for `api_url`
    ///
    /// No request timeout is set; a stalled server blocks the run.
    pub fn new(api_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            api_url: api_url.into(),
        })
    }

    /// Endpoint this client posts to
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Export the project's data dictionary
    pub async fn get_metadata(&self, token: &str) -> Result<Vec<MetadataEntry>> {
        let entries: Vec<MetadataEntry> = self.call_api(&ExportRequest::metadata(token)).await?;
        info!(fields = entries.len(), "Fetched REDCap metadata");
        Ok(entries)
    }

    /// Export all records with survey fields
    pub async fn get_extract(&self, token: &str) -> Result<Vec<Record>> {
        let records: Vec<Record> = self.call_api(&ExportRequest::records(token)).await?;
        info!(records = records.len(), "Fetched REDCap records");
        Ok(records)
    }

    async fn call_api<T: DeserializeOwned>(&self, request: &ExportRequest<'_>) -> Result<T> {
        debug!(url = %self.api_url, content = ?request.content, "POST REDCap export");

        let response = self.client.post(&self.api_url).form(request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ExtractError::ApiStatus {
                status,
                body: body.trim().to_string(),
            });
        }

        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}
