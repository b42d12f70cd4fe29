//! End-to-end extraction run
//!
//! One strictly linear pass: dictionary, records, field selection, CSV,
//! upload. Any failure aborts the run before the next step, so nothing is
//! uploaded unless it was fetched and filtered in full.

use crate::api::RedcapClient;
use crate::config::ExtractConfig;
use crate::error::{ExtractError, Result};
use crate::export::records_to_csv;
use crate::filter::select_fields;
use crate::ftp::upload_name;
use async_trait::async_trait;
use chrono::Local;
use tracing::{info, instrument};

/// Destination for a finished CSV extract
#[async_trait]
pub trait ExtractSink: Send + Sync {
    /// Store `data` under `name` for `project`
    async fn deliver(&self, project: &str, name: &str, data: Vec<u8>) -> Result<()>;

    /// Human-readable destination, for logs
    fn describe(&self) -> String;
}

/// Outcome of a successful run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractSummary {
    /// File name given to the sink
    pub name: String,
    /// Exported columns, in order
    pub fields: Vec<String>,
    pub records: usize,
    pub bytes: usize,
}

/// Fetch, filter, encode and deliver one project's records
#[instrument(skip_all, fields(project = %config.project))]
pub async fn run<S>(config: &ExtractConfig, client: &RedcapClient, sink: &S) -> Result<ExtractSummary>
where
    S: ExtractSink + ?Sized,
{
    info!(url = %client.api_url(), "Starting REDCap extract");

    let metadata = client.get_metadata(&config.token).await?;
    let records = client.get_extract(&config.token).await?;

    let first = records.first().ok_or(ExtractError::EmptyExtract)?;
    let fields = select_fields(first, &metadata, config.exclude_notes);
    info!(
        kept = fields.len(),
        dropped = first.len() - fields.len(),
        exclude_notes = config.exclude_notes,
        "Selected export fields"
    );

    let data = records_to_csv(&records, Some(&fields))?;
    let bytes = data.len();

    let name = upload_name(&config.project, &Local::now());
    info!(name = %name, destination = %sink.describe(), bytes, "Delivering extract");
    sink.deliver(&config.project, &name, data).await?;

    Ok(ExtractSummary {
        name,
        fields,
        records: records.len(),
        bytes,
    })
}
