//! Error types for the REDCap extractor
//!
//! Every variant aborts the run. Messages are written for the operator who
//! reads the cron mail, so they say what to check next.

use thiserror::Error;

/// Result type alias for extractor operations
pub type Result<T> = std::result::Result<T, ExtractError>;

/// Errors raised while extracting and uploading a REDCap export
#[derive(Error, Debug)]
pub enum ExtractError {
    /// Missing or unresolvable settings, detected before any network call
    #[error("Configuration error: {0}")]
    Config(String),

    /// Credentials file could not be located, read or parsed
    #[error("Credentials file error: {0}")]
    Credentials(#[from] redcap_common::CommonError),

    /// REDCap answered with a non-success status
    #[error("REDCap API returned {status}: {body}. Check the API token and the --redcap-url endpoint.")]
    ApiStatus {
        status: reqwest::StatusCode,
        body: String,
    },

    /// HTTP request failed before a status was received, or the body could not be read
    #[error("Request to REDCap failed: {0}. Check that the endpoint is reachable.")]
    Http(#[from] reqwest::Error),

    /// REDCap response did not have the expected shape
    #[error("Unexpected REDCap response: {0}")]
    Json(#[from] serde_json::Error),

    /// REDCap returned no records, so no field list can be derived
    #[error("REDCap returned no records; nothing to export")]
    EmptyExtract,

    /// CSV encoding failed
    #[error("Failed to write CSV: {0}")]
    Csv(#[from] csv::Error),

    /// FTP protocol failure (connect, login or store)
    #[error("FTP transfer failed: {0}. Check the FTP host, credentials and target folder.")]
    Ftp(#[from] suppaftp::FtpError),

    /// The blocking FTP task did not run to completion
    #[error("FTP upload task failed: {0}")]
    Transfer(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExtractError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
