//! REDCap Extract Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Mirrors a REDCap project's survey records into the RADAR FTP data store.
//!
//! # Overview
//!
//! A run is a single linear pass, meant to be scheduled from cron:
//!
//! - **API**: export the data dictionary and all records (`api`)
//! - **Filtering**: drop identifier, blacklisted and optionally `notes`
//!   fields; keep fields the dictionary does not know (`filter`)
//! - **Export**: encode the kept columns as CSV (`export`)
//! - **Upload**: store the CSV under a timestamped name over FTP (`ftp`)
//! - **Pipeline**: ties the steps together (`pipeline`)

pub mod api;
pub mod config;
pub mod error;
pub mod export;
pub mod filter;
pub mod ftp;
pub mod pipeline;

// Re-export commonly used types
pub use config::ExtractConfig;
pub use error::{ExtractError, Result};
pub use pipeline::{ExtractSink, ExtractSummary};

use api::client::DEFAULT_REDCAP_URL;
use clap::Parser;
use ftp::{DEFAULT_FTP_HOST, DEFAULT_FTP_PORT};
use std::path::PathBuf;

/// Extract data from a RADAR REDCap server and upload it as CSV over FTP
#[derive(Parser)]
#[command(name = "redcap-extract")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// The name of the RADAR project. The FTP folder name
    pub project: String,

    /// The REDCap project API token
    pub token: String,

    /// The URL of the REDCap API endpoint
    #[arg(long, default_value = DEFAULT_REDCAP_URL)]
    pub redcap_url: String,

    /// The FTP host to upload to
    #[arg(long, default_value = DEFAULT_FTP_HOST)]
    pub ftp_ip: String,

    /// The FTP control port
    #[arg(long, default_value_t = DEFAULT_FTP_PORT)]
    pub ftp_port: u16,

    /// The FTP username. If not set, uses .netrc
    #[arg(long, default_value = "")]
    pub ftp_user: String,

    /// The FTP account password. Uses .netrc if --ftp-user is empty
    #[arg(long, default_value = "")]
    pub ftp_password: String,

    /// Credentials file to read when the FTP login is incomplete [default: ~/.netrc]
    #[arg(long, value_name = "PATH")]
    pub netrc: Option<PathBuf>,

    /// If present, "notes" fields will not be included
    #[arg(long)]
    pub exclude_notes: bool,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,
}
