//! REDCap Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared plumbing for the REDCap extraction tools.
//!
//! # Overview
//!
//! - **Error Handling**: [`CommonError`] and the [`Result`] alias
//! - **Logging**: `tracing` subscriber setup for console and rolling files
//! - **Credentials**: reader for the standard `.netrc` network-credentials file
//!
//! # Example
//!
//! ```no_run
//! use redcap_common::netrc::Netrc;
//!
//! fn ftp_login(host: &str) -> redcap_common::Result<Option<String>> {
//!     let netrc = Netrc::from_file(&Netrc::default_path()?)?;
//!     Ok(netrc.authenticators(host).map(|auth| auth.login.clone()))
//! }
//! ```

pub mod error;
pub mod logging;
pub mod netrc;

// Re-export commonly used types
pub use error::{CommonError, Result};
