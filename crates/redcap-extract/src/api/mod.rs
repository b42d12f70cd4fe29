//! REDCap API module
//!
//! HTTP client for the REDCap export endpoints.

pub mod client;
pub mod types;

pub use client::RedcapClient;
pub use types::*;
