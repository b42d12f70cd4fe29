//! Upload of extracts to the RADAR FTP data store
//!
//! Each run stores one file at
//! `/RADAR-CNS/REDCAP/<project>/REDCAP_<project>_<YYYYMMDD_HHMM>.csv`.
//! There is a single STOR per run and no retry; a failed transfer may leave a
//! partial file on the server.
//!
//! # Examples
//!
//! ```rust,ignore
//! use redcap_extract::ftp::{FtpConfig, FtpUploader};
//!
//! let uploader = FtpUploader::new(FtpConfig {
//!     host: "10.0.0.5".to_string(),
//!     port: 21,
//!     username: "radar".to_string(),
//!     password: "secret".to_string(),
//! });
//! let written = uploader.upload(csv_bytes, "RADAR", "REDCAP_RADAR_20230501_1432.csv").await?;
//! ```

use crate::error::{ExtractError, Result};
use crate::pipeline::ExtractSink;
use async_trait::async_trait;
use chrono::{DateTime, TimeZone};
use std::fmt::Display;
use std::io::Cursor;
use suppaftp::types::FileType;
use suppaftp::{FtpStream, Mode};
use tracing::{debug, info, warn};

/// Folder holding one sub-folder per project
pub const REMOTE_ROOT: &str = "/RADAR-CNS/REDCAP";

/// Default FTP host when `--ftp-ip` is not given
pub const DEFAULT_FTP_HOST: &str = "127.0.0.1";

/// Standard FTP control port
pub const DEFAULT_FTP_PORT: u16 = 21;

/// FTP connection settings
#[derive(Clone)]
pub struct FtpConfig {
    pub host: String,
    pub port: u16,
    /// Empty together with `password` for an anonymous session
    pub username: String,
    pub password: String,
}

impl FtpConfig {
    /// Whether the session logs in; it does only when both parts are set
    pub fn authenticates(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty()
    }
}

impl Default for FtpConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_FTP_HOST.to_string(),
            port: DEFAULT_FTP_PORT,
            username: String::new(),
            password: String::new(),
        }
    }
}

impl std::fmt::Debug for FtpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Name of the uploaded file for `project`, stamped to the minute
pub fn upload_name<Tz>(project: &str, at: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    format!("REDCAP_{}_{}.csv", project, at.format("%Y%m%d_%H%M"))
}

/// Absolute path of `name` inside the project's folder
pub fn remote_path(project: &str, name: &str) -> String {
    format!("{}/{}/{}", REMOTE_ROOT, project, name)
}

/// Stores extracts on an FTP server
pub struct FtpUploader {
    config: FtpConfig,
}

impl FtpUploader {
    pub fn new(config: FtpConfig) -> Self {
        Self { config }
    }

    /// Store `data` as `name` in the project's folder; returns bytes written
    pub async fn upload(&self, data: Vec<u8>, project: &str, name: &str) -> Result<u64> {
        let config = self.config.clone();
        let path = remote_path(project, name);

        let written = tokio::task::spawn_blocking({
            let path = path.clone();
            move || Self::upload_sync(&config, &data, &path)
        })
        .await
        .map_err(|e| ExtractError::Transfer(e.to_string()))??;

        info!(host = %self.config.host, path = %path, bytes = written, "Uploaded extract");
        Ok(written)
    }

    fn upload_sync(config: &FtpConfig, data: &[u8], path: &str) -> Result<u64> {
        debug!("Connecting to FTP server: {}:{}", config.host, config.port);
        let mut stream = FtpStream::connect((config.host.as_str(), config.port))?;
        stream.set_mode(Mode::Passive);
        // The PASV reply may carry a private address; connect to the control peer instead
        stream.set_passive_nat_workaround(true);

        let result = Self::store(&mut stream, config, data, path);

        // Close whether or not the store went through
        if let Err(e) = stream.quit() {
            warn!("Failed to quit FTP session gracefully: {}", e);
        }

        result
    }

    fn store(stream: &mut FtpStream, config: &FtpConfig, data: &[u8], path: &str) -> Result<u64> {
        if config.authenticates() {
            debug!("Logging in as: {}", config.username);
            stream.login(config.username.as_str(), config.password.as_str())?;
        } else {
            debug!("No FTP credentials; relying on the server's anonymous default");
        }

        stream.transfer_type(FileType::Binary)?;

        debug!("Storing {} bytes at {}", data.len(), path);
        let mut reader = Cursor::new(data);
        Ok(stream.put_file(path, &mut reader)?)
    }
}

#[async_trait]
impl ExtractSink for FtpUploader {
    async fn deliver(&self, project: &str, name: &str, data: Vec<u8>) -> Result<()> {
        self.upload(data, project, name).await.map(|_| ())
    }

    fn describe(&self) -> String {
        format!("ftp://{}:{}{}", self.config.host, self.config.port, REMOTE_ROOT)
    }
}
