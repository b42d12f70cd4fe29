//! Run configuration for the extractor
//!
//! Built once from the command line. FTP credentials given on the command
//! line win only when both user and password are present; otherwise both
//! come from the `.netrc` entry for the FTP host.

use crate::error::{ExtractError, Result};
use crate::ftp::FtpConfig;
use crate::Cli;
use redcap_common::netrc::Netrc;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Everything a run needs, resolved
#[derive(Clone)]
pub struct ExtractConfig {
    /// RADAR project name; also the FTP folder name
    pub project: String,

    /// REDCap project API token
    pub token: String,

    /// REDCap API endpoint
    pub redcap_url: String,

    /// Drop `notes` fields from the export
    pub exclude_notes: bool,

    pub ftp: FtpConfig,
}

impl ExtractConfig {
    /// Resolve the configuration from parsed arguments
    ///
    /// Reads the credentials file when the FTP login is incomplete, so this
    /// fails before any network call if no entry matches.
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let (username, password) = resolve_ftp_credentials(
            &cli.ftp_ip,
            &cli.ftp_user,
            &cli.ftp_password,
            cli.netrc.as_deref(),
        )?;

        Ok(Self {
            project: cli.project.clone(),
            token: cli.token.clone(),
            redcap_url: cli.redcap_url.clone(),
            exclude_notes: cli.exclude_notes,
            ftp: FtpConfig {
                host: cli.ftp_ip.clone(),
                port: cli.ftp_port,
                username,
                password,
            },
        })
    }
}

impl std::fmt::Debug for ExtractConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtractConfig")
            .field("project", &self.project)
            .field("token", &"<redacted>")
            .field("redcap_url", &self.redcap_url)
            .field("exclude_notes", &self.exclude_notes)
            .field("ftp", &self.ftp)
            .finish()
    }
}

/// FTP `(user, password)` for `host`
///
/// Returns the given pair when both are non-empty. Otherwise both are taken
/// from the credentials file at `netrc_path` (default `~/.netrc`), falling
/// back to its `default` entry.
pub fn resolve_ftp_credentials(
    host: &str,
    user: &str,
    password: &str,
    netrc_path: Option<&Path>,
) -> Result<(String, String)> {
    if !user.is_empty() && !password.is_empty() {
        return Ok((user.to_string(), password.to_string()));
    }

    let path: PathBuf = match netrc_path {
        Some(path) => path.to_path_buf(),
        None => Netrc::default_path()?,
    };
    debug!(host, path = %path.display(), "Looking up FTP credentials");

    let netrc = Netrc::from_file(&path)?;
    let auth = netrc.authenticators(host).ok_or_else(|| {
        ExtractError::config(format!(
            "no FTP credentials for '{}': pass --ftp-user and --ftp-password or add a 'machine {}' entry to {}",
            host,
            host,
            path.display()
        ))
    })?;

    Ok((auth.login.clone(), auth.password.clone()))
}
