//! REDCap Extract - Main entry point

use clap::Parser;
use redcap_common::logging::{init_logging, LogConfig, LogLevel};
use redcap_extract::api::RedcapClient;
use redcap_extract::ftp::FtpUploader;
use redcap_extract::{pipeline, Cli, ExtractConfig};
use std::process;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let base = LogConfig::builder()
        .level(if cli.verbose { LogLevel::Debug } else { LogLevel::Info })
        .log_file_prefix("redcap-extract")
        .build();

    // Environment variables take precedence over the flags; bad values are ignored
    let log_config = LogConfig::from_env_or(base);
    let log_guard = match init_logging(&log_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Warning: logging disabled: {:#}", e);
            None
        },
    };

    let outcome = run(&cli).await;
    if let Err(ref e) = outcome {
        error!(error = %e, "Extract failed");
    }

    // Flush file logs before exiting
    drop(log_guard);

    if let Err(e) = outcome {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn run(cli: &Cli) -> redcap_extract::Result<()> {
    let config = ExtractConfig::from_cli(cli)?;
    let client = RedcapClient::new(config.redcap_url.clone())?;
    let uploader = FtpUploader::new(config.ftp.clone());

    let summary = pipeline::run(&config, &client, &uploader).await?;

    info!(
        name = %summary.name,
        records = summary.records,
        fields = summary.fields.len(),
        bytes = summary.bytes,
        "Extract complete"
    );
    Ok(())
}
