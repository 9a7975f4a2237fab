//! Command-line interface for ocistore
//!
//! Thin wrappers over `ObjectStorageClient` for manual use and smoke tests.
//!
//! # Usage
//!
//! ```bash
//! # Check credentials and bucket access
//! ocistore test
//!
//! # Upload, download, delete
//! ocistore put ./report.pdf --name docs/report.pdf
//! ocistore get docs/report.pdf -o -
//! ocistore rm docs/report.pdf --force
//!
//! # List with a prefix, following pagination
//! ocistore ls --prefix logs/ --all
//!
//! # Show the active configuration
//! ocistore --config oci.yaml config
//! ```

pub mod args;
pub mod commands;

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::config::{self, BackendConfig};
use crate::oci::ObjectStorageClient;
use args::{Cli, Commands};

/// Execute a parsed command line
pub async fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;

    // Printing the configuration must work before the key is readable
    let command = match cli.command {
        Commands::Config => return commands::cmd_config(&config.redacted()),
        command => command,
    };

    let client = ObjectStorageClient::new(config).context("Failed to create storage client")?;
    debug!(client = ?client, "client initialized");

    match command {
        Commands::Put { file, name } => {
            commands::cmd_put(&client, &file, name.as_deref()).await?;
        }
        Commands::Get { object, output } => {
            commands::cmd_get(&client, &object, output.as_deref()).await?;
        }
        Commands::Rm { object, force } => {
            commands::cmd_rm(&client, &object, force).await?;
        }
        Commands::Ls { prefix, limit, all } => {
            commands::cmd_ls(&client, &prefix, limit, all).await?;
        }
        Commands::Test => {
            commands::cmd_test(&client).await?;
        }
        Commands::Config => {
            commands::cmd_config(&client.config())?;
        }
    }

    Ok(())
}

fn load_config(cli: &Cli) -> Result<BackendConfig> {
    let mut config =
        config::load_config(cli.config.as_deref()).context("Failed to load configuration")?;

    if cli.insecure {
        warn!("TLS certificate verification disabled by --insecure");
        config.http.verify_tls = false;
    }

    Ok(config)
}
