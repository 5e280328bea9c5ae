//! Google Cloud KMS multisig keys - Standalone Binary
//!
//! ## Usage
//!
//! ```bash
//! # Export public keys to ./google_pubkeys and print the key list as JSON
//! google-keys list
//!
//! # Create btci_multisig_google_00 .. btci_multisig_google_99
//! google-keys --keyring TestKeyring create
//! ```

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use kms_inventory::config::{GoogleConfig, InventoryOptions, ProvisionPlan};
use kms_inventory::logging::{self, LogFormat};
use kms_inventory::{emit, GoogleKms, SystemCli};

/// Provision and inventory multisig signing keys in Google Cloud KMS
#[derive(Parser, Debug)]
#[command(name = "google-keys", version, about)]
struct Args {
    /// gcloud binary
    #[arg(long, env = "GCLOUD_CLI", default_value = "gcloud")]
    gcloud_bin: String,

    /// Key ring holding the multisig keys
    #[arg(long, env = "KMS_KEYRING", default_value = "TestKeyring")]
    keyring: String,

    /// Key ring location
    #[arg(long, env = "KMS_LOCATION", default_value = "global")]
    location: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Log format
    #[arg(long, value_enum, default_value = "text")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Export public keys and print matching keys as JSON, oldest first
    List {
        /// Existing directory receiving <key>.pem files
        #[arg(long, env = "KMS_EXPORT_DIR", default_value = "./google_pubkeys")]
        export_dir: PathBuf,

        /// Add the hex secp256k1 point of each public key
        #[arg(long)]
        with_point: bool,
    },

    /// Create HSM secp256k1 signing keys
    Create {
        /// First key index
        #[arg(long, default_value = "0")]
        start: u32,

        /// Number of keys to create
        #[arg(long, default_value = "100")]
        count: u32,

        /// Pause between keys in milliseconds
        #[arg(long, default_value = "1000")]
        delay_ms: u64,

        /// Key name prefix
        #[arg(long, default_value = "btci_multisig_google_")]
        key_prefix: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(args.verbose, args.log_format)?;

    let mut config = GoogleConfig {
        program: args.gcloud_bin,
        keyring: args.keyring,
        location: args.location,
        ..GoogleConfig::default()
    };

    match args.command {
        Commands::List {
            export_dir,
            with_point,
        } => {
            config.export_dir = export_dir;
            info!(
                keyring = %config.keyring,
                location = %config.location,
                "Listing Google KMS multisig keys"
            );
            let kms = GoogleKms::new(SystemCli, config);
            let keys = kms
                .inventory(InventoryOptions { with_point })
                .await
                .context("Failed to build Google key inventory")?;

            emit::write_json(&mut std::io::stdout().lock(), &keys)
                .context("Failed to print inventory")?;
        }

        Commands::Create {
            start,
            count,
            delay_ms,
            key_prefix,
        } => {
            config.key_prefix = key_prefix;
            let plan = ProvisionPlan {
                start,
                count,
                delay: Duration::from_millis(delay_ms),
            };

            info!(start, count, keyring = %config.keyring, "Creating Google KMS multisig keys");
            let kms = GoogleKms::new(SystemCli, config);
            let created = kms
                .provision(&plan, &mut std::io::stdout())
                .await
                .context("Failed to create Google keys")?;

            info!(created = created.len(), "Google provisioning finished");
        }
    }

    Ok(())
}
