//! AWS KMS multisig keys - Standalone Binary
//!
//! ## Usage
//!
//! ```bash
//! # Print every btci_multisig_ alias with its key ARN and public key
//! aws-keys list
//!
//! # Also decode the secp256k1 point
//! aws-keys list --with-point
//!
//! # Create btci_multisig_00 .. btci_multisig_99
//! aws-keys create --policy-file aws_kms_policy.json
//! ```

use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use kms_inventory::config::{AwsConfig, InventoryOptions, ProvisionPlan};
use kms_inventory::logging::{self, LogFormat};
use kms_inventory::{emit, AwsKms, SystemCli};

/// Provision and inventory multisig signing keys in AWS KMS
#[derive(Parser, Debug)]
#[command(name = "aws-keys", version, about)]
struct Args {
    /// AWS CLI binary
    #[arg(long, env = "AWS_CLI", default_value = "aws")]
    aws_bin: String,

    /// Alias prefix for multisig keys
    #[arg(long, env = "KMS_ALIAS_PREFIX", default_value = "btci_multisig_")]
    alias_prefix: String,

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
    /// Print aliases joined to their keys and public keys as JSON
    List {
        /// Add the hex secp256k1 point of each public key
        #[arg(long)]
        with_point: bool,
    },

    /// Create keys and aliases
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

        /// Key policy file
        #[arg(long, default_value = "aws_kms_policy.json")]
        policy_file: String,

        /// Key description
        #[arg(long, default_value = "Key to sign multisig withdrawal transactions in BTC")]
        description: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(args.verbose, args.log_format)?;

    let mut config = AwsConfig {
        program: args.aws_bin,
        alias_prefix: args.alias_prefix,
        ..AwsConfig::default()
    };

    match args.command {
        Commands::List { with_point } => {
            info!(prefix = %config.alias_prefix, "Listing AWS KMS multisig keys");
            let kms = AwsKms::new(SystemCli, config);
            let aliases = kms
                .inventory(InventoryOptions { with_point })
                .await
                .context("Failed to build AWS key inventory")?;

            emit::write_json(&mut std::io::stdout().lock(), &aliases)
                .context("Failed to print inventory")?;
        }

        Commands::Create {
            start,
            count,
            delay_ms,
            policy_file,
            description,
        } => {
            config.policy_file = policy_file;
            config.description = description;
            let plan = ProvisionPlan {
                start,
                count,
                delay: Duration::from_millis(delay_ms),
            };

            info!(start, count, "Creating AWS KMS multisig keys");
            let kms = AwsKms::new(SystemCli, config);
            let created = kms
                .provision(&plan, &mut std::io::stdout())
                .await
                .context("Failed to create AWS keys")?;

            info!(created = created.len(), "AWS provisioning finished");
        }
    }

    Ok(())
}
