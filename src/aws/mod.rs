//! AWS KMS key inventory and provisioning
//!
//! Drives the `aws kms` CLI. Inventory joins the `btci_multisig_` aliases to
//! their keys and fetches each key's public key, refusing to continue if any
//! key is not a secp256k1 signing key.
//!
//! ## Example Usage
//!
//! ```ignore
//! use kms_inventory::aws::AwsKms;
//! use kms_inventory::cli::SystemCli;
//! use kms_inventory::config::{AwsConfig, InventoryOptions};
//!
//! let kms = AwsKms::new(SystemCli, AwsConfig::default());
//! let aliases = kms.inventory(InventoryOptions::default()).await?;
//! ```

pub mod inventory;
pub mod provision;
pub mod types;

pub use types::{AwsAlias, AwsKey, AwsPublicKey, CreatedKey};

use crate::cli::{Invocation, KmsCli};
use crate::config::{AwsConfig, AWS_KEY_SPEC, AWS_KEY_USAGE};

/// Client for the `aws kms` command set
pub struct AwsKms<C> {
    cli: C,
    config: AwsConfig,
}

impl<C: KmsCli> AwsKms<C> {
    pub fn new(cli: C, config: AwsConfig) -> Self {
        Self { cli, config }
    }

    pub fn config(&self) -> &AwsConfig {
        &self.config
    }

    pub fn cli(&self) -> &C {
        &self.cli
    }

    fn kms(&self) -> Invocation {
        Invocation::new(&self.config.program).arg("kms")
    }

    pub(crate) fn list_keys_command(&self) -> Invocation {
        self.kms().args(["list-keys", "--query", "Keys"])
    }

    pub(crate) fn list_aliases_command(&self) -> Invocation {
        self.kms().args([
            "list-aliases".to_string(),
            "--query".to_string(),
            format!(
                "Aliases[?contains(@.AliasName,'{}')]",
                self.config.alias_prefix
            ),
        ])
    }

    pub(crate) fn get_public_key_command(&self, key_arn: &str) -> Invocation {
        self.kms().args(["get-public-key", "--key-id", key_arn])
    }

    pub(crate) fn create_key_command(&self) -> Invocation {
        self.kms().args([
            "create-key".to_string(),
            "--policy".to_string(),
            format!("file://{}", self.config.policy_file),
            "--description".to_string(),
            self.config.description.clone(),
            "--key-usage".to_string(),
            AWS_KEY_USAGE.to_string(),
            "--key-spec".to_string(),
            AWS_KEY_SPEC.to_string(),
        ])
    }

    pub(crate) fn create_alias_command(&self, key_name: &str, key_arn: &str) -> Invocation {
        self.kms().args([
            "create-alias".to_string(),
            "--alias-name".to_string(),
            format!("alias/{key_name}"),
            "--target-key-id".to_string(),
            key_arn.to_string(),
        ])
    }
}
