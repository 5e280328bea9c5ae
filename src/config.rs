//! Provider settings and expected key specifications
//!
//! Defaults match the production setup: the `btci_multisig_` naming scheme,
//! the `TestKeyring` key ring in `global`, and `./google_pubkeys` for
//! exported PEM files. Binaries override them from flags or environment.

use std::ops::Range;
use std::path::PathBuf;
use std::time::Duration;

/// AWS key spec every multisig key must have
pub const AWS_KEY_SPEC: &str = "ECC_SECG_P256K1";
/// AWS key usage every multisig key must have
pub const AWS_KEY_USAGE: &str = "SIGN_VERIFY";
/// The only signing algorithm an AWS multisig key may offer
pub const AWS_SIGNING_ALGORITHM: &str = "ECDSA_SHA_256";

/// Google purpose of a signing key
pub const GOOGLE_PURPOSE: &str = "ASYMMETRIC_SIGN";
/// Google version template algorithm
pub const GOOGLE_ALGORITHM: &str = "EC_SIGN_SECP256K1_SHA256";
/// Google version template protection level
pub const GOOGLE_PROTECTION_LEVEL: &str = "HSM";

/// Settings for the `aws kms` side
#[derive(Debug, Clone)]
pub struct AwsConfig {
    /// Path or name of the AWS CLI binary
    pub program: String,
    /// Alias name prefix, used both for listing and for new keys
    pub alias_prefix: String,
    /// Key policy file handed to create-key
    pub policy_file: String,
    /// Description attached to new keys
    pub description: String,
}

impl Default for AwsConfig {
    fn default() -> Self {
        Self {
            program: "aws".to_string(),
            alias_prefix: "btci_multisig_".to_string(),
            policy_file: "aws_kms_policy.json".to_string(),
            description: "Key to sign multisig withdrawal transactions in BTC".to_string(),
        }
    }
}

/// Settings for the `gcloud kms` side
#[derive(Debug, Clone)]
pub struct GoogleConfig {
    /// Path or name of the gcloud binary
    pub program: String,
    pub keyring: String,
    pub location: String,
    /// Prefix for new key names
    pub key_prefix: String,
    /// Directory receiving `<key>.pem` exports. Must already exist.
    pub export_dir: PathBuf,
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            program: "gcloud".to_string(),
            keyring: "TestKeyring".to_string(),
            location: "global".to_string(),
            key_prefix: "btci_multisig_google_".to_string(),
            export_dir: PathBuf::from("./google_pubkeys"),
        }
    }
}

/// Extra output requested from an inventory run
#[derive(Debug, Clone, Copy, Default)]
pub struct InventoryOptions {
    /// Add the hex secp256k1 point decoded from each public key
    pub with_point: bool,
}

/// Which keys a provisioning loop creates, and how fast
#[derive(Debug, Clone)]
pub struct ProvisionPlan {
    pub start: u32,
    pub count: u32,
    /// Pause between creations to stay under provider rate limits
    pub delay: Duration,
}

impl Default for ProvisionPlan {
    fn default() -> Self {
        Self {
            start: 0,
            count: 100,
            delay: Duration::from_secs(1),
        }
    }
}

impl ProvisionPlan {
    pub fn indices(&self) -> Range<u32> {
        self.start..self.start.saturating_add(self.count)
    }
}

/// Deterministic key name: prefix plus a zero-padded two digit index
pub fn key_name(prefix: &str, index: u32) -> String {
    format!("{prefix}{index:02}")
}
