//! Google Cloud KMS key inventory and provisioning
//!
//! Drives the `gcloud kms` CLI. Inventory keeps only HSM secp256k1 signing
//! keys (others are skipped without complaint), exports each key's public
//! key to `<export_dir>/<key>.pem`, and reads the files back.
//!
//! ## Example Usage
//!
//! ```ignore
//! use kms_inventory::google::GoogleKms;
//! use kms_inventory::cli::SystemCli;
//! use kms_inventory::config::{GoogleConfig, InventoryOptions};
//!
//! let kms = GoogleKms::new(SystemCli, GoogleConfig::default());
//! let keys = kms.inventory(InventoryOptions::default()).await?;
//! ```

pub mod inventory;
pub mod provision;
pub mod types;

pub use types::{GoogleKey, GoogleKeyRecord};

use std::path::{Path, PathBuf};

use crate::cli::{Invocation, KmsCli};
use crate::config::GoogleConfig;

/// Client for the `gcloud kms` command set on one key ring
pub struct GoogleKms<C> {
    cli: C,
    config: GoogleConfig,
}

impl<C: KmsCli> GoogleKms<C> {
    pub fn new(cli: C, config: GoogleConfig) -> Self {
        Self { cli, config }
    }

    pub fn config(&self) -> &GoogleConfig {
        &self.config
    }

    pub fn cli(&self) -> &C {
        &self.cli
    }

    /// Where a key's public key is exported
    pub fn export_path(&self, short_name: &str) -> PathBuf {
        export_path(&self.config.export_dir, short_name)
    }

    fn keyring_args(&self) -> [String; 4] {
        [
            "--keyring".to_string(),
            self.config.keyring.clone(),
            "--location".to_string(),
            self.config.location.clone(),
        ]
    }

    pub(crate) fn list_keys_command(&self) -> Invocation {
        Invocation::new(&self.config.program)
            .args(["kms", "keys", "list"])
            .args(self.keyring_args())
            .args(["--format", "json"])
    }

    pub(crate) fn get_public_key_command(&self, short_name: &str, path: &Path) -> Invocation {
        Invocation::new(&self.config.program)
            .args(["kms", "keys", "versions", "get-public-key", "1", "--key", short_name])
            .args(self.keyring_args())
            .arg("--output-file")
            .arg(path.display().to_string())
    }

    pub(crate) fn create_key_command(&self, key_name: &str) -> Invocation {
        Invocation::new(&self.config.program)
            .args(["kms", "keys", "create", key_name])
            .args(self.keyring_args())
            .args([
                "--purpose",
                "asymmetric-signing",
                "--default-algorithm",
                "ec-sign-secp256k1-sha256",
                "--protection-level",
                "hsm",
            ])
    }
}

pub fn export_path(export_dir: &Path, short_name: &str) -> PathBuf {
    export_dir.join(format!("{short_name}.pem"))
}
