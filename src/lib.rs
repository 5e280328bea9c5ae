//! KMS Inventory Library
//!
//! Provisions and inventories the secp256k1 signing keys behind the BTC
//! multisig withdrawal scheme, in AWS KMS and Google Cloud KMS, by driving
//! the `aws` and `gcloud` command-line tools.

pub mod aws;
pub mod cli;
pub mod config;
pub mod emit;
pub mod error;
pub mod google;
pub mod logging;
pub mod pem;

#[cfg(test)]
pub(crate) mod testing;

pub use aws::AwsKms;
pub use cli::{KmsCli, SystemCli};
pub use error::{KmsError, Result};
pub use google::GoogleKms;
