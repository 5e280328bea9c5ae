//! Error types for KMS inventory and provisioning
//!
//! Every failure is fatal to the run. Nothing here is retried and no partial
//! result is ever returned to the caller.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while driving the provider CLIs
#[derive(Debug, Error)]
pub enum KmsError {
    /// The CLI binary could not be started
    #[error("Failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The CLI exited with a non-zero status
    #[error("Command `{command}` failed with status {status}: {stderr}")]
    CommandFailed {
        command: String,
        status: String,
        stderr: String,
    },

    /// The CLI printed something that is not the expected JSON shape
    #[error("Invalid JSON from `{command}`: {source}")]
    InvalidJson {
        command: String,
        #[source]
        source: serde_json::Error,
    },

    /// An alias points at a key that list-keys did not return
    #[error("Alias {alias} targets unknown key {target_key_id}")]
    UnknownTargetKey {
        alias: String,
        target_key_id: String,
    },

    /// A fetched public key does not carry the expected key specification
    #[error("Key {key_id} has {field} = {actual}, expected {expected}")]
    SpecMismatch {
        key_id: String,
        field: &'static str,
        actual: String,
        expected: String,
    },

    /// No public key came back for a key that was asked for
    #[error("No public key returned for {0}")]
    MissingPublicKey(String),

    /// The public key export subprocess for a key failed
    #[error("Public key export failed for {key}: {source}")]
    ExportFailed {
        key: String,
        #[source]
        source: Box<KmsError>,
    },

    /// Filesystem access failed
    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Writing progress or JSON output failed
    #[error("Failed to write output: {0}")]
    Output(#[from] std::io::Error),

    /// A createTime value is not RFC 3339
    #[error("Invalid createTime {value:?} on {name}: {source}")]
    InvalidTimestamp {
        name: String,
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    /// Public key material could not be decoded
    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),
}

pub type Result<T> = std::result::Result<T, KmsError>;
