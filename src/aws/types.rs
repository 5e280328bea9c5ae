//! Shapes of `aws kms` JSON output
//!
//! Field names follow the AWS CLI (PascalCase). Alias records keep any field
//! the CLI returns that is not modelled here, so the inventory output is the
//! list-aliases entry plus `KeyArn` and `PublicKey`.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::{AWS_KEY_SPEC, AWS_KEY_USAGE, AWS_SIGNING_ALGORITHM};
use crate::error::{KmsError, Result};

/// One entry of `aws kms list-keys --query Keys`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AwsKey {
    pub key_id: String,
    pub key_arn: String,
}

/// One entry of `aws kms list-aliases`, enriched during reconciliation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AwsAlias {
    pub alias_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias_arn: Option<String>,
    pub target_key_id: String,
    /// CreationDate, LastUpdatedDate and anything else the CLI adds
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_arn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key_point: Option<String>,
}

impl AwsAlias {
    pub fn new(alias_name: impl Into<String>, target_key_id: impl Into<String>) -> Self {
        Self {
            alias_name: alias_name.into(),
            alias_arn: None,
            target_key_id: target_key_id.into(),
            extra: Map::new(),
            key_arn: None,
            public_key: None,
            public_key_point: None,
        }
    }
}

/// Output of `aws kms get-public-key`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AwsPublicKey {
    /// Full key ARN
    pub key_id: String,
    /// Base64 DER SubjectPublicKeyInfo
    pub public_key: String,
    #[serde(default)]
    pub customer_master_key_spec: Option<String>,
    #[serde(default)]
    pub key_spec: Option<String>,
    pub key_usage: String,
    #[serde(default)]
    pub signing_algorithms: Vec<String>,
}

impl AwsPublicKey {
    /// Key spec under either of the names the CLI has used for it
    pub fn spec(&self) -> Option<&str> {
        self.customer_master_key_spec
            .as_deref()
            .or(self.key_spec.as_deref())
    }

    /// Fail unless this is a secp256k1 SIGN_VERIFY key limited to ECDSA_SHA_256
    pub fn validate(&self) -> Result<()> {
        let mismatch = |field: &'static str, actual: String, expected: &str| KmsError::SpecMismatch {
            key_id: self.key_id.clone(),
            field,
            actual,
            expected: expected.to_string(),
        };

        match self.spec() {
            Some(AWS_KEY_SPEC) => {}
            other => {
                return Err(mismatch(
                    "CustomerMasterKeySpec",
                    other.unwrap_or("<missing>").to_string(),
                    AWS_KEY_SPEC,
                ))
            }
        }

        if self.key_usage != AWS_KEY_USAGE {
            return Err(mismatch("KeyUsage", self.key_usage.clone(), AWS_KEY_USAGE));
        }

        let algorithms: BTreeSet<&str> = self.signing_algorithms.iter().map(String::as_str).collect();
        if algorithms != BTreeSet::from([AWS_SIGNING_ALGORITHM]) {
            return Err(mismatch(
                "SigningAlgorithms",
                format!("{:?}", algorithms),
                AWS_SIGNING_ALGORITHM,
            ));
        }

        Ok(())
    }
}

/// Output of `aws kms create-key`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateKeyResponse {
    pub key_metadata: KeyMetadata,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct KeyMetadata {
    pub key_id: String,
    pub arn: String,
}

/// A key created by the provisioning loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedKey {
    pub key_name: String,
    pub key_arn: String,
}
