//! Shapes of `gcloud kms` JSON output

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::config::{GOOGLE_ALGORITHM, GOOGLE_PROTECTION_LEVEL, GOOGLE_PURPOSE};

/// One entry of `gcloud kms keys list --format json`
///
/// ```json
/// {
///   "createTime": "2024-05-17T13:39:45.138666418Z",
///   "name": "projects/p/locations/global/keyRings/TestKeyring/cryptoKeys/TestKey4",
///   "purpose": "ASYMMETRIC_SIGN",
///   "versionTemplate": {"algorithm": "EC_SIGN_SECP256K1_SHA256", "protectionLevel": "HSM"}
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleKey {
    pub name: String,
    /// Only read for keys that pass the filter
    #[serde(default)]
    pub create_time: String,
    #[serde(default)]
    pub purpose: String,
    #[serde(default)]
    pub version_template: Option<Value>,
}

impl GoogleKey {
    /// An HSM-backed secp256k1 signing key, with nothing else in its template
    pub fn is_multisig_key(&self) -> bool {
        self.purpose == GOOGLE_PURPOSE
            && self.version_template.as_ref() == Some(&expected_version_template())
    }

    /// Segment after the last `/` of the resource name
    pub fn short_name(&self) -> &str {
        short_name(&self.name)
    }
}

pub fn short_name(resource_name: &str) -> &str {
    resource_name
        .rsplit_once('/')
        .map_or(resource_name, |(_, short)| short)
}

fn expected_version_template() -> Value {
    json!({
        "algorithm": GOOGLE_ALGORITHM,
        "protectionLevel": GOOGLE_PROTECTION_LEVEL,
    })
}

/// A filtered key as printed by the inventory
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleKeyRecord {
    pub create_time: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_key_point: Option<String>,
}

impl From<GoogleKey> for GoogleKeyRecord {
    fn from(key: GoogleKey) -> Self {
        Self {
            create_time: key.create_time,
            name: key.name,
            public_key: None,
            public_key_point: None,
        }
    }
}
