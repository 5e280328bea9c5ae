//! Key filtering, public key export and join

use std::collections::HashMap;
use std::path::PathBuf;

use chrono::{DateTime, FixedOffset};
use tracing::{debug, info};

use super::types::{short_name, GoogleKey, GoogleKeyRecord};
use super::GoogleKms;
use crate::cli::{run_batch, run_json, KmsCli};
use crate::config::InventoryOptions;
use crate::error::{KmsError, Result};
use crate::pem::{normalize_public_key, secp256k1_point_hex};

impl<C: KmsCli> GoogleKms<C> {
    /// List multisig keys oldest first, each with its exported public key
    pub async fn inventory(&self, options: InventoryOptions) -> Result<Vec<GoogleKeyRecord>> {
        let keys: Vec<GoogleKey> = run_json(&self.cli, &self.list_keys_command()).await?;
        let listed = keys.len();

        let mut records = filter_keys(keys)?;
        info!(listed, kept = records.len(), "Filtered Google KMS keys");

        let paths = self.export_public_keys(&records).await?;
        attach_public_keys(&mut records, &paths, options).await?;

        info!(count = records.len(), "Google inventory complete");
        Ok(records)
    }

    /// Export version 1 of every key's public key, all at once.
    ///
    /// Returns resource name → exported file. The export directory must
    /// already exist. Nothing is returned unless every export succeeded.
    pub async fn export_public_keys(
        &self,
        records: &[GoogleKeyRecord],
    ) -> Result<HashMap<String, PathBuf>> {
        let export_dir = &self.config.export_dir;
        tokio::fs::metadata(export_dir)
            .await
            .map_err(|source| KmsError::Io {
                path: export_dir.clone(),
                source,
            })?;

        let mut paths = HashMap::new();
        let mut commands = Vec::with_capacity(records.len());
        for record in records {
            let short = short_name(&record.name);
            let path = self.export_path(short);
            commands.push(self.get_public_key_command(short, &path));
            paths.insert(record.name.clone(), path);
        }

        let results = run_batch(&self.cli, &commands).await;
        for (record, result) in records.iter().zip(results) {
            result.map_err(|source| KmsError::ExportFailed {
                key: record.name.clone(),
                source: Box::new(source),
            })?;
        }

        debug!(count = paths.len(), dir = %export_dir.display(), "Exported public keys");
        Ok(paths)
    }
}

/// Keep HSM secp256k1 signing keys, reduced to name and creation time,
/// sorted by creation time ascending.
pub fn filter_keys(keys: Vec<GoogleKey>) -> Result<Vec<GoogleKeyRecord>> {
    let mut dated = keys
        .into_iter()
        .filter(GoogleKey::is_multisig_key)
        .map(|key| -> Result<(DateTime<FixedOffset>, GoogleKeyRecord)> {
            let created = parse_create_time(&key)?;
            Ok((created, GoogleKeyRecord::from(key)))
        })
        .collect::<Result<Vec<_>>>()?;

    dated.sort_by_key(|(created, _)| *created);
    Ok(dated.into_iter().map(|(_, record)| record).collect())
}

fn parse_create_time(key: &GoogleKey) -> Result<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(&key.create_time).map_err(|source| KmsError::InvalidTimestamp {
        name: key.name.clone(),
        value: key.create_time.clone(),
        source,
    })
}

/// Read each exported PEM and store it as a single base64 line
pub async fn attach_public_keys(
    records: &mut [GoogleKeyRecord],
    paths: &HashMap<String, PathBuf>,
    options: InventoryOptions,
) -> Result<()> {
    for record in records.iter_mut() {
        let path = paths
            .get(&record.name)
            .ok_or_else(|| KmsError::MissingPublicKey(record.name.clone()))?;
        let pem = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| KmsError::Io {
                path: path.clone(),
                source,
            })?;

        let public_key = normalize_public_key(&pem);
        if options.with_point {
            record.public_key_point = Some(secp256k1_point_hex(&public_key)?);
        }
        record.public_key = Some(public_key);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GoogleConfig;
    use crate::pem::tests::spki_base64;
    use crate::testing::{Reply, ScriptedCli};
    use serde_json::json;
    use tempfile::tempdir;

    const PREFIX: &str = "projects/p/locations/global/keyRings/TestKeyring/cryptoKeys";

    fn listed(name: &str, created: &str, protection: &str) -> serde_json::Value {
        json!({
            "createTime": created,
            "destroyScheduledDuration": "2592000s",
            "name": format!("{PREFIX}/{name}"),
            "purpose": "ASYMMETRIC_SIGN",
            "versionTemplate": {
                "algorithm": "EC_SIGN_SECP256K1_SHA256",
                "protectionLevel": protection
            }
        })
    }

    fn pem_for(fill: u8) -> String {
        let body = spki_base64(fill);
        let (a, b) = body.split_at(64);
        format!("-----BEGIN PUBLIC KEY-----\n{a}\n{b}\n-----END PUBLIC KEY-----\n")
    }

    fn config(dir: &std::path::Path) -> GoogleConfig {
        GoogleConfig {
            export_dir: dir.to_path_buf(),
            ..GoogleConfig::default()
        }
    }

    #[test]
    fn test_filter_sorts_chronologically() {
        let keys: Vec<GoogleKey> = serde_json::from_value(json!([
            listed("B", "2024-05-17T13:39:45.5Z", "HSM"),
            listed("A", "2024-05-17T13:39:45.138666418Z", "HSM"),
            listed("C", "2023-12-31T23:00:00-02:00", "HSM"),
            listed("S", "2020-01-01T00:00:00Z", "SOFTWARE")
        ]))
        .unwrap();

        let records = filter_keys(keys).unwrap();
        let names: Vec<_> = records.iter().map(|r| short_name(&r.name)).collect();
        // C is 2024-01-01T01:00Z once offset is applied
        assert_eq!(names, vec!["C", "A", "B"]);
        assert!(records.iter().all(|r| r.public_key.is_none()));
    }

    #[test]
    fn test_filter_skips_sparse_entries() {
        let keys: Vec<GoogleKey> = serde_json::from_value(json!([
            {"name": format!("{PREFIX}/Legacy")},
            {"name": format!("{PREFIX}/Sym"), "purpose": "ENCRYPT_DECRYPT"},
            listed("A", "2024-05-17T13:39:45Z", "HSM")
        ]))
        .unwrap();

        let records = filter_keys(keys).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(short_name(&records[0].name), "A");
    }

    #[test]
    fn test_filter_rejects_bad_timestamp() {
        let keys: Vec<GoogleKey> =
            serde_json::from_value(json!([listed("A", "yesterday", "HSM")])).unwrap();
        assert!(matches!(
            filter_keys(keys).unwrap_err(),
            KmsError::InvalidTimestamp { .. }
        ));
    }

    #[tokio::test]
    async fn test_inventory_end_to_end() {
        let dir = tempdir().unwrap();
        let cli = ScriptedCli::new(|inv| match inv.args[2].as_str() {
            "list" => Reply::json(json!([
                listed("TestKey4", "2024-01-01T00:00:00Z", "HSM"),
                listed("TestKey5", "2023-01-01T00:00:00Z", "SOFTWARE")
            ])),
            "versions" => Reply::WriteFile(pem_for(3)),
            other => Reply::fail(format!("unexpected {other}")),
        });
        let kms = GoogleKms::new(cli, config(dir.path()));

        let records = kms.inventory(InventoryOptions::default()).await.unwrap();

        assert_eq!(records.len(), 1);
        let out = serde_json::to_value(&records).unwrap();
        assert_eq!(
            out,
            json!([{
                "createTime": "2024-01-01T00:00:00Z",
                "name": format!("{PREFIX}/TestKey4"),
                "publicKey": spki_base64(3)
            }])
        );
        let public_key = records[0].public_key.as_deref().unwrap();
        assert!(!public_key.contains("-----BEGIN"));
        assert!(!public_key.contains("-----END"));
        assert!(!public_key.contains('\n'));

        // Exported file stays behind
        assert!(dir.path().join("TestKey4.pem").exists());
        assert!(!dir.path().join("TestKey5.pem").exists());
    }

    #[tokio::test]
    async fn test_inventory_with_point() {
        let dir = tempdir().unwrap();
        let cli = ScriptedCli::new(|inv| match inv.args[2].as_str() {
            "list" => Reply::json(json!([listed("TestKey4", "2024-01-01T00:00:00Z", "HSM")])),
            _ => Reply::WriteFile(pem_for(9)),
        });
        let kms = GoogleKms::new(cli, config(dir.path()));

        let records = kms
            .inventory(InventoryOptions { with_point: true })
            .await
            .unwrap();
        assert!(records[0].public_key_point.as_deref().unwrap().starts_with("040909"));
    }

    #[tokio::test]
    async fn test_exports_launch_for_every_key() {
        let dir = tempdir().unwrap();
        // All three exports must be in flight at once for any of them to return
        let cli = ScriptedCli::with_rendezvous(3, |_| Reply::WriteFile(pem_for(1)));
        let kms = GoogleKms::new(cli, config(dir.path()));
        let records: Vec<GoogleKeyRecord> = ["K1", "K2", "K3"]
            .iter()
            .map(|n| GoogleKeyRecord {
                create_time: "2024-01-01T00:00:00Z".to_string(),
                name: format!("{PREFIX}/{n}"),
                public_key: None,
                public_key_point: None,
            })
            .collect();

        let paths = tokio::time::timeout(
            std::time::Duration::from_secs(5),
            kms.export_public_keys(&records),
        )
        .await
        .expect("exports were awaited one at a time")
        .unwrap();

        assert_eq!(paths.len(), 3);
        assert_eq!(paths[&format!("{PREFIX}/K2")], dir.path().join("K2.pem"));
        let keys: Vec<_> = kms
            .cli()
            .calls()
            .iter()
            .map(|c| c.flag_value("--key").unwrap().to_string())
            .collect();
        assert_eq!(keys, vec!["K1", "K2", "K3"]);
    }

    #[tokio::test]
    async fn test_failed_export_aborts_run() {
        let dir = tempdir().unwrap();
        let cli = ScriptedCli::new(|inv| match inv.args[2].as_str() {
            "list" => Reply::json(json!([listed("TestKey4", "2024-01-01T00:00:00Z", "HSM")])),
            _ => Reply::fail("PERMISSION_DENIED"),
        });
        let kms = GoogleKms::new(cli, config(dir.path()));

        let err = kms.inventory(InventoryOptions::default()).await.unwrap_err();
        match err {
            KmsError::ExportFailed { key, .. } => assert_eq!(key, format!("{PREFIX}/TestKey4")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_missing_export_dir_is_fatal() {
        let dir = tempdir().unwrap();
        let cli = ScriptedCli::new(|_| Reply::json(json!([])));
        let kms = GoogleKms::new(cli, config(&dir.path().join("absent")));

        let err = kms.export_public_keys(&[]).await.unwrap_err();
        assert!(matches!(err, KmsError::Io { .. }));
        assert!(kms.cli().calls().is_empty());
    }

    #[tokio::test]
    async fn test_missing_pem_file_is_fatal() {
        let dir = tempdir().unwrap();
        let mut records = vec![GoogleKeyRecord {
            create_time: "2024-01-01T00:00:00Z".to_string(),
            name: "K1".to_string(),
            public_key: None,
            public_key_point: None,
        }];
        let paths = HashMap::from([("K1".to_string(), dir.path().join("K1.pem"))]);

        let err = attach_public_keys(&mut records, &paths, InventoryOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, KmsError::Io { .. }));
    }

    #[tokio::test]
    async fn test_empty_keyring() {
        let dir = tempdir().unwrap();
        let cli = ScriptedCli::new(|_| Reply::json(json!([])));
        let kms = GoogleKms::new(cli, config(dir.path()));

        let records = kms.inventory(InventoryOptions::default()).await.unwrap();
        assert!(records.is_empty());
        assert_eq!(kms.cli().calls().len(), 1);
    }

    #[tokio::test]
    #[ignore] // Requires gcloud credentials and ./google_pubkeys
    async fn test_real_keyring() {
        let kms = GoogleKms::new(crate::cli::SystemCli, GoogleConfig::default());
        let records = kms.inventory(InventoryOptions::default()).await;
        assert!(records.is_ok());
    }
}
