//! Alias/key reconciliation and public key fetch

use std::collections::HashMap;

use tracing::{debug, info};

use super::types::{AwsAlias, AwsKey, AwsPublicKey};
use super::AwsKms;
use crate::cli::{run_batch, run_json, KmsCli};
use crate::config::InventoryOptions;
use crate::error::{KmsError, Result};
use crate::pem::{normalize_public_key, secp256k1_point_hex};

impl<C: KmsCli> AwsKms<C> {
    /// List keys and multisig aliases, join them, and attach public keys.
    ///
    /// Output keeps the order list-aliases returned.
    pub async fn inventory(&self, options: InventoryOptions) -> Result<Vec<AwsAlias>> {
        let list_keys = self.list_keys_command();
        let list_aliases = self.list_aliases_command();

        // Both listings run at once; neither result is used until both finish
        let (keys, aliases) = futures::join!(
            run_json::<_, Vec<AwsKey>>(&self.cli, &list_keys),
            run_json::<_, Vec<AwsAlias>>(&self.cli, &list_aliases),
        );
        let (keys, aliases) = (keys?, aliases?);

        info!(keys = keys.len(), aliases = aliases.len(), "Listed AWS KMS keys");

        let mut aliases = join_key_arns(&keys, aliases)?;
        self.attach_public_keys(&mut aliases, options).await?;

        info!(count = aliases.len(), "AWS inventory complete");
        Ok(aliases)
    }

    /// Fetch every alias's public key concurrently and join it back by ARN.
    ///
    /// Every alias must already carry its `KeyArn`. Any failed fetch or any key
    /// that is not a secp256k1 signing key fails the whole batch.
    pub async fn attach_public_keys(
        &self,
        aliases: &mut [AwsAlias],
        options: InventoryOptions,
    ) -> Result<()> {
        let arns = aliases
            .iter()
            .map(|alias| {
                alias
                    .key_arn
                    .clone()
                    .ok_or_else(|| KmsError::MissingPublicKey(alias.alias_name.clone()))
            })
            .collect::<Result<Vec<_>>>()?;

        let commands: Vec<_> = arns
            .iter()
            .map(|arn| self.get_public_key_command(arn))
            .collect();

        let mut by_arn: HashMap<String, AwsPublicKey> = HashMap::new();
        for (command, stdout) in commands.iter().zip(run_batch(&self.cli, &commands).await) {
            let public_key: AwsPublicKey =
                serde_json::from_slice(&stdout?).map_err(|source| KmsError::InvalidJson {
                    command: command.to_string(),
                    source,
                })?;
            public_key.validate()?;
            debug!(key_id = %public_key.key_id, "Public key matches expected spec");
            by_arn.insert(public_key.key_id.clone(), public_key);
        }

        for (alias, arn) in aliases.iter_mut().zip(&arns) {
            let public_key = by_arn
                .get(arn)
                .ok_or_else(|| KmsError::MissingPublicKey(arn.clone()))?;
            let text = normalize_public_key(&public_key.public_key);
            if options.with_point {
                alias.public_key_point = Some(secp256k1_point_hex(&text)?);
            }
            alias.public_key = Some(text);
        }

        Ok(())
    }
}

/// Set each alias's `KeyArn` from the key its `TargetKeyId` names.
///
/// An alias whose target is not in `keys` (a stale alias) is fatal.
pub fn join_key_arns(keys: &[AwsKey], mut aliases: Vec<AwsAlias>) -> Result<Vec<AwsAlias>> {
    let arns: HashMap<&str, &str> = keys
        .iter()
        .map(|k| (k.key_id.as_str(), k.key_arn.as_str()))
        .collect();

    for alias in &mut aliases {
        let arn = arns
            .get(alias.target_key_id.as_str())
            .ok_or_else(|| KmsError::UnknownTargetKey {
                alias: alias.alias_name.clone(),
                target_key_id: alias.target_key_id.clone(),
            })?;
        alias.key_arn = Some(arn.to_string());
    }

    Ok(aliases)
}
