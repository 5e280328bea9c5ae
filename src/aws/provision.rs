//! Bulk creation of multisig keys and their aliases

use std::io::Write;

use tracing::info;

use super::types::{CreateKeyResponse, CreatedKey};
use super::AwsKms;
use crate::cli::{run_checked, run_json, KmsCli};
use crate::config::{key_name, ProvisionPlan};
use crate::error::Result;

impl<C: KmsCli> AwsKms<C> {
    /// Create one secp256k1 signing key, returning its ARN
    pub async fn create_key(&self) -> Result<String> {
        let response: CreateKeyResponse = run_json(&self.cli, &self.create_key_command()).await?;
        Ok(response.key_metadata.arn)
    }

    /// Point `alias/<key_name>` at a key
    pub async fn create_alias(&self, key_name: &str, key_arn: &str) -> Result<()> {
        run_checked(&self.cli, &self.create_alias_command(key_name, key_arn)).await?;
        Ok(())
    }

    /// Create a key and alias for every index in the plan, one at a time.
    ///
    /// Progress lines go to `out`, ending with `DONE`.
    pub async fn provision<W: Write>(
        &self,
        plan: &ProvisionPlan,
        out: &mut W,
    ) -> Result<Vec<CreatedKey>> {
        let mut created = Vec::new();

        for (i, index) in plan.indices().enumerate() {
            if i > 0 && !plan.delay.is_zero() {
                tokio::time::sleep(plan.delay).await;
            }

            let name = key_name(&self.config.alias_prefix, index);
            writeln!(out, "KeyName {name}")?;

            let arn = self.create_key().await?;
            writeln!(out, "KeyArn {arn}")?;

            self.create_alias(&name, &arn).await?;
            writeln!(out, "_")?;

            info!(key_name = %name, key_arn = %arn, "Created AWS KMS key");
            created.push(CreatedKey {
                key_name: name,
                key_arn: arn,
            });
        }

        writeln!(out, "DONE")?;
        Ok(created)
    }
}
