//! Bulk creation of multisig keys

use std::io::Write;

use tracing::info;

use super::GoogleKms;
use crate::cli::{run_checked, KmsCli};
use crate::config::{key_name, ProvisionPlan};
use crate::error::Result;

impl<C: KmsCli> GoogleKms<C> {
    /// Create one HSM secp256k1 signing key in the configured key ring
    pub async fn create_key(&self, key_name: &str) -> Result<()> {
        run_checked(&self.cli, &self.create_key_command(key_name)).await?;
        Ok(())
    }

    /// Create a key for every index in the plan, one at a time.
    ///
    /// Writes `<n>/<end>` after each key and `DONE` at the end.
    pub async fn provision<W: Write>(&self, plan: &ProvisionPlan, out: &mut W) -> Result<Vec<String>> {
        let mut created = Vec::new();

        for (i, index) in plan.indices().enumerate() {
            if i > 0 && !plan.delay.is_zero() {
                tokio::time::sleep(plan.delay).await;
            }

            let name = key_name(&self.config.key_prefix, index);
            self.create_key(&name).await?;
            writeln!(out, "{}/{}", index, plan.indices().end)?;

            info!(key_name = %name, "Created Google KMS key");
            created.push(name);
        }

        writeln!(out, "DONE")?;
        Ok(created)
    }
}
