// LeakyExportCommand - Leaky export capture and offline analysis
// Copyright (C) 2025 Marc Rivero (@seifreed)
// Licensed under GPL-3.0

use super::report::present_report;
use super::Command;
use crate::config::AttackConfig;
use crate::drown::DrownAttacker;
use crate::error::DrownError;
use crate::ssl2::Ssl2Client;
use crate::utils::network::Target;
use crate::{Args, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::info;

/// Phase of the leaky export flow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeakyExportPhase {
    /// Connect and write check data
    Capture,
    /// Brute-force saved check data offline
    Analyze,
}

/// LeakyExportCommand runs one phase of the leaky export check
pub struct LeakyExportCommand {
    args: Args,
    phase: LeakyExportPhase,
}

impl LeakyExportCommand {
    /// Create a new LeakyExportCommand with the given arguments
    pub fn new(args: Args, phase: LeakyExportPhase) -> Self {
        Self { args, phase }
    }

    fn check_data_path(&self) -> Result<PathBuf> {
        self.args
            .leaky
            .check_data
            .clone()
            .ok_or_else(|| DrownError::ConfigError {
                message: "--check-data is required for the leaky export oracle".to_string(),
            })
    }
}

#[async_trait]
impl Command for LeakyExportCommand {
    async fn execute(&self) -> Result<()> {
        let config = AttackConfig::from_args(&self.args)?;
        let path = self.check_data_path()?;

        let report = match self.phase {
            LeakyExportPhase::Capture => {
                let target_str =
                    self.args
                        .target
                        .as_deref()
                        .ok_or_else(|| DrownError::ConfigError {
                            message: "A target URI is required to capture check data"
                                .to_string(),
                        })?;
                let target = Target::parse(target_str).await?;
                let addr = target.primary_addr()?;
                info!("Capturing leaky export check data from {} ({})", target, addr);

                let client = Ssl2Client::from_config(addr, &config);
                let display_target = target.to_string();
                tokio::task::spawn_blocking(move || {
                    let mut attacker = DrownAttacker::new(display_target, config);
                    attacker.generate_check_data(&client, &client, &path)
                })
                .await??
            }
            LeakyExportPhase::Analyze => {
                let display_target = self
                    .args
                    .target
                    .clone()
                    .unwrap_or_else(|| path.display().to_string());
                tokio::task::spawn_blocking(move || {
                    let mut attacker = DrownAttacker::new(display_target, config);
                    attacker.analyze_check_data(&path)
                })
                .await??
            }
        };

        present_report(&report, &self.args.output)
    }

    fn name(&self) -> &'static str {
        match self.phase {
            LeakyExportPhase::Capture => "LeakyExportCaptureCommand",
            LeakyExportPhase::Analyze => "LeakyExportAnalyzeCommand",
        }
    }
}
