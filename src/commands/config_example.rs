// ConfigExampleCommand - Write an example configuration file
// Copyright (C) 2025 Marc Rivero (@seifreed)
// Licensed under GPL-3.0

use super::Command;
use crate::config::AttackConfig;
use crate::error::DrownError;
use crate::{Args, Result};
use async_trait::async_trait;

/// ConfigExampleCommand writes the default attack configuration as TOML
pub struct ConfigExampleCommand {
    args: Args,
}

impl ConfigExampleCommand {
    /// Create a new ConfigExampleCommand with the given arguments
    pub fn new(args: Args) -> Self {
        Self { args }
    }
}

#[async_trait]
impl Command for ConfigExampleCommand {
    async fn execute(&self) -> Result<()> {
        let path = self
            .args
            .config_example
            .as_deref()
            .ok_or_else(|| DrownError::ConfigError {
                message: "--config-example requires a file path".to_string(),
            })?;
        AttackConfig::create_example(path)?;
        println!("✓ Example configuration saved to: {}", path.display());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "ConfigExampleCommand"
    }
}
