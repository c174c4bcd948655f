// Command trait - Defines the interface for all command implementations
// Copyright (C) 2025 Marc Rivero (@seifreed)
// Licensed under GPL-3.0

use crate::Result;
use async_trait::async_trait;

/// Command trait - Defines the interface for all command implementations
///
/// Each operating mode of drownrun (extra-clear attack, leaky export
/// capture or analysis, benchmark, config example) is an independent
/// command object selected by the `CommandRouter`.
#[async_trait]
pub trait Command: Send + Sync {
    /// Execute the command asynchronously
    ///
    /// # Errors
    /// Configuration errors and unrecoverable I/O errors. Vulnerability
    /// verdicts, including UNKNOWN, are reported and return `Ok(())`.
    async fn execute(&self) -> Result<()>;

    /// Get a human-readable name for this command (for logging/debugging)
    fn name(&self) -> &'static str;
}
