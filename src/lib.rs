// drownrun - DROWN assessment and Special DROWN recovery engine
// Copyright (C) 2025 Marc Rivero (@seifreed)
// Licensed under GPL-3.0

//! drownrun tests servers for the DROWN family of SSLv2 cross-protocol
//! attacks and runs the Special DROWN attacks against them: plaintext
//! recovery of captured TLS Premaster secrets with the "extra clear"
//! oracle, and the offline "leaky export" check.

pub mod cli;
pub mod commands;
pub mod config;
pub mod constants;
pub mod drown;
pub mod error;
pub mod ssl2;
pub mod utils;

// Re-export commonly used types
pub use crate::cli::Args;
pub use crate::config::AttackConfig;
pub use crate::drown::{DrownAttacker, DrownReport, DrownVulnerabilityType};
pub use crate::error::DrownError;

/// Result type for drownrun operations
pub type Result<T> = std::result::Result<T, DrownError>;
