// CLI module - Command line interface and argument parsing
// Copyright (C) 2025 Marc Rivero (@seifreed)
// Licensed under GPL-3.0

use crate::drown::OracleKind;
use clap::Parser;
use std::path::PathBuf;

// Sub-modules for organized CLI arguments
mod attack_args;
mod connection_args;
mod leaky_export_args;
mod output_args;

// Re-export sub-structs
pub use attack_args::AttackArgs;
pub use connection_args::ConnectionArgs;
pub use leaky_export_args::LeakyExportArgs;
pub use output_args::OutputArgs;

/// drownrun - DROWN assessment and Special DROWN plaintext recovery
///
/// The Args struct composes the domain-specific argument groups with
/// clap's #[command(flatten)]:
/// - Extra-clear attack tuning (AttackArgs)
/// - Leaky export capture and analysis (LeakyExportArgs)
/// - Connection and timeout settings (ConnectionArgs)
/// - Output (OutputArgs)
#[derive(Parser, Debug, Clone, Default)]
#[command(author, version, long_about = None)]
#[command(name = "drownrun")]
#[command(about = "DROWN (CVE-2016-0800) assessment and Special DROWN attack tool")]
pub struct Args {
    /// Target URI (host:port or URL)
    #[arg(value_name = "URI")]
    pub target: Option<String>,

    /// Special DROWN oracle to test
    #[arg(long = "oracle", value_enum, default_value_t = OracleKind::ExtraClear)]
    pub oracle: OracleKind,

    /// Load attack configuration from a TOML file
    #[arg(long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Write an example configuration file and exit
    #[arg(long = "config-example", value_name = "FILE")]
    pub config_example: Option<PathBuf>,

    #[command(flatten)]
    pub attack: AttackArgs,

    #[command(flatten)]
    pub leaky: LeakyExportArgs,

    #[command(flatten)]
    pub connection: ConnectionArgs,

    #[command(flatten)]
    pub output: OutputArgs,
}
