// Leaky export arguments
// Copyright (C) 2025 Marc Rivero (@seifreed)
// Licensed under GPL-3.0

use clap::Args;
use std::path::PathBuf;

/// Options for the two-phase leaky export flow
///
/// The capture phase (`--gen-check-data`) needs the target; the analysis
/// phase (`--analyze-check-data`) runs offline on the saved file.
#[derive(Args, Debug, Clone, Default)]
pub struct LeakyExportArgs {
    /// Check data file written by the capture phase and read by the analysis
    #[arg(long = "check-data", value_name = "FILE")]
    pub check_data: Option<PathBuf>,

    /// Connect to the target and write check data
    #[arg(long = "gen-check-data")]
    pub gen_check_data: bool,

    /// Brute-force previously written check data offline
    #[arg(long = "analyze-check-data")]
    pub analyze_check_data: bool,

    /// Estimate the time needed for a full leaky export analysis
    #[arg(long = "benchmark-leaky-export")]
    pub benchmark: bool,
}
