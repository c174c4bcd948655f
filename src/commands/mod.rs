// Commands module - Command Pattern implementation
// Copyright (C) 2025 Marc Rivero (@seifreed)
// Licensed under GPL-3.0

mod command;
mod report;
mod router;

// Individual command implementations
mod benchmark;
mod config_example;
mod extra_clear;
mod leaky_export;

pub use command::Command;
pub use report::present_report;
pub use router::CommandRouter;

// Re-export individual commands for testing purposes
pub use benchmark::BenchmarkCommand;
pub use config_example::ConfigExampleCommand;
pub use extra_clear::ExtraClearCommand;
pub use leaky_export::{LeakyExportCommand, LeakyExportPhase};
