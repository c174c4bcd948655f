// BenchmarkCommand - Leaky export brute-force time estimate
// Copyright (C) 2025 Marc Rivero (@seifreed)
// Licensed under GPL-3.0

use super::Command;
use crate::config::AttackConfig;
use crate::drown::LeakyExportBruteForcer;
use crate::utils::format_duration;
use crate::{Args, Result};
use async_trait::async_trait;
use colored::Colorize;

/// BenchmarkCommand times a reduced leaky export search locally
pub struct BenchmarkCommand {
    args: Args,
}

impl BenchmarkCommand {
    /// Create a new BenchmarkCommand with the given arguments
    pub fn new(args: Args) -> Self {
        Self { args }
    }
}

#[async_trait]
impl Command for BenchmarkCommand {
    async fn execute(&self) -> Result<()> {
        let config = AttackConfig::from_args(&self.args)?;
        let suite = config.cipher_suite;
        let workers = config.effective_workers();

        let report = tokio::task::spawn_blocking(move || {
            LeakyExportBruteForcer::benchmark(suite, workers)
        })
        .await??;

        println!("\n{}", "Leaky Export Benchmark".cyan().bold());
        println!("  Cipher suite:  {}", suite);
        println!("  Threads:       {}", report.workers);
        println!(
            "  Brute-forcing {} bytes took {:.2?}",
            report.brute_forced_bytes, report.elapsed
        );
        println!(
            "  Estimated time for a full run:    {}",
            format_duration(report.estimated_total)
        );
        println!(
            "  Estimated time for an average run: {}",
            format_duration(report.estimated_average)
        );

        Ok(())
    }

    fn name(&self) -> &'static str {
        "BenchmarkCommand"
    }
}
