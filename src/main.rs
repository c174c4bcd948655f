// drownrun - DROWN assessment and Special DROWN recovery engine
// Copyright (C) 2025 Marc Rivero (@seifreed)
// Licensed under GPL-3.0
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, version 3.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU General Public License for more details.

use anyhow::Result;
use clap::Parser;
use drownrun::commands::CommandRouter;
use drownrun::Args;
use tracing::{debug, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging - respect RUST_LOG environment variable
    let log_level = std::env::var("RUST_LOG")
        .ok()
        .and_then(|s| s.parse::<Level>().ok())
        .unwrap_or(Level::INFO);

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Parse command line arguments
    let args = Args::parse();
    display_banner(&args);

    CommandRouter::validate_routing(&args)?;
    let command = CommandRouter::route(args)?;
    debug!("Running {}", command.name());
    command.execute().await?;

    Ok(())
}

fn display_banner(args: &Args) {
    if !args.output.quiet {
        println!(
            r#"
    ╔═══════════════════════════════════════════════════════════╗
    ║                     drownrun v{:<8}                    ║
    ║     DROWN (CVE-2016-0800) assessment and attack tool      ║
    ╚═══════════════════════════════════════════════════════════╝

    Licensed under GPL-3.0 | Only test systems you are authorized to assess
    "#,
            env!("CARGO_PKG_VERSION")
        );
    }
}
