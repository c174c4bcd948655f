// Report presentation - Console verdict and JSON export

use crate::cli::OutputArgs;
use crate::drown::{DrownReport, DrownVulnerabilityType};
use crate::error::DrownError;
use crate::Result;
use colored::Colorize;
use std::fs;

/// Print the verdict and write the JSON report if requested
pub fn present_report(report: &DrownReport, output: &OutputArgs) -> Result<()> {
    println!("\n{}", "DROWN Assessment".cyan().bold());
    println!("  Target:        {}", report.target);
    println!("  Oracle:        {}", report.oracle);
    println!(
        "  Vulnerability: {}",
        colorize_verdict(report.vulnerability)
    );
    println!("  {}", report.vulnerability.description());

    if let Some(index) = report.pms_index {
        println!("  Converted Premaster secret: #{}", index);
    }
    if let Some(premaster) = &report.premaster_secret {
        println!(
            "  {} {}",
            "Recovered (padded) Premaster secret:".green().bold(),
            premaster
        );
    }
    if let Some(secret_key) = &report.recovered_secret_key {
        println!(
            "  {} {}",
            "Recovered SECRET-KEY-DATA:".green().bold(),
            secret_key
        );
    }
    if let Some(failure) = &report.attack_failure {
        println!("  {} {}", "Could not complete attack:".yellow().bold(), failure);
    }

    if let Some(json_file) = &output.json {
        let json = report.to_json(output.json_pretty)?;
        fs::write(json_file, &json).map_err(|source| DrownError::FileSystemError {
            path: json_file.display().to_string(),
            source,
        })?;
        println!("✓ Report exported to JSON: {}", json_file.display());
    }

    Ok(())
}

fn colorize_verdict(vulnerability: DrownVulnerabilityType) -> colored::ColoredString {
    let label = vulnerability.to_string();
    match vulnerability {
        DrownVulnerabilityType::None => label.green().bold(),
        DrownVulnerabilityType::Ssl2 | DrownVulnerabilityType::General => label.yellow().bold(),
        DrownVulnerabilityType::Special => label.red().bold(),
        DrownVulnerabilityType::Unknown => label.dimmed(),
    }
}
