// CommandRouter - Routes CLI arguments to appropriate Command
// Copyright (C) 2025 Marc Rivero (@seifreed)
// Licensed under GPL-3.0

use super::{
    BenchmarkCommand, Command, ConfigExampleCommand, ExtraClearCommand, LeakyExportCommand,
    LeakyExportPhase,
};
use crate::drown::OracleKind;
use crate::error::DrownError;
use crate::{Args, Result};

/// CommandRouter determines which Command to execute based on CLI arguments
///
/// This router follows a priority-based routing strategy:
/// 1. Example configuration (--config-example)
/// 2. Leaky export benchmark (--benchmark-leaky-export)
/// 3. Leaky export capture or analysis (--oracle leaky-export)
/// 4. Extra-clear check and attack (default)
pub struct CommandRouter;

impl CommandRouter {
    /// Route CLI arguments to the appropriate Command
    ///
    /// Call `validate_routing` first; `route` assumes a consistent
    /// combination of flags.
    pub fn route(args: Args) -> Result<Box<dyn Command>> {
        // Priority 1: example configuration
        if args.config_example.is_some() {
            return Ok(Box::new(ConfigExampleCommand::new(args)));
        }

        // Priority 2: benchmark
        if args.leaky.benchmark {
            return Ok(Box::new(BenchmarkCommand::new(args)));
        }

        // Priority 3: leaky export phases
        if args.oracle == OracleKind::LeakyExport {
            let phase = if args.leaky.gen_check_data {
                LeakyExportPhase::Capture
            } else {
                LeakyExportPhase::Analyze
            };
            return Ok(Box::new(LeakyExportCommand::new(args, phase)));
        }

        // Priority 4: extra-clear oracle (default)
        Ok(Box::new(ExtraClearCommand::new(args)))
    }

    /// Check if the given arguments represent a valid command configuration
    ///
    /// # Returns
    /// - `Ok(())` if the arguments are valid
    /// - `Err(DrownError::ConfigError)` with description if invalid
    pub fn validate_routing(args: &Args) -> Result<()> {
        // Standalone modes need nothing else
        if args.config_example.is_some() || args.leaky.benchmark {
            return Ok(());
        }

        match args.oracle {
            OracleKind::LeakyExport => {
                if args.leaky.check_data.is_none() {
                    return Err(config_error(
                        "The leaky export oracle requires --check-data",
                    ));
                }
                if args.leaky.gen_check_data == args.leaky.analyze_check_data {
                    return Err(config_error(
                        "Choose exactly one of --gen-check-data and --analyze-check-data",
                    ));
                }
                if args.attack.premaster_secrets.is_some() {
                    return Err(config_error(
                        "--premaster-secrets is only used by the extra-clear oracle",
                    ));
                }
                if args.leaky.gen_check_data && args.target.is_none() {
                    return Err(config_error("--gen-check-data requires a target URI"));
                }
            }
            OracleKind::ExtraClear => {
                if args.leaky.check_data.is_some()
                    || args.leaky.gen_check_data
                    || args.leaky.analyze_check_data
                {
                    return Err(config_error(
                        "Check data options are only used by the leaky export oracle",
                    ));
                }
                if args.target.is_none() {
                    return Err(config_error("The extra-clear oracle requires a target URI"));
                }
            }
        }

        Ok(())
    }
}

fn config_error(message: &str) -> DrownError {
    DrownError::ConfigError {
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn leaky_args() -> Args {
        let mut args = Args::default();
        args.oracle = OracleKind::LeakyExport;
        args.leaky.check_data = Some(PathBuf::from("check.json"));
        args
    }

    #[test]
    fn test_route_config_example() {
        let mut args = Args::default();
        args.config_example = Some(PathBuf::from("drownrun.toml"));
        let cmd = CommandRouter::route(args).expect("test assertion should succeed");
        assert_eq!(cmd.name(), "ConfigExampleCommand");
    }

    #[test]
    fn test_route_benchmark() {
        let mut args = Args::default();
        args.leaky.benchmark = true;
        let cmd = CommandRouter::route(args).expect("test assertion should succeed");
        assert_eq!(cmd.name(), "BenchmarkCommand");
    }

    #[test]
    fn test_route_leaky_export_phases() {
        let mut args = leaky_args();
        args.leaky.gen_check_data = true;
        let cmd = CommandRouter::route(args).expect("test assertion should succeed");
        assert_eq!(cmd.name(), "LeakyExportCaptureCommand");

        let mut args = leaky_args();
        args.leaky.analyze_check_data = true;
        let cmd = CommandRouter::route(args).expect("test assertion should succeed");
        assert_eq!(cmd.name(), "LeakyExportAnalyzeCommand");
    }

    #[test]
    fn test_route_extra_clear_default() {
        let args = Args::default();
        let cmd = CommandRouter::route(args).expect("test assertion should succeed");
        assert_eq!(cmd.name(), "ExtraClearCommand");
    }

    #[test]
    fn test_validate_leaky_export_requires_check_data() {
        let mut args = leaky_args();
        args.leaky.check_data = None;
        args.leaky.analyze_check_data = true;
        assert!(CommandRouter::validate_routing(&args).is_err());
    }

    #[test]
    fn test_validate_leaky_export_phase_flags() {
        let args = leaky_args();
        assert!(CommandRouter::validate_routing(&args).is_err());

        let mut args = leaky_args();
        args.leaky.gen_check_data = true;
        args.leaky.analyze_check_data = true;
        assert!(CommandRouter::validate_routing(&args).is_err());

        let mut args = leaky_args();
        args.leaky.analyze_check_data = true;
        assert!(CommandRouter::validate_routing(&args).is_ok());
    }

    #[test]
    fn test_validate_capture_requires_target() {
        let mut args = leaky_args();
        args.leaky.gen_check_data = true;
        assert!(CommandRouter::validate_routing(&args).is_err());

        args.target = Some("example.com:443".to_string());
        assert!(CommandRouter::validate_routing(&args).is_ok());
    }

    #[test]
    fn test_validate_secrets_with_leaky_export() {
        let mut args = leaky_args();
        args.leaky.analyze_check_data = true;
        args.attack.premaster_secrets = Some(PathBuf::from("secrets.txt"));
        assert!(CommandRouter::validate_routing(&args).is_err());
    }

    #[test]
    fn test_validate_extra_clear() {
        let mut args = Args::default();
        assert!(CommandRouter::validate_routing(&args).is_err());

        args.target = Some("example.com:443".to_string());
        assert!(CommandRouter::validate_routing(&args).is_ok());

        args.leaky.gen_check_data = true;
        assert!(CommandRouter::validate_routing(&args).is_err());
    }
}
