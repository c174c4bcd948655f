// DROWN attack engine
//
// Special DROWN recovery with the "extra clear" oracle and the offline
// "leaky export" check, built on capabilities provided by the SSLv2 client.

pub mod attacker;
pub mod bigint;
pub mod capability;
pub mod coprime;
pub mod extra_clear;
pub mod leaky_export;
pub mod multiplier;
pub mod oracle;
pub mod rsa;
pub mod secrets;
pub mod server_verify;

pub use attacker::{AttackerPhase, DrownAttacker, DrownReport};
pub use capability::{ConnectionSetup, ExchangeOutcome, MasterKeyRequest, Pkcs1Oracle, SessionProbe};
pub use coprime::{
    CoprimePair, CoprimePairGenerator, SievingCoprimePairGenerator, SimpleCoprimePairGenerator,
    TrimmerStrategy,
};
pub use extra_clear::{AttackState, ExtraClearAttack, ExtraClearSettings};
pub use leaky_export::{BruteForceOutcome, LeakyExportBruteForcer, LeakyExportCheckData};
pub use multiplier::MultiplierSearch;
pub use oracle::ExtraClearOracle;
pub use rsa::RsaPublicContext;
pub use server_verify::{ServerVerifyChecker, SessionCapture};

use serde::{Deserialize, Serialize};
use std::fmt;

/// DROWN classification of a target
///
/// `Unknown` means the probe did not complete. It is never the same as
/// `None`, which is a completed probe that found nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DrownVulnerabilityType {
    /// SSLv2 not supported
    None,
    /// SSLv2 supported, no special oracle found
    Ssl2,
    /// General DROWN (not probed by this tool)
    General,
    /// Special DROWN oracle present
    Special,
    /// Probe did not complete
    Unknown,
}

impl DrownVulnerabilityType {
    pub fn is_vulnerable(&self) -> bool {
        matches!(
            self,
            DrownVulnerabilityType::Ssl2
                | DrownVulnerabilityType::General
                | DrownVulnerabilityType::Special
        )
    }

    pub fn description(&self) -> &'static str {
        match self {
            DrownVulnerabilityType::None => "Not vulnerable - SSLv2 not supported",
            DrownVulnerabilityType::Ssl2 => {
                "SSLv2 supported - vulnerable to DROWN (CVE-2016-0800) if the RSA key is shared"
            }
            DrownVulnerabilityType::General => "Vulnerable to General DROWN (CVE-2016-0800)",
            DrownVulnerabilityType::Special => {
                "Vulnerable to Special DROWN (CVE-2016-0703/CVE-2016-0704)"
            }
            DrownVulnerabilityType::Unknown => "Unknown - probe did not complete",
        }
    }
}

impl fmt::Display for DrownVulnerabilityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DrownVulnerabilityType::None => "NONE",
            DrownVulnerabilityType::Ssl2 => "SSL2",
            DrownVulnerabilityType::General => "GENERAL",
            DrownVulnerabilityType::Special => "SPECIAL",
            DrownVulnerabilityType::Unknown => "UNKNOWN",
        };
        write!(f, "{}", name)
    }
}

/// Special DROWN oracle to test or exploit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum OracleKind {
    /// "extra clear" oracle (CVE-2016-0703)
    #[default]
    ExtraClear,
    /// "leaky export" oracle (CVE-2016-0704)
    LeakyExport,
}

impl fmt::Display for OracleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OracleKind::ExtraClear => write!(f, "extra-clear"),
            OracleKind::LeakyExport => write!(f, "leaky-export"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_is_not_none() {
        assert_ne!(DrownVulnerabilityType::Unknown, DrownVulnerabilityType::None);
        assert!(!DrownVulnerabilityType::Unknown.is_vulnerable());
        assert!(!DrownVulnerabilityType::None.is_vulnerable());
        assert!(DrownVulnerabilityType::Special.is_vulnerable());
    }

    #[test]
    fn test_vulnerability_serialization() {
        let json = serde_json::to_string(&DrownVulnerabilityType::Ssl2).unwrap();
        assert_eq!(json, "\"SSL2\"");
        assert_eq!(DrownVulnerabilityType::Special.to_string(), "SPECIAL");
    }

    #[test]
    fn test_oracle_kind_names() {
        assert_eq!(OracleKind::LeakyExport.to_string(), "leaky-export");
        let json = serde_json::to_string(&OracleKind::ExtraClear).unwrap();
        assert_eq!(json, "\"extra-clear\"");
    }
}
