// Error types for drownrun
//
// This module provides the structured error type shared by the SSLv2 client,
// the attack engine and the command layer. Attack-step failures are kept
// apart from vulnerability classifications: a failed attack run does not
// mean the target is safe.

use std::fmt;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

/// Step of the Special DROWN attack that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttackStep {
    /// Step 1: converting a captured Premaster secret to ENCRYPTED-KEY-DATA
    Conversion,
    /// Step 2: iterative plaintext recovery with rotations
    Recovery,
    /// Step 3: converting SECRET-KEY-DATA back to the Premaster secret
    Reversion,
}

impl fmt::Display for AttackStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttackStep::Conversion => write!(f, "step 1 (conversion)"),
            AttackStep::Recovery => write!(f, "step 2 (recovery)"),
            AttackStep::Reversion => write!(f, "step 3 (reversion)"),
        }
    }
}

/// Main error type for drownrun operations
#[derive(Debug, Error)]
pub enum DrownError {
    /// Missing or conflicting configuration
    #[error("Invalid configuration: {message}")]
    ConfigError { message: String },

    /// The live protocol exchange did not complete
    #[error("Probe did not complete: {details}")]
    ProbeIncomplete { details: String },

    /// An attack step exhausted its search bound
    #[error("Attack failed in {step}: {details}")]
    AttackFailed { step: AttackStep, details: String },

    /// Connection timeout occurred
    #[error("Connection timeout after {duration:?} to {addr}")]
    ConnectionTimeout {
        duration: Duration,
        addr: SocketAddr,
    },

    /// SSLv2 handshake message was malformed
    #[error("Invalid SSLv2 handshake: {details}")]
    InvalidHandshake { details: String },

    /// Invalid input from user or configuration
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    /// Parsing error for data formats
    #[error("Parse error: {message}")]
    ParseError { message: String },

    /// File system errors
    #[error("File system error: {path}: {source}")]
    FileSystemError {
        path: String,
        #[source]
        source: io::Error,
    },

    /// Generic I/O error
    #[error("I/O error: {source}")]
    IoError {
        #[from]
        source: io::Error,
    },

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// TOML configuration errors
    #[error("Configuration file error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// Hex decoding errors
    #[error("Hex decoding error: {0}")]
    HexError(#[from] hex::FromHexError),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl DrownError {
    /// Shorthand for an attack-step failure
    pub fn attack_failed(step: AttackStep, details: impl Into<String>) -> Self {
        DrownError::AttackFailed {
            step,
            details: details.into(),
        }
    }
}

impl From<toml::ser::Error> for DrownError {
    fn from(err: toml::ser::Error) -> Self {
        DrownError::Other(format!("TOML serialization error: {}", err))
    }
}

impl From<tokio::task::JoinError> for DrownError {
    fn from(err: tokio::task::JoinError) -> Self {
        DrownError::Other(format!("Task join error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};

    #[test]
    fn test_connection_timeout_error() {
        let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)), 443);
        let err = DrownError::ConnectionTimeout {
            duration: Duration::from_secs(5),
            addr,
        };

        let msg = err.to_string();
        assert!(msg.contains("timeout"));
        assert!(msg.contains("127.0.0.1:443"));
    }

    #[test]
    fn test_attack_failed_names_step() {
        let err = DrownError::attack_failed(AttackStep::Recovery, "no multiplier found");
        let msg = err.to_string();
        assert!(msg.contains("step 2"));
        assert!(msg.contains("no multiplier found"));
    }

    #[test]
    fn test_error_conversion_from_io() {
        let io_err = io::Error::new(io::ErrorKind::ConnectionRefused, "refused");
        let err: DrownError = io_err.into();

        assert!(matches!(err, DrownError::IoError { .. }));
    }

    #[test]
    fn test_file_system_error_chain_preserved() {
        use std::error::Error;

        let err = DrownError::FileSystemError {
            path: "secrets.txt".to_string(),
            source: io::Error::new(io::ErrorKind::NotFound, "missing"),
        };

        assert!(err.to_string().contains("secrets.txt"));
        assert!(err.source().is_some());
    }
}
