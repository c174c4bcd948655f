// Attack configuration - TOML file values overlaid with CLI flags

use crate::cli::Args;
use crate::constants::{
    DEFAULT_CONNECT_TIMEOUT, DEFAULT_KEY_BYTE_RETRIES, DEFAULT_LEAKY_POLL_INTERVAL,
    DEFAULT_MAX_MULTIPLIER_BITS, DEFAULT_MAX_TRIMMER_COUNT, DEFAULT_SOCKET_TIMEOUT,
};
use crate::drown::TrimmerStrategy;
use crate::error::DrownError;
use crate::ssl2::Ssl2CipherSuite;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::thread;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttackConfig {
    /// SSLv2 cipher kind offered to the server
    pub cipher_suite: Ssl2CipherSuite,

    /// Trimmers tried per captured Premaster secret in step 1
    pub max_trimmer_count: u64,

    /// Trimmer pair generator
    pub trimmer_strategy: TrimmerStrategy,

    /// Step 2 multiplier search bound, as a power of two
    pub max_multiplier_bits: u32,

    /// Worker threads for parallel searches (0 = all available cores)
    pub worker_threads: usize,

    /// Retries for a key byte query that yields no SERVER-VERIFY
    pub key_byte_retries: u32,

    /// Progress interval of the leaky export analysis in seconds
    pub leaky_poll_interval_secs: u64,

    /// Leading secret key bytes the leaky export analysis does not search
    #[serde(with = "hex::serde", skip_serializing_if = "Vec::is_empty")]
    pub leaky_known_prefix: Vec<u8>,

    /// TCP connect timeout in seconds
    pub connect_timeout_secs: u64,

    /// Socket read/write timeout in seconds
    pub socket_timeout_secs: u64,
}

impl Default for AttackConfig {
    fn default() -> Self {
        Self {
            cipher_suite: Ssl2CipherSuite::Rc4128WithMd5,
            max_trimmer_count: DEFAULT_MAX_TRIMMER_COUNT,
            trimmer_strategy: TrimmerStrategy::Sieving,
            max_multiplier_bits: DEFAULT_MAX_MULTIPLIER_BITS,
            worker_threads: 0,
            key_byte_retries: DEFAULT_KEY_BYTE_RETRIES,
            leaky_poll_interval_secs: DEFAULT_LEAKY_POLL_INTERVAL.as_secs(),
            leaky_known_prefix: Vec::new(),
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT.as_secs(),
            socket_timeout_secs: DEFAULT_SOCKET_TIMEOUT.as_secs(),
        }
    }
}

impl AttackConfig {
    /// Load config from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| DrownError::FileSystemError {
            path: path.display().to_string(),
            source,
        })?;
        let config: AttackConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Write the default config as an example file
    pub fn create_example(path: &Path) -> Result<()> {
        let config = Self::default();
        let toml = toml::to_string_pretty(&config)?;
        fs::write(path, toml).map_err(|source| DrownError::FileSystemError {
            path: path.display().to_string(),
            source,
        })?;
        Ok(())
    }

    /// Config file (or defaults) with CLI flags applied on top
    pub fn from_args(args: &Args) -> Result<Self> {
        let mut config = match &args.config {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };

        if let Some(suite) = args.attack.cipher_suite {
            config.cipher_suite = suite;
        }
        if let Some(threads) = args.attack.threads {
            config.worker_threads = threads;
        }
        if let Some(max_trimmers) = args.attack.max_trimmers {
            config.max_trimmer_count = max_trimmers;
        }
        if let Some(strategy) = args.attack.trimmer_strategy {
            config.trimmer_strategy = strategy;
        }
        if let Some(timeout) = args.connection.connect_timeout {
            config.connect_timeout_secs = timeout;
        }
        if let Some(timeout) = args.connection.socket_timeout {
            config.socket_timeout_secs = timeout;
        }

        config.validate()?;
        Ok(config)
    }

    /// Worker count with 0 resolved to the available parallelism
    pub fn effective_workers(&self) -> usize {
        if self.worker_threads > 0 {
            self.worker_threads
        } else {
            thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_trimmer_count == 0 {
            return Err(DrownError::ConfigError {
                message: "max_trimmer_count must be at least 1".to_string(),
            });
        }
        if self.max_multiplier_bits == 0 || self.max_multiplier_bits > 63 {
            return Err(DrownError::ConfigError {
                message: format!(
                    "max_multiplier_bits must be between 1 and 63, got {}",
                    self.max_multiplier_bits
                ),
            });
        }
        if self.connect_timeout_secs == 0 || self.socket_timeout_secs == 0 {
            return Err(DrownError::ConfigError {
                message: "timeouts must be at least one second".to_string(),
            });
        }
        if self.leaky_known_prefix.len() >= self.cipher_suite.secret_key_len() {
            return Err(DrownError::ConfigError {
                message: format!(
                    "leaky_known_prefix covers the whole {}-byte secret key of {}",
                    self.cipher_suite.secret_key_len(),
                    self.cipher_suite
                ),
            });
        }
        Ok(())
    }
}
