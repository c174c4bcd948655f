// Shared fixtures: small RSA test keys, a plaintext-aware PKCS#1 oracle and
// an in-process SSLv2 server with configurable DROWN bugs.
#![allow(dead_code)]

use drownrun::drown::bigint::{ensure_positive, to_fixed_bytes};
use drownrun::drown::{
    ConnectionSetup, ExchangeOutcome, MasterKeyRequest, Pkcs1Oracle, RsaPublicContext,
    ServerVerifyChecker, SessionCapture, SessionProbe,
};
use drownrun::ssl2::{Ssl2Cipher, Ssl2CipherSuite};
use drownrun::{DrownError, Result};
use num_bigint::BigUint;
use rand::Rng;
use rc4::consts::U16;
use rc4::{KeyInit, Rc4, StreamCipher};
use std::sync::atomic::{AtomicU64, Ordering};

pub const MODULUS_128: &str = "ce69b1bef3c9b78c12cfb06d72dec059";
pub const PRIVATE_EXPONENT_128: &str = "7bb968fc8f7e82d0935182615b48fd01";

pub const MODULUS_256: &str = "cb8914b09e95f2e4fe25995c06cd8f48e2202dfed4b24bf4d8ae2f4742b4c209";
pub const PRIVATE_EXPONENT_256: &str =
    "632c470d8c282a3313f6c41408288f00a8560f264929a2f80da38848e24bb335";

pub const PUBLIC_EXPONENT: u32 = 65537;

fn hex_biguint(value: &str) -> BigUint {
    BigUint::parse_bytes(value.as_bytes(), 16).unwrap()
}

/// Public and private half of a test key
#[derive(Debug, Clone)]
pub struct TestKey {
    pub public: RsaPublicContext,
    pub private_exponent: BigUint,
}

impl TestKey {
    pub fn rsa_128() -> Self {
        Self::from_hex(MODULUS_128, PRIVATE_EXPONENT_128)
    }

    pub fn rsa_256() -> Self {
        Self::from_hex(MODULUS_256, PRIVATE_EXPONENT_256)
    }

    fn from_hex(modulus: &str, private_exponent: &str) -> Self {
        Self {
            public: RsaPublicContext::new(hex_biguint(modulus), BigUint::from(PUBLIC_EXPONENT))
                .unwrap(),
            private_exponent: hex_biguint(private_exponent),
        }
    }

    /// Textbook decryption, modulus-length big-endian output
    pub fn decrypt(&self, ciphertext: &[u8]) -> Vec<u8> {
        let c = ensure_positive(ciphertext) % &self.public.modulus;
        let m = c.modpow(&self.private_exponent, &self.public.modulus);
        to_fixed_bytes(&m, self.public.byte_len())
    }

    /// Whether `block` carries a `secret_len`-byte secret key behind 00 02
    pub fn is_conformant(&self, block: &[u8], secret_len: usize) -> bool {
        let len_n = block.len();
        len_n > secret_len + 2
            && block[0] == 0x00
            && block[1] == 0x02
            && block[len_n - secret_len - 1] == 0x00
    }
}

/// Captured Premaster secret whose plaintext the test knows.
///
/// `m1 = 00 02 AB.. 00 D` is conformant for `secret_len`; the captured
/// plaintext is `m0 = m1 * num / den`, so the trimmer den/num converts it.
pub struct KnownPremaster {
    pub m0: BigUint,
    pub m1: BigUint,
    pub ciphertext: Vec<u8>,
}

impl KnownPremaster {
    /// `m0 = 3 * m1 / 4`, converted by the trimmer 4/3
    pub fn new(key: &TestKey, secret_len: usize) -> Self {
        Self::with_ratio(key, secret_len, 3, 4)
    }

    /// `m0 = num * m1 / den`; the last secret byte is bumped until `den` divides `m1`
    pub fn with_ratio(key: &TestKey, secret_len: usize, num: u32, den: u32) -> Self {
        let len_n = key.public.byte_len();
        let mut block = vec![0x00, 0x02];
        block.extend(std::iter::repeat(0xAB).take(len_n - secret_len - 3));
        block.push(0x00);
        block.extend((0x10u8..).take(secret_len - 1));
        block.push(0x44);

        let mut m1 = ensure_positive(&block);
        while m1.clone() % den != BigUint::from(0u32) {
            m1 += 1u32;
        }
        let m0 = m1.clone() * num / den;
        assert!(m0 < key.public.modulus);
        let ciphertext = key.public.encode(&key.public.encrypt_raw(&m0));
        Self { m0, m1, ciphertext }
    }

    /// Premaster secret the attack is expected to report
    pub fn expected(&self, key: &TestKey) -> Vec<u8> {
        to_fixed_bytes(&self.m0, key.public.byte_len())
    }
}

/// 16-byte ciphertexts that no trimmer within the default budget converts
pub fn junk_secret(byte: u8) -> Vec<u8> {
    vec![byte; 16]
}

/// Oracle answering from the plaintext, no handshakes involved
pub struct TruthOracle {
    key: TestKey,
    secret_len: usize,
    queries: AtomicU64,
}

impl TruthOracle {
    pub fn new(key: TestKey, secret_len: usize) -> Self {
        Self {
            key,
            secret_len,
            queries: AtomicU64::new(0),
        }
    }

    pub fn queries(&self) -> u64 {
        self.queries.load(Ordering::Relaxed)
    }
}

impl Pkcs1Oracle for TruthOracle {
    fn check_pkcs_conformity(&self, ciphertext: &[u8]) -> Result<bool> {
        self.queries.fetch_add(1, Ordering::Relaxed);
        let block = self.key.decrypt(ciphertext);
        Ok(self.key.is_conformant(&block, self.secret_len))
    }

    fn brute_force_key_byte(&self, ciphertext: &[u8], known_prefix: &[u8]) -> Result<u8> {
        let block = self.key.decrypt(ciphertext);
        Ok(block[block.len() - self.secret_len + known_prefix.len()])
    }
}

/// Behavior switches of the simulated server
#[derive(Debug, Clone, Default)]
pub struct ServerBehavior {
    /// Answer CLIENT-HELLO with SERVER-HELLO
    pub supports_ssl2: bool,
    /// Accept clear keys longer than the cipher's clear-key length
    pub extra_clear_bug: bool,
    /// Secret key used when the decrypted key is not conformant. `None`
    /// means a fresh random master key.
    pub fallback_secret: Option<Vec<u8>>,
}

/// In-process SSLv2 server implementing both engine capabilities.
///
/// Only RC4 cipher kinds are supported.
pub struct SimulatedSsl2Server {
    key: TestKey,
    behavior: ServerBehavior,
    handshakes: AtomicU64,
}

impl SimulatedSsl2Server {
    pub fn new(key: TestKey, behavior: ServerBehavior) -> Self {
        Self {
            key,
            behavior,
            handshakes: AtomicU64::new(0),
        }
    }

    /// Server affected by the extra-clear bug
    pub fn extra_clear(key: TestKey) -> Self {
        Self::new(
            key,
            ServerBehavior {
                supports_ssl2: true,
                extra_clear_bug: true,
                fallback_secret: None,
            },
        )
    }

    /// SSLv2 server without either bug
    pub fn patched(key: TestKey) -> Self {
        Self::new(
            key,
            ServerBehavior {
                supports_ssl2: true,
                ..Default::default()
            },
        )
    }

    /// Server that reuses `secret` for wrong-length secret keys
    pub fn leaky_export(key: TestKey, secret: &[u8]) -> Self {
        Self::new(
            key,
            ServerBehavior {
                supports_ssl2: true,
                extra_clear_bug: false,
                fallback_secret: Some(secret.to_vec()),
            },
        )
    }

    pub fn tls_only(key: TestKey) -> Self {
        Self::new(key, ServerBehavior::default())
    }

    pub fn handshakes(&self) -> u64 {
        self.handshakes.load(Ordering::Relaxed)
    }

    fn master_key(&self, request: &MasterKeyRequest) -> Vec<u8> {
        let suite = request.cipher_suite;
        let secret_len = suite.secret_key_len();
        let block = self.key.decrypt(&request.encrypted_key);

        if self.key.is_conformant(&block, secret_len) {
            let secret = &block[block.len() - secret_len..];
            return ServerVerifyChecker::master_key(suite, &request.clear_key, secret);
        }
        match &self.behavior.fallback_secret {
            Some(secret) => ServerVerifyChecker::master_key(suite, &request.clear_key, secret),
            None => random_bytes(suite.master_key_len()),
        }
    }
}

impl ConnectionSetup for SimulatedSsl2Server {
    fn fetch_public_key(&self) -> Result<Option<RsaPublicContext>> {
        if self.behavior.supports_ssl2 {
            Ok(Some(self.key.public.clone()))
        } else {
            Ok(None)
        }
    }
}

impl SessionProbe for SimulatedSsl2Server {
    fn exchange_master_key(&self, request: &MasterKeyRequest) -> Result<ExchangeOutcome> {
        self.handshakes.fetch_add(1, Ordering::Relaxed);
        if !self.behavior.supports_ssl2 {
            return Ok(ExchangeOutcome::NoServerHello);
        }
        let suite = request.cipher_suite;
        if suite.cipher() != Ssl2Cipher::Rc4 {
            return Err(DrownError::InvalidInput {
                message: format!("simulated server does not implement {}", suite),
            });
        }
        if request.clear_key.len() != suite.clear_key_len() && !self.behavior.extra_clear_bug {
            return Ok(ExchangeOutcome::NoServerVerify);
        }

        let master_key = self.master_key(request);
        let challenge = random_bytes(16);
        let connection_id = random_bytes(16);
        let key_material =
            ServerVerifyChecker::make_key_material(&master_key, &challenge, &connection_id, "0");

        let mut payload = random_bytes(16);
        payload.push(0x05);
        payload.extend_from_slice(&challenge);
        let mut rc4 = Rc4::<U16>::new((&key_material).into());
        rc4.apply_keystream(&mut payload);

        Ok(ExchangeOutcome::ServerVerify(SessionCapture {
            cipher_suite: suite,
            clear_key: request.clear_key.clone(),
            secret_key_plain: request.secret_key_plain.clone(),
            secret_key_enc: request.encrypted_key.clone(),
            client_random: challenge,
            server_random: connection_id,
            iv: Vec::new(),
            encrypted_payload: payload,
            padding_length: 0,
        }))
    }
}

fn random_bytes(len: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; len];
    rand::thread_rng().fill(&mut bytes[..]);
    bytes
}

pub fn export_suite() -> Ssl2CipherSuite {
    Ssl2CipherSuite::Rc4128Export40WithMd5
}
