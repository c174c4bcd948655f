// Capabilities consumed by the attack engine
//
// The engine never opens sockets itself. A live SSLv2 client (or a simulated
// server in tests) provides these traits.

use super::rsa::RsaPublicContext;
use super::server_verify::SessionCapture;
use crate::ssl2::Ssl2CipherSuite;
use crate::Result;

/// PKCS#1 v1.5 padding oracle
///
/// Implementations must be callable concurrently from the multiplier search
/// workers.
pub trait Pkcs1Oracle: Send + Sync {
    /// Whether `ciphertext` decrypts to a PKCS#1 v1.5 conformant block
    fn check_pkcs_conformity(&self, ciphertext: &[u8]) -> Result<bool>;

    /// Recover the secret key byte that follows `known_prefix` in the
    /// plaintext of `ciphertext`
    fn brute_force_key_byte(&self, ciphertext: &[u8], known_prefix: &[u8]) -> Result<u8>;
}

/// Initial probe that yields the target's RSA public key
pub trait ConnectionSetup {
    /// `Ok(None)` when the handshake completed but the server does not
    /// speak SSLv2; an error when the probe itself did not complete.
    fn fetch_public_key(&self) -> Result<Option<RsaPublicContext>>;
}

/// CLIENT-MASTER-KEY contents chosen by the attacker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MasterKeyRequest {
    pub cipher_suite: Ssl2CipherSuite,
    pub clear_key: Vec<u8>,
    pub encrypted_key: Vec<u8>,
    /// Plaintext of `encrypted_key` when the client produced it itself
    pub secret_key_plain: Vec<u8>,
}

impl MasterKeyRequest {
    /// Request with an all-zero clear key of `clear_len` bytes
    pub fn with_zero_clear_key(
        cipher_suite: Ssl2CipherSuite,
        clear_len: usize,
        encrypted_key: &[u8],
    ) -> Self {
        Self {
            cipher_suite,
            clear_key: vec![0u8; clear_len],
            encrypted_key: encrypted_key.to_vec(),
            secret_key_plain: Vec::new(),
        }
    }
}

/// Result of one SSLv2 handshake up to SERVER-VERIFY
#[derive(Debug, Clone)]
pub enum ExchangeOutcome {
    /// The server did not answer CLIENT-HELLO with SERVER-HELLO
    NoServerHello,
    /// SERVER-HELLO arrived but no SERVER-VERIFY followed CLIENT-MASTER-KEY
    NoServerVerify,
    ServerVerify(SessionCapture),
}

/// One full SSLv2 handshake with a chosen CLIENT-MASTER-KEY
pub trait SessionProbe: Send + Sync {
    fn exchange_master_key(&self, request: &MasterKeyRequest) -> Result<ExchangeOutcome>;
}

impl<T: SessionProbe + ?Sized> SessionProbe for &T {
    fn exchange_master_key(&self, request: &MasterKeyRequest) -> Result<ExchangeOutcome> {
        (**self).exchange_master_key(request)
    }
}
