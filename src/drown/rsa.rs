// RSA public context - the target's public key as seen in SERVER-HELLO

use super::bigint::{byte_len, ensure_positive, to_fixed_bytes};
use crate::constants::PKCS1_MIN_PADDING_LENGTH;
use crate::error::DrownError;
use crate::Result;
use num_bigint::BigUint;
use num_traits::Zero;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// RSA public key of the attacked server.
///
/// Captured once during the initial probe and read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RsaPublicContext {
    pub modulus: BigUint,
    pub exponent: BigUint,
}

impl RsaPublicContext {
    pub fn new(modulus: BigUint, exponent: BigUint) -> Result<Self> {
        if modulus.is_zero() || exponent.is_zero() {
            return Err(DrownError::InvalidInput {
                message: "RSA modulus and exponent must be non-zero".to_string(),
            });
        }
        Ok(Self { modulus, exponent })
    }

    /// Build from big-endian byte strings (as found in a certificate)
    pub fn from_be_bytes(modulus: &[u8], exponent: &[u8]) -> Result<Self> {
        Self::new(ensure_positive(modulus), ensure_positive(exponent))
    }

    pub fn bits(&self) -> u64 {
        self.modulus.bits()
    }

    /// Bytes needed to encode any value modulo N
    pub fn byte_len(&self) -> usize {
        byte_len(&self.modulus)
    }

    /// Length of a PKCS#1 block as used by the recovery arithmetic
    /// (whole bytes of the modulus bit length)
    pub fn pkcs_len(&self) -> usize {
        (self.bits() / 8) as usize
    }

    /// Textbook RSA: `m^e mod N`
    pub fn encrypt_raw(&self, message: &BigUint) -> BigUint {
        message.modpow(&self.exponent, &self.modulus)
    }

    /// Encode a value as a ciphertext byte string of the modulus length
    pub fn encode(&self, value: &BigUint) -> Vec<u8> {
        to_fixed_bytes(value, self.byte_len())
    }

    /// PKCS#1 v1.5 (block type 2) encryption of `message`
    pub fn encrypt_pkcs1<R: Rng + ?Sized>(&self, message: &[u8], rng: &mut R) -> Result<Vec<u8>> {
        let k = self.byte_len();
        if message.len() + 3 + PKCS1_MIN_PADDING_LENGTH > k {
            return Err(DrownError::InvalidInput {
                message: format!(
                    "Message of {} bytes does not fit a {}-byte PKCS#1 block",
                    message.len(),
                    k
                ),
            });
        }

        let padding_len = k - 3 - message.len();
        let mut block = Vec::with_capacity(k);
        block.push(0x00);
        block.push(0x02);
        for _ in 0..padding_len {
            block.push(rng.gen_range(1..=255u8));
        }
        block.push(0x00);
        block.extend_from_slice(message);

        let c = self.encrypt_raw(&ensure_positive(&block));
        Ok(self.encode(&c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    // 128-bit test key: p * q with d = e^-1 mod phi
    fn test_key() -> (RsaPublicContext, BigUint) {
        let n = BigUint::parse_bytes(b"ce69b1bef3c9b78c12cfb06d72dec059", 16).unwrap();
        let d = BigUint::parse_bytes(b"7bb968fc8f7e82d0935182615b48fd01", 16).unwrap();
        (RsaPublicContext::new(n, BigUint::from(65537u32)).unwrap(), d)
    }

    #[test]
    fn test_lengths() {
        let (key, _) = test_key();
        assert_eq!(key.bits(), 128);
        assert_eq!(key.byte_len(), 16);
        assert_eq!(key.pkcs_len(), 16);
    }

    #[test]
    fn test_pkcs1_encrypt_decrypts_to_padded_block() {
        let (key, d) = test_key();
        let mut rng = StdRng::seed_from_u64(1);
        let ct = key.encrypt_pkcs1(&[0xAA, 0xBB], &mut rng).unwrap();
        assert_eq!(ct.len(), 16);

        let m = ensure_positive(&ct).modpow(&d, &key.modulus);
        let block = key.encode(&m);
        assert_eq!(&block[..2], &[0x00, 0x02]);
        assert_eq!(block[13], 0x00);
        assert_eq!(&block[14..], &[0xAA, 0xBB]);
        assert!(block[2..13].iter().all(|b| *b != 0));
    }

    #[test]
    fn test_pkcs1_rejects_long_message() {
        let (key, _) = test_key();
        let mut rng = StdRng::seed_from_u64(1);
        assert!(key.encrypt_pkcs1(&[0u8; 6], &mut rng).is_err());
    }

    #[test]
    fn test_rejects_zero_modulus() {
        assert!(RsaPublicContext::new(BigUint::zero(), BigUint::from(3u32)).is_err());
    }
}
