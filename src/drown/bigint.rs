// Big-integer helpers - unsigned byte conversions and modular inverse
//
// Every byte <-> integer conversion in the engine goes through this module so
// that values are always read as unsigned big-endian and written back at a
// fixed width.

use crate::constants::PKCS1_PREFIX;
use num_bigint::{BigInt, BigUint, Sign};
use num_integer::Integer;
use num_traits::{One, Zero};

/// Interpret `bytes` as an unsigned big-endian integer.
///
/// The bytes are read through a signed conversion with a zero byte
/// prepended, so a leading byte with the high bit set can never produce a
/// negative value.
pub fn ensure_positive(bytes: &[u8]) -> BigUint {
    let mut prefixed = Vec::with_capacity(bytes.len() + 1);
    prefixed.push(0u8);
    prefixed.extend_from_slice(bytes);

    // Non-negative by construction
    BigInt::from_signed_bytes_be(&prefixed)
        .to_biguint()
        .unwrap_or_default()
}

/// Encode `value` as exactly `len` big-endian bytes.
///
/// Shorter values are left-padded with zeros; longer values keep their `len`
/// least significant bytes.
pub fn to_fixed_bytes(value: &BigUint, len: usize) -> Vec<u8> {
    if value.is_zero() {
        return vec![0u8; len];
    }

    let raw = value.to_bytes_be();
    if raw.len() >= len {
        raw[raw.len() - len..].to_vec()
    } else {
        let mut out = vec![0u8; len - raw.len()];
        out.extend_from_slice(&raw);
        out
    }
}

/// Modular inverse of `a` modulo `m`, `None` when gcd(a, m) != 1
pub fn mod_inverse(a: &BigUint, m: &BigUint) -> Option<BigUint> {
    if m.is_zero() {
        return None;
    }
    if m.is_one() {
        return Some(BigUint::zero());
    }

    let a = BigInt::from_biguint(Sign::Plus, a % m);
    let m_signed = BigInt::from_biguint(Sign::Plus, m.clone());

    let egcd = a.extended_gcd(&m_signed);
    if !egcd.gcd.is_one() {
        return None;
    }

    egcd.x.mod_floor(&m_signed).to_biguint()
}

/// Number of bytes needed to hold `value`
pub fn byte_len(value: &BigUint) -> usize {
    ((value.bits() as usize) + 7) / 8
}

/// Whether a decrypted block starts with the PKCS#1 v1.5 type 2 prefix
pub fn has_pkcs_prefix(bytes: &[u8]) -> bool {
    bytes.len() >= PKCS1_PREFIX.len() && bytes[..PKCS1_PREFIX.len()] == PKCS1_PREFIX
}

/// `2^exponent`
pub fn pow2(exponent: usize) -> BigUint {
    BigUint::one() << exponent
}
