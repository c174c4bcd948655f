// SSLv2 messages - Record framing and the handshake messages DROWN needs

use super::Ssl2CipherSuite;
use crate::constants::{
    SSL2_CT_X509_CERTIFICATE, SSL2_MAX_RECORD_LENGTH_2_BYTE_HEADER,
    SSL2_MAX_RECORD_LENGTH_3_BYTE_HEADER, SSL2_MT_CLIENT_HELLO, SSL2_MT_CLIENT_MASTER_KEY,
    SSL2_MT_SERVER_HELLO, SSL2_VERSION,
};
use crate::drown::RsaPublicContext;
use crate::error::DrownError;
use crate::Result;
use std::io::{Read, Write};
use x509_parser::prelude::*;

/// One SSLv2 record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ssl2Record {
    pub body: Vec<u8>,
    /// Padding byte count from a 3-byte header, 0 for 2-byte headers
    pub padding_length: u8,
}

impl Ssl2Record {
    /// Encode with a 2-byte header (no padding)
    pub fn encode(body: &[u8]) -> Result<Vec<u8>> {
        if body.len() > SSL2_MAX_RECORD_LENGTH_2_BYTE_HEADER {
            return Err(DrownError::InvalidInput {
                message: format!("SSLv2 record of {} bytes is too long", body.len()),
            });
        }
        let len = body.len() as u16;
        let mut record = Vec::with_capacity(body.len() + 2);
        record.push(0x80 | (len >> 8) as u8);
        record.push(len as u8);
        record.extend_from_slice(body);
        Ok(record)
    }

    /// Encode with a 3-byte header carrying a padding length
    pub fn encode_padded(body: &[u8], padding_length: u8) -> Result<Vec<u8>> {
        if body.len() > SSL2_MAX_RECORD_LENGTH_3_BYTE_HEADER {
            return Err(DrownError::InvalidInput {
                message: format!("padded SSLv2 record of {} bytes is too long", body.len()),
            });
        }
        let len = body.len() as u16;
        let mut record = Vec::with_capacity(body.len() + 3);
        record.push((len >> 8) as u8 & 0x3F);
        record.push(len as u8);
        record.push(padding_length);
        record.extend_from_slice(body);
        Ok(record)
    }

    /// Read one record, handling both header forms
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        let mut header = [0u8; 2];
        reader.read_exact(&mut header)?;

        let (length, padding_length) = if header[0] & 0x80 != 0 {
            ((((header[0] & 0x7F) as usize) << 8) | header[1] as usize, 0)
        } else {
            let mut padding = [0u8; 1];
            reader.read_exact(&mut padding)?;
            (
                (((header[0] & 0x3F) as usize) << 8) | header[1] as usize,
                padding[0],
            )
        };

        let mut body = vec![0u8; length];
        reader.read_exact(&mut body)?;
        Ok(Self {
            body,
            padding_length,
        })
    }

    pub fn write_to<W: Write>(writer: &mut W, body: &[u8]) -> Result<()> {
        writer.write_all(&Self::encode(body)?)?;
        writer.flush()?;
        Ok(())
    }

    /// Message type byte of an unencrypted record
    pub fn message_type(&self) -> Option<u8> {
        self.body.first().copied()
    }
}

/// CLIENT-HELLO offering a single cipher kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientHello {
    pub cipher_suites: Vec<Ssl2CipherSuite>,
    pub challenge: Vec<u8>,
}

impl ClientHello {
    pub fn new(cipher_suite: Ssl2CipherSuite, challenge: Vec<u8>) -> Self {
        Self {
            cipher_suites: vec![cipher_suite],
            challenge,
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let specs_len = self.cipher_suites.len() * 3;
        let mut body = Vec::with_capacity(9 + specs_len + self.challenge.len());
        body.push(SSL2_MT_CLIENT_HELLO);
        body.extend_from_slice(&SSL2_VERSION.to_be_bytes());
        body.extend_from_slice(&(specs_len as u16).to_be_bytes());
        // No session id
        body.extend_from_slice(&0u16.to_be_bytes());
        body.extend_from_slice(&(self.challenge.len() as u16).to_be_bytes());
        for suite in &self.cipher_suites {
            body.extend_from_slice(&suite.code_bytes());
        }
        body.extend_from_slice(&self.challenge);
        body
    }
}

/// Parsed SERVER-HELLO
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerHello {
    pub session_id_hit: bool,
    pub certificate_type: u8,
    pub version: u16,
    pub certificate: Vec<u8>,
    /// Raw 3-byte cipher kinds; unknown kinds are kept
    pub cipher_specs: Vec<[u8; 3]>,
    pub connection_id: Vec<u8>,
}

impl ServerHello {
    /// Parse a SERVER-HELLO record body. `Ok(None)` for any other message.
    pub fn parse(body: &[u8]) -> Result<Option<Self>> {
        if body.first() != Some(&SSL2_MT_SERVER_HELLO) {
            return Ok(None);
        }
        if body.len() < 11 {
            return Err(DrownError::InvalidHandshake {
                details: format!("SERVER-HELLO too short: {} bytes", body.len()),
            });
        }

        let read_u16 = |offset: usize| u16::from_be_bytes([body[offset], body[offset + 1]]);
        let session_id_hit = body[1] != 0;
        let certificate_type = body[2];
        let version = read_u16(3);
        let certificate_len = read_u16(5) as usize;
        let specs_len = read_u16(7) as usize;
        let connection_id_len = read_u16(9) as usize;

        if specs_len % 3 != 0 {
            return Err(DrownError::InvalidHandshake {
                details: format!("cipher specs length {} is not a multiple of 3", specs_len),
            });
        }
        let expected = 11 + certificate_len + specs_len + connection_id_len;
        if body.len() < expected {
            return Err(DrownError::InvalidHandshake {
                details: format!(
                    "SERVER-HELLO truncated: {} of {} bytes",
                    body.len(),
                    expected
                ),
            });
        }

        let mut offset = 11;
        let certificate = body[offset..offset + certificate_len].to_vec();
        offset += certificate_len;
        let cipher_specs = body[offset..offset + specs_len]
            .chunks_exact(3)
            .map(|spec| [spec[0], spec[1], spec[2]])
            .collect();
        offset += specs_len;
        let connection_id = body[offset..offset + connection_id_len].to_vec();

        Ok(Some(Self {
            session_id_hit,
            certificate_type,
            version,
            certificate,
            cipher_specs,
            connection_id,
        }))
    }

    pub fn supports(&self, suite: Ssl2CipherSuite) -> bool {
        self.cipher_specs.contains(&suite.code_bytes())
    }

    /// RSA public key of the server certificate
    pub fn public_key(&self) -> Result<RsaPublicContext> {
        if self.certificate_type != SSL2_CT_X509_CERTIFICATE {
            return Err(DrownError::InvalidHandshake {
                details: format!("unsupported certificate type {}", self.certificate_type),
            });
        }

        let (_, cert) = X509Certificate::from_der(&self.certificate).map_err(|e| {
            DrownError::ParseError {
                message: format!("Failed to parse server certificate: {}", e),
            }
        })?;

        match cert.public_key().parsed() {
            Ok(x509_parser::public_key::PublicKey::RSA(rsa)) => {
                RsaPublicContext::from_be_bytes(rsa.modulus, rsa.exponent)
            }
            Ok(_) => Err(DrownError::InvalidHandshake {
                details: "server certificate does not carry an RSA key".to_string(),
            }),
            Err(e) => Err(DrownError::ParseError {
                message: format!("Failed to parse server public key: {}", e),
            }),
        }
    }
}

/// CLIENT-MASTER-KEY
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientMasterKey {
    pub cipher_suite: Ssl2CipherSuite,
    pub clear_key: Vec<u8>,
    pub encrypted_key: Vec<u8>,
    /// IV for block ciphers, empty otherwise
    pub key_arg: Vec<u8>,
}

impl ClientMasterKey {
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut body = Vec::with_capacity(
            10 + self.clear_key.len() + self.encrypted_key.len() + self.key_arg.len(),
        );
        body.push(SSL2_MT_CLIENT_MASTER_KEY);
        body.extend_from_slice(&self.cipher_suite.code_bytes());
        body.extend_from_slice(&(self.clear_key.len() as u16).to_be_bytes());
        body.extend_from_slice(&(self.encrypted_key.len() as u16).to_be_bytes());
        body.extend_from_slice(&(self.key_arg.len() as u16).to_be_bytes());
        body.extend_from_slice(&self.clear_key);
        body.extend_from_slice(&self.encrypted_key);
        body.extend_from_slice(&self.key_arg);
        body
    }
}
