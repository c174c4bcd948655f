// SSLv2 cipher suites - Cipher kinds and their key layout

use crate::error::DrownError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// SSLv2 cipher kind
///
/// Only the RSA key-exchange kinds relevant to DROWN are listed. Each kind
/// fixes how many master key bytes are sent in the clear and how many are
/// RSA-encrypted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Ssl2CipherSuite {
    #[serde(rename = "SSL_CK_RC4_128_WITH_MD5")]
    Rc4128WithMd5,
    #[serde(rename = "SSL_CK_RC4_128_EXPORT40_WITH_MD5")]
    Rc4128Export40WithMd5,
    #[serde(rename = "SSL_CK_RC2_128_CBC_WITH_MD5")]
    Rc2128CbcWithMd5,
    #[serde(rename = "SSL_CK_RC2_128_CBC_EXPORT40_WITH_MD5")]
    Rc2128CbcExport40WithMd5,
    #[serde(rename = "SSL_CK_DES_64_CBC_WITH_MD5")]
    Des64CbcWithMd5,
    #[serde(rename = "SSL_CK_DES_192_EDE3_CBC_WITH_MD5")]
    Des192Ede3CbcWithMd5,
}

/// Symmetric algorithm behind a cipher kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ssl2Cipher {
    Rc4,
    Rc2Cbc,
    DesCbc,
    TripleDesCbc,
}

impl Ssl2CipherSuite {
    pub const ALL: [Ssl2CipherSuite; 6] = [
        Ssl2CipherSuite::Rc4128WithMd5,
        Ssl2CipherSuite::Rc4128Export40WithMd5,
        Ssl2CipherSuite::Rc2128CbcWithMd5,
        Ssl2CipherSuite::Rc2128CbcExport40WithMd5,
        Ssl2CipherSuite::Des64CbcWithMd5,
        Ssl2CipherSuite::Des192Ede3CbcWithMd5,
    ];

    /// 3-byte cipher kind as sent in CLIENT-HELLO / CLIENT-MASTER-KEY
    pub fn code(&self) -> u32 {
        match self {
            Ssl2CipherSuite::Rc4128WithMd5 => 0x010080,
            Ssl2CipherSuite::Rc4128Export40WithMd5 => 0x020080,
            Ssl2CipherSuite::Rc2128CbcWithMd5 => 0x030080,
            Ssl2CipherSuite::Rc2128CbcExport40WithMd5 => 0x040080,
            Ssl2CipherSuite::Des64CbcWithMd5 => 0x060040,
            Ssl2CipherSuite::Des192Ede3CbcWithMd5 => 0x0700C0,
        }
    }

    pub fn code_bytes(&self) -> [u8; 3] {
        let code = self.code();
        [(code >> 16) as u8, (code >> 8) as u8, code as u8]
    }

    pub fn from_code(code: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|suite| suite.code() == code)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Ssl2CipherSuite::Rc4128WithMd5 => "SSL_CK_RC4_128_WITH_MD5",
            Ssl2CipherSuite::Rc4128Export40WithMd5 => "SSL_CK_RC4_128_EXPORT40_WITH_MD5",
            Ssl2CipherSuite::Rc2128CbcWithMd5 => "SSL_CK_RC2_128_CBC_WITH_MD5",
            Ssl2CipherSuite::Rc2128CbcExport40WithMd5 => "SSL_CK_RC2_128_CBC_EXPORT40_WITH_MD5",
            Ssl2CipherSuite::Des64CbcWithMd5 => "SSL_CK_DES_64_CBC_WITH_MD5",
            Ssl2CipherSuite::Des192Ede3CbcWithMd5 => "SSL_CK_DES_192_EDE3_CBC_WITH_MD5",
        }
    }

    pub fn cipher(&self) -> Ssl2Cipher {
        match self {
            Ssl2CipherSuite::Rc4128WithMd5 | Ssl2CipherSuite::Rc4128Export40WithMd5 => {
                Ssl2Cipher::Rc4
            }
            Ssl2CipherSuite::Rc2128CbcWithMd5 | Ssl2CipherSuite::Rc2128CbcExport40WithMd5 => {
                Ssl2Cipher::Rc2Cbc
            }
            Ssl2CipherSuite::Des64CbcWithMd5 => Ssl2Cipher::DesCbc,
            Ssl2CipherSuite::Des192Ede3CbcWithMd5 => Ssl2Cipher::TripleDesCbc,
        }
    }

    /// Master key bytes sent in the clear
    pub fn clear_key_len(&self) -> usize {
        if self.is_export() {
            11
        } else {
            0
        }
    }

    /// Master key bytes sent RSA-encrypted
    pub fn secret_key_len(&self) -> usize {
        match self {
            Ssl2CipherSuite::Rc4128Export40WithMd5
            | Ssl2CipherSuite::Rc2128CbcExport40WithMd5 => 5,
            Ssl2CipherSuite::Des64CbcWithMd5 => 8,
            Ssl2CipherSuite::Des192Ede3CbcWithMd5 => 24,
            Ssl2CipherSuite::Rc4128WithMd5 | Ssl2CipherSuite::Rc2128CbcWithMd5 => 16,
        }
    }

    /// Full master key length (clear + secret)
    pub fn master_key_len(&self) -> usize {
        self.clear_key_len() + self.secret_key_len()
    }

    /// Block size in bytes, `None` for stream ciphers
    pub fn block_size(&self) -> Option<usize> {
        match self.cipher() {
            Ssl2Cipher::Rc4 => None,
            _ => Some(8),
        }
    }

    pub fn is_block_cipher(&self) -> bool {
        self.block_size().is_some()
    }

    pub fn is_export(&self) -> bool {
        matches!(
            self,
            Ssl2CipherSuite::Rc4128Export40WithMd5 | Ssl2CipherSuite::Rc2128CbcExport40WithMd5
        )
    }
}

impl Default for Ssl2CipherSuite {
    fn default() -> Self {
        Ssl2CipherSuite::Rc4128WithMd5
    }
}

impl fmt::Display for Ssl2CipherSuite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Ssl2CipherSuite {
    type Err = DrownError;

    /// Accepts the full `SSL_CK_*` name, the name without prefix and suffix
    /// (`RC4_128`, `des-192-ede3-cbc`) or a hex code (`0x010080`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();

        if let Some(hex) = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
        {
            let code = u32::from_str_radix(hex, 16).map_err(|_| DrownError::InvalidInput {
                message: format!("Invalid SSLv2 cipher code: {}", s),
            })?;
            return Self::from_code(code).ok_or_else(|| DrownError::InvalidInput {
                message: format!("Unsupported SSLv2 cipher code: {}", s),
            });
        }

        let normalized = trimmed.to_ascii_uppercase().replace('-', "_");
        let short = normalized
            .strip_prefix("SSL_CK_")
            .unwrap_or(&normalized)
            .trim_end_matches("_WITH_MD5");

        Self::ALL
            .into_iter()
            .find(|suite| {
                suite
                    .name()
                    .strip_prefix("SSL_CK_")
                    .and_then(|n| n.strip_suffix("_WITH_MD5"))
                    == Some(short)
            })
            .ok_or_else(|| DrownError::InvalidInput {
                message: format!("Unknown SSLv2 cipher suite: {}", s),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_layout() {
        for suite in Ssl2CipherSuite::ALL {
            let expected = match suite {
                Ssl2CipherSuite::Des64CbcWithMd5 => 8,
                Ssl2CipherSuite::Des192Ede3CbcWithMd5 => 24,
                _ => 16,
            };
            assert_eq!(suite.master_key_len(), expected, "{}", suite);
        }
        assert_eq!(Ssl2CipherSuite::Rc4128Export40WithMd5.clear_key_len(), 11);
        assert_eq!(Ssl2CipherSuite::Rc4128Export40WithMd5.secret_key_len(), 5);
    }

    #[test]
    fn test_code_bytes() {
        assert_eq!(
            Ssl2CipherSuite::Des192Ede3CbcWithMd5.code_bytes(),
            [0x07, 0x00, 0xC0]
        );
        assert_eq!(
            Ssl2CipherSuite::from_code(0x020080),
            Some(Ssl2CipherSuite::Rc4128Export40WithMd5)
        );
        assert_eq!(Ssl2CipherSuite::from_code(0x050080), None);
    }

    #[test]
    fn test_parse_names() {
        assert_eq!(
            "SSL_CK_RC2_128_CBC_WITH_MD5".parse::<Ssl2CipherSuite>().unwrap(),
            Ssl2CipherSuite::Rc2128CbcWithMd5
        );
        assert_eq!(
            "rc4-128-export40".parse::<Ssl2CipherSuite>().unwrap(),
            Ssl2CipherSuite::Rc4128Export40WithMd5
        );
        assert_eq!(
            "0x060040".parse::<Ssl2CipherSuite>().unwrap(),
            Ssl2CipherSuite::Des64CbcWithMd5
        );
        assert!("AES_128".parse::<Ssl2CipherSuite>().is_err());
    }

    #[test]
    fn test_serde_uses_protocol_names() {
        let json = serde_json::to_string(&Ssl2CipherSuite::Des64CbcWithMd5).unwrap();
        assert_eq!(json, "\"SSL_CK_DES_64_CBC_WITH_MD5\"");
        let back: Ssl2CipherSuite = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Ssl2CipherSuite::Des64CbcWithMd5);
    }

    #[test]
    fn test_block_sizes() {
        assert!(!Ssl2CipherSuite::Rc4128WithMd5.is_block_cipher());
        assert_eq!(Ssl2CipherSuite::Rc2128CbcWithMd5.block_size(), Some(8));
        assert_eq!(Ssl2CipherSuite::Des192Ede3CbcWithMd5.block_size(), Some(8));
    }
}
