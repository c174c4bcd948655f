// drownrun - DROWN assessment and Special DROWN recovery engine
// Copyright (C) 2025 Marc Rivero (@seifreed)
// Licensed under GPL-3.0

//! SSLv2 Protocol Constants
//!
//! Centralized constants for the SSLv2 handshake messages and the byte
//! lengths the attack engine depends on.
//!
//! Reference: draft-hickman-netscape-ssl-00 (The SSL Protocol, version 2)

use std::time::Duration;

// =============================================================================
// SSLv2 Message Types
// =============================================================================

/// SSLv2 message type: ERROR (0x00)
pub const SSL2_MT_ERROR: u8 = 0x00;

/// SSLv2 message type: CLIENT-HELLO (0x01)
pub const SSL2_MT_CLIENT_HELLO: u8 = 0x01;

/// SSLv2 message type: CLIENT-MASTER-KEY (0x02)
///
/// Carries the clear part of the master key, the RSA-encrypted secret part
/// and the key argument (IV) for block ciphers.
pub const SSL2_MT_CLIENT_MASTER_KEY: u8 = 0x02;

/// SSLv2 message type: SERVER-HELLO (0x04)
pub const SSL2_MT_SERVER_HELLO: u8 = 0x04;

/// SSLv2 message type: SERVER-VERIFY (0x05)
///
/// Encrypted under the server write key; its plaintext is the message type
/// followed by the client challenge. This is the message the Special DROWN
/// oracles decrypt locally.
pub const SSL2_MT_SERVER_VERIFY: u8 = 0x05;

// =============================================================================
// SSLv2 Protocol Values
// =============================================================================

/// Protocol version for SSL 2.0
pub const SSL2_VERSION: u16 = 0x0002;

/// Certificate type: X.509
pub const SSL2_CT_X509_CERTIFICATE: u8 = 0x01;

/// Length of the client challenge sent in CLIENT-HELLO
pub const SSL2_CHALLENGE_LENGTH: usize = 16;

/// Length of the MD5 MAC prepended to every encrypted SSLv2 record
pub const SSL2_MAC_LENGTH: usize = 16;

/// Length of the message type byte inside a record
pub const SSL2_MESSAGE_TYPE_LENGTH: usize = 1;

/// Maximum SSLv2 record length with a 2-byte header
pub const SSL2_MAX_RECORD_LENGTH_2_BYTE_HEADER: usize = 0x7FFF;

/// Maximum SSLv2 record length with a 3-byte header
pub const SSL2_MAX_RECORD_LENGTH_3_BYTE_HEADER: usize = 0x3FFF;

// =============================================================================
// PKCS#1 v1.5
// =============================================================================

/// Leading bytes of a PKCS#1 v1.5 encryption block (block type 2)
pub const PKCS1_PREFIX: [u8; 2] = [0x00, 0x02];

/// Minimum number of non-zero padding bytes in a PKCS#1 v1.5 block
pub const PKCS1_MIN_PADDING_LENGTH: usize = 8;

// =============================================================================
// Attack defaults
// =============================================================================

/// Trimmers tried per captured Premaster secret in Step 1
pub const DEFAULT_MAX_TRIMMER_COUNT: u64 = 100;

/// Per-round bound on the Step 2 multiplier magnitude (as a power of two)
pub const DEFAULT_MAX_MULTIPLIER_BITS: u32 = 30;

/// Retries for a per-byte brute-force query without SERVER-VERIFY
pub const DEFAULT_KEY_BYTE_RETRIES: u32 = 5;

/// Oracle queries between progress log lines
pub const ORACLE_QUERY_LOG_INTERVAL: u64 = 1000;

/// Number of secret key bytes brute-forced by the leaky export benchmark
pub const LEAKY_EXPORT_BENCHMARK_BYTES: usize = 3;

// =============================================================================
// Timeouts
// =============================================================================

/// Default TCP connect timeout for the SSLv2 client
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default socket read/write timeout for the SSLv2 client
pub const DEFAULT_SOCKET_TIMEOUT: Duration = Duration::from_secs(5);

/// Progress poll interval of the leaky export analysis
pub const DEFAULT_LEAKY_POLL_INTERVAL: Duration = Duration::from_secs(60);
