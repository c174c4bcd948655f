// Extra-clear attack arguments
// Copyright (C) 2025 Marc Rivero (@seifreed)
// Licensed under GPL-3.0

use crate::drown::TrimmerStrategy;
use crate::ssl2::Ssl2CipherSuite;
use clap::Args;
use std::path::PathBuf;

/// Attack tuning options
///
/// Values left unset fall back to the config file, then to the defaults.
#[derive(Args, Debug, Clone, Default)]
pub struct AttackArgs {
    /// File with captured TLS Premaster secrets (one hex string per line)
    #[arg(long = "premaster-secrets", value_name = "FILE")]
    pub premaster_secrets: Option<PathBuf>,

    /// SSLv2 cipher suite to offer (e.g. SSL_CK_RC4_128_EXPORT40_WITH_MD5, rc4-128-export40)
    #[arg(long = "cipher-suite", value_name = "NAME")]
    pub cipher_suite: Option<Ssl2CipherSuite>,

    /// Worker threads for parallel searches (0 = all cores)
    #[arg(long = "threads", value_name = "N")]
    pub threads: Option<usize>,

    /// Trimmers tried per Premaster secret in step 1
    #[arg(long = "max-trimmers", value_name = "N")]
    pub max_trimmers: Option<u64>,

    /// Trimmer pair generator (sieving, simple)
    #[arg(long = "trimmer-strategy", value_name = "STRATEGY")]
    pub trimmer_strategy: Option<TrimmerStrategy>,
}
