// Connection and timeout configuration arguments
// Copyright (C) 2025 Marc Rivero (@seifreed)
// Licensed under GPL-3.0

use clap::Args;

/// Connection and timeout options for the SSLv2 client
///
/// Every oracle query opens a fresh connection, so these bound the cost of
/// an unresponsive target per query.
#[derive(Args, Debug, Clone, Default)]
pub struct ConnectionArgs {
    /// Socket read/write timeout in seconds
    #[arg(long = "socket-timeout", value_name = "SECONDS")]
    pub socket_timeout: Option<u64>,

    /// Connection timeout in seconds (separate from socket timeout)
    #[arg(long = "connect-timeout", value_name = "SECONDS")]
    pub connect_timeout: Option<u64>,
}
