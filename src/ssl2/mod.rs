// SSLv2 protocol support
//
// Only what DROWN needs: the RSA cipher kinds, the handshake up to
// SERVER-VERIFY, and a client implementing the engine's capabilities.

pub mod cipher_suite;
pub mod client;
pub mod messages;

pub use cipher_suite::{Ssl2Cipher, Ssl2CipherSuite};
pub use client::Ssl2Client;
pub use messages::{ClientHello, ClientMasterKey, ServerHello, Ssl2Record};
