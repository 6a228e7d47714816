//! Wire-level building blocks of the session bridge protocol: the
//! authenticated-encryption envelope, the pub/sub socket framing and the
//! `wc:` connection-uri grammar.

#![cfg_attr(not(test), warn(unused_crate_dependencies))]

pub mod crypto;
pub mod error;
pub mod socket;
pub mod uri;

pub use crypto::{EncryptedPayload, SessionKey, open, seal};
pub use error::ProtocolError;
pub use socket::{MessageType, SocketMessage};
pub use uri::WcUri;
