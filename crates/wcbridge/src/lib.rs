//! Wallet-side session bridge engine.
//!
//! A dApp hands the wallet a `wc:` connection uri; the wallet subscribes to
//! the uri's topic on the (untrusted) bridge relay and from then on every
//! frame is sealed with AES-256-CBC + HMAC-SHA256 under the shared session
//! key. Inbound JSON-RPC calls are dispatched through asynchronous approval
//! gates so a human decides every session and every signing operation,
//! without ever blocking the transport.
//!
//! The signing engine, the concrete socket and the approval UI are the
//! host's: they plug in via the [`WalletSigner`], [`Transport`] and
//! [`ApprovalGate`] traits.

#![cfg_attr(not(test), warn(unused_crate_dependencies))]

#[macro_use]
extern crate tracing;

pub mod approval;
pub mod controller;
pub mod session;
pub mod signer;
pub mod transport;

pub use approval::{
    ApprovalGate, RequestDecision, RequestMethod, SessionDecision, SessionProposal, SigningPrompt,
};
pub use controller::{BridgeController, BridgeError, BridgeEvent};
pub use session::{BridgeConfig, Network, PeerMeta, SessionState};
pub use signer::{SignerError, TransactionParams, WalletSigner};
pub use transport::{Transport, TransportError, TransportEvent};

pub use wcbridge_protocol as protocol;
pub use wcbridge_rpc as rpc;
