//! Human-in-the-loop consent contracts.
//!
//! The controller invokes these from spawned tasks, so an implementation
//! may take arbitrarily long (a user staring at a prompt) without stalling
//! inbound frame processing. Each invocation is resolved exactly once.

use crate::session::PeerMeta;
use alloy_primitives::{Address, ChainId};
use async_trait::async_trait;

/// Classification of a gated signing request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestMethod {
    Sign,
    SignTypedData,
    SendTransaction,
}

impl RequestMethod {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sign => "eth_sign",
            Self::SignTypedData => "eth_signTypedData",
            Self::SendTransaction => "eth_sendTransaction",
        }
    }
}

/// Everything a host UI needs to render a session consent prompt.
#[derive(Clone, Debug)]
pub struct SessionProposal {
    pub peer_id: String,
    pub peer_meta: PeerMeta,
    /// Chain id the counterparty proposed, display only.
    pub chain_id: Option<ChainId>,
}

/// Outcome of a session consent prompt. Approval carries the accounts the
/// wallet agrees to expose.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionDecision {
    Approved { accounts: Vec<Address> },
    Rejected,
}

/// Everything a host UI needs to render a signing consent prompt: the
/// method tag plus ordered human-readable `(label, value)` fields.
#[derive(Clone, Debug)]
pub struct SigningPrompt {
    pub method: RequestMethod,
    pub fields: Vec<(&'static str, String)>,
}

/// Outcome of a signing consent prompt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestDecision {
    Approved,
    Rejected,
}

/// Host-supplied consent checkpoint.
#[async_trait]
pub trait ApprovalGate: Send + Sync + 'static {
    /// Asks whether the proposed session may be established.
    async fn approve_session(&self, proposal: SessionProposal) -> SessionDecision;

    /// Asks whether a single signing request may proceed. Multiple prompts
    /// may be outstanding concurrently for the same session.
    async fn approve_request(&self, prompt: SigningPrompt) -> RequestDecision;
}
