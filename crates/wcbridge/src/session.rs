//! Session data model: configuration, life-cycle states and the payload
//! shapes exchanged during session establishment and teardown.

use alloy_primitives::{Address, ChainId};
use serde::{Deserialize, Serialize};

/// Which chain the wallet exposes to the counterparty. Fixed at
/// construction; a counterparty-proposed chain id never overrides it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Network {
    Mainnet,
    Testnet,
}

impl Network {
    pub const fn chain_id(self) -> ChainId {
        match self {
            Self::Mainnet => 1,
            Self::Testnet => 5,
        }
    }
}

/// Caller-supplied configuration. No env vars, no files.
#[derive(Clone, Debug)]
pub struct BridgeConfig {
    pub network: Network,
    /// Metadata the wallet declares about itself in the session response.
    pub client_meta: PeerMeta,
}

/// Metadata either side declares about itself.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerMeta {
    pub name: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub icons: Vec<String>,
}

/// Life cycle of one bridge session.
///
/// `Subscribed` is transient: the controller enters it when the topic
/// subscription is sent and immediately settles in
/// `AwaitingSessionRequest` (there is no distinct wire event between the
/// two). `Closed` is terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Connecting,
    Subscribed,
    AwaitingSessionRequest,
    Active,
    Closed,
}

/// `params[0]` of an inbound `wc_sessionRequest`.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRequestParams {
    pub peer_id: String,
    pub peer_meta: PeerMeta,
    #[serde(default)]
    pub chain_id: Option<ChainId>,
}

/// `result` of the session-request response, for approval and rejection
/// alike: rejection reuses this response shape with `approved: false`
/// instead of the error envelope (counterparty dispatchers expect it).
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionParams {
    pub peer_id: String,
    pub peer_meta: PeerMeta,
    pub approved: bool,
    pub chain_id: ChainId,
    pub accounts: Vec<Address>,
}

/// `params[0]` of the `wc_sessionUpdate` sent on disconnect.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUpdateParams {
    pub approved: bool,
    pub chain_id: Option<ChainId>,
    pub accounts: Option<Vec<Address>>,
}

impl SessionUpdateParams {
    /// The payload announcing session closure.
    pub const fn closed() -> Self {
        Self { approved: false, chain_id: None, accounts: None }
    }
}
