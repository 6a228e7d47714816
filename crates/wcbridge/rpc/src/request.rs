use rand::Rng;
use serde::{Deserialize, Serialize};
use std::{
    sync::{
        OnceLock,
        atomic::{AtomicU64, Ordering},
    },
    time::{SystemTime, UNIX_EPOCH},
};

/// The `jsonrpc` protocol version literal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Version {
    #[default]
    #[serde(rename = "2.0")]
    V2,
}

/// A single JSON-RPC call received from or sent to the counterparty.
///
/// `params` elements are kept as [`serde_json::Value`] so that nested
/// objects and arrays pass through without re-escaping: a dApp's typed-data
/// blob is re-emitted as the exact JSON it arrived as, never as a
/// string-encoded string.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RpcRequest {
    pub id: u64,
    pub jsonrpc: Version,
    /// Absent on malformed counterparty input; the dispatcher checks for it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default)]
    pub params: Vec<serde_json::Value>,
}

impl RpcRequest {
    /// Creates an outbound request with a freshly generated id.
    pub fn new(method: impl Into<String>, params: Vec<serde_json::Value>) -> Self {
        Self { id: next_id(), jsonrpc: Version::V2, method: Some(method.into()), params }
    }
}

/// Returns the next outbound request id.
///
/// Seeded once from the wall clock (unix millis scaled by 1000 plus a random
/// sub-millisecond component) and incremented atomically afterwards, so ids
/// remain unique even when generated in a tight loop.
pub fn next_id() -> u64 {
    static NEXT: OnceLock<AtomicU64> = OnceLock::new();

    let next = NEXT.get_or_init(|| {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();
        AtomicU64::new(millis * 1000 + rand::rng().random_range(0..1000))
    });
    next.fetch_add(1, Ordering::Relaxed)
}
