use crate::{error::RpcError, request::Version};
use serde::{Deserialize, Serialize};

/// Response to a single rpc call
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RpcResponse {
    pub id: u64,
    pub jsonrpc: Version,
    #[serde(flatten)]
    pub outcome: ResponseOutcome,
}

impl RpcResponse {
    /// Creates a response carrying the given outcome, echoing the request id.
    pub fn new(id: u64, outcome: impl Into<ResponseOutcome>) -> Self {
        Self { id, jsonrpc: Version::V2, outcome: outcome.into() }
    }

    /// Creates a success response whose `result` is emitted as raw JSON.
    pub fn success(id: u64, result: serde_json::Value) -> Self {
        Self::new(id, ResponseOutcome::Success(result))
    }

    /// Creates an error response for the given request id.
    pub fn error(id: u64, error: RpcError) -> Self {
        Self::new(id, ResponseOutcome::Error(error))
    }
}

/// Represents the result of a call, either success or error
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ResponseOutcome {
    #[serde(rename = "result")]
    Success(serde_json::Value),
    #[serde(rename = "error")]
    Error(RpcError),
}

impl ResponseOutcome {
    /// Serializes the given content into a success outcome.
    pub fn success<S>(content: S) -> serde_json::Result<Self>
    where
        S: Serialize,
    {
        Ok(Self::Success(serde_json::to_value(content)?))
    }
}

impl From<RpcError> for ResponseOutcome {
    fn from(err: RpcError) -> Self {
        Self::Error(err)
    }
}
