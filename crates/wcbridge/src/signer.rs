//! Boundary to the external signing/transaction engine.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Failures reported by the signing engine. Surfaced to the counterparty
/// as an error response; never fatal to the session.
#[derive(Debug, thiserror::Error)]
pub enum SignerError {
    #[error("signing failed: {0}")]
    Signing(String),
    #[error("signer unavailable: {0}")]
    Unavailable(String),
}

/// `params[0]` of `eth_sendTransaction`: `to` and `gas` are required,
/// everything else optional. Quantities stay hex strings; validation is
/// the signing engine's concern.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    pub to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_price: Option<String>,
    pub gas: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

/// The external signing collaborator. All methods return the hex string
/// that goes verbatim into the JSON-RPC `result`.
#[async_trait]
pub trait WalletSigner: Send + Sync + 'static {
    /// Signs an opaque message for `eth_sign`, returning the signature.
    async fn sign_message(&self, address: &str, message: &str) -> Result<String, SignerError>;

    /// Signs an EIP-712 payload for `eth_signTypedData`.
    async fn sign_typed_data(
        &self,
        address: &str,
        typed_data: &serde_json::Value,
    ) -> Result<String, SignerError>;

    /// Builds, signs and submits a transaction, returning its hash.
    async fn send_transaction(&self, tx: TransactionParams) -> Result<String, SignerError>;
}
