//! The pub/sub frame exchanged with the bridge relay.

use crate::crypto::EncryptedPayload;
use serde::{Deserialize, Serialize};

/// Frame type understood by the relay.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Sub,
    Pub,
}

/// A single text frame on the relay socket.
///
/// `topic` scopes the frame to one logical session channel; `payload` is
/// empty for subscriptions and a serialized [`EncryptedPayload`] for
/// publishes. `silent` asks the relay not to emit a push notification.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocketMessage {
    pub topic: String,
    #[serde(rename = "type")]
    pub kind: MessageType,
    pub payload: String,
    #[serde(default)]
    pub silent: bool,
}

impl SocketMessage {
    /// Builds the subscription frame for a topic.
    pub fn subscribe(topic: impl Into<String>) -> Self {
        Self { topic: topic.into(), kind: MessageType::Sub, payload: String::new(), silent: true }
    }

    /// Builds a publish frame carrying an encrypted payload.
    pub fn publish(
        topic: impl Into<String>,
        payload: &EncryptedPayload,
    ) -> serde_json::Result<Self> {
        Ok(Self {
            topic: topic.into(),
            kind: MessageType::Pub,
            payload: serde_json::to_string(payload)?,
            silent: true,
        })
    }
}
