//! Opaque transport seam.
//!
//! The concrete socket (websocket, in-memory pair in tests) lives with the
//! host. The controller only needs a way to push text frames out and a
//! stream of lifecycle events in.

use async_trait::async_trait;

/// Failure reported by the transport on send. Ends the session; reconnect
/// policy is the host's.
#[derive(Debug, thiserror::Error)]
#[error("transport failure: {0}")]
pub struct TransportError(pub String);

/// Lifecycle callbacks of the underlying socket, delivered as a single
/// event stream per session.
#[derive(Clone, Debug)]
pub enum TransportEvent {
    /// The socket is open; the controller subscribes to the session topic.
    Opened,
    /// One inbound text frame.
    Message(String),
    /// Orderly remote close.
    Closed,
    /// Transport-level failure.
    Error(String),
}

/// Outbound half of the socket.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Sends one text frame. The transport serializes concurrent sends.
    async fn send(&self, frame: String) -> Result<(), TransportError>;

    /// Requests the socket be closed. Idempotent.
    async fn close(&self);
}
