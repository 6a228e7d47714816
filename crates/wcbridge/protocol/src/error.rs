use alloy_primitives::hex;

/// Failures surfaced by the protocol layer.
///
/// None of these are fatal to a running session: the frame (or parse
/// attempt) that produced them is dropped and traffic continues.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("malformed connection uri")]
    MalformedUri,
    #[error("session key must be 32 bytes")]
    InvalidKeyLength,
    #[error(transparent)]
    Hex(#[from] hex::FromHexError),
    #[error("malformed frame: {0}")]
    Frame(#[from] serde_json::Error),
    #[error("hmac verification failed")]
    AuthenticationFailed,
    #[error("decryption failed")]
    DecryptionFailed,
}
