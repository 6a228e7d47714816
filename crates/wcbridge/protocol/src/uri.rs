//! The `wc:` connection uri.
//!
//! `wc:{topic}@{version}?bridge=<percent-encoded-url>&key=<hex>` — handed
//! to the wallet out of band (QR code or deep link). Parsing is
//! deliberately best-effort: this is user-supplied input, so any structural
//! deviation yields `None` rather than an error.

use crate::error::ProtocolError;
use std::{fmt, str::FromStr};
use url::Url;

/// Scheme literal of a connection uri.
pub const SCHEME: &str = "wc";
/// The only supported protocol version.
pub const VERSION: u64 = 1;

/// A parsed connection uri, immutable for the lifetime of one connection
/// attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WcUri {
    /// Opaque id correlating all frames of this session.
    pub topic: String,
    /// Protocol version, always [`VERSION`].
    pub version: u64,
    /// Relay endpoint, percent-decoded and validated.
    pub bridge: Url,
    /// Hex session key material, kept verbatim.
    pub key: String,
}

impl WcUri {
    /// Parses a connection uri, returning `None` on any malformed input.
    pub fn parse(uri: &str) -> Option<Self> {
        let rest = uri.strip_prefix(SCHEME)?.strip_prefix(':')?;
        let (handshake, query) = rest.split_once('?')?;
        let (topic, version) = handshake.split_once('@')?;
        if topic.is_empty() {
            return None;
        }
        let version: u64 = version.parse().ok()?;
        if version != VERSION {
            return None;
        }

        let mut bridge = None;
        let mut key = None;
        for (name, value) in url::form_urlencoded::parse(query.as_bytes()) {
            match name.as_ref() {
                "bridge" => bridge = Some(value.into_owned()),
                "key" => key = Some(value.into_owned()),
                _ => {}
            }
        }
        let bridge = Url::parse(&bridge?).ok()?;
        let key = key.filter(|k| !k.is_empty())?;

        Some(Self { topic: topic.to_owned(), version, bridge, key })
    }
}

impl FromStr for WcUri {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or(ProtocolError::MalformedUri)
    }
}

impl fmt::Display for WcUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bridge: String = url::form_urlencoded::byte_serialize(self.bridge.as_str().as_bytes())
            .collect();
        write!(f, "{SCHEME}:{}@{}?bridge={bridge}&key={}", self.topic, self.version, self.key)
    }
}
