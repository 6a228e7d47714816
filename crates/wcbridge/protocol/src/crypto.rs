//! AES-256-CBC + HMAC-SHA256 envelope codec.
//!
//! Every message crossing the bridge relay is wrapped in an
//! [`EncryptedPayload`]: the CBC ciphertext, a keyed hash over
//! `ciphertext ‖ iv`, and the per-message IV, each hex-encoded. The relay
//! only ever sees this triple, so authentication is verified here before a
//! single byte of plaintext is trusted.

use crate::error::ProtocolError;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit, block_padding::Pkcs7};
use alloy_primitives::hex;
use hmac::{Hmac, Mac};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::fmt;

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;
type HmacSha256 = Hmac<Sha256>;

const IV_LEN: usize = 16;
const KEY_LEN: usize = 32;

/// The shared symmetric session key.
///
/// Carried in the connection uri's `key` parameter. The counterparty calls
/// this its "public key", but it is the shared secret for both the cipher
/// and the MAC.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionKey([u8; KEY_LEN]);

impl SessionKey {
    /// Parses the hex key material from a connection uri.
    pub fn from_hex(s: &str) -> Result<Self, ProtocolError> {
        let bytes = hex::decode(s)?;
        bytes.try_into().map(Self).map_err(|_| ProtocolError::InvalidKeyLength)
    }

    pub const fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    fn mac(&self) -> Result<HmacSha256, ProtocolError> {
        HmacSha256::new_from_slice(&self.0).map_err(|_| ProtocolError::InvalidKeyLength)
    }
}

impl fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionKey(..)")
    }
}

/// The authenticated-encryption envelope as it appears inside a `pub`
/// frame's payload: `{"data": hex, "hmac": hex, "iv": hex}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedPayload {
    /// Hex-encoded ciphertext.
    pub data: String,
    /// Hex-encoded HMAC-SHA256 over `ciphertext ‖ iv`.
    pub hmac: String,
    /// Hex-encoded 16-byte initialization vector.
    pub iv: String,
}

/// Encrypts and authenticates `plaintext` under `key`.
///
/// A fresh random IV is drawn for every call, so sealing the same plaintext
/// twice never yields the same envelope.
pub fn seal(key: &SessionKey, plaintext: &[u8]) -> Result<EncryptedPayload, ProtocolError> {
    let mut iv = [0u8; IV_LEN];
    rand::rng().fill_bytes(&mut iv);

    let ciphertext =
        Aes256CbcEnc::new(&key.0.into(), &iv.into()).encrypt_padded_vec_mut::<Pkcs7>(plaintext);

    let mut mac = key.mac()?;
    mac.update(&ciphertext);
    mac.update(&iv);
    let tag = mac.finalize().into_bytes();

    Ok(EncryptedPayload {
        data: hex::encode(&ciphertext),
        hmac: hex::encode(tag.as_slice()),
        iv: hex::encode(iv),
    })
}

/// Verifies and decrypts an envelope, returning the plaintext.
///
/// The MAC is checked (in constant time) before any decryption happens; a
/// mismatch is a hard [`ProtocolError::AuthenticationFailed`]. Padding
/// errors after a valid MAC surface as [`ProtocolError::DecryptionFailed`]
/// without leaking partial plaintext.
pub fn open(key: &SessionKey, payload: &EncryptedPayload) -> Result<Vec<u8>, ProtocolError> {
    let ciphertext = hex::decode(&payload.data)?;
    let tag = hex::decode(&payload.hmac)?;
    let iv: [u8; IV_LEN] =
        hex::decode(&payload.iv)?.try_into().map_err(|_| ProtocolError::DecryptionFailed)?;

    let mut mac = key.mac()?;
    mac.update(&ciphertext);
    mac.update(&iv);
    mac.verify_slice(&tag).map_err(|_| ProtocolError::AuthenticationFailed)?;

    Aes256CbcDec::new(&key.0.into(), &iv.into())
        .decrypt_padded_vec_mut::<Pkcs7>(&ciphertext)
        .map_err(|_| ProtocolError::DecryptionFailed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn test_key() -> SessionKey {
        SessionKey::from_bytes([0u8; 32])
    }

    #[test]
    fn seal_open_roundtrip() {
        let key = test_key();
        let plaintext = br#"{"id":1,"jsonrpc":"2.0","method":"eth_sign","params":["0xabc","hello"]}"#;
        let payload = seal(&key, plaintext).unwrap();
        assert_eq!(open(&key, &payload).unwrap(), plaintext);
    }

    #[test]
    fn fresh_iv_per_seal() {
        let key = test_key();
        let a = seal(&key, b"same message").unwrap();
        let b = seal(&key, b"same message").unwrap();
        assert_ne!(a.iv, b.iv);
        assert_ne!(a.data, b.data);
    }

    #[test]
    fn wrong_key_fails_authentication() {
        let payload = seal(&test_key(), b"secret").unwrap();
        let other = SessionKey::from_bytes([7u8; 32]);
        assert!(matches!(open(&other, &payload), Err(ProtocolError::AuthenticationFailed)));
    }

    #[test]
    fn tampering_with_any_field_fails_authentication() {
        let key = test_key();
        let payload = seal(&key, b"integrity check").unwrap();

        let flip_first_bit = |s: &str| {
            let mut bytes = hex::decode(s).unwrap();
            bytes[0] ^= 0x01;
            hex::encode(bytes)
        };

        for field in 0..3 {
            let mut tampered = payload.clone();
            match field {
                0 => tampered.data = flip_first_bit(&tampered.data),
                1 => tampered.hmac = flip_first_bit(&tampered.hmac),
                _ => tampered.iv = flip_first_bit(&tampered.iv),
            }
            assert!(
                matches!(open(&key, &tampered), Err(ProtocolError::AuthenticationFailed)),
                "field {field} tamper went undetected"
            );
        }
    }

    #[test]
    fn empty_plaintext_roundtrips() {
        let key = test_key();
        let payload = seal(&key, b"").unwrap();
        assert_eq!(open(&key, &payload).unwrap(), b"");
    }

    #[test]
    fn payload_wire_shape() {
        let key = test_key();
        let payload = seal(&key, b"x").unwrap();
        let wire: serde_json::Value = serde_json::to_value(&payload).unwrap();
        assert!(wire.get("data").is_some());
        assert!(wire.get("hmac").is_some());
        assert!(wire.get("iv").is_some());
        assert_eq!(payload.iv.len(), 32);
    }

    #[test]
    fn session_key_from_hex() {
        let key = SessionKey::from_hex(&"00".repeat(32)).unwrap();
        assert_eq!(key, test_key());
        // 0x prefix is tolerated
        assert!(SessionKey::from_hex(&format!("0x{}", "11".repeat(32))).is_ok());
        // wrong length rejected
        assert!(matches!(
            SessionKey::from_hex(&"00".repeat(16)),
            Err(ProtocolError::InvalidKeyLength)
        ));
        // odd-length hex rejected
        assert!(matches!(SessionKey::from_hex("abc"), Err(ProtocolError::Hex(_))));
    }

    #[test]
    fn hex_decode_contract() {
        assert_eq!(hex::encode([0xde, 0xad, 0xbe, 0xef]), "deadbeef");
        assert_eq!(hex::decode("deadbeef").unwrap(), vec![0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(hex::decode("0xDEADBEEF").unwrap(), vec![0xde, 0xad, 0xbe, 0xef]);
        assert!(hex::decode("abc").is_err());
        assert!(hex::decode("zz").is_err());
    }

    proptest! {
        #[test]
        fn roundtrip_holds_for_all_inputs(
            key in prop::array::uniform32(any::<u8>()),
            plaintext in prop::collection::vec(any::<u8>(), 0..512),
        ) {
            let key = SessionKey::from_bytes(key);
            let payload = seal(&key, &plaintext).unwrap();
            prop_assert_eq!(open(&key, &payload).unwrap(), plaintext);
        }

        #[test]
        fn hex_roundtrip(bytes in prop::collection::vec(any::<u8>(), 0..256)) {
            prop_assert_eq!(hex::decode(hex::encode(&bytes)).unwrap(), bytes);
        }
    }
}
