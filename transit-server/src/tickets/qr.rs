//! Signed QR payloads.
//!
//! A payload is the URL-safe base64 (no padding) encoding of:
//!
//! | bytes | field |
//! |---|---|
//! | 12 | ticket id, ASCII |
//! | 8 | valid-until, Unix seconds, big-endian |
//! | 16 | per-ticket nonce |
//! | 32 | HMAC-SHA256 over the preceding 36 bytes |

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::domain::{TICKET_ID_LEN, TicketId};

type HmacSha256 = Hmac<Sha256>;

pub const NONCE_LEN: usize = 16;
const TAG_LEN: usize = 32;
const SIGNED_LEN: usize = TICKET_ID_LEN + 8 + NONCE_LEN;
const PAYLOAD_LEN: usize = SIGNED_LEN + TAG_LEN;

/// The signing key was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid signing key: {reason}")]
pub struct InvalidSigningKey {
    reason: &'static str,
}

/// A payload that failed to decode or verify. Deliberately carries no detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid ticket signature")]
pub struct BadSignature;

/// The fields of a verified payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QrPayload {
    pub id: TicketId,
    /// Unix seconds.
    pub valid_until: i64,
    pub nonce: [u8; NONCE_LEN],
}

/// Signs and verifies QR payloads with a shared secret.
#[derive(Clone)]
pub struct QrSigner {
    mac: HmacSha256,
}

impl QrSigner {
    /// Create a signer from a secret key. The key must not be empty.
    pub fn new(key: &[u8]) -> Result<Self, InvalidSigningKey> {
        if key.is_empty() {
            return Err(InvalidSigningKey {
                reason: "key must not be empty",
            });
        }
        let mac = HmacSha256::new_from_slice(key).map_err(|_| InvalidSigningKey {
            reason: "key length rejected",
        })?;
        Ok(Self { mac })
    }

    /// Encode and sign a payload.
    pub fn sign(
        &self,
        id: TicketId,
        valid_until: DateTime<Utc>,
        nonce: &[u8; NONCE_LEN],
    ) -> String {
        let mut bytes = Vec::with_capacity(PAYLOAD_LEN);
        bytes.extend_from_slice(id.as_bytes());
        bytes.extend_from_slice(&valid_until.timestamp().to_be_bytes());
        bytes.extend_from_slice(nonce);

        let mut mac = self.mac.clone();
        mac.update(&bytes);
        bytes.extend_from_slice(&mac.finalize().into_bytes());

        URL_SAFE_NO_PAD.encode(bytes)
    }

    /// Decode a payload and check its tag in constant time.
    pub fn verify(&self, payload: &str) -> Result<QrPayload, BadSignature> {
        let bytes = URL_SAFE_NO_PAD
            .decode(payload.trim())
            .map_err(|_| BadSignature)?;
        if bytes.len() != PAYLOAD_LEN {
            return Err(BadSignature);
        }

        let (signed, tag) = bytes.split_at(SIGNED_LEN);
        let mut mac = self.mac.clone();
        mac.update(signed);
        mac.verify_slice(tag).map_err(|_| BadSignature)?;

        let (id, rest) = signed.split_at(TICKET_ID_LEN);
        let (valid_until, nonce) = rest.split_at(8);

        Ok(QrPayload {
            id: TicketId::from_bytes(id).map_err(|_| BadSignature)?,
            valid_until: i64::from_be_bytes(valid_until.try_into().map_err(|_| BadSignature)?),
            nonce: nonce.try_into().map_err(|_| BadSignature)?,
        })
    }
}

impl fmt::Debug for QrSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("QrSigner(..)")
    }
}
