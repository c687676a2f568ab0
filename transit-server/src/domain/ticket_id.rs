//! Ticket identity type.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Number of characters in a ticket identity.
pub const TICKET_ID_LEN: usize = 12;

const ALPHABET: &[u8; 36] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Error returned when parsing an invalid ticket identity.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid ticket id: {reason}")]
pub struct InvalidTicketId {
    reason: &'static str,
}

/// A ticket identity: 12 uppercase ASCII letters or digits.
///
/// Identities are drawn at random when a ticket is issued and are what a
/// passenger reads out at a ticket office, so they avoid lowercase and
/// punctuation.
///
/// # Examples
///
/// ```
/// use transit_server::domain::TicketId;
///
/// let id = TicketId::parse("AB12CD34EF56").unwrap();
/// assert_eq!(id.as_str(), "AB12CD34EF56");
///
/// assert!(TicketId::parse("ab12cd34ef56").is_err());
/// assert!(TicketId::parse("SHORT").is_err());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TicketId([u8; TICKET_ID_LEN]);

impl TicketId {
    /// Parse a ticket identity from a string.
    pub fn parse(s: &str) -> Result<Self, InvalidTicketId> {
        Self::from_bytes(s.as_bytes())
    }

    /// Parse a ticket identity from its raw ASCII bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, InvalidTicketId> {
        let bytes: [u8; TICKET_ID_LEN] = bytes.try_into().map_err(|_| InvalidTicketId {
            reason: "must be exactly 12 characters",
        })?;

        if !bytes
            .iter()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
        {
            return Err(InvalidTicketId {
                reason: "must be uppercase ASCII letters A-Z or digits",
            });
        }

        Ok(TicketId(bytes))
    }

    /// Draw a fresh random identity.
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut bytes = [0u8; TICKET_ID_LEN];
        for b in bytes.iter_mut() {
            *b = ALPHABET[rng.gen_range(0..ALPHABET.len())];
        }
        TicketId(bytes)
    }

    /// Returns the identity as a string slice.
    pub fn as_str(&self) -> &str {
        // Only ASCII letters and digits are ever stored
        std::str::from_utf8(&self.0).unwrap_or("????????????")
    }

    /// Returns the raw ASCII bytes.
    pub fn as_bytes(&self) -> &[u8; TICKET_ID_LEN] {
        &self.0
    }
}

impl TryFrom<String> for TicketId {
    type Error = InvalidTicketId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TicketId> for String {
    fn from(value: TicketId) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Debug for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TicketId({})", self.as_str())
    }
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
