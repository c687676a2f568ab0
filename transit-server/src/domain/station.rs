//! Station code type.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Longest short code accepted for a station.
const MAX_CODE_LEN: usize = 8;

/// Error returned when parsing an invalid station code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid station code: {reason}")]
pub struct InvalidStationCode {
    reason: &'static str,
}

/// A valid short station code, as printed on network maps.
///
/// Codes are 1 to 8 uppercase ASCII letters or digits (`N8`, `CEN`, `E15`).
/// Ordering is plain lexicographic ordering of the code, which the planner
/// relies on to break ties between equally good journeys.
///
/// # Examples
///
/// ```
/// use transit_server::domain::StationCode;
///
/// let siam = StationCode::parse("CEN").unwrap();
/// assert_eq!(siam.as_str(), "CEN");
///
/// // Lowercase is rejected, but can be normalized first
/// assert!(StationCode::parse("cen").is_err());
/// assert!(StationCode::parse_normalized(" cen ").is_ok());
///
/// // Empty or overlong codes are rejected
/// assert!(StationCode::parse("").is_err());
/// assert!(StationCode::parse("ABCDEFGHI").is_err());
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StationCode(String);

impl StationCode {
    /// Parse a station code from a string.
    ///
    /// The input must be 1 to 8 uppercase ASCII letters or digits.
    pub fn parse(s: &str) -> Result<Self, InvalidStationCode> {
        if s.is_empty() {
            return Err(InvalidStationCode {
                reason: "must not be empty",
            });
        }

        if s.len() > MAX_CODE_LEN {
            return Err(InvalidStationCode {
                reason: "must be at most 8 characters",
            });
        }

        if !s
            .bytes()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
        {
            return Err(InvalidStationCode {
                reason: "must be uppercase ASCII letters A-Z or digits",
            });
        }

        Ok(StationCode(s.to_string()))
    }

    /// Parse a code typed by a person: surrounding whitespace is trimmed and
    /// letters are uppercased before validation.
    pub fn parse_normalized(s: &str) -> Result<Self, InvalidStationCode> {
        Self::parse(&s.trim().to_ascii_uppercase())
    }

    /// Returns the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for StationCode {
    type Error = InvalidStationCode;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<StationCode> for String {
    fn from(value: StationCode) -> Self {
        value.0
    }
}

impl fmt::Debug for StationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StationCode({})", self.0)
    }
}

impl fmt::Display for StationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_valid_codes() {
        assert!(StationCode::parse("CEN").is_ok());
        assert!(StationCode::parse("N8").is_ok());
        assert!(StationCode::parse("E15").is_ok());
        assert!(StationCode::parse("A").is_ok());
        assert!(StationCode::parse("ABCDEFGH").is_ok());
    }

    #[test]
    fn reject_lowercase() {
        assert!(StationCode::parse("cen").is_err());
        assert!(StationCode::parse("Cen").is_err());
        assert!(StationCode::parse("n8").is_err());
    }

    #[test]
    fn reject_wrong_length() {
        assert!(StationCode::parse("").is_err());
        assert!(StationCode::parse("ABCDEFGHI").is_err());
    }

    #[test]
    fn reject_punctuation_and_non_ascii() {
        assert!(StationCode::parse("N-8").is_err());
        assert!(StationCode::parse("N 8").is_err());
        assert!(StationCode::parse("NÖ").is_err());
    }

    #[test]
    fn normalized_trims_and_uppercases() {
        let code = StationCode::parse_normalized("  e15 ").unwrap();
        assert_eq!(code.as_str(), "E15");
        assert!(StationCode::parse_normalized("   ").is_err());
    }

    #[test]
    fn display_and_debug() {
        let code = StationCode::parse("N8").unwrap();
        assert_eq!(format!("{}", code), "N8");
        assert_eq!(format!("{:?}", code), "StationCode(N8)");
    }

    #[test]
    fn ordering_is_lexicographic() {
        let a = StationCode::parse("E1").unwrap();
        let b = StationCode::parse("E10").unwrap();
        let c = StationCode::parse("E2").unwrap();
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn serde_rejects_invalid_codes() {
        let ok: StationCode = serde_json::from_str("\"CEN\"").unwrap();
        assert_eq!(ok.as_str(), "CEN");
        assert!(serde_json::from_str::<StationCode>("\"cen\"").is_err());
        assert_eq!(serde_json::to_string(&ok).unwrap(), "\"CEN\"");
    }
}
