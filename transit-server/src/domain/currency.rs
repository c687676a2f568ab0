//! Currency code and money types.

use std::fmt;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Error returned when parsing an invalid currency code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid currency code: {reason}")]
pub struct InvalidCurrency {
    reason: &'static str,
}

/// A valid 3-letter ISO 4217 currency code.
///
/// # Examples
///
/// ```
/// use transit_server::domain::Currency;
///
/// let thb = Currency::parse("THB").unwrap();
/// assert_eq!(thb.as_str(), "THB");
/// assert_eq!(thb.minor_units(), 2);
///
/// assert!(Currency::parse("thb").is_err());
/// assert!(Currency::parse("BAHT").is_err());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Currency([u8; 3]);

impl Currency {
    /// Thai baht, the currency fares default to.
    pub const THB: Currency = Currency(*b"THB");

    /// Parse a currency code from a string.
    ///
    /// The input must be exactly 3 uppercase ASCII letters (A-Z).
    pub fn parse(s: &str) -> Result<Self, InvalidCurrency> {
        let bytes = s.as_bytes();

        if bytes.len() != 3 {
            return Err(InvalidCurrency {
                reason: "must be exactly 3 characters",
            });
        }

        for &b in bytes {
            if !b.is_ascii_uppercase() {
                return Err(InvalidCurrency {
                    reason: "must be uppercase ASCII letters A-Z",
                });
            }
        }

        Ok(Currency([bytes[0], bytes[1], bytes[2]]))
    }

    /// Returns the code as a string slice.
    pub fn as_str(&self) -> &str {
        // Only ASCII uppercase letters are ever stored
        std::str::from_utf8(&self.0).unwrap_or("???")
    }

    /// Number of decimal places in the currency's minor unit.
    pub fn minor_units(&self) -> u32 {
        match self.as_str() {
            "BIF" | "CLP" | "DJF" | "GNF" | "ISK" | "JPY" | "KMF" | "KRW" | "PYG" | "RWF"
            | "UGX" | "VND" | "VUV" | "XAF" | "XOF" | "XPF" => 0,
            "BHD" | "IQD" | "JOD" | "KWD" | "LYD" | "OMR" | "TND" => 3,
            _ => 2,
        }
    }
}

impl TryFrom<String> for Currency {
    type Error = InvalidCurrency;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Currency> for String {
    fn from(value: Currency) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Debug for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Currency({})", self.as_str())
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An amount in a specific currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    pub amount: Decimal,
    pub currency: Currency,
}

impl Money {
    pub fn new(amount: Decimal, currency: Currency) -> Self {
        Self { amount, currency }
    }

    pub fn zero(currency: Currency) -> Self {
        Self::new(Decimal::ZERO, currency)
    }

    /// Rounds to the currency's minor unit, sending exact midpoints to the
    /// even neighbour (banker's rounding).
    pub fn rounded(self) -> Self {
        let amount = self.amount.round_dp_with_strategy(
            self.currency.minor_units(),
            RoundingStrategy::MidpointNearestEven,
        );
        Self { amount, ..self }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.amount, self.currency)
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn roundtrip(s in "[A-Z]{3}") {
            let currency = Currency::parse(&s).unwrap();
            prop_assert_eq!(currency.as_str(), s.as_str());
        }

        #[test]
        fn wrong_length_rejected(s in "[A-Z]{0,2}|[A-Z]{4,8}") {
            prop_assert!(Currency::parse(&s).is_err());
        }

        /// Rounding never moves an amount by more than half a minor unit
        #[test]
        fn rounding_is_close(cents in -1_000_000i64..1_000_000i64, extra in 0u32..10u32) {
            let thb = Currency::parse("THB").unwrap();
            let amount = Decimal::new(cents * 10 + extra as i64, 3);
            let rounded = Money::new(amount, thb).rounded().amount;
            prop_assert!((rounded - amount).abs() <= Decimal::new(5, 3));
            prop_assert!(rounded.scale() <= 2);
        }
    }
}
