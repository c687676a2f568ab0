//! Fare errors.

use chrono::NaiveDate;

use crate::domain::{Currency, FareRuleId, LineId, PassengerTypeId, StationId};

/// A journey could not be priced.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FareError {
    /// No rule covers this ride on this date. Fares are never interpolated.
    #[error("no fare on {line} from {from} to {to} for {passenger_type} on {date}")]
    FareNotFound {
        line: LineId,
        from: StationId,
        to: StationId,
        passenger_type: PassengerTypeId,
        date: NaiveDate,
    },

    /// Segments resolved to fares in different currencies
    #[error("journey mixes currencies: {expected} and {found}")]
    CurrencyMismatch { expected: Currency, found: Currency },

    #[error("unknown {0}")]
    UnknownPassengerType(PassengerTypeId),

    #[error("journey price is too large to represent")]
    PriceOverflow,
}

/// Fare data failed validation. No table is built when this is returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FareTableError {
    #[error("{0} appears more than once")]
    DuplicateRule(FareRuleId),

    #[error("{0} appears more than once")]
    DuplicatePassengerType(PassengerTypeId),

    #[error("{rule} references unknown {passenger_type}")]
    UnknownPassengerType {
        rule: FareRuleId,
        passenger_type: PassengerTypeId,
    },

    #[error("{0} ends before it starts")]
    InvertedWindow(FareRuleId),

    #[error("{first} and {second} have overlapping validity windows")]
    OverlappingWindows {
        first: FareRuleId,
        second: FareRuleId,
    },

    #[error("{0} has a negative price")]
    NegativePrice(FareRuleId),

    #[error("{0} has a negative peak multiplier")]
    NegativeMultiplier(FareRuleId),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = FareError::FareNotFound {
            line: LineId(1),
            from: StationId(101),
            to: StationId(103),
            passenger_type: PassengerTypeId(2),
            date: NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
        };
        assert_eq!(
            err.to_string(),
            "no fare on line #1 from station #101 to station #103 for passenger type #2 on 2024-03-15"
        );

        let err = FareError::CurrencyMismatch {
            expected: Currency::THB,
            found: Currency::parse("JPY").unwrap(),
        };
        assert_eq!(err.to_string(), "journey mixes currencies: THB and JPY");

        let err = FareTableError::OverlappingWindows {
            first: FareRuleId(1),
            second: FareRuleId(2),
        };
        assert_eq!(
            err.to_string(),
            "fare rule #1 and fare rule #2 have overlapping validity windows"
        );
    }
}
