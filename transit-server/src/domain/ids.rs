//! Numeric identities for network reference data.
//!
//! Identities come from the external data source and are opaque to the core;
//! the newtypes only stop a station id being passed where a line id is meant.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{} #{}", $label, self.0)
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }
    };
}

numeric_id!(
    /// Identity of a station.
    StationId,
    "station"
);
numeric_id!(
    /// Identity of a line.
    LineId,
    "line"
);
numeric_id!(
    /// Identity of a train operating company.
    OperatorId,
    "operator"
);
numeric_id!(
    /// Identity of a passenger type (adult, child, senior, ...).
    PassengerTypeId,
    "passenger type"
);
numeric_id!(
    /// Identity of an authored fare rule.
    FareRuleId,
    "fare rule"
);
