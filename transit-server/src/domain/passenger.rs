//! Passenger types and the details a passenger gives when booking.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::PassengerTypeId;

/// A fare category such as adult, child or senior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassengerType {
    pub id: PassengerTypeId,
    pub name: String,
    /// Advertised discount relative to the adult fare.
    ///
    /// Fare rules are authored per passenger type, so this figure is for
    /// reporting only and is never applied on top of a resolved fare.
    #[serde(default)]
    pub discount_percentage: Decimal,
    #[serde(default)]
    pub age_min: Option<u8>,
    #[serde(default)]
    pub age_max: Option<u8>,
    #[serde(default)]
    pub requires_proof: bool,
}

/// Why a passenger may not travel on a given passenger type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ineligibility {
    /// The type has age bounds and no age was given.
    AgeMissing,
    TooYoung,
    TooOld,
    /// The type requires a concession card or similar and none was shown.
    ProofMissing,
}

impl Ineligibility {
    pub fn reason(&self) -> &'static str {
        match self {
            Ineligibility::AgeMissing => "age is required for this passenger type",
            Ineligibility::TooYoung => "passenger is below the minimum age",
            Ineligibility::TooOld => "passenger is above the maximum age",
            Ineligibility::ProofMissing => "proof of eligibility is required",
        }
    }
}

impl PassengerType {
    /// Check that the given passenger may travel on this type.
    pub fn check_eligibility(&self, details: &PassengerDetails) -> Result<(), Ineligibility> {
        if self.age_min.is_some() || self.age_max.is_some() {
            let age = details.age.ok_or(Ineligibility::AgeMissing)?;
            if self.age_min.is_some_and(|min| age < min) {
                return Err(Ineligibility::TooYoung);
            }
            if self.age_max.is_some_and(|max| age > max) {
                return Err(Ineligibility::TooOld);
            }
        }

        if self.requires_proof && !details.proof_presented {
            return Err(Ineligibility::ProofMissing);
        }

        Ok(())
    }
}

/// Passenger information supplied at booking time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassengerDetails {
    pub name: String,
    #[serde(default)]
    pub age: Option<u8>,
    #[serde(default)]
    pub proof_presented: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn child() -> PassengerType {
        PassengerType {
            id: PassengerTypeId(2),
            name: "child".into(),
            discount_percentage: dec!(50),
            age_min: Some(4),
            age_max: Some(14),
            requires_proof: false,
        }
    }

    fn details(age: Option<u8>, proof: bool) -> PassengerDetails {
        PassengerDetails {
            name: "Somchai".into(),
            age,
            proof_presented: proof,
        }
    }

    #[test]
    fn age_within_bounds_is_eligible() {
        assert_eq!(child().check_eligibility(&details(Some(4), false)), Ok(()));
        assert_eq!(child().check_eligibility(&details(Some(14), false)), Ok(()));
    }

    #[test]
    fn age_outside_bounds_is_rejected() {
        assert_eq!(
            child().check_eligibility(&details(Some(3), false)),
            Err(Ineligibility::TooYoung)
        );
        assert_eq!(
            child().check_eligibility(&details(Some(15), false)),
            Err(Ineligibility::TooOld)
        );
        assert_eq!(
            child().check_eligibility(&details(None, false)),
            Err(Ineligibility::AgeMissing)
        );
    }

    #[test]
    fn proof_required() {
        let senior = PassengerType {
            id: PassengerTypeId(3),
            name: "senior".into(),
            discount_percentage: dec!(50),
            age_min: Some(60),
            age_max: None,
            requires_proof: true,
        };
        assert_eq!(
            senior.check_eligibility(&details(Some(70), false)),
            Err(Ineligibility::ProofMissing)
        );
        assert_eq!(senior.check_eligibility(&details(Some(70), true)), Ok(()));
    }

    #[test]
    fn unbounded_type_needs_no_age() {
        let adult = PassengerType {
            id: PassengerTypeId(1),
            name: "adult".into(),
            discount_percentage: Decimal::ZERO,
            age_min: None,
            age_max: None,
            requires_proof: false,
        };
        assert_eq!(adult.check_eligibility(&details(None, false)), Ok(()));
    }
}
