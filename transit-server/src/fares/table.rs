//! Fare rules and the validated table they are looked up in.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::FareTableError;
use crate::domain::{
    FareRuleId, LineId, Money, PassengerType, PassengerTypeId, StationId,
};

/// An authored fare for one ride between two stations on one line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FareRule {
    pub id: FareRuleId,
    pub line: LineId,
    pub from: StationId,
    pub to: StationId,
    pub passenger_type: PassengerTypeId,
    /// First local date the rule applies (inclusive).
    pub valid_from: NaiveDate,
    /// Last local date the rule applies (inclusive). Open-ended when absent.
    #[serde(default)]
    pub valid_to: Option<NaiveDate>,
    /// Off-peak price.
    pub price: Money,
    #[serde(default = "default_multiplier")]
    pub peak_multiplier: Decimal,
}

impl FareRule {
    /// True if the rule applies on the given local date.
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.valid_from <= date && self.valid_to.is_none_or(|to| date <= to)
    }

    fn key(&self) -> FareKey {
        FareKey {
            line: self.line,
            from: self.from,
            to: self.to,
            passenger_type: self.passenger_type,
        }
    }
}

fn default_multiplier() -> Decimal {
    Decimal::ONE
}

/// Fare data as handed in by the data layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FareData {
    #[serde(default)]
    pub passenger_types: Vec<PassengerType>,
    #[serde(default)]
    pub rules: Vec<FareRule>,
}

/// Exact-match lookup key. There is no fallback to a reverse or partial key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
struct FareKey {
    line: LineId,
    from: StationId,
    to: StationId,
    passenger_type: PassengerTypeId,
}

/// One row of a line's fare matrix: the price of a ride for every passenger
/// type that has a fare on it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FareMatrixRow {
    pub from: StationId,
    pub to: StationId,
    pub prices: BTreeMap<PassengerTypeId, Money>,
}

/// Validated fare rules, indexed for lookup.
///
/// Rules sharing a key are kept sorted by start date with non-overlapping
/// windows, so the rule for a date is found by binary search.
#[derive(Debug, Clone, Default)]
pub struct FareTable {
    passenger_types: BTreeMap<PassengerTypeId, PassengerType>,
    rules: HashMap<FareKey, Vec<FareRule>>,
}

impl FareTable {
    /// Builds a table, rejecting inconsistent data.
    pub fn build(data: FareData) -> Result<Self, FareTableError> {
        let mut passenger_types = BTreeMap::new();
        for passenger_type in data.passenger_types {
            let id = passenger_type.id;
            if passenger_types.insert(id, passenger_type).is_some() {
                return Err(FareTableError::DuplicatePassengerType(id));
            }
        }

        let mut ids = std::collections::HashSet::new();
        let mut rules: HashMap<FareKey, Vec<FareRule>> = HashMap::new();
        for rule in data.rules {
            if !ids.insert(rule.id) {
                return Err(FareTableError::DuplicateRule(rule.id));
            }
            if !passenger_types.contains_key(&rule.passenger_type) {
                return Err(FareTableError::UnknownPassengerType {
                    rule: rule.id,
                    passenger_type: rule.passenger_type,
                });
            }
            if rule.valid_to.is_some_and(|to| to < rule.valid_from) {
                return Err(FareTableError::InvertedWindow(rule.id));
            }
            if rule.price.amount.is_sign_negative() {
                return Err(FareTableError::NegativePrice(rule.id));
            }
            if rule.peak_multiplier.is_sign_negative() {
                return Err(FareTableError::NegativeMultiplier(rule.id));
            }
            rules.entry(rule.key()).or_default().push(rule);
        }

        for windows in rules.values_mut() {
            windows.sort_by_key(|r| (r.valid_from, r.id));
            for pair in windows.windows(2) {
                let (earlier, later) = (&pair[0], &pair[1]);
                if earlier.valid_to.is_none_or(|to| to >= later.valid_from) {
                    return Err(FareTableError::OverlappingWindows {
                        first: earlier.id,
                        second: later.id,
                    });
                }
            }
        }

        Ok(Self {
            passenger_types,
            rules,
        })
    }

    pub fn passenger_type(&self, id: PassengerTypeId) -> Option<&PassengerType> {
        self.passenger_types.get(&id)
    }

    /// All passenger types, in identity order.
    pub fn passenger_types(&self) -> impl Iterator<Item = &PassengerType> {
        self.passenger_types.values()
    }

    /// Number of rules in the table.
    pub fn len(&self) -> usize {
        self.rules.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// The rule for exactly this ride and passenger type on a local date.
    pub fn lookup(
        &self,
        line: LineId,
        from: StationId,
        to: StationId,
        passenger_type: PassengerTypeId,
        date: NaiveDate,
    ) -> Option<&FareRule> {
        let key = FareKey {
            line,
            from,
            to,
            passenger_type,
        };
        let windows = self.rules.get(&key)?;
        // Last window starting on or before the date
        let after = windows.partition_point(|r| r.valid_from <= date);
        let rule = windows.get(after.checked_sub(1)?)?;
        rule.covers(date).then_some(rule)
    }

    /// The fares on a line in force on a local date, one row per ride.
    pub fn matrix(&self, line: LineId, date: NaiveDate) -> Vec<FareMatrixRow> {
        let mut rows: BTreeMap<(StationId, StationId), BTreeMap<PassengerTypeId, Money>> =
            BTreeMap::new();

        for (key, _) in self.rules.iter().filter(|(key, _)| key.line == line) {
            if let Some(rule) = self.lookup(key.line, key.from, key.to, key.passenger_type, date)
            {
                rows.entry((key.from, key.to))
                    .or_default()
                    .insert(key.passenger_type, rule.price);
            }
        }

        rows.into_iter()
            .map(|((from, to), prices)| FareMatrixRow { from, to, prices })
            .collect()
    }
}
