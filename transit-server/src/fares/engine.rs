//! Journey pricing.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use super::{FareConfig, FareError, FareTable};
use crate::domain::{Currency, FareRuleId, Journey, Money, PassengerTypeId, SegmentKind};

/// Where a segment's price came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "source", content = "rule", rename_all = "snake_case")]
pub enum FareSource {
    /// A ride priced by an authored rule.
    Rule(FareRuleId),
    /// A walk priced at its interchange cost.
    Interchange,
    /// A walk with no charge.
    Free,
}

/// The resolved fare for one segment of a journey.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricedSegment {
    pub source: FareSource,
    /// Price before any peak multiplier. `None` for free walks.
    pub base: Option<Money>,
    /// Multiplier applied to `base`; one outside peak hours.
    pub multiplier: Decimal,
    /// Price charged for the segment, unrounded.
    pub price: Option<Money>,
}

/// A journey with a resolved price for one passenger type at one instant.
#[derive(Debug, Clone, PartialEq)]
pub struct PricedJourney {
    pub journey: Journey,
    pub passenger_type: PassengerTypeId,
    pub priced_at: DateTime<Utc>,
    pub peak: bool,
    /// One entry per journey segment, in order.
    pub segments: Vec<PricedSegment>,
    /// Sum of segment prices rounded to the currency's minor unit.
    pub total: Money,
    /// The passenger type's advertised discount. Reported only: rule prices
    /// already reflect it.
    pub discount_percentage: Decimal,
}

/// Prices journeys against a fare table.
#[derive(Debug, Clone, Default)]
pub struct FareEngine {
    config: FareConfig,
}

impl FareEngine {
    pub fn new(config: FareConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FareConfig {
        &self.config
    }

    /// Prices a journey for a passenger type at a given instant.
    ///
    /// Each ride is matched exactly on (line, boarding station, alighting
    /// station, passenger type) and the local date of `at`. In peak hours
    /// every ride's base price is multiplied by its own rule's multiplier.
    ///
    /// # Errors
    ///
    /// - [`FareError::UnknownPassengerType`] if the type isn't in the table
    /// - [`FareError::FareNotFound`] if any ride has no rule in force
    /// - [`FareError::CurrencyMismatch`] if segments are priced in different
    ///   currencies
    /// - [`FareError::PriceOverflow`] if a segment or the total can't be
    ///   represented
    pub fn price(
        &self,
        table: &FareTable,
        journey: &Journey,
        passenger_type: PassengerTypeId,
        at: DateTime<Utc>,
    ) -> Result<PricedJourney, FareError> {
        self.price_in(table, journey, passenger_type, at, self.config.default_currency)
    }

    /// As [`price`](Self::price), but a journey with nothing to charge is
    /// totalled in `fallback`.
    pub fn price_in(
        &self,
        table: &FareTable,
        journey: &Journey,
        passenger_type: PassengerTypeId,
        at: DateTime<Utc>,
        fallback: Currency,
    ) -> Result<PricedJourney, FareError> {
        let kind = table
            .passenger_type(passenger_type)
            .ok_or(FareError::UnknownPassengerType(passenger_type))?;

        let date = self.config.local(at).date();
        let peak = self.config.is_peak(at);

        let mut segments = Vec::with_capacity(journey.segment_count());
        let mut currency: Option<Currency> = None;
        let mut sum = Decimal::ZERO;

        for segment in journey.segments() {
            let priced = match &segment.kind {
                SegmentKind::Ride(ride) => {
                    let (Some(first), Some(last)) = (ride.stops.first(), ride.stops.last())
                    else {
                        continue;
                    };
                    let rule = table
                        .lookup(ride.line, first.id, last.id, passenger_type, date)
                        .ok_or(FareError::FareNotFound {
                            line: ride.line,
                            from: first.id,
                            to: last.id,
                            passenger_type,
                            date,
                        })?;
                    let multiplier = if peak {
                        rule.peak_multiplier
                    } else {
                        Decimal::ONE
                    };
                    let amount = rule
                        .price
                        .amount
                        .checked_mul(multiplier)
                        .ok_or(FareError::PriceOverflow)?;
                    PricedSegment {
                        source: FareSource::Rule(rule.id),
                        base: Some(rule.price),
                        multiplier,
                        price: Some(Money::new(amount, rule.price.currency)),
                    }
                }
                SegmentKind::Walk(walk) => PricedSegment {
                    source: if walk.cost.is_some() {
                        FareSource::Interchange
                    } else {
                        FareSource::Free
                    },
                    base: walk.cost,
                    multiplier: Decimal::ONE,
                    price: walk.cost,
                },
            };

            if let Some(price) = priced.price {
                match currency {
                    Some(expected) if expected != price.currency => {
                        return Err(FareError::CurrencyMismatch {
                            expected,
                            found: price.currency,
                        });
                    }
                    _ => currency = Some(price.currency),
                }
                sum = sum
                    .checked_add(price.amount)
                    .ok_or(FareError::PriceOverflow)?;
            }
            segments.push(priced);
        }

        let total = Money::new(sum, currency.unwrap_or(fallback)).rounded();

        Ok(PricedJourney {
            journey: journey.clone(),
            passenger_type,
            priced_at: at,
            peak,
            segments,
            total,
            discount_percentage: kind.discount_percentage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{LineId, PassengerType, Segment, StationCode, StationId, Stop};
    use crate::fares::{FareData, FareRule};
    use chrono::{Duration, NaiveDate, TimeZone};
    use rust_decimal_macros::dec;

    fn stop(id: u64, code: &str) -> Stop {
        Stop::new(StationId(id), StationCode::parse(code).unwrap())
    }

    fn passenger(id: u64, discount: Decimal) -> PassengerType {
        PassengerType {
            id: PassengerTypeId(id),
            name: format!("type {id}"),
            discount_percentage: discount,
            age_min: None,
            age_max: None,
            requires_proof: false,
        }
    }

    fn rule(id: u64, line: u64, from: u64, to: u64, price: Money, peak: Decimal) -> FareRule {
        FareRule {
            id: FareRuleId(id),
            line: LineId(line),
            from: StationId(from),
            to: StationId(to),
            passenger_type: PassengerTypeId(1),
            valid_from: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            valid_to: None,
            price,
            peak_multiplier: peak,
        }
    }

    fn thb(amount: Decimal) -> Money {
        Money::new(amount, Currency::THB)
    }

    fn table(rules: Vec<FareRule>) -> FareTable {
        FareTable::build(FareData {
            passenger_types: vec![passenger(1, Decimal::ZERO), passenger(2, dec!(50))],
            rules,
        })
        .unwrap()
    }

    /// A on line 1 to C, walk to X, line 2 to Y.
    fn two_line_journey(walk_cost: Option<Money>) -> Journey {
        Journey::new(
            stop(101, "A"),
            vec![
                Segment::ride(
                    LineId(1),
                    vec![stop(101, "A"), stop(102, "B"), stop(103, "C")],
                    2.0,
                    Duration::minutes(20),
                ),
                Segment::walk(stop(103, "C"), stop(201, "X"), walk_cost, 0.2, Duration::minutes(3)),
                Segment::ride(
                    LineId(2),
                    vec![stop(201, "X"), stop(202, "Y")],
                    1.0,
                    Duration::minutes(10),
                ),
            ],
            43,
        )
        .unwrap()
    }

    /// 12:00 local (+07:00) on 2024-03-15
    fn off_peak() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 5, 0, 0).unwrap()
    }

    /// 08:00 local
    fn peak() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 1, 0, 0).unwrap()
    }

    #[test]
    fn sums_ride_fares() {
        let table = table(vec![
            rule(1, 1, 101, 103, thb(dec!(44)), Decimal::ONE),
            rule(2, 2, 201, 202, thb(dec!(16)), Decimal::ONE),
        ]);

        let priced = FareEngine::default()
            .price(&table, &two_line_journey(None), PassengerTypeId(1), off_peak())
            .unwrap();

        assert_eq!(priced.total, thb(dec!(60.00)));
        assert!(!priced.peak);
        assert_eq!(priced.segments.len(), 3);
        assert_eq!(priced.segments[0].source, FareSource::Rule(FareRuleId(1)));
        assert_eq!(priced.segments[1].source, FareSource::Free);
        assert_eq!(priced.segments[1].price, None);
    }

    #[test]
    fn walk_priced_at_interchange_cost() {
        let table = table(vec![
            rule(1, 1, 101, 103, thb(dec!(44)), Decimal::ONE),
            rule(2, 2, 201, 202, thb(dec!(16)), Decimal::ONE),
        ]);

        let priced = FareEngine::default()
            .price(
                &table,
                &two_line_journey(Some(thb(dec!(5)))),
                PassengerTypeId(1),
                off_peak(),
            )
            .unwrap();

        assert_eq!(priced.segments[1].source, FareSource::Interchange);
        assert_eq!(priced.total.amount, dec!(65));
    }

    #[test]
    fn peak_applies_each_rules_own_multiplier() {
        let table = table(vec![
            rule(1, 1, 101, 103, thb(dec!(44)), dec!(1.5)),
            rule(2, 2, 201, 202, thb(dec!(16)), Decimal::ONE),
        ]);

        let priced = FareEngine::default()
            .price(&table, &two_line_journey(Some(thb(dec!(5)))), PassengerTypeId(1), peak())
            .unwrap();

        assert!(priced.peak);
        assert_eq!(priced.segments[0].multiplier, dec!(1.5));
        assert_eq!(priced.segments[0].price, Some(thb(dec!(66.0))));
        // Walks never take a multiplier
        assert_eq!(priced.segments[1].multiplier, Decimal::ONE);
        assert_eq!(priced.total.amount, dec!(87));
    }

    #[test]
    fn total_uses_bankers_rounding() {
        let table = table(vec![
            rule(1, 1, 101, 103, thb(dec!(10.005)), Decimal::ONE),
            rule(2, 2, 201, 202, thb(dec!(10.01)), Decimal::ONE),
        ]);
        let engine = FareEngine::default();

        // 20.015 sits on a midpoint and goes up to the even neighbour
        let priced = engine
            .price(&table, &two_line_journey(None), PassengerTypeId(1), off_peak())
            .unwrap();
        assert_eq!(priced.total.amount, dec!(20.02));

        let table = self::table(vec![
            rule(1, 1, 101, 103, thb(dec!(10.005)), Decimal::ONE),
            rule(2, 2, 201, 202, thb(dec!(10.02)), Decimal::ONE),
        ]);
        let priced = engine
            .price(&table, &two_line_journey(None), PassengerTypeId(1), off_peak())
            .unwrap();
        // 20.025 likewise goes down to 20.02
        assert_eq!(priced.total.amount, dec!(20.02));
    }

    #[test]
    fn missing_rule_is_fare_not_found() {
        let table = table(vec![rule(1, 1, 101, 103, thb(dec!(44)), Decimal::ONE)]);

        let result = FareEngine::default().price(
            &table,
            &two_line_journey(None),
            PassengerTypeId(1),
            off_peak(),
        );

        assert_eq!(
            result.unwrap_err(),
            FareError::FareNotFound {
                line: LineId(2),
                from: StationId(201),
                to: StationId(202),
                passenger_type: PassengerTypeId(1),
                date: NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
            }
        );
    }

    #[test]
    fn rule_window_uses_local_date() {
        let mut late = rule(1, 1, 101, 103, thb(dec!(44)), Decimal::ONE);
        late.valid_from = NaiveDate::from_ymd_opt(2024, 3, 16).unwrap();
        let table = table(vec![late, rule(2, 2, 201, 202, thb(dec!(16)), Decimal::ONE)]);
        let engine = FareEngine::default();

        // 16:59 UTC on the 15th is 23:59 local, still the 15th
        let before = Utc.with_ymd_and_hms(2024, 3, 15, 16, 59, 0).unwrap();
        assert!(matches!(
            engine.price(&table, &two_line_journey(None), PassengerTypeId(1), before),
            Err(FareError::FareNotFound { .. })
        ));

        // 17:00 UTC is midnight local on the 16th
        let after = Utc.with_ymd_and_hms(2024, 3, 15, 17, 0, 0).unwrap();
        assert!(
            engine
                .price(&table, &two_line_journey(None), PassengerTypeId(1), after)
                .is_ok()
        );
    }

    #[test]
    fn currency_mismatch() {
        let jpy = Currency::parse("JPY").unwrap();
        let table = table(vec![
            rule(1, 1, 101, 103, thb(dec!(44)), Decimal::ONE),
            rule(2, 2, 201, 202, Money::new(dec!(200), jpy), Decimal::ONE),
        ]);

        let result = FareEngine::default().price(
            &table,
            &two_line_journey(None),
            PassengerTypeId(1),
            off_peak(),
        );

        assert_eq!(
            result.unwrap_err(),
            FareError::CurrencyMismatch {
                expected: Currency::THB,
                found: jpy,
            }
        );
    }

    #[test]
    fn peak_multiplier_overflow_is_an_error() {
        let table = table(vec![
            rule(1, 1, 101, 103, thb(Decimal::MAX), dec!(2)),
            rule(2, 2, 201, 202, thb(dec!(16)), Decimal::ONE),
        ]);
        let engine = FareEngine::default();

        assert_eq!(
            engine
                .price(&table, &two_line_journey(None), PassengerTypeId(1), peak())
                .unwrap_err(),
            FareError::PriceOverflow
        );
        // The same rule prices fine off-peak until the sum overflows
        assert_eq!(
            engine
                .price(&table, &two_line_journey(None), PassengerTypeId(1), off_peak())
                .unwrap_err(),
            FareError::PriceOverflow
        );
    }

    #[test]
    fn free_journey_totals_in_fallback_currency() {
        let table = table(vec![]);
        let jpy = Currency::parse("JPY").unwrap();

        let priced = FareEngine::default()
            .price_in(
                &table,
                &Journey::stay(stop(101, "A")),
                PassengerTypeId(1),
                off_peak(),
                jpy,
            )
            .unwrap();

        assert_eq!(priced.total, Money::new(Decimal::ZERO, jpy));
    }

    #[test]
    fn unknown_passenger_type() {
        let table = table(vec![]);
        let result = FareEngine::default().price(
            &table,
            &two_line_journey(None),
            PassengerTypeId(9),
            off_peak(),
        );
        assert_eq!(
            result.unwrap_err(),
            FareError::UnknownPassengerType(PassengerTypeId(9))
        );
    }

    #[test]
    fn zero_segment_journey_is_free() {
        let table = table(vec![]);
        let journey = Journey::stay(stop(101, "A"));

        let priced = FareEngine::default()
            .price(&table, &journey, PassengerTypeId(2), off_peak())
            .unwrap();

        assert_eq!(priced.total, thb(Decimal::ZERO));
        assert!(priced.segments.is_empty());
        // Discount is reported, never applied
        assert_eq!(priced.discount_percentage, dec!(50));
    }
}
