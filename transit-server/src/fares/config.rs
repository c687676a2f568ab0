//! Fare engine configuration.

use chrono::{DateTime, Duration, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::Currency;

/// A daily window of local time in which peak pricing applies.
///
/// The window is half-open: it includes `start` and excludes `end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeakWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl PeakWindow {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    /// Builds a window from whole hours, e.g. `hours(7, 10)` for 07:00-10:00.
    pub fn hours(start: u32, end: u32) -> Option<Self> {
        Some(Self {
            start: NaiveTime::from_hms_opt(start, 0, 0)?,
            end: NaiveTime::from_hms_opt(end, 0, 0)?,
        })
    }

    pub fn contains(&self, time: NaiveTime) -> bool {
        self.start <= time && time < self.end
    }
}

/// Configuration for fare resolution.
#[derive(Debug, Clone)]
pub struct FareConfig {
    /// Offset of the network's local time from UTC (minutes).
    /// Fare windows and peak hours are in local time.
    pub utc_offset_minutes: i64,

    /// Local-time windows in which rule peak multipliers apply.
    pub peak_windows: Vec<PeakWindow>,

    /// Currency of a journey that has nothing to charge for.
    pub default_currency: Currency,
}

impl FareConfig {
    /// Create a new configuration with the given parameters.
    pub fn new(
        utc_offset_minutes: i64,
        peak_windows: Vec<PeakWindow>,
        default_currency: Currency,
    ) -> Self {
        Self {
            utc_offset_minutes,
            peak_windows,
            default_currency,
        }
    }

    /// Returns the UTC offset as a Duration.
    pub fn utc_offset(&self) -> Duration {
        Duration::minutes(self.utc_offset_minutes)
    }

    /// Converts an instant to the network's local date and time.
    pub fn local(&self, at: DateTime<Utc>) -> NaiveDateTime {
        at.naive_utc() + self.utc_offset()
    }

    /// True if the instant falls in a peak window, in local time.
    pub fn is_peak(&self, at: DateTime<Utc>) -> bool {
        let time = self.local(at).time();
        self.peak_windows.iter().any(|w| w.contains(time))
    }
}

impl Default for FareConfig {
    fn default() -> Self {
        Self {
            utc_offset_minutes: 7 * 60, // Asia/Bangkok
            peak_windows: [PeakWindow::hours(7, 10), PeakWindow::hours(17, 20)]
                .into_iter()
                .flatten()
                .collect(),
            default_currency: Currency::THB,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, h, m, 0).unwrap()
    }

    #[test]
    fn default_config() {
        let config = FareConfig::default();

        assert_eq!(config.utc_offset_minutes, 420);
        assert_eq!(config.utc_offset(), Duration::hours(7));
        assert_eq!(config.peak_windows.len(), 2);
        assert_eq!(config.default_currency.as_str(), "THB");
    }

    #[test]
    fn local_time_crosses_midnight() {
        let config = FareConfig::default();
        let local = config.local(utc(20, 30));

        assert_eq!(local.date(), chrono::NaiveDate::from_ymd_opt(2024, 3, 16).unwrap());
        assert_eq!(local.time(), NaiveTime::from_hms_opt(3, 30, 0).unwrap());
    }

    #[test]
    fn peak_windows_are_half_open() {
        let config = FareConfig::default();

        // 00:00 UTC is 07:00 local
        assert!(config.is_peak(utc(0, 0)));
        assert!(config.is_peak(utc(2, 59)));
        // 03:00 UTC is 10:00 local
        assert!(!config.is_peak(utc(3, 0)));
        // 10:00 UTC is 17:00 local
        assert!(config.is_peak(utc(10, 0)));
        assert!(!config.is_peak(utc(13, 0)));
    }
}
