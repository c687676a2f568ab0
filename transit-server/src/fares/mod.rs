//! Fare engine.
//!
//! Prices journeys under a route- and passenger-type-dependent fare matrix.
//! Fares are authored per ride (line, boarding station, alighting station,
//! passenger type) with dated validity windows; there is no interpolation,
//! so an unauthored ride has no price.

mod config;
mod engine;
mod error;
mod table;

pub use config::{FareConfig, PeakWindow};
pub use engine::{FareEngine, FareSource, PricedJourney, PricedSegment};
pub use error::{FareError, FareTableError};
pub use table::{FareData, FareMatrixRow, FareRule, FareTable};
