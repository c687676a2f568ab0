//! Domain error types.
//!
//! These errors represent validation failures in the domain layer. They are
//! distinct from search, fare and ticket errors.

use super::{LineId, StationId};

/// Domain-level errors for journey construction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    /// A ride must call at two or more stations
    #[error("ride on {0} must call at two or more stations")]
    ShortRide(LineId),

    /// Consecutive segments don't connect
    #[error("{0} and {1} are not connected")]
    StationsNotConnected(StationId, StationId),

    /// Two consecutive rides on the same line should have been one ride
    #[error("consecutive rides on {0} must be coalesced")]
    UncoalescedRide(LineId),

    /// A segment has no stops at all
    #[error("journey segment has no stops")]
    EmptyJourney,
}
