//! Errors raised while building a network graph.

use crate::domain::{LineId, OperatorId, StationId};

/// A snapshot failed validation. Nothing is built when this is returned.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GraphIntegrityError {
    #[error("{0} appears more than once")]
    DuplicateStation(StationId),

    #[error("{0} appears more than once")]
    DuplicateLine(LineId),

    #[error("{0} appears more than once")]
    DuplicateOperator(OperatorId),

    #[error("{line} references unknown {operator}")]
    UnknownOperator { line: LineId, operator: OperatorId },

    #[error("{station} references unknown {line}")]
    UnknownLine { station: StationId, line: LineId },

    #[error("{0} has no stations")]
    EmptyLine(LineId),

    /// Positions within a line must run 1..N with no gaps or repeats.
    #[error("{line}: expected position {expected}, found {found} at {station}")]
    BadPosition {
        line: LineId,
        station: StationId,
        expected: u32,
        found: u32,
    },

    #[error("edge references unknown {0}")]
    UnknownStation(StationId),

    #[error("connection references unknown {0}")]
    UnknownConnectionLine(LineId),

    #[error("connection on {line} references {station}, which is not on that line")]
    StationNotOnLine { line: LineId, station: StationId },

    #[error("edge from {0} to itself")]
    SelfLoop(StationId),

    #[error("interchange between {from} and {to} joins stations on the same line")]
    InterchangeOnSameLine { from: StationId, to: StationId },

    #[error("negative {what} on edge from {from} to {to}")]
    NegativeWeight {
        what: &'static str,
        from: StationId,
        to: StationId,
    },

    #[error("default {0} must not be negative")]
    NegativeDefault(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = GraphIntegrityError::UnknownLine {
            station: StationId(4),
            line: LineId(9),
        };
        assert_eq!(err.to_string(), "station #4 references unknown line #9");

        let err = GraphIntegrityError::BadPosition {
            line: LineId(1),
            station: StationId(3),
            expected: 2,
            found: 3,
        };
        assert_eq!(
            err.to_string(),
            "line #1: expected position 2, found 3 at station #3"
        );

        let err = GraphIntegrityError::NegativeWeight {
            what: "duration",
            from: StationId(1),
            to: StationId(2),
        };
        assert_eq!(
            err.to_string(),
            "negative duration on edge from station #1 to station #2"
        );
    }
}
