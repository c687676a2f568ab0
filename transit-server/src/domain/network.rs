//! Network snapshot records.
//!
//! These are the rows handed to the core by the external data-access layer.
//! They are plain data: cross-record invariants (positions contiguous within a
//! line, edges referencing known stations, ...) are enforced when a
//! [`NetworkGraph`](crate::network::NetworkGraph) is built from them.

use serde::{Deserialize, Serialize};

use super::{Currency, LineId, Money, OperatorId, StationCode, StationId};

/// A train operating company.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operator {
    pub id: OperatorId,
    pub name: String,
    pub code: String,
    /// Currency of the region the operator sells tickets in.
    #[serde(default)]
    pub currency: Option<Currency>,
}

/// A line run by one operator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub id: LineId,
    pub operator: OperatorId,
    pub name: String,
    /// Trains only run in order of increasing station position.
    #[serde(default)]
    pub one_way: bool,
}

/// A station on exactly one line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub id: StationId,
    pub name: String,
    pub code: StationCode,
    pub line: LineId,
    /// 1-based position along the line.
    pub position: u32,
}

/// An explicitly authored ride edge.
///
/// Used for express services between non-adjacent stations, and to declare
/// the real distance and duration of an adjacent pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    pub line: LineId,
    pub from: StationId,
    pub to: StationId,
    #[serde(default)]
    pub distance_km: Option<f64>,
    #[serde(default)]
    pub duration_mins: Option<i64>,
    #[serde(default = "default_true")]
    pub bidirectional: bool,
}

/// A walk link between stations on different lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interchange {
    pub from: StationId,
    pub to: StationId,
    pub walk_mins: i64,
    #[serde(default)]
    pub distance_km: Option<f64>,
    #[serde(default)]
    pub cost: Option<Money>,
    #[serde(default)]
    pub one_way: bool,
}

/// Everything needed to build one network graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkSnapshot {
    #[serde(default)]
    pub operators: Vec<Operator>,
    #[serde(default)]
    pub lines: Vec<Line>,
    #[serde(default)]
    pub stations: Vec<Station>,
    #[serde(default)]
    pub connections: Vec<Connection>,
    #[serde(default)]
    pub interchanges: Vec<Interchange>,
}

fn default_true() -> bool {
    true
}
