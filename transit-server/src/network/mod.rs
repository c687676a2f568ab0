//! The network graph.
//!
//! A weighted, directed multigraph over stations. It is built once per
//! snapshot in three ordered passes and is read-only afterwards, so it can be
//! shared across queries behind an `Arc`:
//!
//! 1. Intra-line adjacency: a ride edge between every adjacent pair of
//!    stations on a line, both ways unless the line is one-way, carrying the
//!    configured default distance and duration.
//! 2. Interchanges: walk edges between stations on different lines.
//! 3. Explicit connections: add a ride edge, or replace the adjacency edge on
//!    the same (line, from, to), with the authored distance and duration.

mod config;
mod connectivity;
mod error;
mod registry;

#[cfg(test)]
pub(crate) mod fixtures;

pub use config::NetworkConfig;
pub use connectivity::Connectivity;
pub use error::GraphIntegrityError;
pub use registry::{NetworkRegistry, Published};

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use tracing::debug;

use crate::domain::{
    Currency, Line, LineId, Money, NetworkSnapshot, Operator, OperatorId, Station, StationCode,
    StationId, Stop,
};

/// How an edge is travelled: aboard a given line, or on foot.
///
/// The planner charges a transfer penalty whenever consecutive edges differ in
/// mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Mode {
    Ride(LineId),
    Walk,
}

/// What an edge represents.
#[derive(Debug, Clone, PartialEq)]
pub enum EdgeKind {
    Ride { line: LineId },
    Walk { cost: Option<Money> },
}

/// A directed edge between two stations.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub from: StationId,
    pub to: StationId,
    pub kind: EdgeKind,
    pub distance_km: f64,
    pub duration_mins: i64,
}

impl Edge {
    pub fn mode(&self) -> Mode {
        match self.kind {
            EdgeKind::Ride { line } => Mode::Ride(line),
            EdgeKind::Walk { .. } => Mode::Walk,
        }
    }

    pub fn line(&self) -> Option<LineId> {
        match self.kind {
            EdgeKind::Ride { line } => Some(line),
            EdgeKind::Walk { .. } => None,
        }
    }

    pub fn is_walk(&self) -> bool {
        matches!(self.kind, EdgeKind::Walk { .. })
    }
}

/// Counts describing a built graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GraphSummary {
    pub operators: usize,
    pub lines: usize,
    pub stations: usize,
    pub ride_edges: usize,
    pub walk_edges: usize,
}

/// An immutable, validated network graph.
#[derive(Debug)]
pub struct NetworkGraph {
    operators: HashMap<OperatorId, Operator>,
    lines: BTreeMap<LineId, Line>,
    stations: BTreeMap<StationId, Station>,
    codes: HashMap<StationCode, StationId>,
    line_stations: HashMap<LineId, Vec<StationId>>,
    adjacency: HashMap<StationId, Vec<Edge>>,
    summary: GraphSummary,
}

impl NetworkGraph {
    /// Builds a graph from a snapshot.
    ///
    /// Validation is all-or-nothing: the first inconsistency found is
    /// returned and no graph is produced.
    ///
    /// # Examples
    ///
    /// ```
    /// use transit_server::domain::NetworkSnapshot;
    /// use transit_server::network::{GraphIntegrityError, NetworkConfig, NetworkGraph};
    ///
    /// let snapshot: NetworkSnapshot = serde_json::from_str(r#"{
    ///     "operators": [{"id": 1, "name": "Metro", "code": "MT"}],
    ///     "lines": [{"id": 1, "operator": 1, "name": "L"}],
    ///     "stations": [
    ///         {"id": 1, "name": "A", "code": "A", "line": 1, "position": 1},
    ///         {"id": 2, "name": "B", "code": "B", "line": 1, "position": 2}
    ///     ]
    /// }"#).unwrap();
    ///
    /// let graph = NetworkGraph::build(snapshot, &NetworkConfig::default()).unwrap();
    /// assert_eq!(graph.summary().ride_edges, 2);
    /// ```
    pub fn build(
        snapshot: NetworkSnapshot,
        config: &NetworkConfig,
    ) -> Result<Self, GraphIntegrityError> {
        if !is_non_negative(config.default_distance_km) {
            return Err(GraphIntegrityError::NegativeDefault("distance"));
        }
        if config.default_duration_mins < 0 {
            return Err(GraphIntegrityError::NegativeDefault("duration"));
        }

        let mut operators = HashMap::new();
        for operator in snapshot.operators {
            let id = operator.id;
            if operators.insert(id, operator).is_some() {
                return Err(GraphIntegrityError::DuplicateOperator(id));
            }
        }

        let mut lines = BTreeMap::new();
        for line in snapshot.lines {
            if !operators.contains_key(&line.operator) {
                return Err(GraphIntegrityError::UnknownOperator {
                    line: line.id,
                    operator: line.operator,
                });
            }
            let id = line.id;
            if lines.insert(id, line).is_some() {
                return Err(GraphIntegrityError::DuplicateLine(id));
            }
        }

        let mut stations = BTreeMap::new();
        let mut members: HashMap<LineId, Vec<(u32, StationId)>> = HashMap::new();
        for station in snapshot.stations {
            if !lines.contains_key(&station.line) {
                return Err(GraphIntegrityError::UnknownLine {
                    station: station.id,
                    line: station.line,
                });
            }
            members
                .entry(station.line)
                .or_default()
                .push((station.position, station.id));
            let id = station.id;
            if stations.insert(id, station).is_some() {
                return Err(GraphIntegrityError::DuplicateStation(id));
            }
        }

        let mut line_stations = HashMap::new();
        for &line in lines.keys() {
            let mut on_line = members
                .remove(&line)
                .ok_or(GraphIntegrityError::EmptyLine(line))?;
            on_line.sort_unstable();
            for (i, &(found, station)) in on_line.iter().enumerate() {
                let expected = i as u32 + 1;
                if found != expected {
                    return Err(GraphIntegrityError::BadPosition {
                        line,
                        station,
                        expected,
                        found,
                    });
                }
            }
            line_stations.insert(line, on_line.into_iter().map(|(_, id)| id).collect::<Vec<_>>());
        }

        let mut edges = EdgeSet::default();

        // Pass 1: adjacent stations on each line
        for (line_id, line) in &lines {
            for pair in line_stations[line_id].windows(2) {
                let ride = |from, to| Edge {
                    from,
                    to,
                    kind: EdgeKind::Ride { line: *line_id },
                    distance_km: config.default_distance_km,
                    duration_mins: config.default_duration_mins,
                };
                edges.upsert(ride(pair[0], pair[1]));
                if !line.one_way {
                    edges.upsert(ride(pair[1], pair[0]));
                }
            }
        }

        // Pass 2: interchange walks
        for interchange in snapshot.interchanges {
            let (from, to) = (interchange.from, interchange.to);
            let from_line = station_line(&stations, from)?;
            let to_line = station_line(&stations, to)?;
            if from == to {
                return Err(GraphIntegrityError::SelfLoop(from));
            }
            if from_line == to_line {
                return Err(GraphIntegrityError::InterchangeOnSameLine { from, to });
            }

            let distance_km = interchange.distance_km.unwrap_or(0.0);
            check_weights(from, to, distance_km, interchange.walk_mins)?;
            if interchange.cost.is_some_and(|c| c.amount.is_sign_negative()) {
                return Err(GraphIntegrityError::NegativeWeight {
                    what: "cost",
                    from,
                    to,
                });
            }

            let walk = |from, to| Edge {
                from,
                to,
                kind: EdgeKind::Walk {
                    cost: interchange.cost,
                },
                distance_km,
                duration_mins: interchange.walk_mins,
            };
            edges.upsert(walk(from, to));
            if !interchange.one_way {
                edges.upsert(walk(to, from));
            }
        }

        // Pass 3: authored connections
        for connection in snapshot.connections {
            let (line, from, to) = (connection.line, connection.from, connection.to);
            if !lines.contains_key(&line) {
                return Err(GraphIntegrityError::UnknownConnectionLine(line));
            }
            for station in [from, to] {
                if station_line(&stations, station)? != line {
                    return Err(GraphIntegrityError::StationNotOnLine { line, station });
                }
            }
            if from == to {
                return Err(GraphIntegrityError::SelfLoop(from));
            }

            let distance_km = connection
                .distance_km
                .unwrap_or(config.default_distance_km);
            let duration_mins = connection
                .duration_mins
                .unwrap_or(config.default_duration_mins);
            check_weights(from, to, distance_km, duration_mins)?;

            let ride = |from, to| Edge {
                from,
                to,
                kind: EdgeKind::Ride { line },
                distance_km,
                duration_mins,
            };
            edges.upsert(ride(from, to));
            if connection.bidirectional {
                edges.upsert(ride(to, from));
            }
        }

        let adjacency = edges.finish();
        let (walk_edges, ride_edges) = adjacency
            .values()
            .flatten()
            .fold((0, 0), |(walks, rides), edge| {
                if edge.is_walk() {
                    (walks + 1, rides)
                } else {
                    (walks, rides + 1)
                }
            });

        let mut codes = HashMap::new();
        for station in stations.values() {
            codes.entry(station.code.clone()).or_insert(station.id);
        }

        let summary = GraphSummary {
            operators: operators.len(),
            lines: lines.len(),
            stations: stations.len(),
            ride_edges,
            walk_edges,
        };
        debug!(
            stations = summary.stations,
            lines = summary.lines,
            ride_edges,
            walk_edges,
            "Built network graph"
        );

        Ok(NetworkGraph {
            operators,
            lines,
            stations,
            codes,
            line_stations,
            adjacency,
            summary,
        })
    }

    /// Look up a station by identity.
    pub fn station(&self, id: StationId) -> Option<&Station> {
        self.stations.get(&id)
    }

    /// Look up a station by code.
    ///
    /// Codes are not guaranteed unique across lines; when several stations
    /// share a code the one with the lowest identity is returned.
    pub fn station_by_code(&self, code: &StationCode) -> Option<&Station> {
        self.codes.get(code).and_then(|id| self.stations.get(id))
    }

    /// Returns true if the station exists in this graph.
    pub fn contains(&self, id: StationId) -> bool {
        self.stations.contains_key(&id)
    }

    /// The journey stop for a station.
    pub fn stop(&self, id: StationId) -> Option<Stop> {
        self.station(id).map(|s| Stop::new(s.id, s.code.clone()))
    }

    /// All stations, in identity order.
    pub fn stations(&self) -> impl Iterator<Item = &Station> {
        self.stations.values()
    }

    pub fn line(&self, id: LineId) -> Option<&Line> {
        self.lines.get(&id)
    }

    /// All lines, in identity order.
    pub fn lines(&self) -> impl Iterator<Item = &Line> {
        self.lines.values()
    }

    pub fn operator(&self, id: OperatorId) -> Option<&Operator> {
        self.operators.get(&id)
    }

    /// The currency of the operator running a station's line, if it has one.
    pub fn station_currency(&self, id: StationId) -> Option<Currency> {
        let line = self.line(self.station(id)?.line)?;
        self.operator(line.operator)?.currency
    }

    /// The stations of a line in position order.
    pub fn line_stations(&self, line: LineId) -> &[StationId] {
        self.line_stations
            .get(&line)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Outgoing edges of a station, ordered by target then mode.
    pub fn edges_from(&self, station: StationId) -> &[Edge] {
        self.adjacency
            .get(&station)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn summary(&self) -> GraphSummary {
        self.summary
    }
}

/// Edges under construction, keyed so that a later pass can replace an
/// earlier edge on the same (from, to, mode).
#[derive(Default)]
struct EdgeSet {
    edges: BTreeMap<(StationId, StationId, Mode), Edge>,
}

impl EdgeSet {
    fn upsert(&mut self, edge: Edge) {
        self.edges.insert((edge.from, edge.to, edge.mode()), edge);
    }

    fn finish(self) -> HashMap<StationId, Vec<Edge>> {
        let mut adjacency: HashMap<StationId, Vec<Edge>> = HashMap::new();
        // BTreeMap order gives each list a stable (to, mode) ordering
        for ((from, _, _), edge) in self.edges {
            adjacency.entry(from).or_default().push(edge);
        }
        adjacency
    }
}

fn station_line(
    stations: &BTreeMap<StationId, Station>,
    id: StationId,
) -> Result<LineId, GraphIntegrityError> {
    stations
        .get(&id)
        .map(|s| s.line)
        .ok_or(GraphIntegrityError::UnknownStation(id))
}

fn check_weights(
    from: StationId,
    to: StationId,
    distance_km: f64,
    duration_mins: i64,
) -> Result<(), GraphIntegrityError> {
    if !is_non_negative(distance_km) {
        return Err(GraphIntegrityError::NegativeWeight {
            what: "distance",
            from,
            to,
        });
    }
    if duration_mins < 0 {
        return Err(GraphIntegrityError::NegativeWeight {
            what: "duration",
            from,
            to,
        });
    }
    Ok(())
}

fn is_non_negative(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}
