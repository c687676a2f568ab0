//! Hand-built networks for tests.

use crate::domain::{
    Connection, Currency, Interchange, Line, LineId, Money, NetworkSnapshot, Operator,
    OperatorId, Station, StationCode, StationId,
};

use super::{NetworkConfig, NetworkGraph};

/// Builds a snapshot line by line. Station identities are
/// `line * 100 + position`, so `A` on line 1 at position 1 is station 101.
pub(crate) struct SnapshotBuilder {
    snapshot: NetworkSnapshot,
}

impl SnapshotBuilder {
    pub(crate) fn new() -> Self {
        let snapshot = NetworkSnapshot {
            operators: vec![Operator {
                id: OperatorId(1),
                name: "Metro".into(),
                code: "MT".into(),
                currency: Currency::parse("THB").ok(),
            }],
            ..NetworkSnapshot::default()
        };
        Self { snapshot }
    }

    pub(crate) fn line(self, id: u64, codes: &[&str]) -> Self {
        self.add_line(id, codes, false)
    }

    pub(crate) fn one_way_line(self, id: u64, codes: &[&str]) -> Self {
        self.add_line(id, codes, true)
    }

    fn add_line(mut self, id: u64, codes: &[&str], one_way: bool) -> Self {
        self.snapshot.lines.push(Line {
            id: LineId(id),
            operator: OperatorId(1),
            name: format!("Line {id}"),
            one_way,
        });
        for (i, code) in codes.iter().enumerate() {
            let position = i as u32 + 1;
            self.snapshot.stations.push(Station {
                id: StationId(id * 100 + u64::from(position)),
                name: format!("{code} station"),
                code: StationCode::parse(code).unwrap(),
                line: LineId(id),
                position,
            });
        }
        self
    }

    pub(crate) fn interchange(self, from: &str, to: &str, walk_mins: i64) -> Self {
        self.add_interchange(from, to, walk_mins, None, false)
    }

    pub(crate) fn paid_interchange(self, from: &str, to: &str, walk_mins: i64, thb: i64) -> Self {
        let cost = Money::new(thb.into(), Currency::parse("THB").unwrap());
        self.add_interchange(from, to, walk_mins, Some(cost), false)
    }

    pub(crate) fn one_way_interchange(self, from: &str, to: &str, walk_mins: i64) -> Self {
        self.add_interchange(from, to, walk_mins, None, true)
    }

    fn add_interchange(
        mut self,
        from: &str,
        to: &str,
        walk_mins: i64,
        cost: Option<Money>,
        one_way: bool,
    ) -> Self {
        let (from, to) = (self.id(from), self.id(to));
        self.snapshot.interchanges.push(Interchange {
            from,
            to,
            walk_mins,
            distance_km: None,
            cost,
            one_way,
        });
        self
    }

    pub(crate) fn connection(mut self, line: u64, from: &str, to: &str, km: f64, mins: i64) -> Self {
        let (from, to) = (self.id(from), self.id(to));
        self.snapshot.connections.push(Connection {
            line: LineId(line),
            from,
            to,
            distance_km: Some(km),
            duration_mins: Some(mins),
            bidirectional: true,
        });
        self
    }

    pub(crate) fn id(&self, code: &str) -> StationId {
        self.snapshot
            .stations
            .iter()
            .find(|s| s.code.as_str() == code)
            .map(|s| s.id)
            .unwrap_or_else(|| panic!("no station {code}"))
    }

    pub(crate) fn snapshot(self) -> NetworkSnapshot {
        self.snapshot
    }

    pub(crate) fn graph(self) -> NetworkGraph {
        NetworkGraph::build(self.snapshot, &NetworkConfig::default()).unwrap()
    }
}

/// Looks up a station identity by code in a built graph.
pub(crate) fn id(graph: &NetworkGraph, code: &str) -> StationId {
    let code = StationCode::parse(code).unwrap();
    graph
        .station_by_code(&code)
        .map(|s| s.id)
        .unwrap_or_else(|| panic!("no station {code}"))
}
