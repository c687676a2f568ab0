//! Ranked shortest-path journey search.
//!
//! The best route is found with Dijkstra over (station, arrival mode) states:
//! the mode a station was reached by decides whether the next edge pays the
//! transfer penalty. Runner-up routes come from spur searches off each route
//! already accepted, with the edges that would recreate an accepted route
//! removed.

use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashSet};

use chrono::Duration;
use tracing::{debug, trace};

use crate::domain::{DomainError, Journey, LineId, Segment, StationCode, StationId, Stop};
use crate::network::{Edge, EdgeKind, Mode, NetworkGraph};

use super::config::PlannerConfig;
use super::rank::{deduplicate, rank_journeys};

/// Error from journey search.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SearchError {
    /// Origin or destination is not in the graph
    #[error("unknown {0}")]
    UnknownStation(StationId),

    /// The stations are not joined by any path
    #[error("no route from {origin} to {destination}")]
    NoRouteFound {
        origin: StationId,
        destination: StationId,
    },

    /// Invalid search request
    #[error("invalid search request: {0}")]
    InvalidRequest(&'static str),

    /// A path could not be turned into a journey
    #[error("could not assemble journey: {0}")]
    InvalidJourney(#[from] DomainError),
}

/// Request for journey search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchRequest {
    pub origin: StationId,
    pub destination: StationId,

    /// How many journeys to return. Falls back to the configured default.
    pub max_results: Option<usize>,
}

impl SearchRequest {
    /// Create a new search request.
    pub fn new(origin: StationId, destination: StationId) -> Self {
        Self {
            origin,
            destination,
            max_results: None,
        }
    }

    /// Ask for a specific number of journeys.
    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = Some(max_results);
        self
    }

    /// Validate the search request against a graph.
    pub fn validate(&self, graph: &NetworkGraph) -> Result<(), SearchError> {
        for station in [self.origin, self.destination] {
            if !graph.contains(station) {
                return Err(SearchError::UnknownStation(station));
            }
        }

        if self.max_results == Some(0) {
            return Err(SearchError::InvalidRequest(
                "max_results must be at least 1",
            ));
        }

        Ok(())
    }
}

/// Result of journey search.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// Found journeys, ranked best-first.
    pub journeys: Vec<Journey>,

    /// Number of search states settled across all searches.
    pub routes_explored: usize,
}

/// Journey planner.
///
/// Holds no state between calls; one planner can serve any number of
/// concurrent searches over any graph.
#[derive(Debug, Clone, Default)]
pub struct Planner {
    config: PlannerConfig,
}

impl Planner {
    /// Create a new planner.
    pub fn new(config: PlannerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Find up to `max_results` journeys, best first.
    ///
    /// Identical arguments over the same graph always give identical results.
    ///
    /// # Errors
    ///
    /// [`SearchError::UnknownStation`] if either station is missing from the
    /// graph, [`SearchError::NoRouteFound`] if no path joins them.
    pub fn find_journeys(
        &self,
        graph: &NetworkGraph,
        request: &SearchRequest,
    ) -> Result<SearchResult, SearchError> {
        request.validate(graph)?;
        if self.config.transfer_penalty_mins < 0 {
            return Err(SearchError::InvalidRequest(
                "transfer penalty must not be negative",
            ));
        }

        let SearchRequest {
            origin,
            destination,
            ..
        } = *request;
        let limit = self.config.results_for(request.max_results);
        let penalty = self.config.transfer_penalty_mins;

        if origin == destination {
            let stop = graph
                .stop(origin)
                .ok_or(SearchError::UnknownStation(origin))?;
            return Ok(SearchResult {
                journeys: vec![Journey::stay(stop)],
                routes_explored: 0,
            });
        }

        debug!(%origin, %destination, limit, penalty, "Starting journey search");

        let mut explored = 0;
        let start = Path::start(graph, origin).ok_or(SearchError::UnknownStation(origin))?;
        let Some(best) = shortest(graph, start, destination, &HashSet::new(), penalty, &mut explored)
        else {
            debug!(%origin, %destination, explored, "No route found");
            return Err(SearchError::NoRouteFound {
                origin,
                destination,
            });
        };

        let mut seen: HashSet<Vec<StationId>> = HashSet::from([best.stations.clone()]);
        let mut accepted = vec![best];
        let mut candidates: Vec<Path<'_>> = Vec::new();

        while accepted.len() < limit {
            let previous = &accepted[accepted.len() - 1];

            for spur in 0..previous.edges.len() {
                let root = previous.prefix(spur, penalty);

                // Edges that would lead back onto an accepted route
                let banned: HashSet<EdgeKey> = accepted
                    .iter()
                    .filter(|p| p.edges.len() > spur && p.stations[..=spur] == root.stations[..])
                    .map(|p| EdgeKey::of(p.edges[spur]))
                    .collect();

                trace!(
                    spur_station = %root.end(),
                    root_edges = spur,
                    banned = banned.len(),
                    "Spur search"
                );

                if let Some(path) = shortest(graph, root, destination, &banned, penalty, &mut explored) {
                    if seen.insert(path.stations.clone()) {
                        candidates.push(path);
                    }
                }
            }

            let Some(next) = candidates
                .iter()
                .enumerate()
                .min_by(|(_, a), (_, b)| a.cmp(b))
                .map(|(i, _)| i)
            else {
                break;
            };
            accepted.push(candidates.swap_remove(next));
        }

        let journeys = accepted
            .iter()
            .map(|path| materialize(graph, path))
            .collect::<Result<Vec<_>, _>>()?;
        let journeys = deduplicate(rank_journeys(journeys));

        debug!(
            found = journeys.len(),
            routes_explored = explored,
            "Journey search complete"
        );

        Ok(SearchResult {
            journeys,
            routes_explored: explored,
        })
    }
}

/// Identifies an edge for removal during spur searches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct EdgeKey {
    from: StationId,
    to: StationId,
    mode: Mode,
}

impl EdgeKey {
    fn of(edge: &Edge) -> Self {
        Self {
            from: edge.from,
            to: edge.to,
            mode: edge.mode(),
        }
    }
}

/// A partial path during search, ordered by (weight, transfers, codes).
#[derive(Debug, Clone)]
struct Path<'g> {
    weight: i64,
    transfers: usize,
    stations: Vec<StationId>,
    codes: Vec<&'g StationCode>,
    edges: Vec<&'g Edge>,
}

impl<'g> Path<'g> {
    fn start(graph: &'g NetworkGraph, station: StationId) -> Option<Self> {
        let code = &graph.station(station)?.code;
        Some(Path {
            weight: 0,
            transfers: 0,
            stations: vec![station],
            codes: vec![code],
            edges: Vec::new(),
        })
    }

    fn end(&self) -> StationId {
        self.stations[self.stations.len() - 1]
    }

    fn mode(&self) -> Option<Mode> {
        self.edges.last().map(|e| e.mode())
    }

    fn visits(&self, station: StationId) -> bool {
        self.stations.contains(&station)
    }

    /// Extends the path along `edge`.
    ///
    /// The penalty is paid when the mode changes, and on every walk after the
    /// first edge: consecutive walks are separate interchanges.
    fn extend(&self, edge: &'g Edge, code: &'g StationCode, penalty: i64) -> Self {
        let transfer = self
            .mode()
            .is_some_and(|mode| edge.is_walk() || mode != edge.mode());

        let mut next = self.clone();
        next.weight += edge.duration_mins + if transfer { penalty } else { 0 };
        next.transfers += usize::from(transfer);
        next.stations.push(edge.to);
        next.codes.push(code);
        next.edges.push(edge);
        next
    }

    /// The first `edges` edges of this path, with weight recomputed.
    fn prefix(&self, edges: usize, penalty: i64) -> Self {
        let mut root = Path {
            weight: 0,
            transfers: 0,
            stations: vec![self.stations[0]],
            codes: vec![self.codes[0]],
            edges: Vec::new(),
        };
        for (&edge, &code) in self.edges[..edges].iter().zip(&self.codes[1..]) {
            root = root.extend(edge, code, penalty);
        }
        root
    }

    fn key(&self) -> (i64, usize, &[&'g StationCode]) {
        (self.weight, self.transfers, &self.codes)
    }
}

impl PartialEq for Path<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Path<'_> {}

impl PartialOrd for Path<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Path<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

/// Best simple path from the end of `start` to `destination`, avoiding
/// `banned` edges and every station already on `start`.
fn shortest<'g>(
    graph: &'g NetworkGraph,
    start: Path<'g>,
    destination: StationId,
    banned: &HashSet<EdgeKey>,
    penalty: i64,
    explored: &mut usize,
) -> Option<Path<'g>> {
    let mut settled: HashSet<(StationId, Option<Mode>)> = HashSet::new();
    let mut heap = BinaryHeap::from([Reverse(start)]);

    while let Some(Reverse(path)) = heap.pop() {
        if !settled.insert((path.end(), path.mode())) {
            continue;
        }
        *explored += 1;

        if path.end() == destination {
            return Some(path);
        }

        for edge in graph.edges_from(path.end()) {
            if path.visits(edge.to) || banned.contains(&EdgeKey::of(edge)) {
                continue;
            }
            let Some(station) = graph.station(edge.to) else {
                continue;
            };
            heap.push(Reverse(path.extend(edge, &station.code, penalty)));
        }
    }

    None
}

/// A ride being assembled from consecutive same-line edges.
struct OpenRide {
    line: LineId,
    stops: Vec<Stop>,
    distance_km: f64,
    duration_mins: i64,
}

impl OpenRide {
    fn finish(self) -> Segment {
        Segment::ride(
            self.line,
            self.stops,
            self.distance_km,
            Duration::minutes(self.duration_mins),
        )
    }
}

/// Turns a path into a journey, coalescing same-line hops into one ride.
fn materialize(graph: &NetworkGraph, path: &Path<'_>) -> Result<Journey, SearchError> {
    let stop = |id| graph.stop(id).ok_or(SearchError::UnknownStation(id));

    let mut segments = Vec::new();
    let mut ride: Option<OpenRide> = None;

    for edge in &path.edges {
        match &edge.kind {
            EdgeKind::Ride { line } => {
                if ride.as_ref().is_some_and(|open| open.line == *line) {
                    if let Some(open) = ride.as_mut() {
                        open.stops.push(stop(edge.to)?);
                        open.distance_km += edge.distance_km;
                        open.duration_mins += edge.duration_mins;
                    }
                } else {
                    segments.extend(ride.take().map(OpenRide::finish));
                    ride = Some(OpenRide {
                        line: *line,
                        stops: vec![stop(edge.from)?, stop(edge.to)?],
                        distance_km: edge.distance_km,
                        duration_mins: edge.duration_mins,
                    });
                }
            }
            EdgeKind::Walk { cost } => {
                segments.extend(ride.take().map(OpenRide::finish));
                segments.push(Segment::walk(
                    stop(edge.from)?,
                    stop(edge.to)?,
                    *cost,
                    edge.distance_km,
                    Duration::minutes(edge.duration_mins),
                ));
            }
        }
    }
    segments.extend(ride.take().map(OpenRide::finish));

    Ok(Journey::new(stop(path.stations[0])?, segments, path.weight)?)
}

#[cfg(test)]
#[path = "search_tests.rs"]
mod tests;
