//! Unit tests for journey search.

use super::*;
use crate::domain::SegmentKind;
use crate::network::fixtures::{SnapshotBuilder, id};

fn planner() -> Planner {
    Planner::new(PlannerConfig::default())
}

fn search(graph: &NetworkGraph, from: &str, to: &str) -> Result<SearchResult, SearchError> {
    planner().find_journeys(graph, &SearchRequest::new(id(graph, from), id(graph, to)))
}

fn codes(journey: &Journey) -> Vec<&str> {
    journey.station_codes().map(|c| c.as_str()).collect()
}

/// Line 1 runs A-M-Z. Line 2 is a single fast hop P-Q, reached from A and
/// left for Z by short walks.
fn shortcut_graph(pq_mins: i64) -> NetworkGraph {
    SnapshotBuilder::new()
        .line(1, &["A", "M", "Z"])
        .line(2, &["P", "Q"])
        .connection(2, "P", "Q", 1.0, pq_mins)
        .interchange("A", "P", 1)
        .interchange("Q", "Z", 1)
        .graph()
}

#[test]
fn direct_journey() {
    let graph = SnapshotBuilder::new().line(1, &["A", "B", "C"]).graph();

    let result = search(&graph, "A", "C").unwrap();

    assert_eq!(result.journeys.len(), 1);
    let journey = &result.journeys[0];
    assert_eq!(journey.segment_count(), 1);
    assert!(journey.is_direct());
    assert_eq!(codes(journey), vec!["A", "B", "C"]);
    assert_eq!(journey.weight_mins(), 20);
    assert_eq!(journey.total_duration(), Duration::minutes(20));
    assert_eq!(journey.total_distance_km(), 2.0);
}

#[test]
fn direct_journey_from_middle() {
    let graph = SnapshotBuilder::new().line(1, &["A", "B", "C", "D"]).graph();

    let result = search(&graph, "C", "A").unwrap();

    assert_eq!(codes(&result.journeys[0]), vec!["C", "B", "A"]);
}

#[test]
fn journey_with_walk() {
    let graph = SnapshotBuilder::new()
        .line(1, &["A", "B"])
        .line(2, &["X", "Y"])
        .paid_interchange("B", "X", 3, 5)
        .graph();

    let result = search(&graph, "A", "Y").unwrap();
    let journey = &result.journeys[0];

    assert_eq!(journey.segment_count(), 3);
    assert_eq!(journey.ride_count(), 2);
    assert_eq!(journey.transfer_count(), 2);
    // 10 + 3 + 10 minutes, two transfers at 5 each
    assert_eq!(journey.weight_mins(), 33);
    assert_eq!(journey.total_duration(), Duration::minutes(23));

    let walk = journey.segments()[1].as_walk().unwrap();
    assert_eq!(walk.from.code.as_str(), "B");
    assert_eq!(walk.to.code.as_str(), "X");
    assert!(walk.cost.is_some());
    assert!(journey.segments()[1].transfer);
    assert!(journey.segments()[2].transfer);
}

#[test]
fn weight_is_minutes_plus_penalty_per_transfer() {
    let graph = shortcut_graph(1);
    let result = planner()
        .find_journeys(
            &graph,
            &SearchRequest::new(id(&graph, "A"), id(&graph, "Z")).with_max_results(5),
        )
        .unwrap();

    let penalty = PlannerConfig::default().transfer_penalty_mins;
    for journey in &result.journeys {
        let transfers = journey.segment_count() as i64 - 1;
        assert_eq!(
            journey.weight_mins(),
            journey.total_duration().num_minutes() + penalty * transfers
        );
    }
}

#[test]
fn penalty_decides_between_direct_and_shortcut() {
    let graph = shortcut_graph(1);

    // 3 minutes travelled plus two transfers beats 20 minutes direct
    let result = search(&graph, "A", "Z").unwrap();
    assert_eq!(codes(&result.journeys[0]), vec!["A", "P", "Q", "Z"]);
    assert_eq!(result.journeys[0].weight_mins(), 13);

    // With a heavier penalty the direct ride wins
    let planner = Planner::new(PlannerConfig::new(3, 10, 10));
    let result = planner
        .find_journeys(&graph, &SearchRequest::new(id(&graph, "A"), id(&graph, "Z")))
        .unwrap();
    assert_eq!(codes(&result.journeys[0]), vec!["A", "M", "Z"]);
    assert!(result.journeys[0].is_direct());
}

#[test]
fn ties_prefer_fewer_transfers() {
    // 1 + 8 + 1 minutes plus two penalties of 5 equals the 20 minute ride
    let graph = shortcut_graph(8);

    let result = search(&graph, "A", "Z").unwrap();

    assert_eq!(result.journeys.len(), 2);
    assert_eq!(result.journeys[0].weight_mins(), 20);
    assert_eq!(result.journeys[1].weight_mins(), 20);
    assert!(result.journeys[0].is_direct());
    assert_eq!(result.journeys[1].transfer_count(), 2);
}

#[test]
fn ties_then_prefer_lower_station_codes() {
    // Positions A, C, D, B: C has the lower identity but B the lower code
    let graph = SnapshotBuilder::new()
        .line(1, &["A", "C", "D", "B"])
        .connection(1, "A", "B", 1.0, 10)
        .graph();

    let result = search(&graph, "A", "D").unwrap();

    assert_eq!(result.journeys.len(), 2);
    assert_eq!(codes(&result.journeys[0]), vec!["A", "B", "D"]);
    assert_eq!(codes(&result.journeys[1]), vec!["A", "C", "D"]);
}

#[test]
fn express_connection_is_shortest() {
    let graph = SnapshotBuilder::new()
        .line(1, &["A", "B", "C", "D"])
        .connection(1, "A", "D", 3.0, 25)
        .graph();

    let result = search(&graph, "A", "D").unwrap();

    assert_eq!(codes(&result.journeys[0]), vec!["A", "D"]);
    assert_eq!(result.journeys[0].weight_mins(), 25);
    assert_eq!(codes(&result.journeys[1]), vec!["A", "B", "C", "D"]);
}

#[test]
fn same_line_hops_coalesce() {
    // Express A-C then ordinary C-D: still one ride on line 1
    let graph = SnapshotBuilder::new()
        .line(1, &["A", "B", "C", "D"])
        .connection(1, "A", "C", 2.0, 5)
        .graph();

    let result = search(&graph, "A", "D").unwrap();
    let journey = &result.journeys[0];

    assert_eq!(journey.segment_count(), 1);
    let SegmentKind::Ride(ride) = &journey.segments()[0].kind else {
        panic!("expected a ride");
    };
    assert_eq!(ride.line, crate::domain::LineId(1));
    assert_eq!(ride.stops.len(), 3);
    assert_eq!(journey.total_duration(), Duration::minutes(15));
}

#[test]
fn top_k_returns_distinct_ranked_journeys() {
    let graph = shortcut_graph(1);

    let result = planner()
        .find_journeys(
            &graph,
            &SearchRequest::new(id(&graph, "A"), id(&graph, "Z")).with_max_results(10),
        )
        .unwrap();

    assert!(result.journeys.len() >= 2);
    for window in result.journeys.windows(2) {
        assert!(window[0].weight_mins() <= window[1].weight_mins());
        assert_ne!(codes(&window[0]), codes(&window[1]));
    }
}

#[test]
fn default_result_count_comes_from_config() {
    let graph = SnapshotBuilder::new()
        .line(1, &["A", "B", "C", "D"])
        .connection(1, "A", "C", 2.0, 5)
        .connection(1, "B", "D", 2.0, 5)
        .connection(1, "A", "D", 2.0, 40)
        .graph();

    let planner = Planner::new(PlannerConfig::new(1, 10, 5));
    let result = planner
        .find_journeys(&graph, &SearchRequest::new(id(&graph, "A"), id(&graph, "D")))
        .unwrap();

    assert_eq!(result.journeys.len(), 1);
}

#[test]
fn same_origin_and_destination() {
    let graph = SnapshotBuilder::new().line(1, &["A", "B"]).graph();

    let result = search(&graph, "A", "A").unwrap();

    assert_eq!(result.journeys.len(), 1);
    assert_eq!(result.journeys[0].segment_count(), 0);
    assert_eq!(result.journeys[0].weight_mins(), 0);
}

#[test]
fn unknown_station() {
    let graph = SnapshotBuilder::new().line(1, &["A", "B"]).graph();

    let result = planner().find_journeys(
        &graph,
        &SearchRequest::new(id(&graph, "A"), StationId(999)),
    );

    assert_eq!(result.unwrap_err(), SearchError::UnknownStation(StationId(999)));
}

#[test]
fn no_route_between_disconnected_lines() {
    let graph = SnapshotBuilder::new()
        .line(1, &["A", "B"])
        .line(2, &["X", "Y"])
        .graph();

    let result = search(&graph, "A", "Y");

    assert!(matches!(result, Err(SearchError::NoRouteFound { .. })));
}

#[test]
fn one_way_line_has_no_return() {
    let graph = SnapshotBuilder::new().one_way_line(1, &["A", "B", "C"]).graph();

    assert!(search(&graph, "A", "C").is_ok());
    assert!(matches!(
        search(&graph, "C", "A"),
        Err(SearchError::NoRouteFound { .. })
    ));
}

#[test]
fn zero_results_requested() {
    let graph = SnapshotBuilder::new().line(1, &["A", "B"]).graph();

    let result = planner().find_journeys(
        &graph,
        &SearchRequest::new(id(&graph, "A"), id(&graph, "B")).with_max_results(0),
    );

    assert!(matches!(result, Err(SearchError::InvalidRequest(_))));
}

#[test]
fn negative_penalty_is_rejected() {
    let graph = SnapshotBuilder::new().line(1, &["A", "B"]).graph();

    let result = Planner::new(PlannerConfig::new(3, 10, -1))
        .find_journeys(&graph, &SearchRequest::new(id(&graph, "A"), id(&graph, "B")));

    assert!(matches!(result, Err(SearchError::InvalidRequest(_))));
}

#[test]
fn search_is_deterministic() {
    let graph = SnapshotBuilder::new()
        .line(1, &["A", "B", "C", "D"])
        .line(2, &["P", "Q", "R"])
        .interchange("B", "P", 2)
        .interchange("D", "R", 2)
        .connection(1, "A", "D", 3.0, 28)
        .graph();
    let request = SearchRequest::new(id(&graph, "A"), id(&graph, "Q")).with_max_results(5);

    let first = planner().find_journeys(&graph, &request).unwrap();
    let second = planner().find_journeys(&graph, &request).unwrap();

    assert_eq!(first.journeys, second.journeys);
}
