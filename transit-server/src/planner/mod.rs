//! Journey planner.
//!
//! This module answers: "what are the best ways to get from this station to
//! that one?" It runs a shortest-path search over the network graph, where
//! an edge costs its travel time plus a fixed penalty whenever the rider
//! changes line or starts a walk, then enumerates runner-up routes by
//! spurring off the best ones (Yen's algorithm).

mod config;
mod rank;
mod search;

pub use config::PlannerConfig;
pub use rank::{deduplicate, rank_journeys};
pub use search::{Planner, SearchError, SearchRequest, SearchResult};
