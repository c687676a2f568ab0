//! Journey ranking for search results.
//!
//! Ranks journeys so the most useful options come first, and removes
//! journeys that visit exactly the same stations.

use std::cmp::Ordering;
use std::collections::HashSet;

use crate::domain::Journey;

/// Compare two journeys by preference.
///
/// Journeys are ranked by:
/// 1. Search weight (travel minutes plus transfer penalties, lower is better)
/// 2. Number of transfers (fewer is better)
/// 3. Station codes visited, compared lexicographically
pub fn compare(a: &Journey, b: &Journey) -> Ordering {
    a.weight_mins()
        .cmp(&b.weight_mins())
        .then_with(|| a.transfer_count().cmp(&b.transfer_count()))
        .then_with(|| a.station_codes().cmp(b.station_codes()))
}

/// Rank journeys by preference. Returns journeys sorted best-first.
pub fn rank_journeys(mut journeys: Vec<Journey>) -> Vec<Journey> {
    journeys.sort_by(compare);
    journeys
}

/// Deduplicate journeys that call at the same stations in the same order.
///
/// The first of each group is kept, so rank before deduplicating to keep the
/// best one.
pub fn deduplicate(journeys: Vec<Journey>) -> Vec<Journey> {
    let mut seen = HashSet::new();
    journeys
        .into_iter()
        .filter(|journey| {
            let key: Vec<_> = journey.stops().iter().map(|s| s.id).collect();
            seen.insert(key)
        })
        .collect()
}
