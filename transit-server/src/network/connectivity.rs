//! Connectivity of the network, ignoring edge direction.

use std::collections::{HashMap, HashSet, VecDeque};

use serde::Serialize;

use super::NetworkGraph;
use crate::domain::StationId;

/// Connected components of the network treated as undirected.
///
/// Components are ordered largest first, ties broken by lowest station
/// identity. Stations within a component are in identity order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Connectivity {
    components: Vec<Vec<StationId>>,
}

impl Connectivity {
    /// True if every station can reach every other one.
    pub fn is_connected(&self) -> bool {
        self.components.len() <= 1
    }

    pub fn components(&self) -> &[Vec<StationId>] {
        &self.components
    }

    /// Every component except the largest.
    pub fn unreachable_components(&self) -> &[Vec<StationId>] {
        self.components.get(1..).unwrap_or(&[])
    }
}

impl NetworkGraph {
    /// Computes the connected components of the network.
    pub fn connectivity(&self) -> Connectivity {
        let mut neighbours: HashMap<StationId, Vec<StationId>> = HashMap::new();
        for station in self.stations() {
            for edge in self.edges_from(station.id) {
                neighbours.entry(edge.from).or_default().push(edge.to);
                neighbours.entry(edge.to).or_default().push(edge.from);
            }
        }

        let mut seen: HashSet<StationId> = HashSet::new();
        let mut components = Vec::new();

        for station in self.stations() {
            if !seen.insert(station.id) {
                continue;
            }

            let mut component = vec![station.id];
            let mut queue = VecDeque::from([station.id]);
            while let Some(current) = queue.pop_front() {
                for &next in neighbours.get(&current).into_iter().flatten() {
                    if seen.insert(next) {
                        component.push(next);
                        queue.push_back(next);
                    }
                }
            }

            component.sort_unstable();
            components.push(component);
        }

        components.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a[0].cmp(&b[0])));
        Connectivity { components }
    }
}
