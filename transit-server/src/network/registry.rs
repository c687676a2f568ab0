//! Publication of network graphs.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{info, warn};

use super::{GraphIntegrityError, NetworkConfig, NetworkGraph};
use crate::domain::NetworkSnapshot;

/// A published graph and its generation number.
#[derive(Debug, Clone)]
pub struct Published {
    pub graph: Arc<NetworkGraph>,
    pub generation: u64,
}

/// Holds the graph currently serving queries.
///
/// New snapshots are built off to the side and swapped in only once they
/// validate; readers clone the `Arc` and never wait on a build.
#[derive(Debug)]
pub struct NetworkRegistry {
    current: RwLock<Published>,
    config: NetworkConfig,
}

impl NetworkRegistry {
    /// Builds the first graph. Fails if the snapshot does not validate.
    pub fn new(
        snapshot: NetworkSnapshot,
        config: NetworkConfig,
    ) -> Result<Self, GraphIntegrityError> {
        let graph = NetworkGraph::build(snapshot, &config)?;
        Ok(Self {
            current: RwLock::new(Published {
                graph: Arc::new(graph),
                generation: 1,
            }),
            config,
        })
    }

    /// The graph currently serving queries.
    pub fn current(&self) -> Arc<NetworkGraph> {
        Arc::clone(&self.current.read().graph)
    }

    /// The current graph together with its generation.
    pub fn published(&self) -> Published {
        self.current.read().clone()
    }

    pub fn generation(&self) -> u64 {
        self.current.read().generation
    }

    /// Builds and publishes a new snapshot.
    ///
    /// On success, returns the new generation. On failure, the previous graph
    /// keeps serving and the error is returned.
    pub fn publish(&self, snapshot: NetworkSnapshot) -> Result<u64, GraphIntegrityError> {
        let graph = match NetworkGraph::build(snapshot, &self.config) {
            Ok(graph) => Arc::new(graph),
            Err(e) => {
                warn!(error = %e, "Rejected network snapshot; keeping previous graph");
                return Err(e);
            }
        };

        let mut guard = self.current.write();
        let generation = guard.generation + 1;
        *guard = Published { graph, generation };
        info!(generation, "Published network graph");

        Ok(generation)
    }
}
