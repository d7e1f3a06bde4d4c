pub mod logger;
pub mod analyzer;

use crate::simulation::World;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub step: u64,
    pub welfare: f64,
    pub density: f64,
    pub clustering: f64,
    pub num_components: usize,
    pub num_edges: usize,
}

impl MetricsSnapshot {
    pub fn capture(world: &World) -> Self {
        Self {
            step: world.time(),
            welfare: world.welfare(),
            density: world.density(),
            clustering: world.clustering(),
            num_components: world.connected_components().count(),
            num_edges: world.network().edge_count(),
        }
    }
}

/// Read-only observer invoked by the world once per polling interval,
/// before the step advances time.
pub trait Reporter {
    fn report(&mut self, world: &World);
}

/// Clonable handle to the snapshots of a run.
#[derive(Debug, Clone, Default)]
pub struct MetricsCollector {
    inner: Arc<RwLock<Vec<MetricsSnapshot>>>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn collect(&self, world: &World) {
        let snapshot = MetricsSnapshot::capture(world);
        debug!(
            "step {}: welfare {:.3}, density {:.3}, components {}",
            snapshot.step, snapshot.welfare, snapshot.density, snapshot.num_components
        );
        self.inner.write().push(snapshot);
    }

    pub fn get_snapshots(&self) -> Vec<MetricsSnapshot> {
        self.inner.read().clone()
    }
}

impl Reporter for MetricsCollector {
    fn report(&mut self, world: &World) {
        self.collect(world);
    }
}
