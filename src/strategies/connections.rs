use super::Strategy;
use crate::agent::PolicyParams;
use crate::network::{Network, Uid};

/// Symmetric connections model.
///
/// Every other agent reachable at distance `d` is worth `alpha^d`, every
/// direct link costs `cost`:
///
/// `u_i = sum_{j != i, reachable} alpha^d(i,j) - cost * deg(i)`
#[derive(Debug, Clone, Copy, Default)]
pub struct Connections;

impl Strategy for Connections {
    fn name(&self) -> &str { "connections" }

    fn utility(&self, uid: Uid, network: &Network, params: &PolicyParams) -> f64 {
        let benefit: f64 = network
            .distances_from(uid)
            .into_iter()
            .filter(|&(other, _)| other != uid)
            .map(|(_, d)| params.alpha.powi(d as i32))
            .sum();
        benefit - params.cost * network.degree(uid) as f64
    }

    fn clone_box(&self) -> Box<dyn Strategy> {
        Box::new(*self)
    }
}
