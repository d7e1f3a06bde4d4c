use super::Strategy;
use crate::agent::PolicyParams;
use crate::network::{Network, Uid};

/// Co-author model: time is split evenly across collaborations, so each link
/// is worth more to agents with few partners.
///
/// `u_i = sum_{j in N(i)} (1/n_i + 1/n_j + 1/(n_i n_j)) - cost * n_i`
#[derive(Debug, Clone, Copy, Default)]
pub struct CoAuthor;

impl Strategy for CoAuthor {
    fn name(&self) -> &str { "co-author" }

    fn utility(&self, uid: Uid, network: &Network, params: &PolicyParams) -> f64 {
        let n_i = network.degree(uid) as f64;
        if n_i == 0.0 {
            return 0.0;
        }
        let benefit: f64 = network
            .neighbors(uid)
            .map(|&j| {
                let n_j = network.degree(j) as f64;
                1.0 / n_i + 1.0 / n_j + 1.0 / (n_i * n_j)
            })
            .sum();
        benefit - params.cost * n_i
    }

    fn clone_box(&self) -> Box<dyn Strategy> {
        Box::new(*self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn isolated_author_has_zero_utility() {
        let mut net = Network::new();
        net.add_node(0).unwrap();
        assert_eq!(CoAuthor.utility(0, &net, &PolicyParams::default()), 0.0);
    }

    #[test]
    fn pair_of_authors() {
        let mut net = Network::new();
        net.add_node(0).unwrap();
        net.add_node(1).unwrap();
        net.add_edge(0, 1).unwrap();
        let params = PolicyParams { cost: 0.5, ..PolicyParams::default() };
        assert!((CoAuthor.utility(0, &net, &params) - 2.5).abs() < 1e-12);
    }
}
