use crate::error::{NetformError, Result};
use crate::network::{Network, Uid};
use crate::strategies::{Move, Strategy};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;

/// Global policy parameters every agent sees when it decides.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PolicyParams {
    pub cost: f64,
    pub alpha: f64,
    pub mutual_create: bool,
    pub mutual_delete: bool,
    pub max_sample: Option<usize>,
}

impl Default for PolicyParams {
    fn default() -> Self {
        Self {
            cost: 0.0,
            alpha: 1.0,
            mutual_create: true,
            mutual_delete: false,
            max_sample: None,
        }
    }
}

pub struct Agent {
    uid: Uid,
    strategy: Box<dyn Strategy>,
}

impl fmt::Debug for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Agent")
            .field("uid", &self.uid)
            .field("strategy", &self.strategy.name())
            .finish()
    }
}

impl Agent {
    pub fn new(uid: Uid, strategy: Box<dyn Strategy>) -> Self {
        Self { uid, strategy }
    }

    /// Unique identifier, also the agent's node in the network.
    pub fn uid(&self) -> Uid {
        self.uid
    }

    pub fn strategy(&self) -> &dyn Strategy {
        self.strategy.as_ref()
    }

    /// Uids of the component this agent belongs to.
    pub fn component_uids(&self, network: &Network) -> BTreeSet<Uid> {
        network.component_of(self.uid)
    }

    /// The graph induced by the agent's own component.
    pub fn subgraph(&self, network: &Network) -> Network {
        network.subgraph(self.component_uids(network))
    }

    pub fn utility(&self, network: &Network, params: &PolicyParams) -> f64 {
        self.strategy.utility(self.uid, network, params)
    }

    pub fn best_simple_action(&self, ctx: &ActionContext<'_>, create: bool, mutual: bool) -> Move {
        self.strategy.best_simple_action(self.uid, ctx, create, mutual)
    }

    pub fn best_action(&self, ctx: &ActionContext<'_>) -> Option<Move> {
        self.strategy.best_action(self.uid, ctx)
    }
}

/// Agents in insertion order, with uid lookup.
#[derive(Debug, Default)]
pub struct Roster {
    agents: Vec<Agent>,
    index: HashMap<Uid, usize>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, agent: Agent) -> Result<()> {
        if self.index.contains_key(&agent.uid) {
            return Err(NetformError::DuplicateIdentifier(agent.uid));
        }
        self.index.insert(agent.uid, self.agents.len());
        self.agents.push(agent);
        Ok(())
    }

    pub fn get(&self, uid: Uid) -> Option<&Agent> {
        self.index.get(&uid).map(|&i| &self.agents[i])
    }

    pub fn contains(&self, uid: Uid) -> bool {
        self.index.contains_key(&uid)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Agent> {
        self.agents.iter()
    }

    pub fn uids(&self) -> Vec<Uid> {
        self.agents.iter().map(|a| a.uid).collect()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

/// Read-only view an agent gets while choosing a move.
pub struct ActionContext<'a> {
    pub network: &'a Network,
    pub params: &'a PolicyParams,
    roster: &'a Roster,
    seed: u64,
    step: u64,
}

impl<'a> ActionContext<'a> {
    pub fn new(
        network: &'a Network,
        params: &'a PolicyParams,
        roster: &'a Roster,
        seed: u64,
        step: u64,
    ) -> Self {
        Self { network, params, roster, seed, step }
    }

    /// Utility `uid` would get on `network`, using that agent's own strategy.
    pub fn utility_of(&self, uid: Uid, network: &Network) -> Option<f64> {
        self.roster.get(uid).map(|a| a.utility(network, self.params))
    }

    /// Partners worth evaluating for `uid`: non-neighbours when creating,
    /// neighbours when deleting. With a sampling cap the list is reduced to a
    /// random subset that only depends on (seed, step, uid, action), so asking
    /// twice on an unchanged network yields the same candidates.
    pub fn candidates(&self, uid: Uid, create: bool) -> Vec<Uid> {
        let mut candidates: Vec<Uid> = if create {
            self.network
                .nodes()
                .filter(|&v| v != uid && !self.network.has_edge(uid, v))
                .collect()
        } else {
            self.network.neighbors(uid).copied().collect()
        };

        if let Some(cap) = self.params.max_sample {
            if candidates.len() > cap {
                let mut rng = StdRng::seed_from_u64(self.sample_seed(uid, create));
                candidates = candidates.choose_multiple(&mut rng, cap).copied().collect();
                candidates.sort_unstable();
            }
        }
        candidates
    }

    fn sample_seed(&self, uid: Uid, create: bool) -> u64 {
        let mut h = splitmix64(self.seed);
        h = splitmix64(h ^ self.step);
        h = splitmix64(h ^ u64::from(uid));
        splitmix64(h ^ u64::from(create))
    }
}

fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    x = (x ^ (x >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    x ^ (x >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategies::static_strategies::Inert;

    fn star(leaves: Uid) -> (Network, Roster) {
        let mut net = Network::new();
        let mut roster = Roster::new();
        for uid in 0..=leaves {
            net.add_node(uid).unwrap();
            roster.add(Agent::new(uid, Box::new(Inert))).unwrap();
        }
        for uid in 1..=leaves {
            net.add_edge(0, uid).unwrap();
        }
        (net, roster)
    }

    #[test]
    fn roster_rejects_duplicate_uid() {
        let mut roster = Roster::new();
        roster.add(Agent::new(3, Box::new(Inert))).unwrap();
        let err = roster.add(Agent::new(3, Box::new(Inert))).unwrap_err();
        assert_eq!(err, NetformError::DuplicateIdentifier(3));
        assert_eq!(roster.len(), 1);
    }

    #[test]
    fn candidates_split_by_action() {
        let (net, roster) = star(3);
        let params = PolicyParams::default();
        let ctx = ActionContext::new(&net, &params, &roster, 0, 0);
        assert_eq!(ctx.candidates(0, false), vec![1, 2, 3]);
        assert!(ctx.candidates(0, true).is_empty());
        assert_eq!(ctx.candidates(1, true), vec![2, 3]);
        assert_eq!(ctx.candidates(1, false), vec![0]);
    }

    #[test]
    fn sampled_candidates_are_stable_per_step() {
        let (net, roster) = star(20);
        let params = PolicyParams { max_sample: Some(4), ..PolicyParams::default() };
        let ctx = ActionContext::new(&net, &params, &roster, 99, 5);
        let first = ctx.candidates(0, false);
        assert_eq!(first.len(), 4);
        assert_eq!(first, ctx.candidates(0, false));
        assert!(first.iter().all(|v| net.has_edge(0, *v)));
    }

    #[test]
    fn subgraph_is_own_component() {
        let (mut net, _) = star(2);
        net.add_node(50).unwrap();
        let agent = Agent::new(1, Box::new(Inert));
        let sub = agent.subgraph(&net);
        assert_eq!(sub.node_count(), 3);
        assert!(!sub.contains(50));
    }
}
