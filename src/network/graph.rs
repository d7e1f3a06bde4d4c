use super::components::{bfs_component, Components};
use super::{edge_key, Uid};
use crate::error::{NetformError, Result};
use std::collections::{BTreeMap, BTreeSet, VecDeque};

/// Undirected simple graph over agent uids.
///
/// Adjacency is kept in ordered maps so every traversal, and therefore every
/// simulation run, visits nodes in the same order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Network {
    adjacency: BTreeMap<Uid, BTreeSet<Uid>>,
    num_edges: usize,
}

impl Network {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn adjacency(&self) -> &BTreeMap<Uid, BTreeSet<Uid>> {
        &self.adjacency
    }

    pub fn add_node(&mut self, uid: Uid) -> Result<()> {
        if self.adjacency.contains_key(&uid) {
            return Err(NetformError::DuplicateIdentifier(uid));
        }
        self.adjacency.insert(uid, BTreeSet::new());
        Ok(())
    }

    /// Inserts the link `a -- b`. Returns `false` when it already existed.
    pub fn add_edge(&mut self, a: Uid, b: Uid) -> Result<bool> {
        self.check_endpoints(a, b)?;

        let inserted = self
            .adjacency
            .get_mut(&a)
            .map(|n| n.insert(b))
            .unwrap_or(false);
        if inserted {
            if let Some(n) = self.adjacency.get_mut(&b) {
                n.insert(a);
            }
            self.num_edges += 1;
        }
        Ok(inserted)
    }

    /// Removes the link `a -- b`. A missing edge (or missing node) is a no-op
    /// and returns `false`.
    pub fn remove_edge(&mut self, a: Uid, b: Uid) -> bool {
        let removed = self
            .adjacency
            .get_mut(&a)
            .map(|n| n.remove(&b))
            .unwrap_or(false);
        if removed {
            if let Some(n) = self.adjacency.get_mut(&b) {
                n.remove(&a);
            }
            self.num_edges -= 1;
        }
        removed
    }

    /// Forces the link `a -- b` to be present or absent. Returns whether the
    /// graph changed.
    pub fn set_edge(&mut self, a: Uid, b: Uid, present: bool) -> Result<bool> {
        if present {
            self.add_edge(a, b)
        } else {
            self.check_endpoints(a, b)?;
            Ok(self.remove_edge(a, b))
        }
    }

    fn check_endpoints(&self, a: Uid, b: Uid) -> Result<()> {
        if a == b {
            return Err(NetformError::SelfLoop(a));
        }
        for uid in [a, b] {
            if !self.adjacency.contains_key(&uid) {
                return Err(NetformError::NodeNotFound(uid));
            }
        }
        Ok(())
    }

    pub fn contains(&self, uid: Uid) -> bool {
        self.adjacency.contains_key(&uid)
    }

    pub fn has_edge(&self, a: Uid, b: Uid) -> bool {
        self.adjacency.get(&a).is_some_and(|n| n.contains(&b))
    }

    /// Neighbours of `uid` in ascending order; empty for unknown nodes.
    pub fn neighbors(&self, uid: Uid) -> impl Iterator<Item = &Uid> + '_ {
        self.adjacency.get(&uid).into_iter().flatten()
    }

    pub fn degree(&self, uid: Uid) -> usize {
        self.adjacency.get(&uid).map_or(0, BTreeSet::len)
    }

    pub fn nodes(&self) -> impl Iterator<Item = Uid> + '_ {
        self.adjacency.keys().copied()
    }

    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    pub fn edge_count(&self) -> usize {
        self.num_edges
    }

    /// All links as `(low, high)` pairs, sorted.
    pub fn edges(&self) -> Vec<(Uid, Uid)> {
        let mut edges = Vec::with_capacity(self.num_edges);
        for (&u, neighbors) in &self.adjacency {
            for &v in neighbors {
                if u < v {
                    edges.push(edge_key(u, v));
                }
            }
        }
        edges
    }

    pub fn connected_components(&self) -> Components<'_> {
        Components::new(self)
    }

    /// The component containing `uid`, empty if `uid` is not a node.
    pub fn component_of(&self, uid: Uid) -> BTreeSet<Uid> {
        if !self.contains(uid) {
            return BTreeSet::new();
        }
        bfs_component(self, uid)
    }

    /// Induced subgraph over `uids`. Uids that are not nodes are skipped.
    pub fn subgraph<I>(&self, uids: I) -> Network
    where
        I: IntoIterator<Item = Uid>,
    {
        let keep: BTreeSet<Uid> = uids.into_iter().filter(|u| self.contains(*u)).collect();
        let mut sub = Network::new();
        for &u in &keep {
            let neighbors: BTreeSet<Uid> = self
                .neighbors(u)
                .copied()
                .filter(|v| keep.contains(v))
                .collect();
            sub.num_edges += neighbors.iter().filter(|&&v| u < v).count();
            sub.adjacency.insert(u, neighbors);
        }
        sub
    }

    /// Hop distance from `source` to every node reachable from it (itself
    /// included at distance 0).
    pub fn distances_from(&self, source: Uid) -> BTreeMap<Uid, usize> {
        let mut dist = BTreeMap::new();
        if !self.contains(source) {
            return dist;
        }
        let mut frontier = VecDeque::from([source]);
        dist.insert(source, 0);

        while let Some(current) = frontier.pop_front() {
            let d = dist[&current];
            for &next in self.neighbors(current) {
                if !dist.contains_key(&next) {
                    dist.insert(next, d + 1);
                    frontier.push_back(next);
                }
            }
        }
        dist
    }

    /// Share of possible links actually present.
    pub fn density(&self) -> f64 {
        let n = self.node_count();
        if n < 2 {
            return 0.0;
        }
        (2 * self.num_edges) as f64 / (n * (n - 1)) as f64
    }

    pub fn local_clustering(&self, uid: Uid) -> f64 {
        let Some(neighbors) = self.adjacency.get(&uid) else {
            return 0.0;
        };
        let k = neighbors.len();
        if k < 2 {
            return 0.0;
        }
        let neighbors: Vec<Uid> = neighbors.iter().copied().collect();
        let mut links = 0usize;
        for i in 0..k {
            for j in (i + 1)..k {
                if self.has_edge(neighbors[i], neighbors[j]) {
                    links += 1;
                }
            }
        }
        (2.0 * links as f64) / (k * (k - 1)) as f64
    }

    pub fn average_clustering(&self) -> f64 {
        let n = self.node_count();
        if n == 0 {
            return 0.0;
        }
        let total: f64 = self.nodes().map(|u| self.local_clustering(u)).sum();
        total / n as f64
    }
}
