use super::{Network, Uid};
use std::collections::{BTreeSet, VecDeque};

/// Lazily enumerates connected components.
///
/// Each component is discovered by a breadth-first search the first time
/// `next` reaches an unvisited node. Calling [`Network::connected_components`]
/// again starts over from a clean slate.
pub struct Components<'a> {
    network: &'a Network,
    nodes: std::collections::btree_map::Keys<'a, Uid, BTreeSet<Uid>>,
    seen: BTreeSet<Uid>,
}

impl<'a> Components<'a> {
    pub(crate) fn new(network: &'a Network) -> Self {
        Self {
            network,
            nodes: network.adjacency().keys(),
            seen: BTreeSet::new(),
        }
    }
}

impl Iterator for Components<'_> {
    type Item = BTreeSet<Uid>;

    fn next(&mut self) -> Option<Self::Item> {
        let start = loop {
            let uid = *self.nodes.next()?;
            if !self.seen.contains(&uid) {
                break uid;
            }
        };

        let component = bfs_component(self.network, start);
        self.seen.extend(component.iter().copied());
        Some(component)
    }
}

pub(crate) fn bfs_component(network: &Network, start: Uid) -> BTreeSet<Uid> {
    let mut component = BTreeSet::new();
    let mut frontier = VecDeque::new();
    component.insert(start);
    frontier.push_back(start);

    while let Some(current) = frontier.pop_front() {
        for &next in network.neighbors(current) {
            if component.insert(next) {
                frontier.push_back(next);
            }
        }
    }

    component
}
