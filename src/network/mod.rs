pub mod graph;
pub mod components;

pub use graph::Network;
pub use components::Components;

/// Agent identifier, shared between the roster and the graph nodes.
pub type Uid = u32;

/// Normalised undirected edge, lower uid first.
pub fn edge_key(a: Uid, b: Uid) -> (Uid, Uid) {
    if a <= b { (a, b) } else { (b, a) }
}
