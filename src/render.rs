// Static rendering of a network as a Graphviz document. Nodes are coloured by
// net fragility (capacity - load) on a red/yellow/blue scale.

use crate::network::{Network, Uid};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;

/// Per-node load attributes, owned by whichever model tracks them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NodeLoad {
    pub load: f64,
    pub capacity: f64,
    /// Load at the moment of failure, for nodes that already failed.
    pub final_load: Option<f64>,
}

impl NodeLoad {
    pub fn new(load: f64, capacity: f64) -> Self {
        Self { load, capacity, final_load: None }
    }

    pub fn net_fragility(&self) -> f64 {
        self.capacity - self.final_load.unwrap_or(self.load)
    }
}

const NEUTRAL: &str = "#d9d9d9";
const RED: (f64, f64, f64) = (215.0, 48.0, 39.0);
const YELLOW: (f64, f64, f64) = (255.0, 255.0, 191.0);
const BLUE: (f64, f64, f64) = (69.0, 117.0, 180.0);

fn lerp(a: (f64, f64, f64), b: (f64, f64, f64), t: f64) -> String {
    let mix = |x: f64, y: f64| (x + (y - x) * t).round() as u8;
    format!("#{:02x}{:02x}{:02x}", mix(a.0, b.0), mix(a.1, b.1), mix(a.2, b.2))
}

/// Maps `t` in `[0, 1]` onto red -> yellow -> blue.
fn diverging(t: f64) -> String {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        lerp(RED, YELLOW, t * 2.0)
    } else {
        lerp(YELLOW, BLUE, (t - 0.5) * 2.0)
    }
}

/// Graphviz source for `network`. Nodes without an entry in `loads` are drawn
/// in a neutral grey. Negative fragility is clipped to -1 like overloaded
/// nodes in the colour bar.
pub fn to_dot(network: &Network, loads: &BTreeMap<Uid, NodeLoad>) -> String {
    let fragility: BTreeMap<Uid, f64> = loads
        .iter()
        .filter(|(uid, _)| network.contains(**uid))
        .map(|(&uid, l)| {
            let z = l.net_fragility();
            (uid, if z >= 0.0 { z } else { -1.0 })
        })
        .collect();
    let lo = fragility.values().copied().fold(f64::INFINITY, f64::min);
    let hi = fragility.values().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = hi - lo;

    let mut out = String::from("graph network {\n    node [shape=circle, style=filled];\n");
    for uid in network.nodes() {
        let color = match fragility.get(&uid) {
            Some(&z) if span > 0.0 => diverging((z - lo) / span),
            Some(_) => diverging(1.0),
            None => NEUTRAL.to_string(),
        };
        let _ = writeln!(out, "    {uid} [fillcolor=\"{color}\"];");
    }
    for (a, b) in network.edges() {
        let _ = writeln!(out, "    {a} -- {b};");
    }
    out.push_str("}\n");
    out
}

pub fn write_dot(
    network: &Network,
    loads: &BTreeMap<Uid, NodeLoad>,
    path: impl AsRef<Path>,
) -> Result<()> {
    std::fs::write(path, to_dot(network, loads))?;
    Ok(())
}
