use crate::simulation::{RunState, StopReason, World};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Summary of a finished (or interrupted) run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub strategy_name: String,
    pub steps: u64,
    /// Share of runs that ended pairwise stable (0 or 1 for a single run).
    pub stable_rate: f64,
    pub final_welfare: f64,
    pub final_density: f64,
    pub final_clustering: f64,
    pub final_components: f64,
    pub final_edges: f64,
    pub peak_welfare: f64,
}

pub fn analyze(world: &World) -> RunReport {
    let stable = matches!(world.state(), RunState::Stopped(StopReason::Stable));
    let final_welfare = world.welfare();
    let peak_welfare = world
        .metrics
        .get_snapshots()
        .iter()
        .map(|s| s.welfare)
        .fold(final_welfare, f64::max);

    RunReport {
        strategy_name: world.config().strategy_name.clone(),
        steps: world.time(),
        stable_rate: if stable { 1.0 } else { 0.0 },
        final_welfare,
        final_density: world.density(),
        final_clustering: world.clustering(),
        final_components: world.connected_components().count() as f64,
        final_edges: world.network().edge_count() as f64,
        peak_welfare,
    }
}

/// Mean of several repetitions of the same strategy. `steps` is rounded.
pub fn average_reports(reports: &[RunReport]) -> Option<RunReport> {
    let first = reports.first()?;
    let n = reports.len() as f64;
    let mean = |f: fn(&RunReport) -> f64| reports.iter().map(f).sum::<f64>() / n;

    Some(RunReport {
        strategy_name: first.strategy_name.clone(),
        steps: mean(|r| r.steps as f64).round() as u64,
        stable_rate: mean(|r| r.stable_rate),
        final_welfare: mean(|r| r.final_welfare),
        final_density: mean(|r| r.final_density),
        final_clustering: mean(|r| r.final_clustering),
        final_components: mean(|r| r.final_components),
        final_edges: mean(|r| r.final_edges),
        peak_welfare: reports.iter().map(|r| r.peak_welfare).fold(f64::MIN, f64::max),
    })
}

pub fn export_json(reports: &[RunReport], path: impl AsRef<Path>) -> Result<()> {
    std::fs::write(path, serde_json::to_string_pretty(reports)?)?;
    Ok(())
}
