pub mod config;
pub use config::SimConfig;

use crate::agent::{ActionContext, Agent, PolicyParams, Roster};
use crate::error::{NetformError, Result};
use crate::metrics::logger::MetricsLogger;
use crate::metrics::{analyzer, MetricsCollector, Reporter};
use crate::network::{Components, Network, Uid};
use crate::render;
use crate::strategies::{LinkAction, Move, Strategy, StrategyRegistry};
use indicatif::ProgressBar;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    /// No agent had an improving move at a check boundary.
    Stable,
    /// The step count reached `max_steps`.
    StepCap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunState {
    Running,
    Stopped(StopReason),
}

impl RunState {
    pub fn is_running(self) -> bool {
        matches!(self, Self::Running)
    }
}

/// The simulation context: network, agents, clock and run parameters.
pub struct World {
    config: SimConfig,
    params: PolicyParams,
    network: Network,
    roster: Roster,
    rng: StdRng,
    id_counter: Uid,
    time: u64,
    state: RunState,
    reporters: Vec<Box<dyn Reporter>>,
    pub metrics: MetricsCollector,
}

impl World {
    /// Builds a world whose agents all use the registered strategy named in
    /// the config.
    pub fn new(config: SimConfig) -> Result<Self> {
        let prototype = StrategyRegistry::global().create(&config.strategy_name)?;
        Self::with_strategy(config, || prototype.clone_box())
    }

    /// Builds a world whose agents get their strategy from `factory`.
    pub fn with_strategy<F>(config: SimConfig, mut factory: F) -> Result<Self>
    where
        F: FnMut() -> Box<dyn Strategy>,
    {
        let mut world = Self::empty(config)?;
        for _ in 0..world.config.num_agents {
            world.add_agent(factory())?;
        }
        world.seed_links()?;
        Ok(world)
    }

    /// A validated world with no agents yet.
    pub fn empty(config: SimConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            params: config.policy_params(),
            rng: StdRng::seed_from_u64(config.seed),
            config,
            network: Network::new(),
            roster: Roster::new(),
            id_counter: 0,
            time: 0,
            state: RunState::Running,
            reporters: Vec::new(),
            metrics: MetricsCollector::new(),
        })
    }

    // === Agents ===

    fn generate_uid(&mut self) -> Uid {
        loop {
            let uid = self.id_counter;
            self.id_counter += 1;
            if !self.network.contains(uid) {
                return uid;
            }
        }
    }

    pub fn add_agent(&mut self, strategy: Box<dyn Strategy>) -> Result<Uid> {
        let uid = self.generate_uid();
        self.add_agent_with_uid(uid, strategy)?;
        Ok(uid)
    }

    pub fn add_agent_with_uid(&mut self, uid: Uid, strategy: Box<dyn Strategy>) -> Result<()> {
        if self.network.contains(uid) || self.roster.contains(uid) {
            return Err(NetformError::DuplicateIdentifier(uid));
        }
        self.network.add_node(uid)?;
        self.roster.add(Agent::new(uid, strategy))?;
        Ok(())
    }

    pub fn agent(&self, uid: Uid) -> Option<&Agent> {
        self.roster.get(uid)
    }

    pub fn agents(&self) -> impl Iterator<Item = &Agent> {
        self.roster.iter()
    }

    pub fn num_agents(&self) -> usize {
        self.roster.len()
    }

    /// Adds a link directly, outside of any agent decision.
    pub fn add_link(&mut self, a: Uid, b: Uid) -> Result<bool> {
        self.network.add_edge(a, b)
    }

    fn seed_links(&mut self) -> Result<()> {
        let p = self.config.initial_link_probability;
        if p <= 0.0 {
            return Ok(());
        }
        let uids = self.roster.uids();
        for (i, &a) in uids.iter().enumerate() {
            for &b in &uids[i + 1..] {
                if self.rng.gen_bool(p) {
                    self.network.add_edge(a, b)?;
                }
            }
        }
        info!("Seeded {} initial links (p = {})", self.network.edge_count(), p);
        Ok(())
    }

    pub fn add_reporter(&mut self, reporter: Box<dyn Reporter>) {
        self.reporters.push(reporter);
    }

    // === Accessors ===

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn params(&self) -> &PolicyParams {
        &self.params
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn time(&self) -> u64 {
        self.time
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    fn context(&self) -> ActionContext<'_> {
        ActionContext::new(&self.network, &self.params, &self.roster, self.config.seed, self.time)
    }

    // === Network properties (for reporting) ===

    /// Sum of every agent's utility, each evaluated on its own component.
    pub fn welfare(&self) -> f64 {
        self.roster
            .iter()
            .map(|a| a.utility(&a.subgraph(&self.network), &self.params))
            .sum()
    }

    pub fn density(&self) -> f64 {
        self.network.density()
    }

    pub fn clustering(&self) -> f64 {
        self.network.average_clustering()
    }

    pub fn connected_components(&self) -> Components<'_> {
        self.network.connected_components()
    }

    // === Stability checks ===

    pub fn best_simple_action(&self, uid: Uid, create: bool, mutual: bool) -> Result<Move> {
        let agent = self.roster.get(uid).ok_or(NetformError::NodeNotFound(uid))?;
        Ok(agent.best_simple_action(&self.context(), create, mutual))
    }

    /// True if no agent wants to create or delete a link. Deletion is checked
    /// first; when it fails creation is never evaluated.
    pub fn is_pairwise_stable(
        &self,
        agents: Option<&[Uid]>,
        mutual_create: bool,
        mutual_delete: bool,
    ) -> bool {
        if !self.is_deletion_stable(agents, mutual_delete) {
            return false;
        }
        self.is_creation_stable(agents, mutual_create)
    }

    pub fn is_deletion_stable(&self, agents: Option<&[Uid]>, mutual: bool) -> bool {
        self.is_simple_action_stable(agents, false, mutual)
    }

    pub fn is_creation_stable(&self, agents: Option<&[Uid]>, mutual: bool) -> bool {
        self.is_simple_action_stable(agents, true, mutual)
    }

    fn is_simple_action_stable(&self, agents: Option<&[Uid]>, create: bool, mutual: bool) -> bool {
        let uids = match agents {
            Some(uids) => uids.to_vec(),
            None => self.roster.uids(),
        };
        let ctx = self.context();

        for uid in uids {
            let Some(agent) = self.roster.get(uid) else {
                warn!("Skipping stability check for unknown agent {}", uid);
                continue;
            };
            let best = agent.best_simple_action(&ctx, create, mutual);
            if let Some(partner) = best.partner {
                debug!(
                    "Agent {} would {} link to {} (gain {:.4})",
                    uid, best.action, partner, best.gain
                );
                return false;
            }
        }
        true
    }

    // === Stepping ===

    fn report(&mut self) {
        self.metrics.collect(self);
        let mut reporters = std::mem::take(&mut self.reporters);
        for reporter in reporters.iter_mut() {
            reporter.report(self);
        }
        self.reporters = reporters;
    }

    fn apply(&mut self, uid: Uid, mv: Move) {
        let Some(partner) = mv.partner else { return };
        let changed = match mv.action {
            LinkAction::Create => match self.network.add_edge(uid, partner) {
                Ok(added) => added,
                Err(e) => {
                    warn!("Ignoring invalid move of agent {}: {}", uid, e);
                    false
                }
            },
            LinkAction::Delete => self.network.remove_edge(uid, partner),
        };
        if changed {
            debug!("t={} agent {} {}s link to {} (gain {:.4})", self.time, uid, mv.action, partner, mv.gain);
        }
    }

    /// Advances one step. A stopped world is left untouched.
    pub fn step(&mut self) -> RunState {
        if !self.is_running() {
            return self.state;
        }

        // at given interval report on the state of the system
        if self.time % self.config.polling_interval == 0 {
            self.report();
        }

        let order = self.config.schedule.order(&self.roster.uids(), &mut self.rng);
        for uid in order {
            let mv = match self.roster.get(uid) {
                Some(agent) => agent.best_action(&self.context()),
                None => None,
            };
            if let Some(mv) = mv {
                self.apply(uid, mv);
            }
        }
        self.time += 1;

        let check = self.config.check_interval();
        if self.time % check == 0
            && self.is_pairwise_stable(None, self.params.mutual_create, self.params.mutual_delete)
        {
            info!("Pairwise stable after {} steps", self.time);
            self.state = RunState::Stopped(StopReason::Stable);
        }

        if self.is_running() && self.config.max_steps.is_some_and(|cap| self.time >= cap) {
            info!("Step cap reached after {} steps", self.time);
            self.state = RunState::Stopped(StopReason::StepCap);
        }

        self.state
    }

    pub fn run(&mut self) -> StopReason {
        self.run_with_progress(&ProgressBar::hidden())
    }

    pub fn run_with_progress(&mut self, pb: &ProgressBar) -> StopReason {
        info!("Starting simulation: {}", self.config.name);
        info!("Strategy: {}", self.config.strategy_name);
        info!("Agents: {}, cost: {}, alpha: {}", self.num_agents(), self.params.cost, self.params.alpha);

        loop {
            let state = self.step();
            pb.inc(1);
            pb.set_message(format!(
                "edges: {} | density: {:.3}",
                self.network.edge_count(),
                self.network.density()
            ));
            if let RunState::Stopped(reason) = state {
                pb.finish_with_message(format!("{:?} after {} steps", reason, self.time));
                return reason;
            }
        }
    }

    /// Writes snapshots (CSV), the run report (JSON) and the final network
    /// (DOT) under `dir`. Returns the common path prefix.
    pub fn save_results(&self, dir: impl AsRef<Path>) -> anyhow::Result<PathBuf> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        let base = dir.join(format!("{}_{}", self.config.name, timestamp));
        let path = |suffix: &str| PathBuf::from(format!("{}{}", base.display(), suffix));

        let csv_path = path(".csv");
        MetricsLogger::create(&csv_path)?.log_all(&self.metrics.get_snapshots())?;
        info!("Results saved to: {}", csv_path.display());

        let report = analyzer::analyze(self);
        let json_path = path("_analysis.json");
        analyzer::export_json(std::slice::from_ref(&report), &json_path)?;
        info!("Analysis saved to: {}", json_path.display());

        let dot_path = path(".dot");
        render::write_dot(&self.network, &BTreeMap::new(), &dot_path)?;
        info!("Network saved to: {}", dot_path.display());

        info!("Final welfare: {:.3}", report.final_welfare);
        info!("Final density: {:.3}", report.final_density);
        info!("Components: {}", report.final_components);

        Ok(base)
    }
}
