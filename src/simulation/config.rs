use crate::agent::PolicyParams;
use crate::error::{NetformError, Result};
use crate::schedule::SchedulePolicy;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub name: String,
    pub strategy_name: String,
    pub num_agents: u32,
    pub cost: f64,
    pub alpha: f64,
    pub mutual_create: bool,
    pub mutual_delete: bool,
    /// Reporting cadence in steps.
    pub polling_interval: u64,
    /// Steps between stability checks; unset means every step.
    pub check_stability: Option<u64>,
    /// Historical policy: with `check_stability` unset and a step cap, only
    /// check at `max_steps + 1`, which a capped run never reaches.
    pub defer_stability_to_cap: bool,
    pub max_steps: Option<u64>,
    /// Cap on candidate partners evaluated per best-response search.
    pub max_sample: Option<usize>,
    pub schedule: SchedulePolicy,
    pub seed: u64,
    pub initial_link_probability: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            name: "default_sim".to_string(),
            strategy_name: "connections".to_string(),
            num_agents: 16,
            cost: 0.5,
            alpha: 0.8,
            mutual_create: true,
            mutual_delete: false,
            polling_interval: 1,
            check_stability: None,
            defer_stability_to_cap: false,
            max_steps: Some(100),
            max_sample: None,
            schedule: SchedulePolicy::Sequential,
            seed: 42,
            initial_link_probability: 0.0,
        }
    }
}

impl SimConfig {
    pub fn from_json_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_strategy(mut self, strategy: impl Into<String>) -> Self {
        self.strategy_name = strategy.into();
        self
    }

    pub fn with_agents(mut self, num_agents: u32) -> Self {
        self.num_agents = num_agents;
        self
    }

    pub fn with_cost(mut self, cost: f64) -> Self {
        self.cost = cost;
        self
    }

    pub fn with_max_steps(mut self, max_steps: Option<u64>) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Rejects inconsistent parameters. Nothing is silently corrected.
    pub fn validate(&self) -> Result<()> {
        fn invalid(msg: impl Into<String>) -> Result<()> {
            Err(NetformError::InvalidConfiguration(msg.into()))
        }

        if self.num_agents == 0 {
            return invalid("num_agents must be positive");
        }
        if self.polling_interval == 0 {
            return invalid("polling_interval must be positive");
        }
        if self.check_stability == Some(0) {
            return invalid("check_stability must be positive when set");
        }
        if self.max_steps == Some(0) {
            return invalid("max_steps must be positive when set");
        }
        if self.max_sample == Some(0) {
            return invalid("max_sample must be positive when set");
        }
        if !self.cost.is_finite() {
            return invalid(format!("cost must be finite, got {}", self.cost));
        }
        if !self.alpha.is_finite() {
            return invalid(format!("alpha must be finite, got {}", self.alpha));
        }
        if !(0.0..=1.0).contains(&self.initial_link_probability) {
            return invalid(format!(
                "initial_link_probability must lie in [0, 1], got {}",
                self.initial_link_probability
            ));
        }
        if self.defer_stability_to_cap && self.check_stability.is_some() {
            return invalid("defer_stability_to_cap conflicts with an explicit check_stability");
        }
        Ok(())
    }

    /// Steps between stability checks.
    pub fn check_interval(&self) -> u64 {
        match (self.check_stability, self.max_steps) {
            (Some(k), _) => k,
            (None, Some(cap)) if self.defer_stability_to_cap => cap.saturating_add(1),
            (None, _) => 1,
        }
    }

    pub fn policy_params(&self) -> PolicyParams {
        PolicyParams {
            cost: self.cost,
            alpha: self.alpha,
            mutual_create: self.mutual_create,
            mutual_delete: self.mutual_delete,
            max_sample: self.max_sample,
        }
    }
}
