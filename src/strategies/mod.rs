pub mod static_strategies;
pub mod connections;
pub mod co_author;

use crate::agent::{ActionContext, PolicyParams};
use crate::error::{NetformError, Result};
use crate::network::{Network, Uid};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Utility differences at or below this are treated as zero.
pub const UTILITY_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LinkAction {
    Create,
    Delete,
}

impl LinkAction {
    pub fn from_create(create: bool) -> Self {
        if create { Self::Create } else { Self::Delete }
    }
}

impl fmt::Display for LinkAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => f.write_str("create"),
            Self::Delete => f.write_str("delete"),
        }
    }
}

/// Outcome of a best-response search. `partner == None` means the agent has
/// no improving move of this kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Move {
    pub action: LinkAction,
    pub partner: Option<Uid>,
    pub gain: f64,
}

impl Move {
    pub fn none(action: LinkAction) -> Self {
        Self { action, partner: None, gain: 0.0 }
    }

    pub fn is_improving(&self) -> bool {
        self.partner.is_some()
    }
}

/// Link-formation policy of an agent.
///
/// Implementors only have to provide `utility`; the default best-response
/// search evaluates every candidate link change on a scratch copy of the
/// network.
pub trait Strategy: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    /// Utility of `uid` on `network`. Must only depend on the component that
    /// contains `uid`, since welfare is computed on component subgraphs.
    fn utility(&self, uid: Uid, network: &Network, params: &PolicyParams) -> f64;

    /// Most improving single creation (`create`) or deletion for `uid`. With
    /// `mutual` a move is only accepted if the partner is not worse off.
    fn best_simple_action(
        &self,
        uid: Uid,
        ctx: &ActionContext<'_>,
        create: bool,
        mutual: bool,
    ) -> Move {
        let action = LinkAction::from_create(create);
        let candidates = ctx.candidates(uid, create);
        if candidates.is_empty() {
            return Move::none(action);
        }

        let before = self.utility(uid, ctx.network, ctx.params);
        let mut trial = ctx.network.clone();
        let mut best = Move::none(action);

        for partner in candidates {
            if !matches!(trial.set_edge(uid, partner, create), Ok(true)) {
                continue;
            }
            let gain = self.utility(uid, &trial, ctx.params) - before;
            let accepted = gain > UTILITY_TOLERANCE
                && (!mutual || partner_not_worse(ctx, partner, &trial));
            // revert before the next candidate
            let reverted = trial.set_edge(uid, partner, !create);
            debug_assert_eq!(reverted, Ok(true));

            if accepted && (best.partner.is_none() || gain > best.gain + UTILITY_TOLERANCE) {
                best = Move { action, partner: Some(partner), gain };
            }
        }
        best
    }

    /// The move the agent actually performs on its turn: the better of its
    /// best deletion and best creation, deletion winning ties.
    fn best_action(&self, uid: Uid, ctx: &ActionContext<'_>) -> Option<Move> {
        let delete = self.best_simple_action(uid, ctx, false, ctx.params.mutual_delete);
        let create = self.best_simple_action(uid, ctx, true, ctx.params.mutual_create);

        match (delete.is_improving(), create.is_improving()) {
            (false, false) => None,
            (true, false) => Some(delete),
            (false, true) => Some(create),
            (true, true) if create.gain > delete.gain + UTILITY_TOLERANCE => Some(create),
            (true, true) => Some(delete),
        }
    }

    fn clone_box(&self) -> Box<dyn Strategy>;
}

fn partner_not_worse(ctx: &ActionContext<'_>, partner: Uid, trial: &Network) -> bool {
    match (ctx.utility_of(partner, ctx.network), ctx.utility_of(partner, trial)) {
        (Some(before), Some(after)) => after - before >= -UTILITY_TOLERANCE,
        _ => false,
    }
}

type StrategyFactory = Box<dyn Fn() -> Box<dyn Strategy> + Send + Sync>;

pub struct StrategyRegistry {
    strategies: HashMap<String, StrategyFactory>,
}

impl StrategyRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            strategies: HashMap::new(),
        };
        registry.register_builtin();
        registry
    }

    fn register_builtin(&mut self) {
        self.register("connections", || Box::new(connections::Connections));
        self.register("co-author", || Box::new(co_author::CoAuthor));
        self.register("coauthor", || Box::new(co_author::CoAuthor));
        self.register("inert", || Box::new(static_strategies::Inert));
    }

    pub fn register<F>(&mut self, name: &str, factory: F)
    where
        F: Fn() -> Box<dyn Strategy> + Send + Sync + 'static,
    {
        self.strategies.insert(name.to_lowercase(), Box::new(factory));
    }

    pub fn create(&self, name: &str) -> Result<Box<dyn Strategy>> {
        self.strategies
            .get(&name.to_lowercase())
            .map(|factory| factory())
            .ok_or_else(|| NetformError::UnknownStrategy(name.to_string()))
    }

    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.strategies.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn global() -> &'static StrategyRegistry {
        use std::sync::OnceLock;
        static REGISTRY: OnceLock<StrategyRegistry> = OnceLock::new();
        REGISTRY.get_or_init(StrategyRegistry::new)
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::new()
    }
}
