// Baseline policy, useful as a control run and in tests

use super::{Move, LinkAction, Strategy};
use crate::agent::{ActionContext, PolicyParams};
use crate::network::{Network, Uid};

/// Constant utility, so no link change is ever improving.
#[derive(Debug, Clone, Copy, Default)]
pub struct Inert;

impl Strategy for Inert {
    fn name(&self) -> &str { "inert" }

    fn utility(&self, _uid: Uid, _network: &Network, _params: &PolicyParams) -> f64 {
        0.0
    }

    // No need to scan the candidates of a flat utility.
    fn best_simple_action(
        &self,
        _uid: Uid,
        _ctx: &ActionContext<'_>,
        create: bool,
        _mutual: bool,
    ) -> Move {
        Move::none(LinkAction::from_create(create))
    }

    fn clone_box(&self) -> Box<dyn Strategy> {
        Box::new(*self)
    }
}
