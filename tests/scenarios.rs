use netform::prelude::*;
use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

/// Every link costs more than it brings, whatever the other side thinks.
#[derive(Debug, Clone)]
struct LinksAreCostly;

impl Strategy for LinksAreCostly {
    fn name(&self) -> &str { "costly" }

    fn utility(&self, uid: Uid, network: &Network, params: &PolicyParams) -> f64 {
        -params.cost * network.degree(uid) as f64
    }

    fn clone_box(&self) -> Box<dyn Strategy> {
        Box::new(self.clone())
    }
}

/// Always wants to flip the state of its first candidate link.
#[derive(Debug, Clone)]
struct Restless;

impl Strategy for Restless {
    fn name(&self) -> &str { "restless" }

    fn utility(&self, _uid: Uid, _network: &Network, _params: &PolicyParams) -> f64 {
        0.0
    }

    fn best_simple_action(
        &self,
        uid: Uid,
        ctx: &ActionContext<'_>,
        create: bool,
        _mutual: bool,
    ) -> Move {
        Move {
            action: LinkAction::from_create(create),
            partner: ctx.candidates(uid, create).first().copied(),
            gain: 1.0,
        }
    }

    fn clone_box(&self) -> Box<dyn Strategy> {
        Box::new(self.clone())
    }
}

/// Proposes a link to itself, which the network refuses.
#[derive(Debug, Clone)]
struct SelfLinker;

impl Strategy for SelfLinker {
    fn name(&self) -> &str { "self-linker" }

    fn utility(&self, _uid: Uid, _network: &Network, _params: &PolicyParams) -> f64 {
        0.0
    }

    fn best_simple_action(
        &self,
        uid: Uid,
        _ctx: &ActionContext<'_>,
        create: bool,
        _mutual: bool,
    ) -> Move {
        if create {
            Move { action: LinkAction::Create, partner: Some(uid), gain: 1.0 }
        } else {
            Move::none(LinkAction::Delete)
        }
    }

    fn clone_box(&self) -> Box<dyn Strategy> {
        Box::new(self.clone())
    }
}

/// Records the step at which it was invoked.
struct StepRecorder(Rc<RefCell<Vec<u64>>>);

impl Reporter for StepRecorder {
    fn report(&mut self, world: &World) {
        self.0.borrow_mut().push(world.time());
    }
}

fn config(num_agents: u32) -> SimConfig {
    SimConfig {
        name: "scenario".into(),
        num_agents,
        cost: 0.1,
        alpha: 0.5,
        mutual_create: true,
        mutual_delete: false,
        max_steps: Some(50),
        ..SimConfig::default()
    }
}

fn assert_bijection(world: &World) {
    let agents: BTreeSet<Uid> = world.agents().map(|a| a.uid()).collect();
    let nodes: BTreeSet<Uid> = world.network().nodes().collect();
    assert_eq!(agents.len(), world.num_agents());
    assert_eq!(agents, nodes);
}

#[test]
fn agents_and_nodes_are_in_bijection() {
    let world = World::new(config(12)).unwrap();
    assert_bijection(&world);
    assert_eq!(world.network().node_count(), 12);
}

#[test]
fn generated_uids_skip_taken_ones() {
    let mut world = World::empty(config(1)).unwrap();
    world.add_agent_with_uid(0, Box::new(LinksAreCostly)).unwrap();
    world.add_agent_with_uid(2, Box::new(LinksAreCostly)).unwrap();
    let a = world.add_agent(Box::new(LinksAreCostly)).unwrap();
    let b = world.add_agent(Box::new(LinksAreCostly)).unwrap();
    assert_eq!((a, b), (1, 3));
    assert_bijection(&world);
}

#[test]
fn duplicate_uid_aborts_setup() {
    let mut world = World::empty(config(1)).unwrap();
    world.add_agent_with_uid(5, Box::new(LinksAreCostly)).unwrap();
    let err = world.add_agent_with_uid(5, Box::new(LinksAreCostly)).unwrap_err();
    assert_eq!(err, NetformError::DuplicateIdentifier(5));
    assert_eq!(world.num_agents(), 1);
}

#[test]
fn invalid_configuration_fails_construction() {
    let bad = SimConfig { polling_interval: 0, ..config(3) };
    assert!(matches!(World::new(bad), Err(NetformError::InvalidConfiguration(_))));

    let unknown = config(3).with_strategy("no-such-model");
    assert!(matches!(World::new(unknown), Err(NetformError::UnknownStrategy(_))));
}

#[test]
fn two_agents_link_up_and_settle() {
    let mut world = World::new(config(2)).unwrap();
    assert_eq!(world.network().edge_count(), 0);

    world.step();
    assert!(world.network().has_edge(0, 1));
    assert!(world.is_creation_stable(Some(&[0, 1][..]), true));
    assert!(world.is_deletion_stable(Some(&[0, 1][..]), false));
    assert!(world.is_pairwise_stable(None, true, false));
    assert_eq!(world.state(), RunState::Stopped(StopReason::Stable));
    assert_eq!(world.time(), 1);
}

#[test]
fn costly_triangle_dissolves() {
    let mut world = World::with_strategy(config(3), || Box::new(LinksAreCostly)).unwrap();
    world.add_link(0, 1).unwrap();
    world.add_link(1, 2).unwrap();
    world.add_link(0, 2).unwrap();
    assert!(!world.is_deletion_stable(None, false));

    // later agents see earlier deletions within the same step:
    // 0 drops (0,1), 1 drops (1,2), 2 drops (0,2)
    assert_eq!(world.step(), RunState::Stopped(StopReason::Stable));
    assert_eq!(world.time(), 1);
    assert_eq!(world.network().edge_count(), 0);
    assert!(world.is_deletion_stable(None, false));
}

#[test]
fn step_cap_stops_an_unstable_run() {
    // with deferred checks the run never evaluates stability inside the cap
    let cfg = SimConfig {
        defer_stability_to_cap: true,
        ..config(4).with_max_steps(Some(7))
    };
    let mut world = World::new(cfg).unwrap();
    let reason = world.run();
    assert_eq!(reason, StopReason::StepCap);
    assert_eq!(world.time(), 7);
}

#[test]
fn restless_agents_hit_the_step_cap() {
    let cfg = config(2).with_max_steps(Some(6));
    assert_eq!(cfg.check_interval(), 1);
    let mut world = World::with_strategy(cfg, || Box::new(Restless)).unwrap();

    // 0 creates the link, 1 deletes it again, every step
    for _ in 0..5 {
        assert_eq!(world.step(), RunState::Running);
        assert_eq!(world.network().edge_count(), 0);
    }
    assert_eq!(world.step(), RunState::Stopped(StopReason::StepCap));
    assert_eq!(world.time(), 6);
}

#[test]
fn invalid_move_is_ignored() {
    let mut world = World::with_strategy(config(2), || Box::new(SelfLinker)).unwrap();
    assert_eq!(world.step(), RunState::Running);
    assert_eq!(world.time(), 1);
    assert_eq!(world.network().edge_count(), 0);
    assert_bijection(&world);
}

#[test]
fn stopped_world_does_not_advance() {
    let mut world = World::new(SimConfig { max_steps: Some(1), ..config(3) }).unwrap();
    world.run();
    let edges = world.network().edges();
    assert!(!world.is_running());
    assert_eq!(world.step(), world.state());
    assert_eq!(world.time(), 1);
    assert_eq!(world.network().edges(), edges);
}

#[test]
fn polling_every_third_step() {
    let cfg = SimConfig {
        polling_interval: 3,
        max_steps: Some(10),
        defer_stability_to_cap: true,
        ..config(4)
    };
    let mut world = World::with_strategy(cfg, || Box::new(LinksAreCostly)).unwrap();
    let seen = Rc::new(RefCell::new(Vec::new()));
    world.add_reporter(Box::new(StepRecorder(seen.clone())));

    assert_eq!(world.run(), StopReason::StepCap);
    assert_eq!(*seen.borrow(), vec![0, 3, 6, 9]);

    let steps: Vec<u64> = world.metrics.get_snapshots().iter().map(|s| s.step).collect();
    assert_eq!(steps, vec![0, 3, 6, 9]);
}

#[test]
fn welfare_sums_component_utilities() {
    let mut world = World::new(config(3)).unwrap();
    world.add_link(0, 1).unwrap();
    // pair: 0.5 - 0.1 each, isolated agent: 0
    assert!((world.welfare() - 0.8).abs() < 1e-12);
    assert_eq!(world.connected_components().count(), 2);
}

#[test]
fn seeded_initial_network_is_reproducible() {
    let cfg = SimConfig { initial_link_probability: 0.3, ..config(20) };
    let a = World::new(cfg.clone()).unwrap();
    let b = World::new(cfg).unwrap();
    assert!(a.network().edge_count() > 0);
    assert_eq!(a.network().edges(), b.network().edges());
}

#[test]
fn random_schedule_is_reproducible() {
    let cfg = SimConfig {
        schedule: SchedulePolicy::RandomPermutation,
        initial_link_probability: 0.2,
        ..config(15)
    };
    let mut a = World::new(cfg.clone()).unwrap();
    let mut b = World::new(cfg).unwrap();
    a.run();
    b.run();
    assert_eq!(a.time(), b.time());
    assert_eq!(a.network().edges(), b.network().edges());
}
