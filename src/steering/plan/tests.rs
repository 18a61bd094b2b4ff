use bevy::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

use super::*;
use crate::steering::line_path::LinePath;
use crate::steering::obstacles::{CircleWorld, Obstacle};
use crate::steering::query::{FactionFriendliness, Faction};
use crate::steering::spatial_hash::SpatialHash;

struct Fixture {
    world: World,
    snapshot: AgentSnapshot,
    obstacles: CircleWorld,
    hash: SpatialHash,
    field: Option<FlowField>,
}

impl Fixture {
    fn new() -> Self {
        Self {
            world: World::new(),
            snapshot: AgentSnapshot::default(),
            obstacles: CircleWorld::new(),
            hash: SpatialHash::new(Vec2::splat(100.0), 4.0),
            field: None,
        }
    }

    fn add(&mut self, k: Kinematics, faction: Option<u8>) -> Entity {
        let e = self.world.spawn_empty().id();
        self.snapshot.kinematics.insert(e, k);
        if let Some(f) = faction {
            self.snapshot.factions.insert(e, Faction(f));
        }
        self.hash.insert(e, k.position, k.radius());
        e
    }

    fn run(&self, entity: Entity, plan: &SteeringPlan, params: &SteeringParams, path: Option<&PathFollower>) -> (PlanOutput, Kinematics) {
        let friendliness = FactionFriendliness::new(&self.snapshot.factions);
        let ctx = SteeringContext {
            snapshot: &self.snapshot,
            obstacles: &self.obstacles,
            candidates: &self.hash,
            friendliness: &friendliness,
            flow_field: self.field.as_ref(),
            neighbor_radius: 5.0,
            dt: 1.0 / 30.0,
        };
        let mut kinematics = *self.snapshot.get(entity).unwrap();
        let mut wander = WanderState {
            orientation: 0.0,
            target: Vec2::new(params.wander2_radius, 0.0),
        };
        let agent = SteeringAgent {
            entity,
            kinematics: &mut kinematics,
            params,
            wander: Some(&mut wander),
            path,
        };
        let mut rng = StdRng::seed_from_u64(1);
        let mut scratch = PlanScratch::default();
        let out = evaluate_plan(plan, agent, &ctx, &mut rng, &mut scratch);
        (out, kinematics)
    }
}

fn agent_at(pos: Vec2) -> Kinematics {
    Kinematics::new(pos, 0.2, 5.0, 10.0)
}

#[test]
fn test_outputs_are_weighted_and_summed() {
    let mut fx = Fixture::new();
    let me = fx.add(agent_at(Vec2::ZERO), None);
    let params = SteeringParams::default();

    let plan = SteeringPlan::new()
        .with(Behavior::Seek(Vec2::new(10.0, 0.0)), 0.5)
        .with(Behavior::Seek(Vec2::new(0.0, 10.0)), 0.25);
    let (out, _) = fx.run(me, &plan, &params, None);
    assert!((out.acceleration - Vec2::new(5.0, 2.5)).length() < 1e-4);
}

#[test]
fn test_missing_target_contributes_zero() {
    let mut fx = Fixture::new();
    let me = fx.add(agent_at(Vec2::ZERO), None);
    let ghost = fx.world.spawn_empty().id();
    let params = SteeringParams::default();

    let plan = SteeringPlan::new()
        .with(Behavior::Pursue(ghost), 1.0)
        .with(Behavior::Interpose(ghost, me), 1.0);
    let (out, _) = fx.run(me, &plan, &params, None);
    assert_eq!(out.acceleration, Vec2::ZERO);
    assert_eq!(out.missing_targets.as_slice(), &[ghost]);
}

#[test]
fn test_retain_targets_drops_stale_entries() {
    let mut world = World::new();
    let alive = world.spawn_empty().id();
    let dead = world.spawn_empty().id();

    let mut plan = SteeringPlan::new()
        .with(Behavior::Pursue(alive), 1.0)
        .with(Behavior::Evade(dead), 1.0)
        .with(Behavior::Interpose(alive, dead), 1.0)
        .with(Behavior::Wander2, 1.0);

    let removed = plan.retain_targets(|e| e == alive);
    assert_eq!(removed, 2);
    assert_eq!(plan.len(), 2);
}

#[test]
fn test_separation_respects_filter() {
    let mut fx = Fixture::new();
    let me = fx.add(agent_at(Vec2::ZERO), Some(1));
    fx.add(agent_at(Vec2::new(0.5, 0.0)), Some(2)); // hostile, right
    fx.add(agent_at(Vec2::new(0.0, 0.5)), Some(1)); // friend, above
    let params = SteeringParams::default();

    let plan = SteeringPlan::new().with(Behavior::Separation(CandidateFilter::Friendly), 1.0);
    let (out, _) = fx.run(me, &plan, &params, None);
    assert!(out.acceleration.y < 0.0);
    assert!(out.acceleration.x.abs() < 1e-5);

    let plan = SteeringPlan::new().with(Behavior::Separation(CandidateFilter::Hostile), 1.0);
    let (out, _) = fx.run(me, &plan, &params, None);
    assert!(out.acceleration.x < 0.0);
    assert!(out.acceleration.y.abs() < 1e-5);
}

#[test]
fn test_follow_path_reports_completion() {
    let mut fx = Fixture::new();
    let me = fx.add(agent_at(Vec2::new(10.0, 0.0)).with_velocity(Vec2::X), None);
    let params = SteeringParams::default();
    let follower = PathFollower::new(LinePath::new(vec![Vec2::ZERO, Vec2::new(10.0, 0.0)]).unwrap());

    let plan = SteeringPlan::new().with(Behavior::FollowPath, 1.0);
    let (out, k) = fx.run(me, &plan, &params, Some(&follower));
    assert!(out.path_completed);
    assert_eq!(k.velocity, Vec2::ZERO);

    // No follower, no steering.
    let (out, _) = fx.run(me, &plan, &params, None);
    assert_eq!(out, PlanOutput::default());
}

#[test]
fn test_flow_bias_samples_field() {
    let mut fx = Fixture::new();
    fx.obstacles.insert(None, Vec2::new(1.0, 0.0), Obstacle::solid(0.5));
    let mut field = FlowField::new(16, 16, 1.0, 1.5);
    field.generate(Vec2::ZERO, &fx.obstacles);
    fx.field = Some(field);

    let me = fx.add(agent_at(Vec2::new(-0.2, 0.0)), None);
    let params = SteeringParams::default();
    let plan = SteeringPlan::new().with(Behavior::FlowBias { radius: 1.0 }, 1.0);
    let (out, _) = fx.run(me, &plan, &params, None);
    assert!(out.acceleration.x < 0.0, "should be pushed away from the rock, got {:?}", out.acceleration);

    fx.field = None;
    let (out, _) = fx.run(me, &plan, &params, None);
    assert_eq!(out.acceleration, Vec2::ZERO);
}

#[test]
fn test_hide_ignores_triggers_and_boundaries() {
    let mut fx = Fixture::new();
    fx.obstacles.insert(None, Vec2::new(-3.0, 0.0), Obstacle::trigger(1.0));
    fx.obstacles.insert(None, Vec2::ZERO, Obstacle::boundary(50.0));
    fx.obstacles.insert(None, Vec2::new(3.0, 0.0), Obstacle::solid(1.0));

    let hunter = fx.add(agent_at(Vec2::new(0.0, -5.0)), None);
    let me = fx.add(agent_at(Vec2::ZERO), None);
    let params = SteeringParams::default();

    let plan = SteeringPlan::new().with(Behavior::Hide(hunter), 1.0);
    let (out, _) = fx.run(me, &plan, &params, None);
    // Only the solid rock on the right is a hiding spot.
    assert!(out.acceleration.x > 0.0, "got {:?}", out.acceleration);
}

#[test]
fn test_plan_from_ron() {
    let plan: SteeringPlan = ron::from_str(
        "([
            (behavior: Wander2, weight: 1.0),
            (behavior: Separation(Friendly), weight: 2.0),
            (behavior: FlowBias(radius: 1.5), weight: 0.5),
        ])",
    )
    .unwrap();

    assert_eq!(plan.len(), 3);
    assert!(plan.needs_wander_state());
    assert_eq!(plan.0[1].behavior, Behavior::Separation(CandidateFilter::Friendly));
}

#[test]
fn test_path_follower_from_ron() {
    let follower: PathFollower =
        ron::from_str("(path: [(0.0, 0.0), (4.0, 0.0)], looping: true, direction: Reverse)").unwrap();
    assert_eq!(follower.path.max_dist(), 4.0);
    assert!(follower.looping);
    assert!(!follower.finished);

    let empty: Result<PathFollower, _> = ron::from_str("(path: [], looping: false, direction: Forward)");
    assert!(empty.is_err());
}
