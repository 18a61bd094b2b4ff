//! Data-driven behavior composition.
//!
//! An agent's [`SteeringPlan`] lists the behaviors it runs and how much each
//! one weighs. [`evaluate_plan`] turns a plan into a single acceleration for
//! the tick; it touches nothing but its arguments, so it can be exercised
//! without an ECS world.

use bevy::prelude::*;
use rand::Rng;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::behaviors::{self, WanderState};
use super::components::{AgentSnapshot, PathFollower};
use super::flow_field::FlowField;
use super::kinematics::Kinematics;
use super::params::SteeringParams;
use super::query::{CandidateFilter, CandidateProvider, ColliderShape, Friendliness, OverlapHit, SpatialQuery};

/// One steering behavior and its arguments.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Behavior {
    Seek(Vec2),
    Arrive(Vec2),
    Flee(Vec2),
    Pursue(Entity),
    GetInRange { target: Entity, range: f32 },
    Evade(Entity),
    /// Hide from an entity behind nearby solid obstacles.
    Hide(Entity),
    Interpose(Entity, Entity),
    Wander1,
    Wander2,
    ObstacleAvoidance,
    CollisionAvoidance(CandidateFilter),
    Separation(CandidateFilter),
    Cohesion(CandidateFilter),
    VelocityMatch(CandidateFilter),
    /// Hold `offset` in the target's local frame (x right, y forward).
    OffsetPursuit { target: Entity, offset: Vec2 },
    FollowPath,
    /// Sample the flow field within `radius` of the agent.
    FlowBias { radius: f32 },
}

impl Behavior {
    /// Entities this behavior reads.
    pub fn targets(&self) -> SmallVec<[Entity; 2]> {
        let mut out = SmallVec::new();
        match *self {
            Behavior::Pursue(e) | Behavior::Evade(e) | Behavior::Hide(e) => out.push(e),
            Behavior::GetInRange { target, .. } | Behavior::OffsetPursuit { target, .. } => out.push(target),
            Behavior::Interpose(a, b) => {
                out.push(a);
                out.push(b);
            }
            _ => {}
        }
        out
    }

    pub fn needs_wander_state(&self) -> bool {
        matches!(self, Behavior::Wander1 | Behavior::Wander2)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightedBehavior {
    pub behavior: Behavior,
    pub weight: f32,
}

/// Behaviors an agent evaluates every tick. Outputs are summed by weight.
#[derive(Component, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SteeringPlan(pub Vec<WeightedBehavior>);

impl SteeringPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, behavior: Behavior, weight: f32) -> Self {
        self.push(behavior, weight);
        self
    }

    pub fn push(&mut self, behavior: Behavior, weight: f32) {
        self.0.push(WeightedBehavior { behavior, weight });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn needs_wander_state(&self) -> bool {
        self.0.iter().any(|w| w.behavior.needs_wander_state())
    }

    /// Drop every entry that reads an entity for which `alive` is false.
    /// Returns how many entries were removed.
    pub fn retain_targets(&mut self, mut alive: impl FnMut(Entity) -> bool) -> usize {
        let before = self.0.len();
        self.0.retain(|w| w.behavior.targets().into_iter().all(&mut alive));
        before - self.0.len()
    }
}

/// Collaborators a plan is evaluated against.
pub struct SteeringContext<'a> {
    pub snapshot: &'a AgentSnapshot,
    pub obstacles: &'a dyn SpatialQuery,
    pub candidates: &'a dyn CandidateProvider,
    pub friendliness: &'a dyn Friendliness,
    pub flow_field: Option<&'a FlowField>,
    /// Broad-phase radius for group behaviors and collision avoidance.
    pub neighbor_radius: f32,
    pub dt: f32,
}

/// The agent being steered, borrowed from wherever it lives.
pub struct SteeringAgent<'s> {
    pub entity: Entity,
    pub kinematics: &'s mut Kinematics,
    pub params: &'s SteeringParams,
    pub wander: Option<&'s mut WanderState>,
    pub path: Option<&'s PathFollower>,
}

/// Reusable buffers for [`evaluate_plan`], owned by the caller.
#[derive(Debug, Default)]
pub struct PlanScratch {
    neighbors: Vec<Entity>,
    neighbor_kinematics: Vec<Kinematics>,
    overlaps: Vec<OverlapHit>,
    hiding_spots: Vec<(Vec2, f32)>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlanOutput {
    /// Weighted sum of every behavior's output.
    pub acceleration: Vec2,
    /// `FollowPath` finished an open path this tick.
    pub path_completed: bool,
    /// Targets missing from the snapshot; their behaviors contributed zero.
    pub missing_targets: SmallVec<[Entity; 2]>,
}

fn lookup<'c>(ctx: &'c SteeringContext<'_>, entity: Entity, out: &mut PlanOutput) -> Option<&'c Kinematics> {
    let found = ctx.snapshot.get(entity);
    if found.is_none() && !out.missing_targets.contains(&entity) {
        out.missing_targets.push(entity);
    }
    found
}

/// Neighbors of the agent that pass `filter`, copied from the snapshot.
fn gather_neighbors<'b>(
    ctx: &SteeringContext<'_>,
    entity: Entity,
    position: Vec2,
    radius: f32,
    filter: CandidateFilter,
    scratch: &'b mut PlanScratch,
) -> &'b [Kinematics] {
    ctx.candidates
        .agents_in_radius(position, radius, Some(entity), &mut scratch.neighbors);

    scratch.neighbor_kinematics.clear();
    for &other in &scratch.neighbors {
        if !filter.accepts(ctx.friendliness, entity, other) {
            continue;
        }
        if let Some(k) = ctx.snapshot.get(other) {
            scratch.neighbor_kinematics.push(*k);
        }
    }
    &scratch.neighbor_kinematics
}

/// Solid, non-trigger obstacles around the agent as (center, radius).
fn gather_hiding_spots<'b>(
    ctx: &SteeringContext<'_>,
    position: Vec2,
    params: &SteeringParams,
    scratch: &'b mut PlanScratch,
) -> &'b [(Vec2, f32)] {
    ctx.obstacles.circle_overlap_all(
        position,
        params.hide_search_radius,
        params.obstacle_layer_mask,
        &mut scratch.overlaps,
    );

    scratch.hiding_spots.clear();
    scratch.hiding_spots.extend(
        scratch
            .overlaps
            .iter()
            .filter(|hit| !hit.is_trigger && hit.shape == ColliderShape::Solid)
            .map(|hit| (hit.position, hit.radius)),
    );
    &scratch.hiding_spots
}

/// Evaluate `plan` for one agent and return the summed acceleration.
///
/// The caller applies the result with `Kinematics::steer`. Behaviors that
/// hard-stop (arrive, flee, follow path) may zero the agent's velocity during
/// evaluation. Targets missing from the snapshot contribute zero and are
/// reported in [`PlanOutput::missing_targets`].
pub fn evaluate_plan<R: Rng>(
    plan: &SteeringPlan,
    agent: SteeringAgent<'_>,
    ctx: &SteeringContext<'_>,
    rng: &mut R,
    scratch: &mut PlanScratch,
) -> PlanOutput {
    let SteeringAgent {
        entity,
        kinematics,
        params,
        mut wander,
        path,
    } = agent;

    let mut out = PlanOutput::default();
    let neighbor_radius = ctx.neighbor_radius.max(params.max_sep_dist);

    for &WeightedBehavior { behavior, weight } in &plan.0 {
        let acceleration = match behavior {
            Behavior::Seek(target) => behaviors::seek(kinematics, target),
            Behavior::Arrive(target) => behaviors::arrive(kinematics, params, target),
            Behavior::Flee(target) => behaviors::flee(kinematics, params, target),
            Behavior::Pursue(target) => match lookup(ctx, target, &mut out) {
                Some(t) => behaviors::pursue(kinematics, params, t),
                None => Vec2::ZERO,
            },
            Behavior::GetInRange { target, range } => match lookup(ctx, target, &mut out) {
                Some(t) => behaviors::get_in_range(kinematics, params, t, range),
                None => Vec2::ZERO,
            },
            Behavior::Evade(target) => match lookup(ctx, target, &mut out) {
                Some(t) => behaviors::evade(kinematics, params, t),
                None => Vec2::ZERO,
            },
            Behavior::Hide(target) => match lookup(ctx, target, &mut out) {
                Some(t) => {
                    let spots = gather_hiding_spots(ctx, kinematics.position, params, scratch);
                    behaviors::hide(kinematics, params, t, spots.iter().copied())
                }
                None => Vec2::ZERO,
            },
            Behavior::Interpose(a, b) => {
                let ta = lookup(ctx, a, &mut out);
                let tb = lookup(ctx, b, &mut out);
                match (ta, tb) {
                    (Some(ta), Some(tb)) => behaviors::interpose(kinematics, params, ta, tb),
                    _ => Vec2::ZERO,
                }
            }
            Behavior::Wander1 => match wander.as_deref_mut() {
                Some(state) => behaviors::wander1(kinematics, params, state, rng),
                None => Vec2::ZERO,
            },
            Behavior::Wander2 => match wander.as_deref_mut() {
                Some(state) => behaviors::wander2(kinematics, params, state, rng, ctx.dt),
                None => Vec2::ZERO,
            },
            Behavior::ObstacleAvoidance => behaviors::obstacle_avoidance(kinematics, params, ctx.obstacles),
            Behavior::CollisionAvoidance(filter) => {
                let others = gather_neighbors(ctx, entity, kinematics.position, neighbor_radius, filter, scratch);
                behaviors::collision_avoidance(kinematics, params, others)
            }
            Behavior::Separation(filter) => {
                let others = gather_neighbors(ctx, entity, kinematics.position, neighbor_radius, filter, scratch);
                behaviors::separation(kinematics, params, others)
            }
            Behavior::Cohesion(filter) => {
                let others = gather_neighbors(ctx, entity, kinematics.position, neighbor_radius, filter, scratch);
                behaviors::cohesion(kinematics, params, others)
            }
            Behavior::VelocityMatch(filter) => {
                let others = gather_neighbors(ctx, entity, kinematics.position, neighbor_radius, filter, scratch);
                behaviors::velocity_match(kinematics, params, others)
            }
            Behavior::OffsetPursuit { target, offset } => match lookup(ctx, target, &mut out) {
                Some(t) => behaviors::offset_pursuit(kinematics, params, t, offset),
                None => Vec2::ZERO,
            },
            Behavior::FollowPath => match path {
                Some(follower) => {
                    let result = behaviors::follow_path(
                        kinematics,
                        params,
                        &follower.path,
                        follower.looping,
                        follower.direction,
                    );
                    out.path_completed |= result.complete;
                    result.acceleration
                }
                None => Vec2::ZERO,
            },
            Behavior::FlowBias { radius } => match ctx.flow_field {
                Some(field) => field.force(kinematics.position, radius),
                None => Vec2::ZERO,
            },
        };

        out.acceleration += acceleration * weight;
    }

    out
}

#[cfg(test)]
mod tests;
