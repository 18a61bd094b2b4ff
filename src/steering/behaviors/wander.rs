use bevy::prelude::*;
use rand::Rng;

use super::basics::seek;
use crate::steering::kinematics::Kinematics;
use crate::steering::math::{orientation_to_vector, random_binomial};
use crate::steering::params::SteeringParams;

/// Persistent wander state, one per wandering agent.
///
/// `orientation` drives [`wander1`]; `target` is the point on the wander
/// circle used by [`wander2`].
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct WanderState {
    pub orientation: f32,
    pub target: Vec2,
}

impl WanderState {
    /// Start with the wander2 target at a random spot on its circle.
    pub fn new<R: Rng>(rng: &mut R, params: &SteeringParams) -> Self {
        let theta = rng.random::<f32>() * std::f32::consts::TAU;
        Self {
            orientation: 0.0,
            target: Vec2::from_angle(theta) * params.wander2_radius,
        }
    }
}

/// Orientation based wander.
///
/// The wander orientation takes a bounded random walk; the agent seeks a
/// point on a circle held `wander_offset` ahead of it, at the combined
/// orientation. Tends to jerk more than [`wander2`].
pub fn wander1<R: Rng>(
    agent: &Kinematics,
    params: &SteeringParams,
    state: &mut WanderState,
    rng: &mut R,
) -> Vec2 {
    state.orientation += random_binomial(rng) * params.wander_rate;

    let target_orientation = state.orientation + agent.heading();
    let circle_center = agent.position + agent.forward() * params.wander_offset;
    let target = circle_center + orientation_to_vector(target_orientation) * params.wander_radius;

    seek(agent, target)
}

/// Position based wander.
///
/// Jitters a point on a circle of `wander2_radius`, snaps it back onto the
/// circle, and seeks it after pushing the circle `wander2_distance` in front
/// of the agent. Produces smooth, meandering paths.
pub fn wander2<R: Rng>(
    agent: &Kinematics,
    params: &SteeringParams,
    state: &mut WanderState,
    rng: &mut R,
    dt: f32,
) -> Vec2 {
    let jitter = params.wander2_jitter * dt;
    state.target += Vec2::new(
        rng.random_range(-1.0f32..=1.0) * jitter,
        rng.random_range(-1.0f32..=1.0) * jitter,
    );
    state.target = state.target.normalize_or_zero() * params.wander2_radius;

    let target = agent.position + agent.forward() * params.wander2_distance + state.target;
    seek(agent, target)
}
