use bevy::math::Vec2;

use super::basics::arrive;
use crate::steering::kinematics::Kinematics;
use crate::steering::math::is_facing;
use crate::steering::params::SteeringParams;

/// Push away from every candidate closer than `max_sep_dist`.
///
/// Each contributes `sep_max_acceleration * (max_sep_dist - dist) /
/// (max_sep_dist - r1 - r2)` along the direction away from it, so the push
/// grows linearly as the gap closes. A non-positive denominator (radii that
/// already fill the trigger distance) counts as full strength. The total is
/// capped at `sep_max_acceleration`.
///
/// Candidates are expected to be pre-filtered (normally to friends).
pub fn separation<'a, I>(agent: &Kinematics, params: &SteeringParams, candidates: I) -> Vec2
where
    I: IntoIterator<Item = &'a Kinematics>,
{
    let mut acceleration = Vec2::ZERO;

    for other in candidates {
        let direction = agent.position - other.position;
        let dist = direction.length();
        if dist >= params.max_sep_dist {
            continue;
        }

        let denominator = params.max_sep_dist - agent.radius() - other.radius();
        let strength = if denominator <= 0.0 {
            params.sep_max_acceleration
        } else {
            params.sep_max_acceleration * (params.max_sep_dist - dist) / denominator
        };

        acceleration += direction.normalize_or_zero() * strength;
    }

    acceleration.clamp_length_max(params.sep_max_acceleration)
}

/// Arrive at the centroid of the candidates in front of the agent.
///
/// Only candidates within `facing_cosine` degrees of the agent's forward
/// vector count. Returns zero if none do.
pub fn cohesion<'a, I>(agent: &mut Kinematics, params: &SteeringParams, candidates: I) -> Vec2
where
    I: IntoIterator<Item = &'a Kinematics>,
{
    let threshold = params.facing_cosine_value();
    let forward = agent.forward();

    let mut center = Vec2::ZERO;
    let mut count = 0;
    for other in candidates {
        if is_facing(agent.position, forward, other.position, threshold) {
            center += other.position;
            count += 1;
        }
    }

    if count == 0 {
        return Vec2::ZERO;
    }

    arrive(agent, params, center / count as f32)
}

/// Match the average velocity of the candidates in front of the agent.
pub fn velocity_match<'a, I>(agent: &Kinematics, params: &SteeringParams, candidates: I) -> Vec2
where
    I: IntoIterator<Item = &'a Kinematics>,
{
    let threshold = params.facing_cosine_value();
    let forward = agent.forward();

    let mut total = Vec2::ZERO;
    let mut count = 0;
    for other in candidates {
        if is_facing(agent.position, forward, other.position, threshold) {
            total += other.velocity;
            count += 1;
        }
    }

    if count == 0 {
        return Vec2::ZERO;
    }

    let delta = total / count as f32 - agent.velocity;
    let time = params.velocity_match_time_to_target.max(f32::EPSILON);
    (delta / time).clamp_length_max(agent.max_acceleration)
}
