use bevy::math::Vec2;

use super::basics::{arrive, flee, seek};
use crate::steering::kinematics::Kinematics;
use crate::steering::params::SteeringParams;

/// Look-ahead time for intercepting something `distance` away while moving
/// at `speed`: the time to close the gap, capped at `max_prediction`.
fn prediction_time(distance: f32, speed: f32, max_prediction: f32) -> f32 {
    if max_prediction <= 0.0 {
        return 0.0;
    }
    if speed <= distance / max_prediction {
        max_prediction
    } else {
        distance / speed
    }
}

fn intercept_point(agent: &Kinematics, params: &SteeringParams, target: &Kinematics) -> Vec2 {
    let distance = agent.position.distance(target.position);
    let prediction = prediction_time(distance, agent.speed(), params.max_prediction_time);
    target.position + target.velocity * prediction
}

/// Seek the target's predicted position.
pub fn pursue(agent: &Kinematics, params: &SteeringParams, target: &Kinematics) -> Vec2 {
    seek(agent, intercept_point(agent, params, target))
}

/// Arrive at a point `range` short of the target's predicted position, on the
/// agent's side of it.
pub fn get_in_range(
    agent: &mut Kinematics,
    params: &SteeringParams,
    target: &Kinematics,
    range: f32,
) -> Vec2 {
    let explicit_target = intercept_point(agent, params, target);
    let stand_off = explicit_target + (agent.position - explicit_target).normalize_or_zero() * range;
    arrive(agent, params, stand_off)
}

/// Flee the target's predicted position.
///
/// Prediction uses the target's speed, and a computed (uncapped) prediction
/// is shortened by 10% so the agent reacts slightly before the interception
/// point.
pub fn evade(agent: &mut Kinematics, params: &SteeringParams, target: &Kinematics) -> Vec2 {
    let distance = agent.position.distance(target.position);
    let speed = target.speed();
    let max_prediction = params.max_prediction_time;

    let prediction = if max_prediction <= 0.0 {
        0.0
    } else if speed <= distance / max_prediction {
        max_prediction
    } else {
        0.9 * distance / speed
    };

    let explicit_target = target.position + target.velocity * prediction;
    flee(agent, params, explicit_target)
}

/// Pursue a point held in the target's local frame (x right, y forward).
pub fn offset_pursuit(
    agent: &mut Kinematics,
    params: &SteeringParams,
    target: &Kinematics,
    offset: Vec2,
) -> Vec2 {
    let world_offset_pos = target.position + target.local_to_world(offset);
    let distance = agent.position.distance(world_offset_pos);
    let prediction = prediction_time(distance, agent.speed(), params.max_prediction_time);
    let explicit_target = world_offset_pos + target.velocity * prediction;
    arrive(agent, params, explicit_target)
}

/// Arrive between two targets, at the midpoint of where both will be by the
/// time the agent can reach their current midpoint.
pub fn interpose(
    agent: &mut Kinematics,
    params: &SteeringParams,
    a: &Kinematics,
    b: &Kinematics,
) -> Vec2 {
    let mid = (a.position + b.position) / 2.0;
    let time_to_reach = if agent.max_velocity > 0.0 {
        mid.distance(agent.position) / agent.max_velocity
    } else {
        0.0
    };

    let future_a = a.position + a.velocity * time_to_reach;
    let future_b = b.position + b.velocity * time_to_reach;
    arrive(agent, params, (future_a + future_b) / 2.0)
}

/// Best hiding spot behind one of `obstacles` (center, radius) relative to
/// `target`: the candidate nearest the agent, earliest on ties.
pub fn hiding_position<I>(agent: &Kinematics, params: &SteeringParams, target: &Kinematics, obstacles: I) -> Option<Vec2>
where
    I: IntoIterator<Item = (Vec2, f32)>,
{
    let mut best: Option<(Vec2, f32)> = None;
    for (position, radius) in obstacles {
        let dir = (position - target.position).normalize_or_zero();
        let spot = position + dir * (radius + params.hide_distance_from_boundary);
        let dist = spot.distance(agent.position);
        if best.is_none_or(|(_, best_dist)| dist < best_dist) {
            best = Some((spot, dist));
        }
    }
    best.map(|(spot, _)| spot)
}

/// Put an obstacle between the agent and `target`. Evades when no obstacle
/// is available.
pub fn hide<I>(agent: &mut Kinematics, params: &SteeringParams, target: &Kinematics, obstacles: I) -> Vec2
where
    I: IntoIterator<Item = (Vec2, f32)>,
{
    match hiding_position(agent, params, target, obstacles) {
        Some(spot) => arrive(agent, params, spot),
        None => evade(agent, params, target),
    }
}
