use bevy::math::Vec2;

use super::basics::seek_with;
use crate::steering::kinematics::Kinematics;
use crate::steering::math::angle_between_degrees;
use crate::steering::params::SteeringParams;
use crate::steering::query::{CastHit, SpatialQuery};

/// Velocity below this speed is ignored when picking the whisker direction.
const MIN_WHISKER_SPEED_SQ: f32 = 0.005 * 0.005;

/// Angle (degrees) between velocity and hit normal past which the agent is
/// considered to be driving head-on into the obstacle.
const HEAD_ON_ANGLE: f32 = 165.0;

/// Predicted separations below this fraction of the current distance are
/// rounding noise on a dead-center course and count as a direct hit.
const DIRECT_HIT_TOLERANCE: f32 = 1e-4;

fn find_obstacle<Q: SpatialQuery + ?Sized>(
    agent: &Kinematics,
    params: &SteeringParams,
    query: &Q,
) -> Option<CastHit> {
    let dir = if agent.velocity.length_squared() > MIN_WHISKER_SPEED_SQ {
        agent.velocity.normalize()
    } else {
        agent.forward()
    };

    let side = params.side_whisker_angle.to_radians();
    let whiskers = [
        (dir, params.main_whisker_len),
        (Vec2::from_angle(side).rotate(dir), params.side_whisker_len),
        (Vec2::from_angle(-side).rotate(dir), params.side_whisker_len),
    ];

    whiskers.into_iter().find_map(|(whisker, len)| {
        query.circle_cast(agent.position, agent.radius(), whisker, len, params.obstacle_layer_mask)
    })
}

/// Whisker based obstacle avoidance.
///
/// Casts a main whisker along the velocity (or facing, when nearly stopped)
/// and two shorter side whiskers. The first hit produces a target pushed off
/// the surface along its normal; when driving almost straight into the
/// surface the target is nudged sideways so the agent commits to one side.
/// Returns zero when nothing is hit.
pub fn obstacle_avoidance<Q: SpatialQuery + ?Sized>(
    agent: &Kinematics,
    params: &SteeringParams,
    query: &Q,
) -> Vec2 {
    let Some(hit) = find_obstacle(agent, params, query) else {
        return Vec2::ZERO;
    };

    let mut target = hit.point + hit.normal * params.obstacle_avoid_distance;

    let angle = angle_between_degrees(agent.velocity, hit.normal);
    if angle > HEAD_ON_ANGLE {
        let perp = hit.normal.perp();
        target += perp * (angle - HEAD_ON_ANGLE).to_radians().sin() * 2.0 * params.obstacle_avoid_distance;
    }

    seek_with(
        agent,
        target,
        agent.max_acceleration * params.obstacle_avoidance_multiplier,
    )
}

/// Predictive avoidance of other moving agents.
///
/// For each candidate the time of closest approach is
/// `-dot(rel_pos, rel_vel) / |rel_vel|^2`. Candidates that never come within
/// the sum of radii plus `distance_between` are ignored, as are candidates
/// with no relative motion. The soonest strictly positive approach wins; a
/// later candidate must be strictly sooner to replace it.
///
/// If the winner is already overlapping (current distance below the combined
/// radius) or is on a dead-center course, the agent steers straight away from
/// its current position; otherwise it steers along the predicted relative
/// position at the time of closest approach. `distance_between` only widens
/// the discard test.
pub fn collision_avoidance<'a, I>(agent: &Kinematics, params: &SteeringParams, candidates: I) -> Vec2
where
    I: IntoIterator<Item = &'a Kinematics>,
{
    struct Threat {
        time: f32,
        position: Vec2,
        radius: f32,
        min_separation: f32,
        distance: f32,
        relative_pos: Vec2,
        relative_vel: Vec2,
    }

    let mut first: Option<Threat> = None;

    for other in candidates {
        let relative_pos = agent.position - other.position;
        let relative_vel = agent.velocity - other.velocity;
        let distance = relative_pos.length();
        let relative_speed_sq = relative_vel.length_squared();

        if relative_speed_sq == 0.0 {
            continue;
        }

        let time = -relative_pos.dot(relative_vel) / relative_speed_sq;
        let min_separation = (relative_pos + relative_vel * time).length();

        if min_separation > agent.radius() + other.radius() + params.distance_between {
            continue;
        }

        let shortest = first.as_ref().map_or(f32::INFINITY, |t| t.time);
        if time > 0.0 && time < shortest {
            first = Some(Threat {
                time,
                position: other.position,
                radius: other.radius(),
                min_separation,
                distance,
                relative_pos,
                relative_vel,
            });
        }
    }

    let Some(threat) = first else {
        return Vec2::ZERO;
    };

    let direct_hit = threat.min_separation <= DIRECT_HIT_TOLERANCE * threat.distance.max(1.0);
    let direction = if direct_hit || threat.distance < agent.radius() + threat.radius {
        agent.position - threat.position
    } else {
        threat.relative_pos + threat.relative_vel * threat.time
    };

    direction.normalize_or_zero() * agent.max_acceleration * params.collision_avoidance_multiplier
}
