use bevy::math::Vec2;

use crate::steering::kinematics::Kinematics;
use crate::steering::params::SteeringParams;

/// Full acceleration straight at `target`.
///
/// Returns zero when the agent already sits on the target.
pub fn seek(agent: &Kinematics, target: Vec2) -> Vec2 {
    seek_with(agent, target, agent.max_acceleration)
}

/// [`seek`] with an explicit acceleration magnitude.
pub fn seek_with(agent: &Kinematics, target: Vec2, max_acceleration: f32) -> Vec2 {
    (target - agent.position).normalize_or_zero() * max_acceleration
}

/// Decelerate into `target`.
///
/// Inside `arrive_target_radius` the agent is hard-stopped: velocity is set
/// to zero and the result is zero. Inside `arrive_slow_radius` the desired
/// speed ramps down linearly with distance.
pub fn arrive(agent: &mut Kinematics, params: &SteeringParams, target: Vec2) -> Vec2 {
    let to_target = target - agent.position;
    let dist = to_target.length();

    if dist < params.arrive_target_radius {
        agent.velocity = Vec2::ZERO;
        return Vec2::ZERO;
    }

    let target_speed = if dist > params.arrive_slow_radius || params.arrive_slow_radius <= 0.0 {
        agent.max_velocity
    } else {
        agent.max_velocity * dist / params.arrive_slow_radius
    };

    let desired = to_target.normalize_or_zero() * target_speed;
    let time = params.arrive_time_to_target.max(f32::EPSILON);
    ((desired - agent.velocity) / time).clamp_length_max(agent.max_acceleration)
}

/// Run from `target`.
///
/// Within `flee_panic_dist` the agent flees at full acceleration. Beyond it
/// the agent is safe and either brakes over `flee_time_to_target` or, with
/// deceleration disabled, stops dead.
pub fn flee(agent: &mut Kinematics, params: &SteeringParams, target: Vec2) -> Vec2 {
    let away = agent.position - target;

    if away.length() > params.flee_panic_dist {
        if params.flee_decelerate_on_stop && agent.velocity.length() > 0.001 {
            let time = params.flee_time_to_target.max(f32::EPSILON);
            return (-agent.velocity / time).clamp_length_max(agent.max_acceleration);
        }
        agent.velocity = Vec2::ZERO;
        return Vec2::ZERO;
    }

    away.normalize_or_zero() * agent.max_acceleration
}
