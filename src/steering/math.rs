//! Small angle and vector helpers shared by the behaviors.
//!
//! Agents treat local "up" as forward: a rotation of `0` faces `+y`. The
//! heading (the world-space angle of the forward vector, measured from `+x`)
//! is therefore always `rotation + 90°`.

use bevy::math::Vec2;
use rand::Rng;
use std::f32::consts::{FRAC_PI_2, PI, TAU};

/// Below this squared length a direction is treated as "no direction".
pub const DIRECTION_DEAD_ZONE_SQ: f32 = 1e-3;

/// Generic tolerance for comparing lengths and parameters.
pub const EPSILON: f32 = 1e-5;

/// Wrap an angle into `(-PI, PI]`.
pub fn wrap_angle(angle: f32) -> f32 {
    let wrapped = (angle + PI).rem_euclid(TAU) - PI;
    if wrapped <= -PI {
        wrapped + TAU
    } else {
        wrapped
    }
}

/// Interpolate between two angles along the shortest arc.
///
/// `t` is clamped to `[0, 1]`, so a large `dt * turn_speed` snaps to `to`.
pub fn lerp_angle(from: f32, to: f32, t: f32) -> f32 {
    let delta = wrap_angle(to - from);
    from + delta * t.clamp(0.0, 1.0)
}

/// Unit vector for a heading angle (radians from `+x`).
pub fn orientation_to_vector(orientation: f32) -> Vec2 {
    Vec2::from_angle(orientation)
}

/// Rotation that makes the agent's local up axis point along `dir`.
pub fn rotation_for_direction(dir: Vec2) -> f32 {
    dir.y.atan2(dir.x) - FRAC_PI_2
}

/// Heading angle for a rotation.
pub fn heading_for_rotation(rotation: f32) -> f32 {
    rotation + FRAC_PI_2
}

/// Random number in `(-1, 1)`, biased toward zero.
pub fn random_binomial<R: Rng>(rng: &mut R) -> f32 {
    rng.random::<f32>() - rng.random::<f32>()
}

/// Unsigned angle between two vectors in degrees. Zero if either is zero.
pub fn angle_between_degrees(a: Vec2, b: Vec2) -> f32 {
    if a.length_squared() == 0.0 || b.length_squared() == 0.0 {
        return 0.0;
    }
    a.angle_to(b).abs().to_degrees()
}

/// Whether `forward` points within `cosine_threshold` of the direction to `target`.
///
/// The threshold is a cosine (`dot >= threshold`). A target sitting exactly on
/// `position` counts as not faced.
pub fn is_facing(position: Vec2, forward: Vec2, target: Vec2, cosine_threshold: f32) -> bool {
    let to_target = (target - position).normalize_or_zero();
    if to_target == Vec2::ZERO {
        return false;
    }
    forward.normalize_or_zero().dot(to_target) >= cosine_threshold
}

/// Closest point to `p` on segment `a..b`, as the clamped projection factor.
pub fn segment_projection(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq == 0.0 {
        return 0.0;
    }
    ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0)
}

/// Distance from `p` to segment `a..b`.
pub fn distance_to_segment(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    let t = segment_projection(p, a, b);
    p.distance(a + (b - a) * t)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lerp_angle_takes_shortest_arc() {
        let from = 170f32.to_radians();
        let to = -170f32.to_radians();
        let halfway = lerp_angle(from, to, 0.5);
        assert!((wrap_angle(halfway) - PI).abs() < 1e-4 || (wrap_angle(halfway) + PI).abs() < 1e-4);
    }

    #[test]
    fn test_lerp_angle_clamps_t() {
        let to = 1.0;
        assert!((lerp_angle(0.0, to, 5.0) - to).abs() < 1e-6);
        assert_eq!(lerp_angle(0.0, to, -1.0), 0.0);
    }

    #[test]
    fn test_rotation_heading_convention() {
        // Facing +y means no rotation.
        assert!(rotation_for_direction(Vec2::Y).abs() < 1e-6);
        let heading = heading_for_rotation(rotation_for_direction(Vec2::X));
        assert!((orientation_to_vector(heading) - Vec2::X).length() < 1e-5);
    }

    #[test]
    fn test_is_facing() {
        assert!(is_facing(Vec2::ZERO, Vec2::X, Vec2::new(3.0, 1.0), 0.5));
        assert!(!is_facing(Vec2::ZERO, Vec2::X, Vec2::new(-3.0, 0.0), 0.5));
        assert!(!is_facing(Vec2::ZERO, Vec2::X, Vec2::ZERO, -1.0));
    }

    #[test]
    fn test_distance_to_degenerate_segment() {
        let d = distance_to_segment(Vec2::new(3.0, 4.0), Vec2::ZERO, Vec2::ZERO);
        assert!((d - 5.0).abs() < 1e-6);
    }
}
