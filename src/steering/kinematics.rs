//! Per-agent kinematic state and the single integration step.

use bevy::prelude::*;
use std::collections::VecDeque;

use super::math::{
    heading_for_rotation, lerp_angle, orientation_to_vector, rotation_for_direction,
    DIRECTION_DEAD_ZONE_SQ,
};

/// Minimal kinematic state every steering agent carries.
///
/// Behaviors read this and return an acceleration; [`Kinematics::steer`] is
/// the only place velocity changes, apart from the documented hard stops in
/// arrive, flee and path following.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Kinematics {
    pub position: Vec2,
    pub velocity: Vec2,
    /// Rotation in radians. `0` faces `+y` (local up is forward).
    pub rotation: f32,
    radius: f32,
    pub max_velocity: f32,
    pub max_acceleration: f32,
    /// Fraction of the remaining turn covered per second.
    pub turn_speed: f32,
}

impl Default for Kinematics {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            rotation: 0.0,
            radius: 0.5,
            max_velocity: 3.5,
            max_acceleration: 10.0,
            turn_speed: 20.0,
        }
    }
}

impl Kinematics {
    pub fn new(position: Vec2, radius: f32, max_velocity: f32, max_acceleration: f32) -> Self {
        Self {
            position,
            radius,
            max_velocity,
            max_acceleration,
            ..Default::default()
        }
    }

    pub fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_rotation(mut self, rotation: f32) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_turn_speed(mut self, turn_speed: f32) -> Self {
        self.turn_speed = turn_speed;
        self
    }

    /// Collision extent. Fixed for the lifetime of the agent.
    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn speed(&self) -> f32 {
        self.velocity.length()
    }

    /// World-space angle of the forward vector, from `+x`.
    pub fn heading(&self) -> f32 {
        heading_for_rotation(self.rotation)
    }

    /// Unit vector along the agent's local up axis.
    pub fn forward(&self) -> Vec2 {
        orientation_to_vector(self.heading())
    }

    /// Rotate a vector from the agent's local frame (x right, y forward) to world space.
    pub fn local_to_world(&self, local: Vec2) -> Vec2 {
        Vec2::from_angle(self.rotation).rotate(local)
    }

    /// Apply an acceleration for one tick and hard-clamp the speed.
    ///
    /// After this call `|velocity| <= max_velocity` always holds.
    pub fn steer(&mut self, acceleration: Vec2, dt: f32) {
        self.velocity += acceleration * dt;
        let max_sq = self.max_velocity * self.max_velocity;
        if self.velocity.length_squared() > max_sq {
            self.velocity = self.velocity.normalize_or_zero() * self.max_velocity.max(0.0);
        }
    }

    /// Advance position by the current velocity.
    pub fn integrate_position(&mut self, dt: f32) {
        self.position += self.velocity * dt;
    }

    /// Turn toward `direction`, covering `dt * turn_speed` of the remaining arc.
    ///
    /// Directions shorter than the dead zone are ignored so a stopped agent
    /// keeps its last facing.
    pub fn look_at_direction(&mut self, direction: Vec2, dt: f32) {
        let dir = direction.normalize_or_zero();
        if dir.length_squared() > DIRECTION_DEAD_ZONE_SQ {
            let target = rotation_for_direction(dir);
            self.rotation = lerp_angle(self.rotation, target, dt * self.turn_speed);
        }
    }

    /// Face along the current velocity, smoothed over recent samples.
    pub fn face_heading(&mut self, smoother: &mut HeadingSmoother, dt: f32) {
        let dir = smoother.push(self.velocity);
        self.look_at_direction(dir, dt);
    }

    /// Face toward `target`, smoothed over recent samples.
    pub fn face_target(&mut self, target: Vec2, smoother: &mut HeadingSmoother, dt: f32) {
        let dir = smoother.push(target - self.position);
        self.look_at_direction(dir, dt);
    }
}

/// Ring buffer of recent facing directions.
///
/// Averaging the last few samples hides single-tick noise in velocity or
/// target position that would otherwise make the agent twitch.
#[derive(Component, Debug, Clone)]
pub struct HeadingSmoother {
    samples: VecDeque<Vec2>,
    capacity: usize,
}

impl Default for HeadingSmoother {
    fn default() -> Self {
        Self::new(5)
    }
}

impl HeadingSmoother {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Record a sample and return the average of the buffered samples.
    pub fn push(&mut self, sample: Vec2) -> Vec2 {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
        self.average()
    }

    pub fn average(&self) -> Vec2 {
        if self.samples.is_empty() {
            return Vec2::ZERO;
        }
        self.samples.iter().copied().sum::<Vec2>() / self.samples.len() as f32
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}
