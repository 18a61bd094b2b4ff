use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Behavior tunables for one agent class.
///
/// Loaded per profile from `agents.profiles.ron` (see
/// [`SteeringProfiles`](super::config::SteeringProfiles)); every field has a
/// default so profile files only need to list what they change. Distances are
/// world units, times seconds, angles degrees.
#[derive(Component, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SteeringParams {
    // Arrive
    pub arrive_target_radius: f32,
    pub arrive_slow_radius: f32,
    pub arrive_time_to_target: f32,

    // Pursue / Evade / Offset pursuit
    pub max_prediction_time: f32,

    // Flee
    pub flee_panic_dist: f32,
    pub flee_decelerate_on_stop: bool,
    pub flee_time_to_target: f32,

    // Hide
    pub hide_distance_from_boundary: f32,
    pub hide_search_radius: f32,

    // Wander1 (orientation based)
    pub wander_offset: f32,
    pub wander_radius: f32,
    pub wander_rate: f32,

    // Wander2 (position based)
    pub wander2_radius: f32,
    pub wander2_distance: f32,
    pub wander2_jitter: f32,

    // Obstacle avoidance
    pub main_whisker_len: f32,
    pub side_whisker_len: f32,
    pub side_whisker_angle: f32,
    pub obstacle_avoid_distance: f32,
    pub obstacle_avoidance_multiplier: f32,
    pub obstacle_layer_mask: u32,

    // Collision avoidance
    pub distance_between: f32,
    pub collision_avoidance_multiplier: f32,

    // Separation
    pub max_sep_dist: f32,
    pub sep_max_acceleration: f32,

    // Cohesion / Velocity match
    pub facing_cosine: f32,
    pub velocity_match_time_to_target: f32,

    // Path following
    pub path_offset: f32,
    pub stop_radius: f32,
}

impl Default for SteeringParams {
    fn default() -> Self {
        Self {
            arrive_target_radius: 0.01,
            arrive_slow_radius: 1.0,
            arrive_time_to_target: 0.1,
            max_prediction_time: 1.0,
            flee_panic_dist: 3.5,
            flee_decelerate_on_stop: true,
            flee_time_to_target: 0.1,
            hide_distance_from_boundary: 0.6,
            hide_search_radius: 10.0,
            wander_offset: 1.5,
            wander_radius: 4.0,
            wander_rate: 0.4,
            wander2_radius: 1.2,
            wander2_distance: 2.0,
            wander2_jitter: 40.0,
            main_whisker_len: 1.25,
            side_whisker_len: 0.701,
            side_whisker_angle: 45.0,
            obstacle_avoid_distance: 0.5,
            obstacle_avoidance_multiplier: 1.0,
            obstacle_layer_mask: super::query::layers::STATIC,
            distance_between: 0.0,
            collision_avoidance_multiplier: 1.0,
            max_sep_dist: 1.0,
            sep_max_acceleration: 25.0,
            facing_cosine: 120.0,
            velocity_match_time_to_target: 0.1,
            path_offset: 0.71,
            stop_radius: 0.005,
        }
    }
}

impl SteeringParams {
    /// `facing_cosine` converted from degrees to the dot-product threshold.
    pub fn facing_cosine_value(&self) -> f32 {
        self.facing_cosine.to_radians().cos()
    }
}
