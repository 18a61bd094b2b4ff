//! Steering layer: behaviors, paths and the flow field, plus the ECS driver
//! that runs them.
//!
//! This module is organized into:
//! - **kinematics**: per-agent motion state and the single integration step
//! - **behaviors**: the steering behavior library (pure functions)
//! - **line_path**: polyline paths and parametric queries
//! - **flow_field**: grid of precomputed obstacle bias vectors
//! - **query / obstacles / spatial_hash**: collaborator traits and the
//!   reference implementations the driver uses
//! - **plan**: data-driven per-agent behavior lists
//! - **config / params**: startup config and hot-reloadable tunables
//! - **components / systems**: the driver

use bevy::prelude::*;

pub mod behaviors;
pub mod components;
pub mod config;
pub mod flow_field;
pub mod kinematics;
pub mod line_path;
pub mod math;
pub mod obstacles;
pub mod params;
pub mod plan;
pub mod query;
pub mod spatial_hash;
pub mod systems;

pub use components::*;
pub use config::{InitialConfig, SteeringProfile, SteeringProfiles, SteeringProfilesPlugin};
pub use kinematics::{HeadingSmoother, Kinematics};
pub use line_path::LinePath;
pub use params::SteeringParams;
pub use plan::{Behavior, SteeringPlan, WeightedBehavior};

use flow_field::FlowField;
use obstacles::CircleWorld;
use spatial_hash::SpatialHash;

// System sets for organizing execution order
#[derive(SystemSet, Debug, Hash, PartialEq, Eq, Clone)]
pub enum SteerSet {
    Prepare,     // Tick counter, collaborator rebuilds, agent snapshot
    Steering,    // Evaluate plans and steer
    Integration, // Apply velocity to position
}

/// Runs every agent's [`SteeringPlan`] on the fixed tick and regenerates the
/// flow field on its own wall-clock timer.
pub struct SteeringPlugin;

impl Plugin for SteeringPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(Time::<Fixed>::from_hz(30.0)); // Overridden by InitialConfig

        app.init_resource::<SteerTick>();
        app.init_resource::<SteeringRng>();
        app.init_resource::<FlowFieldTimer>();
        app.init_resource::<AgentSnapshot>();
        app.init_resource::<FlowField>();
        app.init_resource::<CircleWorld>();
        app.init_resource::<SpatialHash>();

        app.add_message::<PathCompleted>();

        app.configure_sets(
            FixedUpdate,
            (SteerSet::Prepare, SteerSet::Steering, SteerSet::Integration).chain(),
        );

        app.add_systems(
            Startup,
            (config::load_initial_config_system, systems::apply_initial_config).chain(),
        );

        app.add_systems(
            FixedUpdate,
            (
                (
                    systems::increment_steer_tick,
                    systems::init_new_agents,
                    systems::rebuild_obstacle_world,
                    systems::rebuild_spatial_hash,
                    systems::snapshot_agents,
                )
                    .chain()
                    .in_set(SteerSet::Prepare),
                (systems::evaluate_plans, systems::clear_stale_targets)
                    .chain()
                    .in_set(SteerSet::Steering),
                (systems::integrate_positions, systems::sync_transforms)
                    .chain()
                    .in_set(SteerSet::Integration),
            ),
        );

        app.add_systems(Update, systems::regenerate_flow_field);
    }
}
