use bevy::prelude::*;
use harrier_macros::profile;

use crate::profile_log;

use super::behaviors::WanderState;
use super::components::{
    AgentSnapshot, FlowFieldAnchor, FlowFieldTimer, HeadingMode, PathCompleted, PathFollower, SteerTick, SteeringRng,
};
use super::config::InitialConfig;
use super::flow_field::FlowField;
use super::kinematics::{HeadingSmoother, Kinematics};
use super::obstacles::{CircleWorld, Obstacle};
use super::params::SteeringParams;
use super::plan::{evaluate_plan, PlanScratch, SteeringAgent, SteeringContext, SteeringPlan};
use super::query::{Faction, FactionFriendliness};
use super::spatial_hash::SpatialHash;

// ============================================================================
// Startup
// ============================================================================

/// Size the shared resources from [`InitialConfig`].
pub fn apply_initial_config(
    config: Option<Res<InitialConfig>>,
    mut fixed_time: ResMut<Time<Fixed>>,
    mut flow_field: ResMut<FlowField>,
    mut spatial_hash: ResMut<SpatialHash>,
    mut rng: ResMut<SteeringRng>,
    mut timer: ResMut<FlowFieldTimer>,
) {
    let config = match &config {
        Some(cfg) => cfg.as_ref(),
        None => {
            warn!("[CONFIG] InitialConfig not found, using defaults");
            &InitialConfig::default()
        }
    };

    if config.tick_rate > 0.0 {
        fixed_time.set_timestep_seconds(1.0 / config.tick_rate);
    } else {
        warn!("[CONFIG] Ignoring non-positive tick_rate {}", config.tick_rate);
    }

    *flow_field = FlowField::new(
        config.flow_width,
        config.flow_height,
        config.flow_cell_size,
        config.flow_detection_radius,
    );
    spatial_hash.resize(Vec2::splat(config.world_size), config.spatial_cell_size);
    *rng = SteeringRng::seeded(config.rng_seed);
    *timer = FlowFieldTimer::from_seconds(config.flow_regen_interval_secs);

    info!(
        "[CONFIG] Steering at {} Hz, flow field {}x{} (cell {}), regen every {}s, seed {}",
        config.tick_rate,
        config.flow_width,
        config.flow_height,
        config.flow_cell_size,
        config.flow_regen_interval_secs,
        config.rng_seed
    );
}

// ============================================================================
// Prepare
// ============================================================================

pub fn increment_steer_tick(mut tick: ResMut<SteerTick>) {
    tick.increment();
}

/// Give newly planned agents the per-agent state their plan needs.
pub fn init_new_agents(
    mut commands: Commands,
    config: Option<Res<InitialConfig>>,
    mut rng: ResMut<SteeringRng>,
    query: Query<
        (Entity, &SteeringPlan, Has<SteeringParams>, Has<WanderState>, Has<HeadingSmoother>),
        Added<SteeringPlan>,
    >,
) {
    let samples = config.map_or(5, |c| c.heading_samples);

    for (entity, plan, has_params, has_wander, has_smoother) in query.iter() {
        let mut agent = commands.entity(entity);
        if !has_params {
            agent.insert(SteeringParams::default());
        }
        if plan.needs_wander_state() && !has_wander {
            // Profile params are not applied yet; the circle radius settles
            // after the first wander2 step either way.
            agent.insert(WanderState::new(&mut rng.0, &SteeringParams::default()));
        }
        if !has_smoother {
            agent.insert(HeadingSmoother::new(samples));
        }
    }
}

/// Rebuild the obstacle world from `Obstacle` components.
pub fn rebuild_obstacle_world(mut world: ResMut<CircleWorld>, obstacles: Query<(Entity, &Transform, &Obstacle)>) {
    world.clear();
    for (entity, transform, obstacle) in obstacles.iter() {
        world.insert(Some(entity), transform.translation.truncate(), *obstacle);
    }
}

pub fn rebuild_spatial_hash(mut hash: ResMut<SpatialHash>, agents: Query<(Entity, &Kinematics)>) {
    hash.clear();
    for (entity, kinematics) in agents.iter() {
        hash.insert(entity, kinematics.position, kinematics.radius());
    }
}

/// Copy every agent's kinematics (and faction) for this tick's cross-agent reads.
pub fn snapshot_agents(mut snapshot: ResMut<AgentSnapshot>, agents: Query<(Entity, &Kinematics, Option<&Faction>)>) {
    snapshot.clear();
    for (entity, kinematics, faction) in agents.iter() {
        snapshot.kinematics.insert(entity, *kinematics);
        if let Some(faction) = faction {
            snapshot.factions.insert(entity, *faction);
        }
    }
}

// ============================================================================
// Steering
// ============================================================================

/// Evaluate every plan, steer once with the summed acceleration, then turn.
#[profile(2)]
pub fn evaluate_plans(
    fixed_time: Res<Time<Fixed>>,
    #[allow(unused_variables)] tick: Res<SteerTick>,
    snapshot: Res<AgentSnapshot>,
    obstacles: Res<CircleWorld>,
    spatial_hash: Res<SpatialHash>,
    flow_field: Option<Res<FlowField>>,
    config: Option<Res<InitialConfig>>,
    mut rng: ResMut<SteeringRng>,
    mut scratch: Local<PlanScratch>,
    mut completed: MessageWriter<PathCompleted>,
    mut agents: Query<(
        Entity,
        &mut Kinematics,
        &SteeringPlan,
        Option<&SteeringParams>,
        Option<&mut WanderState>,
        Option<&mut PathFollower>,
        Option<&HeadingMode>,
        Option<&mut HeadingSmoother>,
    )>,
) {
    let dt = fixed_time.timestep().as_secs_f32();
    let neighbor_radius = config.map_or(5.0, |c| c.neighbor_query_radius);
    let default_params = SteeringParams::default();
    let friendliness = FactionFriendliness::new(&snapshot.factions);

    let ctx = SteeringContext {
        snapshot: &snapshot,
        obstacles: obstacles.as_ref(),
        candidates: spatial_hash.as_ref(),
        friendliness: &friendliness,
        flow_field: flow_field.as_deref(),
        neighbor_radius,
        dt,
    };

    for (entity, mut kinematics, plan, params, mut wander, mut follower, heading, mut smoother) in agents.iter_mut() {
        if plan.is_empty() {
            continue;
        }
        let params = params.unwrap_or(&default_params);

        let output = evaluate_plan(
            plan,
            SteeringAgent {
                entity,
                kinematics: &mut kinematics,
                params,
                wander: wander.as_deref_mut(),
                path: follower.as_deref(),
            },
            &ctx,
            &mut rng.0,
            &mut scratch,
        );

        for missing in &output.missing_targets {
            debug!("[STEERING] {:?} references missing target {:?}", entity, missing);
        }

        kinematics.steer(output.acceleration, dt);

        match heading.copied().unwrap_or_default() {
            HeadingMode::FaceVelocity => {
                let velocity = kinematics.velocity;
                kinematics.look_at_direction(velocity, dt);
            }
            HeadingMode::SmoothedVelocity => match smoother.as_deref_mut() {
                Some(smoother) => kinematics.face_heading(smoother, dt),
                None => {
                    let velocity = kinematics.velocity;
                    kinematics.look_at_direction(velocity, dt);
                }
            },
            HeadingMode::FaceEntity(target) => {
                if let (Some(target), Some(smoother)) = (snapshot.get(target), smoother.as_deref_mut()) {
                    kinematics.face_target(target.position, smoother, dt);
                }
            }
            HeadingMode::FacePoint(point) => {
                if let Some(smoother) = smoother.as_deref_mut() {
                    kinematics.face_target(point, smoother, dt);
                }
            }
            HeadingMode::Locked => {}
        }

        if let Some(follower) = follower.as_deref_mut() {
            if output.path_completed && !follower.finished {
                follower.finished = true;
                info!("[PATH] {:?} reached the end of its path", entity);
                completed.write(PathCompleted { entity });
            } else if !output.path_completed && follower.finished {
                follower.finished = false;
            }
        }
    }

    profile_log!(tick, "[STEERING] Tick {}: {} planned agents", tick.0, agents.iter().count());
}

/// Remove plan entries whose target entity is no longer an agent.
pub fn clear_stale_targets(snapshot: Res<AgentSnapshot>, mut plans: Query<(Entity, &mut SteeringPlan)>) {
    for (entity, mut plan) in plans.iter_mut() {
        let stale = plan.0.iter().any(|w| w.behavior.targets().iter().any(|t| !snapshot.contains(*t)));
        if !stale {
            continue;
        }
        let removed = plan.retain_targets(|t| snapshot.contains(t));
        debug!("[STEERING] Removed {} stale behavior(s) from {:?}", removed, entity);
    }
}

// ============================================================================
// Integration
// ============================================================================

pub fn integrate_positions(fixed_time: Res<Time<Fixed>>, mut agents: Query<&mut Kinematics>) {
    let dt = fixed_time.timestep().as_secs_f32();
    for mut kinematics in agents.iter_mut() {
        if kinematics.velocity.length_squared() > 0.0 {
            kinematics.integrate_position(dt);
        }
    }
}

/// Mirror kinematics onto `Transform` for anything that renders or
/// parents off the agent.
pub fn sync_transforms(mut agents: Query<(&Kinematics, &mut Transform), Changed<Kinematics>>) {
    for (kinematics, mut transform) in agents.iter_mut() {
        transform.translation.x = kinematics.position.x;
        transform.translation.y = kinematics.position.y;
        transform.rotation = Quat::from_rotation_z(kinematics.rotation);
    }
}

// ============================================================================
// Flow field
// ============================================================================

/// Regenerate the flow field on a wall-clock timer, independent of the
/// steering tick.
///
/// The grid is centered on the first [`FlowFieldAnchor`] if there is one,
/// otherwise on the configured origin.
#[profile(5)]
pub fn regenerate_flow_field(
    time: Res<Time<Real>>,
    mut timer: ResMut<FlowFieldTimer>,
    mut flow_field: ResMut<FlowField>,
    obstacles: Res<CircleWorld>,
    config: Option<Res<InitialConfig>>,
    anchors: Query<(Option<&Kinematics>, Option<&Transform>), With<FlowFieldAnchor>>,
) {
    if !timer.0.tick(time.delta()).just_finished() {
        return;
    }

    let fallback = config.map_or(Vec2::ZERO, |c| c.flow_origin);
    let origin = anchors
        .iter()
        .next()
        .and_then(|(kinematics, transform)| {
            kinematics
                .map(|k| k.position)
                .or_else(|| transform.map(|t| t.translation.truncate()))
        })
        .unwrap_or(fallback);

    flow_field.generate(origin, obstacles.as_ref());
    debug!(
        "[FLOW_FIELD] Generation {} around ({:.2}, {:.2}) from {} colliders",
        flow_field.generation(),
        origin.x,
        origin.y,
        obstacles.len()
    );
}
