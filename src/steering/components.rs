//! Components, resources and messages used by the steering driver.

use bevy::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use super::behaviors::PathDirection;
use super::kinematics::Kinematics;
use super::line_path::LinePath;
use super::query::Faction;

// ============================================================================
// Components
// ============================================================================

/// Path an agent follows when its plan contains `Behavior::FollowPath`.
#[derive(Component, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathFollower {
    pub path: LinePath,
    pub looping: bool,
    pub direction: PathDirection,
    /// Set once the end of an open path has been reached and reported.
    #[serde(skip)]
    pub finished: bool,
}

impl PathFollower {
    pub fn new(path: LinePath) -> Self {
        Self {
            path,
            looping: false,
            direction: PathDirection::Forward,
            finished: false,
        }
    }

    pub fn looping(mut self) -> Self {
        self.looping = true;
        self
    }

    pub fn reversed(mut self) -> Self {
        self.direction = PathDirection::Reverse;
        self
    }

    /// Swap in a new path and start over.
    pub fn set_path(&mut self, path: LinePath) {
        self.path = path;
        self.finished = false;
    }
}

/// How an agent turns after its velocity is updated.
#[derive(Component, Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum HeadingMode {
    /// Face along the raw velocity.
    #[default]
    FaceVelocity,
    /// Face along velocity averaged by the agent's `HeadingSmoother`.
    SmoothedVelocity,
    /// Keep facing an entity, smoothed.
    FaceEntity(Entity),
    /// Keep facing a fixed point, smoothed.
    FacePoint(Vec2),
    /// Never turn.
    Locked,
}

/// The flow field is regenerated around the first entity carrying this.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct FlowFieldAnchor;

// ============================================================================
// Resources
// ============================================================================

/// Steering tick counter, incremented at the start of every fixed step.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SteerTick(pub u64);

impl SteerTick {
    pub fn increment(&mut self) {
        self.0 = self.0.wrapping_add(1);
    }
}

/// Seeded generator shared by the wander behaviors.
#[derive(Resource, Debug, Clone)]
pub struct SteeringRng(pub StdRng);

impl Default for SteeringRng {
    fn default() -> Self {
        Self::seeded(0)
    }
}

impl SteeringRng {
    pub fn seeded(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }
}

/// Wall-clock cadence of flow field regeneration.
#[derive(Resource, Debug, Clone)]
pub struct FlowFieldTimer(pub Timer);

impl Default for FlowFieldTimer {
    fn default() -> Self {
        Self::from_seconds(1.0)
    }
}

impl FlowFieldTimer {
    pub fn from_seconds(secs: f32) -> Self {
        Self(Timer::from_seconds(secs.max(f32::EPSILON), TimerMode::Repeating))
    }
}

/// Read-only copy of every agent taken at the start of the tick.
///
/// Cross-agent reads (targets, neighbors) go through this, so the order
/// agents are stepped in never changes what they see.
#[derive(Resource, Debug, Default, Clone)]
pub struct AgentSnapshot {
    pub kinematics: FxHashMap<Entity, Kinematics>,
    pub factions: FxHashMap<Entity, Faction>,
}

impl AgentSnapshot {
    pub fn clear(&mut self) {
        self.kinematics.clear();
        self.factions.clear();
    }

    pub fn get(&self, entity: Entity) -> Option<&Kinematics> {
        self.kinematics.get(&entity)
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.kinematics.contains_key(&entity)
    }

    pub fn len(&self) -> usize {
        self.kinematics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinematics.is_empty()
    }
}

// ============================================================================
// Messages
// ============================================================================

/// An agent reached the end of its open path. The follower is left in place.
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathCompleted {
    pub entity: Entity,
}
