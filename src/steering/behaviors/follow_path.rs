use bevy::math::Vec2;
use serde::{Deserialize, Serialize};

use super::basics::arrive;
use crate::steering::kinematics::Kinematics;
use crate::steering::line_path::LinePath;
use crate::steering::params::SteeringParams;

/// Traversal direction along a path. Reversing never reorders the nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PathDirection {
    #[default]
    Forward,
    Reverse,
}

impl PathDirection {
    pub fn sign(self) -> f32 {
        match self {
            PathDirection::Forward => 1.0,
            PathDirection::Reverse => -1.0,
        }
    }
}

/// Output of [`follow_path`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathSteering {
    pub acceleration: Vec2,
    /// Point the agent is currently arriving at.
    pub target: Vec2,
    /// The agent reached the end of an open path and was stopped.
    pub complete: bool,
}

/// Terminal node and final segment index for a direction of travel.
fn terminal(path: &LinePath, direction: PathDirection) -> (Vec2, usize) {
    match direction {
        PathDirection::Forward => (path.last(), path.segment_count().saturating_sub(1)),
        PathDirection::Reverse => (path.first(), 0),
    }
}

/// Whether the agent has finished an open path: it is on the final segment
/// and within `stop_radius` of the terminal node.
pub fn is_at_end_of_path(
    agent: &Kinematics,
    params: &SteeringParams,
    path: &LinePath,
    direction: PathDirection,
) -> bool {
    let (final_node, final_segment) = terminal(path, direction);
    if path.len() == 1 {
        return agent.position.distance(final_node) < params.stop_radius;
    }
    path.closest_segment(agent.position) == final_segment
        && agent.position.distance(final_node) < params.stop_radius
}

/// Follow `path`, arriving at a point a fixed `path_offset` ahead of the
/// agent's projection onto it.
///
/// The look-ahead is not scaled by speed. A single-node path is arrived at
/// directly. An open path that is finished hard-stops the agent and reports
/// `complete`.
pub fn follow_path(
    agent: &mut Kinematics,
    params: &SteeringParams,
    path: &LinePath,
    looping: bool,
    direction: PathDirection,
) -> PathSteering {
    if path.len() == 1 {
        let target = path.first();
        let complete = !looping && agent.position.distance(target) < params.stop_radius;
        let acceleration = arrive(agent, params, target);
        return PathSteering {
            acceleration,
            target,
            complete,
        };
    }

    if !looping && is_at_end_of_path(agent, params, path, direction) {
        agent.velocity = Vec2::ZERO;
        return PathSteering {
            acceleration: Vec2::ZERO,
            target: terminal(path, direction).0,
            complete: true,
        };
    }

    let param = path.param(agent.position) + direction.sign() * params.path_offset;
    let target = path.position(param, looping);
    PathSteering {
        acceleration: arrive(agent, params, target),
        target,
        complete: false,
    }
}
