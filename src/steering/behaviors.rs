//! Steering behavior library.
//!
//! Every behavior maps an agent's [`Kinematics`](super::kinematics::Kinematics)
//! (plus a target, a path, candidates or a query collaborator) to a desired
//! world-space acceleration. Callers sum several outputs and hand the total to
//! `Kinematics::steer` once per tick.
//!
//! Behaviors are pure apart from three documented hard stops: `arrive` inside
//! its target radius, `flee` once safe without deceleration, and
//! `follow_path` at the end of an open path all zero the agent's velocity
//! directly.
//!
//! This module is organized into:
//! - **basics**: seek, arrive, flee
//! - **pursuit**: pursue, evade, get-in-range, offset pursuit, interpose, hide
//! - **wander**: orientation based and position based wandering
//! - **avoidance**: whisker obstacle avoidance, predictive collision avoidance
//! - **group**: separation, cohesion, velocity match
//! - **follow_path**: path following over a [`LinePath`](super::line_path::LinePath)

pub mod avoidance;
pub mod basics;
pub mod follow_path;
pub mod group;
pub mod pursuit;
pub mod wander;


pub use avoidance::{collision_avoidance, obstacle_avoidance};
pub use basics::{arrive, flee, seek, seek_with};
pub use follow_path::{follow_path, is_at_end_of_path, PathDirection, PathSteering};
pub use group::{cohesion, separation, velocity_match};
pub use pursuit::{evade, get_in_range, hide, hiding_position, interpose, offset_pursuit, pursue};
pub use wander::{wander1, wander2, WanderState};
