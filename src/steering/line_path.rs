//! Polyline routes with cumulative arc length.
//!
//! A path parameter is an arc-length coordinate: `0` at the first node,
//! [`LinePath::max_dist`] at the last. Followers project themselves onto the
//! path with [`LinePath::param`], push the parameter ahead, and turn it back
//! into a point with [`LinePath::position`].

use bevy::math::Vec2;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::math::{distance_to_segment, segment_projection};

/// Ordered polyline with cached cumulative distances.
///
/// `distances[i]` is the arc length from the first node to node `i`; the two
/// vectors always have the same length. Every mutation goes through a method
/// that recomputes the distances, so they can never go stale.
///
/// Serializes as the bare node list; deserializing goes through
/// [`LinePath::new`], so an empty list is rejected and distances are always
/// recomputed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec2>", into = "Vec<Vec2>")]
pub struct LinePath {
    nodes: Vec<Vec2>,
    distances: Vec<f32>,
}

/// A path needs at least one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmptyPathError;

impl fmt::Display for EmptyPathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "a path needs at least one node")
    }
}

impl std::error::Error for EmptyPathError {}

impl TryFrom<Vec<Vec2>> for LinePath {
    type Error = EmptyPathError;

    fn try_from(nodes: Vec<Vec2>) -> Result<Self, Self::Error> {
        LinePath::new(nodes).ok_or(EmptyPathError)
    }
}

impl From<LinePath> for Vec<Vec2> {
    fn from(path: LinePath) -> Self {
        path.nodes
    }
}

impl LinePath {
    /// Build a path. Returns `None` for an empty node list.
    ///
    /// A single node is a valid "stand at this point" path.
    pub fn new(nodes: Vec<Vec2>) -> Option<Self> {
        if nodes.is_empty() {
            return None;
        }
        let mut path = Self {
            nodes,
            distances: Vec::new(),
        };
        path.calc_distances();
        Some(path)
    }

    pub fn point(node: Vec2) -> Self {
        Self {
            nodes: vec![node],
            distances: vec![0.0],
        }
    }

    fn calc_distances(&mut self) {
        self.distances.clear();
        self.distances.reserve(self.nodes.len());
        let mut total = 0.0;
        self.distances.push(total);
        for pair in self.nodes.windows(2) {
            total += pair[0].distance(pair[1]);
            self.distances.push(total);
        }
    }

    pub fn nodes(&self) -> &[Vec2] {
        &self.nodes
    }

    pub fn distances(&self) -> &[f32] {
        &self.distances
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Total arc length.
    pub fn max_dist(&self) -> f32 {
        self.distances.last().copied().unwrap_or(0.0)
    }

    pub fn first(&self) -> Vec2 {
        self.nodes[0]
    }

    pub fn last(&self) -> Vec2 {
        self.nodes[self.nodes.len() - 1]
    }

    /// Number of segments. Zero for a single-node path.
    pub fn segment_count(&self) -> usize {
        self.nodes.len() - 1
    }

    /// Move one node. Out of range indices are ignored.
    pub fn set_node(&mut self, index: usize, position: Vec2) {
        if let Some(node) = self.nodes.get_mut(index) {
            *node = position;
            self.calc_distances();
        }
    }

    pub fn push_node(&mut self, position: Vec2) {
        self.nodes.push(position);
        self.calc_distances();
    }

    /// Replace every node. An empty list leaves the path untouched and returns false.
    pub fn rebuild(&mut self, nodes: Vec<Vec2>) -> bool {
        if nodes.is_empty() {
            return false;
        }
        self.nodes = nodes;
        self.calc_distances();
        true
    }

    /// Index of the segment nearest to `position`.
    ///
    /// Linear scan; on ties the earliest segment wins. Single-node paths
    /// report segment 0.
    pub fn closest_segment(&self, position: Vec2) -> usize {
        if self.nodes.len() < 2 {
            return 0;
        }
        let mut closest = 0;
        let mut closest_dist = distance_to_segment(position, self.nodes[0], self.nodes[1]);
        for i in 1..self.segment_count() {
            let dist = distance_to_segment(position, self.nodes[i], self.nodes[i + 1]);
            if dist < closest_dist {
                closest_dist = dist;
                closest = i;
            }
        }
        closest
    }

    /// Arc-length parameter of the point on the path closest to `position`.
    pub fn param(&self, position: Vec2) -> f32 {
        if self.nodes.len() < 2 {
            return 0.0;
        }
        let i = self.closest_segment(position);
        let (a, b) = (self.nodes[i], self.nodes[i + 1]);
        self.distances[i] + segment_projection(position, a, b) * a.distance(b)
    }

    /// Point at arc length `param`.
    ///
    /// Looping paths wrap the parameter into `[0, max_dist)`; open paths clamp
    /// it to `[0, max_dist]`.
    pub fn position(&self, param: f32, looping: bool) -> Vec2 {
        let max_dist = self.max_dist();
        if self.nodes.len() < 2 || max_dist <= 0.0 {
            return self.nodes[0];
        }

        let param = if looping {
            param.rem_euclid(max_dist)
        } else {
            param.clamp(0.0, max_dist)
        };

        // Last segment whose start is at or before `param`.
        let mut i = 0;
        while i + 1 < self.segment_count() && self.distances[i + 1] <= param {
            i += 1;
        }

        let seg_len = self.distances[i + 1] - self.distances[i];
        if seg_len <= 0.0 {
            return self.nodes[i];
        }
        let t = ((param - self.distances[i]) / seg_len).clamp(0.0, 1.0);
        self.nodes[i].lerp(self.nodes[i + 1], t)
    }
}

#[cfg(test)]
mod tests;
