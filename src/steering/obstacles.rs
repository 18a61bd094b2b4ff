use bevy::prelude::*;

use super::query::{layers, CastHit, ColliderShape, OverlapHit, SpatialQuery};

/// Static circular collider.
///
/// `Solid` obstacles are discs; `Boundary` obstacles are inside-out rings
/// that keep agents within `radius` of their center (arena walls).
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Obstacle {
    pub radius: f32,
    pub shape: ColliderShape,
    pub is_trigger: bool,
    pub layer: u32,
}

impl Obstacle {
    pub fn solid(radius: f32) -> Self {
        Self {
            radius,
            shape: ColliderShape::Solid,
            is_trigger: false,
            layer: layers::OBSTACLE,
        }
    }

    pub fn boundary(radius: f32) -> Self {
        Self {
            radius,
            shape: ColliderShape::Boundary,
            is_trigger: false,
            layer: layers::BOUNDARY,
        }
    }

    pub fn trigger(radius: f32) -> Self {
        Self {
            is_trigger: true,
            ..Self::solid(radius)
        }
    }
}

/// A collider placed in the world.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CircleCollider {
    pub entity: Option<Entity>,
    pub center: Vec2,
    pub obstacle: Obstacle,
}

/// Reference [`SpatialQuery`] over static circle colliders.
///
/// Rebuilt from [`Obstacle`] components at the start of every steering tick.
/// Queries are brute force; obstacle counts in an arcade level are small.
#[derive(Resource, Debug, Clone, Default)]
pub struct CircleWorld {
    colliders: Vec<CircleCollider>,
}

impl CircleWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.colliders.clear();
    }

    pub fn insert(&mut self, entity: Option<Entity>, center: Vec2, obstacle: Obstacle) {
        self.colliders.push(CircleCollider {
            entity,
            center,
            obstacle,
        });
    }

    pub fn len(&self) -> usize {
        self.colliders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colliders.is_empty()
    }

    pub fn colliders(&self) -> &[CircleCollider] {
        &self.colliders
    }
}

/// Distance along `dir` at which a circle of `radius` starting at `origin`
/// first touches the solid disc.
fn cast_solid(origin: Vec2, radius: f32, dir: Vec2, c: &CircleCollider) -> Option<(f32, Vec2)> {
    let combined = c.obstacle.radius + radius;
    let m = origin - c.center;
    let c_term = m.length_squared() - combined * combined;
    if c_term <= 0.0 {
        // Starting overlap.
        let normal = m.try_normalize().unwrap_or(-dir);
        return Some((0.0, normal));
    }
    let b = m.dot(dir);
    if b > 0.0 {
        return None;
    }
    let disc = b * b - c_term;
    if disc < 0.0 {
        return None;
    }
    let t = -b - disc.sqrt();
    let normal = (origin + dir * t - c.center).normalize_or_zero();
    Some((t.max(0.0), normal))
}

/// Distance along `dir` at which a circle inside a boundary ring touches it.
fn cast_boundary(origin: Vec2, radius: f32, dir: Vec2, c: &CircleCollider) -> Option<(f32, Vec2)> {
    let inner = c.obstacle.radius - radius;
    let m = origin - c.center;
    if inner <= 0.0 || m.length_squared() >= inner * inner {
        let normal = (-m).try_normalize().unwrap_or(-dir);
        return Some((0.0, normal));
    }
    let b = m.dot(dir);
    let c_term = m.length_squared() - inner * inner;
    let t = -b + (b * b - c_term).sqrt();
    let normal = -(origin + dir * t - c.center).normalize_or_zero();
    Some((t, normal))
}

impl SpatialQuery for CircleWorld {
    fn circle_cast(
        &self,
        origin: Vec2,
        radius: f32,
        direction: Vec2,
        max_distance: f32,
        mask: u32,
    ) -> Option<CastHit> {
        let dir = direction.try_normalize()?;
        let mut best: Option<CastHit> = None;

        for collider in &self.colliders {
            if collider.obstacle.layer & mask == 0 || collider.obstacle.is_trigger {
                continue;
            }
            let hit = match collider.obstacle.shape {
                ColliderShape::Solid => cast_solid(origin, radius, dir, collider),
                ColliderShape::Boundary => cast_boundary(origin, radius, dir, collider),
            };
            let Some((distance, normal)) = hit else {
                continue;
            };
            if distance > max_distance {
                continue;
            }
            if best.is_some_and(|b| b.distance <= distance) {
                continue;
            }
            // Contact point lies on the collider surface, opposite the normal
            // for solids and along it (outward from the ring) for boundaries.
            let point = match collider.obstacle.shape {
                ColliderShape::Solid => collider.center + normal * collider.obstacle.radius,
                ColliderShape::Boundary => collider.center - normal * collider.obstacle.radius,
            };
            best = Some(CastHit {
                point,
                normal,
                distance,
                entity: collider.entity,
            });
        }

        best
    }

    fn circle_overlap_all(&self, origin: Vec2, radius: f32, mask: u32, out: &mut Vec<OverlapHit>) {
        out.clear();
        for collider in &self.colliders {
            if collider.obstacle.layer & mask == 0 {
                continue;
            }
            let dist = origin.distance(collider.center);
            let overlaps = match collider.obstacle.shape {
                ColliderShape::Solid => dist < collider.obstacle.radius + radius,
                ColliderShape::Boundary => dist + radius > collider.obstacle.radius,
            };
            if overlaps {
                out.push(OverlapHit {
                    entity: collider.entity,
                    position: collider.center,
                    radius: collider.obstacle.radius,
                    is_trigger: collider.obstacle.is_trigger,
                    shape: collider.obstacle.shape,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world_with(center: Vec2, obstacle: Obstacle) -> CircleWorld {
        let mut world = CircleWorld::new();
        world.insert(None, center, obstacle);
        world
    }

    #[test]
    fn test_cast_hits_disc_ahead() {
        let world = world_with(Vec2::new(5.0, 0.0), Obstacle::solid(1.0));
        let hit = world
            .circle_cast(Vec2::ZERO, 0.5, Vec2::X, 10.0, layers::ALL)
            .expect("disc is straight ahead");
        assert!((hit.distance - 3.5).abs() < 1e-5);
        assert!((hit.normal - Vec2::NEG_X).length() < 1e-5);
        assert!((hit.point - Vec2::new(4.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_cast_respects_range_mask_and_direction() {
        let world = world_with(Vec2::new(5.0, 0.0), Obstacle::solid(1.0));
        assert!(world.circle_cast(Vec2::ZERO, 0.5, Vec2::X, 2.0, layers::ALL).is_none());
        assert!(world.circle_cast(Vec2::ZERO, 0.5, Vec2::X, 10.0, layers::AGENT).is_none());
        assert!(world.circle_cast(Vec2::ZERO, 0.5, Vec2::NEG_X, 10.0, layers::ALL).is_none());
        assert!(world.circle_cast(Vec2::ZERO, 0.5, Vec2::ZERO, 10.0, layers::ALL).is_none());
    }

    #[test]
    fn test_cast_hits_boundary_from_inside() {
        let world = world_with(Vec2::ZERO, Obstacle::boundary(10.0));
        let hit = world
            .circle_cast(Vec2::ZERO, 1.0, Vec2::Y, 20.0, layers::ALL)
            .expect("ring surrounds the caster");
        assert!((hit.distance - 9.0).abs() < 1e-5);
        assert!((hit.normal - Vec2::NEG_Y).length() < 1e-5);
        assert!((hit.point - Vec2::new(0.0, 10.0)).length() < 1e-5);
    }

    #[test]
    fn test_overlap_skips_nothing_but_reports_triggers() {
        let mut world = CircleWorld::new();
        world.insert(None, Vec2::new(1.0, 0.0), Obstacle::solid(0.5));
        world.insert(None, Vec2::new(0.0, 1.0), Obstacle::trigger(0.5));
        world.insert(None, Vec2::new(50.0, 0.0), Obstacle::solid(0.5));
        let mut out = Vec::new();
        world.circle_overlap_all(Vec2::ZERO, 1.0, layers::ALL, &mut out);
        assert_eq!(out.len(), 2);
        assert_eq!(out.iter().filter(|h| h.is_trigger).count(), 1);
    }

    #[test]
    fn test_overlap_boundary_only_near_wall() {
        let world = world_with(Vec2::ZERO, Obstacle::boundary(10.0));
        let mut out = Vec::new();
        world.circle_overlap_all(Vec2::ZERO, 2.0, layers::ALL, &mut out);
        assert!(out.is_empty());
        world.circle_overlap_all(Vec2::new(9.0, 0.0), 2.0, layers::ALL, &mut out);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].shape, ColliderShape::Boundary);
    }
}
