use super::*;
use crate::steering::obstacles::{CircleWorld, Obstacle};

fn rocks() -> CircleWorld {
    let mut world = CircleWorld::new();
    world.insert(None, Vec2::new(3.0, 0.0), Obstacle::solid(1.0));
    world.insert(None, Vec2::new(-4.0, 2.0), Obstacle::solid(0.5));
    world.insert(None, Vec2::new(0.0, -5.0), Obstacle::trigger(2.0));
    world
}

#[test]
fn test_bounds_follow_origin() {
    let mut field = FlowField::new(10, 4, 2.0, 1.0);
    field.generate(Vec2::new(100.0, 50.0), &CircleWorld::new());
    let bounds = field.bounds();
    assert_eq!(bounds.min, Vec2::new(90.0, 46.0));
    assert_eq!(bounds.max, Vec2::new(110.0, 54.0));
    assert_eq!(field.origin(), Vec2::new(100.0, 50.0));
}

#[test]
fn test_grid_world_mapping() {
    let field = FlowField::new(8, 8, 1.0, 1.0);
    assert_eq!(field.world_to_grid(Vec2::new(-4.0, -4.0)), Some((0, 0)));
    assert_eq!(field.world_to_grid(Vec2::new(3.99, 0.2)), Some((7, 4)));
    assert_eq!(field.world_to_grid(Vec2::new(4.0, 0.0)), None);
    assert_eq!(field.grid_to_world(0, 0), Vec2::new(-3.5, -3.5));
}

#[test]
fn test_cells_push_away_from_solid_obstacles() {
    let mut field = FlowField::new(20, 20, 1.0, 1.0);
    field.generate(Vec2::ZERO, &rocks());

    // Cell centered at (1.5, 0.5) sits left of the rock at (3, 0).
    let (x, y) = field.world_to_grid(Vec2::new(1.5, 0.5)).unwrap();
    let v = field.cell(x, y).unwrap();
    assert!(v.x < 0.0, "expected leftward push, got {v:?}");

    // Far from everything.
    let (x, y) = field.world_to_grid(Vec2::new(8.5, 8.5)).unwrap();
    assert_eq!(field.cell(x, y).unwrap(), Vec2::ZERO);
}

#[test]
fn test_triggers_do_not_contribute() {
    let mut field = FlowField::new(20, 20, 1.0, 1.0);
    field.generate(Vec2::ZERO, &rocks());
    // Right next to the trigger at (0, -5) and nowhere near a solid.
    let (x, y) = field.world_to_grid(Vec2::new(0.5, -3.5)).unwrap();
    assert_eq!(field.cell(x, y).unwrap(), Vec2::ZERO);
}

#[test]
fn test_boundary_pushes_inward() {
    let mut world = CircleWorld::new();
    world.insert(None, Vec2::ZERO, Obstacle::boundary(6.0));
    let mut field = FlowField::new(16, 16, 1.0, 1.0);
    field.generate(Vec2::ZERO, &world);

    let (x, y) = field.world_to_grid(Vec2::new(5.5, 0.5)).unwrap();
    let v = field.cell(x, y).unwrap();
    assert!(v.x < 0.0, "wall on the right should push left, got {v:?}");

    let (x, y) = field.world_to_grid(Vec2::new(0.5, 0.5)).unwrap();
    assert_eq!(field.cell(x, y).unwrap(), Vec2::ZERO);
}

#[test]
fn test_clutter_sums_unnormalized() {
    let mut world = CircleWorld::new();
    world.insert(None, Vec2::new(-1.0, 0.0), Obstacle::solid(0.2));
    world.insert(None, Vec2::new(-1.0, 0.1), Obstacle::solid(0.2));
    let field_calc = FlowField::new(4, 4, 1.0, 1.0);
    let mut hits = Vec::new();
    let v = field_calc.calculate_flow_vector(Vec2::ZERO, &world, &mut hits);
    assert!(v.length() > 1.5, "two rocks should stack, got {v:?}");
}

#[test]
fn test_generation_is_deterministic() {
    let world = rocks();
    let mut field = FlowField::new(24, 24, 0.5, 1.5);
    field.generate(Vec2::new(0.25, -0.75), &world);
    let first = field.cells().to_vec();
    field.generate(Vec2::new(0.25, -0.75), &world);
    assert_eq!(first, field.cells());
    assert_eq!(field.generation(), 2);
}

#[test]
fn test_force_outside_bounds_is_zero() {
    let mut field = FlowField::new(20, 20, 1.0, 1.0);
    field.generate(Vec2::ZERO, &rocks());
    assert_eq!(field.force(Vec2::new(500.0, 0.0), 3.0), Vec2::ZERO);
    assert_eq!(field.force(Vec2::new(-10.5, 0.0), 30.0), Vec2::ZERO);
}

#[test]
fn test_force_sums_cells_within_radius() {
    let mut field = FlowField::new(20, 20, 1.0, 1.0);
    field.generate(Vec2::ZERO, &rocks());

    let pos = Vec2::new(1.5, 0.5);
    let radius = 1.2;
    let mut expected = Vec2::ZERO;
    for y in 0..field.height() {
        for x in 0..field.width() {
            if field.grid_to_world(x, y).distance(pos) <= radius {
                expected += field.cell(x, y).unwrap();
            }
        }
    }
    let got = field.force(pos, radius);
    assert!((got - expected).length() < 1e-5, "{got:?} vs {expected:?}");
    assert!(got.x < 0.0);
}

#[test]
fn test_unbounded_radius_sums_whole_grid() {
    let mut field = FlowField::new(8, 8, 1.0, 1.5);
    field.generate(Vec2::ZERO, &rocks());
    let all: Vec2 = field.cells().iter().copied().sum();

    for radius in [f32::INFINITY, 1e30, f32::MAX] {
        let got = field.force(Vec2::new(-0.5, 0.5), radius);
        assert!((got - all).length() < 1e-4, "radius {radius}: {got:?} vs {all:?}");
    }
    assert!(field.force(Vec2::new(-0.5, 0.5), f32::NAN).is_finite());
}

#[test]
fn test_force_reads_bounds_in_effect() {
    let world = rocks();
    let mut field = FlowField::new(10, 10, 1.0, 1.0);
    field.generate(Vec2::ZERO, &world);
    let near_rock = Vec2::new(1.5, 0.5);
    assert_ne!(field.force(near_rock, 1.0), Vec2::ZERO);

    // Anchor moved far away: the same point is now off-grid.
    field.generate(Vec2::new(100.0, 100.0), &world);
    assert_eq!(field.force(near_rock, 1.0), Vec2::ZERO);
}
