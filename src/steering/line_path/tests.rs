use super::*;

fn l_path() -> LinePath {
    LinePath::new(vec![
        Vec2::new(0.0, 0.0),
        Vec2::new(10.0, 0.0),
        Vec2::new(10.0, 5.0),
    ])
    .unwrap()
}

fn square() -> LinePath {
    LinePath::new(vec![
        Vec2::new(0.0, 0.0),
        Vec2::new(4.0, 0.0),
        Vec2::new(4.0, 4.0),
        Vec2::new(0.0, 4.0),
        Vec2::new(0.0, 0.0),
    ])
    .unwrap()
}

#[test]
fn test_empty_path_is_rejected() {
    assert!(LinePath::new(Vec::new()).is_none());
}

#[test]
fn test_distances_are_cumulative() {
    let path = l_path();
    assert_eq!(path.distances(), &[0.0, 10.0, 15.0]);
    assert_eq!(path.max_dist(), 15.0);
    assert_eq!(path.distances().len(), path.nodes().len());
}

#[test]
fn test_mutation_recomputes_distances() {
    let mut path = l_path();
    path.set_node(2, Vec2::new(10.0, 10.0));
    assert_eq!(path.max_dist(), 20.0);

    path.push_node(Vec2::new(0.0, 10.0));
    assert_eq!(path.distances(), &[0.0, 10.0, 20.0, 30.0]);

    assert!(!path.rebuild(Vec::new()));
    assert_eq!(path.len(), 4);
    assert!(path.rebuild(vec![Vec2::ONE]));
    assert_eq!(path.distances(), &[0.0]);
}

#[test]
fn test_closest_segment_prefers_earliest_on_tie() {
    let path = l_path();
    // The shared corner is equidistant to both segments.
    assert_eq!(path.closest_segment(Vec2::new(10.0, 0.0)), 0);
    assert_eq!(path.closest_segment(Vec2::new(11.0, 3.0)), 1);
    assert_eq!(path.closest_segment(Vec2::new(3.0, -2.0)), 0);
}

#[test]
fn test_param_projects_onto_path() {
    let path = l_path();
    assert!((path.param(Vec2::new(3.0, 1.0)) - 3.0).abs() < 1e-5);
    assert!((path.param(Vec2::new(12.0, 2.0)) - 12.0).abs() < 1e-5);
    // Beyond the end clamps to the end.
    assert!((path.param(Vec2::new(10.0, 9.0)) - 15.0).abs() < 1e-5);
}

#[test]
fn test_param_monotonic_along_path() {
    let path = l_path();
    let mut last = -1.0;
    let steps = 60;
    for s in 0..=steps {
        let p = path.position(path.max_dist() * s as f32 / steps as f32, false);
        let param = path.param(p);
        assert!(param + 1e-4 >= last, "param went backwards at step {s}: {param} < {last}");
        last = param;
    }
}

#[test]
fn test_position_clamps_open_path() {
    let path = l_path();
    assert_eq!(path.position(-4.0, false), Vec2::new(0.0, 0.0));
    assert_eq!(path.position(100.0, false), Vec2::new(10.0, 5.0));
    assert_eq!(path.position(12.5, false), Vec2::new(10.0, 2.5));
}

#[test]
fn test_position_wraps_looping_path() {
    let path = square();
    let p = path.position(18.0, true); // 16 perimeter, 2 past start
    assert!((p - Vec2::new(2.0, 0.0)).length() < 1e-5);
    let back = path.position(-1.0, true);
    assert!((back - Vec2::new(0.0, 1.0)).length() < 1e-5);
}

#[test]
fn test_looping_position_is_periodic() {
    let path = square();
    let mut rng = fastrand::Rng::with_seed(7);
    for _ in 0..200 {
        let probe = Vec2::new(rng.f32() * 6.0 - 1.0, rng.f32() * 6.0 - 1.0);
        let param = path.param(probe);
        let base = path.position(param, true);
        for k in [-2i32, -1, 1, 3] {
            let shifted = path.position(param + k as f32 * path.max_dist(), true);
            assert!(
                (shifted - base).length() < 1e-3,
                "k={k} param={param}: {shifted:?} vs {base:?}"
            );
        }
    }
}

#[test]
fn test_single_node_path_is_degenerate_not_error() {
    let path = LinePath::point(Vec2::new(3.0, 3.0));
    assert_eq!(path.max_dist(), 0.0);
    assert_eq!(path.param(Vec2::new(100.0, 0.0)), 0.0);
    assert_eq!(path.position(42.0, true), Vec2::new(3.0, 3.0));
    assert_eq!(path.position(42.0, false), Vec2::new(3.0, 3.0));
    assert_eq!(path.closest_segment(Vec2::ZERO), 0);
}

#[test]
fn test_coincident_nodes_do_not_divide_by_zero() {
    let path = LinePath::new(vec![Vec2::ONE, Vec2::ONE, Vec2::ONE]).unwrap();
    let p = path.position(0.5, true);
    assert!(p.is_finite());
    assert_eq!(p, Vec2::ONE);
    assert!(path.param(Vec2::ZERO).is_finite());
}

#[test]
fn test_deserialized_path_recomputes_distances() {
    let path: LinePath = ron::from_str("[(0.0, 0.0), (10.0, 0.0), (10.0, 5.0)]").unwrap();
    assert_eq!(path, l_path());
    assert_eq!(path.distances(), &[0.0, 10.0, 15.0]);
    assert_eq!(path.max_dist(), 15.0);
}

#[test]
fn test_deserializing_empty_path_fails() {
    let result: Result<LinePath, _> = ron::from_str("[]");
    assert!(result.is_err());
}

#[test]
fn test_serialized_path_is_node_list() {
    let text = ron::to_string(&l_path()).unwrap();
    assert!(!text.contains("distances"));
    let back: LinePath = ron::from_str(&text).unwrap();
    assert_eq!(back, l_path());
}
