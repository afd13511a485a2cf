//! Shape pairs colliding through the world pipeline.

use approx::assert_relative_eq;
use planar_physics::planar_core::narrow_phase::Collider;
use planar_physics::prelude::*;
use proptest::prelude::*;

use crate::{DT, add_ball, add_ground, run};

// ============================================================================
// Shape construction
// ============================================================================

#[test]
fn convex_rejects_clockwise_winding() {
    let clockwise = vec![vec2(0.0, 0.0), vec2(0.0, 1.0), vec2(1.0, 1.0), vec2(1.0, 0.0)];
    let err = Shape::convex(clockwise).unwrap_err();
    assert!(matches!(err, SimError::ClockwiseWinding { .. }));

    let counter_clockwise = vec![vec2(0.0, 0.0), vec2(1.0, 0.0), vec2(1.0, 1.0), vec2(0.0, 1.0)];
    let shape = Shape::convex(counter_clockwise).unwrap();
    assert!(shape.area() > 0.0);
}

#[test]
fn box_inertia_scales_with_body_mass() {
    let (w, h, m) = (2.0, 0.5, 3.0);
    let shape = Shape::rectangle(w, h);
    assert_relative_eq!(shape.compute_moment_of_inertia(), (w * w + h * h) / 12.0);

    let body = Body::dynamic(m).with_shape(Shape::rectangle(w, h));
    assert_relative_eq!(body.inertia(), m * (w * w + h * h) / 12.0, epsilon = 1e-12);
    assert_relative_eq!(body.inv_inertia(), 1.0 / body.inertia(), epsilon = 1e-12);
}

// ============================================================================
// Narrowphase properties
// ============================================================================

fn circle_pair_overlaps(r1: f64, r2: f64, d: f64) -> usize {
    let a = Body::dynamic(1.0).with_shape(Shape::circle(r1));
    let b = Body::dynamic(1.0)
        .with_position(vec2(d, 0.0))
        .with_shape(Shape::circle(r2));
    let mut narrowphase = Narrowphase::new();
    narrowphase.collide(
        &Collider::new(&a, 0, &a.shapes()[0]),
        &Collider::new(&b, 1, &b.shapes()[0]),
        false,
    )
}

#[test]
fn circle_circle_boundary_is_inclusive() {
    assert_eq!(circle_pair_overlaps(0.5, 0.25, 0.75), 1);
    assert_eq!(circle_pair_overlaps(0.5, 0.25, 0.750_000_001), 0);
}

proptest! {
    #[test]
    fn circle_circle_reports_iff_touching(
        r1 in 0.05f64..2.0,
        r2 in 0.05f64..2.0,
        d in 0.0f64..5.0,
    ) {
        let expected = usize::from(d * d <= (r1 + r2) * (r1 + r2));
        prop_assert_eq!(circle_pair_overlaps(r1, r2, d), expected);
    }
}

// ============================================================================
// Resting contact
// ============================================================================

#[test]
fn box_rests_on_plane() {
    let mut world = World::default();
    add_ground(&mut world);
    let id = world
        .add_body(
            Body::dynamic(1.0)
                .with_position(vec2(0.0, 1.0))
                .with_shape(Shape::rectangle(1.0, 1.0)),
        )
        .unwrap();
    run(&mut world, 240);

    let body = world.body(id).unwrap();
    assert!((body.position().y - 0.5).abs() < 0.02, "y = {}", body.position().y);
    assert!(body.angle().abs() < 1e-3);
    assert!(body.velocity().norm() < 0.05);
}

#[test]
fn box_stack_settles() {
    let mut world = World::default();
    add_ground(&mut world);
    let mut ids = Vec::new();
    for level in 0..3 {
        ids.push(
            world
                .add_body(
                    Body::dynamic(1.0)
                        .with_position(vec2(0.0, 0.5 + f64::from(level) * 1.0))
                        .with_shape(Shape::rectangle(1.0, 1.0)),
                )
                .unwrap(),
        );
    }
    run(&mut world, 300);

    for (level, id) in ids.iter().enumerate() {
        let body = world.body(*id).unwrap();
        let expected = 0.5 + level as f64;
        assert!((body.position().y - expected).abs() < 0.05, "level {level}: y = {}", body.position().y);
        assert!(body.position().x.abs() < 0.02);
    }
}

#[test]
fn capsule_rests_on_plane() {
    let mut world = World::default();
    add_ground(&mut world);
    let id = world
        .add_body(
            Body::dynamic(1.0)
                .with_position(vec2(0.0, 1.0))
                .with_shape(Shape::capsule(1.0, 0.25)),
        )
        .unwrap();
    run(&mut world, 240);

    let body = world.body(id).unwrap();
    assert!((body.position().y - 0.25).abs() < 0.02, "y = {}", body.position().y);
}

#[test]
fn ball_rests_on_heightfield() {
    let mut world = World::default();
    world
        .add_body(
            Body::static_body()
                .with_position(vec2(-5.0, 0.0))
                .with_shape(Shape::heightfield(vec![0.0; 11], 1.0).unwrap()),
        )
        .unwrap();
    let ball = add_ball(&mut world, 0.3, 2.0, 0.5);
    run(&mut world, 240);

    let body = world.body(ball).unwrap();
    assert!((body.position().y - 0.5).abs() < 0.03, "y = {}", body.position().y);
}

#[test]
fn particle_stops_at_plane() {
    let mut world = World::default();
    add_ground(&mut world);
    let id = world
        .add_body(
            Body::dynamic(1.0)
                .with_position(vec2(0.0, 1.0))
                .with_shape(Shape::particle()),
        )
        .unwrap();
    run(&mut world, 180);
    assert!(world.body(id).unwrap().position().y.abs() < 0.02);
}

#[test]
fn collision_mask_lets_body_pass() {
    let mut world = World::default();
    world
        .add_body(Body::static_body().with_shape(Shape::plane().with_collision_group(2)))
        .unwrap();
    let id = world
        .add_body(
            Body::dynamic(1.0)
                .with_position(vec2(0.0, 1.0))
                .with_shape(Shape::circle(0.5).with_collision_mask(!2)),
        )
        .unwrap();
    run(&mut world, 60);
    assert!(world.body(id).unwrap().position().y < -1.0);
    assert!(world.contact_equations().is_empty());
}

#[test]
fn both_broadphases_find_the_same_contacts() {
    let build = |kind: BroadphaseKind| {
        let mut world = World::new(WorldConfig::default().with_broadphase(kind)).unwrap();
        add_ground(&mut world);
        for i in 0..5 {
            add_ball(&mut world, f64::from(i) * 0.9, 0.5, 0.5);
        }
        world.step(DT).unwrap();
        world.contact_equations().len()
    };
    assert_eq!(build(BroadphaseKind::Naive), build(BroadphaseKind::SweepAndPrune));
}
