//! Ray casts against bodies placed in a world.

use std::f64::consts::FRAC_PI_2;

use approx::assert_relative_eq;
use planar_physics::prelude::*;

fn static_body(world: &mut World, x: f64, y: f64, shape: Shape) -> BodyId {
    world
        .add_body(Body::static_body().with_position(vec2(x, y)).with_shape(shape))
        .unwrap()
}

#[test]
fn closest_hit_on_rotated_box() {
    let mut world = World::default();
    let id = world
        .add_body(
            Body::static_body()
                .with_position(vec2(1.0, 0.0))
                .with_angle(FRAC_PI_2)
                .with_shape(Shape::rectangle(1.0, 1.0)),
        )
        .unwrap();

    let ray = Ray::new(vec2(0.0, 0.0), vec2(10.0, 0.0)).with_mode(RayMode::Closest);
    let mut result = RaycastResult::new();
    assert!(world.raycast(&mut result, &ray));

    assert!(result.has_hit());
    assert_eq!(result.body, Some(id));
    assert!((0.0..=1.0).contains(&result.fraction));
    assert_relative_eq!(result.fraction, 0.05, epsilon = 1e-9);
    assert_relative_eq!(result.normal.norm(), 1.0, epsilon = 1e-9);
    assert_relative_eq!(result.normal, vec2(-1.0, 0.0), epsilon = 1e-9);
    assert_relative_eq!(result.hit_point(&ray), vec2(0.5, 0.0), epsilon = 1e-9);
    assert_relative_eq!(result.hit_distance(&ray), 0.5, epsilon = 1e-9);
}

#[test]
fn closest_picks_nearest_body() {
    let mut world = World::default();
    let far = static_body(&mut world, 6.0, 0.0, Shape::circle(0.5));
    let near = static_body(&mut world, 3.0, 0.0, Shape::circle(0.5));

    let ray = Ray::new(vec2(0.0, 0.0), vec2(10.0, 0.0)).with_mode(RayMode::Closest);
    let mut result = RaycastResult::new();
    assert!(world.raycast(&mut result, &ray));
    assert_eq!(result.body, Some(near));
    assert_ne!(result.body, Some(far));
    assert_relative_eq!(result.fraction, 0.25, epsilon = 1e-9);
}

#[test]
fn miss_leaves_result_empty() {
    let mut world = World::default();
    static_body(&mut world, 3.0, 5.0, Shape::circle(0.5));

    let ray = Ray::new(vec2(0.0, 0.0), vec2(10.0, 0.0)).with_mode(RayMode::Closest);
    let mut result = RaycastResult::new();
    assert!(!world.raycast(&mut result, &ray));
    assert_eq!(result, RaycastResult::new());
}

#[test]
fn reset_twice_matches_fresh_result() {
    let mut world = World::default();
    static_body(&mut world, 3.0, 0.0, Shape::circle(0.5));

    let ray = Ray::new(vec2(0.0, 0.0), vec2(10.0, 0.0));
    let mut result = RaycastResult::new();
    world.raycast(&mut result, &ray);
    assert!(result.has_hit());

    result.reset();
    assert_eq!(result, RaycastResult::new());
    result.reset();
    assert_eq!(result, RaycastResult::new());
}

#[test]
fn any_mode_reports_a_single_hit() {
    let mut world = World::default();
    static_body(&mut world, 3.0, 0.0, Shape::circle(0.5));
    static_body(&mut world, 6.0, 0.0, Shape::circle(0.5));

    let ray = Ray::new(vec2(0.0, 0.0), vec2(10.0, 0.0)).with_mode(RayMode::Any);
    let mut result = RaycastResult::new();
    assert!(world.raycast(&mut result, &ray));
    assert!(result.body.is_some());
}

#[test]
fn all_mode_visits_entry_and_exit() {
    let mut world = World::default();
    static_body(&mut world, 3.0, 0.0, Shape::circle(0.5));
    static_body(&mut world, 6.0, 0.0, Shape::circle(0.5));

    let ray = Ray::new(vec2(0.0, 0.0), vec2(10.0, 0.0));
    let mut result = RaycastResult::new();
    let mut fractions = Vec::new();
    assert!(world.raycast_all(&mut result, &ray, |hit| fractions.push(hit.fraction)));

    fractions.sort_by(f64::total_cmp);
    assert_eq!(fractions.len(), 4);
    for (got, want) in fractions.iter().zip([0.25, 0.35, 0.55, 0.65]) {
        assert_relative_eq!(*got, want, epsilon = 1e-9);
    }
}

#[test]
fn stop_from_callback_ends_the_cast() {
    let mut world = World::default();
    static_body(&mut world, 3.0, 0.0, Shape::circle(0.5));
    static_body(&mut world, 6.0, 0.0, Shape::circle(0.5));

    let ray = Ray::new(vec2(0.0, 0.0), vec2(10.0, 0.0));
    let mut result = RaycastResult::new();
    let mut hits = 0;
    world.raycast_all(&mut result, &ray, |hit| {
        hits += 1;
        hit.stop();
    });
    assert_eq!(hits, 1);
    assert!(result.is_stopped());
}

#[test]
fn skip_backfaces_drops_exit_hits() {
    let mut world = World::default();
    static_body(&mut world, 3.0, 0.0, Shape::circle(0.5));

    let ray = Ray::new(vec2(0.0, 0.0), vec2(10.0, 0.0)).with_skip_backfaces(true);
    let mut result = RaycastResult::new();
    let mut normals = Vec::new();
    world.raycast_all(&mut result, &ray, |hit| normals.push(hit.normal));

    assert_eq!(normals.len(), 1);
    assert_relative_eq!(normals[0], vec2(-1.0, 0.0), epsilon = 1e-9);
}

#[test]
fn collision_mask_filters_shapes() {
    let mut world = World::default();
    static_body(
        &mut world,
        3.0,
        0.0,
        Shape::circle(0.5).with_collision_group(0b01).with_collision_mask(0b01),
    );
    let visible = static_body(
        &mut world,
        6.0,
        0.0,
        Shape::circle(0.5).with_collision_group(0b10).with_collision_mask(0b10),
    );

    let ray = Ray::new(vec2(0.0, 0.0), vec2(10.0, 0.0))
        .with_mode(RayMode::Closest)
        .with_collision_filter(0b10, 0b10);
    let mut result = RaycastResult::new();
    assert!(world.raycast(&mut result, &ray));
    assert_eq!(result.body, Some(visible));
}

#[test]
fn shapes_without_response_are_skipped() {
    let mut world = World::default();
    static_body(&mut world, 3.0, 0.0, Shape::circle(0.5).with_collision_response(false));

    let ray = Ray::new(vec2(0.0, 0.0), vec2(10.0, 0.0));
    let mut result = RaycastResult::new();
    assert!(!world.raycast(&mut result, &ray));

    let ray = ray.with_check_collision_response(false);
    assert!(world.raycast(&mut result, &ray));
}

#[test]
fn ray_hits_plane_from_above() {
    let mut world = World::default();
    let ground = crate::add_ground(&mut world);

    let ray = Ray::new(vec2(0.0, 4.0), vec2(0.0, -4.0)).with_mode(RayMode::Closest);
    let mut result = RaycastResult::new();
    assert!(world.raycast(&mut result, &ray));
    assert_eq!(result.body, Some(ground));
    assert_relative_eq!(result.fraction, 0.5, epsilon = 1e-9);
    assert_relative_eq!(result.normal, vec2(0.0, 1.0), epsilon = 1e-9);
}
