//! Whole-world behaviour: determinism, kinematics, springs and materials.

use approx::assert_relative_eq;
use planar_physics::prelude::*;

use crate::{DT, add_ball, add_ground, run};

fn pile(world: &mut World) -> Vec<BodyId> {
    add_ground(world);
    let mut ids = Vec::new();
    for i in 0..3 {
        let y = 0.5 + f64::from(i) * 1.05;
        let x = 0.1 * f64::from(i);
        ids.push(
            world
                .add_body(
                    Body::dynamic(1.0)
                        .with_position(vec2(x, y))
                        .with_shape(Shape::rectangle(1.0, 1.0)),
                )
                .unwrap(),
        );
    }
    ids.push(add_ball(world, -1.5, 4.0, 0.4));
    ids.push(
        world
            .add_body(
                Body::dynamic(2.0)
                    .with_position(vec2(2.5, 3.0))
                    .with_angular_velocity(4.0)
                    .with_shape(Shape::capsule(1.0, 0.2)),
            )
            .unwrap(),
    );
    ids
}

// ============================================================================
// Determinism
// ============================================================================

#[test]
fn identical_worlds_stay_bitwise_identical() {
    let mut first = World::default();
    let mut second = World::default();
    let ids_first = pile(&mut first);
    let ids_second = pile(&mut second);
    assert_eq!(ids_first, ids_second);

    run(&mut first, 200);
    run(&mut second, 200);

    for id in ids_first {
        let a = first.body(id).unwrap();
        let b = second.body(id).unwrap();
        assert_eq!(a.position(), b.position());
        assert_eq!(a.angle(), b.angle());
        assert_eq!(a.velocity(), b.velocity());
        assert_eq!(a.angular_velocity(), b.angular_velocity());
    }
    assert_eq!(first.solver_stats(), second.solver_stats());
}

#[test]
fn broadphase_choice_settles_the_same_way() {
    let mut naive = World::new(WorldConfig::default().with_broadphase(BroadphaseKind::Naive)).unwrap();
    let mut sap = World::new(WorldConfig::default().with_broadphase(BroadphaseKind::SweepAndPrune)).unwrap();
    let ids = pile(&mut naive);
    pile(&mut sap);

    run(&mut naive, 120);
    run(&mut sap, 120);
    for id in ids {
        assert_relative_eq!(
            naive.body(id).unwrap().position(),
            sap.body(id).unwrap().position(),
            epsilon = 1e-3
        );
    }
    assert_eq!(naive.contact_equations().len(), sap.contact_equations().len());
}

// ============================================================================
// Kinematic bodies
// ============================================================================

#[test]
fn kinematic_body_ignores_gravity_and_contacts() {
    let mut world = World::default();
    let platform = world
        .add_body(
            Body::kinematic()
                .with_velocity(vec2(1.0, 0.0))
                .with_shape(Shape::rectangle(4.0, 0.5)),
        )
        .unwrap();
    let rider = add_ball(&mut world, 0.0, 0.75, 0.5);

    run(&mut world, 60);

    let body = world.body(platform).unwrap();
    assert_relative_eq!(body.position(), vec2(1.0, 0.0), epsilon = 1e-9);
    assert_eq!(body.velocity(), vec2(1.0, 0.0));
    // The rider is carried by friction and does not sink through.
    let rider = world.body(rider).unwrap();
    assert!(rider.position().y > 0.6);
    assert!(rider.position().x > 0.1);
}

// ============================================================================
// Springs
// ============================================================================

#[test]
fn damped_linear_spring_settles_at_rest_length() {
    let mut world = World::new(WorldConfig::zero_gravity()).unwrap();
    let a = world.add_body(Body::static_body()).unwrap();
    let b = add_ball(&mut world, 2.0, 0.0, 0.1);
    let spring = Spring::linear(world.body(a).unwrap(), world.body(b).unwrap())
        .with_rest(1.0)
        .with_stiffness(50.0)
        .with_damping(5.0);
    world.add_spring(spring).unwrap();

    run(&mut world, 600);
    let body = world.body(b).unwrap();
    assert_relative_eq!(body.position(), vec2(1.0, 0.0), epsilon = 0.01);
    assert!(body.velocity().norm() < 0.01);
}

#[test]
fn rotational_spring_returns_to_rest_angle() {
    let mut world = World::new(WorldConfig::zero_gravity()).unwrap();
    let a = world.add_body(Body::static_body()).unwrap();
    let b = world
        .add_body(
            Body::dynamic(1.0)
                .with_position(vec2(3.0, 0.0))
                .with_angle(1.0)
                .with_shape(Shape::circle(0.5)),
        )
        .unwrap();
    let spring = Spring::rotational(world.body(a).unwrap(), world.body(b).unwrap())
        .with_rest(0.0)
        .with_stiffness(1.0)
        .with_damping(0.2);
    world.add_spring(spring).unwrap();

    run(&mut world, 600);
    assert_relative_eq!(world.body(b).unwrap().angle(), 0.0, epsilon = 0.01);
}

#[test]
fn removed_spring_stops_pulling() {
    let mut world = World::new(WorldConfig::zero_gravity()).unwrap();
    let a = world.add_body(Body::static_body()).unwrap();
    let b = add_ball(&mut world, 2.0, 0.0, 0.1);
    let spring = Spring::linear(world.body(a).unwrap(), world.body(b).unwrap()).with_rest(1.0);
    let id = world.add_spring(spring).unwrap();
    world.remove_spring(id).unwrap();

    run(&mut world, 60);
    assert_eq!(world.body(b).unwrap().position(), vec2(2.0, 0.0));
}

// ============================================================================
// Materials
// ============================================================================

fn sliding_box(world: &mut World, material: Option<MaterialId>) -> BodyId {
    let mut ground = Shape::plane();
    let mut block = Shape::rectangle(1.0, 1.0);
    if let Some(material) = material {
        ground = ground.with_material(material);
        block = block.with_material(material);
    }
    world.add_body(Body::static_body().with_shape(ground)).unwrap();
    world
        .add_body(
            Body::dynamic(1.0)
                .with_position(vec2(0.0, 0.5))
                .with_velocity(vec2(5.0, 0.0))
                .with_damping(0.0, 0.0)
                .with_shape(block),
        )
        .unwrap()
}

#[test]
fn friction_stops_a_sliding_box() {
    let mut world = World::default();
    let block = sliding_box(&mut world, None);

    run(&mut world, 150);
    let body = world.body(block).unwrap();
    assert!(body.velocity().x.abs() < 0.05);
    // Coulomb deceleration is roughly μg, so it stops within a few metres.
    assert!(body.position().x > 3.0);
    assert!(body.position().x < 6.0);
}

#[test]
fn frictionless_material_keeps_it_sliding() {
    let mut world = World::default();
    let ice = Material::new();
    world
        .add_contact_material(ContactMaterial::new(
            ice.id,
            ice.id,
            ContactMaterialParams::frictionless(),
        ))
        .unwrap();
    let block = sliding_box(&mut world, Some(ice.id));

    run(&mut world, 150);
    let body = world.body(block).unwrap();
    assert!(body.velocity().x > 4.99);
    assert!(world.friction_equations().is_empty());
}

fn drop_ball(world: &mut World, material: Option<MaterialId>) -> BodyId {
    let mut ground = Shape::plane();
    let mut ball = Shape::circle(0.5);
    if let Some(material) = material {
        ground = ground.with_material(material);
        ball = ball.with_material(material);
    }
    world.add_body(Body::static_body().with_shape(ground)).unwrap();
    world
        .add_body(
            Body::dynamic(1.0)
                .with_position(vec2(0.0, 3.0))
                .with_damping(0.0, 0.0)
                .with_shape(ball),
        )
        .unwrap()
}

/// Highest point reached after the first upward velocity.
fn rebound_peak(world: &mut World, ball: BodyId) -> f64 {
    let mut bounced = false;
    let mut peak = f64::NEG_INFINITY;
    for _ in 0..240 {
        world.step(DT).unwrap();
        let body = world.body(ball).unwrap();
        bounced |= body.velocity().y > 0.5;
        if bounced {
            peak = peak.max(body.position().y);
        }
    }
    peak
}

#[test]
fn restitution_makes_a_ball_rebound() {
    let mut world = World::default();
    let rubber = Material::new();
    world
        .add_contact_material(ContactMaterial::new(
            rubber.id,
            rubber.id,
            ContactMaterialParams::bouncy(),
        ))
        .unwrap();
    let ball = drop_ball(&mut world, Some(rubber.id));
    assert!(rebound_peak(&mut world, ball) > 2.0);
}

#[test]
fn default_material_absorbs_the_impact() {
    let mut world = World::default();
    let ball = drop_ball(&mut world, None);
    let peak = rebound_peak(&mut world, ball);
    assert!(peak < 0.7, "unexpected rebound to {peak}");
}

#[test]
fn contact_material_lookup_is_order_independent() {
    let mut world = World::default();
    let wood = Material::new();
    let steel = Material::new();
    let id = world
        .add_contact_material(ContactMaterial::new(
            wood.id,
            steel.id,
            ContactMaterialParams::default().with_friction(0.6),
        ))
        .unwrap();

    let forward = world.contact_material(wood.id, steel.id).unwrap();
    let backward = world.contact_material(steel.id, wood.id).unwrap();
    assert_eq!(forward.id, id);
    assert_eq!(forward, backward);
    assert_eq!(forward.params.friction, 0.6);
}
