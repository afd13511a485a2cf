//! Solver iteration behaviour through the world.

use planar_physics::prelude::*;

use crate::{DT, run};

/// Two free bodies held one unit apart by a distance constraint.
fn linked_pair(solver: SolverConfig) -> World {
    let config = WorldConfig::zero_gravity().with_solver(solver);
    let mut world = World::new(config).unwrap();
    let a = world
        .add_body(Body::dynamic(1.0).with_shape(Shape::circle(0.1)))
        .unwrap();
    let b = world
        .add_body(
            Body::dynamic(1.0)
                .with_position(vec2(1.0, 0.0))
                .with_shape(Shape::circle(0.1)),
        )
        .unwrap();
    let rod = DistanceConstraint::new(world.body(a).unwrap(), world.body(b).unwrap());
    world.add_constraint(rod).unwrap();
    world
}

#[test]
fn zero_tolerance_runs_every_iteration() {
    let mut world = linked_pair(SolverConfig::default().with_iterations(12).with_tolerance(0.0));
    for _ in 0..30 {
        world.step(DT).unwrap();
        assert_eq!(world.solver_stats().used_iterations, 12);
    }
}

#[test]
fn tolerance_exits_early_near_equilibrium() {
    let iterations = 12;
    let mut exact = linked_pair(SolverConfig::default().with_iterations(iterations).with_tolerance(0.0));
    let mut loose = linked_pair(SolverConfig::default().with_iterations(iterations).with_tolerance(1e-4));
    run(&mut exact, 30);
    run(&mut loose, 30);

    let exact_used = exact.solver_stats().used_iterations;
    let loose_used = loose.solver_stats().used_iterations;
    assert_eq!(exact_used, iterations);
    assert!(loose_used < exact_used, "loose used {loose_used}");
}

#[test]
fn island_split_counts_separate_groups() {
    let mut world = World::default();
    world
        .add_body(Body::static_body().with_shape(Shape::plane()))
        .unwrap();
    crate::add_ball(&mut world, -5.0, 0.5, 0.5);
    crate::add_ball(&mut world, 5.0, 0.5, 0.5);
    world.step(DT).unwrap();

    let stats = world.solver_stats();
    assert_eq!(stats.islands, 2);
    let islands: Vec<_> = world.bodies().iter().map(Body::island_id).collect();
    assert_eq!(islands[0], None);
    assert_ne!(islands[1], islands[2]);
}

#[test]
fn disabling_solve_leaves_contacts_unsolved() {
    let mut config = WorldConfig::default();
    config.solve_constraints = false;
    let mut world = World::new(config).unwrap();
    crate::add_ground(&mut world);
    let ball = crate::add_ball(&mut world, 0.0, 0.5, 0.5);
    run(&mut world, 30);

    assert!(world.body(ball).unwrap().position().y < 0.0);
    assert_eq!(world.solver_stats(), SolverStats::default());
}
