//! Contact and lifecycle events.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use planar_physics::prelude::*;

use crate::{DT, add_ball, add_ground, run};

type Pair<T> = (T, T);

fn sorted<T: Ord>(a: T, b: T) -> Pair<T> {
    if a <= b { (a, b) } else { (b, a) }
}

#[derive(Debug, PartialEq)]
enum Contact {
    Begin(Pair<ShapeId>, Pair<BodyId>),
    End(Pair<ShapeId>, Pair<BodyId>),
}

// ============================================================================
// Begin / end contact
// ============================================================================

#[test]
fn begin_and_end_contact_pair_up() {
    let mut world = World::new(WorldConfig::zero_gravity()).unwrap();
    let a = add_ball(&mut world, 0.0, 0.0, 0.5);
    let b = add_ball(&mut world, 3.0, 0.0, 0.5);

    let log = Rc::new(RefCell::new(Vec::new()));
    let begin_log = Rc::clone(&log);
    world.on(WorldEventKind::BeginContact, move |event, _| {
        if let WorldEvent::BeginContact {
            shape_a,
            shape_b,
            body_a,
            body_b,
            ..
        } = *event
        {
            begin_log
                .borrow_mut()
                .push(Contact::Begin(sorted(shape_a, shape_b), sorted(body_a, body_b)));
        }
    });
    let end_log = Rc::clone(&log);
    world.on(WorldEventKind::EndContact, move |event, _| {
        if let WorldEvent::EndContact {
            shape_a,
            shape_b,
            body_a,
            body_b,
        } = *event
        {
            end_log
                .borrow_mut()
                .push(Contact::End(sorted(shape_a, shape_b), sorted(body_a, body_b)));
        }
    });

    world.step(DT).unwrap();
    assert!(log.borrow().is_empty());

    world.body_mut(b).unwrap().set_position(vec2(0.8, 0.0));
    world.step(DT).unwrap();

    for id in [a, b] {
        let body = world.body_mut(id).unwrap();
        body.set_velocity(Vec2::zeros());
        body.set_angular_velocity(0.0);
    }
    world.body_mut(a).unwrap().set_position(vec2(0.0, 0.0));
    world.body_mut(b).unwrap().set_position(vec2(3.0, 0.0));
    world.step(DT).unwrap();

    let shapes = sorted(
        world.body(a).unwrap().shapes()[0].id(),
        world.body(b).unwrap().shapes()[0].id(),
    );
    let bodies = sorted(a, b);
    assert_eq!(
        *log.borrow(),
        vec![Contact::Begin(shapes, bodies), Contact::End(shapes, bodies)]
    );
}

#[test]
fn ongoing_contact_does_not_repeat_begin() {
    let mut world = World::default();
    add_ground(&mut world);
    add_ball(&mut world, 0.0, 0.5, 0.5);

    let begins = Rc::new(Cell::new(0));
    let counter = Rc::clone(&begins);
    world.on(WorldEventKind::BeginContact, move |_, _| counter.set(counter.get() + 1));
    run(&mut world, 120);
    assert_eq!(begins.get(), 1);
}

// ============================================================================
// Step events
// ============================================================================

#[test]
fn impact_reports_first_contact() {
    let mut world = World::default();
    let ground = add_ground(&mut world);
    let ball = add_ball(&mut world, 0.0, 2.0, 0.5);

    let impacts = Rc::new(RefCell::new(Vec::new()));
    let log = Rc::clone(&impacts);
    world.on(WorldEventKind::Impact, move |event, _| {
        if let WorldEvent::Impact {
            body_a,
            body_b,
            contact,
            ..
        } = *event
        {
            assert!(contact.as_contact().is_some_and(|c| c.first_impact));
            log.borrow_mut().push(sorted(body_a, body_b));
        }
    });
    run(&mut world, 120);

    let impacts = impacts.borrow();
    assert!(!impacts.is_empty());
    assert_eq!(impacts[0], sorted(ground, ball));
}

#[test]
fn impact_event_can_be_switched_off() {
    let mut config = WorldConfig::default();
    config.emit_impact_event = false;
    let mut world = World::new(config).unwrap();
    add_ground(&mut world);
    add_ball(&mut world, 0.0, 2.0, 0.5);

    let impacts = Rc::new(Cell::new(0));
    let counter = Rc::clone(&impacts);
    world.on(WorldEventKind::Impact, move |_, _| counter.set(counter.get() + 1));
    run(&mut world, 120);
    assert_eq!(impacts.get(), 0);
}

#[test]
fn post_broadphase_and_pre_solve_see_the_step() {
    let mut world = World::default();
    let ground = add_ground(&mut world);
    let ball = add_ball(&mut world, 0.0, 0.5, 0.5);

    let pairs = Rc::new(RefCell::new(Vec::new()));
    let pair_log = Rc::clone(&pairs);
    world.on(WorldEventKind::PostBroadphase, move |event, _| {
        if let WorldEvent::PostBroadphase { pairs } = *event {
            pair_log
                .borrow_mut()
                .extend(pairs.iter().map(|&(a, b)| sorted(a, b)));
        }
    });
    let contacts = Rc::new(Cell::new(0));
    let contact_count = Rc::clone(&contacts);
    world.on(WorldEventKind::PreSolve, move |event, _| {
        if let WorldEvent::PreSolve { contact_equations, .. } = *event {
            contact_count.set(contact_equations.len());
        }
    });

    world.step(DT).unwrap();
    assert_eq!(*pairs.borrow(), vec![sorted(ground, ball)]);
    assert_eq!(contacts.get(), 1);
}

#[test]
fn post_step_runs_once_per_step() {
    let mut world = World::default();
    let steps = Rc::new(Cell::new(0));
    let counter = Rc::clone(&steps);
    world.on(WorldEventKind::PostStep, move |_, _| counter.set(counter.get() + 1));
    run(&mut world, 5);
    world.step_with_time(DT, 3.5 * DT, 10).unwrap();
    assert_eq!(steps.get(), 8);
}

#[test]
fn listener_can_unsubscribe_itself() {
    let mut world = World::default();
    let calls = Rc::new(Cell::new(0));
    let own_id = Rc::new(Cell::new(None));

    let counter = Rc::clone(&calls);
    let slot = Rc::clone(&own_id);
    let id = world.on(WorldEventKind::PostStep, move |_, emitter| {
        counter.set(counter.get() + 1);
        if let Some(id) = slot.get() {
            emitter.off(id);
        }
    });
    own_id.set(Some(id));

    run(&mut world, 3);
    assert_eq!(calls.get(), 1);
    assert!(!world.has(WorldEventKind::PostStep));
}

#[test]
fn body_lifecycle_events() {
    let mut world = World::default();
    let log = Rc::new(RefCell::new(Vec::new()));
    let added = Rc::clone(&log);
    world.on(WorldEventKind::AddBody, move |event, _| {
        if let WorldEvent::AddBody { body } = *event {
            added.borrow_mut().push(("add", body));
        }
    });
    let removed = Rc::clone(&log);
    world.on(WorldEventKind::RemoveBody, move |event, _| {
        if let WorldEvent::RemoveBody { body } = *event {
            removed.borrow_mut().push(("remove", body));
        }
    });

    let id = world.add_body(Body::dynamic(1.0)).unwrap();
    world.remove_body(id).unwrap();
    assert_eq!(*log.borrow(), vec![("add", id), ("remove", id)]);
}
