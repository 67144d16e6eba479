//! The simulation driver: placement, queued commands, reset, destroy, picking.

use std::sync::Arc;

use approx::assert_relative_eq;
use sim_physics::prelude::*;

use crate::fixtures::{drifting, model_count, moving_box, partitioned, registry, sphere};

fn single(config: &EngineConfig) -> Simulation {
    let mut sim = Simulation::new();
    sim.add_engine(
        Box::new(RigidEngine::<YUpLeftHanded>::new("main", registry())),
        config,
    )
    .expect("engine");
    sim
}

/// Test: entities go to the first engine whose volume contains them.
#[test]
fn add_entity_places_by_volume() {
    let mut sim = partitioned::<YUpLeftHanded>(TransferTrigger::EveryTick);
    sim.add_entity(sphere("west", Point3::new(2.0, 0.0, 0.0))).expect("west");
    sim.add_entity(sphere("east", Point3::new(8.0, 0.0, 0.0))).expect("east");
    // On the shared face: configuration order decides.
    sim.add_entity(sphere("border", Point3::new(5.0, 0.0, 0.0))).expect("border");

    assert_eq!((model_count(&sim, "a"), model_count(&sim, "b")), (2, 1));
    let err = sim
        .add_entity(sphere("lost", Point3::new(50.0, 0.0, 0.0)))
        .expect_err("outside every engine");
    assert!(matches!(err, SimError::NoEngineForEntity { .. }));
    assert!(!sim.world().contains(&EntityId::from("lost")));
}

/// Test: duplicate entity ids are rejected without touching engines.
#[test]
fn duplicate_entity_is_rejected() {
    let mut sim = single(&drifting());
    sim.add_entity(sphere("dup", Point3::origin())).expect("first");
    let err = sim
        .add_entity(sphere("dup", Point3::new(1.0, 0.0, 0.0)))
        .expect_err("second");
    assert!(matches!(err, SimError::DuplicateEntity { .. }));
    assert_eq!(model_count(&sim, "main"), 1);
}

/// Test: an entity can be simulated by several engines, and removal clears
/// every model synchronously.
#[test]
fn add_entity_to_many_and_remove() {
    let registry = registry();
    let mut sim = Simulation::new();
    for id in ["physics", "shadow"] {
        sim.add_engine(
            Box::new(RigidEngine::<YUpLeftHanded>::new(id, Arc::clone(&registry))),
            &drifting(),
        )
        .expect("engine");
    }
    let id = EntityId::from("twin");
    sim.add_entity_to(
        sphere("twin", Point3::origin()),
        &[EngineId::from("physics"), EngineId::from("shadow")],
    )
    .expect("add");

    let body = sim.world().get(&id).expect("entity").body().expect("body");
    assert_eq!(body.physics_models().len(), 2);

    let removed = sim.remove_entity(&id).expect("remove");
    assert!(removed.body().expect("body").physics_models().is_empty());
    assert_eq!((model_count(&sim, "physics"), model_count(&sim, "shadow")), (0, 0));
    assert!(sim.world().is_empty());
    assert!(matches!(sim.remove_entity(&id), Err(SimError::EntityNotFound { .. })));
}

/// Test: a failing engine in `add_entity_to` rolls back earlier models.
#[test]
fn add_entity_to_rolls_back_on_failure() {
    let mut left_only = OperationRegistry::new();
    register_operations::<YUpLeftHanded>(&mut left_only).expect("register");
    let left_only = left_only.into_shared();

    let mut sim = Simulation::new();
    sim.add_engine(
        Box::new(RigidEngine::<YUpLeftHanded>::new("ok", Arc::clone(&left_only))),
        &drifting(),
    )
    .expect("ok");
    sim.add_engine(Box::new(RigidEngine::<Canonical>::new("no", left_only)), &drifting())
        .expect("no");

    let err = sim
        .add_entity_to(
            sphere("s", Point3::origin()),
            &[EngineId::from("ok"), EngineId::from("no")],
        )
        .expect_err("second engine cannot simulate spheres");
    assert!(err.is_dispatch_error());
    assert_eq!((model_count(&sim, "ok"), model_count(&sim, "no")), (0, 0));
    assert!(sim.world().is_empty());
}

/// Test: engine configuration errors and duplicate ids are rejected.
#[test]
fn add_engine_rejects_bad_config_and_duplicate_id() {
    let mut sim = single(&drifting());
    let err = sim
        .add_engine(
            Box::new(RigidEngine::<YUpLeftHanded>::new("bad", registry())),
            &EngineConfig::default().with_timestep(0.0),
        )
        .expect_err("bad timestep");
    assert!(err.is_config_error());
    assert!(sim.engine(&EngineId::from("bad")).is_none());

    let err = sim
        .add_engine(
            Box::new(RigidEngine::<YUpLeftHanded>::new("main", registry())),
            &drifting(),
        )
        .expect_err("duplicate id");
    assert!(err.is_config_error());
    assert_eq!(sim.engines().count(), 1);
}

/// Test: commands queued between steps apply at the start of the next step.
#[test]
fn queued_commands_apply_on_next_step() {
    let mut sim = single(&drifting());
    sim.commands().add_entity(sphere("later", Point3::new(1.0, 0.0, 0.0)));
    assert_eq!(model_count(&sim, "main"), 0);
    assert!(sim.world().is_empty());

    let report = sim.step().expect("step");
    assert!(report.command_failures.is_empty());
    assert_eq!(model_count(&sim, "main"), 1);

    sim.commands().remove_entity("later");
    sim.commands().remove_entity("never-existed");
    let report = sim.step().expect("step");
    assert_eq!(report.command_failures.len(), 1);
    assert!(report.command_failures[0].is_dispatch_error());
    assert_eq!(model_count(&sim, "main"), 0);
}

/// Test: world poses follow the engines after each step.
#[test]
fn step_writes_poses_back_to_world() {
    let mut sim = single(&EngineConfig::default().with_ground_plane(false));
    let id = EntityId::from("falling");
    sim.add_entity(sphere("falling", Point3::new(0.0, 0.0, 10.0))).expect("add");
    sim.step().expect("step");

    let pose = sim.pose(&id).expect("pose");
    assert_relative_eq!(pose.position.z, 10.0 - 9.81 * 0.01 * 10.0 / 16.0, epsilon = 1e-12);
    let velocity = sim.world().get(&id).expect("entity").body().expect("body").velocity().linear;
    assert_relative_eq!(velocity.z, -0.981, epsilon = 1e-12);
}

/// Test: reset restores creation poses, velocities, the tick count and the
/// engine each entity started in, so the restarted run repeats the first.
#[test]
fn reset_restores_creation_state() {
    let mut sim = partitioned::<YUpLeftHanded>(TransferTrigger::EveryTick);
    let id = EntityId::from("mover");
    sim.add_entity(moving_box("mover", Point3::new(4.0, 0.0, 0.0), Vector3::new(10.0, 0.0, 0.0)))
        .expect("add");
    let run = |sim: &mut Simulation| -> Vec<(f64, usize, usize)> {
        (0..3)
            .map(|_| {
                sim.step().expect("step");
                let x = sim.pose(&id).expect("pose").position.x;
                (x, model_count(sim, "a"), model_count(sim, "b"))
            })
            .collect()
    };

    let first = run(&mut sim);
    assert_eq!(first.last().map(|&(_, a, b)| (a, b)), Some((0, 1)));
    sim.commands().remove_entity("mover");

    sim.reset().expect("reset");
    assert_eq!(sim.tick(), 0);
    assert!(sim.commands().is_empty());
    assert_eq!(sim.pose(&id).map(|p| p.position), Some(Point3::new(4.0, 0.0, 0.0)));
    assert_eq!((model_count(&sim, "a"), model_count(&sim, "b")), (1, 0));
    let a = sim.engine(&EngineId::from("a")).expect("a");
    assert_eq!(a.model_pose(&id).map(|p| p.position), Some(Point3::new(4.0, 0.0, 0.0)));
    assert_eq!(a.model_twist(&id).map(|t| t.linear), Some(Vector3::new(10.0, 0.0, 0.0)));
    assert_relative_eq!(sim.engine(&EngineId::from("b")).expect("b").time(), 0.0);
    let body = sim.world().get(&id).expect("entity").body().expect("body");
    assert_eq!(body.physics_models(), &[EngineId::from("a")]);

    assert_eq!(run(&mut sim), first);
}

/// Test: removal is all or nothing when one engine cannot remove the entity.
#[test]
fn remove_entity_is_atomic_when_an_engine_refuses() {
    let kind = EntityKind::from_static("crate");
    let mut full = OperationRegistry::new();
    register_kind::<YUpLeftHanded>(&mut full, kind.clone()).expect("register");
    let mut add_only = OperationRegistry::new();
    add_only
        .register(
            ActionTag::ADD,
            kind.clone(),
            |engine: &mut RigidEngine<YUpLeftHanded>, entity: &mut Entity| {
                let model = engine.create_model(entity)?;
                engine.add_physics_model(model)
            },
        )
        .expect("register add");

    let mut sim = Simulation::new();
    sim.add_engine(
        Box::new(RigidEngine::<YUpLeftHanded>::new("physics", full.into_shared())),
        &drifting(),
    )
    .expect("physics");
    sim.add_engine(
        Box::new(RigidEngine::<YUpLeftHanded>::new("keeper", add_only.into_shared())),
        &drifting(),
    )
    .expect("keeper");

    let id = EntityId::from("crate0");
    let entity = Entity::embodied(
        "crate0",
        kind,
        Pose::from_position(Point3::new(3.0, 0.0, 0.0)),
        Shape::cuboid(Vector3::repeat(0.5)),
    );
    sim.add_entity_to(entity, &[EngineId::from("physics"), EngineId::from("keeper")])
        .expect("add");

    let err = sim.remove_entity(&id).expect_err("keeper cannot remove crates");
    assert!(matches!(err, SimError::UnsupportedOperation { .. }));
    assert!(sim.world().contains(&id));
    assert_eq!((model_count(&sim, "physics"), model_count(&sim, "keeper")), (1, 1));
    let body = sim.world().get(&id).expect("entity").body().expect("body");
    assert_eq!(body.physics_models(), &[EngineId::from("physics")]);

    let ray = Ray3::new(Point3::origin(), Vector3::x()).expect("ray");
    let hit = sim.check_intersection_with_ray(&ray).expect("hit");
    assert_eq!(hit.entity, id);
    assert_relative_eq!(hit.distance, 2.5, epsilon = 1e-12);
}

/// Test: a fatal queued command aborts the step and the commands behind it
/// stay queued for the next one.
#[test]
fn fatal_command_leaves_later_commands_queued() {
    let mut sim = single(&drifting());
    sim.commands()
        .add_entity_to(sphere("stray", Point3::origin()), [EngineId::from("missing")]);
    sim.commands().add_entity(sphere("kept", Point3::new(1.0, 0.0, 0.0)));
    sim.commands().remove_entity("never-existed");

    let err = sim.step().expect_err("unknown engine is fatal");
    assert!(matches!(err, SimError::UnknownEngine { .. }));
    assert_eq!(sim.commands().len(), 2);
    assert_eq!(sim.tick(), 0);
    assert_eq!(model_count(&sim, "main"), 0);

    let report = sim.step().expect("step");
    assert_eq!(report.command_failures.len(), 1);
    assert_eq!(model_count(&sim, "main"), 1);
    assert!(sim.world().contains(&EntityId::from("kept")));
}

/// Test: destroy tears everything down; stepping afterwards is fatal.
#[test]
fn destroy_then_step_is_fatal() {
    let mut sim = partitioned::<YUpLeftHanded>(TransferTrigger::EveryTick);
    sim.add_entity(sphere("s", Point3::new(1.0, 0.0, 0.0))).expect("add");
    sim.destroy().expect("destroy");

    assert!(sim.engines().all(|engine| engine.state() == EngineState::Destroyed));
    assert!(sim.engines().all(|engine| engine.model_count() == 0));
    let body = sim.world().get(&EntityId::from("s")).expect("entity").body().expect("body");
    assert!(body.physics_models().is_empty());

    let err = sim.step().expect_err("step after destroy");
    assert!(err.is_fatal());
    assert!(sim.destroy().is_err());
}

/// Test: visualizer controls only advance while playing.
#[test]
fn play_pause_controls_advance() {
    let mut sim = single(&drifting());
    assert!(!sim.is_playing());
    assert!(sim.advance().expect("paused").is_none());

    sim.play();
    for expected in 1..=3 {
        let report = sim.advance().expect("advance").expect("playing");
        assert_eq!(report.tick, expected);
    }
    sim.pause();
    assert!(sim.advance().expect("paused").is_none());
    sim.step().expect("single step while paused");
    assert_eq!(sim.tick(), 4);
}

/// Test: picking searches every engine for the nearest hit.
#[test]
fn picking_spans_engines() {
    let mut sim = partitioned::<YUpLeftHanded>(TransferTrigger::EveryTick);
    sim.add_entity(sphere("near", Point3::new(3.0, 0.0, 0.0))).expect("near");
    sim.add_entity(sphere("far", Point3::new(8.0, 0.0, 0.0))).expect("far");

    let east = Ray3::new(Point3::new(0.0, 0.0, 0.0), Vector3::x()).expect("ray");
    let hit = sim.check_intersection_with_ray(&east).expect("hit");
    assert_eq!(hit.entity, EntityId::from("near"));
    assert_relative_eq!(hit.distance, 2.0, epsilon = 1e-12);

    let west = Ray3::new(Point3::new(10.0, 0.0, 0.0), -Vector3::x()).expect("ray");
    let hit = sim.check_intersection_with_ray(&west).expect("hit");
    assert_eq!(hit.entity, EntityId::from("far"));
    assert_relative_eq!(hit.distance, 1.0, epsilon = 1e-12);

    let up = Ray3::new(Point3::new(0.0, 5.0, 0.0), Vector3::z()).expect("ray");
    assert!(sim.check_intersection_with_ray(&up).is_none());
}

/// Test: entity enumeration lists every entity in id order.
#[test]
fn entities_are_enumerated() {
    let mut sim = partitioned::<Canonical>(TransferTrigger::EveryTick);
    for (id, x) in [("c", 1.0), ("a", 6.0), ("b", 2.0)] {
        sim.add_entity(sphere(id, Point3::new(x, 0.0, 0.0))).expect("add");
    }
    let ids: Vec<&str> = sim.entities().map(|e| e.id().as_str()).collect();
    assert_eq!(ids, vec!["a", "b", "c"]);
    assert_eq!(
        sim.engines_containing(Point3::new(5.0, 0.0, 0.0)).count(),
        2,
        "the shared face belongs to both volumes"
    );
}
