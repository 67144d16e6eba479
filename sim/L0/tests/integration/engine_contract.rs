//! Engine contract of the rigid backend, exercised through `dyn PhysicsEngine`.

use approx::assert_relative_eq;
use sim_physics::prelude::*;

use crate::fixtures::{drifting, registry, slab, sphere};

fn engines() -> Vec<Box<dyn PhysicsEngine>> {
    let registry = registry();
    let mut left: Box<dyn PhysicsEngine> =
        Box::new(RigidEngine::<YUpLeftHanded>::new("left", registry.clone()));
    let mut canonical: Box<dyn PhysicsEngine> =
        Box::new(RigidEngine::<Canonical>::new("canonical", registry));
    left.init(&drifting()).expect("init left");
    canonical.init(&drifting()).expect("init canonical");
    vec![left, canonical]
}

/// Test: add followed by remove restores the model count.
#[test]
fn add_then_remove_restores_model_count() {
    for mut engine in engines() {
        let mut resident = sphere("resident", Point3::new(-3.0, 0.0, 0.0));
        engine.add_entity(&mut resident).expect("add resident");
        let before = engine.model_count();

        let mut visitor = sphere("visitor", Point3::new(1.0, 1.0, 1.0));
        engine.add_entity(&mut visitor).expect("add");
        assert_eq!(engine.model_count(), before + 1);
        engine.remove_entity(&mut visitor).expect("remove");

        assert_eq!(engine.model_count(), before, "engine {}", engine.id());
        assert!(!engine.contains_model(visitor.id()));
        assert_eq!(engine.entity_ids(), vec![EntityId::from("resident")]);
    }
}

/// Test: removing an entity twice reports an error and leaves the map alone.
#[test]
fn double_remove_reports_and_keeps_map() {
    for mut engine in engines() {
        let mut keep = sphere("keep", Point3::origin());
        let mut gone = sphere("gone", Point3::new(3.0, 0.0, 0.0));
        engine.add_entity(&mut keep).expect("add keep");
        engine.add_entity(&mut gone).expect("add gone");
        engine.remove_entity(&mut gone).expect("first remove");

        let ids_before = engine.entity_ids();
        let err = engine.remove_entity(&mut gone).expect_err("second remove");
        assert!(matches!(err, SimError::ModelNotFound { .. }));
        assert_eq!(engine.entity_ids(), ids_before);
        assert_eq!(engine.model_pose(keep.id()).map(|p| p.position), Some(Point3::origin()));
    }
}

/// Test: ray against an empty engine is "no hit", not an error.
#[test]
fn ray_on_empty_engine_is_no_hit() {
    let ray = Ray3::new(Point3::origin(), Vector3::x()).expect("ray");
    for engine in engines() {
        assert!(engine.check_intersection_with_ray(&ray).is_none());
    }
}

/// Test: ray (0,0,0)→+x against a unit sphere at (5,0,0) hits at distance 4.
#[test]
fn ray_hits_sphere_at_analytic_distance() {
    let ray = Ray3::new(Point3::origin(), Vector3::x()).expect("ray");
    for mut engine in engines() {
        let mut target = sphere("target", Point3::new(5.0, 0.0, 0.0));
        engine.add_entity(&mut target).expect("add");

        let hit = engine.check_intersection_with_ray(&ray).expect("hit");
        assert_eq!(hit.entity, EntityId::from("target"));
        assert_relative_eq!(hit.distance, 4.0, epsilon = 1e-12);
        assert_relative_eq!(hit.point, Point3::new(4.0, 0.0, 0.0), epsilon = 1e-12);
    }
}

/// Test: the nearer of two spheres wins; equal distances go to the first added.
#[test]
fn ray_returns_nearest_with_insertion_tie_break() {
    let ray = Ray3::new(Point3::new(0.0, 0.0, 0.0), Vector3::x()).expect("ray");
    for mut engine in engines() {
        let mut far = sphere("far", Point3::new(9.0, 0.0, 0.0));
        let mut first = sphere("first", Point3::new(5.0, 0.0, 0.0));
        let mut twin = sphere("twin", Point3::new(5.0, 0.0, 0.0));
        for entity in [&mut far, &mut first, &mut twin] {
            engine.add_entity(entity).expect("add");
        }
        let hit = engine.check_intersection_with_ray(&ray).expect("hit");
        assert_eq!(hit.entity, EntityId::from("first"));
    }
}

/// Test: a ray that stops short of the geometry misses.
#[test]
fn ray_max_distance_is_respected() {
    let ray = Ray3::new(Point3::origin(), Vector3::x())
        .expect("ray")
        .with_max_distance(3.5);
    for mut engine in engines() {
        engine
            .add_entity(&mut sphere("target", Point3::new(5.0, 0.0, 0.0)))
            .expect("add");
        assert!(engine.check_intersection_with_ray(&ray).is_none());
    }
}

/// Test: box volume [0,10]³ contains (5,5,5) and not (15,5,5).
#[test]
fn box_volume_containment() {
    let bounds = Aabb::new(Point3::origin(), Point3::new(10.0, 10.0, 10.0));
    let mut engine = RigidEngine::<YUpLeftHanded>::new("box", registry());
    engine.init(&drifting().with_bounds(bounds)).expect("init");

    assert!(engine.is_point_contained(&Point3::new(5.0, 5.0, 5.0)));
    assert!(!engine.is_point_contained(&Point3::new(15.0, 5.0, 5.0)));
}

/// Test: an entity leaving the volume is flagged for transfer.
#[test]
fn leaving_volume_flags_transfer() {
    let mut engine = RigidEngine::<YUpLeftHanded>::new("a", registry());
    engine.init(&drifting().with_bounds(slab(0.0, 5.0))).expect("init");
    let mut entity = crate::fixtures::moving_box("mover", Point3::new(4.5, 0.0, 0.0), Vector3::new(10.0, 0.0, 0.0));
    engine.add_entity(&mut entity).expect("add");
    assert!(!engine.is_entity_transfer_needed());

    engine.update().expect("update");
    assert!(engine.is_entity_transfer_needed());
    assert_eq!(engine.transfer_candidates(), vec![EntityId::from("mover")]);
}

/// Test: bad parameters fail init with a configuration error naming the
/// engine and parameter.
#[test]
fn invalid_config_is_reported_with_engine_and_parameter() {
    let cases = [
        (EngineConfig::default().with_iterations(0), "iterations"),
        (EngineConfig::default().with_timestep(-0.1), "timestep"),
        (
            EngineConfig::default().with_gravity(Vector3::new(0.0, f64::NAN, 0.0)),
            "gravity",
        ),
        (
            EngineConfig::default().with_bounds(Aabb::new(Point3::new(1.0, 0.0, 0.0), Point3::origin())),
            "bounds",
        ),
        (
            EngineConfig::default().with_material(MaterialConfig {
                restitution: 1.5,
                ..MaterialConfig::default()
            }),
            "material.restitution",
        ),
    ];

    for (config, expected) in cases {
        let mut engine = RigidEngine::<YUpLeftHanded>::new("cfg", registry());
        let err = engine.init(&config).expect_err("invalid config");
        assert_eq!(err.category(), ErrorCategory::Configuration);
        match err {
            SimError::InvalidConfig { engine: name, parameter, .. } => {
                assert_eq!(name, "cfg");
                assert_eq!(parameter, expected);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(engine.state(), EngineState::Uninitialized);
        engine.destroy().expect("cleanup after failed init");
    }
}

/// Test: lifecycle misuse is a fatal state error.
#[test]
fn lifecycle_misuse_is_fatal() {
    let mut engine = RigidEngine::<YUpLeftHanded>::new("life", registry());
    for err in [engine.update().expect_err("update"), engine.reset().expect_err("reset")] {
        assert_eq!(err.category(), ErrorCategory::StateMisuse);
        assert!(err.is_fatal());
    }

    engine.init(&drifting()).expect("init");
    assert_eq!(engine.state(), EngineState::Initialized);
    engine.update().expect("update");
    assert_eq!(engine.state(), EngineState::Running);
    engine.reset().expect("reset");
    assert_eq!(engine.state(), EngineState::Initialized);
    engine.destroy().expect("destroy");

    assert!(engine.update().is_err());
    assert!(engine.add_entity(&mut sphere("late", Point3::origin())).is_err());
    assert!(engine.destroy().is_err());
}

/// Test: the same scene evolves identically in every native convention.
#[test]
fn conventions_agree_on_trajectories() {
    fn trajectory<S: SpaceTransform>() -> Vec<Pose> {
        let mut engine = RigidEngine::<S>::new("e", registry_for::<S>());
        engine.init(&EngineConfig::default()).expect("init");
        let pose = Pose::new(
            Point3::new(0.5, -1.0, 4.0),
            UnitQuaternion::from_euler_angles(0.3, -0.2, 0.9),
        );
        let mut entity = Entity::new("tumbler", EntityKind::CAPSULE, pose).with_component(
            sim_core::BODY,
            EmbodiedComponent::new(Shape::capsule(0.4, 0.2), pose).with_velocity(Twist::new(
                Vector3::new(1.0, 0.5, 0.0),
                Vector3::new(0.2, -0.4, 1.5),
            )),
        );
        engine.add_entity(&mut entity).expect("add");
        (0..40)
            .map(|_| {
                engine.update().expect("update");
                engine.model_pose(entity.id()).expect("pose")
            })
            .collect()
    }

    fn registry_for<S: SpaceTransform>() -> std::sync::Arc<OperationRegistry> {
        let mut registry = OperationRegistry::new();
        register_operations::<S>(&mut registry).expect("register");
        registry.into_shared()
    }

    let canonical = trajectory::<Canonical>();
    for other in [trajectory::<YUpLeftHanded>(), trajectory::<YUpRightHanded>()] {
        for (a, b) in canonical.iter().zip(&other) {
            assert_relative_eq!(a.position, b.position, epsilon = 1e-9);
            assert_relative_eq!(a.orientation, b.orientation, epsilon = 1e-9);
        }
    }
}
