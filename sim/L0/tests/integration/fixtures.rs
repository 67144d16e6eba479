//! Shared setup for the integration tests.

use std::sync::Arc;

use sim_physics::prelude::*;

/// Registry with the rigid operations for the left-handed, right-handed and
/// canonical engines.
pub fn registry() -> Arc<OperationRegistry> {
    let mut registry = OperationRegistry::new();
    register_operations::<YUpLeftHanded>(&mut registry).expect("register left-handed");
    register_operations::<YUpRightHanded>(&mut registry).expect("register right-handed");
    register_operations::<Canonical>(&mut registry).expect("register canonical");
    registry.into_shared()
}

/// Config without gravity or ground, so bodies keep their velocity.
pub fn drifting() -> EngineConfig {
    EngineConfig::default().zero_gravity().with_ground_plane(false)
}

/// Volume `[min_x, max_x] × [-10, 10] × [-10, 10]`.
pub fn slab(min_x: f64, max_x: f64) -> Aabb {
    Aabb::new(Point3::new(min_x, -10.0, -10.0), Point3::new(max_x, 10.0, 10.0))
}

/// Unit sphere at `position`.
pub fn sphere(id: &str, position: Point3<f64>) -> Entity {
    Entity::embodied(id, EntityKind::SPHERE, Pose::from_position(position), Shape::sphere(1.0))
}

/// Small box at `position` moving with `velocity`.
pub fn moving_box(id: &str, position: Point3<f64>, velocity: Vector3<f64>) -> Entity {
    let pose = Pose::from_position(position);
    Entity::new(id, EntityKind::BOX, pose).with_component(
        sim_core::BODY,
        EmbodiedComponent::new(Shape::cuboid(Vector3::repeat(0.25)), pose)
            .with_velocity(Twist::linear(velocity)),
    )
}

/// Two engines splitting x at 5: `a` owns [0, 5], `b` owns [5, 10].
pub fn partitioned<S: SpaceTransform>(trigger: TransferTrigger) -> Simulation {
    let registry = registry();
    let mut sim = Simulation::with_config(SimulationConfig::default().with_transfer(trigger))
        .expect("simulation config");
    sim.add_engine(
        Box::new(RigidEngine::<S>::new("a", Arc::clone(&registry))),
        &drifting().with_bounds(slab(0.0, 5.0)),
    )
    .expect("engine a");
    sim.add_engine(
        Box::new(RigidEngine::<S>::new("b", registry)),
        &drifting().with_bounds(slab(5.0, 10.0)),
    )
    .expect("engine b");
    sim
}

/// Model count of engine `id`.
pub fn model_count(sim: &Simulation, id: &str) -> usize {
    sim.engine(&EngineId::from(id))
        .expect("engine exists")
        .model_count()
}
