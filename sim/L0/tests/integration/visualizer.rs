//! A visualizer plugin sharing the operation registry with a physics backend.
//!
//! The renderer is just another host type: it registers draw operations for
//! the kinds it can display, and reads poses through the driver.

use std::sync::Arc;

use sim_physics::prelude::*;

use crate::fixtures::{drifting, sphere};

/// Records draw calls instead of issuing them.
#[derive(Debug, Default)]
struct Renderer {
    calls: Vec<(ActionTag, String, Point3<f64>)>,
}

fn draw(action: ActionTag) -> impl Fn(&mut Renderer, &mut Entity) -> sim_types::Result<()> {
    move |renderer: &mut Renderer, entity: &mut Entity| {
        renderer
            .calls
            .push((action, entity.id().to_string(), entity.position()));
        Ok(())
    }
}

fn shared_registry() -> Arc<OperationRegistry> {
    let mut registry = OperationRegistry::new();
    register_operations::<YUpLeftHanded>(&mut registry).expect("physics operations");
    for kind in [EntityKind::SPHERE, EntityKind::BOX] {
        registry
            .register(ActionTag::DRAW_NORMAL, kind.clone(), draw(ActionTag::DRAW_NORMAL))
            .expect("draw normal");
        registry
            .register(ActionTag::DRAW_SELECTED, kind, draw(ActionTag::DRAW_SELECTED))
            .expect("draw selected");
    }
    registry.into_shared()
}

/// Test: physics and rendering operations coexist for the same kind.
#[test]
fn hosts_resolve_independently() {
    let registry = shared_registry();
    assert!(registry.supports::<RigidEngine<YUpLeftHanded>>(ActionTag::ADD, &EntityKind::SPHERE));
    assert!(registry.supports::<Renderer>(ActionTag::DRAW_NORMAL, &EntityKind::SPHERE));
    assert!(!registry.supports::<Renderer>(ActionTag::ADD, &EntityKind::SPHERE));
    assert!(!registry.supports::<RigidEngine<YUpLeftHanded>>(
        ActionTag::DRAW_NORMAL,
        &EntityKind::SPHERE
    ));
    assert!(!registry.supports::<Renderer>(ActionTag::DRAW_NORMAL, &EntityKind::CAPSULE));
}

/// Test: click-to-select picks the entity under the cursor and draws it as
/// selected, everything else normally.
#[test]
fn pick_and_draw_selection() {
    let registry = shared_registry();
    let mut sim = Simulation::new();
    sim.add_engine(
        Box::new(RigidEngine::<YUpLeftHanded>::new("main", Arc::clone(&registry))),
        &drifting(),
    )
    .expect("engine");
    sim.add_entity(sphere("left", Point3::new(-3.0, 0.0, 0.0))).expect("left");
    sim.add_entity(sphere("right", Point3::new(3.0, 0.0, 0.0))).expect("right");
    sim.step().expect("step");

    let cursor = Ray3::new(Point3::new(3.0, -10.0, 0.0), Vector3::y()).expect("ray");
    let selected = sim
        .check_intersection_with_ray(&cursor)
        .expect("something under the cursor")
        .entity;
    assert_eq!(selected, EntityId::from("right"));

    // The renderer draws snapshots of the world entities.
    let mut renderer = Renderer::default();
    let mut snapshots: Vec<Entity> = sim
        .entities()
        .map(|e| Entity::new(e.id().clone(), e.kind().clone(), *e.pose()))
        .collect();
    for entity in &mut snapshots {
        let action = if *entity.id() == selected {
            ActionTag::DRAW_SELECTED
        } else {
            ActionTag::DRAW_NORMAL
        };
        registry.apply(action, &mut renderer, entity).expect("draw");
    }

    assert_eq!(
        renderer.calls,
        vec![
            (ActionTag::DRAW_NORMAL, "left".to_string(), Point3::new(-3.0, 0.0, 0.0)),
            (ActionTag::DRAW_SELECTED, "right".to_string(), Point3::new(3.0, 0.0, 0.0)),
        ]
    );
}

/// Test: a kind the renderer does not know is a reportable error.
#[test]
fn undrawable_kind_is_reported() {
    let registry = shared_registry();
    let mut renderer = Renderer::default();
    let mut capsule = Entity::new("pill", EntityKind::CAPSULE, Pose::identity());
    let err = registry
        .apply(ActionTag::DRAW_NORMAL, &mut renderer, &mut capsule)
        .expect_err("no capsule drawing");
    assert!(matches!(err, SimError::UnsupportedOperation { .. }));
    assert!(renderer.calls.is_empty());
}

/// Test: a frozen registry refuses late plugins.
#[test]
fn frozen_registry_refuses_late_registration() {
    let mut registry = OperationRegistry::new();
    registry.freeze();
    let err = registry
        .register(ActionTag::DRAW_NORMAL, EntityKind::SPHERE, draw(ActionTag::DRAW_NORMAL))
        .expect_err("frozen");
    assert!(matches!(err, SimError::RegistryFrozen { .. }));
    assert!(registry.is_empty());
}
