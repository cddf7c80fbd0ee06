use bevy::prelude::*;

use kestrel::math::FixedNum;
use kestrel::nav::{NavLayer, NavMesh, NavMeshPlugin, NavGenError};
use kestrel::terrain::{HeightField, MarkerRegistry, ResourceMarker};

fn hilly_map(size: usize) -> HeightField {
    let mut field = HeightField::flat(size, 24.0);
    field.fill_terrain(size / 4, size / 4, size / 2, size / 2, 32.0);
    field.fill_terrain(0, size * 3 / 4, size, size, 14.0);
    field.set_water_level(20.0);
    field
}

#[test]
fn test_generate_through_public_api() {
    let field = hilly_map(128);
    let mut registry = MarkerRegistry::default();
    registry.mass.push(ResourceMarker::at(10.5, 10.5));

    let mut mesh = NavMesh::default();
    assert!(!mesh.is_generated());
    mesh.generate(&field, &mut registry).expect("map is valid");
    assert!(mesh.is_generated());

    // Every layer produced a full forest.
    for layer in NavLayer::ALL {
        let grid = mesh.grid(layer);
        assert_eq!(grid.map_size(), 128);
        assert!(grid.leaves().count() > 0);
        let data = mesh.layer_data(layer);
        assert!(data.pathable_leafs + data.unpathable_leafs > 0);
    }

    // Point lookup on the public surface.
    let grid = mesh.grid(NavLayer::Land);
    let idx = grid
        .find_leaf_xz(FixedNum::from_num(10.5), FixedNum::from_num(10.5))
        .expect("point inside the map");
    let leaf = grid.leaf(idx).unwrap();
    assert!(leaf.label > 0);
    assert!(leaf.px > FixedNum::ZERO && leaf.pz > FixedNum::ZERO);

    // The mass marker ended up bound to that component.
    assert_eq!(registry.mass[0].nav_label, Some(leaf.label));
}

#[test]
fn test_invalid_map_sizes_are_rejected() {
    let mut mesh = NavMesh::default();
    let mut registry = MarkerRegistry::default();

    // Not a multiple of the block grid.
    let odd = HeightField::flat(100, 10.0);
    assert_eq!(
        mesh.generate(&odd, &mut registry),
        Err(NavGenError::InvalidMapSize(100))
    );

    // Multiple of 16, but the block side 3 is not divisible by the threshold.
    let narrow = HeightField::flat(48, 10.0);
    assert_eq!(
        mesh.generate(&narrow, &mut registry),
        Err(NavGenError::UnalignedThreshold { threshold: 2, block_size: 3 })
    );

    assert!(!mesh.is_generated());
}

#[test]
fn test_failed_generate_keeps_previous_mesh() {
    let mut mesh = NavMesh::default();
    let mut registry = MarkerRegistry::default();

    mesh.generate(&hilly_map(64), &mut registry).unwrap();
    let leaves_before = mesh.grid(NavLayer::Land).leaves().count();
    let labels_before = mesh.labels.len();

    let bad = HeightField::flat(100, 10.0);
    assert!(mesh.generate(&bad, &mut registry).is_err());

    // The previous mesh is still there untouched.
    assert!(mesh.is_generated());
    assert_eq!(mesh.grid(NavLayer::Land).leaves().count(), leaves_before);
    assert_eq!(mesh.labels.len(), labels_before);
}

#[test]
fn test_regenerate_replaces_previous_mesh() {
    let mut mesh = NavMesh::default();
    let mut registry = MarkerRegistry::default();

    mesh.generate(&hilly_map(128), &mut registry).unwrap();
    let first_size = mesh.grid(NavLayer::Land).map_size();

    mesh.generate(&HeightField::flat(64, 10.0), &mut registry).unwrap();
    assert_ne!(mesh.grid(NavLayer::Land).map_size(), first_size);
    assert_eq!(mesh.grid(NavLayer::Land).map_size(), 64);
    // Flat map: exactly one Land component, no water.
    assert_eq!(mesh.layer_data(NavLayer::Land).labels, 1);
    assert_eq!(mesh.layer_data(NavLayer::Water).labels, 0);
}

#[test]
fn test_plugin_registers_resources_and_runs() {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins);
    app.add_plugins(AssetPlugin::default());
    app.add_plugins(bevy::gizmos::GizmoPlugin);
    app.add_plugins(NavMeshPlugin);

    app.update();

    assert!(app.world().contains_resource::<NavMesh>());
    assert!(app.world().contains_resource::<MarkerRegistry>());

    // Generate inside the app, the way the scenario loader does it.
    let field = hilly_map(64);
    app.world_mut()
        .resource_scope(|world, mut mesh: Mut<NavMesh>| {
            let mut registry = world.resource_mut::<MarkerRegistry>();
            mesh.generate(&field, &mut registry).expect("valid map");
        });
    app.update();

    let mesh = app.world().resource::<NavMesh>();
    assert!(mesh.is_generated());
}

#[test]
fn test_identifiers_are_deterministic_across_runs() {
    let field = hilly_map(128);
    let mut registry = MarkerRegistry::default();

    let mut first = NavMesh::default();
    first.generate(&field, &mut registry).unwrap();
    let mut second = NavMesh::default();
    second.generate(&field, &mut registry).unwrap();

    for layer in NavLayer::ALL {
        let a = first.grid(layer);
        let b = second.grid(layer);
        let ids_a: Vec<u32> = a.leaves().map(|i| a.node(i).identifier).collect();
        let ids_b: Vec<u32> = b.leaves().map(|i| b.node(i).identifier).collect();
        assert_eq!(ids_a, ids_b, "layer {} identifiers must be reproducible", layer);
    }
}
