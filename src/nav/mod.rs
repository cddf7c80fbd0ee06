//! Multi-layer navigation mesh construction.
//!
//! Each movement layer (Land, Water, Hover, Amphibious, Air) gets its own
//! quadtree forest over the heightmap, a neighbour graph between the leaves,
//! and connected-component labels. Pathfinding and the economy AI locate the
//! leaf under a world point, read its label and walk the graph from there.

mod culling;
mod debug;
mod generate;
mod grid;
mod labels;
mod markers;
mod neighbors;
mod precompute;
mod raster;
mod tree;
mod types;


// ============================================================================
// PUBLIC API
// ============================================================================

pub use debug::{draw_leaf, label_color, layer_color, NavDebugConfig};
pub use generate::{NavGenError, NavMesh};
pub use grid::NavGrid;
pub use tree::{NavLeaf, NavNode, NodeKind};
pub use types::{
    compression_threshold, NavEdge, NavLabelMetadata, NavLayer, NavLayerData, NodeIdx, AREA_SCALE,
    BLOCKS_PER_AXIS, CULL_AREA_THRESHOLD, LABEL_IMPASSABLE, LABEL_UNASSIGNED, MAX_HEIGHT_DIFF,
    MAX_WATER_DEPTH_AMPHIBIOUS, MIN_WATER_DEPTH_NAVAL,
};

use bevy::prelude::*;

use crate::terrain::MarkerRegistry;

/// Registers the mesh, the marker registry and the debug overlay.
///
/// Generation itself is driven by the scenario loader calling
/// [`NavMesh::generate`] once terrain is available; there is no system for it
/// because it is a one-shot synchronous job, not per-frame work.
pub struct NavMeshPlugin;

impl Plugin for NavMeshPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<NavMesh>();
        app.init_resource::<MarkerRegistry>();
        app.init_resource::<NavDebugConfig>();
        app.add_systems(Update, debug::draw_navmesh_gizmos);
    }
}
