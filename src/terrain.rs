//! Terrain oracle boundary.
//!
//! Mesh generation never reads the scenario or the renderer directly; it
//! samples terrain through [`TerrainSource`] and resolves resource markers
//! through [`MarkerRegistry`]. The engine-backed implementation lives with the
//! scenario loader; [`HeightField`] is a dense in-memory implementation used
//! by the stats binary, the editor path and the test suite.

use bevy::prelude::*;
use fixedbitset::FixedBitSet;
use serde::{Deserialize, Serialize};

use crate::math::FixedVec3;
use crate::nav::NavLayer;

/// Terrain classification for one cell, as authored in the map's type raster.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerrainType {
    /// Cells flagged blocking are impassable on every layer except Air.
    pub blocking: bool,
}

/// Read-only sampling interface over the loaded map.
///
/// Heights are sampled at integer corners, the type raster per cell. Queries
/// outside the map are legal; implementations answer them with a blocking
/// type and non-finite heights, and the raster builder treats both as
/// impassable.
pub trait TerrainSource {
    /// Side length of the indexable grid, in cells.
    fn map_size(&self) -> usize;

    /// Ground elevation at corner `(x, z)`.
    fn terrain_height(&self, x: i32, z: i32) -> f32;

    /// Water surface elevation at corner `(x, z)`. Never below the ground;
    /// the difference to [`Self::terrain_height`] is the water depth.
    fn surface_height(&self, x: i32, z: i32) -> f32;

    /// Type raster entry for cell `(x, z)`.
    fn terrain_type(&self, x: i32, z: i32) -> TerrainType;
}

/// Dense heightmap with a per-cell blocking mask.
///
/// Corner heights are stored on a `(size + 1)²` lattice so that every cell
/// has all four of its corners in range.
#[derive(Clone, Debug, Default)]
pub struct HeightField {
    size: usize,
    terrain: Vec<f32>,
    surface: Vec<f32>,
    blocking: FixedBitSet,
}

impl HeightField {
    /// A level map of the given side length, entirely above water.
    pub fn flat(size: usize, height: f32) -> Self {
        let corners = (size + 1) * (size + 1);
        Self {
            size,
            terrain: vec![height; corners],
            surface: vec![height; corners],
            blocking: FixedBitSet::with_capacity(size * size),
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    fn corner_index(&self, x: usize, z: usize) -> usize {
        z * (self.size + 1) + x
    }

    /// Set ground elevation over the inclusive corner range
    /// `[x0, x1] × [z0, z1]`. Edited corners come out dry; flood with
    /// [`HeightField::set_water_level`] afterwards.
    pub fn fill_terrain(&mut self, x0: usize, z0: usize, x1: usize, z1: usize, height: f32) {
        for z in z0..=z1.min(self.size) {
            for x in x0..=x1.min(self.size) {
                let i = self.corner_index(x, z);
                self.terrain[i] = height;
                self.surface[i] = height;
            }
        }
    }

    /// Flood the map with water up to `level`. The surface never drops below
    /// the ground, so dry terrain is unaffected. Call after terrain edits.
    pub fn set_water_level(&mut self, level: f32) {
        for (surface, &terrain) in self.surface.iter_mut().zip(self.terrain.iter()) {
            *surface = terrain.max(level);
        }
    }

    /// Mark the inclusive cell range `[x0, x1] × [z0, z1]` as blocking.
    pub fn set_blocking(&mut self, x0: usize, z0: usize, x1: usize, z1: usize) {
        for z in z0..=z1.min(self.size - 1) {
            for x in x0..=x1.min(self.size - 1) {
                self.blocking.insert(z * self.size + x);
            }
        }
    }
}

impl TerrainSource for HeightField {
    fn map_size(&self) -> usize {
        self.size
    }

    fn terrain_height(&self, x: i32, z: i32) -> f32 {
        if x < 0 || z < 0 || x > self.size as i32 || z > self.size as i32 {
            return f32::NAN;
        }
        self.terrain[self.corner_index(x as usize, z as usize)]
    }

    fn surface_height(&self, x: i32, z: i32) -> f32 {
        if x < 0 || z < 0 || x > self.size as i32 || z > self.size as i32 {
            return f32::NAN;
        }
        self.surface[self.corner_index(x as usize, z as usize)]
    }

    fn terrain_type(&self, x: i32, z: i32) -> TerrainType {
        if x < 0 || z < 0 || x >= self.size as i32 || z >= self.size as i32 {
            return TerrainType { blocking: true };
        }
        TerrainType {
            blocking: self.blocking.contains(z as usize * self.size + x as usize),
        }
    }
}

// ============================================================================
// Map Description (RON-authored)
// ============================================================================

/// Axis-aligned terrain edit used by [`MapDescription`]. Coordinates are
/// inclusive corner (or cell, for blockers) ranges.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TerrainPatch {
    pub x0: usize,
    pub z0: usize,
    pub x1: usize,
    pub z1: usize,
    #[serde(default)]
    pub height: f32,
}

/// Declarative map layout, deserialized from RON by the stats binary.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MapDescription {
    pub size: usize,
    pub base_height: f32,
    #[serde(default)]
    pub water_elevation: Option<f32>,
    #[serde(default)]
    pub patches: Vec<TerrainPatch>,
    #[serde(default)]
    pub blockers: Vec<TerrainPatch>,
    #[serde(default)]
    pub mass_points: Vec<(f32, f32)>,
    #[serde(default)]
    pub hydrocarbon_points: Vec<(f32, f32)>,
}

impl MapDescription {
    pub fn build(&self) -> HeightField {
        let mut field = HeightField::flat(self.size, self.base_height);
        for patch in &self.patches {
            field.fill_terrain(patch.x0, patch.z0, patch.x1, patch.z1, patch.height);
        }
        if let Some(level) = self.water_elevation {
            field.set_water_level(level);
        }
        for blocker in &self.blockers {
            field.set_blocking(blocker.x0, blocker.z0, blocker.x1, blocker.z1);
        }
        field
    }

    pub fn markers(&self) -> MarkerRegistry {
        let mut registry = MarkerRegistry::default();
        for &(x, z) in &self.mass_points {
            registry.mass.push(ResourceMarker::at(x, z));
        }
        for &(x, z) in &self.hydrocarbon_points {
            registry.hydrocarbons.push(ResourceMarker::at(x, z));
        }
        registry
    }
}

// ============================================================================
// Resource Markers
// ============================================================================

/// Which kind of economy resource a marker provides.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarkerKind {
    Mass,
    Hydrocarbon,
}

/// A mass or hydrocarbon deposit placed by the map author.
///
/// `nav_label` and `nav_layer` start empty and are filled in by the marker
/// binder once the mesh is labelled, so AI consumers can reach the deposit's
/// connected component in O(1).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ResourceMarker {
    pub position: FixedVec3,
    pub nav_label: Option<i32>,
    pub nav_layer: Option<NavLayer>,
}

impl ResourceMarker {
    pub fn at(x: f32, z: f32) -> Self {
        Self {
            position: FixedVec3::from_f32(x, 0.0, z),
            nav_label: None,
            nav_layer: None,
        }
    }
}

/// All resource markers of the loaded scenario.
#[derive(Resource, Clone, Debug, Default, Serialize, Deserialize)]
pub struct MarkerRegistry {
    pub mass: Vec<ResourceMarker>,
    pub hydrocarbons: Vec<ResourceMarker>,
}

impl MarkerRegistry {
    pub fn of_kind(&self, kind: MarkerKind) -> &[ResourceMarker] {
        match kind {
            MarkerKind::Mass => &self.mass,
            MarkerKind::Hydrocarbon => &self.hydrocarbons,
        }
    }

    pub fn of_kind_mut(&mut self, kind: MarkerKind) -> &mut Vec<ResourceMarker> {
        match kind {
            MarkerKind::Mass => &mut self.mass,
            MarkerKind::Hydrocarbon => &mut self.hydrocarbons,
        }
    }

    /// Drop any labels from a previous mesh so a rebuild starts clean.
    pub fn clear_bindings(&mut self) {
        for marker in self.mass.iter_mut().chain(self.hydrocarbons.iter_mut()) {
            marker.nav_label = None;
            marker.nav_layer = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_field_has_no_water() {
        let field = HeightField::flat(64, 10.0);
        assert_eq!(field.terrain_height(3, 7), 10.0);
        assert_eq!(field.surface_height(3, 7), 10.0);
        assert!(!field.terrain_type(3, 7).blocking);
    }

    #[test]
    fn test_water_level_creates_depth() {
        let mut field = HeightField::flat(64, 10.0);
        field.fill_terrain(0, 0, 16, 16, 4.0);
        field.set_water_level(8.0);
        // Lowered corners sit 4 under the surface, the rest stays dry.
        assert_eq!(field.surface_height(8, 8) - field.terrain_height(8, 8), 4.0);
        assert_eq!(field.surface_height(32, 32), 10.0);
    }

    #[test]
    fn test_out_of_range_queries_are_hostile() {
        let field = HeightField::flat(64, 10.0);
        assert!(field.terrain_height(-1, 0).is_nan());
        assert!(field.terrain_type(64, 0).blocking);
        assert!(field.terrain_type(0, -5).blocking);
    }

    #[test]
    fn test_description_build_applies_features() {
        let description = MapDescription {
            size: 64,
            base_height: 10.0,
            water_elevation: Some(12.0),
            patches: vec![TerrainPatch { x0: 0, z0: 0, x1: 8, z1: 8, height: 20.0 }],
            blockers: vec![TerrainPatch { x0: 30, z0: 30, x1: 33, z1: 33, height: 0.0 }],
            mass_points: vec![(5.0, 5.0)],
            hydrocarbon_points: vec![],
        };
        let field = description.build();
        assert_eq!(field.terrain_height(4, 4), 20.0);
        assert_eq!(field.surface_height(4, 4), 20.0);
        assert_eq!(field.surface_height(40, 40), 12.0);
        assert!(field.terrain_type(31, 31).blocking);
        assert_eq!(description.markers().mass.len(), 1);
    }
}
