use crate::math::FixedNum;
use crate::terrain::TerrainSource;

use super::types::{
    NavLayer, MAX_HEIGHT_DIFF, MAX_WATER_DEPTH_AMPHIBIOUS, MIN_WATER_DEPTH_NAVAL,
};

/// Hover craft skim over water this deep regardless of the seabed profile.
const HOVER_SKIM_DEPTH: f32 = 1.0;

/// Sanity bound on oracle heights. Anything outside is treated like NaN.
const MAX_SANE_HEIGHT: f32 = 1_000_000.0;

/// Per-block sampling caches, allocated once per `generate()` and refilled
/// for every block. Corner-indexed buffers span `(size + 1)²`, cell-indexed
/// buffers `size²`.
pub(super) struct BlockScratch {
    size: usize,
    /// Ground height per corner.
    terrain: Vec<FixedNum>,
    /// Water depth (surface minus ground) per corner.
    depth: Vec<FixedNum>,
    /// Whether the oracle produced a usable height for this corner.
    corner_ok: Vec<bool>,
    /// Step walkability along +x: rows `0..=size`, columns `0..size`.
    px_walk: Vec<bool>,
    /// Step walkability along +z: rows `0..size`, columns `0..=size`.
    pz_walk: Vec<bool>,
    /// All four surrounding steps walkable.
    cell_walk: Vec<bool>,
    /// Mean of the four corner depths.
    avg_depth: Vec<FixedNum>,
    /// Type raster allows movement and all four corners sampled cleanly.
    terrain_ok: Vec<bool>,
    /// Pathability raster for the layer most recently passed to
    /// [`BlockScratch::fill_raster`]: 0 pathable, -1 impassable.
    pub(super) raster: Vec<i8>,
}

fn sample(height: f32) -> Option<FixedNum> {
    if height.is_finite() && height.abs() < MAX_SANE_HEIGHT {
        Some(FixedNum::from_num(height))
    } else {
        None
    }
}

impl BlockScratch {
    pub(super) fn new(block_size: usize) -> Self {
        let cells = block_size * block_size;
        let corners = (block_size + 1) * (block_size + 1);
        Self {
            size: block_size,
            terrain: vec![FixedNum::ZERO; corners],
            depth: vec![FixedNum::ZERO; corners],
            corner_ok: vec![false; corners],
            px_walk: vec![false; (block_size + 1) * block_size],
            pz_walk: vec![false; block_size * (block_size + 1)],
            cell_walk: vec![false; cells],
            avg_depth: vec![FixedNum::ZERO; cells],
            terrain_ok: vec![false; cells],
            raster: vec![-1; cells],
        }
    }

    /// Sample the oracle for the block whose top-left cell is `(bx, bz)` and
    /// derive the walkability caches shared by all layers.
    pub(super) fn fill(&mut self, source: &impl TerrainSource, bx: i32, bz: i32) {
        let s = self.size;
        let span = s + 1;

        for z in 0..span {
            for x in 0..span {
                let i = z * span + x;
                let ground = sample(source.terrain_height(bx + x as i32, bz + z as i32));
                let surface = sample(source.surface_height(bx + x as i32, bz + z as i32));
                match (ground, surface) {
                    (Some(ground), Some(surface)) => {
                        self.terrain[i] = ground;
                        self.depth[i] = surface - ground;
                        self.corner_ok[i] = true;
                    }
                    _ => {
                        self.terrain[i] = FixedNum::ZERO;
                        self.depth[i] = FixedNum::ZERO;
                        self.corner_ok[i] = false;
                    }
                }
            }
        }

        let max_step = FixedNum::from_num(MAX_HEIGHT_DIFF);
        for z in 0..span {
            for x in 0..s {
                let a = self.terrain[z * span + x];
                let b = self.terrain[z * span + x + 1];
                self.px_walk[z * s + x] = (a - b).abs() < max_step;
            }
        }
        for z in 0..s {
            for x in 0..span {
                let a = self.terrain[z * span + x];
                let b = self.terrain[(z + 1) * span + x];
                self.pz_walk[z * span + x] = (a - b).abs() < max_step;
            }
        }

        let four = FixedNum::from_num(4);
        for z in 0..s {
            for x in 0..s {
                let i = z * s + x;
                self.cell_walk[i] = self.px_walk[z * s + x]
                    && self.px_walk[(z + 1) * s + x]
                    && self.pz_walk[z * span + x]
                    && self.pz_walk[z * span + x + 1];

                let d00 = self.depth[z * span + x];
                let d10 = self.depth[z * span + x + 1];
                let d01 = self.depth[(z + 1) * span + x];
                let d11 = self.depth[(z + 1) * span + x + 1];
                self.avg_depth[i] = (d00 + d10 + d01 + d11) / four;

                let corners_ok = self.corner_ok[z * span + x]
                    && self.corner_ok[z * span + x + 1]
                    && self.corner_ok[(z + 1) * span + x]
                    && self.corner_ok[(z + 1) * span + x + 1];
                self.terrain_ok[i] = corners_ok
                    && !source.terrain_type(bx + x as i32, bz + z as i32).blocking;
            }
        }
    }

    /// Derive the pathability raster for one layer from the filled caches.
    pub(super) fn fill_raster(&mut self, layer: NavLayer) {
        let naval = FixedNum::from_num(MIN_WATER_DEPTH_NAVAL);
        let wade_limit = FixedNum::from_num(MAX_WATER_DEPTH_AMPHIBIOUS);
        let skim = FixedNum::from_num(HOVER_SKIM_DEPTH);

        for i in 0..self.size * self.size {
            let open = match layer {
                NavLayer::Land => {
                    self.avg_depth[i] <= FixedNum::ZERO && self.terrain_ok[i] && self.cell_walk[i]
                }
                NavLayer::Hover => {
                    self.terrain_ok[i] && (self.avg_depth[i] >= skim || self.cell_walk[i])
                }
                NavLayer::Water => self.avg_depth[i] >= naval && self.terrain_ok[i],
                NavLayer::Amphibious => {
                    self.avg_depth[i] <= wade_limit && self.terrain_ok[i] && self.cell_walk[i]
                }
                NavLayer::Air => true,
            };
            self.raster[i] = if open { 0 } else { -1 };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::HeightField;

    fn raster_of(scratch: &mut BlockScratch, source: &HeightField, layer: NavLayer) -> Vec<i8> {
        scratch.fill(source, 0, 0);
        scratch.fill_raster(layer);
        scratch.raster.clone()
    }

    #[test]
    fn test_flat_dry_block() {
        let field = HeightField::flat(64, 10.0);
        let mut scratch = BlockScratch::new(4);
        assert!(raster_of(&mut scratch, &field, NavLayer::Land).iter().all(|&v| v == 0));
        assert!(raster_of(&mut scratch, &field, NavLayer::Water).iter().all(|&v| v == -1));
        assert!(raster_of(&mut scratch, &field, NavLayer::Hover).iter().all(|&v| v == 0));
        assert!(raster_of(&mut scratch, &field, NavLayer::Amphibious).iter().all(|&v| v == 0));
        assert!(raster_of(&mut scratch, &field, NavLayer::Air).iter().all(|&v| v == 0));
    }

    #[test]
    fn test_cliff_blocks_ground_but_not_air() {
        let mut field = HeightField::flat(64, 10.0);
        // Raise a ledge through the block: corners x >= 2 jump by 5.
        field.fill_terrain(2, 0, 4, 4, 15.0);
        let mut scratch = BlockScratch::new(4);
        let land = raster_of(&mut scratch, &field, NavLayer::Land);
        // Only the cell column straddling the ledge (corners 1 and 2) is
        // unwalkable; the plateau itself is level again.
        for z in 0..4 {
            assert_eq!(land[z * 4], 0);
            assert_eq!(land[z * 4 + 1], -1);
            assert_eq!(land[z * 4 + 2], 0);
            assert_eq!(land[z * 4 + 3], 0);
        }
        assert!(raster_of(&mut scratch, &field, NavLayer::Air).iter().all(|&v| v == 0));
    }

    #[test]
    fn test_water_depth_thresholds() {
        let mut field = HeightField::flat(64, 10.0);
        field.fill_terrain(0, 0, 4, 4, 8.0);
        field.set_water_level(10.0); // depth 2 everywhere in the block
        let mut scratch = BlockScratch::new(4);
        assert!(raster_of(&mut scratch, &field, NavLayer::Water).iter().all(|&v| v == 0));
        assert!(raster_of(&mut scratch, &field, NavLayer::Land).iter().all(|&v| v == -1));
        // Depth 2 is under the amphibious limit and the bed is level.
        assert!(raster_of(&mut scratch, &field, NavLayer::Amphibious).iter().all(|&v| v == 0));
        assert!(raster_of(&mut scratch, &field, NavLayer::Hover).iter().all(|&v| v == 0));
    }

    #[test]
    fn test_shallow_water_is_not_naval() {
        let mut field = HeightField::flat(64, 10.0);
        field.fill_terrain(0, 0, 4, 4, 9.0);
        field.set_water_level(10.0); // depth 1: too shallow for ships
        let mut scratch = BlockScratch::new(4);
        assert!(raster_of(&mut scratch, &field, NavLayer::Water).iter().all(|&v| v == -1));
        assert!(raster_of(&mut scratch, &field, NavLayer::Hover).iter().all(|&v| v == 0));
    }

    #[test]
    fn test_blocking_type_overrides_everything_but_air() {
        let mut field = HeightField::flat(64, 10.0);
        field.set_blocking(0, 0, 3, 3);
        let mut scratch = BlockScratch::new(4);
        assert!(raster_of(&mut scratch, &field, NavLayer::Land).iter().all(|&v| v == -1));
        assert!(raster_of(&mut scratch, &field, NavLayer::Hover).iter().all(|&v| v == -1));
        assert!(raster_of(&mut scratch, &field, NavLayer::Air).iter().all(|&v| v == 0));
    }
}
