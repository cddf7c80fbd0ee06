use std::collections::BTreeMap;
use std::time::Instant;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::gen_progress_log;
use crate::terrain::{MarkerRegistry, TerrainSource};

use super::grid::NavGrid;
use super::raster::BlockScratch;
use super::tree::compress_block;
use super::types::{
    compression_threshold, NavLabelMetadata, NavLayer, NavLayerData, BLOCKS_PER_AXIS,
};
use super::{culling, labels, markers, neighbors, precompute};

/// Rejection reasons for [`NavMesh::generate`]. Both indicate a scenario that
/// cannot be meshed at all, so the previous mesh is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NavGenError {
    #[error("map size {0} is not a positive multiple of {BLOCKS_PER_AXIS}")]
    InvalidMapSize(usize),
    #[error("compression threshold {threshold} does not divide the block size {block_size}")]
    UnalignedThreshold { threshold: usize, block_size: usize },
}

/// The generated multi-layer navigation mesh.
///
/// One [`NavGrid`] per movement layer, a shared label table, and per-layer
/// generation stats. Built once per map load by [`NavMesh::generate`];
/// afterwards the only mutation is the cull writing `-1` labels and the
/// marker binder bumping resource counts, both of which happen inside
/// `generate` itself. Consumers treat the mesh as immutable.
#[derive(Resource, Clone, Debug, Serialize, Deserialize)]
pub struct NavMesh {
    pub grids: [NavGrid; NavLayer::COUNT],
    /// Component metadata keyed by label id (> 0). Ids are unique across
    /// layers.
    pub labels: BTreeMap<i32, NavLabelMetadata>,
    pub layer_data: [NavLayerData; NavLayer::COUNT],
    /// Components removed by the area cull in the last generation.
    pub culled_labels: usize,
    pub generated: bool,
}

impl Default for NavMesh {
    fn default() -> Self {
        Self {
            grids: NavLayer::ALL.map(NavGrid::new),
            labels: BTreeMap::new(),
            layer_data: std::array::from_fn(|i| NavLayerData {
                layer_index: i,
                ..Default::default()
            }),
            culled_labels: 0,
            generated: false,
        }
    }
}

impl NavMesh {
    pub fn grid(&self, layer: NavLayer) -> &NavGrid {
        &self.grids[layer.as_index()]
    }

    pub fn layer_data(&self, layer: NavLayer) -> &NavLayerData {
        &self.layer_data[layer.as_index()]
    }

    pub fn is_generated(&self) -> bool {
        self.generated
    }

    /// Build the mesh for the given terrain.
    ///
    /// Synchronous batch job, idempotent over its inputs: generating twice
    /// from the same oracle produces an identical mesh. On error the previous
    /// mesh (if any) stays untouched.
    ///
    /// Phase order is load-bearing. Corner linking reuses orthogonal results,
    /// labelling walks the finished neighbour graph, the cull reads resource
    /// counts written by the marker binder.
    pub fn generate(
        &mut self,
        source: &impl TerrainSource,
        registry: &mut MarkerRegistry,
    ) -> Result<(), NavGenError> {
        let map_size = source.map_size();
        if map_size == 0 || map_size % BLOCKS_PER_AXIS != 0 {
            return Err(NavGenError::InvalidMapSize(map_size));
        }
        let block_size = map_size / BLOCKS_PER_AXIS;
        let base_threshold = compression_threshold(map_size);
        for layer in NavLayer::ALL {
            let threshold = layer.compression_threshold(base_threshold);
            if block_size % threshold != 0 {
                return Err(NavGenError::UnalignedThreshold {
                    threshold,
                    block_size,
                });
            }
        }

        let started = Instant::now();
        info!(
            "[NAV] Generating mesh: map {}x{}, block {}, threshold {}",
            map_size, map_size, block_size, base_threshold
        );

        self.generated = false;
        self.labels.clear();
        self.culled_labels = 0;
        registry.clear_bindings();
        for (i, grid) in self.grids.iter_mut().enumerate() {
            grid.reset(block_size);
            self.layer_data[i] = NavLayerData {
                layer_index: i,
                ..Default::default()
            };
        }

        // Compress. One oracle sampling pass per block feeds all five layers.
        let mut scratch = BlockScratch::new(block_size);
        let mut next_identifier: u32 = 0;
        let mut block_index = 0usize;
        for bz in 0..BLOCKS_PER_AXIS {
            for bx in 0..BLOCKS_PER_AXIS {
                let world_x = (bx * block_size) as i32;
                let world_z = (bz * block_size) as i32;
                scratch.fill(source, world_x, world_z);
                for layer in NavLayer::ALL {
                    scratch.fill_raster(layer);
                    let i = layer.as_index();
                    let root = compress_block(
                        &mut self.grids[i].nodes,
                        layer,
                        world_x,
                        world_z,
                        &scratch.raster,
                        block_size,
                        layer.compression_threshold(base_threshold),
                        &mut next_identifier,
                        &mut self.layer_data[i],
                    );
                    self.grids[i].roots.push(root);
                }
                gen_progress_log!(
                    block_index,
                    "[NAV] compressed block {}/{}",
                    block_index,
                    BLOCKS_PER_AXIS * BLOCKS_PER_AXIS
                );
                block_index += 1;
            }
        }
        info!("[NAV] Compression done in {:.1?}", started.elapsed());

        // Neighbours. Corner linking must see completed orthogonal results
        // on every layer, so the passes do not interleave.
        let phase = Instant::now();
        for i in 0..NavLayer::COUNT {
            self.layer_data[i].neighbors += neighbors::link_orthogonal(&mut self.grids[i]);
        }
        for i in 0..NavLayer::COUNT {
            self.layer_data[i].neighbors += neighbors::link_corners(&mut self.grids[i]);
        }
        info!("[NAV] Neighbour graph done in {:.1?}", phase.elapsed());

        // Labels.
        let phase = Instant::now();
        let mut next_label: i32 = 1;
        for i in 0..NavLayer::COUNT {
            self.layer_data[i].labels =
                labels::assign_labels(&mut self.grids[i], &mut self.labels, &mut next_label);
        }
        info!(
            "[NAV] Labelled {} components in {:.1?}",
            self.labels.len(),
            phase.elapsed()
        );

        // Precompute.
        for grid in self.grids.iter_mut() {
            precompute::compute_centers(grid);
            precompute::compute_edges(grid);
        }

        // Markers, then the cull that depends on them.
        markers::bind_markers(&self.grids, &mut self.labels, registry);
        self.culled_labels = culling::cull_isolated_labels(&mut self.grids, &mut self.labels);

        self.generated = true;
        info!(
            "[NAV] Mesh ready in {:.1?}: {} labels ({} culled)",
            started.elapsed(),
            self.labels.len(),
            self.culled_labels
        );
        Ok(())
    }
}
