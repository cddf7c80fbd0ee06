use std::collections::BTreeMap;

use fixedbitset::FixedBitSet;
use smallvec::SmallVec;

use crate::math::FixedNum;

use super::grid::NavGrid;
use super::types::{NavLabelMetadata, NavLayer, NodeIdx, CULL_AREA_THRESHOLD, LABEL_IMPASSABLE};

/// Remove components too small to matter.
///
/// A component below the area threshold that holds no resource marker is
/// flood-set back to impassable, seeded from its representative leaf.
/// Explicit stack for the same reason as labelling. Neighbour maps stay in
/// place; consumers already filter on `label >= 0`.
///
/// Returns the number of culled components.
pub(super) fn cull_isolated_labels(
    grids: &mut [NavGrid; NavLayer::COUNT],
    labels: &mut BTreeMap<i32, NavLabelMetadata>,
) -> usize {
    let threshold = FixedNum::from_num(CULL_AREA_THRESHOLD);
    let mut culled = 0;

    for (&label, metadata) in labels.iter_mut() {
        if metadata.area >= threshold || metadata.has_resources() {
            continue;
        }

        let grid = &mut grids[metadata.layer.as_index()];
        let mut visited = FixedBitSet::with_capacity(grid.node_count());
        let mut stack = vec![metadata.node];
        visited.insert(metadata.node.index());

        while let Some(current) = stack.pop() {
            let Some(leaf) = grid.node_mut(current).leaf_mut() else {
                continue;
            };
            if leaf.label != label {
                continue;
            }
            leaf.label = LABEL_IMPASSABLE;

            let neighbors: SmallVec<[NodeIdx; 8]> = grid
                .leaf(current)
                .map(|leaf| leaf.neighbors.values().map(|edge| edge.target).collect())
                .unwrap_or_default();
            for target in neighbors {
                if !visited.put(target.index()) {
                    stack.push(target);
                }
            }
        }

        metadata.culled = true;
        culled += 1;
    }

    culled
}
