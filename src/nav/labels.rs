use std::collections::BTreeMap;

use bevy::prelude::*;
use fixedbitset::FixedBitSet;
use smallvec::SmallVec;

use crate::math::FixedNum;

use super::grid::NavGrid;
use super::types::{NavLabelMetadata, NodeIdx, AREA_SCALE, LABEL_UNASSIGNED};

/// Assign connected-component labels to every pathable leaf of the layer.
///
/// Depth-first search with an explicit stack: the 1024-cell maps already
/// produce components tens of thousands of leaves deep, and recursing that
/// far overflows the host stack.
///
/// Label ids come out of `next_label`, which is shared across layers so ids
/// are globally unique. Returns the number of components found in this layer.
pub(super) fn assign_labels(
    grid: &mut NavGrid,
    labels: &mut BTreeMap<i32, NavLabelMetadata>,
    next_label: &mut i32,
) -> usize {
    let layer = grid.layer;
    let leaf_indices: Vec<NodeIdx> = grid.leaves().collect();
    let mut queued = FixedBitSet::with_capacity(grid.node_count());
    let mut stack: Vec<NodeIdx> = Vec::new();
    let mut created = 0;

    for seed in leaf_indices {
        if grid.leaf(seed).map(|leaf| leaf.label) != Some(LABEL_UNASSIGNED) {
            continue;
        }

        let label = *next_label;
        *next_label += 1;
        created += 1;
        let mut metadata = NavLabelMetadata::new(seed, layer);

        stack.push(seed);
        queued.insert(seed.index());

        while let Some(current) = stack.pop() {
            {
                let node = grid.node_mut(current);
                let c = node.c;
                let leaf = node
                    .leaf_mut()
                    .expect("label stack only ever holds leaves");
                if leaf.label > 0 {
                    if leaf.label != label {
                        warn!(
                            "[LABEL] {} leaf {} already carries label {} while flooding {}; neighbour symmetry is broken",
                            layer, current.0, leaf.label, label
                        );
                    }
                    continue;
                }
                leaf.label = label;
                let scaled = FixedNum::from_num(c) * FixedNum::from_num(AREA_SCALE);
                metadata.area += scaled * scaled;
            }

            let neighbors: SmallVec<[NodeIdx; 8]> = grid
                .leaf(current)
                .map(|leaf| leaf.neighbors.values().map(|edge| edge.target).collect())
                .unwrap_or_default();

            for target in neighbors {
                let target_label = grid.leaf(target).map(|leaf| leaf.label);
                match target_label {
                    Some(LABEL_UNASSIGNED) => {
                        if !queued.put(target.index()) {
                            stack.push(target);
                        }
                    }
                    Some(other) if other > 0 && other != label => {
                        warn!(
                            "[LABEL] {} leaf {} neighbours label {} from component {}; neighbour symmetry is broken",
                            layer, target.0, other, label
                        );
                    }
                    _ => {}
                }
            }
        }

        labels.insert(label, metadata);
    }

    created
}
