use smallvec::SmallVec;

use crate::math::{FixedNum, FixedVec2};

use super::grid::NavGrid;
use super::types::NodeIdx;

fn half() -> FixedNum {
    FixedNum::from_num(0.5)
}

/// Fill in the centre point of every pathable leaf. Impassable leaves never
/// participate in navigation and keep zeroed centres.
pub(super) fn compute_centers(grid: &mut NavGrid) {
    let leaf_indices: Vec<NodeIdx> = grid.leaves().collect();
    for idx in leaf_indices {
        let node = grid.node(idx);
        let px = FixedNum::from_num(node.origin_x()) + half() * FixedNum::from_num(node.c);
        let pz = FixedNum::from_num(node.origin_z()) + half() * FixedNum::from_num(node.c);
        if let Some(leaf) = grid.node_mut(idx).leaf_mut() {
            if leaf.is_pathable() {
                leaf.px = px;
                leaf.pz = pz;
            }
        }
    }
}

/// Precompute edge displacement and distance so the per-tick consumers never
/// touch the arena twice per neighbour.
///
/// Directions are plain centre-to-centre displacements, not unit vectors;
/// steering code scales them itself.
pub(super) fn compute_edges(grid: &mut NavGrid) {
    let leaf_indices: Vec<NodeIdx> = grid.leaves().collect();
    for idx in leaf_indices {
        let Some(leaf) = grid.leaf(idx) else { continue };
        if !leaf.is_pathable() || leaf.neighbors.is_empty() {
            continue;
        }
        let center = leaf.center();

        let updates: SmallVec<[(u32, FixedVec2, FixedNum); 8]> = leaf
            .neighbors
            .iter()
            .map(|(&identifier, edge)| {
                let other = grid
                    .leaf(edge.target)
                    .expect("neighbour edges always point at leaves");
                let direction = other.center() - center;
                (identifier, direction, direction.length())
            })
            .collect();

        let leaf = grid
            .node_mut(idx)
            .leaf_mut()
            .expect("precompute only visits leaves");
        for (identifier, direction, distance) in updates {
            if let Some(edge) = leaf.neighbors.get_mut(&identifier) {
                edge.direction = direction;
                edge.distance = distance;
            }
        }
    }
}
