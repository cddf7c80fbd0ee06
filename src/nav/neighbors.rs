use smallvec::SmallVec;

use crate::math::{FixedNum, FixedVec2};

use super::grid::NavGrid;
use super::types::{NavEdge, NodeIdx};

/// Probe results for one leaf, applied in a second borrow after scanning.
type Found = SmallVec<[(u32, NodeIdx); 8]>;

fn half() -> FixedNum {
    FixedNum::from_num(0.5)
}

/// Phase 1: orthogonal neighbours.
///
/// For every pathable leaf, probe half a cell outside each edge and walk
/// along it. Each hit is a leaf whose side tells how far to jump for the next
/// probe, so a full edge costs one lookup per adjacent leaf rather than one
/// per cell. Probes that leave the map end the walk for that edge.
///
/// Returns the number of links inserted.
pub(super) fn link_orthogonal(grid: &mut NavGrid) -> usize {
    let leaf_indices: Vec<NodeIdx> = grid.leaves().collect();
    let mut inserted = 0;

    for idx in leaf_indices {
        let node = grid.node(idx);
        let Some(leaf) = node.leaf() else { continue };
        if !leaf.is_pathable() {
            continue;
        }
        let x1 = node.origin_x();
        let z1 = node.origin_z();
        let x2 = x1 + node.c;
        let z2 = z1 + node.c;

        let mut found = Found::new();
        let above = FixedNum::from_num(z1) - half();
        let below = FixedNum::from_num(z2) + half();
        let left = FixedNum::from_num(x1) - half();
        let right = FixedNum::from_num(x2) + half();

        scan_edge(grid, &mut found, x1, x2, |x| (x, above));
        scan_edge(grid, &mut found, x1, x2, |x| (x, below));
        scan_edge(grid, &mut found, z1, z2, |z| (left, z));
        scan_edge(grid, &mut found, z1, z2, |z| (right, z));

        inserted += attach(grid, idx, &found);
    }
    inserted
}

/// Walk one edge from `from + 0.5` to `to`, advancing by the side of each
/// leaf the probe lands on.
fn scan_edge(
    grid: &NavGrid,
    found: &mut Found,
    from: i32,
    to: i32,
    position: impl Fn(FixedNum) -> (FixedNum, FixedNum),
) {
    let mut at = FixedNum::from_num(from) + half();
    let end = FixedNum::from_num(to);
    while at < end {
        let (x, z) = position(at);
        let Some(hit) = grid.find_leaf_xz(x, z) else {
            break;
        };
        let hit_node = grid.node(hit);
        if hit_node.leaf().is_some_and(|leaf| leaf.is_pathable()) {
            found.push((hit_node.identifier, hit));
        }
        at += FixedNum::from_num(hit_node.c);
    }
}

/// Phase 2: corner-diagonal neighbours.
///
/// A diagonal link is only allowed when the two orthogonally adjacent cells
/// sharing the corner both exist and carry the same label as the probing
/// leaf; otherwise a unit could cut through the tip of an impassable wedge.
/// Must run after [`link_orthogonal`] has finished the whole layer, and
/// before labelling, so the comparison sees raw pathability values.
///
/// Both endpoints of a diagonal evaluate the same two orthogonal cells, which
/// keeps the relation symmetric without any fixup pass.
pub(super) fn link_corners(grid: &mut NavGrid) -> usize {
    let leaf_indices: Vec<NodeIdx> = grid.leaves().collect();
    let mut inserted = 0;

    for idx in leaf_indices {
        let node = grid.node(idx);
        let Some(leaf) = node.leaf() else { continue };
        if !leaf.is_pathable() {
            continue;
        }
        let label = leaf.label;
        let x1 = FixedNum::from_num(node.origin_x());
        let z1 = FixedNum::from_num(node.origin_z());
        let x2 = FixedNum::from_num(node.origin_x() + node.c);
        let z2 = FixedNum::from_num(node.origin_z() + node.c);
        let h = half();

        // (diagonal probe, the two orthogonal cells sharing the corner)
        let corners = [
            ((x1 - h, z1 - h), (x1 + h, z1 - h), (x1 - h, z1 + h)),
            ((x2 + h, z1 - h), (x2 - h, z1 - h), (x2 + h, z1 + h)),
            ((x1 - h, z2 + h), (x1 + h, z2 + h), (x1 - h, z2 - h)),
            ((x2 + h, z2 + h), (x2 - h, z2 + h), (x2 + h, z2 - h)),
        ];

        let mut found = Found::new();
        for (diagonal, side_a, side_b) in corners {
            let Some(hit) = pathable_at(grid, diagonal) else {
                continue;
            };
            if labelled_at(grid, side_a, label) && labelled_at(grid, side_b, label) {
                found.push((grid.node(hit).identifier, hit));
            }
        }

        inserted += attach(grid, idx, &found);
    }
    inserted
}

fn pathable_at(grid: &NavGrid, position: (FixedNum, FixedNum)) -> Option<NodeIdx> {
    let idx = grid.find_leaf_xz(position.0, position.1)?;
    grid.leaf(idx)
        .is_some_and(|leaf| leaf.is_pathable())
        .then_some(idx)
}

fn labelled_at(grid: &NavGrid, position: (FixedNum, FixedNum), label: i32) -> bool {
    grid.find_leaf_xz(position.0, position.1)
        .and_then(|idx| grid.leaf(idx))
        .is_some_and(|leaf| leaf.label == label)
}

/// Insert probe hits into the leaf's neighbour map. Distances and directions
/// stay zero until the precompute sweep.
fn attach(grid: &mut NavGrid, idx: NodeIdx, found: &Found) -> usize {
    let leaf = grid
        .node_mut(idx)
        .leaf_mut()
        .expect("neighbour probing only visits leaves");
    let mut inserted = 0;
    for &(identifier, target) in found {
        let edge = NavEdge {
            target,
            distance: FixedNum::ZERO,
            direction: FixedVec2::ZERO,
        };
        if leaf.neighbors.insert(identifier, edge).is_none() {
            inserted += 1;
        }
    }
    inserted
}
