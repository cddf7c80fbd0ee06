use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::math::{FixedNum, FixedVec2};

use super::types::{NavEdge, NavLayer, NavLayerData, NodeIdx, LABEL_UNASSIGNED};

/// Payload of a terminal quadtree node: a uniform square region.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NavLeaf {
    /// -1 impassable, 0 pathable-unassigned, > 0 component id.
    pub label: i32,
    /// Leaf centre in world units. Zero until the precompute sweep; never
    /// filled for impassable leaves.
    pub px: FixedNum,
    pub pz: FixedNum,
    /// Neighbour edges keyed by the neighbour's identifier. BTreeMap keeps
    /// iteration order deterministic across runs.
    pub neighbors: BTreeMap<u32, NavEdge>,
}

impl NavLeaf {
    fn with_label(label: i32) -> Self {
        Self {
            label,
            px: FixedNum::ZERO,
            pz: FixedNum::ZERO,
            neighbors: BTreeMap::new(),
        }
    }

    pub fn is_pathable(&self) -> bool {
        self.label >= LABEL_UNASSIGNED
    }

    pub fn center(&self) -> FixedVec2 {
        FixedVec2::new(self.px, self.pz)
    }
}

/// Branch children in TL, TR, BL, BR order, or a leaf payload. The tagged
/// union keeps "branches have exactly four children, leaves have labels"
/// enforced by construction.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum NodeKind {
    Branch([NodeIdx; 4]),
    Leaf(NavLeaf),
}

/// One quadtree node. All nodes of a layer live in the layer's arena
/// ([`super::NavGrid`]); `NodeIdx` references never dangle because nodes are
/// only ever appended during generation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NavNode {
    /// Unique across all trees of all layers, assigned in generation order.
    pub identifier: u32,
    pub layer: NavLayer,
    /// Top-left corner of the enclosing block, world units.
    pub bx: i32,
    pub bz: i32,
    /// Offset of this node's top-left within the block.
    pub ox: i32,
    pub oz: i32,
    /// Side length in cells. Power of two between the layer threshold and the
    /// block side.
    pub c: i32,
    pub kind: NodeKind,
}

impl NavNode {
    /// World-space x of this node's top-left corner.
    #[inline]
    pub fn origin_x(&self) -> i32 {
        self.bx + self.ox
    }

    /// World-space z of this node's top-left corner.
    #[inline]
    pub fn origin_z(&self) -> i32 {
        self.bz + self.oz
    }

    pub fn leaf(&self) -> Option<&NavLeaf> {
        match &self.kind {
            NodeKind::Leaf(leaf) => Some(leaf),
            NodeKind::Branch(_) => None,
        }
    }

    pub fn leaf_mut(&mut self) -> Option<&mut NavLeaf> {
        match &mut self.kind {
            NodeKind::Leaf(leaf) => Some(leaf),
            NodeKind::Branch(_) => None,
        }
    }
}

/// Compress one block raster into a quadtree rooted at the returned node.
///
/// Uniform regions collapse into single leaves. Mixed regions at or below
/// `threshold` become impassable leaves: a cell of cliff inside an otherwise
/// open square makes the whole square untrustworthy for movement.
#[allow(clippy::too_many_arguments)]
pub(super) fn compress_block(
    nodes: &mut Vec<NavNode>,
    layer: NavLayer,
    bx: i32,
    bz: i32,
    raster: &[i8],
    block_size: usize,
    threshold: usize,
    next_identifier: &mut u32,
    data: &mut NavLayerData,
) -> NodeIdx {
    compress_node(
        nodes,
        layer,
        bx,
        bz,
        0,
        0,
        block_size,
        raster,
        block_size,
        threshold,
        next_identifier,
        data,
    )
}

#[allow(clippy::too_many_arguments)]
fn compress_node(
    nodes: &mut Vec<NavNode>,
    layer: NavLayer,
    bx: i32,
    bz: i32,
    ox: usize,
    oz: usize,
    c: usize,
    raster: &[i8],
    block_size: usize,
    threshold: usize,
    next_identifier: &mut u32,
    data: &mut NavLayerData,
) -> NodeIdx {
    let identifier = *next_identifier;
    *next_identifier += 1;

    let value = raster[oz * block_size + ox];
    let uniform = (oz..oz + c).all(|row| {
        raster[row * block_size + ox..row * block_size + ox + c]
            .iter()
            .all(|&v| v == value)
    });

    let kind = if uniform {
        count_leaf(data, value);
        NodeKind::Leaf(NavLeaf::with_label(value as i32))
    } else if c <= threshold {
        // Pessimistic base case.
        count_leaf(data, -1);
        NodeKind::Leaf(NavLeaf::with_label(-1))
    } else {
        data.subdivisions += 1;
        let h = c / 2;
        let tl = compress_node(nodes, layer, bx, bz, ox, oz, h, raster, block_size, threshold, next_identifier, data);
        let tr = compress_node(nodes, layer, bx, bz, ox + h, oz, h, raster, block_size, threshold, next_identifier, data);
        let bl = compress_node(nodes, layer, bx, bz, ox, oz + h, h, raster, block_size, threshold, next_identifier, data);
        let br = compress_node(nodes, layer, bx, bz, ox + h, oz + h, h, raster, block_size, threshold, next_identifier, data);
        NodeKind::Branch([tl, tr, bl, br])
    };

    let idx = NodeIdx(nodes.len() as u32);
    nodes.push(NavNode {
        identifier,
        layer,
        bx,
        bz,
        ox: ox as i32,
        oz: oz as i32,
        c: c as i32,
        kind,
    });
    idx
}

fn count_leaf(data: &mut NavLayerData, value: i8) {
    if value == 0 {
        data.pathable_leafs += 1;
    } else {
        data.unpathable_leafs += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compress(raster: &[i8], block_size: usize, threshold: usize) -> (Vec<NavNode>, NodeIdx, NavLayerData) {
        let mut nodes = Vec::new();
        let mut next_id = 0;
        let mut data = NavLayerData::default();
        let root = compress_block(
            &mut nodes,
            NavLayer::Land,
            0,
            0,
            raster,
            block_size,
            threshold,
            &mut next_id,
            &mut data,
        );
        (nodes, root, data)
    }

    #[test]
    fn test_uniform_block_collapses_to_one_leaf() {
        let raster = vec![0i8; 8 * 8];
        let (nodes, root, data) = compress(&raster, 8, 2);
        assert_eq!(nodes.len(), 1);
        let node = &nodes[root.index()];
        assert_eq!(node.c, 8);
        assert_eq!(node.leaf().unwrap().label, 0);
        assert_eq!(data.pathable_leafs, 1);
        assert_eq!(data.subdivisions, 0);
    }

    #[test]
    fn test_mixed_block_subdivides_in_quadrant_order() {
        // One impassable cell in the top-right quadrant.
        let mut raster = vec![0i8; 8 * 8];
        raster[7] = -1;
        let (nodes, root, data) = compress(&raster, 8, 2);
        let NodeKind::Branch(children) = &nodes[root.index()].kind else {
            panic!("root should subdivide");
        };
        // TL, BL and BR collapse; TR subdivides further.
        let [tl, tr, bl, br] = *children;
        assert_eq!(nodes[tl.index()].leaf().unwrap().label, 0);
        assert!(nodes[tr.index()].leaf().is_none());
        assert_eq!(nodes[bl.index()].leaf().unwrap().label, 0);
        assert_eq!(nodes[br.index()].leaf().unwrap().label, 0);
        // Child geometry: TR sits at offset (4, 0) with half the side.
        assert_eq!(nodes[tr.index()].ox, 4);
        assert_eq!(nodes[tr.index()].oz, 0);
        assert_eq!(nodes[tr.index()].c, 4);
        assert!(data.subdivisions >= 2);
    }

    #[test]
    fn test_base_case_is_pessimistic() {
        // A lone impassable cell poisons its threshold-sized square.
        let mut raster = vec![0i8; 4 * 4];
        raster[0] = -1;
        let (nodes, _, data) = compress(&raster, 4, 2);
        let poisoned: Vec<_> = nodes
            .iter()
            .filter_map(|n| n.leaf())
            .filter(|l| l.label == -1)
            .collect();
        assert_eq!(poisoned.len(), 1);
        assert_eq!(data.unpathable_leafs, 1);
        assert_eq!(data.pathable_leafs, 3);
        // The poisoned leaf is threshold-sized even though only one of its
        // four cells is impassable.
        let leaf_node = nodes.iter().find(|n| n.leaf().is_some_and(|l| l.label == -1)).unwrap();
        assert_eq!(leaf_node.c, 2);
    }

    #[test]
    fn test_leaf_sides_are_powers_of_two_within_bounds() {
        let mut raster = vec![0i8; 16 * 16];
        for z in 0..16 {
            raster[z * 16 + 5] = -1;
        }
        let (nodes, _, _) = compress(&raster, 16, 2);
        for node in &nodes {
            if node.leaf().is_some() {
                assert!(node.c >= 2 && node.c <= 16);
                assert!((node.c as u32).is_power_of_two());
            } else {
                assert!(node.c % 2 == 0);
            }
        }
    }

    #[test]
    fn test_identifiers_are_unique_and_dense() {
        let mut raster = vec![0i8; 8 * 8];
        raster[0] = -1;
        let (nodes, _, _) = compress(&raster, 8, 2);
        let mut ids: Vec<_> = nodes.iter().map(|n| n.identifier).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), nodes.len());
    }
}
