use serde::{Deserialize, Serialize};

use crate::math::{FixedNum, FixedVec2};

use super::tree::{NavLeaf, NavNode, NodeKind};
use super::types::{NavLayer, NodeIdx, BLOCKS_PER_AXIS};

/// One movement layer's spatial index: a 16×16 grid of quadtree roots plus
/// the arena holding every node of the layer.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct NavGrid {
    pub layer: NavLayer,
    /// Block side length in cells.
    pub tree_size: usize,
    pub(super) nodes: Vec<NavNode>,
    /// Quadtree root per block, row-major `[bz][bx]`. Populated for every
    /// block once generation ran.
    pub(super) roots: Vec<NodeIdx>,
}

impl NavGrid {
    pub fn new(layer: NavLayer) -> Self {
        Self {
            layer,
            tree_size: 0,
            nodes: Vec::new(),
            roots: Vec::new(),
        }
    }

    /// Drop the previous forest and prepare for a map with the given block
    /// side length.
    pub(super) fn reset(&mut self, tree_size: usize) {
        self.tree_size = tree_size;
        self.nodes.clear();
        self.roots.clear();
    }

    /// Side length of the indexed map in cells.
    pub fn map_size(&self) -> usize {
        self.tree_size * BLOCKS_PER_AXIS
    }

    /// Total number of arena nodes, branches included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn node(&self, idx: NodeIdx) -> &NavNode {
        &self.nodes[idx.index()]
    }

    #[inline]
    pub(super) fn node_mut(&mut self, idx: NodeIdx) -> &mut NavNode {
        &mut self.nodes[idx.index()]
    }

    /// Leaf payload at `idx`, if the node is a leaf.
    pub fn leaf(&self, idx: NodeIdx) -> Option<&NavLeaf> {
        self.node(idx).leaf()
    }

    /// All leaves of the layer, in arena order. Arena order is deterministic
    /// because generation visits blocks in a fixed sequence.
    pub fn leaves(&self) -> impl Iterator<Item = NodeIdx> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| matches!(node.kind, NodeKind::Leaf(_)))
            .map(|(i, _)| NodeIdx(i as u32))
    }

    /// Locate the leaf containing world point `(x, z)`.
    ///
    /// Points on or outside the map edge resolve to `None`, as do queries
    /// against a grid that has not been generated yet.
    pub fn find_leaf_xz(&self, x: FixedNum, z: FixedNum) -> Option<NodeIdx> {
        if self.roots.is_empty() || x <= FixedNum::ZERO || z <= FixedNum::ZERO {
            return None;
        }
        let block_x = x.to_num::<i64>() / self.tree_size as i64;
        let block_z = z.to_num::<i64>() / self.tree_size as i64;
        if block_x >= BLOCKS_PER_AXIS as i64 || block_z >= BLOCKS_PER_AXIS as i64 {
            return None;
        }

        let mut idx = self.roots[block_z as usize * BLOCKS_PER_AXIS + block_x as usize];
        loop {
            let node = self.node(idx);
            match &node.kind {
                NodeKind::Leaf(_) => return Some(idx),
                NodeKind::Branch(children) => {
                    let h = node.c / 2;
                    let east = x >= FixedNum::from_num(node.origin_x() + h);
                    let south = z >= FixedNum::from_num(node.origin_z() + h);
                    idx = children[(south as usize) * 2 + east as usize];
                }
            }
        }
    }

    pub fn find_leaf(&self, position: FixedVec2) -> Option<NodeIdx> {
        self.find_leaf_xz(position.x, position.z)
    }
}
