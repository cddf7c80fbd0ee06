use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::math::{FixedNum, FixedVec2};

/// Number of quadtree blocks along each map axis.
///
/// The map is always split into a 16×16 grid of blocks; block side length in
/// cells therefore scales with the map (`map_size / 16`). Each block is the
/// root of one quadtree per movement layer.
pub const BLOCKS_PER_AXIS: usize = 16;

/// Maximum height difference between adjacent corners a ground unit can step
/// over. Anything steeper is a cliff on Land/Hover/Amphibious.
pub const MAX_HEIGHT_DIFF: f32 = 0.75;

/// Minimum water depth for naval movement.
pub const MIN_WATER_DEPTH_NAVAL: f32 = 1.5;

/// Maximum water depth amphibious units can wade through.
pub const MAX_WATER_DEPTH_AMPHIBIOUS: f32 = 25.0;

/// Connected components below this area are culled unless they contain a
/// resource marker. Area is measured in [`AREA_SCALE`]-scaled units.
pub const CULL_AREA_THRESHOLD: f32 = 0.2;

/// World-to-area scale: a leaf of side `c` contributes `(c * AREA_SCALE)²`
/// to its component's area.
pub const AREA_SCALE: f32 = 0.01;

/// Leaf label for impassable regions.
pub const LABEL_IMPASSABLE: i32 = -1;

/// Leaf label for pathable regions that have not been assigned a component yet.
/// Only observable mid-generation; a finished mesh has no leaves left at 0.
pub const LABEL_UNASSIGNED: i32 = 0;

/// Base compression threshold: leaves are never subdivided below this side
/// length. Larger maps trade resolution for node count.
pub fn compression_threshold(map_size: usize) -> usize {
    if map_size <= 1024 {
        2
    } else {
        4
    }
}

/// Movement layers, each with an independent pathability predicate and mesh.
///
/// The repr(u8) ensures zero-cost conversion to array indices.
#[repr(u8)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NavLayer {
    #[default]
    Land = 0,
    Water = 1,
    Hover = 2,
    Amphibious = 3,
    Air = 4,
}

impl NavLayer {
    pub const COUNT: usize = 5;

    /// All layers, in generation order.
    pub const ALL: [NavLayer; NavLayer::COUNT] = [
        NavLayer::Land,
        NavLayer::Water,
        NavLayer::Hover,
        NavLayer::Amphibious,
        NavLayer::Air,
    ];

    #[inline]
    pub fn as_index(self) -> usize {
        self as usize
    }

    /// Compression threshold for this layer. Naval meshes are coarser: water
    /// regions are large and units using them are too, so Water compresses at
    /// twice the base threshold.
    pub fn compression_threshold(self, base: usize) -> usize {
        match self {
            NavLayer::Water => base * 2,
            _ => base,
        }
    }
}

impl std::fmt::Display for NavLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            NavLayer::Land => "Land",
            NavLayer::Water => "Water",
            NavLayer::Hover => "Hover",
            NavLayer::Amphibious => "Amphibious",
            NavLayer::Air => "Air",
        };
        f.write_str(name)
    }
}

// ============================================================================
// Arena Indices & Edges
// ============================================================================

/// Index of a node in its layer's quadtree arena.
///
/// Nodes reference each other exclusively through these indices; the
/// neighbour graph is cyclic and owning references would leak.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeIdx(pub u32);

impl NodeIdx {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// One directed edge of the leaf neighbour graph. Stored on both endpoints;
/// `distance` is symmetric and `direction` antisymmetric between the two.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct NavEdge {
    pub target: NodeIdx,
    /// Euclidean centre-to-centre distance.
    pub distance: FixedNum,
    /// Centre-to-centre displacement. Not normalised; consumers that want a
    /// heading divide by `distance` themselves.
    pub direction: FixedVec2,
}

// ============================================================================
// Label Metadata & Stats
// ============================================================================

/// Per-component bookkeeping, keyed by label id in [`super::NavMesh`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NavLabelMetadata {
    /// A representative leaf of the component, used as flood-fill seed.
    pub node: NodeIdx,
    pub layer: NavLayer,
    /// Sum of `(c * AREA_SCALE)²` over all member leaves.
    pub area: FixedNum,
    pub num_extractors: usize,
    pub num_hydrocarbons: usize,
    /// Indices into [`crate::terrain::MarkerRegistry::mass`].
    pub extractor_markers: SmallVec<[usize; 4]>,
    /// Indices into [`crate::terrain::MarkerRegistry::hydrocarbons`].
    pub hydrocarbon_markers: SmallVec<[usize; 4]>,
    /// Set when the component was removed by the area cull.
    pub culled: bool,
}

impl NavLabelMetadata {
    pub fn new(node: NodeIdx, layer: NavLayer) -> Self {
        Self {
            node,
            layer,
            area: FixedNum::ZERO,
            num_extractors: 0,
            num_hydrocarbons: 0,
            extractor_markers: SmallVec::new(),
            hydrocarbon_markers: SmallVec::new(),
            culled: false,
        }
    }

    pub fn has_resources(&self) -> bool {
        self.num_extractors > 0 || self.num_hydrocarbons > 0
    }
}

/// Per-layer generation counters, published for UI and the stats binary.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct NavLayerData {
    pub layer_index: usize,
    pub pathable_leafs: usize,
    pub unpathable_leafs: usize,
    pub subdivisions: usize,
    pub neighbors: usize,
    pub labels: usize,
}
