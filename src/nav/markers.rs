use std::collections::BTreeMap;

use bevy::prelude::*;

use crate::terrain::{MarkerKind, MarkerRegistry};

use super::grid::NavGrid;
use super::types::{NavLabelMetadata, NavLayer};

/// Attach resource markers to the components that contain them.
///
/// Each marker is resolved on the Land and Amphibious meshes; ground-based
/// extractors are what the economy AI cares about, so the naval layers are
/// never consulted. A marker whose position misses the map or lands on an
/// impassable leaf is simply left unbound.
///
/// Runs before the cull so that components holding a deposit survive even
/// when they are tiny (cliffside mass spots, island hydro vents).
pub(super) fn bind_markers(
    grids: &[NavGrid; NavLayer::COUNT],
    labels: &mut BTreeMap<i32, NavLabelMetadata>,
    registry: &mut MarkerRegistry,
) {
    for kind in [MarkerKind::Mass, MarkerKind::Hydrocarbon] {
        let markers = registry.of_kind_mut(kind);
        for (marker_index, marker) in markers.iter_mut().enumerate() {
            for layer in [NavLayer::Land, NavLayer::Amphibious] {
                let grid = &grids[layer.as_index()];
                let Some(leaf_idx) = grid.find_leaf(marker.position.xz()) else {
                    continue;
                };
                let Some(leaf) = grid.leaf(leaf_idx) else {
                    continue;
                };
                if leaf.label <= 0 {
                    continue;
                }

                let Some(metadata) = labels.get_mut(&leaf.label) else {
                    warn!(
                        "[MARKER] {} leaf carries label {} with no metadata entry",
                        layer, leaf.label
                    );
                    continue;
                };
                match kind {
                    MarkerKind::Mass => {
                        metadata.num_extractors += 1;
                        metadata.extractor_markers.push(marker_index);
                    }
                    MarkerKind::Hydrocarbon => {
                        metadata.num_hydrocarbons += 1;
                        metadata.hydrocarbon_markers.push(marker_index);
                    }
                }

                if marker.nav_label.is_none() {
                    marker.nav_label = Some(leaf.label);
                    marker.nav_layer = Some(layer);
                }
            }
        }
    }
}
