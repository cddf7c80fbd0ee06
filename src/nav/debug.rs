use bevy::prelude::*;

use super::generate::NavMesh;
use super::grid::NavGrid;
use super::types::{NavLayer, NodeIdx};

/// Debug visualisation toggles (hot state, not part of the mesh).
#[derive(Resource, Clone, Copy, Debug)]
pub struct NavDebugConfig {
    pub enabled: bool,
    /// Which layer's forest to draw.
    pub layer: NavLayer,
    /// Colour leaves by component label instead of by layer.
    pub color_by_label: bool,
    pub show_impassable: bool,
}

impl Default for NavDebugConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            layer: NavLayer::Land,
            color_by_label: true,
            show_impassable: false,
        }
    }
}

/// Fixed palette colour for a layer.
pub fn layer_color(layer: NavLayer) -> Color {
    match layer {
        NavLayer::Land => Color::srgb(0.35, 0.75, 0.30),
        NavLayer::Water => Color::srgb(0.20, 0.35, 0.90),
        NavLayer::Hover => Color::srgb(0.20, 0.85, 0.85),
        NavLayer::Amphibious => Color::srgb(0.75, 0.65, 0.20),
        NavLayer::Air => Color::srgb(0.70, 0.70, 0.75),
    }
}

/// Stable colour for a component label. Golden-angle hue stepping keeps
/// adjacent label ids visually far apart.
pub fn label_color(label: i32) -> Color {
    if label < 0 {
        return Color::srgb(0.55, 0.12, 0.12);
    }
    let hue = (label as f32 * 137.508) % 360.0;
    Color::hsl(hue, 0.8, 0.6)
}

/// Draw one leaf as a ground-plane rectangle.
pub fn draw_leaf(gizmos: &mut Gizmos, grid: &NavGrid, idx: NodeIdx, color: Color) {
    let node = grid.node(idx);
    let half = node.c as f32 / 2.0;
    let center = Vec3::new(
        node.origin_x() as f32 + half,
        0.5,
        node.origin_z() as f32 + half,
    );
    gizmos.rect(
        Isometry3d::new(center, Quat::from_rotation_x(std::f32::consts::FRAC_PI_2)),
        Vec2::splat(node.c as f32),
        color,
    );
}

pub(super) fn draw_navmesh_gizmos(
    mesh: Res<NavMesh>,
    config: Res<NavDebugConfig>,
    mut gizmos: Gizmos,
) {
    if !config.enabled || !mesh.generated {
        return;
    }

    let grid = mesh.grid(config.layer);
    for idx in grid.leaves() {
        let Some(leaf) = grid.leaf(idx) else { continue };
        if leaf.label < 0 && !config.show_impassable {
            continue;
        }
        let color = if leaf.label < 0 {
            Color::srgb(0.55, 0.12, 0.12).with_alpha(0.25)
        } else if config.color_by_label {
            label_color(leaf.label).with_alpha(0.35)
        } else {
            layer_color(grid.layer).with_alpha(0.35)
        };
        draw_leaf(&mut gizmos, grid, idx, color);
    }
}
