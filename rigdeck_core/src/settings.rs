use serde::{Deserialize, Serialize};

use crate::structs2d::Vec2;

/// User-facing tuning for one deck of interfaces. Everything here is
/// host-owned state; the board only reads it, except for `grid` and
/// `editing` which load and edit mode rewrite.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Settings {
    /// Edit mode toggles handles and polygon building.
    pub editing: bool,
    /// Mirror every built polygon across the interface midline.
    pub symmetry: bool,
    /// Keep interfaces inside the screen after a drag.
    pub clamp: bool,
    /// Snap step for drags and new vertices, 0 disables snapping.
    pub grid: f32,
    /// Scales hit radii of vertices and handles.
    pub scale_ui: f32,
    /// Scales the whole overlay, pointer input included.
    pub scale_all: f32,
    /// Base opacity of interface backgrounds.
    pub alpha: f32,
    /// Persist the deck automatically on disable and before host saves.
    pub autosave: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            editing: false,
            symmetry: false,
            clamp: true,
            grid: 0.0,
            scale_ui: 1.0,
            scale_all: 1.0,
            alpha: 0.2,
            autosave: false,
        }
    }
}

impl Settings {
    /// Snaps both components of `pos` to the grid when `snapping` asks
    /// for it and a grid step is configured.
    pub fn snap(&self, pos: Vec2, snapping: bool) -> Vec2 {
        if snapping && self.grid > 0.0 {
            Vec2::new(
                round_towards(pos.x, 0.5, self.grid),
                round_towards(pos.y, 0.5, self.grid),
            )
        } else {
            pos
        }
    }
}

/// Rounds `x` to a multiple of `step`, going up once the remainder
/// passes `bias * step`.
pub fn round_towards(x: f32, bias: f32, step: f32) -> f32 {
    let f = x.rem_euclid(step);
    if f < bias * step { x - f } else { x + step - f }
}
