//! Pointer smoothing and cursor mapping.
//!
//! The landmark tracker reports the nose tip as a normalized point once per
//! processed frame. [`PointerSmoother`] runs an exponential moving average
//! over those points; [`CursorMapper`] turns the smoothed point into a
//! cursor on the target surface:
//!
//! 1. mirror horizontally (`x' = 1 - x`) to match the mirrored preview
//! 2. add the neutral-position offset
//! 3. amplify around the center: `x'' = (x' - 0.5) * s_x + 0.5`
//! 4. clamp both axes to `[0, 1]`
//! 5. scale onto the surface rectangle

use serde::{Deserialize, Serialize};

use crate::config::PointerConfig;

/// Normalized landmark coordinate, each axis in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawPoint {
    pub x: f64,
    pub y: f64,
}

impl RawPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// EMA state in the same normalized units as [`RawPoint`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SmoothedPoint {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CursorState {
    pub viewport_x: f64,
    pub viewport_y: f64,
    pub normalized_x: f64,
    pub normalized_y: f64,
}

/// Rectangle the cursor is mapped onto: the full viewport or a bounded panel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Surface {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Default for Surface {
    fn default() -> Self {
        Self {
            left: 0.0,
            top: 0.0,
            width: 1280.0,
            height: 720.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PointerSmoother {
    alpha: f64,
    state: SmoothedPoint,
}

impl PointerSmoother {
    pub fn new(alpha: f64) -> Self {
        Self {
            alpha,
            state: SmoothedPoint::default(),
        }
    }

    pub fn update(&mut self, raw: RawPoint) -> SmoothedPoint {
        self.state.x += (raw.x - self.state.x) * self.alpha;
        self.state.y += (raw.y - self.state.y) * self.alpha;
        self.state
    }

    pub fn current(&self) -> SmoothedPoint {
        self.state
    }

    pub fn reset(&mut self) {
        self.state = SmoothedPoint::default();
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CursorMapper {
    mirror_x: bool,
    offset_x: f64,
    offset_y: f64,
    sensitivity_x: f64,
    sensitivity_y: f64,
    surface: Surface,
}

impl CursorMapper {
    pub fn from_config(config: &PointerConfig) -> Self {
        Self {
            mirror_x: config.mirror_x,
            offset_x: config.offset_x,
            offset_y: config.offset_y,
            sensitivity_x: config.sensitivity_x,
            sensitivity_y: config.sensitivity_y,
            surface: config.surface,
        }
    }

    pub fn surface(&self) -> Surface {
        self.surface
    }

    pub fn set_surface(&mut self, surface: Surface) {
        self.surface = surface;
    }

    pub fn map(&self, x: f64, y: f64) -> CursorState {
        let x = if self.mirror_x { 1.0 - x } else { x };
        let normalized_x = amplify(x + self.offset_x, self.sensitivity_x);
        let normalized_y = amplify(y + self.offset_y, self.sensitivity_y);

        CursorState {
            viewport_x: self.surface.left + normalized_x * self.surface.width,
            viewport_y: self.surface.top + normalized_y * self.surface.height,
            normalized_x,
            normalized_y,
        }
    }

    pub fn map_smoothed(&self, point: SmoothedPoint) -> CursorState {
        self.map(point.x, point.y)
    }
}

fn amplify(value: f64, sensitivity: f64) -> f64 {
    ((value - 0.5) * sensitivity + 0.5).clamp(0.0, 1.0)
}
