//! Hover target resolution.
//!
//! The UI layer hands over a priority-ordered list of [`InteractiveTarget`]
//! value objects every cycle; the resolver picks at most one of them as the
//! current dwell candidate. Disabled targets are never eligible.

use serde::{Deserialize, Serialize};

use crate::config::HoverConfig;
use crate::pointer::CursorState;

/// Strips used when integrating the disc/rectangle intersection.
const OVERLAP_STRIPS: usize = 64;
const RATIO_EPSILON: f64 = 1e-9;

/// Axis-aligned rectangle in viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            right: left + width,
            bottom: top + height,
        }
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.left && x <= self.right && y >= self.top && y <= self.bottom
    }

    pub fn inflate(&self, by: f64) -> Self {
        Self {
            left: self.left - by,
            top: self.top - by,
            right: self.right + by,
            bottom: self.bottom + by,
        }
    }
}

/// One selectable control. `value` is the symbolic key value handed to the
/// text interpreter when the target is selected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractiveTarget {
    pub id: String,
    pub rect: Rect,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    pub value: String,
}

fn default_enabled() -> bool {
    true
}

impl InteractiveTarget {
    pub fn new(id: impl Into<String>, rect: Rect, value: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            rect,
            enabled: true,
            value: value.into(),
        }
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

/// Supplies the live target list for one resolution cycle.
pub trait TargetProvider {
    fn targets(&self) -> &[InteractiveTarget];
}

impl TargetProvider for [InteractiveTarget] {
    fn targets(&self) -> &[InteractiveTarget] {
        self
    }
}

impl TargetProvider for Vec<InteractiveTarget> {
    fn targets(&self) -> &[InteractiveTarget] {
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HoverStrategy {
    /// First-listed target whose (tolerance-inflated) rectangle contains the cursor.
    PointInRect,
    /// Target covering the largest share of the cursor disc, above a minimum ratio.
    OverlapRatio,
}

#[derive(Debug, Clone)]
pub struct TargetResolver {
    strategy: HoverStrategy,
    radius: f64,
    min_overlap_ratio: f64,
    edge_tolerance: f64,
}

impl TargetResolver {
    pub fn from_config(config: &HoverConfig) -> Self {
        Self {
            strategy: config.strategy,
            radius: config.cursor_radius_px,
            min_overlap_ratio: config.min_overlap_ratio,
            edge_tolerance: config.edge_tolerance_px,
        }
    }

    pub fn resolve<'a>(
        &self,
        cursor: &CursorState,
        targets: &'a [InteractiveTarget],
    ) -> Option<&'a InteractiveTarget> {
        let (x, y) = (cursor.viewport_x, cursor.viewport_y);
        let mut eligible = targets.iter().filter(|t| t.enabled);

        match self.strategy {
            HoverStrategy::PointInRect => {
                eligible.find(|t| t.rect.inflate(self.edge_tolerance).contains(x, y))
            }
            HoverStrategy::OverlapRatio => {
                let mut best: Option<(&InteractiveTarget, f64)> = None;
                for target in eligible {
                    let ratio = overlap_ratio(x, y, self.radius, &target.rect);
                    if ratio < self.min_overlap_ratio {
                        continue;
                    }
                    // Ties (within rounding) keep the first-listed target.
                    if best.map_or(true, |(_, r)| ratio > r + RATIO_EPSILON) {
                        best = Some((target, ratio));
                    }
                }
                best.map(|(t, _)| t)
            }
        }
    }
}

/// Share of the disc centred at `(cx, cy)` that lies inside `rect`, in `[0, 1]`.
///
/// Integrates the clipped chord length over vertical strips (midpoint rule).
pub fn overlap_ratio(cx: f64, cy: f64, radius: f64, rect: &Rect) -> f64 {
    let x0 = rect.left.max(cx - radius);
    let x1 = rect.right.min(cx + radius);
    if x0 >= x1 || rect.top >= cy + radius || rect.bottom <= cy - radius {
        return 0.0;
    }

    let step = (x1 - x0) / OVERLAP_STRIPS as f64;
    let r2 = radius * radius;
    let mut area = 0.0;
    for i in 0..OVERLAP_STRIPS {
        let x = x0 + (i as f64 + 0.5) * step;
        let dx = x - cx;
        let half = (r2 - dx * dx).max(0.0).sqrt();
        let lo = rect.top.max(cy - half);
        let hi = rect.bottom.min(cy + half);
        if hi > lo {
            area += (hi - lo) * step;
        }
    }

    (area / (std::f64::consts::PI * r2)).clamp(0.0, 1.0)
}
