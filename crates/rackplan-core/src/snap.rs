//! Snapping tiers used by placement.
//!
//! Devices snap to the nearest collision-free unit, infrastructure snaps
//! flush against the edge of a neighbour, and a lone rack snaps to the grid.

use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Grid size for snapping.
pub const GRID_SIZE: f64 = 20.0;

/// Grid snapping for free-standing drops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SnapMode {
    /// No snapping.
    None,
    /// Snap to grid intersections.
    #[default]
    Grid,
}

/// Snap a point to the nearest grid intersection.
pub fn snap_to_grid(point: Point, grid_size: f64) -> Point {
    Point::new(
        (point.x / grid_size).round() * grid_size,
        (point.y / grid_size).round() * grid_size,
    )
}

/// Snap a point based on the snap mode.
pub fn snap_point(point: Point, mode: SnapMode, grid_size: f64) -> Point {
    match mode {
        SnapMode::None => point,
        SnapMode::Grid => snap_to_grid(point, grid_size),
    }
}

/// Pick the member of `zones` closest to `ideal`.
///
/// `zones` must be ascending; on a tie the lower unit wins.
pub fn snap_unit(ideal: u32, zones: &[u32]) -> Option<u32> {
    let mut best: Option<(u32, u32)> = None;
    for &unit in zones {
        let dist = unit.abs_diff(ideal);
        if best.is_none_or(|(_, best_dist)| dist < best_dist) {
            best = Some((unit, dist));
        }
    }
    best.map(|(unit, _)| unit)
}

/// Horizontal direction relative to a reference element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    /// Side of `reference_x` that `x` falls on. Exactly centered counts as right.
    pub fn of(x: f64, reference_x: f64) -> Self {
        if x < reference_x { Side::Left } else { Side::Right }
    }

    /// Unit direction along the x axis.
    pub fn direction(self) -> f64 {
        match self {
            Side::Left => -1.0,
            Side::Right => 1.0,
        }
    }
}

/// Left edge X of a box of `width` placed flush against `edge` on `side`.
///
/// For [`Side::Right`] the box starts at `edge`; for [`Side::Left`] it ends there.
pub fn flush_against(edge: f64, width: f64, side: Side) -> f64 {
    match side {
        Side::Right => edge,
        Side::Left => edge - width,
    }
}
