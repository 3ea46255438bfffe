// Core types shared across the navigation core.
//
// Defines the discrete grid coordinate (`GridIndex`), the edge classification
// tag (`EdgeType`), world-space boxes (`WorldBox`), the column range a build
// samples (`GridBounds`), and the conversions between world space and grid
// space.
//
// Grid geometry is global: columns and rows are `GRID_SPACING_XY` world units
// apart and layers are `LAYER_HEIGHT` units tall (see `config.rs`). Queries
// round to the nearest cell; bounding computations truncate inward so every
// sampled column lies inside the region it was derived from.
//
// World space is Z-up: X and Y are horizontal, Z is height.

use crate::config::{GRID_SPACING_XY, LAYER_HEIGHT};
use glam::{DVec2, DVec3};
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Grid coordinates
// ---------------------------------------------------------------------------

/// One cell of the navigation grid: column `x`, row `y`, height layer `z`.
///
/// `z` is a discretized layer, not a continuous height. Two indices name the
/// same cell iff all three components match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridIndex {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl GridIndex {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Component-wise `other - self`.
    pub fn delta_to(self, other: Self) -> [i32; 3] {
        [other.x - self.x, other.y - self.y, other.z - self.z]
    }

    /// Horizontal Euclidean distance in grid units, ignoring the layer.
    pub fn planar_distance(self, other: Self) -> f64 {
        let dx = f64::from(other.x - self.x);
        let dy = f64::from(other.y - self.y);
        (dx * dx + dy * dy).sqrt()
    }
}

impl fmt::Display for GridIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, L{})", self.x, self.y, self.z)
    }
}

/// The 8 horizontal neighbor offsets, counter-clockwise starting at +X.
pub const NEIGHBOR_OFFSETS: [(i32, i32); 8] = [
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
];

// ---------------------------------------------------------------------------
// Edge classification
// ---------------------------------------------------------------------------

/// Classification of the connection between two adjacent cells.
///
/// The discriminants are the persisted one-byte tags; do not reorder.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum EdgeType {
    /// Placeholder; never traversable.
    #[default]
    None = 0,
    /// Negligible height change.
    Direct = 1,
    /// Height change too large to climb.
    Cliff = 2,
    /// Interior of a continuous incline.
    Slope = 3,
    /// Flat ground meeting the lower end of an incline.
    SlopeBottom = 4,
    /// Flat ground meeting the upper end of an incline.
    SlopeTop = 5,
}

impl EdgeType {
    /// Whether search may expand along an edge of this type.
    pub fn is_traversable(self) -> bool {
        matches!(
            self,
            EdgeType::Direct | EdgeType::Slope | EdgeType::SlopeBottom | EdgeType::SlopeTop
        )
    }

    /// The persisted tag byte.
    pub fn tag(self) -> u8 {
        self as u8
    }

    /// Decode a persisted tag byte. Returns `None` for unknown tags.
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(EdgeType::None),
            1 => Some(EdgeType::Direct),
            2 => Some(EdgeType::Cliff),
            3 => Some(EdgeType::Slope),
            4 => Some(EdgeType::SlopeBottom),
            5 => Some(EdgeType::SlopeTop),
            _ => None,
        }
    }
}

impl fmt::Display for EdgeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

// ---------------------------------------------------------------------------
// World <-> grid conversion
// ---------------------------------------------------------------------------

/// Nearest grid cell to a world position.
pub fn world_to_grid(world: DVec3) -> GridIndex {
    GridIndex::new(
        (world.x / GRID_SPACING_XY).round() as i32,
        (world.y / GRID_SPACING_XY).round() as i32,
        layer_for_height(world.z),
    )
}

/// World position of a cell's sample point, with height at the layer floor.
pub fn grid_to_world(index: GridIndex) -> DVec3 {
    DVec3::new(
        f64::from(index.x) * GRID_SPACING_XY,
        f64::from(index.y) * GRID_SPACING_XY,
        f64::from(index.z) * LAYER_HEIGHT,
    )
}

/// Horizontal world position of a (possibly fractional) column/row.
pub fn column_to_world(x: f64, y: f64) -> DVec2 {
    DVec2::new(x * GRID_SPACING_XY, y * GRID_SPACING_XY)
}

/// Discretized layer for a continuous height.
pub fn layer_for_height(height: f64) -> i32 {
    (height / LAYER_HEIGHT).round() as i32
}

/// Horizontal world position `alpha` of the way from column `(x, y)` toward
/// its neighbor in `direction`. Each direction component is reduced to its
/// sign, so diagonals advance `alpha` of a cell on both axes.
pub fn sub_grid_to_world(x: i32, y: i32, direction: (i32, i32), alpha: f64) -> DVec2 {
    let step = DVec2::new(
        f64::from(direction.0.signum()),
        f64::from(direction.1.signum()),
    );
    column_to_world(f64::from(x), f64::from(y)) + step * alpha * GRID_SPACING_XY
}

/// Snap a world position to the nearest grid point on every axis.
pub fn round_to_grid(world: DVec3) -> DVec3 {
    DVec3::new(
        (world.x / GRID_SPACING_XY).round() * GRID_SPACING_XY,
        (world.y / GRID_SPACING_XY).round() * GRID_SPACING_XY,
        (world.z / LAYER_HEIGHT).round() * LAYER_HEIGHT,
    )
}

/// Snap a world position down to the grid point at or below it on every axis.
pub fn trunc_to_grid(world: DVec3) -> DVec3 {
    DVec3::new(
        (world.x / GRID_SPACING_XY).floor() * GRID_SPACING_XY,
        (world.y / GRID_SPACING_XY).floor() * GRID_SPACING_XY,
        (world.z / LAYER_HEIGHT).floor() * LAYER_HEIGHT,
    )
}

// ---------------------------------------------------------------------------
// Regions
// ---------------------------------------------------------------------------

/// An axis-aligned box in world units.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorldBox {
    pub min: DVec3,
    pub max: DVec3,
}

impl WorldBox {
    pub fn new(min: DVec3, max: DVec3) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    /// Inclusive containment test.
    pub fn contains(&self, point: DVec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    /// Smallest box containing both.
    pub fn union(&self, other: &WorldBox) -> WorldBox {
        WorldBox {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }
}

impl fmt::Display for WorldBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {}) to ({}, {}, {})",
            self.min.x, self.min.y, self.min.z, self.max.x, self.max.y, self.max.z
        )
    }
}

/// Inclusive column/row range sampled for a region.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridBounds {
    pub min_x: i32,
    pub max_x: i32,
    pub min_y: i32,
    pub max_y: i32,
}

impl GridBounds {
    /// Columns whose sample point lies inside `region`. Truncates inward:
    /// the minimum rounds up and the maximum rounds down.
    pub fn inside(region: &WorldBox) -> Self {
        Self {
            min_x: (region.min.x / GRID_SPACING_XY).ceil() as i32,
            max_x: (region.max.x / GRID_SPACING_XY).floor() as i32,
            min_y: (region.min.y / GRID_SPACING_XY).ceil() as i32,
            max_y: (region.max.y / GRID_SPACING_XY).floor() as i32,
        }
    }

    /// All `(x, y)` columns, `x`-major. Empty if the range is inverted.
    pub fn columns(&self) -> Vec<(i32, i32)> {
        let mut columns = Vec::new();
        for x in self.min_x..=self.max_x {
            for y in self.min_y..=self.max_y {
                columns.push((x, y));
            }
        }
        columns
    }
}
