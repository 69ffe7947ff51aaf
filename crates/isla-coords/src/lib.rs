#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]
#![doc = "A `no_std` library for the two coordinate systems of the isla map."]
#![doc = ""]
#![doc = "Standard coordinates are the world-scale units used by rendering and position"]
#![doc = "messages. Minimal coordinates are the compact grid-cell units used for indexing."]
#![doc = "[`CoordMapper`] converts between the two with a fixed tile size and origin."]

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub mod error;
pub use error::CoordError;

/// A point in standard (world-scale) coordinates.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StandardPoint {
    /// World x position.
    pub x: i32,
    /// World y position.
    pub y: i32,
}

impl StandardPoint {
    /// Creates a new `StandardPoint`.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for StandardPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A point in minimal (grid-cell) coordinates.
///
/// Components are signed so that [`CoordMapper::to_minimal`] is total over every
/// standard input; grids reject cells outside their own bounds.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MinimalPoint {
    /// Column index.
    pub x: i32,
    /// Row index.
    pub y: i32,
}

impl MinimalPoint {
    /// Creates a new `MinimalPoint`.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for MinimalPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.x, self.y)
    }
}

/// Bidirectional transform between standard and minimal coordinates.
///
/// A minimal cell `m` is anchored at `origin + m * tile_size` in standard units and
/// covers the half-open square `[anchor, anchor + tile_size)` on both axes.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordMapper {
    tile_size: i32,
    origin: StandardPoint,
}

impl Default for CoordMapper {
    /// The identity transform: tile size 1, origin at zero.
    fn default() -> Self {
        Self {
            tile_size: 1,
            origin: StandardPoint::new(0, 0),
        }
    }
}

impl CoordMapper {
    /// Construct a new mapper.
    ///
    /// # Arguments
    ///
    /// * `tile_size`: Edge length of one grid cell in standard units. Must be positive.
    /// * `origin`: Standard coordinates of minimal cell `(0, 0)`.
    ///
    /// # Returns
    ///
    /// * `Result<Self, CoordError>` - The mapper or an error if the tile size is not positive.
    pub const fn new(tile_size: i32, origin: StandardPoint) -> Result<Self, CoordError> {
        if tile_size <= 0 {
            return Err(CoordError::InvalidTileSize("must be positive"));
        }
        Ok(Self { tile_size, origin })
    }

    /// Edge length of one cell in standard units.
    pub const fn tile_size(&self) -> i32 {
        self.tile_size
    }

    /// Standard coordinates of minimal cell `(0, 0)`.
    pub const fn origin(&self) -> StandardPoint {
        self.origin
    }

    /// Converts a standard point to the minimal cell containing it.
    ///
    /// Uses floor semantics, so negative offsets land in negative cells rather than
    /// being truncated towards zero.
    pub fn to_minimal(&self, p: StandardPoint) -> MinimalPoint {
        MinimalPoint::new(
            p.x.saturating_sub(self.origin.x).div_euclid(self.tile_size),
            p.y.saturating_sub(self.origin.y).div_euclid(self.tile_size),
        )
    }

    /// Converts a minimal cell to its standard anchor point.
    pub fn to_standard(&self, m: MinimalPoint) -> StandardPoint {
        StandardPoint::new(
            m.x.saturating_mul(self.tile_size).saturating_add(self.origin.x),
            m.y.saturating_mul(self.tile_size).saturating_add(self.origin.y),
        )
    }

    /// Like [`to_standard`](Self::to_standard), but `None` where the anchor does not fit
    /// in `i32` instead of saturating.
    pub fn checked_to_standard(&self, m: MinimalPoint) -> Option<StandardPoint> {
        Some(StandardPoint::new(
            m.x.checked_mul(self.tile_size)?.checked_add(self.origin.x)?,
            m.y.checked_mul(self.tile_size)?.checked_add(self.origin.y)?,
        ))
    }

    /// `to_minimal` on raw components.
    pub fn to_minimal_xy(&self, x: i32, y: i32) -> MinimalPoint {
        self.to_minimal(StandardPoint::new(x, y))
    }

    /// `to_standard` on raw components.
    pub fn to_standard_xy(&self, mx: i32, my: i32) -> StandardPoint {
        self.to_standard(MinimalPoint::new(mx, my))
    }
}

impl fmt::Display for CoordMapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CoordMapper (tile: {}, origin: {})", self.tile_size, self.origin)
    }
}
