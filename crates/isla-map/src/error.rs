//! This module defines the error types used by the `isla-map` crate.

#![warn(missing_docs)]

use isla_coords::{CoordError, MinimalPoint, StandardPoint};
use thiserror::Error;

/// Error type for map operations.
///
/// Lookups outside the grid and position updates for unknown sessions are not
/// errors; they surface as `None` and [`crate::UpdateOutcome::Dropped`].
#[derive(Debug, Error)]
pub enum MapError {
    /// The grid width is zero or `width * width` overflows.
    #[error("Invalid map dimensions: {0}")]
    InvalidDimensions(&'static str),
    /// A colour sample names a cell outside `[0, width)²`.
    #[error("Colour sample {cell} is outside a {width}x{width} grid")]
    SampleOutOfBounds {
        /// The offending cell.
        cell: MinimalPoint,
        /// Grid width.
        width: usize,
    },
    /// Two colour samples name the same cell.
    #[error("Colour sample {0} was supplied twice")]
    DuplicateSample(MinimalPoint),
    /// The pirate may only be placed once per world.
    #[error("Pirate is already placed at {0}")]
    PirateAlreadyPlaced(StandardPoint),
    /// Invalid coordinate transform parameters.
    #[error("Invalid coordinate transform: {0}")]
    Coordinates(#[from] CoordError),
    /// The square service failed while a line-of-sight scan was visiting `at`.
    #[error("Square service failed at {at}")]
    SquareService {
        /// Standard coordinates of the square being saved.
        at: StandardPoint,
        /// The service's own error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },
}
