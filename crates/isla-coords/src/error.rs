#![warn(missing_docs)]

//! Error types for the coordinate library.

use core::fmt;

/// Errors that can occur when configuring a coordinate transform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoordError {
    /// Error for invalid tile size.
    /// This variant is returned when a tile size is provided that is not positive.
    InvalidTileSize(&'static str),
}

impl fmt::Display for CoordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoordError::InvalidTileSize(msg) => write!(f, "Invalid tile size: {}", msg),
        }
    }
}

impl core::error::Error for CoordError {}
