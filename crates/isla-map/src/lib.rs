//! Square map of an isla session.
//!
//! A [`World`] owns the [`GridIndex`] of squares and the [`OccupantRegistry`] of
//! players and the pirate. The [`VisibilityEngine`] answers line-of-sight queries over
//! the grid and reports every visited square to a [`SquareService`], which may attach
//! events to them. [`run_world_task`] serves a world from a position feed and a
//! command channel.

pub mod error;
pub mod grid;
pub mod occupant;
pub mod service;
pub mod square;
pub mod task;
pub mod visibility;
pub mod world;

pub use isla_coords::{CoordError, CoordMapper, MinimalPoint, StandardPoint};

pub use error::MapError;
pub use grid::GridIndex;
pub use occupant::{Occupant, OccupantKind, OccupantRegistry, PositionUpdate, SessionId, UpdateOutcome};
pub use service::{LocalSession, SavedSquare, SavedSquareState, SessionIdentity, SquareService};
pub use square::{MapEvent, Palette, Rgb, Square, Terrain};
pub use task::{WorldCommand, WorldHandle, run_world_task};
pub use visibility::{Activation, LineOfSight, LineTrace, VisibilityEngine};
pub use world::{ColorSample, DEFAULT_MAP_WIDTH, MapSettings, RosterEntry, World};
