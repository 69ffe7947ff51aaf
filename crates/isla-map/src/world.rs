#![warn(missing_docs)]

//! The `World` aggregate: one grid plus the occupants standing on it.

use isla_coords::{CoordMapper, MinimalPoint, StandardPoint};
use tracing::{debug, info, warn};

use crate::error::MapError;
use crate::grid::GridIndex;
use crate::occupant::{OccupantRegistry, PositionUpdate, SessionId, UpdateOutcome};
use crate::service::{SessionIdentity, SquareService};
use crate::square::{Palette, Rgb, Square};
use crate::visibility::{LineOfSight, VisibilityEngine};

/// Default grid width, in cells.
pub const DEFAULT_MAP_WIDTH: usize = 128;

/// One colour sample from the map source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorSample {
    /// Cell the sample belongs to.
    pub cell: MinimalPoint,
    /// Sampled colour.
    pub color: Rgb,
}

impl ColorSample {
    /// Creates a new `ColorSample`.
    pub const fn new(x: i32, y: i32, color: Rgb) -> Self {
        ColorSample { cell: MinimalPoint::new(x, y), color }
    }
}

/// A player known at build time, positioned by grid cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterEntry {
    /// The player's session.
    pub session_id: SessionId,
    /// The cell the player stands on.
    pub cell: MinimalPoint,
}

impl RosterEntry {
    /// Creates a new `RosterEntry`.
    pub fn new(session_id: impl Into<SessionId>, x: i32, y: i32) -> Self {
        RosterEntry { session_id: session_id.into(), cell: MinimalPoint::new(x, y) }
    }
}

/// Fixed parameters of a map.
#[derive(Debug, Clone, PartialEq)]
pub struct MapSettings {
    /// Cells per row.
    pub width: usize,
    /// Standard <-> minimal transform.
    pub mapper: CoordMapper,
    /// Colour classification rules.
    pub palette: Palette,
}

impl Default for MapSettings {
    fn default() -> Self {
        MapSettings {
            width: DEFAULT_MAP_WIDTH,
            mapper: CoordMapper::default(),
            palette: Palette::default(),
        }
    }
}

/// Grid and occupants of one game session.
#[derive(Debug, Clone)]
pub struct World {
    grid: GridIndex,
    occupants: OccupantRegistry,
}

impl World {
    /// Builds a world from colour samples and the initial player roster.
    ///
    /// Roster entries for the local session are skipped. Once every sample is stored,
    /// spawn squares are scanned in row-major order and the first one nobody stands on
    /// receives the pirate. With no free spawn square the pirate stays absent.
    pub fn build<S, R, I>(settings: &MapSettings, samples: S, roster: R, identity: &I) -> Result<World, MapError>
    where
        S: IntoIterator<Item = ColorSample>,
        R: IntoIterator<Item = RosterEntry>,
        I: SessionIdentity + ?Sized,
    {
        let mut grid = GridIndex::new(settings.width, settings.mapper)?;
        let mut occupants = OccupantRegistry::new();

        for entry in roster {
            if identity.is_current_user(&entry.session_id) {
                debug!(session = %entry.session_id, "Skipping local session in roster");
                continue;
            }
            let position = settings.mapper.to_standard(entry.cell);
            debug!(session = %entry.session_id, %position, "Seeding remote player");
            occupants.add_player(entry.session_id, position);
        }

        for sample in samples {
            let position = settings.mapper.to_standard(sample.cell);
            grid.insert(Square::new(position, sample.cell, sample.color, &settings.palette))?;
        }

        let free_spawn = grid
            .spawn_points()
            .map(Square::position)
            .find(|p| occupants.find_by_position(*p).is_none());
        match free_spawn {
            Some(position) => {
                occupants.place_pirate(position)?;
                info!(%position, "Pirate claimed spawn point");
            }
            None => warn!("No unoccupied spawn point, pirate not placed"),
        }

        info!(
            width = grid.width(),
            squares = grid.len(),
            obstacles = grid.iter().filter(|s| s.is_obstacle()).count(),
            spawn_points = grid.spawn_points().count(),
            players = occupants.players().len(),
            "World built"
        );

        Ok(World { grid, occupants })
    }

    /// The grid.
    pub fn grid(&self) -> &GridIndex {
        &self.grid
    }

    /// The occupants.
    pub fn occupants(&self) -> &OccupantRegistry {
        &self.occupants
    }

    /// Square containing a standard point.
    pub fn square_at(&self, p: StandardPoint) -> Option<&Square> {
        self.grid.get(p)
    }

    /// Applies an inbound position update, see [`OccupantRegistry::apply_position_update`].
    pub fn apply_position_update<I>(&mut self, identity: &I, update: &PositionUpdate) -> UpdateOutcome
    where
        I: SessionIdentity + ?Sized,
    {
        let outcome = self.occupants.apply_position_update(identity, update);
        if let UpdateOutcome::Moved { from, to } = outcome {
            debug!(session = %update.session_id, %from, %to, "Player moved");
        }
        outcome
    }

    /// Line of sight between two standard points, see [`VisibilityEngine::has_line_of_sight`].
    ///
    /// May activate events on the squares it passes over.
    pub async fn has_line_of_sight<S: SquareService>(
        &mut self,
        engine: &VisibilityEngine<S>,
        from: StandardPoint,
        to: StandardPoint,
    ) -> Result<LineOfSight, MapError> {
        engine.has_line_of_sight(&mut self.grid, from, to).await
    }
}
