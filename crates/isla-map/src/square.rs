#![warn(missing_docs)]

//! Grid squares and the colour rules that classify them.

use isla_coords::{MinimalPoint, StandardPoint};
use std::fmt;

/// A 24-bit `0xRRGGBB` colour sample.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb(pub u32);

impl Rgb {
    /// Black, the default obstacle colour.
    pub const BLACK: Rgb = Rgb(0x000000);
    /// Pure red, the default spawn point colour.
    pub const RED: Rgb = Rgb(0xff0000);
    /// White, open ground.
    pub const WHITE: Rgb = Rgb(0xffffff);

    /// Packs three channel bytes.
    pub const fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Rgb(((r as u32) << 16) | ((g as u32) << 8) | b as u32)
    }

    /// Parses `#rrggbb` or `rrggbb`.
    pub fn parse_hex(s: &str) -> Option<Self> {
        let digits = s.strip_prefix('#').unwrap_or(s);
        if digits.len() != 6 {
            return None;
        }
        u32::from_str_radix(digits, 16).ok().map(Rgb)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:06x}", self.0)
    }
}

/// What a colour means on the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terrain {
    /// Passable ground.
    Open,
    /// Blocks movement and line of sight.
    Obstacle,
    /// Passable ground where a player (or the pirate) may spawn.
    SpawnPoint,
}

/// Fixed colour rules used when the grid is built.
///
/// Obstacle colours are checked first, so a colour listed in both sets blocks.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    /// Colours that denote obstacles.
    pub obstacle: Vec<Rgb>,
    /// Colours that denote player spawn points.
    pub spawn: Vec<Rgb>,
}

impl Default for Palette {
    fn default() -> Self {
        Palette {
            obstacle: vec![Rgb::BLACK],
            spawn: vec![Rgb::RED],
        }
    }
}

impl Palette {
    /// Classifies a colour sample.
    pub fn classify(&self, color: Rgb) -> Terrain {
        if self.obstacle.contains(&color) {
            Terrain::Obstacle
        } else if self.spawn.contains(&color) {
            Terrain::SpawnPoint
        } else {
            Terrain::Open
        }
    }
}

/// An event attached to a square by the square service.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapEvent {
    /// Service-assigned identifier.
    pub id: u64,
    /// Free-form event kind, e.g. `"treasure"`.
    pub kind: String,
}

impl MapEvent {
    /// Creates a new `MapEvent`.
    pub fn new(id: u64, kind: impl Into<String>) -> Self {
        Self { id, kind: kind.into() }
    }
}

/// One cell of the grid.
///
/// Classification is fixed at construction; only the active event changes afterwards.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Square {
    position: StandardPoint,
    cell: MinimalPoint,
    color: Rgb,
    is_obstacle: bool,
    is_player_spawn_point: bool,
    active_event: Option<MapEvent>,
}

impl Square {
    /// Creates a square at `cell` (anchored at `position`) classified by `palette`.
    pub fn new(position: StandardPoint, cell: MinimalPoint, color: Rgb, palette: &Palette) -> Self {
        let terrain = palette.classify(color);
        Square {
            position,
            cell,
            color,
            is_obstacle: terrain == Terrain::Obstacle,
            is_player_spawn_point: terrain == Terrain::SpawnPoint,
            active_event: None,
        }
    }

    /// Standard coordinates of the square's anchor.
    pub fn position(&self) -> StandardPoint {
        self.position
    }

    /// Standard x.
    pub fn x(&self) -> i32 {
        self.position.x
    }

    /// Standard y.
    pub fn y(&self) -> i32 {
        self.position.y
    }

    /// Minimal grid cell.
    pub fn cell(&self) -> MinimalPoint {
        self.cell
    }

    /// Colour the square was built from.
    pub fn color(&self) -> Rgb {
        self.color
    }

    /// Whether the square blocks line of sight.
    pub fn is_obstacle(&self) -> bool {
        self.is_obstacle
    }

    /// Whether players may spawn here.
    pub fn is_player_spawn_point(&self) -> bool {
        self.is_player_spawn_point
    }

    /// The most recently activated event, if any.
    pub fn active_event(&self) -> Option<&MapEvent> {
        self.active_event.as_ref()
    }

    /// Sets the active event, returning the one it replaced.
    pub fn activate_event(&mut self, event: MapEvent) -> Option<MapEvent> {
        self.active_event.replace(event)
    }
}
