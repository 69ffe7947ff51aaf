#![warn(missing_docs)]

//! Remote players and the pirate, each bound to a standard position.

use isla_coords::StandardPoint;
use std::fmt;
use tracing::debug;

use crate::error::MapError;
use crate::service::SessionIdentity;

/// Network session identifier of a player.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(pub String);

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        SessionId(value.to_owned())
    }
}

impl From<String> for SessionId {
    fn from(value: String) -> Self {
        SessionId(value)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Who an occupant is.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OccupantKind {
    /// A remote player.
    Player(SessionId),
    /// The single non-player occupant.
    Pirate,
}

/// An entity bound to a grid position.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occupant {
    /// Identity.
    pub kind: OccupantKind,
    /// Current position in standard coordinates.
    pub position: StandardPoint,
}

impl Occupant {
    /// A remote player at `position`.
    pub fn player(session_id: SessionId, position: StandardPoint) -> Self {
        Occupant { kind: OccupantKind::Player(session_id), position }
    }

    /// The pirate at `position`.
    pub fn pirate(position: StandardPoint) -> Self {
        Occupant { kind: OccupantKind::Pirate, position }
    }

    /// Session id for players, `None` for the pirate.
    pub fn session_id(&self) -> Option<&SessionId> {
        match &self.kind {
            OccupantKind::Player(id) => Some(id),
            OccupantKind::Pirate => None,
        }
    }

    /// Whether this is the pirate.
    pub fn is_pirate(&self) -> bool {
        self.kind == OccupantKind::Pirate
    }
}

/// Inbound position message, in standard coordinates.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionUpdate {
    /// Session the update is about.
    pub session_id: SessionId,
    /// New position.
    pub position: StandardPoint,
}

impl PositionUpdate {
    /// Creates a new `PositionUpdate`.
    pub fn new(session_id: impl Into<SessionId>, x: i32, y: i32) -> Self {
        PositionUpdate { session_id: session_id.into(), position: StandardPoint::new(x, y) }
    }
}

/// What [`OccupantRegistry::apply_position_update`] did with an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The update was an echo of the local session and was not applied.
    IgnoredSelf,
    /// No player has the update's session id.
    Dropped,
    /// A player was moved.
    Moved {
        /// Previous position.
        from: StandardPoint,
        /// New position.
        to: StandardPoint,
    },
}

/// Every known remote player plus the pirate.
#[derive(Debug, Clone, Default)]
pub struct OccupantRegistry {
    players: Vec<Occupant>,
    pirate: Option<Occupant>,
}

impl OccupantRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a remote player.
    pub fn add_player(&mut self, session_id: SessionId, position: StandardPoint) {
        self.players.push(Occupant::player(session_id, position));
    }

    /// Places the pirate. The pirate exists at most once per registry.
    pub fn place_pirate(&mut self, position: StandardPoint) -> Result<(), MapError> {
        if let Some(existing) = &self.pirate {
            return Err(MapError::PirateAlreadyPlaced(existing.position));
        }
        self.pirate = Some(Occupant::pirate(position));
        Ok(())
    }

    /// Remote players in registration order.
    pub fn players(&self) -> &[Occupant] {
        &self.players
    }

    /// The pirate, once placed.
    pub fn pirate(&self) -> Option<&Occupant> {
        self.pirate.as_ref()
    }

    /// Players followed by the pirate.
    pub fn iter(&self) -> impl Iterator<Item = &Occupant> {
        self.players.iter().chain(self.pirate.iter())
    }

    /// Number of occupants, pirate included.
    pub fn len(&self) -> usize {
        self.players.len() + usize::from(self.pirate.is_some())
    }

    /// Whether there are no occupants at all.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Occupant standing exactly on `p`, if any.
    pub fn find_by_position(&self, p: StandardPoint) -> Option<&Occupant> {
        self.iter().find(|occupant| occupant.position == p)
    }

    /// Player with the given session id.
    pub fn find_by_session(&self, id: &SessionId) -> Option<&Occupant> {
        self.players.iter().find(|occupant| occupant.session_id() == Some(id))
    }

    /// Applies an inbound position update.
    ///
    /// Echoes of the local session are ignored and unknown sessions are dropped;
    /// updates never create occupants.
    pub fn apply_position_update<I>(&mut self, identity: &I, update: &PositionUpdate) -> UpdateOutcome
    where
        I: SessionIdentity + ?Sized,
    {
        if identity.is_current_user(&update.session_id) {
            return UpdateOutcome::IgnoredSelf;
        }

        let Some(player) = self
            .players
            .iter_mut()
            .find(|occupant| occupant.session_id() == Some(&update.session_id))
        else {
            debug!(session = %update.session_id, "Dropping position update for unknown session");
            return UpdateOutcome::Dropped;
        };

        let from = player.position;
        player.position = update.position;
        UpdateOutcome::Moved { from, to: update.position }
    }
}
