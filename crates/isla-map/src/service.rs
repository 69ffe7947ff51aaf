//! Seams to the collaborators the map talks to but does not own: the square
//! service that persists visited squares and the session identity of the local user.

use std::future::Future;
use std::sync::Arc;

use crate::occupant::SessionId;
use crate::square::MapEvent;

/// Square state as reported back by [`SquareService::save`].
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SavedSquareState {
    /// Event now active on the square, if the service triggered one.
    pub event: Option<MapEvent>,
}

/// Response envelope of [`SquareService::save`], shaped `{ square: { event } }`.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SavedSquare {
    /// The saved square.
    pub square: SavedSquareState,
}

impl SavedSquare {
    /// A response with no event.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A response carrying `event`.
    pub fn with_event(event: MapEvent) -> Self {
        SavedSquare { square: SavedSquareState { event: Some(event) } }
    }
}

/// Remote service told about every square a line-of-sight scan passes over.
pub trait SquareService {
    /// Error returned when the service cannot be reached or rejects the call.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Records a visit to the square anchored at `(x, y)` in standard coordinates.
    fn save(
        &self,
        x: i32,
        y: i32,
        is_destination: bool,
    ) -> impl Future<Output = Result<SavedSquare, Self::Error>> + Send;
}

impl<T: SquareService + Send + Sync> SquareService for Arc<T> {
    type Error = T::Error;

    fn save(
        &self,
        x: i32,
        y: i32,
        is_destination: bool,
    ) -> impl Future<Output = Result<SavedSquare, Self::Error>> + Send {
        (**self).save(x, y, is_destination)
    }
}

/// Knows which session belongs to the local user.
pub trait SessionIdentity {
    /// Whether `id` is the local user's own session.
    fn is_current_user(&self, id: &SessionId) -> bool;
}

/// The plain identity: a single known local session id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalSession(pub SessionId);

impl LocalSession {
    /// Creates a new `LocalSession`.
    pub fn new(id: impl Into<SessionId>) -> Self {
        LocalSession(id.into())
    }
}

impl SessionIdentity for LocalSession {
    fn is_current_user(&self, id: &SessionId) -> bool {
        self.0 == *id
    }
}

impl<T: SessionIdentity + ?Sized> SessionIdentity for &T {
    fn is_current_user(&self, id: &SessionId) -> bool {
        (**self).is_current_user(id)
    }
}

impl<T: SessionIdentity + ?Sized> SessionIdentity for Arc<T> {
    fn is_current_user(&self, id: &SessionId) -> bool {
        (**self).is_current_user(id)
    }
}
