use std::collections::{HashMap, HashSet};
use std::time::Duration;

use isla_coords::{CoordMapper, StandardPoint};
use isla_map::{MapEvent, SavedSquare, SquareService};
use parking_lot::Mutex;
use thiserror::Error;
use tracing::debug;

use crate::config::Settings;

#[derive(Debug, Error)]
pub enum SquareServiceError {
    #[error("Square service unavailable for square ({x}, {y})")]
    Unavailable { x: i32, y: i32 },
}

#[derive(Debug, Default)]
struct Ledger {
    saves: u64,
    destination_saves: u64,
    triggered: HashSet<StandardPoint>,
}

/// Stand-in for the remote square service.
///
/// Each planted event fires on the first save of its square and never again.
#[derive(Debug, Default)]
pub struct InMemorySquareService {
    events: HashMap<StandardPoint, MapEvent>,
    outages: HashSet<StandardPoint>,
    latency: Duration,
    ledger: Mutex<Ledger>,
}

impl InMemorySquareService {
    pub fn new(latency: Duration) -> Self {
        Self { latency, ..Self::default() }
    }

    pub fn from_settings(settings: &Settings, mapper: &CoordMapper) -> Self {
        let mut service = Self::new(Duration::from_millis(settings.service.latency_ms));
        for event in &settings.events {
            service.plant(mapper.to_standard_xy(event.x, event.y), MapEvent::new(event.id, event.kind.clone()));
        }
        for outage in &settings.service.outages {
            service.fail_at(mapper.to_standard(outage.cell()));
        }
        service
    }

    pub fn plant(&mut self, square: StandardPoint, event: MapEvent) {
        self.events.insert(square, event);
    }

    pub fn fail_at(&mut self, square: StandardPoint) {
        self.outages.insert(square);
    }

    /// Total saves and saves flagged as a destination hit.
    pub fn save_counts(&self) -> (u64, u64) {
        let ledger = self.ledger.lock();
        (ledger.saves, ledger.destination_saves)
    }

    pub fn triggered(&self) -> usize {
        self.ledger.lock().triggered.len()
    }
}

impl SquareService for InMemorySquareService {
    type Error = SquareServiceError;

    async fn save(&self, x: i32, y: i32, is_destination: bool) -> Result<SavedSquare, SquareServiceError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let square = StandardPoint::new(x, y);
        if self.outages.contains(&square) {
            return Err(SquareServiceError::Unavailable { x, y });
        }

        let mut ledger = self.ledger.lock();
        ledger.saves += 1;
        if is_destination {
            ledger.destination_saves += 1;
        }

        match self.events.get(&square) {
            Some(event) if ledger.triggered.insert(square) => {
                debug!(%square, kind = %event.kind, "Square service triggered event");
                Ok(SavedSquare::with_event(event.clone()))
            }
            _ => Ok(SavedSquare::empty()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_event_fires_once() {
        let mut service = InMemorySquareService::default();
        service.plant(StandardPoint::new(16, 16), MapEvent::new(1, "treasure"));

        let first = service.save(16, 16, true).await.unwrap();
        assert_eq!(first.square.event, Some(MapEvent::new(1, "treasure")));
        let second = service.save(16, 16, false).await.unwrap();
        assert_eq!(second.square.event, None);

        assert_eq!(service.save_counts(), (2, 1));
        assert_eq!(service.triggered(), 1);
    }

    #[tokio::test]
    async fn test_plain_square_has_no_event() {
        let service = InMemorySquareService::default();
        assert_eq!(service.save(0, 0, true).await.unwrap(), SavedSquare::empty());
    }

    #[tokio::test]
    async fn test_outage_fails_without_counting() {
        let mut service = InMemorySquareService::new(Duration::from_millis(1));
        service.fail_at(StandardPoint::new(32, 0));

        let result = service.save(32, 0, true).await;
        assert!(matches!(result, Err(SquareServiceError::Unavailable { x: 32, y: 0 })));
        assert_eq!(service.save_counts(), (0, 0));
    }
}
