//! Line of sight over the grid.
//!
//! Rasterizes the segment between two standard points with Bresenham's algorithm and
//! walks it cell by cell. Every populated square on the way is reported to the
//! [`SquareService`], which may attach an event to it, so a visibility check is also a
//! map mutation. [`LineOfSight`] lists every mutation it made.

use isla_coords::{MinimalPoint, StandardPoint};
use tracing::{debug, trace};

use crate::error::MapError;
use crate::grid::GridIndex;
use crate::service::SquareService;
use crate::square::MapEvent;

/// Integer Bresenham walk from `start` (inclusive) to `end` (exclusive).
///
/// Step signs use a strict `<`, so an axis with equal endpoints steps by `-1`. That
/// axis never actually moves because its delta is zero.
#[derive(Debug, Clone)]
pub struct LineTrace {
    x: i64,
    y: i64,
    end_x: i64,
    end_y: i64,
    dx: i64,
    dy: i64,
    sx: i64,
    sy: i64,
    err: i64,
}

impl LineTrace {
    /// Starts a trace. `i64` arithmetic keeps `2 * err` exact for any `i32` endpoints.
    pub fn new(start: StandardPoint, end: StandardPoint) -> Self {
        let (x1, y1) = (i64::from(start.x), i64::from(start.y));
        let (x2, y2) = (i64::from(end.x), i64::from(end.y));
        let dx = (x2 - x1).abs();
        let dy = (y2 - y1).abs();
        LineTrace {
            x: x1,
            y: y1,
            end_x: x2,
            end_y: y2,
            dx,
            dy,
            sx: if x1 < x2 { 1 } else { -1 },
            sy: if y1 < y2 { 1 } else { -1 },
            err: dx - dy,
        }
    }

    /// Horizontal and vertical step signs.
    pub fn step_signs(&self) -> (i64, i64) {
        (self.sx, self.sy)
    }

    /// Whether the walk has reached `end`.
    pub fn is_finished(&self) -> bool {
        self.x == self.end_x && self.y == self.end_y
    }
}

impl Iterator for LineTrace {
    type Item = StandardPoint;

    fn next(&mut self) -> Option<StandardPoint> {
        if self.is_finished() {
            return None;
        }

        // Stays between the two i32 endpoints
        let current = StandardPoint::new(self.x as i32, self.y as i32);

        let e2 = 2 * self.err;
        if e2 > -self.dy {
            self.err -= self.dy;
            self.x += self.sx;
        }
        if e2 < self.dx {
            self.err += self.dx;
            self.y += self.sy;
        }

        Some(current)
    }
}

impl std::iter::FusedIterator for LineTrace {}

/// An event applied to a square while tracing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activation {
    /// Standard anchor of the square.
    pub square: StandardPoint,
    /// Grid cell of the square.
    pub cell: MinimalPoint,
    /// Event now active on the square.
    pub event: MapEvent,
    /// Event it replaced, if any.
    pub replaced: Option<MapEvent>,
}

/// Outcome of a line-of-sight check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineOfSight {
    /// Whether no obstacle lies on the path.
    pub clear: bool,
    /// Points the trace stepped on, in order. The destination is never included.
    pub visited: Vec<StandardPoint>,
    /// Point whose square stopped the trace.
    pub blocked_at: Option<StandardPoint>,
    /// Square mutations made by the square service, in order.
    pub activations: Vec<Activation>,
}

impl LineOfSight {
    /// Whether no obstacle lies on the path.
    pub fn is_clear(&self) -> bool {
        self.clear
    }
}

/// Computes line of sight and forwards every visited square to a [`SquareService`].
#[derive(Debug, Clone)]
pub struct VisibilityEngine<S> {
    service: S,
}

impl<S: SquareService> VisibilityEngine<S> {
    /// Creates an engine backed by `service`.
    pub fn new(service: S) -> Self {
        VisibilityEngine { service }
    }

    /// The square service.
    pub fn service(&self) -> &S {
        &self.service
    }

    /// Checks whether the straight path from `from` to `to` is free of obstacles.
    ///
    /// For each traced point, in order: the square there (if any) is saved to the
    /// service and any returned event is activated on it, then an obstacle square ends
    /// the trace. Points without a square are passable and are not reported. The
    /// destination point is never visited, and `from == to` visits nothing.
    ///
    /// Service calls are awaited one at a time. A failed call aborts the trace with
    /// [`MapError::SquareService`]; events activated before it stay applied.
    pub async fn has_line_of_sight(
        &self,
        grid: &mut GridIndex,
        from: StandardPoint,
        to: StandardPoint,
    ) -> Result<LineOfSight, MapError> {
        let mut result = LineOfSight::default();

        for point in LineTrace::new(from, to) {
            result.visited.push(point);

            let Some(square) = grid.get_mut(point) else {
                trace!(%point, "No square on traced point");
                continue;
            };

            // Landing exactly on the square's anchor counts as arriving at it
            let anchor = square.position();
            let is_destination = point == anchor;
            let saved = self
                .service
                .save(anchor.x, anchor.y, is_destination)
                .await
                .map_err(|e| MapError::SquareService { at: anchor, source: Box::new(e) })?;

            if let Some(event) = saved.square.event {
                debug!(square = %anchor, event_id = event.id, kind = %event.kind, "Activating map event");
                let replaced = square.activate_event(event.clone());
                result.activations.push(Activation { square: anchor, cell: square.cell(), event, replaced });
            }

            if square.is_obstacle() {
                debug!(%from, %to, obstacle = %anchor, "Line of sight blocked");
                result.blocked_at = Some(point);
                return Ok(result);
            }
        }

        result.clear = true;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::SavedSquare;
    use crate::square::{Palette, Rgb, Square};
    use isla_coords::CoordMapper;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Debug, thiserror::Error)]
    #[error("square service offline")]
    struct Offline;

    /// Records every save and answers from a fixed event table.
    #[derive(Default)]
    struct RecordingService {
        calls: Mutex<Vec<(i32, i32, bool)>>,
        events: HashMap<(i32, i32), MapEvent>,
        fail_at: Option<(i32, i32)>,
    }

    impl RecordingService {
        fn calls(&self) -> Vec<(i32, i32, bool)> {
            self.calls.lock().unwrap().clone()
        }

        fn called_points(&self) -> Vec<(i32, i32)> {
            self.calls().into_iter().map(|(x, y, _)| (x, y)).collect()
        }
    }

    impl SquareService for RecordingService {
        type Error = Offline;

        async fn save(&self, x: i32, y: i32, is_destination: bool) -> Result<SavedSquare, Offline> {
            self.calls.lock().unwrap().push((x, y, is_destination));
            if self.fail_at == Some((x, y)) {
                return Err(Offline);
            }
            Ok(match self.events.get(&(x, y)) {
                Some(event) => SavedSquare::with_event(event.clone()),
                None => SavedSquare::empty(),
            })
        }
    }

    /// Fully populated open grid with obstacles at the given cells.
    fn grid_with(width: usize, mapper: CoordMapper, obstacles: &[(i32, i32)]) -> GridIndex {
        let mut grid = GridIndex::new(width, mapper).unwrap();
        let palette = Palette::default();
        for y in 0..width as i32 {
            for x in 0..width as i32 {
                let cell = MinimalPoint::new(x, y);
                let color = if obstacles.contains(&(x, y)) { Rgb::BLACK } else { Rgb::WHITE };
                grid.insert(Square::new(mapper.to_standard(cell), cell, color, &palette)).unwrap();
            }
        }
        grid
    }

    fn p(x: i32, y: i32) -> StandardPoint {
        StandardPoint::new(x, y)
    }

    #[test]
    fn test_trace_excludes_destination() {
        let points: Vec<_> = LineTrace::new(p(0, 0), p(3, 0)).collect();
        assert_eq!(points, vec![p(0, 0), p(1, 0), p(2, 0)]);
    }

    #[test]
    fn test_trace_degenerate_is_empty() {
        let mut trace = LineTrace::new(p(2, 2), p(2, 2));
        assert!(trace.is_finished());
        assert_eq!(trace.next(), None);
    }

    #[test]
    fn test_trace_tie_break_signs() {
        // Equal coordinates use the "else" branch of the strict comparison
        assert_eq!(LineTrace::new(p(2, 2), p(2, 2)).step_signs(), (-1, -1));
        assert_eq!(LineTrace::new(p(2, 0), p(2, 5)).step_signs(), (-1, 1));
        assert_eq!(LineTrace::new(p(0, 4), p(3, 4)).step_signs(), (1, -1));

        // The tied axis has no delta, so it still never moves
        let vertical: Vec<_> = LineTrace::new(p(2, 0), p(2, 3)).collect();
        assert_eq!(vertical, vec![p(2, 0), p(2, 1), p(2, 2)]);
    }

    #[test]
    fn test_trace_diagonal_steps_both_axes() {
        let points: Vec<_> = LineTrace::new(p(0, 0), p(3, 3)).collect();
        assert_eq!(points, vec![p(0, 0), p(1, 1), p(2, 2)]);

        let reversed: Vec<_> = LineTrace::new(p(3, 3), p(0, 0)).collect();
        assert_eq!(reversed, vec![p(3, 3), p(2, 2), p(1, 1)]);
    }

    #[test]
    fn test_trace_shallow_slope() {
        let points: Vec<_> = LineTrace::new(p(0, 0), p(5, 2)).collect();
        assert_eq!(points, vec![p(0, 0), p(1, 0), p(2, 1), p(3, 1), p(4, 2)]);
    }

    #[test]
    fn test_trace_extreme_endpoints() {
        let mut trace = LineTrace::new(p(i32::MIN, i32::MIN), p(i32::MAX, i32::MAX));
        assert_eq!(trace.next(), Some(p(i32::MIN, i32::MIN)));
        assert_eq!(trace.next(), Some(p(i32::MIN + 1, i32::MIN + 1)));
    }

    #[tokio::test]
    async fn test_obstacle_short_circuits() {
        let mut grid = grid_with(8, CoordMapper::default(), &[(3, 0)]);
        let engine = VisibilityEngine::new(RecordingService::default());

        let los = engine.has_line_of_sight(&mut grid, p(0, 0), p(5, 0)).await.unwrap();

        assert!(!los.is_clear());
        assert_eq!(los.blocked_at, Some(p(3, 0)));
        // The obstacle itself is reported, nothing beyond it is
        assert_eq!(engine.service().called_points(), vec![(0, 0), (1, 0), (2, 0), (3, 0)]);
        assert_eq!(los.visited, vec![p(0, 0), p(1, 0), p(2, 0), p(3, 0)]);
    }

    #[tokio::test]
    async fn test_clear_path_skips_destination() {
        let mut grid = grid_with(8, CoordMapper::default(), &[]);
        let engine = VisibilityEngine::new(RecordingService::default());

        let los = engine.has_line_of_sight(&mut grid, p(0, 0), p(3, 0)).await.unwrap();

        assert!(los.is_clear());
        assert_eq!(los.blocked_at, None);
        assert_eq!(
            engine.service().calls(),
            vec![(0, 0, true), (1, 0, true), (2, 0, true)]
        );
    }

    #[tokio::test]
    async fn test_same_point_reports_nothing() {
        let mut grid = grid_with(8, CoordMapper::default(), &[(2, 2)]);
        let engine = VisibilityEngine::new(RecordingService::default());

        // Even standing on an obstacle, a zero-length trace is clear
        let los = engine.has_line_of_sight(&mut grid, p(2, 2), p(2, 2)).await.unwrap();

        assert!(los.is_clear());
        assert!(los.visited.is_empty());
        assert!(engine.service().calls().is_empty());
    }

    #[tokio::test]
    async fn test_destination_obstacle_does_not_block() {
        let mut grid = grid_with(8, CoordMapper::default(), &[(4, 0)]);
        let engine = VisibilityEngine::new(RecordingService::default());

        let los = engine.has_line_of_sight(&mut grid, p(0, 0), p(4, 0)).await.unwrap();
        assert!(los.is_clear());
    }

    #[tokio::test]
    async fn test_missing_squares_are_passable_and_unreported() {
        // Trace starts outside the grid and walks into it
        let mut grid = grid_with(4, CoordMapper::default(), &[]);
        let engine = VisibilityEngine::new(RecordingService::default());

        let los = engine.has_line_of_sight(&mut grid, p(-2, 0), p(2, 0)).await.unwrap();

        assert!(los.is_clear());
        assert_eq!(los.visited, vec![p(-2, 0), p(-1, 0), p(0, 0), p(1, 0)]);
        assert_eq!(engine.service().called_points(), vec![(0, 0), (1, 0)]);
    }

    #[tokio::test]
    async fn test_events_are_activated_and_reported() {
        let mut grid = grid_with(8, CoordMapper::default(), &[]);
        let mut service = RecordingService::default();
        service.events.insert((1, 1), MapEvent::new(9, "treasure"));
        let engine = VisibilityEngine::new(service);

        let los = engine.has_line_of_sight(&mut grid, p(0, 0), p(3, 3)).await.unwrap();

        assert!(los.is_clear());
        assert_eq!(
            los.activations,
            vec![Activation {
                square: p(1, 1),
                cell: MinimalPoint::new(1, 1),
                event: MapEvent::new(9, "treasure"),
                replaced: None,
            }]
        );
        assert_eq!(grid.get(p(1, 1)).unwrap().active_event(), Some(&MapEvent::new(9, "treasure")));
        assert!(grid.get(p(2, 2)).unwrap().active_event().is_none());

        // A second pass overwrites and reports what it replaced
        let again = engine.has_line_of_sight(&mut grid, p(0, 0), p(3, 3)).await.unwrap();
        assert_eq!(again.activations[0].replaced, Some(MapEvent::new(9, "treasure")));
    }

    #[tokio::test]
    async fn test_event_on_obstacle_still_applies() {
        let mut grid = grid_with(8, CoordMapper::default(), &[(2, 0)]);
        let mut service = RecordingService::default();
        service.events.insert((2, 0), MapEvent::new(3, "trap"));
        let engine = VisibilityEngine::new(service);

        let los = engine.has_line_of_sight(&mut grid, p(0, 0), p(6, 0)).await.unwrap();

        assert!(!los.is_clear());
        assert_eq!(los.activations.len(), 1);
        assert_eq!(grid.get(p(2, 0)).unwrap().active_event(), Some(&MapEvent::new(3, "trap")));
    }

    #[tokio::test]
    async fn test_service_failure_aborts_scan() {
        let mut grid = grid_with(8, CoordMapper::default(), &[]);
        let mut service = RecordingService::default();
        service.events.insert((0, 0), MapEvent::new(1, "bell"));
        service.fail_at = Some((2, 0));
        let engine = VisibilityEngine::new(service);

        let result = engine.has_line_of_sight(&mut grid, p(0, 0), p(6, 0)).await;

        assert!(matches!(result, Err(MapError::SquareService { at, .. }) if at == p(2, 0)));
        assert_eq!(engine.service().called_points(), vec![(0, 0), (1, 0), (2, 0)]);
        // Work done before the failure is kept
        assert!(grid.get(p(0, 0)).unwrap().active_event().is_some());
    }

    #[tokio::test]
    async fn test_tiled_grid_reports_anchor_hits() {
        // 4-unit tiles: the trace steps through every standard point, so each square
        // is reported once per point, flagged only on its anchor
        let mapper = CoordMapper::new(4, p(0, 0)).unwrap();
        let mut grid = grid_with(4, mapper, &[(2, 0)]);
        let engine = VisibilityEngine::new(RecordingService::default());

        let los = engine.has_line_of_sight(&mut grid, p(0, 0), p(15, 0)).await.unwrap();

        assert!(!los.is_clear());
        assert_eq!(los.blocked_at, Some(p(8, 0)));
        assert_eq!(
            engine.service().calls(),
            vec![
                (0, 0, true),
                (0, 0, false),
                (0, 0, false),
                (0, 0, false),
                (4, 0, true),
                (4, 0, false),
                (4, 0, false),
                (4, 0, false),
                (8, 0, true),
            ]
        );
    }
}
