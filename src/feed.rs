//! Simulated position feed: remote players wander the grid one cell at a time.

use std::time::Duration;

use isla_coords::{CoordMapper, MinimalPoint};
use isla_map::{PositionUpdate, SessionId};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::time;
use tracing::{debug, info};

use crate::bus::Topic;
use crate::config::FeedConfig;

const STEPS: [(i32, i32); 4] = [(0, -1), (-1, 0), (1, 0), (0, 1)]; // Up, Left, Right, Down

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Walker {
    pub session_id: SessionId,
    pub cell: MinimalPoint,
}

/// Cells a walker may stand on, inclusive.
#[derive(Debug, Clone, Copy)]
pub struct Bounds {
    pub min: MinimalPoint,
    pub max: MinimalPoint,
}

impl Bounds {
    /// The whole grid minus a one-cell border.
    pub fn inner(width: usize) -> Self {
        let last = width.saturating_sub(1) as i32;
        Bounds { min: MinimalPoint::new(1.min(last), 1.min(last)), max: MinimalPoint::new((last - 1).max(0), (last - 1).max(0)) }
    }

    fn clamp(&self, cell: MinimalPoint) -> MinimalPoint {
        MinimalPoint::new(cell.x.clamp(self.min.x, self.max.x), cell.y.clamp(self.min.y, self.max.y))
    }
}

/// Publishes `config.ticks` updates, one every `config.interval_ms`, then drops the topic.
///
/// Each tick moves one random walker one cell. Every `echo_every`-th tick also publishes
/// a position for `local`, which the world must ignore.
pub async fn run_feed(
    topic: Topic<PositionUpdate>,
    mut walkers: Vec<Walker>,
    local: Walker,
    mapper: CoordMapper,
    bounds: Bounds,
    config: FeedConfig,
) -> anyhow::Result<()> {
    info!(walkers = walkers.len(), ticks = config.ticks, "Position feed started.");
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut ticker = time::interval(Duration::from_millis(config.interval_ms.max(1)));

    for tick in 1..=config.ticks {
        ticker.tick().await;

        if !walkers.is_empty() {
            let i = rng.random_range(0..walkers.len());
            let walker = &mut walkers[i];
            let (dx, dy) = STEPS[rng.random_range(0..STEPS.len())];
            walker.cell = bounds.clamp(MinimalPoint::new(walker.cell.x + dx, walker.cell.y + dy));
            let position = mapper.to_standard(walker.cell);
            debug!(session = %walker.session_id, %position, "Feed moved player");
            topic.publish(PositionUpdate { session_id: walker.session_id.clone(), position });
        }

        if config.echo_every > 0 && tick % config.echo_every == 0 {
            let echo = bounds.clamp(MinimalPoint::new(
                local.cell.x + rng.random_range(-1..=1),
                local.cell.y + rng.random_range(-1..=1),
            ));
            topic.publish(PositionUpdate { session_id: local.session_id.clone(), position: mapper.to_standard(echo) });
        }
    }

    info!("Position feed finished.");
    Ok(())
}
