//! Single-owner task that serializes every world mutation.
//!
//! Position updates arrive on a broadcast feed and queries on a command channel. The
//! task owns the [`World`], so visibility scans never overlap and updates are applied
//! in delivery order.

use std::sync::Arc;

use isla_coords::StandardPoint;
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, error, info, warn};

use crate::error::MapError;
use crate::occupant::{Occupant, PositionUpdate, UpdateOutcome};
use crate::service::{SessionIdentity, SquareService};
use crate::visibility::{LineOfSight, VisibilityEngine};
use crate::world::World;

/// Request handled by [`run_world_task`].
#[derive(Debug)]
pub enum WorldCommand {
    /// Run a line-of-sight check between two standard points.
    LineOfSight {
        /// Start of the trace.
        from: StandardPoint,
        /// End of the trace.
        to: StandardPoint,
        /// Receives the result.
        reply: oneshot::Sender<Result<LineOfSight, MapError>>,
    },
    /// Snapshot every occupant, players first then the pirate.
    Occupants {
        /// Receives the snapshot.
        reply: oneshot::Sender<Vec<Occupant>>,
    },
}

/// Cloneable handle for sending [`WorldCommand`]s.
#[derive(Debug, Clone)]
pub struct WorldHandle {
    tx: mpsc::Sender<WorldCommand>,
}

impl WorldHandle {
    /// Creates a handle and the receiver to pass to [`run_world_task`].
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<WorldCommand>) {
        let (tx, rx) = mpsc::channel(capacity);
        (WorldHandle { tx }, rx)
    }

    /// Asks the world task for line of sight between `from` and `to`.
    pub async fn line_of_sight(&self, from: StandardPoint, to: StandardPoint) -> anyhow::Result<LineOfSight> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(WorldCommand::LineOfSight { from, to, reply })
            .await
            .map_err(|_| anyhow::anyhow!("World task has stopped"))?;
        let result = rx.await.map_err(|_| anyhow::anyhow!("World task dropped the line-of-sight reply"))?;
        Ok(result?)
    }

    /// Asks the world task for every occupant.
    pub async fn occupants(&self) -> anyhow::Result<Vec<Occupant>> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(WorldCommand::Occupants { reply })
            .await
            .map_err(|_| anyhow::anyhow!("World task has stopped"))?;
        rx.await.map_err(|_| anyhow::anyhow!("World task dropped the occupants reply"))
    }
}

/// Owns `world` until every command sender is dropped, then returns it.
///
/// Queued position updates always drain before the next command is served, so a
/// query sees every update delivered ahead of it.
///
/// # Arguments
/// * `world` - The world to serve.
/// * `engine` - Visibility engine backed by the square service.
/// * `identity` - Filters out echoes of the local session.
/// * `updates` - Inbound position feed. A closed feed just stops being polled.
/// * `commands` - Queries; the task ends when this channel closes.
pub async fn run_world_task<S, I>(
    mut world: World,
    engine: &VisibilityEngine<S>,
    identity: &I,
    updates: &mut broadcast::Receiver<Arc<PositionUpdate>>,
    mut commands: mpsc::Receiver<WorldCommand>,
) -> anyhow::Result<World>
where
    S: SquareService,
    I: SessionIdentity + ?Sized,
{
    info!(occupants = world.occupants().len(), "World task started.");
    let mut feed_open = true;

    loop {
        tokio::select! {
            // Pending position updates are applied before any query is answered
            biased;

            result = updates.recv(), if feed_open => {
                match result {
                    Ok(update) => {
                        if world.apply_position_update(identity, &update) == UpdateOutcome::Dropped {
                            debug!(session = %update.session_id, "Position update matched no player");
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!("Position feed lagged by {} messages in world task.", n);
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        info!("Position feed closed, serving queries only.");
                        feed_open = false;
                    }
                }
            }
            command = commands.recv() => {
                let Some(command) = command else {
                    info!("Command channel closed, world task finished.");
                    return Ok(world);
                };
                match command {
                    WorldCommand::LineOfSight { from, to, reply } => {
                        let result = world.has_line_of_sight(engine, from, to).await;
                        if let Err(e) = &result {
                            error!(%from, %to, "Line-of-sight scan failed: {}", e);
                        }
                        if reply.send(result).is_err() {
                            warn!(%from, %to, "Line-of-sight requester went away before the reply");
                        }
                    }
                    WorldCommand::Occupants { reply } => {
                        if reply.send(world.occupants().iter().cloned().collect()).is_err() {
                            warn!("Occupants requester went away before the reply");
                        }
                    }
                }
            }
        }
    }
}
