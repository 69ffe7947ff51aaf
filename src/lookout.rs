use std::time::Duration;

use isla_map::WorldHandle;
use tracing::{debug, info, warn};

use crate::config::LookoutConfig;

/// Tallies of a lookout run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LookoutReport {
    pub rounds: u32,
    pub sightings: u32,
    pub blocked: u32,
    pub failures: u32,
    pub activations: usize,
}

/// The pirate scans for every player once per round.
///
/// Scan failures are logged and counted; the lookout only fails if the world task is gone.
/// The handle is dropped on return, which lets the world task finish.
pub async fn run_lookout(handle: WorldHandle, config: LookoutConfig) -> anyhow::Result<LookoutReport> {
    info!(rounds = config.rounds, "Lookout task started.");
    let mut report = LookoutReport::default();
    let mut tick = tokio::time::interval(Duration::from_millis(config.interval_ms.max(1)));

    for round in 1..=config.rounds {
        tick.tick().await;
        report.rounds = round;

        let occupants = handle.occupants().await?;
        let Some(pirate) = occupants.iter().find(|o| o.is_pirate()).map(|o| o.position) else {
            warn!(round, "No pirate on the map, nothing to look out from.");
            continue;
        };

        for player in occupants.iter().filter(|o| !o.is_pirate()) {
            let session = player.session_id().map(ToString::to_string).unwrap_or_default();
            match handle.line_of_sight(pirate, player.position).await {
                Ok(los) => {
                    report.activations += los.activations.len();
                    for activation in &los.activations {
                        info!(square = %activation.square, kind = %activation.event.kind, "Event activated");
                    }
                    if los.is_clear() {
                        report.sightings += 1;
                        info!(round, %session, at = %player.position, "Pirate spotted a player");
                    } else {
                        report.blocked += 1;
                        debug!(round, %session, blocked_at = ?los.blocked_at, "View blocked");
                    }
                }
                Err(e) => {
                    report.failures += 1;
                    warn!(round, %session, "Lookout scan failed: {:#}", e);
                }
            }
        }
    }

    info!(?report, "Lookout task finished.");
    Ok(report)
}
