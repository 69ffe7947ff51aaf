mod bus;            // position feed topic
mod config;         // settings file + ISLA__ overrides
mod feed;           // simulated remote players
mod layout;         // ASCII map colour source
mod lookout;        // pirate line-of-sight rounds
mod square_service; // in-memory square service

use std::sync::Arc;

use anyhow::Context;
use isla_map::{LocalSession, MinimalPoint, PositionUpdate, SessionId, VisibilityEngine, World, WorldHandle, run_world_task};
use tracing::info;
use tracing_subscriber::EnvFilter;

use bus::Topic;
use feed::{Bounds, Walker};
use square_service::InMemorySquareService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("isla starting up.");
    let settings = config::load_settings()?;

    let mut map_settings = settings.map_settings()?;
    let layout = layout::load_layout(&settings.map.layout, &map_settings.palette)?;
    map_settings.width = layout.width;

    let identity = LocalSession::new(settings.session.local_id.as_str());
    let world = World::build(&map_settings, layout.samples, settings.roster(), &identity)
        .context("Failed to build the world")?;
    println!("{}", world.grid());

    let service = Arc::new(InMemorySquareService::from_settings(&settings, &map_settings.mapper));
    let engine = VisibilityEngine::new(Arc::clone(&service));

    let topic: Topic<PositionUpdate> = Topic::new(64);
    let mut updates = topic.subscribe();
    let (handle, commands) = WorldHandle::channel(8);

    let walkers = settings
        .players
        .iter()
        .filter(|p| p.session_id != settings.session.local_id)
        .map(|p| Walker { session_id: SessionId::from(p.session_id.as_str()), cell: MinimalPoint::new(p.x, p.y) })
        .collect();
    let local_cell = settings
        .players
        .iter()
        .find(|p| p.session_id == settings.session.local_id)
        .map(|p| MinimalPoint::new(p.x, p.y))
        .unwrap_or_default();
    let local = Walker { session_id: identity.0.clone(), cell: local_cell };

    info!("Starting world, feed and lookout tasks...");
    let (world, (), report) = tokio::try_join!(
        run_world_task(world, &engine, &identity, &mut updates, commands),
        feed::run_feed(
            topic,
            walkers,
            local,
            map_settings.mapper,
            Bounds::inner(map_settings.width),
            settings.feed.clone(),
        ),
        lookout::run_lookout(handle, settings.lookout.clone()),
    )?;

    let (saves, destination_saves) = service.save_counts();
    info!(
        rounds = report.rounds,
        sightings = report.sightings,
        blocked = report.blocked,
        failures = report.failures,
        activations = report.activations,
        saves,
        destination_saves,
        events_triggered = service.triggered(),
        "Session finished."
    );
    for square in world.grid().active_events() {
        info!(square = %square.position(), event = ?square.active_event(), "Active event");
    }
    for occupant in world.occupants().iter() {
        info!(kind = ?occupant.kind, position = %occupant.position, "Final position");
    }
    println!("{}", world.grid());

    Ok(())
}
