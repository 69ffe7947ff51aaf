use anyhow::Context;
use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;
use tracing::{error, info};

use isla_coords::{CoordMapper, MinimalPoint, StandardPoint};
use isla_map::{MapSettings, Palette, Rgb, RosterEntry};

const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub map: MapConfig,
    pub session: SessionConfig,
    pub feed: FeedConfig,
    pub lookout: LookoutConfig,
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub players: Vec<PlayerConfig>,
    #[serde(default)]
    pub events: Vec<EventConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MapConfig {
    pub layout: String,
    pub tile_size: i32,
    #[serde(default)]
    pub origin_x: i32,
    #[serde(default)]
    pub origin_y: i32,
    pub obstacle_colors: Vec<String>,
    pub spawn_colors: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub local_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    pub interval_ms: u64,
    pub ticks: u32,
    pub seed: u64,
    /// 0 disables self echoes
    #[serde(default)]
    pub echo_every: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LookoutConfig {
    pub interval_ms: u64,
    pub rounds: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServiceConfig {
    #[serde(default)]
    pub latency_ms: u64,
    /// Cells where every save fails
    #[serde(default)]
    pub outages: Vec<CellConfig>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct CellConfig {
    pub x: i32,
    pub y: i32,
}

impl CellConfig {
    pub fn cell(&self) -> MinimalPoint {
        MinimalPoint::new(self.x, self.y)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlayerConfig {
    pub session_id: String,
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventConfig {
    pub x: i32,
    pub y: i32,
    pub id: u64,
    pub kind: String,
}

impl Settings {
    /// Grid parameters. The width is taken from the layout, so it starts at zero here.
    pub fn map_settings(&self) -> anyhow::Result<MapSettings> {
        let origin = StandardPoint::new(self.map.origin_x, self.map.origin_y);
        let mapper = CoordMapper::new(self.map.tile_size, origin).context("Invalid [map] tile settings")?;
        let palette = Palette {
            obstacle: parse_colors(&self.map.obstacle_colors).context("Invalid map.obstacle_colors")?,
            spawn: parse_colors(&self.map.spawn_colors).context("Invalid map.spawn_colors")?,
        };
        Ok(MapSettings { width: 0, mapper, palette })
    }

    pub fn roster(&self) -> Vec<RosterEntry> {
        self.players
            .iter()
            .map(|p| RosterEntry::new(p.session_id.as_str(), p.x, p.y))
            .collect()
    }
}

fn parse_colors(values: &[String]) -> anyhow::Result<Vec<Rgb>> {
    values
        .iter()
        .map(|v| Rgb::parse_hex(v).with_context(|| format!("`{}` is not a #rrggbb colour", v)))
        .collect()
}

fn build<S>(source: S) -> Result<Config, ConfigError>
where
    S: config::Source + Send + Sync + 'static,
{
    Config::builder()
        .add_source(source)
        .add_source(Environment::with_prefix("ISLA").separator("__").try_parsing(true))
        .build()
}

/// Loads `config/default.toml` (or the file named by `ISLA_CONFIG`) with `ISLA__` overrides.
pub fn load_settings() -> anyhow::Result<Settings> {
    let path = std::env::var("ISLA_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_owned());
    info!("Attempting to load configuration from {}", path);

    let settings = build(File::new(&path, FileFormat::Toml).required(true))
        .and_then(|config| config.try_deserialize::<Settings>());

    match settings {
        Ok(settings) => {
            info!("Successfully loaded configuration: {:?}", settings);
            Ok(settings)
        }
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            Err(e).with_context(|| format!("Failed to load configuration from {}", path))
        }
    }
}
