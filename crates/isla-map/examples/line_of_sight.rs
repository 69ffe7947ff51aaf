use std::convert::Infallible;

use tracing_subscriber::EnvFilter;

use isla_map::{
    ColorSample, CoordMapper, LocalSession, MapEvent, MapSettings, Palette, Rgb, SavedSquare, SquareService,
    StandardPoint, VisibilityEngine, World,
};

/// Reports a treasure on one square and nothing anywhere else.
struct TreasureService {
    treasure: StandardPoint,
}

impl SquareService for TreasureService {
    type Error = Infallible;

    async fn save(&self, x: i32, y: i32, is_destination: bool) -> Result<SavedSquare, Infallible> {
        println!("  save({}, {}, is_destination: {})", x, y, is_destination);
        if StandardPoint::new(x, y) == self.treasure {
            Ok(SavedSquare::with_event(MapEvent::new(1, "treasure")))
        } else {
            Ok(SavedSquare::empty())
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // 10x10 map, 1 standard unit per cell
    // # = rock, S = spawn point
    let layout = [
        "S.........",
        "..........",
        "....#.....",
        "....#.....",
        "..........",
        "..........",
        "..........",
        "......##..",
        "..........",
        ".........S",
    ];

    let mut samples = Vec::new();
    for (y, row) in layout.iter().enumerate() {
        for (x, c) in row.chars().enumerate() {
            let color = match c {
                '#' => Rgb::BLACK,
                'S' => Rgb::RED,
                _ => Rgb::WHITE,
            };
            samples.push(ColorSample::new(x as i32, y as i32, color));
        }
    }

    let settings = MapSettings { width: 10, mapper: CoordMapper::default(), palette: Palette::default() };
    let identity = LocalSession::new("local");
    let mut world = World::build(&settings, samples, Vec::new(), &identity).unwrap();

    println!("{}", world.grid());
    let pirate = world.occupants().pirate().unwrap().position;
    println!("Pirate spawned at {}", pirate);

    let engine = VisibilityEngine::new(TreasureService { treasure: StandardPoint::new(2, 2) });

    for target in [StandardPoint::new(6, 6), StandardPoint::new(9, 3), StandardPoint::new(8, 9)] {
        println!("\nLine of sight {} -> {}:", pirate, target);
        let los = world.has_line_of_sight(&engine, pirate, target).await.unwrap();
        match los.blocked_at {
            Some(at) => println!("  blocked at {}", at),
            None => println!("  clear after {} steps", los.visited.len()),
        }
        for activation in &los.activations {
            println!("  activated {:?} on {}", activation.event.kind, activation.square);
        }
    }
}
