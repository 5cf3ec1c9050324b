//! Stardrift: a 2D space exploration and trading game
//!
//! Fly a ship across a large procedurally generated planet field. The game
//! runs on a small entity runtime (`engine`) that only visits objects near
//! the screen, so tens of thousands of planets stay cheap.

/// Version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

mod config;
mod engine;
mod logging;
mod space;

use macroquad::miniquad;
use macroquad::window::Conf;
use tracing::{error, info, warn};

use config::GameConfig;
use engine::{Engine, MacroquadClock, MacroquadInput, MacroquadSurface};

fn window_conf() -> Conf {
    Conf {
        window_title: format!("Stardrift v{}", VERSION),
        window_width: 1280,
        window_height: 720,
        window_resizable: true,
        high_dpi: true,
        ..Default::default()
    }
}

/// Read `stardrift.ron`, writing the defaults out on first launch. The
/// returned message, if any, is logged once tracing is up.
#[cfg(not(target_arch = "wasm32"))]
fn load_config() -> (GameConfig, Option<String>) {
    use config::{ConfigError, CONFIG_FILE};

    match GameConfig::load(CONFIG_FILE) {
        Ok(config) => (config, None),
        Err(ConfigError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            let config = GameConfig::default();
            let note = config
                .save(CONFIG_FILE)
                .err()
                .map(|e| format!("could not write default {}: {}", CONFIG_FILE, e));
            (config, note)
        }
        Err(e) => (
            GameConfig::default(),
            Some(format!("ignoring {}: {}", CONFIG_FILE, e)),
        ),
    }
}

#[cfg(target_arch = "wasm32")]
fn load_config() -> (GameConfig, Option<String>) {
    (GameConfig::default(), None)
}

#[macroquad::main(window_conf)]
async fn main() {
    // Initialize crash logging FIRST (before any other code)
    #[cfg(not(target_arch = "wasm32"))]
    crashlog::setup!(crashlog::cargo_metadata!().capitalized(), false);

    let (config, note) = load_config();
    logging::init(&config.engine.log_filter);
    if let Some(note) = note {
        warn!("{}", note);
    }

    let seed = config
        .space
        .seed
        .unwrap_or_else(|| (miniquad::date::now() * 1000.0) as u64);
    info!(version = VERSION, seed, planets = config.space.planet_amount, "starting");

    let mut surface = MacroquadSurface::new();
    let paths = space::image_paths();
    surface.load_images(paths.iter().map(String::as_str)).await;

    let mut engine = Engine::new(config.engine.clone(), MacroquadClock, MacroquadInput);
    let report = engine.import_game(space::game(&config.space, seed));
    if !report.is_clean() {
        warn!(rejected = report.rejected.len(), "some game objects were rejected");
    }

    if let Err(e) = engine.run(&mut surface).await {
        error!(error = %e, "engine stopped with an error");
    }
    info!(frames = engine.metrics().frame, state = ?engine.state(), "goodbye");
}
