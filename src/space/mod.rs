//! Space trading game content
//!
//! A large field of planets, a player ship and a HUD, built on the engine.

pub mod background;
pub mod items;
pub mod planets;
pub mod player;

use crate::config::SpaceConfig;
use crate::engine::{Game, InternalObject};

use background::{Background, BACKDROPS};
use items::ItemManager;
use planets::{PlanetManager, PLANET_TEXTURES};
use player::{Ship, SHIP_TEXTURE};

/// Asset path for a texture name
pub fn texture_path(name: &str) -> String {
    format!("assets/textures/{}.png", name)
}

/// Every texture the game draws, for preloading
pub fn image_paths() -> Vec<String> {
    PLANET_TEXTURES
        .iter()
        .chain(BACKDROPS.iter())
        .chain(std::iter::once(&SHIP_TEXTURE))
        .map(|name| texture_path(name))
        .collect()
}

/// The full game: managers first so their catalogs exist when the player
/// and planets initialize.
pub fn game(config: &SpaceConfig, seed: u64) -> Game {
    Game::new()
        .with_internal(InternalObject::InputBinder)
        .with_internal(InternalObject::UiHost)
        .with_object(PlanetManager::spec(config, seed))
        .with_object(ItemManager::spec())
        .with_object(Ship::spec(config))
        .with_object(Background::spec(config, seed.wrapping_add(1)))
}
