//! Tiled starfield backdrop
//!
//! The world is covered by a grid of square tiles, each showing one of a few
//! backdrop textures. Only tiles overlapping the screen are drawn.

use macroquad::math::vec2;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::config::limits::MAX_BACKGROUND_TILES;
use crate::config::SpaceConfig;
use crate::engine::{Behavior, Context, Flags, GameObject, HookError, HookResult, ObjectSpec, Rect, Surface};

use super::texture_path;

pub const BACKGROUND_ID: &str = "background";
/// Drawn beneath everything else
pub const BACKGROUND_LAYER: i32 = -1000;

pub const BACKDROPS: [&str; 7] = [
    "backdrop0",
    "backdrop1",
    "backdrop2",
    "backdrop3",
    "backdrop4",
    "backdrop5",
    "backdrop6",
];

pub struct Background {
    tile_size: f32,
    world_size: (f32, f32),
    seed: u64,
    columns: usize,
    rows: usize,
    /// Row-major backdrop index per tile
    tiles: Vec<usize>,
}

impl Background {
    pub fn new(config: &SpaceConfig, seed: u64) -> Self {
        Self {
            tile_size: config.background_tile_size,
            world_size: config.world_size,
            seed,
            columns: 0,
            rows: 0,
            tiles: Vec::new(),
        }
    }

    pub fn spec(config: &SpaceConfig, seed: u64) -> ObjectSpec {
        ObjectSpec::new(BACKGROUND_ID)
            .flags(Flags::ALWAYS_UPDATE | Flags::ALWAYS_RENDER)
            .render_layer(BACKGROUND_LAYER)
            .behavior(Background::new(config, seed))
    }

    pub fn tile(&self, column: usize, row: usize) -> Option<usize> {
        if column >= self.columns {
            return None;
        }
        self.tiles.get(row * self.columns + column).copied()
    }

    /// Inclusive-exclusive tile index range covering `[start, end)` world units
    fn tile_range(&self, start: f32, end: f32, count: usize) -> std::ops::Range<usize> {
        let first = (start / self.tile_size).floor().max(0.0) as usize;
        let last = ((end / self.tile_size).ceil().max(0.0) as usize).min(count);
        first.min(last)..last
    }
}

impl Behavior for Background {
    fn init(&mut self, _ctx: &mut Context<'_>, _this: &mut GameObject) -> HookResult {
        let mut rng = SmallRng::seed_from_u64(self.seed);
        let columns = (self.world_size.0 / self.tile_size).ceil() as usize;
        let rows = (self.world_size.1 / self.tile_size).ceil() as usize;
        let count = columns
            .checked_mul(rows)
            .filter(|&count| count <= MAX_BACKGROUND_TILES)
            .ok_or_else(|| {
                HookError::msg(format!(
                    "{}x{} background tiles of {} over a {:?} world is too many",
                    columns, rows, self.tile_size, self.world_size
                ))
            })?;
        self.columns = columns;
        self.rows = rows;
        self.tiles = (0..count)
            .map(|_| rng.gen_range(0..BACKDROPS.len()))
            .collect();
        Ok(())
    }

    fn render(&mut self, ctx: &mut Context<'_>, _this: &GameObject, surface: &mut dyn Surface) -> HookResult {
        let viewport = ctx.viewport();
        let top_left = ctx.screen_to_global(vec2(0.0, 0.0));
        let bottom_right = ctx.screen_to_global(viewport);

        for row in self.tile_range(top_left.y, bottom_right.y, self.rows) {
            for column in self.tile_range(top_left.x, bottom_right.x, self.columns) {
                let Some(backdrop) = self.tile(column, row) else {
                    continue;
                };
                let world = vec2(column as f32 * self.tile_size, row as f32 * self.tile_size);
                let screen = ctx.global_to_screen(world);
                surface.draw_image(
                    &texture_path(BACKDROPS[backdrop]),
                    None,
                    Rect::new(screen.x, screen.y, self.tile_size, self.tile_size),
                    0.0,
                );
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::engine::clock::ManualClock;
    use crate::engine::input::NoInput;
    use crate::engine::surface::{DrawCall, RecordingSurface};
    use crate::engine::registry::Lifecycle;
    use crate::engine::{Engine, Game};

    fn config(tile: f32) -> SpaceConfig {
        SpaceConfig {
            world_size: (10_000.0, 5_500.0),
            background_tile_size: tile,
            ..Default::default()
        }
    }

    fn backdrop_draws(surface: &RecordingSurface) -> Vec<Rect> {
        BACKDROPS
            .iter()
            .flat_map(|name| surface.images(&texture_path(name)))
            .collect()
    }

    fn run_one_tick(config: &SpaceConfig, player: (f32, f32), viewport: (f32, f32)) -> (Engine, RecordingSurface) {
        let clock = ManualClock::new();
        let mut engine = Engine::new(EngineConfig::default(), clock.clone(), NoInput);
        engine.import_game(
            Game::new()
                .with_object(Background::spec(config, 4))
                .with_object(ObjectSpec::new("player").flags(Flags::IS_PLAYER).position(player.0, player.1)),
        );
        let mut surface = RecordingSurface::new(viewport.0, viewport.1);
        engine.start(&mut surface).unwrap();
        clock.advance(0.016);
        engine.tick(&mut surface).unwrap();
        (engine, surface)
    }

    #[test]
    fn test_grid_covers_world() {
        let (engine, _) = run_one_tick(&config(1000.0), (1500.0, 1500.0), (800.0, 600.0));
        let background = engine
            .registry()
            .get(BACKGROUND_ID)
            .and_then(|o| o.behavior::<Background>())
            .unwrap();
        assert_eq!((background.columns, background.rows), (10, 6));
        assert!(background.tile(9, 5).is_some());
        assert!(background.tile(10, 0).is_none());
        assert!(background.tile(0, 6).is_none());
    }

    #[test]
    fn test_only_visible_tile_is_drawn() {
        // Screen spans world (1100..1900, 1200..1800): inside tile (1, 1)
        let (_, surface) = run_one_tick(&config(1000.0), (1500.0, 1500.0), (800.0, 600.0));
        let draws = backdrop_draws(&surface);
        assert_eq!(draws, vec![Rect::new(-100.0, -200.0, 1000.0, 1000.0)]);
    }

    #[test]
    fn test_tiles_across_boundary() {
        // Screen spans world (600..1400, 700..1300): four tiles
        let (_, surface) = run_one_tick(&config(1000.0), (1000.0, 1000.0), (800.0, 600.0));
        assert_eq!(backdrop_draws(&surface).len(), 4);
    }

    #[test]
    fn test_oversized_grid_fails_in_isolation() {
        let clock = ManualClock::new();
        let mut engine = Engine::new(EngineConfig::default(), clock.clone(), NoInput);
        let config = SpaceConfig {
            world_size: (10_000_000.0, 10_000_000.0),
            background_tile_size: 0.000_000_1,
            ..Default::default()
        };
        engine.import_game(
            Game::new()
                .with_object(Background::spec(&config, 4))
                .with_object(ObjectSpec::new("player").flags(Flags::IS_PLAYER)),
        );
        let mut surface = RecordingSurface::new(800.0, 600.0);
        engine.start(&mut surface).unwrap();

        assert_eq!(engine.registry().lifecycle(BACKGROUND_ID), Some(Lifecycle::Failed));
        assert_eq!(engine.registry().lifecycle("player"), Some(Lifecycle::Active));
        clock.advance(0.016);
        engine.tick(&mut surface).unwrap();
        assert!(backdrop_draws(&surface).is_empty());
    }

    #[test]
    fn test_nothing_drawn_outside_world() {
        let (_, surface) = run_one_tick(&config(1000.0), (-5000.0, -5000.0), (800.0, 600.0));
        assert!(backdrop_draws(&surface).is_empty());
        assert!(matches!(surface.calls.first(), Some(DrawCall::Clear)));
    }
}
