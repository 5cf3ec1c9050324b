//! Planet generation and planet behavior
//!
//! The planet manager spawns every planet from its own `init`, so the whole
//! field is imported and initialized before the first tick. Planets carry
//! no scheduling flags: only those near the viewport are updated or drawn.

use macroquad::color::WHITE;
use macroquad::math::Vec2;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::info;

use crate::config::SpaceConfig;
use crate::engine::{
    Behavior, Context, Flags, GameObject, HookError, HookResult, ObjectSpec, Rect, Sprite, Stroke, Surface,
    UiHost, UI_HOST_ID,
};

use super::items::{Inventory, ItemManager, PlanetKind, ITEM_MANAGER_ID};
use super::player::{Ship, PLAYER_ID};
use super::texture_path;

pub const PLANET_MANAGER_ID: &str = "planet_manager";
/// UI panel showing the planet the player is over
pub const PLANET_PANEL: &str = "planet";

const PLANET_NAMES: [&str; 29] = [
    "Auron", "Caldera", "Meridia", "Solara", "Borealis", "Vespera", "Lythos", "Cendara", "Orona", "Selvara",
    "Halcyon", "Zephyra", "Altara", "Elara", "Marineris", "Dione", "Thalassa", "Pyralis", "Meliora", "Castora",
    "Avandra", "Serona", "Lyonesse", "Peridia", "Tethys", "Arcturus", "Vesperis", "Amara", "Solis",
];

pub const PLANET_TEXTURES: [&str; 6] = [
    "red_planet",
    "cheese_planet",
    "pink_planet",
    "blue_planet",
    "brown_planet",
    "purple_planet",
];

/// Planet textures are square
const PLANET_TEXTURE_SIZE: f32 = 200.0;
/// Upper bound for a planet's starting cash
const MAX_PLANET_CASH: f32 = 10_000.0;

pub fn planet_id(index: usize) -> String {
    format!("planet_{}", index)
}

pub struct PlanetManager {
    config: SpaceConfig,
    rng: SmallRng,
    spawned: usize,
}

impl PlanetManager {
    pub fn new(config: SpaceConfig, seed: u64) -> Self {
        Self {
            config,
            rng: SmallRng::seed_from_u64(seed),
            spawned: 0,
        }
    }

    pub fn spec(config: &SpaceConfig, seed: u64) -> ObjectSpec {
        ObjectSpec::new(PLANET_MANAGER_ID)
            .flags(Flags::ALWAYS_UPDATE)
            .behavior(PlanetManager::new(config.clone(), seed))
    }

    /// Planets actually registered by `init`
    pub fn spawned(&self) -> usize {
        self.spawned
    }

    pub fn world_center(&self) -> Vec2 {
        let (x, y) = self.config.world_center();
        Vec2::new(x, y)
    }

    fn generate_planet(&mut self, index: usize) -> ObjectSpec {
        let rng = &mut self.rng;
        let config = &self.config;

        let name = format!(
            "{}-{}",
            PLANET_NAMES[rng.gen_range(0..PLANET_NAMES.len())],
            rng.gen_range(0..1000)
        );
        let size = (config.planet_min_size + rng.gen::<f32>() * (config.planet_max_size - config.planet_min_size)).floor();
        let texture = PLANET_TEXTURES[rng.gen_range(0..PLANET_TEXTURES.len())];
        let x = (rng.gen::<f32>() * config.world_size.0).floor();
        let y = (rng.gen::<f32>() * config.world_size.1).floor();
        let rotation_speed =
            config.min_rotation_speed + rng.gen::<f32>() * (config.max_rotation_speed - config.min_rotation_speed);

        ObjectSpec::new(planet_id(index))
            .position(x, y)
            .bounding_box(Rect::centered(size, size))
            .sprite(Sprite::new(
                texture_path(texture),
                (PLANET_TEXTURE_SIZE, PLANET_TEXTURE_SIZE),
                (size, size),
            ))
            .options(PlanetOptions { seed: rng.gen() })
            .behavior(Planet::new(name, size / 2.0, rotation_speed))
    }
}

impl Behavior for PlanetManager {
    fn init(&mut self, ctx: &mut Context<'_>, _this: &mut GameObject) -> HookResult {
        let specs: Vec<ObjectSpec> = (0..self.config.planet_amount).map(|i| self.generate_planet(i)).collect();
        let report = ctx.import_objects(specs);
        self.spawned = report.imported.len();
        info!(
            planets = self.spawned,
            rejected = report.rejected.len(),
            "planet field generated"
        );
        Ok(())
    }
}

/// Creation options for a planet object
#[derive(Debug, Clone, Copy, Default)]
pub struct PlanetOptions {
    /// Seeds the rest of the planet's generation in `init`
    pub seed: u64,
}

pub struct Planet {
    pub name: String,
    /// Interaction radius, half the rendered size
    pub radius: f32,
    rotation_speed: f32,
    pub kind: PlanetKind,
    pub cash: f32,
    pub resources: Inventory,
    /// Player is within `radius`
    pub in_range: bool,
}

impl Planet {
    pub fn new(name: String, radius: f32, rotation_speed: f32) -> Self {
        Self {
            name,
            radius,
            rotation_speed,
            kind: PlanetKind::Fuel,
            cash: 0.0,
            resources: Inventory::new(),
            in_range: false,
        }
    }

    pub fn panel_lines(&self) -> Vec<String> {
        let mut lines = vec![self.kind.label().to_string(), format!("Cash: {:.2}", self.cash)];
        lines.extend(self.resources.iter().map(|stack| stack.describe()));
        lines.push("[B] buy  [N] sell".to_string());
        lines
    }

    fn enter_range(&mut self, ctx: &mut Context<'_>, this: &GameObject) {
        self.in_range = true;
        if let Some(ship) = ctx.behavior_mut::<Ship>(PLAYER_ID) {
            ship.nearby_planet = Some(this.identifier().to_string());
        }
        if let Some(ui) = ctx.behavior_mut::<UiHost>(UI_HOST_ID) {
            if let Some(panel) = ui.panel_mut(PLANET_PANEL) {
                panel.title = self.name.clone();
                panel.lines = self.panel_lines();
            }
            if !ui.is_visible(super::player::INVENTORY_PANEL) {
                ui.set_visibility(PLANET_PANEL, true);
            }
        }
    }

    fn leave_range(&mut self, ctx: &mut Context<'_>, this: &GameObject) {
        self.in_range = false;
        if let Some(ship) = ctx.behavior_mut::<Ship>(PLAYER_ID) {
            if ship.nearby_planet.as_deref() == Some(this.identifier()) {
                ship.nearby_planet = None;
                if let Some(ui) = ctx.behavior_mut::<UiHost>(UI_HOST_ID) {
                    ui.set_visibility(PLANET_PANEL, false);
                }
            }
        }
    }
}

fn ship_has_planet(ctx: &Context<'_>) -> bool {
    ctx.behavior::<Ship>(PLAYER_ID)
        .map_or(true, |ship| ship.nearby_planet.is_some())
}

impl Behavior for Planet {
    fn init(&mut self, ctx: &mut Context<'_>, this: &mut GameObject) -> HookResult {
        let options = this.options::<PlanetOptions>().copied().unwrap_or_default();
        let mut rng = SmallRng::seed_from_u64(options.seed);
        this.rotation = 0.0;
        self.kind = PlanetKind::ALL[rng.gen_range(0..PlanetKind::ALL.len())];
        self.cash = rng.gen::<f32>() * MAX_PLANET_CASH;

        let items = ctx
            .lookup(ITEM_MANAGER_ID)?
            .behavior::<ItemManager>()
            .ok_or_else(|| HookError::msg("item_manager has no item catalog"))?;
        self.resources = items.generate_planet_resources(self.kind, &mut rng);
        Ok(())
    }

    fn update(&mut self, ctx: &mut Context<'_>, this: &mut GameObject, delta: f32) -> HookResult {
        this.rotation += self.rotation_speed * delta;

        let Some(player) = ctx.player() else {
            return Ok(());
        };
        let near = player.global_position.distance(this.global_position) < self.radius;
        match (near, self.in_range) {
            (true, false) => self.enter_range(ctx, this),
            (false, true) => self.leave_range(ctx, this),
            // Overlapping planet released the ship
            (true, true) if !ship_has_planet(ctx) => self.enter_range(ctx, this),
            _ => {}
        }
        Ok(())
    }

    fn render(&mut self, ctx: &mut Context<'_>, this: &GameObject, surface: &mut dyn Surface) -> HookResult {
        if !self.in_range {
            return Ok(());
        }
        let color = ctx
            .behavior::<UiHost>(UI_HOST_ID)
            .map_or(WHITE, |ui| ui.text_color);
        surface.stroke_circle(
            ctx.global_to_screen(this.global_position),
            self.radius,
            Stroke { color, thickness: 3.0 },
        );
        Ok(())
    }
}
