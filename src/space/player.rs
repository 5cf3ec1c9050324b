//! Player ship
//!
//! Simple Euler integration: thrust accumulates into acceleration, which is
//! folded into velocity once per update; velocity moves the ship and then
//! decays.

use std::f32::consts::TAU;

use macroquad::color::{DARKGRAY, WHITE};
use macroquad::input::KeyCode;
use macroquad::math::{vec2, Vec2};
use tracing::info;

use crate::config::SpaceConfig;
use crate::engine::{
    Behavior, Component, Context, Flags, GameObject, HookError, HookResult, InputAction, ObjectSpec, Panel, Rect,
    RectangleComponent, RegistryError, Sprite, Stroke, TextComponent, UiHost, UI_HOST_ID,
};
use crate::engine::ui_host::hud_text_style;

use super::items::{Inventory, ItemManager, ITEM_MANAGER_ID};
use super::planets::{Planet, PlanetManager, PLANET_MANAGER_ID, PLANET_PANEL};
use super::texture_path;

pub const PLAYER_ID: &str = "player";
pub const INVENTORY_PANEL: &str = "inventory";
pub const SHIP_TEXTURE: &str = "big_ship_0";

/// Fuel in the hold at launch
const STARTING_FUEL: u32 = 500;
/// Units moved per trade key press
const TRADE_AMOUNT: u32 = 100;

pub struct Ship {
    pub velocity: Vec2,
    acceleration: Vec2,
    /// Radians, kept within (-2pi, 2pi)
    pub heading: f32,
    /// Velocity gained per tick of forward thrust
    pub speed: f32,
    pub base_turn_speed: f32,
    /// Velocity multiplier applied every update
    pub speed_decay: f32,
    pub reverse_speed_mult: f32,
    pub inventory: Inventory,
    /// Identifier of the planet the ship is over, if any
    pub nearby_planet: Option<String>,
    fallback_center: Vec2,
}

impl Ship {
    pub fn new(config: &SpaceConfig) -> Self {
        let (x, y) = config.world_center();
        Self {
            velocity: Vec2::ZERO,
            acceleration: Vec2::ZERO,
            heading: 0.0,
            speed: 20.0,
            base_turn_speed: 0.01,
            speed_decay: 0.98,
            reverse_speed_mult: 0.5,
            inventory: Inventory::new(),
            nearby_planet: None,
            fallback_center: vec2(x, y),
        }
    }

    pub fn spec(config: &SpaceConfig) -> ObjectSpec {
        ObjectSpec::new(PLAYER_ID)
            .flags(Flags::ALWAYS_UPDATE | Flags::ALWAYS_RENDER | Flags::IS_PLAYER)
            .sprite(Sprite::new(texture_path(SHIP_TEXTURE), (180.0, 169.0), (100.0, 90.0)))
            .render_layer(1)
            .position(100.0, 100.0)
            .bounding_box(Rect::centered(100.0, 90.0))
            .behavior(Ship::new(config))
            .action(InputAction::keyboard(KeyCode::W, |ship: &mut Ship, _, _| {
                ship.thrust(1.0);
                Ok(())
            }))
            .action(InputAction::keyboard(KeyCode::S, |ship: &mut Ship, _, _| {
                ship.thrust(-ship.reverse_speed_mult);
                Ok(())
            }))
            .action(InputAction::keyboard(KeyCode::D, |ship: &mut Ship, _, _| {
                ship.turn(1.0);
                Ok(())
            }))
            .action(InputAction::keyboard(KeyCode::A, |ship: &mut Ship, _, _| {
                ship.turn(-1.0);
                Ok(())
            }))
            .action(InputAction::keyboard(KeyCode::I, toggle_inventory).with_cooldown())
            .action(
                InputAction::keyboard(KeyCode::B, |ship: &mut Ship, ctx, _| ship.trade(ctx, Trade::Buy))
                    .with_cooldown(),
            )
            .action(
                InputAction::keyboard(KeyCode::N, |ship: &mut Ship, ctx, _| ship.trade(ctx, Trade::Sell))
                    .with_cooldown(),
            )
            .action(InputAction::keyboard(KeyCode::Escape, |_: &mut Ship, ctx, _| {
                ctx.request_stop();
                Ok(())
            }))
    }

    pub fn direction(&self) -> Vec2 {
        Vec2::from_angle(self.heading)
    }

    /// Push along the heading; negative `scale` pushes backwards
    pub fn thrust(&mut self, scale: f32) {
        self.acceleration += self.direction() * self.speed * scale;
    }

    pub fn turn(&mut self, direction: f32) {
        self.heading += self.base_turn_speed * direction;
    }

    /// One Euler step. Returns the new position.
    pub fn integrate(&mut self, position: Vec2, delta: f32) -> Vec2 {
        if self.heading > TAU {
            self.heading -= TAU;
        } else if self.heading < -TAU {
            self.heading += TAU;
        }
        self.velocity += self.acceleration;
        self.acceleration = Vec2::ZERO;
        let position = position + self.velocity * delta;
        self.velocity *= self.speed_decay;
        position
    }

    pub fn inventory_lines(&self) -> Vec<String> {
        if self.inventory.is_empty() {
            return vec!["(empty)".to_string()];
        }
        self.inventory.iter().map(|stack| stack.describe()).collect()
    }

    /// Move up to `TRADE_AMOUNT` of the first tradable item between the
    /// nearby planet and the hold.
    fn trade(&mut self, ctx: &mut Context<'_>, trade: Trade) -> HookResult {
        let Some(planet_id) = self.nearby_planet.clone() else {
            return Ok(());
        };
        let items = ctx
            .behavior::<ItemManager>(ITEM_MANAGER_ID)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(ITEM_MANAGER_ID.to_string()))?;
        let Some(planet) = ctx.behavior_mut::<Planet>(&planet_id) else {
            return Ok(());
        };

        let stock = match trade {
            Trade::Buy => planet
                .resources
                .iter()
                .find(|stack| stack.buy_price.is_some() && stack.amount > 0)
                .map(|stack| (stack.id, stack.amount)),
            Trade::Sell => planet
                .resources
                .iter()
                .filter(|stack| stack.sell_price.is_some())
                .find_map(|stack| {
                    let held = self.inventory.iter().find(|own| own.id == stack.id)?;
                    Some((stack.id, held.amount))
                }),
        };
        let Some((item, available)) = stock else {
            return Ok(());
        };
        let amount = available.min(TRADE_AMOUNT);

        let (from, to) = match trade {
            Trade::Buy => (&mut planet.resources, &mut self.inventory),
            Trade::Sell => (&mut self.inventory, &mut planet.resources),
        };
        items
            .take_from_inventory(from, item, amount)
            .and_then(|()| items.add_to_inventory(to, item, amount))
            .map_err(|e| HookError::msg(e.to_string()))?;
        info!(planet = %planet_id, item, amount, ?trade, "traded");

        let planet_lines = planet.panel_lines();
        let inventory_lines = self.inventory_lines();
        if let Some(ui) = ctx.behavior_mut::<UiHost>(UI_HOST_ID) {
            ui.set_lines(PLANET_PANEL, planet_lines);
            ui.set_lines(INVENTORY_PANEL, inventory_lines);
        }
        Ok(())
    }

    fn install_hud(&self, ui: &mut UiHost, viewport: Vec2) {
        let bar = Rect::new(0.0, 0.0, viewport.x, viewport.y / 16.0);
        let text = TextComponent::new(
            "x=0, y=0, fps=0",
            vec2(bar.center().x, bar.center().y + viewport.y / 64.0),
            hud_text_style((viewport.x / 64.0).max(12.0)),
        )
        .bind(hud_line);
        ui.add_element(vec![
            Component::Rectangle(RectangleComponent::new(bar, WHITE).with_stroke(Stroke {
                color: DARKGRAY,
                thickness: 2.0,
            })),
            Component::Text(text),
        ]);

        let panel_size = vec2(320.0, 260.0);
        let top = bar.bottom() + 16.0;
        let mut inventory = Panel::new(
            Rect::new(viewport.x - panel_size.x - 16.0, top, panel_size.x, panel_size.y),
            "Inventory",
        );
        inventory.lines = self.inventory_lines();
        ui.add_panel(INVENTORY_PANEL, inventory);
        ui.add_panel(
            PLANET_PANEL,
            Panel::new(Rect::new(16.0, top, panel_size.x, panel_size.y), ""),
        );
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trade {
    Buy,
    Sell,
}

/// HUD status line, re-evaluated every UI update
fn hud_line(ctx: &Context<'_>) -> String {
    let metrics = ctx.metrics();
    let (position, speed) = ctx
        .get(PLAYER_ID)
        .map(|p| (p.global_position, p.behavior::<Ship>().map_or(0.0, |s| s.velocity.length())))
        .unwrap_or_default();
    let planets = ctx
        .behavior::<PlanetManager>(PLANET_MANAGER_ID)
        .map_or(0, |m| m.spawned());
    format!(
        "x={}, y={}, fps={} Updates={}, Renders={} Velocity={:.2} Planets={}",
        position.x.floor(),
        position.y.floor(),
        metrics.average_fps.floor(),
        metrics.updated_count,
        metrics.rendered_count,
        speed,
        planets
    )
}

fn toggle_inventory(ship: &mut Ship, ctx: &mut Context<'_>, _this: &mut GameObject) -> HookResult {
    let lines = ship.inventory_lines();
    let ui = ctx
        .behavior_mut::<UiHost>(UI_HOST_ID)
        .ok_or_else(|| RegistryError::NotFound(UI_HOST_ID.to_string()))?;
    ui.set_lines(INVENTORY_PANEL, lines);
    if ui.toggle_visibility(INVENTORY_PANEL) == Some(true) {
        ui.set_visibility(PLANET_PANEL, false);
    }
    Ok(())
}

impl Behavior for Ship {
    fn init(&mut self, ctx: &mut Context<'_>, this: &mut GameObject) -> HookResult {
        this.global_position = ctx
            .behavior::<PlanetManager>(PLANET_MANAGER_ID)
            .map_or(self.fallback_center, |m| m.world_center());
        this.rotation = self.heading;

        let items = ctx
            .behavior::<ItemManager>(ITEM_MANAGER_ID)
            .ok_or_else(|| RegistryError::NotFound(ITEM_MANAGER_ID.to_string()))?;
        items
            .add_to_inventory(&mut self.inventory, "fuel", STARTING_FUEL)
            .map_err(|e| HookError::msg(e.to_string()))?;

        let viewport = ctx.viewport();
        let ui = ctx
            .behavior_mut::<UiHost>(UI_HOST_ID)
            .ok_or_else(|| RegistryError::NotFound(UI_HOST_ID.to_string()))?;
        self.install_hud(ui, viewport);
        Ok(())
    }

    fn update(&mut self, _ctx: &mut Context<'_>, this: &mut GameObject, delta: f32) -> HookResult {
        this.global_position = self.integrate(this.global_position, delta);
        this.rotation = self.heading;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::engine::clock::ManualClock;
    use crate::engine::input::{KeyEdge, NoInput, ScriptedInput};
    use crate::engine::surface::RecordingSurface;
    use crate::engine::registry::Lifecycle;
    use crate::engine::scheduler::EngineState;
    use crate::engine::{Engine, Game, InternalObject};
    use crate::space::planets::PlanetOptions;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn ship() -> Ship {
        Ship::new(&SpaceConfig::default())
    }

    #[test]
    fn test_thrust_integrates_along_heading() {
        let mut ship = ship();
        ship.thrust(1.0);
        let position = ship.integrate(Vec2::ZERO, 0.5);
        assert!((position.x - 10.0).abs() < 1e-4);
        assert!(position.y.abs() < 1e-4);
        assert!((ship.velocity.x - 19.6).abs() < 1e-4);

        // No thrust: coasts and decays
        let next = ship.integrate(position, 0.5);
        assert!((next.x - 19.8).abs() < 1e-3);
    }

    #[test]
    fn test_reverse_and_turn() {
        let mut ship = ship();
        ship.heading = std::f32::consts::FRAC_PI_2;
        ship.thrust(-ship.reverse_speed_mult);
        let position = ship.integrate(Vec2::ZERO, 1.0);
        assert!(position.x.abs() < 1e-4);
        assert!((position.y + 10.0).abs() < 1e-4);

        ship.turn(1.0);
        ship.turn(-1.0);
        ship.turn(-1.0);
        assert!((ship.heading - (std::f32::consts::FRAC_PI_2 - 0.01)).abs() < 1e-6);
    }

    #[test]
    fn test_heading_wraps() {
        let mut ship = ship();
        ship.heading = TAU + 0.5;
        ship.integrate(Vec2::ZERO, 0.0);
        assert!((ship.heading - 0.5).abs() < 1e-5);
        ship.heading = -TAU - 0.25;
        ship.integrate(Vec2::ZERO, 0.0);
        assert!((ship.heading + 0.25).abs() < 1e-5);
    }

    fn engine_with(input: ScriptedInput, clock: &ManualClock) -> Engine {
        let config = SpaceConfig::default();
        let mut engine = Engine::new(EngineConfig::default(), clock.clone(), input);
        engine.import_game(
            Game::new()
                .with_internal(InternalObject::InputBinder)
                .with_internal(InternalObject::UiHost)
                .with_object(ItemManager::spec())
                .with_object(Ship::spec(&config)),
        );
        engine
    }

    #[test]
    fn test_init_centers_ship_and_installs_hud() {
        let clock = ManualClock::new();
        let mut engine = engine_with(ScriptedInput::new(), &clock);
        let mut surface = RecordingSurface::new(1280.0, 720.0);
        engine.start(&mut surface).unwrap();

        let player = engine.registry().player().unwrap();
        assert_eq!(player.global_position, vec2(50_000.0, 50_000.0));
        let ship = player.behavior::<Ship>().unwrap();
        assert_eq!(ship.inventory[0].amount, STARTING_FUEL);

        let ui = engine.registry().get(UI_HOST_ID).and_then(|o| o.behavior::<UiHost>()).unwrap();
        assert_eq!(ui.element_count(), 1);
        assert!(!ui.is_visible(INVENTORY_PANEL));

        clock.advance(0.016);
        engine.tick(&mut surface).unwrap();
        assert!(surface.texts().iter().any(|t| t.starts_with("x=50000, y=50000")));
    }

    #[test]
    fn test_ship_without_ui_host_fails_init() {
        let clock = ManualClock::new();
        let mut engine = Engine::new(EngineConfig::default(), clock.clone(), NoInput);
        engine.import_game(
            Game::new()
                .with_object(ItemManager::spec())
                .with_object(Ship::spec(&SpaceConfig::default())),
        );
        let mut surface = RecordingSurface::new(800.0, 600.0);
        engine.start(&mut surface).unwrap();
        assert_eq!(engine.registry().lifecycle(PLAYER_ID), Some(Lifecycle::Failed));
    }

    #[test]
    fn test_w_moves_ship_forward() {
        let clock = ManualClock::new();
        let mut input = ScriptedInput::new();
        input.push(vec![KeyEdge::Down(KeyCode::W)]);
        let mut engine = engine_with(input, &clock);
        let mut surface = RecordingSurface::new(800.0, 600.0);
        engine.start(&mut surface).unwrap();

        for _ in 0..10 {
            clock.advance(0.016);
            engine.tick(&mut surface).unwrap();
        }
        let player = engine.registry().player().unwrap();
        assert!(player.global_position.x > 50_000.0);
        assert!((player.global_position.y - 50_000.0).abs() < 1e-3);
    }

    #[test]
    fn test_inventory_toggle_is_debounced() {
        let clock = ManualClock::new();
        let mut input = ScriptedInput::new();
        input.push(vec![KeyEdge::Down(KeyCode::I)]);
        let mut engine = engine_with(input, &clock);
        let mut surface = RecordingSurface::new(800.0, 600.0);
        engine.start(&mut surface).unwrap();

        let inventory_visible = |engine: &Engine| {
            engine
                .registry()
                .get(UI_HOST_ID)
                .and_then(|o| o.behavior::<UiHost>())
                .is_some_and(|ui| ui.is_visible(INVENTORY_PANEL))
        };

        // Held for half a second: one toggle
        for _ in 0..30 {
            clock.advance(0.016);
            engine.tick(&mut surface).unwrap();
        }
        assert!(inventory_visible(&engine));
        assert!(surface.texts().iter().any(|t| t.starts_with("Fuel 500 L")));

        // Still held past the window: toggles back
        for _ in 0..40 {
            clock.advance(0.016);
            engine.tick(&mut surface).unwrap();
        }
        assert!(!inventory_visible(&engine));
    }

    #[test]
    fn test_buy_and_sell_with_nearby_planet() {
        let clock = ManualClock::new();
        let mut input = ScriptedInput::new();
        input.push(vec![KeyEdge::Down(KeyCode::B)]);
        input.push(vec![KeyEdge::Up(KeyCode::B), KeyEdge::Down(KeyCode::N)]);
        let config = SpaceConfig::default();
        let mut engine = Engine::new(EngineConfig::default(), clock.clone(), input);
        engine.import_game(
            Game::new()
                .with_internal(InternalObject::InputBinder)
                .with_internal(InternalObject::UiHost)
                .with_object(ItemManager::spec())
                .with_object(
                    ObjectSpec::new("planet_0")
                        .position(50_000.0, 50_000.0)
                        .bounding_box(Rect::centered(300.0, 300.0))
                        .options(PlanetOptions { seed: 8 })
                        .behavior(Planet::new("Dione-3".to_string(), 150.0, 0.0)),
                )
                .with_object(Ship::spec(&config)),
        );
        let mut surface = RecordingSurface::new(800.0, 600.0);
        engine.start(&mut surface).unwrap();

        let stock = {
            let items = ItemManager::new();
            let mut rng = SmallRng::seed_from_u64(1);
            let mut stock = vec![items.generate_item("uranium", 150, true, false, &mut rng).unwrap()];
            stock.push(items.generate_item("fuel", 0, false, true, &mut rng).unwrap());
            stock
        };
        engine.behavior_mut::<Planet>("planet_0").unwrap().resources = stock;

        // The planet flags the ship as nearby before the ship's actions run
        clock.advance(0.016);
        engine.tick(&mut surface).unwrap();
        let ship = engine.registry().player().and_then(|p| p.behavior::<Ship>()).unwrap();
        assert_eq!(ship.nearby_planet.as_deref(), Some("planet_0"));
        assert_eq!(ship.inventory.iter().find(|s| s.id == "uranium").map(|s| s.amount), Some(100));
        let planet = engine.registry().get("planet_0").and_then(|o| o.behavior::<Planet>()).unwrap();
        assert_eq!(planet.resources[0].amount, 50);

        // Selling moves fuel from the hold to the planet
        clock.advance(0.016);
        engine.tick(&mut surface).unwrap();
        let ship = engine.registry().player().and_then(|p| p.behavior::<Ship>()).unwrap();
        assert_eq!(ship.inventory[0].amount, STARTING_FUEL - 100);
        let planet = engine.registry().get("planet_0").and_then(|o| o.behavior::<Planet>()).unwrap();
        assert_eq!(planet.resources[1].amount, 100);
        assert_eq!(planet.resources[0].amount, 50);
    }

    #[test]
    fn test_escape_stops_engine() {
        let clock = ManualClock::new();
        let mut input = ScriptedInput::new();
        input.push(vec![KeyEdge::Down(KeyCode::Escape)]);
        let mut engine = engine_with(input, &clock);
        let mut surface = RecordingSurface::new(800.0, 600.0);
        engine.start(&mut surface).unwrap();
        clock.advance(0.016);
        engine.tick(&mut surface).unwrap();
        assert_eq!(engine.state(), EngineState::Stopped);
    }
}
