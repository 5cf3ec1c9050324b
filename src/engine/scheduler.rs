//! Frame Scheduler
//!
//! Owns the registry and drives every object's lifecycle:
//!
//! ```text
//! start: register internal + content objects, drain init queue to fixpoint
//! tick:  delta/fps -> poll keys -> drain init queue
//!        -> update set (ALWAYS_UPDATE or visible): actions, then update hook
//!        -> render set (ALWAYS_RENDER or visible), by layer: sprite, then render hook
//! ```
//!
//! Hooks run one at a time with the object moved out of the registry. A
//! hook error marks that object failed and the tick carries on with the
//! rest.

use macroquad::color::BLACK;
use macroquad::math::Vec2;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::config::EngineConfig;

use super::camera::Camera;
use super::clock::Clock;
use super::context::Context;
use super::game::{Game, InternalObject};
use super::input::{InputBinder, InputSource};
use super::metrics::{elapsed_ms, FrameMetrics};
use super::object::{Behavior, Flags, GameObject, HookError, ObjectSpec};
use super::registry::{ImportReport, Lifecycle, Registry};
use super::surface::Surface;
use super::ui_host::UiHost;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("engine has already been started")]
    AlreadyStarted,
    #[error("engine has not been started")]
    NotStarted,
    #[error("engine is stopped")]
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Uninitialized,
    Running,
    /// Terminal
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Hook {
    Init,
    Update,
    Render,
}

impl Hook {
    fn name(self) -> &'static str {
        match self {
            Hook::Init => "init",
            Hook::Update => "update",
            Hook::Render => "render",
        }
    }
}

pub struct Engine {
    config: EngineConfig,
    clock: Box<dyn Clock>,
    input: Box<dyn InputSource>,
    registry: Registry,
    binder: InputBinder,
    binder_enabled: bool,
    metrics: FrameMetrics,
    state: EngineState,
    last_tick: f64,
    stop_requested: bool,
    /// Last observed camera mode, for logging transitions
    camera_degraded: Option<bool>,
}

impl Engine {
    pub fn new(config: EngineConfig, clock: impl Clock + 'static, input: impl InputSource + 'static) -> Self {
        let binder = InputBinder::new(config.action_cooldown_seconds);
        Self {
            config,
            clock: Box::new(clock),
            input: Box::new(input),
            registry: Registry::new(),
            binder,
            binder_enabled: false,
            metrics: FrameMetrics::default(),
            state: EngineState::Uninitialized,
            last_tick: 0.0,
            stop_requested: false,
            camera_degraded: None,
        }
    }

    /// Register a game's internal objects, then its content objects.
    pub fn import_game(&mut self, game: Game) -> ImportReport {
        let mut internal = Vec::new();
        for object in &game.internal_objects {
            match object {
                InternalObject::InputBinder => self.binder_enabled = true,
                InternalObject::UiHost => internal.push(UiHost::spec()),
            }
        }
        let mut report = self.registry.import_objects(internal);
        let content = self.registry.import_objects(game.objects);
        report.imported.extend(content.imported);
        report.rejected.extend(content.rejected);
        info!(
            objects = report.imported.len(),
            rejected = report.rejected.len(),
            input = self.binder_enabled,
            "game imported"
        );
        report
    }

    /// Register objects from outside any hook. They are initialized at the
    /// next drain (start, or the next tick).
    pub fn import_objects(&mut self, specs: impl IntoIterator<Item = ObjectSpec>) -> ImportReport {
        self.registry.import_objects(specs)
    }

    /// Uninitialized -> Running. Every queued object, and every object those
    /// objects spawn from `init`, is initialized before this returns.
    pub fn start(&mut self, surface: &mut dyn Surface) -> Result<(), EngineError> {
        match self.state {
            EngineState::Uninitialized => {}
            EngineState::Running => return Err(EngineError::AlreadyStarted),
            EngineState::Stopped => return Err(EngineError::Stopped),
        }
        self.state = EngineState::Running;
        self.last_tick = self.clock.now();

        if self.registry.is_empty() {
            warn!("starting with no objects registered");
        }
        let initialized = self.drain_imports(surface.viewport_size());
        info!(
            objects = self.registry.len(),
            initialized,
            "engine started"
        );
        Ok(())
    }

    /// Running -> Stopped. Idempotent; no tick runs afterwards.
    pub fn stop(&mut self) {
        if self.state != EngineState::Stopped {
            let failed: Vec<&str> = self
                .registry
                .all()
                .map(GameObject::identifier)
                .filter(|id| self.registry.lifecycle(id) == Some(Lifecycle::Failed))
                .collect();
            if !failed.is_empty() {
                warn!(count = failed.len(), "objects were excluded after a hook failure");
                debug!(objects = ?failed, "failed objects");
            }
            info!(frames = self.metrics.frame, "engine stopped");
            self.state = EngineState::Stopped;
        }
    }

    /// Run ticks until stopped, yielding to macroquad between frames
    pub async fn run(&mut self, surface: &mut dyn Surface) -> Result<(), EngineError> {
        if self.state == EngineState::Uninitialized {
            self.start(surface)?;
        }
        while self.state == EngineState::Running {
            self.tick(surface)?;
            macroquad::window::next_frame().await;
        }
        Ok(())
    }

    pub fn tick(&mut self, surface: &mut dyn Surface) -> Result<(), EngineError> {
        match self.state {
            EngineState::Running => {}
            EngineState::Uninitialized => return Err(EngineError::NotStarted),
            EngineState::Stopped => return Err(EngineError::Stopped),
        }

        // Timing
        let now = self.clock.now();
        self.metrics.frame += 1;
        self.metrics.record_delta(
            now - self.last_tick,
            self.config.max_delta_seconds,
            self.config.fps_smoothing,
        );
        self.last_tick = now;

        self.binder.poll(self.input.as_mut());

        let viewport = surface.viewport_size();
        self.metrics.initialized_count = self.drain_imports(viewport);

        // Update pass
        let update_start = self.clock.now();
        let camera = self.camera(viewport);
        self.note_camera(&camera);
        let update_set = self.registry.eligible(Flags::ALWAYS_UPDATE, &camera);
        self.metrics.updated_count = update_set.len();
        let delta = self.metrics.delta_seconds;
        for slot in update_set {
            self.update_object(slot, camera, now, delta);
        }
        self.metrics.update_ms = elapsed_ms(update_start, self.clock.now());

        // Render pass, following the player's post-update position
        let render_start = self.clock.now();
        surface.clear(BLACK);
        let camera = self.camera(viewport);
        let mut render_set = self.registry.eligible(Flags::ALWAYS_RENDER, &camera);
        render_set.sort_by_key(|&slot| self.registry.render_layer(slot));
        self.metrics.rendered_count = render_set.len();
        for slot in render_set {
            self.render_object(slot, camera, surface);
        }
        self.metrics.render_ms = elapsed_ms(render_start, self.clock.now());

        let tombstones = self.registry.tombstones();
        if tombstones > self.config.compact_threshold && tombstones > self.registry.len() {
            self.registry.compact();
        }

        if self.stop_requested {
            self.stop();
        }
        Ok(())
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn metrics(&self) -> &FrameMetrics {
        &self.metrics
    }

    /// Reach into an object's behavior from outside the tick, e.g. to set
    /// up UI before the first frame
    pub fn behavior_mut<B: Behavior>(&mut self, identifier: &str) -> Option<&mut B> {
        self.registry.behavior_mut::<B>(identifier)
    }

    /// Camera for the current player position and the given viewport size
    pub fn camera(&self, viewport: Vec2) -> Camera {
        Camera::follow_player(&self.registry, viewport, self.config.viewport_margin)
    }

    // =========================================================================
    // Dispatch
    // =========================================================================

    fn note_camera(&mut self, camera: &Camera) {
        let degraded = camera.is_degraded();
        if self.camera_degraded == Some(degraded) {
            return;
        }
        if degraded {
            warn!("no player object registered; camera maps world coordinates unchanged");
        } else if let Some(player) = self.registry.player() {
            info!(identifier = player.identifier(), "camera following player");
        }
        self.camera_degraded = Some(degraded);
    }

    /// Run `init` for every pending object, including objects imported by
    /// those inits, until the queue is empty. Returns how many ran.
    fn drain_imports(&mut self, viewport: Vec2) -> usize {
        let mut initialized = 0;
        while let Some(slot) = self.registry.next_pending_init() {
            let Some((mut object, lifecycle)) = self.registry.take(slot) else {
                // Removed before its init ran
                continue;
            };
            if lifecycle != Lifecycle::PendingInit {
                self.registry.restore(slot, object, lifecycle);
                continue;
            }

            let camera = self.camera(viewport);
            let mut behavior = object.behavior.take();
            let result = match behavior.as_deref_mut() {
                Some(hooks) => {
                    let mut ctx = Context::new(
                        &mut self.registry,
                        camera,
                        &self.metrics,
                        &mut self.stop_requested,
                    );
                    hooks.init(&mut ctx, &mut object)
                }
                None => Ok(()),
            };
            object.behavior = behavior;

            let lifecycle = match result {
                Ok(()) => Lifecycle::Active,
                Err(e) => fail(&object, Hook::Init, e),
            };
            self.registry.restore(slot, object, lifecycle);
            initialized += 1;
        }
        if initialized > 0 {
            debug!(initialized, total = self.registry.len(), "init queue drained");
        }
        initialized
    }

    fn update_object(&mut self, slot: usize, camera: Camera, now: f64, delta: f32) {
        // Removed earlier in this pass
        let Some((mut object, lifecycle)) = self.registry.take(slot) else {
            return;
        };

        let mut behavior = object.behavior.take();
        let mut actions = std::mem::take(&mut object.actions);
        let result = {
            let mut ctx = Context::new(
                &mut self.registry,
                camera,
                &self.metrics,
                &mut self.stop_requested,
            );
            let fired = if self.binder_enabled && !actions.is_empty() {
                InputBinder::fire(
                    self.binder.held(),
                    self.binder.cooldown(),
                    &mut actions,
                    &mut behavior,
                    &mut ctx,
                    &mut object,
                    now,
                )
            } else {
                Ok(0)
            };
            fired.and_then(|_| match behavior.as_deref_mut() {
                Some(hooks) => hooks.update(&mut ctx, &mut object, delta),
                None => Ok(()),
            })
        };
        object.behavior = behavior;
        object.actions = actions;

        let lifecycle = match result {
            Ok(()) => lifecycle,
            Err(e) => fail(&object, Hook::Update, e),
        };
        self.registry.restore(slot, object, lifecycle);
    }

    fn render_object(&mut self, slot: usize, camera: Camera, surface: &mut dyn Surface) {
        let Some((mut object, lifecycle)) = self.registry.take(slot) else {
            return;
        };

        if let Some(sprite) = &object.sprite {
            let center = camera.global_to_screen(object.global_position);
            surface.draw_image(
                &sprite.image_path,
                Some(sprite.source_rect()),
                sprite.dest_rect(center),
                object.rotation,
            );
        }

        let mut behavior = object.behavior.take();
        let result = match behavior.as_deref_mut() {
            Some(hooks) => {
                let mut ctx = Context::new(
                    &mut self.registry,
                    camera,
                    &self.metrics,
                    &mut self.stop_requested,
                );
                hooks.render(&mut ctx, &object, surface)
            }
            None => Ok(()),
        };
        object.behavior = behavior;

        let lifecycle = match result {
            Ok(()) => lifecycle,
            Err(e) => fail(&object, Hook::Render, e),
        };
        self.registry.restore(slot, object, lifecycle);
    }
}

/// Log a hook failure. The object is excluded from all further ticks.
fn fail(object: &GameObject, hook: Hook, error: HookError) -> Lifecycle {
    error!(
        identifier = object.identifier(),
        hook = hook.name(),
        error = %error,
        "hook failed; object excluded from further ticks"
    );
    Lifecycle::Failed
}
