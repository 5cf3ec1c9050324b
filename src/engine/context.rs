//! Engine handle passed to every hook
//!
//! Hooks never see the scheduler itself. They get a `Context` borrowing the
//! registry along with this tick's camera and metrics. The
//! object whose hook is running is *not* in the registry for the duration
//! of the call; it arrives separately as `this`.

use macroquad::math::Vec2;

use super::camera::Camera;
use super::metrics::FrameMetrics;
use super::object::{Behavior, GameObject, ObjectSpec};
use super::registry::{ImportReport, Registry, RegistryError};

pub struct Context<'a> {
    registry: &'a mut Registry,
    camera: Camera,
    metrics: &'a FrameMetrics,
    stop_requested: &'a mut bool,
}

impl<'a> Context<'a> {
    pub(crate) fn new(
        registry: &'a mut Registry,
        camera: Camera,
        metrics: &'a FrameMetrics,
        stop_requested: &'a mut bool,
    ) -> Self {
        Self {
            registry,
            camera,
            metrics,
            stop_requested,
        }
    }

    // =========================================================================
    // Registry access
    // =========================================================================

    pub fn get(&self, identifier: &str) -> Option<&GameObject> {
        self.registry.get(identifier)
    }

    pub fn lookup(&self, identifier: &str) -> Result<&GameObject, RegistryError> {
        self.registry.lookup(identifier)
    }

    pub fn player(&self) -> Option<&GameObject> {
        self.registry.player()
    }

    /// Read another object's behavior state
    pub fn behavior<B: Behavior>(&self, identifier: &str) -> Option<&B> {
        self.registry.get(identifier)?.behavior::<B>()
    }

    /// Mutate another object's behavior state, e.g. push an element into the
    /// UI host
    pub fn behavior_mut<B: Behavior>(&mut self, identifier: &str) -> Option<&mut B> {
        self.registry.behavior_mut::<B>(identifier)
    }

    /// Register more objects. They are initialized during the next import
    /// drain: immediately if called from `init`, otherwise at the start of
    /// the next tick.
    pub fn import_objects(&mut self, specs: impl IntoIterator<Item = ObjectSpec>) -> ImportReport {
        self.registry.import_objects(specs)
    }

    /// Deregister an object. Removing the running object itself is allowed;
    /// it is dropped once its hook returns.
    pub fn remove(&mut self, identifier: &str) -> bool {
        self.registry.remove(identifier)
    }

    // =========================================================================
    // Camera
    // =========================================================================

    pub fn global_to_screen(&self, world: Vec2) -> Vec2 {
        self.camera.global_to_screen(world)
    }

    pub fn screen_to_global(&self, screen: Vec2) -> Vec2 {
        self.camera.screen_to_global(screen)
    }

    pub fn viewport(&self) -> Vec2 {
        self.camera.viewport()
    }

    // =========================================================================
    // Frame state
    // =========================================================================

    pub fn metrics(&self) -> &FrameMetrics {
        self.metrics
    }

    /// Ask the scheduler to stop after the current tick
    pub fn request_stop(&mut self) {
        *self.stop_requested = true;
    }
}
