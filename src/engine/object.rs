//! Game Object Descriptors
//!
//! Every piece of content (ships, planets, backdrops, UI hosts) is a
//! `GameObject`: a little data the scheduler understands (identifier, flags,
//! position, bounding box, sprite, layer) plus an optional `Behavior` that
//! owns everything else.
//!
//! Content describes objects with an `ObjectSpec` and hands them to
//! `import_objects`; the registry validates the spec and materializes it.

use std::any::Any;
use std::fmt;

use bitflags::bitflags;
use macroquad::math::Vec2;
use thiserror::Error;

use super::context::Context;
use super::input::InputAction;
use super::rect::Rect;
use super::registry::RegistryError;
use super::surface::Surface;

bitflags! {
    /// Capability tags that change how the scheduler treats an object.
    ///
    /// Absence matters: an object without `ALWAYS_UPDATE` is only updated
    /// while its bounding box is near the viewport.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Flags: u32 {
        const ALWAYS_UPDATE = 1 << 0;
        const ALWAYS_RENDER = 1 << 1;
        const IS_PLAYER = 1 << 2;
        const IS_UI = 1 << 3;
    }
}

/// Render asset reference plus source/target dimensions
#[derive(Debug, Clone, PartialEq)]
pub struct Sprite {
    pub image_path: String,
    pub source_width: f32,
    pub source_height: f32,
    pub render_width: f32,
    pub render_height: f32,
}

impl Sprite {
    pub fn new(image_path: impl Into<String>, source: (f32, f32), render: (f32, f32)) -> Self {
        Self {
            image_path: image_path.into(),
            source_width: source.0,
            source_height: source.1,
            render_width: render.0,
            render_height: render.1,
        }
    }

    /// Region of the image to sample
    pub fn source_rect(&self) -> Rect {
        Rect::new(0.0, 0.0, self.source_width, self.source_height)
    }

    /// Screen rectangle for a sprite centered on `center`
    pub fn dest_rect(&self, center: Vec2) -> Rect {
        Rect::centered(self.render_width, self.render_height).translate(center)
    }

    fn is_well_formed(&self) -> bool {
        !self.image_path.is_empty()
            && [self.source_width, self.source_height, self.render_width, self.render_height]
                .iter()
                .all(|v| v.is_finite() && *v > 0.0)
    }
}

/// Opaque configuration bag, meaningful only to the owning object's hooks
#[derive(Default)]
pub struct Options(Option<Box<dyn Any>>);

impl Options {
    pub fn new<T: Any>(value: T) -> Self {
        Self(Some(Box::new(value)))
    }

    pub fn get<T: Any>(&self) -> Option<&T> {
        self.0.as_ref().and_then(|v| v.downcast_ref::<T>())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_some() {
            f.write_str("Options(..)")
        } else {
            f.write_str("Options(empty)")
        }
    }
}

/// Error raised by a hook or an action callback.
///
/// Any hook error marks the object as failed; it stays in the registry but
/// is never initialized, updated or rendered again.
#[derive(Debug, Error)]
pub enum HookError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("action expects behavior `{expected}` but object `{identifier}` has a different one")]
    BehaviorMismatch {
        identifier: String,
        expected: &'static str,
    },
    #[error("{0}")]
    Message(String),
}

impl HookError {
    pub fn msg(message: impl Into<String>) -> Self {
        HookError::Message(message.into())
    }
}

pub type HookResult = Result<(), HookError>;

/// Upcast helper so `dyn Behavior` can be downcast to its concrete type
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Lifecycle hooks for a game object. All hooks are optional.
///
/// The implementor is the object's private state. While a hook runs, the
/// object itself is out of the registry: reach it through `this`, and reach
/// every other object through `ctx`.
pub trait Behavior: AsAny {
    /// Runs once, before the object's first update. May import more objects.
    fn init(&mut self, _ctx: &mut Context<'_>, _this: &mut GameObject) -> HookResult {
        Ok(())
    }

    /// Runs every tick the object is update-eligible.
    fn update(&mut self, _ctx: &mut Context<'_>, _this: &mut GameObject, _delta: f32) -> HookResult {
        Ok(())
    }

    /// Runs every tick the object is render-eligible, in layer order, after
    /// the object's sprite (if any) has been drawn.
    fn render(&mut self, _ctx: &mut Context<'_>, _this: &GameObject, _surface: &mut dyn Surface) -> HookResult {
        Ok(())
    }
}

/// Import-time description of an object
pub struct ObjectSpec {
    pub(crate) identifier: String,
    pub(crate) flags: Flags,
    pub(crate) global_position: Vec2,
    pub(crate) bounding_box: Rect,
    pub(crate) sprite: Option<Sprite>,
    pub(crate) render_layer: i32,
    pub(crate) rotation: f32,
    pub(crate) options: Options,
    pub(crate) actions: Vec<InputAction>,
    pub(crate) behavior: Option<Box<dyn Behavior>>,
}

impl ObjectSpec {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            flags: Flags::empty(),
            global_position: Vec2::ZERO,
            bounding_box: Rect::ZERO,
            sprite: None,
            render_layer: 0,
            rotation: 0.0,
            options: Options::default(),
            actions: Vec::new(),
            behavior: None,
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn flags(mut self, flags: Flags) -> Self {
        self.flags = flags;
        self
    }

    pub fn position(mut self, x: f32, y: f32) -> Self {
        self.global_position = Vec2::new(x, y);
        self
    }

    pub fn bounding_box(mut self, bounding_box: Rect) -> Self {
        self.bounding_box = bounding_box;
        self
    }

    pub fn sprite(mut self, sprite: Sprite) -> Self {
        self.sprite = Some(sprite);
        self
    }

    pub fn render_layer(mut self, layer: i32) -> Self {
        self.render_layer = layer;
        self
    }

    pub fn rotation(mut self, radians: f32) -> Self {
        self.rotation = radians;
        self
    }

    pub fn options<T: Any>(mut self, options: T) -> Self {
        self.options = Options::new(options);
        self
    }

    pub fn action(mut self, action: InputAction) -> Self {
        self.actions.push(action);
        self
    }

    pub fn behavior(mut self, behavior: impl Behavior) -> Self {
        self.behavior = Some(Box::new(behavior));
        self
    }

    /// Reason this spec cannot be imported, if any
    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.identifier.trim().is_empty() {
            return Err("identifier is empty".to_string());
        }
        if !self.global_position.is_finite() {
            return Err(format!("global_position {:?} is not finite", self.global_position));
        }
        if !self.bounding_box.is_well_formed() {
            return Err(format!("bounding_box {:?} is malformed", self.bounding_box));
        }
        if !self.rotation.is_finite() {
            return Err("rotation is not finite".to_string());
        }
        if let Some(sprite) = &self.sprite {
            if !sprite.is_well_formed() {
                return Err(format!("sprite {:?} needs a path and positive sizes", sprite.image_path));
            }
        }
        Ok(())
    }

    pub(crate) fn materialize(self) -> GameObject {
        GameObject {
            identifier: self.identifier,
            flags: self.flags,
            global_position: self.global_position,
            bounding_box: self.bounding_box,
            sprite: self.sprite,
            render_layer: self.render_layer,
            rotation: self.rotation,
            options: self.options,
            actions: self.actions,
            behavior: self.behavior,
        }
    }
}

/// A live object owned by the registry
pub struct GameObject {
    identifier: String,
    pub flags: Flags,
    /// World position. Only the object's own hooks get `&mut` access.
    pub global_position: Vec2,
    /// Local-space box, offset from `global_position`
    pub bounding_box: Rect,
    pub sprite: Option<Sprite>,
    /// Draw order key: lower first, insertion order on ties
    pub render_layer: i32,
    /// Radians, applied to the sprite draw
    pub rotation: f32,
    options: Options,
    pub(crate) actions: Vec<InputAction>,
    pub(crate) behavior: Option<Box<dyn Behavior>>,
}

impl GameObject {
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn has_flag(&self, flag: Flags) -> bool {
        self.flags.contains(flag)
    }

    pub fn options<T: Any>(&self) -> Option<&T> {
        self.options.get::<T>()
    }

    /// Read another object's behavior state by its concrete type
    pub fn behavior<B: Behavior>(&self) -> Option<&B> {
        self.behavior.as_deref()?.as_any().downcast_ref::<B>()
    }

    pub(crate) fn behavior_mut<B: Behavior>(&mut self) -> Option<&mut B> {
        self.behavior.as_deref_mut()?.as_any_mut().downcast_mut::<B>()
    }
}

impl fmt::Debug for GameObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameObject")
            .field("identifier", &self.identifier)
            .field("flags", &self.flags)
            .field("global_position", &self.global_position)
            .field("bounding_box", &self.bounding_box)
            .field("render_layer", &self.render_layer)
            .field("actions", &self.actions.len())
            .field("has_behavior", &self.behavior.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Spinner {
        speed: f32,
    }

    impl Behavior for Spinner {}

    #[test]
    fn test_spec_defaults() {
        let obj = ObjectSpec::new("rock").materialize();
        assert_eq!(obj.identifier(), "rock");
        assert!(obj.flags.is_empty());
        assert_eq!(obj.render_layer, 0);
        assert_eq!(obj.bounding_box, Rect::ZERO);
        assert!(obj.sprite.is_none());
        assert!(obj.actions.is_empty());
    }

    #[test]
    fn test_validate_rejects_bad_fields() {
        assert!(ObjectSpec::new("").validate().is_err());
        assert!(ObjectSpec::new("a").position(f32::NAN, 0.0).validate().is_err());
        assert!(ObjectSpec::new("a")
            .bounding_box(Rect::new(0.0, 0.0, -5.0, 5.0))
            .validate()
            .is_err());
        assert!(ObjectSpec::new("a")
            .sprite(Sprite::new("ship.png", (10.0, 10.0), (0.0, 10.0)))
            .validate()
            .is_err());
        assert!(ObjectSpec::new("a")
            .sprite(Sprite::new("ship.png", (10.0, 10.0), (20.0, 10.0)))
            .validate()
            .is_ok());
    }

    #[test]
    fn test_behavior_downcast() {
        let mut obj = ObjectSpec::new("planet")
            .behavior(Spinner { speed: 0.5 })
            .materialize();
        assert_eq!(obj.behavior::<Spinner>().map(|s| s.speed), Some(0.5));
        obj.behavior_mut::<Spinner>().unwrap().speed = 2.0;
        assert_eq!(obj.behavior::<Spinner>().map(|s| s.speed), Some(2.0));

        struct Other;
        impl Behavior for Other {}
        assert!(obj.behavior::<Other>().is_none());
    }

    #[test]
    fn test_options_are_typed() {
        let obj = ObjectSpec::new("manager").options(42u32).materialize();
        assert_eq!(obj.options::<u32>(), Some(&42));
        assert!(obj.options::<String>().is_none());
    }
}
