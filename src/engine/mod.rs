//! Entity Runtime
//!
//! A registry of game objects driven by a per-frame scheduler. Objects are
//! plain descriptors (`ObjectSpec` -> `GameObject`) carrying flags, a
//! position, a bounding box and an optional `Behavior` with lifecycle hooks.
//!
//! Key concepts:
//! - Registry: identifier -> object, insertion ordered, with an init queue
//! - Scheduler: timing, init queue fixpoint drain, eligibility, dispatch
//! - Camera: world -> screen transform centered on the `IS_PLAYER` object
//! - Input binder: held-key set driving per-object `InputAction`s
//!
//! Only objects flagged `ALWAYS_UPDATE` / `ALWAYS_RENDER`, or near enough to
//! the viewport, are visited each tick, so tens of thousands of idle objects
//! cost almost nothing.

pub mod camera;
pub mod clock;
pub mod context;
pub mod game;
pub mod input;
pub mod metrics;
pub mod object;
pub mod rect;
pub mod registry;
pub mod scheduler;
pub mod surface;
pub mod ui_host;

pub use clock::MacroquadClock;
pub use context::Context;
pub use game::{Game, InternalObject};
pub use input::{InputAction, MacroquadInput};
pub use object::{Behavior, Flags, GameObject, HookError, HookResult, ObjectSpec, Sprite};
pub use rect::Rect;
pub use registry::RegistryError;
pub use scheduler::Engine;
pub use surface::{MacroquadSurface, Stroke, Surface};
pub use ui_host::{Component, Panel, RectangleComponent, TextComponent, UiHost, UI_HOST_ID};
