//! Camera / Viewport Transform
//!
//! The camera has no state of its own: every tick it is rebuilt from the
//! player object's position and the surface size. Without a player the
//! camera is *degraded* and maps world coordinates to themselves.

use macroquad::math::Vec2;

use super::rect::Rect;
use super::registry::Registry;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    /// World position kept at the center of the screen
    focus: Option<Vec2>,
    viewport: Vec2,
    /// Extra screen-space border counted as visible, to avoid pop-in
    margin: f32,
}

impl Camera {
    pub fn new(focus: Option<Vec2>, viewport: Vec2, margin: f32) -> Self {
        Self { focus, viewport, margin }
    }

    /// Camera centered on the registry's player, or degraded if there is none
    pub fn follow_player(registry: &Registry, viewport: Vec2, margin: f32) -> Self {
        Self::new(registry.player().map(|p| p.global_position), viewport, margin)
    }

    /// True when no player is registered and the transform is identity
    pub fn is_degraded(&self) -> bool {
        self.focus.is_none()
    }

    pub fn viewport(&self) -> Vec2 {
        self.viewport
    }

    pub fn global_to_screen(&self, world: Vec2) -> Vec2 {
        match self.focus {
            Some(focus) => world - focus + self.viewport * 0.5,
            None => world,
        }
    }

    pub fn screen_to_global(&self, screen: Vec2) -> Vec2 {
        match self.focus {
            Some(focus) => screen - self.viewport * 0.5 + focus,
            None => screen,
        }
    }

    /// Screen rectangle, expanded by the margin
    pub fn view_rect(&self) -> Rect {
        Rect::screen(self.viewport.x, self.viewport.y).expand(self.margin)
    }

    /// Does a bounding box at `global_position` touch the expanded viewport?
    pub fn is_visible(&self, global_position: Vec2, bounding_box: Rect) -> bool {
        bounding_box
            .translate(self.global_to_screen(global_position))
            .intersects(&self.view_rect())
    }
}
