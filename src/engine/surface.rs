//! Presentation Surface
//!
//! Render hooks draw through the `Surface` trait rather than calling
//! macroquad directly, so the scheduler can run headless in tests.

use std::collections::HashMap;

use macroquad::prelude::{
    clear_background, draw_circle_lines, draw_rectangle, draw_rectangle_lines, draw_text,
    draw_texture_ex, load_texture, measure_text, screen_height, screen_width, vec2, Color,
    DrawTextureParams, FilterMode, Rect as MqRect, Texture2D, Vec2, BLACK, WHITE,
};
use tracing::{info, warn};

use super::rect::Rect;

/// Horizontal text anchoring relative to the draw position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextAlign {
    #[default]
    Left,
    Center,
}

/// Outline for shapes and text
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub color: Color,
    pub thickness: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub font_size: f32,
    pub align: TextAlign,
    pub fill: Color,
    pub stroke: Option<Stroke>,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_size: 12.0,
            align: TextAlign::Left,
            fill: BLACK,
            stroke: None,
        }
    }
}

/// Drawing target handed to render hooks
pub trait Surface {
    /// Size of the visible area in pixels
    fn viewport_size(&self) -> Vec2;

    fn clear(&mut self, color: Color);

    fn fill_rect(&mut self, rect: Rect, color: Color);

    fn stroke_rect(&mut self, rect: Rect, stroke: Stroke);

    fn stroke_circle(&mut self, center: Vec2, radius: f32, stroke: Stroke);

    /// `position` is the text baseline anchor, see `TextAlign`
    fn draw_text(&mut self, text: &str, position: Vec2, style: &TextStyle);

    /// Blit `source` (the whole image if `None`) into `dest`, rotated about
    /// its center
    fn draw_image(&mut self, image_path: &str, source: Option<Rect>, dest: Rect, rotation: f32);
}

/// macroquad-backed surface
pub struct MacroquadSurface {
    textures: HashMap<String, Texture2D>,
    placeholder: Color,
}

impl MacroquadSurface {
    pub fn new() -> Self {
        Self {
            textures: HashMap::new(),
            placeholder: Color::new(0.5, 0.5, 0.55, 0.6),
        }
    }

    /// Load images up front. Failures are logged; those images draw as a
    /// placeholder rectangle.
    pub async fn load_images<'a>(&mut self, paths: impl IntoIterator<Item = &'a str>) {
        for path in paths {
            if self.textures.contains_key(path) {
                continue;
            }
            match load_texture(path).await {
                Ok(texture) => {
                    texture.set_filter(FilterMode::Linear);
                    self.textures.insert(path.to_string(), texture);
                }
                Err(e) => warn!(path, error = %e, "failed to load image"),
            }
        }
        info!(count = self.textures.len(), "images loaded");
    }
}

impl Default for MacroquadSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl Surface for MacroquadSurface {
    fn viewport_size(&self) -> Vec2 {
        vec2(screen_width(), screen_height())
    }

    fn clear(&mut self, color: Color) {
        clear_background(color);
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        draw_rectangle(rect.x, rect.y, rect.w, rect.h, color);
    }

    fn stroke_rect(&mut self, rect: Rect, stroke: Stroke) {
        draw_rectangle_lines(rect.x, rect.y, rect.w, rect.h, stroke.thickness, stroke.color);
    }

    fn stroke_circle(&mut self, center: Vec2, radius: f32, stroke: Stroke) {
        draw_circle_lines(center.x, center.y, radius, stroke.thickness, stroke.color);
    }

    fn draw_text(&mut self, text: &str, position: Vec2, style: &TextStyle) {
        let font_size = style.font_size.max(1.0) as u16;
        let width = measure_text(text, None, font_size, 1.0).width;
        let x = match style.align {
            TextAlign::Left => position.x,
            TextAlign::Center => position.x - width * 0.5,
        };
        if let Some(stroke) = style.stroke {
            // No native text outline; offset copies approximate one
            let t = stroke.thickness.max(1.0);
            for (dx, dy) in [(-t, 0.0), (t, 0.0), (0.0, -t), (0.0, t)] {
                draw_text(text, x + dx, position.y + dy, style.font_size, stroke.color);
            }
        }
        draw_text(text, x, position.y, style.font_size, style.fill);
    }

    fn draw_image(&mut self, image_path: &str, source: Option<Rect>, dest: Rect, rotation: f32) {
        let Some(texture) = self.textures.get(image_path) else {
            draw_rectangle(dest.x, dest.y, dest.w, dest.h, self.placeholder);
            return;
        };
        draw_texture_ex(
            texture,
            dest.x,
            dest.y,
            WHITE,
            DrawTextureParams {
                dest_size: Some(vec2(dest.w, dest.h)),
                source: source.map(|s| MqRect::new(s.x, s.y, s.w, s.h)),
                rotation,
                ..Default::default()
            },
        );
    }
}

/// One recorded draw call
#[cfg(test)]
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCall {
    Clear,
    FillRect(Rect),
    StrokeRect(Rect),
    StrokeCircle { center: Vec2, radius: f32 },
    Text { text: String, position: Vec2 },
    Image { image_path: String, dest: Rect },
}

/// Headless surface that records draw calls
#[cfg(test)]
pub struct RecordingSurface {
    pub size: Vec2,
    pub calls: Vec<DrawCall>,
}

#[cfg(test)]
impl RecordingSurface {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            size: vec2(width, height),
            calls: Vec::new(),
        }
    }

    /// Destinations of every image drawn from `image_path`
    pub fn images(&self, image_path: &str) -> Vec<Rect> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                DrawCall::Image { image_path: path, dest } if path == image_path => Some(*dest),
                _ => None,
            })
            .collect()
    }

    pub fn texts(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                DrawCall::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
impl Surface for RecordingSurface {
    fn viewport_size(&self) -> Vec2 {
        self.size
    }

    fn clear(&mut self, _color: Color) {
        self.calls.push(DrawCall::Clear);
    }

    fn fill_rect(&mut self, rect: Rect, _color: Color) {
        self.calls.push(DrawCall::FillRect(rect));
    }

    fn stroke_rect(&mut self, rect: Rect, _stroke: Stroke) {
        self.calls.push(DrawCall::StrokeRect(rect));
    }

    fn stroke_circle(&mut self, center: Vec2, radius: f32, _stroke: Stroke) {
        self.calls.push(DrawCall::StrokeCircle { center, radius });
    }

    fn draw_text(&mut self, text: &str, position: Vec2, _style: &TextStyle) {
        self.calls.push(DrawCall::Text {
            text: text.to_string(),
            position,
        });
    }

    fn draw_image(&mut self, image_path: &str, _source: Option<Rect>, dest: Rect, _rotation: f32) {
        self.calls.push(DrawCall::Image {
            image_path: image_path.to_string(),
            dest,
        });
    }
}
