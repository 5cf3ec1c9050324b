//! Internal UI Host
//!
//! Engine-provided object that draws screen-space UI on top of the world.
//! Content pushes *elements* (lists of text and rectangle components) and
//! registers named *panels* whose visibility it can toggle.
//!
//! At most `MAX_ELEMENTS` elements are kept; adding one more evicts the
//! oldest.

use std::collections::VecDeque;
use std::fmt;

use macroquad::color::{Color, BLACK, WHITE};
use macroquad::math::{vec2, Vec2};

use super::context::Context;
use super::object::{Behavior, Flags, GameObject, HookResult, ObjectSpec};
use super::rect::Rect;
use super::surface::{Stroke, Surface, TextAlign, TextStyle};

pub const UI_HOST_ID: &str = "INTERNAL_ui_host";
pub const UI_LAYER: i32 = 1000;
pub const MAX_ELEMENTS: usize = 10;

/// Recomputes a text component's string each update
pub type TextBinding = Box<dyn FnMut(&Context<'_>) -> String>;

pub struct TextComponent {
    pub text: String,
    /// Screen position of the baseline anchor
    pub position: Vec2,
    pub style: TextStyle,
    binding: Option<TextBinding>,
}

impl TextComponent {
    pub fn new(text: impl Into<String>, position: Vec2, style: TextStyle) -> Self {
        Self {
            text: text.into(),
            position,
            style,
            binding: None,
        }
    }

    /// Keep the text live: `binding` runs on every UI host update
    pub fn bind(mut self, binding: impl FnMut(&Context<'_>) -> String + 'static) -> Self {
        self.binding = Some(Box::new(binding));
        self
    }
}

impl fmt::Debug for TextComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextComponent")
            .field("text", &self.text)
            .field("position", &self.position)
            .field("bound", &self.binding.is_some())
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RectangleComponent {
    pub rect: Rect,
    pub fill: Color,
    pub stroke: Option<Stroke>,
}

impl RectangleComponent {
    pub fn new(rect: Rect, fill: Color) -> Self {
        Self { rect, fill, stroke: None }
    }

    pub fn with_stroke(mut self, stroke: Stroke) -> Self {
        self.stroke = Some(stroke);
        self
    }
}

#[derive(Debug)]
pub enum Component {
    Text(TextComponent),
    Rectangle(RectangleComponent),
}

/// One UI element: components drawn in order
pub type Element = Vec<Component>;

/// A titled, togglable box of text lines
#[derive(Debug, Clone, PartialEq)]
pub struct Panel {
    pub rect: Rect,
    pub title: String,
    pub lines: Vec<String>,
    visible: bool,
}

impl Panel {
    pub fn new(rect: Rect, title: impl Into<String>) -> Self {
        Self {
            rect,
            title: title.into(),
            lines: Vec::new(),
            visible: false,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }
}

pub struct UiHost {
    elements: VecDeque<Element>,
    panels: Vec<(String, Panel)>,
    /// Color for text and outlines drawn over the world
    pub text_color: Color,
    pub panel_fill: Color,
}

impl UiHost {
    pub fn new() -> Self {
        Self {
            elements: VecDeque::with_capacity(MAX_ELEMENTS),
            panels: Vec::new(),
            text_color: WHITE,
            panel_fill: Color::new(0.05, 0.05, 0.1, 0.85),
        }
    }

    /// Descriptor for the engine's UI host object
    pub fn spec() -> ObjectSpec {
        ObjectSpec::new(UI_HOST_ID)
            .flags(Flags::ALWAYS_UPDATE | Flags::ALWAYS_RENDER | Flags::IS_UI)
            .render_layer(UI_LAYER)
            .behavior(UiHost::new())
    }

    pub fn add_element(&mut self, element: Element) {
        if self.elements.len() >= MAX_ELEMENTS {
            self.elements.pop_front();
        }
        self.elements.push_back(element);
    }

    #[cfg(test)]
    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    /// Register a panel, replacing any panel of the same name
    pub fn add_panel(&mut self, name: impl Into<String>, panel: Panel) {
        let name = name.into();
        match self.panels.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = panel,
            None => self.panels.push((name, panel)),
        }
    }

    pub fn panel(&self, name: &str) -> Option<&Panel> {
        self.panels.iter().find(|(n, _)| n == name).map(|(_, p)| p)
    }

    pub fn panel_mut(&mut self, name: &str) -> Option<&mut Panel> {
        self.panels.iter_mut().find(|(n, _)| n == name).map(|(_, p)| p)
    }

    /// Flip a panel's visibility. Returns the new state, or None if there
    /// is no such panel.
    pub fn toggle_visibility(&mut self, name: &str) -> Option<bool> {
        let panel = self.panel_mut(name)?;
        panel.visible = !panel.visible;
        Some(panel.visible)
    }

    /// Returns false if there is no such panel
    pub fn set_visibility(&mut self, name: &str, visible: bool) -> bool {
        match self.panel_mut(name) {
            Some(panel) => {
                panel.visible = visible;
                true
            }
            None => false,
        }
    }

    pub fn is_visible(&self, name: &str) -> bool {
        self.panel(name).is_some_and(|p| p.visible)
    }

    pub fn set_lines(&mut self, name: &str, lines: Vec<String>) -> bool {
        match self.panel_mut(name) {
            Some(panel) => {
                panel.lines = lines;
                true
            }
            None => false,
        }
    }

    fn draw_panel(&self, panel: &Panel, surface: &mut dyn Surface) {
        surface.fill_rect(panel.rect, self.panel_fill);
        surface.stroke_rect(
            panel.rect,
            Stroke {
                color: self.text_color,
                thickness: 2.0,
            },
        );

        let padding = 12.0;
        let line_height = 22.0;
        let title_style = TextStyle {
            font_size: 24.0,
            fill: self.text_color,
            ..Default::default()
        };
        let line_style = TextStyle {
            font_size: 18.0,
            fill: self.text_color,
            ..Default::default()
        };

        let mut y = panel.rect.y + padding + title_style.font_size;
        surface.draw_text(&panel.title, vec2(panel.rect.x + padding, y), &title_style);
        y += padding;
        for line in &panel.lines {
            y += line_height;
            if y > panel.rect.bottom() {
                break;
            }
            surface.draw_text(line, vec2(panel.rect.x + padding, y), &line_style);
        }
    }
}

impl Default for UiHost {
    fn default() -> Self {
        Self::new()
    }
}

impl Behavior for UiHost {
    fn update(&mut self, ctx: &mut Context<'_>, _this: &mut GameObject, _delta: f32) -> HookResult {
        for element in self.elements.iter_mut() {
            for component in element.iter_mut() {
                if let Component::Text(text) = component {
                    if let Some(binding) = text.binding.as_mut() {
                        text.text = binding(&*ctx);
                    }
                }
            }
        }
        Ok(())
    }

    fn render(&mut self, _ctx: &mut Context<'_>, _this: &GameObject, surface: &mut dyn Surface) -> HookResult {
        for element in &self.elements {
            for component in element {
                match component {
                    Component::Text(text) => surface.draw_text(&text.text, text.position, &text.style),
                    Component::Rectangle(rect) => {
                        surface.fill_rect(rect.rect, rect.fill);
                        if let Some(stroke) = rect.stroke {
                            surface.stroke_rect(rect.rect, stroke);
                        }
                    }
                }
            }
        }
        for (_, panel) in &self.panels {
            if panel.visible {
                self.draw_panel(panel, surface);
            }
        }
        Ok(())
    }
}

/// Default HUD text style: black, centered
pub fn hud_text_style(font_size: f32) -> TextStyle {
    TextStyle {
        font_size,
        align: TextAlign::Center,
        fill: BLACK,
        stroke: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label(text: &str) -> Element {
        vec![Component::Text(TextComponent::new(text, Vec2::ZERO, TextStyle::default()))]
    }

    #[test]
    fn test_element_limit_evicts_oldest() {
        let mut host = UiHost::new();
        for i in 0..(MAX_ELEMENTS + 3) {
            host.add_element(label(&format!("element {}", i)));
        }
        assert_eq!(host.elements.len(), MAX_ELEMENTS);
        let first = match &host.elements[0][0] {
            Component::Text(t) => t.text.clone(),
            _ => unreachable!(),
        };
        assert_eq!(first, "element 3");
    }

    #[test]
    fn test_panel_visibility() {
        let mut host = UiHost::new();
        host.add_panel("inventory", Panel::new(Rect::new(0.0, 0.0, 200.0, 300.0), "Inventory"));

        assert!(!host.is_visible("inventory"));
        assert_eq!(host.toggle_visibility("inventory"), Some(true));
        assert!(host.is_visible("inventory"));
        assert_eq!(host.toggle_visibility("inventory"), Some(false));

        assert!(host.set_visibility("inventory", true));
        assert!(host.is_visible("inventory"));

        assert_eq!(host.toggle_visibility("missing"), None);
        assert!(!host.set_visibility("missing", true));
        assert!(!host.is_visible("missing"));
    }

    #[test]
    fn test_add_panel_replaces_same_name() {
        let mut host = UiHost::new();
        host.add_panel("planet", Panel::new(Rect::ZERO, "Old"));
        host.add_panel("planet", Panel::new(Rect::ZERO, "New"));
        assert_eq!(host.panel("planet").map(|p| p.title.as_str()), Some("New"));
        assert!(host.set_lines("planet", vec!["Fuel Planet".to_string()]));
        assert_eq!(host.panel("planet").unwrap().lines.len(), 1);
    }

    #[test]
    fn test_spec_flags() {
        let obj = UiHost::spec().materialize();
        assert_eq!(obj.identifier(), UI_HOST_ID);
        assert!(obj.has_flag(Flags::ALWAYS_UPDATE | Flags::ALWAYS_RENDER | Flags::IS_UI));
        assert_eq!(obj.render_layer, UI_LAYER);
        assert!(obj.behavior::<UiHost>().is_some());
    }
}
