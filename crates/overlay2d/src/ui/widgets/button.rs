//! Button widget: a textured quad with a label and click listeners
//!
//! A press inside an enabled button arms it and is absorbed. A release
//! inside an armed button fires every listener; any release disarms it.
//! Disabled buttons let both events continue to the next handler.

use crate::foundation::collections::{ListenerId, QuadKey, SlotMap};
use crate::foundation::math::Vec4;
use crate::render::{QuadElement, TextureHandle, TexturedQuads};
use crate::spatial::{Bounded, Bounds};
use crate::ui::font::FontId;
use crate::ui::input::{EventFlow, MouseButton, MouseHandler};

use super::core::{Transparency, Transparent, Visibility, Visible, ZOrder, ZOrdered};
use super::text::{TextAlign, TextString};
use super::{WidgetContext, WidgetResult};

/// Callback run when a click completes
pub type ClickListener = Box<dyn FnMut(MouseButton)>;

/// Clickable button
pub struct Button {
    quad: QuadKey,
    label: TextString,
    bounds: Bounds,
    align: TextAlign,
    enabled: bool,
    armed: bool,
    listeners: SlotMap<ListenerId, ClickListener>,
    transparency: Transparency,
    z: ZOrder,
    visibility: Visibility,
}

impl Button {
    /// Z-order of a new button; the label sits one below
    pub const DEFAULT_Z: f32 = 100.0;

    /// Create a hidden, empty button with zero-size bounds
    pub fn new(ctx: &mut WidgetContext<'_>, font: FontId, label_color: Vec4) -> WidgetResult<Self> {
        let mut label = TextString::new(ctx, font, "", 0.0, 0.0)?;
        label.set_color(ctx, label_color);
        let quad = ctx.layers.textured.insert(TexturedQuads::new(1));

        let mut button = Self {
            quad,
            label,
            bounds: Bounds::from_rect(0.0, 0.0, 0.0, 0.0),
            align: TextAlign::Left,
            enabled: true,
            armed: false,
            listeners: SlotMap::with_key(),
            transparency: Transparency::OPAQUE,
            z: ZOrder::default(),
            visibility: Visibility::HIDDEN,
        };
        button.set_z(ctx, Self::DEFAULT_Z);
        button.set_opacity(ctx, 1.0);
        button.recalculate(ctx)?;
        Ok(button)
    }

    /// Move and resize the button
    pub fn set_bounds(&mut self, ctx: &mut WidgetContext<'_>, x: f32, y: f32, w: f32, h: f32) -> WidgetResult<()> {
        self.bounds = Bounds::from_rect(x, y, w, h);
        self.recalculate(ctx)
    }

    /// Replace the label text
    pub fn set_text(&mut self, ctx: &mut WidgetContext<'_>, text: &str) -> WidgetResult<()> {
        self.label.set_text(ctx, text)?;
        self.recalculate(ctx)
    }

    /// Texture drawn on the button quad
    pub fn set_texture(&mut self, ctx: &mut WidgetContext<'_>, texture: TextureHandle) {
        if let Some(quads) = ctx.layers.textured.get_mut(self.quad) {
            quads.set_texture(0, texture);
        }
    }

    /// Change how the label is placed
    pub fn set_text_alignment(&mut self, ctx: &mut WidgetContext<'_>, align: TextAlign) -> WidgetResult<()> {
        self.align = align;
        self.recalculate(ctx)
    }

    /// Opacity of the button quad
    pub fn set_opacity(&mut self, ctx: &mut WidgetContext<'_>, alpha: f32) {
        self.transparency = Transparency::from_alpha(alpha);
        if let Some(quads) = ctx.layers.textured.get_mut(self.quad) {
            quads.set_quad_alpha(0, alpha);
        }
    }

    /// Z-order of the quad; the label goes one below
    pub fn set_z(&mut self, ctx: &mut WidgetContext<'_>, z: f32) {
        self.z = ZOrder::from_f32(z);
        if let Some(quads) = ctx.layers.textured.get_mut(self.quad) {
            quads.geometry_mut().set_depth(0, z);
        }
        self.label.set_z_order(ctx, self.z.below(1));
    }

    /// Enable or disable click handling
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.armed = false;
        }
    }

    /// Whether clicks are handled
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Whether a press started inside the button and no release followed
    pub const fn is_armed(&self) -> bool {
        self.armed
    }

    /// Register a listener for completed clicks
    pub fn add_click_listener(&mut self, listener: impl FnMut(MouseButton) + 'static) -> ListenerId {
        self.listeners.insert(Box::new(listener))
    }

    /// Unregister a listener; returns whether it existed
    pub fn remove_click_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id).is_some()
    }

    /// Draw the button and its label
    pub fn show(&mut self, ctx: &mut WidgetContext<'_>) -> WidgetResult<()> {
        self.visibility.set(true);
        ctx.layers.textured.show(self.quad)?;
        self.label.show(ctx)
    }

    /// Stop drawing the button and its label
    pub fn hide(&mut self, ctx: &mut WidgetContext<'_>) {
        self.visibility.set(false);
        self.armed = false;
        ctx.layers.textured.hide(self.quad);
        self.label.hide(ctx);
    }

    /// Destroy the button's quad and label
    pub fn release(&mut self, ctx: &mut WidgetContext<'_>) {
        self.hide(ctx);
        ctx.layers.textured.remove(self.quad);
        self.label.release(ctx);
    }

    /// Label string
    pub const fn label(&self) -> &TextString {
        &self.label
    }

    /// Label alignment
    pub const fn text_alignment(&self) -> TextAlign {
        self.align
    }

    /// Key of the button quad in the textured layer
    pub const fn quad_key(&self) -> QuadKey {
        self.quad
    }

    fn recalculate(&mut self, ctx: &mut WidgetContext<'_>) -> WidgetResult<()> {
        let Bounds { min, max } = self.bounds;
        if let Some(quads) = ctx.layers.textured.get_mut(self.quad) {
            quads
                .geometry_mut()
                .set_corner_positions(0, min.x, min.y, max.x - min.x, max.y - min.y);
        }

        let inset = 2.0 * ctx.pixel_width();
        let x = match self.align {
            TextAlign::Left => min.x + inset,
            TextAlign::Center => (min.x + max.x - self.label.width()) / 2.0,
            TextAlign::Right => max.x - inset - self.label.width(),
        };
        let y = (min.y + max.y - self.label.height()) / 2.0;
        self.label.set_position(ctx, x, y)
    }
}

impl MouseHandler for Button {
    fn mouse_pressed(&mut self, _x: f32, _y: f32, _button: MouseButton) -> EventFlow {
        if !self.enabled {
            return EventFlow::Continue;
        }
        self.armed = true;
        EventFlow::Absorbed
    }

    fn mouse_released(&mut self, x: f32, y: f32, button: MouseButton) -> EventFlow {
        if !self.enabled {
            return EventFlow::Continue;
        }
        if self.armed && self.bounds.contains(x, y) {
            for listener in self.listeners.values_mut() {
                listener(button);
            }
        }
        self.armed = false;
        EventFlow::Absorbed
    }
}

impl Bounded for Button {
    fn bounds(&self) -> Bounds {
        self.bounds
    }
}

impl Transparent for Button {
    fn transparency(&self) -> Transparency {
        self.transparency
    }
}

impl ZOrdered for Button {
    fn z_order(&self) -> ZOrder {
        self.z
    }
}

impl Visible for Button {
    fn visibility(&self) -> Visibility {
        self.visibility
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::foundation::math::white;
    use crate::ui::widgets::test_support::Fixture;
    use approx::assert_relative_eq;

    fn button(fixture: &mut Fixture) -> Button {
        let mut ctx = fixture.context();
        let mut button = Button::new(&mut ctx, Fixture::FONT, white()).expect("button");
        button.set_bounds(&mut ctx, -0.5, -0.5, 1.0, 0.5).expect("bounds");
        button.set_text(&mut ctx, "OK").expect("text");
        button
    }

    #[test]
    fn test_click_fires_listeners() {
        let mut fixture = Fixture::new();
        let mut button = button(&mut fixture);
        let clicks = Rc::new(Cell::new(0));
        let counter = Rc::clone(&clicks);
        button.add_click_listener(move |_| counter.set(counter.get() + 1));

        assert_eq!(button.mouse_pressed(0.0, -0.25, MouseButton::Left), EventFlow::Absorbed);
        assert!(button.is_armed());
        assert_eq!(button.mouse_released(0.1, -0.2, MouseButton::Left), EventFlow::Absorbed);
        assert_eq!(clicks.get(), 1);
        assert!(!button.is_armed());
    }

    #[test]
    fn test_release_outside_does_not_click() {
        let mut fixture = Fixture::new();
        let mut button = button(&mut fixture);
        let clicks = Rc::new(Cell::new(0));
        let counter = Rc::clone(&clicks);
        let id = button.add_click_listener(move |_| counter.set(counter.get() + 1));

        button.mouse_pressed(0.0, -0.25, MouseButton::Left);
        button.mouse_released(0.9, 0.9, MouseButton::Left);
        assert_eq!(clicks.get(), 0);

        button.mouse_released(0.0, -0.25, MouseButton::Left);
        assert_eq!(clicks.get(), 0);

        assert!(button.remove_click_listener(id));
        assert!(!button.remove_click_listener(id));
    }

    #[test]
    fn test_disabled_button_lets_events_continue() {
        let mut fixture = Fixture::new();
        let mut button = button(&mut fixture);
        button.set_enabled(false);
        assert_eq!(button.mouse_pressed(0.0, -0.25, MouseButton::Left), EventFlow::Continue);
        assert_eq!(button.mouse_released(0.0, -0.25, MouseButton::Left), EventFlow::Continue);
        assert!(!button.is_armed());
    }

    #[test]
    fn test_label_alignment() {
        let mut fixture = Fixture::new();
        let mut button = button(&mut fixture);
        let inset = 2.0 * fixture.screen.pixel_width();
        let mut ctx = fixture.context();

        assert_relative_eq!(button.label().x(), -0.5 + inset);

        button.set_text_alignment(&mut ctx, TextAlign::Right).expect("align");
        assert_relative_eq!(button.label().x() + button.label().width(), 0.5 - inset, epsilon = 1e-6);

        button.set_text_alignment(&mut ctx, TextAlign::Center).expect("align");
        assert_relative_eq!(button.label().x() + button.label().width() / 2.0, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_label_sits_below_button() {
        let mut fixture = Fixture::new();
        let mut button = button(&mut fixture);
        let mut ctx = fixture.context();
        button.set_z(&mut ctx, 50.0);
        assert_eq!(button.z_order().raw(), 50);
        assert_eq!(button.label().z_order().raw(), 49);

        let quads = ctx.layers.textured.get(button.quad_key()).expect("quad");
        assert!(quads.geometry().positions().iter().all(|p| p.z == 50));
    }
}
