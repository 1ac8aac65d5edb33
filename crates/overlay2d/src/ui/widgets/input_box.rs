//! Single-line text input
//!
//! Two untextured quads (background and cursor bar) behind a string. The
//! string is drawn 5 below the box's z-order and inset by the margin. While
//! active the text uses the active color and the cursor bar is drawn; while
//! inactive the text is dimmed and the bar collapses.

use crate::foundation::collections::QuadKey;
use crate::foundation::math::{white, Vec4};
use crate::render::{QuadElement, UntexturedQuads};
use crate::spatial::{Bounded, Bounds};
use crate::ui::font::FontId;
use crate::ui::input::{EventFlow, Key};

use super::core::{Visibility, Visible, ZOrder, ZOrdered};
use super::text::TextString;
use super::{WidgetContext, WidgetResult};

const BACKGROUND: usize = 0;
const CURSOR: usize = 1;

/// Editable text field
#[derive(Debug)]
pub struct InputBox {
    quads: QuadKey,
    text: TextString,
    x: f32,
    y: f32,
    width: f32,
    inner_height: f32,
    margin: f32,
    cursor: usize,
    active: bool,
    active_color: Vec4,
    inactive_color: Vec4,
    z: ZOrder,
    visibility: Visibility,
}

impl InputBox {
    /// Width of a new box
    pub const DEFAULT_WIDTH: f32 = 0.3;
    /// Z-order of a new box
    pub const DEFAULT_Z: f32 = 100.0;

    /// Create a hidden, active, empty box at the origin
    pub fn new(ctx: &mut WidgetContext<'_>, font: FontId) -> WidgetResult<Self> {
        let text = TextString::new(ctx, font, "", 0.0, 0.0)?;
        let mut quads = UntexturedQuads::new(2);
        quads.set_quad_color(BACKGROUND, &Vec4::new(0.1, 0.1, 0.1, 0.8));
        let quads = ctx.layers.untextured.insert(quads);

        let mut input = Self {
            quads,
            inner_height: text.height(),
            text,
            x: 0.0,
            y: 0.0,
            width: Self::DEFAULT_WIDTH,
            margin: 0.0,
            cursor: 0,
            active: true,
            active_color: white(),
            inactive_color: Vec4::new(0.5, 0.5, 0.5, 1.0),
            z: ZOrder::default(),
            visibility: Visibility::HIDDEN,
        };
        input.set_z(ctx, Self::DEFAULT_Z);
        input.text.set_color(ctx, input.active_color);
        input.update_geometry(ctx)?;
        Ok(input)
    }

    /// Replace the text and move the cursor to its end
    pub fn set_text(&mut self, ctx: &mut WidgetContext<'_>, text: &str) -> WidgetResult<()> {
        self.text.set_text(ctx, text)?;
        self.cursor = self.text.len();
        self.update_cursor(ctx);
        Ok(())
    }

    /// Clear the text
    pub fn clear_text(&mut self, ctx: &mut WidgetContext<'_>) -> WidgetResult<()> {
        self.set_text(ctx, "")
    }

    /// Margin applied on all four sides
    pub fn set_margin(&mut self, ctx: &mut WidgetContext<'_>, margin: f32) -> WidgetResult<()> {
        self.margin = margin.max(0.0);
        self.update_geometry(ctx)
    }

    /// Height of the area inside the margins
    pub fn set_inner_height(&mut self, ctx: &mut WidgetContext<'_>, height: f32) -> WidgetResult<()> {
        self.inner_height = height.max(0.0);
        self.update_geometry(ctx)
    }

    /// Total width
    pub fn set_width(&mut self, ctx: &mut WidgetContext<'_>, width: f32) -> WidgetResult<()> {
        self.width = width.max(0.0);
        self.update_geometry(ctx)
    }

    /// Move the bottom-left corner
    pub fn set_position(&mut self, ctx: &mut WidgetContext<'_>, x: f32, y: f32) -> WidgetResult<()> {
        self.x = x;
        self.y = y;
        self.update_geometry(ctx)
    }

    /// Background color
    pub fn set_background_color(&mut self, ctx: &mut WidgetContext<'_>, color: &Vec4) {
        if let Some(quads) = ctx.layers.untextured.get_mut(self.quads) {
            quads.set_quad_color(BACKGROUND, color);
        }
    }

    /// Text color while active
    pub fn set_active_color(&mut self, ctx: &mut WidgetContext<'_>, color: Vec4) {
        self.active_color = color;
        if self.active {
            self.text.set_color(ctx, color);
            self.update_cursor(ctx);
        }
    }

    /// Text color while inactive
    pub fn set_inactive_color(&mut self, ctx: &mut WidgetContext<'_>, color: Vec4) {
        self.inactive_color = color;
        if !self.active {
            self.text.set_color(ctx, color);
        }
    }

    /// Z-order of the quads; the text goes 5 below
    pub fn set_z(&mut self, ctx: &mut WidgetContext<'_>, z: f32) {
        self.z = ZOrder::from_f32(z);
        if let Some(quads) = ctx.layers.untextured.get_mut(self.quads) {
            quads.geometry_mut().set_all_depths(z);
        }
        self.text.set_z_order(ctx, self.z.below(5));
    }

    /// Accept keys and show the cursor
    pub fn activate(&mut self, ctx: &mut WidgetContext<'_>) {
        self.active = true;
        self.text.set_color(ctx, self.active_color);
        self.update_cursor(ctx);
    }

    /// Ignore keys and hide the cursor
    pub fn deactivate(&mut self, ctx: &mut WidgetContext<'_>) {
        self.active = false;
        self.text.set_color(ctx, self.inactive_color);
        self.update_cursor(ctx);
    }

    /// Whether keys are accepted
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Edit the text; inactive boxes let the key continue
    pub fn key_pressed(&mut self, ctx: &mut WidgetContext<'_>, key: Key) -> WidgetResult<EventFlow> {
        if !self.active {
            return Ok(EventFlow::Continue);
        }

        match key {
            Key::Char(c) => {
                let mut buffer = [0; 4];
                self.text.insert(ctx, c.encode_utf8(&mut buffer), self.cursor)?;
                self.cursor += 1;
            }
            Key::Backspace => {
                if self.cursor > 0 {
                    self.text.remove(ctx, self.cursor - 1, 1)?;
                    self.cursor -= 1;
                }
            }
            Key::Delete => self.text.remove(ctx, self.cursor, 1)?,
            Key::Left => self.cursor = self.cursor.saturating_sub(1),
            Key::Right => self.cursor = (self.cursor + 1).min(self.text.len()),
            Key::Home => self.cursor = 0,
            Key::End => self.cursor = self.text.len(),
        }
        self.update_cursor(ctx);
        Ok(EventFlow::Absorbed)
    }

    /// Draw the box and its text
    pub fn show(&mut self, ctx: &mut WidgetContext<'_>) -> WidgetResult<()> {
        self.visibility.set(true);
        ctx.layers.untextured.show(self.quads)?;
        self.text.show(ctx)
    }

    /// Stop drawing the box and its text
    pub fn hide(&mut self, ctx: &mut WidgetContext<'_>) {
        self.visibility.set(false);
        ctx.layers.untextured.hide(self.quads);
        self.text.hide(ctx);
    }

    /// Destroy the quads and the string
    pub fn release(&mut self, ctx: &mut WidgetContext<'_>) {
        self.hide(ctx);
        ctx.layers.untextured.remove(self.quads);
        self.text.release(ctx);
    }

    /// Current text
    pub fn text(&self) -> &str {
        self.text.text()
    }

    /// Underlying string
    pub const fn string(&self) -> &TextString {
        &self.text
    }

    /// Cursor position in characters
    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    /// Key of the background and cursor quads in the untextured layer
    pub const fn quad_key(&self) -> QuadKey {
        self.quads
    }

    fn height(&self) -> f32 {
        self.inner_height + 2.0 * self.margin
    }

    fn update_geometry(&mut self, ctx: &mut WidgetContext<'_>) -> WidgetResult<()> {
        let height = self.height();
        if let Some(quads) = ctx.layers.untextured.get_mut(self.quads) {
            quads
                .geometry_mut()
                .set_corner_positions(BACKGROUND, self.x, self.y, self.width, height);
        }
        self.text.set_max_x(ctx, self.x + self.width - self.margin)?;
        self.text.set_position(ctx, self.x + self.margin, self.y + self.margin)?;
        self.update_cursor(ctx);
        Ok(())
    }

    fn update_cursor(&self, ctx: &mut WidgetContext<'_>) {
        let offset = match ctx.font(self.text.font()) {
            Ok(font) => self.text.prefix_width(font, self.cursor),
            Err(err) => {
                log::warn!("Cannot place input cursor: {err}");
                return;
            }
        };
        let bar_width = ctx.pixel_width();

        let Some(quads) = ctx.layers.untextured.get_mut(self.quads) else {
            return;
        };
        if self.active {
            let x = self.x + self.margin + offset;
            quads
                .geometry_mut()
                .set_corner_positions(CURSOR, x, self.y + self.margin, bar_width, self.inner_height);
            quads.set_quad_color(CURSOR, &self.active_color);
        } else {
            quads.geometry_mut().collapse(CURSOR);
        }
    }
}

impl Bounded for InputBox {
    fn bounds(&self) -> Bounds {
        Bounds::from_rect(self.x, self.y, self.width, self.height())
    }
}

impl ZOrdered for InputBox {
    fn z_order(&self) -> ZOrder {
        self.z
    }
}

impl Visible for InputBox {
    fn visibility(&self) -> Visibility {
        self.visibility
    }
}
