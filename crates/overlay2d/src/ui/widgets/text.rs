//! Text strings drawn as glyph quads
//!
//! A string owns one [`GlyphQuads`] element with room for `capacity`
//! glyphs. Glyphs are laid out left to right from the string's origin, which
//! sits on the bottom edge of the glyph quads. Quads past the last drawn
//! glyph are collapsed to zero area. When the text outgrows the element, a
//! new element with at least double the capacity replaces it. An edit whose
//! layout fails leaves the previous text in place.

use crate::foundation::collections::QuadKey;
use crate::foundation::math::{white, Vec4};
use crate::render::vertex::MAX_BATCH_QUADS;
use crate::render::{BatchResult, GlyphQuads, QuadElement, QuadLayers};
use crate::ui::font::{Font, FontId};

use super::core::{Transparency, Transparent, Visibility, Visible, ZOrder, ZOrdered};
use super::{WidgetContext, WidgetResult};

/// Horizontal placement of a label inside its container
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum TextAlign {
    /// Flush with the left edge, inset by two pixels
    #[default]
    Left,
    /// Centered
    Center,
    /// Flush with the right edge, inset by two pixels
    Right,
}

/// A line of text
#[derive(Debug)]
pub struct TextString {
    glyphs: QuadKey,
    capacity: usize,
    drawn: usize,
    text: String,
    font: FontId,
    x: f32,
    y: f32,
    max_x: f32,
    width: f32,
    height: f32,
    color: Vec4,
    z: ZOrder,
    visibility: Visibility,
}

impl TextString {
    /// Create a hidden string at `(x, y)`, white and at z-order 0
    pub fn new(ctx: &mut WidgetContext<'_>, font: FontId, text: &str, x: f32, y: f32) -> WidgetResult<Self> {
        let capacity = ctx.font(font)?.visible_glyphs(text).max(1);
        let glyphs = ctx.layers.text.insert(GlyphQuads::new(capacity));
        let mut string = Self {
            glyphs,
            capacity,
            drawn: 0,
            text: text.to_owned(),
            font,
            x,
            y,
            max_x: 1.0,
            width: 0.0,
            height: 0.0,
            color: white(),
            z: ZOrder::default(),
            visibility: Visibility::HIDDEN,
        };
        string.layout(ctx)?;
        Ok(string)
    }

    /// Replace the text
    pub fn set_text(&mut self, ctx: &mut WidgetContext<'_>, text: &str) -> WidgetResult<()> {
        self.edit(ctx, |current| text.clone_into(current))
    }

    /// Append to the text
    pub fn append(&mut self, ctx: &mut WidgetContext<'_>, text: &str) -> WidgetResult<()> {
        self.edit(ctx, |current| current.push_str(text))
    }

    /// Remove `len` characters starting at character `start`
    ///
    /// Ranges running past the end are cut short.
    pub fn remove(&mut self, ctx: &mut WidgetContext<'_>, start: usize, len: usize) -> WidgetResult<()> {
        let begin = byte_offset(&self.text, start);
        let end = byte_offset(&self.text, start.saturating_add(len));
        if begin == end {
            return Ok(());
        }
        self.edit(ctx, |current| current.replace_range(begin..end, ""))
    }

    /// Remove everything from character `start` on
    pub fn truncate(&mut self, ctx: &mut WidgetContext<'_>, start: usize) -> WidgetResult<()> {
        self.remove(ctx, start, usize::MAX)
    }

    /// Insert text before character `at`, or at the end if `at` is past it
    pub fn insert(&mut self, ctx: &mut WidgetContext<'_>, text: &str, at: usize) -> WidgetResult<()> {
        let index = byte_offset(&self.text, at);
        self.edit(ctx, |current| current.insert_str(index, text))
    }

    /// Move the origin
    pub fn set_position(&mut self, ctx: &mut WidgetContext<'_>, x: f32, y: f32) -> WidgetResult<()> {
        self.x = x;
        self.y = y;
        self.layout(ctx)
    }

    /// Move the origin by an offset
    pub fn translate(&mut self, ctx: &mut WidgetContext<'_>, dx: f32, dy: f32) -> WidgetResult<()> {
        self.set_position(ctx, self.x + dx, self.y + dy)
    }

    /// Stop drawing glyphs whose advance would pass `max_x`
    pub fn set_max_x(&mut self, ctx: &mut WidgetContext<'_>, max_x: f32) -> WidgetResult<()> {
        self.max_x = max_x.clamp(-1.0, 1.0);
        self.layout(ctx)
    }

    /// Switch to another font
    pub fn set_font(&mut self, ctx: &mut WidgetContext<'_>, font: FontId) -> WidgetResult<()> {
        ctx.font(font)?;
        self.font = font;
        self.layout(ctx)
    }

    /// Change the color, alpha included
    pub fn set_color(&mut self, ctx: &mut WidgetContext<'_>, color: Vec4) {
        self.color = color;
        self.apply_style(ctx.layers);
    }

    /// Change only the alpha, clamped to [0, 1]
    pub fn set_opacity(&mut self, ctx: &mut WidgetContext<'_>, alpha: f32) {
        self.color.w = alpha.clamp(0.0, 1.0);
        self.apply_style(ctx.layers);
    }

    /// Change the z-order
    pub fn set_z(&mut self, ctx: &mut WidgetContext<'_>, z: f32) {
        self.set_z_order(ctx, ZOrder::from_f32(z));
    }

    /// Change the z-order from a raw value
    pub fn set_z_order(&mut self, ctx: &mut WidgetContext<'_>, z: ZOrder) {
        self.z = z;
        self.apply_style(ctx.layers);
    }

    /// Add the glyphs to the text batch
    pub fn show(&mut self, ctx: &mut WidgetContext<'_>) -> WidgetResult<()> {
        self.visibility.set(true);
        ctx.layers.text.show(self.glyphs)?;
        Ok(())
    }

    /// Remove the glyphs from the text batch
    pub fn hide(&mut self, ctx: &mut WidgetContext<'_>) {
        self.visibility.set(false);
        ctx.layers.text.hide(self.glyphs);
    }

    /// Destroy the glyph element
    pub fn release(&mut self, ctx: &mut WidgetContext<'_>) {
        self.visibility.set(false);
        ctx.layers.text.remove(self.glyphs);
    }

    /// Current text
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Length in characters
    pub fn len(&self) -> usize {
        self.text.chars().count()
    }

    /// Whether the text is empty
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Font used for layout
    pub const fn font(&self) -> FontId {
        self.font
    }

    /// Origin x
    pub const fn x(&self) -> f32 {
        self.x
    }

    /// Origin y
    pub const fn y(&self) -> f32 {
        self.y
    }

    /// Laid out width
    pub const fn width(&self) -> f32 {
        self.width
    }

    /// Line height of the font
    pub const fn height(&self) -> f32 {
        self.height
    }

    /// Current color
    pub const fn color(&self) -> Vec4 {
        self.color
    }

    /// Key of the glyph element in the text layer
    pub const fn glyph_key(&self) -> QuadKey {
        self.glyphs
    }

    /// Glyph quads the element owns
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Glyph quads drawn by the last layout
    pub const fn drawn_glyphs(&self) -> usize {
        self.drawn
    }

    /// Width of the first `chars` characters
    pub fn prefix_width(&self, font: &Font, chars: usize) -> f32 {
        self.text.chars().take(chars).map(|c| font.glyph(c).advance).sum()
    }

    fn edit(&mut self, ctx: &mut WidgetContext<'_>, change: impl FnOnce(&mut String)) -> WidgetResult<()> {
        let previous = self.text.clone();
        change(&mut self.text);
        let Err(error) = self.layout(ctx) else {
            return Ok(());
        };

        self.text = previous;
        if let Err(relayout) = self.layout(ctx) {
            log::warn!("Restoring string layout failed: {relayout}");
        }
        Err(error)
    }

    fn layout(&mut self, ctx: &mut WidgetContext<'_>) -> WidgetResult<()> {
        let (layers, font) = ctx.split(self.font)?;
        let needed = font.visible_glyphs(&self.text);
        if needed > self.capacity {
            self.grow(layers, needed)?;
        }

        let Some(glyphs) = layers.text.get_mut(self.glyphs) else {
            log::warn!("String glyph element {:?} is gone", self.glyphs);
            return Ok(());
        };

        let quads = glyphs.quads_mut();
        quads.set_all_textures(font.texture());
        let mut pen = self.x;
        let mut quad = 0;
        for c in self.text.chars() {
            let metrics = font.glyph(c);
            if pen + metrics.advance > self.max_x {
                break;
            }
            if metrics.is_visible() {
                quads.geometry_mut().set_corner_positions(
                    quad,
                    pen + metrics.bearing_x,
                    self.y,
                    metrics.width,
                    font.line_height(),
                );
                quads.set_quad_uv(quad, metrics.u_min, 1.0, metrics.u_max, 0.0);
                quad += 1;
            }
            pen += metrics.advance;
        }
        for spare in quad..self.capacity {
            quads.geometry_mut().collapse(spare);
        }

        self.drawn = quad;
        self.width = pen - self.x;
        self.height = font.line_height();
        self.apply_style(layers);
        Ok(())
    }

    fn grow(&mut self, layers: &mut QuadLayers, needed: usize) -> BatchResult<()> {
        let capacity = needed.max((self.capacity * 2).min(MAX_BATCH_QUADS));
        let replacement = layers.text.insert(GlyphQuads::new(capacity));
        if layers.text.is_shown(self.glyphs) {
            layers.text.hide(self.glyphs);
            if let Err(error) = layers.text.show(replacement) {
                layers.text.remove(replacement);
                layers.text.show(self.glyphs)?;
                return Err(error);
            }
        }

        layers.text.remove(self.glyphs);
        log::debug!("String capacity {} -> {} glyphs", self.capacity, capacity);
        self.glyphs = replacement;
        self.capacity = capacity;
        Ok(())
    }

    fn apply_style(&self, layers: &mut QuadLayers) {
        if let Some(glyphs) = layers.text.get_mut(self.glyphs) {
            glyphs.set_tint(&self.color);
            glyphs.geometry_mut().set_all_depths(self.z.get());
        }
    }
}

impl Transparent for TextString {
    fn transparency(&self) -> Transparency {
        Transparency::from_alpha(self.color.w)
    }
}

impl ZOrdered for TextString {
    fn z_order(&self) -> ZOrder {
        self.z
    }
}

impl Visible for TextString {
    fn visibility(&self) -> Visibility {
        self.visibility
    }
}

fn byte_offset(text: &str, chars: usize) -> usize {
    text.char_indices().nth(chars).map_or(text.len(), |(index, _)| index)
}
