//! Fonts as seen by the overlay
//!
//! Rasterizing glyphs and building atlases happens outside this crate, behind
//! [`FontLoader`]. The overlay only consumes the resulting metrics: every
//! glyph becomes one textured quad positioned from its advance, bearing and
//! width, and mapped onto its horizontal slice of the atlas texture.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use thiserror::Error;

use crate::core::config::ScreenConfig;
use crate::render::TextureHandle;

/// Font errors
#[derive(Debug, Error)]
pub enum FontError {
    /// The loader could not produce a font
    #[error("failed to load font {path} at size {size}: {reason}")]
    Load {
        /// Requested font path
        path: String,
        /// Requested pixel size
        size: u32,
        /// Loader-specific reason
        reason: String,
    },

    /// No font is registered under the id
    #[error("font {0} is not loaded")]
    UnknownFont(FontId),

    /// A string was requested before any font was loaded
    #[error("no font is selected")]
    NoFont,
}

/// Identifier of a registered font; ids start at 1
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FontId(pub u32);

impl fmt::Display for FontId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Placement of one glyph, in normalized screen and texture units
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GlyphMetrics {
    /// Pen advance after the glyph
    pub advance: f32,
    /// Offset from the pen to the glyph's left edge
    pub bearing_x: f32,
    /// Drawn width; zero-width glyphs such as spaces get no quad
    pub width: f32,
    /// Left edge of the glyph in the atlas
    pub u_min: f32,
    /// Right edge of the glyph in the atlas
    pub u_max: f32,
}

impl GlyphMetrics {
    /// Whether the glyph needs a quad
    pub fn is_visible(&self) -> bool {
        self.width > 0.0
    }
}

/// Everything a loader produces for one font
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FontData {
    /// Atlas texture
    pub texture: TextureHandle,
    /// Height of every glyph quad
    pub line_height: f32,
    /// Depth of the lowest descender below the baseline
    pub descender: f32,
    /// Per-character metrics
    pub glyphs: HashMap<char, GlyphMetrics>,
}

impl FontData {
    /// Printable ASCII font with uniform metrics
    ///
    /// Each glyph is `0.6 * pixel_size` pixels wide and occupies its own
    /// column of the atlas, in code point order. Space advances without
    /// drawing.
    pub fn monospace(texture: TextureHandle, pixel_size: u32, screen: &ScreenConfig) -> Self {
        let advance_px = (pixel_size as f32 * 0.6).ceil();
        let advance = advance_px * screen.pixel_width();
        let columns = f32::from(MONOSPACE_LAST - MONOSPACE_FIRST + 1);

        let glyphs = (MONOSPACE_FIRST..=MONOSPACE_LAST)
            .map(|code| {
                let column = f32::from(code - MONOSPACE_FIRST);
                let metrics = GlyphMetrics {
                    advance,
                    bearing_x: 0.0,
                    width: if code == b' ' { 0.0 } else { advance },
                    u_min: column / columns,
                    u_max: (column + 1.0) / columns,
                };
                (char::from(code), metrics)
            })
            .collect();

        Self {
            texture,
            line_height: pixel_size as f32 * screen.pixel_height(),
            descender: (pixel_size as f32 / 4.0).ceil() * screen.pixel_height(),
            glyphs,
        }
    }
}

const MONOSPACE_FIRST: u8 = b' ';
const MONOSPACE_LAST: u8 = b'~';

/// A font registered with the manager
#[derive(Debug, Clone, PartialEq)]
pub struct Font {
    id: FontId,
    texture: TextureHandle,
    line_height: f32,
    descender: f32,
    glyphs: HashMap<char, GlyphMetrics>,
}

impl Font {
    /// Wrap loaded font data under an id
    pub fn from_data(id: FontId, data: FontData) -> Self {
        Self {
            id,
            texture: data.texture,
            line_height: data.line_height,
            descender: data.descender,
            glyphs: data.glyphs,
        }
    }

    /// Printable ASCII font with uniform metrics, see [`FontData::monospace`]
    pub fn monospace(id: FontId, texture: TextureHandle, pixel_size: u32, screen: &ScreenConfig) -> Self {
        Self::from_data(id, FontData::monospace(texture, pixel_size, screen))
    }

    /// Font id
    pub const fn id(&self) -> FontId {
        self.id
    }

    /// Atlas texture
    pub const fn texture(&self) -> TextureHandle {
        self.texture
    }

    /// Height of a line of text
    pub const fn line_height(&self) -> f32 {
        self.line_height
    }

    /// Depth of the lowest descender
    pub const fn descender(&self) -> f32 {
        self.descender
    }

    /// Metrics of a character
    ///
    /// Characters missing from the font fall back to `?`, then to an empty
    /// glyph.
    pub fn glyph(&self, c: char) -> GlyphMetrics {
        self.glyphs
            .get(&c)
            .or_else(|| self.glyphs.get(&'?'))
            .copied()
            .unwrap_or_default()
    }

    /// Width of a string, the sum of its advances
    pub fn string_width(&self, text: &str) -> f32 {
        text.chars().map(|c| self.glyph(c).advance).sum()
    }

    /// Number of quads needed to draw a string
    pub fn visible_glyphs(&self, text: &str) -> usize {
        text.chars().filter(|c| self.glyph(*c).is_visible()).count()
    }
}

/// Produces font data from a path and pixel size
pub trait FontLoader {
    /// Load a font; called once per distinct path and size
    fn load(&mut self, path: &str, size: u32) -> Result<FontData, FontError>;
}

/// Loader producing [`FontData::monospace`] fonts without touching disk
///
/// Each loaded font gets the next texture handle, starting at 1. Useful for
/// headless rendering and tests.
#[derive(Debug, Clone)]
pub struct MonospaceFontLoader {
    screen: ScreenConfig,
    next_texture: u32,
}

impl MonospaceFontLoader {
    /// Create a loader for a screen size
    pub const fn new(screen: &ScreenConfig) -> Self {
        Self {
            screen: *screen,
            next_texture: 1,
        }
    }
}

impl FontLoader for MonospaceFontLoader {
    fn load(&mut self, path: &str, size: u32) -> Result<FontData, FontError> {
        if size == 0 {
            return Err(FontError::Load {
                path: path.to_owned(),
                size,
                reason: "pixel size must be non-zero".to_owned(),
            });
        }
        let texture = TextureHandle(self.next_texture);
        self.next_texture += 1;
        Ok(FontData::monospace(texture, size, &self.screen))
    }
}

/// Fonts owned by the manager, deduplicated by path and size
#[derive(Debug, Clone, Default)]
pub struct FontRegistry {
    fonts: BTreeMap<FontId, Font>,
    sources: HashMap<(String, u32), FontId>,
    last_id: u32,
}

impl FontRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a font
    pub fn get(&self, id: FontId) -> Result<&Font, FontError> {
        self.fonts.get(&id).ok_or(FontError::UnknownFont(id))
    }

    /// Id of a font previously loaded from `path` at `size`
    pub fn find(&self, path: &str, size: u32) -> Option<FontId> {
        self.sources.get(&(path.to_owned(), size)).copied()
    }

    /// Register font data, remembering its source when it has one
    pub fn insert(&mut self, data: FontData, source: Option<(&str, u32)>) -> FontId {
        self.last_id += 1;
        let id = FontId(self.last_id);
        if let Some((path, size)) = source {
            self.sources.insert((path.to_owned(), size), id);
        }
        self.fonts.insert(id, Font::from_data(id, data));
        id
    }

    /// Whether a font is registered
    pub fn contains(&self, id: FontId) -> bool {
        self.fonts.contains_key(&id)
    }

    /// Number of registered fonts
    pub fn len(&self) -> usize {
        self.fonts.len()
    }

    /// Whether no font is registered
    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_monospace_metrics() {
        let screen = ScreenConfig::new(800, 600);
        let font = Font::monospace(FontId(1), TextureHandle(3), 10, &screen);

        let a = font.glyph('A');
        assert_relative_eq!(a.advance, 6.0 * 2.0 / 800.0);
        assert!(a.is_visible());
        assert!(!font.glyph(' ').is_visible());
        assert_relative_eq!(font.line_height(), 10.0 * 2.0 / 600.0);
        assert_relative_eq!(font.string_width("ab c"), 4.0 * a.advance);
        assert_eq!(font.visible_glyphs("ab c"), 3);
    }

    #[test]
    fn test_missing_glyph_falls_back() {
        let screen = ScreenConfig::default();
        let font = Font::monospace(FontId(1), TextureHandle(1), 16, &screen);
        assert_eq!(font.glyph('\u{e9}'), font.glyph('?'));
    }

    #[test]
    fn test_registry_ids_start_at_one() {
        let screen = ScreenConfig::default();
        let mut loader = MonospaceFontLoader::new(&screen);
        let mut registry = FontRegistry::new();

        let data = loader.load("mono.ttf", 16).expect("load");
        let first = registry.insert(data, Some(("mono.ttf", 16)));
        assert_eq!(first, FontId(1));
        assert_eq!(registry.find("mono.ttf", 16), Some(first));
        assert_eq!(registry.find("mono.ttf", 12), None);

        let data = loader.load("mono.ttf", 12).expect("load");
        assert_eq!(data.texture, TextureHandle(2));
        assert_eq!(registry.insert(data, None), FontId(2));
        assert!(matches!(registry.get(FontId(9)), Err(FontError::UnknownFont(FontId(9)))));
    }

    #[test]
    fn test_loader_rejects_zero_size() {
        let mut loader = MonospaceFontLoader::new(&ScreenConfig::default());
        assert!(matches!(loader.load("mono.ttf", 0), Err(FontError::Load { .. })));
    }
}
