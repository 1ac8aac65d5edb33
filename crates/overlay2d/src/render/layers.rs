//! Quad stores paired with their batch renderers
//!
//! A [`QuadLayer`] owns the elements of one shading kind and the renderer
//! that draws them. The widget layer creates, mutates and destroys elements
//! through it; the renderer only keeps keys.

use crate::core::config::RendererConfig;
use crate::foundation::collections::{QuadKey, QuadStore};

use super::backend::QuadRenderBackend;
use super::batch_renderer::{BatchResult, BatchStats, QuadBatchRenderer, QuadShading};
use super::glyph::GlyphShading;
use super::quad::QuadElement;
use super::textured::TextureShading;
use super::untextured::ColorShading;
use super::vertex::MAX_BATCH_QUADS;

/// Elements of one shading kind plus the renderer drawing them
pub struct QuadLayer<S: QuadShading> {
    store: QuadStore<S::Element>,
    renderer: QuadBatchRenderer<S>,
}

impl<S: QuadShading> QuadLayer<S> {
    /// Wrap a renderer with an empty store
    pub fn new(renderer: QuadBatchRenderer<S>) -> Self {
        Self {
            store: QuadStore::with_key(),
            renderer,
        }
    }

    /// Take ownership of a new element; it starts hidden
    pub fn insert(&mut self, element: S::Element) -> QuadKey {
        self.store.insert(element)
    }

    /// Borrow an element
    pub fn get(&self, key: QuadKey) -> Option<&S::Element> {
        self.store.get(key)
    }

    /// Mutably borrow an element
    pub fn get_mut(&mut self, key: QuadKey) -> Option<&mut S::Element> {
        self.store.get_mut(key)
    }

    /// Hide and destroy an element
    pub fn remove(&mut self, key: QuadKey) -> Option<S::Element> {
        self.renderer.hide(key);
        self.store.remove(key)
    }

    /// Show an element, growing the batch geometrically when it is full
    ///
    /// Returns `false` for an unknown key.
    pub fn show(&mut self, key: QuadKey) -> BatchResult<bool> {
        if self.renderer.is_shown(key) {
            return Ok(true);
        }
        let Some(element) = self.store.get_mut(key) else {
            log::warn!("Cannot show unknown quad element {key:?}");
            return Ok(false);
        };

        let needed = self.renderer.quad_count() + element.quad_count();
        if needed > self.renderer.capacity() {
            let doubled = (self.renderer.capacity() * 2).min(MAX_BATCH_QUADS);
            self.renderer.ensure_capacity(needed.max(doubled))?;
        }
        self.renderer.show(key, element)?;
        Ok(true)
    }

    /// Hide an element; unknown or hidden keys are ignored
    pub fn hide(&mut self, key: QuadKey) {
        self.renderer.hide(key);
    }

    /// Whether an element is shown
    pub fn is_shown(&self, key: QuadKey) -> bool {
        self.renderer.is_shown(key)
    }

    /// Number of stored elements, shown or not
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Render the shown elements
    pub fn render(&mut self, backend: &mut dyn QuadRenderBackend) -> BatchResult<()> {
        self.renderer.render(backend, &mut self.store)
    }

    /// Batch renderer
    pub const fn renderer(&self) -> &QuadBatchRenderer<S> {
        &self.renderer
    }

    /// Release GPU buffers
    pub fn release(&mut self, backend: &mut dyn QuadRenderBackend) {
        self.renderer.release(backend);
    }
}

/// Statistics of the three batches for one frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Untextured batch
    pub untextured: BatchStats,
    /// Textured batch
    pub textured: BatchStats,
    /// Text batch
    pub text: BatchStats,
}

impl FrameStats {
    /// Quads drawn across all batches
    pub const fn quads(&self) -> usize {
        self.untextured.quads + self.textured.quads + self.text.quads
    }

    /// Draw calls across all batches
    pub const fn draw_calls(&self) -> usize {
        self.untextured.draw_calls + self.textured.draw_calls + self.text.draw_calls
    }
}

/// The three layers of the overlay, rendered untextured, textured, then text
pub struct QuadLayers {
    /// Colored quads
    pub untextured: QuadLayer<ColorShading>,
    /// Textured quads
    pub textured: QuadLayer<TextureShading>,
    /// Glyph quads
    pub text: QuadLayer<GlyphShading>,
}

impl QuadLayers {
    /// Create the three renderers and reserve their initial capacity
    pub fn new(backend: &mut dyn QuadRenderBackend, config: &RendererConfig) -> BatchResult<Self> {
        let group = config.sort_textured_by_texture;
        let shading = ColorShading::new(backend, "untextured")?;
        let mut untextured = QuadBatchRenderer::new(backend, shading, "untextured")?;
        let shading = TextureShading::new(backend, "textured", group)?;
        let mut textured = QuadBatchRenderer::new(backend, shading, "textured")?;
        let shading = GlyphShading::new(backend, "text", group)?;
        let mut text = QuadBatchRenderer::new(backend, shading, "text")?;

        untextured.ensure_capacity(config.initial_quad_capacity)?;
        textured.ensure_capacity(config.initial_quad_capacity)?;
        text.ensure_capacity(config.initial_quad_capacity)?;

        Ok(Self {
            untextured: QuadLayer::new(untextured),
            textured: QuadLayer::new(textured),
            text: QuadLayer::new(text),
        })
    }

    /// Render every layer in fixed order
    pub fn render(&mut self, backend: &mut dyn QuadRenderBackend) -> BatchResult<FrameStats> {
        self.untextured.render(backend)?;
        self.textured.render(backend)?;
        self.text.render(backend)?;
        Ok(self.stats())
    }

    /// Statistics of the last frame
    pub fn stats(&self) -> FrameStats {
        FrameStats {
            untextured: *self.untextured.renderer().stats(),
            textured: *self.textured.renderer().stats(),
            text: *self.text.renderer().stats(),
        }
    }

    /// Release every GPU buffer
    pub fn release(&mut self, backend: &mut dyn QuadRenderBackend) {
        self.untextured.release(backend);
        self.textured.release(backend);
        self.text.release(backend);
    }
}
