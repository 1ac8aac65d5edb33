//! Glyph quads: textured quads tinted by a per-corner color
//!
//! Strings draw through their own batch so the text program can sample the
//! font atlas as coverage and color it with the tint.

use crate::foundation::fixed_point::quantize_unit8;
use crate::foundation::math::Vec4;

use super::backend::{BackendResult, BufferId, QuadRenderBackend, ShadingKind};
use super::batch_renderer::{BatchResult, BatchStats, QuadShading};
use super::mirror::AttributeMirror;
use super::quad::{QuadElement, QuadGeometry};
use super::textured::{draw_texture_runs, TextureMirror, TexturedQuads};
use super::vertex::{QuadColor, QuadTexCoord, TextureHandle, VERTICES_PER_QUAD};

/// Textured quads plus a tint color per corner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlyphQuads {
    quads: TexturedQuads,
    tints: Vec<QuadColor>,
}

impl GlyphQuads {
    /// Create `quads` glyph quads tinted opaque white
    pub fn new(quads: usize) -> Self {
        Self {
            quads: TexturedQuads::new(quads),
            tints: vec![QuadColor::WHITE; quads * VERTICES_PER_QUAD],
        }
    }

    /// Underlying textured quads
    pub const fn quads(&self) -> &TexturedQuads {
        &self.quads
    }

    /// Underlying textured quads, for positions, coordinates and textures
    pub fn quads_mut(&mut self) -> &mut TexturedQuads {
        &mut self.quads
    }

    /// Per-corner tints, four per quad
    pub fn tints(&self) -> &[QuadColor] {
        &self.tints
    }

    /// Tint every glyph with one color, channels clamped to [0, 1]
    pub fn set_tint(&mut self, color: &Vec4) {
        let tint = QuadColor::new(
            quantize_unit8(color.x),
            quantize_unit8(color.y),
            quantize_unit8(color.z),
            quantize_unit8(color.w),
        );
        self.tints.fill(tint);
        self.quads.geometry_mut().mark_dirty();
    }
}

impl QuadElement for GlyphQuads {
    fn geometry(&self) -> &QuadGeometry {
        self.quads.geometry()
    }

    fn geometry_mut(&mut self) -> &mut QuadGeometry {
        self.quads.geometry_mut()
    }
}

/// Shading for text: texture runs like textured quads, plus a tint stream
#[derive(Debug)]
pub struct GlyphShading {
    tex_coords: AttributeMirror<QuadTexCoord>,
    tints: AttributeMirror<QuadColor>,
    textures: TextureMirror,
    group_by_texture: bool,
}

impl GlyphShading {
    /// Create the shading and its coordinate and tint buffers
    pub fn new(backend: &mut dyn QuadRenderBackend, label: &str, group_by_texture: bool) -> BatchResult<Self> {
        Ok(Self {
            tex_coords: AttributeMirror::new(backend, &format!("{label}.uvs"))?,
            tints: AttributeMirror::new(backend, &format!("{label}.tints"))?,
            textures: TextureMirror::default(),
            group_by_texture,
        })
    }

    /// Tint mirror
    pub fn tints(&self) -> &[QuadColor] {
        self.tints.as_slice()
    }

    /// Per-quad texture mirror
    pub fn textures(&self) -> &[TextureHandle] {
        self.textures.as_slice()
    }
}

impl QuadShading for GlyphShading {
    type Element = GlyphQuads;

    fn kind(&self) -> ShadingKind {
        ShadingKind::Text
    }

    fn resize_secondary(&mut self, quads: usize) -> BatchResult<()> {
        self.tex_coords.resize(quads)?;
        self.tints.resize(quads)?;
        self.textures.resize(quads)
    }

    fn write_secondary(&mut self, element: &GlyphQuads, offset: usize) {
        self.tex_coords.write(offset, element.quads.tex_coords());
        self.tints.write(offset, element.tints());
        self.textures.write(offset, element.quads.textures());
    }

    fn upload_secondary(&mut self, backend: &mut dyn QuadRenderBackend, quads: usize) -> BackendResult<()> {
        self.tex_coords.upload(backend, quads)?;
        self.tints.upload(backend, quads)
    }

    fn draw_indexed(
        &mut self,
        backend: &mut dyn QuadRenderBackend,
        quads: usize,
        stats: &mut BatchStats,
    ) -> BackendResult<()> {
        draw_texture_runs(backend, self.textures.active(quads), self.group_by_texture, stats)
    }

    fn attribute_buffers(&self) -> (BufferId, Option<BufferId>) {
        (self.tex_coords.buffer(), Some(self.tints.buffer()))
    }

    fn release(&mut self, backend: &mut dyn QuadRenderBackend) {
        self.tex_coords.release(backend);
        self.tints.release(backend);
    }
}
