//! Untextured quads: per-corner RGBA colors

use crate::foundation::fixed_point::quantize_unit8;
use crate::foundation::math::Vec4;

use super::backend::{BackendResult, BufferId, QuadRenderBackend, ShadingKind};
use super::batch_renderer::{BatchResult, BatchStats, QuadShading};
use super::mirror::AttributeMirror;
use super::quad::{QuadElement, QuadGeometry};
use super::vertex::{QuadColor, INDICES_PER_QUAD, VERTICES_PER_QUAD};

/// Quad element with a color per corner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UntexturedQuads {
    geometry: QuadGeometry,
    colors: Vec<QuadColor>,
}

impl UntexturedQuads {
    /// Create `quads` quads, collapsed and opaque white
    pub fn new(quads: usize) -> Self {
        Self {
            geometry: QuadGeometry::new(quads),
            colors: vec![QuadColor::WHITE; quads * VERTICES_PER_QUAD],
        }
    }

    /// Per-corner colors, four per quad
    pub fn colors(&self) -> &[QuadColor] {
        &self.colors
    }

    /// Set all four corners of a quad to one color, channels clamped to [0, 1]
    pub fn set_quad_color(&mut self, quad: usize, color: &Vec4) {
        self.set_quad_color_fixed(
            quad,
            QuadColor::new(
                quantize_unit8(color.x),
                quantize_unit8(color.y),
                quantize_unit8(color.z),
                quantize_unit8(color.w),
            ),
        );
    }

    /// Set all four corners of a quad to a pre-quantized color
    pub fn set_quad_color_fixed(&mut self, quad: usize, color: QuadColor) {
        self.update_corners(quad, |corner| *corner = color);
    }

    /// Set red, green and blue of a quad, keeping its alpha
    pub fn set_quad_rgb(&mut self, quad: usize, r: f32, g: f32, b: f32) {
        let (r, g, b) = (quantize_unit8(r), quantize_unit8(g), quantize_unit8(b));
        self.update_corners(quad, |corner| {
            corner.r = r;
            corner.g = g;
            corner.b = b;
        });
    }

    /// Set the alpha of a quad, keeping its color
    pub fn set_quad_alpha(&mut self, quad: usize, alpha: f32) {
        let alpha = quantize_unit8(alpha);
        self.update_corners(quad, |corner| corner.a = alpha);
    }

    fn update_corners(&mut self, quad: usize, mut update: impl FnMut(&mut QuadColor)) {
        let start = quad * VERTICES_PER_QUAD;
        let count = self.geometry.quad_count();
        match self.colors.get_mut(start..start + VERTICES_PER_QUAD) {
            Some(corners) => {
                corners.iter_mut().for_each(&mut update);
                self.geometry.mark_dirty();
            }
            None => log::warn!("Ignoring color for quad {quad} of an element with {count} quads"),
        }
    }
}

impl QuadElement for UntexturedQuads {
    fn geometry(&self) -> &QuadGeometry {
        &self.geometry
    }

    fn geometry_mut(&mut self) -> &mut QuadGeometry {
        &mut self.geometry
    }
}

/// Shading for untextured quads: one draw covers the whole batch
#[derive(Debug)]
pub struct ColorShading {
    colors: AttributeMirror<QuadColor>,
}

impl ColorShading {
    /// Create the shading and its color buffer
    pub fn new(backend: &mut dyn QuadRenderBackend, label: &str) -> BatchResult<Self> {
        Ok(Self {
            colors: AttributeMirror::new(backend, &format!("{label}.colors"))?,
        })
    }

    /// Color mirror
    pub fn colors(&self) -> &[QuadColor] {
        self.colors.as_slice()
    }
}

impl QuadShading for ColorShading {
    type Element = UntexturedQuads;

    fn kind(&self) -> ShadingKind {
        ShadingKind::Untextured
    }

    fn resize_secondary(&mut self, quads: usize) -> BatchResult<()> {
        self.colors.resize(quads)
    }

    fn write_secondary(&mut self, element: &UntexturedQuads, offset: usize) {
        self.colors.write(offset, element.colors());
    }

    fn upload_secondary(&mut self, backend: &mut dyn QuadRenderBackend, quads: usize) -> BackendResult<()> {
        self.colors.upload(backend, quads)
    }

    fn draw_indexed(
        &mut self,
        backend: &mut dyn QuadRenderBackend,
        quads: usize,
        stats: &mut BatchStats,
    ) -> BackendResult<()> {
        backend.draw_indexed(0, (quads * INDICES_PER_QUAD) as u32)?;
        stats.draw_calls += 1;
        Ok(())
    }

    fn attribute_buffers(&self) -> (BufferId, Option<BufferId>) {
        (self.colors.buffer(), None)
    }

    fn release(&mut self, backend: &mut dyn QuadRenderBackend) {
        self.colors.release(backend);
    }
}
