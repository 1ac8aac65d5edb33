//! Textured quads: per-corner texture coordinates, per-quad alpha and texture

use crate::foundation::fixed_point::{quantize_unit16, UNIT16_ONE};

use super::backend::{BackendResult, BufferId, QuadRenderBackend, ShadingKind};
use super::batch_renderer::{BatchResult, BatchStats, QuadShading};
use super::mirror::AttributeMirror;
use super::quad::{QuadElement, QuadGeometry};
use super::vertex::{QuadTexCoord, TextureHandle, INDICES_PER_QUAD, VERTICES_PER_QUAD};

/// Quad element with texture coordinates and a texture per quad
///
/// The quad's opacity rides in the third channel of its texture coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TexturedQuads {
    geometry: QuadGeometry,
    tex_coords: Vec<QuadTexCoord>,
    textures: Vec<TextureHandle>,
}

impl TexturedQuads {
    /// Create `quads` quads mapping the whole texture, opaque, untextured
    pub fn new(quads: usize) -> Self {
        let mut element = Self {
            geometry: QuadGeometry::new(quads),
            tex_coords: vec![QuadTexCoord::default(); quads * VERTICES_PER_QUAD],
            textures: vec![TextureHandle::NONE; quads],
        };
        for quad in 0..quads {
            element.set_quad_uv_fixed(quad, 0, 0, UNIT16_ONE, UNIT16_ONE);
            element.set_quad_alpha_fixed(quad, UNIT16_ONE);
        }
        element
    }

    /// Per-corner texture coordinates, four per quad
    pub fn tex_coords(&self) -> &[QuadTexCoord] {
        &self.tex_coords
    }

    /// Texture of every quad
    pub fn textures(&self) -> &[TextureHandle] {
        &self.textures
    }

    /// Texture of one quad
    pub fn texture(&self, quad: usize) -> Option<TextureHandle> {
        self.textures.get(quad).copied()
    }

    /// Attach a texture to one quad
    pub fn set_texture(&mut self, quad: usize, texture: TextureHandle) {
        let count = self.textures.len();
        match self.textures.get_mut(quad) {
            Some(slot) => {
                *slot = texture;
                self.geometry.mark_dirty();
            }
            None => log::warn!("Ignoring texture for quad {quad} of an element with {count} quads"),
        }
    }

    /// Attach one texture to every quad
    pub fn set_all_textures(&mut self, texture: TextureHandle) {
        self.textures.fill(texture);
        self.geometry.mark_dirty();
    }

    /// Map a texture rectangle onto one quad, coordinates clamped to [0, 1]
    ///
    /// `(u_min, v_min)` lands on the bottom-left corner and `(u_max, v_max)`
    /// on the top-right corner.
    pub fn set_quad_uv(&mut self, quad: usize, u_min: f32, v_min: f32, u_max: f32, v_max: f32) {
        self.set_quad_uv_fixed(
            quad,
            quantize_unit16(u_min),
            quantize_unit16(v_min),
            quantize_unit16(u_max),
            quantize_unit16(v_max),
        );
    }

    /// Map a pre-quantized texture rectangle onto one quad
    pub fn set_quad_uv_fixed(&mut self, quad: usize, u_min: u16, v_min: u16, u_max: u16, v_max: u16) {
        let uvs = [(u_min, v_min), (u_max, v_min), (u_max, v_max), (u_min, v_max)];
        self.update_corners(quad, |index, corner| {
            corner.u = uvs[index].0;
            corner.v = uvs[index].1;
        });
    }

    /// Set the opacity of one quad, clamped to [0, 1]
    pub fn set_quad_alpha(&mut self, quad: usize, alpha: f32) {
        self.set_quad_alpha_fixed(quad, quantize_unit16(alpha));
    }

    /// Set the opacity of one quad from a pre-quantized value
    pub fn set_quad_alpha_fixed(&mut self, quad: usize, alpha: u16) {
        self.update_corners(quad, |_, corner| corner.alpha = alpha);
    }

    fn update_corners(&mut self, quad: usize, mut update: impl FnMut(usize, &mut QuadTexCoord)) {
        let start = quad * VERTICES_PER_QUAD;
        let count = self.textures.len();
        match self.tex_coords.get_mut(start..start + VERTICES_PER_QUAD) {
            Some(corners) => {
                for (index, corner) in corners.iter_mut().enumerate() {
                    update(index, corner);
                }
                self.geometry.mark_dirty();
            }
            None => log::warn!("Ignoring texture coordinates for quad {quad} of an element with {count} quads"),
        }
    }
}

impl QuadElement for TexturedQuads {
    fn geometry(&self) -> &QuadGeometry {
        &self.geometry
    }

    fn geometry_mut(&mut self) -> &mut QuadGeometry {
        &mut self.geometry
    }
}

/// Contiguous quads sharing one texture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureRun {
    /// Texture bound for the run
    pub texture: TextureHandle,
    /// First quad of the run
    pub first_quad: usize,
    /// Quads in the run
    pub quads: usize,
}

/// Split quads into runs of equal texture, in buffer order
pub fn texture_runs(textures: &[TextureHandle]) -> Vec<TextureRun> {
    let mut runs: Vec<TextureRun> = Vec::new();
    for (quad, &texture) in textures.iter().enumerate() {
        match runs.last_mut() {
            Some(run) if run.texture == texture => run.quads += 1,
            _ => runs.push(TextureRun {
                texture,
                first_quad: quad,
                quads: 1,
            }),
        }
    }
    runs
}

/// Draw one call per texture run, binding only when the texture changes
///
/// With `group_by_texture` the runs are stably reordered by texture first,
/// so interleaved textures are bound once each.
pub fn draw_texture_runs(
    backend: &mut dyn QuadRenderBackend,
    textures: &[TextureHandle],
    group_by_texture: bool,
    stats: &mut BatchStats,
) -> BackendResult<()> {
    let mut runs = texture_runs(textures);
    if group_by_texture {
        runs.sort_by_key(|run| run.texture);
    }

    let mut bound = None;
    for run in runs {
        if bound != Some(run.texture) {
            backend.bind_texture(run.texture)?;
            stats.texture_binds += 1;
            bound = Some(run.texture);
        }
        backend.draw_indexed(
            (run.first_quad * INDICES_PER_QUAD) as u32,
            (run.quads * INDICES_PER_QUAD) as u32,
        )?;
        stats.draw_calls += 1;
    }
    Ok(())
}

/// Per-quad texture mirror shared by the textured and text shadings
#[derive(Debug, Default)]
pub struct TextureMirror {
    textures: Vec<TextureHandle>,
}

impl TextureMirror {
    /// Grow to hold `quads` quads; never shrinks
    pub fn resize(&mut self, quads: usize) -> BatchResult<()> {
        if quads > self.textures.len() {
            self.textures.try_reserve_exact(quads - self.textures.len())?;
            self.textures.resize(quads, TextureHandle::NONE);
        }
        Ok(())
    }

    /// Copy an element's textures in at `offset` quads
    pub fn write(&mut self, offset: usize, source: &[TextureHandle]) {
        if let Some(target) = self.textures.get_mut(offset..offset + source.len()) {
            target.copy_from_slice(source);
        }
    }

    /// Mirrored textures
    pub fn as_slice(&self) -> &[TextureHandle] {
        &self.textures
    }

    /// Textures of the first `quads` quads
    pub fn active(&self, quads: usize) -> &[TextureHandle] {
        &self.textures[..quads.min(self.textures.len())]
    }
}

/// Shading for textured quads: one draw per texture run
#[derive(Debug)]
pub struct TextureShading {
    tex_coords: AttributeMirror<QuadTexCoord>,
    textures: TextureMirror,
    group_by_texture: bool,
}

impl TextureShading {
    /// Create the shading and its texture coordinate buffer
    pub fn new(backend: &mut dyn QuadRenderBackend, label: &str, group_by_texture: bool) -> BatchResult<Self> {
        Ok(Self {
            tex_coords: AttributeMirror::new(backend, &format!("{label}.uvs"))?,
            textures: TextureMirror::default(),
            group_by_texture,
        })
    }

    /// Texture coordinate mirror
    pub fn tex_coords(&self) -> &[QuadTexCoord] {
        self.tex_coords.as_slice()
    }

    /// Per-quad texture mirror
    pub fn textures(&self) -> &[TextureHandle] {
        self.textures.as_slice()
    }
}

impl QuadShading for TextureShading {
    type Element = TexturedQuads;

    fn kind(&self) -> ShadingKind {
        ShadingKind::Textured
    }

    fn resize_secondary(&mut self, quads: usize) -> BatchResult<()> {
        self.tex_coords.resize(quads)?;
        self.textures.resize(quads)
    }

    fn write_secondary(&mut self, element: &TexturedQuads, offset: usize) {
        self.tex_coords.write(offset, element.tex_coords());
        self.textures.write(offset, element.textures());
    }

    fn upload_secondary(&mut self, backend: &mut dyn QuadRenderBackend, quads: usize) -> BackendResult<()> {
        self.tex_coords.upload(backend, quads)
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
        (self.tex_coords.buffer(), None)
    }

    fn release(&mut self, backend: &mut dyn QuadRenderBackend) {
        self.tex_coords.release(backend);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::backend::HeadlessBackend;

    const A: TextureHandle = TextureHandle(1);
    const B: TextureHandle = TextureHandle(2);

    #[test]
    fn test_new_quads_map_full_texture() {
        let quads = TexturedQuads::new(1);
        let corners = quads.tex_coords();
        assert_eq!((corners[0].u, corners[0].v), (0, 0));
        assert_eq!((corners[2].u, corners[2].v), (u16::MAX, u16::MAX));
        assert!(corners.iter().all(|c| c.alpha == u16::MAX));
        assert_eq!(quads.texture(0), Some(TextureHandle::NONE));
    }

    #[test]
    fn test_alpha_and_uv_clamp() {
        let mut quads = TexturedQuads::new(1);
        quads.set_quad_alpha(0, 3.0);
        quads.set_quad_uv(0, -1.0, 0.0, 2.0, 1.0);
        let corners = quads.tex_coords();
        assert!(corners.iter().all(|c| c.alpha == u16::MAX));
        assert_eq!(corners[0].u, 0);
        assert_eq!(corners[1].u, u16::MAX);
    }

    #[test]
    fn test_runs_follow_buffer_order() {
        let runs = texture_runs(&[A, A, B, B, B, A]);
        assert_eq!(
            runs,
            vec![
                TextureRun { texture: A, first_quad: 0, quads: 2 },
                TextureRun { texture: B, first_quad: 2, quads: 3 },
                TextureRun { texture: A, first_quad: 5, quads: 1 },
            ]
        );
        assert!(texture_runs(&[]).is_empty());
    }

    #[test]
    fn test_draw_runs_rebinds_only_on_change() {
        let mut backend = HeadlessBackend::new();
        let mut stats = BatchStats::default();
        let buffers = crate::render::backend::BatchBuffers {
            positions: backend.create_buffer("p", crate::render::backend::BufferKind::Vertex).unwrap(),
            attributes: backend.create_buffer("a", crate::render::backend::BufferKind::Vertex).unwrap(),
            extra: None,
            indices: backend.create_buffer("i", crate::render::backend::BufferKind::Index).unwrap(),
        };
        backend.begin_batch(ShadingKind::Textured, &buffers).unwrap();
        draw_texture_runs(&mut backend, &[A, A, B, A], false, &mut stats).unwrap();

        assert_eq!(backend.texture_binds(), vec![A, B, A]);
        assert_eq!(backend.draw_calls(), vec![(0, 12), (12, 6), (18, 6)]);
        assert_eq!(stats.draw_calls, 3);
        assert_eq!(stats.texture_binds, 3);
    }

    #[test]
    fn test_grouped_runs_bind_each_texture_once() {
        let mut backend = HeadlessBackend::new();
        let mut stats = BatchStats::default();
        let buffers = crate::render::backend::BatchBuffers {
            positions: backend.create_buffer("p", crate::render::backend::BufferKind::Vertex).unwrap(),
            attributes: backend.create_buffer("a", crate::render::backend::BufferKind::Vertex).unwrap(),
            extra: None,
            indices: backend.create_buffer("i", crate::render::backend::BufferKind::Index).unwrap(),
        };
        backend.begin_batch(ShadingKind::Textured, &buffers).unwrap();
        draw_texture_runs(&mut backend, &[A, B, A, B], true, &mut stats).unwrap();

        assert_eq!(backend.texture_binds(), vec![A, B]);
        assert_eq!(backend.draw_calls(), vec![(0, 6), (12, 6), (6, 6), (18, 6)]);
    }
}
