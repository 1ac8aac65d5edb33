//! CPU-side mirror of one vertex attribute stream

use bytemuck::Pod;

use super::backend::{BackendResult, BufferId, BufferKind, QuadRenderBackend};
use super::batch_renderer::BatchResult;
use super::vertex::VERTICES_PER_QUAD;

/// Per-vertex attribute data for every quad slot of a batch, plus its GPU buffer
#[derive(Debug)]
pub struct AttributeMirror<T: Pod> {
    data: Vec<T>,
    buffer: BufferId,
}

impl<T: Pod> AttributeMirror<T> {
    /// Create an empty mirror and its GPU buffer
    pub fn new(backend: &mut dyn QuadRenderBackend, label: &str) -> BatchResult<Self> {
        Ok(Self {
            data: Vec::new(),
            buffer: backend.create_buffer(label, BufferKind::Vertex)?,
        })
    }

    /// Grow to hold `quads` quads; never shrinks
    pub fn resize(&mut self, quads: usize) -> BatchResult<()> {
        let len = quads * VERTICES_PER_QUAD;
        if len > self.data.len() {
            self.data.try_reserve_exact(len - self.data.len())?;
            self.data.resize(len, T::zeroed());
        }
        Ok(())
    }

    /// Copy one element's attributes in at `offset` quads
    pub fn write(&mut self, offset: usize, source: &[T]) {
        let start = offset * VERTICES_PER_QUAD;
        match self.data.get_mut(start..start + source.len()) {
            Some(target) => target.copy_from_slice(source),
            None => log::warn!("Attribute mirror too small for {} vertices at quad {}", source.len(), offset),
        }
    }

    /// Upload the first `quads` quads
    pub fn upload(&self, backend: &mut dyn QuadRenderBackend, quads: usize) -> BackendResult<()> {
        let len = (quads * VERTICES_PER_QUAD).min(self.data.len());
        backend.upload_buffer(self.buffer, bytemuck::cast_slice(&self.data[..len]))
    }

    /// Mirrored data
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// GPU buffer backing the mirror
    pub const fn buffer(&self) -> BufferId {
        self.buffer
    }

    /// Release the GPU buffer
    pub fn release(&self, backend: &mut dyn QuadRenderBackend) {
        backend.destroy_buffer(self.buffer);
    }
}
