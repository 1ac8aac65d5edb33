//! # Batch Renderer
//!
//! Collects every visible quad element of one shading kind into shared
//! vertex and index buffers and draws them with as few calls as possible.
//!
//! ## Architecture
//!
//! - **QuadBatchRenderer**: the shared algorithm. Tracks the visible set,
//!   grows the CPU mirrors, asks elements to republish, uploads what changed
//! - **QuadShading**: the per-kind strategy. Owns the secondary attribute
//!   mirror (colors or texture coordinates) and decides how to draw
//!
//! ## Frame flow
//!
//! Elements are visited in key order. Each one publishes its vertices at the
//! running quad offset, but only if it changed or its slot moved. The
//! position and secondary buffers are uploaded only when something was
//! published; the index buffer only after it grew.

use std::collections::{BTreeMap, TryReserveError};

use bitflags::bitflags;

use crate::foundation::collections::{QuadKey, QuadStore};

use super::backend::{BackendError, BackendResult, BatchBuffers, BufferId, BufferKind, QuadRenderBackend, ShadingKind};
use super::quad::QuadElement;
use super::vertex::{extend_indices, QuadPosition, INDICES_PER_QUAD, MAX_BATCH_QUADS, VERTICES_PER_QUAD};

/// Result type for batch rendering operations
pub type BatchResult<T> = Result<T, BatchError>;

/// Errors that can occur during batch rendering
#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    /// 16-bit indices cannot address the requested number of quads
    #[error("Batch capacity exceeded: {requested} > {max} quads")]
    CapacityExceeded {
        /// Quads requested
        requested: usize,
        /// Largest addressable batch
        max: usize,
    },

    /// Growing a CPU-side mirror failed
    #[error("Batch allocation failed: {0}")]
    Allocation(#[from] TryReserveError),

    /// The GPU backend rejected an upload or draw
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),
}

bitflags! {
    /// Buffers uploaded during a frame
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct UploadFlags: u8 {
        /// Vertex positions
        const POSITIONS = 0b001;
        /// Colors or texture coordinates
        const ATTRIBUTES = 0b010;
        /// Triangle indices
        const INDICES = 0b100;
    }
}

/// Statistics for the last rendered frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchStats {
    /// Quads drawn
    pub quads: usize,
    /// Visible elements visited
    pub elements: usize,
    /// Elements that republished their data
    pub elements_written: usize,
    /// Indexed draw calls issued
    pub draw_calls: usize,
    /// Texture binds issued
    pub texture_binds: usize,
    /// Buffers uploaded
    pub uploads: UploadFlags,
}

/// Per-kind strategy plugged into [`QuadBatchRenderer`]
pub trait QuadShading {
    /// Quad element type drawn by this shading
    type Element: QuadElement;

    /// Program the backend should draw with
    fn kind(&self) -> ShadingKind;

    /// Grow the secondary attribute mirror to `quads` quads
    fn resize_secondary(&mut self, quads: usize) -> BatchResult<()>;

    /// Copy an element's secondary attributes in at `offset` quads
    ///
    /// Called only for elements whose positions were just republished.
    fn write_secondary(&mut self, element: &Self::Element, offset: usize);

    /// Upload the secondary attributes of the first `quads` quads
    fn upload_secondary(&mut self, backend: &mut dyn QuadRenderBackend, quads: usize) -> BackendResult<()>;

    /// Issue the draw calls for the first `quads` quads
    fn draw_indexed(
        &mut self,
        backend: &mut dyn QuadRenderBackend,
        quads: usize,
        stats: &mut BatchStats,
    ) -> BackendResult<()>;

    /// Attribute buffers bound next to positions and indices
    fn attribute_buffers(&self) -> (BufferId, Option<BufferId>);

    /// Release GPU buffers owned by the shading
    fn release(&mut self, backend: &mut dyn QuadRenderBackend);
}

/// Batch renderer for one shading kind
#[derive(Debug)]
pub struct QuadBatchRenderer<S: QuadShading> {
    shading: S,
    visible: BTreeMap<QuadKey, usize>,
    quad_count: usize,
    capacity: usize,
    positions: Vec<QuadPosition>,
    indices: Vec<u16>,
    index_dirty: bool,
    force_rewrite: bool,
    position_buffer: BufferId,
    index_buffer: BufferId,
    stats: BatchStats,
    released: bool,
}

impl<S: QuadShading> QuadBatchRenderer<S> {
    /// Create an empty renderer and its position and index buffers
    pub fn new(backend: &mut dyn QuadRenderBackend, shading: S, label: &str) -> BatchResult<Self> {
        let position_buffer = backend.create_buffer(&format!("{label}.positions"), BufferKind::Vertex)?;
        let index_buffer = backend.create_buffer(&format!("{label}.indices"), BufferKind::Index)?;
        log::info!("Created {label} batch renderer ({:?})", shading.kind());

        Ok(Self {
            shading,
            visible: BTreeMap::new(),
            quad_count: 0,
            capacity: 0,
            positions: Vec::new(),
            indices: Vec::new(),
            index_dirty: false,
            force_rewrite: false,
            position_buffer,
            index_buffer,
            stats: BatchStats::default(),
            released: false,
        })
    }

    /// Add an element to the visible set
    ///
    /// Showing an element already in the set does nothing. A newly shown
    /// element republishes on the next render even if it did not change.
    pub fn show(&mut self, key: QuadKey, element: &mut S::Element) -> BatchResult<()> {
        if self.visible.contains_key(&key) {
            return Ok(());
        }

        let quads = element.quad_count();
        self.ensure_capacity(self.quad_count + quads)?;
        element.geometry_mut().mark_dirty();
        self.visible.insert(key, quads);
        self.quad_count += quads;
        Ok(())
    }

    /// Remove an element from the visible set; unknown keys are ignored
    pub fn hide(&mut self, key: QuadKey) {
        if let Some(quads) = self.visible.remove(&key) {
            self.quad_count -= quads;
        }
    }

    /// Whether an element is in the visible set
    pub fn is_shown(&self, key: QuadKey) -> bool {
        self.visible.contains_key(&key)
    }

    /// Grow the mirrors so `quads` quads fit
    ///
    /// The caller picks the target size; the renderer never shrinks and
    /// only generates index entries for new slots.
    pub fn ensure_capacity(&mut self, quads: usize) -> BatchResult<()> {
        if quads <= self.capacity {
            return Ok(());
        }
        if quads > MAX_BATCH_QUADS {
            return Err(BatchError::CapacityExceeded {
                requested: quads,
                max: MAX_BATCH_QUADS,
            });
        }

        let added = quads - self.capacity;
        self.positions.try_reserve_exact(added * VERTICES_PER_QUAD)?;
        self.indices.try_reserve_exact(added * INDICES_PER_QUAD)?;
        self.shading.resize_secondary(quads)?;

        self.positions.resize(quads * VERTICES_PER_QUAD, QuadPosition::default());
        extend_indices(&mut self.indices, self.capacity, quads);
        log::debug!("{:?} batch capacity {} -> {} quads", self.shading.kind(), self.capacity, quads);
        self.capacity = quads;
        self.index_dirty = true;
        Ok(())
    }

    /// Republish every visible element on the next render
    pub fn invalidate(&mut self) {
        self.force_rewrite = true;
    }

    /// Publish changed elements, upload changed buffers and draw
    ///
    /// Keys whose element is gone from `store` are dropped from the visible
    /// set with a warning. An element whose quad count no longer matches the
    /// count recorded at `show` is re-slotted and the whole batch republishes.
    pub fn render(
        &mut self,
        backend: &mut dyn QuadRenderBackend,
        store: &mut QuadStore<S::Element>,
    ) -> BatchResult<()> {
        self.prune(store);
        self.resync_counts(store)?;

        let force = std::mem::take(&mut self.force_rewrite);
        let mut stats = BatchStats {
            elements: self.visible.len(),
            ..BatchStats::default()
        };

        let mut offset = 0;
        for (&key, &quads) in &self.visible {
            if let Some(element) = store.get_mut(key) {
                if element.geometry_mut().write_into(&mut self.positions, offset, force) {
                    self.shading.write_secondary(element, offset);
                    stats.elements_written += 1;
                }
            }
            offset += quads;
        }

        if stats.elements_written > 0 {
            let active = self.quad_count * VERTICES_PER_QUAD;
            backend.upload_buffer(self.position_buffer, bytemuck::cast_slice(&self.positions[..active]))?;
            self.shading.upload_secondary(backend, self.quad_count)?;
            stats.uploads |= UploadFlags::POSITIONS | UploadFlags::ATTRIBUTES;
        }

        if self.index_dirty {
            backend.upload_buffer(self.index_buffer, bytemuck::cast_slice(&self.indices))?;
            self.index_dirty = false;
            stats.uploads |= UploadFlags::INDICES;
        }

        if self.quad_count > 0 {
            let (attributes, extra) = self.shading.attribute_buffers();
            let buffers = BatchBuffers {
                positions: self.position_buffer,
                attributes,
                extra,
                indices: self.index_buffer,
            };
            backend.begin_batch(self.shading.kind(), &buffers)?;
            self.shading.draw_indexed(backend, self.quad_count, &mut stats)?;
            backend.end_batch()?;
        }

        stats.quads = self.quad_count;
        if stats.uploads.is_empty() {
            log::trace!("{:?} batch: {} quads, nothing uploaded", self.shading.kind(), stats.quads);
        } else {
            log::debug!(
                "{:?} batch: {} quads, {} of {} elements republished, {} draws, uploads {:?}",
                self.shading.kind(),
                stats.quads,
                stats.elements_written,
                stats.elements,
                stats.draw_calls,
                stats.uploads
            );
        }
        self.stats = stats;
        Ok(())
    }

    /// Release GPU buffers; later calls do nothing
    pub fn release(&mut self, backend: &mut dyn QuadRenderBackend) {
        if self.released {
            return;
        }
        backend.destroy_buffer(self.position_buffer);
        backend.destroy_buffer(self.index_buffer);
        self.shading.release(backend);
        self.released = true;
        log::info!("Released {:?} batch renderer", self.shading.kind());
    }

    /// Quads the mirrors can hold
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Quads currently visible
    pub const fn quad_count(&self) -> usize {
        self.quad_count
    }

    /// Elements currently visible
    pub fn element_count(&self) -> usize {
        self.visible.len()
    }

    /// Index mirror, valid for every slot below the capacity
    pub fn indices(&self) -> &[u16] {
        &self.indices
    }

    /// Position mirror
    pub fn positions(&self) -> &[QuadPosition] {
        &self.positions
    }

    /// Whether the index buffer must be uploaded on the next render
    pub const fn index_dirty(&self) -> bool {
        self.index_dirty
    }

    /// Shading strategy
    pub const fn shading(&self) -> &S {
        &self.shading
    }

    /// Statistics for the last frame
    pub const fn stats(&self) -> &BatchStats {
        &self.stats
    }

    fn resync_counts(&mut self, store: &QuadStore<S::Element>) -> BatchResult<()> {
        let mut total = 0;
        let mut changed = false;
        for (key, quads) in &mut self.visible {
            if let Some(element) = store.get(*key) {
                let current = element.quad_count();
                if current != *quads {
                    log::warn!(
                        "{:?} quad element {key:?} changed from {} to {} quads while shown",
                        self.shading.kind(),
                        quads,
                        current
                    );
                    *quads = current;
                    changed = true;
                }
            }
            total += *quads;
        }

        if changed {
            self.ensure_capacity(total)?;
            self.quad_count = total;
            self.force_rewrite = true;
        }
        Ok(())
    }

    fn prune(&mut self, store: &QuadStore<S::Element>) {
        let missing: Vec<QuadKey> = self
            .visible
            .keys()
            .filter(|key| !store.contains_key(**key))
            .copied()
            .collect();

        for key in missing {
            log::warn!("Dropping {:?} quad element {key:?} destroyed while shown", self.shading.kind());
            self.hide(key);
        }
    }
}
