//! Quad Render Backend Trait
//!
//! Defines the interface between the batch renderers and a GPU API. Keeps the
//! overlay independent of Vulkan/OpenGL specifics: the renderers only create
//! buffers, upload bytes, bind opaque texture handles and issue indexed draws.
//!
//! [`HeadlessBackend`] implements the trait in memory and records every call,
//! which makes rendering observable without a GPU.

use std::collections::HashMap;

use super::vertex::TextureHandle;

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Errors reported by a render backend
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// The buffer was never created or has been destroyed
    #[error("Unknown buffer: {0:?}")]
    UnknownBuffer(BufferId),

    /// Buffer creation or upload failed in the GPU API
    #[error("Buffer error: {0}")]
    Buffer(String),

    /// Draw submission failed in the GPU API
    #[error("Draw error: {0}")]
    Draw(String),
}

/// Handle to a GPU buffer owned by a batch renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferId(pub u32);

/// Usage of a GPU buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferKind {
    /// Per-vertex attributes
    Vertex,
    /// 16-bit triangle indices
    Index,
}

/// Shading program a batch is drawn with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShadingKind {
    /// Per-vertex colors
    Untextured,
    /// Textured quads with per-quad alpha
    Textured,
    /// Font glyphs tinted by a per-vertex color
    Text,
}

/// Backend-agnostic quad rendering interface
pub trait QuadRenderBackend {
    /// Create an empty buffer
    fn create_buffer(&mut self, label: &str, kind: BufferKind) -> BackendResult<BufferId>;

    /// Replace the contents of a buffer
    fn upload_buffer(&mut self, buffer: BufferId, bytes: &[u8]) -> BackendResult<()>;

    /// Release a buffer; unknown ids are ignored
    fn destroy_buffer(&mut self, buffer: BufferId);

    /// Begin drawing one batch with the given program and buffers
    fn begin_batch(&mut self, shading: ShadingKind, buffers: &BatchBuffers) -> BackendResult<()>;

    /// Bind a texture for subsequent draws
    fn bind_texture(&mut self, texture: TextureHandle) -> BackendResult<()>;

    /// Draw `index_count` indices starting at `first_index`
    fn draw_indexed(&mut self, first_index: u32, index_count: u32) -> BackendResult<()>;

    /// Finish the current batch
    fn end_batch(&mut self) -> BackendResult<()>;
}

/// Buffers bound for one batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchBuffers {
    /// Vertex positions
    pub positions: BufferId,
    /// Colors or texture coordinates
    pub attributes: BufferId,
    /// Extra attribute stream (glyph tint), if any
    pub extra: Option<BufferId>,
    /// Triangle indices
    pub indices: BufferId,
}

/// A call recorded by [`HeadlessBackend`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCommand {
    /// `create_buffer`
    CreateBuffer {
        /// New buffer
        buffer: BufferId,
        /// Debug label
        label: String,
    },
    /// `upload_buffer`
    Upload {
        /// Target buffer
        buffer: BufferId,
        /// Bytes written
        bytes: usize,
    },
    /// `destroy_buffer`
    DestroyBuffer(BufferId),
    /// `begin_batch`
    BeginBatch(ShadingKind),
    /// `bind_texture`
    BindTexture(TextureHandle),
    /// `draw_indexed`
    DrawIndexed {
        /// First index drawn
        first_index: u32,
        /// Number of indices drawn
        index_count: u32,
    },
    /// `end_batch`
    EndBatch,
}

#[derive(Debug)]
struct HeadlessBuffer {
    label: String,
    kind: BufferKind,
    data: Vec<u8>,
    uploads: usize,
}

/// Recorded calls kept by [`HeadlessBackend::new`]
pub const DEFAULT_COMMAND_LIMIT: usize = 4096;

/// In-memory backend that records its calls
///
/// The log is bounded: once it holds more than `command_limit` calls the
/// oldest half is dropped.
#[derive(Debug)]
pub struct HeadlessBackend {
    next_buffer: u32,
    buffers: HashMap<BufferId, HeadlessBuffer>,
    commands: Vec<BackendCommand>,
    command_limit: usize,
    in_batch: bool,
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self::with_command_limit(DEFAULT_COMMAND_LIMIT)
    }
}

impl HeadlessBackend {
    /// Create an empty backend
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty backend keeping at most `limit` recorded calls
    pub fn with_command_limit(limit: usize) -> Self {
        Self {
            next_buffer: 0,
            buffers: HashMap::new(),
            commands: Vec::new(),
            command_limit: limit.max(1),
            in_batch: false,
        }
    }

    /// Recorded calls, oldest first
    ///
    /// Holds every call since creation or the last [`Self::clear_commands`],
    /// minus whatever the command limit dropped.
    pub fn commands(&self) -> &[BackendCommand] {
        &self.commands
    }

    /// Forget the recorded calls
    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }

    fn record(&mut self, command: BackendCommand) {
        if self.commands.len() >= self.command_limit {
            let dropped = self.commands.len() - self.command_limit / 2;
            self.commands.drain(..dropped);
            log::trace!("Headless command log full, dropped {dropped} oldest calls");
        }
        self.commands.push(command);
    }

    /// Number of live buffers
    pub fn buffer_count(&self) -> usize {
        self.buffers.len()
    }

    /// Last bytes uploaded to a buffer
    pub fn buffer_data(&self, buffer: BufferId) -> Option<&[u8]> {
        self.buffers.get(&buffer).map(|b| b.data.as_slice())
    }

    /// Usage of a buffer
    pub fn buffer_kind(&self, buffer: BufferId) -> Option<BufferKind> {
        self.buffers.get(&buffer).map(|b| b.kind)
    }

    /// Last bytes uploaded to the buffer with the given label
    pub fn buffer_data_by_label(&self, label: &str) -> Option<&[u8]> {
        self.buffers
            .values()
            .find(|b| b.label == label)
            .map(|b| b.data.as_slice())
    }

    /// How many times a buffer has been uploaded
    pub fn upload_count(&self, buffer: BufferId) -> usize {
        self.buffers.get(&buffer).map_or(0, |b| b.uploads)
    }

    /// Recorded `(first_index, index_count)` pairs, in order
    pub fn draw_calls(&self) -> Vec<(u32, u32)> {
        self.commands
            .iter()
            .filter_map(|command| match command {
                BackendCommand::DrawIndexed { first_index, index_count } => Some((*first_index, *index_count)),
                _ => None,
            })
            .collect()
    }

    /// Recorded texture binds, in order
    pub fn texture_binds(&self) -> Vec<TextureHandle> {
        self.commands
            .iter()
            .filter_map(|command| match command {
                BackendCommand::BindTexture(texture) => Some(*texture),
                _ => None,
            })
            .collect()
    }

    /// Recorded batch programs, in order
    pub fn batches(&self) -> Vec<ShadingKind> {
        self.commands
            .iter()
            .filter_map(|command| match command {
                BackendCommand::BeginBatch(kind) => Some(*kind),
                _ => None,
            })
            .collect()
    }
}

impl QuadRenderBackend for HeadlessBackend {
    fn create_buffer(&mut self, label: &str, kind: BufferKind) -> BackendResult<BufferId> {
        self.next_buffer += 1;
        let buffer = BufferId(self.next_buffer);
        self.buffers.insert(
            buffer,
            HeadlessBuffer {
                label: label.to_string(),
                kind,
                data: Vec::new(),
                uploads: 0,
            },
        );
        self.record(BackendCommand::CreateBuffer {
            buffer,
            label: label.to_string(),
        });
        Ok(buffer)
    }

    fn upload_buffer(&mut self, buffer: BufferId, bytes: &[u8]) -> BackendResult<()> {
        let target = self
            .buffers
            .get_mut(&buffer)
            .ok_or(BackendError::UnknownBuffer(buffer))?;
        target.data.clear();
        target.data.extend_from_slice(bytes);
        target.uploads += 1;
        self.record(BackendCommand::Upload {
            buffer,
            bytes: bytes.len(),
        });
        Ok(())
    }

    fn destroy_buffer(&mut self, buffer: BufferId) {
        if self.buffers.remove(&buffer).is_some() {
            self.record(BackendCommand::DestroyBuffer(buffer));
        }
    }

    fn begin_batch(&mut self, shading: ShadingKind, buffers: &BatchBuffers) -> BackendResult<()> {
        for buffer in [buffers.positions, buffers.attributes, buffers.indices]
            .into_iter()
            .chain(buffers.extra)
        {
            if !self.buffers.contains_key(&buffer) {
                return Err(BackendError::UnknownBuffer(buffer));
            }
        }
        self.in_batch = true;
        self.record(BackendCommand::BeginBatch(shading));
        Ok(())
    }

    fn bind_texture(&mut self, texture: TextureHandle) -> BackendResult<()> {
        self.record(BackendCommand::BindTexture(texture));
        Ok(())
    }

    fn draw_indexed(&mut self, first_index: u32, index_count: u32) -> BackendResult<()> {
        if !self.in_batch {
            return Err(BackendError::Draw("draw issued outside of a batch".to_string()));
        }
        self.record(BackendCommand::DrawIndexed { first_index, index_count });
        Ok(())
    }

    fn end_batch(&mut self) -> BackendResult<()> {
        self.in_batch = false;
        self.record(BackendCommand::EndBatch);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headless_records_uploads() {
        let mut backend = HeadlessBackend::new();
        let buffer = backend.create_buffer("positions", BufferKind::Vertex).unwrap();
        backend.upload_buffer(buffer, &[1, 2, 3]).unwrap();
        backend.upload_buffer(buffer, &[4]).unwrap();

        assert_eq!(backend.buffer_data(buffer), Some(&[4u8][..]));
        assert_eq!(backend.upload_count(buffer), 2);
        assert_eq!(backend.buffer_data_by_label("positions"), Some(&[4u8][..]));
        assert_eq!(backend.buffer_kind(buffer), Some(BufferKind::Vertex));
    }

    #[test]
    fn test_unknown_buffer_is_an_error() {
        let mut backend = HeadlessBackend::new();
        let result = backend.upload_buffer(BufferId(42), &[0]);
        assert!(matches!(result, Err(BackendError::UnknownBuffer(BufferId(42)))));
    }

    #[test]
    fn test_draw_requires_batch() {
        let mut backend = HeadlessBackend::new();
        assert!(backend.draw_indexed(0, 6).is_err());

        let positions = backend.create_buffer("p", BufferKind::Vertex).unwrap();
        let attributes = backend.create_buffer("a", BufferKind::Vertex).unwrap();
        let indices = backend.create_buffer("i", BufferKind::Index).unwrap();
        let buffers = BatchBuffers { positions, attributes, extra: None, indices };
        backend.begin_batch(ShadingKind::Untextured, &buffers).unwrap();
        backend.draw_indexed(0, 6).unwrap();
        backend.end_batch().unwrap();

        assert_eq!(backend.draw_calls(), vec![(0, 6)]);
        assert_eq!(backend.batches(), vec![ShadingKind::Untextured]);
    }

    #[test]
    fn test_destroy_forgets_buffer() {
        let mut backend = HeadlessBackend::new();
        let buffer = backend.create_buffer("p", BufferKind::Vertex).unwrap();
        backend.destroy_buffer(buffer);
        backend.destroy_buffer(buffer);
        assert_eq!(backend.buffer_count(), 0);
        assert!(backend.buffer_data(buffer).is_none());
    }

    #[test]
    fn test_command_log_is_bounded() {
        let mut backend = HeadlessBackend::with_command_limit(8);
        let buffer = backend.create_buffer("p", BufferKind::Vertex).unwrap();
        for len in 1..=20 {
            backend.upload_buffer(buffer, &vec![0; len]).unwrap();
            assert!(backend.commands().len() <= 8);
        }

        assert_eq!(backend.commands().last(), Some(&BackendCommand::Upload { buffer, bytes: 20 }));
        assert_eq!(backend.upload_count(buffer), 20);
        backend.clear_commands();
        assert!(backend.commands().is_empty());
    }
}
