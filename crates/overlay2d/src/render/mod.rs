//! Quad rendering
//!
//! - `vertex`: quantized attribute layouts and index generation
//! - `quad`: the quad element base (geometry plus dirty tracking)
//! - `untextured`, `textured`, `glyph`: element variants and their shadings
//! - `batch_renderer`: the shared batching algorithm
//! - `layers`: element stores paired with their renderers
//! - `backend`: the GPU boundary and an in-memory implementation

pub mod backend;
pub mod batch_renderer;
pub mod glyph;
pub mod layers;
pub mod mirror;
pub mod quad;
pub mod textured;
pub mod untextured;
pub mod vertex;

pub use backend::{
    BackendCommand, BackendError, BackendResult, BatchBuffers, BufferId, BufferKind, HeadlessBackend,
    QuadRenderBackend, ShadingKind,
};
pub use batch_renderer::{BatchError, BatchResult, BatchStats, QuadBatchRenderer, QuadShading, UploadFlags};
pub use glyph::{GlyphQuads, GlyphShading};
pub use layers::{FrameStats, QuadLayer, QuadLayers};
pub use quad::{QuadElement, QuadGeometry};
pub use textured::{TextureShading, TexturedQuads};
pub use untextured::{ColorShading, UntexturedQuads};
pub use vertex::{QuadColor, QuadPosition, QuadTexCoord, TextureHandle};
