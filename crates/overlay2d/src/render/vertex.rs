//! Vertex attribute layouts and index generation
//!
//! Every quad owns four vertices, written counter-clockwise starting at the
//! bottom-left corner: bottom-left, bottom-right, top-right, top-left.

use bytemuck::{Pod, Zeroable};

/// Vertices per quad
pub const VERTICES_PER_QUAD: usize = 4;

/// Indices per quad (two triangles)
pub const INDICES_PER_QUAD: usize = 6;

/// Most quads a single batch can address with 16-bit indices
pub const MAX_BATCH_QUADS: usize = (u16::MAX as usize + 1) / VERTICES_PER_QUAD;

/// Quantized vertex position
///
/// `x`/`y` are fixed-point normalized screen coordinates, `z` is the raw
/// z-order value.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct QuadPosition {
    /// Horizontal position
    pub x: i16,
    /// Vertical position
    pub y: i16,
    /// Z-order
    pub z: i16,
}

impl QuadPosition {
    /// Create a position from quantized components
    pub const fn new(x: i16, y: i16, z: i16) -> Self {
        Self { x, y, z }
    }
}

/// Quantized per-vertex RGBA color
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct QuadColor {
    /// Red channel
    pub r: u8,
    /// Green channel
    pub g: u8,
    /// Blue channel
    pub b: u8,
    /// Alpha channel
    pub a: u8,
}

impl QuadColor {
    /// Opaque white
    pub const WHITE: Self = Self::new(255, 255, 255, 255);

    /// Create a color from quantized channels
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

/// Quantized texture coordinate with the quad's alpha in the third channel
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct QuadTexCoord {
    /// Horizontal texture coordinate
    pub u: u16,
    /// Vertical texture coordinate
    pub v: u16,
    /// Opacity of the owning quad
    pub alpha: u16,
}

/// Opaque texture handle supplied by the resource layer
///
/// Handle `0` is reserved for "no texture".
#[repr(transparent)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TextureHandle(pub u32);

impl TextureHandle {
    /// The empty handle
    pub const NONE: Self = Self(0);

    /// Whether this handle refers to a texture
    pub const fn is_some(self) -> bool {
        self.0 != 0
    }
}

/// Index entries for one quad: `4i, 4i+2, 4i+3, 4i, 4i+1, 4i+2`
pub fn quad_indices(quad: usize) -> [u16; INDICES_PER_QUAD] {
    let base = (quad * VERTICES_PER_QUAD) as u16;
    [base, base + 2, base + 3, base, base + 1, base + 2]
}

/// Append index entries for quads in `from..to`
///
/// Callers keep `to <= MAX_BATCH_QUADS`; slots below `from` are untouched.
pub fn extend_indices(indices: &mut Vec<u16>, from: usize, to: usize) {
    for quad in from..to {
        indices.extend_from_slice(&quad_indices(quad));
    }
}
