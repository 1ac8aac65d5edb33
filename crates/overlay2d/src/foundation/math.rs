//! Math utilities and types
//!
//! Overlay coordinates are screen-space normalized floats: x and y span
//! [-1, 1] with the origin at the screen center and +y pointing up.

pub use nalgebra::{Vector2, Vector4};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 4D vector type, used for RGBA colors
pub type Vec4 = Vector4<f32>;

/// Lower bound of the normalized screen range
pub const NORMALIZED_MIN: f32 = -1.0;

/// Upper bound of the normalized screen range
pub const NORMALIZED_MAX: f32 = 1.0;

/// Convert a cursor position in [0, 1] (origin top-left, +y down) to
/// normalized overlay coordinates (origin center, +y up)
pub fn cursor_to_normalized(u: f32, v: f32) -> Vec2 {
    Vec2::new(2.0 * (u - 0.5), 2.0 * (0.5 - v))
}

/// Size of one pixel in normalized units for a screen dimension
pub fn pixel_extent(pixels: u32) -> f32 {
    if pixels == 0 {
        0.0
    } else {
        2.0 / pixels as f32
    }
}

/// Opaque white
pub fn white() -> Vec4 {
    Vec4::new(1.0, 1.0, 1.0, 1.0)
}
