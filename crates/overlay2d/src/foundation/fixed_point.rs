//! Fixed-point quantization of vertex attributes
//!
//! Positions are stored as signed 16-bit values spanning [-1, 1]. Texture
//! coordinates and alpha use unsigned 16-bit values spanning [0, 1], colors
//! unsigned 8-bit values. Every conversion clamps before scaling, so out of
//! range input saturates instead of wrapping.

/// Quantized value of normalized `1.0` on a position channel
pub const POSITION_ONE: i16 = i16::MAX;

/// Quantized value of `1.0` on a 16-bit unit channel
pub const UNIT16_ONE: u16 = u16::MAX;

/// Quantized value of `1.0` on an 8-bit unit channel
pub const UNIT8_ONE: u8 = u8::MAX;

/// Quantize a normalized position, clamping to [-1, 1]
pub fn quantize_position(value: f32) -> i16 {
    (value.clamp(-1.0, 1.0) * f32::from(POSITION_ONE)) as i16
}

/// Convert a quantized position back to a float
pub fn dequantize_position(value: i16) -> f32 {
    f32::from(value) / f32::from(POSITION_ONE)
}

/// Quantize a [0, 1] value to 16 bits, clamping first
pub fn quantize_unit16(value: f32) -> u16 {
    (value.clamp(0.0, 1.0) * f32::from(UNIT16_ONE)) as u16
}

/// Quantize a [0, 1] value to 8 bits, clamping first
pub fn quantize_unit8(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * f32::from(UNIT8_ONE)) as u8
}

/// Convert an unnormalized z-order value to the depth channel
///
/// Depth is not normalized; values outside the 16-bit range saturate.
pub fn quantize_depth(z: f32) -> i16 {
    z as i16
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_position_saturates() {
        assert_eq!(quantize_position(2.0), quantize_position(1.0));
        assert_eq!(quantize_position(-5.0), quantize_position(-1.0));
        assert_eq!(quantize_position(1.0), i16::MAX);
        assert_eq!(quantize_position(-1.0), -i16::MAX);
        assert_eq!(quantize_position(0.0), 0);
    }

    #[test]
    fn test_position_round_trip_precision() {
        let value = quantize_position(0.25);
        assert_relative_eq!(dequantize_position(value), 0.25, epsilon = 1.0e-4);
    }

    #[test]
    fn test_unit_channels_clamp() {
        assert_eq!(quantize_unit16(1.5), u16::MAX);
        assert_eq!(quantize_unit16(-0.5), 0);
        assert_eq!(quantize_unit8(1.0), 255);
        assert_eq!(quantize_unit8(-3.0), 0);
    }

    #[test]
    fn test_depth_saturates() {
        assert_eq!(quantize_depth(100.0), 100);
        assert_eq!(quantize_depth(1.0e9), i16::MAX);
        assert_eq!(quantize_depth(-1.0e9), i16::MIN);
    }
}
