//! Capabilities shared by widgets
//!
//! Widgets compose these values as fields instead of inheriting behavior,
//! and expose them through the small capability traits below.

use crate::foundation::fixed_point::{quantize_depth, quantize_unit8, UNIT8_ONE};

/// Opacity stored as an 8-bit value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Transparency(u8);

impl Transparency {
    /// Fully opaque
    pub const OPAQUE: Self = Self(UNIT8_ONE);

    /// Create from a float alpha, clamped to [0, 1]
    pub fn from_alpha(alpha: f32) -> Self {
        Self(quantize_unit8(alpha))
    }

    /// Create from a raw 8-bit alpha
    pub const fn from_raw(alpha: u8) -> Self {
        Self(alpha)
    }

    /// Alpha as a float in [0, 1]
    pub fn alpha(self) -> f32 {
        f32::from(self.0) / f32::from(UNIT8_ONE)
    }

    /// Raw 8-bit alpha
    pub const fn raw(self) -> u8 {
        self.0
    }
}

impl Default for Transparency {
    fn default() -> Self {
        Self::OPAQUE
    }
}

/// Unnormalized z-order; larger values draw on top
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ZOrder(i16);

impl ZOrder {
    /// Create from a float, saturating to the 16-bit range
    pub fn from_f32(z: f32) -> Self {
        Self(quantize_depth(z))
    }

    /// Create from a raw value
    pub const fn from_raw(z: i16) -> Self {
        Self(z)
    }

    /// Value as a float
    pub fn get(self) -> f32 {
        f32::from(self.0)
    }

    /// Raw value
    pub const fn raw(self) -> i16 {
        self.0
    }

    /// Z-order `amount` below this one, saturating
    pub const fn below(self, amount: i16) -> Self {
        Self(self.0.saturating_sub(amount))
    }
}

/// Whether a widget is shown
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Visibility(bool);

impl Visibility {
    /// Visible
    pub const SHOWN: Self = Self(true);
    /// Hidden
    pub const HIDDEN: Self = Self(false);

    /// Whether shown
    pub const fn is_shown(self) -> bool {
        self.0
    }

    /// Update the flag, returning whether it changed
    pub fn set(&mut self, shown: bool) -> bool {
        let changed = self.0 != shown;
        self.0 = shown;
        changed
    }
}

/// Widgets with an opacity
pub trait Transparent {
    /// Current opacity
    fn transparency(&self) -> Transparency;

    /// Opacity as a float
    fn opacity(&self) -> f32 {
        self.transparency().alpha()
    }
}

/// Widgets with a z-order
pub trait ZOrdered {
    /// Current z-order
    fn z_order(&self) -> ZOrder;
}

/// Widgets that can be shown and hidden
pub trait Visible {
    /// Current visibility
    fn visibility(&self) -> Visibility;

    /// Whether shown
    fn is_visible(&self) -> bool {
        self.visibility().is_shown()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_transparency_clamps() {
        assert_eq!(Transparency::from_alpha(2.0), Transparency::OPAQUE);
        assert_eq!(Transparency::from_alpha(-1.0).raw(), 0);
        assert_relative_eq!(Transparency::from_raw(255).alpha(), 1.0);
    }

    #[test]
    fn test_z_order_saturates() {
        assert_eq!(ZOrder::from_f32(1.0e9).raw(), i16::MAX);
        assert_eq!(ZOrder::from_f32(100.7).raw(), 100);
        assert_eq!(ZOrder::from_raw(i16::MIN).below(5).raw(), i16::MIN);
        assert_eq!(ZOrder::from_raw(100).below(5).raw(), 95);
    }

    #[test]
    fn test_visibility_change() {
        let mut visibility = Visibility::HIDDEN;
        assert!(visibility.set(true));
        assert!(!visibility.set(true));
        assert!(visibility.is_shown());
    }
}
