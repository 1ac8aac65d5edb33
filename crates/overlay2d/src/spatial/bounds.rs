//! Axis-aligned rectangles in normalized screen space

use crate::foundation::math::{Vec2, NORMALIZED_MAX, NORMALIZED_MIN};

/// Axis-aligned rectangle; edges are inclusive
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    /// Bottom-left corner
    pub min: Vec2,
    /// Top-right corner
    pub max: Vec2,
}

impl Bounds {
    /// Create bounds from two corners
    pub const fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// The whole screen, [-1, 1] on both axes
    pub fn screen() -> Self {
        Self::new(
            Vec2::new(NORMALIZED_MIN, NORMALIZED_MIN),
            Vec2::new(NORMALIZED_MAX, NORMALIZED_MAX),
        )
    }

    /// Bounds from a bottom-left origin and a size
    ///
    /// Negative sizes become zero and the result is clamped to the screen.
    pub fn from_rect(x: f32, y: f32, w: f32, h: f32) -> Self {
        let clamp = |v: f32| v.clamp(NORMALIZED_MIN, NORMALIZED_MAX);
        let (x, y) = (clamp(x), clamp(y));
        Self::new(Vec2::new(x, y), Vec2::new(clamp(x + w.max(0.0)), clamp(y + h.max(0.0))))
    }

    /// Horizontal extent
    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    /// Vertical extent
    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    /// Center point
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Whether a point lies inside or on the edge
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.min.x && x <= self.max.x && y >= self.min.y && y <= self.max.y
    }

    /// Whether two rectangles share any point, edges included
    pub fn overlaps(&self, other: &Self) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }

    /// Split at the midlines: bottom-left, bottom-right, top-left, top-right
    pub fn quadrants(&self) -> [Self; 4] {
        let mid = self.center();
        [
            Self::new(self.min, mid),
            Self::new(Vec2::new(mid.x, self.min.y), Vec2::new(self.max.x, mid.y)),
            Self::new(Vec2::new(self.min.x, mid.y), Vec2::new(mid.x, self.max.y)),
            Self::new(mid, self.max),
        ]
    }
}

/// Anything with a bounding rectangle
pub trait Bounded {
    /// Current bounds
    fn bounds(&self) -> Bounds;
}

impl Bounded for Bounds {
    fn bounds(&self) -> Bounds {
        *self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_from_rect_clamps() {
        let bounds = Bounds::from_rect(0.5, -2.0, 1.0, -0.5);
        assert_relative_eq!(bounds.min.x, 0.5);
        assert_relative_eq!(bounds.max.x, 1.0);
        assert_relative_eq!(bounds.min.y, -1.0);
        assert_relative_eq!(bounds.max.y, -1.0);
        assert_relative_eq!(bounds.height(), 0.0);
    }

    #[test]
    fn test_contains_is_inclusive() {
        let bounds = Bounds::from_rect(0.0, 0.0, 0.5, 0.5);
        assert!(bounds.contains(0.0, 0.0));
        assert!(bounds.contains(0.5, 0.5));
        assert!(!bounds.contains(0.51, 0.25));
    }

    #[test]
    fn test_touching_edges_overlap() {
        let left = Bounds::from_rect(-0.5, 0.0, 0.5, 0.5);
        let right = Bounds::from_rect(0.0, 0.0, 0.5, 0.5);
        let far = Bounds::from_rect(0.6, 0.0, 0.2, 0.2);
        assert!(left.overlaps(&right));
        assert!(!left.overlaps(&far));
    }

    #[test]
    fn test_quadrants_partition() {
        let quadrants = Bounds::screen().quadrants();
        let area: f32 = quadrants.iter().map(|q| q.width() * q.height()).sum();
        assert_relative_eq!(area, 4.0);
        assert_eq!(quadrants[0], Bounds::from_rect(-1.0, -1.0, 1.0, 1.0));
        assert_eq!(quadrants[1], Bounds::from_rect(0.0, -1.0, 1.0, 1.0));
        assert_eq!(quadrants[2], Bounds::from_rect(-1.0, 0.0, 1.0, 1.0));
        assert_eq!(quadrants[3], Bounds::from_rect(0.0, 0.0, 1.0, 1.0));
    }
}
