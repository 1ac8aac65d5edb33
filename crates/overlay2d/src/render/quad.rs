//! Quad elements: cached geometry with dirty tracking
//!
//! A quad element owns a fixed number of quads for its whole life. Setters
//! update the element's private copy of the vertex data and mark it dirty;
//! the batch renderer later asks the element to publish that copy into the
//! shared vertex buffer with [`QuadGeometry::write_into`].

use crate::foundation::fixed_point::{quantize_depth, quantize_position};

use super::vertex::{QuadPosition, VERTICES_PER_QUAD};

/// Vertex positions of a fixed number of quads, plus publication state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuadGeometry {
    positions: Vec<QuadPosition>,
    dirty: bool,
    prev_offset: Option<usize>,
}

impl QuadGeometry {
    /// Create geometry for `quads` quads, all collapsed at the origin
    ///
    /// New geometry starts dirty so its first publication always copies.
    pub fn new(quads: usize) -> Self {
        Self {
            positions: vec![QuadPosition::default(); quads * VERTICES_PER_QUAD],
            dirty: true,
            prev_offset: None,
        }
    }

    /// Number of quads owned
    pub fn quad_count(&self) -> usize {
        self.positions.len() / VERTICES_PER_QUAD
    }

    /// All vertex positions, four per quad
    pub fn positions(&self) -> &[QuadPosition] {
        &self.positions
    }

    /// The four corners of one quad
    pub fn corners(&self, quad: usize) -> Option<&[QuadPosition]> {
        let start = quad * VERTICES_PER_QUAD;
        self.positions.get(start..start + VERTICES_PER_QUAD)
    }

    /// Whether the cached data changed since the last publication
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Offset (in quads) used by the last publication
    pub fn published_offset(&self) -> Option<usize> {
        self.prev_offset
    }

    /// Force the next publication to copy
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Set the rectangle of one quad from normalized floats
    ///
    /// The origin is clamped to [-1, 1] and so is every resulting corner, so
    /// out-of-range input saturates at the screen edge.
    pub fn set_corner_positions(&mut self, quad: usize, x: f32, y: f32, w: f32, h: f32) {
        let x = x.clamp(-1.0, 1.0);
        let y = y.clamp(-1.0, 1.0);
        let left = quantize_position(x);
        let bottom = quantize_position(y);
        let right = quantize_position(x + w);
        let top = quantize_position(y + h);
        self.write_rect(quad, left, bottom, right, top);
    }

    /// Set the rectangle of one quad from pre-quantized values
    ///
    /// Far edges saturate at the 16-bit range instead of wrapping.
    pub fn set_corner_positions_fixed(&mut self, quad: usize, x: i16, y: i16, w: i16, h: i16) {
        self.write_rect(quad, x, y, x.saturating_add(w), y.saturating_add(h));
    }

    /// Set depth and rectangle of one quad in one call
    pub fn set_quad_position(&mut self, quad: usize, origin: QuadPosition, w: i16, h: i16) {
        self.set_depth_fixed(quad, origin.z);
        self.set_corner_positions_fixed(quad, origin.x, origin.y, w, h);
    }

    /// Collapse one quad to zero area at its current bottom-left corner
    pub fn collapse(&mut self, quad: usize) {
        if let Some(corners) = self.corners(quad) {
            let anchor = corners[0];
            self.write_rect(quad, anchor.x, anchor.y, anchor.x, anchor.y);
        }
    }

    /// Set the z-order of one quad without touching x/y
    pub fn set_depth(&mut self, quad: usize, z: f32) {
        self.set_depth_fixed(quad, quantize_depth(z));
    }

    /// Set the z-order of one quad from a raw depth value
    pub fn set_depth_fixed(&mut self, quad: usize, z: i16) {
        if let Some(corners) = self.corners_mut(quad) {
            for corner in corners.iter_mut() {
                corner.z = z;
            }
            self.dirty = true;
        }
    }

    /// Set the z-order of every quad
    pub fn set_all_depths(&mut self, z: f32) {
        let z = quantize_depth(z);
        for corner in &mut self.positions {
            corner.z = z;
        }
        self.dirty = true;
    }

    /// Publish the cached vertices into `shared` at `offset` quads
    ///
    /// Copies when the element is dirty, when `offset` differs from the
    /// previous publication, or when `force` is set. Returns whether a copy
    /// happened. A destination too short for the element is left untouched.
    pub fn write_into(&mut self, shared: &mut [QuadPosition], offset: usize, force: bool) -> bool {
        if !(force || self.dirty || self.prev_offset != Some(offset)) {
            return false;
        }

        let start = offset * VERTICES_PER_QUAD;
        let Some(target) = shared.get_mut(start..start + self.positions.len()) else {
            log::warn!(
                "Shared vertex buffer too small for {} quads at offset {}",
                self.quad_count(),
                offset
            );
            return false;
        };

        target.copy_from_slice(&self.positions);
        self.dirty = false;
        self.prev_offset = Some(offset);
        true
    }

    fn write_rect(&mut self, quad: usize, left: i16, bottom: i16, right: i16, top: i16) {
        if let Some(corners) = self.corners_mut(quad) {
            corners[0].x = left;
            corners[0].y = bottom;
            corners[1].x = right;
            corners[1].y = bottom;
            corners[2].x = right;
            corners[2].y = top;
            corners[3].x = left;
            corners[3].y = top;
            self.dirty = true;
        }
    }

    fn corners_mut(&mut self, quad: usize) -> Option<&mut [QuadPosition]> {
        let start = quad * VERTICES_PER_QUAD;
        let count = self.quad_count();
        let corners = self.positions.get_mut(start..start + VERTICES_PER_QUAD);
        if corners.is_none() {
            log::warn!("Ignoring write to quad {quad} of an element with {count} quads");
        }
        corners
    }
}

/// Anything that owns quad geometry and can be drawn by a batch renderer
pub trait QuadElement {
    /// Shared geometry of the element
    fn geometry(&self) -> &QuadGeometry;

    /// Mutable geometry of the element
    fn geometry_mut(&mut self) -> &mut QuadGeometry;

    /// Number of quads owned
    fn quad_count(&self) -> usize {
        self.geometry().quad_count()
    }
}

impl QuadElement for QuadGeometry {
    fn geometry(&self) -> &QuadGeometry {
        self
    }

    fn geometry_mut(&mut self) -> &mut QuadGeometry {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::fixed_point::POSITION_ONE;

    #[test]
    fn test_corners_counter_clockwise() {
        let mut geometry = QuadGeometry::new(1);
        geometry.set_corner_positions_fixed(0, 10, 20, 30, 40);
        let corners = geometry.corners(0).unwrap();
        assert_eq!((corners[0].x, corners[0].y), (10, 20));
        assert_eq!((corners[1].x, corners[1].y), (40, 20));
        assert_eq!((corners[2].x, corners[2].y), (40, 60));
        assert_eq!((corners[3].x, corners[3].y), (10, 60));
    }

    #[test]
    fn test_write_into_dirty_tracking() {
        let mut geometry = QuadGeometry::new(2);
        let mut shared = vec![QuadPosition::default(); 16];

        assert!(geometry.write_into(&mut shared, 0, false));
        assert!(!geometry.write_into(&mut shared, 0, false));
        assert!(geometry.write_into(&mut shared, 1, false));
        assert!(!geometry.write_into(&mut shared, 1, false));
        assert!(geometry.write_into(&mut shared, 1, true));
    }

    #[test]
    fn test_mutation_marks_dirty() {
        let mut geometry = QuadGeometry::new(1);
        let mut shared = vec![QuadPosition::default(); 4];
        assert!(geometry.write_into(&mut shared, 0, false));

        geometry.set_depth(0, 12.0);
        assert!(geometry.is_dirty());
        assert!(geometry.write_into(&mut shared, 0, false));
        assert!(shared.iter().all(|corner| corner.z == 12));
    }

    #[test]
    fn test_write_lands_at_offset() {
        let mut geometry = QuadGeometry::new(1);
        geometry.set_corner_positions_fixed(0, 1, 2, 3, 4);
        let mut shared = vec![QuadPosition::default(); 12];
        assert!(geometry.write_into(&mut shared, 2, false));
        assert_eq!(shared[8], QuadPosition::new(1, 2, 0));
        assert_eq!(shared[..8], [QuadPosition::default(); 8]);
    }

    #[test]
    fn test_float_setter_saturates() {
        let mut clamped = QuadGeometry::new(1);
        let mut edge = QuadGeometry::new(1);
        clamped.set_corner_positions(0, 2.0, -5.0, 0.5, 0.5);
        edge.set_corner_positions(0, 1.0, -1.0, 0.5, 0.5);
        assert_eq!(clamped.positions(), edge.positions());

        let corners = clamped.corners(0).unwrap();
        assert_eq!(corners[0].x, POSITION_ONE);
        assert_eq!(corners[1].x, POSITION_ONE);
        assert_eq!(corners[0].y, -POSITION_ONE);
    }

    #[test]
    fn test_fixed_setter_saturates() {
        let mut geometry = QuadGeometry::new(1);
        geometry.set_corner_positions_fixed(0, 30_000, 30_000, 10_000, 10_000);
        let corners = geometry.corners(0).unwrap();
        assert_eq!(corners[2].x, i16::MAX);
        assert_eq!(corners[2].y, i16::MAX);
    }

    #[test]
    fn test_quad_position_sets_depth_and_rect() {
        let mut geometry = QuadGeometry::new(2);
        geometry.set_quad_position(1, QuadPosition::new(-100, 50, 7), 200, 100);
        let corners = geometry.corners(1).unwrap();
        assert!(corners.iter().all(|corner| corner.z == 7));
        assert_eq!((corners[0].x, corners[0].y), (-100, 50));
        assert_eq!((corners[2].x, corners[2].y), (100, 150));
        assert!(geometry.corners(0).unwrap().iter().all(|corner| corner.z == 0));
    }

    #[test]
    fn test_out_of_range_quad_is_ignored() {
        let mut geometry = QuadGeometry::new(1);
        let mut shared = vec![QuadPosition::default(); 4];
        geometry.write_into(&mut shared, 0, false);

        geometry.set_corner_positions(3, 0.0, 0.0, 0.5, 0.5);
        geometry.set_depth(7, 1.0);
        assert!(!geometry.is_dirty());
        assert_eq!(geometry.positions(), &[QuadPosition::default(); 4]);
    }

    #[test]
    fn test_short_destination_is_not_written() {
        let mut geometry = QuadGeometry::new(2);
        let mut shared = vec![QuadPosition::default(); 4];
        assert!(!geometry.write_into(&mut shared, 0, false));
        assert!(geometry.is_dirty());
    }
}
