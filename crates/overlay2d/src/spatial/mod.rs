//! Spatial partitioning for hit-testing
//!
//! Provides axis-aligned bounds in normalized screen space and a quad-tree
//! that routes pointer positions to the elements whose bounds contain them.

pub mod bounds;
pub mod quadtree;

pub use bounds::{Bounded, Bounds};
pub use quadtree::{NodeKey, QuadTree};
