//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the overlay:
//! - Math types and coordinate helpers
//! - Fixed-point quantization of vertex attributes
//! - Handle-based collections
//! - Logging utilities

pub mod math;
pub mod fixed_point;
pub mod collections;
pub mod logging;
