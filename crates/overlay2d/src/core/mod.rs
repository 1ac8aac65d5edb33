//! # Core Overlay Module
//!
//! Shared configuration for every overlay subsystem.
//!
//! ## Organization
//!
//! - **Config**: screen, renderer, spatial index, pen defaults and logging

pub mod config;

// Re-export foundation modules for convenience
pub use crate::foundation;

pub use config::{
    Config,
    ConfigError,
    OverlayConfig,
    PenConfig,
    RendererConfig,
    ScreenConfig,
    SpatialConfig,
};
