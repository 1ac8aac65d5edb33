//! # Overlay2D
//!
//! A lightweight 2D overlay toolkit for real-time renderers. Buttons, text
//! input, labels and an on-screen statistics panel are all drawn as batches
//! of textured or untextured quads.
//!
//! ## Features
//!
//! - **Quad batching**: every visible element of one shading kind shares a
//!   single vertex/index buffer and is drawn with as few calls as possible
//! - **Dirty tracking**: elements only republish geometry when it changed or
//!   when their slot in the shared buffer moved
//! - **Hit testing**: pointer events are routed through an adaptive quad-tree
//! - **Backend agnostic**: GPU work goes through [`render::QuadRenderBackend`]
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use overlay2d::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = OverlayConfig::default();
//!     let loader = MonospaceFontLoader::new(&config.screen);
//!     let mut manager = Manager::new(config, HeadlessBackend::new(), Box::new(loader))?;
//!
//!     manager.load_font("fonts/mono.ttf", 16)?;
//!     let label = manager.create_string("Hello overlay", -0.9, 0.9)?;
//!     manager.set_string_color(label, Vec4::new(1.0, 0.8, 0.2, 1.0))?;
//!
//!     manager.render()?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod core;
pub mod foundation;
pub mod config;
pub mod render;
pub mod spatial;
pub mod ui;

/// Common imports for overlay users
pub mod prelude {
    pub use crate::{
        core::config::{OverlayConfig, PenConfig, RendererConfig, ScreenConfig, SpatialConfig},
        foundation::math::{Vec2, Vec4},
        render::{HeadlessBackend, QuadRenderBackend, TextureHandle},
        spatial::{Bounded, Bounds, QuadTree},
        ui::{
            EventFlow, FontId, FontLoader, Key, Manager, ManagerError, MonospaceFontLoader,
            MouseButton, MouseHandler, MouseMotionHandler, TextAlign, WidgetId,
        },
    };
}
