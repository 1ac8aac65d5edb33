//! # Overlay Configuration
//!
//! Configuration for every subsystem of the overlay, grouped under
//! [`OverlayConfig`]. All structures are serializable, so a whole overlay
//! setup can be kept in a TOML or RON file next to the application.
//!
//! ## Configuration Categories
//!
//! - **Screen Config**: pixel dimensions used to convert pixel sizes to
//!   normalized units
//! - **Renderer Config**: initial batch capacity and texture run policy
//! - **Spatial Config**: quad-tree subdivision limits
//! - **Pen Config**: default color and z-order for newly created widgets

use serde::{Deserialize, Serialize};

use crate::foundation::math::{pixel_extent, Vec4};
use crate::render::vertex::MAX_BATCH_QUADS;

pub use crate::config::{Config, ConfigError};

/// # Screen Configuration
///
/// Pixel size of the surface the overlay is drawn onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenConfig {
    /// Surface width in pixels
    pub width: u32,
    /// Surface height in pixels
    pub height: u32,
}

impl ScreenConfig {
    /// Create a screen configuration
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width of one pixel in normalized units
    pub fn pixel_width(&self) -> f32 {
        pixel_extent(self.width)
    }

    /// Height of one pixel in normalized units
    pub fn pixel_height(&self) -> f32 {
        pixel_extent(self.height)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.width == 0 || self.height == 0 {
            return Err(format!("Screen size must be non-zero, got {}x{}", self.width, self.height));
        }
        Ok(())
    }
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self::new(800, 600)
    }
}

/// # Renderer Configuration
///
/// Settings shared by the untextured, textured and text batch renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RendererConfig {
    /// Quads reserved by each batch renderer at startup
    pub initial_quad_capacity: usize,
    /// Group textured quads by texture before drawing
    ///
    /// Off by default: runs are drawn in visible-set order, rebinding only
    /// when consecutive quads use different textures.
    pub sort_textured_by_texture: bool,
}

impl RendererConfig {
    /// Create a renderer configuration with defaults
    pub const fn new() -> Self {
        Self {
            initial_quad_capacity: 64,
            sort_textured_by_texture: false,
        }
    }

    /// Set the quads reserved up front by each batch renderer
    pub const fn with_initial_capacity(mut self, quads: usize) -> Self {
        self.initial_quad_capacity = quads;
        self
    }

    /// Enable or disable grouping textured draws by texture
    pub const fn with_texture_sorting(mut self, enabled: bool) -> Self {
        self.sort_textured_by_texture = enabled;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.initial_quad_capacity > MAX_BATCH_QUADS {
            return Err(format!(
                "Initial quad capacity {} exceeds the 16-bit index limit of {} quads",
                self.initial_quad_capacity, MAX_BATCH_QUADS
            ));
        }
        Ok(())
    }
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// # Spatial Index Configuration
///
/// Limits for the hit-testing quad-tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpatialConfig {
    /// Deepest level a node may subdivide to (the root is depth 0)
    pub max_depth: u32,
    /// Elements a leaf holds before it subdivides
    pub node_capacity: usize,
}

impl SpatialConfig {
    /// Create a spatial configuration with defaults
    pub const fn new() -> Self {
        Self {
            max_depth: 9,
            node_capacity: 4,
        }
    }

    /// Set the maximum subdivision depth
    pub const fn with_max_depth(mut self, depth: u32) -> Self {
        self.max_depth = depth;
        self
    }

    /// Set the leaf capacity
    pub const fn with_node_capacity(mut self, capacity: usize) -> Self {
        self.node_capacity = capacity;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.node_capacity == 0 {
            return Err("Quad-tree node capacity must be at least 1".to_string());
        }
        Ok(())
    }
}

impl Default for SpatialConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// # Pen Configuration
///
/// Defaults applied to widgets created through the manager.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PenConfig {
    /// RGBA color of new strings
    pub color: [f32; 4],
    /// Z-order of new strings
    pub z: f32,
}

impl PenConfig {
    /// Pen color as a vector
    pub fn color_vec(&self) -> Vec4 {
        Vec4::from(self.color)
    }
}

impl Default for PenConfig {
    fn default() -> Self {
        Self {
            color: [1.0, 1.0, 1.0, 1.0],
            z: 128.0,
        }
    }
}

/// # Complete Overlay Configuration
///
/// Top-level configuration handed to [`crate::ui::Manager::new`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayConfig {
    /// Surface dimensions
    pub screen: ScreenConfig,
    /// Batch renderer settings
    pub renderer: RendererConfig,
    /// Hit-testing quad-tree settings
    pub spatial: SpatialConfig,
    /// Defaults for new widgets
    pub pen: PenConfig,
    /// Default `env_logger` filter, overridden by `RUST_LOG`
    pub log_level: String,
}

impl OverlayConfig {
    /// Create a configuration for a surface of the given size
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            screen: ScreenConfig::new(width, height),
            renderer: RendererConfig::default(),
            spatial: SpatialConfig::default(),
            pen: PenConfig::default(),
            log_level: "info".to_string(),
        }
    }

    /// Set renderer configuration
    pub fn with_renderer(mut self, renderer: RendererConfig) -> Self {
        self.renderer = renderer;
        self
    }

    /// Set spatial index configuration
    pub fn with_spatial(mut self, spatial: SpatialConfig) -> Self {
        self.spatial = spatial;
        self
    }

    /// Set pen defaults
    pub fn with_pen(mut self, pen: PenConfig) -> Self {
        self.pen = pen;
        self
    }

    /// Set log level
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), String> {
        self.screen.validate()?;
        self.renderer.validate()?;
        self.spatial.validate()?;
        if self.log_level.is_empty() {
            return Err("Log level cannot be empty".to_string());
        }
        Ok(())
    }
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self::new(800, 600)
    }
}

impl Config for OverlayConfig {
    fn check(&self) -> Result<(), String> {
        self.validate()
    }
}
