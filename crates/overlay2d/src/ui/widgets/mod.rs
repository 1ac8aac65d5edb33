//! UI widgets
//!
//! Widgets own quad elements in the [`QuadLayers`] and mutate them through a
//! [`WidgetContext`], which also gives access to fonts and the pixel size.

pub mod button;
pub mod core;
pub mod input_box;
pub mod screen;
pub mod statistics;
pub mod text;

use std::fmt;

use thiserror::Error;

use crate::core::config::ScreenConfig;
use crate::render::{BatchError, QuadLayers};
use crate::spatial::{Bounded, Bounds};
use crate::ui::font::{Font, FontError, FontId, FontRegistry};

pub use button::{Button, ClickListener};
pub use self::core::{Transparency, Transparent, Visibility, Visible, ZOrder, ZOrdered};
pub use input_box::InputBox;
pub use screen::Screen;
pub use statistics::{FrameSample, StatLine, Statistics};
pub use text::{TextAlign, TextString};

/// Result type for widget operations
pub type WidgetResult<T> = Result<T, WidgetError>;

/// Errors raised while laying out or showing widgets
#[derive(Debug, Error)]
pub enum WidgetError {
    /// The widget's font is missing
    #[error(transparent)]
    Font(#[from] FontError),

    /// A batch could not grow to hold the widget
    #[error(transparent)]
    Batch(#[from] BatchError),
}

/// What widgets need to touch their quads
pub struct WidgetContext<'a> {
    /// Quad stores and renderers
    pub layers: &'a mut QuadLayers,
    /// Registered fonts
    pub fonts: &'a FontRegistry,
    screen: ScreenConfig,
}

impl<'a> WidgetContext<'a> {
    /// Bundle the layers and fonts for a screen size
    pub fn new(layers: &'a mut QuadLayers, fonts: &'a FontRegistry, screen: ScreenConfig) -> Self {
        Self { layers, fonts, screen }
    }

    /// Look up a font
    pub fn font(&self, id: FontId) -> Result<&'a Font, FontError> {
        let fonts = self.fonts;
        fonts.get(id)
    }

    /// Layers and a font at once
    pub fn split(&mut self, id: FontId) -> Result<(&mut QuadLayers, &'a Font), FontError> {
        let font = self.font(id)?;
        Ok((&mut *self.layers, font))
    }

    /// Width of one pixel in normalized units
    pub fn pixel_width(&self) -> f32 {
        self.screen.pixel_width()
    }

    /// Height of one pixel in normalized units
    pub fn pixel_height(&self) -> f32 {
        self.screen.pixel_height()
    }
}

/// Widget kinds, for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WidgetKind {
    /// [`TextString`]
    Text,
    /// [`Button`]
    Button,
    /// [`InputBox`]
    InputBox,
    /// [`Statistics`]
    Statistics,
    /// [`Screen`]
    Screen,
}

impl fmt::Display for WidgetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Text => "text string",
            Self::Button => "button",
            Self::InputBox => "input box",
            Self::Statistics => "statistics box",
            Self::Screen => "screen",
        };
        f.write_str(name)
    }
}

/// Widget storage
pub enum WidgetNode {
    /// Text string
    Text(TextString),
    /// Button
    Button(Button),
    /// Input box
    InputBox(InputBox),
    /// Statistics box
    Statistics(Statistics),
    /// Screen
    Screen(Screen),
}

impl WidgetNode {
    /// Kind of the stored widget
    pub const fn kind(&self) -> WidgetKind {
        match self {
            Self::Text(_) => WidgetKind::Text,
            Self::Button(_) => WidgetKind::Button,
            Self::InputBox(_) => WidgetKind::InputBox,
            Self::Statistics(_) => WidgetKind::Statistics,
            Self::Screen(_) => WidgetKind::Screen,
        }
    }

    /// Show the widget's own quads; screen members are handled by the manager
    pub fn show(&mut self, ctx: &mut WidgetContext<'_>) -> WidgetResult<()> {
        match self {
            Self::Text(text) => text.show(ctx),
            Self::Button(button) => button.show(ctx),
            Self::InputBox(input) => input.show(ctx),
            Self::Statistics(statistics) => statistics.show(ctx),
            Self::Screen(screen) => {
                screen.set_visible(true);
                Ok(())
            }
        }
    }

    /// Hide the widget's own quads
    pub fn hide(&mut self, ctx: &mut WidgetContext<'_>) {
        match self {
            Self::Text(text) => text.hide(ctx),
            Self::Button(button) => button.hide(ctx),
            Self::InputBox(input) => input.hide(ctx),
            Self::Statistics(statistics) => statistics.hide(ctx),
            Self::Screen(screen) => screen.set_visible(false),
        }
    }

    /// Destroy the widget's quad elements
    pub fn release(&mut self, ctx: &mut WidgetContext<'_>) {
        match self {
            Self::Text(text) => text.release(ctx),
            Self::Button(button) => button.release(ctx),
            Self::InputBox(input) => input.release(ctx),
            Self::Statistics(statistics) => statistics.release(ctx),
            Self::Screen(_) => {}
        }
    }

    /// Whether the widget is shown
    pub fn is_visible(&self) -> bool {
        match self {
            Self::Text(text) => text.is_visible(),
            Self::Button(button) => button.is_visible(),
            Self::InputBox(input) => input.is_visible(),
            Self::Statistics(statistics) => statistics.is_visible(),
            Self::Screen(screen) => screen.is_visible(),
        }
    }

    /// Rectangle receiving mouse events while visible
    pub fn mouse_bounds(&self) -> Option<Bounds> {
        match self {
            Self::Button(button) => Some(button.bounds()),
            Self::InputBox(input) => Some(input.bounds()),
            _ => None,
        }
    }
}

/// Typed access to one [`WidgetNode`] variant
pub trait WidgetVariant: Sized {
    /// Kind of the variant
    const KIND: WidgetKind;

    /// Borrow the widget if the node holds this variant
    fn from_node(node: &WidgetNode) -> Option<&Self>;

    /// Mutably borrow the widget if the node holds this variant
    fn from_node_mut(node: &mut WidgetNode) -> Option<&mut Self>;
}

macro_rules! widget_variant {
    ($widget:ty, $variant:ident) => {
        impl WidgetVariant for $widget {
            const KIND: WidgetKind = WidgetKind::$variant;

            fn from_node(node: &WidgetNode) -> Option<&Self> {
                match node {
                    WidgetNode::$variant(widget) => Some(widget),
                    _ => None,
                }
            }

            fn from_node_mut(node: &mut WidgetNode) -> Option<&mut Self> {
                match node {
                    WidgetNode::$variant(widget) => Some(widget),
                    _ => None,
                }
            }
        }
    };
}

widget_variant!(TextString, Text);
widget_variant!(Button, Button);
widget_variant!(InputBox, InputBox);
widget_variant!(Statistics, Statistics);
widget_variant!(Screen, Screen);
