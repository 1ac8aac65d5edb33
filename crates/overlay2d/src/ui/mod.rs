//! UI System Module
//!
//! Architecture:
//! - Manager: owns the renderers, widgets, fonts and hit-testing trees
//! - widgets/: strings, buttons, input boxes, statistics, screens
//! - font: glyph metrics consumed by strings
//! - input: pointer and keyboard event types

pub mod font;
pub mod input;
pub mod manager;
pub mod widgets;

pub use crate::foundation::collections::{HandlerKey, ListenerId, WidgetId};
pub use font::{Font, FontData, FontError, FontId, FontLoader, FontRegistry, GlyphMetrics, MonospaceFontLoader};
pub use input::{cursor_to_normalized, EventFlow, Key, MouseButton, MouseHandler, MouseMotionHandler};
pub use manager::{Manager, ManagerError, ManagerResult};
pub use widgets::{
    Button, FrameSample, InputBox, Screen, StatLine, Statistics, TextAlign, TextString, WidgetContext, WidgetError,
    WidgetKind, WidgetNode, WidgetResult, WidgetVariant,
};
