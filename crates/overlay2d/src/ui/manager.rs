//! Overlay Manager
//!
//! Central overlay system: owns the quad layers, fonts, widgets and the
//! hit-testing trees, routes input and renders each frame.

use thiserror::Error;

use crate::core::config::OverlayConfig;
use crate::foundation::collections::{HandlerKey, ListenerId, QuadKey, SecondaryMap, SlotMap, WidgetId};
use crate::foundation::math::Vec4;
use crate::render::{BatchError, FrameStats, QuadLayers, QuadRenderBackend, TexturedQuads, UntexturedQuads};
use crate::spatial::{Bounded, Bounds, QuadTree};

use super::font::{Font, FontData, FontError, FontId, FontLoader, FontRegistry};
use super::input::{EventFlow, Key, MouseButton, MouseHandler, MouseMotionHandler};
use super::widgets::{
    Button, FrameSample, InputBox, Screen, Statistics, TextAlign, TextString, WidgetContext, WidgetError, WidgetKind,
    WidgetNode, WidgetResult, WidgetVariant,
};

/// Result type for manager operations
pub type ManagerResult<T> = Result<T, ManagerError>;

/// Manager errors
#[derive(Debug, Error)]
pub enum ManagerError {
    /// Configuration failed validation
    #[error("Invalid overlay configuration: {0}")]
    InvalidConfig(String),

    /// No widget with this id
    #[error("Unknown widget {0:?}")]
    UnknownWidget(WidgetId),

    /// The widget exists but has another kind
    #[error("Widget {id:?} is a {actual}, not a {expected}")]
    WrongWidgetKind {
        /// Widget looked up
        id: WidgetId,
        /// Kind the caller asked for
        expected: WidgetKind,
        /// Kind actually stored
        actual: WidgetKind,
    },

    /// No quad element with this key
    #[error("Unknown quad element {0:?}")]
    UnknownQuads(QuadKey),

    /// The manager released its resources
    #[error("Overlay manager has been shut down")]
    ShutDown,

    /// Font loading or lookup failed
    #[error(transparent)]
    Font(#[from] FontError),

    /// A batch renderer failed
    #[error(transparent)]
    Batch(#[from] BatchError),
}

impl From<WidgetError> for ManagerError {
    fn from(err: WidgetError) -> Self {
        match err {
            WidgetError::Font(err) => Self::Font(err),
            WidgetError::Batch(err) => Self::Batch(err),
        }
    }
}

/// Who receives events for a tree entry
#[derive(Debug, Clone, Copy, PartialEq)]
enum HandlerTarget {
    Widget(WidgetId),
    Custom(HandlerKey),
}

/// Quad-tree entry: a handler and the rectangle it covers
#[derive(Debug, Clone, Copy, PartialEq)]
struct HandlerEntry {
    target: HandlerTarget,
    bounds: Bounds,
}

impl Bounded for HandlerEntry {
    fn bounds(&self) -> Bounds {
        self.bounds
    }
}

enum CustomHandler {
    Mouse(Box<dyn MouseHandler>),
    Motion(Box<dyn MouseMotionHandler>),
}

struct RegisteredHandler {
    handler: CustomHandler,
    bounds: Bounds,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ButtonPhase {
    Pressed,
    Released,
}

impl ButtonPhase {
    fn deliver(self, handler: &mut dyn MouseHandler, x: f32, y: f32, button: MouseButton) -> EventFlow {
        match self {
            Self::Pressed => handler.mouse_pressed(x, y, button),
            Self::Released => handler.mouse_released(x, y, button),
        }
    }
}

/// Central overlay management system
pub struct Manager<B: QuadRenderBackend> {
    config: OverlayConfig,
    backend: B,
    layers: QuadLayers,

    fonts: FontRegistry,
    font_loader: Box<dyn FontLoader>,
    current_font: Option<FontId>,

    /// Defaults for new strings and button labels
    pen_color: Vec4,
    pen_z: f32,

    widgets: SlotMap<WidgetId, WidgetNode>,
    /// Bounds under which each visible widget is indexed in the mouse tree
    widget_handlers: SecondaryMap<WidgetId, Bounds>,
    handlers: SlotMap<HandlerKey, RegisteredHandler>,
    mouse_tree: QuadTree<HandlerEntry>,
    motion_tree: QuadTree<HandlerEntry>,
    /// Scratch buffer for tree lookups
    hits: Vec<HandlerEntry>,

    /// Input box receiving keyboard events
    active_input: Option<WidgetId>,

    frame_stats: FrameStats,
    shut_down: bool,
}

impl<B: QuadRenderBackend> Manager<B> {
    /// Create a manager drawing through `backend`
    ///
    /// Creates the three batch renderers (untextured, textured, text) and
    /// empty hit-testing trees covering the whole screen.
    pub fn new(config: OverlayConfig, mut backend: B, font_loader: Box<dyn FontLoader>) -> ManagerResult<Self> {
        config.validate().map_err(ManagerError::InvalidConfig)?;

        let layers = QuadLayers::new(&mut backend, &config.renderer)?;
        log::info!(
            "Overlay manager created for a {}x{} surface",
            config.screen.width,
            config.screen.height
        );

        Ok(Self {
            backend,
            layers,
            fonts: FontRegistry::new(),
            font_loader,
            current_font: None,
            pen_color: config.pen.color_vec(),
            pen_z: config.pen.z,
            widgets: SlotMap::with_key(),
            widget_handlers: SecondaryMap::new(),
            handlers: SlotMap::with_key(),
            mouse_tree: QuadTree::screen(config.spatial),
            motion_tree: QuadTree::screen(config.spatial),
            hits: Vec::new(),
            active_input: None,
            frame_stats: FrameStats::default(),
            shut_down: false,
            config,
        })
    }

    // ---- Fonts ----

    /// Load a font, or reuse it if this path and size were loaded before
    ///
    /// The font becomes the current font for new widgets.
    pub fn load_font(&mut self, path: &str, size: u32) -> ManagerResult<FontId> {
        if let Some(id) = self.fonts.find(path, size) {
            self.current_font = Some(id);
            return Ok(id);
        }

        let data = self.font_loader.load(path, size)?;
        let id = self.fonts.insert(data, Some((path, size)));
        log::info!("Loaded font {path} at {size}px as {id}");
        self.current_font = Some(id);
        Ok(id)
    }

    /// Register already-built font data; it becomes current if no font is
    pub fn register_font(&mut self, data: FontData) -> FontId {
        let id = self.fonts.insert(data, None);
        if self.current_font.is_none() {
            self.current_font = Some(id);
        }
        id
    }

    /// Id of a previously loaded font
    pub fn font_id(&self, path: &str, size: u32) -> Option<FontId> {
        self.fonts.find(path, size)
    }

    /// Look up a font
    pub fn font(&self, id: FontId) -> ManagerResult<&Font> {
        Ok(self.fonts.get(id)?)
    }

    /// Make a registered font current
    pub fn set_font(&mut self, id: FontId) -> ManagerResult<()> {
        self.fonts.get(id)?;
        self.current_font = Some(id);
        Ok(())
    }

    /// Font used by new widgets
    pub const fn current_font(&self) -> Option<FontId> {
        self.current_font
    }

    fn require_font(&self) -> ManagerResult<FontId> {
        self.current_font.ok_or(ManagerError::Font(FontError::NoFont))
    }

    // ---- Pen ----

    /// Color of new strings and button labels
    pub fn set_color(&mut self, color: Vec4) {
        self.pen_color = color;
    }

    /// Z-order of new strings
    pub fn set_z(&mut self, z: f32) {
        self.pen_z = z;
    }

    /// Current pen color
    pub const fn pen_color(&self) -> Vec4 {
        self.pen_color
    }

    /// Current pen z-order
    pub const fn pen_z(&self) -> f32 {
        self.pen_z
    }

    // ---- Widget factories ----

    /// Create a visible string in the current font, colored with the pen
    pub fn create_string(&mut self, text: &str, x: f32, y: f32) -> ManagerResult<WidgetId> {
        let font = self.require_font()?;
        self.create_string_with_font(font, text, x, y)
    }

    /// Create a visible string in a specific font
    pub fn create_string_with_font(&mut self, font: FontId, text: &str, x: f32, y: f32) -> ManagerResult<WidgetId> {
        let mut ctx = WidgetContext::new(&mut self.layers, &self.fonts, self.config.screen);
        let mut string = TextString::new(&mut ctx, font, text, x, y)?;
        string.set_color(&mut ctx, self.pen_color);
        string.set_z(&mut ctx, self.pen_z);
        self.adopt(WidgetNode::Text(string), true)
    }

    /// Create a visible button with a centered label
    pub fn create_button(&mut self, text: &str, x: f32, y: f32, w: f32, h: f32) -> ManagerResult<WidgetId> {
        let font = self.require_font()?;
        let mut ctx = WidgetContext::new(&mut self.layers, &self.fonts, self.config.screen);
        let mut button = Button::new(&mut ctx, font, self.pen_color)?;
        button.set_bounds(&mut ctx, x, y, w, h)?;
        button.set_text_alignment(&mut ctx, TextAlign::Center)?;
        button.set_text(&mut ctx, text)?;
        self.adopt(WidgetNode::Button(button), true)
    }

    /// Create a visible input box
    ///
    /// The first input box takes keyboard focus; later ones start inactive.
    pub fn create_input_box(&mut self, x: f32, y: f32) -> ManagerResult<WidgetId> {
        let font = self.require_font()?;
        let mut ctx = WidgetContext::new(&mut self.layers, &self.fonts, self.config.screen);
        let mut input = InputBox::new(&mut ctx, font)?;
        input.set_position(&mut ctx, x, y)?;
        if self.active_input.is_some() {
            input.deactivate(&mut ctx);
        }

        let id = self.adopt(WidgetNode::InputBox(input), true)?;
        if self.active_input.is_none() {
            self.active_input = Some(id);
        }
        Ok(id)
    }

    /// Create a hidden statistics box in the bottom-left corner
    pub fn create_statistics(&mut self) -> ManagerResult<WidgetId> {
        let font = self.require_font()?;
        let mut ctx = WidgetContext::new(&mut self.layers, &self.fonts, self.config.screen);
        let statistics = Statistics::new(&mut ctx, font)?;
        self.adopt(WidgetNode::Statistics(statistics), false)
    }

    /// Create an empty, visible screen
    pub fn create_screen(&mut self) -> ManagerResult<WidgetId> {
        self.adopt(WidgetNode::Screen(Screen::new()), false)
    }

    /// Store a built widget, optionally showing it first
    fn adopt(&mut self, mut node: WidgetNode, show: bool) -> ManagerResult<WidgetId> {
        if show {
            let mut ctx = WidgetContext::new(&mut self.layers, &self.fonts, self.config.screen);
            if let Err(err) = node.show(&mut ctx) {
                node.release(&mut ctx);
                return Err(err.into());
            }
        }

        let kind = node.kind();
        let id = self.widgets.insert(node);
        self.sync_widget_handler(id);
        log::debug!("Created {kind} {id:?}");
        Ok(id)
    }

    // ---- Screens ----

    /// Add a widget to a screen
    pub fn add_to_screen(&mut self, screen: WidgetId, widget: WidgetId) -> ManagerResult<()> {
        if !self.widgets.contains_key(widget) {
            return Err(ManagerError::UnknownWidget(widget));
        }
        if screen == widget {
            return Err(ManagerError::WrongWidgetKind {
                id: widget,
                expected: WidgetKind::Text,
                actual: WidgetKind::Screen,
            });
        }
        self.widget_mut::<Screen>(screen)?.add(widget);
        Ok(())
    }

    /// Remove a widget from a screen without destroying it
    pub fn remove_from_screen(&mut self, screen: WidgetId, widget: WidgetId) -> ManagerResult<bool> {
        Ok(self.widget_mut::<Screen>(screen)?.remove(widget))
    }

    // ---- Widget lifecycle ----

    /// Show a widget; screens show every member
    pub fn show_widget(&mut self, id: WidgetId) -> ManagerResult<()> {
        self.set_visibility(id, true)
    }

    /// Hide a widget; screens hide every member
    pub fn hide_widget(&mut self, id: WidgetId) -> ManagerResult<()> {
        self.set_visibility(id, false)
    }

    fn set_visibility(&mut self, root: WidgetId, visible: bool) -> ManagerResult<()> {
        if !self.widgets.contains_key(root) {
            return Err(ManagerError::UnknownWidget(root));
        }

        let mut pending = vec![root];
        let mut visited = Vec::new();
        while let Some(id) = pending.pop() {
            if visited.contains(&id) {
                continue;
            }
            visited.push(id);

            let Some(node) = self.widgets.get_mut(id) else {
                continue;
            };
            let mut ctx = WidgetContext::new(&mut self.layers, &self.fonts, self.config.screen);
            if visible {
                node.show(&mut ctx)?;
            } else {
                node.hide(&mut ctx);
            }
            if let WidgetNode::Screen(screen) = node {
                pending.extend(screen.items().iter().rev().copied());
            }
            self.sync_widget_handler(id);
        }
        Ok(())
    }

    /// Destroy a widget and release its quads
    ///
    /// Destroying a screen destroys its members, nested screens included.
    pub fn destroy_widget(&mut self, id: WidgetId) -> ManagerResult<()> {
        if !self.widgets.contains_key(id) {
            return Err(ManagerError::UnknownWidget(id));
        }

        let mut pending = vec![id];
        while let Some(id) = pending.pop() {
            let Some(mut node) = self.widgets.remove(id) else {
                continue;
            };
            self.unregister_widget_handler(id);
            if self.active_input == Some(id) {
                self.active_input = None;
            }

            let mut ctx = WidgetContext::new(&mut self.layers, &self.fonts, self.config.screen);
            node.release(&mut ctx);
            if let WidgetNode::Screen(screen) = &node {
                pending.extend_from_slice(screen.items());
            }
            for other in self.widgets.values_mut() {
                if let WidgetNode::Screen(screen) = other {
                    screen.remove(id);
                }
            }
            log::debug!("Destroyed {} {id:?}", node.kind());
        }
        Ok(())
    }

    /// Kind of a widget, if it exists
    pub fn widget_kind(&self, id: WidgetId) -> Option<WidgetKind> {
        self.widgets.get(id).map(WidgetNode::kind)
    }

    /// Whether a widget is shown
    pub fn is_widget_visible(&self, id: WidgetId) -> ManagerResult<bool> {
        self.widgets
            .get(id)
            .map(WidgetNode::is_visible)
            .ok_or(ManagerError::UnknownWidget(id))
    }

    /// Number of live widgets, screens included
    pub fn widget_count(&self) -> usize {
        self.widgets.len()
    }

    /// Borrow a widget of a known kind
    pub fn widget<W: WidgetVariant>(&self, id: WidgetId) -> ManagerResult<&W> {
        let node = self.widgets.get(id).ok_or(ManagerError::UnknownWidget(id))?;
        W::from_node(node).ok_or(ManagerError::WrongWidgetKind {
            id,
            expected: W::KIND,
            actual: node.kind(),
        })
    }

    fn widget_mut<W: WidgetVariant>(&mut self, id: WidgetId) -> ManagerResult<&mut W> {
        let node = self.widgets.get_mut(id).ok_or(ManagerError::UnknownWidget(id))?;
        let actual = node.kind();
        W::from_node_mut(node).ok_or(ManagerError::WrongWidgetKind {
            id,
            expected: W::KIND,
            actual,
        })
    }

    /// Mutate a widget with access to its quads and fonts
    ///
    /// The widget's hit-testing entry is refreshed afterwards, so moving or
    /// resizing a button inside `f` is picked up by the next mouse event.
    pub fn update_widget<W, R>(
        &mut self,
        id: WidgetId,
        f: impl FnOnce(&mut W, &mut WidgetContext<'_>) -> WidgetResult<R>,
    ) -> ManagerResult<R>
    where
        W: WidgetVariant,
    {
        let node = self.widgets.get_mut(id).ok_or(ManagerError::UnknownWidget(id))?;
        let actual = node.kind();
        let widget = W::from_node_mut(node).ok_or(ManagerError::WrongWidgetKind {
            id,
            expected: W::KIND,
            actual,
        })?;

        let mut ctx = WidgetContext::new(&mut self.layers, &self.fonts, self.config.screen);
        let result = f(widget, &mut ctx);
        self.sync_widget_handler(id);
        Ok(result?)
    }

    // ---- Convenience setters ----

    /// Replace a string's text
    pub fn set_string_text(&mut self, id: WidgetId, text: &str) -> ManagerResult<()> {
        self.update_widget::<TextString, _>(id, |string, ctx| string.set_text(ctx, text))
    }

    /// Recolor a string
    pub fn set_string_color(&mut self, id: WidgetId, color: Vec4) -> ManagerResult<()> {
        self.update_widget::<TextString, _>(id, |string, ctx| {
            string.set_color(ctx, color);
            Ok(())
        })
    }

    /// Move a string's baseline origin
    pub fn set_string_position(&mut self, id: WidgetId, x: f32, y: f32) -> ManagerResult<()> {
        self.update_widget::<TextString, _>(id, |string, ctx| string.set_position(ctx, x, y))
    }

    /// Move and resize a button
    pub fn set_button_bounds(&mut self, id: WidgetId, x: f32, y: f32, w: f32, h: f32) -> ManagerResult<()> {
        self.update_widget::<Button, _>(id, |button, ctx| button.set_bounds(ctx, x, y, w, h))
    }

    /// Register a click listener on a button
    pub fn add_click_listener(
        &mut self,
        id: WidgetId,
        listener: impl FnMut(MouseButton) + 'static,
    ) -> ManagerResult<ListenerId> {
        self.update_widget::<Button, _>(id, |button, _| Ok(button.add_click_listener(listener)))
    }

    /// Replace an input box's text
    pub fn set_input_text(&mut self, id: WidgetId, text: &str) -> ManagerResult<()> {
        self.update_widget::<InputBox, _>(id, |input, ctx| input.set_text(ctx, text))
    }

    /// Current text of an input box
    pub fn input_text(&self, id: WidgetId) -> ManagerResult<&str> {
        self.widget::<InputBox>(id).map(InputBox::text)
    }

    /// Give keyboard focus to an input box, or to nothing
    pub fn focus_input(&mut self, id: Option<WidgetId>) -> ManagerResult<()> {
        if let Some(id) = id {
            self.widget::<InputBox>(id)?;
        }
        self.set_focus(id);
        Ok(())
    }

    /// Input box holding keyboard focus
    pub const fn active_input(&self) -> Option<WidgetId> {
        self.active_input
    }

    fn set_focus(&mut self, id: Option<WidgetId>) {
        if self.active_input == id {
            return;
        }

        let mut ctx = WidgetContext::new(&mut self.layers, &self.fonts, self.config.screen);
        if let Some(previous) = self.active_input {
            if let Some(WidgetNode::InputBox(input)) = self.widgets.get_mut(previous) {
                input.deactivate(&mut ctx);
            }
        }
        if let Some(next) = id {
            if let Some(WidgetNode::InputBox(input)) = self.widgets.get_mut(next) {
                input.activate(&mut ctx);
            }
        }
        self.active_input = id;
    }

    /// Feed a frame sample to a statistics box
    pub fn update_statistics(&mut self, id: WidgetId, sample: &FrameSample) -> ManagerResult<()> {
        self.update_widget::<Statistics, _>(id, |statistics, ctx| statistics.update(ctx, sample))
    }

    /// Report physics time on a statistics box's extended line
    pub fn set_physics_time(&mut self, id: WidgetId, micros: f32) -> ManagerResult<()> {
        self.update_widget::<Statistics, _>(id, |statistics, ctx| statistics.set_physics_time(ctx, micros))
    }

    /// Show or hide the extended statistics lines
    pub fn set_statistics_extended(&mut self, id: WidgetId, extended: bool) -> ManagerResult<()> {
        self.update_widget::<Statistics, _>(id, |statistics, ctx| {
            if extended {
                statistics.show_extended(ctx)
            } else {
                statistics.hide_extended(ctx);
                Ok(())
            }
        })
    }

    // ---- Raw quad elements ----

    /// Create a hidden element of flat-colored quads
    pub fn create_untextured(&mut self, quads: usize) -> QuadKey {
        self.layers.untextured.insert(UntexturedQuads::new(quads))
    }

    /// Create a hidden element of textured quads
    pub fn create_textured(&mut self, quads: usize) -> QuadKey {
        self.layers.textured.insert(TexturedQuads::new(quads))
    }

    /// Mutable access to an untextured element
    pub fn untextured_mut(&mut self, key: QuadKey) -> Option<&mut UntexturedQuads> {
        self.layers.untextured.get_mut(key)
    }

    /// Mutable access to a textured element
    pub fn textured_mut(&mut self, key: QuadKey) -> Option<&mut TexturedQuads> {
        self.layers.textured.get_mut(key)
    }

    /// Add an untextured element to the visible set
    pub fn show_untextured(&mut self, key: QuadKey) -> ManagerResult<()> {
        if self.layers.untextured.show(key)? {
            Ok(())
        } else {
            Err(ManagerError::UnknownQuads(key))
        }
    }

    /// Add a textured element to the visible set
    pub fn show_textured(&mut self, key: QuadKey) -> ManagerResult<()> {
        if self.layers.textured.show(key)? {
            Ok(())
        } else {
            Err(ManagerError::UnknownQuads(key))
        }
    }

    /// Remove an untextured element from the visible set
    pub fn hide_untextured(&mut self, key: QuadKey) {
        self.layers.untextured.hide(key);
    }

    /// Remove a textured element from the visible set
    pub fn hide_textured(&mut self, key: QuadKey) {
        self.layers.textured.hide(key);
    }

    /// Destroy an untextured element
    pub fn release_untextured(&mut self, key: QuadKey) -> bool {
        self.layers.untextured.remove(key).is_some()
    }

    /// Destroy a textured element
    pub fn release_textured(&mut self, key: QuadKey) -> bool {
        self.layers.textured.remove(key).is_some()
    }

    // ---- Event handlers ----

    /// Register a mouse button handler over a rectangle
    pub fn add_mouse_handler(&mut self, handler: Box<dyn MouseHandler>, bounds: Bounds) -> HandlerKey {
        let key = self.handlers.insert(RegisteredHandler {
            handler: CustomHandler::Mouse(handler),
            bounds,
        });
        self.mouse_tree.insert(HandlerEntry {
            target: HandlerTarget::Custom(key),
            bounds,
        });
        key
    }

    /// Unregister a mouse button handler
    pub fn remove_mouse_handler(&mut self, key: HandlerKey) -> bool {
        self.remove_custom_handler(key, false)
    }

    /// Register a mouse motion handler over a rectangle
    pub fn add_mouse_motion_handler(&mut self, handler: Box<dyn MouseMotionHandler>, bounds: Bounds) -> HandlerKey {
        let key = self.handlers.insert(RegisteredHandler {
            handler: CustomHandler::Motion(handler),
            bounds,
        });
        self.motion_tree.insert(HandlerEntry {
            target: HandlerTarget::Custom(key),
            bounds,
        });
        key
    }

    /// Unregister a mouse motion handler
    pub fn remove_mouse_motion_handler(&mut self, key: HandlerKey) -> bool {
        self.remove_custom_handler(key, true)
    }

    fn remove_custom_handler(&mut self, key: HandlerKey, motion: bool) -> bool {
        let bounds = match self.handlers.get(key) {
            Some(registered) if matches!(registered.handler, CustomHandler::Motion(_)) == motion => registered.bounds,
            _ => return false,
        };
        self.handlers.remove(key);

        let entry = HandlerEntry {
            target: HandlerTarget::Custom(key),
            bounds,
        };
        if motion {
            self.motion_tree.remove(&entry);
        } else {
            self.mouse_tree.remove(&entry);
        }
        true
    }

    /// Number of custom handlers
    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Index a widget under its current bounds, or drop it when hidden
    fn sync_widget_handler(&mut self, id: WidgetId) {
        let desired = self
            .widgets
            .get(id)
            .filter(|node| node.is_visible())
            .and_then(WidgetNode::mouse_bounds);
        let current = self.widget_handlers.get(id).copied();
        if desired == current {
            return;
        }

        self.unregister_widget_handler(id);
        if let Some(bounds) = desired {
            self.mouse_tree.insert(HandlerEntry {
                target: HandlerTarget::Widget(id),
                bounds,
            });
            self.widget_handlers.insert(id, bounds);
        }
    }

    fn unregister_widget_handler(&mut self, id: WidgetId) {
        if let Some(bounds) = self.widget_handlers.remove(id) {
            self.mouse_tree.remove(&HandlerEntry {
                target: HandlerTarget::Widget(id),
                bounds,
            });
        }
    }

    // ---- Events ----

    /// Route a button press to the handlers under the pointer
    ///
    /// Handlers are tried in index order until one absorbs the event.
    pub fn mouse_pressed(&mut self, x: f32, y: f32, button: MouseButton) -> EventFlow {
        self.dispatch_button(x, y, button, ButtonPhase::Pressed)
    }

    /// Route a button release to the handlers under the pointer
    pub fn mouse_released(&mut self, x: f32, y: f32, button: MouseButton) -> EventFlow {
        self.dispatch_button(x, y, button, ButtonPhase::Released)
    }

    /// Route pointer motion to the motion handlers under the pointer
    pub fn mouse_moved(&mut self, x: f32, y: f32) -> EventFlow {
        let mut hits = std::mem::take(&mut self.hits);
        hits.clear();
        self.motion_tree.locate(x, y, &mut hits);

        let mut flow = EventFlow::Continue;
        for entry in &hits {
            let HandlerTarget::Custom(key) = entry.target else {
                continue;
            };
            if let Some(RegisteredHandler {
                handler: CustomHandler::Motion(handler),
                ..
            }) = self.handlers.get_mut(key)
            {
                if handler.mouse_moved(x, y).is_absorbed() {
                    flow = EventFlow::Absorbed;
                    break;
                }
            }
        }

        self.hits = hits;
        flow
    }

    fn dispatch_button(&mut self, x: f32, y: f32, button: MouseButton, phase: ButtonPhase) -> EventFlow {
        let mut hits = std::mem::take(&mut self.hits);
        hits.clear();
        let found = self.mouse_tree.locate(x, y, &mut hits);

        let mut flow = EventFlow::Continue;
        for entry in &hits {
            if self.deliver_button(entry.target, x, y, button, phase).is_absorbed() {
                flow = EventFlow::Absorbed;
                break;
            }
        }
        log::trace!("{phase:?} {button:?} at ({x:.3}, {y:.3}): {found} candidates, {flow:?}");

        self.hits = hits;
        flow
    }

    fn deliver_button(
        &mut self,
        target: HandlerTarget,
        x: f32,
        y: f32,
        button: MouseButton,
        phase: ButtonPhase,
    ) -> EventFlow {
        match target {
            HandlerTarget::Widget(id) => match self.widget_kind(id) {
                Some(WidgetKind::Button) => match self.widgets.get_mut(id) {
                    Some(WidgetNode::Button(widget)) => phase.deliver(widget, x, y, button),
                    _ => EventFlow::Continue,
                },
                Some(WidgetKind::InputBox) => {
                    if phase == ButtonPhase::Pressed {
                        self.set_focus(Some(id));
                    }
                    EventFlow::Absorbed
                }
                _ => EventFlow::Continue,
            },
            HandlerTarget::Custom(key) => match self.handlers.get_mut(key) {
                Some(RegisteredHandler {
                    handler: CustomHandler::Mouse(handler),
                    ..
                }) => phase.deliver(handler.as_mut(), x, y, button),
                _ => EventFlow::Continue,
            },
        }
    }

    /// Route a key press to the focused input box
    pub fn key_pressed(&mut self, key: Key) -> ManagerResult<EventFlow> {
        let Some(id) = self.active_input else {
            return Ok(EventFlow::Continue);
        };
        self.update_widget::<InputBox, _>(id, |input, ctx| input.key_pressed(ctx, key))
    }

    // ---- Frame ----

    /// Draw every visible quad: untextured, then textured, then text
    pub fn render(&mut self) -> ManagerResult<FrameStats> {
        if self.shut_down {
            return Err(ManagerError::ShutDown);
        }
        self.frame_stats = self.layers.render(&mut self.backend)?;
        Ok(self.frame_stats)
    }

    /// Statistics of the last rendered frame
    pub const fn frame_stats(&self) -> FrameStats {
        self.frame_stats
    }

    /// Width of one pixel in normalized units
    pub fn pixel_width(&self) -> f32 {
        self.config.screen.pixel_width()
    }

    /// Height of one pixel in normalized units
    pub fn pixel_height(&self) -> f32 {
        self.config.screen.pixel_height()
    }

    /// Active configuration
    pub const fn config(&self) -> &OverlayConfig {
        &self.config
    }

    /// Backend the manager draws through
    pub const fn backend(&self) -> &B {
        &self.backend
    }

    /// Mutable access to the backend
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Quad stores and renderers
    pub const fn layers(&self) -> &QuadLayers {
        &self.layers
    }

    /// Release every GPU buffer; later renders fail
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.layers.release(&mut self.backend);
        self.shut_down = true;
        log::info!("Overlay manager shut down with {} widgets", self.widgets.len());
    }

    /// Whether [`Self::shutdown`] has run
    pub const fn is_shut_down(&self) -> bool {
        self.shut_down
    }
}

impl<B: QuadRenderBackend> Drop for Manager<B> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::render::vertex::MAX_BATCH_QUADS;
    use crate::render::{HeadlessBackend, QuadElement, ShadingKind};
    use crate::ui::font::MonospaceFontLoader;
    use crate::ui::widgets::Visible;

    fn manager() -> Manager<HeadlessBackend> {
        let config = OverlayConfig::default();
        let loader = MonospaceFontLoader::new(&config.screen);
        let mut manager = Manager::new(config, HeadlessBackend::new(), Box::new(loader)).expect("manager");
        manager.load_font("mono.ttf", 16).expect("font");
        manager
    }

    struct Recorder {
        name: &'static str,
        flow: EventFlow,
        log: Rc<RefCell<Vec<&'static str>>>,
    }

    impl MouseHandler for Recorder {
        fn mouse_pressed(&mut self, _x: f32, _y: f32, _button: MouseButton) -> EventFlow {
            self.log.borrow_mut().push(self.name);
            self.flow
        }

        fn mouse_released(&mut self, _x: f32, _y: f32, _button: MouseButton) -> EventFlow {
            EventFlow::Continue
        }
    }

    struct MotionCounter(Rc<RefCell<usize>>);

    impl MouseMotionHandler for MotionCounter {
        fn mouse_moved(&mut self, _x: f32, _y: f32) -> EventFlow {
            *self.0.borrow_mut() += 1;
            EventFlow::Continue
        }
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = OverlayConfig::new(0, 600);
        let loader = MonospaceFontLoader::new(&config.screen);
        let result = Manager::new(config, HeadlessBackend::new(), Box::new(loader));
        assert!(matches!(result, Err(ManagerError::InvalidConfig(_))));
    }

    #[test]
    fn test_font_loading_is_deduplicated() {
        let mut manager = manager();
        let first = manager.font_id("mono.ttf", 16).expect("loaded");
        assert_eq!(first, FontId(1));

        let other = manager.load_font("mono.ttf", 24).expect("font");
        assert_ne!(other, first);
        assert_eq!(manager.current_font(), Some(other));

        assert_eq!(manager.load_font("mono.ttf", 16).expect("font"), first);
        assert_eq!(manager.current_font(), Some(first));
    }

    #[test]
    fn test_string_requires_font() {
        let config = OverlayConfig::default();
        let loader = MonospaceFontLoader::new(&config.screen);
        let mut manager = Manager::new(config, HeadlessBackend::new(), Box::new(loader)).expect("manager");

        let result = manager.create_string("no font", 0.0, 0.0);
        assert!(matches!(result, Err(ManagerError::Font(FontError::NoFont))));
        assert_eq!(manager.widget_count(), 0);
    }

    #[test]
    fn test_string_uses_pen() {
        let mut manager = manager();
        let orange = Vec4::new(1.0, 0.5, 0.0, 1.0);
        manager.set_color(orange);

        let id = manager.create_string("pen", -0.5, 0.0).expect("string");
        let string = manager.widget::<TextString>(id).expect("text");
        assert_eq!(string.color(), orange);
        assert!(string.is_visible());
        assert!(manager.layers().text.is_shown(string.glyph_key()));
    }

    #[test]
    fn test_wrong_widget_kind() {
        let mut manager = manager();
        let id = manager.create_string("label", 0.0, 0.0).expect("string");

        let result = manager.widget::<Button>(id);
        assert!(matches!(
            result,
            Err(ManagerError::WrongWidgetKind {
                expected: WidgetKind::Button,
                actual: WidgetKind::Text,
                ..
            })
        ));
    }

    #[test]
    fn test_first_absorbing_handler_stops_dispatch() {
        let mut manager = manager();
        let log = Rc::new(RefCell::new(Vec::new()));
        let area = Bounds::from_rect(-0.5, -0.5, 1.0, 1.0);

        manager.add_mouse_handler(
            Box::new(Recorder {
                name: "first",
                flow: EventFlow::Absorbed,
                log: Rc::clone(&log),
            }),
            area,
        );
        manager.add_mouse_handler(
            Box::new(Recorder {
                name: "second",
                flow: EventFlow::Absorbed,
                log: Rc::clone(&log),
            }),
            area,
        );

        let flow = manager.mouse_pressed(0.0, 0.0, MouseButton::Left);
        assert_eq!(flow, EventFlow::Absorbed);
        assert_eq!(*log.borrow(), vec!["first"]);
    }

    #[test]
    fn test_continuing_handlers_all_run() {
        let mut manager = manager();
        let log = Rc::new(RefCell::new(Vec::new()));
        let area = Bounds::from_rect(-0.5, -0.5, 1.0, 1.0);
        for name in ["a", "b"] {
            manager.add_mouse_handler(
                Box::new(Recorder {
                    name,
                    flow: EventFlow::Continue,
                    log: Rc::clone(&log),
                }),
                area,
            );
        }

        assert_eq!(manager.mouse_pressed(0.0, 0.0, MouseButton::Left), EventFlow::Continue);
        assert_eq!(*log.borrow(), vec!["a", "b"]);

        // Outside both rectangles
        assert_eq!(manager.mouse_pressed(0.9, 0.9, MouseButton::Left), EventFlow::Continue);
        assert_eq!(log.borrow().len(), 2);
    }

    #[test]
    fn test_removed_handler_is_not_called() {
        let mut manager = manager();
        let log = Rc::new(RefCell::new(Vec::new()));
        let key = manager.add_mouse_handler(
            Box::new(Recorder {
                name: "gone",
                flow: EventFlow::Absorbed,
                log: Rc::clone(&log),
            }),
            Bounds::screen(),
        );

        assert!(!manager.remove_mouse_motion_handler(key));
        assert!(manager.remove_mouse_handler(key));
        assert!(!manager.remove_mouse_handler(key));
        assert_eq!(manager.mouse_pressed(0.0, 0.0, MouseButton::Left), EventFlow::Continue);
        assert!(log.borrow().is_empty());
        assert_eq!(manager.handler_count(), 0);
    }

    #[test]
    fn test_motion_handlers() {
        let mut manager = manager();
        let count = Rc::new(RefCell::new(0));
        manager.add_mouse_motion_handler(
            Box::new(MotionCounter(Rc::clone(&count))),
            Bounds::from_rect(0.0, 0.0, 0.5, 0.5),
        );

        manager.mouse_moved(0.25, 0.25);
        manager.mouse_moved(-0.25, -0.25);
        assert_eq!(*count.borrow(), 1);

        // Motion handlers never see button events
        manager.mouse_pressed(0.25, 0.25, MouseButton::Left);
        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn test_button_click_through_manager() {
        let mut manager = manager();
        let button = manager.create_button("OK", -0.2, -0.1, 0.4, 0.2).expect("button");
        let clicks = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&clicks);
        manager
            .add_click_listener(button, move |pressed| sink.borrow_mut().push(pressed))
            .expect("listener");

        assert!(manager.mouse_pressed(0.0, 0.0, MouseButton::Left).is_absorbed());
        assert!(manager.widget::<Button>(button).expect("button").is_armed());
        assert!(manager.mouse_released(0.0, 0.0, MouseButton::Left).is_absorbed());
        assert_eq!(*clicks.borrow(), vec![MouseButton::Left]);

        // Press inside, release outside: no click
        manager.mouse_pressed(0.0, 0.0, MouseButton::Right);
        manager.mouse_released(0.9, 0.9, MouseButton::Right);
        assert_eq!(clicks.borrow().len(), 1);
    }

    #[test]
    fn test_button_bounds_reindexed() {
        let mut manager = manager();
        let button = manager.create_button("Move", -0.9, -0.9, 0.2, 0.2).expect("button");
        assert!(manager.mouse_pressed(-0.8, -0.8, MouseButton::Left).is_absorbed());
        manager.mouse_released(-0.8, -0.8, MouseButton::Left);

        manager.set_button_bounds(button, 0.5, 0.5, 0.2, 0.2).expect("bounds");
        assert_eq!(manager.mouse_pressed(-0.8, -0.8, MouseButton::Left), EventFlow::Continue);
        assert!(manager.mouse_pressed(0.6, 0.6, MouseButton::Left).is_absorbed());
    }

    #[test]
    fn test_hidden_button_ignores_clicks() {
        let mut manager = manager();
        let button = manager.create_button("Hide", -0.2, -0.2, 0.4, 0.4).expect("button");

        manager.hide_widget(button).expect("hide");
        assert!(!manager.is_widget_visible(button).expect("exists"));
        assert_eq!(manager.mouse_pressed(0.0, 0.0, MouseButton::Left), EventFlow::Continue);

        manager.show_widget(button).expect("show");
        assert!(manager.mouse_pressed(0.0, 0.0, MouseButton::Left).is_absorbed());
    }

    #[test]
    fn test_screen_visibility_and_destroy() {
        let mut manager = manager();
        let screen = manager.create_screen().expect("screen");
        let label = manager.create_string("member", 0.0, 0.0).expect("string");
        let button = manager.create_button("Go", -0.1, -0.1, 0.2, 0.2).expect("button");
        manager.add_to_screen(screen, label).expect("add");
        manager.add_to_screen(screen, button).expect("add");
        assert!(manager.add_to_screen(label, button).is_err());

        manager.hide_widget(screen).expect("hide");
        assert!(!manager.is_widget_visible(label).expect("label"));
        assert!(!manager.is_widget_visible(button).expect("button"));
        assert_eq!(manager.mouse_pressed(0.0, 0.0, MouseButton::Left), EventFlow::Continue);

        manager.show_widget(screen).expect("show");
        assert!(manager.is_widget_visible(label).expect("label"));
        assert!(manager.mouse_pressed(0.0, 0.0, MouseButton::Left).is_absorbed());
        manager.mouse_released(0.0, 0.0, MouseButton::Left);

        assert!(manager.remove_from_screen(screen, label).expect("remove"));
        manager.destroy_widget(screen).expect("destroy");
        assert_eq!(manager.widget_kind(button), None);
        assert_eq!(manager.widget_kind(label), Some(WidgetKind::Text));
        assert_eq!(manager.mouse_pressed(0.0, 0.0, MouseButton::Left), EventFlow::Continue);
    }

    #[test]
    fn test_nested_screens_do_not_loop() {
        let mut manager = manager();
        let outer = manager.create_screen().expect("outer");
        let inner = manager.create_screen().expect("inner");
        manager.add_to_screen(outer, inner).expect("add");
        manager.add_to_screen(inner, outer).expect("add");

        manager.hide_widget(outer).expect("hide");
        assert!(!manager.is_widget_visible(inner).expect("inner"));

        manager.destroy_widget(outer).expect("destroy");
        assert_eq!(manager.widget_count(), 0);
    }

    #[test]
    fn test_destroyed_widget_leaves_other_screens() {
        let mut manager = manager();
        let first = manager.create_screen().expect("screen");
        let second = manager.create_screen().expect("screen");
        let label = manager.create_string("shared", 0.0, 0.0).expect("string");
        manager.add_to_screen(first, label).expect("add");
        manager.add_to_screen(second, label).expect("add");

        manager.destroy_widget(first).expect("destroy");
        let remaining = manager.widget::<Screen>(second).expect("screen");
        assert!(!remaining.contains(label));
        assert!(matches!(manager.destroy_widget(label), Err(ManagerError::UnknownWidget(_))));
    }

    #[test]
    fn test_keys_go_to_focused_input() {
        let mut manager = manager();
        let first = manager.create_input_box(-0.5, 0.0).expect("input");
        let second = manager.create_input_box(-0.5, -0.5).expect("input");
        assert_eq!(manager.active_input(), Some(first));
        assert!(!manager.widget::<InputBox>(second).expect("input").is_active());

        manager.key_pressed(Key::Char('h')).expect("key");
        manager.key_pressed(Key::Char('i')).expect("key");
        assert_eq!(manager.input_text(first).expect("text"), "hi");
        assert_eq!(manager.input_text(second).expect("text"), "");

        manager.focus_input(Some(second)).expect("focus");
        manager.key_pressed(Key::Char('x')).expect("key");
        assert_eq!(manager.input_text(second).expect("text"), "x");
        assert!(!manager.widget::<InputBox>(first).expect("input").is_active());

        manager.focus_input(None).expect("focus");
        assert_eq!(manager.key_pressed(Key::Char('y')).expect("key"), EventFlow::Continue);
    }

    #[test]
    fn test_click_focuses_input() {
        let mut manager = manager();
        let first = manager.create_input_box(-0.5, 0.5).expect("input");
        let second = manager.create_input_box(-0.5, -0.5).expect("input");
        let bounds = manager.widget::<InputBox>(second).expect("input").bounds();
        let center = bounds.center();

        assert!(manager.mouse_pressed(center.x, center.y, MouseButton::Left).is_absorbed());
        assert_eq!(manager.active_input(), Some(second));
        assert!(!manager.widget::<InputBox>(first).expect("input").is_active());
    }

    #[test]
    fn test_destroying_focused_input_clears_focus() {
        let mut manager = manager();
        let input = manager.create_input_box(0.0, 0.0).expect("input");
        manager.destroy_widget(input).expect("destroy");
        assert_eq!(manager.active_input(), None);
        assert_eq!(manager.key_pressed(Key::Backspace).expect("key"), EventFlow::Continue);
    }

    #[test]
    fn test_render_order() {
        let mut manager = manager();
        manager.create_string("label", -0.9, 0.9).expect("string");
        manager.create_button("Button", -0.2, -0.1, 0.4, 0.2).expect("button");
        let statistics = manager.create_statistics().expect("statistics");
        manager.show_widget(statistics).expect("show");

        let stats = manager.render().expect("render");
        assert!(stats.untextured.quads > 0);
        assert!(stats.textured.quads > 0);
        assert!(stats.text.quads > 0);
        assert_eq!(
            manager.backend().batches(),
            vec![ShadingKind::Untextured, ShadingKind::Textured, ShadingKind::Text]
        );
        assert_eq!(manager.frame_stats(), stats);
    }

    #[test]
    fn test_raw_quads() {
        let mut manager = manager();
        let key = manager.create_untextured(2);
        manager
            .untextured_mut(key)
            .expect("quads")
            .set_quad_color(0, &Vec4::new(1.0, 0.0, 0.0, 1.0));
        manager.show_untextured(key).expect("show");

        let stats = manager.render().expect("render");
        assert_eq!(stats.untextured.quads, 2);

        assert!(manager.release_untextured(key));
        assert!(matches!(manager.show_untextured(key), Err(ManagerError::UnknownQuads(_))));
        assert_eq!(manager.render().expect("render").untextured.quads, 0);
    }

    #[test]
    fn test_replaced_raw_quads_keep_neighbours_intact() {
        let mut manager = manager();
        let first = manager.create_untextured(1);
        let second = manager.create_untextured(1);
        for (key, x) in [(first, -0.5), (second, 0.5)] {
            manager
                .untextured_mut(key)
                .expect("quads")
                .geometry_mut()
                .set_corner_positions(0, x, 0.5, 0.1, 0.1);
            manager.show_untextured(key).expect("show");
        }
        manager.render().expect("render");

        *manager.untextured_mut(first).expect("quads") = UntexturedQuads::new(2);
        let stats = manager.render().expect("render");
        assert_eq!(stats.untextured.quads, 3);

        let layer = &manager.layers().untextured;
        let published = &layer.renderer().positions()[8..12];
        assert_eq!(published, layer.get(second).expect("quads").geometry().positions());
    }

    #[test]
    fn test_failed_key_leaves_cursor_on_text() {
        let mut manager = manager();
        let input = manager.create_input_box(-0.5, 0.0).expect("input");
        let full = "x".repeat(MAX_BATCH_QUADS);
        manager.set_input_text(input, &full).expect("text");

        let result = manager.key_pressed(Key::Char('y'));
        assert!(matches!(result, Err(ManagerError::Batch(BatchError::CapacityExceeded { .. }))));
        assert_eq!(manager.input_text(input).expect("text"), full);
        let widget = manager.widget::<InputBox>(input).expect("input");
        assert_eq!(widget.cursor(), MAX_BATCH_QUADS);

        manager.key_pressed(Key::Backspace).expect("key");
        assert_eq!(manager.input_text(input).expect("text").len(), MAX_BATCH_QUADS - 1);
        assert_eq!(manager.widget::<InputBox>(input).expect("input").cursor(), MAX_BATCH_QUADS - 1);
        assert_eq!(manager.render().expect("render").text.quads, MAX_BATCH_QUADS);
    }

    #[test]
    fn test_shutdown() {
        let mut manager = manager();
        manager.create_string("bye", 0.0, 0.0).expect("string");
        manager.render().expect("render");
        assert!(manager.backend().buffer_count() > 0);

        manager.shutdown();
        manager.shutdown();
        assert!(manager.is_shut_down());
        assert_eq!(manager.backend().buffer_count(), 0);
        assert!(matches!(manager.render(), Err(ManagerError::ShutDown)));
    }
}
