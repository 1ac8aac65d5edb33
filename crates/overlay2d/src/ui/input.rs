//! Pointer and keyboard input types
//!
//! Coordinates handed to handlers are already normalized to [-1, 1] with the
//! origin at the screen center. Use [`cursor_to_normalized`] to convert a
//! top-left [0, 1] cursor position.

pub use crate::foundation::math::cursor_to_normalized;

/// Mouse button identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    /// Left mouse button
    Left,
    /// Right mouse button
    Right,
    /// Middle mouse button
    Middle,
    /// Any other button, by index
    Other(u8),
}

/// Whether an event should keep propagating to the next handler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventFlow {
    /// Offer the event to the next handler
    #[default]
    Continue,
    /// The event was consumed; stop dispatching
    Absorbed,
}

impl EventFlow {
    /// Whether dispatch stops here
    pub const fn is_absorbed(self) -> bool {
        matches!(self, Self::Absorbed)
    }
}

/// Receives button presses and releases inside its bounds
pub trait MouseHandler {
    /// A button went down at `(x, y)`
    fn mouse_pressed(&mut self, x: f32, y: f32, button: MouseButton) -> EventFlow;

    /// A button went up at `(x, y)`
    fn mouse_released(&mut self, x: f32, y: f32, button: MouseButton) -> EventFlow;
}

/// Receives pointer motion inside its bounds
pub trait MouseMotionHandler {
    /// The pointer moved to `(x, y)`
    fn mouse_moved(&mut self, x: f32, y: f32) -> EventFlow;
}

/// Keys understood by input boxes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// Printable character
    Char(char),
    /// Delete before the cursor
    Backspace,
    /// Delete after the cursor
    Delete,
    /// Move the cursor left
    Left,
    /// Move the cursor right
    Right,
    /// Move the cursor to the start
    Home,
    /// Move the cursor to the end
    End,
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Counter {
        presses: usize,
    }

    impl MouseHandler for Counter {
        fn mouse_pressed(&mut self, _x: f32, _y: f32, _button: MouseButton) -> EventFlow {
            self.presses += 1;
            EventFlow::Absorbed
        }

        fn mouse_released(&mut self, _x: f32, _y: f32, _button: MouseButton) -> EventFlow {
            EventFlow::Continue
        }
    }

    #[test]
    fn test_event_flow() {
        assert!(EventFlow::Absorbed.is_absorbed());
        assert!(!EventFlow::Continue.is_absorbed());
        assert_eq!(EventFlow::default(), EventFlow::Continue);
    }

    #[test]
    fn test_handler_trait_object() {
        let mut counter = Counter { presses: 0 };
        let handler: &mut dyn MouseHandler = &mut counter;
        assert!(handler.mouse_pressed(0.0, 0.0, MouseButton::Left).is_absorbed());
        assert!(!handler.mouse_released(0.0, 0.0, MouseButton::Other(4)).is_absorbed());
        assert_eq!(counter.presses, 1);
    }
}
