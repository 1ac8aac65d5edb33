//! Screens: groups of widgets shown and hidden together
//!
//! A screen owns its members. Showing, hiding or destroying a screen through
//! the manager applies to every member, nested screens included.

use crate::foundation::collections::WidgetId;

use super::core::{Visibility, Visible};

/// Logical grouping of widgets
#[derive(Debug, Clone, Default)]
pub struct Screen {
    items: Vec<WidgetId>,
    visibility: Visibility,
}

impl Screen {
    /// Create an empty, visible screen
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            visibility: Visibility::SHOWN,
        }
    }

    /// Add a member; adding twice keeps one entry
    pub fn add(&mut self, item: WidgetId) {
        if !self.items.contains(&item) {
            self.items.push(item);
        }
    }

    /// Remove a member without destroying it; returns whether it was present
    pub fn remove(&mut self, item: WidgetId) -> bool {
        let before = self.items.len();
        self.items.retain(|existing| *existing != item);
        self.items.len() != before
    }

    /// Whether a widget is a member
    pub fn contains(&self, item: WidgetId) -> bool {
        self.items.contains(&item)
    }

    /// Members in insertion order
    pub fn items(&self) -> &[WidgetId] {
        &self.items
    }

    pub(crate) fn set_visible(&mut self, visible: bool) {
        self.visibility.set(visible);
    }
}

impl Visible for Screen {
    fn visibility(&self) -> Visibility {
        self.visibility
    }
}
