//! Specialized collection types
//!
//! Every long-lived object in the overlay (quad elements, widgets, handlers,
//! quad-tree nodes) lives in a [`SlotMap`] arena and is referred to by a typed
//! key. Keys carry a generation, so a key to a destroyed object never aliases
//! a newer one.

pub use slotmap::{new_key_type, SecondaryMap, SlotMap};

new_key_type! {
    /// Key of a quad element inside a [`QuadStore`]
    pub struct QuadKey;

    /// Key of a widget registered with the manager
    pub struct WidgetId;

    /// Key of a user-supplied event handler
    pub struct HandlerKey;

    /// Key of a click listener attached to a button
    pub struct ListenerId;
}

/// Arena of quad elements of one variant, owned by the widget layer
pub type QuadStore<E> = SlotMap<QuadKey, E>;

/// Remove every duplicate from `items[start..]`, keeping first occurrences
///
/// Used where a value may legitimately be collected more than once, such as
/// an element stored in several quad-tree leaves.
pub fn dedup_tail<T: PartialEq>(items: &mut Vec<T>, start: usize) {
    let mut index = start;
    while index < items.len() {
        if items[start..index].contains(&items[index]) {
            items.remove(index);
        } else {
            index += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedup_tail_keeps_first_occurrence() {
        let mut items = vec![9, 1, 2, 1, 3, 2, 9];
        dedup_tail(&mut items, 1);
        assert_eq!(items, vec![9, 1, 2, 3, 9]);
    }

    #[test]
    fn test_stale_keys_do_not_alias() {
        let mut store: QuadStore<u32> = QuadStore::with_key();
        let first = store.insert(1);
        store.remove(first);
        let second = store.insert(2);
        assert_ne!(first, second);
        assert!(store.get(first).is_none());
    }
}
