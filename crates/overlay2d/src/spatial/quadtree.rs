//! Quad-tree spatial partitioning structure
//!
//! Divides the screen into hierarchical rectangles for fast point queries.
//! A leaf subdivides into four quadrants once it would hold more than
//! `node_capacity` elements, unless it sits at `max_depth`. Elements
//! straddling a midline are stored in every quadrant they overlap. When a
//! removal leaves a subtree empty it collapses back into a leaf, and the
//! collapse propagates towards the root.
//!
//! Nodes live in a [`SlotMap`] arena. Children are owned through keys held
//! by their parent; the parent link is a plain key used only for merge-back.
//!
//! At `max_depth` a crowded leaf keeps growing and queries degrade to a
//! linear scan of that leaf.

use slotmap::{new_key_type, SlotMap};

use crate::core::config::SpatialConfig;
use crate::foundation::collections::dedup_tail;

use super::bounds::{Bounded, Bounds};

new_key_type! {
    /// Key of a node in the quad-tree arena
    pub struct NodeKey;
}

#[derive(Debug, Clone)]
enum NodeContents<T> {
    Leaf(Vec<T>),
    Internal([NodeKey; 4]),
}

/// Single node in the quad-tree hierarchy
#[derive(Debug, Clone)]
struct QuadNode<T> {
    bounds: Bounds,
    depth: u32,
    parent: Option<NodeKey>,
    contents: NodeContents<T>,
}

impl<T> QuadNode<T> {
    const fn leaf(bounds: Bounds, depth: u32, parent: Option<NodeKey>) -> Self {
        Self {
            bounds,
            depth,
            parent,
            contents: NodeContents::Leaf(Vec::new()),
        }
    }
}

enum InsertStep<T> {
    Stored,
    Forward([NodeKey; 4]),
    Split(Vec<T>),
}

/// Quad-tree over elements that know their own bounds
///
/// The tree stores clones of the inserted values and compares them with
/// `PartialEq` on removal, so `T` is typically a small handle.
#[derive(Debug, Clone)]
pub struct QuadTree<T> {
    nodes: SlotMap<NodeKey, QuadNode<T>>,
    root: NodeKey,
    config: SpatialConfig,
    len: usize,
}

impl<T: Bounded + PartialEq + Clone> QuadTree<T> {
    /// Create an empty tree covering `bounds`
    pub fn new(bounds: Bounds, config: SpatialConfig) -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(QuadNode::leaf(bounds, 0, None));
        Self {
            nodes,
            root,
            config,
            len: 0,
        }
    }

    /// Create an empty tree covering the whole screen
    pub fn screen(config: SpatialConfig) -> Self {
        Self::new(Bounds::screen(), config)
    }

    /// Insert an element into every leaf its bounds overlap
    ///
    /// Elements outside the root rectangle are ignored, and so is an
    /// element that is already stored.
    pub fn insert(&mut self, element: T) {
        let bounds = element.bounds();
        let overlaps_root = self.nodes.get(self.root).is_some_and(|root| root.bounds.overlaps(&bounds));
        if !overlaps_root {
            log::debug!("Ignoring quad-tree insert outside the root bounds: {bounds:?}");
            return;
        }
        if self.contains_at(self.root, &element, &bounds) {
            log::debug!("Ignoring duplicate quad-tree insert at {bounds:?}");
            return;
        }
        self.insert_at(self.root, &element, &bounds);
        self.len += 1;
    }

    /// Remove every stored copy of an element
    ///
    /// Uses the element's current bounds to find it, so remove before
    /// changing an element's bounds. Removing an absent element does nothing.
    pub fn remove(&mut self, element: &T) {
        let bounds = element.bounds();
        if self.remove_at(self.root, element, &bounds) {
            self.len = self.len.saturating_sub(1);
        }
    }

    /// Whether the element is stored, looked up by its current bounds
    pub fn contains(&self, element: &T) -> bool {
        self.contains_at(self.root, element, &element.bounds())
    }

    /// Append every element whose own bounds contain the point
    ///
    /// Each element is reported once, in leaf order. Returns how many
    /// elements were appended; a point outside the tree yields zero.
    pub fn locate(&self, x: f32, y: f32, results: &mut Vec<T>) -> usize {
        let start = results.len();
        self.locate_at(self.root, x, y, results);
        dedup_tail(results, start);
        results.len() - start
    }

    /// Number of inserted elements
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether no element is stored
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of live nodes, the root included
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of leaf nodes
    pub fn leaf_count(&self) -> usize {
        self.nodes
            .values()
            .filter(|node| matches!(node.contents, NodeContents::Leaf(_)))
            .count()
    }

    /// Whether the root is a leaf
    pub fn root_is_leaf(&self) -> bool {
        self.nodes
            .get(self.root)
            .is_some_and(|root| matches!(root.contents, NodeContents::Leaf(_)))
    }

    /// Deepest level currently in use
    pub fn max_depth_reached(&self) -> u32 {
        self.nodes.values().map(|node| node.depth).max().unwrap_or(0)
    }

    /// Rectangle covered by the root
    pub fn bounds(&self) -> Bounds {
        self.nodes.get(self.root).map_or_else(Bounds::screen, |root| root.bounds)
    }

    /// Drop every element and node except an empty root
    pub fn clear(&mut self) {
        let bounds = self.bounds();
        self.nodes.clear();
        self.root = self.nodes.insert(QuadNode::leaf(bounds, 0, None));
        self.len = 0;
    }

    fn insert_at(&mut self, key: NodeKey, element: &T, bounds: &Bounds) {
        let capacity = self.config.node_capacity;
        let max_depth = self.config.max_depth;
        let Some(node) = self.nodes.get_mut(key) else {
            return;
        };
        if !node.bounds.overlaps(bounds) {
            return;
        }

        let depth = node.depth;
        let step = match &mut node.contents {
            NodeContents::Internal(children) => InsertStep::Forward(*children),
            NodeContents::Leaf(items) if items.len() < capacity || depth >= max_depth => {
                items.push(element.clone());
                InsertStep::Stored
            }
            NodeContents::Leaf(items) => InsertStep::Split(std::mem::take(items)),
        };

        match step {
            InsertStep::Stored => {}
            InsertStep::Forward(children) => {
                for child in children {
                    self.insert_at(child, element, bounds);
                }
            }
            InsertStep::Split(displaced) => {
                let children = self.subdivide(key);
                for item in &displaced {
                    let item_bounds = item.bounds();
                    for child in children {
                        self.insert_at(child, item, &item_bounds);
                    }
                }
                for child in children {
                    self.insert_at(child, element, bounds);
                }
            }
        }
    }

    fn contains_at(&self, key: NodeKey, element: &T, bounds: &Bounds) -> bool {
        let Some(node) = self.nodes.get(key) else {
            return false;
        };
        if !node.bounds.overlaps(bounds) {
            return false;
        }

        match &node.contents {
            NodeContents::Leaf(items) => items.contains(element),
            NodeContents::Internal(children) => children
                .iter()
                .any(|&child| self.contains_at(child, element, bounds)),
        }
    }

    fn subdivide(&mut self, key: NodeKey) -> [NodeKey; 4] {
        let (quadrants, depth) = match self.nodes.get(key) {
            Some(node) => (node.bounds.quadrants(), node.depth + 1),
            None => return [key; 4],
        };
        let children = quadrants.map(|bounds| self.nodes.insert(QuadNode::leaf(bounds, depth, Some(key))));
        if let Some(node) = self.nodes.get_mut(key) {
            node.contents = NodeContents::Internal(children);
        }
        log::trace!("Quad-tree node {key:?} subdivided at depth {}", depth - 1);
        children
    }

    fn remove_at(&mut self, key: NodeKey, element: &T, bounds: &Bounds) -> bool {
        let Some(node) = self.nodes.get_mut(key) else {
            return false;
        };
        if !node.bounds.overlaps(bounds) {
            return false;
        }

        match &mut node.contents {
            NodeContents::Leaf(items) => {
                let before = items.len();
                items.retain(|item| item != element);
                let removed = items.len() != before;
                if items.is_empty() {
                    self.merge_back(key);
                }
                removed
            }
            NodeContents::Internal(children) => {
                let children = *children;
                let mut removed = false;
                for child in children {
                    removed |= self.remove_at(child, element, bounds);
                }
                removed
            }
        }
    }

    fn is_empty_node(&self, key: NodeKey) -> bool {
        match self.nodes.get(key).map(|node| &node.contents) {
            Some(NodeContents::Leaf(items)) => items.is_empty(),
            Some(NodeContents::Internal(children)) => children.iter().all(|child| {
                matches!(
                    self.nodes.get(*child).map(|node| &node.contents),
                    Some(NodeContents::Leaf(items)) if items.is_empty()
                )
            }),
            None => false,
        }
    }

    /// Collapse empty subtrees from `key` towards the root
    fn merge_back(&mut self, key: NodeKey) {
        let mut current = Some(key);
        while let Some(key) = current {
            if !self.is_empty_node(key) {
                break;
            }

            let Some(node) = self.nodes.get_mut(key) else {
                break;
            };
            let parent = node.parent;
            if let NodeContents::Internal(children) = node.contents {
                node.contents = NodeContents::Leaf(Vec::new());
                for child in children {
                    self.nodes.remove(child);
                }
                log::trace!("Quad-tree node {key:?} merged back into a leaf");
            }
            current = parent;
        }
    }

    fn locate_at(&self, key: NodeKey, x: f32, y: f32, results: &mut Vec<T>) {
        let Some(node) = self.nodes.get(key) else {
            return;
        };
        if !node.bounds.contains(x, y) {
            return;
        }

        match &node.contents {
            NodeContents::Leaf(items) => {
                results.extend(items.iter().filter(|item| item.bounds().contains(x, y)).cloned());
            }
            NodeContents::Internal(children) => {
                for &child in children {
                    self.locate_at(child, x, y, results);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Item {
        id: u32,
        bounds: Bounds,
    }

    impl Bounded for Item {
        fn bounds(&self) -> Bounds {
            self.bounds
        }
    }

    fn item(id: u32, x: f32, y: f32, size: f32) -> Item {
        Item {
            id,
            bounds: Bounds::from_rect(x, y, size, size),
        }
    }

    fn grid(cells: u32) -> Vec<Item> {
        let step = 2.0 / cells as f32;
        let mut items = Vec::new();
        for row in 0..cells {
            for col in 0..cells {
                let x = -1.0 + col as f32 * step + step * 0.1;
                let y = -1.0 + row as f32 * step + step * 0.1;
                items.push(item(row * cells + col, x, y, step * 0.8));
            }
        }
        items
    }

    #[test]
    fn test_quadtree_basic_insertion() {
        let mut tree = QuadTree::screen(SpatialConfig::default());
        tree.insert(item(1, 0.0, 0.0, 0.1));
        assert_eq!(tree.len(), 1);
        assert!(tree.root_is_leaf());
        assert_eq!(tree.node_count(), 1);
    }

    #[test]
    fn test_quadtree_subdivides_past_capacity() {
        let mut tree = QuadTree::screen(SpatialConfig::default());
        for id in 0..4 {
            tree.insert(item(id, -0.9 + id as f32 * 0.1, -0.9, 0.05));
        }
        assert!(tree.root_is_leaf());

        tree.insert(item(4, 0.5, 0.5, 0.05));
        assert!(!tree.root_is_leaf());
        assert_eq!(tree.node_count(), 5);
    }

    #[test]
    fn test_quadtree_locates_each_grid_cell() {
        let mut tree = QuadTree::screen(SpatialConfig::default());
        let items = grid(8);
        for item in &items {
            tree.insert(item.clone());
        }

        for item in &items {
            let center = item.bounds.center();
            let mut found = Vec::new();
            assert_eq!(tree.locate(center.x, center.y, &mut found), 1);
            assert_eq!(found[0].id, item.id);
        }
    }

    #[test]
    fn test_quadtree_point_test_per_element() {
        let mut tree = QuadTree::screen(SpatialConfig::default());
        tree.insert(item(1, 0.1, 0.1, 0.2));

        let mut found = Vec::new();
        assert_eq!(tree.locate(0.05, 0.05, &mut found), 0);
        assert_eq!(tree.locate(0.2, 0.2, &mut found), 1);
    }

    #[test]
    fn test_quadtree_outside_root_is_empty() {
        let mut tree = QuadTree::new(Bounds::from_rect(0.0, 0.0, 1.0, 1.0), SpatialConfig::default());
        tree.insert(item(1, 0.1, 0.1, 0.2));
        let mut found = Vec::new();
        assert_eq!(tree.locate(-0.5, -0.5, &mut found), 0);
        assert!(found.is_empty());
    }

    #[test]
    fn test_quadtree_straddling_element_reported_once() {
        let mut tree = QuadTree::screen(SpatialConfig::default());
        for item in grid(4) {
            tree.insert(item);
        }
        let straddler = item(100, -0.2, -0.2, 0.4);
        tree.insert(straddler.clone());
        assert!(!tree.root_is_leaf());

        let mut found = Vec::new();
        tree.locate(0.0, 0.0, &mut found);
        assert_eq!(found.iter().filter(|item| item.id == 100).count(), 1);
    }

    #[test]
    fn test_quadtree_merge_back() {
        let mut tree = QuadTree::screen(SpatialConfig::default());
        let items = grid(8);
        for item in &items {
            tree.insert(item.clone());
        }
        assert!(tree.node_count() > 1);

        for item in &items {
            tree.remove(item);
        }
        assert!(tree.is_empty());
        assert!(tree.root_is_leaf());
        assert_eq!(tree.node_count(), 1);

        for id in 0..4 {
            tree.insert(item(id, -0.9 + id as f32 * 0.1, -0.9, 0.05));
        }
        assert_eq!(tree.node_count(), 1);
        tree.insert(item(4, 0.5, 0.5, 0.05));
        assert_eq!(tree.node_count(), 5);
    }

    #[test]
    fn test_quadtree_partial_removal_keeps_others() {
        let mut tree = QuadTree::screen(SpatialConfig::default());
        let items = grid(4);
        for item in &items {
            tree.insert(item.clone());
        }
        for item in items.iter().skip(1) {
            tree.remove(item);
        }

        let center = items[0].bounds.center();
        let mut found = Vec::new();
        assert_eq!(tree.locate(center.x, center.y, &mut found), 1);
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_quadtree_remove_absent_is_noop() {
        let mut tree = QuadTree::screen(SpatialConfig::default());
        tree.insert(item(1, 0.0, 0.0, 0.1));
        tree.remove(&item(2, 0.5, 0.5, 0.1));
        tree.remove(&item(3, 0.0, 0.0, 0.1));
        assert_eq!(tree.len(), 1);
        let mut found = Vec::new();
        assert_eq!(tree.locate(0.05, 0.05, &mut found), 1);
    }

    #[test]
    fn test_quadtree_duplicate_insert_is_ignored() {
        let mut tree = QuadTree::screen(SpatialConfig::default());
        let straddler = item(7, -0.1, -0.1, 0.2);
        tree.insert(straddler.clone());
        tree.insert(straddler.clone());
        assert_eq!(tree.len(), 1);
        assert!(tree.contains(&straddler));

        tree.remove(&straddler);
        assert!(tree.is_empty());
        assert!(!tree.contains(&straddler));
        let mut found = Vec::new();
        assert_eq!(tree.locate(0.05, 0.05, &mut found), 0);
    }

    #[test]
    fn test_quadtree_depth_is_bounded() {
        let config = SpatialConfig::new().with_max_depth(3);
        let mut tree = QuadTree::screen(config);
        for id in 0..50 {
            tree.insert(item(id, 0.1, 0.1, 0.01));
        }
        assert_eq!(tree.max_depth_reached(), 3);

        let mut found = Vec::new();
        assert_eq!(tree.locate(0.105, 0.105, &mut found), 50);
    }

    #[test]
    fn test_quadtree_clear() {
        let mut tree = QuadTree::screen(SpatialConfig::default());
        for item in grid(4) {
            tree.insert(item);
        }
        tree.clear();
        assert!(tree.is_empty());
        assert_eq!(tree.node_count(), 1);
        assert_eq!(tree.leaf_count(), 1);
    }
}
