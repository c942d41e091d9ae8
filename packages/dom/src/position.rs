use crate::classify::{is_non_editable, is_protecting, is_self_closing};
use crate::node::NodeId;
use crate::tree::Dom;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A caret location: child index inside an element, char offset inside text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub node: NodeId,
    pub offset: usize,
}

impl Position {
    pub fn new(node: NodeId, offset: usize) -> Self {
        Self { node, offset }
    }

    /// Position right before `node` in its parent
    pub fn before(dom: &Dom, node: NodeId) -> Option<Self> {
        Some(Self::new(dom.parent(node)?, dom.index_of(node)?))
    }

    /// Position right after `node` in its parent
    pub fn after(dom: &Dom, node: NodeId) -> Option<Self> {
        Some(Self::new(dom.parent(node)?, dom.index_of(node)? + 1))
    }

    /// Points at a live node with an offset inside its bounds
    pub fn is_valid(&self, dom: &Dom) -> bool {
        dom.exists(self.node) && self.offset <= dom.node_len(self.node)
    }
}

/// Anchor/focus pair; anchor is where the selection started
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub anchor: Position,
    pub focus: Position,
}

impl Selection {
    pub fn new(anchor: Position, focus: Position) -> Self {
        Self { anchor, focus }
    }

    pub fn collapsed(position: Position) -> Self {
        Self::new(position, position)
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }

    /// True when focus is not before anchor
    pub fn is_forward(&self, dom: &Dom) -> bool {
        dom.compare_points(self.anchor, self.focus) != Ordering::Greater
    }

    /// (start, end) in document order
    pub fn ordered(&self, dom: &Dom) -> (Position, Position) {
        if self.is_forward(dom) {
            (self.anchor, self.focus)
        } else {
            (self.focus, self.anchor)
        }
    }
}

/// Descend from `position` to the deepest equivalent caret position.
///
/// The walk stops at text nodes, self-closing elements (the caret stays next
/// to them), protecting elements and non-editable subtrees.
pub fn normalize_deep(dom: &Dom, position: Position) -> Position {
    let mut current = position;
    loop {
        let node = current.node;
        if !dom.is_element(node) || is_self_closing(dom, node) {
            return current;
        }
        let len = dom.child_count(node);
        let (child, at_end) = if current.offset < len {
            (dom.child_at(node, current.offset), false)
        } else if len > 0 {
            (dom.last_child(node), true)
        } else {
            return current;
        };
        let Some(child) = child else {
            return current;
        };
        if dom.is_element(child)
            && (is_self_closing(dom, child) || is_protecting(dom, child) || is_non_editable(dom, child))
        {
            return current;
        }
        current = if at_end {
            Position::new(child, dom.node_len(child))
        } else {
            Position::new(child, 0)
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_descends_into_text() {
        let mut dom = Dom::new();
        let p = dom.create_element("p");
        let b = dom.create_element("b");
        let text = dom.create_text("xy");
        dom.append_child(p, b).unwrap();
        dom.append_child(b, text).unwrap();

        assert_eq!(normalize_deep(&dom, Position::new(p, 0)), Position::new(text, 0));
        assert_eq!(normalize_deep(&dom, Position::new(p, 1)), Position::new(text, 2));
    }

    #[test]
    fn test_normalize_stops_before_line_break() {
        let mut dom = Dom::new();
        let p = dom.create_element("p");
        let br = dom.create_element("br");
        dom.append_child(p, br).unwrap();

        assert_eq!(normalize_deep(&dom, Position::new(p, 0)), Position::new(p, 0));
    }

    #[test]
    fn test_ordered_selection() {
        let mut dom = Dom::new();
        let text = dom.create_text("hello");
        let backward = Selection::new(Position::new(text, 4), Position::new(text, 1));
        assert!(!backward.is_forward(&dom));
        assert_eq!(
            backward.ordered(&dom),
            (Position::new(text, 1), Position::new(text, 4))
        );
    }
}
