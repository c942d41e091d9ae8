//! # Cursor updates
//!
//! A [`CursorRecord`] is a copy of the selection taken right before a
//! structural mutation. Each step of the mutation feeds it a callback built
//! from the tree *before* that step; applying the callbacks in order moves
//! the recorded anchor and focus to coordinates that are valid afterwards.
//!
//! ## Offset rule
//!
//! Inserting a node at child index `k` shifts offsets strictly greater than
//! `k`. A caret sitting exactly at `k` stays in front of the new node.

use crate::node::NodeId;
use crate::position::{Position, Selection};
use crate::tree::Dom;
use std::collections::HashSet;

/// Receiver of cursor-update callbacks
pub trait CursorUpdate {
    fn update(&mut self, callback: &dyn Fn(Position) -> Position);
}

/// No cursor to keep in sync
impl CursorUpdate for () {
    fn update(&mut self, _callback: &dyn Fn(Position) -> Position) {}
}

/// Deferred selection coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorRecord {
    pub anchor: Position,
    pub focus: Position,
}

impl CursorRecord {
    pub fn new(selection: Selection) -> Self {
        Self {
            anchor: selection.anchor,
            focus: selection.focus,
        }
    }

    pub fn selection(&self) -> Selection {
        Selection::new(self.anchor, self.focus)
    }
}

impl CursorUpdate for CursorRecord {
    fn update(&mut self, callback: &dyn Fn(Position) -> Position) {
        self.anchor = callback(self.anchor);
        self.focus = callback(self.focus);
    }
}

impl CursorUpdate for Selection {
    fn update(&mut self, callback: &dyn Fn(Position) -> Position) {
        self.anchor = callback(self.anchor);
        self.focus = callback(self.focus);
    }
}

/// Absent selection: nothing to move
impl<T: CursorUpdate> CursorUpdate for Option<T> {
    fn update(&mut self, callback: &dyn Fn(Position) -> Position) {
        if let Some(inner) = self {
            inner.update(callback);
        }
    }
}

impl<T: CursorUpdate + ?Sized> CursorUpdate for &mut T {
    fn update(&mut self, callback: &dyn Fn(Position) -> Position) {
        (**self).update(callback);
    }
}

impl<A: CursorUpdate, B: CursorUpdate> CursorUpdate for (A, B) {
    fn update(&mut self, callback: &dyn Fn(Position) -> Position) {
        self.0.update(callback);
        self.1.update(callback);
    }
}

/// Several records updated together
impl<T: CursorUpdate> CursorUpdate for Vec<T> {
    fn update(&mut self, callback: &dyn Fn(Position) -> Position) {
        for record in self.iter_mut() {
            record.update(callback);
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Slot {
    parent: NodeId,
    index: usize,
}

impl Slot {
    fn of(dom: &Dom, node: NodeId) -> Option<Self> {
        Some(Self {
            parent: dom.parent(node)?,
            index: dom.index_of(node)?,
        })
    }

    /// The node at this slot leaves its parent
    fn shift_out(slot: Option<Slot>, pos: Position) -> Position {
        match slot {
            Some(slot) if pos.node == slot.parent && pos.offset > slot.index => {
                Position::new(pos.node, pos.offset - 1)
            }
            _ => pos,
        }
    }

    /// A node is inserted at this slot
    fn shift_in(slot: Option<Slot>, pos: Position) -> Position {
        match slot {
            Some(slot) if pos.node == slot.parent && pos.offset > slot.index => {
                Position::new(pos.node, pos.offset + 1)
            }
            _ => pos,
        }
    }
}

/// Insertion slot once `node` has been detached from its current place
fn slot_after_detach(removed: Option<Slot>, parent: NodeId, index: usize) -> Slot {
    let index = match removed {
        Some(r) if r.parent == parent && r.index < index => index - 1,
        _ => index,
    };
    Slot { parent, index }
}

pub mod callbacks {
    //! Callback builders, one per primitive tree operation. Each takes the
    //! tree as it is *before* the operation.

    use super::*;

    /// `node` is inserted right before `reference`
    pub fn before(dom: &Dom, node: NodeId, reference: NodeId) -> impl Fn(Position) -> Position {
        let removed = Slot::of(dom, node);
        let inserted = Slot::of(dom, reference)
            .map(|r| slot_after_detach(removed, r.parent, r.index));
        move |pos| Slot::shift_in(inserted, Slot::shift_out(removed, pos))
    }

    /// `node` is inserted right after `reference`
    pub fn after(dom: &Dom, node: NodeId, reference: NodeId) -> impl Fn(Position) -> Position {
        let removed = Slot::of(dom, node);
        let inserted = Slot::of(dom, reference)
            .map(|r| slot_after_detach(removed, r.parent, r.index + 1));
        move |pos| Slot::shift_in(inserted, Slot::shift_out(removed, pos))
    }

    /// `node` is appended to `to`
    pub fn append(dom: &Dom, node: NodeId, _to: NodeId) -> impl Fn(Position) -> Position {
        let removed = Slot::of(dom, node);
        move |pos| Slot::shift_out(removed, pos)
    }

    /// `node` is inserted as first child of `to`
    pub fn prepend(dom: &Dom, node: NodeId, to: NodeId) -> impl Fn(Position) -> Position {
        let removed = Slot::of(dom, node);
        let inserted = Some(Slot { parent: to, index: 0 });
        move |pos| Slot::shift_in(inserted, Slot::shift_out(removed, pos))
    }

    /// `node` and its subtree are removed; carets inside land where it was
    pub fn remove(dom: &Dom, node: NodeId) -> impl Fn(Position) -> Position {
        let slot = Slot::of(dom, node);
        let subtree: HashSet<NodeId> = std::iter::once(node)
            .chain(dom.descendants(node))
            .collect();
        move |pos| match slot {
            Some(slot) if subtree.contains(&pos.node) => Position::new(slot.parent, slot.index),
            _ => Slot::shift_out(slot, pos),
        }
    }

    /// `node` is replaced by its children
    pub fn unwrap(dom: &Dom, node: NodeId) -> impl Fn(Position) -> Position {
        let slot = Slot::of(dom, node);
        let count = dom.child_count(node);
        move |pos| match slot {
            Some(slot) if pos.node == node => Position::new(slot.parent, slot.index + pos.offset),
            Some(slot) if pos.node == slot.parent && pos.offset > slot.index => {
                Position::new(pos.node, pos.offset + count - 1)
            }
            _ => pos,
        }
    }

    /// Every reference to `old` now points at `new`
    pub fn remap(old: NodeId, new: NodeId) -> impl Fn(Position) -> Position {
        move |pos| {
            if pos.node == old {
                Position::new(new, pos.offset)
            } else {
                pos
            }
        }
    }

    /// `element` is replaced by `before` (children `< offset`) and `after`
    pub fn split_element(
        dom: &Dom,
        element: NodeId,
        offset: usize,
        before: NodeId,
        after: NodeId,
    ) -> impl Fn(Position) -> Position {
        let slot = Slot::of(dom, element);
        move |pos| {
            if pos.node == element {
                return if pos.offset < offset {
                    Position::new(before, pos.offset)
                } else {
                    Position::new(after, pos.offset - offset)
                };
            }
            Slot::shift_in(slot, pos)
        }
    }

    /// `right` is appended to the text of `left` and removed
    pub fn merge_text(dom: &Dom, left: NodeId, right: NodeId) -> impl Fn(Position) -> Position {
        let slot = Slot::of(dom, right);
        let len = dom.text_len(left);
        move |pos| match slot {
            _ if pos.node == right => Position::new(left, len + pos.offset),
            Some(slot) if pos.node == slot.parent && pos.offset == slot.index => {
                Position::new(left, len)
            }
            _ => Slot::shift_out(slot, pos),
        }
    }

    /// `text` keeps its first `offset` chars, the rest moves to `right`
    /// which is inserted after it
    pub fn split_text(
        dom: &Dom,
        text: NodeId,
        offset: usize,
        right: NodeId,
    ) -> impl Fn(Position) -> Position {
        let slot = Slot::of(dom, text);
        move |pos| {
            if pos.node == text && pos.offset > offset {
                return Position::new(right, pos.offset - offset);
            }
            Slot::shift_in(slot, pos)
        }
    }
}
