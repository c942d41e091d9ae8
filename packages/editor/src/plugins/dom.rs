//! # Content Insertion
//!
//! Splices text or a fragment into the tree at the selection.
//!
//! ## Pipeline
//!
//! ```text
//! delete selection → split caret text → fill container
//!        ↓
//! unwrap boundary lists → unwrap single wrapper / isolate edges
//!        ↓
//! place edges (fc, lc) → forced split when nothing else is left
//!        ↓
//! insert each remaining node, splitting ancestors that reject blocks
//!        ↓
//! wrap inlines at edition boundaries → prune → place caret → join texts
//! ```
//!
//! The isolated first and last children ("edges") are spliced inline at
//! the caret, so pasting several paragraphs in the middle of a paragraph
//! extends it on both sides instead of dropping blocks inside it.

use crate::editor::Editor;
use crate::errors::EditorResult;
use crate::kernel::Plugin;
use crate::plugins::base_container::BASE_CONTAINER_PLUGIN;
use crate::plugins::delete::DELETE_PLUGIN;
use crate::plugins::line_break::LINE_BREAK_PLUGIN;
use crate::plugins::selection::{SetSelectionOptions, SELECTION_PLUGIN};
use crate::plugins::split::SPLIT_PLUGIN;
use crate::resources::{ResourceArgs, ResourceKey};
use scribe_dom::classify::{
    allows_paragraph_related_elements, closest_block, is_block, is_edition_boundary,
    is_empty_block, is_list, is_list_item, is_non_editable, is_paragraph_related,
    is_self_closing, is_shrunk_block, is_visible, list_mode,
};
use scribe_dom::primitives::{
    clean_trailing_br, fill_empty, join_text_nodes, make_contents_inline, set_tag_name,
    split_text_node, unwrap_contents, wrap_inlines_in_blocks,
};
use scribe_dom::{callbacks, normalize_deep, DomError, NodeId, Position, Selection};
use tracing::{debug, instrument};

pub const DOM_PLUGIN: &str = "dom";

pub struct DomPlugin;

impl Plugin for DomPlugin {
    fn id(&self) -> &'static str {
        DOM_PLUGIN
    }

    fn dependencies(&self) -> &'static [&'static str] {
        &[
            BASE_CONTAINER_PLUGIN,
            SELECTION_PLUGIN,
            SPLIT_PLUGIN,
            DELETE_PLUGIN,
            LINE_BREAK_PLUGIN,
        ]
    }

    fn shared(&self) -> &'static [&'static str] {
        &["insert"]
    }

    fn uses(&self) -> &'static [(&'static str, &'static [&'static str])] {
        &[
            (BASE_CONTAINER_PLUGIN, &["is_candidate_for_base_container"]),
            (
                SELECTION_PLUGIN,
                &["get_editable_selection", "set_selection", "update_selection"],
            ),
            (
                SPLIT_PLUGIN,
                &["is_unsplittable", "split_element", "split_around_until", "split_block_node"],
            ),
            (DELETE_PLUGIN, &["delete_selection", "is_unremovable", "remove_node"]),
            (LINE_BREAK_PLUGIN, &["insert_line_break_node"]),
        ]
    }
}

/// What to insert
#[derive(Debug, Clone, PartialEq)]
pub enum InsertContent {
    /// A single text run
    Text(String),
    /// A detached element, or a fragment whose children are inserted
    Node(NodeId),
}

/// Facts about the insertion point, taken before anything moves
#[derive(Debug, Clone, Copy)]
struct InsertionPoint {
    block: NodeId,
    block_was_empty: bool,
    at_block_start: bool,
    at_block_end: bool,
    anchor_is_editable: bool,
}

impl Editor {
    /// Insert content at the selection. Returns the inserted nodes that
    /// are still part of the tree (text merged into a neighbour is not).
    #[instrument(skip(self, content))]
    pub fn insert(&mut self, content: Option<InsertContent>) -> EditorResult<Vec<NodeId>> {
        let Some(content) = content else {
            return Ok(Vec::new());
        };
        let mut selection = self.get_editable_selection()?;
        if !selection.is_collapsed() {
            self.delete_selection()?;
            selection = self.get_editable_selection()?;
        }
        let anchor = selection.anchor;

        let container = self.dom.create_fragment();
        match content {
            InsertContent::Text(text) => {
                if !text.is_empty() {
                    let node = self.dom.create_text(text);
                    self.dom.append_child(container, node)?;
                }
            }
            InsertContent::Node(node) => {
                self.dispatch_to(ResourceKey::NormalizeHandlers, ResourceArgs::Node(node))?;
                if self.dom.is_fragment(node) {
                    self.dom.move_children(node, container)?;
                    self.dom.destroy(node)?;
                } else {
                    self.dom.append_child(container, node)?;
                }
            }
        }
        if !self.dom.has_children(container) {
            self.dom.destroy(container)?;
            return Ok(Vec::new());
        }

        let block = closest_block(&self.dom, anchor.node).unwrap_or(self.editable);
        let point = InsertionPoint {
            block,
            block_was_empty: is_empty_block(&self.dom, block),
            at_block_start: self.dom.first_leaf(block) == anchor.node && anchor.offset == 0,
            at_block_end: self.dom.last_leaf(block) == anchor.node
                && anchor.offset == self.dom.node_len(anchor.node),
            anchor_is_editable: anchor.node == self.editable,
        };

        let mut insert_before = false;
        let mut start = None;
        if self.dom.is_text(anchor.node) {
            insert_before = anchor.offset == 0;
            split_text_node(&mut self.dom, anchor.node, anchor.offset, &mut self.selection)?;
            start = Some(anchor.node);
        }

        if let Some(last) = self.dom.last_child(container) {
            if self.dom.is_element(last) && is_block(&self.dom, last) && !self.dom.has_children(last) {
                fill_empty(&mut self.dom, last)?;
            }
        }

        self.unwrap_boundary_lists(container, anchor.node)?;

        let first_edge = self.dom.create_fragment();
        let last_edge = self.dom.create_fragment();
        let children = self.dom.children(container).to_vec();
        if let &[only] = children.as_slice() {
            let wrapper = self.dom.has_tag(only, "p")
                || is_list_item(&self.dom, only)
                || self.base_container.matches(&self.dom, only);
            if wrapper && self.should_unwrap(only, &point) {
                unwrap_contents(&mut self.dom, only)?;
            }
        } else if children.len() > 1 {
            if let Some(first) = self.dom.first_child(container) {
                if self.should_unwrap(first, &point) && !point.at_block_start {
                    self.isolate_edge(container, first_edge, true)?;
                }
            }
            if let Some(last) = self.dom.last_child(container) {
                if self.should_unwrap(last, &point) && !point.at_block_end {
                    self.isolate_edge(container, last_edge, false)?;
                }
            }
        }

        let mut placeholder = None;
        let mut current = match start {
            Some(text) => text,
            None if anchor.offset == 0 => {
                let text = self.dom.create_text("");
                if is_self_closing(&self.dom, anchor.node) {
                    self.place(text, anchor.node, true)?;
                } else {
                    let callback = callbacks::prepend(&self.dom, text, anchor.node);
                    self.update_selection(&callback);
                    self.dom.prepend_child(anchor.node, text)?;
                }
                placeholder = Some(text);
                text
            }
            None => self
                .dom
                .child_at(anchor.node, anchor.offset - 1)
                .ok_or(DomError::OffsetOutOfBounds {
                    node: anchor.node,
                    offset: anchor.offset,
                })?,
        };

        let last_nodes = self.dom.children(last_edge).to_vec();
        if !last_nodes.is_empty() {
            self.place_run(current, &last_nodes, insert_before)?;
            if insert_before {
                current = last_nodes[0];
            }
        }
        let first_nodes = self.dom.children(first_edge).to_vec();
        if let Some(&last_first) = first_nodes.last() {
            self.place_run(current, &first_nodes, insert_before)?;
            current = last_first;
            insert_before = false;
        }

        // everything went into the edges: the caret block still has to be
        // cut between them
        if !self.dom.has_children(container) {
            self.force_split_after(current)?;
        }

        let (inserted, removal_candidates) =
            self.insert_remaining(container, &mut current, insert_before)?;

        for holder in [container, first_edge, last_edge] {
            self.dom.destroy(holder)?;
        }

        let all: Vec<NodeId> = first_nodes
            .iter()
            .chain(&inserted)
            .chain(&last_nodes)
            .copied()
            .collect();

        let last = last_nodes
            .last()
            .copied()
            .filter(|&node| self.dom.exists(node))
            .unwrap_or(current);

        if !self.config.allow_inline_at_root {
            self.wrap_loose_inlines(&all)?;
        }
        // after wrapping, so the caret lands inside the block holding `last`
        if self.dom.exists(last) {
            self.place_caret_after(last);
        }

        for candidate in removal_candidates {
            let removable = self.dom.exists(candidate)
                && (is_empty_block(&self.dom, candidate) || !is_visible(&self.dom, candidate))
                && !self.is_unremovable(candidate);
            if removable {
                self.remove_node(candidate)?;
            }
        }

        self.join_inserted_texts(&all)?;
        for node in all.iter().copied().chain(placeholder) {
            if self.dom.exists(node) && self.dom.text(node) == Some("") {
                self.remove_node(node)?;
            }
        }

        self.prune_line_breaks(&point)?;

        let surviving: Vec<NodeId> = all.into_iter().filter(|&n| self.dom.exists(n)).collect();
        debug!(inserted = surviving.len(), "content inserted");
        Ok(surviving)
    }

    fn should_unwrap(&self, node: NodeId, point: &InsertionPoint) -> bool {
        let dom = &self.dom;
        let block = point.block;
        let compatible = dom.tag(node) == dom.tag(block)
            || (self.is_candidate_for_base_container(node)
                && self.is_candidate_for_base_container(block))
            || dom.has_tag(block, "pre")
            || (dom.has_tag(block, "div") && self.is_unsplittable(block));
        (is_paragraph_related(dom, node) || is_list_item(dom, node))
            && !is_empty_block(dom, block)
            && !is_empty_block(dom, node)
            && !is_non_editable(dom, node)
            && !self.is_unsplittable(node)
            && compatible
            && !point.anchor_is_editable
    }

    /// A list at the edge of the content merges into the list holding the
    /// caret when both have the same kind
    fn unwrap_boundary_lists(&mut self, container: NodeId, anchor: NodeId) -> EditorResult<()> {
        let Some(list) = self.dom.closest(anchor, |dom, node| is_list(dom, node)) else {
            return Ok(());
        };
        let mode = list_mode(&self.dom, list);
        for first in [true, false] {
            let edge = if first {
                self.dom.first_child(container)
            } else {
                self.dom.last_child(container)
            };
            if let Some(edge) = edge {
                if is_list(&self.dom, edge) && list_mode(&self.dom, edge) == mode {
                    unwrap_contents(&mut self.dom, edge)?;
                }
            }
        }
        Ok(())
    }

    /// Move the content of the first (or last) child of `container` into
    /// `holder`. For a list item, only its deepest block on that side goes.
    fn isolate_edge(&mut self, container: NodeId, holder: NodeId, first: bool) -> EditorResult<()> {
        let edge_of = |editor: &Editor| {
            if first {
                editor.dom.first_child(container)
            } else {
                editor.dom.last_child(container)
            }
        };
        let Some(edge) = edge_of(self) else {
            return Ok(());
        };
        let mut source = edge;
        if is_list_item(&self.dom, edge) {
            let leaf = if first {
                self.dom.first_leaf(edge)
            } else {
                self.dom.last_leaf(edge)
            };
            let deepest = closest_block(&self.dom, leaf).unwrap_or(edge);
            if deepest != edge {
                self.split_around_until(&[deepest], edge)?;
                source = deepest;
            }
        }
        let piece = edge_of(self).unwrap_or(edge);
        self.dom.move_children(source, holder)?;
        self.dom.destroy(piece)?;
        Ok(())
    }

    /// Move `node` next to `reference`, keeping the selection in sync
    fn place(&mut self, node: NodeId, reference: NodeId, before: bool) -> EditorResult<()> {
        if before {
            let callback = callbacks::before(&self.dom, node, reference);
            self.update_selection(&callback);
            self.dom.insert_before(reference, node)?;
        } else {
            let callback = callbacks::after(&self.dom, node, reference);
            self.update_selection(&callback);
            self.dom.insert_after(reference, node)?;
        }
        Ok(())
    }

    /// Place `nodes` in order on one side of `reference`
    fn place_run(&mut self, reference: NodeId, nodes: &[NodeId], before: bool) -> EditorResult<()> {
        let mut reference = reference;
        if before {
            for &node in nodes.iter().rev() {
                self.place(node, reference, true)?;
                reference = node;
            }
        } else {
            for &node in nodes {
                self.place(node, reference, false)?;
                reference = node;
            }
        }
        Ok(())
    }

    /// Split the caret block right after `current`.
    ///
    /// The split point is the index of the node following `current`,
    /// computed here rather than assumed.
    fn force_split_after(&mut self, current: NodeId) -> EditorResult<()> {
        let Some(next) = self.dom.next_sibling(current) else {
            return Ok(());
        };
        let parent = self.dom.parent(next).ok_or(DomError::NoParent(next))?;
        let index = self.dom.index_of(next).ok_or(DomError::NoParent(next))?;
        let next_block = closest_block(&self.dom, next);
        if next_block.is_some_and(|block| self.is_unsplittable(block)) {
            self.insert_line_break_node(Position::new(parent, index))?;
        } else {
            self.split_block_node(parent, index)?;
        }
        Ok(())
    }

    /// Insert the children of `container` one by one after `current`.
    /// Returns the inserted nodes and the split halves left behind.
    fn insert_remaining(
        &mut self,
        container: NodeId,
        current: &mut NodeId,
        mut insert_before: bool,
    ) -> EditorResult<(Vec<NodeId>, Vec<NodeId>)> {
        let mut inserted = Vec::new();
        let mut removal_candidates = Vec::new();

        'nodes: while let Some(mut node) = self.dom.first_child(container) {
            if is_block(&self.dom, node) && !allows_paragraph_related_elements(&self.dom, *current) {
                while let Some(parent) = self.dom.parent(*current) {
                    let dom = &self.dom;
                    if is_edition_boundary(dom, parent, self.editable) || is_list(dom, parent) {
                        break;
                    }
                    let climb = !allows_paragraph_related_elements(dom, parent)
                        || (is_list_item(dom, parent) && !self.is_unsplittable(node));
                    if !climb {
                        break;
                    }
                    if self.is_unsplittable(parent) {
                        if self.is_unsplittable(node) {
                            *current = parent;
                            continue;
                        }
                        make_contents_inline(&mut self.dom, container)?;
                        match self.dom.first_child(container) {
                            Some(first) => node = first,
                            None => break 'nodes,
                        }
                        break;
                    }
                    let index = self.dom.index_of(*current).ok_or(DomError::NoParent(*current))?;
                    let offset = if insert_before { index } else { index + 1 };
                    if offset > 0 {
                        let (left, right) = self.split_element(parent, offset)?;
                        *current = if insert_before { right } else { left };
                        removal_candidates.push(if insert_before { left } else { right });
                    } else {
                        *current = parent;
                    }
                }
            }

            if is_list_item(&self.dom, *current) && is_paragraph_related(&self.dom, node) {
                set_tag_name(&mut self.dom, node, "li")?;
            } else if self.dom.parent(*current).is_some_and(|p| is_list(&self.dom, p))
                && !is_list_item(&self.dom, node)
            {
                let item = self.dom.create_element("li");
                self.dom.insert_before(node, item)?;
                self.dom.append_child(item, node)?;
                node = item;
            }

            self.place(node, *current, insert_before)?;
            insert_before = false;
            inserted.push(node);

            let shrunk = !self.dom.has_tag(*current, "br") && is_shrunk_block(&self.dom, *current);
            if shrunk && !self.is_unremovable(*current) {
                self.remove_node(*current)?;
            }
            *current = node;
        }
        Ok((inserted, removal_candidates))
    }

    /// Collapse the selection at the end of the inserted content
    fn place_caret_after(&mut self, last: NodeId) {
        let caret = if self.dom.is_text(last) {
            Some(Position::new(last, self.dom.text_len(last)))
        } else if is_block(&self.dom, last) {
            Some(normalize_deep(
                &self.dom,
                Position::new(last, self.dom.node_len(last)),
            ))
        } else {
            Position::after(&self.dom, last)
        };
        if let Some(caret) = caret {
            self.set_selection(Selection::collapsed(caret), SetSelectionOptions { normalize: true });
        }
    }

    /// Edition boundaries never keep raw inline children. Every boundary
    /// that received content is wrapped as a whole, so its older inline
    /// runs are wrapped along with the inserted ones.
    fn wrap_loose_inlines(&mut self, nodes: &[NodeId]) -> EditorResult<()> {
        let mut boundaries: Vec<NodeId> = Vec::new();
        for &node in nodes {
            if !self.dom.exists(node) {
                continue;
            }
            if let Some(parent) = self.dom.parent(node) {
                if is_edition_boundary(&self.dom, parent, self.editable)
                    && !boundaries.contains(&parent)
                {
                    boundaries.push(parent);
                }
            }
        }
        let factory = self.base_container;
        for boundary in boundaries {
            let created = wrap_inlines_in_blocks(
                &mut self.dom,
                boundary,
                |dom| factory.create(dom),
                &mut self.selection,
            )?;
            debug!(boundary = %boundary, blocks = created.len(), "wrapped loose inlines");
        }
        Ok(())
    }

    fn join_inserted_texts(&mut self, nodes: &[NodeId]) -> EditorResult<()> {
        for &node in nodes {
            if !self.dom.is_text(node) {
                continue;
            }
            let mut node = node;
            if let Some(previous) = self.dom.previous_sibling(node) {
                if self.dom.is_text(previous) {
                    join_text_nodes(&mut self.dom, previous, node, &mut self.selection)?;
                    node = previous;
                }
            }
            if let Some(next) = self.dom.next_sibling(node) {
                if self.dom.is_text(next) {
                    join_text_nodes(&mut self.dom, node, next, &mut self.selection)?;
                }
            }
        }
        Ok(())
    }

    /// Drop the line breaks the restructuring made useless
    fn prune_line_breaks(&mut self, point: &InsertionPoint) -> EditorResult<()> {
        let Some(selection) = self.selection else {
            return Ok(());
        };
        let Some(block) = closest_block(&self.dom, selection.anchor.node) else {
            return Ok(());
        };

        // a br right after an unsplittable block is the only way to put
        // the caret there
        let keep = self
            .dom
            .last_child(block)
            .and_then(|br| self.dom.previous_sibling(br))
            .is_some_and(|previous| is_block(&self.dom, previous) && self.is_unsplittable(previous));
        if let Some(br) = self.dom.last_child(block) {
            let callback = callbacks::remove(&self.dom, br);
            if clean_trailing_br(&mut self.dom, block, |_, _| keep)? {
                self.update_selection(&callback);
            }
        }

        if point.block_was_empty && self.dom.exists(point.block) && self.dom.child_count(point.block) > 1 {
            if let Some(first) = self.dom.first_child(point.block) {
                if self.dom.has_tag(first, "br") {
                    self.remove_node(first)?;
                }
            }
        }
        Ok(())
    }
}
