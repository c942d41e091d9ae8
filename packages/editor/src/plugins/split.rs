//! # Split Engine
//!
//! Structural splitting of the tree (the Enter key).
//!
//! ## Outcomes of a block split
//!
//! - [`SplitOutcome::Overridden`]: an override resource claimed the split
//! - [`SplitOutcome::LineBreak`]: the block is unsplittable, a `br` was
//!   inserted inside it instead
//! - [`SplitOutcome::Split`]: the block now has a sibling; only this
//!   outcome carries node handles
//!
//! [`Editor::split_element`] destroys the element it splits. Its id is
//! stale afterwards; callers continue with the returned halves.

use crate::editor::Editor;
use crate::errors::EditorResult;
use crate::kernel::Plugin;
use crate::plugins::base_container::BASE_CONTAINER_PLUGIN;
use crate::plugins::delete::DELETE_PLUGIN;
use crate::plugins::line_break::LINE_BREAK_PLUGIN;
use crate::plugins::selection::SELECTION_PLUGIN;
use crate::resources::{
    Contribution, Disqualifier, ResourceArgs, ResourceBuilder, ResourceKey,
};
use scribe_dom::classify::{closest_block, is_block, is_non_editable, is_visible, UNBREAKABLE_CLASS};
use scribe_dom::primitives::fill_empty;
use scribe_dom::{callbacks, DomError, NodeId, Position};
use tracing::{debug, instrument};

pub const SPLIT_PLUGIN: &str = "split";

pub struct SplitPlugin;

impl Plugin for SplitPlugin {
    fn id(&self) -> &'static str {
        SPLIT_PLUGIN
    }

    fn dependencies(&self) -> &'static [&'static str] {
        &[BASE_CONTAINER_PLUGIN, SELECTION_PLUGIN, LINE_BREAK_PLUGIN, DELETE_PLUGIN]
    }

    fn shared(&self) -> &'static [&'static str] {
        &[
            "is_unsplittable",
            "split_element",
            "split_element_until",
            "split_around_until",
            "split_block",
            "split_block_node",
        ]
    }

    fn uses(&self) -> &'static [(&'static str, &'static [&'static str])] {
        &[
            (BASE_CONTAINER_PLUGIN, &["is_candidate_allow_unsplittable"]),
            (
                SELECTION_PLUGIN,
                &["get_editable_selection", "set_cursor_start", "update_selection"],
            ),
            (LINE_BREAK_PLUGIN, &["insert_line_break_node"]),
            (DELETE_PLUGIN, &["delete_selection", "is_unremovable", "remove_node"]),
        ]
    }

    fn resources(&self, resources: &mut ResourceBuilder) {
        let key = ResourceKey::UnsplittableNodePredicates;
        resources
            // splitting and removing are dual: what cannot go cannot be cut
            .add(key, Contribution::predicate(|editor, node| editor.is_unremovable(node)))
            .add(
                key,
                Contribution::predicate(|editor, node| {
                    editor.dom().has_class(node, UNBREAKABLE_CLASS)
                }),
            )
            .add(
                key,
                Contribution::predicate(|editor, node| {
                    let dom = editor.dom();
                    dom.attribute(node, "contenteditable") == Some("false")
                        && dom.parent(node).is_some_and(|parent| !is_non_editable(dom, parent))
                }),
            )
            .add(
                key,
                Contribution::predicate(|editor, node| {
                    let dom = editor.dom();
                    (dom.has_tag(node, "div") || dom.has_tag(node, "section"))
                        && !editor.is_candidate_allow_unsplittable(node)
                }),
            );
        resources.add(
            ResourceKey::NotEligibleForBaseContainerPredicates,
            Contribution::disqualifier(Disqualifier::Unsplittable, |editor, node| {
                editor.is_unsplittable(node)
            }),
        );
    }
}

/// Arguments of a block split
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitBlockParams {
    /// Node holding the caret (text or element)
    pub target: NodeId,
    pub offset: usize,
    /// Closest block of `target`
    pub block: NodeId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitOutcome {
    Overridden,
    LineBreak,
    Split { before: NodeId, after: NodeId },
}

impl SplitOutcome {
    pub fn halves(self) -> Option<(NodeId, NodeId)> {
        match self {
            SplitOutcome::Split { before, after } => Some((before, after)),
            _ => None,
        }
    }
}

impl Editor {
    pub fn is_unsplittable(&self, node: NodeId) -> bool {
        self.any_predicate(ResourceKey::UnsplittableNodePredicates, node)
    }

    /// Replace `element` by two shallow copies holding its children before
    /// and after `offset` (chars for a text node). `element` is destroyed.
    #[instrument(skip(self))]
    pub fn split_element(&mut self, element: NodeId, offset: usize) -> EditorResult<(NodeId, NodeId)> {
        self.dispatch_to(ResourceKey::CleanHandlers, ResourceArgs::Node(element))?;
        if self.dom.parent(element).is_none() {
            return Err(DomError::NoParent(element).into());
        }

        let (before, after) = match self.dom.text(element).map(str::to_string) {
            Some(content) => {
                let split_at = content
                    .char_indices()
                    .nth(offset)
                    .map_or(content.len(), |(byte, _)| byte);
                let before = self.dom.create_text(&content[..split_at]);
                let after = self.dom.create_text(&content[split_at..]);
                let callback = callbacks::split_element(&self.dom, element, offset, before, after);
                self.update_selection(&callback);
                (before, after)
            }
            None => {
                let before = self.dom.clone_shallow(element)?;
                let after = self.dom.clone_shallow(element)?;
                let children = self.dom.children(element).to_vec();
                let offset = offset.min(children.len());
                let callback = callbacks::split_element(&self.dom, element, offset, before, after);
                self.update_selection(&callback);
                for &child in &children[..offset] {
                    self.dom.append_child(before, child)?;
                }
                for &child in &children[offset..] {
                    self.dom.append_child(after, child)?;
                }
                (before, after)
            }
        };
        self.dom.insert_before(element, before)?;
        self.dom.insert_before(element, after)?;
        self.dom.destroy(element)?;
        Ok((before, after))
    }

    /// Split from `element` upwards until the halves are children of
    /// `limit`. `limit` itself is never split; `element == limit` is a
    /// no-op answering `(element, element)`.
    pub fn split_element_until(
        &mut self,
        element: NodeId,
        offset: usize,
        limit: NodeId,
    ) -> EditorResult<(NodeId, NodeId)> {
        if element == limit {
            return Ok((element, element));
        }
        let (mut before, mut after) = self.split_element(element, offset)?;
        loop {
            let parent = self.dom.parent(after).ok_or(DomError::NoParent(after))?;
            if parent == limit {
                return Ok((before, after));
            }
            let index = self.dom.index_of(after).ok_or(DomError::NoParent(after))?;
            (before, after) = self.split_element(parent, index)?;
        }
    }

    /// Isolate a run of siblings as the only content of a copy of `limit`.
    ///
    /// Answers the copy holding the run, or `limit` unchanged when nothing
    /// had to be split.
    pub fn split_around_until(&mut self, nodes: &[NodeId], limit: NodeId) -> EditorResult<NodeId> {
        let (Some(&first), Some(&last)) = (nodes.first(), nodes.last()) else {
            return Ok(limit);
        };
        let (mut first, mut last) = (first, last);
        loop {
            if first == limit || last == limit {
                return Ok(limit);
            }
            if self.dom.previous_sibling(first).is_some() || self.dom.next_sibling(last).is_some() {
                break;
            }
            let parent = self.dom.parent(first).ok_or(DomError::NoParent(first))?;
            first = parent;
            last = parent;
        }

        let mut limit = limit;
        let mut before_split = None;
        let mut after_split = None;

        let mut after = self.dom.next_sibling(last);
        while let Some(node) = after {
            let parent = self.dom.parent(node).ok_or(DomError::NoParent(node))?;
            if parent == limit {
                break;
            }
            let index = self.dom.index_of(node).ok_or(DomError::NoParent(node))?;
            let (left, _) = self.split_element(parent, index)?;
            after_split = Some(left);
            after = self.dom.next_sibling(left);
        }
        if let Some(node) = after {
            let index = self.dom.index_of(node).ok_or(DomError::NoParent(node))?;
            let (left, _) = self.split_element(limit, index)?;
            after_split = Some(left);
            limit = left;
        }

        let mut before = self.dom.previous_sibling(first);
        while let Some(node) = before {
            let parent = self.dom.parent(node).ok_or(DomError::NoParent(node))?;
            if parent == limit {
                break;
            }
            let index = self.dom.index_of(node).ok_or(DomError::NoParent(node))?;
            let (_, right) = self.split_element(parent, index + 1)?;
            before_split = Some(right);
            before = self.dom.previous_sibling(right);
        }
        if let Some(node) = before {
            let index = self.dom.index_of(node).ok_or(DomError::NoParent(node))?;
            let (_, right) = self.split_element(limit, index + 1)?;
            before_split = Some(right);
        }

        Ok(before_split.or(after_split).unwrap_or(limit))
    }

    /// Split the block holding the selection (Enter)
    #[instrument(skip(self))]
    pub fn split_block(&mut self) -> EditorResult<SplitOutcome> {
        let mut selection = self.get_editable_selection()?;
        if !selection.is_collapsed() {
            self.delete_selection()?;
            selection = self.get_editable_selection()?;
        }
        self.split_block_node(selection.anchor.node, selection.anchor.offset)
    }

    /// Split the closest block of `target` at `offset`, unless an override
    /// claims it
    pub fn split_block_node(&mut self, target: NodeId, offset: usize) -> EditorResult<SplitOutcome> {
        let block = closest_block(&self.dom, target).ok_or(DomError::NoParent(target))?;
        let params = SplitBlockParams {
            target,
            offset,
            block,
        };
        if self.delegate_to(
            ResourceKey::SplitElementBlockOverrides,
            ResourceArgs::SplitBlock(&params),
        )? {
            return Ok(SplitOutcome::Overridden);
        }
        self.split_element_block(&params)
    }

    pub fn split_element_block(&mut self, params: &SplitBlockParams) -> EditorResult<SplitOutcome> {
        let SplitBlockParams {
            target,
            offset,
            block,
        } = *params;
        if self.is_unsplittable(block) {
            debug!(block = %block, "unsplittable block, inserting a line break");
            self.insert_line_break_node(Position::new(target, offset))?;
            return Ok(SplitOutcome::LineBreak);
        }
        let limit = self.dom.parent(block).ok_or(DomError::NoParent(block))?;
        let (before, after) = self.split_element_until(target, offset, limit)?;

        let leaf = self.dom.last_leaf(before);
        self.remove_empty_and_fill(leaf)?;
        let leaf = self.dom.first_leaf(after);
        self.remove_empty_and_fill(leaf)?;

        self.set_cursor_start(after);
        Ok(SplitOutcome::Split { before, after })
    }

    /// Drop an invisible leaf and the ancestors it leaves empty; the first
    /// block reached is filled so it keeps a height
    fn remove_empty_and_fill(&mut self, leaf: NodeId) -> EditorResult<()> {
        let mut node = leaf;
        loop {
            if is_block(&self.dom, node) {
                fill_empty(&mut self.dom, node)?;
                return Ok(());
            }
            if is_visible(&self.dom, node) || self.is_unremovable(node) {
                return Ok(());
            }
            let Some(parent) = self.dom.parent(node) else {
                return Ok(());
            };
            self.remove_node(node)?;
            node = parent;
        }
    }
}
