use crate::editor::Editor;
use crate::errors::EditorResult;
use crate::kernel::Plugin;
use crate::plugins::selection::{SetSelectionOptions, SELECTION_PLUGIN};
use crate::resources::{Contribution, ResourceBuilder, ResourceKey};
use scribe_dom::classify::{closest_block, UNREMOVABLE_CLASS};
use scribe_dom::primitives::{fill_empty, join_text_nodes};
use scribe_dom::{callbacks, NodeId, Position, Selection};
use std::cmp::Ordering;
use tracing::{debug, instrument};

pub const DELETE_PLUGIN: &str = "delete";

pub struct DeletePlugin;

impl Plugin for DeletePlugin {
    fn id(&self) -> &'static str {
        DELETE_PLUGIN
    }

    fn dependencies(&self) -> &'static [&'static str] {
        &[SELECTION_PLUGIN]
    }

    fn shared(&self) -> &'static [&'static str] {
        &["delete_selection", "is_unremovable", "remove_node"]
    }

    fn uses(&self) -> &'static [(&'static str, &'static [&'static str])] {
        &[(
            SELECTION_PLUGIN,
            &[
                "get_editable_selection",
                "set_selection",
                "update_selection",
                "split_selection",
            ],
        )]
    }

    fn resources(&self, resources: &mut ResourceBuilder) {
        resources
            .add(
                ResourceKey::UnremovableNodePredicates,
                Contribution::predicate(|editor, node| node == editor.editable()),
            )
            .add(
                ResourceKey::UnremovableNodePredicates,
                Contribution::predicate(|editor, node| {
                    editor.dom().has_class(node, UNREMOVABLE_CLASS)
                }),
            );
    }
}

impl Editor {
    pub fn is_unremovable(&self, node: NodeId) -> bool {
        self.any_predicate(ResourceKey::UnremovableNodePredicates, node)
    }

    /// Remove the selected content and collapse the selection at its start.
    ///
    /// Unremovable nodes stay (only their content goes). When the range
    /// spans two blocks, the end block is merged into the start block.
    #[instrument(skip(self))]
    pub fn delete_selection(&mut self) -> EditorResult<()> {
        let selection = self.get_editable_selection()?;
        if selection.is_collapsed() {
            return Ok(());
        }
        let (start, end) = self.split_selection()?;
        let start_block = closest_block(&self.dom, start.node);
        let end_block = closest_block(&self.dom, end.node);

        let removable = self.collect_removable(start, end);
        debug!(count = removable.len(), "removing selected nodes");
        for node in removable {
            if self.dom.exists(node) {
                self.dom.destroy(node)?;
            }
        }

        if let (Some(start_block), Some(end_block)) = (start_block, end_block) {
            if self.can_merge_blocks(start_block, end_block) {
                self.merge_blocks(start_block, end_block)?;
            }
            if start_block != self.editable {
                fill_empty(&mut self.dom, start_block)?;
            }
        }

        self.selection = Some(Selection::collapsed(start));
        self.join_texts_around(start)?;
        if let Some(selection) = self.selection {
            self.set_selection(selection, SetSelectionOptions { normalize: true });
        }
        Ok(())
    }

    /// Topmost nodes fully inside `[start, end]`; unremovable nodes are
    /// replaced by their own contained content
    fn collect_removable(&self, start: Position, end: Position) -> Vec<NodeId> {
        let dom = &self.dom;
        let Some(root) = dom.common_ancestor(start.node, end.node) else {
            return Vec::new();
        };
        let mut found = Vec::new();
        let mut stack: Vec<NodeId> = dom.children(root).iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            let (Some(before), Some(after)) = (Position::before(dom, node), Position::after(dom, node))
            else {
                continue;
            };
            let outside = dom.compare_points(after, start) != Ordering::Greater
                || dom.compare_points(before, end) != Ordering::Less;
            if outside {
                continue;
            }
            let contained = dom.compare_points(before, start) != Ordering::Less
                && dom.compare_points(after, end) != Ordering::Greater;
            if contained && !self.is_unremovable(node) {
                found.push(node);
            } else {
                stack.extend(dom.children(node).iter().rev().copied());
            }
        }
        found
    }

    fn can_merge_blocks(&self, start_block: NodeId, end_block: NodeId) -> bool {
        start_block != end_block
            && self.dom.exists(start_block)
            && self.dom.exists(end_block)
            && !self.dom.contains(start_block, end_block)
            && !self.dom.contains(end_block, start_block)
            // split depends on delete, so ask the resource directly
            && !self.any_predicate(ResourceKey::UnsplittableNodePredicates, start_block)
            && !self.any_predicate(ResourceKey::UnsplittableNodePredicates, end_block)
            && !self.is_unremovable(end_block)
    }

    /// Move the content of `end_block` to the end of `start_block`, then
    /// drop `end_block` and the ancestors it leaves empty
    fn merge_blocks(&mut self, start_block: NodeId, end_block: NodeId) -> EditorResult<()> {
        self.dom.move_children(end_block, start_block)?;
        let mut node = end_block;
        loop {
            let parent = self.dom.parent(node);
            self.dom.destroy(node)?;
            match parent {
                Some(parent)
                    if parent != self.editable
                        && !self.dom.has_children(parent)
                        && !self.is_unremovable(parent) =>
                {
                    node = parent;
                }
                _ => break,
            }
        }
        debug!(into = %start_block, "merged blocks");
        Ok(())
    }

    /// Join the text nodes on both sides of an element position
    fn join_texts_around(&mut self, position: Position) -> EditorResult<()> {
        if position.offset == 0 || !self.dom.is_element(position.node) {
            return Ok(());
        }
        let left = self.dom.child_at(position.node, position.offset - 1);
        let right = self.dom.child_at(position.node, position.offset);
        if let (Some(left), Some(right)) = (left, right) {
            if self.dom.is_text(left) && self.dom.is_text(right) {
                join_text_nodes(&mut self.dom, left, right, &mut self.selection)?;
            }
        }
        Ok(())
    }

    /// Remove `node` while keeping the selection valid
    pub(crate) fn remove_node(&mut self, node: NodeId) -> EditorResult<()> {
        let callback = callbacks::remove(&self.dom, node);
        self.update_selection(&callback);
        self.dom.destroy(node)?;
        Ok(())
    }
}
