use crate::editor::Editor;
use crate::errors::EditorResult;
use crate::kernel::Plugin;
use crate::plugins::delete::DELETE_PLUGIN;
use crate::plugins::selection::{SetSelectionOptions, SELECTION_PLUGIN};
use crate::resources::{ResourceArgs, ResourceKey};
use scribe_dom::primitives::split_text_node;
use scribe_dom::{callbacks, DomError, NodeId, Position, Selection};
use tracing::{debug, instrument};

pub const LINE_BREAK_PLUGIN: &str = "lineBreak";

pub struct LineBreakPlugin;

impl Plugin for LineBreakPlugin {
    fn id(&self) -> &'static str {
        LINE_BREAK_PLUGIN
    }

    fn dependencies(&self) -> &'static [&'static str] {
        &[SELECTION_PLUGIN, DELETE_PLUGIN]
    }

    fn shared(&self) -> &'static [&'static str] {
        &["insert_line_break", "insert_line_break_node", "insert_line_break_element"]
    }

    fn uses(&self) -> &'static [(&'static str, &'static [&'static str])] {
        &[
            (
                SELECTION_PLUGIN,
                &["get_editable_selection", "set_selection", "update_selection"],
            ),
            (DELETE_PLUGIN, &["delete_selection"]),
        ]
    }
}

/// Where a line break goes: child index `offset` of element `target`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineBreakParams {
    pub target: NodeId,
    pub offset: usize,
}

impl Editor {
    /// Insert a line break at the selection (Shift+Enter)
    #[instrument(skip(self))]
    pub fn insert_line_break(&mut self) -> EditorResult<()> {
        let mut selection = self.get_editable_selection()?;
        if !selection.is_collapsed() {
            self.delete_selection()?;
            selection = self.get_editable_selection()?;
        }
        self.insert_line_break_node(selection.anchor)
    }

    /// Insert a line break at any position; a text node is split first
    pub fn insert_line_break_node(&mut self, position: Position) -> EditorResult<()> {
        let Position { node, offset } = position;
        let params = if self.dom.is_text(node) {
            let parent = self.dom.parent(node).ok_or(DomError::NoParent(node))?;
            let index = split_text_node(&mut self.dom, node, offset, &mut self.selection)?;
            LineBreakParams {
                target: parent,
                offset: index,
            }
        } else {
            LineBreakParams {
                target: node,
                offset,
            }
        };
        self.insert_line_break_element(&params)
    }

    /// Insert exactly one `br` at an element position, unless an override
    /// claims the operation. The caret ends up right after the `br`.
    pub fn insert_line_break_element(&mut self, params: &LineBreakParams) -> EditorResult<()> {
        if self.delegate_to(
            ResourceKey::InsertLineBreakElementOverrides,
            ResourceArgs::LineBreak(params),
        )? {
            return Ok(());
        }
        let br = self.dom.create_element("br");
        match self.dom.child_at(params.target, params.offset) {
            Some(reference) => {
                let callback = callbacks::before(&self.dom, br, reference);
                self.update_selection(&callback);
                self.dom.insert_before(reference, br)?;
            }
            None => self.dom.append_child(params.target, br)?,
        }
        let after = Position::after(&self.dom, br).ok_or(DomError::NoParent(br))?;
        self.set_selection(Selection::collapsed(after), SetSelectionOptions { normalize: true });
        debug!(target = %params.target, offset = params.offset, "line break inserted");
        Ok(())
    }
}
