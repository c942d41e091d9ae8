use crate::editor::Editor;
use crate::errors::{EditorError, EditorResult};
use crate::kernel::Plugin;
use scribe_dom::primitives::split_text_node;
use scribe_dom::{
    normalize_deep, CursorRecord, CursorUpdate, DomError, NodeId, Position, Selection,
};

pub const SELECTION_PLUGIN: &str = "selection";

/// Owns the live selection of the editable
pub struct SelectionPlugin;

impl Plugin for SelectionPlugin {
    fn id(&self) -> &'static str {
        SELECTION_PLUGIN
    }

    fn shared(&self) -> &'static [&'static str] {
        &[
            "get_editable_selection",
            "set_selection",
            "set_cursor_start",
            "set_cursor_end",
            "preserve_selection",
            "restore_selection",
            "update_selection",
            "split_selection",
        ]
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SetSelectionOptions {
    /// Move both ends to the deepest equivalent position
    pub normalize: bool,
}

impl Editor {
    /// Selection, when both ends point inside the editable
    pub fn get_editable_selection(&self) -> EditorResult<Selection> {
        let selection = self.selection.ok_or(EditorError::NoSelection)?;
        let inside = |position: Position| {
            position.is_valid(&self.dom) && self.dom.contains(self.editable, position.node)
        };
        if inside(selection.anchor) && inside(selection.focus) {
            Ok(selection)
        } else {
            Err(EditorError::NoSelection)
        }
    }

    pub fn set_selection(&mut self, selection: Selection, options: SetSelectionOptions) -> Selection {
        let selection = if options.normalize {
            Selection::new(
                normalize_deep(&self.dom, selection.anchor),
                normalize_deep(&self.dom, selection.focus),
            )
        } else {
            selection
        };
        self.selection = Some(selection);
        selection
    }

    /// Collapse the selection at the start of `node`
    pub fn set_cursor_start(&mut self, node: NodeId) -> Selection {
        self.set_selection(
            Selection::collapsed(Position::new(node, 0)),
            SetSelectionOptions { normalize: true },
        )
    }

    /// Collapse the selection at the end of `node`
    pub fn set_cursor_end(&mut self, node: NodeId) -> Selection {
        let end = Position::new(node, self.dom.node_len(node));
        self.set_selection(Selection::collapsed(end), SetSelectionOptions { normalize: true })
    }

    /// Deferred copy of the selection, to be fed cursor callbacks and
    /// restored after a mutation
    pub fn preserve_selection(&self) -> EditorResult<CursorRecord> {
        self.selection
            .map(CursorRecord::new)
            .ok_or(EditorError::NoSelection)
    }

    pub fn restore_selection(&mut self, record: CursorRecord) {
        self.selection = Some(record.selection());
    }

    /// Apply a cursor callback to the live selection
    pub fn update_selection(&mut self, callback: &dyn Fn(Position) -> Position) {
        self.selection.update(callback);
    }

    /// Split the text nodes at both ends of the selection so that it starts
    /// and ends on element positions. Returns `(start, end)`.
    pub fn split_selection(&mut self) -> EditorResult<(Position, Position)> {
        let selection = self.get_editable_selection()?;
        let (start, end) = selection.ordered(&self.dom);
        let forward = selection.is_forward(&self.dom);

        let end = self.to_element_position(end, &mut ())?;
        let mut record = CursorRecord::new(Selection::collapsed(end));
        let start = self.to_element_position(start, &mut record)?;
        let end = record.anchor;

        let selection = if forward {
            Selection::new(start, end)
        } else {
            Selection::new(end, start)
        };
        self.selection = Some(selection);
        Ok((start, end))
    }

    fn to_element_position(
        &mut self,
        position: Position,
        cursors: &mut impl CursorUpdate,
    ) -> EditorResult<Position> {
        if !self.dom.is_text(position.node) {
            return Ok(position);
        }
        let parent = self
            .dom
            .parent(position.node)
            .ok_or(DomError::NoParent(position.node))?;
        let index = split_text_node(&mut self.dom, position.node, position.offset, cursors)?;
        Ok(Position::new(parent, index))
    }
}
