//! # Editor Session
//!
//! Owns the tree, the aggregated resources and the collaborator state. The
//! plugin operations live in `impl Editor` blocks of their own modules
//! (`plugins::split`, `plugins::dom`, ...); this file holds the session
//! state and the command boundary.

use crate::config::EditorConfig;
use crate::errors::{EditorError, EditorResult};
use crate::kernel::{LoadedPlugin, Services};
use crate::plugins::base_container::BaseContainerFactory;
use crate::plugins::dom::InsertContent;
use crate::plugins::history::History;
use crate::resources::{ResourceArgs, ResourceKey, Resources};
use scribe_dom::{
    parse_fragment, NodeId, NodeSnapshot, Selection, SerializeOptions, Serializer,
};
use serde::{Deserialize, Serialize};
use std::rc::Rc;
use tracing::{debug, error, instrument};

/// A user-visible edit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Command {
    SplitBlock,
    InsertLineBreak,
    InsertText { text: String },
    InsertMarkup { markup: String },
    DeleteSelection,
    Normalize,
    Undo,
    Redo,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::SplitBlock => "split_block",
            Command::InsertLineBreak => "insert_line_break",
            Command::InsertText { .. } => "insert_text",
            Command::InsertMarkup { .. } => "insert_markup",
            Command::DeleteSelection => "delete_selection",
            Command::Normalize => "normalize",
            Command::Undo => "undo",
            Command::Redo => "redo",
        }
    }
}

pub struct Editor {
    pub(crate) dom: scribe_dom::Dom,
    pub(crate) editable: NodeId,
    pub(crate) config: EditorConfig,
    pub(crate) resources: Rc<Resources>,
    pub(crate) services: Services,
    pub(crate) plugins: Vec<LoadedPlugin>,
    pub(crate) base_container: BaseContainerFactory,
    pub(crate) selection: Option<Selection>,
    pub(crate) history: History,
    destroyed: bool,
}

impl Editor {
    pub(crate) fn new(
        dom: scribe_dom::Dom,
        editable: NodeId,
        config: EditorConfig,
        resources: Rc<Resources>,
        services: Services,
        plugins: Vec<LoadedPlugin>,
        base_container: BaseContainerFactory,
    ) -> Self {
        let history = History::new(config.history_max_levels);
        Self {
            dom,
            editable,
            config,
            resources,
            services,
            plugins,
            base_container,
            selection: None,
            history,
            destroyed: false,
        }
    }

    pub fn dom(&self) -> &scribe_dom::Dom {
        &self.dom
    }

    pub fn dom_mut(&mut self) -> &mut scribe_dom::Dom {
        &mut self.dom
    }

    /// Root of the editable content
    pub fn editable(&self) -> NodeId {
        self.editable
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn services(&self) -> &Services {
        &self.services
    }

    pub fn resources(&self) -> &Resources {
        &self.resources
    }

    pub fn base_container(&self) -> BaseContainerFactory {
        self.base_container
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub(crate) fn mark_destroyed(&mut self) {
        self.destroyed = true;
    }

    /// Raw selection, without validity checks
    pub fn selection(&self) -> Option<Selection> {
        self.selection
    }

    pub(crate) fn set_selection_raw(&mut self, selection: Option<Selection>) {
        self.selection = selection;
    }

    /// Run every normalize handler on `root`
    pub fn normalize(&mut self, root: NodeId) -> EditorResult<()> {
        self.dispatch_to(ResourceKey::NormalizeHandlers, ResourceArgs::Node(root))
    }

    /// Content markup with system classes stripped
    pub fn content(&self) -> String {
        let options = SerializeOptions {
            selection: None,
            strip_classes: self.resources.system_classes(),
        };
        Serializer::new(&options).inner(&self.dom, self.editable)
    }

    /// Full markup with `[` `]` selection markers
    pub fn markup_with_selection(&self) -> String {
        let options = SerializeOptions {
            selection: self.selection,
            strip_classes: Vec::new(),
        };
        Serializer::new(&options).inner(&self.dom, self.editable)
    }

    pub fn snapshot(&self) -> Option<NodeSnapshot> {
        self.dom.snapshot(self.editable)
    }

    /// Apply a command as one undoable step.
    ///
    /// The history observer is paused while the command runs, so only the
    /// final state is recorded. On error the tree keeps whatever partial
    /// state it reached.
    #[instrument(skip(self), fields(command = command.name()))]
    pub fn execute(&mut self, command: &Command) -> EditorResult<()> {
        if self.destroyed {
            return Err(EditorError::Destroyed);
        }
        let result = match command {
            Command::Undo => self.undo().map(|_| ()),
            Command::Redo => self.redo().map(|_| ()),
            _ => self.execute_step(command),
        };
        if let Err(err) = &result {
            error!(%err, "command failed");
        }
        result
    }

    fn execute_step(&mut self, command: &Command) -> EditorResult<()> {
        self.history.disable_observer();
        let result = self.run_command(command);
        self.history.enable_observer();
        result?;
        self.normalize(self.editable)?;
        let recorded = self.add_step(command.name());
        debug!(recorded, "command applied");
        Ok(())
    }

    fn run_command(&mut self, command: &Command) -> EditorResult<()> {
        match command {
            Command::SplitBlock => {
                self.split_block()?;
            }
            Command::InsertLineBreak => self.insert_line_break()?,
            Command::InsertText { text } => {
                self.insert(Some(InsertContent::Text(text.clone())))?;
            }
            Command::InsertMarkup { markup } => {
                let parsed = parse_fragment(&mut self.dom, markup)?;
                self.insert(Some(InsertContent::Node(parsed.root)))?;
            }
            Command::DeleteSelection => self.delete_selection()?,
            Command::Normalize => {}
            Command::Undo | Command::Redo => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_json_shape() {
        let command = Command::InsertText {
            text: "hi".to_string(),
        };
        let json = serde_json::to_string(&command).unwrap();
        assert_eq!(json, r#"{"type":"InsertText","text":"hi"}"#);

        let parsed: Command = serde_json::from_str(r#"{"type":"SplitBlock"}"#).unwrap();
        assert_eq!(parsed, Command::SplitBlock);
    }
}
