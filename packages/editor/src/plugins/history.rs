//! # Undo/Redo History
//!
//! Snapshot-based undo log.
//!
//! ## Design
//!
//! - A step stores the tree and selection before and after one edit
//! - Undo restores `before` and moves the step to the redo stack
//! - Redo restores `after`
//! - New steps clear the redo stack
//! - The observer can be paused (nestable); while paused `add_step`
//!   records nothing, so a multi-stage edit commits as one step
//! - Change detection goes through [`Dom::version`]

use crate::editor::Editor;
use crate::errors::EditorResult;
use crate::kernel::Plugin;
use scribe_dom::{Dom, Selection};
use tracing::debug;

pub const HISTORY_PLUGIN: &str = "history";

pub struct HistoryPlugin;

impl Plugin for HistoryPlugin {
    fn id(&self) -> &'static str {
        HISTORY_PLUGIN
    }

    fn shared(&self) -> &'static [&'static str] {
        &["add_step", "disable_observer", "enable_observer", "undo", "redo"]
    }
}

/// Tree and selection at one point in time
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub dom: Dom,
    pub selection: Option<Selection>,
}

/// One undoable edit
#[derive(Debug, Clone)]
pub struct Step {
    pub before: Snapshot,
    pub after: Snapshot,
    pub description: Option<String>,
}

#[derive(Debug)]
pub struct History {
    /// Recorded steps (most recent last)
    undo_stack: Vec<Step>,

    /// Undone steps (most recent last)
    redo_stack: Vec<Step>,

    /// Maximum number of undo levels (0 = unlimited)
    max_levels: usize,

    /// State at the last recorded step
    current: Option<Snapshot>,

    /// Observer pause depth
    paused: usize,
}

impl History {
    pub fn new(max_levels: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_levels,
            current: None,
            paused: 0,
        }
    }

    pub fn disable_observer(&mut self) {
        self.paused += 1;
    }

    pub fn enable_observer(&mut self) {
        self.paused = self.paused.saturating_sub(1);
    }

    pub fn is_observing(&self) -> bool {
        self.paused == 0
    }

    /// Forget every step and start over from `dom`
    pub fn reset(&mut self, dom: &Dom, selection: Option<Selection>) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.current = Some(Snapshot {
            dom: dom.clone(),
            selection,
        });
    }

    /// Record the change since the last step. Returns whether a step was
    /// recorded.
    pub fn add_step(
        &mut self,
        dom: &Dom,
        selection: Option<Selection>,
        description: Option<&str>,
    ) -> bool {
        if !self.is_observing() {
            return false;
        }
        let after = Snapshot {
            dom: dom.clone(),
            selection,
        };
        let Some(before) = self.current.replace(after.clone()) else {
            return false;
        };
        if before.dom.version() == dom.version() {
            return false;
        }
        self.push_step(Step {
            before,
            after,
            description: description.map(str::to_string),
        });
        true
    }

    fn push_step(&mut self, step: Step) {
        self.undo_stack.push(step);

        if self.max_levels > 0 && self.undo_stack.len() > self.max_levels {
            self.undo_stack.remove(0);
        }

        self.redo_stack.clear();
    }

    /// Pop the latest step; returns the state to restore
    pub fn undo(&mut self) -> Option<Snapshot> {
        let step = self.undo_stack.pop()?;
        let restored = step.before.clone();
        self.current = Some(restored.clone());
        self.redo_stack.push(step);
        Some(restored)
    }

    /// Re-apply the latest undone step; returns the state to restore
    pub fn redo(&mut self) -> Option<Snapshot> {
        let step = self.redo_stack.pop()?;
        let restored = step.after.clone();
        self.current = Some(restored.clone());
        self.undo_stack.push(step);
        Some(restored)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_levels(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_levels(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn undo_description(&self) -> Option<&str> {
        self.undo_stack
            .last()
            .and_then(|step| step.description.as_deref())
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(100)
    }
}

impl Editor {
    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn disable_observer(&mut self) {
        self.history.disable_observer();
    }

    pub fn enable_observer(&mut self) {
        self.history.enable_observer();
    }

    /// Commit the changes since the last step as one undo entry
    pub fn add_step(&mut self, description: &str) -> bool {
        self.history
            .add_step(&self.dom, self.selection, Some(description))
    }

    pub(crate) fn reset_history(&mut self) {
        self.history.reset(&self.dom, self.selection);
    }

    pub fn undo(&mut self) -> EditorResult<bool> {
        let Some(snapshot) = self.history.undo() else {
            return Ok(false);
        };
        debug!(levels = self.history.undo_levels(), "undo");
        self.dom = snapshot.dom;
        self.selection = snapshot.selection;
        Ok(true)
    }

    pub fn redo(&mut self) -> EditorResult<bool> {
        let Some(snapshot) = self.history.redo() else {
            return Ok(false);
        };
        debug!(levels = self.history.redo_levels(), "redo");
        self.dom = snapshot.dom;
        self.selection = snapshot.selection;
        Ok(true)
    }
}
