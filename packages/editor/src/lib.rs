//! # Scribe Editor
//!
//! Structural editing core for Scribe: the plugin kernel and the engines
//! that split and splice content in the editable tree.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ kernel: plugins → ordered setup + resources │
//! │  - dependency order, cycle detection        │
//! │  - typed contributions per resource key     │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: tree + selection + history          │
//! │  - commands run as one undoable step        │
//! │  - normalize handlers after every step      │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ plugins: base container, split, insert,     │
//! │          line break, delete, selection      │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Plugins extend through resources**: no plugin reaches into another
//! 2. **Last word to overrides**: the first override that claims an operation wins
//! 3. **Selection survives mutations**: every move reports a cursor callback
//!
//! ## Usage
//!
//! ```rust,ignore
//! use scribe_editor::{Command, EditorBuilder};
//!
//! let mut editor = EditorBuilder::new().content("<p>ab[]cd</p>").build()?;
//! editor.execute(&Command::SplitBlock)?;
//! assert_eq!(editor.markup_with_selection(), "<p>ab</p><p>[]cd</p>");
//! ```

mod config;
mod editor;
mod errors;
mod kernel;
pub mod plugins;
mod resources;

pub use config::{EditorConfig, DEFAULT_CONFIG_NAME};
pub use editor::{Command, Editor};
pub use errors::{EditorError, EditorResult};
pub use kernel::{Cleanup, Dependencies, EditorBuilder, Plugin, PluginContext, Services};
pub use plugins::base_container::{BaseContainerFactory, BaseContainerTag};
pub use plugins::dom::InsertContent;
pub use plugins::history::{History, Snapshot, Step};
pub use plugins::line_break::LineBreakParams;
pub use plugins::selection::SetSelectionOptions;
pub use plugins::split::{SplitBlockParams, SplitOutcome};
pub use resources::{
    Contribution, ContributionKind, Disqualifier, DisqualifierSet, Entry, LineBreakOverride,
    NodeHandler, NodePredicate, ResourceArgs, ResourceBuilder, ResourceKey, Resources,
    SplitBlockOverride, DEFAULT_SEQUENCE,
};

// Re-export the tree types plugins work with
pub use scribe_dom::{Dom, NodeId, Position, Selection};
