//! # Scribe DOM
//!
//! Editable tree used by the Scribe editing engines.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ markup: fixture text (+ [ ] markers) → Dom  │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ tree: arena of element / text / fragment    │
//! │  - stable NodeId handles                    │
//! │  - destroy() makes ids stale                │
//! │  - version counter for observers            │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ primitives + cursor callbacks               │
//! │  - split text, unwrap, wrap inlines         │
//! │  - selection follows every move             │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Ids, not references**: a destroyed node can never be reached again
//! 2. **Classification by tag**: block/inline answers are stable within an edit
//! 3. **Valid markup at every step**: identity markers are plain classes and attributes

pub mod classify;
pub mod cursor;
mod error;
pub mod markup;
mod node;
mod position;
pub mod primitives;
mod serializer;
pub mod tokenizer;
mod tree;
pub mod visitor;

pub use cursor::{callbacks, CursorRecord, CursorUpdate};
pub use error::{DomError, DomResult};
pub use markup::{parse_fragment, parse_into, ParsedMarkup};
pub use node::{NodeId, NodeKind, NodeSnapshot};
pub use position::{normalize_deep, Position, Selection};
pub use serializer::{
    inner_markup, inner_markup_with_selection, outer_markup, SerializeOptions, Serializer,
};
pub use tree::{Ancestors, Dom};
pub use visitor::{ElementCollector, Visitor};
