//! # Resource Registry
//!
//! Typed extension points. Plugins contribute ordered entries per
//! [`ResourceKey`]; the kernel aggregates them once at build time and the
//! registry is immutable for the rest of the session.
//!
//! ## Ordering
//!
//! - Entries are sorted ascending by sequence (default [`DEFAULT_SEQUENCE`])
//! - Ties keep registration order (plugin load order, then contribution order)
//! - Delegation stops at the first handler answering `true`, so specific
//!   overrides must use a lower sequence than generic fallbacks

use crate::editor::Editor;
use crate::errors::{EditorError, EditorResult};
use crate::plugins::line_break::LineBreakParams;
use crate::plugins::split::SplitBlockParams;
use scribe_dom::NodeId;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

pub const DEFAULT_SEQUENCE: i32 = 10;

/// Closed set of extension points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKey {
    UnsplittableNodePredicates,
    UnremovableNodePredicates,
    NotEligibleForBaseContainerPredicates,
    NormalizeHandlers,
    CleanHandlers,
    SplitElementBlockOverrides,
    InsertLineBreakElementOverrides,
    SystemClasses,
}

impl ResourceKey {
    pub fn expected_kind(self) -> ContributionKind {
        match self {
            ResourceKey::UnsplittableNodePredicates | ResourceKey::UnremovableNodePredicates => {
                ContributionKind::Predicate
            }
            ResourceKey::NotEligibleForBaseContainerPredicates => ContributionKind::Disqualifier,
            ResourceKey::NormalizeHandlers | ResourceKey::CleanHandlers => {
                ContributionKind::NodeHandler
            }
            ResourceKey::SplitElementBlockOverrides => ContributionKind::SplitBlockOverride,
            ResourceKey::InsertLineBreakElementOverrides => ContributionKind::LineBreakOverride,
            ResourceKey::SystemClasses => ContributionKind::ClassName,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ResourceKey::UnsplittableNodePredicates => "unsplittable_node_predicates",
            ResourceKey::UnremovableNodePredicates => "unremovable_node_predicates",
            ResourceKey::NotEligibleForBaseContainerPredicates => {
                "not_eligible_for_base_container_predicates"
            }
            ResourceKey::NormalizeHandlers => "normalize_handlers",
            ResourceKey::CleanHandlers => "clean_handlers",
            ResourceKey::SplitElementBlockOverrides => "split_element_block_overrides",
            ResourceKey::InsertLineBreakElementOverrides => "insert_line_break_element_overrides",
            ResourceKey::SystemClasses => "system_classes",
        }
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Reason an element cannot act as a base container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Disqualifier {
    NotAnElement,
    UnsupportedTag,
    Protected,
    Media,
    Unsplittable,
    FlowContent,
    EditionBoundary,
    Custom,
}

impl Disqualifier {
    const fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

/// Explicit selection of disqualifiers consulted by an eligibility check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisqualifierSet(u8);

impl DisqualifierSet {
    pub const ALL: Self = Self(0b1111_1111);

    pub const fn without(self, disqualifier: Disqualifier) -> Self {
        Self(self.0 & !disqualifier.bit())
    }

    pub const fn contains(self, disqualifier: Disqualifier) -> bool {
        self.0 & disqualifier.bit() != 0
    }
}

pub type NodePredicate = Rc<dyn Fn(&Editor, NodeId) -> bool>;
pub type NodeHandler = Rc<dyn Fn(&mut Editor, NodeId) -> EditorResult<()>>;
pub type SplitBlockOverride = Rc<dyn Fn(&mut Editor, &SplitBlockParams) -> EditorResult<bool>>;
pub type LineBreakOverride = Rc<dyn Fn(&mut Editor, &LineBreakParams) -> EditorResult<bool>>;

/// Arguments handed to dispatched or delegated handlers
#[derive(Debug, Clone, Copy)]
pub enum ResourceArgs<'a> {
    Node(NodeId),
    SplitBlock(&'a SplitBlockParams),
    LineBreak(&'a LineBreakParams),
}

/// A single entry contributed to a resource
#[derive(Clone)]
pub enum Contribution {
    Predicate(NodePredicate),
    Disqualifier(Disqualifier, NodePredicate),
    NodeHandler(NodeHandler),
    SplitBlockOverride(SplitBlockOverride),
    LineBreakOverride(LineBreakOverride),
    ClassName(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContributionKind {
    Predicate,
    Disqualifier,
    NodeHandler,
    SplitBlockOverride,
    LineBreakOverride,
    ClassName,
}

impl ContributionKind {
    pub fn name(self) -> &'static str {
        match self {
            ContributionKind::Predicate => "predicate",
            ContributionKind::Disqualifier => "disqualifier",
            ContributionKind::NodeHandler => "node handler",
            ContributionKind::SplitBlockOverride => "split block override",
            ContributionKind::LineBreakOverride => "line break override",
            ContributionKind::ClassName => "class name",
        }
    }
}

impl Contribution {
    pub fn predicate(f: impl Fn(&Editor, NodeId) -> bool + 'static) -> Self {
        Contribution::Predicate(Rc::new(f))
    }

    pub fn disqualifier(kind: Disqualifier, f: impl Fn(&Editor, NodeId) -> bool + 'static) -> Self {
        Contribution::Disqualifier(kind, Rc::new(f))
    }

    pub fn node_handler(f: impl Fn(&mut Editor, NodeId) -> EditorResult<()> + 'static) -> Self {
        Contribution::NodeHandler(Rc::new(f))
    }

    pub fn split_block_override(
        f: impl Fn(&mut Editor, &SplitBlockParams) -> EditorResult<bool> + 'static,
    ) -> Self {
        Contribution::SplitBlockOverride(Rc::new(f))
    }

    pub fn line_break_override(
        f: impl Fn(&mut Editor, &LineBreakParams) -> EditorResult<bool> + 'static,
    ) -> Self {
        Contribution::LineBreakOverride(Rc::new(f))
    }

    pub fn class_name(name: impl Into<String>) -> Self {
        Contribution::ClassName(name.into())
    }

    pub fn kind(&self) -> ContributionKind {
        match self {
            Contribution::Predicate(_) => ContributionKind::Predicate,
            Contribution::Disqualifier(..) => ContributionKind::Disqualifier,
            Contribution::NodeHandler(_) => ContributionKind::NodeHandler,
            Contribution::SplitBlockOverride(_) => ContributionKind::SplitBlockOverride,
            Contribution::LineBreakOverride(_) => ContributionKind::LineBreakOverride,
            Contribution::ClassName(_) => ContributionKind::ClassName,
        }
    }

    /// Run a handler contribution. Predicates, class names and handlers
    /// whose shape does not match `args` answer `false`.
    pub fn invoke(&self, editor: &mut Editor, args: ResourceArgs<'_>) -> EditorResult<bool> {
        match (self, args) {
            (Contribution::NodeHandler(handler), ResourceArgs::Node(node)) => {
                handler(editor, node)?;
                Ok(false)
            }
            (Contribution::SplitBlockOverride(handler), ResourceArgs::SplitBlock(params)) => {
                handler(editor, params)
            }
            (Contribution::LineBreakOverride(handler), ResourceArgs::LineBreak(params)) => {
                handler(editor, params)
            }
            _ => Ok(false),
        }
    }
}

impl fmt::Debug for Contribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Contribution::Disqualifier(kind, _) => write!(f, "Disqualifier({:?})", kind),
            Contribution::ClassName(name) => write!(f, "ClassName({:?})", name),
            other => f.write_str(other.kind().name()),
        }
    }
}

/// Contribution with its ordering metadata
#[derive(Debug, Clone)]
pub struct Entry {
    pub sequence: i32,
    pub plugin: &'static str,
    pub contribution: Contribution,
}

/// Aggregated, immutable registry
#[derive(Debug, Default)]
pub struct Resources {
    entries: HashMap<ResourceKey, Vec<Entry>>,
}

impl Resources {
    /// Ordered entries for `key`; empty for a key nobody contributed to
    pub fn get(&self, key: ResourceKey) -> &[Entry] {
        self.entries.get(&key).map_or(&[], Vec::as_slice)
    }

    pub fn contributions(&self, key: ResourceKey) -> impl Iterator<Item = &Contribution> {
        self.get(key).iter().map(|entry| &entry.contribution)
    }

    /// Class names contributed to [`ResourceKey::SystemClasses`]
    pub fn system_classes(&self) -> Vec<String> {
        self.contributions(ResourceKey::SystemClasses)
            .filter_map(|c| match c {
                Contribution::ClassName(name) => Some(name.clone()),
                _ => None,
            })
            .collect()
    }
}

/// Collects the contributions of every plugin during build
#[derive(Debug, Default)]
pub struct ResourceBuilder {
    plugin: &'static str,
    pending: Vec<(ResourceKey, Entry)>,
}

impl ResourceBuilder {
    pub(crate) fn for_plugin(&mut self, plugin: &'static str) {
        self.plugin = plugin;
    }

    pub fn add(&mut self, key: ResourceKey, contribution: Contribution) -> &mut Self {
        self.add_with_sequence(key, DEFAULT_SEQUENCE, contribution)
    }

    pub fn add_with_sequence(
        &mut self,
        key: ResourceKey,
        sequence: i32,
        contribution: Contribution,
    ) -> &mut Self {
        self.pending.push((
            key,
            Entry {
                sequence,
                plugin: self.plugin,
                contribution,
            },
        ));
        self
    }

    /// Validate every contribution against its key and sort the entries
    pub(crate) fn build(self) -> EditorResult<Resources> {
        let mut entries: HashMap<ResourceKey, Vec<Entry>> = HashMap::new();
        for (key, entry) in self.pending {
            let expected = key.expected_kind();
            let found = entry.contribution.kind();
            if expected != found {
                return Err(EditorError::InvalidContribution {
                    plugin: entry.plugin.to_string(),
                    key: key.to_string(),
                    expected: expected.name(),
                    found: found.name(),
                });
            }
            entries.entry(key).or_default().push(entry);
        }
        for list in entries.values_mut() {
            // stable: ties keep registration order
            list.sort_by_key(|entry| entry.sequence);
        }
        Ok(Resources { entries })
    }
}
