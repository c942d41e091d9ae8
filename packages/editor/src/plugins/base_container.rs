//! # Base Container
//!
//! Which element acts as "a paragraph", and which elements may become one.
//!
//! Eligibility is an OR of disqualifiers contributed to
//! [`ResourceKey::NotEligibleForBaseContainerPredicates`]. The variants do
//! not edit that list; they pick a [`DisqualifierSet`]:
//!
//! - full check: every disqualifier
//! - shallow check: skips [`Disqualifier::FlowContent`] (callers already
//!   scanned the children)
//! - allow-unsplittable check: skips [`Disqualifier::Unsplittable`]; the
//!   unsplittable predicates call it, so it must not call them back

use crate::config::EditorConfig;
use crate::editor::Editor;
use crate::errors::{EditorError, EditorResult};
use crate::kernel::Plugin;
use crate::resources::{
    Contribution, Disqualifier, DisqualifierSet, ResourceBuilder, ResourceKey,
};
use scribe_dom::classify::{
    has_block_children, is_edition_boundary, is_media_element, is_protected, is_protecting,
    BASE_CONTAINER_CLASS,
};
use scribe_dom::primitives::fill_shrunk_phrasing_parent;
use scribe_dom::{Dom, ElementCollector, NodeId};
use std::collections::HashSet;
use tracing::{debug, instrument};

pub const BASE_CONTAINER_PLUGIN: &str = "baseContainer";

/// Tags that can carry the base container identity
const SUPPORTED_TAGS: &[&str] = &["p", "div"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseContainerTag {
    P,
    Div,
}

impl BaseContainerTag {
    /// Parse a configured node name (`"P"`, `"DIV"`, any case)
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().as_str() {
            "P" => Some(BaseContainerTag::P),
            "DIV" => Some(BaseContainerTag::Div),
            _ => None,
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            BaseContainerTag::P => "p",
            BaseContainerTag::Div => "div",
        }
    }

    pub fn node_name(self) -> &'static str {
        match self {
            BaseContainerTag::P => "P",
            BaseContainerTag::Div => "DIV",
        }
    }
}

/// Creates and recognizes base containers for one configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BaseContainerFactory {
    tag: BaseContainerTag,
}

impl BaseContainerFactory {
    pub fn new(tag: BaseContainerTag) -> Self {
        Self { tag }
    }

    pub fn from_config(config: &EditorConfig) -> EditorResult<Self> {
        BaseContainerTag::parse(&config.base_container)
            .map(Self::new)
            .ok_or_else(|| {
                EditorError::Config(format!(
                    "unsupported base container '{}'",
                    config.base_container
                ))
            })
    }

    pub fn tag(&self) -> BaseContainerTag {
        self.tag
    }

    /// A fresh, empty, detached base container
    pub fn create(&self, dom: &mut Dom) -> NodeId {
        match self.tag {
            BaseContainerTag::P => dom.create_element("p"),
            BaseContainerTag::Div => {
                dom.create_element_with("div", &[("class", BASE_CONTAINER_CLASS)])
            }
        }
    }

    /// Has the configured identity
    pub fn matches(&self, dom: &Dom, node: NodeId) -> bool {
        match self.tag {
            BaseContainerTag::P => dom.has_tag(node, "p"),
            BaseContainerTag::Div => {
                dom.has_tag(node, "div") && dom.has_class(node, BASE_CONTAINER_CLASS)
            }
        }
    }
}

pub struct BaseContainerPlugin;

impl Plugin for BaseContainerPlugin {
    fn id(&self) -> &'static str {
        BASE_CONTAINER_PLUGIN
    }

    fn shared(&self) -> &'static [&'static str] {
        &[
            "create_base_container",
            "is_candidate_for_base_container",
            "shallow_is_candidate_for_base_container",
            "is_candidate_allow_unsplittable",
        ]
    }

    fn resources(&self, resources: &mut ResourceBuilder) {
        let key = ResourceKey::NotEligibleForBaseContainerPredicates;
        resources
            .add(
                key,
                Contribution::disqualifier(Disqualifier::NotAnElement, |editor, node| {
                    !editor.dom().is_element(node)
                }),
            )
            .add(
                key,
                Contribution::disqualifier(Disqualifier::UnsupportedTag, |editor, node| {
                    !editor
                        .dom()
                        .tag(node)
                        .is_some_and(|tag| SUPPORTED_TAGS.contains(&tag))
                }),
            )
            .add(
                key,
                Contribution::disqualifier(Disqualifier::Protected, |editor, node| {
                    is_protected(editor.dom(), node) || is_protecting(editor.dom(), node)
                }),
            )
            .add(
                key,
                Contribution::disqualifier(Disqualifier::Media, |editor, node| {
                    is_media_element(editor.dom(), node)
                }),
            )
            .add(
                key,
                Contribution::disqualifier(Disqualifier::FlowContent, |editor, node| {
                    has_block_children(editor.dom(), node)
                }),
            )
            // a boundary hosts blocks; it never is one
            .add(
                key,
                Contribution::disqualifier(Disqualifier::EditionBoundary, |editor, node| {
                    is_edition_boundary(editor.dom(), node, editor.editable())
                }),
            );

        // must observe the output of every other normalization
        resources.add_with_sequence(
            ResourceKey::NormalizeHandlers,
            i32::MAX,
            Contribution::node_handler(|editor, root| {
                editor.normalize_div_base_containers(root)?;
                Ok(())
            }),
        );
        resources.add(
            ResourceKey::SystemClasses,
            Contribution::class_name(BASE_CONTAINER_CLASS),
        );
    }
}

impl Editor {
    /// A new detached base container of the configured identity
    pub fn create_base_container(&mut self) -> NodeId {
        let factory = self.base_container;
        factory.create(&mut self.dom)
    }

    fn is_candidate_with(&self, node: NodeId, set: DisqualifierSet) -> bool {
        !self
            .resources
            .contributions(ResourceKey::NotEligibleForBaseContainerPredicates)
            .any(|contribution| match contribution {
                Contribution::Disqualifier(kind, predicate) => {
                    set.contains(*kind) && predicate(self, node)
                }
                _ => false,
            })
    }

    pub fn is_candidate_for_base_container(&self, node: NodeId) -> bool {
        self.is_candidate_with(node, DisqualifierSet::ALL)
    }

    pub fn shallow_is_candidate_for_base_container(&self, node: NodeId) -> bool {
        self.is_candidate_with(node, DisqualifierSet::ALL.without(Disqualifier::FlowContent))
    }

    pub fn is_candidate_allow_unsplittable(&self, node: NodeId) -> bool {
        self.is_candidate_with(node, DisqualifierSet::ALL.without(Disqualifier::Unsplittable))
    }

    /// Mark the eligible `div` elements under `root` (included) as base
    /// containers. Returns the marked elements.
    #[instrument(skip(self))]
    pub fn normalize_div_base_containers(&mut self, root: NodeId) -> EditorResult<Vec<NodeId>> {
        if !self.dom.exists(root) {
            return Ok(Vec::new());
        }
        let targets = ElementCollector::new(|dom: &Dom, node| {
            dom.has_tag(node, "div") && !dom.has_class(node, BASE_CONTAINER_CLASS)
        })
        .collect(&self.dom, root);

        let mut marked: Vec<NodeId> = Vec::new();
        let mut created: HashSet<NodeId> = HashSet::new();
        for div in targets {
            if !self.dom.exists(div) {
                continue;
            }
            if self.dom.ancestors(div).any(|ancestor| created.contains(&ancestor)) {
                continue;
            }
            if !self.shallow_is_candidate_for_base_container(div)
                || has_block_children(&self.dom, div)
            {
                continue;
            }
            self.dom.add_class(div, BASE_CONTAINER_CLASS)?;
            if !self.dom.has_children(div) {
                fill_shrunk_phrasing_parent(&mut self.dom, div)?;
            }
            created.insert(div);
            marked.push(div);
        }
        if !marked.is_empty() {
            debug!(count = marked.len(), "marked base containers");
        }
        Ok(marked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::EditorBuilder;

    fn div_config() -> EditorConfig {
        EditorConfig {
            base_container: "DIV".to_string(),
            ..EditorConfig::default()
        }
    }

    #[test]
    fn test_parse_tag() {
        assert_eq!(BaseContainerTag::parse("p"), Some(BaseContainerTag::P));
        assert_eq!(BaseContainerTag::parse("DIV"), Some(BaseContainerTag::Div));
        assert_eq!(BaseContainerTag::parse("span"), None);
    }

    #[test]
    fn test_factory_creates_configured_identity() {
        let mut dom = Dom::new();
        let factory = BaseContainerFactory::from_config(&div_config()).unwrap();
        let node = factory.create(&mut dom);
        assert!(dom.has_tag(node, "div"));
        assert!(factory.matches(&dom, node));

        let p_factory = BaseContainerFactory::new(BaseContainerTag::P);
        let p = p_factory.create(&mut dom);
        assert!(p_factory.matches(&dom, p));
        assert!(!p_factory.matches(&dom, node));
    }

    #[test]
    fn test_builtin_disqualifiers() {
        let editor = EditorBuilder::new()
            .content(concat!(
                "<p>a</p>",
                "<span>b</span>",
                "<div data-oe-protected=\"true\">c</div>",
                "<p class=\"o_image\"></p>",
                "<p><h1>d</h1></p>",
                "<div contenteditable=\"true\">e</div>",
            ))
            .build()
            .unwrap();
        let children = editor.dom().children(editor.editable()).to_vec();
        let text = editor.dom().first_child(children[0]).unwrap();

        assert!(editor.is_candidate_for_base_container(children[0]));
        assert!(!editor.is_candidate_for_base_container(text));
        assert!(!editor.is_candidate_for_base_container(children[1]));
        assert!(!editor.is_candidate_for_base_container(children[2]));
        assert!(!editor.is_candidate_for_base_container(children[3]));
        assert!(!editor.is_candidate_for_base_container(children[5]));
        assert!(!editor.is_candidate_for_base_container(editor.editable()));

        // flow content only disqualifies in the full check
        assert!(!editor.is_candidate_for_base_container(children[4]));
        assert!(editor.shallow_is_candidate_for_base_container(children[4]));
    }

    #[test]
    fn test_normalize_marks_plain_divs() {
        let mut editor = EditorBuilder::new()
            .content(concat!(
                "<div>plain text</div><div></div><div><p>x</p></div>",
                "<div contenteditable=\"true\">y</div>",
            ))
            .build()
            .unwrap();
        assert_eq!(
            editor.markup_with_selection(),
            concat!(
                "<div class=\"o-paragraph\">plain text</div>",
                "<div class=\"o-paragraph\"><br></div>",
                "<div><p>x</p></div>",
                "<div contenteditable=\"true\">y</div>",
            )
        );
        assert!(!editor.dom().has_class(editor.editable(), BASE_CONTAINER_CLASS));

        let version = editor.dom().version();
        let root = editor.editable();
        let marked = editor.normalize_div_base_containers(root).unwrap();
        assert!(marked.is_empty());
        assert_eq!(editor.dom().version(), version);
    }

    #[test]
    fn test_nested_div_in_fresh_container_is_skipped() {
        let mut editor = EditorBuilder::new().build().unwrap();
        let dom = editor.dom_mut();
        let outer = dom.create_element("div");
        let span = dom.create_element("span");
        let inner = dom.create_element("div");
        let text = dom.create_text("x");
        dom.append_child(outer, span).unwrap();
        dom.append_child(span, inner).unwrap();
        dom.append_child(inner, text).unwrap();

        let marked = editor.normalize_div_base_containers(outer).unwrap();
        assert_eq!(marked, vec![outer]);
        assert!(!editor.dom().has_class(inner, BASE_CONTAINER_CLASS));
    }
}
