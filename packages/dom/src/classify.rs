//! Node classification predicates.
//!
//! Block/inline is decided by tag, never by node subtype, so answers stay
//! stable for the whole duration of a mutation.

use crate::node::NodeId;
use crate::tree::Dom;

/// Class carried by `DIV` elements acting as paragraphs
pub const BASE_CONTAINER_CLASS: &str = "o-paragraph";

/// Legacy marker meaning "unsplittable and unmergeable"
pub const UNBREAKABLE_CLASS: &str = "oe_unbreakable";

/// Marker for nodes that must never be removed
pub const UNREMOVABLE_CLASS: &str = "oe_unremovable";

/// Attribute marking a protected subtree (`"false"` re-enables editing)
pub const PROTECTED_ATTRIBUTE: &str = "data-oe-protected";

/// Attribute set on inline elements kept alive by a zero-width space
pub const ZWS_EMPTY_INLINE_ATTRIBUTE: &str = "data-oe-zws-empty-inline";

pub const ZWS: char = '\u{200B}';

const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "body", "dd", "details", "dialog", "div", "dl",
    "dt", "fieldset", "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6",
    "header", "hgroup", "hr", "li", "main", "nav", "ol", "p", "pre", "section", "table", "tbody",
    "td", "tfoot", "th", "thead", "tr", "ul",
];

const PARAGRAPH_RELATED_TAGS: &[&str] = &["p", "h1", "h2", "h3", "h4", "h5", "h6", "blockquote", "pre"];

const FLOW_CONTAINER_TAGS: &[&str] = &[
    "address", "article", "aside", "body", "dd", "details", "dialog", "div", "fieldset", "figure",
    "footer", "form", "header", "li", "main", "nav", "section", "td", "th",
];

const SELF_CLOSING_TAGS: &[&str] = &[
    "area", "br", "col", "embed", "hr", "img", "input", "source", "track", "wbr",
];

const MEDIA_CLASSES: &[&str] = &["fa", "fab", "fad", "far", "oi", "o_image", "media_iframe_video"];

fn tag_in(dom: &Dom, id: NodeId, table: &[&str]) -> bool {
    dom.tag(id).is_some_and(|tag| table.contains(&tag))
}

pub fn is_block(dom: &Dom, id: NodeId) -> bool {
    dom.is_fragment(id) || tag_in(dom, id, BLOCK_TAGS)
}

/// Text or inline element
pub fn is_phrasing(dom: &Dom, id: NodeId) -> bool {
    dom.is_text(id) || (dom.is_element(id) && !is_block(dom, id))
}

pub fn is_paragraph_related(dom: &Dom, id: NodeId) -> bool {
    tag_in(dom, id, PARAGRAPH_RELATED_TAGS)
        || (dom.has_tag(id, "div") && dom.has_class(id, BASE_CONTAINER_CLASS))
}

pub fn is_list(dom: &Dom, id: NodeId) -> bool {
    dom.has_tag(id, "ul") || dom.has_tag(id, "ol")
}

pub fn is_list_item(dom: &Dom, id: NodeId) -> bool {
    dom.has_tag(id, "li")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListMode {
    Bullet,
    Ordered,
    Checklist,
}

pub fn list_mode(dom: &Dom, id: NodeId) -> Option<ListMode> {
    match dom.tag(id)? {
        "ul" if dom.has_class(id, "o_checklist") => Some(ListMode::Checklist),
        "ul" => Some(ListMode::Bullet),
        "ol" => Some(ListMode::Ordered),
        _ => None,
    }
}

pub fn is_self_closing(dom: &Dom, id: NodeId) -> bool {
    tag_in(dom, id, SELF_CLOSING_TAGS)
}

/// Tag that never has children and is written without a closing tag
pub fn is_void_tag(tag: &str) -> bool {
    SELF_CLOSING_TAGS.iter().any(|t| t.eq_ignore_ascii_case(tag))
}

pub fn is_media_element(dom: &Dom, id: NodeId) -> bool {
    MEDIA_CLASSES.iter().any(|class| dom.has_class(id, class))
}

/// Inside a protected subtree (the protecting element itself excluded)
pub fn is_protected(dom: &Dom, id: NodeId) -> bool {
    dom.ancestors(id)
        .find(|&ancestor| dom.has_attribute(ancestor, PROTECTED_ATTRIBUTE))
        .is_some_and(|ancestor| dom.attribute(ancestor, PROTECTED_ATTRIBUTE) != Some("false"))
}

/// Element whose content is protected
pub fn is_protecting(dom: &Dom, id: NodeId) -> bool {
    dom.attribute(id, PROTECTED_ATTRIBUTE)
        .is_some_and(|value| value != "false")
}

/// Closest `contenteditable` declaration says `false`
pub fn is_non_editable(dom: &Dom, id: NodeId) -> bool {
    dom.closest(id, |dom, node| dom.has_attribute(node, "contenteditable"))
        .is_some_and(|node| dom.attribute(node, "contenteditable") == Some("false"))
}

/// Root of editing, or an element explicitly re-enabling edition
pub fn is_edition_boundary(dom: &Dom, id: NodeId, editable: NodeId) -> bool {
    id == editable || dom.attribute(id, "contenteditable") == Some("true")
}

/// Block that may hold paragraphs as children
pub fn allows_paragraph_related_elements(dom: &Dom, id: NodeId) -> bool {
    dom.is_fragment(id)
        || (tag_in(dom, id, FLOW_CONTAINER_TAGS) && !is_paragraph_related(dom, id))
}

/// Has at least one block child
pub fn has_block_children(dom: &Dom, id: NodeId) -> bool {
    dom.children(id).iter().any(|&child| is_block(dom, child))
}

fn has_visible_char(text: &str) -> bool {
    text.chars().any(|c| c != ZWS && !c.is_whitespace())
}

pub fn is_visible_text(dom: &Dom, id: NodeId) -> bool {
    dom.text(id).is_some_and(has_visible_char)
}

/// Text with visible characters, a self-closing or media element, or an
/// element with any visible descendant
pub fn is_visible(dom: &Dom, id: NodeId) -> bool {
    if dom.is_text(id) {
        return is_visible_text(dom, id);
    }
    if is_self_closing(dom, id) || is_media_element(dom, id) {
        return true;
    }
    dom.children(id).iter().any(|&child| is_visible(dom, child))
}

/// Block showing nothing but (at most) a single placeholder line break
pub fn is_empty_block(dom: &Dom, id: NodeId) -> bool {
    if !dom.is_element(id) || is_media_element(dom, id) {
        return false;
    }
    if has_visible_char(&dom.text_content(id)) {
        return false;
    }
    let descendants = dom.descendants(id);
    let line_breaks = descendants
        .iter()
        .filter(|&&node| dom.has_tag(node, "br"))
        .count();
    if line_breaks >= 2 {
        return false;
    }
    !descendants.iter().any(|&node| {
        !dom.has_tag(node, "br") && (is_self_closing(dom, node) || is_media_element(dom, node))
    })
}

/// Block with no content at all to give it a height (not even a `br`)
pub fn is_shrunk_block(dom: &Dom, id: NodeId) -> bool {
    is_block(dom, id)
        && dom.is_element(id)
        && !is_self_closing(dom, id)
        && !has_visible_char(&dom.text_content(id))
        && !dom
            .descendants(id)
            .iter()
            .any(|&node| is_self_closing(dom, node) || is_media_element(dom, node))
}

/// Closest block ancestor, `id` included
pub fn closest_block(dom: &Dom, id: NodeId) -> Option<NodeId> {
    dom.closest(id, |dom, node| dom.is_element(node) && is_block(dom, node))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_and_phrasing() {
        let mut dom = Dom::new();
        let p = dom.create_element("p");
        let b = dom.create_element("b");
        let text = dom.create_text("x");
        assert!(is_block(&dom, p));
        assert!(!is_block(&dom, b));
        assert!(is_phrasing(&dom, b));
        assert!(is_phrasing(&dom, text));
    }

    #[test]
    fn test_base_container_div_is_paragraph_related() {
        let mut dom = Dom::new();
        let div = dom.create_element("div");
        assert!(!is_paragraph_related(&dom, div));
        assert!(allows_paragraph_related_elements(&dom, div));
        dom.add_class(div, BASE_CONTAINER_CLASS).unwrap();
        assert!(is_paragraph_related(&dom, div));
        assert!(!allows_paragraph_related_elements(&dom, div));
    }

    #[test]
    fn test_protection() {
        let mut dom = Dom::new();
        let outer = dom.create_element("div");
        let inner = dom.create_element("p");
        dom.set_attribute(outer, PROTECTED_ATTRIBUTE, "true").unwrap();
        dom.append_child(outer, inner).unwrap();
        assert!(is_protecting(&dom, outer));
        assert!(!is_protected(&dom, outer));
        assert!(is_protected(&dom, inner));

        dom.set_attribute(outer, PROTECTED_ATTRIBUTE, "false").unwrap();
        assert!(!is_protected(&dom, inner));
    }

    #[test]
    fn test_empty_and_shrunk_blocks() {
        let mut dom = Dom::new();
        let p = dom.create_element("p");
        assert!(is_shrunk_block(&dom, p));
        assert!(is_empty_block(&dom, p));

        let br = dom.create_element("br");
        dom.append_child(p, br).unwrap();
        assert!(!is_shrunk_block(&dom, p));
        assert!(is_empty_block(&dom, p));

        let zws = dom.create_text(ZWS.to_string());
        dom.append_child(p, zws).unwrap();
        assert!(is_empty_block(&dom, p));

        let text = dom.create_text("a");
        dom.append_child(p, text).unwrap();
        assert!(!is_empty_block(&dom, p));
    }

    #[test]
    fn test_visibility() {
        let mut dom = Dom::new();
        let span = dom.create_element("span");
        let blank = dom.create_text("  ");
        dom.append_child(span, blank).unwrap();
        assert!(!is_visible(&dom, span));

        let img = dom.create_element("img");
        dom.append_child(span, img).unwrap();
        assert!(is_visible(&dom, span));
    }
}
