//! Small tree operations shared by the split and insertion engines.
//!
//! Operations that move carets take a [`CursorUpdate`] sink; pass `&mut ()`
//! when no selection has to follow.

use crate::classify::{
    closest_block, is_block, is_empty_block, is_list_item, is_paragraph_related,
    is_self_closing, is_shrunk_block, is_visible, ZWS, ZWS_EMPTY_INLINE_ATTRIBUTE,
};
use crate::cursor::{callbacks, CursorUpdate};
use crate::error::{DomError, DomResult};
use crate::node::NodeId;
use crate::tree::Dom;

/// Rename an element in place. Children and attributes are kept and the id
/// stays valid.
pub fn set_tag_name(dom: &mut Dom, element: NodeId, tag: &str) -> DomResult<NodeId> {
    if !dom.has_tag(element, tag) {
        dom.rename(element, tag)?;
    }
    Ok(element)
}

/// Copy every attribute of `source` onto `target`, overwriting same names
pub fn copy_attributes(dom: &mut Dom, source: NodeId, target: NodeId) -> DomResult<()> {
    for (name, value) in dom.attributes(source).to_vec() {
        dom.set_attribute(target, &name, value)?;
    }
    Ok(())
}

/// Give the closest block of `node` a `br` when it has collapsed to zero
/// height. Returns the added `br`.
pub fn fill_shrunk_phrasing_parent(dom: &mut Dom, node: NodeId) -> DomResult<Option<NodeId>> {
    let Some(block) = closest_block(dom, node) else {
        return Ok(None);
    };
    if dom.is_fragment(block) || !is_shrunk_block(dom, block) {
        return Ok(None);
    }
    let keeps_zws = dom
        .descendants(block)
        .iter()
        .any(|&n| dom.has_attribute(n, ZWS_EMPTY_INLINE_ATTRIBUTE));
    if keeps_zws {
        return Ok(None);
    }
    let br = dom.create_element("br");
    dom.append_child(block, br)?;
    Ok(Some(br))
}

/// Make an empty node tangible: an empty inline element gets a zero-width
/// space, a shrunk block gets a `br`. Returns the filler node.
pub fn fill_empty(dom: &mut Dom, node: NodeId) -> DomResult<Option<NodeId>> {
    let empty_inline = dom.is_element(node)
        && !is_block(dom, node)
        && !is_self_closing(dom, node)
        && !dom.has_children(node)
        && !dom.has_attribute(node, ZWS_EMPTY_INLINE_ATTRIBUTE);
    if empty_inline {
        let zws = dom.create_text(ZWS.to_string());
        dom.append_child(node, zws)?;
        dom.set_attribute(node, ZWS_EMPTY_INLINE_ATTRIBUTE, "")?;
        return Ok(Some(zws));
    }
    fill_shrunk_phrasing_parent(dom, node)
}

/// Remove a trailing `br` of `element` that only ends the last line.
///
/// Kept when it follows another `br` (it is then the visible empty line),
/// when the element is an empty block (it is the placeholder) or when
/// `keep` claims it.
pub fn clean_trailing_br(
    dom: &mut Dom,
    element: NodeId,
    keep: impl Fn(&Dom, NodeId) -> bool,
) -> DomResult<bool> {
    let Some(candidate) = dom.last_child(element) else {
        return Ok(false);
    };
    if !dom.has_tag(candidate, "br") {
        return Ok(false);
    }
    let after_br = dom
        .previous_sibling(candidate)
        .is_some_and(|prev| dom.has_tag(prev, "br"));
    if after_br || is_empty_block(dom, element) || keep(dom, candidate) {
        return Ok(false);
    }
    dom.destroy(candidate)?;
    Ok(true)
}

/// Replace `node` by its children. Returns the moved children.
pub fn unwrap_contents(dom: &mut Dom, node: NodeId) -> DomResult<Vec<NodeId>> {
    let children = dom.children(node).to_vec();
    for &child in &children {
        dom.insert_before(node, child)?;
    }
    dom.destroy(node)?;
    Ok(children)
}

/// Split a text node at a char offset. The original node keeps the left
/// part; no empty text node is ever created.
///
/// Returns the child index in the parent where the split point now lies.
pub fn split_text_node(
    dom: &mut Dom,
    text: NodeId,
    offset: usize,
    cursors: &mut impl CursorUpdate,
) -> DomResult<usize> {
    let index = dom.index_of(text).ok_or(DomError::NoParent(text))?;
    let content = dom.text(text).ok_or(DomError::NotText(text))?.to_string();
    let len = content.chars().count();
    if offset > len {
        return Err(DomError::OffsetOutOfBounds { node: text, offset });
    }
    if offset == 0 {
        return Ok(index);
    }
    if offset < len {
        let split_at = content
            .char_indices()
            .nth(offset)
            .map_or(content.len(), |(byte, _)| byte);
        let right = dom.create_text(&content[split_at..]);
        cursors.update(&callbacks::split_text(dom, text, offset, right));
        dom.insert_after(text, right)?;
        dom.set_text(text, &content[..split_at])?;
    }
    Ok(index + 1)
}

/// Append the content of text node `right` to text node `left`, then
/// destroy `right`
pub fn join_text_nodes(
    dom: &mut Dom,
    left: NodeId,
    right: NodeId,
    cursors: &mut impl CursorUpdate,
) -> DomResult<()> {
    let tail = dom.text(right).ok_or(DomError::NotText(right))?.to_string();
    let head = dom.text(left).ok_or(DomError::NotText(left))?;
    let joined = format!("{head}{tail}");
    cursors.update(&callbacks::merge_text(dom, left, right));
    dom.set_text(left, joined)?;
    dom.destroy(right)?;
    Ok(())
}

/// Flatten every block inside `node` into inline content, however deep.
///
/// A block's children take its place and are flattened in turn, so a list
/// leaves no orphan `li` behind. A paragraph or list item that does not
/// start the content is preceded by a `br` line break.
pub fn make_contents_inline(dom: &mut Dom, node: NodeId) -> DomResult<()> {
    let mut index = 0;
    while let Some(child) = dom.child_at(node, index) {
        if !is_block(dom, child) {
            if dom.is_element(child) {
                make_contents_inline(dom, child)?;
            }
            index += 1;
            continue;
        }
        let starts_line = is_paragraph_related(dom, child) || is_list_item(dom, child);
        let after_br = dom
            .previous_sibling(child)
            .is_some_and(|prev| dom.has_tag(prev, "br"));
        if index > 0 && starts_line && !after_br {
            let br = dom.create_element("br");
            dom.insert_before(child, br)?;
            index += 1;
        }
        for grandchild in dom.children(child).to_vec() {
            dom.insert_before(child, grandchild)?;
        }
        dom.destroy(child)?;
    }
    Ok(())
}

/// Re-wrap the loose inline children of `element` into blocks built by
/// `make_block`.
///
/// Consecutive inline nodes share one block; a `br` ends the current block
/// (or, after a block boundary, becomes an empty line of its own);
/// invisible inline nodes are dropped.
pub fn wrap_inlines_in_blocks(
    dom: &mut Dom,
    element: NodeId,
    mut make_block: impl FnMut(&mut Dom) -> NodeId,
    cursors: &mut impl CursorUpdate,
) -> DomResult<Vec<NodeId>> {
    let children = dom.children(element).to_vec();
    let visible: Vec<bool> = children.iter().map(|&c| is_visible(dom, c)).collect();
    let mut created = Vec::new();
    let mut current: Option<NodeId> = None;
    let mut break_line = true;

    for (node, visible) in children.into_iter().zip(visible) {
        if is_block(dom, node) {
            break_line = true;
        } else if !visible {
            cursors.update(&callbacks::remove(dom, node));
            dom.destroy(node)?;
        } else if dom.has_tag(node, "br") {
            if break_line {
                created.push(wrap_in_block(dom, node, &mut make_block, cursors)?);
            } else {
                cursors.update(&callbacks::remove(dom, node));
                dom.destroy(node)?;
                break_line = true;
            }
        } else if let (false, Some(block)) = (break_line, current) {
            cursors.update(&callbacks::append(dom, node, block));
            dom.append_child(block, node)?;
        } else {
            let block = wrap_in_block(dom, node, &mut make_block, cursors)?;
            created.push(block);
            current = Some(block);
            break_line = false;
        }
    }
    Ok(created)
}

fn wrap_in_block(
    dom: &mut Dom,
    node: NodeId,
    make_block: &mut impl FnMut(&mut Dom) -> NodeId,
    cursors: &mut impl CursorUpdate,
) -> DomResult<NodeId> {
    let block = make_block(dom);
    cursors.update(&callbacks::before(dom, block, node));
    dom.insert_before(node, block)?;
    cursors.update(&callbacks::append(dom, node, block));
    dom.append_child(block, node)?;
    Ok(block)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::CursorRecord;
    use crate::position::{Position, Selection};

    #[test]
    fn test_split_text_node_keeps_left_part() {
        let mut dom = Dom::new();
        let p = dom.create_element("p");
        let text = dom.create_text("héllo");
        dom.append_child(p, text).unwrap();
        let mut record = CursorRecord::new(Selection::collapsed(Position::new(text, 4)));

        let index = split_text_node(&mut dom, text, 2, &mut record).unwrap();
        assert_eq!(index, 1);
        assert_eq!(dom.text(text), Some("hé"));
        let right = dom.child_at(p, 1).unwrap();
        assert_eq!(dom.text(right), Some("llo"));
        assert_eq!(record.anchor, Position::new(right, 2));
    }

    #[test]
    fn test_split_text_node_at_edges_creates_nothing() {
        let mut dom = Dom::new();
        let p = dom.create_element("p");
        let text = dom.create_text("ab");
        dom.append_child(p, text).unwrap();
        assert_eq!(split_text_node(&mut dom, text, 0, &mut ()).unwrap(), 0);
        assert_eq!(split_text_node(&mut dom, text, 2, &mut ()).unwrap(), 1);
        assert_eq!(dom.child_count(p), 1);
        assert!(split_text_node(&mut dom, text, 3, &mut ()).is_err());
    }

    #[test]
    fn test_join_text_nodes_undoes_split() {
        let mut dom = Dom::new();
        let p = dom.create_element("p");
        let text = dom.create_text("abcd");
        dom.append_child(p, text).unwrap();
        split_text_node(&mut dom, text, 1, &mut ()).unwrap();
        let right = dom.child_at(p, 1).unwrap();
        let mut record = CursorRecord::new(Selection::collapsed(Position::new(right, 2)));

        join_text_nodes(&mut dom, text, right, &mut record).unwrap();
        assert_eq!(dom.children(p), &[text]);
        assert_eq!(dom.text(text), Some("abcd"));
        assert!(!dom.exists(right));
        assert_eq!(record.anchor, Position::new(text, 3));
    }

    #[test]
    fn test_clean_trailing_br() {
        let mut dom = Dom::new();
        let p = dom.create_element("p");
        let text = dom.create_text("a");
        let br = dom.create_element("br");
        dom.append_child(p, text).unwrap();
        dom.append_child(p, br).unwrap();
        assert!(clean_trailing_br(&mut dom, p, |_, _| false).unwrap());
        assert_eq!(dom.children(p), &[text]);

        let empty = dom.create_element("p");
        let placeholder = dom.create_element("br");
        dom.append_child(empty, placeholder).unwrap();
        assert!(!clean_trailing_br(&mut dom, empty, |_, _| false).unwrap());
    }

    #[test]
    fn test_copy_attributes_overwrites_same_names() {
        let mut dom = Dom::new();
        let source = dom.create_element_with("p", &[("class", "lead"), ("dir", "rtl")]);
        let target = dom.create_element_with("li", &[("class", "old"), ("id", "keep")]);

        copy_attributes(&mut dom, source, target).unwrap();
        assert_eq!(dom.attribute(target, "class"), Some("lead"));
        assert_eq!(dom.attribute(target, "dir"), Some("rtl"));
        assert_eq!(dom.attribute(target, "id"), Some("keep"));
        assert_eq!(dom.attribute(source, "class"), Some("lead"));

        let text = dom.create_text("t");
        assert!(copy_attributes(&mut dom, source, text).is_err());
    }

    #[test]
    fn test_fill_empty() {
        let mut dom = Dom::new();
        let p = dom.create_element("p");
        let filler = fill_empty(&mut dom, p).unwrap().unwrap();
        assert!(dom.has_tag(filler, "br"));
        assert_eq!(fill_empty(&mut dom, p).unwrap(), None);

        let b = dom.create_element("b");
        let zws = fill_empty(&mut dom, b).unwrap().unwrap();
        assert_eq!(dom.text(zws), Some("\u{200B}"));
        assert!(dom.has_attribute(b, ZWS_EMPTY_INLINE_ATTRIBUTE));
    }

    #[test]
    fn test_make_contents_inline() {
        let mut dom = Dom::new();
        let li = dom.create_element("li");
        for word in ["a", "b"] {
            let p = dom.create_element("p");
            let text = dom.create_text(word);
            dom.append_child(p, text).unwrap();
            dom.append_child(li, p).unwrap();
        }
        make_contents_inline(&mut dom, li).unwrap();
        let tags: Vec<_> = dom
            .children(li)
            .iter()
            .map(|&c| dom.tag(c).unwrap_or("#text"))
            .collect();
        assert_eq!(tags, vec!["#text", "br", "#text"]);
    }

    #[test]
    fn test_make_contents_inline_flattens_nested_lists() {
        let mut dom = Dom::new();
        let holder = dom.create_fragment();
        let list = dom.create_element("ul");
        dom.append_child(holder, list).unwrap();
        let mut texts = Vec::new();
        for word in ["x", "y"] {
            let item = dom.create_element("li");
            let text = dom.create_text(word);
            dom.append_child(item, text).unwrap();
            dom.append_child(list, item).unwrap();
            texts.push(text);
        }
        let nested = dom.create_element("ol");
        let deep = dom.create_element("li");
        let z = dom.create_text("z");
        dom.append_child(deep, z).unwrap();
        dom.append_child(nested, deep).unwrap();
        dom.append_child(list, nested).unwrap();

        make_contents_inline(&mut dom, holder).unwrap();

        let children = dom.children(holder).to_vec();
        assert!(children.iter().all(|&c| !is_block(&dom, c)));
        assert_eq!(children.len(), 5);
        assert_eq!(children[0], texts[0]);
        assert!(dom.has_tag(children[1], "br"));
        assert_eq!(children[2], texts[1]);
        assert!(dom.has_tag(children[3], "br"));
        assert_eq!(children[4], z);
        assert!(!dom.exists(list));
        assert!(!dom.exists(deep));
    }

    #[test]
    fn test_wrap_inlines_in_blocks() {
        let mut dom = Dom::new();
        let root = dom.create_element("div");
        let a = dom.create_text("a");
        let br = dom.create_element("br");
        let b = dom.create_text("b");
        let blank = dom.create_text("  ");
        let h1 = dom.create_element("h1");
        for node in [a, br, b, blank, h1] {
            dom.append_child(root, node).unwrap();
        }
        let mut record = CursorRecord::new(Selection::collapsed(Position::new(root, 5)));

        let created =
            wrap_inlines_in_blocks(&mut dom, root, |dom| dom.create_element("p"), &mut record)
                .unwrap();
        assert_eq!(created.len(), 2);
        assert_eq!(dom.children(root), &[created[0], created[1], h1]);
        assert_eq!(dom.children(created[0]), &[a]);
        assert_eq!(dom.children(created[1]), &[b]);
        assert!(!dom.exists(br));
        assert_eq!(record.anchor, Position::new(root, 3));
    }
}
