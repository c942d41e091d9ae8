//! # Editable Tree
//!
//! Arena of element, text and fragment nodes. Structure is stored as parent
//! links plus ordered child vectors; every mutation bumps [`Dom::version`]
//! so observers (history) can tell whether anything changed.
//!
//! ## Reference validity
//!
//! - `detach` keeps the node alive so it can be reinserted elsewhere
//! - `destroy` frees the node and its subtree; the ids become stale
//! - read accessors answer `None` / empty for stale ids
//! - mutators answer [`DomError::StaleNode`]

use crate::error::{DomError, DomResult};
use crate::node::{NodeData, NodeId, NodeKind, NodeSnapshot};
use crate::position::Position;
use std::cmp::Ordering;

/// Arena-backed document tree
#[derive(Debug, Clone, Default)]
pub struct Dom {
    nodes: Vec<Option<NodeData>>,
    version: u64,
}

impl Dom {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mutation counter, incremented by every structural or content change
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Number of live nodes
    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn touch(&mut self) {
        self.version += 1;
    }

    fn alloc(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Some(NodeData::new(kind)));
        self.touch();
        id
    }

    fn data(&self, id: NodeId) -> Option<&NodeData> {
        self.nodes.get(id.index()).and_then(|slot| slot.as_ref())
    }

    fn data_mut(&mut self, id: NodeId) -> DomResult<&mut NodeData> {
        self.nodes
            .get_mut(id.index())
            .and_then(|slot| slot.as_mut())
            .ok_or(DomError::StaleNode(id))
    }

    // ---------------------------------------------------------------------
    // Creation
    // ---------------------------------------------------------------------

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.alloc(NodeKind::element(tag))
    }

    /// Element created with its attributes already set
    pub fn create_element_with(&mut self, tag: &str, attributes: &[(&str, &str)]) -> NodeId {
        self.alloc(NodeKind::Element {
            tag: tag.to_ascii_lowercase(),
            attributes: attributes
                .iter()
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect(),
        })
    }

    pub fn create_text(&mut self, content: impl Into<String>) -> NodeId {
        self.alloc(NodeKind::text(content))
    }

    pub fn create_fragment(&mut self) -> NodeId {
        self.alloc(NodeKind::Fragment)
    }

    /// Copy of `id` without children (same tag and attributes)
    pub fn clone_shallow(&mut self, id: NodeId) -> DomResult<NodeId> {
        let kind = self.data(id).ok_or(DomError::StaleNode(id))?.kind.clone();
        Ok(self.alloc(kind))
    }

    /// Detached copy of the whole subtree rooted at `id`
    pub fn clone_deep(&mut self, id: NodeId) -> DomResult<NodeId> {
        let copy = self.clone_shallow(id)?;
        for child in self.children(id).to_vec() {
            let child_copy = self.clone_deep(child)?;
            self.append_child(copy, child_copy)?;
        }
        Ok(copy)
    }

    // ---------------------------------------------------------------------
    // Node payload
    // ---------------------------------------------------------------------

    pub fn exists(&self, id: NodeId) -> bool {
        self.data(id).is_some()
    }

    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.data(id).map(|data| &data.kind)
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.kind(id), Some(NodeKind::Element { .. }))
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        matches!(self.kind(id), Some(NodeKind::Text { .. }))
    }

    pub fn is_fragment(&self, id: NodeId) -> bool {
        matches!(self.kind(id), Some(NodeKind::Fragment))
    }

    /// Lower-case tag name of an element
    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match self.kind(id) {
            Some(NodeKind::Element { tag, .. }) => Some(tag.as_str()),
            _ => None,
        }
    }

    pub fn has_tag(&self, id: NodeId, tag: &str) -> bool {
        self.tag(id).is_some_and(|t| t.eq_ignore_ascii_case(tag))
    }

    /// Rename an element in place (attributes and children are kept)
    pub fn rename(&mut self, id: NodeId, tag: &str) -> DomResult<()> {
        match &mut self.data_mut(id)?.kind {
            NodeKind::Element { tag: current, .. } => {
                *current = tag.to_ascii_lowercase();
            }
            _ => return Err(DomError::NotAnElement(id)),
        }
        self.touch();
        Ok(())
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match self.kind(id) {
            Some(NodeKind::Text { content }) => Some(content.as_str()),
            _ => None,
        }
    }

    /// Length of a text node in chars
    pub fn text_len(&self, id: NodeId) -> usize {
        self.text(id).map_or(0, |t| t.chars().count())
    }

    pub fn set_text(&mut self, id: NodeId, value: impl Into<String>) -> DomResult<()> {
        match &mut self.data_mut(id)?.kind {
            NodeKind::Text { content } => *content = value.into(),
            _ => return Err(DomError::NotText(id)),
        }
        self.touch();
        Ok(())
    }

    /// Concatenated text of every descendant text node
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        if let Some(text) = self.text(id) {
            out.push_str(text);
        }
        for &child in self.children(id) {
            self.collect_text(child, out);
        }
    }

    /// Length used by positions: chars for text, child count otherwise
    pub fn node_len(&self, id: NodeId) -> usize {
        if self.is_text(id) {
            self.text_len(id)
        } else {
            self.children(id).len()
        }
    }

    // ---------------------------------------------------------------------
    // Attributes and classes
    // ---------------------------------------------------------------------

    pub fn attributes(&self, id: NodeId) -> &[(String, String)] {
        match self.kind(id) {
            Some(NodeKind::Element { attributes, .. }) => attributes,
            _ => &[],
        }
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.attributes(id)
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn has_attribute(&self, id: NodeId, name: &str) -> bool {
        self.attribute(id, name).is_some()
    }

    pub fn set_attribute(
        &mut self,
        id: NodeId,
        name: &str,
        value: impl Into<String>,
    ) -> DomResult<()> {
        let value = value.into();
        match &mut self.data_mut(id)?.kind {
            NodeKind::Element { attributes, .. } => {
                match attributes.iter_mut().find(|(key, _)| key == name) {
                    Some(entry) => entry.1 = value,
                    None => attributes.push((name.to_string(), value)),
                }
            }
            _ => return Err(DomError::NotAnElement(id)),
        }
        self.touch();
        Ok(())
    }

    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> DomResult<()> {
        match &mut self.data_mut(id)?.kind {
            NodeKind::Element { attributes, .. } => attributes.retain(|(key, _)| key != name),
            _ => return Err(DomError::NotAnElement(id)),
        }
        self.touch();
        Ok(())
    }

    pub fn classes(&self, id: NodeId) -> impl Iterator<Item = &str> {
        self.attribute(id, "class")
            .unwrap_or_default()
            .split_ascii_whitespace()
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.classes(id).any(|c| c == class)
    }

    pub fn add_class(&mut self, id: NodeId, class: &str) -> DomResult<()> {
        if self.has_class(id, class) {
            return Ok(());
        }
        let mut classes: Vec<String> = self.classes(id).map(str::to_string).collect();
        classes.push(class.to_string());
        self.set_attribute(id, "class", classes.join(" "))
    }

    pub fn remove_class(&mut self, id: NodeId, class: &str) -> DomResult<()> {
        if !self.has_class(id, class) {
            return Ok(());
        }
        let classes: Vec<String> = self
            .classes(id)
            .filter(|c| *c != class)
            .map(str::to_string)
            .collect();
        if classes.is_empty() {
            self.remove_attribute(id, "class")
        } else {
            self.set_attribute(id, "class", classes.join(" "))
        }
    }

    // ---------------------------------------------------------------------
    // Structure queries
    // ---------------------------------------------------------------------

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.data(id).and_then(|data| data.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.data(id).map_or(&[], |data| data.children.as_slice())
    }

    pub fn child_count(&self, id: NodeId) -> usize {
        self.children(id).len()
    }

    pub fn has_children(&self, id: NodeId) -> bool {
        !self.children(id).is_empty()
    }

    pub fn child_at(&self, id: NodeId, index: usize) -> Option<NodeId> {
        self.children(id).get(index).copied()
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).first().copied()
    }

    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).last().copied()
    }

    /// Index of `id` among its parent's children
    pub fn index_of(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|&child| child == id)
    }

    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.index_of(id)?;
        index
            .checked_sub(1)
            .and_then(|i| self.child_at(parent, i))
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.index_of(id)?;
        self.child_at(parent, index + 1)
    }

    /// Ancestors of `id`, nearest first, excluding `id` itself
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            dom: self,
            next: self.parent(id),
        }
    }

    /// True when `ancestor` is `node` or one of its ancestors
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        node == ancestor || self.ancestors(node).any(|a| a == ancestor)
    }

    /// Topmost ancestor of `id` (itself when detached)
    pub fn root_of(&self, id: NodeId) -> NodeId {
        self.ancestors(id).last().unwrap_or(id)
    }

    /// Nearest node, starting from `id` itself, matching `predicate`
    pub fn closest(
        &self,
        id: NodeId,
        predicate: impl Fn(&Dom, NodeId) -> bool,
    ) -> Option<NodeId> {
        std::iter::once(id)
            .chain(self.ancestors(id))
            .find(|&node| predicate(self, node))
    }

    /// Descendants of `id` in document order, excluding `id`
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(self.children(node).iter().rev().copied());
        }
        out
    }

    pub fn first_leaf(&self, id: NodeId) -> NodeId {
        let mut node = id;
        while let Some(child) = self.first_child(node) {
            node = child;
        }
        node
    }

    pub fn last_leaf(&self, id: NodeId) -> NodeId {
        let mut node = id;
        while let Some(child) = self.last_child(node) {
            node = child;
        }
        node
    }

    /// Child indices from the root of the tree down to `id`
    fn path(&self, id: NodeId) -> Vec<usize> {
        let mut path: Vec<usize> = std::iter::once(id)
            .chain(self.ancestors(id))
            .filter_map(|node| self.index_of(node))
            .collect();
        path.reverse();
        path
    }

    /// Boundary-point comparison following the DOM range rules
    pub fn compare_points(&self, a: Position, b: Position) -> Ordering {
        if a.node == b.node {
            return a.offset.cmp(&b.offset);
        }
        if let Some(child) = self.child_towards(a.node, b.node) {
            let index = self.index_of(child).unwrap_or(0);
            return if a.offset <= index {
                Ordering::Less
            } else {
                Ordering::Greater
            };
        }
        if self.child_towards(b.node, a.node).is_some() {
            return self.compare_points(b, a).reverse();
        }
        let root_a = self.root_of(a.node);
        let root_b = self.root_of(b.node);
        if root_a != root_b {
            return root_a.cmp(&root_b);
        }
        self.path(a.node).cmp(&self.path(b.node))
    }

    /// Child of `ancestor` on the way down to `node`, if `ancestor` is a
    /// proper ancestor of `node`
    pub fn child_towards(&self, ancestor: NodeId, node: NodeId) -> Option<NodeId> {
        let mut current = node;
        for parent in self.ancestors(node) {
            if parent == ancestor {
                return Some(current);
            }
            current = parent;
        }
        None
    }

    /// Nearest common inclusive ancestor
    pub fn common_ancestor(&self, a: NodeId, b: NodeId) -> Option<NodeId> {
        std::iter::once(a)
            .chain(self.ancestors(a))
            .find(|&candidate| self.contains(candidate, b))
    }

    pub fn snapshot(&self, id: NodeId) -> Option<NodeSnapshot> {
        let kind = self.kind(id)?.clone();
        Some(NodeSnapshot {
            id,
            kind,
            children: self
                .children(id)
                .iter()
                .filter_map(|&child| self.snapshot(child))
                .collect(),
        })
    }

    // ---------------------------------------------------------------------
    // Structure mutation
    // ---------------------------------------------------------------------

    /// Remove `id` from its parent, keeping it alive. No-op when detached.
    pub fn detach(&mut self, id: NodeId) -> DomResult<()> {
        let Some(parent) = self.data(id).ok_or(DomError::StaleNode(id))?.parent else {
            return Ok(());
        };
        self.data_mut(parent)?.children.retain(|&child| child != id);
        self.data_mut(id)?.parent = None;
        self.touch();
        Ok(())
    }

    /// Insert `node` as child `index` of `parent`. The node is detached
    /// first, so `index` is interpreted against the remaining children.
    pub fn insert_at(&mut self, parent: NodeId, index: usize, node: NodeId) -> DomResult<()> {
        if !self.exists(parent) {
            return Err(DomError::StaleNode(parent));
        }
        if self.contains(node, parent) {
            return Err(DomError::HierarchyRequest { node, parent });
        }
        self.detach(node)?;
        let children = &mut self.data_mut(parent)?.children;
        let index = index.min(children.len());
        children.insert(index, node);
        self.data_mut(node)?.parent = Some(parent);
        self.touch();
        Ok(())
    }

    pub fn append_child(&mut self, parent: NodeId, node: NodeId) -> DomResult<()> {
        self.insert_at(parent, usize::MAX, node)
    }

    pub fn prepend_child(&mut self, parent: NodeId, node: NodeId) -> DomResult<()> {
        self.insert_at(parent, 0, node)
    }

    pub fn insert_before(&mut self, reference: NodeId, node: NodeId) -> DomResult<()> {
        if reference == node {
            return Ok(());
        }
        let parent = self.parent(reference).ok_or(DomError::NoParent(reference))?;
        self.detach(node)?;
        let index = self.index_of(reference).ok_or(DomError::NoParent(reference))?;
        self.insert_at(parent, index, node)
    }

    pub fn insert_after(&mut self, reference: NodeId, node: NodeId) -> DomResult<()> {
        if reference == node {
            return Ok(());
        }
        let parent = self.parent(reference).ok_or(DomError::NoParent(reference))?;
        self.detach(node)?;
        let index = self.index_of(reference).ok_or(DomError::NoParent(reference))?;
        self.insert_at(parent, index + 1, node)
    }

    /// Move every child of `from` to the end of `to`
    pub fn move_children(&mut self, from: NodeId, to: NodeId) -> DomResult<Vec<NodeId>> {
        let moved = self.children(from).to_vec();
        for &child in &moved {
            self.append_child(to, child)?;
        }
        Ok(moved)
    }

    /// Replace the children of `parent` by `children` (previous children are
    /// detached, not destroyed)
    pub fn replace_children(&mut self, parent: NodeId, children: &[NodeId]) -> DomResult<()> {
        for child in self.children(parent).to_vec() {
            self.detach(child)?;
        }
        for &child in children {
            self.append_child(parent, child)?;
        }
        Ok(())
    }

    /// Free `id` and its whole subtree; every id in it becomes stale
    pub fn destroy(&mut self, id: NodeId) -> DomResult<()> {
        self.detach(id)?;
        let mut stack = vec![id];
        while let Some(node) = stack.pop() {
            if let Some(slot) = self.nodes.get_mut(node.index()) {
                if let Some(data) = slot.take() {
                    stack.extend(data.children);
                }
            }
        }
        self.touch();
        Ok(())
    }
}

/// Iterator over the ancestors of a node, nearest first
pub struct Ancestors<'a> {
    dom: &'a Dom,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.dom.parent(current);
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (Dom, NodeId, NodeId, NodeId, NodeId) {
        let mut dom = Dom::new();
        let root = dom.create_element("div");
        let p = dom.create_element("P");
        let a = dom.create_text("ab");
        let b = dom.create_element("b");
        dom.append_child(root, p).unwrap();
        dom.append_child(p, a).unwrap();
        dom.append_child(p, b).unwrap();
        (dom, root, p, a, b)
    }

    #[test]
    fn test_tags_are_lowercase() {
        let (dom, _, p, _, _) = sample();
        assert_eq!(dom.tag(p), Some("p"));
        assert!(dom.has_tag(p, "P"));
    }

    #[test]
    fn test_siblings_and_indices() {
        let (dom, root, p, a, b) = sample();
        assert_eq!(dom.index_of(b), Some(1));
        assert_eq!(dom.next_sibling(a), Some(b));
        assert_eq!(dom.previous_sibling(b), Some(a));
        assert_eq!(dom.previous_sibling(a), None);
        assert_eq!(dom.ancestors(a).collect::<Vec<_>>(), vec![p, root]);
        assert!(dom.contains(root, b));
        assert!(!dom.contains(b, root));
    }

    #[test]
    fn test_insert_moves_existing_node() {
        let (mut dom, _, p, a, b) = sample();
        dom.insert_before(a, b).unwrap();
        assert_eq!(dom.children(p), &[b, a]);
        dom.insert_after(b, a).unwrap();
        assert_eq!(dom.children(p), &[b, a]);
    }

    #[test]
    fn test_insert_rejects_cycles() {
        let (mut dom, root, p, _, _) = sample();
        let result = dom.append_child(p, root);
        assert_eq!(
            result,
            Err(DomError::HierarchyRequest {
                node: root,
                parent: p
            })
        );
    }

    #[test]
    fn test_destroy_makes_subtree_stale() {
        let (mut dom, root, p, a, _) = sample();
        dom.destroy(p).unwrap();
        assert!(!dom.exists(p));
        assert!(!dom.exists(a));
        assert!(dom.children(root).is_empty());
        assert_eq!(dom.set_text(a, "x"), Err(DomError::StaleNode(a)));
    }

    #[test]
    fn test_class_helpers() {
        let (mut dom, _, p, _, _) = sample();
        dom.add_class(p, "one").unwrap();
        dom.add_class(p, "two").unwrap();
        dom.add_class(p, "one").unwrap();
        assert_eq!(dom.attribute(p, "class"), Some("one two"));
        dom.remove_class(p, "one").unwrap();
        dom.remove_class(p, "two").unwrap();
        assert!(!dom.has_attribute(p, "class"));
    }

    #[test]
    fn test_compare_points() {
        let (dom, _, p, a, b) = sample();
        let in_text = Position::new(a, 1);
        let before_b = Position::new(p, 1);
        let inside_b = Position::new(b, 0);
        assert_eq!(dom.compare_points(in_text, before_b), Ordering::Less);
        assert_eq!(dom.compare_points(before_b, inside_b), Ordering::Less);
        assert_eq!(dom.compare_points(Position::new(p, 2), inside_b), Ordering::Greater);
        assert_eq!(dom.compare_points(inside_b, in_text), Ordering::Greater);
    }

    #[test]
    fn test_version_tracks_mutations() {
        let (mut dom, _, p, _, _) = sample();
        let before = dom.version();
        dom.set_attribute(p, "data-x", "1").unwrap();
        assert!(dom.version() > before);
    }
}
