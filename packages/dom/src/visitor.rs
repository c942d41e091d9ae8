use crate::node::{NodeId, NodeKind};
use crate::tree::Dom;

/// Visitor pattern for traversing a tree immutably
///
/// The default implementations walk the entire subtree. Override specific
/// `visit_*` methods to act on nodes; call the matching `walk_*` function
/// to keep descending.
pub trait Visitor: Sized {
    fn visit_node(&mut self, dom: &Dom, id: NodeId) {
        walk_node(self, dom, id);
    }

    fn visit_element(&mut self, dom: &Dom, id: NodeId) {
        walk_children(self, dom, id);
    }

    fn visit_text(&mut self, _dom: &Dom, _id: NodeId) {
        // Leaf node, no children to walk
    }

    fn visit_fragment(&mut self, dom: &Dom, id: NodeId) {
        walk_children(self, dom, id);
    }
}

/// Dispatch to the `visit_*` method matching the node kind. Stale ids are
/// skipped.
pub fn walk_node<V: Visitor>(visitor: &mut V, dom: &Dom, id: NodeId) {
    match dom.kind(id) {
        Some(NodeKind::Element { .. }) => visitor.visit_element(dom, id),
        Some(NodeKind::Text { .. }) => visitor.visit_text(dom, id),
        Some(NodeKind::Fragment) => visitor.visit_fragment(dom, id),
        None => {}
    }
}

pub fn walk_children<V: Visitor>(visitor: &mut V, dom: &Dom, id: NodeId) {
    for &child in dom.children(id) {
        visitor.visit_node(dom, child);
    }
}

/// Collects every element, in document order, that matches a predicate
pub struct ElementCollector<F> {
    predicate: F,
    pub found: Vec<NodeId>,
}

impl<F: Fn(&Dom, NodeId) -> bool> ElementCollector<F> {
    pub fn new(predicate: F) -> Self {
        Self {
            predicate,
            found: Vec::new(),
        }
    }

    /// Collect from `root` (included) downwards
    pub fn collect(mut self, dom: &Dom, root: NodeId) -> Vec<NodeId> {
        self.visit_node(dom, root);
        self.found
    }
}

impl<F: Fn(&Dom, NodeId) -> bool> Visitor for ElementCollector<F> {
    fn visit_element(&mut self, dom: &Dom, id: NodeId) {
        if (self.predicate)(dom, id) {
            self.found.push(id);
        }
        walk_children(self, dom, id);
    }
}
