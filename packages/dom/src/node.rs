use serde::{Deserialize, Serialize};
use std::fmt;

/// Index of a node slot in a [`Dom`](crate::Dom) arena.
///
/// Ids are never reused. Once a node is destroyed every lookup through its
/// id fails, which is how callers learn that a reference went stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Payload of a tree node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum NodeKind {
    /// Element with a lower-case tag name and ordered attributes
    Element {
        tag: String,
        attributes: Vec<(String, String)>,
    },

    /// Text run
    Text { content: String },

    /// Detached container used to hold content before it is spliced in
    Fragment,
}

impl NodeKind {
    pub fn element(tag: &str) -> Self {
        NodeKind::Element {
            tag: tag.to_ascii_lowercase(),
            attributes: Vec::new(),
        }
    }

    pub fn text(content: impl Into<String>) -> Self {
        NodeKind::Text {
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct NodeData {
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

impl NodeData {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            children: Vec::new(),
        }
    }
}

/// Owned, serializable copy of a subtree (used for JSON dumps and tests)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeSnapshot {
    pub id: NodeId,
    #[serde(flatten)]
    pub kind: NodeKind,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeSnapshot>,
}

#[cfg(test)]
mod tests {
    use crate::tree::Dom;

    #[test]
    fn test_snapshot_serializes_as_tagged_json() {
        let mut dom = Dom::new();
        let p = dom.create_element("p");
        let text = dom.create_text("hi");
        dom.append_child(p, text).unwrap();

        let json = serde_json::to_value(dom.snapshot(p).unwrap()).unwrap();
        assert_eq!(json["type"], "Element");
        assert_eq!(json["tag"], "p");
        assert_eq!(json["children"][0]["type"], "Text");
        assert_eq!(json["children"][0]["content"], "hi");
        assert!(json["children"][0].get("children").is_none());
    }
}
