use crate::node::NodeId;
use thiserror::Error;

pub type DomResult<T> = Result<T, DomError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomError {
    #[error("Node {0} no longer exists")]
    StaleNode(NodeId),

    #[error("Node {0} has no parent")]
    NoParent(NodeId),

    #[error("Node {0} is not an element")]
    NotAnElement(NodeId),

    #[error("Node {0} is not a text node")]
    NotText(NodeId),

    #[error("Offset {offset} is out of bounds for node {node}")]
    OffsetOutOfBounds { node: NodeId, offset: usize },

    #[error("Cannot insert {node} into {parent}: it is an ancestor of the target")]
    HierarchyRequest { node: NodeId, parent: NodeId },

    #[error("Markup error at {pos}: {message}")]
    Markup { pos: usize, message: String },
}

impl DomError {
    pub fn markup(pos: usize, message: impl Into<String>) -> Self {
        Self::Markup {
            pos,
            message: message.into(),
        }
    }
}
