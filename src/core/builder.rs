//! Tree Builder
//!
//! Attaching a node moves it into the receiving tree. When an attach is
//! refused the node comes back inside [`Rejected`] untouched.

use thiserror::Error;

use super::node::{Node, NodeKind};
use crate::error::{Result, TlvError};

/// An attach that was refused, carrying the node that was not attached.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct Rejected {
    pub error: TlvError,
    pub node: Option<Node>,
}

impl Rejected {
    fn new(error: TlvError, node: Option<Node>) -> Self {
        Self { error, node }
    }

    /// Takes back the node that was not attached.
    pub fn into_node(self) -> Option<Node> {
        self.node
    }
}

impl From<Rejected> for TlvError {
    fn from(rejected: Rejected) -> Self {
        rejected.error
    }
}

impl Node {
    /// Links `node` after the last sibling of this chain.
    ///
    /// Returns the attached node. Children are not touched.
    pub fn append_sibling(&mut self, node: Node) -> &mut Node {
        let mut slot = &mut self.next;
        while let Some(next) = slot {
            slot = &mut next.next;
        }
        slot.insert(Box::new(node))
    }

    /// Replaces the sibling chain after this node with `node`.
    ///
    /// The previous chain is released with all of its values.
    pub fn set_next(&mut self, node: Node) -> &mut Node {
        self.next.insert(Box::new(node))
    }

    /// Replaces the child chain with `child`.
    ///
    /// The previous children are released with all of their values.
    pub fn set_child(&mut self, child: Node) -> std::result::Result<&mut Node, Rejected> {
        match &mut self.kind {
            NodeKind::Constructed { child: slot, .. } => {
                Ok(&mut **slot.insert(Box::new(child)))
            }
            NodeKind::Primitive { .. } => Err(Rejected::new(
                TlvError::NotConstructed { tag: self.tag },
                Some(child),
            )),
        }
    }

    /// Appends `child` after the last existing child.
    pub fn append_child(&mut self, child: Node) -> std::result::Result<&mut Node, Rejected> {
        match &mut self.kind {
            NodeKind::Constructed {
                child: Some(first), ..
            } => Ok(first.append_sibling(child)),
            NodeKind::Constructed { child: slot, .. } => {
                Ok(&mut **slot.insert(Box::new(child)))
            }
            NodeKind::Primitive { .. } => Err(Rejected::new(
                TlvError::NotConstructed { tag: self.tag },
                Some(child),
            )),
        }
    }
}

/// Creates an empty constructed node.
pub fn new_constructed(tag: u16) -> Result<Node> {
    Ok(Node::constructed(tag))
}

/// Creates a primitive node; `length` must equal `value.len()`.
pub fn new_primitive(tag: u16, length: u16, value: Vec<u8>) -> Result<Node> {
    if usize::from(length) != value.len() {
        return Err(TlvError::LengthMismatch {
            declared: length.into(),
            actual: value.len(),
        });
    }
    Node::primitive(tag, value)
}

fn require<'a>(
    target: Option<&'a mut Node>,
    node: Option<Node>,
) -> std::result::Result<(&'a mut Node, Node), Rejected> {
    match (target, node) {
        (Some(target), Some(node)) => Ok((target, node)),
        (_, node) => Err(Rejected::new(TlvError::NullArgument, node)),
    }
}

/// Handle-style [`Node::append_sibling`]: fails with `NullArgument` if
/// either side is missing.
pub fn append_sibling<'a>(
    head: Option<&'a mut Node>,
    node: Option<Node>,
) -> std::result::Result<&'a mut Node, Rejected> {
    let (head, node) = require(head, node)?;
    Ok(head.append_sibling(node))
}

/// Handle-style [`Node::set_next`].
pub fn set_next<'a>(
    node: Option<&'a mut Node>,
    next: Option<Node>,
) -> std::result::Result<&'a mut Node, Rejected> {
    let (node, next) = require(node, next)?;
    Ok(node.set_next(next))
}

/// Handle-style [`Node::set_child`].
pub fn set_child<'a>(
    parent: Option<&'a mut Node>,
    child: Option<Node>,
) -> std::result::Result<&'a mut Node, Rejected> {
    let (parent, child) = require(parent, child)?;
    parent.set_child(child)
}

/// Handle-style [`Node::append_child`].
pub fn append_child<'a>(
    parent: Option<&'a mut Node>,
    child: Option<Node>,
) -> std::result::Result<&'a mut Node, Rejected> {
    let (parent, child) = require(parent, child)?;
    parent.append_child(child)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pdo(tag: u16, value: &[u8]) -> Node {
        Node::primitive(tag, value.to_vec()).unwrap()
    }

    #[test]
    fn test_append_sibling_walks_to_end() {
        let mut head = pdo(1, b"a");
        head.append_sibling(pdo(2, b"b"));
        let attached = head.append_sibling(pdo(3, b"c"));
        assert_eq!(attached.tag(), 3);

        let tags: Vec<u16> = head.siblings().map(Node::tag).collect();
        assert_eq!(tags, [1, 2, 3]);
        assert!(head.child().is_none());
    }

    #[test]
    fn test_append_child_keeps_order() {
        let mut root = Node::constructed(1);
        for tag in [10, 11, 12] {
            root.append_child(pdo(tag, &[0])).unwrap();
        }
        let tags: Vec<u16> = root.children().map(Node::tag).collect();
        assert_eq!(tags, [10, 11, 12]);
    }

    #[test]
    fn test_append_child_on_primitive_returns_node() {
        let mut leaf = pdo(1, b"v");
        let rejected = leaf.append_child(pdo(2, b"w")).unwrap_err();
        assert!(matches!(rejected.error, TlvError::NotConstructed { tag: 1 }));

        let back = rejected.into_node().unwrap();
        assert_eq!(back.tag(), 2);
        assert_eq!(back.value(), Some(&b"w"[..]));
        assert!(back.next().is_none());
        assert_eq!(leaf.value(), Some(&b"v"[..]));
        assert!(leaf.child().is_none());
    }

    #[test]
    fn test_set_child_replaces_subtree() {
        let mut root = Node::constructed(1);
        root.append_child(pdo(2, b"old")).unwrap();
        root.append_child(pdo(3, b"old")).unwrap();

        root.set_child(pdo(4, b"new")).unwrap();

        let tags: Vec<u16> = root.children().map(Node::tag).collect();
        assert_eq!(tags, [4]);
        assert!(root.find_by_tag(2).is_none());
        assert!(root.find_by_tag(3).is_none());
    }

    #[test]
    fn test_set_next_replaces_chain() {
        let mut head = pdo(1, b"");
        head.append_sibling(pdo(2, b""));
        head.append_sibling(pdo(3, b""));
        head.set_next(pdo(9, b""));

        let tags: Vec<u16> = head.siblings().map(Node::tag).collect();
        assert_eq!(tags, [1, 9]);
    }

    #[test]
    fn test_handle_functions_report_missing_arguments() {
        let err = append_sibling(None, Some(pdo(1, b""))).unwrap_err();
        assert!(matches!(err.error, TlvError::NullArgument));
        assert_eq!(err.into_node().map(|n| n.tag()), Some(1));

        let mut root = Node::constructed(1);
        let err = append_child(Some(&mut root), None).unwrap_err();
        assert!(matches!(err.error, TlvError::NullArgument));
        assert!(err.node.is_none());

        let err = set_child(None, None).unwrap_err();
        assert!(matches!(TlvError::from(err), TlvError::NullArgument));

        let err = set_next(None, Some(pdo(5, b""))).unwrap_err();
        assert!(matches!(err.error, TlvError::NullArgument));
    }

    #[test]
    fn test_handle_functions_attach() {
        let mut root = new_constructed(1).unwrap();
        let leaf = new_primitive(2, 2, vec![0xAB, 0xCD]).unwrap();
        append_child(Some(&mut root), Some(leaf)).unwrap();
        set_next(Some(&mut root), Some(new_constructed(3).unwrap())).unwrap();

        assert_eq!(root.child().map(Node::tag), Some(2));
        assert_eq!(root.next().map(Node::tag), Some(3));
    }

    #[test]
    fn test_new_primitive_checks_length() {
        let err = new_primitive(1, 3, vec![1, 2]).unwrap_err();
        assert!(matches!(
            err,
            TlvError::LengthMismatch {
                declared: 3,
                actual: 2
            }
        ));
    }
}
