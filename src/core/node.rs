//! Tree Node Model
//!
//! A node is either constructed (holds a child chain) or primitive (holds a
//! value). Siblings are linked through `next`; a node owns its first child
//! and its next sibling, so every tree is exclusively owned by its root.
//!
//! Long sibling chains and deep nesting are walked with loops and explicit
//! stacks rather than recursion over `next`.

use std::fmt;
use std::mem;

use crate::dump::Dump;
use crate::error::{Result, TlvError};
use crate::protocol::{NodeType, MAX_ENCODED_SIZE};

/// Variant-specific part of a node
pub(crate) enum NodeKind {
    Constructed {
        child: Option<Box<Node>>,
        /// Encoded size of the child chain, cached by the length pass
        length: u16,
    },
    Primitive {
        value: Vec<u8>,
    },
}

/// One node of a TLV tree together with its following siblings
pub struct Node {
    pub(crate) tag: u16,
    pub(crate) kind: NodeKind,
    pub(crate) next: Option<Box<Node>>,
}

impl Node {
    /// Creates an empty constructed node.
    #[must_use]
    pub fn constructed(tag: u16) -> Self {
        Self {
            tag,
            kind: NodeKind::Constructed {
                child: None,
                length: 0,
            },
            next: None,
        }
    }

    /// Creates a primitive node that takes ownership of `value`.
    ///
    /// Fails with [`TlvError::TooLarge`] if the value cannot be described by
    /// a 16-bit length.
    pub fn primitive(tag: u16, value: Vec<u8>) -> Result<Self> {
        if value.len() > MAX_ENCODED_SIZE {
            return Err(TlvError::TooLarge { len: value.len() });
        }
        Ok(Self {
            tag,
            kind: NodeKind::Primitive { value },
            next: None,
        })
    }

    /// Creates a primitive node holding the UTF-8 bytes of `text`.
    pub fn primitive_str(tag: u16, text: &str) -> Result<Self> {
        Self::primitive(tag, text.as_bytes().to_vec())
    }

    #[inline(always)]
    pub fn tag(&self) -> u16 {
        self.tag
    }

    #[inline(always)]
    pub fn node_type(&self) -> NodeType {
        match self.kind {
            NodeKind::Constructed { .. } => NodeType::Constructed,
            NodeKind::Primitive { .. } => NodeType::Primitive,
        }
    }

    #[inline(always)]
    pub fn is_constructed(&self) -> bool {
        matches!(self.kind, NodeKind::Constructed { .. })
    }

    /// Value byte count for primitives, cached child-chain size for
    /// constructed nodes.
    ///
    /// The constructed value is only current after
    /// [`compute_length`](crate::protocol::compute_length) or a decode.
    #[inline(always)]
    pub fn length(&self) -> u16 {
        match &self.kind {
            NodeKind::Constructed { length, .. } => *length,
            // primitive() rejects values longer than u16::MAX
            NodeKind::Primitive { value } => value.len() as u16,
        }
    }

    /// Value bytes, `None` for constructed nodes.
    #[inline(always)]
    pub fn value(&self) -> Option<&[u8]> {
        match &self.kind {
            NodeKind::Primitive { value } => Some(value),
            NodeKind::Constructed { .. } => None,
        }
    }

    /// First child, `None` for primitives and empty containers.
    #[inline(always)]
    pub fn child(&self) -> Option<&Node> {
        match &self.kind {
            NodeKind::Constructed { child, .. } => child.as_deref(),
            NodeKind::Primitive { .. } => None,
        }
    }

    #[inline(always)]
    pub fn child_mut(&mut self) -> Option<&mut Node> {
        match &mut self.kind {
            NodeKind::Constructed { child, .. } => child.as_deref_mut(),
            NodeKind::Primitive { .. } => None,
        }
    }

    /// Following sibling.
    #[inline(always)]
    pub fn next(&self) -> Option<&Node> {
        self.next.as_deref()
    }

    #[inline(always)]
    pub fn next_mut(&mut self) -> Option<&mut Node> {
        self.next.as_deref_mut()
    }

    /// This node followed by every later sibling.
    pub fn siblings(&self) -> Siblings<'_> {
        Siblings { cur: Some(self) }
    }

    /// Direct children in order.
    pub fn children(&self) -> Siblings<'_> {
        Siblings { cur: self.child() }
    }

    /// Number of nodes reachable from here through child and next links.
    pub fn count(&self) -> usize {
        let mut total = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            total += 1;
            stack.extend(node.next());
            stack.extend(node.child());
        }
        total
    }

    /// Finds the first node carrying `tag`.
    ///
    /// Search order: this node, then the rest of the sibling chain, and only
    /// then the child subtrees, starting from the last sibling and moving
    /// left. Nothing is mutated.
    pub fn find_by_tag(&self, tag: u16) -> Option<&Node> {
        let route = self.find_route(tag)?;
        let mut cur = self;
        for (depth, hops) in route.into_iter().enumerate() {
            if depth > 0 {
                cur = cur.child()?;
            }
            for _ in 0..hops {
                cur = cur.next()?;
            }
        }
        Some(cur)
    }

    /// Mutable variant of [`find_by_tag`](Self::find_by_tag), same order.
    pub fn find_by_tag_mut(&mut self, tag: u16) -> Option<&mut Node> {
        let route = self.find_route(tag)?;
        let mut cur = self;
        for (depth, hops) in route.into_iter().enumerate() {
            if depth > 0 {
                cur = cur.child_mut()?;
            }
            for _ in 0..hops {
                cur = cur.next_mut()?;
            }
        }
        Some(cur)
    }

    /// Locates the node `find_by_tag` returns.
    ///
    /// The route lists, per nesting level, how many `next` links to follow;
    /// a `child` link separates consecutive entries. Chains still to be
    /// searched sit on an explicit stack.
    fn find_route(&self, tag: u16) -> Option<Vec<usize>> {
        // (parent descent, position in the parent chain of the node entered)
        let mut descents: Vec<(Option<usize>, usize)> = Vec::new();
        let mut pending: Vec<(Option<usize>, &Node)> = vec![(None, self)];

        while let Some((at, head)) = pending.pop() {
            let chain: Vec<&Node> = head.siblings().collect();
            if let Some(pos) = chain.iter().position(|n| n.tag == tag) {
                let mut route = vec![pos];
                let mut cur = at;
                while let Some(idx) = cur {
                    let (parent, hops) = descents[idx];
                    route.push(hops);
                    cur = parent;
                }
                route.reverse();
                return Some(route);
            }
            // Pushed left to right so the last sibling's subtree is popped first.
            for (pos, node) in chain.into_iter().enumerate() {
                if let Some(child) = node.child() {
                    descents.push((at, pos));
                    pending.push((Some(descents.len() - 1), child));
                }
            }
        }
        None
    }

    /// Detaches the following sibling chain and returns it.
    pub fn take_next(&mut self) -> Option<Node> {
        self.next.take().map(|b| *b)
    }

    /// Detaches the child chain and returns it, leaving the container empty.
    pub fn take_child(&mut self) -> Option<Node> {
        match &mut self.kind {
            NodeKind::Constructed { child, length } => {
                *length = 0;
                child.take().map(|b| *b)
            }
            NodeKind::Primitive { .. } => None,
        }
    }

    /// Moves the primitive value out, leaving an empty value behind.
    pub(crate) fn take_value(&mut self) -> Option<Vec<u8>> {
        match &mut self.kind {
            NodeKind::Primitive { value } => Some(mem::take(value)),
            NodeKind::Constructed { .. } => None,
        }
    }
}

/// Iterator over a sibling chain
pub struct Siblings<'a> {
    cur: Option<&'a Node>,
}

impl<'a> Iterator for Siblings<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.cur?;
        self.cur = node.next();
        Some(node)
    }
}

/// Releases a tree but hands the primitive values back to the caller.
///
/// Nodes are visited next, then child, then self; the returned buffers
/// follow that order. The slot is left empty, so a second call is a no-op.
pub fn release_shallow(slot: &mut Option<Node>) -> Vec<Vec<u8>> {
    let mut values = Vec::new();
    if let Some(root) = slot.take() {
        collect_values(root, &mut values);
    }
    values
}

fn collect_values(mut node: Node, out: &mut Vec<Vec<u8>>) {
    // next, child, self
    let mut stack = Vec::new();
    loop {
        if let Some(next) = node.take_next() {
            stack.push(node);
            node = next;
            continue;
        }
        if let Some(child) = node.take_child() {
            stack.push(node);
            node = child;
            continue;
        }
        out.extend(node.take_value());
        drop(node);
        match stack.pop() {
            Some(parent) => node = parent,
            None => break,
        }
    }
}

/// Releases a tree together with its values. A second call is a no-op.
pub fn release_deep(slot: &mut Option<Node>) {
    slot.take();
}

impl Drop for Node {
    fn drop(&mut self) {
        let mut pending: Vec<Box<Node>> = Vec::new();
        pending.extend(self.next.take());
        if let NodeKind::Constructed { child, .. } = &mut self.kind {
            pending.extend(child.take());
        }
        while let Some(mut node) = pending.pop() {
            pending.extend(node.next.take());
            if let NodeKind::Constructed { child, .. } = &mut node.kind {
                pending.extend(child.take());
            }
        }
    }
}

/// Structural equality over this node, its subtree and its later siblings.
///
/// The cached constructed length is not compared.
impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        let mut pairs = vec![(self, other)];
        while let Some((a, b)) = pairs.pop() {
            if a.tag != b.tag {
                return false;
            }
            match (&a.kind, &b.kind) {
                (NodeKind::Primitive { value: va }, NodeKind::Primitive { value: vb }) => {
                    if va != vb {
                        return false;
                    }
                }
                (
                    NodeKind::Constructed { child: ca, .. },
                    NodeKind::Constructed { child: cb, .. },
                ) => match (ca.as_deref(), cb.as_deref()) {
                    (Some(x), Some(y)) => pairs.push((x, y)),
                    (None, None) => {}
                    _ => return false,
                },
                _ => return false,
            }
            match (a.next(), b.next()) {
                (Some(x), Some(y)) => pairs.push((x, y)),
                (None, None) => {}
                _ => return false,
            }
        }
        true
    }
}

impl Eq for Node {}

/// Debug output is the indented dump, siblings included.
impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f)?;
        fmt::Display::fmt(&Dump(self), f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pdo(tag: u16, value: &[u8]) -> Node {
        Node::primitive(tag, value.to_vec()).unwrap()
    }

    #[test]
    fn test_factories() {
        let cdo = Node::constructed(10);
        assert_eq!(cdo.tag(), 10);
        assert_eq!(cdo.node_type(), NodeType::Constructed);
        assert_eq!(cdo.length(), 0);
        assert!(cdo.value().is_none());
        assert!(cdo.child().is_none());

        let p = pdo(12, b"hello");
        assert_eq!(p.node_type(), NodeType::Primitive);
        assert_eq!(p.length(), 5);
        assert_eq!(p.value(), Some(&b"hello"[..]));

        let s = Node::primitive_str(88, "bábé").unwrap();
        assert_eq!(s.value(), Some("bábé".as_bytes()));
    }

    #[test]
    fn test_primitive_rejects_oversized_value() {
        let err = Node::primitive(1, vec![0u8; MAX_ENCODED_SIZE + 1]).unwrap_err();
        assert!(matches!(err, TlvError::TooLarge { len } if len == MAX_ENCODED_SIZE + 1));
        assert!(Node::primitive(1, vec![0u8; MAX_ENCODED_SIZE]).is_ok());
    }

    #[test]
    fn test_find_order_prefers_siblings_over_children() {
        // root(1) -> [ a(5) -> [ deep(7) ], b(6) ], sibling(7)
        let mut root = Node::constructed(1);
        let mut a = Node::constructed(5);
        a.append_child(pdo(7, b"deep")).unwrap();
        root.append_child(a).unwrap();
        root.append_child(pdo(6, b"b")).unwrap();
        root.append_sibling(pdo(7, b"sib"));

        let hit = root.find_by_tag(7).unwrap();
        assert_eq!(hit.value(), Some(&b"sib"[..]));
        assert_eq!(root.find_by_tag(6).unwrap().value(), Some(&b"b"[..]));
        assert!(root.find_by_tag(99).is_none());
    }

    #[test]
    fn test_find_children_last_sibling_first() {
        // Two sibling containers both holding tag 9; the right one wins.
        let mut left = Node::constructed(1);
        left.append_child(pdo(9, b"left")).unwrap();
        let mut right = Node::constructed(2);
        right.append_child(pdo(9, b"right")).unwrap();
        left.append_sibling(right);

        assert_eq!(left.find_by_tag(9).unwrap().value(), Some(&b"right"[..]));
    }

    #[test]
    fn test_find_mut_matches_find() {
        let mut root = Node::constructed(1);
        let mut inner = Node::constructed(2);
        inner.append_child(pdo(3, b"x")).unwrap();
        root.append_child(inner).unwrap();

        let target = root.find_by_tag_mut(2).unwrap();
        target.append_child(pdo(4, b"y")).unwrap();

        let tags: Vec<u16> = root.find_by_tag(2).unwrap().children().map(Node::tag).collect();
        assert_eq!(tags, [3, 4]);
    }

    #[test]
    fn test_count_and_iterators() {
        let mut root = Node::constructed(1);
        for tag in 10..13 {
            root.append_child(pdo(tag, &[tag as u8])).unwrap();
        }
        root.append_sibling(Node::constructed(2));

        assert_eq!(root.count(), 5);
        assert_eq!(root.siblings().count(), 2);
        let tags: Vec<u16> = root.children().map(Node::tag).collect();
        assert_eq!(tags, [10, 11, 12]);
    }

    #[test]
    fn test_release_shallow_returns_values_in_release_order() {
        // root(1) -> [ a(2)="a", b(3)="b" ], c(4)="c"
        let mut root = Node::constructed(1);
        root.append_child(pdo(2, b"a")).unwrap();
        root.append_child(pdo(3, b"b")).unwrap();
        root.append_sibling(pdo(4, b"c"));

        let mut slot = Some(root);
        let values = release_shallow(&mut slot);
        assert!(slot.is_none());
        assert_eq!(values, vec![b"c".to_vec(), b"b".to_vec(), b"a".to_vec()]);

        assert!(release_shallow(&mut slot).is_empty());
    }

    #[test]
    fn test_release_deep_is_idempotent() {
        let mut slot = Some(pdo(1, b"gone"));
        release_deep(&mut slot);
        assert!(slot.is_none());
        release_deep(&mut slot);
        assert!(slot.is_none());
    }

    #[test]
    fn test_drop_long_chain() {
        let mut head = Node::constructed(0);
        let mut tail = &mut head;
        for i in 1..50_000u16 {
            tail = tail.append_sibling(Node::constructed(i));
        }
        assert_eq!(head.siblings().count(), 50_000);
        drop(head);
    }

    #[test]
    fn test_equality_checks_siblings_and_values() {
        let mut a = Node::constructed(1);
        a.append_child(pdo(2, b"v")).unwrap();
        let mut b = Node::constructed(1);
        b.append_child(pdo(2, b"v")).unwrap();
        assert_eq!(a, b);

        b.append_sibling(Node::constructed(3));
        assert_ne!(a, b);

        let c = pdo(1, b"");
        assert_ne!(Node::constructed(1), c);
    }
}
