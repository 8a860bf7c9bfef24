//! Core module: tree data model and builder
//!
//! Prinsip desain:
//! - Tagged union: a primitive cannot hold children, a container cannot hold a value
//! - Exclusive ownership: every attach moves the node into the tree
//! - No recursion over sibling chains: long chains are walked with loops

mod builder;
mod node;

pub use builder::{
    append_child, append_sibling, new_constructed, new_primitive, set_child, set_next, Rejected,
};
pub use node::{release_deep, release_shallow, Node, Siblings};
pub(crate) use node::NodeKind;
