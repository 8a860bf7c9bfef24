//! Indented text rendering of a tree.
//!
//! ```text
//! |cdo+1|-[]
//!     |pdo+2|-[ 0x61 0x62 0x63 ]
//!     |cdo+3|-[]
//!         |pdo+35|-[]
//! ```
//!
//! One line per node, four spaces per nesting level. Siblings share the
//! indentation of the node they follow.

use std::fmt::{self, Write};

use crate::core::Node;

const INDENT: usize = 4;

/// Display adapter that renders a tree as indented text.
pub struct Dump<'a>(pub &'a Node);

impl fmt::Display for Dump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_chain(f, self.0)
    }
}

/// Pre-order walk with an explicit stack: node, its children one level
/// deeper, then its next sibling.
fn write_chain(out: &mut impl Write, node: &Node) -> fmt::Result {
    let mut stack = vec![(node, 0)];
    while let Some((n, level)) = stack.pop() {
        indent(out, level * INDENT)?;
        match n.value() {
            None => writeln!(out, "|cdo+{}|-[]", n.tag())?,
            Some([]) => writeln!(out, "|pdo+{}|-[]", n.tag())?,
            Some(value) => {
                write!(out, "|pdo+{}|-[ ", n.tag())?;
                for byte in value {
                    write!(out, "0x{:02X} ", byte)?;
                }
                out.write_str("]\n")?;
            }
        }
        stack.extend(n.next().map(|next| (next, level)));
        stack.extend(n.child().map(|child| (child, level + 1)));
    }
    Ok(())
}

fn indent(out: &mut impl Write, mut width: usize) -> fmt::Result {
    const SPACES: &str = "                                                                ";
    while width > 0 {
        let chunk = width.min(SPACES.len());
        out.write_str(&SPACES[..chunk])?;
        width -= chunk;
    }
    Ok(())
}

/// Renders `node`, its subtree and its later siblings.
pub fn dump(node: &Node) -> String {
    Dump(node).to_string()
}

impl Node {
    /// See [`dump`].
    pub fn dump(&self) -> String {
        dump(self)
    }
}
