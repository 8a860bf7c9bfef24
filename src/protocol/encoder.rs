//! Length Calculator, Encoder and Decoder
//!
//! Encoding runs the length pass first so every constructed node carries the
//! size of its child chain, then writes headers and payloads into a buffer
//! sized exactly for the tree. Decoding needs no separate pass: each header
//! declares how many bytes its payload spans.

use std::sync::Arc;

use super::header::{Header, NodeType, HEADER_SIZE, MAX_ENCODED_SIZE};
use crate::core::{Node, NodeKind};
use crate::error::{Result, TlvError};
use crate::sink::{self, emit, DebugSink, SharedSink};

/// Computes the encoded size of `node` and every later sibling.
///
/// Each constructed node on the way stores the encoded size of its own
/// child chain as its `length`. Fails with [`TlvError::TooLarge`] if a
/// child chain does not fit the 16-bit length field; no cache is touched
/// in that case.
pub fn compute_length(node: &mut Node) -> Result<usize> {
    let mut lengths = Vec::new();
    let total = measure(node, &mut lengths)?;

    // Containers are visited in the same order `measure` reserved their slots.
    let mut slots = lengths.into_iter();
    let mut stack = vec![node];
    while let Some(n) = stack.pop() {
        let Node { kind, next, .. } = n;
        stack.extend(next.as_deref_mut());
        if let NodeKind::Constructed { child, length } = kind {
            *length = slots.next().unwrap_or(0);
            stack.extend(child.as_deref_mut());
        }
    }
    Ok(total)
}

/// Sizes a sibling chain without mutating it.
///
/// Every constructed node gets a slot in `lengths`, reserved in pre-order
/// (node, its subtree, then its next sibling) and filled once its child
/// chain has been summed.
fn measure(head: &Node, lengths: &mut Vec<u16>) -> Result<usize> {
    // (slot of the container owning this chain, next node to size, bytes so far)
    let mut levels: Vec<(Option<usize>, Option<&Node>, usize)> = vec![(None, Some(head), 0)];

    while let Some(level) = levels.last_mut() {
        if let Some(node) = level.1 {
            level.1 = node.next();
            level.2 += HEADER_SIZE;
            match &node.kind {
                NodeKind::Primitive { value } => level.2 += value.len(),
                NodeKind::Constructed { child, .. } => {
                    let slot = lengths.len();
                    lengths.push(0);
                    if let Some(first) = child.as_deref() {
                        levels.push((Some(slot), Some(first), 0));
                    }
                }
            }
            continue;
        }

        let Some((slot, _, sub)) = levels.pop() else {
            break;
        };
        match (slot, levels.last_mut()) {
            (Some(slot), Some(outer)) => {
                lengths[slot] = u16::try_from(sub).map_err(|_| TlvError::TooLarge { len: sub })?;
                outer.2 += sub;
            }
            _ => return Ok(sub),
        }
    }
    Ok(0)
}

/// Encodes `root` and its siblings into a freshly allocated buffer.
pub fn encode(root: &mut Node) -> Result<Vec<u8>> {
    Encoder::for_tree(root)?.finish(root)
}

/// Decodes a complete buffer into a tree.
pub fn decode(buf: &[u8]) -> Result<Node> {
    Decoder::new(buf).decode()
}

/// Pre-allocated encoder buffer
///
/// Semua operasi encode dilakukan ke buffer internal, bounds-checked,
/// tidak ada alokasi setelah inisialisasi.
pub struct Encoder {
    buffer: Vec<u8>,
    capacity: usize,
    sink: SharedSink,
}

impl Encoder {
    /// Membuat encoder dengan buffer size tertentu
    pub fn new(capacity: usize) -> Result<Self> {
        let mut buffer = Vec::new();
        buffer
            .try_reserve_exact(capacity)
            .map_err(|_| TlvError::AllocationFailure { bytes: capacity })?;
        Ok(Self {
            buffer,
            capacity,
            sink: sink::noop(),
        })
    }

    /// Runs the length pass over `root` and sizes an encoder for it.
    pub fn for_tree(root: &mut Node) -> Result<Self> {
        let total = compute_length(root)?;
        if total > MAX_ENCODED_SIZE {
            return Err(TlvError::TooLarge { len: total });
        }
        Self::new(total)
    }

    pub fn with_sink(mut self, sink: Arc<dyn DebugSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Reset encoder for reuse
    #[inline(always)]
    pub fn reset(&mut self) {
        self.buffer.clear();
    }

    /// Encodes `root` (and its siblings) after whatever is already buffered.
    ///
    /// Lengths are recomputed first. On failure the buffer is rolled back to
    /// where it was before the call.
    pub fn encode(&mut self, root: &mut Node) -> Result<&[u8]> {
        let total = compute_length(root)?;
        if total > MAX_ENCODED_SIZE {
            emit(&*self.sink, format_args!("tree of {} bytes is too large", total));
            return Err(TlvError::TooLarge { len: total });
        }
        emit(&*self.sink, format_args!("encoding {} bytes", total));

        let start = self.buffer.len();
        if let Err(err) = self.write_chain(root) {
            emit(&*self.sink, format_args!("encode aborted: {}", err));
            self.buffer.truncate(start);
            return Err(err);
        }
        Ok(&self.buffer[start..])
    }

    /// Encodes `root` and hands over the buffer.
    pub fn finish(mut self, root: &mut Node) -> Result<Vec<u8>> {
        self.encode(root)?;
        Ok(self.buffer)
    }

    /// Writes a sibling chain using the lengths cached by the length pass.
    ///
    /// Pre-order with an explicit stack: header, payload or children, then
    /// the next sibling.
    fn write_chain(&mut self, node: &Node) -> Result<()> {
        let mut stack = vec![node];
        while let Some(n) = stack.pop() {
            let header = Header::new(n.node_type(), n.tag(), n.length());
            self.put(&header.to_bytes())?;
            if let Some(value) = n.value() {
                self.put(value)?;
            }
            stack.extend(n.next());
            stack.extend(n.child());
        }
        Ok(())
    }

    #[inline(always)]
    fn put(&mut self, bytes: &[u8]) -> Result<()> {
        let offset = self.buffer.len();
        if bytes.len() > self.capacity - offset {
            return Err(TlvError::BufferOverflow {
                offset,
                needed: bytes.len(),
                capacity: self.capacity,
            });
        }
        self.buffer.extend_from_slice(bytes);
        Ok(())
    }

    /// Get current buffer content
    #[inline(always)]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Available space in buffer
    #[inline(always)]
    pub fn available(&self) -> usize {
        self.capacity - self.buffer.len()
    }
}

/// Nodes collected for one nesting level while its bytes are consumed
struct Frame {
    /// Offset one past the last byte of this level
    end: usize,
    /// Constructed node whose children this level holds; `None` at the root
    parent: Option<Node>,
    nodes: Vec<Node>,
}

impl Frame {
    /// Links the collected nodes into a sibling chain.
    fn into_chain(self) -> (Option<Node>, Option<Node>) {
        let mut head: Option<Node> = None;
        for mut node in self.nodes.into_iter().rev() {
            node.next = head.map(Box::new);
            head = Some(node);
        }
        (self.parent, head)
    }
}

/// Decoder over a complete encoded buffer
///
/// Nesting is tracked with an explicit frame stack. A failure anywhere
/// drops every node built so far; no partial tree escapes.
pub struct Decoder<'a> {
    buffer: &'a [u8],
    read_pos: usize,
    sink: SharedSink,
}

impl<'a> Decoder<'a> {
    /// Membuat decoder dari buffer
    #[inline(always)]
    pub fn new(buffer: &'a [u8]) -> Self {
        Self {
            buffer,
            read_pos: 0,
            sink: sink::noop(),
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn DebugSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Decodes the whole buffer into a tree.
    pub fn decode(mut self) -> Result<Node> {
        let result = self.decode_inner();
        if let Err(err) = &result {
            emit(&*self.sink, format_args!("decode failed: {}", err));
        }
        result
    }

    fn decode_inner(&mut self) -> Result<Node> {
        let len = self.buffer.len();
        if len == 0 {
            return Err(TlvError::malformed(0, "empty buffer"));
        }
        if len > MAX_ENCODED_SIZE {
            return Err(TlvError::malformed(
                0,
                format!("buffer of {} bytes exceeds {}", len, MAX_ENCODED_SIZE),
            ));
        }

        let mut stack = vec![Frame {
            end: len,
            parent: None,
            nodes: Vec::new(),
        }];

        loop {
            let Some(frame) = stack.last_mut() else {
                return Err(TlvError::malformed(self.read_pos, "decoder lost its root frame"));
            };

            if self.read_pos == frame.end {
                let Some(done) = stack.pop() else {
                    return Err(TlvError::malformed(self.read_pos, "decoder lost its root frame"));
                };
                let (parent, chain) = done.into_chain();
                match (parent, stack.last_mut()) {
                    (Some(mut parent), Some(outer)) => {
                        if let (NodeKind::Constructed { child, .. }, Some(chain)) =
                            (&mut parent.kind, chain)
                        {
                            *child = Some(Box::new(chain));
                        }
                        outer.nodes.push(parent);
                    }
                    (None, _) => {
                        return chain
                            .ok_or_else(|| TlvError::malformed(self.read_pos, "no nodes decoded"));
                    }
                    (Some(_), None) => {
                        return Err(TlvError::malformed(
                            self.read_pos,
                            "nested frame without enclosing level",
                        ));
                    }
                }
                continue;
            }

            let end = frame.end;
            let header = Header::parse(&self.buffer[self.read_pos..end], self.read_pos)?;
            let payload_start = self.read_pos + HEADER_SIZE;
            let payload_end = self.read_pos + header.total_size();
            if payload_end > end {
                return Err(TlvError::malformed(
                    self.read_pos,
                    format!(
                        "declared length {} exceeds {} remaining bytes",
                        header.length,
                        end - payload_start
                    ),
                ));
            }
            emit(
                &*self.sink,
                format_args!(
                    "offset {}: {:?} tag {} length {}",
                    self.read_pos, header.node_type, header.tag, header.length
                ),
            );

            match header.node_type {
                NodeType::Primitive => {
                    let value = self.read_value(payload_start, payload_end)?;
                    frame.nodes.push(Node::primitive(header.tag, value)?);
                    self.read_pos = payload_end;
                }
                NodeType::Constructed => {
                    let mut node = Node::constructed(header.tag);
                    if let NodeKind::Constructed { length, .. } = &mut node.kind {
                        *length = header.length;
                    }
                    self.read_pos = payload_start;
                    if header.length == 0 {
                        frame.nodes.push(node);
                    } else {
                        stack.push(Frame {
                            end: payload_end,
                            parent: Some(node),
                            nodes: Vec::new(),
                        });
                    }
                }
            }
        }
    }

    /// Copies a primitive value into its own allocation.
    fn read_value(&self, start: usize, end: usize) -> Result<Vec<u8>> {
        let bytes = &self.buffer[start..end];
        let mut value = Vec::new();
        value
            .try_reserve_exact(bytes.len())
            .map_err(|_| TlvError::AllocationFailure { bytes: bytes.len() })?;
        value.extend_from_slice(bytes);
        Ok(value)
    }
}
