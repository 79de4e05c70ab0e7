//! Compile-time instruction graph
//!
//! The assembler's intermediate form: a flat sequence of nodes that the
//! resolution passes rewrite in place until only fully-resolved replace
//! nodes remain. Nodes carry a stable arena-style id assigned at
//! creation; all cross-references go through ids, never through
//! pointer identity.

use std::fmt;

/// Stable identifier assigned when a node is created and never reused.
pub type NodeId = u32;

/// Where a symbolic jump points before index resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefTarget {
    /// A label name, rebound to a node during label resolution.
    Label(String),
    /// A specific graph node.
    Node(NodeId),
    /// "Wherever I end up": rebound to the node that owns the
    /// reference during jump resolution. Used by the skip path of a
    /// conditional jump and by fall-through defaults.
    OwnSite,
}

/// A symbolic jump: `index(target) + offset` once positions are known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JumpRef {
    pub target: RefTarget,
    pub offset: isize,
}

impl JumpRef {
    pub fn to_label(name: &str) -> Self {
        Self {
            target: RefTarget::Label(name.to_string()),
            offset: 0,
        }
    }

    pub fn to_node(id: NodeId, offset: isize) -> Self {
        Self {
            target: RefTarget::Node(id),
            offset,
        }
    }

    /// Fall through `offset` instructions past the owning node.
    pub fn own_site(offset: isize) -> Self {
        Self {
            target: RefTarget::OwnSite,
            offset,
        }
    }
}

impl fmt::Display for JumpRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.target {
            RefTarget::Label(name) => write!(f, "label '{}'+{}", name, self.offset),
            RefTarget::Node(id) => write!(f, "node #{}+{}", id, self.offset),
            RefTarget::OwnSite => write!(f, "itself+{}", self.offset),
        }
    }
}

/// A branch slot of a replace node during assembly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Slot {
    /// FIND / REPLACE placeholder: filled from a directly following
    /// conditional jump, or defaulted to fall-through, in the fold pass.
    PendingCondJump,
    /// Failure exit of a REPLACE FOREVER probe node; the fold pass
    /// consults the node two positions down.
    PendingProbeExit,
    /// No-match exit of a REPLACE FOREVER loop node; the fold pass
    /// consults the node one position down.
    PendingLoopExit,
    /// A symbolic jump awaiting index resolution.
    Jump(JumpRef),
    /// A final instruction index.
    Index(usize),
}

/// The node kinds of the graph. Only `Replace` survives to finalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Position marker; removed during label resolution.
    Label { name: String },
    /// Sugar; lowered to an empty-search replace before label resolution.
    UncondJump { target: JumpRef },
    /// Sugar; folded into the preceding replace, then deleted.
    CondJump { on_match: JumpRef, skip: JumpRef },
    Replace {
        search: String,
        replacement: String,
        on_match: Slot,
        on_no_match: Slot,
    },
}

impl Node {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Node::Label { .. } => "label",
            Node::UncondJump { .. } => "unconditional jump",
            Node::CondJump { .. } => "conditional jump",
            Node::Replace { .. } => "replace",
        }
    }
}

/// A graph node with its id and the source line it came from,
/// kept for error reporting.
#[derive(Debug, Clone)]
pub struct GraphNode {
    pub id: NodeId,
    pub line: usize,
    pub source: String,
    pub node: Node,
}

impl fmt::Display for GraphNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} #{} (line {}: {:?})",
            self.node.kind_name(),
            self.id,
            self.line,
            self.source
        )
    }
}
