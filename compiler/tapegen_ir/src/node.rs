//! Nodes and arguments of the operation graph.

use std::fmt;

use smallvec::SmallVec;

use crate::OpKind;

// ── ID newtype ──────────────────────────────────────────────────────

/// Handle of a node inside an [`OperationGraph`](crate::OperationGraph).
///
/// Handles are allocated sequentially starting from 0 and stay valid for
/// the lifetime of the graph. Node identity is handle identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
#[repr(transparent)]
pub struct NodeId(u32);

impl NodeId {
    /// Create a node handle from a raw index.
    #[inline]
    pub fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Get the raw `u32` value.
    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }

    /// Get the index as `usize` (for indexing into `Vec`s).
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

// ── Arguments ───────────────────────────────────────────────────────

/// An operation argument: a constant or a reference to another node.
///
/// References do not own the node; the graph owns every node.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub enum Argument {
    Constant(f64),
    Node(NodeId),
}

impl Argument {
    /// The referenced node, if this is not a constant.
    #[inline]
    pub fn node(self) -> Option<NodeId> {
        match self {
            Argument::Node(id) => Some(id),
            Argument::Constant(_) => None,
        }
    }

    /// The constant value, if this is a constant.
    #[inline]
    pub fn constant(self) -> Option<f64> {
        match self {
            Argument::Constant(value) => Some(value),
            Argument::Node(_) => None,
        }
    }

    /// Same constant value, or the very same node.
    pub fn is_identical(self, other: Argument) -> bool {
        match (self, other) {
            (Argument::Constant(a), Argument::Constant(b)) => a == b,
            (Argument::Node(a), Argument::Node(b)) => a == b,
            _ => false,
        }
    }

    /// A constant that is exactly zero.
    pub fn is_identical_zero(self) -> bool {
        self.constant() == Some(0.0)
    }
}

impl From<NodeId> for Argument {
    fn from(id: NodeId) -> Self {
        Argument::Node(id)
    }
}

impl From<f64> for Argument {
    fn from(value: f64) -> Self {
        Argument::Constant(value)
    }
}

// ── Nodes ───────────────────────────────────────────────────────────

/// One recorded computation step.
///
/// The argument and info lists are fixed when the node is created.
/// `variable_id` is 0 until the node is promoted to a variable; the
/// graph maintains `use_count` as nodes referencing this one are added.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct OperationNode {
    kind: OpKind,
    args: SmallVec<[Argument; 4]>,
    info: SmallVec<[usize; 4]>,
    variable_id: usize,
    use_count: u32,
    name: Option<String>,
}

impl OperationNode {
    /// Create a node with the given arguments and no info.
    pub fn new(kind: OpKind, args: impl IntoIterator<Item = Argument>) -> Self {
        Self {
            kind,
            args: args.into_iter().collect(),
            info: SmallVec::new(),
            variable_id: 0,
            use_count: 0,
            name: None,
        }
    }

    /// Create a node without arguments (independents, declarations).
    pub fn leaf(kind: OpKind) -> Self {
        Self::new(kind, SmallVec::<[Argument; 4]>::new())
    }

    /// Attach kind-specific info values.
    #[must_use]
    pub fn with_info(mut self, info: impl IntoIterator<Item = usize>) -> Self {
        self.info = info.into_iter().collect();
        self
    }

    /// Attach a name chosen by the recorder (index declarations).
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[inline]
    pub fn kind(&self) -> OpKind {
        self.kind
    }

    #[inline]
    pub fn args(&self) -> &[Argument] {
        &self.args
    }

    /// Argument at `index`, if present.
    #[inline]
    pub fn arg(&self, index: usize) -> Option<Argument> {
        self.args.get(index).copied()
    }

    #[inline]
    pub fn info(&self) -> &[usize] {
        &self.info
    }

    /// Variable id (0 when the node has no variable).
    #[inline]
    pub fn variable_id(&self) -> usize {
        self.variable_id
    }

    /// Number of argument slots referencing this node.
    #[inline]
    pub fn use_count(&self) -> u32 {
        self.use_count
    }

    /// Name chosen by the recorder, if any.
    #[inline]
    pub fn preset_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub(crate) fn set_variable_id(&mut self, id: usize) {
        self.variable_id = id;
    }

    pub(crate) fn add_use(&mut self) {
        self.use_count += 1;
    }
}
