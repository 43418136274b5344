//! The operation graph: an arena of [`OperationNode`]s addressed by
//! [`NodeId`] handles.

use crate::{Argument, Arity, NodeId, OpKind, OperationNode};

/// A node's argument count does not match its kind.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{kind} at {node} expects {expected} arguments, found {found}")]
pub struct ArityError {
    pub node: NodeId,
    pub kind: OpKind,
    pub expected: Arity,
    pub found: usize,
}

/// Arena owning every recorded node.
///
/// Adding a node increments the use count of each node it references, so
/// use counts always reflect the argument slots present in the arena.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
pub struct OperationGraph {
    nodes: Vec<OperationNode>,
}

impl OperationGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
        }
    }

    /// Append a node and return its handle.
    ///
    /// # Panics
    ///
    /// Panics if an argument references a node that is not in the graph
    /// (arguments must be added before their users).
    pub fn add(&mut self, node: OperationNode) -> NodeId {
        let id = NodeId::new(self.nodes.len() as u32);
        for arg in node.args() {
            if let Argument::Node(target) = arg {
                self.nodes[target.index()].add_use();
            }
        }
        self.nodes.push(node);
        id
    }

    /// Shorthand for adding a node without arguments.
    pub fn add_leaf(&mut self, kind: OpKind) -> NodeId {
        self.add(OperationNode::leaf(kind))
    }

    /// Shorthand for a unary operation.
    pub fn add_unary(&mut self, kind: OpKind, arg: impl Into<Argument>) -> NodeId {
        self.add(OperationNode::new(kind, [arg.into()]))
    }

    /// Shorthand for a binary operation.
    pub fn add_binary(
        &mut self,
        kind: OpKind,
        left: impl Into<Argument>,
        right: impl Into<Argument>,
    ) -> NodeId {
        self.add(OperationNode::new(kind, [left.into(), right.into()]))
    }

    /// Declare a named integer index (e.g. a loop counter).
    pub fn add_index_declaration(&mut self, name: impl Into<String>) -> NodeId {
        self.add(OperationNode::leaf(OpKind::IndexDeclaration).with_name(name))
    }

    /// Get a node by handle.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not produced by this graph.
    #[inline]
    pub fn node(&self, id: NodeId) -> &OperationNode {
        &self.nodes[id.index()]
    }

    #[inline]
    pub fn get(&self, id: NodeId) -> Option<&OperationNode> {
        self.nodes.get(id.index())
    }

    #[inline]
    pub fn kind(&self, id: NodeId) -> OpKind {
        self.node(id).kind()
    }

    #[inline]
    pub fn variable_id(&self, id: NodeId) -> usize {
        self.node(id).variable_id()
    }

    #[inline]
    pub fn use_count(&self, id: NodeId) -> u32 {
        self.node(id).use_count()
    }

    /// Promote a node to a variable (or reset it with 0).
    pub fn set_variable_id(&mut self, id: NodeId, variable_id: usize) {
        self.nodes[id.index()].set_variable_id(variable_id);
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterate over all nodes in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &OperationNode)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (NodeId::new(i as u32), node))
    }

    /// Check that a node's argument count matches its kind.
    pub fn validate_arity(&self, id: NodeId) -> Result<(), ArityError> {
        let node = self.node(id);
        let expected = node.kind().arity();
        let found = node.args().len();
        if expected.accepts(found) {
            Ok(())
        } else {
            Err(ArityError {
                node: id,
                kind: node.kind(),
                expected,
                found,
            })
        }
    }

    /// Follow `Alias` nodes while they have no variable of their own.
    ///
    /// Returns the first node that is either materialized or not an alias,
    /// or `None` when the chain ends in a constant.
    pub fn resolve_alias(&self, mut id: NodeId) -> Option<NodeId> {
        loop {
            let node = self.node(id);
            if node.variable_id() != 0 || node.kind() != OpKind::Alias {
                return Some(id);
            }
            id = node.arg(0)?.node()?;
        }
    }
}
