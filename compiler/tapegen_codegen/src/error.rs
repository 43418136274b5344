//! Errors reported by a generation pass.

use tapegen_ir::{ArityError, NodeId, OpKind};
use thiserror::Error;

/// Result type of generation operations.
pub type Result<T> = std::result::Result<T, CodegenError>;

/// A generation pass failed. No output of a failed pass is valid.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CodegenError {
    /// The graph violates the contract of its node kinds: wrong argument
    /// counts, missing control edges, unpromoted variables, unbalanced
    /// loops or unknown atomic functions.
    #[error("malformed graph at {node} ({kind}): {reason}")]
    MalformedGraph {
        node: NodeId,
        kind: OpKind,
        reason: String,
    },

    /// Rejected before rendering starts.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

impl CodegenError {
    pub(crate) fn malformed(node: NodeId, kind: OpKind, reason: impl Into<String>) -> Self {
        CodegenError::MalformedGraph {
            node,
            kind,
            reason: reason.into(),
        }
    }
}

impl From<ArityError> for CodegenError {
    fn from(err: ArityError) -> Self {
        CodegenError::MalformedGraph {
            node: err.node,
            kind: err.kind,
            reason: format!("expected {} arguments, found {}", err.expected, err.found),
        }
    }
}

/// Invalid generation options.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("output partitioning requires a destination unit map")]
    PartitionWithoutDestination,

    #[error("parameter precision must be at least one digit")]
    ZeroPrecision,

    #[error("the unit base name must not be empty")]
    EmptyBaseName,
}
