//! Operation graph model for recorded numeric tapes.
//!
//! This crate provides:
//!
//! - **Operation kinds** ([`OpKind`]) with per-kind argument counts
//!   ([`Arity`]).
//!
//! - **The graph arena** ([`OperationGraph`], [`OperationNode`],
//!   [`Argument`]) addressed by [`NodeId`] handles. Adding a node maintains
//!   the use counts of the nodes it references.
//!
//! - **Index patterns** ([`IndexPattern`], [`IndexStrategy`]) that map a loop
//!   counter to array offsets, stored in an [`IndexPatternTable`].
//!
//! # Design
//!
//! The graph is pure data. Recording the tape, folding common
//! subexpressions and detecting loops happen elsewhere; the code generator
//! only reads the graph and writes variable ids into it.
//!
//! With the `cache` feature every type derives `serde` traits so recorded
//! graphs can be persisted.

mod graph;
mod index_pattern;
mod node;
mod op_kind;

pub use graph::{ArityError, OperationGraph};
pub use index_pattern::{
    IndexPattern, IndexPatternTable, IndexStrategy, Linear2Pattern, LinearPattern, PatternId,
    RandomPattern,
};
pub use node::{Argument, NodeId, OperationNode};
pub use op_kind::{Arity, OpKind};
