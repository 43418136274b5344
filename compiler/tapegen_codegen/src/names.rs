//! Variable naming.
//!
//! A [`NameGenerator`] decides what names look like for each role. The
//! [`NameResolver`] decides which role a node plays, asks the generator
//! once, and memoizes the answer for the rest of the pass.

use std::collections::hash_map::Entry;

use rustc_hash::FxHashMap;
use tapegen_ir::{IndexPattern, NodeId, OpKind, OperationGraph, PatternId};

use crate::error::{CodegenError, Result};
use crate::language::GenerationInput;

/// Supplies variable names per role.
pub trait NameGenerator {
    /// Called once at the start of every pass.
    fn begin_run(&mut self, min_temporary_id: usize) {
        let _ = min_temporary_id;
    }

    /// Independent at `position` (id `position + 1`).
    fn independent(&mut self, position: usize) -> String;

    /// Dependent at `position` in the output vector.
    fn dependent(&mut self, position: usize) -> String;

    /// Dependent written inside a loop through `pattern`.
    fn indexed_dependent(
        &mut self,
        variable_id: usize,
        pattern: &IndexPattern,
        index_name: &str,
    ) -> String;

    /// Independent read inside a loop through `pattern`.
    fn indexed_independent(
        &mut self,
        variable_id: usize,
        pattern: &IndexPattern,
        index_name: &str,
    ) -> String;

    /// Scalar temporary.
    fn temporary(&mut self, variable_id: usize) -> String;

    /// Slice `[id - 1, id - 1 + length)` of the dense temporary array.
    fn temporary_array(&mut self, variable_id: usize, length: usize) -> String;

    /// Slice `[id - 1, id - 1 + length)` of the sparse temporary array.
    fn temporary_sparse_array(&mut self, variable_id: usize, length: usize) -> String;

    /// A single slot of the dense temporary array.
    fn array_element(&mut self, slot: usize) -> String;

    /// A single slot of the sparse temporary array.
    fn sparse_array_element(&mut self, slot: usize) -> String;

    /// Written before the body of every partitioned unit.
    fn prepare_custom_function_variables(&mut self, out: &mut String) {
        let _ = out;
    }

    /// Written after the body of every partitioned unit.
    fn finalize_custom_function_variables(&mut self, out: &mut String) {
        let _ = out;
    }
}

/// Name of an index: the preset name of its declaration.
///
/// Accepts the declaration itself or an `Index` use of it.
pub fn index_name(graph: &OperationGraph, node: NodeId) -> Result<&str> {
    let index = graph.node(node);
    match index.kind() {
        OpKind::IndexDeclaration => index.preset_name().ok_or_else(|| {
            CodegenError::malformed(node, index.kind(), "index declaration without a name")
        }),
        OpKind::Index => {
            let declaration = index
                .arg(0)
                .and_then(|arg| arg.node())
                .filter(|&dcl| graph.kind(dcl) == OpKind::IndexDeclaration)
                .ok_or_else(|| {
                    CodegenError::malformed(node, index.kind(), "index without its declaration")
                })?;
            index_name(graph, declaration)
        }
        kind => Err(CodegenError::malformed(node, kind, "expected an index")),
    }
}

/// Look up the pattern referenced by `info[slot]` of `node`.
pub fn node_pattern<'a>(
    input: &GenerationInput<'a>,
    node: NodeId,
    slot: usize,
) -> Result<&'a IndexPattern> {
    let op = input.graph.node(node);
    let raw = op
        .info()
        .get(slot)
        .copied()
        .ok_or_else(|| CodegenError::malformed(node, op.kind(), "missing index pattern"))?;
    let id = u32::try_from(raw)
        .ok()
        .map(PatternId::new)
        .ok_or_else(|| CodegenError::malformed(node, op.kind(), "invalid index pattern"))?;
    input
        .patterns
        .get(id)
        .ok_or_else(|| CodegenError::malformed(node, op.kind(), format!("unknown index pattern {raw}")))
}

/// Memoized name lookup for one pass.
pub struct NameResolver<'a> {
    generator: &'a mut dyn NameGenerator,
    names: FxHashMap<NodeId, String>,
    /// Variable id of a dependent to its first position in the output vector.
    dependent_ids: FxHashMap<usize, usize>,
}

impl<'a> NameResolver<'a> {
    pub fn new(generator: &'a mut dyn NameGenerator) -> Self {
        Self {
            generator,
            names: FxHashMap::default(),
            dependent_ids: FxHashMap::default(),
        }
    }

    /// The generator, for hooks and role names that bypass the cache.
    pub fn generator(&mut self) -> &mut dyn NameGenerator {
        &mut *self.generator
    }

    /// The memoized name of `node`, if it has one.
    pub fn get(&self, node: NodeId) -> Option<&str> {
        self.names.get(&node).map(String::as_str)
    }

    pub fn is_named(&self, node: NodeId) -> bool {
        self.names.contains_key(&node)
    }

    /// Set the name of `node` unless it already has one.
    ///
    /// Returns `false`, keeping the earlier name, if `node` was named.
    pub fn assign(&mut self, node: NodeId, name: String) -> bool {
        match self.names.entry(node) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(name);
                true
            }
        }
    }

    /// Record that `variable_id` is written to dependent `position`.
    ///
    /// Returns `false` if another dependent already owns the id.
    pub fn register_dependent(&mut self, variable_id: usize, position: usize) -> bool {
        if self.dependent_ids.contains_key(&variable_id) {
            return false;
        }
        self.dependent_ids.insert(variable_id, position);
        true
    }

    /// Dependent position owning `variable_id`.
    pub fn dependent_position(&self, variable_id: usize) -> Option<usize> {
        self.dependent_ids.get(&variable_id).copied()
    }

    /// Name of the variable holding `node`.
    ///
    /// Temporaries declared outside a loop (`Tmp`, `LoopIndexedTmp`) share
    /// the name of their declaration. Every other node is named once, by
    /// role, and keeps that name for the rest of the pass.
    pub fn resolve(&mut self, input: &GenerationInput<'_>, node: NodeId) -> Result<String> {
        let graph = input.graph;
        let op = graph.node(node);
        let kind = op.kind();

        if matches!(kind, OpKind::Tmp | OpKind::LoopIndexedTmp) {
            let declaration = tmp_declaration(graph, node)?;
            return self.resolve(input, declaration);
        }

        if let Some(name) = self.names.get(&node) {
            return Ok(name.clone());
        }

        let id = op.variable_id();
        let name = match kind {
            OpKind::LoopIndexedDep => {
                let pattern = node_pattern(input, node, 0)?;
                let index = index_name(graph, pattern.index())?;
                self.generator.indexed_dependent(id, pattern, index)
            }
            OpKind::LoopIndexedIndep => {
                let pattern = node_pattern(input, node, 0)?;
                let index = index_name(graph, pattern.index())?;
                self.generator.indexed_independent(id, pattern, index)
            }
            _ if id == 0 => {
                return Err(CodegenError::malformed(
                    node,
                    kind,
                    "node is used as a variable but has no variable id",
                ));
            }
            OpKind::ArrayCreation => self.generator.temporary_array(id, op.args().len()),
            OpKind::SparseArrayCreation => {
                self.generator.temporary_sparse_array(id, op.args().len())
            }
            _ if id <= input.independent_count() => self.generator.independent(id - 1),
            _ if id < input.min_temporary_id => {
                let position = self.dependent_position(id).ok_or_else(|| {
                    CodegenError::malformed(
                        node,
                        kind,
                        format!("variable id {id} does not belong to any dependent"),
                    )
                })?;
                self.generator.dependent(position)
            }
            _ => self.generator.temporary(id),
        };

        tracing::trace!(node = node.raw(), id, %name, "named variable");
        self.names.insert(node, name.clone());
        Ok(name)
    }
}

/// The `TmpDcl` backing a `Tmp` or `LoopIndexedTmp` node.
pub fn tmp_declaration(graph: &OperationGraph, node: NodeId) -> Result<NodeId> {
    let op = graph.node(node);
    op.arg(0)
        .and_then(|arg| arg.node())
        .filter(|&dcl| graph.kind(dcl) == OpKind::TmpDcl)
        .ok_or_else(|| {
            CodegenError::malformed(node, op.kind(), "expected a temporary declaration argument")
        })
}
