//! Variable id assignment.
//!
//! Graph recorders promote nodes to variables before handing the graph to
//! a language. This module does so with the policies of that language so
//! that ids are dense and role-partitioned the way the pass expects.

use tapegen_ir::{Argument, NodeId, OpKind, OperationGraph};

use crate::language::Language;

/// Assign variable ids and return the first temporary id.
///
/// - independents get `1..=N` in order;
/// - every dependent node that is not an independent and has no id yet
///   gets the next id;
/// - then, in visiting order, array creations get `1 + offset` in their
///   own (dense or sparse) array space, and nodes the language wants as a
///   variable get a temporary id. `TmpDcl` always gets one;
/// - arguments the language requires to be variables are promoted too.
pub fn assign_variable_ids<L: Language + ?Sized>(
    graph: &mut OperationGraph,
    language: &L,
    independents: &[NodeId],
    dependents: &[Argument],
    order: &[NodeId],
) -> usize {
    for (j, &independent) in independents.iter().enumerate() {
        graph.set_variable_id(independent, j + 1);
    }

    let mut next = independents.len() + 1;
    for node in dependents.iter().filter_map(|dep| dep.node()) {
        let kind = graph.kind(node);
        if kind != OpKind::Inv && kind != OpKind::LoopEnd && graph.variable_id(node) == 0 {
            graph.set_variable_id(node, next);
            next += 1;
        }
    }
    let min_temporary_id = next;

    let mut dense_next = 1;
    let mut sparse_next = 1;
    for &node in order {
        let op = graph.node(node);
        let kind = op.kind();
        let use_count = op.use_count();
        let len = op.args().len();

        if op.variable_id() == 0 {
            match kind {
                OpKind::ArrayCreation => {
                    graph.set_variable_id(node, dense_next);
                    dense_next += len;
                }
                OpKind::SparseArrayCreation => {
                    graph.set_variable_id(node, sparse_next);
                    sparse_next += len;
                }
                OpKind::TmpDcl => {
                    graph.set_variable_id(node, next);
                    next += 1;
                }
                _ if language.creates_new_variable(kind, use_count) => {
                    graph.set_variable_id(node, next);
                    next += 1;
                }
                _ => {}
            }
        }

        for index in 0..len {
            if !language.requires_variable_argument(kind, index) {
                continue;
            }
            let Some(arg) = graph.node(node).arg(index).and_then(Argument::node) else {
                continue;
            };
            if graph.variable_id(arg) == 0 && !language.directly_assigns_variable(graph.kind(arg)) {
                graph.set_variable_id(arg, next);
                next += 1;
            }
        }
    }

    tracing::debug!(
        independents = independents.len(),
        min_temporary_id,
        temporaries = next - min_temporary_id,
        "assigned variable ids"
    );
    min_temporary_id
}
