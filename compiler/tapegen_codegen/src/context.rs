//! Rendering state of one generation pass.
//!
//! The `RenderContext` owns everything a pass mutates: the output buffer,
//! the nesting depth, the open loop and branch stacks, the contents last written into
//! the shared temporary arrays, and the per-variable occurrence counters.
//! A pass builds a fresh context, so nothing leaks between passes.

use rustc_hash::FxHashMap;
use tapegen_ir::{Argument, NodeId, OpKind};

use crate::language::GenerationInput;
use crate::names::{NameGenerator, NameResolver};

/// Which shared temporary array a slot belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ArraySpace {
    Dense,
    Sparse,
}

impl ArraySpace {
    /// The space written by an array creation kind.
    pub fn of(kind: OpKind) -> Option<Self> {
        match kind {
            OpKind::ArrayCreation => Some(ArraySpace::Dense),
            OpKind::SparseArrayCreation => Some(ArraySpace::Sparse),
            _ => None,
        }
    }
}

/// Mutable state threaded through a single forward pass.
pub struct RenderContext<'a> {
    /// What is being rendered.
    pub input: GenerationInput<'a>,
    /// Name cache and generator.
    pub names: NameResolver<'a>,
    /// Current nesting level (loop and branch bodies).
    depth: usize,
    /// Rendered output not yet moved into a unit.
    output: String,
    /// Loops opened and not yet closed, innermost last.
    loops: Vec<NodeId>,
    /// Innermost branch of each open conditional chain, innermost last.
    branches: Vec<NodeId>,
    /// Value last written into each slot of the dense temporary array.
    dense_slots: FxHashMap<usize, Argument>,
    /// Value last written into each slot of the sparse temporary array.
    sparse_slots: FxHashMap<usize, Argument>,
    /// How many times each variable id has been rendered.
    occurrences: FxHashMap<usize, u32>,
}

impl<'a> RenderContext<'a> {
    pub fn new(input: GenerationInput<'a>, generator: &'a mut dyn NameGenerator) -> Self {
        Self {
            input,
            names: NameResolver::new(generator),
            depth: 0,
            output: String::with_capacity(4096),
            loops: Vec::new(),
            branches: Vec::new(),
            dense_slots: FxHashMap::default(),
            sparse_slots: FxHashMap::default(),
            occurrences: FxHashMap::default(),
        }
    }

    // ── Output ──────────────────────────────────────────────────────

    /// Write a string to output.
    #[inline]
    pub fn write(&mut self, s: &str) {
        self.output.push_str(s);
    }

    /// Rendered output so far.
    pub fn output(&self) -> &str {
        &self.output
    }

    /// Take the rendered output, leaving the buffer empty.
    pub fn take_output(&mut self) -> String {
        std::mem::take(&mut self.output)
    }

    // ── Nesting ─────────────────────────────────────────────────────

    /// Increase nesting level.
    pub fn indent(&mut self) {
        self.depth += 1;
    }

    /// Decrease nesting level.
    pub fn dedent(&mut self) {
        debug_assert!(self.depth > 0, "dedent called at depth zero");
        self.depth = self.depth.saturating_sub(1);
    }

    /// Current nesting level.
    pub fn depth(&self) -> usize {
        self.depth
    }

    // ── Loops ───────────────────────────────────────────────────────

    pub fn push_loop(&mut self, loop_start: NodeId) {
        self.loops.push(loop_start);
    }

    /// Close the innermost loop, returning its `LoopStart`.
    pub fn pop_loop(&mut self) -> Option<NodeId> {
        self.loops.pop()
    }

    /// Innermost open loop.
    pub fn current_loop(&self) -> Option<NodeId> {
        self.loops.last().copied()
    }

    /// Whether a unit boundary is forbidden here.
    pub fn has_open_loops(&self) -> bool {
        !self.loops.is_empty()
    }

    // ── Conditionals ────────────────────────────────────────────────

    /// Open `branch` (`StartIf`, `ElseIf` or `Else`).
    pub fn push_branch(&mut self, branch: NodeId) {
        self.branches.push(branch);
    }

    /// Close the innermost open branch, returning it.
    pub fn pop_branch(&mut self) -> Option<NodeId> {
        self.branches.pop()
    }

    /// Innermost open branch.
    pub fn current_branch(&self) -> Option<NodeId> {
        self.branches.last().copied()
    }

    // ── Temporary arrays ────────────────────────────────────────────

    fn slots(&mut self, space: ArraySpace) -> &mut FxHashMap<usize, Argument> {
        match space {
            ArraySpace::Dense => &mut self.dense_slots,
            ArraySpace::Sparse => &mut self.sparse_slots,
        }
    }

    /// Value currently known to be in `slot`.
    pub fn slot_value(&self, space: ArraySpace, slot: usize) -> Option<Argument> {
        match space {
            ArraySpace::Dense => self.dense_slots.get(&slot).copied(),
            ArraySpace::Sparse => self.sparse_slots.get(&slot).copied(),
        }
    }

    /// Whether `slot` already holds exactly `value`.
    pub fn slot_holds(&self, space: ArraySpace, slot: usize, value: Argument) -> bool {
        self.slot_value(space, slot)
            .is_some_and(|cached| cached.is_identical(value))
    }

    pub fn set_slot(&mut self, space: ArraySpace, slot: usize, value: Argument) {
        self.slots(space).insert(slot, value);
    }

    /// Forget the value of `slot`.
    pub fn invalidate_slot(&mut self, space: ArraySpace, slot: usize) {
        self.slots(space).remove(&slot);
    }

    /// Forget `len` slots starting at `first`.
    pub fn invalidate_slots(&mut self, space: ArraySpace, first: usize, len: usize) {
        let slots = self.slots(space);
        for slot in first..first + len {
            slots.remove(&slot);
        }
    }

    // ── Occurrence ids ──────────────────────────────────────────────

    /// Element id of the next rendering of `variable_id`.
    ///
    /// The first rendering is `v<id>`, later ones `v<id>_<n>`.
    pub fn occurrence_id(&mut self, variable_id: usize) -> String {
        let count = self.occurrences.entry(variable_id).or_insert(0);
        let n = *count;
        *count += 1;
        if n == 0 {
            format!("v{variable_id}")
        } else {
            format!("v{variable_id}_{n}")
        }
    }

    /// Element id of the next rendering of `node`'s variable.
    pub fn node_occurrence_id(&mut self, node: NodeId) -> String {
        let id = self.input.graph.variable_id(node);
        self.occurrence_id(id)
    }
}
