//! The contract between the generation pass and a target language.

use std::collections::BTreeMap;

use tapegen_ir::{Argument, IndexPatternTable, NodeId, OpKind, OperationGraph};

use crate::context::RenderContext;
use crate::error::Result;
use crate::names::NameGenerator;

static NO_PATTERNS: IndexPatternTable = IndexPatternTable::new();
static NO_ATOMICS: BTreeMap<usize, String> = BTreeMap::new();

/// Everything the graph recorder hands to one generation pass.
///
/// All of it is read-only for the duration of the pass. Variable ids must
/// already be assigned (see [`assign_variable_ids`](crate::assign_variable_ids)).
#[derive(Clone, Copy, Debug)]
pub struct GenerationInput<'a> {
    pub graph: &'a OperationGraph,
    /// Independent placeholders; the one at position `j` has id `j + 1`.
    pub independents: &'a [NodeId],
    /// Declared outputs in output order.
    pub dependents: &'a [Argument],
    /// First id used for temporaries.
    pub min_temporary_id: usize,
    /// Topological visiting order of the nodes to render.
    pub order: &'a [NodeId],
    /// Atomic function id to the name used in calls.
    pub atomic_names: &'a BTreeMap<usize, String>,
    /// Patterns referenced by loop-indexed nodes.
    pub patterns: &'a IndexPatternTable,
    /// Assign zero to every dependent before the first statement.
    pub zero_dependents: bool,
}

impl<'a> GenerationInput<'a> {
    /// Input without atomic functions or index patterns.
    pub fn new(
        graph: &'a OperationGraph,
        independents: &'a [NodeId],
        dependents: &'a [Argument],
        min_temporary_id: usize,
        order: &'a [NodeId],
    ) -> Self {
        Self {
            graph,
            independents,
            dependents,
            min_temporary_id,
            order,
            atomic_names: &NO_ATOMICS,
            patterns: &NO_PATTERNS,
            zero_dependents: false,
        }
    }

    #[must_use]
    pub fn with_atomic_names(mut self, atomic_names: &'a BTreeMap<usize, String>) -> Self {
        self.atomic_names = atomic_names;
        self
    }

    #[must_use]
    pub fn with_patterns(mut self, patterns: &'a IndexPatternTable) -> Self {
        self.patterns = patterns;
        self
    }

    #[must_use]
    pub fn with_zero_dependents(mut self, zero_dependents: bool) -> Self {
        self.zero_dependents = zero_dependents;
        self
    }

    /// Number of independents (`N`); ids `1..=N` are independents.
    #[inline]
    pub fn independent_count(&self) -> usize {
        self.independents.len()
    }

    /// Whether `node` is written as a dependent.
    ///
    /// Loop-indexed dependents always are; otherwise the id must fall in
    /// the dependent block between independents and temporaries.
    pub fn is_dependent(&self, node: NodeId) -> bool {
        let node = self.graph.node(node);
        if node.kind() == OpKind::LoopIndexedDep {
            return true;
        }
        let id = node.variable_id();
        id > self.independent_count() && id < self.min_temporary_id
    }
}

/// A target language.
///
/// The variable policies are consulted both by
/// [`assign_variable_ids`](crate::assign_variable_ids) and by the pass
/// itself, so the two always agree on which nodes own a variable.
pub trait Language {
    /// Whether a node needs its own variable, given how often it is used.
    fn creates_new_variable(&self, kind: OpKind, use_count: u32) -> bool;

    /// Whether rendering the node already performs its assignment.
    fn directly_assigns_variable(&self, kind: OpKind) -> bool;

    /// Whether argument `arg_index` of a `kind` node must be a variable.
    fn requires_variable_argument(&self, kind: OpKind, arg_index: usize) -> bool;

    /// Render one visited node; returns the number of emitted statements.
    fn render(&self, cx: &mut RenderContext<'_>, node: NodeId) -> Result<u32>;

    /// Run a full pass and return the main unit.
    ///
    /// When `units` is supplied it receives every produced unit, keyed by
    /// file name, but only if the pass succeeds.
    fn generate(
        &self,
        input: &GenerationInput<'_>,
        names: &mut dyn NameGenerator,
        units: Option<&mut BTreeMap<String, String>>,
    ) -> Result<String>;
}
