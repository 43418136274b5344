//! Shared test utilities for naming, context and emitter tests.
//!
//! Only compiled in test builds.

use std::collections::BTreeMap;

use tapegen_ir::{Argument, IndexPatternTable, NodeId, OpKind, OperationGraph, OperationNode};

use crate::error::Result;
use crate::language::{GenerationInput, Language};
use crate::mathml::{MathMl, MathMlNameGenerator};
use crate::promote::assign_variable_ids;

/// A graph under construction plus everything a pass reads.
pub(crate) struct Fixture {
    pub graph: OperationGraph,
    pub independents: Vec<NodeId>,
    pub dependents: Vec<Argument>,
    pub order: Vec<NodeId>,
    pub patterns: IndexPatternTable,
    pub atomic_names: BTreeMap<usize, String>,
    pub zero_dependents: bool,
    pub min_temporary_id: usize,
}

impl Fixture {
    pub fn new() -> Self {
        Fixture {
            graph: OperationGraph::new(),
            independents: Vec::new(),
            dependents: Vec::new(),
            order: Vec::new(),
            patterns: IndexPatternTable::new(),
            atomic_names: BTreeMap::new(),
            zero_dependents: false,
            min_temporary_id: 1,
        }
    }

    /// Add an independent.
    pub fn inv(&mut self) -> NodeId {
        let node = self.graph.add_leaf(OpKind::Inv);
        self.independents.push(node);
        node
    }

    /// Add a node and append it to the visiting order.
    pub fn visit(&mut self, node: OperationNode) -> NodeId {
        let id = self.graph.add(node);
        self.order.push(id);
        id
    }

    /// Add a binary node and append it to the visiting order.
    pub fn visit_binary(
        &mut self,
        kind: OpKind,
        left: impl Into<Argument>,
        right: impl Into<Argument>,
    ) -> NodeId {
        self.visit(OperationNode::new(kind, [left.into(), right.into()]))
    }

    pub fn output(&mut self, value: impl Into<Argument>) {
        self.dependents.push(value.into());
    }

    /// Assign variable ids with the MathML policies.
    pub fn promote(&mut self) {
        self.min_temporary_id = assign_variable_ids(
            &mut self.graph,
            &MathMl::default(),
            &self.independents,
            &self.dependents,
            &self.order,
        );
    }

    pub fn input(&self) -> GenerationInput<'_> {
        GenerationInput::new(
            &self.graph,
            &self.independents,
            &self.dependents,
            self.min_temporary_id,
            &self.order,
        )
        .with_patterns(&self.patterns)
        .with_atomic_names(&self.atomic_names)
        .with_zero_dependents(self.zero_dependents)
    }

    /// Promote, then run a single-unit pass with `language`.
    pub fn generate_with(&mut self, language: &MathMl) -> Result<String> {
        self.promote();
        language.generate(&self.input(), &mut MathMlNameGenerator::new(), None)
    }

    /// Promote, then run a default single-unit pass and return the body.
    pub fn body(&mut self) -> Result<String> {
        let html = self.generate_with(&MathMl::default())?;
        Ok(body_of(&html).to_owned())
    }
}

/// The content of the algorithm container.
pub(crate) fn body_of(html: &str) -> &str {
    let start = html.find("<div id='algorithm'>\n").map_or(0, |i| i + 21);
    let end = html.rfind("</div>\n</body>").unwrap_or(html.len());
    &html[start..end]
}

/// `<math display="block">{content}</math>\n`
pub(crate) fn eq(content: &str) -> String {
    format!("<math display=\"block\">{content}</math>\n")
}

/// `<msub><mi>{base}</mi><mn>{index}</mn></msub>`
pub(crate) fn sub(base: &str, index: usize) -> String {
    format!("<msub><mi>{base}</mi><mn>{index}</mn></msub>")
}
