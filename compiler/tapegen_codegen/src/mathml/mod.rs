//! MathML emitter.
//!
//! Renders a recorded operation graph as an HTML document of MathML
//! equations: one `<math>` block per assignment, with loops and branches
//! wrapped in styled `<div>` blocks. Numeric literals use `×10^e` notation
//! and variables carry `id`/`class` attributes so scripts and style sheets
//! can highlight every occurrence of a variable.
//!
//! # Pass
//!
//! 1. Name independents, dependents and duplicated dependents.
//! 2. Pre-name temporaries used more than once and every array.
//! 3. Render the visiting order, splitting output between statements that
//!    are outside every loop once the statement budget is reached.
//! 4. Append duplicated dependents and dependents without operations.
//! 5. Wrap the result in the HTML document.

mod arrays;
mod control;
mod document;
mod index;
mod names;
mod render;

use std::collections::BTreeMap;

use tapegen_ir::{Argument, NodeId, OpKind};

use crate::config::{GenerationOptions, MathMlMarkup};
use crate::context::RenderContext;
use crate::error::{CodegenError, Result};
use crate::language::{GenerationInput, Language};
use crate::names::NameGenerator;
use crate::partition::Partitioner;

pub use index::{guard_markup, pattern_markup, UNBOUNDED};
pub use names::MathMlNameGenerator;

/// Extension of every unit produced by this emitter.
const UNIT_EXTENSION: &str = "html";

/// The MathML target language.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MathMl {
    options: GenerationOptions,
    markup: MathMlMarkup,
}

impl MathMl {
    pub fn new(options: GenerationOptions, markup: MathMlMarkup) -> Self {
        Self { options, markup }
    }

    /// Default markup with the given options.
    pub fn with_options(options: GenerationOptions) -> Self {
        Self {
            options,
            ..Default::default()
        }
    }

    /// Default options with the given markup.
    pub fn with_markup(markup: MathMlMarkup) -> Self {
        Self {
            markup,
            ..Default::default()
        }
    }

    pub fn options(&self) -> &GenerationOptions {
        &self.options
    }

    pub fn markup(&self) -> &MathMlMarkup {
        &self.markup
    }

    // ── Naming ──────────────────────────────────────────────────────

    fn name_independents(&self, cx: &mut RenderContext<'_>) -> Result<()> {
        let graph = cx.input.graph;
        let independents = cx.input.independents;
        for &node in independents {
            let kind = graph.kind(node);
            if kind != OpKind::Inv {
                return Err(CodegenError::malformed(node, kind, "independent must be an Inv node"));
            }
            cx.names.resolve(&cx.input, node)?;
        }
        Ok(())
    }

    fn name_dependents(&self, cx: &mut RenderContext<'_>) -> Result<()> {
        let graph = cx.input.graph;
        let dependents = cx.input.dependents;
        for (i, dependent) in dependents.iter().enumerate() {
            let Some(node) = dependent.node() else {
                continue;
            };
            let kind = graph.kind(node);
            if kind == OpKind::LoopEnd || cx.names.is_named(node) {
                continue;
            }
            if kind == OpKind::LoopIndexedDep {
                cx.names.resolve(&cx.input, node)?;
            } else {
                let name = cx.names.generator().dependent(i);
                cx.names.assign(node, name);
            }
        }
        Ok(())
    }

    /// Positions of dependents whose variable already belongs to an
    /// earlier dependent.
    fn find_duplicates(&self, cx: &mut RenderContext<'_>) -> Vec<usize> {
        let graph = cx.input.graph;
        let dependents = cx.input.dependents;
        let mut duplicates = Vec::new();
        for (i, dependent) in dependents.iter().enumerate() {
            let Some(node) = dependent.node() else {
                continue;
            };
            let op = graph.node(node);
            if matches!(op.kind(), OpKind::Inv | OpKind::LoopEnd) || op.variable_id() == 0 {
                continue;
            }
            if !cx.names.register_dependent(op.variable_id(), i) {
                duplicates.push(i);
            }
        }
        duplicates
    }

    /// Name every temporary used more than once, and every array.
    ///
    /// Independents and dependents keep the names of their roles.
    fn name_temporaries(&self, cx: &mut RenderContext<'_>) {
        let graph = cx.input.graph;
        let order = cx.input.order;
        for &node in order {
            let op = graph.node(node);
            let id = op.variable_id();
            if id == 0
                || matches!(op.kind(), OpKind::Inv | OpKind::IndexDeclaration)
                || cx.input.is_dependent(node)
            {
                continue;
            }
            let name = match op.kind() {
                OpKind::ArrayCreation => cx.names.generator().temporary_array(id, op.args().len()),
                OpKind::SparseArrayCreation => {
                    cx.names.generator().temporary_sparse_array(id, op.args().len())
                }
                kind if requires_variable_name(kind, op.use_count()) => {
                    cx.names.generator().temporary(id)
                }
                _ => continue,
            };
            cx.names.assign(node, name);
        }
    }

    fn zero_dependents(&self, cx: &mut RenderContext<'_>) {
        let zero = self.parameter(0.0);
        let m = &self.markup;
        let dependents = cx.input.dependents;
        for (i, dependent) in dependents.iter().enumerate() {
            let name = cx.names.generator().dependent(i);
            cx.write(&m.equation_start);
            match dependent.node() {
                Some(node) => {
                    let id = cx.node_occurrence_id(node);
                    cx.write(&format!("<mrow id='{id}' class='dep'>{name}</mrow>"));
                }
                None => cx.write(&format!("<mrow class='dep'>{name}</mrow>")),
            }
            cx.write(&m.assign);
            cx.write(&zero);
            cx.write(&m.equation_end);
            cx.write(&m.endline);
        }
    }

    // ── Trailing sections ───────────────────────────────────────────

    /// `y_i = y_k` for every dependent sharing the variable of an earlier one.
    fn write_duplicates(&self, cx: &mut RenderContext<'_>, duplicates: &[usize]) -> Result<()> {
        if duplicates.is_empty() {
            return Ok(());
        }
        let m = &self.markup;
        let dependents = cx.input.dependents;
        cx.write(&format!("<!-- variable duplicates: {} -->", duplicates.len()));
        cx.write(&m.endline);

        for &i in duplicates {
            let Some(node) = dependents.get(i).and_then(|dep| dep.node()) else {
                continue;
            };
            let name = cx.names.generator().dependent(i);
            let original = cx.names.resolve(&cx.input, node)?;
            let target_id = cx.node_occurrence_id(node);
            let source_id = cx.node_occurrence_id(node);
            cx.write(&m.equation_start);
            cx.write(&format!("<mrow id='{target_id}' class='dep'>{name}</mrow>"));
            cx.write(&m.assign);
            cx.write(&format!("<mrow id='{source_id}' class='dep'>{original}</mrow>"));
            cx.write(&m.equation_end);
            cx.write(&m.endline);
        }
        Ok(())
    }

    /// Dependents that are literals or independents: no operation writes
    /// them, so they are assigned here.
    fn write_dependents_without_operations(&self, cx: &mut RenderContext<'_>) -> Result<()> {
        let graph = cx.input.graph;
        let dependents = cx.input.dependents;
        let ignore_zero = self.options.ignore_zero_dependent_assign;
        let m = &self.markup;
        let mut header = false;

        for (i, &dependent) in dependents.iter().enumerate() {
            let independent = match dependent {
                Argument::Constant(_) if ignore_zero && dependent.is_identical_zero() => continue,
                Argument::Constant(_) => None,
                Argument::Node(node) if graph.kind(node) == OpKind::Inv => Some(node),
                Argument::Node(_) => continue,
            };

            if !header {
                cx.write("<!-- dependent variables without operations -->");
                cx.write(&m.endline);
                header = true;
            }
            let name = cx.names.generator().dependent(i);
            cx.write(&m.equation_start);
            match (dependent, independent) {
                (_, Some(node)) => {
                    let target_id = cx.node_occurrence_id(node);
                    cx.write(&format!("<mrow id='{target_id}' class='dep'>{name}</mrow>"));
                    cx.write(&m.assign);
                    let source = cx.names.resolve(&cx.input, node)?;
                    let source_id = cx.node_occurrence_id(node);
                    cx.write(&format!("<mrow id='{source_id}' class='indep'>{source}</mrow>"));
                }
                (Argument::Constant(value), None) => {
                    cx.write(&format!("<mrow class='dep'>{name}</mrow>"));
                    cx.write(&m.assign);
                    cx.write(&self.parameter(value));
                }
                (Argument::Node(_), None) => {}
            }
            cx.write(&m.equation_end);
            cx.write(&m.endline);
        }
        Ok(())
    }
}

/// Whether a node used `use_count` times gets a name before rendering.
///
/// Structural kinds never hold a value of their own.
fn requires_variable_name(kind: OpKind, use_count: u32) -> bool {
    use_count > 1
        && !matches!(
            kind,
            OpKind::AtomicForward
                | OpKind::AtomicReverse
                | OpKind::LoopStart
                | OpKind::LoopEnd
                | OpKind::Index
                | OpKind::IndexAssign
                | OpKind::StartIf
                | OpKind::ElseIf
                | OpKind::Else
                | OpKind::EndIf
                | OpKind::CondResult
                | OpKind::LoopIndexedTmp
                | OpKind::Tmp
        )
}

impl Language for MathMl {
    fn creates_new_variable(&self, kind: OpKind, use_count: u32) -> bool {
        if use_count > 1 {
            return !matches!(
                kind,
                OpKind::ArrayElement | OpKind::Index | OpKind::IndexDeclaration | OpKind::Tmp
            );
        }
        kind.is_array_creation()
            || kind.is_atomic()
            || kind.is_comparison()
            || matches!(
                kind,
                OpKind::LoopIndexedDep
                    | OpKind::LoopIndexedTmp
                    | OpKind::IndexAssign
                    | OpKind::Assign
            )
    }

    fn directly_assigns_variable(&self, kind: OpKind) -> bool {
        kind.is_comparison()
            || kind.is_array_creation()
            || kind.is_atomic()
            || kind.is_conditional_structure()
            || matches!(
                kind,
                OpKind::DependentMultiAssign
                    | OpKind::LoopStart
                    | OpKind::LoopEnd
                    | OpKind::IndexAssign
                    | OpKind::IndexDeclaration
            )
    }

    fn requires_variable_argument(&self, kind: OpKind, _arg_index: usize) -> bool {
        kind == OpKind::CondResult
    }

    fn render(&self, cx: &mut RenderContext<'_>, node: NodeId) -> Result<u32> {
        self.render_statement(cx, node)
    }

    fn generate(
        &self,
        input: &GenerationInput<'_>,
        names: &mut dyn NameGenerator,
        units: Option<&mut BTreeMap<String, String>>,
    ) -> Result<String> {
        self.options.validate(units.is_some())?;
        tracing::debug!(
            independents = input.independent_count(),
            dependents = input.dependents.len(),
            nodes = input.order.len(),
            "generating MathML"
        );

        names.begin_run(input.min_temporary_id);
        let budget = if units.is_some() {
            self.options.max_assignments_per_unit
        } else {
            0
        };
        let mut partitioner = Partitioner::new(budget, self.options.base_name.clone(), UNIT_EXTENSION);
        let mut cx = RenderContext::new(*input, names);

        self.name_independents(&mut cx)?;
        self.name_dependents(&mut cx)?;
        let duplicates = self.find_duplicates(&mut cx);

        if !input.order.is_empty() {
            self.name_temporaries(&mut cx);
            if input.zero_dependents {
                self.zero_dependents(&mut cx);
            }

            for &node in input.order {
                if partitioner.should_split(cx.has_open_loops()) {
                    let body = cx.take_output();
                    partitioner.split(&body, cx.names.generator());
                }
                let kind = input.graph.kind(node);
                if matches!(kind, OpKind::Inv | OpKind::DependentRefRhs | OpKind::TmpDcl) {
                    continue;
                }
                // Values without a variable are rendered where they are used.
                if !self.directly_assigns_variable(kind) && input.graph.variable_id(node) == 0 {
                    continue;
                }
                let statements = self.render(&mut cx, node)?;
                partitioner.record(statements);
            }

            if let Some(open) = cx.current_loop() {
                return Err(CodegenError::malformed(
                    open,
                    input.graph.kind(open),
                    "loop is never closed",
                ));
            }
            if let Some(open) = cx.current_branch() {
                return Err(CodegenError::malformed(
                    open,
                    input.graph.kind(open),
                    "conditional is never closed",
                ));
            }
            if partitioner.has_split() && !cx.output().is_empty() {
                let body = cx.take_output();
                partitioner.split(&body, cx.names.generator());
            }
        }

        self.write_duplicates(&mut cx, &duplicates)?;
        self.write_dependents_without_operations(&mut cx)?;

        let mut main = String::new();
        self.document_start(&mut main);
        self.part_links(&mut main, &partitioner);
        main.push_str(cx.output());
        self.document_end(&mut main);

        tracing::debug!(
            parts = partitioner.parts().len(),
            bytes = main.len(),
            "generated MathML"
        );
        if let Some(units) = units {
            units.extend(partitioner.into_units(main.clone()));
        }
        Ok(main)
    }
}

#[cfg(test)]
mod tests;
