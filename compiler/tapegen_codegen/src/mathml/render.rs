//! Statement and expression rendering.

use tapegen_ir::{Argument, NodeId, OpKind, OperationGraph};

use super::MathMl;
use crate::context::RenderContext;
use crate::error::{CodegenError, Result};
use crate::language::Language;
use crate::literal::{format_general, split_exponent};
use crate::names::{index_name, tmp_declaration};

impl MathMl {
    /// Render one visited node as a statement.
    pub(super) fn render_statement(&self, cx: &mut RenderContext<'_>, node: NodeId) -> Result<u32> {
        let kind = cx.input.graph.kind(node);
        tracing::trace!(node = node.raw(), %kind, "render statement");

        let direct = self.directly_assigns_variable(kind);
        if !direct {
            self.assignment_start(cx, node)?;
        }
        let statements = self.render_body(cx, node)?;
        if !direct {
            self.assignment_end(cx);
        }

        if kind == OpKind::ArrayElement {
            self.release_array_element(cx, node)?;
        }
        Ok(statements)
    }

    /// `<target> =` (or `+=` for accumulating dependents).
    pub(super) fn assignment_start(&self, cx: &mut RenderContext<'_>, target: NodeId) -> Result<()> {
        let name = cx.names.resolve(&cx.input, target)?;
        let class = if cx.input.is_dependent(target) {
            "dep"
        } else {
            "tmp"
        };
        let id = cx.node_occurrence_id(target);

        let op = cx.input.graph.node(target);
        let accumulate = match op.kind() {
            OpKind::DependentMultiAssign => true,
            OpKind::LoopIndexedDep => op.info().get(1) == Some(&1),
            _ => false,
        };

        cx.write(&self.markup.equation_start);
        cx.write(&format!("<mrow id='{id}' class='{class}'>{name}</mrow>"));
        cx.write(if accumulate {
            &self.markup.add_assign
        } else {
            &self.markup.assign
        });
        Ok(())
    }

    pub(super) fn assignment_end(&self, cx: &mut RenderContext<'_>) {
        cx.write(&self.markup.equation_end);
        cx.write(&self.markup.endline);
    }

    /// Render an argument: a literal or a node expression.
    pub(super) fn render_arg(&self, cx: &mut RenderContext<'_>, arg: Argument) -> Result<u32> {
        match arg {
            Argument::Constant(value) => {
                let literal = self.parameter(value);
                cx.write(&literal);
                Ok(1)
            }
            Argument::Node(node) => self.render_expression(cx, node),
        }
    }

    /// Render a node used as a value: its variable if it has one,
    /// otherwise its expression inline.
    fn render_expression(&self, cx: &mut RenderContext<'_>, node: NodeId) -> Result<u32> {
        let op = cx.input.graph.node(node);
        let id = op.variable_id();
        if id == 0 {
            return self.render_body(cx, node);
        }

        let kind = op.kind();
        let class = if id >= cx.input.min_temporary_id
            || matches!(
                kind,
                OpKind::ArrayCreation
                    | OpKind::SparseArrayCreation
                    | OpKind::LoopIndexedDep
                    | OpKind::LoopIndexedIndep
            ) {
            "tmp"
        } else if id <= cx.input.independent_count() {
            "indep"
        } else {
            "dep"
        };
        let name = cx.names.resolve(&cx.input, node)?;
        let occurrence = cx.occurrence_id(id);
        cx.write(&format!("<mrow id='{occurrence}' class='{class}'>{name}</mrow>"));
        Ok(1)
    }

    /// Dispatch on the node kind, ignoring any variable the node has.
    pub(super) fn render_body(&self, cx: &mut RenderContext<'_>, node: NodeId) -> Result<u32> {
        let graph = cx.input.graph;
        graph.validate_arity(node)?;
        let op = graph.node(node);
        let kind = op.kind();

        match kind {
            OpKind::ArrayCreation | OpKind::SparseArrayCreation => {
                return self.render_array_creation(cx, node);
            }
            OpKind::ArrayElement => self.render_array_element(cx, node)?,
            OpKind::Assign | OpKind::Alias => return self.render_arg(cx, arg(op_args(graph, node), 0)),
            OpKind::Abs
            | OpKind::Acos
            | OpKind::Asin
            | OpKind::Atan
            | OpKind::Cos
            | OpKind::Cosh
            | OpKind::Exp
            | OpKind::Log
            | OpKind::Sign
            | OpKind::Sin
            | OpKind::Sinh
            | OpKind::Sqrt
            | OpKind::Tan
            | OpKind::Tanh => self.render_unary_function(cx, node)?,
            OpKind::AtomicForward => self.render_atomic_forward(cx, node)?,
            OpKind::AtomicReverse => self.render_atomic_reverse(cx, node)?,
            OpKind::Add => {
                let args = op_args(graph, node);
                self.render_arg(cx, arg(args, 0))?;
                cx.write("<mo>+</mo>");
                self.render_arg(cx, arg(args, 1))?;
            }
            OpKind::Sub => self.render_sub(cx, node)?,
            OpKind::Mul => self.render_mul(cx, node)?,
            OpKind::Div => {
                let args = op_args(graph, node);
                cx.write("<mfrac><mrow>");
                self.render_arg(cx, arg(args, 0))?;
                cx.write("</mrow><mrow>");
                self.render_arg(cx, arg(args, 1))?;
                cx.write("</mrow></mfrac>");
            }
            OpKind::Pow => self.render_pow(cx, node)?,
            OpKind::UnMinus => {
                let operand = arg(op_args(graph, node), 0);
                cx.write("<mo>-</mo>");
                self.render_factor(cx, operand, encloses_in_product(graph, operand))?;
            }
            OpKind::ComLt
            | OpKind::ComLe
            | OpKind::ComEq
            | OpKind::ComGe
            | OpKind::ComGt
            | OpKind::ComNe => self.render_comparison(cx, node)?,
            OpKind::Inv => {
                if op.variable_id() == 0 {
                    return Err(CodegenError::malformed(
                        node,
                        kind,
                        "independent without a variable id",
                    ));
                }
                let name = cx.names.resolve(&cx.input, node)?;
                let occurrence = cx.node_occurrence_id(node);
                cx.write(&format!("<mrow id='{occurrence}' class='indep'>{name}</mrow>"));
            }
            OpKind::DependentMultiAssign => return self.render_dependent_multi_assign(cx, node),
            OpKind::Index => {
                let name = index_name(graph, node)?;
                cx.write(&format!("<mi>{name}</mi>"));
                return Ok(0);
            }
            OpKind::IndexDeclaration | OpKind::TmpDcl => return Ok(0),
            OpKind::IndexAssign => self.render_index_assign(cx, node)?,
            OpKind::IndexCondExpr => {
                let guard = self.index_condition(cx, node)?;
                cx.write(&guard);
            }
            OpKind::LoopStart => self.render_loop_start(cx, node)?,
            OpKind::LoopEnd => self.render_loop_end(cx, node)?,
            OpKind::LoopIndexedIndep => {
                let name = cx.names.resolve(&cx.input, node)?;
                cx.write(&format!("<mrow class='indep'>{name}</mrow>"));
            }
            OpKind::LoopIndexedDep => {
                self.render_arg(cx, arg(op_args(graph, node), 0))?;
            }
            OpKind::LoopIndexedTmp => {
                tmp_declaration(graph, node)?;
                self.render_arg(cx, arg(op_args(graph, node), 1))?;
            }
            OpKind::Tmp => {
                let declaration = tmp_declaration(graph, node)?;
                let name = cx.names.resolve(&cx.input, declaration)?;
                let occurrence = cx.node_occurrence_id(declaration);
                cx.write(&format!("<mrow id='{occurrence}' class='tmp'>{name}</mrow>"));
            }
            OpKind::StartIf => self.render_start_if(cx, node)?,
            OpKind::ElseIf => self.render_else_if(cx, node)?,
            OpKind::Else => self.render_else(cx, node)?,
            OpKind::EndIf => self.render_end_if(cx, node)?,
            OpKind::CondResult => return self.render_cond_result(cx, node),
            OpKind::DependentRefRhs => {
                return Err(CodegenError::malformed(
                    node,
                    kind,
                    "right-hand-side dependent reference cannot be rendered",
                ));
            }
        }
        Ok(1)
    }

    fn render_unary_function(&self, cx: &mut RenderContext<'_>, node: NodeId) -> Result<()> {
        let graph = cx.input.graph;
        let kind = graph.kind(node);
        let operand = arg(op_args(graph, node), 0);

        if kind == OpKind::Sqrt {
            cx.write("<msqrt><mrow>");
            self.render_arg(cx, operand)?;
            cx.write("</mrow></msqrt>");
            return Ok(());
        }

        let name = function_name(kind)
            .ok_or_else(|| CodegenError::malformed(node, kind, "not a unary function"))?;
        cx.write(&format!(
            "<mi>{name}</mi><mo>&ApplyFunction;</mo><mfenced><mrow>"
        ));
        self.render_arg(cx, operand)?;
        cx.write("</mrow></mfenced>");
        Ok(())
    }

    fn render_pow(&self, cx: &mut RenderContext<'_>, node: NodeId) -> Result<()> {
        let graph = cx.input.graph;
        let args = op_args(graph, node);
        let (base, exponent) = (arg(args, 0), arg(args, 1));

        cx.write("<msup>");
        self.render_script(cx, base, encloses_in_power(graph, base))?;
        self.render_script(cx, exponent, encloses_in_power(graph, exponent))?;
        cx.write("</msup>");
        Ok(())
    }

    fn render_sub(&self, cx: &mut RenderContext<'_>, node: NodeId) -> Result<()> {
        let graph = cx.input.graph;
        let args = op_args(graph, node);
        let (left, right) = (arg(args, 0), arg(args, 1));

        self.render_arg(cx, left)?;
        cx.write("<mo>-</mo>");
        self.render_factor(cx, right, encloses_in_product(graph, right))?;
        Ok(())
    }

    fn render_mul(&self, cx: &mut RenderContext<'_>, node: NodeId) -> Result<()> {
        let graph = cx.input.graph;
        let args = op_args(graph, node);
        let (left, right) = (arg(args, 0), arg(args, 1));

        self.render_factor(cx, left, encloses_in_product(graph, left))?;
        // Two adjacent literals would read as a single number.
        if is_number(graph, left, 1) && is_number(graph, right, 0) {
            cx.write("<mo>&times;</mo>");
        } else {
            cx.write("<mo>&it;</mo>");
        }
        self.render_factor(cx, right, encloses_in_product(graph, right))?;
        Ok(())
    }

    /// Render `arg`, in parentheses when `enclose` is set.
    fn render_factor(&self, cx: &mut RenderContext<'_>, arg: Argument, enclose: bool) -> Result<()> {
        if enclose {
            cx.write("<mfenced><mrow>");
        }
        self.render_arg(cx, arg)?;
        if enclose {
            cx.write("</mrow></mfenced>");
        }
        Ok(())
    }

    /// Render `arg` as a single `msup` child, parenthesized when `enclose`
    /// is set.
    fn render_script(&self, cx: &mut RenderContext<'_>, arg: Argument, enclose: bool) -> Result<()> {
        if enclose {
            cx.write("<mfenced>");
        }
        cx.write("<mrow>");
        self.render_arg(cx, arg)?;
        cx.write("</mrow>");
        if enclose {
            cx.write("</mfenced>");
        }
        Ok(())
    }

    /// A numeric literal; exponents become `m × 10^e`.
    pub(super) fn parameter(&self, value: f64) -> String {
        let text = format_general(value, self.options.parameter_precision);
        let split = split_exponent(&text);
        match split.exponent {
            Some(exponent) => format!(
                "<mn>{}</mn><mo>&times;</mo><msup><mn>10</mn><mn>{exponent}</mn></msup>",
                split.mantissa
            ),
            None => format!("<mn>{text}</mn>"),
        }
    }
}

// ── Argument access ─────────────────────────────────────────────────

/// Arguments of a node whose arity was validated.
fn op_args(graph: &OperationGraph, node: NodeId) -> &[Argument] {
    graph.node(node).args()
}

/// Argument `index`; arity validation guarantees it exists.
fn arg(args: &[Argument], index: usize) -> Argument {
    args.get(index).copied().unwrap_or(Argument::Constant(0.0))
}

// ── Parenthesization ────────────────────────────────────────────────

/// Operand of `*`, `-` (right side) or unary `-`.
///
/// Negative literals are always enclosed. A node is enclosed when it is
/// rendered inline (no variable after following aliases) and is not a
/// product, a quotient or a function call.
pub(super) fn encloses_in_product(graph: &OperationGraph, arg: Argument) -> bool {
    match arg {
        Argument::Constant(value) => value < 0.0,
        Argument::Node(node) => graph.resolve_alias(node).is_some_and(|target| {
            let op = graph.node(target);
            op.variable_id() == 0
                && !matches!(op.kind(), OpKind::Div | OpKind::Mul)
                && !op.kind().is_function()
        }),
    }
}

/// Base or exponent of a power: any inline non-function is enclosed.
pub(super) fn encloses_in_power(graph: &OperationGraph, arg: Argument) -> bool {
    match arg {
        Argument::Constant(_) => false,
        Argument::Node(node) => graph.resolve_alias(node).is_some_and(|target| {
            let op = graph.node(target);
            op.variable_id() == 0 && !op.kind().is_function()
        }),
    }
}

/// Whether the factor adjacent to the operator is a literal.
///
/// Walks through aliases, into argument `pos` of products, and into the
/// base of powers when looking at the leftmost factor (`pos == 0`).
pub(super) fn is_number(graph: &OperationGraph, arg: Argument, pos: usize) -> bool {
    let mut current = arg;
    loop {
        let Argument::Node(node) = current else {
            return true;
        };
        let op = graph.node(node);
        let next = match op.kind() {
            OpKind::Alias => op.arg(0),
            OpKind::Mul => op.arg(pos),
            OpKind::Pow if pos == 0 => op.arg(0),
            _ => return false,
        };
        let Some(next) = next else {
            return false;
        };
        current = next;
    }
}

/// Function name of a unary function kind (`Sqrt` uses a radical).
fn function_name(kind: OpKind) -> Option<&'static str> {
    let name = match kind {
        OpKind::Abs => "abs",
        OpKind::Acos => "arccos",
        OpKind::Asin => "arcsin",
        OpKind::Atan => "arctan",
        OpKind::Cosh => "cosh",
        OpKind::Cos => "cos",
        OpKind::Exp => "exp",
        OpKind::Log => "ln",
        OpKind::Sinh => "sinh",
        OpKind::Sign => "sgn",
        OpKind::Sin => "sin",
        OpKind::Tanh => "tanh",
        OpKind::Tan => "tan",
        _ => return None,
    };
    Some(name)
}
