//! Loops, structured conditionals, comparisons and index statements.

use tapegen_ir::{Argument, NodeId, OpKind};

use super::index::{guard_markup, pattern_markup};
use super::MathMl;
use crate::context::RenderContext;
use crate::error::{CodegenError, Result};
use crate::names::{index_name, node_pattern};

impl MathMl {
    // ── Loops ───────────────────────────────────────────────────────

    pub(super) fn render_loop_start(&self, cx: &mut RenderContext<'_>, node: NodeId) -> Result<()> {
        let graph = cx.input.graph;
        let op = graph.node(node);

        let declaration = node_arg(cx, node, 0)?;
        let index = index_name(graph, declaration)?;

        let last = match op.arg(1) {
            Some(Argument::Node(count)) => {
                let count = index_name(graph, count)?;
                format!("<mi>{count}</mi><mo>-</mo><mn>1</mn>")
            }
            Some(Argument::Constant(_)) => {
                return Err(CodegenError::malformed(
                    node,
                    op.kind(),
                    "iteration count must be an index",
                ));
            }
            None => match op.info().first() {
                Some(&count) if count > 0 => format!("<mn>{}</mn>", count - 1),
                _ => {
                    return Err(CodegenError::malformed(
                        node,
                        op.kind(),
                        "loop without iterations",
                    ));
                }
            },
        };

        cx.push_loop(node);
        let m = &self.markup;
        cx.write(&m.for_start);
        cx.write(&m.equation_start);
        cx.write(&format!(
            "<mi>for</mi><mfenced><mrow><mi>{index}</mi><mo>&isin;</mo>\
             <mfenced open='[' close=']' separators=';'><mn>0</mn>{last}</mfenced>\
             </mrow></mfenced>"
        ));
        cx.write(&m.equation_end);
        cx.write(&m.endline);
        cx.write(&m.for_body_start);
        cx.indent();
        Ok(())
    }

    pub(super) fn render_loop_end(&self, cx: &mut RenderContext<'_>, node: NodeId) -> Result<()> {
        let kind = cx.input.graph.kind(node);
        let start = node_arg(cx, node, 0)?;
        let open = cx
            .pop_loop()
            .ok_or_else(|| CodegenError::malformed(node, kind, "no open loop to close"))?;
        if open != start {
            return Err(CodegenError::malformed(
                node,
                kind,
                format!("closes loop {start} but the innermost open loop is {open}"),
            ));
        }

        cx.dedent();
        let m = &self.markup;
        cx.write(&m.for_body_end);
        cx.write(&m.for_end);
        cx.write(&m.endline);
        Ok(())
    }

    // ── Structured conditionals ─────────────────────────────────────

    pub(super) fn render_start_if(&self, cx: &mut RenderContext<'_>, node: NodeId) -> Result<()> {
        let condition = node_arg(cx, node, 0)?;
        let guard = self.index_condition(cx, condition)?;
        self.open_branch(cx, node, &self.markup.if_start, "if", Some(&guard));
        Ok(())
    }

    pub(super) fn render_else_if(&self, cx: &mut RenderContext<'_>, node: NodeId) -> Result<()> {
        let previous = node_arg(cx, node, 0)?;
        let condition = node_arg(cx, node, 1)?;
        let guard = self.index_condition(cx, condition)?;
        self.close_branch(cx, node, previous, false)?;
        self.open_branch(cx, node, &self.markup.else_if_start, "else if", Some(&guard));
        Ok(())
    }

    pub(super) fn render_else(&self, cx: &mut RenderContext<'_>, node: NodeId) -> Result<()> {
        let previous = node_arg(cx, node, 0)?;
        self.close_branch(cx, node, previous, false)?;
        self.open_branch(cx, node, &self.markup.else_start, "else", None);
        Ok(())
    }

    pub(super) fn render_end_if(&self, cx: &mut RenderContext<'_>, node: NodeId) -> Result<()> {
        let previous = node_arg(cx, node, 0)?;
        self.close_branch(cx, node, previous, true)
    }

    pub(super) fn render_cond_result(&self, cx: &mut RenderContext<'_>, node: NodeId) -> Result<u32> {
        node_arg(cx, node, 0)?;
        let value = node_arg(cx, node, 1)?;
        self.render_statement(cx, value)
    }

    /// `{start}if (guard) {body-start}`; the body is indented.
    fn open_branch(
        &self,
        cx: &mut RenderContext<'_>,
        node: NodeId,
        start: &str,
        keyword: &str,
        guard: Option<&str>,
    ) {
        cx.push_branch(node);
        let m = &self.markup;
        cx.write(start);
        cx.write(&m.equation_start);
        cx.write(&format!("<mi>{keyword}</mi>"));
        if let Some(guard) = guard {
            cx.write(&format!("<mfenced><mrow>{guard}</mrow></mfenced>"));
        }
        cx.write(&m.equation_end);
        cx.write(&m.endline);
        cx.write(&m.cond_body_start);
        cx.write(&m.endline);
        cx.indent();
    }

    /// Close the body of `previous` and its branch block.
    ///
    /// `previous` must be the innermost open branch. An `Else` branch can
    /// only be closed by `EndIf`.
    fn close_branch(
        &self,
        cx: &mut RenderContext<'_>,
        node: NodeId,
        previous: NodeId,
        allow_else: bool,
    ) -> Result<()> {
        let kind = cx.input.graph.kind(node);
        let m = &self.markup;
        let end = match cx.input.graph.kind(previous) {
            OpKind::StartIf => &m.if_end,
            OpKind::ElseIf => &m.else_if_end,
            OpKind::Else if allow_else => &m.else_end,
            other => {
                return Err(CodegenError::malformed(
                    node,
                    kind,
                    format!("cannot follow a {other} branch"),
                ));
            }
        };
        let open = cx
            .pop_branch()
            .ok_or_else(|| CodegenError::malformed(node, kind, "no open branch to close"))?;
        if open != previous {
            return Err(CodegenError::malformed(
                node,
                kind,
                format!("follows branch {previous} but the innermost open branch is {open}"),
            ));
        }

        cx.dedent();
        cx.write(&m.cond_body_end);
        cx.write(&m.endline);
        cx.write(end);
        cx.write(&m.endline);
        Ok(())
    }

    // ── Comparisons ─────────────────────────────────────────────────

    /// `left OP right ? t : f` as an if/else pair of assignments.
    ///
    /// Identical branches collapse into a single assignment.
    pub(super) fn render_comparison(&self, cx: &mut RenderContext<'_>, node: NodeId) -> Result<()> {
        let graph = cx.input.graph;
        let op = graph.node(node);
        let [left, right, when_true, when_false] = *op.args() else {
            return Err(CodegenError::malformed(
                node,
                op.kind(),
                "comparison needs four arguments",
            ));
        };
        let operator = comparison_operator(op.kind())
            .ok_or_else(|| CodegenError::malformed(node, op.kind(), "not a comparison"))?;

        if when_true.is_identical(when_false) {
            self.assignment_start(cx, node)?;
            self.render_arg(cx, when_true)?;
            self.assignment_end(cx);
            return Ok(());
        }

        let m = &self.markup;
        cx.write(&m.if_start);
        cx.write(&m.equation_start);
        cx.write("<mi>if</mi><mfenced><mrow>");
        self.render_arg(cx, left)?;
        cx.write(&format!("<mo>{operator}</mo>"));
        self.render_arg(cx, right)?;
        cx.write("</mrow></mfenced>");
        cx.write(&m.equation_end);
        cx.write(&m.endline);
        cx.write(&m.cond_body_start);
        cx.write(&m.endline);
        self.assignment_start(cx, node)?;
        self.render_arg(cx, when_true)?;
        self.assignment_end(cx);
        cx.write(&m.cond_body_end);
        cx.write(&m.endline);
        cx.write(&m.if_end);
        cx.write(&m.endline);

        cx.write(&m.else_start);
        cx.write(&m.equation_start);
        cx.write("<mi>else</mi>");
        cx.write(&m.equation_end);
        cx.write(&m.endline);
        cx.write(&m.cond_body_start);
        cx.write(&m.endline);
        self.assignment_start(cx, node)?;
        self.render_arg(cx, when_false)?;
        self.assignment_end(cx);
        cx.write(&m.cond_body_end);
        cx.write(&m.endline);
        cx.write(&m.else_end);
        cx.write(&m.endline);
        Ok(())
    }

    // ── Indices ─────────────────────────────────────────────────────

    /// The range guard of an `IndexCondExpr`.
    pub(super) fn index_condition(&self, cx: &RenderContext<'_>, node: NodeId) -> Result<String> {
        let graph = cx.input.graph;
        let op = graph.node(node);
        if op.kind() != OpKind::IndexCondExpr {
            return Err(CodegenError::malformed(
                node,
                op.kind(),
                "expected an index condition",
            ));
        }
        let index = op
            .arg(0)
            .and_then(Argument::node)
            .filter(|&index| graph.kind(index) == OpKind::Index)
            .ok_or_else(|| CodegenError::malformed(node, op.kind(), "condition without an index"))?;
        let name = index_name(graph, index)?;
        guard_markup(op.info(), name)
            .ok_or_else(|| CodegenError::malformed(node, op.kind(), "incomplete index range"))
    }

    /// `j = pattern(...)`.
    pub(super) fn render_index_assign(&self, cx: &mut RenderContext<'_>, node: NodeId) -> Result<()> {
        let graph = cx.input.graph;
        let declaration = node_arg(cx, node, 0)?;
        let index = index_name(graph, declaration)?;
        let pattern = node_pattern(&cx.input, node, 0)?;
        let pattern_index = index_name(graph, pattern.index())?;
        let value = pattern_markup(pattern.strategy(), pattern_index);

        let m = &self.markup;
        cx.write(&m.equation_start);
        cx.write(&format!("<mi>{index}</mi>"));
        cx.write(&m.assign);
        cx.write(&value);
        cx.write(&m.equation_end);
        cx.write(&m.endline);
        Ok(())
    }

    // ── Dependents ──────────────────────────────────────────────────

    /// `dep += value` with the first argument that carries a value.
    pub(super) fn render_dependent_multi_assign(
        &self,
        cx: &mut RenderContext<'_>,
        node: NodeId,
    ) -> Result<u32> {
        let graph = cx.input.graph;
        let value = graph.node(node).args().iter().copied().find(|arg| match arg {
            Argument::Constant(_) => true,
            Argument::Node(n) => !matches!(
                graph.kind(*n),
                OpKind::DependentRefRhs | OpKind::LoopEnd | OpKind::EndIf
            ),
        });
        let Some(value) = value else {
            return Ok(0);
        };

        self.assignment_start(cx, node)?;
        self.render_arg(cx, value)?;
        self.assignment_end(cx);
        Ok(1)
    }
}

/// Argument `index` of `node`, which must be another node.
pub(super) fn node_arg(cx: &RenderContext<'_>, node: NodeId, index: usize) -> Result<NodeId> {
    let op = cx.input.graph.node(node);
    op.arg(index).and_then(Argument::node).ok_or_else(|| {
        CodegenError::malformed(
            node,
            op.kind(),
            format!("argument {index} must be an operation"),
        )
    })
}

fn comparison_operator(kind: OpKind) -> Option<&'static str> {
    let operator = match kind {
        OpKind::ComLt => "&lt;",
        OpKind::ComLe => "&le;",
        OpKind::ComEq => "==",
        OpKind::ComGe => "&ge;",
        OpKind::ComGt => "&gt;",
        OpKind::ComNe => "&ne;",
        _ => return None,
    };
    Some(operator)
}
