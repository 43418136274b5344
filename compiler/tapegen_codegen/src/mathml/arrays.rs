//! Temporary arrays and atomic function calls.
//!
//! Array creations share two temporary arrays (dense and sparse). The
//! render context remembers what each slot holds, so re-creating an array
//! with partly identical contents only writes the slots that changed.

use tapegen_ir::{NodeId, OpKind};

use super::control::node_arg;
use super::MathMl;
use crate::context::{ArraySpace, RenderContext};
use crate::error::{CodegenError, Result};

impl MathMl {
    /// One assignment per element whose slot does not already hold it.
    pub(super) fn render_array_creation(&self, cx: &mut RenderContext<'_>, node: NodeId) -> Result<u32> {
        let graph = cx.input.graph;
        let op = graph.node(node);
        let space = array_space(cx, node)?;
        let first = array_offset(cx, node)?;

        if space == ArraySpace::Sparse && op.info().len() != op.args().len() + 1 {
            return Err(CodegenError::malformed(
                node,
                op.kind(),
                "sparse array needs its length and one position per value",
            ));
        }

        let mut written = 0;
        for (i, &value) in op.args().iter().enumerate() {
            let slot = first + i;
            if cx.slot_holds(space, slot, value) {
                continue;
            }
            let element = element_name(cx, space, slot);
            let m = &self.markup;
            cx.write(&m.equation_start);
            cx.write(&format!("<mrow class='tmp'>{element}</mrow>"));
            cx.write(&m.assign);
            self.render_arg(cx, value)?;
            cx.write(&m.equation_end);
            cx.write(&m.endline);
            cx.set_slot(space, slot, value);
            written += 1;
        }

        tracing::trace!(node = node.raw(), written, "array creation");
        Ok(written)
    }

    /// `array[i]` read from the shared temporary array.
    pub(super) fn render_array_element(&self, cx: &mut RenderContext<'_>, node: NodeId) -> Result<()> {
        let (space, slot) = element_slot(cx, node)?;
        let element = element_name(cx, space, slot);
        cx.write(&format!("<mrow class='tmp'>{element}</mrow>"));
        Ok(())
    }

    /// The producer may overwrite the slot an element was read from.
    pub(super) fn release_array_element(&self, cx: &mut RenderContext<'_>, node: NodeId) -> Result<()> {
        let (space, slot) = element_slot(cx, node)?;
        cx.invalidate_slot(space, slot);
        Ok(())
    }

    // ── Atomic functions ────────────────────────────────────────────

    /// `name.forward(q, p, atx, &aty)`.
    ///
    /// Arguments are `tx[0..=p]` followed by `ty[0..=p]`.
    pub(super) fn render_atomic_forward(&self, cx: &mut RenderContext<'_>, node: NodeId) -> Result<()> {
        let graph = cx.input.graph;
        let op = graph.node(node);
        let kind = op.kind();
        let [atomic, q, p] = *op.info() else {
            return Err(CodegenError::malformed(node, kind, "expected info [atomic, q, p]"));
        };
        let (order, expected) = atomic_arity(node, kind, p, 2)?;
        if op.args().len() != expected {
            return Err(CodegenError::malformed(
                node,
                kind,
                format!("expected {expected} arguments for order {p}"),
            ));
        }

        let tx = (0..order)
            .map(|k| node_arg(cx, node, k))
            .collect::<Result<Vec<_>>>()?;
        let ty = node_arg(cx, node, order + p)?;
        expect_kind(cx, node, tx[0], OpKind::ArrayCreation, "tx[0]")?;
        if p > 0 {
            expect_kind(cx, node, tx[1], OpKind::SparseArrayCreation, "tx[1]")?;
        }
        expect_kind(cx, node, ty, OpKind::ArrayCreation, "ty[p]")?;
        let name = atomic_name(cx, node, atomic)?;

        for (k, &array) in tx.iter().enumerate() {
            self.bind_array(cx, &format!("<msub><mi>atx</mi><mn>{k}</mn></msub>"), array)?;
        }
        self.bind_array(cx, "<mi>aty</mi>", ty)?;

        let m = &self.markup;
        cx.write(&m.equation_start);
        cx.write(&format!(
            "<mi>{name}</mi><mo>.</mo><mo>forward</mo><mfenced separators=','>\
             <mn>{q}</mn><mn>{p}</mn><mrow class='tmp'><mi>atx</mi></mrow>\
             <mrow><mo>&amp;</mo><mrow class='tmp'><mi>aty</mi></mrow></mrow></mfenced>"
        ));
        cx.write(&m.equation_end);
        cx.write(&m.endline);

        invalidate_array(cx, ty)?;
        Ok(())
    }

    /// `name.reverse(p, atx, &apx, apy)`.
    ///
    /// Arguments are `tx`, `ty`, `px` and `py`, each `p + 1` long.
    pub(super) fn render_atomic_reverse(&self, cx: &mut RenderContext<'_>, node: NodeId) -> Result<()> {
        let graph = cx.input.graph;
        let op = graph.node(node);
        let kind = op.kind();
        let [atomic, p] = *op.info() else {
            return Err(CodegenError::malformed(node, kind, "expected info [atomic, p]"));
        };
        let (order, expected) = atomic_arity(node, kind, p, 4)?;
        if op.args().len() != expected {
            return Err(CodegenError::malformed(
                node,
                kind,
                format!("expected {expected} arguments for order {p}"),
            ));
        }

        let tx = (0..order)
            .map(|k| node_arg(cx, node, k))
            .collect::<Result<Vec<_>>>()?;
        let px = node_arg(cx, node, 2 * order)?;
        let py = (0..order)
            .map(|k| node_arg(cx, node, 3 * order + k))
            .collect::<Result<Vec<_>>>()?;

        expect_kind(cx, node, tx[0], OpKind::ArrayCreation, "tx[0]")?;
        if p > 0 {
            expect_kind(cx, node, tx[1], OpKind::SparseArrayCreation, "tx[1]")?;
        }
        expect_kind(cx, node, px, OpKind::ArrayCreation, "px[0]")?;
        expect_kind(cx, node, py[0], OpKind::SparseArrayCreation, "py[0]")?;
        if p > 0 {
            expect_kind(cx, node, py[1], OpKind::ArrayCreation, "py[1]")?;
        }
        let name = atomic_name(cx, node, atomic)?;

        for (k, &array) in tx.iter().enumerate() {
            self.bind_array(cx, &format!("<msub><mi>atx</mi><mn>{k}</mn></msub>"), array)?;
        }
        for (k, &array) in py.iter().enumerate() {
            self.bind_array(cx, &format!("<msub><mi>apy</mi><mn>{k}</mn></msub>"), array)?;
        }
        self.bind_array(cx, "<mi>apx</mi>", px)?;

        let m = &self.markup;
        cx.write(&m.equation_start);
        cx.write(&format!(
            "<mi>{name}</mi><mo>.</mo><mo>reverse</mo><mfenced separators=','>\
             <mn>{p}</mn><mrow class='tmp'><mi>atx</mi></mrow>\
             <mrow><mo>&amp;</mo><mrow class='tmp'><mi>apx</mi></mrow></mrow>\
             <mrow class='tmp'><mi>apy</mi></mrow></mfenced>"
        ));
        cx.write(&m.equation_end);
        cx.write(&m.endline);

        invalidate_array(cx, px)?;
        Ok(())
    }

    /// `target = array` for an atomic call argument.
    fn bind_array(&self, cx: &mut RenderContext<'_>, target: &str, array: NodeId) -> Result<()> {
        let name = cx.names.resolve(&cx.input, array)?;
        let m = &self.markup;
        cx.write(&m.equation_start);
        cx.write(target);
        cx.write(&m.assign);
        cx.write(&format!("<mrow class='tmp'>{name}</mrow>"));
        cx.write(&m.equation_end);
        cx.write(&m.endline);
        Ok(())
    }
}

/// `p + 1` and the argument count `arrays * (p + 1)` of an atomic call.
fn atomic_arity(node: NodeId, kind: OpKind, p: usize, arrays: usize) -> Result<(usize, usize)> {
    p.checked_add(1)
        .and_then(|order| Some((order, order.checked_mul(arrays)?)))
        .ok_or_else(|| CodegenError::malformed(node, kind, format!("order {p} is out of range")))
}

fn array_space(cx: &RenderContext<'_>, node: NodeId) -> Result<ArraySpace> {
    let kind = cx.input.graph.kind(node);
    ArraySpace::of(kind).ok_or_else(|| CodegenError::malformed(node, kind, "expected an array"))
}

/// First slot of an array in its space (`variable_id - 1`).
fn array_offset(cx: &RenderContext<'_>, node: NodeId) -> Result<usize> {
    let op = cx.input.graph.node(node);
    op.variable_id()
        .checked_sub(1)
        .ok_or_else(|| CodegenError::malformed(node, op.kind(), "array without a variable id"))
}

/// Space and slot read by an `ArrayElement`.
fn element_slot(cx: &RenderContext<'_>, node: NodeId) -> Result<(ArraySpace, usize)> {
    let op = cx.input.graph.node(node);
    let array = node_arg(cx, node, 0)?;
    let position = op.info().first().copied().ok_or_else(|| {
        CodegenError::malformed(node, op.kind(), "element without a position")
    })?;
    Ok((array_space(cx, array)?, array_offset(cx, array)? + position))
}

fn element_name(cx: &mut RenderContext<'_>, space: ArraySpace, slot: usize) -> String {
    let generator = cx.names.generator();
    match space {
        ArraySpace::Dense => generator.array_element(slot),
        ArraySpace::Sparse => generator.sparse_array_element(slot),
    }
}

/// Forget the contents of every slot of `array`.
fn invalidate_array(cx: &mut RenderContext<'_>, array: NodeId) -> Result<()> {
    let space = array_space(cx, array)?;
    let first = array_offset(cx, array)?;
    let len = cx.input.graph.node(array).args().len();
    cx.invalidate_slots(space, first, len);
    Ok(())
}

fn expect_kind(
    cx: &RenderContext<'_>,
    node: NodeId,
    arg: NodeId,
    expected: OpKind,
    role: &str,
) -> Result<()> {
    let found = cx.input.graph.kind(arg);
    if found == expected {
        return Ok(());
    }
    Err(CodegenError::malformed(
        node,
        cx.input.graph.kind(node),
        format!("{role} must be {expected}, found {found}"),
    ))
}

fn atomic_name<'a>(cx: &RenderContext<'a>, node: NodeId, atomic: usize) -> Result<&'a str> {
    let names = cx.input.atomic_names;
    names
        .get(&atomic)
        .map(String::as_str)
        .ok_or_else(|| {
            CodegenError::malformed(
                node,
                cx.input.graph.kind(node),
                format!("unknown atomic function {atomic}"),
            )
        })
}
