use std::collections::BTreeMap;

use pretty_assertions::assert_eq;
use tapegen_ir::{Argument, IndexPattern, NodeId, OpKind, OperationNode};

use super::render::{encloses_in_power, encloses_in_product, is_number};
use super::*;
use crate::config::DEFAULT_STYLE;
use crate::error::ConfigError;
use crate::test_helpers::{body_of, eq, sub, Fixture};

/// Rendering of independent `x_i` with occurrence id `occ`.
fn indep(occ: &str, i: usize) -> String {
    format!("<mrow id='{occ}' class='indep'>{}</mrow>", sub("x", i))
}

/// Assignment target `y_i` with occurrence id `occ`.
fn dep(occ: &str, i: usize) -> String {
    format!("<mrow id='{occ}' class='dep'>{}</mrow>", sub("y", i))
}

fn tmp(occ: &str, k: usize) -> String {
    format!("<mrow id='{occ}' class='tmp'>{}</mrow>", sub("v", k))
}

fn apply(function: &str, arg: &str) -> String {
    format!("<mi>{function}</mi><mo>&ApplyFunction;</mo><mfenced><mrow>{arg}</mrow></mfenced>")
}

fn fenced(content: &str) -> String {
    format!("<mfenced><mrow>{content}</mrow></mfenced>")
}

const ASSIGN: &str = "<mo>=</mo>";

// ── Expressions ─────────────────────────────────────────────────────

#[test]
fn quotient_plus_square() {
    let mut fx = Fixture::new();
    let a = fx.inv();
    let b = fx.inv();
    let quotient = fx.visit_binary(OpKind::Div, a, 1.0);
    let square = fx.visit_binary(OpKind::Mul, b, b);
    let z = fx.visit_binary(OpKind::Add, quotient, square);
    fx.output(z);

    let expected = eq(&format!(
        "{}{ASSIGN}<mfrac><mrow>{}</mrow><mrow><mn>1</mn></mrow></mfrac><mo>+</mo>{}<mo>&it;</mo>{}",
        dep("v3", 0),
        indep("v1", 0),
        indep("v2", 1),
        indep("v2_1", 1),
    ));
    assert_eq!(fx.body().unwrap(), expected);
}

#[test]
fn reused_value_is_assigned_once() {
    let mut fx = Fixture::new();
    let a = fx.inv();
    let t = fx.visit(OperationNode::new(OpKind::Exp, [Argument::from(a)]));
    let z = fx.visit_binary(OpKind::Add, t, t);
    fx.output(z);

    let expected = [
        eq(&format!("{}{ASSIGN}{}", tmp("v3", 0), apply("exp", &indep("v1", 0)))),
        eq(&format!(
            "{}{ASSIGN}{}<mo>+</mo>{}",
            dep("v2", 0),
            tmp("v3_1", 0),
            tmp("v3_2", 0)
        )),
    ]
    .concat();
    assert_eq!(fx.body().unwrap(), expected);
}

#[test]
fn independents_in_the_order_keep_their_names() {
    let mut fx = Fixture::new();
    let a = fx.inv();
    fx.order.push(a);
    let square = fx.visit_binary(OpKind::Mul, a, a);
    let z = fx.visit_binary(OpKind::Add, square, a);
    fx.output(z);

    let expected = eq(&format!(
        "{}{ASSIGN}{}<mo>&it;</mo>{}<mo>+</mo>{}",
        dep("v2", 0),
        indep("v1", 0),
        indep("v1_1", 0),
        indep("v1_2", 0),
    ));
    assert_eq!(fx.body().unwrap(), expected);
}

#[test]
fn literal_factors_use_visible_times() {
    let mut fx = Fixture::new();
    let a = fx.inv();
    let inner = fx.visit_binary(OpKind::Mul, 2.0, a);
    let z = fx.visit_binary(OpKind::Mul, 3.0, inner);
    fx.output(z);

    let expected = eq(&format!(
        "{}{ASSIGN}<mn>3</mn><mo>&times;</mo><mn>2</mn><mo>&it;</mo>{}",
        dep("v2", 0),
        indep("v1", 0)
    ));
    assert_eq!(fx.body().unwrap(), expected);
}

#[test]
fn sums_and_negative_literals_are_enclosed_in_products() {
    let mut fx = Fixture::new();
    let a = fx.inv();
    let b = fx.inv();
    let sum = fx.visit_binary(OpKind::Add, a, b);
    let z = fx.visit_binary(OpKind::Mul, sum, -2.0);
    fx.output(z);

    let expected = eq(&format!(
        "{}{ASSIGN}{}<mo>&it;</mo>{}",
        dep("v3", 0),
        fenced(&format!("{}<mo>+</mo>{}", indep("v1", 0), indep("v2", 1))),
        fenced("<mn>-2</mn>"),
    ));
    assert_eq!(fx.body().unwrap(), expected);
}

#[test]
fn subtrahend_and_negation_operands_are_enclosed() {
    let mut fx = Fixture::new();
    let a = fx.inv();
    let b = fx.inv();
    let diff = fx.visit_binary(OpKind::Sub, b, 1.0);
    let outer = fx.visit_binary(OpKind::Sub, a, diff);
    let z = fx.visit(OperationNode::new(OpKind::UnMinus, [Argument::from(outer)]));
    fx.output(z);

    let inner = format!("{}<mo>-</mo><mn>1</mn>", indep("v2", 1));
    let expected = eq(&format!(
        "{}{ASSIGN}<mo>-</mo>{}",
        dep("v3", 0),
        fenced(&format!("{}<mo>-</mo>{}", indep("v1", 0), fenced(&inner))),
    ));
    assert_eq!(fx.body().unwrap(), expected);
}

#[test]
fn powers_enclose_inline_operands_except_functions() {
    let mut fx = Fixture::new();
    let a = fx.inv();
    let b = fx.inv();
    let base = fx.visit(OperationNode::new(OpKind::Sin, [Argument::from(a)]));
    let exponent = fx.visit_binary(OpKind::Mul, a, b);
    let z = fx.visit_binary(OpKind::Pow, base, exponent);
    fx.output(z);

    let expected = eq(&format!(
        "{}{ASSIGN}<msup><mrow>{}</mrow><mfenced><mrow>{}<mo>&it;</mo>{}</mrow></mfenced></msup>",
        dep("v3", 0),
        apply("sin", &indep("v1", 0)),
        indep("v1_1", 0),
        indep("v2", 1),
    ));
    assert_eq!(fx.body().unwrap(), expected);
}

#[test]
fn square_root_uses_radical() {
    let mut fx = Fixture::new();
    let a = fx.inv();
    let z = fx.visit(OperationNode::new(OpKind::Sqrt, [Argument::from(a)]));
    fx.output(z);

    let expected = eq(&format!(
        "{}{ASSIGN}<msqrt><mrow>{}</mrow></msqrt>",
        dep("v2", 0),
        indep("v1", 0)
    ));
    assert_eq!(fx.body().unwrap(), expected);
}

#[test]
fn function_names() {
    let cases = [
        (OpKind::Abs, "abs"),
        (OpKind::Acos, "arccos"),
        (OpKind::Log, "ln"),
        (OpKind::Sign, "sgn"),
        (OpKind::Tanh, "tanh"),
    ];
    for (kind, name) in cases {
        let mut fx = Fixture::new();
        let a = fx.inv();
        let z = fx.visit(OperationNode::new(kind, [Argument::from(a)]));
        fx.output(z);

        let expected = eq(&format!("{}{ASSIGN}{}", dep("v2", 0), apply(name, &indep("v1", 0))));
        assert_eq!(fx.body().unwrap(), expected, "{kind}");
    }
}

#[test]
fn aliases_render_their_target() {
    let mut fx = Fixture::new();
    let a = fx.inv();
    let alias = fx.visit(OperationNode::new(OpKind::Alias, [Argument::from(a)]));
    let z = fx.visit_binary(OpKind::Mul, alias, 2.5);
    fx.output(z);

    let expected = eq(&format!(
        "{}{ASSIGN}{}<mo>&it;</mo><mn>2.5</mn>",
        dep("v2", 0),
        indep("v1", 0)
    ));
    assert_eq!(fx.body().unwrap(), expected);
}

#[test]
fn parameters_split_exponents() {
    let language = MathMl::default();
    assert_eq!(language.parameter(1.0), "<mn>1</mn>");
    assert_eq!(language.parameter(-0.25), "<mn>-0.25</mn>");
    assert_eq!(
        language.parameter(1e-7),
        "<mn>1</mn><mo>&times;</mo><msup><mn>10</mn><mn>-7</mn></msup>"
    );
    assert_eq!(
        language.parameter(2.5e20),
        "<mn>2.5</mn><mo>&times;</mo><msup><mn>10</mn><mn>20</mn></msup>"
    );
}

#[test]
fn parameter_precision_is_configurable() {
    let language = MathMl::with_options(GenerationOptions::with_parameter_precision(3));
    assert_eq!(language.parameter(3.14159), "<mn>3.14</mn>");
}

#[test]
fn number_detection_walks_products_and_powers() {
    let mut fx = Fixture::new();
    let a = fx.inv();
    let scaled = fx.graph.add_binary(OpKind::Mul, 2.0, a);
    let power = fx.graph.add_binary(OpKind::Pow, 3.0, a);
    let alias = fx.graph.add_unary(OpKind::Alias, 4.0);
    let graph = &fx.graph;

    assert!(is_number(graph, Argument::Constant(1.0), 0));
    assert!(is_number(graph, Argument::Node(scaled), 0));
    assert!(!is_number(graph, Argument::Node(scaled), 1));
    assert!(is_number(graph, Argument::Node(power), 0));
    assert!(!is_number(graph, Argument::Node(power), 1));
    assert!(is_number(graph, Argument::Node(alias), 1));
    assert!(!is_number(graph, Argument::Node(a), 0));
}

#[test]
fn enclosure_rules() {
    let mut fx = Fixture::new();
    let a = fx.inv();
    fx.graph.set_variable_id(a, 1);
    let sum = fx.graph.add_binary(OpKind::Add, a, a);
    let product = fx.graph.add_binary(OpKind::Mul, a, a);
    let cosine = fx.graph.add_unary(OpKind::Cos, a);
    let alias = fx.graph.add_unary(OpKind::Alias, sum);
    let graph = &fx.graph;

    assert!(encloses_in_product(graph, Argument::Constant(-1.0)));
    assert!(!encloses_in_product(graph, Argument::Constant(1.0)));
    assert!(encloses_in_product(graph, Argument::Node(sum)));
    assert!(encloses_in_product(graph, Argument::Node(alias)));
    assert!(!encloses_in_product(graph, Argument::Node(product)));
    assert!(!encloses_in_product(graph, Argument::Node(cosine)));
    assert!(!encloses_in_product(graph, Argument::Node(a)));

    assert!(!encloses_in_power(graph, Argument::Constant(-1.0)));
    assert!(encloses_in_power(graph, Argument::Node(product)));
    assert!(!encloses_in_power(graph, Argument::Node(cosine)));
}

// ── Comparisons ─────────────────────────────────────────────────────

#[test]
fn comparison_renders_if_else_pair() {
    let mut fx = Fixture::new();
    let a = fx.inv();
    let b = fx.inv();
    let z = fx.visit(OperationNode::new(
        OpKind::ComLt,
        [Argument::from(a), Argument::from(b), Argument::from(1.0), Argument::from(2.0)],
    ));
    fx.output(z);

    let expected = [
        "<div class='condIf'>".to_owned(),
        eq(&format!("<mi>if</mi>{}", fenced(&format!("{}<mo>&lt;</mo>{}", indep("v1", 0), indep("v2", 1))))),
        "<div class='condBody'>\n".to_owned(),
        eq(&format!("{}{ASSIGN}<mn>1</mn>", dep("v3", 0))),
        "</div>\n</div>\n".to_owned(),
        "<div class='condElse'>".to_owned(),
        eq("<mi>else</mi>"),
        "<div class='condBody'>\n".to_owned(),
        eq(&format!("{}{ASSIGN}<mn>2</mn>", dep("v3_1", 0))),
        "</div>\n</div>\n".to_owned(),
    ]
    .concat();
    assert_eq!(fx.body().unwrap(), expected);
}

#[test]
fn comparison_with_identical_branches_is_one_assignment() {
    let mut fx = Fixture::new();
    let a = fx.inv();
    let b = fx.inv();
    let z = fx.visit(OperationNode::new(
        OpKind::ComGe,
        [a, b, a, a].map(Argument::from),
    ));
    fx.output(z);

    let expected = eq(&format!("{}{ASSIGN}{}", dep("v3", 0), indep("v1", 0)));
    assert_eq!(fx.body().unwrap(), expected);
}

// ── Loops ───────────────────────────────────────────────────────────

/// `for j in [0; 2]: y_j = x_j + 1`
fn loop_fixture(count: usize) -> (Fixture, NodeId, NodeId) {
    let mut fx = Fixture::new();
    let dcl = fx.graph.add_index_declaration("j");
    let pattern = fx.patterns.add(IndexPattern::plain(dcl));
    let start = fx.visit(OperationNode::new(OpKind::LoopStart, [Argument::from(dcl)]).with_info([count]));
    let x = fx.visit(OperationNode::leaf(OpKind::LoopIndexedIndep).with_info([pattern.index()]));
    let sum = fx.visit_binary(OpKind::Add, x, 1.0);
    let y = fx.visit(
        OperationNode::new(OpKind::LoopIndexedDep, [Argument::from(sum)])
            .with_info([pattern.index(), 0]),
    );
    (fx, start, y)
}

#[test]
fn loop_body_is_wrapped() {
    let (mut fx, start, y) = loop_fixture(3);
    let end = fx.visit_binary(OpKind::LoopEnd, start, y);
    fx.output(end);

    let indexed = |base: &str| format!("<msub><mi>{base}</mi><mrow><mi>j</mi></mrow></msub>");
    let expected = [
        "<div class='loop'>".to_owned(),
        eq("<mi>for</mi><mfenced><mrow><mi>j</mi><mo>&isin;</mo>\
            <mfenced open='[' close=']' separators=';'><mn>0</mn><mn>2</mn></mfenced>\
            </mrow></mfenced>"),
        "<div class='loopBody'>".to_owned(),
        eq(&format!(
            "<mrow id='v1' class='dep'>{}</mrow>{ASSIGN}<mrow class='indep'>{}</mrow><mo>+</mo><mn>1</mn>",
            indexed("y"),
            indexed("x")
        )),
        "</div></div>\n".to_owned(),
    ]
    .concat();
    assert_eq!(fx.body().unwrap(), expected);
}

#[test]
fn loop_count_may_be_an_index() {
    let mut fx = Fixture::new();
    let dcl = fx.graph.add_index_declaration("j");
    let n = fx.graph.add_index_declaration("n");
    let count = fx.graph.add_unary(OpKind::Index, n);
    let start = fx.visit(OperationNode::new(
        OpKind::LoopStart,
        [Argument::from(dcl), Argument::from(count)],
    ));
    let end = fx.visit(OperationNode::new(OpKind::LoopEnd, [Argument::from(start)]));
    fx.output(end);

    let body = fx.body().unwrap();
    assert!(body.contains("<mn>0</mn><mi>n</mi><mo>-</mo><mn>1</mn></mfenced>"));
}

#[test]
fn zero_iteration_loop_is_malformed() {
    let (mut fx, start, _) = loop_fixture(0);
    fx.visit(OperationNode::new(OpKind::LoopEnd, [Argument::from(start)]));

    let err = fx.body().unwrap_err();
    assert_eq!(
        err.to_string(),
        format!("malformed graph at {start} (LoopStart): loop without iterations")
    );
}

#[test]
fn unclosed_loop_is_malformed() {
    let (mut fx, start, _) = loop_fixture(2);

    let err = fx.body().unwrap_err();
    assert_eq!(
        err.to_string(),
        format!("malformed graph at {start} (LoopStart): loop is never closed")
    );
}

#[test]
fn loop_end_must_close_the_innermost_loop() {
    let (mut fx, _, _) = loop_fixture(2);
    let dcl = fx.graph.add_index_declaration("k");
    let other = fx.graph.add(OperationNode::new(OpKind::LoopStart, [Argument::from(dcl)]).with_info([2]));
    let end = fx.visit(OperationNode::new(OpKind::LoopEnd, [Argument::from(other)]));

    let err = fx.body().unwrap_err();
    assert!(matches!(
        err,
        CodegenError::MalformedGraph { node, kind: OpKind::LoopEnd, .. } if node == end
    ));
}

#[test]
fn loop_end_without_loop_is_malformed() {
    let mut fx = Fixture::new();
    let dcl = fx.graph.add_index_declaration("j");
    let start = fx.graph.add(OperationNode::new(OpKind::LoopStart, [Argument::from(dcl)]).with_info([2]));
    fx.visit(OperationNode::new(OpKind::LoopEnd, [Argument::from(start)]));

    let err = fx.body().unwrap_err();
    assert!(err.to_string().ends_with("no open loop to close"));
}

// ── Structured conditionals ─────────────────────────────────────────

/// `if (j == 0) sin(a) else if (1 <= j <= 2) cos(a) else exp(a)`.
fn branch_fixture() -> (Fixture, [NodeId; 3]) {
    let mut fx = Fixture::new();
    let a = fx.inv();
    let dcl = fx.graph.add_index_declaration("j");
    let index = fx.graph.add_unary(OpKind::Index, dcl);
    let first = fx
        .graph
        .add(OperationNode::new(OpKind::IndexCondExpr, [Argument::from(index)]).with_info([0, 0]));
    let second = fx
        .graph
        .add(OperationNode::new(OpKind::IndexCondExpr, [Argument::from(index)]).with_info([1, 2]));

    let start = fx.visit(OperationNode::new(OpKind::StartIf, [Argument::from(first)]));
    let v1 = fx.graph.add_unary(OpKind::Sin, a);
    fx.visit_binary(OpKind::CondResult, start, v1);
    let else_if = fx.visit_binary(OpKind::ElseIf, start, second);
    let v2 = fx.graph.add_unary(OpKind::Cos, a);
    fx.visit_binary(OpKind::CondResult, else_if, v2);
    let otherwise = fx.visit(OperationNode::new(OpKind::Else, [Argument::from(else_if)]));
    let v3 = fx.graph.add_unary(OpKind::Exp, a);
    fx.visit_binary(OpKind::CondResult, otherwise, v3);
    (fx, [start, else_if, otherwise])
}

#[test]
fn branch_chain_closes_each_branch_by_kind() {
    let (mut fx, [_, _, otherwise]) = branch_fixture();
    fx.visit(OperationNode::new(OpKind::EndIf, [Argument::from(otherwise)]));

    // Ids: a = 1, start = 2, sin = 3, else-if = 4, cos = 5, else = 6, exp = 7.
    let expected = [
        "<div class='condIf'>".to_owned(),
        eq("<mi>if</mi><mfenced><mrow><mi>j</mi><mo>==</mo><mn>0</mn></mrow></mfenced>"),
        "<div class='condBody'>\n".to_owned(),
        eq(&format!("{}{ASSIGN}{}", tmp("v3", 1), apply("sin", &indep("v1", 0)))),
        "</div>\n</div>\n".to_owned(),
        "<div class='condElseIf'>".to_owned(),
        eq("<mi>else if</mi><mfenced><mrow><mn>1</mn><mo>==</mo><mi>j</mi>\
            <mo>&or;</mo><mi>j</mi><mo>==</mo><mn>2</mn></mrow></mfenced>"),
        "<div class='condBody'>\n".to_owned(),
        eq(&format!("{}{ASSIGN}{}", tmp("v5", 3), apply("cos", &indep("v1_1", 0)))),
        "</div>\n</div>\n".to_owned(),
        "<div class='condElse'>".to_owned(),
        eq("<mi>else</mi>"),
        "<div class='condBody'>\n".to_owned(),
        eq(&format!("{}{ASSIGN}{}", tmp("v7", 5), apply("exp", &indep("v1_2", 0)))),
        "</div>\n</div>\n".to_owned(),
    ]
    .concat();
    assert_eq!(fx.body().unwrap(), expected);
}

#[test]
fn else_if_cannot_follow_else() {
    let (mut fx, [_, _, otherwise]) = branch_fixture();
    let dcl = fx.graph.add_index_declaration("k");
    let index = fx.graph.add_unary(OpKind::Index, dcl);
    let cond = fx
        .graph
        .add(OperationNode::new(OpKind::IndexCondExpr, [Argument::from(index)]).with_info([3, 3]));
    fx.visit_binary(OpKind::ElseIf, otherwise, cond);

    let err = fx.body().unwrap_err();
    assert!(err.to_string().ends_with("cannot follow a Else branch"));
}

#[test]
fn end_if_needs_a_branch() {
    let mut fx = Fixture::new();
    let a = fx.inv();
    fx.visit(OperationNode::new(OpKind::EndIf, [Argument::from(a)]));

    let err = fx.body().unwrap_err();
    assert!(matches!(err, CodegenError::MalformedGraph { kind: OpKind::EndIf, .. }));
}

#[test]
fn unclosed_branch_chain_is_malformed() {
    let (mut fx, [_, _, otherwise]) = branch_fixture();

    let err = fx.body().unwrap_err();
    assert_eq!(
        err,
        CodegenError::MalformedGraph {
            node: otherwise,
            kind: OpKind::Else,
            reason: "conditional is never closed".to_owned(),
        }
    );
}

#[test]
fn end_if_without_rendered_start_is_malformed() {
    let mut fx = Fixture::new();
    let a = fx.inv();
    let dcl = fx.graph.add_index_declaration("j");
    let index = fx.graph.add_unary(OpKind::Index, dcl);
    let cond = fx
        .graph
        .add(OperationNode::new(OpKind::IndexCondExpr, [Argument::from(index)]).with_info([0, 0]));
    let start = fx.graph.add(OperationNode::new(OpKind::StartIf, [Argument::from(cond)]));
    let v = fx.graph.add_unary(OpKind::Sin, a);
    fx.graph.add_binary(OpKind::CondResult, start, v);
    let end = fx.visit(OperationNode::new(OpKind::EndIf, [Argument::from(start)]));

    let err = fx.body().unwrap_err();
    assert_eq!(
        err,
        CodegenError::MalformedGraph {
            node: end,
            kind: OpKind::EndIf,
            reason: "no open branch to close".to_owned(),
        }
    );
}

#[test]
fn end_if_must_close_the_innermost_branch() {
    let (mut fx, [start, _, otherwise]) = branch_fixture();
    let end = fx.visit(OperationNode::new(OpKind::EndIf, [Argument::from(start)]));

    let err = fx.body().unwrap_err();
    assert_eq!(
        err,
        CodegenError::MalformedGraph {
            node: end,
            kind: OpKind::EndIf,
            reason: format!("follows branch {start} but the innermost open branch is {otherwise}"),
        }
    );
}

#[test]
fn branch_condition_must_be_an_index_condition() {
    let mut fx = Fixture::new();
    let a = fx.inv();
    fx.visit(OperationNode::new(OpKind::StartIf, [Argument::from(a)]));

    let err = fx.body().unwrap_err();
    assert!(err.to_string().ends_with("expected an index condition"));
}

// ── Indices ─────────────────────────────────────────────────────────

#[test]
fn index_assignment_renders_pattern() {
    let mut fx = Fixture::new();
    let j = fx.graph.add_index_declaration("j");
    let k = fx.graph.add_index_declaration("k");
    let pattern = fx.patterns.add(IndexPattern::linear2(j, 2, 1));
    fx.visit(OperationNode::new(OpKind::IndexAssign, [Argument::from(k)]).with_info([pattern.index()]));

    let expected = eq(&format!(
        "<mi>k</mi>{ASSIGN}<mo>&lfloor;</mo><mfrac><mi>j</mi><mn>2</mn></mfrac><mo>&rfloor;</mo><mo>+</mo><mn>1</mn>"
    ));
    assert_eq!(fx.body().unwrap(), expected);
}

// ── Dependents ──────────────────────────────────────────────────────

#[test]
fn multi_assign_accumulates_first_value() {
    let mut fx = Fixture::new();
    let a = fx.inv();
    let reference = fx.graph.add_leaf(OpKind::DependentRefRhs);
    let value = fx.graph.add_unary(OpKind::Sin, a);
    let z = fx.visit(OperationNode::new(
        OpKind::DependentMultiAssign,
        [Argument::from(reference), Argument::from(value)],
    ));
    fx.output(z);

    let expected = eq(&format!(
        "{}<mo>+=</mo>{}",
        dep("v2", 0),
        apply("sin", &indep("v1", 0))
    ));
    assert_eq!(fx.body().unwrap(), expected);
}

#[test]
fn duplicated_dependents_alias_the_first() {
    let mut fx = Fixture::new();
    let a = fx.inv();
    let z = fx.visit(OperationNode::new(OpKind::Sin, [Argument::from(a)]));
    fx.output(z);
    fx.output(z);

    let expected = [
        eq(&format!("{}{ASSIGN}{}", dep("v2", 0), apply("sin", &indep("v1", 0)))),
        "<!-- variable duplicates: 1 -->\n".to_owned(),
        eq(&format!("{}{ASSIGN}{}", dep("v2_1", 1), dep("v2_2", 0))),
    ]
    .concat();
    assert_eq!(fx.body().unwrap(), expected);
}

#[test]
fn literal_and_independent_dependents_are_appended() {
    let mut fx = Fixture::new();
    let a = fx.inv();
    fx.output(2.5);
    fx.output(a);
    fx.output(0.0);
    let options = GenerationOptions {
        ignore_zero_dependent_assign: true,
        ..Default::default()
    };

    let html = fx.generate_with(&MathMl::with_options(options)).unwrap();
    let expected = [
        "<!-- dependent variables without operations -->\n".to_owned(),
        eq(&format!("<mrow class='dep'>{}</mrow>{ASSIGN}<mn>2.5</mn>", sub("y", 0))),
        eq(&format!("{}{ASSIGN}{}", dep("v1", 1), indep("v1_1", 0))),
    ]
    .concat();
    assert_eq!(body_of(&html), expected);
}

#[test]
fn zero_literal_dependents_are_kept_by_default() {
    let mut fx = Fixture::new();
    fx.output(0.0);

    let expected = [
        "<!-- dependent variables without operations -->\n".to_owned(),
        eq(&format!("<mrow class='dep'>{}</mrow>{ASSIGN}<mn>0</mn>", sub("y", 0))),
    ]
    .concat();
    assert_eq!(fx.body().unwrap(), expected);
}

#[test]
fn zero_initialisation_precedes_statements() {
    let mut fx = Fixture::new();
    let a = fx.inv();
    let z = fx.visit(OperationNode::new(OpKind::Cos, [Argument::from(a)]));
    fx.output(z);
    fx.output(4.0);
    fx.zero_dependents = true;

    let expected = [
        eq(&format!("{}{ASSIGN}<mn>0</mn>", dep("v2", 0))),
        eq(&format!("<mrow class='dep'>{}</mrow>{ASSIGN}<mn>0</mn>", sub("y", 1))),
        eq(&format!("{}{ASSIGN}{}", dep("v2_1", 0), apply("cos", &indep("v1", 0)))),
        "<!-- dependent variables without operations -->\n".to_owned(),
        eq(&format!("<mrow class='dep'>{}</mrow>{ASSIGN}<mn>4</mn>", sub("y", 1))),
    ]
    .concat();
    assert_eq!(fx.body().unwrap(), expected);
}

// ── Arrays and atomic calls ─────────────────────────────────────────

fn element(slot: usize) -> String {
    format!("<mrow class='tmp'>{}</mrow>", sub("a", slot))
}

#[test]
fn array_slots_are_rewritten_only_when_changed() {
    let mut fx = Fixture::new();
    let a = fx.inv();
    let first = fx.visit(OperationNode::new(
        OpKind::ArrayCreation,
        [Argument::from(a), Argument::from(2.0)],
    ));
    let second = fx.visit(OperationNode::new(
        OpKind::ArrayCreation,
        [Argument::from(a), Argument::from(3.0)],
    ));
    // Both arrays reuse the same region of the temporary array.
    fx.graph.set_variable_id(first, 1);
    fx.graph.set_variable_id(second, 1);

    let expected = [
        eq(&format!("{}{ASSIGN}{}", element(0), indep("v1", 0))),
        eq(&format!("{}{ASSIGN}<mn>2</mn>", element(1))),
        eq(&format!("{}{ASSIGN}<mn>3</mn>", element(1))),
    ]
    .concat();
    assert_eq!(fx.body().unwrap(), expected);
}

#[test]
fn materialized_element_releases_its_slot() {
    let mut fx = Fixture::new();
    let a = fx.inv();
    let first = fx.visit(OperationNode::new(
        OpKind::ArrayCreation,
        [Argument::from(a), Argument::from(2.0)],
    ));
    let read = fx.visit(
        OperationNode::new(OpKind::ArrayElement, [Argument::from(first), Argument::from(first)])
            .with_info([1]),
    );
    let second = fx.visit(OperationNode::new(
        OpKind::ArrayCreation,
        [Argument::from(a), Argument::from(2.0)],
    ));
    let z = fx.visit_binary(OpKind::Add, read, 1.0);
    fx.output(z);
    fx.graph.set_variable_id(first, 1);
    fx.graph.set_variable_id(second, 1);
    // First temporary id: one independent, one dependent.
    fx.graph.set_variable_id(read, 3);

    let expected = [
        eq(&format!("{}{ASSIGN}{}", element(0), indep("v1", 0))),
        eq(&format!("{}{ASSIGN}<mn>2</mn>", element(1))),
        eq(&format!("{}{ASSIGN}{}", tmp("v3", 0), element(1))),
        eq(&format!("{}{ASSIGN}<mn>2</mn>", element(1))),
        eq(&format!("{}{ASSIGN}{}<mo>+</mo><mn>1</mn>", dep("v2", 0), tmp("v3_1", 0))),
    ]
    .concat();
    assert_eq!(fx.body().unwrap(), expected);
}

#[test]
fn sparse_array_needs_positions() {
    let mut fx = Fixture::new();
    let a = fx.inv();
    fx.visit(OperationNode::new(OpKind::SparseArrayCreation, [Argument::from(a)]).with_info([4]));

    let err = fx.body().unwrap_err();
    assert!(matches!(
        err,
        CodegenError::MalformedGraph { kind: OpKind::SparseArrayCreation, .. }
    ));
}

#[test]
fn sparse_arrays_use_their_own_space() {
    let mut fx = Fixture::new();
    let a = fx.inv();
    fx.visit(
        OperationNode::new(OpKind::SparseArrayCreation, [Argument::from(a), Argument::from(5.0)])
            .with_info([8, 2, 6]),
    );

    let expected = [
        eq(&format!(
            "<mrow class='tmp'>{}</mrow>{ASSIGN}{}",
            sub("s", 0),
            indep("v1", 0)
        )),
        eq(&format!("<mrow class='tmp'>{}</mrow>{ASSIGN}<mn>5</mn>", sub("s", 1))),
    ]
    .concat();
    assert_eq!(fx.body().unwrap(), expected);
}

/// `tx = {a}`, `ty = {0}`, `model.forward(0, 0, tx, ty)`, `ty = {0}` again.
fn forward_fixture(atomic: usize) -> Fixture {
    let mut fx = Fixture::new();
    let a = fx.inv();
    let tx = fx.visit(OperationNode::new(OpKind::ArrayCreation, [Argument::from(a)]));
    let ty = fx.visit(OperationNode::new(OpKind::ArrayCreation, [Argument::from(0.0)]));
    fx.visit(
        OperationNode::new(OpKind::AtomicForward, [Argument::from(tx), Argument::from(ty)])
            .with_info([atomic, 0, 0]),
    );
    let again = fx.visit(OperationNode::new(OpKind::ArrayCreation, [Argument::from(0.0)]));
    fx.graph.set_variable_id(again, 2);
    fx.atomic_names.insert(7, "model".to_owned());
    fx
}

#[test]
fn atomic_forward_binds_arrays_and_invalidates_output() {
    let mut fx = forward_fixture(7);
    let slice = |first: usize| {
        format!("<msub><mi>a</mi><mrow><mn>{first}</mn><mo>..</mo><mn>{first}</mn></mrow></msub>")
    };

    let expected = [
        eq(&format!("{}{ASSIGN}{}", element(0), indep("v1", 0))),
        eq(&format!("{}{ASSIGN}<mn>0</mn>", element(1))),
        eq(&format!(
            "<msub><mi>atx</mi><mn>0</mn></msub>{ASSIGN}<mrow class='tmp'>{}</mrow>",
            slice(0)
        )),
        eq(&format!("<mi>aty</mi>{ASSIGN}<mrow class='tmp'>{}</mrow>", slice(1))),
        eq("<mi>model</mi><mo>.</mo><mo>forward</mo><mfenced separators=','>\
            <mn>0</mn><mn>0</mn><mrow class='tmp'><mi>atx</mi></mrow>\
            <mrow><mo>&amp;</mo><mrow class='tmp'><mi>aty</mi></mrow></mrow></mfenced>"),
        // The call overwrote the output slot.
        eq(&format!("{}{ASSIGN}<mn>0</mn>", element(1))),
    ]
    .concat();
    assert_eq!(fx.body().unwrap(), expected);
}

#[test]
fn unknown_atomic_is_malformed() {
    let mut fx = forward_fixture(9);

    let err = fx.body().unwrap_err();
    assert!(err.to_string().ends_with("unknown atomic function 9"));
}

#[test]
fn atomic_orders_out_of_range_are_malformed() {
    let cases = [
        (OpKind::AtomicForward, 2, vec![7, 0, usize::MAX], usize::MAX),
        (OpKind::AtomicReverse, 4, vec![7, usize::MAX / 2], usize::MAX / 2),
    ];
    for (kind, arrays, info, p) in cases {
        let mut fx = Fixture::new();
        let a = fx.inv();
        let tx = fx.visit(OperationNode::new(OpKind::ArrayCreation, [Argument::from(a)]));
        let args = vec![Argument::from(tx); arrays];
        let call = fx.visit(OperationNode::new(kind, args).with_info(info));
        fx.atomic_names.insert(7, "model".to_owned());

        let err = fx.body().unwrap_err();
        assert_eq!(
            err,
            CodegenError::MalformedGraph {
                node: call,
                kind,
                reason: format!("order {p} is out of range"),
            }
        );
    }
}

#[test]
fn atomic_reverse_checks_argument_kinds() {
    let mut fx = Fixture::new();
    let a = fx.inv();
    let tx = fx.visit(OperationNode::new(OpKind::ArrayCreation, [Argument::from(a)]));
    let ty = fx.visit(OperationNode::new(OpKind::ArrayCreation, [Argument::from(0.0)]));
    let px = fx.visit(OperationNode::new(OpKind::ArrayCreation, [Argument::from(0.0)]));
    // py[0] must be sparse.
    let py = fx.visit(OperationNode::new(OpKind::ArrayCreation, [Argument::from(1.0)]));
    fx.visit(
        OperationNode::new(
            OpKind::AtomicReverse,
            [tx, ty, px, py].map(Argument::from),
        )
        .with_info([7, 0]),
    );
    fx.atomic_names.insert(7, "model".to_owned());

    let err = fx.body().unwrap_err();
    assert!(err.to_string().ends_with("py[0] must be SparseArrayCreation, found ArrayCreation"));
}

#[test]
fn atomic_reverse_call() {
    let mut fx = Fixture::new();
    let a = fx.inv();
    let tx = fx.visit(OperationNode::new(OpKind::ArrayCreation, [Argument::from(a)]));
    let ty = fx.visit(OperationNode::new(OpKind::ArrayCreation, [Argument::from(0.0)]));
    let px = fx.visit(OperationNode::new(OpKind::ArrayCreation, [Argument::from(0.0)]));
    let py = fx.visit(
        OperationNode::new(OpKind::SparseArrayCreation, [Argument::from(1.0)]).with_info([1, 0]),
    );
    fx.visit(
        OperationNode::new(OpKind::AtomicReverse, [tx, ty, px, py].map(Argument::from))
            .with_info([7, 0]),
    );
    fx.atomic_names.insert(7, "model".to_owned());

    let body = fx.body().unwrap();
    assert!(body.contains("<msub><mi>apy</mi><mn>0</mn></msub>"));
    assert!(body.contains("<mi>apx</mi><mo>=</mo>"));
    assert!(body.contains(
        "<mi>model</mi><mo>.</mo><mo>reverse</mo><mfenced separators=','><mn>0</mn>"
    ));
}

// ── Documents and units ─────────────────────────────────────────────

#[test]
fn document_wraps_body() {
    let mut fx = Fixture::new();
    let a = fx.inv();
    let z = fx.visit(OperationNode::new(OpKind::Sin, [Argument::from(a)]));
    fx.output(z);
    let markup = MathMlMarkup {
        javascript: "init();".to_owned(),
        head_extra: "<meta name=\"generator\" content=\"tapegen\">\n".to_owned(),
        ..MathMlMarkup::unstyled()
    };
    let language = MathMl::new(GenerationOptions::with_base_name("model"), markup);

    let html = fx.generate_with(&language).unwrap();
    let head = "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
                <title>model</title>\n\
                <meta name=\"generator\" content=\"tapegen\">\n\
                <script type=\"text/javascript\">\ninit();\n</script>\n\
                </head>\n\n<body>\n\
                <!-- source file for 'model' (automatically generated by tapegen) -->\n\
                <div id='algorithm'>\n";
    assert!(html.starts_with(head), "{html}");
    assert!(html.ends_with("</div>\n</body>\n</html>"));
    assert!(!html.contains("<style>"));
}

#[test]
fn default_document_carries_style() {
    let mut fx = Fixture::new();
    let html = fx.generate_with(&MathMl::default()).unwrap();
    assert!(html.contains(&format!("<style>\n{DEFAULT_STYLE}</style>\n")));
    assert_eq!(body_of(&html), "");
}

#[test]
fn custom_equation_markup() {
    let mut fx = Fixture::new();
    let a = fx.inv();
    let z = fx.visit(OperationNode::new(OpKind::Abs, [Argument::from(a)]));
    fx.output(z);
    let language = MathMl::with_markup(MathMlMarkup::with_equation("<p><math>", "</math></p>"));

    let html = fx.generate_with(&language).unwrap();
    assert!(body_of(&html).starts_with("<p><math><mrow id='v2' class='dep'>"));
    assert!(body_of(&html).ends_with("</math></p>\n"));
}

#[test]
fn single_unit_is_stored_under_base_name() {
    let mut fx = Fixture::new();
    let a = fx.inv();
    let z = fx.visit(OperationNode::new(OpKind::Sin, [Argument::from(a)]));
    fx.output(z);
    fx.promote();

    let mut units = BTreeMap::new();
    let main = MathMl::default()
        .generate(&fx.input(), &mut MathMlNameGenerator::new(), Some(&mut units))
        .unwrap();
    assert_eq!(units.len(), 1);
    assert_eq!(units.get("algorithm.html"), Some(&main));
}

#[test]
fn partitioned_output_links_parts() {
    let mut fx = Fixture::new();
    let a = fx.inv();
    for kind in [OpKind::Sin, OpKind::Cos, OpKind::Tan, OpKind::Exp] {
        let z = fx.visit(OperationNode::new(kind, [Argument::from(a)]));
        fx.output(z);
    }
    fx.promote();
    let language = MathMl::with_options(GenerationOptions::with_max_assignments_per_unit(2));

    let mut units = BTreeMap::new();
    let main = language
        .generate(&fx.input(), &mut MathMlNameGenerator::new(), Some(&mut units))
        .unwrap();

    let keys: Vec<&str> = units.keys().map(String::as_str).collect();
    assert_eq!(
        keys,
        ["algorithm.html", "algorithm__part_1.html", "algorithm__part_2.html"]
    );
    assert_eq!(
        body_of(&main),
        "<a href='algorithm__part_1.html'>part 1</a><br/>\n\
         <a href='algorithm__part_2.html'>part 2</a><br/>\n"
    );
    for link in main.split("<a href='").skip(1) {
        let target = link.split('\'').next().unwrap();
        assert!(units.contains_key(target), "{target}");
    }
    let first = &units["algorithm__part_1.html"];
    assert!(first.contains("<mi>sin</mi>") && first.contains("<mi>cos</mi>"));
    assert!(!first.contains("<mi>tan</mi>"));
    let second = &units["algorithm__part_2.html"];
    assert!(second.contains("<mi>tan</mi>") && second.contains("<mi>exp</mi>"));
}

#[test]
fn partitioning_requires_a_destination() {
    let mut fx = Fixture::new();
    let a = fx.inv();
    let z = fx.visit(OperationNode::new(OpKind::Sin, [Argument::from(a)]));
    fx.output(z);
    let language = MathMl::with_options(GenerationOptions::with_max_assignments_per_unit(1));

    assert_eq!(
        fx.generate_with(&language),
        Err(CodegenError::Config(ConfigError::PartitionWithoutDestination))
    );
}

#[test]
fn failed_pass_leaves_destination_untouched() {
    let mut fx = Fixture::new();
    let a = fx.inv();
    let z = fx.visit(OperationNode::new(OpKind::Sin, [Argument::from(a)]));
    fx.output(z);
    fx.visit(OperationNode::leaf(OpKind::LoopEnd));
    fx.promote();

    let mut units = BTreeMap::new();
    let result = MathMl::default().generate(&fx.input(), &mut MathMlNameGenerator::new(), Some(&mut units));
    assert!(result.is_err());
    assert!(units.is_empty());
}

#[test]
fn policies() {
    let language = MathMl::default();
    assert!(language.creates_new_variable(OpKind::Add, 2));
    assert!(!language.creates_new_variable(OpKind::Add, 1));
    assert!(!language.creates_new_variable(OpKind::ArrayElement, 3));
    assert!(language.creates_new_variable(OpKind::ComLt, 1));
    assert!(language.creates_new_variable(OpKind::Assign, 1));
    assert!(!language.creates_new_variable(OpKind::CondResult, 1));

    assert!(language.directly_assigns_variable(OpKind::LoopStart));
    assert!(language.directly_assigns_variable(OpKind::CondResult));
    assert!(!language.directly_assigns_variable(OpKind::Mul));

    assert!(language.requires_variable_argument(OpKind::CondResult, 1));
    assert!(!language.requires_variable_argument(OpKind::Sign, 0));
}
