//! Index markup: range guards and array offset patterns.

use std::fmt::Write as _;

use tapegen_ir::{IndexStrategy, Linear2Pattern, LinearPattern};

/// Upper bound meaning "no upper bound".
pub const UNBOUNDED: usize = usize::MAX;

/// Render `(min, max)` pairs over `index` as a boolean guard.
///
/// Returns `None` unless `info` holds at least one complete pair.
pub fn guard_markup(info: &[usize], index: &str) -> Option<String> {
    if info.len() < 2 || info.len() % 2 != 0 {
        return None;
    }
    let several = info.len() > 2;
    let mut out = String::new();
    for (e, pair) in info.chunks_exact(2).enumerate() {
        if e > 0 {
            out.push_str("<mo>&or;</mo>");
        }
        let (min, max) = (pair[0], pair[1]);
        if min == max {
            let _ = write!(out, "<mi>{index}</mi><mo>==</mo><mn>{min}</mn>");
        } else if min == 0 {
            let _ = write!(out, "<mi>{index}</mi><mo>&le;</mo><mn>{max}</mn>");
        } else if max == UNBOUNDED {
            let _ = write!(out, "<mn>{min}</mn><mo>&le;</mo><mi>{index}</mi>");
        } else {
            if several {
                out.push_str("<mfenced><mrow>");
            }
            if max.checked_sub(min) == Some(1) {
                let _ = write!(
                    out,
                    "<mn>{min}</mn><mo>==</mo><mi>{index}</mi><mo>&or;</mo><mi>{index}</mi><mo>==</mo><mn>{max}</mn>"
                );
            } else {
                let _ = write!(
                    out,
                    "<mn>{min}</mn><mo>&le;</mo><mi>{index}</mi><mo>&and;</mo><mi>{index}</mi><mo>&le;</mo><mn>{max}</mn>"
                );
            }
            if several {
                out.push_str("</mrow></mfenced>");
            }
        }
    }
    Some(out)
}

/// Render the array offset `strategy` produces for `index`.
pub fn pattern_markup(strategy: &IndexStrategy, index: &str) -> String {
    let mut out = String::new();
    write_pattern(&mut out, strategy, index);
    out
}

fn write_pattern(out: &mut String, strategy: &IndexStrategy, index: &str) {
    match strategy {
        IndexStrategy::Plain => {
            let _ = write!(out, "<mi>{index}</mi>");
        }
        IndexStrategy::Linear(linear) => write_linear(out, linear, index),
        IndexStrategy::Linear2(linear) => write_linear2(out, linear, index),
        IndexStrategy::Sectioned(sections) => {
            out.push_str("<mrow><mo>{</mo><mtable>");
            let mut iter = sections.iter().peekable();
            while let Some((&start, section)) = iter.next() {
                let end = iter
                    .peek()
                    .map_or(UNBOUNDED, |(&next, _)| next.saturating_sub(1));
                out.push_str("<mtr><mtd><mrow>");
                write_pattern(out, section, index);
                out.push_str("</mrow></mtd><mtd><mrow>");
                if let Some(guard) = guard_markup(&[start, end], index) {
                    out.push_str(&guard);
                }
                out.push_str("</mrow></mtd></mtr>");
            }
            out.push_str("</mtable></mrow>");
        }
        IndexStrategy::Random(random) => {
            let _ = write!(
                out,
                "<msub><mi>{}</mi><mi>{index}</mi></msub>",
                random.name
            );
        }
    }
}

/// `dy·⌊(j − x0)/dx⌋ + b` with identity factors left out.
fn write_linear(out: &mut String, linear: &LinearPattern, index: &str) {
    if linear.dy == 0 {
        let _ = write!(out, "<mn>{}</mn>", linear.b);
        return;
    }

    let mut shifted = format!("<mi>{index}</mi>");
    if linear.x_offset != 0 {
        write_signed_term(&mut shifted, -linear.x_offset);
    }

    if linear.dy != 1 {
        let _ = write!(out, "<mn>{}</mn><mo>&it;</mo>", linear.dy);
    }
    if linear.dx != 1 {
        let _ = write!(
            out,
            "<mo>&lfloor;</mo><mfrac><mrow>{shifted}</mrow><mn>{}</mn></mfrac><mo>&rfloor;</mo>",
            linear.dx
        );
    } else if linear.x_offset != 0 && linear.dy != 1 {
        let _ = write!(out, "<mfenced><mrow>{shifted}</mrow></mfenced>");
    } else {
        out.push_str(&shifted);
    }

    if linear.b != 0 {
        write_signed_term(out, linear.b);
    }
}

/// `⌊j/a⌋ + b`.
fn write_linear2(out: &mut String, linear: &Linear2Pattern, index: &str) {
    if linear.inverse_slope == 1 {
        let _ = write!(out, "<mi>{index}</mi>");
    } else {
        let _ = write!(
            out,
            "<mo>&lfloor;</mo><mfrac><mi>{index}</mi><mn>{}</mn></mfrac><mo>&rfloor;</mo>",
            linear.inverse_slope
        );
    }
    if linear.intercept != 0 {
        write_signed_term(out, linear.intercept);
    }
}

/// `+ v` or `- |v|`.
fn write_signed_term(out: &mut String, value: i64) {
    if value < 0 {
        let _ = write!(out, "<mo>-</mo><mn>{}</mn>", value.unsigned_abs());
    } else {
        let _ = write!(out, "<mo>+</mo><mn>{value}</mn>");
    }
}
