//! Numeric literal formatting.
//!
//! Literals are printed like C's `%g`: at most `precision` significant
//! digits, trailing zeros removed, scientific notation when the decimal
//! exponent is below -4 or at least `precision`.

/// Format `value` with at most `precision` significant digits.
pub fn format_general(value: f64, precision: usize) -> String {
    if value.is_nan() {
        return "nan".to_owned();
    }
    if value.is_infinite() {
        return if value < 0.0 { "-inf" } else { "inf" }.to_owned();
    }
    let precision = precision.max(1);
    if value == 0.0 {
        return if value.is_sign_negative() { "-0" } else { "0" }.to_owned();
    }

    // The exponent after rounding decides between the two notations.
    let scientific = format!("{:.*e}", precision - 1, value);
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return scientific;
    };
    let Ok(exponent) = exponent.parse::<i64>() else {
        return scientific;
    };

    let digits = i64::try_from(precision).unwrap_or(i64::MAX);
    if exponent < -4 || exponent >= digits {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!(
            "{}e{sign}{:02}",
            strip_trailing_zeros(mantissa),
            exponent.unsigned_abs()
        )
    } else {
        let decimals = usize::try_from(digits - 1 - exponent).unwrap_or(0);
        strip_trailing_zeros(&format!("{value:.decimals$}")).to_owned()
    }
}

fn strip_trailing_zeros(text: &str) -> &str {
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.')
    } else {
        text
    }
}

/// A formatted literal split around its exponent marker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SplitLiteral<'a> {
    pub mantissa: &'a str,
    /// Exponent without `+` and without redundant leading zeros.
    pub exponent: Option<String>,
}

/// Split `%g` output into mantissa and normalized exponent.
pub fn split_exponent(text: &str) -> SplitLiteral<'_> {
    let Some((mantissa, rest)) = text.split_once('e') else {
        return SplitLiteral {
            mantissa: text,
            exponent: None,
        };
    };

    let mut exponent = String::with_capacity(rest.len());
    let digits = if let Some(negative) = rest.strip_prefix('-') {
        exponent.push('-');
        negative
    } else {
        rest.strip_prefix('+').unwrap_or(rest)
    };
    // Keep at least one digit.
    let significant = digits.trim_start_matches('0');
    if significant.is_empty() {
        exponent.push_str(&digits[digits.len().saturating_sub(1)..]);
    } else {
        exponent.push_str(significant);
    }

    SplitLiteral {
        mantissa,
        exponent: Some(exponent),
    }
}
