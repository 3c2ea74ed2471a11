//! Loose value semantics shared by matching, previews and search
//!
//! Profile values are untyped JSON. Wherever a value is shown, searched or
//! compared against user-entered text it goes through the conversions here:
//! [`display_string`] for text, [`text_to_number`] for numeric coercion, and
//! [`loose_eq_text`] for the type-coercing comparison used by segments.

use serde_json::Value;

/// Text form of a value
///
/// Strings are returned unquoted, integers without a fraction, arrays as their
/// elements joined with `,` (nulls become empty), objects as `[object Object]`.
#[must_use]
pub fn display_string(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => number_string(n),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => display_string(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

/// Text form used for table cells: empty for null, `false`, zero and `""`
#[must_use]
pub fn cell_string(value: Option<&Value>) -> String {
    match value {
        Some(v) if is_truthy(v) => display_string(v),
        _ => String::new(),
    }
}

/// Whether a value counts as "present" for display fallbacks
#[must_use]
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Convert user-entered text to a number the way loose comparison does
///
/// Surrounding whitespace is ignored and empty text is zero. Decimal and
/// exponent forms, `Infinity` with an optional sign, and unsigned
/// `0x`/`0o`/`0b` integers are accepted. Anything else is `None`.
#[must_use]
pub fn text_to_number(text: &str) -> Option<f64> {
    let t = text.trim();
    if t.is_empty() {
        return Some(0.0);
    }

    match t {
        "Infinity" | "+Infinity" => return Some(f64::INFINITY),
        "-Infinity" => return Some(f64::NEG_INFINITY),
        _ => {}
    }

    for (prefix, radix) in [("0x", 16), ("0X", 16), ("0o", 8), ("0O", 8), ("0b", 2), ("0B", 2)] {
        if let Some(digits) = t.strip_prefix(prefix) {
            // from_str_radix tolerates a leading sign; radix literals are unsigned
            if digits.starts_with(['+', '-']) {
                return None;
            }
            return u128::from_str_radix(digits, radix).ok().map(|n| n as f64);
        }
    }

    // `str::parse::<f64>` also accepts "inf"/"nan", which must not convert
    let decimal_shape = t
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'));
    if !decimal_shape || !t.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }
    t.parse::<f64>().ok()
}

/// Loose equality between a profile value and a literal text
///
/// `None` (missing field) and `null` never match.
#[must_use]
pub fn loose_eq_text(value: Option<&Value>, text: &str) -> bool {
    let Some(value) = value else {
        return false;
    };

    match value {
        Value::Null => false,
        Value::String(s) => s == text,
        Value::Number(n) => match (n.as_f64(), text_to_number(text)) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        },
        Value::Bool(b) => text_to_number(text) == Some(if *b { 1.0 } else { 0.0 }),
        Value::Array(_) | Value::Object(_) => display_string(value) == text,
    }
}

fn number_string(n: &serde_json::Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    if let Some(u) = n.as_u64() {
        return u.to_string();
    }
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && f.abs() < 1e21 => format!("{f:.0}"),
        Some(f) => f.to_string(),
        None => n.to_string(),
    }
}
