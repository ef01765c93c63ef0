use crate::data::record::FieldValue;
use std::cmp::Ordering;

/// Natural ordering of two field values.
///
/// Numbers compare numerically (integers and floats mixed), strings compare
/// shorter-first and then lexicographically. Numbers sort before strings.
/// The order is total: NaN sorts after every other number.
pub fn compare_field_values(a: &FieldValue, b: &FieldValue) -> Ordering {
    match (a, b) {
        (FieldValue::Integer(a), FieldValue::Integer(b)) => a.cmp(b),
        (FieldValue::Float(a), FieldValue::Float(b)) => compare_floats(*a, *b),

        // Compare actual numeric values, not types
        (FieldValue::Integer(i), FieldValue::Float(f)) => compare_integer_float(*i, *f),
        (FieldValue::Float(f), FieldValue::Integer(i)) => compare_integer_float(*i, *f).reverse(),

        (FieldValue::Text(a), FieldValue::Text(b)) => compare_length_then_lexical(a, b),

        (FieldValue::Integer(_) | FieldValue::Float(_), FieldValue::Text(_)) => Ordering::Less,
        (FieldValue::Text(_), FieldValue::Integer(_) | FieldValue::Float(_)) => Ordering::Greater,
    }
}

/// Floats by value, with every NaN equal and after everything else.
/// -0.0 and 0.0 are equal, as they are to the integer 0.
fn compare_floats(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) if a < b => Ordering::Less,
        (false, false) if a > b => Ordering::Greater,
        (false, false) => Ordering::Equal,
    }
}

/// Exact integer/float comparison; `i as f64` rounds above 2^53
fn compare_integer_float(i: i64, f: f64) -> Ordering {
    // 2^63: every float at or past it is beyond the i64 range
    const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

    if f.is_nan() || f >= I64_BOUND {
        return Ordering::Less;
    }
    if f < -I64_BOUND {
        return Ordering::Greater;
    }
    let whole = f.trunc();
    i.cmp(&(whole as i64))
        .then_with(|| compare_floats(0.0, f - whole))
}

/// Character count only; equal lengths compare equal
pub fn compare_char_count(a: Option<&FieldValue>, b: Option<&FieldValue>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a
            .to_string()
            .chars()
            .count()
            .cmp(&b.to_string().chars().count()),
        _ => compare_optional_field_values(a, b),
    }
}

/// Shorter string first, ties broken lexicographically
pub fn compare_length_then_lexical(a: &str, b: &str) -> Ordering {
    a.chars()
        .count()
        .cmp(&b.chars().count())
        .then_with(|| a.cmp(b))
}

/// Compare optional values; a missing field sorts first
pub fn compare_optional_field_values(a: Option<&FieldValue>, b: Option<&FieldValue>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => compare_field_values(a, b),
    }
}
