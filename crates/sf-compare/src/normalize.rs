//! Canonical text form of cell values and rows

use sf_core::SqlValue;

/// Token standing in for SQL NULL.
pub const NULL_TOKEN: &str = "<NULL>";

/// Separator between values in a row signature.
pub const SEPARATOR: &str = "|";

/// Canonical text of one value.
///
/// Floats use the shortest text that round-trips, decimals drop
/// insignificant trailing zeros, so `Int(10)`, `Decimal("10.00")` and
/// `Float(10.0)` all normalize to `10`.
pub fn normalize_value(value: &SqlValue) -> String {
    match value {
        SqlValue::Null => NULL_TOKEN.to_string(),
        SqlValue::Decimal(d) => trim_decimal(d),
        other => other.to_string(),
    }
}

/// Join values into a row signature.
///
/// Text is escaped so the separator and the NULL token inside a value
/// never collide with the structure of the signature.
pub fn signature<'a>(values: impl IntoIterator<Item = &'a SqlValue>) -> String {
    values
        .into_iter()
        .map(signature_part)
        .collect::<Vec<_>>()
        .join(SEPARATOR)
}

fn signature_part(value: &SqlValue) -> String {
    match value {
        SqlValue::Null => NULL_TOKEN.to_string(),
        other => escape(&normalize_value(other)),
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '|' | '<') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn trim_decimal(text: &str) -> String {
    let text = text.trim();
    if !text.contains('.') || text.contains(['e', 'E']) {
        return text.to_string();
    }
    let trimmed = text.trim_end_matches('0').trim_end_matches('.');
    match trimmed {
        "" | "-" => "0".to_string(),
        "-0" => "0".to_string(),
        _ => trimmed.to_string(),
    }
}
