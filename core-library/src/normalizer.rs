//! # Identity Normalizer
//!
//! Derives the comparison key `"{name}_{size}"` that decides whether records
//! from different stores are the same logical document.
//!
//! Names are lower-cased, characters that providers reject or rewrite
//! (`< > : " | ? * \ /` and whitespace runs) become `_`, repeated `_` collapse
//! and edge `_` are trimmed. `.` is kept, so `"My File.pdf"` and
//! `"my_file.pdf"` both normalize to `my_file.pdf`.
//!
//! Sizes arrive as numbers or decimal strings and always come out as a
//! non-negative integer. Nothing here fails; missing input yields
//! `"unknown_0"`.

use bridge_traits::records::RawSize;
use serde_json::Value;

const UNKNOWN_NAME: &str = "unknown";

/// Normalize a display name for comparison.
///
/// ```
/// use core_library::normalizer::normalize_name;
///
/// assert_eq!(normalize_name("My  File.pdf"), "my_file.pdf");
/// assert_eq!(normalize_name("a<b>c"), "a_b_c");
/// ```
pub fn normalize_name(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_sep = false;

    for ch in raw.chars().flat_map(char::to_lowercase) {
        let is_sep = ch.is_whitespace()
            || matches!(ch, '<' | '>' | ':' | '"' | '|' | '?' | '*' | '\\' | '/' | '_');
        if is_sep {
            pending_sep = true;
            continue;
        }
        if pending_sep && !out.is_empty() {
            out.push('_');
        }
        pending_sep = false;
        out.push(ch);
    }

    if out.is_empty() {
        UNKNOWN_NAME.to_string()
    } else {
        out
    }
}

/// Coerce a wire size to a non-negative integer.
///
/// Text is read like an integer literal with trailing garbage ignored
/// (`"1024 bytes"` is 1024); negative or unparseable values become 0.
pub fn normalize_size(raw: &RawSize) -> u64 {
    match raw {
        RawSize::Number(number) => number_to_size(number),
        RawSize::Text(text) => parse_leading_integer(text),
    }
}

/// Comparison key from an already extracted name and size.
///
/// ```
/// use core_library::normalizer::comparison_key;
///
/// assert_eq!(comparison_key(Some("My File.pdf"), 0), "my_file.pdf_0");
/// assert_eq!(comparison_key(None, 0), "unknown_0");
/// ```
pub fn comparison_key(name: Option<&str>, size: u64) -> String {
    let normalized = name.map(normalize_name);
    format!(
        "{}_{}",
        normalized.as_deref().unwrap_or(UNKNOWN_NAME),
        size
    )
}

/// Comparison key for an untyped JSON record.
///
/// The name is taken from the first of `name`, `title`, `filename` that is a
/// string; the size from `size` or `bytes`.
pub fn normalize_value(record: &Value) -> String {
    let name = ["name", "title", "filename"]
        .iter()
        .find_map(|field| record.get(*field).and_then(Value::as_str));

    let size = ["size", "bytes"]
        .iter()
        .find_map(|field| record.get(*field).filter(|v| !v.is_null()))
        .map(|value| match value {
            Value::Number(number) => number_to_size(number),
            Value::String(text) => parse_leading_integer(text),
            Value::Bool(flag) => u64::from(*flag),
            _ => 0,
        })
        .unwrap_or(0);

    comparison_key(name, size)
}

fn number_to_size(number: &serde_json::Number) -> u64 {
    if let Some(value) = number.as_u64() {
        return value;
    }
    match number.as_f64() {
        Some(value) if value.is_finite() && value > 0.0 => value.trunc() as u64,
        _ => 0,
    }
}

fn parse_leading_integer(text: &str) -> u64 {
    let trimmed = text.trim_start();
    if trimmed.starts_with('-') {
        return 0;
    }
    let digits: String = trimmed
        .strip_prefix('+')
        .unwrap_or(trimmed)
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().unwrap_or(0)
}
