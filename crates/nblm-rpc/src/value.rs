//! Navigation over positional RPC payloads.
//!
//! Payloads are nested arrays whose meaning depends on position, and the
//! service pads or truncates them freely. Everything here treats a missing
//! index or a wrong type as "absent" instead of failing, except
//! [`as_array`], which is the one place callers assert a shape.

use serde::Serialize;
use serde_json::Value;

use crate::RpcError;

static NULL: Value = Value::Null;

/// Elements of an array value. Anything else is a decode error.
pub fn as_array(value: &Value) -> Result<&[Value], RpcError> {
    match value {
        Value::Array(items) => Ok(items),
        other => Err(RpcError::decode(format!(
            "expected array, found {}",
            kind(other)
        ))),
    }
}

/// String contents, or `""` for any non-string.
pub fn as_str(value: &Value) -> &str {
    value.as_str().unwrap_or("")
}

/// Integer value, or `0` for any non-number. Integral floats such as `2.0`
/// are accepted since the service occasionally emits them.
pub fn as_int(value: &Value) -> i64 {
    if let Some(n) = value.as_i64() {
        return n;
    }
    match value.as_f64() {
        Some(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 => f as i64,
        _ => 0,
    }
}

/// Element at `index`, or null when out of range or not an array.
pub fn at(value: &Value, index: usize) -> &Value {
    value.get(index).unwrap_or(&NULL)
}

/// Follow a sequence of indices, yielding null at the first miss.
pub fn path<'a>(value: &'a Value, indices: &[usize]) -> &'a Value {
    indices.iter().fold(value, |current, &index| at(current, index))
}

/// Depth-first walk over every non-empty string nested in arrays.
pub fn text_spans(value: &Value) -> TextSpans<'_> {
    TextSpans { stack: vec![value] }
}

/// Collect every non-empty string found at any depth, in document order.
pub fn recursive_text_extract(value: &Value) -> Vec<String> {
    text_spans(value).map(str::to_string).collect()
}

pub struct TextSpans<'a> {
    stack: Vec<&'a Value>,
}

impl<'a> Iterator for TextSpans<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        while let Some(value) = self.stack.pop() {
            match value {
                Value::String(s) if !s.is_empty() => return Some(s),
                Value::Array(items) => self.stack.extend(items.iter().rev()),
                _ => {}
            }
        }
        None
    }
}

/// A source row from a notebook payload: `[[id], title, ...]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceEntry {
    pub id: String,
    pub title: String,
}

/// Parse the source list of a notebook. Rows without an id are skipped.
pub fn parse_source_entries(sources: &Value) -> Vec<SourceEntry> {
    let Value::Array(rows) = sources else {
        return Vec::new();
    };
    rows.iter()
        .filter_map(|row| {
            let id = as_str(path(row, &[0, 0]));
            if id.is_empty() {
                return None;
            }
            Some(SourceEntry {
                id: id.to_string(),
                title: as_str(at(row, 1)).to_string(),
            })
        })
        .collect()
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
