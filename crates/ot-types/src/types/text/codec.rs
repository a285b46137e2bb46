//! JSON codec for flat-text operations.
//!
//! Wire shape of a component: `{"p": 3, "i": "foo"}`, with exactly one of
//! `i`/`d`/`c` and an optional `"u": true` undo marker.

use serde_json::{Map, Value};

use super::{TextComponent, TextEdit, TextOp};
use crate::error::{OtError, OtResult};

// ── Serialization ─────────────────────────────────────────────────────────

pub fn component_to_json(c: &TextComponent) -> Value {
    let mut m = Map::new();
    m.insert("p".into(), Value::from(c.p));
    let (key, text) = match &c.edit {
        TextEdit::Insert(s) => ("i", s),
        TextEdit::Delete(s) => ("d", s),
        TextEdit::Comment(s) => ("c", s),
    };
    m.insert(key.into(), Value::String(text.clone()));
    if c.undo {
        m.insert("u".into(), Value::Bool(true));
    }
    Value::Object(m)
}

pub fn op_to_json(op: &[TextComponent]) -> Value {
    Value::Array(op.iter().map(component_to_json).collect())
}

// ── Deserialization ───────────────────────────────────────────────────────

/// Read `p` of a component object: present, integral and non-negative.
pub(crate) fn decode_position(obj: &Map<String, Value>) -> OtResult<usize> {
    let p = obj
        .get("p")
        .filter(|v| v.is_number())
        .ok_or_else(|| OtError::validation("component missing position field"))?;
    if p.as_i64().is_some_and(|n| n < 0) || p.as_f64().is_some_and(|n| n < 0.0) {
        return Err(OtError::validation("position cannot be negative"));
    }
    p.as_u64()
        .map(|n| n as usize)
        .ok_or_else(|| OtError::validation("position must be an integer"))
}

/// Read the single `i`/`d`/`c` field of a component object.
pub(crate) fn decode_edit(obj: &Map<String, Value>) -> OtResult<TextEdit> {
    let mut found = Vec::with_capacity(1);
    for key in ["i", "d", "c"] {
        if let Some(Value::String(s)) = obj.get(key) {
            found.push(match key {
                "i" => TextEdit::Insert(s.clone()),
                "d" => TextEdit::Delete(s.clone()),
                _ => TextEdit::Comment(s.clone()),
            });
        }
    }
    match found.len() {
        1 => Ok(found.remove(0)),
        _ => Err(OtError::validation("component needs exactly one of an i, d or c field")),
    }
}

pub fn component_from_json(v: &Value) -> OtResult<TextComponent> {
    let obj = v
        .as_object()
        .ok_or_else(|| OtError::validation("component must be an object"))?;
    let p = decode_position(obj)?;
    let edit = decode_edit(obj)?;
    let undo = obj.get("u").and_then(Value::as_bool).unwrap_or(false);
    Ok(TextComponent { p, edit, undo })
}

pub fn op_from_json(v: &Value) -> OtResult<TextOp> {
    v.as_array()
        .ok_or_else(|| OtError::validation("text op must be an array"))?
        .iter()
        .map(component_from_json)
        .collect()
}
