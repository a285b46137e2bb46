//! JSON codec for tombstone text.
//!
//! Components: `5` (skip), `{"i": "str"}`, `{"i": 3}` (tombstones),
//! `{"d": 2}`. Snapshots: `{"charLength", "totalLength", "data"}` with data
//! chunks as strings or tombstone counts.

use serde_json::{json, Value};

use super::{deserialize, Chunk, Doc, Tp2Component, Tp2Op};
use crate::error::{OtError, OtResult};

fn positive(v: &Value, what: &str) -> OtResult<usize> {
    match v.as_u64() {
        Some(n) if n > 0 => Ok(n as usize),
        _ => Err(OtError::validation(format!("{what} must be a positive integer, got {v}"))),
    }
}

// ── Components ────────────────────────────────────────────────────────────

pub fn component_to_json(c: &Tp2Component) -> Value {
    match c {
        Tp2Component::Skip(n) => json!(n),
        Tp2Component::Insert(s) => json!({ "i": s }),
        Tp2Component::InsertTombs(n) => json!({ "i": n }),
        Tp2Component::Delete(n) => json!({ "d": n }),
    }
}

pub fn component_from_json(v: &Value) -> OtResult<Tp2Component> {
    if v.is_number() {
        return Ok(Tp2Component::Skip(positive(v, "skip")?));
    }
    let obj = v
        .as_object()
        .ok_or_else(|| OtError::validation("op components must be objects or numbers"))?;
    match (obj.get("i"), obj.get("d")) {
        (Some(Value::String(s)), None) if !s.is_empty() => Ok(Tp2Component::Insert(s.clone())),
        (Some(i), None) if i.is_number() => Ok(Tp2Component::InsertTombs(positive(i, "insert")?)),
        (None, Some(d)) => Ok(Tp2Component::Delete(positive(d, "delete")?)),
        (Some(_), None) => Err(OtError::validation("inserts must insert a string or a positive number")),
        _ => Err(OtError::validation("operation component must define exactly one of i or d")),
    }
}

pub fn op_to_json(op: &[Tp2Component]) -> Value {
    Value::Array(op.iter().map(component_to_json).collect())
}

pub fn op_from_json(v: &Value) -> OtResult<Tp2Op> {
    v.as_array()
        .ok_or_else(|| OtError::validation("op must be an array of components"))?
        .iter()
        .map(component_from_json)
        .collect()
}

// ── Snapshots ─────────────────────────────────────────────────────────────

/// Compact form: the bare data array.
pub fn data_to_json(data: &[Chunk]) -> Value {
    Value::Array(
        data.iter()
            .map(|chunk| match chunk {
                Chunk::Text(s) => json!(s),
                Chunk::Tombs(n) => json!(n),
            })
            .collect(),
    )
}

pub fn data_from_json(v: &Value) -> OtResult<Vec<Chunk>> {
    v.as_array()
        .ok_or_else(|| OtError::validation("snapshot data must be an array"))?
        .iter()
        .map(|chunk| match chunk {
            Value::String(s) => Ok(Chunk::Text(s.clone())),
            n if n.is_number() => Ok(Chunk::Tombs(positive(n, "tombstone count")?)),
            other => Err(OtError::validation(format!("invalid snapshot chunk {other}"))),
        })
        .collect()
}

pub fn doc_to_json(doc: &Doc) -> Value {
    json!({
        "charLength": doc.char_length,
        "totalLength": doc.total_length,
        "data": data_to_json(&doc.data),
    })
}

/// Decode a full snapshot. Stated lengths must agree with the data.
pub fn doc_from_json(v: &Value) -> OtResult<Doc> {
    let obj = v
        .as_object()
        .ok_or_else(|| OtError::validation("snapshot must be an object"))?;
    let data = obj
        .get("data")
        .ok_or_else(|| OtError::validation("snapshot is missing data"))?;
    let doc = deserialize(data_from_json(data)?);

    for (key, expected) in [("charLength", doc.char_length), ("totalLength", doc.total_length)] {
        if let Some(stated) = obj.get(key) {
            if stated.as_u64() != Some(expected as u64) {
                return Err(OtError::validation(format!(
                    "snapshot {key} {stated} does not match its data ({expected})"
                )));
            }
        }
    }
    Ok(doc)
}
