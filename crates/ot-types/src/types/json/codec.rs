//! JSON codec for path-addressed ops.
//!
//! A component is `{"p": [...], <edit>}` where the path mixes object keys
//! (strings) and list indices (non-negative integers) and the edit is one
//! of `li`, `ld`, `ld`+`li`, `lm`, `oi`, `od`, `od`+`oi`, `si`, `sd`, `na`.

use serde_json::{Map, Value};

use super::{JsonComponent, JsonEdit, JsonOp, Path, PathKey};
use crate::error::{OtError, OtResult};

const EDIT_KEYS: [&str; 8] = ["li", "ld", "lm", "oi", "od", "si", "sd", "na"];

pub fn path_to_json(p: &[PathKey]) -> Value {
    Value::Array(
        p.iter()
            .map(|key| match key {
                PathKey::Key(k) => Value::String(k.clone()),
                PathKey::Index(i) => Value::from(*i),
            })
            .collect(),
    )
}

pub fn path_from_json(v: &Value) -> OtResult<Path> {
    v.as_array()
        .ok_or_else(|| OtError::validation("path must be an array"))?
        .iter()
        .map(|key| match key {
            Value::String(k) => Ok(PathKey::Key(k.clone())),
            Value::Number(n) => n
                .as_u64()
                .map(|i| PathKey::Index(i as usize))
                .ok_or_else(|| OtError::validation(format!("path index {n} must be a non-negative integer"))),
            other => Err(OtError::validation(format!("invalid path element {other}"))),
        })
        .collect()
}

pub fn component_to_json(c: &JsonComponent) -> Value {
    let mut map = Map::new();
    map.insert("p".to_string(), path_to_json(&c.p));
    let mut put = |key: &str, value: Value| {
        map.insert(key.to_string(), value);
    };
    match &c.edit {
        JsonEdit::ListInsert(v) => put("li", v.clone()),
        JsonEdit::ListDelete(v) => put("ld", v.clone()),
        JsonEdit::ListReplace { ld, li } => {
            put("ld", ld.clone());
            put("li", li.clone());
        }
        JsonEdit::ListMove(to) => put("lm", Value::from(*to)),
        JsonEdit::ObjectInsert(v) => put("oi", v.clone()),
        JsonEdit::ObjectDelete(v) => put("od", v.clone()),
        JsonEdit::ObjectReplace { od, oi } => {
            put("od", od.clone());
            put("oi", oi.clone());
        }
        JsonEdit::StringInsert(s) => put("si", Value::String(s.clone())),
        JsonEdit::StringDelete(s) => put("sd", Value::String(s.clone())),
        JsonEdit::NumberAdd(n) => put("na", Value::Number(n.clone())),
    }
    Value::Object(map)
}

fn string_field(v: &Value, key: &str) -> OtResult<String> {
    v.as_str()
        .map(str::to_string)
        .ok_or_else(|| OtError::validation(format!("{key} must be a string")))
}

pub fn component_from_json(v: &Value) -> OtResult<JsonComponent> {
    let obj = v
        .as_object()
        .ok_or_else(|| OtError::validation("op components must be objects"))?;
    let p = match obj.get("p") {
        Some(p) => path_from_json(p)?,
        None => Vec::new(),
    };

    let present: Vec<&str> = EDIT_KEYS.into_iter().filter(|k| obj.contains_key(*k)).collect();
    let field = |key: &str| obj.get(key).cloned().unwrap_or(Value::Null);

    let edit = match present.as_slice() {
        ["li"] => JsonEdit::ListInsert(field("li")),
        ["ld"] => JsonEdit::ListDelete(field("ld")),
        ["li", "ld"] => JsonEdit::ListReplace { ld: field("ld"), li: field("li") },
        ["lm"] => {
            let to = obj["lm"]
                .as_u64()
                .ok_or_else(|| OtError::validation("lm must be a non-negative integer"))?;
            JsonEdit::ListMove(to as usize)
        }
        ["oi"] => JsonEdit::ObjectInsert(field("oi")),
        ["od"] => JsonEdit::ObjectDelete(field("od")),
        ["oi", "od"] => JsonEdit::ObjectReplace { od: field("od"), oi: field("oi") },
        ["si"] => JsonEdit::StringInsert(string_field(&obj["si"], "si")?),
        ["sd"] => JsonEdit::StringDelete(string_field(&obj["sd"], "sd")?),
        ["na"] => match &obj["na"] {
            Value::Number(n) => JsonEdit::NumberAdd(n.clone()),
            _ => return Err(OtError::validation("na must be a number")),
        },
        [] => return Err(OtError::validation("component has no edit")),
        keys => {
            return Err(OtError::validation(format!(
                "component combines incompatible edits {}",
                keys.join("+")
            )));
        }
    };
    Ok(JsonComponent { p, edit })
}

pub fn op_to_json(op: &[JsonComponent]) -> Value {
    Value::Array(op.iter().map(component_to_json).collect())
}

pub fn op_from_json(v: &Value) -> OtResult<JsonOp> {
    v.as_array()
        .ok_or_else(|| OtError::validation("op must be an array of components"))?
        .iter()
        .map(component_from_json)
        .collect()
}
