#![allow(dead_code)]

use ot_fuzzer::Fuzzer;
use serde_json::{json, Map, Value};
use ot_types::types::json::{self, JsonComponent, JsonEdit, JsonOp, PathKey};
use ot_types::types::text::{self, TextComponent, TextOp};
use ot_types::types::text_tp2::{self, api as tp2_api, Doc, Tp2Op};

pub fn char_count(s: &str) -> usize {
    s.chars().count()
}

/// A random flat-text op of one to three inserts and deletes valid against
/// `doc`, with the text it produces.
pub fn random_text_op(f: &mut Fuzzer, doc: &str) -> (TextOp, String) {
    let mut op = Vec::new();
    let mut current = doc.to_string();
    for _ in 0..f.int(1, 3) {
        let len = char_count(&current);
        let c = if len == 0 || f.chance(0.5) {
            TextComponent::insert(f.index(len + 1), f.text(1, 4))
        } else {
            let (start, n) = f.span(len, 4);
            TextComponent::delete(start, current.chars().skip(start).take(n).collect::<String>())
        };
        current = text::apply(&current, std::slice::from_ref(&c)).expect("generated component applies");
        op.push(c);
    }
    (op, current)
}

/// A random tombstone-text document: live text interleaved with tombstones.
pub fn random_tp2_doc(f: &mut Fuzzer) -> Doc {
    let mut doc = text_tp2::create(&f.text(0, 10));
    for _ in 0..f.int(0, 3) {
        if doc.char_length == 0 {
            break;
        }
        let (pos, len) = f.span(doc.char_length, 3);
        let op = tp2_api::delete_op(&doc, pos, len).expect("delete in range");
        doc = text_tp2::apply(&doc, &op).expect("delete applies");
    }
    doc
}

fn random_tp2_edit(f: &mut Fuzzer, doc: &Doc) -> Tp2Op {
    if doc.char_length == 0 || f.chance(0.5) {
        let pos = f.index(doc.char_length + 1);
        tp2_api::insert_op(doc, pos, &f.text(1, 3)).expect("insert in range")
    } else {
        let (pos, len) = f.span(doc.char_length, 3);
        tp2_api::delete_op(doc, pos, len).expect("delete in range")
    }
}

/// A random tombstone-text op against `doc`: a single edit, or two
/// sequential edits composed into one op.
pub fn random_tp2_op(f: &mut Fuzzer, doc: &Doc) -> Tp2Op {
    let first = random_tp2_edit(f, doc);
    if f.chance(0.5) {
        return first;
    }
    let mid = text_tp2::apply(doc, &first).expect("generated op applies");
    let second = random_tp2_edit(f, &mid);
    text_tp2::compose(&first, &second).expect("sequential ops compose")
}

const OBJECT_KEYS: [&str; 3] = ["a", "b", "c"];

fn small_int(f: &mut Fuzzer) -> Value {
    json!(f.int(0, 9))
}

/// A random tree with a list of numbers, an object, a string and a number
/// under fixed root keys.
pub fn random_json_doc(f: &mut Fuzzer) -> Value {
    let len = f.int(0, 5);
    let list: Vec<Value> = f.repeat(len, small_int);
    let mut obj = Map::new();
    for key in OBJECT_KEYS {
        if f.chance(0.5) {
            obj.insert(key.to_string(), small_int(f));
        }
    }
    json!({"list": list, "obj": obj, "text": f.text(0, 8), "n": f.int(0, 20)})
}

fn list_component(f: &mut Fuzzer, list: &[Value]) -> JsonComponent {
    let at = |i: usize| vec![PathKey::from("list"), PathKey::Index(i)];
    let len = list.len();
    if len == 0 {
        return JsonComponent::new(at(0), JsonEdit::ListInsert(small_int(f)));
    }
    let i = f.index(len);
    match f.int(0, 4) {
        0 => JsonComponent::new(at(f.index(len + 1)), JsonEdit::ListInsert(small_int(f))),
        1 => JsonComponent::new(at(i), JsonEdit::ListDelete(list[i].clone())),
        2 => JsonComponent::new(at(i), JsonEdit::ListReplace { ld: list[i].clone(), li: small_int(f) }),
        3 if len > 1 => {
            let to = (i + f.int(1, len - 1)) % len;
            JsonComponent::new(at(i), JsonEdit::ListMove(to))
        }
        _ => JsonComponent::new(at(i), JsonEdit::NumberAdd(f.int(1, 5).into())),
    }
}

fn object_component(f: &mut Fuzzer, obj: &Map<String, Value>) -> JsonComponent {
    let key = OBJECT_KEYS[f.index(OBJECT_KEYS.len())];
    let p = vec![PathKey::from("obj"), PathKey::from(key)];
    let edit = match obj.get(key) {
        None => JsonEdit::ObjectInsert(small_int(f)),
        Some(old) if f.chance(0.5) => JsonEdit::ObjectDelete(old.clone()),
        Some(old) => JsonEdit::ObjectReplace { od: old.clone(), oi: small_int(f) },
    };
    JsonComponent::new(p, edit)
}

fn string_component(f: &mut Fuzzer, s: &str) -> JsonComponent {
    let len = char_count(s);
    let at = |i: usize| vec![PathKey::from("text"), PathKey::Index(i)];
    if len == 0 || f.chance(0.5) {
        return JsonComponent::new(at(f.index(len + 1)), JsonEdit::StringInsert(f.text(1, 3)));
    }
    let (start, n) = f.span(len, 3);
    JsonComponent::new(at(start), JsonEdit::StringDelete(s.chars().skip(start).take(n).collect()))
}

/// A random single-component op valid against a tree from
/// [`random_json_doc`], with the tree it produces.
pub fn random_json_op(f: &mut Fuzzer, doc: &Value) -> (JsonOp, Value) {
    let c = match f.int(0, 3) {
        0 => list_component(f, doc["list"].as_array().map(Vec::as_slice).unwrap_or_default()),
        1 => object_component(f, doc["obj"].as_object().expect("tree has an object")),
        2 => string_component(f, doc["text"].as_str().unwrap_or_default()),
        _ => JsonComponent::new(vec![PathKey::from("n")], JsonEdit::NumberAdd(f.int(1, 5).into())),
    };
    let op = vec![c];
    let after = json::apply(doc, &op).expect("generated component applies");
    (op, after)
}
