#![allow(dead_code)]

use history_compressor::update::{updates_from_json, updates_to_json};
use history_compressor::{HistoryOp, RawUpdate, SingleOpUpdate, UpdateMeta};
use ot_fuzzer::Fuzzer;
use serde_json::Value;

pub const USER: &str = "user-id-1";
pub const OTHER_USER: &str = "user-id-2";
pub const DOC: &str = "mock-doc-id";
pub const TS1: i64 = 1_700_000_000_000;
pub const TS2: i64 = TS1 + 1000;

pub fn single_op_updates(v: Value) -> Vec<SingleOpUpdate> {
    updates_from_json(v).expect("fixture parses as single-op updates")
}

pub fn raw_updates(v: Value) -> Vec<RawUpdate> {
    updates_from_json(v).expect("fixture parses as raw updates")
}

pub fn to_json<O: serde::Serialize>(updates: &[history_compressor::Update<O>]) -> Value {
    updates_to_json(updates).expect("updates serialize")
}

pub fn char_count(s: &str) -> usize {
    s.chars().count()
}

/// A random editing session over `doc`: raw updates of one or two ops each,
/// mostly typing and backspacing near a moving caret, sometimes replacing a
/// selection. Returns the updates and the final text.
pub fn random_session(f: &mut Fuzzer, doc: &str) -> (Vec<RawUpdate>, String) {
    let mut text = doc.to_string();
    let mut caret = f.index(char_count(&text) + 1);
    let mut ts = TS1;
    let mut updates = Vec::new();

    for v in 0..f.int(1, 12) as u64 {
        let mut meta = UpdateMeta::new(ts);
        meta.user_id = Some(if f.chance(0.9) { USER } else { OTHER_USER }.to_string());
        meta.doc_length = Some(char_count(&text) as i64);
        ts += f.int(0, 30_000) as i64;

        let mut ops = Vec::new();
        for _ in 0..f.int(1, 2) {
            let len = char_count(&text);
            caret = caret.min(len);
            let op = if len > 0 && f.chance(0.2) {
                let (start, n) = f.span(len, 5);
                caret = start;
                HistoryOp::delete(start, text.chars().skip(start).take(n).collect::<String>())
            } else if caret > 0 && f.chance(0.25) {
                let n = f.int(1, caret.min(3));
                caret -= n;
                HistoryOp::delete(caret, text.chars().skip(caret).take(n).collect::<String>())
            } else {
                if f.chance(0.2) {
                    caret = f.index(len + 1);
                }
                let s = f.text(1, 4);
                let op = HistoryOp::insert(caret, s.as_str());
                caret += char_count(&s);
                op
            };
            text = apply_op(&text, &op);
            ops.push(op);
        }

        let mut update = RawUpdate::new(ops, meta);
        update.doc = Some(DOC.to_string());
        update.v = Some(v);
        updates.push(update);
    }
    (updates, text)
}

fn apply_op(text: &str, op: &HistoryOp) -> String {
    let c = op.to_text_component().expect("text op");
    ot_types::types::text::apply(text, &[c]).expect("generated op applies")
}
