mod common;

use common::{raw_updates, single_op_updates, to_json, DOC, OTHER_USER, TS1, TS2, USER};
use history_compressor::{
    compress_raw_updates, compress_updates, concat_updates_with_same_version, convert_to_single_op_updates,
    CompressorConfig,
};
use serde_json::{json, Value};

fn split(input: Value) -> Value {
    to_json(&convert_to_single_op_updates(raw_updates(input)))
}

fn concat(input: Value) -> Value {
    to_json(&concat_updates_with_same_version(single_op_updates(input)))
}

fn compress(input: Value) -> Value {
    to_json(&compress_updates(single_op_updates(input)).expect("batch compresses"))
}

fn meta(ts: i64) -> Value {
    json!({"ts": ts, "user_id": USER})
}

/// Asserts that the two updates are left apart.
fn assert_kept_apart(first: Value, second: Value) {
    let input = json!([first, second]);
    assert_eq!(compress(input.clone()), input);
}

// ── Splitting ─────────────────────────────────────────────────────────────

#[test]
fn split_grouped_updates() {
    assert_eq!(
        split(json!([
            {"op": [{"p": 0, "i": "Foo"}, {"p": 6, "i": "bar"}], "meta": meta(TS1), "v": 42},
            {"op": [{"p": 10, "i": "baz"}], "meta": {"ts": TS2, "user_id": OTHER_USER}, "v": 43}
        ])),
        json!([
            {"op": {"p": 0, "i": "Foo"}, "meta": meta(TS1), "v": 42},
            {"op": {"p": 6, "i": "bar"}, "meta": meta(TS1), "v": 42},
            {"op": {"p": 10, "i": "baz"}, "meta": {"ts": TS2, "user_id": OTHER_USER}, "v": 43}
        ])
    );
}

#[test]
fn split_drops_empty_updates() {
    assert_eq!(split(json!([{"op": [], "meta": meta(TS1), "v": 42}])), json!([]));
}

#[test]
fn split_keeps_comments_and_retains() {
    let meta10 = json!({"ts": TS1, "user_id": USER, "doc_length": 10});
    let meta13 = json!({"ts": TS1, "user_id": USER, "doc_length": 13});
    for middle in [json!({"p": 9, "c": "baz"}), json!({"p": 9, "r": "baz", "tracking": {"type": "none"}})] {
        assert_eq!(
            split(json!([{"op": [{"p": 0, "i": "Foo"}, middle, {"p": 6, "i": "bar"}], "meta": meta10, "v": 42}])),
            json!([
                {"op": {"p": 0, "i": "Foo"}, "meta": meta10, "v": 42},
                {"op": middle, "meta": meta13, "v": 42},
                {"op": {"p": 6, "i": "bar"}, "meta": meta13, "v": 42}
            ])
        );
    }
}

#[test]
fn split_threads_doc_length() {
    let with_len = |n: i64| json!({"ts": TS1, "user_id": USER, "doc_length": n});
    assert_eq!(
        split(json!([{"op": [{"p": 0, "i": "foo"}, {"p": 6, "d": "bar"}], "meta": with_len(20), "v": 42}])),
        json!([
            {"op": {"p": 0, "i": "foo"}, "meta": with_len(20), "v": 42},
            {"op": {"p": 6, "d": "bar"}, "meta": with_len(23), "v": 42}
        ])
    );
    assert_eq!(
        split(json!([{"op": [{"p": 0, "d": "foo"}, {"p": 6, "i": "bar"}], "meta": with_len(20), "v": 42}])),
        json!([
            {"op": {"p": 0, "d": "foo"}, "meta": with_len(20), "v": 42},
            {"op": {"p": 6, "i": "bar"}, "meta": with_len(17), "v": 42}
        ])
    );
}

#[test]
fn split_counts_tracked_changes() {
    let tracked = |n: i64| json!({"ts": TS1, "user_id": USER, "tc": "tracked-change-id", "doc_length": n});
    let pineapple = json!({"p": 8, "d": "pineapple", "trackedChanges": [{"type": "insert", "offset": 0, "length": 9}]});
    let input = json!([{
        "op": [
            {"p": 6, "i": "orange"},
            {"p": 22, "d": "apple"},
            {"p": 12, "i": "melon", "u": true},
            {"p": 18, "i": "banana", "u": true, "trackedDeleteRejection": true},
            pineapple,
            {"p": 11, "i": "fruit salad"}
        ],
        "meta": {"ts": TS1, "user_id": USER, "tc": "tracked-change-id", "doc_length": 20, "history_doc_length": 30},
        "v": 42
    }]);
    assert_eq!(
        split(input),
        json!([
            {"op": {"p": 6, "i": "orange"}, "meta": tracked(30), "v": 42},
            {"op": {"p": 22, "d": "apple"}, "meta": tracked(36), "v": 42},
            {"op": {"p": 12, "i": "melon", "u": true}, "meta": tracked(36), "v": 42},
            {"op": {"p": 18, "i": "banana", "u": true, "trackedDeleteRejection": true}, "meta": tracked(41), "v": 42},
            {"op": pineapple, "meta": tracked(41), "v": 42},
            {"op": {"p": 11, "i": "fruit salad"}, "meta": tracked(32), "v": 42}
        ])
    );
}

#[test]
fn split_moves_doc_hash_to_last_op() {
    let hashed = |h: &str| json!({"ts": TS1, "user_id": USER, "doc_hash": h});
    assert_eq!(
        split(json!([
            {"op": [{"p": 0, "i": "foo"}, {"p": 6, "i": "bar"}], "meta": hashed("hash1"), "v": 42},
            {"op": [{"p": 10, "i": "baz"}], "meta": hashed("hash2"), "v": 43},
            {"op": [{"p": 0, "d": "foo"}, {"p": 20, "i": "quux"}, {"p": 3, "d": "bar"}], "meta": hashed("hash3"), "v": 44}
        ])),
        json!([
            {"op": {"p": 0, "i": "foo"}, "meta": meta(TS1), "v": 42},
            {"op": {"p": 6, "i": "bar"}, "meta": hashed("hash1"), "v": 42},
            {"op": {"p": 10, "i": "baz"}, "meta": hashed("hash2"), "v": 43},
            {"op": {"p": 0, "d": "foo"}, "meta": meta(TS1), "v": 44},
            {"op": {"p": 20, "i": "quux"}, "meta": meta(TS1), "v": 44},
            {"op": {"p": 3, "d": "bar"}, "meta": hashed("hash3"), "v": 44}
        ])
    );
}

// ── Grouping ──────────────────────────────────────────────────────────────

#[test]
fn concat_same_version() {
    let other = json!({"ts": TS2, "user_id": OTHER_USER});
    assert_eq!(
        concat(json!([
            {"doc": DOC, "pathname": "main.tex", "op": {"p": 0, "i": "Foo"}, "meta": meta(TS1), "v": 42},
            {"doc": DOC, "pathname": "main.tex", "op": {"p": 6, "i": "bar"}, "meta": meta(TS1), "v": 42},
            {"doc": DOC, "pathname": "main.tex", "op": {"p": 10, "i": "baz"}, "meta": other, "v": 43}
        ])),
        json!([
            {"doc": DOC, "pathname": "main.tex", "op": [{"p": 0, "i": "Foo"}, {"p": 6, "i": "bar"}], "meta": meta(TS1), "v": 42},
            {"doc": DOC, "pathname": "main.tex", "op": [{"p": 10, "i": "baz"}], "meta": other, "v": 43}
        ])
    );
}

#[test]
fn concat_keeps_documents_apart() {
    assert_eq!(
        concat(json!([
            {"doc": DOC, "pathname": "main.tex", "op": {"p": 0, "i": "Foo"}, "meta": meta(TS1), "v": 42},
            {"doc": "other", "pathname": "main.tex", "op": {"p": 6, "i": "bar"}, "meta": meta(TS1), "v": 42}
        ])),
        json!([
            {"doc": DOC, "pathname": "main.tex", "op": [{"p": 0, "i": "Foo"}], "meta": meta(TS1), "v": 42},
            {"doc": "other", "pathname": "main.tex", "op": [{"p": 6, "i": "bar"}], "meta": meta(TS1), "v": 42}
        ])
    );
}

#[test]
fn concat_keeps_structure_updates_apart() {
    let rename = json!({"pathname": "main.tex", "new_pathname": "new.tex", "meta": meta(TS1), "v": 42});
    assert_eq!(
        concat(json!([
            {"doc": DOC, "pathname": "main.tex", "op": {"p": 0, "i": "Foo"}, "meta": meta(TS1), "v": 42},
            rename
        ])),
        json!([
            {"doc": DOC, "pathname": "main.tex", "op": [{"p": 0, "i": "Foo"}], "meta": meta(TS1), "v": 42},
            rename
        ])
    );
}

#[test]
fn concat_keeps_last_doc_hash() {
    let hashed = |h: &str| json!({"ts": TS1, "user_id": USER, "doc_hash": h});
    assert_eq!(
        concat(json!([
            {"doc": DOC, "pathname": "main.tex", "op": {"p": 0, "i": "foo"}, "meta": meta(TS1), "v": 1},
            {"doc": DOC, "pathname": "main.tex", "op": {"p": 10, "i": "bar"}, "meta": hashed("hash1"), "v": 1},
            {"doc": DOC, "pathname": "main.tex", "op": {"p": 20, "i": "baz"}, "meta": hashed("hash2"), "v": 2},
            {"doc": DOC, "pathname": "main.tex", "op": {"p": 30, "i": "quux"}, "meta": meta(TS1), "v": 2}
        ])),
        json!([
            {"doc": DOC, "pathname": "main.tex", "op": [{"p": 0, "i": "foo"}, {"p": 10, "i": "bar"}], "meta": hashed("hash1"), "v": 1},
            {"doc": DOC, "pathname": "main.tex", "op": [{"p": 20, "i": "baz"}, {"p": 30, "i": "quux"}], "meta": meta(TS1), "v": 2}
        ])
    );
}

// ── Insert + insert ───────────────────────────────────────────────────────

#[test]
fn insert_insert_appends() {
    assert_eq!(
        compress(json!([
            {"op": {"p": 3, "i": "foo"}, "meta": meta(TS1), "v": 42},
            {"op": {"p": 6, "i": "bar"}, "meta": meta(TS2), "v": 43}
        ])),
        json!([{"op": {"p": 3, "i": "foobar"}, "meta": meta(TS1), "v": 43}])
    );
}

#[test]
fn insert_insert_splices() {
    assert_eq!(
        compress(json!([
            {"op": {"p": 3, "i": "foo"}, "meta": meta(TS1), "v": 42},
            {"op": {"p": 5, "i": "bar"}, "meta": meta(TS2), "v": 43}
        ])),
        json!([{"op": {"p": 3, "i": "fobaro"}, "meta": meta(TS1), "v": 43}])
    );
}

#[test]
fn insert_insert_kept_apart() {
    let big = "a".repeat(2 * 1024 * 1024);
    let medium = "a".repeat(1024 * 1024);
    let first = json!({"op": {"p": 3, "i": "foo"}, "meta": meta(TS1), "v": 42});

    // Separated.
    assert_kept_apart(first.clone(), json!({"op": {"p": 9, "i": "bar"}, "meta": meta(TS2), "v": 43}));
    // Too big.
    assert_kept_apart(first.clone(), json!({"op": {"p": 6, "i": big}, "meta": meta(TS2), "v": 43}));
    assert_kept_apart(
        json!({"op": {"p": 3, "i": big}, "meta": meta(TS1), "v": 42}),
        json!({"op": {"p": 3 + big.len(), "i": "bar"}, "meta": meta(TS2), "v": 43}),
    );
    assert_kept_apart(
        json!({"op": {"p": 3, "i": medium}, "meta": meta(TS1), "v": 42}),
        json!({"op": {"p": 3 + medium.len(), "i": medium}, "meta": meta(TS2), "v": 43}),
    );
    // Too far apart in time.
    assert_kept_apart(first.clone(), json!({"op": {"p": 6, "i": "bar"}, "meta": meta(TS1 + 120_000), "v": 43}));
    // Different documents.
    assert_kept_apart(
        json!({"doc": "doc-one", "op": {"p": 3, "i": "foo"}, "meta": meta(TS1), "v": 42}),
        json!({"doc": "doc-two", "op": {"p": 6, "i": "bar"}, "meta": meta(TS2), "v": 43}),
    );
    assert_kept_apart(
        json!({"pathname": "doc-one", "op": {"p": 3, "i": "foo"}, "meta": meta(TS1), "v": 42}),
        json!({"pathname": "doc-two", "op": {"p": 6, "i": "bar"}, "meta": meta(TS2), "v": 43}),
    );
    // Tracked and untracked.
    assert_kept_apart(
        first.clone(),
        json!({"op": {"p": 6, "i": "bar"}, "meta": {"ts": TS2, "user_id": USER, "tc": "tracking-id"}, "v": 43}),
    );
    // Undo and regular.
    assert_kept_apart(first.clone(), json!({"op": {"p": 6, "i": "bar", "u": true}, "meta": meta(TS2), "v": 43}));
    // Tracked delete rejection.
    assert_kept_apart(
        first.clone(),
        json!({"op": {"p": 6, "i": "bar", "trackedDeleteRejection": true}, "meta": meta(TS2), "v": 43}),
    );
    // Different users.
    assert_kept_apart(
        first.clone(),
        json!({"op": {"p": 6, "i": "bar"}, "meta": {"ts": TS2, "user_id": OTHER_USER}, "v": 43}),
    );
    // Different comments.
    assert_kept_apart(
        json!({"op": {"p": 3, "i": "foo", "hpos": 13, "commentIds": ["comment-id-1"]}, "meta": meta(TS1), "v": 42}),
        json!({"op": {"p": 6, "i": "bar", "hpos": 16}, "meta": meta(TS2), "v": 43}),
    );
}

#[test]
fn insert_insert_separated_by_structure_update() {
    let input = json!([
        {"op": {"p": 3, "i": "foo"}, "meta": meta(TS1), "v": 42},
        {"pathname": "/old.tex", "new_pathname": "/new.tex", "meta": meta(TS1), "v": 43},
        {"op": {"p": 6, "i": "bar"}, "meta": meta(TS2), "v": 44}
    ]);
    assert_eq!(compress(input.clone()), input);
}

#[test]
fn insert_insert_preserves_metadata() {
    assert_eq!(
        compress(json!([
            {"op": {"p": 3, "i": "foo", "hpos": 13, "commentIds": ["comment-id-1"]}, "meta": meta(TS1), "v": 42},
            {"op": {"p": 6, "i": "bar", "hpos": 16, "commentIds": ["comment-id-1"]}, "meta": meta(TS2), "v": 43}
        ])),
        json!([{"op": {"p": 3, "i": "foobar", "hpos": 13, "commentIds": ["comment-id-1"]}, "meta": meta(TS1), "v": 43}])
    );
}

// ── Delete + delete ───────────────────────────────────────────────────────

#[test]
fn delete_delete_appends() {
    assert_eq!(
        compress(json!([
            {"op": {"p": 3, "d": "foo"}, "meta": meta(TS1), "v": 42},
            {"op": {"p": 3, "d": "bar"}, "meta": meta(TS2), "v": 43}
        ])),
        json!([{"op": {"p": 3, "d": "foobar"}, "meta": meta(TS1), "v": 43}])
    );
}

#[test]
fn delete_delete_splices() {
    assert_eq!(
        compress(json!([
            {"op": {"p": 3, "d": "foo"}, "meta": meta(TS1), "v": 42},
            {"op": {"p": 1, "d": "bar"}, "meta": meta(TS2), "v": 43}
        ])),
        json!([{"op": {"p": 1, "d": "bafoor"}, "meta": meta(TS1), "v": 43}])
    );
}

#[test]
fn delete_delete_kept_apart() {
    let first = json!({"op": {"p": 3, "d": "foo"}, "meta": meta(TS1), "v": 42});
    assert_kept_apart(first.clone(), json!({"op": {"p": 9, "d": "bar"}, "meta": meta(TS2), "v": 43}));
    assert_kept_apart(
        first,
        json!({
            "op": {"p": 3, "d": "bar", "trackedChanges": [{"type": "delete", "pos": 2, "length": 10}]},
            "meta": meta(TS2),
            "v": 43
        }),
    );
    let tracked = |ts: i64| json!({"ts": ts, "user_id": USER, "tc": "tracking-id"});
    assert_kept_apart(
        json!({"op": {"p": 3, "d": "foo"}, "meta": tracked(TS1), "v": 42}),
        json!({"op": {"p": 3, "d": "bar"}, "meta": tracked(TS2), "v": 43}),
    );
}

// ── Insert + delete ───────────────────────────────────────────────────────

#[test]
fn insert_delete_trims_insert() {
    assert_eq!(
        compress(json!([
            {"op": {"p": 3, "i": "foo", "hpos": 13}, "meta": meta(TS1), "v": 42},
            {"op": {"p": 5, "d": "o", "hpos": 15}, "meta": meta(TS2), "v": 43}
        ])),
        json!([{"op": {"p": 3, "i": "fo", "hpos": 13}, "meta": meta(TS1), "v": 43}])
    );
    assert_eq!(
        compress(json!([
            {"op": {"p": 3, "i": "fobaro"}, "meta": meta(TS1), "v": 42},
            {"op": {"p": 5, "d": "bar"}, "meta": meta(TS2), "v": 43}
        ])),
        json!([{"op": {"p": 3, "i": "foo"}, "meta": meta(TS1), "v": 43}])
    );
}

#[test]
fn insert_delete_cancel() {
    assert_eq!(
        compress(json!([
            {"op": {"p": 3, "i": "foo"}, "meta": meta(TS1), "v": 42},
            {"op": {"p": 3, "d": "foo"}, "meta": meta(TS2), "v": 43}
        ])),
        json!([])
    );
}

#[test]
fn insert_delete_kept_apart() {
    assert_kept_apart(
        json!({"op": {"p": 3, "i": "foo"}, "meta": meta(TS1), "v": 42}),
        json!({"op": {"p": 9, "d": "bar"}, "meta": meta(TS2), "v": 43}),
    );
    // The delete runs past the end of the insert.
    assert_kept_apart(
        json!({"op": {"p": 3, "i": "foobar"}, "meta": meta(TS1), "v": 42}),
        json!({"op": {"p": 6, "d": "bardle"}, "meta": meta(TS2), "v": 43}),
    );
}

// ── Delete + insert ───────────────────────────────────────────────────────

#[test]
fn delete_insert_diffs_content() {
    let with_len = |ts: i64, n: i64| json!({"ts": ts, "user_id": USER, "doc_length": n});
    assert_eq!(
        compress(json!([
            {"op": {"p": 3, "d": "one two three four five six seven eight", "hpos": 13}, "meta": with_len(TS1, 100), "v": 42},
            {
                "op": {"p": 3, "i": "one 2 three four five six seven eight", "hpos": 13, "commentIds": ["comment-1"]},
                "meta": with_len(TS2, 100),
                "v": 43
            }
        ])),
        json!([
            {"op": {"p": 7, "d": "two", "hpos": 17}, "meta": with_len(TS1, 100), "v": 43},
            {"op": {"p": 7, "i": "2", "hpos": 17, "commentIds": ["comment-1"]}, "meta": with_len(TS1, 97), "v": 43}
        ])
    );
}

#[test]
fn delete_insert_of_same_text_cancels() {
    assert_eq!(
        compress(json!([
            {"op": {"p": 3, "d": "one two three four five six seven eight"}, "meta": meta(TS1), "v": 42},
            {"op": {"p": 3, "i": "one two three four five six seven eight"}, "meta": meta(TS2), "v": 43}
        ])),
        json!([])
    );
}

#[test]
fn delete_insert_tracked_kept_apart() {
    let tracked = |ts: i64| json!({"ts": ts, "user_id": USER, "doc_length": 100, "tc": "tracking-id"});
    assert_kept_apart(
        json!({"op": {"p": 3, "d": "one two three four five six seven eight"}, "meta": tracked(TS1), "v": 42}),
        json!({"op": {"p": 3, "i": "one 2 three four five six seven eight"}, "meta": tracked(TS2), "v": 43}),
    );
}

// ── Runs ──────────────────────────────────────────────────────────────────

#[test]
fn runs_split_after_the_time_window() {
    assert_eq!(
        compress(json!([
            {"op": {"p": 3, "i": "foo"}, "meta": meta(TS1), "v": 42},
            {"op": {"p": 6, "i": "bar"}, "meta": meta(TS1 + 20_000), "v": 43},
            {"op": {"p": 9, "i": "baz"}, "meta": meta(TS1 + 40_000), "v": 44},
            {"op": {"p": 12, "i": "qux"}, "meta": meta(TS1 + 80_000), "v": 45}
        ])),
        json!([
            {"op": {"p": 3, "i": "foobarbaz"}, "meta": meta(TS1), "v": 44},
            {"op": {"p": 12, "i": "qux"}, "meta": meta(TS1 + 80_000), "v": 45}
        ])
    );
}

#[test]
fn extreme_timestamps_are_kept_apart() {
    assert_kept_apart(
        json!({"op": {"p": 3, "i": "foo"}, "meta": meta(i64::MIN), "v": 42}),
        json!({"op": {"p": 6, "i": "bar"}, "meta": meta(i64::MAX), "v": 43}),
    );
}

#[test]
fn external_updates_fold_by_source() {
    let sourced = |source: &str| json!({"ts": TS1, "user_id": USER, "source": source});
    let external = |source: &str| json!({"ts": TS1, "user_id": USER, "type": "external", "source": source});
    assert_eq!(
        compress(json!([
            {"op": {"p": 3, "i": "foo"}, "meta": sourced("some-editor-id"), "v": 42},
            {"op": {"p": 6, "i": "bar"}, "meta": sourced("some-other-editor-id"), "v": 43},
            {"op": {"p": 9, "i": "baz"}, "meta": external("dropbox"), "v": 44},
            {"op": {"p": 12, "i": "qux"}, "meta": external("dropbox"), "v": 45},
            {"op": {"p": 15, "i": "quux"}, "meta": external("upload"), "v": 46}
        ])),
        json!([
            {"op": {"p": 3, "i": "foobar"}, "meta": sourced("some-editor-id"), "v": 43},
            {"op": {"p": 9, "i": "bazqux"}, "meta": external("dropbox"), "v": 45},
            {"op": {"p": 15, "i": "quux"}, "meta": external("upload"), "v": 46}
        ])
    );
}

// ── Doc hash ──────────────────────────────────────────────────────────────

#[test]
fn doc_hash_follows_the_last_update() {
    let hashed = json!({"ts": TS1, "user_id": USER, "doc_hash": "hash1"});
    assert_eq!(
        compress(json!([
            {"op": {"p": 3, "i": "foo"}, "meta": meta(TS1), "v": 42},
            {"op": {"p": 6, "i": "bar"}, "meta": hashed, "v": 43}
        ])),
        json!([{"op": {"p": 3, "i": "foobar"}, "meta": hashed, "v": 43}])
    );
    assert_eq!(
        compress(json!([
            {"op": {"p": 3, "i": "foo"}, "meta": hashed, "v": 42},
            {"op": {"p": 6, "i": "bar"}, "meta": meta(TS1), "v": 43}
        ])),
        json!([{"op": {"p": 3, "i": "foobar"}, "meta": meta(TS1), "v": 43}])
    );
}

#[test]
fn doc_hash_after_diff() {
    let m = json!({"ts": TS1, "user_id": USER, "doc_length": 10});
    assert_eq!(
        compress(json!([
            {"op": {"p": 3, "d": "foo"}, "meta": m, "v": 42},
            {"op": {"p": 3, "i": "bar"}, "meta": {"ts": TS1, "user_id": USER, "doc_length": 10, "doc_hash": "hash1"}, "v": 43}
        ])),
        json!([
            {"op": {"p": 3, "d": "foo"}, "meta": m, "v": 43},
            {"op": {"p": 3, "i": "bar"}, "meta": {"ts": TS1, "user_id": USER, "doc_length": 7, "doc_hash": "hash1"}, "v": 43}
        ])
    );
}

// ── Whole pipeline ────────────────────────────────────────────────────────

#[test]
fn raw_updates_end_to_end() {
    let m = |ts: i64, len: i64| json!({"ts": ts, "user_id": USER, "doc_length": len});
    let out = compress_raw_updates(raw_updates(json!([
        {"doc": DOC, "op": [{"p": 0, "i": "Hello"}], "meta": m(TS1, 0), "v": 1},
        {"doc": DOC, "op": [{"p": 5, "i": " wrold"}], "meta": m(TS1 + 100, 5), "v": 2},
        {"doc": DOC, "op": [{"p": 6, "d": "wrold"}, {"p": 6, "i": "world"}], "meta": m(TS1 + 200, 11), "v": 3}
    ])))
    .expect("batch compresses");
    assert_eq!(
        to_json(&out),
        json!([{"doc": DOC, "op": [{"p": 0, "i": "Hello world"}], "meta": m(TS1, 0), "v": 3}])
    );
}

#[test]
fn compressor_settings_from_toml() {
    let config: CompressorConfig = toml::from_str(
        r#"
        max_time_between_updates_ms = 1000
        diff_timeout_ms = 0
        "#,
    )
    .expect("settings parse");
    assert_eq!(config.max_time_between_updates_ms, 1000);
    assert_eq!(config.max_update_size, CompressorConfig::default().max_update_size);
    assert_eq!(config.diff_timeout(), None);

    let compressor = history_compressor::Compressor::new(config);
    let out = compressor
        .compress_updates(single_op_updates(json!([
            {"op": {"p": 3, "i": "foo"}, "meta": meta(TS1), "v": 42},
            {"op": {"p": 6, "i": "bar"}, "meta": meta(TS2 + 1), "v": 43}
        ])))
        .expect("batch compresses");
    assert_eq!(out.len(), 2);
}

#[test]
fn compressing_twice_changes_nothing() {
    let batches = [
        json!([
            {"op": {"p": 3, "i": "foo"}, "meta": meta(TS1), "v": 42},
            {"op": {"p": 6, "i": "bar"}, "meta": meta(TS1 + 20_000), "v": 43},
            {"op": {"p": 9, "i": "baz"}, "meta": meta(TS1 + 40_000), "v": 44},
            {"op": {"p": 12, "i": "qux"}, "meta": meta(TS1 + 80_000), "v": 45}
        ]),
        json!([
            {"op": {"p": 3, "d": "foo"}, "meta": meta(TS1), "v": 42},
            {"op": {"p": 1, "d": "bar"}, "meta": meta(TS2), "v": 43},
            {"op": {"p": 1, "i": "xyz"}, "meta": meta(TS2), "v": 44},
            {"op": {"p": 9, "i": "later"}, "meta": {"ts": TS2, "user_id": OTHER_USER}, "v": 45}
        ]),
        json!([
            {"op": {"p": 3, "d": "one two three four five six seven eight"}, "meta": meta(TS1), "v": 42},
            {"op": {"p": 3, "i": "one 2 three four five six seven eight"}, "meta": meta(TS2), "v": 43}
        ]),
    ];
    for batch in batches {
        let once = compress(batch);
        assert_eq!(compress(once.clone()), once);
    }
}
