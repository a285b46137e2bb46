//! Text diffing for the delete+insert fold.

pub mod cleanup;
pub mod myers;

use std::time::{Duration, Instant};

use crate::config::DIFF_TIMEOUT_MS;
use crate::update::HistoryOp;
use ot_types::util::char_len;
use myers::{Change, Patch};

/// Semantic diff of `before` against `after`, searched for at most
/// `timeout`.
pub fn semantic_diff(before: &str, after: &str, timeout: Option<Duration>) -> Patch {
    let deadline = timeout.and_then(|t| Instant::now().checked_add(t));
    let mut patch = myers::diff(before, after, deadline);
    cleanup::cleanup_semantic(&mut patch);
    patch
}

/// Inserts and deletes turning the patch's source into its destination.
/// Positions are relative to the start of the source and account for the
/// ops before them.
pub fn patch_to_ops(patch: &Patch) -> Vec<HistoryOp> {
    let mut ops = Vec::new();
    let mut position = 0;
    for (op_type, text) in patch {
        match op_type {
            Change::Insert => {
                ops.push(HistoryOp::insert(position, text.as_str()));
                position += char_len(text);
            }
            Change::Delete => ops.push(HistoryOp::delete(position, text.as_str())),
            Change::Keep => position += char_len(text),
        }
    }
    ops
}

/// The ops turning `before` into `after`.
pub fn diff_as_sharejs_ops(before: &str, after: &str) -> Vec<HistoryOp> {
    patch_to_ops(&semantic_diff(before, after, Some(Duration::from_millis(DIFF_TIMEOUT_MS))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn changed_word() {
        assert_eq!(
            diff_as_sharejs_ops(
                "one two three four five six seven eight",
                "one 2 three four five six seven eight"
            ),
            vec![HistoryOp::delete(4, "two"), HistoryOp::insert(4, "2")]
        );
    }

    #[test]
    fn identical_texts_need_no_ops() {
        assert!(diff_as_sharejs_ops("same text", "same text").is_empty());
    }

    #[test]
    fn positions_follow_earlier_ops() {
        let ops = diff_as_sharejs_ops("a cat and a dog", "a bird and a dog too");
        let mut text = "a cat and a dog".to_string();
        for op in &ops {
            let c = op.to_text_component().unwrap();
            text = ot_types::types::text::apply(&text, &[c]).unwrap();
        }
        assert_eq!(text, "a bird and a dog too");
    }
}
