//! Document length bookkeeping.

use crate::update::{HistoryEdit, HistoryOp, TrackedChangeType};
use ot_types::util::char_len;

/// Length of the document after `op` runs on a document of `length` chars.
///
/// Under track changes a delete only hides text, so the length shrinks just
/// by the tracked inserts it removes. A rejected tracked delete restores
/// hidden text and leaves the length alone.
pub fn adjust_length_by_op(length: i64, op: &HistoryOp, tracked: bool) -> i64 {
    match &op.edit {
        HistoryEdit::Insert(_) if op.tracked_delete_rejection => length,
        HistoryEdit::Insert(s) => length + char_len(s) as i64,
        HistoryEdit::Delete(_) if tracked => {
            let removed: usize = op
                .tracked_changes
                .iter()
                .flatten()
                .filter(|change| change.kind == TrackedChangeType::Insert)
                .map(|change| change.length)
                .sum();
            length - removed as i64
        }
        HistoryEdit::Delete(s) => length - char_len(s) as i64,
        HistoryEdit::Comment(_) | HistoryEdit::Retain(_) => length,
    }
}
