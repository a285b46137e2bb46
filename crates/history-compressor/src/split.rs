use crate::length::adjust_length_by_op;
use crate::update::{RawUpdate, SingleOpUpdate};

/// Expand each update into one update per op.
///
/// When the source update knows its document length, every split update
/// records the length the document had just before its own op ran. Only the
/// last update split from a source keeps the source's `doc_hash`. Structure
/// updates pass through untouched and an update with no ops disappears.
pub fn convert_to_single_op_updates(updates: Vec<RawUpdate>) -> Vec<SingleOpUpdate> {
    let mut split = Vec::with_capacity(updates.len());
    for mut update in updates {
        let Some(ops) = update.op.take() else {
            split.push(update.with_op(None));
            continue;
        };

        // Some producers report -1 for an empty document.
        let mut doc_length = update
            .meta
            .history_doc_length
            .or(update.meta.doc_length)
            .map(|len| if len == -1 { 0 } else { len });
        let tracked = update.meta.is_tracked();
        let doc_hash = update.meta.doc_hash.take();
        let start = split.len();

        for op in ops {
            let mut single = update.with_op(None);
            if let Some(len) = doc_length {
                single.meta.doc_length = Some(len);
                single.meta.history_doc_length = None;
                doc_length = Some(adjust_length_by_op(len, &op, tracked));
            }
            single.op = Some(op);
            split.push(single);
        }

        if split.len() > start {
            if let Some(last) = split.last_mut() {
                last.meta.doc_hash = doc_hash;
            }
        }
    }
    split
}
