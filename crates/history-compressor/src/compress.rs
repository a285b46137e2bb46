//! Folding adjacent single-op updates.
//!
//! [`Compressor::compress_updates`] walks the batch keeping a tail update
//! that each following update is folded into when both come from the same
//! author, close in time, and their ops combine into fewer ops:
//!
//! | first  | second | folds when                                   |
//! |--------|--------|----------------------------------------------|
//! | insert | insert | second lands inside or right after the first |
//! | delete | delete | first lands inside the range second deleted  |
//! | insert | delete | the delete removes only inserted text        |
//! | delete | insert | same position; the pair is re-diffed         |

use tracing::{debug, trace, warn};

use crate::concat::{concat_updates_with_same_version, filter_blank_updates};
use crate::config::CompressorConfig;
use crate::diff::myers::{after_text, before_text};
use crate::diff::{patch_to_ops, semantic_diff};
use crate::error::{CompressError, CompressResult};
use crate::length::adjust_length_by_op;
use crate::split::convert_to_single_op_updates;
use crate::update::{HistoryEdit, HistoryOp, RawUpdate, SingleOpUpdate};
use ot_types::util::{inject, remove, slice};

#[derive(Debug, Clone, Default)]
pub struct Compressor {
    config: CompressorConfig,
}

impl Compressor {
    pub fn new(config: CompressorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CompressorConfig {
        &self.config
    }

    /// Split, fold, drop blank ops and regroup by version.
    pub fn compress_raw_updates(&self, raw: Vec<RawUpdate>) -> CompressResult<Vec<RawUpdate>> {
        let received = raw.len();
        let updates = convert_to_single_op_updates(raw);
        let updates = self.compress_updates(updates)?;
        let updates = filter_blank_updates(updates);
        let grouped = concat_updates_with_same_version(updates);
        debug!(received, stored = grouped.len(), "compressed raw updates");
        Ok(grouped)
    }

    /// Fold each update into the one before it where possible.
    ///
    /// When a pair cancels out completely, the next update is folded into
    /// whatever came before the pair.
    pub fn compress_updates(&self, updates: Vec<SingleOpUpdate>) -> CompressResult<Vec<SingleOpUpdate>> {
        let received = updates.len();
        let mut compressed: Vec<SingleOpUpdate> = Vec::with_capacity(received);
        for update in updates {
            match compressed.pop() {
                Some(last) => compressed.extend(self.concat_two_updates(last, update)?),
                None => compressed.push(update),
            }
        }
        debug!(received, kept = compressed.len(), "compressed single-op updates");
        Ok(compressed)
    }

    /// Whether two updates may be folded at all, whatever their ops.
    fn can_fold(&self, first: &SingleOpUpdate, second: &SingleOpUpdate) -> bool {
        let (Some(first_op), Some(second_op)) = (&first.op, &second.op) else {
            return false;
        };
        if !first.same_document(second) || first.meta.user_id != second.meta.user_id {
            return false;
        }
        // External updates only fold with updates from the same source.
        match (first.meta.is_external(), second.meta.is_external()) {
            (true, true) if first.meta.source != second.meta.source => return false,
            (true, false) | (false, true) => return false,
            _ => {}
        }
        // The run's first timestamp is kept by every fold, so this bounds
        // the whole run.
        let within_window = second
            .meta
            .ts
            .checked_sub(first.meta.ts)
            .is_some_and(|gap| gap <= self.config.max_time_between_updates_ms);
        if !within_window {
            return false;
        }
        if first.meta.is_tracked() != second.meta.is_tracked() {
            return false;
        }
        if first_op.u || second_op.u {
            return false;
        }
        if first_op.tracked_delete_rejection || second_op.tracked_delete_rejection {
            return false;
        }
        first_op.tracked_changes.is_none() && second_op.tracked_changes.is_none()
    }

    /// Fold `second` into `first`, returning the updates that replace them.
    pub fn concat_two_updates(
        &self,
        first: SingleOpUpdate,
        second: SingleOpUpdate,
    ) -> CompressResult<Vec<SingleOpUpdate>> {
        if !self.can_fold(&first, &second) {
            return Ok(vec![first, second]);
        }
        let (Some(first_op), Some(second_op)) = (&first.op, &second.op) else {
            return Ok(vec![first, second]);
        };

        let first_size = first_op.size();
        let second_size = second_op.size();
        let first_inside_second = second_op.p <= first_op.p && first_op.p <= second_op.p + second_size;
        let second_inside_first = first_op.p <= second_op.p && second_op.p <= first_op.p + first_size;
        let under_limit = first_size + second_size < self.config.max_update_size;
        let untracked = !first.meta.is_tracked() && !second.meta.is_tracked();

        match (&first_op.edit, &second_op.edit) {
            (HistoryEdit::Insert(a), HistoryEdit::Insert(b))
                if second_inside_first && under_limit && same_comments(first_op, second_op) =>
            {
                trace!(p = first_op.p, "folding insert into insert");
                let op = HistoryOp {
                    edit: HistoryEdit::Insert(inject(a, second_op.p - first_op.p, b)),
                    ..first_op.clone()
                };
                Ok(vec![merge_with_op(&first, &second, op)])
            }

            (HistoryEdit::Delete(a), HistoryEdit::Delete(b)) if first_inside_second && under_limit && untracked => {
                trace!(p = second_op.p, "folding delete into delete");
                let op = HistoryOp {
                    edit: HistoryEdit::Delete(inject(b, first_op.p - second_op.p, a)),
                    ..second_op.clone()
                };
                Ok(vec![merge_with_op(&first, &second, op)])
            }

            (HistoryEdit::Insert(a), HistoryEdit::Delete(b)) if second_inside_first && untracked => {
                let offset = second_op.p - first_op.p;
                let len = second_size;
                // Only trim the insert when the delete lies fully inside it.
                if slice(a, offset, offset + len) != b {
                    return Ok(vec![first, second]);
                }
                let rest = remove(a, offset, len);
                if rest.is_empty() {
                    trace!(p = first_op.p, "insert cancelled by delete");
                    return Ok(vec![]);
                }
                trace!(p = first_op.p, "trimming insert by delete");
                let op = HistoryOp { edit: HistoryEdit::Insert(rest), ..first_op.clone() };
                Ok(vec![merge_with_op(&first, &second, op)])
            }

            (HistoryEdit::Delete(a), HistoryEdit::Insert(b))
                if first_op.p == second_op.p && untracked && under_limit =>
            {
                self.rediff(&first, &second, first_op, second_op, a, b)
            }

            _ => Ok(vec![first, second]),
        }
    }

    /// Replace a delete followed by an insert at the same position, often a
    /// paste over a selection, with the ops covering only what changed.
    fn rediff(
        &self,
        first: &SingleOpUpdate,
        second: &SingleOpUpdate,
        first_op: &HistoryOp,
        second_op: &HistoryOp,
        deleted: &str,
        inserted: &str,
    ) -> CompressResult<Vec<SingleOpUpdate>> {
        let patch = semantic_diff(deleted, inserted, self.config.diff_timeout());
        if before_text(&patch) != deleted || after_text(&patch) != inserted {
            warn!(p = first_op.p, "diff does not reproduce the replaced text");
            return Err(CompressError::ResyncRequired(format!(
                "diff of the text replaced at {} does not reproduce it",
                first_op.p
            )));
        }

        let mut updates: Vec<SingleOpUpdate> = patch_to_ops(&patch)
            .into_iter()
            .map(|mut op| {
                let pos = op.p;
                op.p = pos + first_op.p;
                op.hpos = first_op.hpos.map(|h| pos + h);
                if matches!(op.edit, HistoryEdit::Insert(_)) {
                    op.comment_ids = second_op.comment_ids.clone();
                }
                let mut update = merge_with_op(first, second, op);
                update.meta.doc_hash = None;
                update
            })
            .collect();
        if let Some(last) = updates.last_mut() {
            last.meta.doc_hash = second.meta.doc_hash.clone();
        }
        trace!(p = first_op.p, ops = updates.len(), "re-diffed delete and insert");

        // The diff loses the per-op lengths; thread them again from the first
        // update's.
        let mut doc_length = first.meta.history_doc_length.or(first.meta.doc_length);
        for update in &mut updates {
            update.meta.doc_length = doc_length;
            update.meta.history_doc_length = None;
            let (Some(len), Some(op)) = (doc_length, &update.op) else {
                continue;
            };
            if let Some(d) = op.deleted() {
                if (op.p + ot_types::util::char_len(d)) as i64 > len {
                    warn!(p = op.p, doc_length = len, "delete runs past the end of the document");
                    return Err(CompressError::ResyncRequired(format!(
                        "delete at {} runs past the recorded document length {len}",
                        op.p
                    )));
                }
            }
            doc_length = Some(adjust_length_by_op(len, op, update.meta.is_tracked()));
        }
        Ok(updates)
    }
}

/// `first` carrying `op`, with the version and `doc_hash` of `second`.
fn merge_with_op(first: &SingleOpUpdate, second: &SingleOpUpdate, op: HistoryOp) -> SingleOpUpdate {
    let mut update = first.with_op(Some(op));
    if second.v.is_some() {
        update.v = second.v;
    }
    update.meta.doc_hash = second.meta.doc_hash.clone();
    update
}

/// Whether two inserts sit inside the same set of comments.
fn same_comments(a: &HistoryOp, b: &HistoryOp) -> bool {
    match (&a.comment_ids, &b.comment_ids) {
        (None, None) => true,
        (Some(x), Some(y)) => x.iter().all(|id| y.contains(id)) && y.iter().all(|id| x.contains(id)),
        _ => false,
    }
}

/// [`Compressor::compress_updates`] with the default limits.
pub fn compress_updates(updates: Vec<SingleOpUpdate>) -> CompressResult<Vec<SingleOpUpdate>> {
    Compressor::default().compress_updates(updates)
}

/// [`Compressor::compress_raw_updates`] with the default limits.
pub fn compress_raw_updates(raw: Vec<RawUpdate>) -> CompressResult<Vec<RawUpdate>> {
    Compressor::default().compress_raw_updates(raw)
}
