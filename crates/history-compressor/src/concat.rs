use crate::update::{RawUpdate, SingleOpUpdate};

/// Drop updates whose op inserts or deletes the empty string. Diffing a
/// delete against an insert can leave these behind.
pub fn filter_blank_updates(updates: Vec<SingleOpUpdate>) -> Vec<SingleOpUpdate> {
    updates
        .into_iter()
        .filter(|update| !update.op.as_ref().is_some_and(|op| op.is_blank()))
        .collect()
}

/// Group consecutive text updates sharing document, pathname and version
/// into one update per group. The group's `doc_hash` is its last member's.
pub fn concat_updates_with_same_version(updates: Vec<SingleOpUpdate>) -> Vec<RawUpdate> {
    let mut grouped: Vec<RawUpdate> = Vec::with_capacity(updates.len());
    for update in updates {
        let mut update = update.map_op(|op| vec![op]);
        let joins_last = grouped.last().is_some_and(|last| {
            !update.is_structural()
                && !last.is_structural()
                && last.v == update.v
                && last.same_document(&update)
        });
        match (joins_last, grouped.last_mut(), update.op.take()) {
            (true, Some(last), Some(ops)) => {
                last.op.get_or_insert_with(Vec::new).extend(ops);
                last.meta.doc_hash = update.meta.doc_hash;
            }
            (_, _, ops) => {
                update.op = ops;
                grouped.push(update);
            }
        }
    }
    grouped
}
