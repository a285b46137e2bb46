//! Replaying updates over a document's text.
//!
//! A flush job can replay a batch before and after compression and compare
//! the results; both must produce the same text.

use ot_types::types::text::{self, TextOp};

use crate::error::CompressResult;
use crate::update::{Update, UpdateOps};

/// Apply the text ops of `updates`, in order, to `snapshot`.
///
/// Structure updates and retains leave the text as it is, and tracked
/// changes replay as plain edits.
pub fn apply_updates<O: UpdateOps>(snapshot: &str, updates: &[Update<O>]) -> CompressResult<String> {
    let mut doc = snapshot.to_string();
    for update in updates {
        let Some(ops) = &update.op else { continue };
        let op: TextOp = ops.ops().iter().filter_map(|op| op.to_text_component()).collect();
        doc = text::apply(&doc, &op)?;
    }
    Ok(doc)
}
