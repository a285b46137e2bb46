//! Editing helpers for flat-text documents.

use super::{TextComponent, TextEdit, TextOp};
use crate::error::{OtError, OtResult};
use crate::util::{char_len, slice};

/// Event raised for each component of a remotely applied op.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextEvent {
    Insert { pos: usize, text: String },
    Delete { pos: usize, text: String },
}

/// Op inserting `text` at `pos`.
pub fn insert_op(pos: usize, text: &str, undo: bool) -> TextOp {
    vec![TextComponent::insert(pos, text).with_undo(undo)]
}

/// Op deleting `len` chars of `snapshot` starting at `pos`.
pub fn delete_op(snapshot: &str, pos: usize, len: usize, undo: bool) -> OtResult<TextOp> {
    let doc_len = char_len(snapshot);
    if pos + len > doc_len {
        return Err(OtError::validation(format!(
            "cannot delete {len} chars at {pos} from a document of {doc_len} chars"
        )));
    }
    let deleted = slice(snapshot, pos, pos + len);
    Ok(vec![TextComponent::delete(pos, deleted).with_undo(undo)])
}

/// Events a document view should replay for a remote op. Comments raise
/// nothing.
pub fn remote_events(op: &[TextComponent]) -> Vec<TextEvent> {
    op.iter()
        .filter_map(|c| match &c.edit {
            TextEdit::Insert(s) => Some(TextEvent::Insert { pos: c.p, text: s.clone() }),
            TextEdit::Delete(s) => Some(TextEvent::Delete { pos: c.p, text: s.clone() }),
            TextEdit::Comment(_) => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::text::apply;

    #[test]
    fn delete_op_reads_snapshot() {
        let op = delete_op("héllo", 1, 3, true).unwrap();
        assert_eq!(op, vec![TextComponent::delete(1, "éll").with_undo(true)]);
        assert_eq!(apply("héllo", &op).unwrap(), "ho");
        assert!(delete_op("abc", 2, 2, false).is_err());
    }

    #[test]
    fn remote_events_skip_comments() {
        let op = vec![
            TextComponent::insert(0, "a"),
            TextComponent::comment(0, "a"),
            TextComponent::delete(1, "b"),
        ];
        assert_eq!(
            remote_events(&op),
            vec![
                TextEvent::Insert { pos: 0, text: "a".into() },
                TextEvent::Delete { pos: 1, text: "b".into() },
            ]
        );
        assert_eq!(insert_op(2, "x", false), vec![TextComponent::insert(2, "x")]);
    }
}
