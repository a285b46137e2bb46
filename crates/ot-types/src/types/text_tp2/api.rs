//! Editing helpers addressing live text positions of a tombstone document.

use super::{append, take_doc, Chunk, Cursor, Doc, Tp2Component, Tp2Op};
use crate::error::{OtError, OtResult};
use crate::types::text::api::TextEvent;
use crate::util::char_len;

/// Append skips covering `maxlength` live chars of `doc` from `cursor`, or
/// the rest of the document when `maxlength` is `None`. Tombstones are
/// skipped without counting.
fn append_skip_chars(
    op: &mut Tp2Op,
    doc: &Doc,
    cursor: &mut Cursor,
    mut maxlength: Option<usize>,
) -> OtResult<()> {
    while maxlength.map_or(true, |n| n > 0) && cursor.index < doc.data.len() {
        let part = take_doc(doc, cursor, maxlength, true)?;
        if let (Some(n), Chunk::Text(s)) = (maxlength.as_mut(), &part) {
            *n -= char_len(s);
        }
        append(op, Tp2Component::Skip(part.len()));
    }
    Ok(())
}

fn check_range(doc: &Doc, pos: usize, len: usize) -> OtResult<()> {
    match pos.checked_add(len) {
        Some(end) if end <= doc.char_length => Ok(()),
        _ => Err(OtError::validation(format!(
            "range {pos}+{len} is past the end of the document ({} chars)",
            doc.char_length
        ))),
    }
}

/// Op inserting `text` before live char `pos`.
pub fn insert_op(doc: &Doc, pos: usize, text: &str) -> OtResult<Tp2Op> {
    check_range(doc, pos, 0)?;
    let mut op = Vec::new();
    let mut cursor = Cursor::default();
    append_skip_chars(&mut op, doc, &mut cursor, Some(pos))?;
    append(&mut op, Tp2Component::Insert(text.to_string()));
    append_skip_chars(&mut op, doc, &mut cursor, None)?;
    Ok(op)
}

/// Op deleting `len` live chars starting at live char `pos`.
pub fn delete_op(doc: &Doc, pos: usize, len: usize) -> OtResult<Tp2Op> {
    check_range(doc, pos, len)?;
    let mut op = Vec::new();
    let mut cursor = Cursor::default();
    append_skip_chars(&mut op, doc, &mut cursor, Some(pos))?;

    let mut remaining = len;
    while remaining > 0 {
        match take_doc(doc, &mut cursor, Some(remaining), true)? {
            Chunk::Text(s) => {
                let n = char_len(&s);
                append(&mut op, Tp2Component::Delete(n));
                remaining -= n;
            }
            Chunk::Tombs(n) => append(&mut op, Tp2Component::Skip(n)),
        }
    }

    append_skip_chars(&mut op, doc, &mut cursor, None)?;
    Ok(op)
}

/// Live-text events produced by applying a remote `op` to `before`.
pub fn remote_events(before: &Doc, op: &[Tp2Component]) -> OtResult<Vec<TextEvent>> {
    let mut events = Vec::new();
    let mut text_pos = 0;
    let mut cursor = Cursor::default();

    for c in op {
        match c {
            Tp2Component::Skip(n) => {
                let mut remainder = *n;
                while remainder > 0 {
                    let part = take_doc(before, &mut cursor, Some(remainder), false)?;
                    if let Chunk::Text(s) = &part {
                        text_pos += char_len(s);
                    }
                    remainder -= part.len();
                }
            }
            Tp2Component::Insert(s) => {
                events.push(TextEvent::Insert { pos: text_pos, text: s.clone() });
                text_pos += char_len(s);
            }
            Tp2Component::InsertTombs(_) => {}
            Tp2Component::Delete(n) => {
                let mut remainder = *n;
                while remainder > 0 {
                    let part = take_doc(before, &mut cursor, Some(remainder), false)?;
                    remainder -= part.len();
                    if let Chunk::Text(s) = part {
                        events.push(TextEvent::Delete { pos: text_pos, text: s });
                    }
                }
            }
        }
    }
    Ok(events)
}
