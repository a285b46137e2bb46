//! Text with tombstones, satisfying TP2.
//!
//! A document is a run-length list of chunks: live text, or a count of
//! tombstones left behind by deleted characters. `'Hello .....world'` (dots
//! are tombstones) is stored as `["Hello ", 5, "world"]`.
//!
//! # Operation format
//!
//! Ops walk the whole document from start to end:
//! - `Skip(n)`: keep the next `n` units (chars or tombstones)
//! - `Insert(s)`: insert live text
//! - `InsertTombs(n)`: insert `n` tombstones
//! - `Delete(n)`: turn the next `n` units into tombstones
//!
//! Deleted units never disappear, so every op sees the same total length for
//! concurrent edits. That is what lets [`transform`] and [`prune`] commute
//! in any merge order.

pub mod api;
pub mod codec;

use crate::error::{OtError, OtResult};
use crate::side::Side;
use crate::types::OtType;
use crate::util::{char_len, slice, slice_from};

// ── Document ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Chunk {
    Text(String),
    Tombs(usize),
}

impl Chunk {
    /// Units covered by the chunk.
    pub fn len(&self) -> usize {
        match self {
            Chunk::Text(s) => char_len(s),
            Chunk::Tombs(n) => *n,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Doc {
    /// Live characters.
    pub char_length: usize,
    /// Live characters plus tombstones.
    pub total_length: usize,
    pub data: Vec<Chunk>,
}

/// Position inside a document or an op: the element `index` and the unit
/// `offset` within it. Owned and advanced by the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cursor {
    pub index: usize,
    pub offset: usize,
}

/// Take the next part of `doc` at `cursor`, at most `maxlength` units.
///
/// With `tombs_indivisible`, a tombstone run is returned whole regardless of
/// `maxlength`.
pub fn take_doc(
    doc: &Doc,
    cursor: &mut Cursor,
    maxlength: Option<usize>,
    tombs_indivisible: bool,
) -> OtResult<Chunk> {
    let part = doc
        .data
        .get(cursor.index)
        .ok_or_else(|| OtError::validation("operation goes past the end of the document"))?;

    let result = match part {
        Chunk::Text(s) => {
            let taken = match maxlength {
                Some(max) => slice(s, cursor.offset, cursor.offset + max),
                None => slice_from(s, cursor.offset),
            };
            Chunk::Text(taken.to_string())
        }
        Chunk::Tombs(n) => match maxlength {
            Some(max) if !tombs_indivisible => Chunk::Tombs(max.min(n - cursor.offset)),
            _ => Chunk::Tombs(n - cursor.offset),
        },
    };

    if part.len() - cursor.offset > result.len() {
        cursor.offset += result.len();
    } else {
        cursor.index += 1;
        cursor.offset = 0;
    }
    Ok(result)
}

/// Append `part` to the end of `doc`, merging it with a last chunk of the
/// same kind.
pub fn append_doc(doc: &mut Doc, part: Chunk) {
    if part.is_empty() {
        return;
    }
    if let Chunk::Text(s) = &part {
        doc.char_length += char_len(s);
    }
    doc.total_length += part.len();

    match (doc.data.last_mut(), &part) {
        (Some(Chunk::Text(last)), Chunk::Text(s)) => { last.push_str(s); return; }
        (Some(Chunk::Tombs(last)), Chunk::Tombs(n)) => { *last += n; return; }
        _ => {}
    }
    doc.data.push(part);
}

/// Document holding `initial` as live text.
pub fn create(initial: &str) -> Doc {
    let mut doc = Doc::default();
    append_doc(&mut doc, Chunk::Text(initial.to_string()));
    doc
}

/// Compact form of a document: its chunk list.
pub fn serialize(doc: &Doc) -> Vec<Chunk> {
    doc.data.clone()
}

/// Rebuild a document from its chunk list, recomputing both lengths.
pub fn deserialize(data: Vec<Chunk>) -> Doc {
    let mut doc = Doc::default();
    for chunk in data {
        append_doc(&mut doc, chunk);
    }
    doc
}

/// The live text of `doc`, tombstones left out.
pub fn get_text(doc: &Doc) -> String {
    doc.data
        .iter()
        .filter_map(|chunk| match chunk {
            Chunk::Text(s) => Some(s.as_str()),
            Chunk::Tombs(_) => None,
        })
        .collect()
}

fn check_doc(doc: &Doc) -> OtResult<()> {
    let mut chars = 0;
    let mut total = 0;
    for chunk in &doc.data {
        if chunk.is_empty() {
            return Err(OtError::validation("snapshot contains an empty chunk"));
        }
        if let Chunk::Text(s) = chunk {
            chars += char_len(s);
        }
        total += chunk.len();
    }
    if chars != doc.char_length || total != doc.total_length {
        return Err(OtError::validation(format!(
            "snapshot is invalid: lengths {}/{} do not match data {chars}/{total}",
            doc.char_length, doc.total_length
        )));
    }
    Ok(())
}

// ── Operation ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tp2Component {
    Skip(usize),
    Insert(String),
    InsertTombs(usize),
    Delete(usize),
}

pub type Tp2Op = Vec<Tp2Component>;

impl Tp2Component {
    /// Units the component covers: consumed for skips and deletes, produced
    /// for inserts.
    pub fn len(&self) -> usize {
        match self {
            Tp2Component::Skip(n) | Tp2Component::InsertTombs(n) | Tp2Component::Delete(n) => *n,
            Tp2Component::Insert(s) => char_len(s),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_insert(&self) -> bool {
        matches!(self, Tp2Component::Insert(_) | Tp2Component::InsertTombs(_))
    }

    fn with_len(&self, n: usize) -> Tp2Component {
        match self {
            Tp2Component::Skip(_) => Tp2Component::Skip(n),
            Tp2Component::InsertTombs(_) => Tp2Component::InsertTombs(n),
            Tp2Component::Delete(_) => Tp2Component::Delete(n),
            Tp2Component::Insert(s) => Tp2Component::Insert(slice(s, 0, n).to_string()),
        }
    }
}

/// Reject empty components and unmerged adjacent skips.
pub fn check_op(op: &[Tp2Component]) -> OtResult<()> {
    let mut last_was_skip = false;
    for c in op {
        match c {
            Tp2Component::Insert(s) if s.is_empty() => {
                return Err(OtError::validation("inserts must insert a string or a positive number"));
            }
            Tp2Component::InsertTombs(0) => {
                return Err(OtError::validation("inserts must insert a string or a positive number"));
            }
            Tp2Component::Delete(0) => {
                return Err(OtError::validation("deletes must be a positive number"));
            }
            Tp2Component::Skip(0) => {
                return Err(OtError::validation("skip components must be a positive number"));
            }
            Tp2Component::Skip(_) if last_was_skip => {
                return Err(OtError::validation("adjacent skip components should be combined"));
            }
            _ => {}
        }
        last_was_skip = matches!(c, Tp2Component::Skip(_));
    }
    Ok(())
}

/// Push `c` onto `op`, merging it with a last component of the same kind.
pub fn append(op: &mut Tp2Op, c: Tp2Component) {
    if c.is_empty() {
        return;
    }
    match (op.last_mut(), &c) {
        (Some(Tp2Component::Skip(last)), Tp2Component::Skip(n))               => { *last += n; return; }
        (Some(Tp2Component::Insert(last)), Tp2Component::Insert(s))            => { last.push_str(s); return; }
        (Some(Tp2Component::InsertTombs(last)), Tp2Component::InsertTombs(n)) => { *last += n; return; }
        (Some(Tp2Component::Delete(last)), Tp2Component::Delete(n))           => { *last += n; return; }
        _ => {}
    }
    op.push(c);
}

/// Fold every component of `op` through [`append`], dropping empty ones.
pub fn normalize(op: &[Tp2Component]) -> Tp2Op {
    let mut out = Vec::with_capacity(op.len());
    for c in op {
        append(&mut out, c.clone());
    }
    out
}

/// Take the next piece of `op` at `cursor`, at most `maxlength` units.
///
/// With `inserts_indivisible`, inserts (text or tombstones) are returned
/// whole regardless of `maxlength`. Returns `None` once `op` is consumed.
pub fn take_op(
    op: &[Tp2Component],
    cursor: &mut Cursor,
    maxlength: Option<usize>,
    inserts_indivisible: bool,
) -> Option<Tp2Component> {
    let c = op.get(cursor.index)?;
    let rest = c.len() - cursor.offset;
    let whole = match maxlength {
        None => true,
        Some(max) => rest <= max || (inserts_indivisible && c.is_insert()),
    };

    let taken = if whole {
        let taken = match c {
            Tp2Component::Insert(s) => Tp2Component::Insert(slice_from(s, cursor.offset).to_string()),
            _ => c.with_len(rest),
        };
        cursor.index += 1;
        cursor.offset = 0;
        taken
    } else {
        let max = maxlength.unwrap_or(rest);
        let taken = match c {
            Tp2Component::Insert(s) => {
                Tp2Component::Insert(slice(s, cursor.offset, cursor.offset + max).to_string())
            }
            _ => c.with_len(max),
        };
        cursor.offset += max;
        taken
    };
    Some(taken)
}

/// The component `take_op` would read next, if any.
pub fn peek_op<'a>(op: &'a [Tp2Component], cursor: &Cursor) -> Option<&'a Tp2Component> {
    op.get(cursor.index)
}

// ── Apply ────────────────────────────────────────────────────────────────

/// Apply `op` to `doc`. `op` has to walk the whole document.
pub fn apply(doc: &Doc, op: &[Tp2Component]) -> OtResult<Doc> {
    check_doc(doc)?;
    check_op(op)?;

    let mut out = Doc::default();
    let mut cursor = Cursor::default();

    for c in op {
        match c {
            Tp2Component::Skip(n) => {
                let mut remainder = *n;
                while remainder > 0 {
                    let part = take_doc(doc, &mut cursor, Some(remainder), false)?;
                    remainder -= part.len();
                    append_doc(&mut out, part);
                }
            }
            Tp2Component::Insert(s) => append_doc(&mut out, Chunk::Text(s.clone())),
            Tp2Component::InsertTombs(n) => append_doc(&mut out, Chunk::Tombs(*n)),
            Tp2Component::Delete(n) => {
                let mut remainder = *n;
                while remainder > 0 {
                    let part = take_doc(doc, &mut cursor, Some(remainder), false)?;
                    remainder -= part.len();
                }
                append_doc(&mut out, Chunk::Tombs(*n));
            }
        }
    }

    if cursor.index < doc.data.len() {
        return Err(OtError::validation(format!(
            "operation covers {} of {} document units",
            out.total_length - inserted_len(op),
            doc.total_length
        )));
    }
    Ok(out)
}

fn inserted_len(op: &[Tp2Component]) -> usize {
    op.iter().filter(|c| c.is_insert()).map(Tp2Component::len).sum()
}

// ── Transform / prune ────────────────────────────────────────────────────

/// Shared walker of [`transform`] (`go_forwards`) and [`prune`].
fn transformer(
    op: &[Tp2Component],
    other: &[Tp2Component],
    go_forwards: bool,
    side: Side,
) -> OtResult<Tp2Op> {
    check_op(op)?;
    check_op(other)?;

    let mut out = Vec::new();
    let mut cursor = Cursor::default();

    for component in other {
        let mut length = component.len();

        if component.is_insert() {
            if go_forwards {
                // Left inserts at the same spot go first.
                if side == Side::Left {
                    while peek_op(op, &cursor).is_some_and(Tp2Component::is_insert) {
                        if let Some(c) = take_op(op, &mut cursor, None, false) {
                            append(&mut out, c);
                        }
                    }
                }
                append(&mut out, Tp2Component::Skip(length));
            } else {
                while length > 0 {
                    let chunk = take_op(op, &mut cursor, Some(length), true)
                        .ok_or_else(|| OtError::validation("the pruned op is shorter than the insert"))?;
                    match chunk {
                        Tp2Component::Delete(_) => {
                            return Err(OtError::conflict(
                                "the op deletes locally inserted characters and cannot be purged of the insert",
                            ));
                        }
                        Tp2Component::Skip(n) => length -= n,
                        chunk => append(&mut out, chunk),
                    }
                }
            }
        } else {
            while length > 0 {
                let chunk = take_op(op, &mut cursor, Some(length), true).ok_or_else(|| {
                    OtError::validation("the op traverses more elements than the document has")
                })?;
                if !chunk.is_insert() {
                    length -= chunk.len();
                }
                append(&mut out, chunk);
            }
        }
    }

    while let Some(c) = take_op(op, &mut cursor, None, false) {
        if !c.is_insert() {
            return Err(OtError::invariant(format!("remaining fragment in the op: {c:?}")));
        }
        append(&mut out, c);
    }
    Ok(out)
}

/// Transform `op` so it applies after the concurrent `other`.
pub fn transform(op: &[Tp2Component], other: &[Tp2Component], side: Side) -> OtResult<Tp2Op> {
    transformer(op, other, true, side)
}

/// Inverse of [`transform`]: strip from `op` the effect of having been
/// transformed by `other`.
pub fn prune(op: &[Tp2Component], other: &[Tp2Component]) -> OtResult<Tp2Op> {
    transformer(op, other, false, Side::Left)
}

// ── Compose ──────────────────────────────────────────────────────────────

/// A single op with the effect of `op1` followed by `op2`.
pub fn compose(op1: &[Tp2Component], op2: &[Tp2Component]) -> OtResult<Tp2Op> {
    check_op(op1)?;
    check_op(op2)?;

    let mut out = Vec::new();
    let mut cursor = Cursor::default();
    let traversed = || OtError::validation("the op traverses more elements than the document has");

    for component in op2 {
        match component {
            Tp2Component::Skip(n) => {
                let mut length = *n;
                while length > 0 {
                    let chunk = take_op(op1, &mut cursor, Some(length), false).ok_or_else(traversed)?;
                    length -= chunk.len();
                    append(&mut out, chunk);
                }
            }
            Tp2Component::Insert(_) | Tp2Component::InsertTombs(_) => {
                append(&mut out, component.clone());
            }
            Tp2Component::Delete(n) => {
                let mut length = *n;
                while length > 0 {
                    let chunk = take_op(op1, &mut cursor, Some(length), false).ok_or_else(traversed)?;
                    let chunk_len = chunk.len();
                    if chunk.is_insert() {
                        append(&mut out, Tp2Component::InsertTombs(chunk_len));
                    } else {
                        append(&mut out, Tp2Component::Delete(chunk_len));
                    }
                    length -= chunk_len;
                }
            }
        }
    }

    while let Some(c) = take_op(op1, &mut cursor, None, false) {
        if !c.is_insert() {
            return Err(OtError::invariant(format!("dangling fragment in op1: {c:?}")));
        }
        append(&mut out, c);
    }
    Ok(out)
}

// ── Type ─────────────────────────────────────────────────────────────────

/// The tombstone text OT type.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextTp2;

impl OtType for TextTp2 {
    const NAME: &'static str = "text-tp2";
    type Snapshot = Doc;
    type Op = Tp2Op;

    fn create(&self) -> Doc {
        Doc::default()
    }

    fn apply(&self, snapshot: &Doc, op: &Tp2Op) -> OtResult<Doc> {
        apply(snapshot, op)
    }

    fn transform(&self, op: &Tp2Op, other: &Tp2Op, side: Side) -> OtResult<Tp2Op> {
        transform(op, other, side)
    }

    fn compose(&self, op1: &Tp2Op, op2: &Tp2Op) -> OtResult<Tp2Op> {
        compose(op1, op2)
    }
}
