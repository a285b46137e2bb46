//! Flat-text operational transformation.
//!
//! # Operation format
//!
//! A [`TextOp`] is a list of components, each addressed by an absolute char
//! position in the document as it stands when that component runs:
//! - `Insert(s)`: insert `s` at `p`
//! - `Delete(s)`: delete the chars at `p`, which must read `s`
//! - `Comment(s)`: no-op that asserts the chars at `p` read `s`
//!
//! Every component also carries an `undo` flag; two components only merge
//! when their flags agree.

pub mod api;
pub mod codec;

use crate::bootstrap::ComponentOt;
use crate::error::{OtError, OtResult};
use crate::side::Side;
use crate::types::OtType;
use crate::util::{char_len, inject, remove, slice, slice_from};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextEdit {
    Insert(String),
    Delete(String),
    Comment(String),
}

impl TextEdit {
    /// The text carried by the component, whatever its kind.
    pub fn text(&self) -> &str {
        match self {
            TextEdit::Insert(s) | TextEdit::Delete(s) | TextEdit::Comment(s) => s,
        }
    }

    fn with_text(&self, s: String) -> TextEdit {
        match self {
            TextEdit::Insert(_) => TextEdit::Insert(s),
            TextEdit::Delete(_) => TextEdit::Delete(s),
            TextEdit::Comment(_) => TextEdit::Comment(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextComponent {
    pub p: usize,
    pub edit: TextEdit,
    pub undo: bool,
}

pub type TextOp = Vec<TextComponent>;

impl TextComponent {
    pub fn insert(p: usize, s: impl Into<String>) -> Self {
        Self { p, edit: TextEdit::Insert(s.into()), undo: false }
    }

    pub fn delete(p: usize, s: impl Into<String>) -> Self {
        Self { p, edit: TextEdit::Delete(s.into()), undo: false }
    }

    pub fn comment(p: usize, s: impl Into<String>) -> Self {
        Self { p, edit: TextEdit::Comment(s.into()), undo: false }
    }

    pub fn with_undo(mut self, undo: bool) -> Self {
        self.undo = undo;
        self
    }

    /// Length in chars of the text carried by the component.
    pub fn len(&self) -> usize {
        char_len(self.edit.text())
    }

    pub fn is_empty(&self) -> bool {
        self.edit.text().is_empty()
    }

    fn at(&self, p: usize) -> Self {
        Self { p, edit: self.edit.clone(), undo: self.undo }
    }

    fn with_text(&self, p: usize, s: String) -> Self {
        Self { p, edit: self.edit.with_text(s), undo: self.undo }
    }
}

// ── Apply ────────────────────────────────────────────────────────────────

/// Apply `op` to `snapshot`, returning the new document text.
pub fn apply(snapshot: &str, op: &[TextComponent]) -> OtResult<String> {
    let mut doc = snapshot.to_string();
    for c in op {
        match &c.edit {
            TextEdit::Insert(s) => {
                if c.p > char_len(&doc) {
                    return Err(OtError::validation(format!(
                        "insert position {} is past the end of the document ({} chars)",
                        c.p,
                        char_len(&doc)
                    )));
                }
                doc = inject(&doc, c.p, s);
            }
            TextEdit::Delete(s) => {
                let len = char_len(s);
                let deleted = slice(&doc, c.p, c.p + len);
                if deleted != s {
                    return Err(OtError::conflict(format!(
                        "delete component '{s}' does not match deleted text '{deleted}'"
                    )));
                }
                doc = remove(&doc, c.p, len);
            }
            TextEdit::Comment(s) => {
                let commented = slice(&doc, c.p, c.p + char_len(s));
                if commented != s {
                    return Err(OtError::conflict(format!(
                        "comment component '{s}' does not match commented text '{commented}'"
                    )));
                }
            }
        }
    }
    Ok(doc)
}

// ── Append / compose ─────────────────────────────────────────────────────

/// Push `c` onto `op`, folding it into the last component when both are
/// inserts (or both deletes) with the same undo flag and touching spans.
pub fn append(op: &mut TextOp, c: TextComponent) {
    if matches!(&c.edit, TextEdit::Insert(s) | TextEdit::Delete(s) if s.is_empty()) {
        return;
    }
    if let Some(last) = op.last_mut() {
        if last.undo == c.undo {
            match (&mut last.edit, &c.edit) {
                (TextEdit::Insert(prev), TextEdit::Insert(ins))
                    if last.p <= c.p && c.p <= last.p + char_len(prev) =>
                {
                    *prev = inject(prev, c.p - last.p, ins);
                    return;
                }
                (TextEdit::Delete(prev), TextEdit::Delete(del))
                    if c.p <= last.p && last.p <= c.p + char_len(del) =>
                {
                    *prev = inject(del, last.p - c.p, prev);
                    last.p = c.p;
                    return;
                }
                _ => {}
            }
        }
    }
    op.push(c);
}

/// `op1` followed by `op2`, with adjacent components merged where possible.
pub fn compose(op1: &[TextComponent], op2: &[TextComponent]) -> TextOp {
    let mut out = op1.to_vec();
    for c in op2 {
        append(&mut out, c.clone());
    }
    out
}

/// Fold every component of `op` through [`append`].
pub fn normalize(op: &[TextComponent]) -> TextOp {
    compose(&[], op)
}

/// Merge as many components as possible, preserving order and
/// insert/delete pairs.
pub fn compress(op: &[TextComponent]) -> TextOp {
    compose(&[], op)
}

// ── Transform ────────────────────────────────────────────────────────────

/// Shift `pos` past component `c`.
///
/// For an insert exactly at `pos`, `insert_after` decides whether `pos` is
/// pushed after the inserted text (`true`) or stays before it.
pub fn transform_position(pos: usize, c: &TextComponent, insert_after: bool) -> usize {
    match &c.edit {
        TextEdit::Insert(s) => {
            if c.p < pos || (c.p == pos && insert_after) {
                pos + char_len(s)
            } else {
                pos
            }
        }
        TextEdit::Delete(s) => {
            let len = char_len(s);
            if pos <= c.p {
                pos
            } else if pos <= c.p + len {
                c.p
            } else {
                pos - len
            }
        }
        TextEdit::Comment(_) => pos,
    }
}

/// Move a cursor through every component of `op`. A cursor on the `Right`
/// side ends up after text inserted exactly at its position.
pub fn transform_cursor(pos: usize, op: &[TextComponent], side: Side) -> usize {
    let insert_after = side == Side::Right;
    op.iter().fold(pos, |pos, c| transform_position(pos, c, insert_after))
}

/// Text removed from `c` by the overlapping delete `other`, checking that
/// both agree on the overlapped content.
fn trim_overlap(c: &TextComponent, other_p: usize, other_d: &str) -> OtResult<String> {
    let text = c.edit.text();
    let len = char_len(text);
    let other_len = char_len(other_d);

    let mut kept = String::new();
    if c.p < other_p {
        kept.push_str(slice(text, 0, other_p - c.p));
    }
    if c.p + len > other_p + other_len {
        kept.push_str(slice_from(text, other_p + other_len - c.p));
    }

    let start = c.p.max(other_p);
    let end = (c.p + len).min(other_p + other_len);
    let mine = slice(text, start - c.p, end - c.p);
    let theirs = slice(other_d, start - other_p, end - other_p);
    if mine != theirs {
        return Err(OtError::conflict(
            "delete ops delete different text in the same region of the document",
        ));
    }
    Ok(kept)
}

/// Transform component `c` by the concurrent component `other`, appending
/// the result to `dest`.
pub fn transform_component(
    dest: &mut TextOp,
    c: &TextComponent,
    other: &TextComponent,
    side: Side,
) -> OtResult<()> {
    match (&c.edit, &other.edit) {
        (TextEdit::Insert(_), _) => {
            append(dest, c.at(transform_position(c.p, other, side == Side::Right)));
        }

        (TextEdit::Delete(d), TextEdit::Insert(ins)) => {
            let mut rest = d.as_str();
            if c.p < other.p {
                append(dest, c.with_text(c.p, slice(d, 0, other.p - c.p).to_string()));
                rest = slice_from(d, other.p - c.p);
            }
            if !rest.is_empty() {
                append(dest, c.with_text(c.p + char_len(ins), rest.to_string()));
            }
        }

        (TextEdit::Delete(_) | TextEdit::Comment(_), TextEdit::Delete(od)) => {
            let other_len = char_len(od);
            if c.p >= other.p + other_len {
                append(dest, c.at(c.p - other_len));
            } else if c.p + c.len() <= other.p {
                append(dest, c.clone());
            } else {
                let kept = trim_overlap(c, other.p, od)?;
                let is_comment = matches!(c.edit, TextEdit::Comment(_));
                if is_comment || !kept.is_empty() {
                    let p = transform_position(c.p, other, false);
                    append(dest, c.with_text(p, kept));
                }
            }
        }

        (TextEdit::Comment(text), TextEdit::Insert(ins)) => {
            if c.p < other.p && other.p < c.p + char_len(text) {
                let spliced = inject(text, other.p - c.p, ins);
                append(dest, c.with_text(c.p, spliced));
            } else {
                append(dest, c.at(transform_position(c.p, other, true)));
            }
        }

        (_, TextEdit::Comment(_)) => append(dest, c.clone()),
    }
    Ok(())
}

/// Transform `op` so it applies after the concurrent `other`.
pub fn transform(op: &[TextComponent], other: &[TextComponent], side: Side) -> OtResult<TextOp> {
    <Text as ComponentOt>::transform(op, other, side)
}

/// Transform two concurrent ops against each other, returning
/// `(left', right')`.
pub fn transform_x(left: &[TextComponent], right: &[TextComponent]) -> OtResult<(TextOp, TextOp)> {
    <Text as ComponentOt>::transform_x(left, right)
}

// ── Invert ───────────────────────────────────────────────────────────────

/// The op undoing `op`: components reversed, inserts and deletes swapped.
///
/// Comments have no inverse and are left out of the result.
pub fn invert(op: &[TextComponent]) -> TextOp {
    op.iter()
        .rev()
        .filter_map(|c| match &c.edit {
            TextEdit::Insert(s) => Some(TextComponent::delete(c.p, s.clone())),
            TextEdit::Delete(s) => Some(TextComponent::insert(c.p, s.clone())),
            TextEdit::Comment(_) => None,
        })
        .collect()
}

// ── Type ─────────────────────────────────────────────────────────────────

/// The flat-text OT type.
#[derive(Debug, Clone, Copy, Default)]
pub struct Text;

impl ComponentOt for Text {
    type Component = TextComponent;

    fn check_valid_op(_op: &[TextComponent]) -> OtResult<()> {
        Ok(())
    }

    fn append(dest: &mut TextOp, c: TextComponent) {
        append(dest, c);
    }

    fn transform_component(
        dest: &mut TextOp,
        c: &TextComponent,
        other: &TextComponent,
        side: Side,
    ) -> OtResult<()> {
        transform_component(dest, c, other, side)
    }
}

impl OtType for Text {
    const NAME: &'static str = "text";
    type Snapshot = String;
    type Op = TextOp;

    fn create(&self) -> String {
        String::new()
    }

    fn apply(&self, snapshot: &String, op: &TextOp) -> OtResult<String> {
        apply(snapshot, op)
    }

    fn transform(&self, op: &TextOp, other: &TextOp, side: Side) -> OtResult<TextOp> {
        transform(op, other, side)
    }

    fn compose(&self, op1: &TextOp, op2: &TextOp) -> OtResult<TextOp> {
        Ok(compose(op1, op2))
    }
}
