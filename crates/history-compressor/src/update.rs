//! Updates as they travel from the editing layer to the history store.
//!
//! An update wraps either text ops for one document or, when `op` is absent,
//! a project structure change such as a rename. Fields the compressor does
//! not interpret are kept in `extra` maps and written back unchanged.

use ot_types::types::text::TextComponent;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::CompressResult;
use ot_types::util::char_len;

/// The body of a history op.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HistoryEdit {
    #[serde(rename = "i")]
    Insert(String),
    #[serde(rename = "d")]
    Delete(String),
    #[serde(rename = "c")]
    Comment(String),
    #[serde(rename = "r")]
    Retain(String),
}

impl HistoryEdit {
    pub fn text(&self) -> &str {
        match self {
            HistoryEdit::Insert(s)
            | HistoryEdit::Delete(s)
            | HistoryEdit::Comment(s)
            | HistoryEdit::Retain(s) => s,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackedChangeType {
    Insert,
    Delete,
}

/// A tracked change overlapped by a delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedChange {
    #[serde(rename = "type")]
    pub kind: TrackedChangeType,
    pub length: usize,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// One text op with its history metadata. `p` and `hpos` count chars.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryOp {
    pub p: usize,
    #[serde(flatten)]
    pub edit: HistoryEdit,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hpos: Option<usize>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub u: bool,
    #[serde(rename = "trackedDeleteRejection", default, skip_serializing_if = "is_false")]
    pub tracked_delete_rejection: bool,
    #[serde(rename = "commentIds", default, skip_serializing_if = "Option::is_none")]
    pub comment_ids: Option<Vec<String>>,
    #[serde(rename = "trackedChanges", default, skip_serializing_if = "Option::is_none")]
    pub tracked_changes: Option<Vec<TrackedChange>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl HistoryOp {
    pub fn new(p: usize, edit: HistoryEdit) -> Self {
        Self {
            p,
            edit,
            hpos: None,
            u: false,
            tracked_delete_rejection: false,
            comment_ids: None,
            tracked_changes: None,
            extra: Map::new(),
        }
    }

    pub fn insert(p: usize, s: impl Into<String>) -> Self {
        Self::new(p, HistoryEdit::Insert(s.into()))
    }

    pub fn delete(p: usize, s: impl Into<String>) -> Self {
        Self::new(p, HistoryEdit::Delete(s.into()))
    }

    pub fn comment(p: usize, s: impl Into<String>) -> Self {
        Self::new(p, HistoryEdit::Comment(s.into()))
    }

    pub fn retain(p: usize, s: impl Into<String>) -> Self {
        Self::new(p, HistoryEdit::Retain(s.into()))
    }

    pub fn inserted(&self) -> Option<&str> {
        match &self.edit {
            HistoryEdit::Insert(s) => Some(s),
            _ => None,
        }
    }

    pub fn deleted(&self) -> Option<&str> {
        match &self.edit {
            HistoryEdit::Delete(s) => Some(s),
            _ => None,
        }
    }

    /// Chars inserted or deleted; comments and retains have no size.
    pub fn size(&self) -> usize {
        match &self.edit {
            HistoryEdit::Insert(s) | HistoryEdit::Delete(s) => char_len(s),
            HistoryEdit::Comment(_) | HistoryEdit::Retain(_) => 0,
        }
    }

    /// Whether the op inserts or deletes nothing.
    pub fn is_blank(&self) -> bool {
        matches!(&self.edit, HistoryEdit::Insert(s) | HistoryEdit::Delete(s) if s.is_empty())
    }

    /// The flat-text component replaying this op, if it changes or checks
    /// the text.
    pub fn to_text_component(&self) -> Option<TextComponent> {
        let c = match &self.edit {
            HistoryEdit::Insert(s) => TextComponent::insert(self.p, s.as_str()),
            HistoryEdit::Delete(s) => TextComponent::delete(self.p, s.as_str()),
            HistoryEdit::Comment(s) => TextComponent::comment(self.p, s.as_str()),
            HistoryEdit::Retain(_) => return None,
        };
        Some(c.with_undo(self.u))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateMeta {
    /// Milliseconds since the epoch.
    pub ts: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_length: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history_doc_length: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_hash: Option<String>,
    /// Tracked-change id, set while track changes is on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tc: Option<String>,
    /// `"external"` for updates that did not come from an editor.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UpdateMeta {
    pub fn new(ts: i64) -> Self {
        Self {
            ts,
            user_id: None,
            doc_length: None,
            history_doc_length: None,
            doc_hash: None,
            tc: None,
            kind: None,
            source: None,
            extra: Map::new(),
        }
    }

    pub fn is_external(&self) -> bool {
        self.kind.as_deref() == Some("external")
    }

    pub fn is_tracked(&self) -> bool {
        self.tc.is_some()
    }
}

/// An update whose `op` is `O`: a list of ops as received, a single op
/// while compressing, or a list again once grouped by version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Update<O> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pathname: Option<String>,
    #[serde(default = "Option::default", skip_serializing_if = "Option::is_none")]
    pub op: Option<O>,
    pub meta: UpdateMeta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub v: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

pub type RawUpdate = Update<Vec<HistoryOp>>;
pub type SingleOpUpdate = Update<HistoryOp>;

impl<O> Update<O> {
    pub fn new(op: O, meta: UpdateMeta) -> Self {
        Self { doc: None, pathname: None, op: Some(op), meta, v: None, extra: Map::new() }
    }

    /// Whether this is a project structure update rather than a text edit.
    pub fn is_structural(&self) -> bool {
        self.op.is_none()
    }

    /// A copy of everything but the op, which is replaced by `op`.
    pub fn with_op<P>(&self, op: Option<P>) -> Update<P> {
        Update {
            doc: self.doc.clone(),
            pathname: self.pathname.clone(),
            op,
            meta: self.meta.clone(),
            v: self.v,
            extra: self.extra.clone(),
        }
    }

    pub fn map_op<P>(self, f: impl FnOnce(O) -> P) -> Update<P> {
        Update {
            doc: self.doc,
            pathname: self.pathname,
            op: self.op.map(f),
            meta: self.meta,
            v: self.v,
            extra: self.extra,
        }
    }

    /// Whether both updates target the same document under the same name.
    pub fn same_document<P>(&self, other: &Update<P>) -> bool {
        self.doc == other.doc && self.pathname == other.pathname
    }
}

/// Ops carried by an update, whatever its grouping.
pub trait UpdateOps {
    fn ops(&self) -> &[HistoryOp];
}

impl UpdateOps for HistoryOp {
    fn ops(&self) -> &[HistoryOp] {
        std::slice::from_ref(self)
    }
}

impl UpdateOps for Vec<HistoryOp> {
    fn ops(&self) -> &[HistoryOp] {
        self
    }
}

pub fn updates_from_json<O: DeserializeOwned>(v: Value) -> CompressResult<Vec<Update<O>>> {
    Ok(serde_json::from_value(v)?)
}

pub fn updates_to_json<O: Serialize>(updates: &[Update<O>]) -> CompressResult<Value> {
    Ok(serde_json::to_value(updates)?)
}
