//! Client-side JSON document with path-scoped editing and listeners.
//!
//! Local edits are applied immediately and queued until acknowledged;
//! remote ops are transformed past the queue before they apply. Listeners
//! follow the node they watch: every structural component re-addresses
//! them, and a listener whose node is removed is dropped.

use std::collections::VecDeque;

use serde_json::{Number, Value};
use tracing::{debug, trace};

use super::{apply, lookup, transform_component, transform_x};
use super::{JsonComponent, JsonEdit, JsonOp, Path, PathKey};
use crate::error::{OtError, OtResult};
use crate::side::Side;
use crate::util::{char_len, slice};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

/// What a listener subscribes to at its path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerKind {
    Insert,
    Delete,
    Replace,
    Move,
    Add,
    /// Any component strictly below the listener's path.
    ChildOp,
}

/// Notification produced by a remote op.
#[derive(Debug, Clone, PartialEq)]
pub enum JsonEvent {
    Insert { key: PathKey, value: Value },
    Delete { key: PathKey, value: Value },
    Replace { key: PathKey, before: Value, after: Value },
    Move { key: PathKey, to: usize },
    Add { amount: Number },
    /// `path` is relative to the listener.
    ChildOp { path: Path, component: JsonComponent },
}

#[derive(Debug, Clone)]
struct Listener {
    id: ListenerId,
    path: Path,
    kind: ListenerKind,
}

#[derive(Debug, Clone)]
pub struct JsonDocument {
    snapshot: Value,
    version: u64,
    pending: VecDeque<JsonOp>,
    listeners: Vec<Listener>,
    next_listener: u64,
}

impl JsonDocument {
    pub fn new(snapshot: Value) -> Self {
        Self::with_version(snapshot, 0)
    }

    pub fn with_version(snapshot: Value, version: u64) -> Self {
        Self {
            snapshot,
            version,
            pending: VecDeque::new(),
            listeners: Vec::new(),
            next_listener: 0,
        }
    }

    pub fn snapshot(&self) -> &Value {
        &self.snapshot
    }

    /// Version of the last op acknowledged or received from the server.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Local ops not yet acknowledged, oldest first.
    pub fn pending(&self) -> impl Iterator<Item = &JsonOp> {
        self.pending.iter()
    }

    /// Apply a local op and queue it for the server.
    pub fn submit_op(&mut self, op: JsonOp) -> OtResult<()> {
        self.snapshot = apply(&self.snapshot, &op)?;
        self.readdress_listeners(&op)?;
        trace!(components = op.len(), "submitted local op");
        self.pending.push_back(op);
        Ok(())
    }

    /// The server accepted the oldest pending op.
    pub fn acknowledge(&mut self) -> Option<JsonOp> {
        let op = self.pending.pop_front()?;
        self.version += 1;
        Some(op)
    }

    /// Apply an op from another site, returning the events it raised.
    pub fn apply_remote(&mut self, op: &[JsonComponent]) -> OtResult<Vec<(ListenerId, JsonEvent)>> {
        let mut remote = op.to_vec();
        for local in self.pending.iter_mut() {
            let (local_, remote_) = transform_x(local, &remote)?;
            *local = local_;
            remote = remote_;
        }

        self.snapshot = apply(&self.snapshot, &remote)?;
        self.version += 1;
        self.readdress_listeners(&remote)?;

        let mut events = Vec::new();
        for c in &remote {
            self.dispatch(c, &mut events);
        }
        debug!(version = self.version, events = events.len(), "applied remote op");
        Ok(events)
    }

    // ── Listeners ─────────────────────────────────────────────────────────

    pub fn add_listener(&mut self, path: Path, kind: ListenerKind) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push(Listener { id, path, kind });
        id
    }

    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|l| l.id != id);
        self.listeners.len() != before
    }

    /// Current path of a listener, or `None` once its node is gone.
    pub fn listener_path(&self, id: ListenerId) -> Option<&[PathKey]> {
        self.listeners.iter().find(|l| l.id == id).map(|l| l.path.as_slice())
    }

    /// Move every listener past `op` by transforming a zero number-add at
    /// its path. A marker that vanishes means the node was removed.
    fn readdress_listeners(&mut self, op: &[JsonComponent]) -> OtResult<()> {
        for c in op.iter().filter(|c| c.edit.is_structural()) {
            let mut kept = Vec::with_capacity(self.listeners.len());
            for mut l in std::mem::take(&mut self.listeners) {
                let marker = JsonComponent::new(l.path.clone(), JsonEdit::NumberAdd(0.into()));
                let mut moved = Vec::new();
                transform_component(&mut moved, &marker, c, Side::Left)?;
                match moved.len() {
                    0 => trace!(id = l.id.0, "listener removed with its node"),
                    1 => {
                        l.path = moved.swap_remove(0).p;
                        kept.push(l);
                    }
                    n => {
                        return Err(OtError::invariant(format!(
                            "listener marker transformed into {n} components"
                        )));
                    }
                }
            }
            self.listeners = kept;
        }
        Ok(())
    }

    fn dispatch(&self, c: &JsonComponent, events: &mut Vec<(ListenerId, JsonEvent)>) {
        let match_path: &[PathKey] = match c.edit {
            JsonEdit::NumberAdd(_) => &c.p,
            _ => &c.p[..c.p.len().saturating_sub(1)],
        };

        for l in &self.listeners {
            if l.path == match_path {
                if let Some(event) = exact_event(l.kind, c) {
                    events.push((l.id, event));
                }
            } else if l.kind == ListenerKind::ChildOp && match_path.starts_with(&l.path) {
                let event = JsonEvent::ChildOp {
                    path: c.p[l.path.len()..].to_vec(),
                    component: c.clone(),
                };
                events.push((l.id, event));
            }
        }
    }

    // ── Path helpers ──────────────────────────────────────────────────────

    pub fn at(&mut self, path: Path) -> SubDoc<'_> {
        SubDoc { doc: self, path }
    }

    pub fn get_at(&self, path: &[PathKey]) -> Option<&Value> {
        lookup(&self.snapshot, path)
    }

    fn container_of<'s, 'p>(&'s self, path: &'p [PathKey]) -> OtResult<Option<(&'s Value, &'p PathKey)>> {
        match path.split_last() {
            None => Ok(None),
            Some((key, parent)) => lookup(&self.snapshot, parent)
                .map(|elem| Some((elem, key)))
                .ok_or_else(|| OtError::validation("bad path")),
        }
    }

    /// Set the value at `path`, inserting or replacing as needed.
    pub fn set_at(&mut self, path: Path, value: Value) -> OtResult<JsonOp> {
        let edit = match self.container_of(&path)? {
            None => JsonEdit::ObjectReplace { od: self.snapshot.clone(), oi: value },
            Some((Value::Array(list), key)) => match key {
                PathKey::Index(i) => match list.get(*i) {
                    Some(old) => JsonEdit::ListReplace { ld: old.clone(), li: value },
                    None => JsonEdit::ListInsert(value),
                },
                PathKey::Key(k) => return Err(OtError::validation(format!("list key '{k}' is not an index"))),
            },
            Some((Value::Object(map), key)) => match map.get(&super::object_key(key)) {
                Some(old) => JsonEdit::ObjectReplace { od: old.clone(), oi: value },
                None => JsonEdit::ObjectInsert(value),
            },
            Some(_) => return Err(OtError::validation("bad path")),
        };
        self.submit(path, edit)
    }

    pub fn remove_at(&mut self, path: Path) -> OtResult<JsonOp> {
        let old = self
            .get_at(&path)
            .cloned()
            .ok_or_else(|| OtError::validation("no element at that path"))?;
        let edit = match self.container_of(&path)? {
            Some((Value::Array(_), _)) => JsonEdit::ListDelete(old),
            None | Some((Value::Object(_), _)) => JsonEdit::ObjectDelete(old),
            Some(_) => return Err(OtError::validation("bad path")),
        };
        self.submit(path, edit)
    }

    /// Insert `value` at `pos` of the list or string at `path`.
    pub fn insert_at(&mut self, mut path: Path, pos: usize, value: Value) -> OtResult<JsonOp> {
        let edit = match (self.get_at(&path), value) {
            (Some(Value::Array(_)), value) => JsonEdit::ListInsert(value),
            (Some(Value::String(_)), Value::String(s)) => JsonEdit::StringInsert(s),
            (Some(Value::String(_)), _) => {
                return Err(OtError::validation("only strings can be inserted into a string"));
            }
            _ => return Err(OtError::validation("insert target is not a list or string")),
        };
        path.push(PathKey::Index(pos));
        self.submit(path, edit)
    }

    pub fn move_at(&mut self, mut path: Path, from: usize, to: usize) -> OtResult<JsonOp> {
        path.push(PathKey::Index(from));
        self.submit(path, JsonEdit::ListMove(to))
    }

    pub fn add_at(&mut self, path: Path, amount: Number) -> OtResult<JsonOp> {
        self.submit(path, JsonEdit::NumberAdd(amount))
    }

    /// Delete `len` chars at `pos` of the string at `path`.
    pub fn delete_text_at(&mut self, mut path: Path, len: usize, pos: usize) -> OtResult<JsonOp> {
        let Some(Value::String(s)) = self.get_at(&path) else {
            return Err(OtError::validation("delete target is not a string"));
        };
        if pos + len > char_len(s) {
            return Err(OtError::validation("text delete past the end of the string"));
        }
        let deleted = slice(s, pos, pos + len).to_string();
        path.push(PathKey::Index(pos));
        self.submit(path, JsonEdit::StringDelete(deleted))
    }

    fn submit(&mut self, p: Path, edit: JsonEdit) -> OtResult<JsonOp> {
        let op = vec![JsonComponent::new(p, edit)];
        self.submit_op(op.clone())?;
        Ok(op)
    }
}

fn exact_event(kind: ListenerKind, c: &JsonComponent) -> Option<JsonEvent> {
    let key = || c.p.last().cloned().unwrap_or(PathKey::Index(0));
    match (kind, &c.edit) {
        (ListenerKind::Insert, JsonEdit::ListInsert(v) | JsonEdit::ObjectInsert(v)) => {
            Some(JsonEvent::Insert { key: key(), value: v.clone() })
        }
        (ListenerKind::Insert, JsonEdit::StringInsert(s)) => {
            Some(JsonEvent::Insert { key: key(), value: Value::String(s.clone()) })
        }
        (ListenerKind::Delete, JsonEdit::ListDelete(v) | JsonEdit::ObjectDelete(v)) => {
            Some(JsonEvent::Delete { key: key(), value: v.clone() })
        }
        (ListenerKind::Delete, JsonEdit::StringDelete(s)) => {
            Some(JsonEvent::Delete { key: key(), value: Value::String(s.clone()) })
        }
        (ListenerKind::Replace, JsonEdit::ListReplace { ld: before, li: after })
        | (ListenerKind::Replace, JsonEdit::ObjectReplace { od: before, oi: after }) => Some(JsonEvent::Replace {
            key: key(),
            before: before.clone(),
            after: after.clone(),
        }),
        (ListenerKind::Move, JsonEdit::ListMove(to)) => Some(JsonEvent::Move { key: key(), to: *to }),
        (ListenerKind::Add, JsonEdit::NumberAdd(n)) => Some(JsonEvent::Add { amount: n.clone() }),
        _ => None,
    }
}

/// View of the document scoped to one path.
pub struct SubDoc<'a> {
    doc: &'a mut JsonDocument,
    path: Path,
}

impl SubDoc<'_> {
    pub fn path(&self) -> &[PathKey] {
        &self.path
    }

    /// Descend further below this view.
    pub fn at(&mut self, path: impl IntoIterator<Item = PathKey>) -> SubDoc<'_> {
        let mut full = self.path.clone();
        full.extend(path);
        SubDoc { doc: &mut *self.doc, path: full }
    }

    pub fn get(&self) -> Option<&Value> {
        self.doc.get_at(&self.path)
    }

    pub fn set(&mut self, value: Value) -> OtResult<JsonOp> {
        self.doc.set_at(self.path.clone(), value)
    }

    pub fn insert(&mut self, pos: usize, value: Value) -> OtResult<JsonOp> {
        self.doc.insert_at(self.path.clone(), pos, value)
    }

    /// Delete `len` chars of the string here, starting at `pos`.
    pub fn del(&mut self, pos: usize, len: usize) -> OtResult<JsonOp> {
        self.doc.delete_text_at(self.path.clone(), len, pos)
    }

    pub fn remove(&mut self) -> OtResult<JsonOp> {
        self.doc.remove_at(self.path.clone())
    }

    /// Append to the list here.
    pub fn push(&mut self, value: Value) -> OtResult<JsonOp> {
        let len = match self.get() {
            Some(Value::Array(list)) => list.len(),
            _ => return Err(OtError::validation("push target is not a list")),
        };
        self.insert(len, value)
    }

    pub fn move_item(&mut self, from: usize, to: usize) -> OtResult<JsonOp> {
        self.doc.move_at(self.path.clone(), from, to)
    }

    pub fn add(&mut self, amount: impl Into<Number>) -> OtResult<JsonOp> {
        self.doc.add_at(self.path.clone(), amount.into())
    }

    /// Length of the list, or char length of the string, here.
    pub fn get_length(&self) -> OtResult<usize> {
        match self.get() {
            Some(Value::Array(list)) => Ok(list.len()),
            Some(Value::String(s)) => Ok(char_len(s)),
            _ => Err(OtError::validation("value has no length")),
        }
    }

    pub fn get_text(&self) -> OtResult<&str> {
        self.get()
            .and_then(Value::as_str)
            .ok_or_else(|| OtError::validation("value is not a string"))
    }

    pub fn add_listener(&mut self, kind: ListenerKind) -> ListenerId {
        self.doc.add_listener(self.path.clone(), kind)
    }
}
