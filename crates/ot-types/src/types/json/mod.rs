//! Path-addressed JSON operational transformation.
//!
//! # Operation format
//!
//! A [`JsonOp`] is a list of components. Each names a path into the
//! snapshot (object keys and list indices) and exactly one edit of the node
//! it reaches:
//!
//! | edit | wire | effect |
//! |---|---|---|
//! | `ListInsert` | `li` | insert into the list at the last index |
//! | `ListDelete` | `ld` | remove the list element |
//! | `ListReplace` | `ld`+`li` | replace the list element |
//! | `ListMove` | `lm` | move the list element to another index |
//! | `ObjectInsert` | `oi` | set an object key |
//! | `ObjectDelete` | `od` | remove an object key |
//! | `ObjectReplace` | `od`+`oi` | replace an object value |
//! | `StringInsert` | `si` | insert text at the offset ending the path |
//! | `StringDelete` | `sd` | delete text at the offset ending the path |
//! | `NumberAdd` | `na` | add to a number |
//!
//! An empty path addresses the whole snapshot; only object edits and `na`
//! are allowed there.

pub mod api;
pub mod codec;

use serde_json::{Number, Value};

use crate::bootstrap::ComponentOt;
use crate::error::{OtError, OtResult};
use crate::side::Side;
use crate::types::text::{self, TextComponent, TextEdit};
use crate::types::OtType;
use crate::util::{char_len, inject, remove, slice};

// ── Types ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathKey {
    Key(String),
    Index(usize),
}

impl From<&str> for PathKey {
    fn from(key: &str) -> Self {
        PathKey::Key(key.to_string())
    }
}

impl From<String> for PathKey {
    fn from(key: String) -> Self {
        PathKey::Key(key)
    }
}

impl From<usize> for PathKey {
    fn from(index: usize) -> Self {
        PathKey::Index(index)
    }
}

pub type Path = Vec<PathKey>;

#[derive(Debug, Clone, PartialEq)]
pub enum JsonEdit {
    ListInsert(Value),
    ListDelete(Value),
    ListReplace { ld: Value, li: Value },
    ListMove(usize),
    ObjectInsert(Value),
    ObjectDelete(Value),
    ObjectReplace { od: Value, oi: Value },
    StringInsert(String),
    StringDelete(String),
    NumberAdd(Number),
}

impl JsonEdit {
    /// Wire name of the edit, e.g. `"li"` or `"od+oi"`.
    pub fn name(&self) -> &'static str {
        match self {
            JsonEdit::ListInsert(_) => "li",
            JsonEdit::ListDelete(_) => "ld",
            JsonEdit::ListReplace { .. } => "ld+li",
            JsonEdit::ListMove(_) => "lm",
            JsonEdit::ObjectInsert(_) => "oi",
            JsonEdit::ObjectDelete(_) => "od",
            JsonEdit::ObjectReplace { .. } => "od+oi",
            JsonEdit::StringInsert(_) => "si",
            JsonEdit::StringDelete(_) => "sd",
            JsonEdit::NumberAdd(_) => "na",
        }
    }

    pub fn li(&self) -> Option<&Value> {
        match self {
            JsonEdit::ListInsert(li) | JsonEdit::ListReplace { li, .. } => Some(li),
            _ => None,
        }
    }

    pub fn ld(&self) -> Option<&Value> {
        match self {
            JsonEdit::ListDelete(ld) | JsonEdit::ListReplace { ld, .. } => Some(ld),
            _ => None,
        }
    }

    pub fn oi(&self) -> Option<&Value> {
        match self {
            JsonEdit::ObjectInsert(oi) | JsonEdit::ObjectReplace { oi, .. } => Some(oi),
            _ => None,
        }
    }

    pub fn od(&self) -> Option<&Value> {
        match self {
            JsonEdit::ObjectDelete(od) | JsonEdit::ObjectReplace { od, .. } => Some(od),
            _ => None,
        }
    }

    pub fn is_string_edit(&self) -> bool {
        matches!(self, JsonEdit::StringInsert(_) | JsonEdit::StringDelete(_))
    }

    /// Edits that never change the shape of the tree.
    pub fn is_structural(&self) -> bool {
        !matches!(
            self,
            JsonEdit::StringInsert(_) | JsonEdit::StringDelete(_) | JsonEdit::NumberAdd(_)
        )
    }

    fn needs_index(&self) -> bool {
        matches!(
            self,
            JsonEdit::ListInsert(_)
                | JsonEdit::ListDelete(_)
                | JsonEdit::ListReplace { .. }
                | JsonEdit::ListMove(_)
                | JsonEdit::StringInsert(_)
                | JsonEdit::StringDelete(_)
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct JsonComponent {
    pub p: Path,
    pub edit: JsonEdit,
}

pub type JsonOp = Vec<JsonComponent>;

impl JsonComponent {
    pub fn new(p: Path, edit: JsonEdit) -> Self {
        Self { p, edit }
    }

    /// Value removed by the component (`ld` or `od`).
    fn deleted_value_mut(&mut self) -> Option<&mut Value> {
        match &mut self.edit {
            JsonEdit::ListDelete(v)
            | JsonEdit::ListReplace { ld: v, .. }
            | JsonEdit::ObjectDelete(v)
            | JsonEdit::ObjectReplace { od: v, .. } => Some(v),
            _ => None,
        }
    }

    fn set_ld(&mut self, value: Value) {
        if let JsonEdit::ListDelete(ld) | JsonEdit::ListReplace { ld, .. } = &mut self.edit {
            *ld = value;
        }
    }

    fn set_od(&mut self, value: Value) {
        match &mut self.edit {
            JsonEdit::ObjectDelete(od) | JsonEdit::ObjectReplace { od, .. } => *od = value,
            JsonEdit::ObjectInsert(oi) => {
                let oi = std::mem::take(oi);
                self.edit = JsonEdit::ObjectReplace { od: value, oi };
            }
            _ => {}
        }
    }

    /// Replace becomes a plain insert.
    fn drop_ld(&mut self) {
        if let JsonEdit::ListReplace { li, .. } = &mut self.edit {
            let li = std::mem::take(li);
            self.edit = JsonEdit::ListInsert(li);
        }
    }

    fn drop_od(&mut self) {
        if let JsonEdit::ObjectReplace { oi, .. } = &mut self.edit {
            let oi = std::mem::take(oi);
            self.edit = JsonEdit::ObjectInsert(oi);
        }
    }
}

// ── Numbers ───────────────────────────────────────────────────────────────

/// Integer sum when both sides are integers, float sum otherwise.
pub(crate) fn add_numbers(a: &Number, b: &Number) -> Option<Number> {
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        if let Some(sum) = x.checked_add(y) {
            return Some(sum.into());
        }
    }
    Number::from_f64(a.as_f64()? + b.as_f64()?)
}

fn negate(n: &Number) -> Option<Number> {
    if let Some(neg) = n.as_i64().and_then(i64::checked_neg) {
        return Some(neg.into());
    }
    Number::from_f64(-n.as_f64()?)
}

fn is_zero(n: &Number) -> bool {
    n.as_f64() == Some(0.0)
}

// ── Validation / apply ────────────────────────────────────────────────────

/// List and string edits must end their path with an index.
pub fn check_valid_op(op: &[JsonComponent]) -> OtResult<()> {
    for c in op {
        if c.edit.needs_index() && !matches!(c.p.last(), Some(PathKey::Index(_))) {
            return Err(OtError::validation(format!(
                "{} component needs a list index or string offset at the end of its path",
                c.edit.name()
            )));
        }
    }
    Ok(())
}

fn object_key(key: &PathKey) -> String {
    match key {
        PathKey::Key(k) => k.clone(),
        PathKey::Index(i) => i.to_string(),
    }
}

fn index_of(key: &PathKey) -> OtResult<usize> {
    match key {
        PathKey::Index(i) => Ok(*i),
        PathKey::Key(k) => Err(OtError::validation(format!("expected an index, found key '{k}'"))),
    }
}

fn child_mut<'v>(elem: &'v mut Value, key: &PathKey) -> OtResult<&'v mut Value> {
    match (elem, key) {
        (Value::Object(map), key) => map.get_mut(&object_key(key)),
        (Value::Array(list), PathKey::Index(i)) => list.get_mut(*i),
        _ => None,
    }
    .ok_or_else(|| OtError::validation("path invalid"))
}

/// Value at `path`, if the whole path exists.
pub fn lookup<'v>(snapshot: &'v Value, path: &[PathKey]) -> Option<&'v Value> {
    path.iter().try_fold(snapshot, |elem, key| match (elem, key) {
        (Value::Object(map), key) => map.get(&object_key(key)),
        (Value::Array(list), PathKey::Index(i)) => list.get(*i),
        _ => None,
    })
}

fn add_in_place(target: &mut Value, n: &Number) -> OtResult<()> {
    let Value::Number(current) = target else {
        return Err(OtError::validation("referenced element not a number"));
    };
    *current = add_numbers(current, n)
        .ok_or_else(|| OtError::validation("number add overflowed"))?;
    Ok(())
}

fn apply_root(doc: &mut Value, edit: &JsonEdit) -> OtResult<()> {
    match edit {
        JsonEdit::ObjectInsert(v) | JsonEdit::ObjectReplace { oi: v, .. } => *doc = v.clone(),
        JsonEdit::ObjectDelete(_) => *doc = Value::Null,
        JsonEdit::NumberAdd(n) => add_in_place(doc, n)?,
        other => {
            return Err(OtError::validation(format!("{} cannot apply to the root", other.name())));
        }
    }
    Ok(())
}

fn apply_component(doc: &mut Value, c: &JsonComponent) -> OtResult<()> {
    let Some((key, parent)) = c.p.split_last() else {
        return apply_root(doc, &c.edit);
    };
    let mut elem = doc;
    for k in parent {
        elem = child_mut(elem, k)?;
    }

    let not_list = || OtError::validation("referenced element not a list");
    let not_object = || OtError::validation("referenced element not an object");
    let not_string = || OtError::validation("referenced element not a string");

    match &c.edit {
        JsonEdit::NumberAdd(n) => add_in_place(child_mut(elem, key)?, n)?,
        JsonEdit::StringInsert(s) => {
            let Value::String(text) = elem else { return Err(not_string()) };
            let offset = index_of(key)?;
            if offset > char_len(text) {
                return Err(OtError::validation("string insert past the end of the string"));
            }
            *text = inject(text, offset, s);
        }
        JsonEdit::StringDelete(s) => {
            let Value::String(text) = elem else { return Err(not_string()) };
            let offset = index_of(key)?;
            let len = char_len(s);
            if slice(text, offset, offset + len) != s {
                return Err(OtError::conflict(format!("deleted string '{s}' does not match")));
            }
            *text = remove(text, offset, len);
        }
        JsonEdit::ListReplace { li, .. } => {
            let Value::Array(list) = elem else { return Err(not_list()) };
            let slot = list
                .get_mut(index_of(key)?)
                .ok_or_else(|| OtError::validation("list replace past the end of the list"))?;
            *slot = li.clone();
        }
        JsonEdit::ListInsert(li) => {
            let Value::Array(list) = elem else { return Err(not_list()) };
            let at = index_of(key)?;
            if at > list.len() {
                return Err(OtError::validation("list insert past the end of the list"));
            }
            list.insert(at, li.clone());
        }
        JsonEdit::ListDelete(_) => {
            let Value::Array(list) = elem else { return Err(not_list()) };
            let at = index_of(key)?;
            if at >= list.len() {
                return Err(OtError::validation("list delete past the end of the list"));
            }
            list.remove(at);
        }
        JsonEdit::ListMove(to) => {
            let Value::Array(list) = elem else { return Err(not_list()) };
            let from = index_of(key)?;
            if from != *to {
                if from >= list.len() || *to >= list.len() {
                    return Err(OtError::validation("list move out of bounds"));
                }
                let moved = list.remove(from);
                list.insert(*to, moved);
            }
        }
        JsonEdit::ObjectInsert(oi) | JsonEdit::ObjectReplace { oi, .. } => {
            let Value::Object(map) = elem else { return Err(not_object()) };
            map.insert(object_key(key), oi.clone());
        }
        JsonEdit::ObjectDelete(_) => {
            let Value::Object(map) = elem else { return Err(not_object()) };
            map.remove(&object_key(key));
        }
    }
    Ok(())
}

/// Apply `op` to `snapshot`, returning the new snapshot.
pub fn apply(snapshot: &Value, op: &[JsonComponent]) -> OtResult<Value> {
    check_valid_op(op)?;
    let mut doc = snapshot.clone();
    for c in op {
        apply_component(&mut doc, c)?;
    }
    Ok(doc)
}

// ── Paths ─────────────────────────────────────────────────────────────────

/// Whether `p1` and `p2` are equal, optionally ignoring their last element.
pub fn path_matches(p1: &[PathKey], p2: &[PathKey], ignore_last: bool) -> bool {
    p1.len() == p2.len()
        && p1
            .iter()
            .zip(p2)
            .enumerate()
            .all(|(i, (a, b))| a == b || (ignore_last && i == p1.len() - 1))
}

/// Depth at which `p1` and `p2` edit the same container.
///
/// Returns the index of the last element of `p2` when the parent of `p2` is
/// a prefix of the parent of `p1`, and `-1` when `p2` is the root path.
pub fn common_path(p1: &[PathKey], p2: &[PathKey]) -> Option<isize> {
    if p2.is_empty() {
        return Some(-1);
    }
    let n = p2.len();
    (p1.len() >= n && p1[..n - 1] == p2[..n - 1]).then(|| n as isize - 1)
}

fn key_at(p: &[PathKey], at: isize) -> Option<&PathKey> {
    usize::try_from(at).ok().and_then(|i| p.get(i))
}

fn index_at(p: &[PathKey], at: isize) -> Option<usize> {
    match key_at(p, at) {
        Some(PathKey::Index(i)) => Some(*i),
        _ => None,
    }
}

fn set_index_at(p: &mut [PathKey], at: isize, value: usize) {
    if let Some(slot) = usize::try_from(at).ok().and_then(|i| p.get_mut(i)) {
        if matches!(slot, PathKey::Index(_)) {
            *slot = PathKey::Index(value);
        }
    }
}

fn shift_index_at(p: &mut [PathKey], at: isize, up: bool) {
    if let Some(i) = index_at(p, at) {
        set_index_at(p, at, if up { i + 1 } else { i.saturating_sub(1) });
    }
}

fn lt(a: Option<usize>, b: Option<usize>) -> bool {
    matches!((a, b), (Some(a), Some(b)) if a < b)
}

fn le(a: Option<usize>, b: Option<usize>) -> bool {
    matches!((a, b), (Some(a), Some(b)) if a <= b)
}

// ── Append / compose / invert ─────────────────────────────────────────────

/// Push `c` onto `dest`, folding it into the last component when both edit
/// the same path: number adds sum up, an insert followed by deleting the
/// same value cancels, a delete followed by an insert becomes a replace, and
/// a move to its own index vanishes.
pub fn append(dest: &mut JsonOp, c: JsonComponent) {
    let Some(last) = dest.pop() else {
        dest.push(c);
        return;
    };
    if !path_matches(&c.p, &last.p, false) {
        dest.push(last);
        dest.push(c);
        return;
    }

    let JsonComponent { p, edit: last_edit } = last;
    match (last_edit, c.edit) {
        (JsonEdit::NumberAdd(a), JsonEdit::NumberAdd(b)) => match add_numbers(&a, &b) {
            Some(sum) => dest.push(JsonComponent::new(p, JsonEdit::NumberAdd(sum))),
            None => {
                dest.push(JsonComponent::new(p, JsonEdit::NumberAdd(a)));
                dest.push(JsonComponent::new(c.p, JsonEdit::NumberAdd(b)));
            }
        },
        (JsonEdit::ListInsert(li), JsonEdit::ListDelete(ld)) if li == ld => {}
        (JsonEdit::ListReplace { ld: kept, li }, JsonEdit::ListDelete(ld)) if li == ld => {
            dest.push(JsonComponent::new(p, JsonEdit::ListDelete(kept)));
        }
        (JsonEdit::ObjectDelete(od), JsonEdit::ObjectInsert(oi)) => {
            dest.push(JsonComponent::new(p, JsonEdit::ObjectReplace { od, oi }));
        }
        (last_edit, JsonEdit::ListMove(to)) if c.p.last() == Some(&PathKey::Index(to)) => {
            dest.push(JsonComponent::new(p, last_edit));
        }
        (last_edit, edit) => {
            dest.push(JsonComponent::new(p, last_edit));
            dest.push(JsonComponent::new(c.p, edit));
        }
    }
}

/// `op1` followed by `op2`, with adjacent components folded.
pub fn compose(op1: &[JsonComponent], op2: &[JsonComponent]) -> JsonOp {
    let mut out = op1.to_vec();
    for c in op2 {
        append(&mut out, c.clone());
    }
    out
}

pub fn normalize(op: &[JsonComponent]) -> JsonOp {
    compose(&[], op)
}

pub fn invert_component(c: &JsonComponent) -> JsonComponent {
    let edit = match &c.edit {
        JsonEdit::ListInsert(v) => JsonEdit::ListDelete(v.clone()),
        JsonEdit::ListDelete(v) => JsonEdit::ListInsert(v.clone()),
        JsonEdit::ListReplace { ld, li } => JsonEdit::ListReplace { ld: li.clone(), li: ld.clone() },
        JsonEdit::ObjectInsert(v) => JsonEdit::ObjectDelete(v.clone()),
        JsonEdit::ObjectDelete(v) => JsonEdit::ObjectInsert(v.clone()),
        JsonEdit::ObjectReplace { od, oi } => JsonEdit::ObjectReplace { od: oi.clone(), oi: od.clone() },
        JsonEdit::StringInsert(s) => JsonEdit::StringDelete(s.clone()),
        JsonEdit::StringDelete(s) => JsonEdit::StringInsert(s.clone()),
        JsonEdit::NumberAdd(n) => JsonEdit::NumberAdd(negate(n).unwrap_or_else(|| n.clone())),
        JsonEdit::ListMove(to) => {
            let mut p = c.p.clone();
            let from = match p.pop() {
                Some(PathKey::Index(from)) => from,
                _ => *to,
            };
            p.push(PathKey::Index(*to));
            return JsonComponent::new(p, JsonEdit::ListMove(from));
        }
    };
    JsonComponent::new(c.p.clone(), edit)
}

/// The op undoing `op`.
pub fn invert(op: &[JsonComponent]) -> JsonOp {
    op.iter().rev().map(invert_component).collect()
}

// ── Transform ─────────────────────────────────────────────────────────────

/// Path used for depth arithmetic: `na` addresses a number, which is treated
/// as one level deeper than the number itself.
fn depth_path(c: &JsonComponent) -> Path {
    let mut p = c.p.clone();
    if matches!(c.edit, JsonEdit::NumberAdd(_)) {
        p.push(PathKey::Index(0));
    }
    p
}

/// Apply `other` to the value `c` deletes, when `other` edits inside it.
fn apply_to_deleted(c: &mut JsonComponent, other: &JsonComponent, depth: usize) -> OtResult<()> {
    if let Some(deleted) = c.deleted_value_mut() {
        let inner = JsonComponent::new(
            other.p.get(depth..).map(<[_]>::to_vec).unwrap_or_default(),
            other.edit.clone(),
        );
        *deleted = apply(deleted, &[inner])?;
    }
    Ok(())
}

fn as_text_component(c: &JsonComponent) -> OtResult<TextComponent> {
    let offset = match c.p.last() {
        Some(PathKey::Index(i)) => *i,
        _ => return Err(OtError::validation("string component needs an offset")),
    };
    match &c.edit {
        JsonEdit::StringInsert(s) => Ok(TextComponent::insert(offset, s.clone())),
        JsonEdit::StringDelete(s) => Ok(TextComponent::delete(offset, s.clone())),
        other => Err(OtError::validation(format!("{} is not a string edit", other.name()))),
    }
}

/// String edits on the same string go through the flat-text transform.
fn transform_string(
    dest: &mut JsonOp,
    c: &JsonComponent,
    other: &JsonComponent,
    common: isize,
    side: Side,
) -> OtResult<()> {
    let depth = usize::try_from(common)
        .map_err(|_| OtError::validation("string edit at the root"))?;
    let mut res = Vec::new();
    text::transform_component(&mut res, &as_text_component(c)?, &as_text_component(other)?, side)?;

    for tc in res {
        let mut p = c.p.get(..depth).map(<[_]>::to_vec).unwrap_or_default();
        p.push(PathKey::Index(tc.p));
        let edit = match tc.edit {
            TextEdit::Insert(s) => JsonEdit::StringInsert(s),
            TextEdit::Delete(s) => JsonEdit::StringDelete(s),
            TextEdit::Comment(_) => continue,
        };
        append(dest, JsonComponent::new(p, edit));
    }
    Ok(())
}

/// Move `c`'s `lm` past a concurrent move of the same list. Returns `false`
/// when `c` becomes a no-op.
fn move_past_move(c: &mut JsonComponent, at: usize, other_from: usize, other_to: usize, side: Side) -> bool {
    let JsonEdit::ListMove(to) = c.edit else { return true };
    let Some(PathKey::Index(from)) = c.p.get(at).cloned() else { return true };
    if other_from == other_to {
        return true;
    }

    let mut new_from = from;
    let mut new_to = to;
    if from == other_from {
        // They moved our element: the left side wins.
        if side == Side::Right {
            return false;
        }
        new_from = other_to;
        if from == to {
            new_to = other_to;
        }
    } else {
        if from > other_from {
            new_from -= 1;
        }
        if from > other_to {
            new_from += 1;
        } else if from == other_to && other_from > other_to {
            new_from += 1;
            if from == to {
                new_to += 1;
            }
        }

        if to > other_from {
            new_to = new_to.saturating_sub(1);
        } else if to == other_from && to > from {
            new_to = new_to.saturating_sub(1);
        }
        if to > other_to {
            new_to += 1;
        } else if to == other_to {
            let same_direction = (other_to > other_from && to > from) || (other_to < other_from && to < from);
            if same_direction {
                if side == Side::Right {
                    new_to += 1;
                }
            } else if to > from {
                new_to += 1;
            } else if to == other_from {
                new_to = new_to.saturating_sub(1);
            }
        }
    }

    if let Some(slot) = c.p.get_mut(at) {
        *slot = PathKey::Index(new_from);
    }
    c.edit = JsonEdit::ListMove(new_to);
    true
}

/// Transform `c` so it applies after the concurrent `other`, appending the
/// result to `dest`.
pub fn transform_component(
    dest: &mut JsonOp,
    c: &JsonComponent,
    other: &JsonComponent,
    side: Side,
) -> OtResult<()> {
    let mut c = c.clone();
    let c_path = depth_path(&c);
    let other_path = depth_path(other);
    let common = common_path(&c_path, &other_path);
    let common2 = common_path(&other_path, &c_path);
    let cplength = c_path.len();
    let other_cplength = other_path.len();

    // A non-zero number add only changes values c may have deleted.
    if let JsonEdit::NumberAdd(n) = &other.edit {
        if !is_zero(n) {
            if let Some(k) = common2 {
                if other_cplength >= cplength && key_at(&other.p, k) == key_at(&c.p, k) {
                    apply_to_deleted(&mut c, other, cplength)?;
                }
            }
            append(dest, c);
            return Ok(());
        }
    }

    // other edits inside the value c deletes.
    if let Some(k) = common2 {
        if other_cplength > cplength && key_at(&c.p, k) == key_at(&other.p, k) {
            apply_to_deleted(&mut c, other, cplength)?;
        }
    }

    if let Some(common) = common {
        let common_operand = cplength == other_cplength;
        let same_key = key_at(&c.p, common) == key_at(&other.p, common);
        let other_at = index_at(&other.p, common);

        match &other.edit {
            JsonEdit::NumberAdd(_) => {}

            JsonEdit::StringInsert(_) | JsonEdit::StringDelete(_) => {
                if c.edit.is_string_edit() {
                    if !common_operand {
                        return Err(OtError::validation(
                            "string edits address the same string at different depths",
                        ));
                    }
                    return transform_string(dest, &c, other, common, side);
                }
            }

            JsonEdit::ListReplace { li: other_li, .. } => {
                if same_key {
                    // Below the replaced element, or deleting it too.
                    if !common_operand {
                        return Ok(());
                    }
                    if c.edit.ld().is_some() {
                        if c.edit.li().is_some() && side == Side::Left {
                            c.set_ld(other_li.clone());
                        } else {
                            return Ok(());
                        }
                    }
                }
            }

            JsonEdit::ListInsert(_) => {
                if matches!(c.edit, JsonEdit::ListInsert(_)) && common_operand && same_key {
                    if side == Side::Right {
                        shift_index_at(&mut c.p, common, true);
                    }
                } else if le(other_at, index_at(&c.p, common)) {
                    shift_index_at(&mut c.p, common, true);
                }
                if let JsonEdit::ListMove(to) = &mut c.edit {
                    if common_operand && other_at.is_some_and(|at| at <= *to) {
                        *to += 1;
                    }
                }
            }

            JsonEdit::ListDelete(_) => {
                if let JsonEdit::ListMove(to) = &mut c.edit {
                    if common_operand {
                        if same_key {
                            // They deleted the element we move.
                            return Ok(());
                        }
                        if let (Some(p), Some(from)) = (other_at, index_at(&c.p, common)) {
                            if p < *to || (p == *to && from < *to) {
                                *to = to.saturating_sub(1);
                            }
                        }
                    }
                }

                if lt(other_at, index_at(&c.p, common)) {
                    shift_index_at(&mut c.p, common, false);
                } else if same_key {
                    if other_cplength < cplength {
                        return Ok(());
                    }
                    if c.edit.ld().is_some() {
                        if c.edit.li().is_some() {
                            c.drop_ld();
                        } else {
                            return Ok(());
                        }
                    }
                }
            }

            JsonEdit::ListMove(other_to) => {
                let other_to = *other_to;
                if matches!(c.edit, JsonEdit::ListMove(_)) && cplength == other_cplength {
                    if let (Ok(at), Some(other_from)) = (usize::try_from(common), other_at) {
                        if !move_past_move(&mut c, at, other_from, other_to, side) {
                            return Ok(());
                        }
                    }
                } else if let (Some(from), Some(p)) = (other_at, index_at(&c.p, common)) {
                    let mut moved = p;
                    if matches!(c.edit, JsonEdit::ListInsert(_)) && common_operand {
                        if p > from {
                            moved -= 1;
                        }
                        if p > other_to {
                            moved += 1;
                        }
                    } else if p == from {
                        moved = other_to;
                    } else {
                        if p > from {
                            moved -= 1;
                        }
                        if p > other_to || (p == other_to && from > other_to) {
                            moved += 1;
                        }
                    }
                    set_index_at(&mut c.p, common, moved);
                }
            }

            JsonEdit::ObjectReplace { oi: other_oi, .. } => {
                if same_key {
                    if c.edit.oi().is_some() && common_operand {
                        if side == Side::Right {
                            return Ok(());
                        }
                        c.set_od(other_oi.clone());
                    } else {
                        return Ok(());
                    }
                }
            }

            JsonEdit::ObjectInsert(other_oi) => {
                if c.edit.oi().is_some() && same_key {
                    if side == Side::Right {
                        return Ok(());
                    }
                    append(dest, JsonComponent::new(c.p.clone(), JsonEdit::ObjectDelete(other_oi.clone())));
                }
            }

            JsonEdit::ObjectDelete(_) => {
                if same_key {
                    if !common_operand {
                        return Ok(());
                    }
                    if c.edit.oi().is_some() {
                        c.drop_od();
                    } else {
                        return Ok(());
                    }
                }
            }
        }
    }

    append(dest, c);
    Ok(())
}

pub fn transform(op: &[JsonComponent], other: &[JsonComponent], side: Side) -> OtResult<JsonOp> {
    <Json as ComponentOt>::transform(op, other, side)
}

pub fn transform_x(left: &[JsonComponent], right: &[JsonComponent]) -> OtResult<(JsonOp, JsonOp)> {
    <Json as ComponentOt>::transform_x(left, right)
}

// ── Type ─────────────────────────────────────────────────────────────────

/// The JSON OT type.
#[derive(Debug, Clone, Copy, Default)]
pub struct Json;

impl ComponentOt for Json {
    type Component = JsonComponent;

    fn check_valid_op(op: &[JsonComponent]) -> OtResult<()> {
        check_valid_op(op)
    }

    fn append(dest: &mut JsonOp, c: JsonComponent) {
        append(dest, c);
    }

    fn transform_component(
        dest: &mut JsonOp,
        c: &JsonComponent,
        other: &JsonComponent,
        side: Side,
    ) -> OtResult<()> {
        transform_component(dest, c, other, side)
    }
}

impl OtType for Json {
    const NAME: &'static str = "json";
    type Snapshot = Value;
    type Op = JsonOp;

    fn create(&self) -> Value {
        Value::Null
    }

    fn apply(&self, snapshot: &Value, op: &JsonOp) -> OtResult<Value> {
        apply(snapshot, op)
    }

    fn transform(&self, op: &JsonOp, other: &JsonOp, side: Side) -> OtResult<JsonOp> {
        transform(op, other, side)
    }

    fn compose(&self, op1: &JsonOp, op2: &JsonOp) -> OtResult<JsonOp> {
        check_valid_op(op1)?;
        check_valid_op(op2)?;
        Ok(compose(op1, op2))
    }
}
