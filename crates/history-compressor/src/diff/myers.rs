//! Char-level Myers diff.
//!
//! Offsets count chars, the unit history ops use for `p`. The search can be
//! cut short by a deadline; the result is then still a valid patch, only a
//! coarser one.

use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    Delete,
    Keep,
    Insert,
}

/// Runs of kept, deleted and inserted text, in document order.
pub type Patch = Vec<(Change, String)>;

pub fn common_prefix(a: &str, b: &str) -> usize {
    prefix_len(&a.chars().collect::<Vec<_>>(), &b.chars().collect::<Vec<_>>())
}

pub fn common_suffix(a: &str, b: &str) -> usize {
    suffix_len(&a.chars().collect::<Vec<_>>(), &b.chars().collect::<Vec<_>>())
}

/// How many chars at the end of `head` also start `tail`.
pub fn suffix_prefix_overlap(head: &str, tail: &str) -> usize {
    let head: Vec<char> = head.chars().collect();
    let tail: Vec<char> = tail.chars().collect();
    let max = head.len().min(tail.len());
    (1..=max)
        .rev()
        .find(|&n| head[head.len() - n..] == tail[..n])
        .unwrap_or(0)
}

/// Diff `before` against `after`. Past `deadline` the unsearched middle is
/// reported as a plain delete and insert.
pub fn diff(before: &str, after: &str, deadline: Option<Instant>) -> Patch {
    let before: Vec<char> = before.chars().collect();
    let after: Vec<char> = after.chars().collect();
    diff_slices(&before, &after, deadline)
}

/// Text on the left-hand side of `patch`.
pub fn before_text(patch: &Patch) -> String {
    side_text(patch, Change::Insert)
}

/// Text on the right-hand side of `patch`.
pub fn after_text(patch: &Patch) -> String {
    side_text(patch, Change::Delete)
}

fn side_text(patch: &Patch, skip: Change) -> String {
    patch.iter().filter(|(change, _)| *change != skip).map(|(_, s)| s.as_str()).collect()
}

fn prefix_len(a: &[char], b: &[char]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

fn suffix_len(a: &[char], b: &[char]) -> usize {
    a.iter().rev().zip(b.iter().rev()).take_while(|(x, y)| x == y).count()
}

fn text(chars: &[char]) -> String {
    chars.iter().collect()
}

fn replace(a: &[char], b: &[char]) -> Patch {
    let mut patch = Patch::new();
    if !a.is_empty() {
        patch.push((Change::Delete, text(a)));
    }
    if !b.is_empty() {
        patch.push((Change::Insert, text(b)));
    }
    patch
}

fn position(haystack: &[char], needle: &[char]) -> Option<usize> {
    if needle.len() > haystack.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn diff_slices(a: &[char], b: &[char], deadline: Option<Instant>) -> Patch {
    if a == b {
        return if a.is_empty() { Patch::new() } else { vec![(Change::Keep, text(a))] };
    }

    let head = prefix_len(a, b);
    let tail = suffix_len(&a[head..], &b[head..]);
    let middle_a = &a[head..a.len() - tail];
    let middle_b = &b[head..b.len() - tail];

    let mut patch = Patch::new();
    if head > 0 {
        patch.push((Change::Keep, text(&a[..head])));
    }
    patch.extend(diff_middle(middle_a, middle_b, deadline));
    if tail > 0 {
        patch.push((Change::Keep, text(&a[a.len() - tail..])));
    }
    cleanup_merge(&mut patch);
    patch
}

/// Diff two texts that share no prefix or suffix.
fn diff_middle(a: &[char], b: &[char], deadline: Option<Instant>) -> Patch {
    if a.is_empty() || b.is_empty() {
        return replace(a, b);
    }

    // One text inside the other: a single edit on each side of it.
    let (outer, inner, edit) = if a.len() > b.len() { (a, b, Change::Delete) } else { (b, a, Change::Insert) };
    if let Some(at) = position(outer, inner) {
        let mut patch = Patch::new();
        if at > 0 {
            patch.push((edit, text(&outer[..at])));
        }
        patch.push((Change::Keep, text(inner)));
        if at + inner.len() < outer.len() {
            patch.push((edit, text(&outer[at + inner.len()..])));
        }
        return patch;
    }
    if inner.len() == 1 {
        return replace(a, b);
    }

    match middle_snake(a, b, deadline) {
        Some((x, y)) => {
            let mut patch = diff_slices(&a[..x], &b[..y], deadline);
            patch.extend(diff_slices(&a[x..], &b[y..], deadline));
            patch
        }
        None => replace(a, b),
    }
}

/// Furthest-reaching paths per diagonal for one search direction.
struct Frontier {
    reach: Vec<isize>,
    offset: isize,
    // Diagonals that ran off the grid shrink the range still searched.
    skip_low: isize,
    skip_high: isize,
}

impl Frontier {
    fn new(max_d: isize) -> Self {
        let mut reach = vec![-1; (2 * max_d) as usize];
        reach[(max_d + 1) as usize] = 0;
        Self { reach, offset: max_d, skip_low: 0, skip_high: 0 }
    }

    /// x at which diagonal `k` starts for edit distance `d`, before
    /// following matching chars.
    fn start(&self, k: isize, d: isize) -> isize {
        let i = (self.offset + k) as usize;
        if k == -d || (k != d && self.reach[i - 1] < self.reach[i + 1]) {
            self.reach[i + 1]
        } else {
            self.reach[i - 1] + 1
        }
    }

    fn set(&mut self, k: isize, x: isize) {
        self.reach[(self.offset + k) as usize] = x;
    }

    /// Reach stored at raw slot `slot`, if that diagonal has been visited.
    fn at_slot(&self, slot: isize) -> Option<isize> {
        usize::try_from(slot).ok().and_then(|i| self.reach.get(i)).copied().filter(|&x| x != -1)
    }
}

/// Point `(x, y)` where the forward and reverse searches meet, or `None`
/// when the deadline passes or the texts share nothing.
fn middle_snake(a: &[char], b: &[char], deadline: Option<Instant>) -> Option<(usize, usize)> {
    let n = a.len() as isize;
    let m = b.len() as isize;
    let max_d = (n + m + 1) / 2;
    let delta = n - m;
    // With an odd delta the paths meet during a forward step.
    let meets_forward = delta % 2 != 0;
    let mut fwd = Frontier::new(max_d);
    let mut rev = Frontier::new(max_d);

    for d in 0..max_d {
        if deadline.is_some_and(|t| Instant::now() > t) {
            return None;
        }

        let mut k = -d + fwd.skip_low;
        while k <= d - fwd.skip_high {
            let mut x = fwd.start(k, d);
            let mut y = x - k;
            while x < n && y < m && a[x as usize] == b[y as usize] {
                x += 1;
                y += 1;
            }
            fwd.set(k, x);
            if x > n {
                fwd.skip_high += 2;
            } else if y > m {
                fwd.skip_low += 2;
            } else if meets_forward {
                if let Some(rx) = rev.at_slot(max_d + delta - k) {
                    if x >= n - rx {
                        return Some((x as usize, y as usize));
                    }
                }
            }
            k += 2;
        }

        let mut k = -d + rev.skip_low;
        while k <= d - rev.skip_high {
            let mut x = rev.start(k, d);
            let mut y = x - k;
            while x < n && y < m && a[(n - x - 1) as usize] == b[(m - y - 1) as usize] {
                x += 1;
                y += 1;
            }
            rev.set(k, x);
            if x > n {
                rev.skip_high += 2;
            } else if y > m {
                rev.skip_low += 2;
            } else if !meets_forward {
                let slot = max_d + delta - k;
                if let Some(fx) = fwd.at_slot(slot) {
                    let fy = max_d + fx - slot;
                    if fx >= n - x {
                        return Some((fx as usize, fy as usize));
                    }
                }
            }
            k += 2;
        }
    }
    None
}

/// Normalize a patch: drop empty runs, join neighbouring runs of the same
/// kind, pull text shared by a delete and insert pair out into the equal
/// runs around it, and slide a lone edit across an equal run when that
/// lets two equal runs join.
pub(crate) fn cleanup_merge(patch: &mut Patch) {
    // Sentinel so the last edit run is flushed.
    patch.push((Change::Keep, String::new()));
    let mut i = 0usize;
    let mut deletes = 0usize;
    let mut inserts = 0usize;
    let mut deleted: Vec<char> = Vec::new();
    let mut inserted: Vec<char> = Vec::new();

    while i < patch.len() {
        if i + 1 < patch.len() && patch[i].1.is_empty() {
            patch.remove(i);
            continue;
        }
        match patch[i].0 {
            Change::Insert => {
                inserts += 1;
                inserted.extend(patch[i].1.chars());
                i += 1;
                continue;
            }
            Change::Delete => {
                deletes += 1;
                deleted.extend(patch[i].1.chars());
                i += 1;
                continue;
            }
            Change::Keep => {}
        }

        if deletes + inserts > 0 {
            if !deleted.is_empty() && !inserted.is_empty() {
                let shared = prefix_len(&inserted, &deleted);
                if shared > 0 {
                    let moved = text(&inserted[..shared]);
                    let run_start = i - deletes - inserts;
                    match run_start.checked_sub(1) {
                        Some(before) if patch[before].0 == Change::Keep => patch[before].1.push_str(&moved),
                        _ => {
                            patch.insert(0, (Change::Keep, moved));
                            i += 1;
                        }
                    }
                    inserted.drain(..shared);
                    deleted.drain(..shared);
                }
                let shared = suffix_len(&inserted, &deleted);
                if shared > 0 {
                    patch[i].1.insert_str(0, &text(&inserted[inserted.len() - shared..]));
                    inserted.truncate(inserted.len() - shared);
                    deleted.truncate(deleted.len() - shared);
                }
            }

            let run_start = i - deletes - inserts;
            let merged = replace(&deleted, &inserted);
            let len = merged.len();
            patch.splice(run_start..i, merged);
            i = run_start + len;
        }

        if i > 0 && patch[i - 1].0 == Change::Keep {
            let joined = patch.remove(i).1;
            patch[i - 1].1.push_str(&joined);
        } else {
            i += 1;
        }
        deletes = 0;
        inserts = 0;
        deleted.clear();
        inserted.clear();
    }
    if patch.last().is_some_and(|(_, s)| s.is_empty()) {
        patch.pop();
    }

    let mut slid = false;
    let mut i = 1usize;
    while i + 1 < patch.len() {
        if patch[i - 1].0 != Change::Keep || patch[i + 1].0 != Change::Keep {
            i += 1;
            continue;
        }
        let before: Vec<char> = patch[i - 1].1.chars().collect();
        let edit: Vec<char> = patch[i].1.chars().collect();
        let after: Vec<char> = patch[i + 1].1.chars().collect();

        if edit.ends_with(&before) {
            // A<ins>BA</ins>C becomes <ins>AB</ins>AC.
            patch[i].1 = before.iter().chain(&edit[..edit.len() - before.len()]).collect();
            patch[i + 1].1 = before.iter().chain(&after).collect();
            patch.remove(i - 1);
            slid = true;
        } else if edit.starts_with(&after) {
            // A<ins>CB</ins>C becomes AC<ins>BC</ins>.
            patch[i - 1].1 = before.iter().chain(&after).collect();
            patch[i].1 = edit[after.len()..].iter().chain(&after).collect();
            patch.remove(i + 1);
            slid = true;
            i += 1;
        } else {
            i += 1;
        }
    }
    if slid {
        cleanup_merge(patch);
    }
}
