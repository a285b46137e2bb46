//! Semantic cleanup of a raw diff.
//!
//! A minimal diff often splits edits on coincidental one-char equalities.
//! These passes trade minimality for edits that line up with words and
//! lines, which keeps the delete+insert pairs in history readable.

use super::myers::{cleanup_merge, common_suffix, suffix_prefix_overlap, Change, Patch};

/// Eliminate equalities too short to be worth keeping between edits, then
/// realign edits to word boundaries and split delete/insert overlaps.
pub fn cleanup_semantic(patch: &mut Patch) {
    let mut changes = false;
    let mut equalities: Vec<usize> = Vec::new();
    let mut last_equality: Option<usize> = None;
    let mut pointer = 0usize;
    // Edit lengths before and after the last equality.
    let mut len_ins1 = 0usize;
    let mut len_del1 = 0usize;
    let mut len_ins2 = 0usize;
    let mut len_del2 = 0usize;

    while pointer < patch.len() {
        let (op_type, ref text) = patch[pointer];
        let len = text.chars().count();
        if op_type == Change::Keep {
            equalities.push(pointer);
            len_ins1 = len_ins2;
            len_del1 = len_del2;
            len_ins2 = 0;
            len_del2 = 0;
            last_equality = Some(len);
            pointer += 1;
            continue;
        }

        if op_type == Change::Insert {
            len_ins2 += len;
        } else {
            len_del2 += len;
        }

        let Some(eq_len) = last_equality else {
            pointer += 1;
            continue;
        };
        if eq_len > len_ins1.max(len_del1) || eq_len > len_ins2.max(len_del2) {
            pointer += 1;
            continue;
        }
        let Some(eq_idx) = equalities.pop() else {
            pointer += 1;
            continue;
        };

        // Turn the equality into a delete followed by an insert.
        let text = patch[eq_idx].1.clone();
        patch.insert(eq_idx, (Change::Delete, text));
        patch[eq_idx + 1].0 = Change::Insert;
        // The equality before it may now be worth eliminating too.
        equalities.pop();
        pointer = equalities.last().map_or(0, |&p| p + 1);
        len_ins1 = 0;
        len_del1 = 0;
        len_ins2 = 0;
        len_del2 = 0;
        last_equality = None;
        changes = true;
    }

    if changes {
        cleanup_merge(patch);
    }
    cleanup_semantic_lossless(patch);
    split_overlaps(patch);
}

/// Where a delete meets an insert that starts with the delete's tail (or
/// ends with its head), pull the shared text out as an equality when it
/// covers at least half of either edit.
fn split_overlaps(patch: &mut Patch) {
    let mut pointer = 1usize;
    while pointer < patch.len() {
        if patch[pointer - 1].0 == Change::Delete && patch[pointer].0 == Change::Insert {
            let deletion: Vec<char> = patch[pointer - 1].1.chars().collect();
            let insertion: Vec<char> = patch[pointer].1.chars().collect();
            let ov1 = suffix_prefix_overlap(&patch[pointer - 1].1, &patch[pointer].1);
            let ov2 = suffix_prefix_overlap(&patch[pointer].1, &patch[pointer - 1].1);
            if ov1 >= ov2 {
                if ov1 > 0 && (ov1 * 2 >= deletion.len() || ov1 * 2 >= insertion.len()) {
                    patch[pointer - 1].1 = deletion[..deletion.len() - ov1].iter().collect();
                    patch.insert(pointer, (Change::Keep, insertion[..ov1].iter().collect()));
                    patch[pointer + 1].1 = insertion[ov1..].iter().collect();
                    pointer += 1;
                }
            } else if ov2 * 2 >= deletion.len() || ov2 * 2 >= insertion.len() {
                // Reverse overlap: insert first, then delete.
                patch[pointer - 1] = (Change::Insert, insertion[..insertion.len() - ov2].iter().collect());
                patch.insert(pointer, (Change::Keep, deletion[..ov2].iter().collect()));
                patch[pointer + 1] = (Change::Delete, deletion[ov2..].iter().collect());
                pointer += 1;
            }
            pointer += 1;
        }
        pointer += 1;
    }
}

/// How well the boundary between `one` and `two` falls on a natural break;
/// 6 is best (an edge of the text), 0 is mid-word.
fn semantic_score(one: &str, two: &str) -> u8 {
    let (Some(char1), Some(char2)) = (one.chars().last(), two.chars().next()) else {
        return 6;
    };
    let non_alnum1 = !char1.is_alphanumeric();
    let non_alnum2 = !char2.is_alphanumeric();
    let ws1 = non_alnum1 && char1.is_whitespace();
    let ws2 = non_alnum2 && char2.is_whitespace();
    let lb1 = ws1 && (char1 == '\r' || char1 == '\n');
    let lb2 = ws2 && (char2 == '\r' || char2 == '\n');
    let blank1 = lb1 && (one.ends_with("\n\r\n") || one.ends_with("\n\n"));
    let blank2 = lb2 && ["\n\n", "\n\r\n", "\r\n\n", "\r\n\r\n"].iter().any(|p| two.starts_with(p));
    if blank1 || blank2 {
        5
    } else if lb1 || lb2 {
        4
    } else if non_alnum1 && !ws1 && ws2 {
        // End of a sentence.
        3
    } else if ws1 || ws2 {
        2
    } else if non_alnum1 || non_alnum2 {
        1
    } else {
        0
    }
}

/// Slide single edits surrounded by equalities to the best scoring
/// boundary, e.g. `The c<ins>at c</ins>ame.` to `The <ins>cat </ins>came.`
fn cleanup_semantic_lossless(patch: &mut Patch) {
    let mut pointer = 1usize;
    while pointer + 1 < patch.len() {
        if patch[pointer - 1].0 != Change::Keep || patch[pointer + 1].0 != Change::Keep {
            pointer += 1;
            continue;
        }

        let mut eq1: Vec<char> = patch[pointer - 1].1.chars().collect();
        let mut edit: Vec<char> = patch[pointer].1.chars().collect();
        let mut eq2: Vec<char> = patch[pointer + 1].1.chars().collect();

        // Shift the edit as far left as possible.
        let common = common_suffix(&patch[pointer - 1].1, &patch[pointer].1);
        if common > 0 {
            let tail: Vec<char> = edit[edit.len() - common..].to_vec();
            eq1.truncate(eq1.len() - common);
            edit = tail.iter().chain(&edit[..edit.len() - common]).copied().collect();
            eq2 = tail.into_iter().chain(eq2).collect();
        }

        // Then step right, keeping the best scoring split.
        let as_string = |chars: &[char]| chars.iter().collect::<String>();
        let mut best = (as_string(&eq1), as_string(&edit), as_string(&eq2));
        let mut best_score = semantic_score(&best.0, &best.1) + semantic_score(&best.1, &best.2);
        while !edit.is_empty() && !eq2.is_empty() && edit[0] == eq2[0] {
            let c = edit.remove(0);
            eq1.push(c);
            edit.push(c);
            eq2.remove(0);
            let candidate = (as_string(&eq1), as_string(&edit), as_string(&eq2));
            let score = semantic_score(&candidate.0, &candidate.1) + semantic_score(&candidate.1, &candidate.2);
            // `>=` favours the rightmost of equally good splits.
            if score >= best_score {
                best_score = score;
                best = candidate;
            }
        }

        let (best_eq1, best_edit, best_eq2) = best;
        if patch[pointer - 1].1 != best_eq1 {
            if best_eq1.is_empty() {
                patch.remove(pointer - 1);
                pointer -= 1;
            } else {
                patch[pointer - 1].1 = best_eq1;
            }
            patch[pointer].1 = best_edit;
            if best_eq2.is_empty() {
                patch.remove(pointer + 1);
                pointer = pointer.saturating_sub(1);
            } else {
                patch[pointer + 1].1 = best_eq2;
            }
        }
        pointer += 1;
    }
}
