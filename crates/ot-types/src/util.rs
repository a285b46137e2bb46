//! Character-indexed string helpers.
//!
//! Every position and length in the OT types counts Unicode scalar values,
//! so these helpers translate char offsets to byte offsets before slicing.

/// Length of `s` in chars.
pub fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Byte offset of char index `pos`, clamped to the end of the string.
pub fn byte_offset(s: &str, pos: usize) -> usize {
    s.char_indices().nth(pos).map_or(s.len(), |(i, _)| i)
}

/// Chars `[start, end)` of `s`; both bounds are clamped like JS `slice`.
pub fn slice(s: &str, start: usize, end: usize) -> &str {
    let from = byte_offset(s, start);
    if end <= start {
        return &s[from..from];
    }
    let to = from + byte_offset(&s[from..], end - start);
    &s[from..to]
}

/// Chars from `start` to the end of `s`.
pub fn slice_from(s: &str, start: usize) -> &str {
    &s[byte_offset(s, start)..]
}

/// `s1` with `s2` inserted at char `pos`.
pub fn inject(s1: &str, pos: usize, s2: &str) -> String {
    let at = byte_offset(s1, pos);
    let mut out = String::with_capacity(s1.len() + s2.len());
    out.push_str(&s1[..at]);
    out.push_str(s2);
    out.push_str(&s1[at..]);
    out
}

/// `s` with `len` chars removed starting at char `pos`.
pub fn remove(s: &str, pos: usize, len: usize) -> String {
    let from = byte_offset(s, pos);
    let to = from + byte_offset(&s[from..], len);
    let mut out = String::with_capacity(s.len());
    out.push_str(&s[..from]);
    out.push_str(&s[to..]);
    out
}
