//! Seeded random generators for operational transformation fuzz tests.
//!
//! Every [`Fuzzer`] is driven by a xoshiro256** PRNG. A failing randomized
//! test prints its seed, and `Fuzzer::new(Some(seed))` replays the exact same
//! sequence of documents and operations.
//!
//! ```
//! use ot_fuzzer::Fuzzer;
//!
//! let mut fuzzer = Fuzzer::from_u64(7);
//! let text = fuzzer.text(1, 8);
//! let pos = fuzzer.index(text.chars().count() + 1);
//! assert!(pos <= text.chars().count());
//! ```

use rand::{rngs::OsRng, Rng, RngCore, SeedableRng};
use rand_xoshiro::Xoshiro256StarStar;

/// Characters used for generated text. Includes a couple of non-ASCII scalar
/// values so position arithmetic is exercised on multi-byte characters.
pub const DEFAULT_ALPHABET: &str = "abcdefghij xyz\né✓";

pub struct Fuzzer {
    seed: [u8; 32],
    rng: Xoshiro256StarStar,
    alphabet: Vec<char>,
}

impl Fuzzer {
    /// Create a fuzzer from an explicit seed, or from `OsRng` when `None`.
    pub fn new(seed: Option<[u8; 32]>) -> Self {
        let seed = seed.unwrap_or_else(|| {
            let mut bytes = [0u8; 32];
            OsRng.fill_bytes(&mut bytes);
            bytes
        });
        Self {
            seed,
            rng: Xoshiro256StarStar::from_seed(seed),
            alphabet: DEFAULT_ALPHABET.chars().collect(),
        }
    }

    /// Create a fuzzer whose seed is derived from a single integer.
    pub fn from_u64(seed: u64) -> Self {
        let mut bytes = [0u8; 32];
        for (i, chunk) in bytes.chunks_mut(8).enumerate() {
            let word = seed.rotate_left(i as u32 * 16) ^ (i as u64).wrapping_mul(0x9e37_79b9_7f4a_7c15);
            chunk.copy_from_slice(&word.to_le_bytes());
        }
        Self::new(Some(bytes))
    }

    /// Replace the alphabet used by [`Fuzzer::text`]. Empty alphabets are ignored.
    pub fn with_alphabet(mut self, alphabet: &str) -> Self {
        let chars: Vec<char> = alphabet.chars().collect();
        if !chars.is_empty() {
            self.alphabet = chars;
        }
        self
    }

    pub fn seed(&self) -> [u8; 32] {
        self.seed
    }

    /// Uniform integer in `[min, max]` (inclusive). Returns `min` when the
    /// range is empty.
    pub fn int(&mut self, min: usize, max: usize) -> usize {
        if max <= min {
            return min;
        }
        self.rng.gen_range(min..=max)
    }

    /// Uniform index in `[0, len)`; `0` for an empty range.
    pub fn index(&mut self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        self.rng.gen_range(0..len)
    }

    /// `true` with the given probability (clamped to `[0, 1]`).
    pub fn chance(&mut self, probability: f64) -> bool {
        self.rng.gen_bool(probability.clamp(0.0, 1.0))
    }

    /// Pick one element of a non-empty slice.
    pub fn pick<'a, T>(&mut self, elements: &'a [T]) -> Option<&'a T> {
        if elements.is_empty() {
            return None;
        }
        let idx = self.rng.gen_range(0..elements.len());
        elements.get(idx)
    }

    /// Random text whose length in characters lies in `[min_len, max_len]`.
    pub fn text(&mut self, min_len: usize, max_len: usize) -> String {
        let len = self.int(min_len, max_len);
        let alphabet = &self.alphabet;
        let rng = &mut self.rng;
        (0..len)
            .map(|_| alphabet[rng.gen_range(0..alphabet.len())])
            .collect()
    }

    /// Random `(start, len)` span inside a sequence of `total` units, with
    /// `len` at most `max_len` and at least one unit when `total > 0`.
    pub fn span(&mut self, total: usize, max_len: usize) -> (usize, usize) {
        if total == 0 {
            return (0, 0);
        }
        let start = self.index(total);
        let len = self.int(1, max_len.max(1).min(total - start));
        (start, len)
    }

    /// Collect `times` values produced by `callback`.
    pub fn repeat<T, F>(&mut self, times: usize, mut callback: F) -> Vec<T>
    where
        F: FnMut(&mut Self) -> T,
    {
        (0..times).map(|_| callback(self)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn same_seed_same_sequence() {
        let mut a = Fuzzer::from_u64(42);
        let mut b = Fuzzer::from_u64(42);
        for _ in 0..20 {
            assert_eq!(a.int(0, 1000), b.int(0, 1000));
            assert_eq!(a.text(0, 5), b.text(0, 5));
        }
    }

    #[test]
    fn empty_ranges_are_safe() {
        let mut f = Fuzzer::from_u64(1);
        assert_eq!(f.int(3, 3), 3);
        assert_eq!(f.int(5, 2), 5);
        assert_eq!(f.index(0), 0);
        assert_eq!(f.span(0, 4), (0, 0));
        assert!(f.pick::<u8>(&[]).is_none());
    }

    #[test]
    fn custom_alphabet_is_used() {
        let mut f = Fuzzer::from_u64(9).with_alphabet("q");
        assert_eq!(f.text(4, 4), "qqqq");
    }

    proptest! {
        #[test]
        fn span_stays_in_bounds(seed in any::<u64>(), total in 1usize..50, max_len in 1usize..10) {
            let mut f = Fuzzer::from_u64(seed);
            let (start, len) = f.span(total, max_len);
            prop_assert!(len >= 1);
            prop_assert!(len <= max_len);
            prop_assert!(start + len <= total);
        }

        #[test]
        fn text_length_in_range(seed in any::<u64>(), min in 0usize..5, extra in 0usize..5) {
            let mut f = Fuzzer::from_u64(seed);
            let len = f.text(min, min + extra).chars().count();
            prop_assert!(len >= min && len <= min + extra);
        }
    }
}
