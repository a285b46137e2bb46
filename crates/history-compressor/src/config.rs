//! Tunables of the compressor.

use std::time::Duration;

use serde::Deserialize;

pub const MAX_TIME_BETWEEN_UPDATES_MS: i64 = 60 * 1000;
pub const MAX_UPDATE_SIZE: usize = 2 * 1024 * 1024;
pub const DIFF_TIMEOUT_MS: u64 = 100;

/// Limits applied while folding updates.
///
/// Every field has a default, so a partial settings table only overrides
/// what it names:
///
/// ```toml
/// max_time_between_updates_ms = 30000
/// diff_timeout_ms = 0
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CompressorConfig {
    /// Longest span, from the first update of a run, that one merged update
    /// may cover.
    pub max_time_between_updates_ms: i64,
    /// Updates merge only while their combined text stays below this many
    /// chars.
    pub max_update_size: usize,
    /// Budget for one delete+insert diff. Zero disables the deadline.
    pub diff_timeout_ms: u64,
}

impl Default for CompressorConfig {
    fn default() -> Self {
        Self {
            max_time_between_updates_ms: MAX_TIME_BETWEEN_UPDATES_MS,
            max_update_size: MAX_UPDATE_SIZE,
            diff_timeout_ms: DIFF_TIMEOUT_MS,
        }
    }
}

impl CompressorConfig {
    pub fn diff_timeout(&self) -> Option<Duration> {
        (self.diff_timeout_ms > 0).then(|| Duration::from_millis(self.diff_timeout_ms))
    }
}
