//! Session configuration and workload sizing.

use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Inactivity window after which the next keystroke starts a fresh query.
pub const DEFAULT_TIMEOUT_MS: u64 = 1500;

/// Lower bound on the number of entries a leaf task scans sequentially.
pub const MIN_WORKLOAD: usize = 1000;

/// Upper bound on the number of entries a leaf task scans sequentially.
pub const MAX_WORKLOAD: usize = 2000;

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SessionConfig {
    /// Debounce timeout in milliseconds
    pub timeout_ms: u64,
    /// Keep leading whitespace of the first keystroke instead of absorbing it
    pub allow_leading_spaces: bool,
    /// Overrides `available_parallelism` when sizing the workload threshold
    pub parallelism: Option<usize>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            allow_leading_spaces: false,
            parallelism: None,
        }
    }
}

impl SessionConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = timeout.as_millis().min(u64::MAX as u128) as u64;
        self
    }

    pub fn with_leading_spaces(mut self, allow: bool) -> Self {
        self.allow_leading_spaces = allow;
        self
    }

    pub fn with_parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = Some(parallelism);
        self
    }

    /// Parallelism used for workload sizing, falling back to 1 when unknown
    pub(crate) fn effective_parallelism(&self) -> usize {
        self.parallelism
            .or_else(|| std::thread::available_parallelism().ok().map(|n| n.get()))
            .unwrap_or(1)
            .max(1)
    }
}

/// Number of entries a task scans without forking:
/// `clamp(corpus_len / parallelism, MIN_WORKLOAD, MAX_WORKLOAD)`.
pub fn workload_threshold(corpus_len: usize, parallelism: usize) -> usize {
    (corpus_len / parallelism.max(1)).clamp(MIN_WORKLOAD, MAX_WORKLOAD)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.timeout(), Duration::from_millis(1500));
        assert!(!config.allow_leading_spaces);
        assert_eq!(config.parallelism, None);
        assert!(config.effective_parallelism() >= 1);
    }

    #[test]
    fn test_threshold_clamps_low() {
        assert_eq!(workload_threshold(0, 1), MIN_WORKLOAD);
        assert_eq!(workload_threshold(4, 8), MIN_WORKLOAD);
        assert_eq!(workload_threshold(7999, 8), MIN_WORKLOAD);
    }

    #[test]
    fn test_threshold_clamps_high() {
        assert_eq!(workload_threshold(1_000_000, 1), MAX_WORKLOAD);
        assert_eq!(workload_threshold(1_000_000, 16), MAX_WORKLOAD);
    }

    #[test]
    fn test_threshold_in_range() {
        assert_eq!(workload_threshold(12_000, 8), 1500);
        assert_eq!(workload_threshold(3000, 2), 1500);
    }

    #[test]
    fn test_threshold_holds_for_all_small_inputs() {
        for len in (0..50_000).step_by(997) {
            for parallelism in 1..=32 {
                let expected = (len / parallelism).clamp(MIN_WORKLOAD, MAX_WORKLOAD);
                assert_eq!(workload_threshold(len, parallelism), expected);
            }
        }
    }

    #[test]
    fn test_zero_parallelism_treated_as_one() {
        assert_eq!(workload_threshold(1800, 0), 1800);
        assert_eq!(SessionConfig::default().with_parallelism(0).effective_parallelism(), 1);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_partial_config_uses_defaults() {
        let config: SessionConfig = serde_json::from_str(r#"{"timeout_ms": 300}"#).unwrap();
        assert_eq!(config.timeout(), Duration::from_millis(300));
        assert!(!config.allow_leading_spaces);
        assert_eq!(config.parallelism, None);
    }
}
