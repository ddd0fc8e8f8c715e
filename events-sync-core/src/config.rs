use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Upstream page size used when none is configured.
pub const DEFAULT_PAGE_SIZE: u64 = 100;
/// Records processed per check-then-insert batch within a page.
pub const DEFAULT_BATCH_SIZE: usize = 20;

/// How the natural-key lookup treats `None` components.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyMatching {
    /// `None` matches `None` (SQL `IS`). Events lacking a subject, location or
    /// start time are still deduplicated.
    #[default]
    NullSafe,
    /// Plain equality (SQL `=`). A key with any `None` component never
    /// matches, so such events are inserted again on every run.
    Strict,
}

/// Tunables for one sync run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    pub page_size: u64,
    pub batch_size: usize,
    pub key_matching: KeyMatching,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            batch_size: DEFAULT_BATCH_SIZE,
            key_matching: KeyMatching::default(),
        }
    }
}

impl SyncSettings {
    pub fn validate(&self) -> Result<(), String> {
        if self.page_size == 0 {
            return Err("sync.page_size must be at least 1".to_string());
        }
        if self.batch_size == 0 {
            return Err("sync.batch_size must be at least 1".to_string());
        }
        Ok(())
    }

    pub fn trace_loaded(&self) {
        info!(
            page_size = self.page_size,
            batch_size = self.batch_size,
            key_matching = ?self.key_matching,
            "Loaded SyncSettings"
        );
        debug!(?self, "SyncSettings loaded (full debug)");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_upstream_limits() {
        let s = SyncSettings::default();
        assert_eq!(s.page_size, 100);
        assert_eq!(s.batch_size, 20);
        assert_eq!(s.key_matching, KeyMatching::NullSafe);
        assert!(s.validate().is_ok());
    }

    #[test]
    fn zero_sizes_are_rejected() {
        let s = SyncSettings { page_size: 0, ..Default::default() };
        assert!(s.validate().unwrap_err().contains("page_size"));
        let s = SyncSettings { batch_size: 0, ..Default::default() };
        assert!(s.validate().unwrap_err().contains("batch_size"));
    }
}
