use crate::NormalizedStore;

pub const DEFAULT_CLEANUP_THRESHOLD: usize = 300;

/// Page multiple kept after a cleanup.
const KEEP_RECENT_PAGES: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryPolicy {
    /// Cleanup runs once the store holds more than this many entities. 0 disables it.
    pub cleanup_threshold: usize,
    /// Number of most recently fetched entities that survive a cleanup.
    pub keep_recent: usize,
}

impl MemoryPolicy {
    pub fn for_page_size(page_size: usize) -> Self {
        Self {
            cleanup_threshold: DEFAULT_CLEANUP_THRESHOLD,
            keep_recent: page_size * KEEP_RECENT_PAGES,
        }
    }

    pub fn disabled() -> Self {
        Self {
            cleanup_threshold: 0,
            keep_recent: 0,
        }
    }

    /// Upper bound on the store size after every enforcement.
    pub fn ceiling(&self) -> usize {
        self.keep_recent.max(self.cleanup_threshold)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvictionReport {
    pub evicted: usize,
    pub remaining: usize,
}

/// Bounds the store size during long scroll sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryGovernor {
    policy: MemoryPolicy,
}

impl MemoryGovernor {
    pub fn new(policy: MemoryPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> MemoryPolicy {
        self.policy
    }

    /// Evicts the oldest-fetched entities once the threshold is crossed,
    /// keeping the `keep_recent` newest arrivals.
    pub fn enforce(&self, store: &mut NormalizedStore) -> Option<EvictionReport> {
        if self.policy.cleanup_threshold == 0 {
            return None;
        }
        let total = store.total_len();
        if total <= self.policy.cleanup_threshold {
            return None;
        }
        let excess = total.saturating_sub(self.policy.keep_recent);
        if excess == 0 {
            return None;
        }
        let evicted = store.evict_oldest(excess);
        Some(EvictionReport {
            evicted,
            remaining: store.total_len(),
        })
    }
}
