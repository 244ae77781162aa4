use crate::{EvictionReport, FetchTicket, LoadError, MergeStats};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Call the content provider for `ticket.page`.
    FetchPage(FetchTicket),
    /// Drop any cached pages so the next fetch reaches the backend.
    InvalidateCache,
    /// A page was merged into the store.
    PageApplied(LoadReport),
    /// A page failed; the session stays in `LoadState::Error` until refreshed.
    LoadFailed { ticket: FetchTicket, error: LoadError },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReport {
    pub ticket: FetchTicket,
    pub items_loaded: usize,
    pub items_in_memory: usize,
    pub from_cache: bool,
    pub has_more: bool,
    pub merge: MergeStats,
    pub eviction: Option<EvictionReport>,
}
