use crate::view_model::FeedViewModel;
use crate::{
    AdaptiveConfig, AdvanceGate, ContentType, Effect, EntitySchema, EvictionReport, FetchResult,
    FetchTicket, LoadError, LoadKind, LoadReport, MemoryGovernor, MemoryPolicy, NormalizedStore,
    PageCursor, ProviderError, ProviderFailure,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadState {
    #[default]
    Idle,
    LoadingInitial,
    LoadingMore,
    /// Terminal until refresh.
    Error,
    /// No more pages in this session.
    Exhausted,
}

impl LoadState {
    pub fn is_loading(self) -> bool {
        matches!(self, LoadState::LoadingInitial | LoadState::LoadingMore)
    }
}

/// State of one paginated list view.
///
/// Only `update` mutates it, which makes the store single-writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedState {
    config: AdaptiveConfig,
    schema: EntitySchema,
    governor: MemoryGovernor,
    store: NormalizedStore,
    cursor: PageCursor,
    load_state: LoadState,
    epoch: u64,
    in_flight: Option<FetchTicket>,
    last_error: Option<LoadError>,
    last_eviction: Option<EvictionReport>,
    dirty: bool,
}

impl Default for FeedState {
    fn default() -> Self {
        Self::new(AdaptiveConfig::default(), EntitySchema::campaign())
    }
}

impl FeedState {
    pub fn new(config: AdaptiveConfig, schema: EntitySchema) -> Self {
        Self {
            config,
            schema,
            governor: MemoryGovernor::new(MemoryPolicy::for_page_size(config.page_size)),
            store: NormalizedStore::new(),
            cursor: PageCursor::default(),
            load_state: LoadState::Idle,
            epoch: 0,
            in_flight: None,
            last_error: None,
            last_eviction: None,
            dirty: false,
        }
    }

    pub fn for_content_type(content_type: ContentType, config: AdaptiveConfig) -> Self {
        Self::new(config, content_type.default_schema())
    }

    pub fn with_memory_policy(mut self, policy: MemoryPolicy) -> Self {
        self.governor = MemoryGovernor::new(policy);
        self
    }

    pub fn config(&self) -> &AdaptiveConfig {
        &self.config
    }

    pub fn schema(&self) -> &EntitySchema {
        &self.schema
    }

    pub fn memory_policy(&self) -> MemoryPolicy {
        self.governor.policy()
    }

    pub fn store(&self) -> &NormalizedStore {
        &self.store
    }

    pub fn cursor(&self) -> PageCursor {
        self.cursor
    }

    pub fn load_state(&self) -> LoadState {
        self.load_state
    }

    pub fn has_more(&self) -> bool {
        self.cursor.has_more
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn in_flight(&self) -> Option<FetchTicket> {
        self.in_flight
    }

    pub fn last_error(&self) -> Option<&LoadError> {
        self.last_error.as_ref()
    }

    pub fn last_eviction(&self) -> Option<EvictionReport> {
        self.last_eviction
    }

    pub fn gate(&self) -> AdvanceGate {
        AdvanceGate {
            has_more: self.cursor.has_more,
            load_state: self.load_state,
        }
    }

    pub fn view(&self) -> FeedViewModel {
        FeedViewModel::from_state(self)
    }

    /// Returns whether anything visible changed since the last call.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn start_initial(&mut self) -> Option<FetchTicket> {
        if self.load_state != LoadState::Idle
            || self.cursor.page_number != 0
            || self.in_flight.is_some()
        {
            return None;
        }
        self.load_state = LoadState::LoadingInitial;
        Some(self.issue(LoadKind::Initial))
    }

    pub(crate) fn start_more(&mut self) -> Option<FetchTicket> {
        if self.load_state != LoadState::Idle
            || !self.cursor.has_more
            || self.cursor.page_number == 0
            || self.in_flight.is_some()
        {
            return None;
        }
        self.load_state = LoadState::LoadingMore;
        Some(self.issue(LoadKind::More))
    }

    fn issue(&mut self, kind: LoadKind) -> FetchTicket {
        let ticket = FetchTicket {
            epoch: self.epoch,
            page: self.cursor.next_page(),
            page_size: self.config.page_size,
            kind,
        };
        self.in_flight = Some(ticket);
        self.dirty = true;
        ticket
    }

    /// Starts a new session. Anything still in flight belongs to the old epoch.
    pub(crate) fn reset_session(&mut self) {
        self.store.clear();
        self.cursor = PageCursor::default();
        self.epoch += 1;
        self.load_state = LoadState::Idle;
        self.in_flight = None;
        self.last_error = None;
        self.last_eviction = None;
        self.dirty = true;
    }

    pub(crate) fn complete(
        &mut self,
        ticket: FetchTicket,
        outcome: Result<FetchResult, LoadError>,
    ) -> Vec<Effect> {
        if ticket.epoch != self.epoch || self.in_flight != Some(ticket) {
            return Vec::new();
        }
        self.in_flight = None;
        self.dirty = true;

        match outcome.and_then(|result| self.apply_page(ticket, result)) {
            Ok(report) => vec![Effect::PageApplied(report)],
            Err(error) => {
                self.load_state = LoadState::Error;
                self.cursor.has_more = false;
                self.last_error = Some(error.clone());
                vec![Effect::LoadFailed { ticket, error }]
            }
        }
    }

    fn apply_page(
        &mut self,
        ticket: FetchTicket,
        result: FetchResult,
    ) -> Result<LoadReport, LoadError> {
        if !result.success {
            let message = result
                .error
                .unwrap_or_else(|| "request failed".to_string());
            return Err(ProviderError::new(ProviderFailure::Rejected, message).into());
        }
        // Validate the whole page before touching the store.
        let page = self.schema.normalize_page(&result.data)?;
        let items_loaded = page.roots.len();
        let has_more = result.has_more(ticket.page_size);

        let merge = self.store.merge(page);
        let eviction = self.governor.enforce(&mut self.store);
        if eviction.is_some() {
            self.last_eviction = eviction;
        }

        self.cursor = PageCursor {
            page_number: ticket.page,
            has_more,
        };
        self.load_state = if has_more {
            LoadState::Idle
        } else {
            LoadState::Exhausted
        };
        self.last_error = None;

        Ok(LoadReport {
            ticket,
            items_loaded,
            items_in_memory: self.store.total_len(),
            from_cache: result.from_cache,
            has_more,
            merge,
            eviction,
        })
    }
}
