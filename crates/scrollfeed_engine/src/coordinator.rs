use std::sync::Arc;
use std::time::{Duration, Instant};

use feed_logging::{feed_debug, feed_info, feed_warn};
use futures_util::future::BoxFuture;
use futures_util::stream::{FuturesUnordered, StreamExt};
use scrollfeed_core::{
    update, AdaptiveConfig, AdvanceGate, Effect, EntitySchema, FeedState, FeedViewModel,
    FetchResult, FetchTicket, LoadError, LoadReport, LoadState, MemoryPolicy, Msg, ViewportEvent,
};
use tokio::sync::watch;

use crate::{
    viewport_signal, ContentProvider, LoadSample, PerformanceRecorder, PerformanceThresholds,
    SentinelHandle, ViewportEvents,
};

struct Completion {
    ticket: FetchTicket,
    outcome: Result<FetchResult, LoadError>,
    latency: Duration,
}

/// Drives one list view: executes the effects of the core state machine
/// against a [`ContentProvider`] and feeds results back in.
///
/// All work happens on the caller's task. Provider calls are futures owned
/// by the coordinator and only make progress while it is awaited
/// (`next_completion`, `settle`, `run`). Dropping the coordinator drops them;
/// a refresh leaves them running and discards their results on arrival.
pub struct FetchCoordinator {
    state: FeedState,
    provider: Arc<dyn ContentProvider>,
    recorder: PerformanceRecorder,
    in_flight: FuturesUnordered<BoxFuture<'static, Completion>>,
    gate_tx: watch::Sender<AdvanceGate>,
}

impl FetchCoordinator {
    pub fn new(
        provider: Arc<dyn ContentProvider>,
        config: AdaptiveConfig,
        schema: EntitySchema,
    ) -> Self {
        Self::from_state(provider, FeedState::new(config, schema))
    }

    pub fn from_state(provider: Arc<dyn ContentProvider>, state: FeedState) -> Self {
        let (gate_tx, _) = watch::channel(state.gate());
        Self {
            state,
            provider,
            recorder: PerformanceRecorder::default(),
            in_flight: FuturesUnordered::new(),
            gate_tx,
        }
    }

    pub fn with_memory_policy(mut self, policy: MemoryPolicy) -> Self {
        self.state = std::mem::take(&mut self.state).with_memory_policy(policy);
        self
    }

    pub fn with_thresholds(mut self, thresholds: PerformanceThresholds) -> Self {
        self.recorder = PerformanceRecorder::new(thresholds);
        self
    }

    pub fn state(&self) -> &FeedState {
        &self.state
    }

    pub fn view(&self) -> FeedViewModel {
        self.state.view()
    }

    pub fn recorder(&self) -> &PerformanceRecorder {
        &self.recorder
    }

    /// Number of provider calls not yet resolved, stale ones included.
    pub fn pending(&self) -> usize {
        self.in_flight.len()
    }

    pub fn gate(&self) -> watch::Receiver<AdvanceGate> {
        self.gate_tx.subscribe()
    }

    /// Creates a sentinel wired to this coordinator's gate and config.
    pub fn attach_sentinel(&self) -> (SentinelHandle, ViewportEvents) {
        viewport_signal(self.state.config(), self.gate())
    }

    pub fn dispatch(&mut self, msg: Msg) {
        self.apply(msg, Duration::ZERO);
    }

    pub fn advance(&mut self, event: ViewportEvent) {
        match event {
            ViewportEvent::Advance { source } => self.dispatch(Msg::Advance { source }),
        }
    }

    /// Dispatches every event already queued, without waiting.
    pub fn drain_events(&mut self, events: &mut ViewportEvents) -> usize {
        let mut drained = 0;
        while let Ok(event) = events.try_recv() {
            self.advance(event);
            drained += 1;
        }
        drained
    }

    /// Waits for one provider call to resolve and applies it.
    /// Returns `false` when nothing was in flight.
    pub async fn next_completion(&mut self) -> bool {
        match self.in_flight.next().await {
            Some(completion) => {
                self.complete(completion);
                true
            }
            None => false,
        }
    }

    /// Waits until no provider call is in flight.
    pub async fn settle(&mut self) {
        while self.next_completion().await {}
    }

    pub async fn load_initial(&mut self) -> Result<(), LoadError> {
        self.dispatch(Msg::LoadInitial);
        self.settle().await;
        self.outcome()
    }

    pub async fn load_more(&mut self) -> Result<(), LoadError> {
        self.dispatch(Msg::LoadMore);
        self.settle().await;
        self.outcome()
    }

    /// Clears the list, invalidates in-flight work and reloads page 1.
    pub async fn refresh(&mut self) -> Result<(), LoadError> {
        self.dispatch(Msg::Refresh);
        self.settle().await;
        self.outcome()
    }

    /// Serves viewport events and provider completions until the event stream
    /// closes. Completions are applied before new triggers.
    pub async fn run(&mut self, events: &mut ViewportEvents) {
        loop {
            tokio::select! {
                biased;
                Some(completion) = self.in_flight.next(), if !self.in_flight.is_empty() => {
                    self.complete(completion);
                }
                event = events.recv() => match event {
                    Some(event) => self.advance(event),
                    None => break,
                },
            }
        }
        feed_debug!("viewport detached with {} call(s) in flight", self.in_flight.len());
    }

    fn outcome(&self) -> Result<(), LoadError> {
        match (self.state.load_state(), self.state.last_error()) {
            (LoadState::Error, Some(error)) => Err(error.clone()),
            _ => Ok(()),
        }
    }

    fn apply(&mut self, msg: Msg, latency: Duration) {
        let state = std::mem::take(&mut self.state);
        let (state, effects) = update(state, msg);
        self.state = state;
        for effect in effects {
            self.execute(effect, latency);
        }
        self.gate_tx.send_replace(self.state.gate());
    }

    fn execute(&mut self, effect: Effect, latency: Duration) {
        match effect {
            Effect::FetchPage(ticket) => self.spawn_fetch(ticket),
            Effect::InvalidateCache => self.provider.invalidate(),
            Effect::PageApplied(report) => self.record(report, latency),
            Effect::LoadFailed { ticket, error } => {
                feed_warn!(
                    "page {} failed (epoch {}): {}; waiting for refresh",
                    ticket.page,
                    ticket.epoch,
                    error
                );
            }
        }
    }

    fn spawn_fetch(&mut self, ticket: FetchTicket) {
        feed_debug!(
            "fetching page {} size {} ({:?}, epoch {})",
            ticket.page,
            ticket.page_size,
            ticket.kind,
            ticket.epoch
        );
        let provider = Arc::clone(&self.provider);
        self.in_flight.push(Box::pin(async move {
            let started = Instant::now();
            let outcome = provider.fetch_page(ticket.page, ticket.page_size).await;
            Completion {
                ticket,
                outcome,
                latency: started.elapsed(),
            }
        }));
    }

    fn complete(&mut self, completion: Completion) {
        let Completion {
            ticket,
            outcome,
            latency,
        } = completion;
        if ticket.epoch != self.state.epoch() {
            feed_debug!(
                "discarding stale page {} from epoch {} (current {})",
                ticket.page,
                ticket.epoch,
                self.state.epoch()
            );
        }
        self.apply(Msg::PageFetched { ticket, outcome }, latency);
    }

    fn record(&mut self, report: LoadReport, latency: Duration) {
        feed_info!(
            "page {} loaded: {} item(s), {} in memory, has_more={}{}",
            report.ticket.page,
            report.items_loaded,
            report.items_in_memory,
            report.has_more,
            if report.from_cache { " (cached)" } else { "" }
        );
        if let Some(eviction) = report.eviction {
            feed_info!(
                "memory cleanup evicted {} entities, {} remain",
                eviction.evicted,
                eviction.remaining
            );
        }
        self.recorder.record(LoadSample {
            kind: report.ticket.kind,
            page: report.ticket.page,
            latency,
            cache_hit: report.from_cache,
            items_loaded: report.items_loaded,
            items_in_memory: report.items_in_memory,
        });
    }
}
