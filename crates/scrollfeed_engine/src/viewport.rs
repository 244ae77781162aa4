use std::time::Instant;

use feed_logging::{feed_debug, feed_trace};
use scrollfeed_core::{
    AdaptiveConfig, AdvanceGate, ScrollMetrics, SentinelPhase, SentinelTracker, ViewportEvent,
};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, watch};

/// Receiving side of a viewport signal; the coordinator consumes it.
pub type ViewportEvents = mpsc::Receiver<ViewportEvent>;

/// Pending advance requests beyond this are redundant and dropped.
const EVENT_BUFFER: usize = 8;

/// Creates the sentinel attach point and the event stream it feeds.
pub fn viewport_signal(
    config: &AdaptiveConfig,
    gate: watch::Receiver<AdvanceGate>,
) -> (SentinelHandle, ViewportEvents) {
    let (tx, rx) = mpsc::channel(EVENT_BUFFER);
    let handle = SentinelHandle {
        tracker: SentinelTracker::from_config(config),
        gate,
        events: Some(tx),
    };
    (handle, rx)
}

/// Handle the host renders as the last element of a list.
///
/// The host reports intersection changes and scroll positions; the handle
/// turns them into typed [`ViewportEvent`]s. The host owns placement only.
pub struct SentinelHandle {
    tracker: SentinelTracker,
    gate: watch::Receiver<AdvanceGate>,
    events: Option<mpsc::Sender<ViewportEvent>>,
}

impl SentinelHandle {
    /// Intersection observer callback. Returns whether an advance was emitted.
    pub fn intersection(&mut self, intersecting: bool) -> bool {
        if self.events.is_none() {
            return false;
        }
        let gate = *self.gate.borrow();
        let event = self.tracker.observe_intersection(intersecting, gate);
        self.emit(event)
    }

    /// Scroll-poll fallback for hosts without intersection observation.
    pub fn scroll(&mut self, metrics: ScrollMetrics) {
        self.scroll_at(metrics, Instant::now());
    }

    pub fn scroll_at(&mut self, metrics: ScrollMetrics, now: Instant) {
        if self.events.is_some() {
            self.tracker.observe_scroll(metrics, now);
        }
    }

    /// Evaluates a settled scroll sample. Hosts call this from their frame or
    /// timer tick. Returns whether an advance was emitted.
    pub fn tick(&mut self) -> bool {
        self.tick_at(Instant::now())
    }

    pub fn tick_at(&mut self, now: Instant) -> bool {
        if self.events.is_none() {
            return false;
        }
        let gate = *self.gate.borrow();
        let event = self.tracker.poll(now, gate);
        self.emit(event)
    }

    pub fn reset(&mut self) {
        self.tracker.reset();
    }

    pub fn phase(&self) -> SentinelPhase {
        self.tracker.phase()
    }

    /// Stops emitting. The coordinator's run loop ends once the stream closes.
    pub fn detach(&mut self) {
        self.events = None;
    }

    pub fn is_attached(&self) -> bool {
        self.events.is_some()
    }

    fn emit(&self, event: Option<ViewportEvent>) -> bool {
        let (Some(event), Some(events)) = (event, self.events.as_ref()) else {
            return false;
        };
        feed_trace!("viewport event {:?}", event);
        match events.try_send(event) {
            Ok(()) => true,
            // A full buffer already holds an advance; another one would be a no-op.
            Err(TrySendError::Full(_)) => true,
            Err(TrySendError::Closed(_)) => {
                feed_debug!("viewport event dropped, coordinator is gone");
                false
            }
        }
    }
}
