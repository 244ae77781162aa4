use std::time::{Duration, Instant};

use crate::{AdaptiveConfig, LoadState};

/// Snapshot of coordinator state that decides whether an advance may fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdvanceGate {
    pub has_more: bool,
    pub load_state: LoadState,
}

impl AdvanceGate {
    pub fn allows_advance(&self) -> bool {
        self.has_more && !matches!(self.load_state, LoadState::LoadingMore | LoadState::Error)
    }
}

impl Default for AdvanceGate {
    fn default() -> Self {
        Self {
            has_more: true,
            load_state: LoadState::Idle,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerSource {
    Intersection,
    ScrollPoll,
}

/// Request for the next page, emitted when the list end comes into range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewportEvent {
    Advance { source: TriggerSource },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SentinelPhase {
    /// Sentinel outside the observation margin.
    #[default]
    Idle,
    /// Sentinel inside the margin; already emitted for this visit.
    Armed,
}

/// Scroll position of the list container, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScrollMetrics {
    pub scroll_offset: u32,
    pub viewport_extent: u32,
    pub content_extent: u32,
}

impl ScrollMetrics {
    pub fn distance_to_end(&self) -> u32 {
        self.content_extent
            .saturating_sub(self.scroll_offset.saturating_add(self.viewport_extent))
    }

    pub fn is_near_end(&self, threshold: u32) -> bool {
        self.distance_to_end() <= threshold
    }
}

/// Edge-triggered sentinel observer with a debounced scroll-poll fallback.
///
/// Time is passed in by the caller; the tracker never reads a clock.
#[derive(Debug, Clone)]
pub struct SentinelTracker {
    phase: SentinelPhase,
    threshold: u32,
    debounce: Duration,
    pending_scroll: Option<(ScrollMetrics, Instant)>,
}

impl SentinelTracker {
    pub fn new(threshold: u32, debounce: Duration) -> Self {
        Self {
            phase: SentinelPhase::Idle,
            threshold,
            debounce,
            pending_scroll: None,
        }
    }

    pub fn from_config(config: &AdaptiveConfig) -> Self {
        Self::new(config.threshold, Duration::from_millis(config.debounce_ms))
    }

    pub fn phase(&self) -> SentinelPhase {
        self.phase
    }

    /// Feeds an intersection reading. Only the Idle -> Armed edge can emit,
    /// and only when the gate allows it.
    pub fn observe_intersection(
        &mut self,
        intersecting: bool,
        gate: AdvanceGate,
    ) -> Option<ViewportEvent> {
        match (self.phase, intersecting) {
            (SentinelPhase::Idle, true) => {
                self.phase = SentinelPhase::Armed;
                gate.allows_advance().then_some(ViewportEvent::Advance {
                    source: TriggerSource::Intersection,
                })
            }
            (SentinelPhase::Armed, false) => {
                self.phase = SentinelPhase::Idle;
                None
            }
            _ => None,
        }
    }

    /// Records a scroll sample; it is evaluated by `poll` once scrolling settles.
    pub fn observe_scroll(&mut self, metrics: ScrollMetrics, now: Instant) {
        self.pending_scroll = Some((metrics, now));
    }

    /// Emits when the last scroll sample is at least `debounce` old and near
    /// the end. Each sample is evaluated once.
    pub fn poll(&mut self, now: Instant, gate: AdvanceGate) -> Option<ViewportEvent> {
        let (metrics, at) = self.pending_scroll?;
        if now.saturating_duration_since(at) < self.debounce {
            return None;
        }
        self.pending_scroll = None;
        (metrics.is_near_end(self.threshold) && gate.allows_advance()).then_some(
            ViewportEvent::Advance {
                source: TriggerSource::ScrollPoll,
            },
        )
    }

    /// Re-arms the sentinel so the next intersection can emit again.
    pub fn reset(&mut self) {
        self.phase = SentinelPhase::Idle;
        self.pending_scroll = None;
    }
}
