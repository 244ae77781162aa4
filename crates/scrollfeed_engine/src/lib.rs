//! Scrollfeed engine: provider IO, page caching, metrics and the async
//! coordinator that executes core effects.
mod cache;
mod coordinator;
mod http;
mod metrics;
mod provider;
mod viewport;
mod wire;

pub use cache::{CacheKey, CacheStats, CachingProvider, PageCache, DEFAULT_CACHE_TTL};
pub use coordinator::FetchCoordinator;
pub use http::{HttpContentProvider, HttpSettings};
pub use metrics::{
    LoadSample, PerformanceRecorder, PerformanceSummary, PerformanceThresholds, PerformanceWarning,
};
pub use provider::ContentProvider;
pub use viewport::{viewport_signal, SentinelHandle, ViewportEvents};
pub use wire::{decode_fetch_result, decode_value};
