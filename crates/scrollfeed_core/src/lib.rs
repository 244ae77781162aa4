//! Scrollfeed core: pure paging state machine, normalized entity store and
//! adaptive sizing rules.
mod adaptive;
mod effect;
mod entity;
mod error;
mod governor;
mod msg;
mod page;
mod schema;
mod sentinel;
mod state;
mod store;
mod update;
mod view_model;

pub use adaptive::{
    AdaptiveConfig, AdaptiveConfigResolver, ConfigOverrides, ConnectionClass, ContentType,
    EnvironmentProbe, RootMargin, StaticProbe, NARROW_VIEWPORT_MAX_WIDTH,
};
pub use effect::{Effect, LoadReport};
pub use entity::{Entity, EntityId, EntityKind, EntityRef};
pub use error::{ConfigError, LoadError, ProviderError, ProviderFailure, ShapeError};
pub use governor::{EvictionReport, MemoryGovernor, MemoryPolicy, DEFAULT_CLEANUP_THRESHOLD};
pub use msg::Msg;
pub use page::{FetchResult, FetchTicket, LoadKind, PageCursor, Pagination};
pub use schema::{EntitySchema, NormalizedPage};
pub use sentinel::{
    AdvanceGate, ScrollMetrics, SentinelPhase, SentinelTracker, TriggerSource, ViewportEvent,
};
pub use state::{FeedState, LoadState};
pub use store::{MergeStats, NormalizedStore};
pub use update::update;
pub use view_model::FeedViewModel;
