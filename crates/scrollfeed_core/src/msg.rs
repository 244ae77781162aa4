use crate::{FetchResult, FetchTicket, LoadError, TriggerSource};

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// List view mounted; load page 1 of a fresh session.
    LoadInitial,
    /// Explicit request for the next page.
    LoadMore,
    /// The viewport signal saw the list end come into range.
    Advance { source: TriggerSource },
    /// User asked to start over (also the retry path after an error).
    Refresh,
    /// Like `Refresh`, but cached pages may answer the reload.
    Reset,
    /// A provider call finished. `ticket` is the one issued at dispatch.
    PageFetched {
        ticket: FetchTicket,
        outcome: Result<FetchResult, LoadError>,
    },
}
