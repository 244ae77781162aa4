use std::sync::Arc;

use scrollfeed_core::{FetchResult, LoadError};

/// Paginated backend endpoint.
///
/// Calls must be safe to repeat with the same arguments: a response that
/// arrives after a refresh is dropped and the page is asked for again.
/// Timeouts are the provider's job and surface as ordinary errors.
#[async_trait::async_trait]
pub trait ContentProvider: Send + Sync {
    async fn fetch_page(&self, page: u32, page_size: usize) -> Result<FetchResult, LoadError>;

    /// Forget any locally cached pages.
    fn invalidate(&self) {}
}

#[async_trait::async_trait]
impl<P: ContentProvider + ?Sized> ContentProvider for Arc<P> {
    async fn fetch_page(&self, page: u32, page_size: usize) -> Result<FetchResult, LoadError> {
        (**self).fetch_page(page, page_size).await
    }

    fn invalidate(&self) {
        (**self).invalidate()
    }
}
