#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use scrollfeed_core::{FetchResult, LoadError, ProviderError, ProviderFailure};
use scrollfeed_engine::ContentProvider;
use serde_json::{json, Value};
use tokio::sync::Notify;

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(feed_logging::initialize_for_tests);
}

pub fn campaign_records(ids: std::ops::RangeInclusive<u64>) -> Vec<Value> {
    ids.map(|id| json!({"id": id, "name": format!("Campaign {id}")}))
        .collect()
}

pub fn http_error(code: u16) -> LoadError {
    ProviderError::new(ProviderFailure::HttpStatus(code), "scripted failure").into()
}

struct Scripted {
    result: Result<FetchResult, LoadError>,
    hold: Option<Arc<Notify>>,
    delay: Duration,
}

/// Provider that answers calls, in call order, from a script.
#[derive(Default)]
pub struct ScriptedProvider {
    script: Mutex<VecDeque<Scripted>>,
    calls: Mutex<Vec<(u32, usize)>>,
    invalidations: AtomicUsize,
}

impl ScriptedProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, result: Result<FetchResult, LoadError>) -> &Self {
        self.push(result, None, Duration::ZERO)
    }

    /// Queues a response that is only released once the returned `Notify` fires.
    pub fn respond_held(&self, result: Result<FetchResult, LoadError>) -> Arc<Notify> {
        let release = Arc::new(Notify::new());
        self.push(result, Some(release.clone()), Duration::ZERO);
        release
    }

    pub fn respond_after(&self, delay: Duration, result: Result<FetchResult, LoadError>) -> &Self {
        self.push(result, None, delay)
    }

    fn push(
        &self,
        result: Result<FetchResult, LoadError>,
        hold: Option<Arc<Notify>>,
        delay: Duration,
    ) -> &Self {
        self.script
            .lock()
            .unwrap()
            .push_back(Scripted { result, hold, delay });
        self
    }

    pub fn calls(&self) -> Vec<(u32, usize)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn pages_requested(&self) -> Vec<u32> {
        self.calls().into_iter().map(|(page, _)| page).collect()
    }

    pub fn invalidations(&self) -> usize {
        self.invalidations.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ContentProvider for ScriptedProvider {
    async fn fetch_page(&self, page: u32, page_size: usize) -> Result<FetchResult, LoadError> {
        self.calls.lock().unwrap().push((page, page_size));
        let scripted = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("unscripted call for page {page}"));
        if let Some(release) = scripted.hold {
            release.notified().await;
        }
        if !scripted.delay.is_zero() {
            tokio::time::sleep(scripted.delay).await;
        }
        scripted.result
    }

    fn invalidate(&self) {
        self.invalidations.fetch_add(1, Ordering::SeqCst);
    }
}
