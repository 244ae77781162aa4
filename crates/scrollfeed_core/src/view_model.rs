use serde_json::Value;

use crate::{FeedState, LoadState};

/// Read-only projection of a list for rendering.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeedViewModel {
    pub load_state: LoadState,
    pub has_more: bool,
    pub page: u32,
    pub epoch: u64,
    /// Top-level records in list order, nested records re-embedded.
    pub rows: Vec<Value>,
    pub total_in_memory: usize,
    pub error_message: Option<String>,
}

impl FeedViewModel {
    pub(crate) fn from_state(state: &FeedState) -> Self {
        let store = state.store();
        let schema = state.schema();
        let rows = store
            .items(schema.kind())
            .into_iter()
            .filter_map(|entity| store.denormalize(&entity.reference(), schema))
            .collect();

        Self {
            load_state: state.load_state(),
            has_more: state.has_more(),
            page: state.cursor().page_number,
            epoch: state.epoch(),
            rows,
            total_in_memory: store.total_len(),
            error_message: state.last_error().map(|err| err.user_message()),
        }
    }

    pub fn is_loading(&self) -> bool {
        self.load_state.is_loading()
    }

    /// Whether a retry affordance (refresh) should be shown.
    pub fn can_retry(&self) -> bool {
        self.load_state == LoadState::Error
    }
}
