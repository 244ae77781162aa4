use crate::{Effect, FeedState, Msg};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: FeedState, msg: Msg) -> (FeedState, Vec<Effect>) {
    let effects = match msg {
        Msg::LoadInitial => state
            .start_initial()
            .map(Effect::FetchPage)
            .into_iter()
            .collect(),
        Msg::LoadMore => state.start_more().map(Effect::FetchPage).into_iter().collect(),
        Msg::Advance { .. } => {
            if state.gate().allows_advance() {
                state.start_more().map(Effect::FetchPage).into_iter().collect()
            } else {
                Vec::new()
            }
        }
        Msg::Refresh => {
            state.reset_session();
            let mut effects = vec![Effect::InvalidateCache];
            effects.extend(state.start_initial().map(Effect::FetchPage));
            effects
        }
        Msg::Reset => {
            state.reset_session();
            state.start_initial().map(Effect::FetchPage).into_iter().collect()
        }
        Msg::PageFetched { ticket, outcome } => state.complete(ticket, outcome),
    };

    (state, effects)
}
