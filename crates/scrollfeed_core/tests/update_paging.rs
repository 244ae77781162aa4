use std::sync::Once;

use pretty_assertions::assert_eq;
use scrollfeed_core::{
    update, ContentType, Effect, FeedState, FetchResult, FetchTicket, LoadError, LoadKind,
    LoadState, Msg, ProviderError, ProviderFailure, TriggerSource,
};
use serde_json::{json, Value};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(feed_logging::initialize_for_tests);
}

fn campaigns_state() -> FeedState {
    FeedState::for_content_type(
        ContentType::Campaigns,
        ContentType::Campaigns.base_config(),
    )
}

fn records(ids: std::ops::RangeInclusive<u64>) -> Vec<Value> {
    ids.map(|id| json!({"id": id, "title": format!("Campaign {id}")}))
        .collect()
}

fn page_of(ids: std::ops::RangeInclusive<u64>, has_next: bool) -> Result<FetchResult, LoadError> {
    Ok(FetchResult::page(records(ids), has_next))
}

fn fetched(effects: &[Effect]) -> FetchTicket {
    effects
        .iter()
        .find_map(|effect| match effect {
            Effect::FetchPage(ticket) => Some(*ticket),
            _ => None,
        })
        .expect("fetch effect")
}

fn deliver(
    state: FeedState,
    ticket: FetchTicket,
    outcome: Result<FetchResult, LoadError>,
) -> (FeedState, Vec<Effect>) {
    update(state, Msg::PageFetched { ticket, outcome })
}

fn advance() -> Msg {
    Msg::Advance {
        source: TriggerSource::Intersection,
    }
}

#[test]
fn load_initial_requests_page_one_with_resolved_size() {
    init_logging();
    let (state, effects) = update(campaigns_state(), Msg::LoadInitial);

    assert_eq!(
        effects,
        vec![Effect::FetchPage(FetchTicket {
            epoch: 0,
            page: 1,
            page_size: 6,
            kind: LoadKind::Initial,
        })]
    );
    assert_eq!(state.load_state(), LoadState::LoadingInitial);
}

#[test]
fn scenario_pages_of_six_six_four() {
    init_logging();
    let (state, effects) = update(campaigns_state(), Msg::LoadInitial);
    let (state, _) = deliver(state, fetched(&effects), page_of(1..=6, true));
    assert_eq!(state.store().total_len(), 6);
    assert!(state.has_more());
    assert_eq!(state.load_state(), LoadState::Idle);

    let (state, effects) = update(state, Msg::LoadMore);
    assert_eq!(fetched(&effects).page, 2);
    let (state, _) = deliver(state, fetched(&effects), page_of(7..=12, true));

    let (state, effects) = update(state, Msg::LoadMore);
    assert_eq!(fetched(&effects).page, 3);
    let (state, _) = deliver(state, fetched(&effects), page_of(13..=16, false));

    assert_eq!(state.store().total_len(), 16);
    assert!(!state.has_more());
    assert_eq!(state.load_state(), LoadState::Exhausted);

    let (_state, effects) = update(state, advance());
    assert!(effects.is_empty());
}

#[test]
fn failure_on_page_two_freezes_and_refresh_restarts() {
    init_logging();
    let (state, effects) = update(campaigns_state(), Msg::LoadInitial);
    let (state, _) = deliver(state, fetched(&effects), page_of(1..=6, true));

    let (state, effects) = update(state, Msg::LoadMore);
    let error = LoadError::Provider(ProviderError::new(
        ProviderFailure::HttpStatus(502),
        "bad gateway",
    ));
    let (state, effects) = deliver(state, fetched(&effects), Err(error.clone()));

    assert_eq!(
        effects,
        vec![Effect::LoadFailed {
            ticket: FetchTicket {
                epoch: 0,
                page: 2,
                page_size: 6,
                kind: LoadKind::More,
            },
            error: error.clone(),
        }]
    );
    assert_eq!(state.load_state(), LoadState::Error);
    assert_eq!(state.store().total_len(), 6);
    assert!(!state.has_more());
    assert_eq!(state.last_error(), Some(&error));
    assert!(state.view().can_retry());

    // No automatic retry from the viewport.
    let (state, effects) = update(state, advance());
    assert!(effects.is_empty());

    let (state, effects) = update(state, Msg::Refresh);
    assert_eq!(effects[0], Effect::InvalidateCache);
    let ticket = fetched(&effects);
    assert_eq!((ticket.epoch, ticket.page, ticket.kind), (1, 1, LoadKind::Initial));
    assert_eq!(state.load_state(), LoadState::LoadingInitial);
    assert!(state.store().is_empty());
    assert_eq!(state.last_error(), None);
}

#[test]
fn stale_response_after_refresh_is_discarded() {
    init_logging();
    let (state, effects) = update(campaigns_state(), Msg::LoadInitial);
    let stale_ticket = fetched(&effects);

    let (state, effects) = update(state, Msg::Refresh);
    let fresh_ticket = fetched(&effects);
    let before = state.clone();

    let (state, effects) = deliver(state, stale_ticket, page_of(100..=105, true));
    assert!(effects.is_empty());
    assert_eq!(state, before);

    // A stale failure must not flip the state either.
    let stale_error = LoadError::Provider(ProviderError::new(ProviderFailure::Timeout, "late"));
    let (state, effects) = deliver(state, stale_ticket, Err(stale_error));
    assert!(effects.is_empty());
    assert_eq!(state.load_state(), LoadState::LoadingInitial);

    let (state, _) = deliver(state, fresh_ticket, page_of(1..=6, true));
    assert_eq!(state.store().total_len(), 6);
    assert_eq!(state.epoch(), 1);
}

#[test]
fn triggers_while_in_flight_are_coalesced() {
    init_logging();
    let (state, effects) = update(campaigns_state(), Msg::LoadInitial);
    let (mut state, _) = deliver(state, fetched(&effects), page_of(1..=6, true));

    let mut fetches = 0;
    for _ in 0..5 {
        let (next, effects) = update(state, advance());
        fetches += effects.len();
        state = next;
    }
    let (state, effects) = update(state, Msg::LoadMore);
    fetches += effects.len();

    assert_eq!(fetches, 1);
    assert_eq!(state.load_state(), LoadState::LoadingMore);
}

#[test]
fn rejected_and_malformed_pages_become_errors() {
    init_logging();
    let (state, effects) = update(campaigns_state(), Msg::LoadInitial);
    let rejected = Ok(FetchResult::rejected("not allowed"));
    let (state, effects) = deliver(state, fetched(&effects), rejected);
    assert!(matches!(
        &effects[..],
        [Effect::LoadFailed {
            error: LoadError::Provider(ProviderError {
                kind: ProviderFailure::Rejected,
                ..
            }),
            ..
        }]
    ));
    assert_eq!(state.view().error_message.as_deref(), Some("not allowed"));

    let (state, effects) = update(state, Msg::Refresh);
    let page = vec![json!({"id": 1}), json!({"title": "missing id"})];
    let (state, effects) = deliver(state, fetched(&effects), Ok(FetchResult::page(page, true)));
    assert!(matches!(
        &effects[..],
        [Effect::LoadFailed {
            error: LoadError::Shape(_),
            ..
        }]
    ));
    // Nothing from the bad page was merged.
    assert!(state.store().is_empty());
    assert_eq!(state.load_state(), LoadState::Error);
}

#[test]
fn missing_pagination_falls_back_to_page_length() {
    init_logging();
    let (state, effects) = update(campaigns_state(), Msg::LoadInitial);
    let full = Ok(FetchResult::unpaginated(records(1..=6)));
    let (state, _) = deliver(state, fetched(&effects), full);
    assert!(state.has_more());

    // An exactly full last page costs one extra, empty request.
    let (state, effects) = update(state, Msg::LoadMore);
    let (state, _) = deliver(state, fetched(&effects), Ok(FetchResult::unpaginated(Vec::new())));
    assert!(!state.has_more());
    assert_eq!(state.load_state(), LoadState::Exhausted);
    assert_eq!(state.cursor().page_number, 2);
}

#[test]
fn reset_restarts_without_invalidating_cache() {
    init_logging();
    let (state, effects) = update(campaigns_state(), Msg::LoadInitial);
    let (state, _) = deliver(state, fetched(&effects), page_of(1..=6, true));

    let (mut state, effects) = update(state, Msg::Reset);
    let reload = fetched(&effects);
    assert_eq!(
        effects,
        vec![Effect::FetchPage(FetchTicket {
            epoch: 1,
            page: 1,
            page_size: 6,
            kind: LoadKind::Initial,
        })]
    );
    assert!(state.store().is_empty());
    assert_eq!(state.cursor().page_number, 0);
    assert_eq!(state.load_state(), LoadState::LoadingInitial);
    assert!(state.consume_dirty());

    // Growth waits for the reload.
    let (state, effects) = update(state, Msg::LoadMore);
    assert!(effects.is_empty());
    let (state, _) = deliver(state, reload, page_of(1..=6, true));
    assert_eq!(state.store().total_len(), 6);
    assert_eq!(state.epoch(), 1);
}

#[test]
fn load_initial_is_ignored_once_loaded() {
    init_logging();
    let (state, effects) = update(campaigns_state(), Msg::LoadInitial);
    let (state, _) = deliver(state, fetched(&effects), page_of(1..=6, true));
    let (_state, effects) = update(state, Msg::LoadInitial);
    assert!(effects.is_empty());
}

#[test]
fn view_rows_follow_arrival_order_with_nested_records() {
    init_logging();
    let (state, effects) = update(campaigns_state(), Msg::LoadInitial);
    let page = vec![
        json!({"id": 2, "title": "B", "workflow_state": {"id": 20, "current_step": 1}}),
        json!({"id": 1, "title": "A", "workflow_state": null}),
    ];
    let (mut state, _) = deliver(state, fetched(&effects), Ok(FetchResult::page(page, false)));
    assert!(state.consume_dirty());

    let view = state.view();
    assert_eq!(view.rows.len(), 2);
    assert_eq!(view.rows[0]["workflow_state"], json!({"id": 20, "current_step": 1}));
    assert_eq!(view.rows[1]["title"], json!("A"));
    assert_eq!(view.total_in_memory, 3);
    assert_eq!(view.page, 1);
}
