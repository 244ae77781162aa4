use std::collections::HashSet;

use proptest::prelude::*;
use scrollfeed_core::{
    update, ContentType, Effect, EntityKind, EntitySchema, FeedState, FetchResult, MemoryPolicy,
    Msg, NormalizedStore,
};
use serde_json::{json, Value};

fn pair_record(id: u64, left: u64, right: u64, sent: bool) -> Value {
    json!({
        "id": id,
        "email_sent": sent,
        "employee1": {"id": left, "name": format!("E{left}")},
        "employee2": {"id": right, "name": format!("E{right}")},
    })
}

fn page_strategy() -> impl Strategy<Value = Vec<Value>> {
    prop::collection::vec(
        (0u64..40, 0u64..25, 0u64..25, any::<bool>())
            .prop_map(|(id, left, right, sent)| pair_record(id, left, right, sent)),
        0..12,
    )
}

fn assert_no_duplicate_ids(store: &NormalizedStore) {
    for kind in [EntityKind::Pair, EntityKind::Employee] {
        let ids: Vec<_> = store.items(&kind).iter().map(|e| e.id.clone()).collect();
        let unique: HashSet<_> = ids.iter().cloned().collect();
        assert_eq!(ids.len(), unique.len(), "duplicate {kind} ids: {ids:?}");
        assert_eq!(ids.len(), store.len_of(&kind));
    }
    let arrivals: Vec<_> = store.arrivals().cloned().collect();
    let unique: HashSet<_> = arrivals.iter().cloned().collect();
    assert_eq!(arrivals.len(), unique.len());
}

proptest! {
    #[test]
    fn merging_identical_page_twice_is_a_noop(page in page_strategy()) {
        let schema = EntitySchema::pair();
        let normalized = schema.normalize_page(&page).unwrap();

        let mut once = NormalizedStore::new();
        once.merge(normalized.clone());
        let mut twice = once.clone();
        let stats = twice.merge(normalized);

        prop_assert_eq!(&once, &twice);
        prop_assert_eq!(stats.inserted, 0);
    }

    #[test]
    fn any_page_sequence_keeps_ids_unique(pages in prop::collection::vec(page_strategy(), 1..8)) {
        let schema = EntitySchema::pair();
        let mut store = NormalizedStore::new();
        for page in &pages {
            store.merge(schema.normalize_page(page).unwrap());
            assert_no_duplicate_ids(&store);
        }
    }
}

#[test]
fn long_sessions_stay_within_memory_bound() {
    let config = ContentType::Employees.base_config();
    let policy = MemoryPolicy::for_page_size(config.page_size);
    let mut state = FeedState::for_content_type(ContentType::Employees, config);

    let (next, mut effects) = update(state, Msg::LoadInitial);
    state = next;
    let mut next_id = 1u64;
    let mut evictions = 0;

    for _ in 0..40 {
        let ticket = match effects.as_slice() {
            [Effect::FetchPage(ticket)] => *ticket,
            other => panic!("expected one fetch, got {other:?}"),
        };
        let data = (next_id..next_id + config.page_size as u64)
            .map(|id| json!({"id": id}))
            .collect();
        next_id += config.page_size as u64;

        let (next, applied) = update(
            state,
            Msg::PageFetched {
                ticket,
                outcome: Ok(FetchResult::page(data, true)),
            },
        );
        state = next;
        if let [Effect::PageApplied(report)] = applied.as_slice() {
            evictions += usize::from(report.eviction.is_some());
        }
        assert!(state.store().total_len() <= policy.ceiling());

        let (next, more) = update(state, Msg::LoadMore);
        state = next;
        effects = more;
    }

    assert!(evictions > 0);
    // The first pages were evicted, the newest page is still there.
    let ids: Vec<_> = state
        .store()
        .items(&EntityKind::Employee)
        .iter()
        .map(|entity| entity.id.to_string())
        .collect();
    assert!(ids.contains(&"480".to_string()));
    assert!(!ids.contains(&"1".to_string()));
}
