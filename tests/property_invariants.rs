use std::collections::BTreeSet;

use proptest::prelude::*;

use reqlog::{
    core::{allocator::IdAllocator, store::RequestStore},
    message::{HttpHost, LogRecord, RequestSnapshot, ResponseSnapshot, Scheme},
    types::RequestId,
};

#[derive(Debug, Clone)]
enum Action {
    AddRequest { host_idx: u8 },
    AddRequestResponse { host_idx: u8, status: u16 },
    AttachResponse { target: u8, status: u16 },
}

fn action_strategy() -> impl Strategy<Value = Action> {
    prop_oneof![
        (0u8..6).prop_map(|host_idx| Action::AddRequest { host_idx }),
        (0u8..6, 100u16..600)
            .prop_map(|(host_idx, status)| Action::AddRequestResponse { host_idx, status }),
        (0u8..24, 100u16..600).prop_map(|(target, status)| Action::AttachResponse {
            target,
            status
        }),
    ]
}

fn host(host_idx: u8) -> HttpHost {
    HttpHost {
        scheme: Scheme::Http,
        name: format!("host{host_idx}.example"),
        port: 80,
    }
}

fn record(id: RequestId, host_idx: u8, response: Option<ResponseSnapshot>) -> LogRecord {
    LogRecord {
        id,
        host: host(host_idx),
        request: RequestSnapshot {
            method: "GET".to_string(),
            target: format!("/{id}"),
            version: "HTTP/1.1".to_string(),
            headers: vec![],
            body: vec![],
        },
        response,
        ts_ms: id,
    }
}

fn response(status: u16) -> ResponseSnapshot {
    ResponseSnapshot {
        status,
        reason: String::new(),
        version: "HTTP/1.1".to_string(),
        headers: vec![],
        body: vec![],
    }
}

fn full_scan_by_host(store: &RequestStore, key: &str) -> Vec<RequestId> {
    store
        .ordered_ids()
        .iter()
        .copied()
        .filter(|id| store.get(*id).is_some_and(|r| r.host.key() == key))
        .collect()
}

fn indexed_by_host(store: &RequestStore, key: &str) -> Vec<RequestId> {
    store.for_host(key).into_iter().map(|r| r.id).collect()
}

proptest! {
    #[test]
    fn random_sequences_preserve_order_index_and_id_invariants(
        actions in prop::collection::vec(action_strategy(), 1..200)
    ) {
        let mut store = RequestStore::new();
        let mut allocator = IdAllocator::new();
        let mut hosts_seen = BTreeSet::<String>::new();

        for action in actions {
            match action {
                Action::AddRequest { host_idx } => {
                    let id = allocator.advance();
                    hosts_seen.insert(host(host_idx).key());
                    store.insert(record(id, host_idx, None)).expect("insert");
                }
                Action::AddRequestResponse { host_idx, status } => {
                    let id = allocator.advance();
                    hosts_seen.insert(host(host_idx).key());
                    store
                        .insert(record(id, host_idx, Some(response(status))))
                        .expect("insert");
                }
                Action::AttachResponse { target, status } => {
                    let ids = store.ordered_ids();
                    if ids.is_empty() {
                        continue;
                    }
                    let id = ids[usize::from(target) % ids.len()];
                    let updated = store.attach_response(id, response(status)).expect("attach");
                    prop_assert_eq!(
                        updated.response.as_ref().map(|r| r.status),
                        Some(status)
                    );
                }
            }

            // Presentation order is strictly increasing id order.
            let ids = store.ordered_ids();
            prop_assert!(ids.windows(2).all(|pair| pair[0] < pair[1]));
            // Every stored id was allocated.
            prop_assert!(ids.iter().all(|id| *id < allocator.peek()));
            // The host index agrees with a full scan.
            for key in &hosts_seen {
                prop_assert_eq!(indexed_by_host(&store, key), full_scan_by_host(&store, key));
            }
        }

        // Ids are contiguous from 1: concurrency alone never creates gaps.
        let expected: Vec<RequestId> = (1..allocator.peek()).collect();
        prop_assert_eq!(store.ordered_ids().to_vec(), expected);
    }

    #[test]
    fn pipelined_inserts_in_any_order_present_sorted(
        count in 2usize..12,
        seed in 0u64..u64::MAX
    ) {
        let mut allocator = IdAllocator::new();
        let ids: Vec<RequestId> = (0..count).map(|_| allocator.advance()).collect();

        // Insert the pre-allocated ids in a seed-scrambled order.
        let mut scrambled = ids.clone();
        let len = scrambled.len();
        for i in 0..len {
            let j = (seed as usize).wrapping_mul(i + 1) % len;
            scrambled.swap(i, j);
        }

        let mut store = RequestStore::new();
        for id in &scrambled {
            store.insert(record(*id, 0, None)).expect("insert");
        }

        prop_assert_eq!(store.ordered_ids().to_vec(), ids);
        prop_assert_eq!(store.max_id(), Some(count as RequestId));
    }
}
