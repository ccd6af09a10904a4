//! Property-Based Tests for the Response Cache
//!
//! Uses proptest against `ResponseStore` operation sequences.

use proptest::prelude::*;
use std::collections::HashSet;
use std::time::Duration;

use crate::cache::ResponseStore;

// == Test Configuration ==
const TEST_MAX_ENTRIES: usize = 100;
const TEST_DEFAULT_TTL: Duration = Duration::from_secs(300);

// == Strategies ==
fn valid_key_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_/?=]{1,64}"
}

fn valid_value_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ]{1,256}"
}

#[derive(Debug, Clone)]
enum CacheOp {
    Set { key: String, value: String },
    Get { key: String },
    Delete { key: String },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    // Keys drawn from a small pool so operations collide often.
    let key = "k[0-9]{1,2}";
    prop_oneof![
        (key, valid_value_strategy()).prop_map(|(key, value)| CacheOp::Set { key, value }),
        key.prop_map(|key| CacheOp::Get { key }),
        key.prop_map(|key| CacheOp::Delete { key }),
    ]
}

fn unique(keys: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    keys.into_iter().filter(|k| seen.insert(k.clone())).collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Hit and miss counters match what each `get` returned, and the size
    // reported by stats matches the live entry count.
    #[test]
    fn prop_statistics_accuracy(ops in prop::collection::vec(cache_op_strategy(), 1..80)) {
        let mut store = ResponseStore::new(20, TEST_DEFAULT_TTL);
        let mut expected_hits: u64 = 0;
        let mut expected_misses: u64 = 0;

        for op in ops {
            match op {
                CacheOp::Set { key, value } => store.set(key, value, None),
                CacheOp::Get { key } => match store.get(&key) {
                    Some(_) => expected_hits += 1,
                    None => expected_misses += 1,
                },
                CacheOp::Delete { key } => {
                    store.delete(&key);
                }
            }
        }

        let stats = store.stats();
        prop_assert_eq!(stats.hits, expected_hits);
        prop_assert_eq!(stats.misses, expected_misses);
        prop_assert_eq!(stats.size, store.len());
        prop_assert!(stats.hit_rate >= 0.0 && stats.hit_rate <= 1.0);
    }

    // Replaying a model of the LRU order must agree with the store after
    // every operation: same keys, same recency order.
    #[test]
    fn prop_recency_matches_model(ops in prop::collection::vec(cache_op_strategy(), 1..80)) {
        let capacity = 8;
        let mut store = ResponseStore::new(capacity, TEST_DEFAULT_TTL);
        let mut model: Vec<String> = Vec::new();

        for op in ops {
            match op {
                CacheOp::Set { key, value } => {
                    store.set(key.clone(), value, None);
                    if let Some(pos) = model.iter().position(|k| *k == key) {
                        model.remove(pos);
                    } else if model.len() == capacity {
                        model.remove(0);
                    }
                    model.push(key);
                }
                CacheOp::Get { key } => {
                    if store.get(&key).is_some() {
                        let pos = model.iter().position(|k| *k == key).unwrap();
                        let k = model.remove(pos);
                        model.push(k);
                    }
                }
                CacheOp::Delete { key } => {
                    store.delete(&key);
                    model.retain(|k| *k != key);
                }
            }
            prop_assert_eq!(store.keys_by_recency(), model.clone());
        }
    }

    // Setting the same key twice leaves one entry holding the second value.
    #[test]
    fn prop_repeated_set_is_idempotent_on_size(
        key in valid_key_strategy(),
        value1 in valid_value_strategy(),
        value2 in valid_value_strategy()
    ) {
        let mut store = ResponseStore::new(TEST_MAX_ENTRIES, TEST_DEFAULT_TTL);

        store.set(key.clone(), value1, None);
        let size_after_first = store.len();
        store.set(key.clone(), value2.clone(), None);

        prop_assert_eq!(store.len(), size_after_first);
        prop_assert_eq!(store.get(&key), Some(value2));
    }

    // The store never holds more than its capacity, even momentarily
    // between consecutive sets.
    #[test]
    fn prop_capacity_enforcement(
        entries in prop::collection::vec(
            (valid_key_strategy(), valid_value_strategy()),
            1..200
        )
    ) {
        let max_entries = 50;
        let mut store = ResponseStore::new(max_entries, TEST_DEFAULT_TTL);

        for (key, value) in entries {
            store.set(key, value, None);
            prop_assert!(store.len() <= max_entries);
        }
    }

    // Filling to capacity then adding one new key evicts exactly the first key.
    #[test]
    fn prop_lru_eviction_order(
        initial_keys in prop::collection::vec(valid_key_strategy(), 3..10),
        new_key in valid_key_strategy(),
        new_value in valid_value_strategy()
    ) {
        let unique_keys = unique(initial_keys);
        prop_assume!(unique_keys.len() >= 2);
        prop_assume!(!unique_keys.contains(&new_key));

        let capacity = unique_keys.len();
        let mut store = ResponseStore::new(capacity, TEST_DEFAULT_TTL);

        for key in &unique_keys {
            store.set(key.clone(), format!("value_{key}"), None);
        }
        store.set(new_key.clone(), new_value, None);

        prop_assert_eq!(store.len(), capacity);
        prop_assert_eq!(store.stats().evictions, 1);
        prop_assert!(store.get(&unique_keys[0]).is_none());
        prop_assert!(store.get(&new_key).is_some());
        for key in unique_keys.iter().skip(1) {
            prop_assert!(store.get(key).is_some(), "{} should survive", key);
        }
    }

    // A `get` on the oldest key protects it; the next-oldest is evicted instead.
    #[test]
    fn prop_lru_access_tracking(
        keys in prop::collection::vec(valid_key_strategy(), 3..8),
        new_key in valid_key_strategy(),
        new_value in valid_value_strategy()
    ) {
        let unique_keys = unique(keys);
        prop_assume!(unique_keys.len() >= 3);
        prop_assume!(!unique_keys.contains(&new_key));

        let mut store = ResponseStore::new(unique_keys.len(), TEST_DEFAULT_TTL);
        for key in &unique_keys {
            store.set(key.clone(), format!("value_{key}"), None);
        }

        let accessed_key = unique_keys[0].clone();
        prop_assert!(store.get(&accessed_key).is_some());

        store.set(new_key.clone(), new_value, None);

        prop_assert!(store.get(&accessed_key).is_some());
        prop_assert!(store.get(&unique_keys[1]).is_none());
        prop_assert!(store.get(&new_key).is_some());
    }
}

// Fewer cases for the time-sensitive TTL property
proptest! {
    #![proptest_config(ProptestConfig::with_cases(5))]

    // After its TTL, an entry reads as a miss and is gone from the store.
    #[test]
    fn prop_ttl_expiration_behavior(
        key in valid_key_strategy(),
        value in valid_value_strategy()
    ) {
        let mut store = ResponseStore::new(TEST_MAX_ENTRIES, TEST_DEFAULT_TTL);

        store.set(key.clone(), value.clone(), Some(Duration::from_millis(30)));
        prop_assert_eq!(store.get(&key), Some(value));

        std::thread::sleep(Duration::from_millis(50));

        prop_assert_eq!(store.get(&key), None);
        prop_assert_eq!(store.len(), 0);
    }
}

// == Error Response Format ==
proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    // Every crate error renders as JSON with a string "error" field.
    #[test]
    fn prop_error_response_format(error_msg in "[a-zA-Z0-9 _-]{1,100}") {
        use crate::error::{Error, FetchError};
        use axum::body::to_bytes;
        use axum::response::IntoResponse;

        let variants = vec![
            Error::NotFound(error_msg.clone()),
            Error::InvalidRequest(error_msg.clone()),
            Error::UnknownKind(error_msg.clone()),
            Error::Fetch(FetchError::Api { status: 404, text: error_msg.clone() }),
            Error::Fetch(FetchError::HttpStatus { status: 502, body: error_msg.clone() }),
        ];

        let rt = tokio::runtime::Runtime::new().unwrap();
        for error in variants {
            let expected = error.to_string();
            let response = error.into_response();

            let content_type = response
                .headers()
                .get("content-type")
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string();
            prop_assert!(content_type.contains("application/json"));

            let bytes = rt.block_on(async { to_bytes(response.into_body(), usize::MAX).await.unwrap() });
            let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
            prop_assert_eq!(json["error"].as_str(), Some(expected.as_str()));
        }
    }
}
