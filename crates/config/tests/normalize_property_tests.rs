//! Property-based tests for key normalization.
//!
//! These tests verify the structural guarantees of `normalize_keys` over
//! randomly generated YAML trees: normalization is idempotent, every scalar
//! mapping key becomes a string key, and non-key content is untouched.

use proptest::prelude::*;
use serde_yaml::{Mapping, Value};

use props_config::normalize_keys;

/// Strategy for scalar leaf values.
fn scalar_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|n| Value::Number(n.into())),
        "[a-zA-Z0-9 _.-]{0,16}".prop_map(Value::String),
    ]
}

/// Strategy for scalar mapping keys, covering the key types YAML permits
/// that the loader must canonicalize.
fn key_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        "[a-zA-Z_][a-zA-Z0-9_]{0,10}".prop_map(Value::String),
        any::<bool>().prop_map(Value::Bool),
        (-10_000i64..10_000).prop_map(|n| Value::Number(n.into())),
    ]
}

/// Strategy for arbitrarily nested YAML trees.
fn value_strategy() -> impl Strategy<Value = Value> {
    scalar_strategy().prop_recursive(3, 32, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Sequence),
            prop::collection::vec((key_strategy(), inner), 0..4).prop_map(|entries| {
                let mut map = Mapping::new();
                for (key, value) in entries {
                    map.insert(key, value);
                }
                Value::Mapping(map)
            }),
        ]
    })
}

/// Recursively asserts that every mapping key in the tree is a string.
fn all_keys_are_strings(value: &Value) -> bool {
    match value {
        Value::Mapping(map) => map
            .iter()
            .all(|(key, val)| key.is_string() && all_keys_are_strings(val)),
        Value::Sequence(seq) => seq.iter().all(all_keys_are_strings),
        Value::Tagged(tagged) => all_keys_are_strings(&tagged.value),
        _ => true,
    }
}

proptest! {
    #[test]
    fn normalize_is_idempotent(value in value_strategy()) {
        let once = normalize_keys(value);
        let twice = normalize_keys(once.clone());
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn normalize_makes_all_keys_strings(value in value_strategy()) {
        let normalized = normalize_keys(value);
        prop_assert!(all_keys_are_strings(&normalized));
    }

    #[test]
    fn normalize_preserves_scalars(value in scalar_strategy()) {
        prop_assert_eq!(normalize_keys(value.clone()), value);
    }

    #[test]
    fn normalize_preserves_values_under_string_keys(
        entries in prop::collection::btree_map(
            "[a-zA-Z_][a-zA-Z0-9_]{0,10}",
            scalar_strategy(),
            0..8,
        )
    ) {
        let mut map = Mapping::new();
        for (key, value) in &entries {
            map.insert(Value::String(key.clone()), value.clone());
        }

        let normalized = normalize_keys(Value::Mapping(map));
        for (key, value) in &entries {
            prop_assert_eq!(normalized.get(key.as_str()), Some(value));
        }
    }
}
