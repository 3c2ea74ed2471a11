//! Testing utilities for the CDP sandbox workspace
//!
//! Shared fixtures and proptest strategies.

#![allow(missing_docs)]

use cdp_core::{Field, FieldType, FixedClock, Platform, PlatformConfig, Profile, Schema, Segment};
use cdp_store::MemoryStore;
use proptest::prelude::*;
use serde_json::Value;
use std::sync::Arc;

pub const FIXED_MILLIS: i64 = 1_700_000_000_000;

pub fn customer_schema() -> Schema {
    Schema::new(
        "Customer",
        vec![
            Field::identity("CustomerID"),
            Field::new("email", FieldType::String),
            Field::new("firstName", FieldType::String),
            Field::new("lastName", FieldType::String),
        ],
    )
}

pub fn order_schema() -> Schema {
    Schema::new(
        "Order",
        vec![
            Field::identity("orderId"),
            Field::new("total", FieldType::Number),
            Field::new("email", FieldType::String),
        ],
    )
}

pub fn peter() -> Profile {
    Profile::new()
        .with("CustomerID", "1001")
        .with("email", "peter@example.com")
        .with("firstName", "Peter")
        .with("lastName", "Parker")
}

/// Sandbox over a memory store with demo data, a fixed seed and a frozen clock
pub fn setup_sandbox() -> Platform<MemoryStore> {
    Platform::open(MemoryStore::new(), PlatformConfig::new().with_rng_seed(42))
        .unwrap()
        .with_clock(Arc::new(FixedClock(FIXED_MILLIS)))
}

/// Sandbox over an empty memory store
pub fn setup_empty_sandbox() -> Platform<MemoryStore> {
    let config = PlatformConfig::new().with_rng_seed(42).with_demo_data(false);
    Platform::open(MemoryStore::new(), config)
        .unwrap()
        .with_clock(Arc::new(FixedClock(FIXED_MILLIS)))
}

pub fn field_type_strategy() -> impl Strategy<Value = FieldType> {
    prop_oneof![
        Just(FieldType::String),
        Just(FieldType::Number),
        Just(FieldType::Id),
    ]
}

pub fn field_strategy() -> impl Strategy<Value = Field> {
    ("[a-zA-Z][a-zA-Z0-9_]{0,11}", field_type_strategy(), any::<bool>()).prop_map(
        |(name, field_type, identity)| Field {
            name,
            field_type,
            identity,
        },
    )
}

/// Schemas with 1..8 fields and distinct field names
pub fn schema_strategy() -> impl Strategy<Value = Schema> {
    (
        "[A-Z][a-zA-Z]{0,9}",
        prop::collection::vec(field_strategy(), 1..8),
    )
        .prop_map(|(name, fields)| {
            let mut seen = Vec::new();
            let fields = fields
                .into_iter()
                .filter(|f| {
                    if seen.contains(&f.name) {
                        false
                    } else {
                        seen.push(f.name.clone());
                        true
                    }
                })
                .collect();
            Schema::new(name, fields)
        })
}

/// Scalar JSON values like those found in profiles
pub fn scalar_value_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        (-10_000i64..10_000).prop_map(Value::from),
        "[a-z0-9 ]{0,6}".prop_map(Value::String),
    ]
}

pub fn segment_strategy() -> impl Strategy<Value = Segment> {
    (
        "[a-z]{1,6}",
        prop_oneof![Just("a".to_string()), Just("b".to_string()), Just("c".to_string())],
        prop_oneof![
            "[0-9]{1,4}",
            " ?[0-9]{1,3} ?",
            "[a-z ]{1,6}",
            Just("1".to_string()),
            Just("0".to_string()),
        ],
    )
        .prop_map(|(name, field, value)| Segment::new(name, field, value))
}

/// Profiles over the keys `a`, `b`, `c` (some possibly absent)
pub fn profile_strategy() -> impl Strategy<Value = Profile> {
    prop::collection::vec(
        (
            prop_oneof![Just("a".to_string()), Just("b".to_string()), Just("c".to_string())],
            scalar_value_strategy(),
        ),
        0..4,
    )
    .prop_map(|entries| entries.into_iter().collect())
}
