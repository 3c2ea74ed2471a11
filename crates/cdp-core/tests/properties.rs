use cdp_core::{matches, FieldType, SchemaRegistry};
use cdp_test_utils::{profile_strategy, schema_strategy, segment_strategy, setup_empty_sandbox};
use proptest::prelude::*;
use serde_json::Value;
use std::collections::HashSet;

/// Reference loose equality for the scalar shapes the strategies produce
fn reference_loose_eq(value: Option<&Value>, text: &str) -> bool {
    let as_number = || {
        let t = text.trim();
        if t.is_empty() {
            Some(0.0)
        } else if t.chars().all(|c| c.is_ascii_digit()) {
            t.parse::<f64>().ok()
        } else {
            None
        }
    };

    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => s == text,
        Some(Value::Number(n)) => as_number() == n.as_f64(),
        Some(Value::Bool(b)) => as_number() == Some(if *b { 1.0 } else { 0.0 }),
        Some(_) => unreachable!("strategies only produce scalars"),
    }
}

proptest! {
    #[test]
    fn prop_saving_keeps_at_most_one_identity(schema in schema_strategy()) {
        let flagged: Vec<(String, FieldType)> = schema
            .fields
            .iter()
            .filter(|f| f.identity)
            .map(|f| (f.name.clone(), f.field_type))
            .collect();

        let mut registry = SchemaRegistry::new();
        registry.save(schema.clone()).unwrap();
        let saved = registry.get(&schema.name).unwrap();

        let identities: Vec<_> = saved.fields.iter().filter(|f| f.identity).collect();
        prop_assert!(identities.len() <= 1);
        prop_assert_eq!(identities.len(), usize::from(!flagged.is_empty()));

        if let Some((first, _)) = flagged.first() {
            prop_assert_eq!(&identities[0].name, first);
            prop_assert_eq!(identities[0].field_type, FieldType::Id);
        }
        for (name, original_type) in flagged.iter().skip(1) {
            let demoted = saved.fields.iter().find(|f| &f.name == name).unwrap();
            prop_assert!(!demoted.identity);
            let expected = if *original_type == FieldType::Id { FieldType::String } else { *original_type };
            prop_assert_eq!(demoted.field_type, expected);
        }
    }

    #[test]
    fn prop_generation_yields_n_records_with_schema_keys(schema in schema_strategy(), n in 1usize..40) {
        let mut sandbox = setup_empty_sandbox();
        sandbox.save_schema(schema.clone()).unwrap();
        sandbox.generate_profiles(&schema.name, n).unwrap();

        let profiles = &sandbox.state().profiles;
        prop_assert_eq!(profiles.len(), n);

        let expected: Vec<&str> = schema.field_names().collect();
        for profile in profiles {
            prop_assert_eq!(profile.keys().collect::<Vec<_>>(), expected.clone());
        }
    }

    #[test]
    fn prop_segment_match_is_loose_equality(profile in profile_strategy(), segment in segment_strategy()) {
        let expected = reference_loose_eq(profile.get(&segment.field), &segment.value);
        prop_assert_eq!(matches(&profile, &segment), expected);
    }
}

#[test]
fn id_values_distinct_within_batch() {
    let mut sandbox = setup_empty_sandbox();
    sandbox.save_schema(cdp_test_utils::order_schema()).unwrap();
    sandbox.generate_profiles("Order", 2_000).unwrap();

    let ids: HashSet<&str> = sandbox
        .state()
        .profiles
        .iter()
        .map(|p| p.get("orderId").and_then(Value::as_str).unwrap())
        .collect();
    assert_eq!(ids.len(), 2_000);
}
