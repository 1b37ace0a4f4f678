//! Tests for column classification.

use std::collections::BTreeMap;

use proptest::prelude::*;
use tracker_ingest::classify_row;
use tracker_model::{AttributeId, DataElementId};

#[test]
fn splits_columns_into_groups() {
    let row = classify_row([
        ("orgUnit", "OU1"),
        ("programDate", "1970-01-01"),
        ("A|attr1", "5"),
        ("DE|de1", "x"),
    ]);

    assert_eq!(row.org_unit(), Some("OU1"));
    assert_eq!(row.program_date(), Some("1970-01-01"));
    assert_eq!(
        row.attributes.get(&AttributeId::new("attr1").unwrap()),
        Some(&"5".to_string())
    );
    assert_eq!(
        row.data_elements.get(&DataElementId::new("de1").unwrap()),
        Some(&"x".to_string())
    );
    assert_eq!(row.parameters.len(), 2);
}

#[test]
fn null_values_become_empty() {
    let row = classify_row([("orgUnit", "NULL"), ("A|attr1", "NULL"), ("DE|de1", "NULL")]);

    assert_eq!(row.org_unit(), Some(""));
    assert!(row.attributes.values().all(String::is_empty));
    assert!(row.data_elements.values().all(String::is_empty));
}

#[test]
fn drops_unknown_prefixes_and_blank_ids() {
    let row = classify_row([("X|foo", "1"), ("A|", "2"), ("DE| ", "3")]);

    assert!(row.parameters.is_empty());
    assert!(row.attributes.is_empty());
    assert!(row.data_elements.is_empty());
}

#[test]
fn extra_segments_after_the_id_are_ignored() {
    let row = classify_row([("A|attr1|label", "5"), ("DE|de1|unit", "x")]);

    assert_eq!(
        row.attributes.get(&AttributeId::new("attr1").unwrap()),
        Some(&"5".to_string())
    );
    assert_eq!(
        row.data_elements.get(&DataElementId::new("de1").unwrap()),
        Some(&"x".to_string())
    );
}

#[test]
fn accepts_owned_maps() {
    let mut raw = BTreeMap::new();
    raw.insert("eventDate".to_string(), "1970-01-02".to_string());
    raw.insert("A|attr1".to_string(), "v".to_string());

    let row = classify_row(&raw);

    assert_eq!(row.event_date(), Some("1970-01-02"));
    assert_eq!(row.attributes.len(), 1);
}

proptest! {
    #[test]
    fn every_column_lands_in_exactly_one_group(
        params in prop::collection::btree_map("[a-zA-Z]{1,8}", "[a-z0-9]{0,4}", 0..5),
        attrs in prop::collection::btree_map("[a-zA-Z0-9]{1,8}", "[a-z0-9]{0,4}", 0..5),
        elements in prop::collection::btree_map("[a-zA-Z0-9]{1,8}", "[a-z0-9]{0,4}", 0..5),
    ) {
        let mut columns: Vec<(String, String)> = Vec::new();
        columns.extend(params.iter().map(|(k, v)| (k.clone(), v.clone())));
        columns.extend(attrs.iter().map(|(k, v)| (format!("A|{k}"), v.clone())));
        columns.extend(elements.iter().map(|(k, v)| (format!("DE|{k}"), v.clone())));

        let row = classify_row(columns);

        prop_assert_eq!(row.parameters.len(), params.len());
        prop_assert_eq!(row.attributes.len(), attrs.len());
        prop_assert_eq!(row.data_elements.len(), elements.len());
        for (key, value) in &attrs {
            let id = AttributeId::new(key.clone()).unwrap();
            prop_assert_eq!(row.attributes.get(&id), Some(value));
        }
    }
}
