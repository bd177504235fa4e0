//! Collection Tests
//!
//! Tests for the collection that ties codecs, schema and index together,
//! including file round trips through line-based scanning.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter};

use linestore::{Collection, Config, FieldKind, MatchMode, StoreError, Strategy};
use serde_json::{json, Value};
use tempfile::TempDir;

fn products() -> Vec<Value> {
    vec![
        json!({"id": 1, "name": "Laptop", "category": "Electronics", "price": 1200}),
        json!({"id": 2, "name": "Phone\nCase", "category": "Accessories", "price": 15}),
        json!({"id": 3, "name": "Monitor", "category": "Electronics", "price": 300}),
        json!({"id": 4, "name": "Cable", "category": "Accessories", "price": 10}),
    ]
}

fn config_for(strategy: Strategy, binary: bool, compress: bool) -> Config {
    Config::builder()
        .strategy(strategy)
        .native_binary(binary)
        .compress(compress)
        .index("category", FieldKind::Text)
        .index("price", FieldKind::Numeric)
        .build()
}

fn filled(config: Config) -> Collection {
    let mut collection = Collection::open(config).unwrap();
    for product in products() {
        collection.insert(&product).unwrap();
    }
    collection
}

// =============================================================================
// Basic Operations Tests
// =============================================================================

#[test]
fn test_insert_assigns_sequential_lines() {
    let mut collection = Collection::open(config_for(Strategy::Framed, false, false)).unwrap();

    for (expected, product) in products().iter().enumerate() {
        assert_eq!(collection.insert(product).unwrap(), expected as u64);
    }
    assert_eq!(collection.line_count(), 4);
    assert_eq!(collection.live_count(), 4);
}

#[test]
fn test_insert_rejects_non_object() {
    let mut collection = Collection::open(Config::default()).unwrap();

    assert!(matches!(
        collection.insert(&json!([1, 2])),
        Err(StoreError::InvalidInput(_))
    ));
}

#[test]
fn test_get_round_trips_every_framed_option() {
    for binary in [false, true] {
        for compress in [false, true] {
            let collection = filled(config_for(Strategy::Framed, binary, compress));
            for (line, product) in products().iter().enumerate() {
                assert_eq!(collection.get(line as u64).unwrap().as_ref(), Some(product));
            }
        }
    }
}

#[test]
fn test_find_with_range_and_membership() {
    let collection = filled(config_for(Strategy::Framed, true, true));

    let found = collection
        .find(&json!({"category": "Electronics", "price": {">": 500}}), MatchMode::All)
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].0, 0);
    assert_eq!(found[0].1["name"], "Laptop");

    let lines = collection
        .find_lines(&json!({"category": "Electronics", "price": {"<": 12}}), MatchMode::Any)
        .unwrap();
    assert_eq!(lines.into_iter().collect::<Vec<_>>(), vec![0, 2, 3]);
}

#[test]
fn test_delete_then_compact_renumbers_index() {
    let mut collection = filled(config_for(Strategy::Framed, false, false));

    assert!(collection.delete(0));
    assert!(!collection.delete(0));
    assert_eq!(collection.get(0).unwrap(), None);

    let mapping = collection.compact();
    assert_eq!(mapping.get(&1), Some(&0));
    assert_eq!(mapping.get(&3), Some(&2));
    assert_eq!(collection.line_count(), 3);

    let electronics = collection
        .find(&json!({"category": "Electronics"}), MatchMode::All)
        .unwrap();
    assert_eq!(electronics.len(), 1);
    assert_eq!(electronics[0].0, 1);
    assert_eq!(electronics[0].1["name"], "Monitor");
}

// =============================================================================
// Positional Schema Tests
// =============================================================================

#[test]
fn test_positional_collection_with_fixed_schema() {
    let config = Config::builder()
        .schema(["id", "name", "category", "price"])
        .index("category", FieldKind::Text)
        .build();
    let collection = filled(config);

    let raw = collection.raw_line(0).unwrap();
    assert_eq!(raw, b"[1,\"Laptop\",\"Electronics\",1200]\n");
    assert_eq!(collection.get(0).unwrap(), Some(products()[0].clone()));
}

#[test]
fn test_positional_collection_detects_and_evolves_schema() {
    let config = Config::builder()
        .schema(Vec::<String>::new())
        .native_binary(true)
        .build();
    let mut collection = Collection::open(config).unwrap();

    collection.insert(&json!({"name": "a", "id": 1})).unwrap();
    collection.insert(&json!({"name": "b", "id": 2, "color": "red"})).unwrap();

    let schema = collection.schema().unwrap().schema();
    assert_eq!(schema.fields(), ["id", "name", "color"]);

    // Rows written before "color" existed decode without it
    assert_eq!(collection.get(0).unwrap(), Some(json!({"id": 1, "name": "a"})));
    assert_eq!(
        collection.get(1).unwrap(),
        Some(json!({"id": 2, "name": "b", "color": "red"}))
    );
}

#[test]
fn test_positional_missing_field_reads_back_as_null() {
    let config = Config::builder().schema(["id", "name"]).build();
    let mut collection = Collection::open(config).unwrap();

    let line = collection.insert(&json!({"name": "a"})).unwrap();

    assert_eq!(collection.raw_line(line).unwrap(), b"[null,\"a\"]\n");
    assert_eq!(
        collection.get(line).unwrap(),
        Some(json!({"id": null, "name": "a"}))
    );
}

#[test]
fn test_line_numbers_beyond_the_store_are_absent() {
    let mut collection = filled(config_for(Strategy::Framed, false, false));

    assert_eq!(collection.get(u64::MAX).unwrap(), None);
    assert!(collection.raw_line(u64::MAX).is_none());
    assert!(!collection.delete(u64::MAX));
    assert_eq!(collection.live_count(), 4);
}

// =============================================================================
// File Round Trip Tests
// =============================================================================

#[test]
fn test_file_round_trip_survives_line_scanning() {
    let dir = TempDir::new().unwrap();

    for (strategy, binary, compress) in [
        (Strategy::Framed, false, false),
        (Strategy::Framed, true, false),
        (Strategy::Framed, false, true),
        (Strategy::Framed, true, true),
        (Strategy::Tagged, false, false),
        (Strategy::Plain, false, false),
    ] {
        let path = dir.path().join(format!("{}-{}-{}.db", strategy, binary, compress));
        let original = filled(config_for(strategy, binary, compress));

        {
            let mut writer = BufWriter::new(File::create(&path).unwrap());
            original.write_to(&mut writer).unwrap();
        }

        // One physical line per record
        let physical = BufReader::new(File::open(&path).unwrap())
            .split(b'\n')
            .count();
        assert_eq!(physical, 4, "{} binary={} compress={}", strategy, binary, compress);

        let mut reloaded = Collection::open(config_for(strategy, binary, compress)).unwrap();
        let loaded = reloaded
            .load(BufReader::new(File::open(&path).unwrap()))
            .unwrap();
        assert_eq!(loaded, 4);

        for line in 0..4u64 {
            assert_eq!(reloaded.get(line).unwrap(), original.get(line).unwrap());
        }
        assert_eq!(
            reloaded.find_lines(&json!({"price": {">=": 300}}), MatchMode::All).unwrap(),
            original.find_lines(&json!({"price": {">=": 300}}), MatchMode::All).unwrap()
        );
    }
}

#[test]
fn test_load_requires_line_oriented_config() {
    let config = Config::builder()
        .strategy(Strategy::Tagged)
        .native_binary(true)
        .line_oriented(false)
        .build();
    let mut collection = Collection::open(config).unwrap();

    let result = collection.load(BufReader::new(&b""[..]));
    assert!(matches!(result, Err(StoreError::Config(_))));
}

#[test]
fn test_load_reports_corrupt_line() {
    let mut collection = Collection::open(config_for(Strategy::Framed, false, false)).unwrap();
    let data = b"{\"id\":1}\n{oops\n";

    let result = collection.load(BufReader::new(&data[..]));
    assert!(matches!(result, Err(StoreError::Json(_))));
}

#[test]
fn test_load_positional_rows_without_schema_fields_fails() {
    let config = || {
        Config::builder()
            .schema(Vec::<String>::new())
            .index("name", FieldKind::Text)
            .build()
    };

    let mut original = Collection::open(config()).unwrap();
    original.insert(&json!({"id": 1, "name": "a"})).unwrap();

    let mut stored = Vec::new();
    original.write_to(&mut stored).unwrap();

    let mut reloaded = Collection::open(config()).unwrap();
    let result = reloaded.load(BufReader::new(&stored[..]));
    assert!(matches!(result, Err(StoreError::Config(_))));
    assert_eq!(reloaded.line_count(), 0);
}

#[test]
fn test_load_positional_rows_with_configured_schema() {
    let mut original = Collection::open(Config::builder().schema(Vec::<String>::new()).build()).unwrap();
    original.insert(&json!({"id": 1, "name": "a"})).unwrap();
    original.insert(&json!({"id": 2, "name": "b"})).unwrap();

    let mut stored = Vec::new();
    original.write_to(&mut stored).unwrap();

    let fields = original.schema().unwrap().schema().fields().to_vec();
    let config = Config::builder()
        .schema(fields)
        .index("name", FieldKind::Text)
        .build();
    let mut reloaded = Collection::open(config).unwrap();

    assert_eq!(reloaded.load(BufReader::new(&stored[..])).unwrap(), 2);
    assert_eq!(reloaded.get(0).unwrap(), original.get(0).unwrap());
    assert_eq!(
        reloaded.find_lines(&json!({"name": "b"}), MatchMode::All).unwrap(),
        BTreeSet::from([1u64])
    );
}
