//! Schema Tests
//!
//! Tests verify:
//! - Field list management and versioning
//! - Auto-detection from sample records
//! - Object ⇄ positional row conversion
//! - Schema evolution with older, shorter rows

use linestore::{SchemaCodec, StoreError};
use serde_json::{json, Value};

// =============================================================================
// Field List Tests
// =============================================================================

#[test]
fn test_new_schema_is_empty() {
    let codec = SchemaCodec::new();
    assert!(codec.schema().is_empty());
    assert_eq!(codec.schema().version(), 0);
}

#[test]
fn test_set_schema_builds_bijection() {
    let codec = SchemaCodec::with_fields(["id", "name", "age"]).unwrap();
    let schema = codec.schema();

    assert_eq!(schema.len(), 3);
    for (pos, name) in ["id", "name", "age"].iter().enumerate() {
        assert_eq!(schema.index_of(name), Some(pos));
        assert_eq!(schema.field_at(pos), Some(*name));
    }
    assert_eq!(schema.index_of("unknown"), None);
    assert_eq!(schema.field_at(3), None);
}

#[test]
fn test_set_schema_rejects_duplicates() {
    let mut codec = SchemaCodec::new();
    let result = codec.set_schema(["id", "name", "id"]);

    assert!(matches!(result, Err(StoreError::InvalidInput(_))));
    assert!(codec.schema().is_empty());
}

#[test]
fn test_set_schema_replaces_previous_fields() {
    let mut codec = SchemaCodec::with_fields(["a", "b"]).unwrap();
    codec.set_schema(["c"]).unwrap();

    assert_eq!(codec.schema().fields(), ["c"]);
    assert_eq!(codec.schema().index_of("a"), None);
}

#[test]
fn test_version_bumps_on_set_and_reset() {
    let mut codec = SchemaCodec::new();
    codec.set_schema(["a"]).unwrap();
    assert_eq!(codec.schema().version(), 1);

    codec.add_field("b");
    assert_eq!(codec.schema().version(), 1);

    codec.reset();
    assert_eq!(codec.schema().version(), 2);
    assert!(codec.schema().is_empty());
}

// =============================================================================
// Auto-Detection Tests
// =============================================================================

#[test]
fn test_auto_detect_sorts_fields() {
    let mut codec = SchemaCodec::new();
    codec
        .auto_detect_schema(&json!({"zeta": 1, "id": 2, "alpha": 3}))
        .unwrap();

    assert_eq!(codec.schema().fields(), ["alpha", "id", "zeta"]);
}

#[test]
fn test_auto_detect_appends_missing_id() {
    let mut codec = SchemaCodec::new();
    codec.auto_detect_schema(&json!({"name": "x", "age": 3})).unwrap();

    assert_eq!(codec.schema().fields(), ["age", "name", "id"]);
}

#[test]
fn test_auto_detect_uses_first_array_element() {
    let mut codec = SchemaCodec::new();
    codec
        .auto_detect_schema(&json!([{"b": 1, "id": 1}, {"c": 2}]))
        .unwrap();

    assert_eq!(codec.schema().fields(), ["b", "id"]);
}

#[test]
fn test_auto_detect_rejects_non_object() {
    let mut codec = SchemaCodec::new();

    assert!(matches!(
        codec.auto_detect_schema(&json!(42)),
        Err(StoreError::InvalidInput(_))
    ));
    assert!(matches!(
        codec.auto_detect_schema(&json!([])),
        Err(StoreError::InvalidInput(_))
    ));
}

// =============================================================================
// add_field Tests
// =============================================================================

#[test]
fn test_add_field_is_idempotent() {
    let mut codec = SchemaCodec::with_fields(["id", "name"]).unwrap();

    assert_eq!(codec.add_field("name"), 1);
    assert_eq!(codec.add_field("email"), 2);
    assert_eq!(codec.add_field("email"), 2);
    assert_eq!(codec.schema().fields(), ["id", "name", "email"]);
}

#[test]
fn test_add_field_never_renumbers() {
    let mut codec = SchemaCodec::with_fields(["id", "name"]).unwrap();
    codec.add_field("age");

    assert_eq!(codec.schema().index_of("id"), Some(0));
    assert_eq!(codec.schema().index_of("name"), Some(1));
    assert_eq!(codec.schema().index_of("age"), Some(2));
}

// =============================================================================
// Conversion Tests
// =============================================================================

#[test]
fn test_object_to_array_orders_by_schema() {
    let codec = SchemaCodec::with_fields(["id", "name", "age"]).unwrap();
    let row = codec
        .object_to_array(&json!({"age": 30, "id": 1, "name": "Ann"}))
        .unwrap();

    assert_eq!(row, vec![Some(json!(1)), Some(json!("Ann")), Some(json!(30))]);
}

#[test]
fn test_object_to_array_marks_missing_distinct_from_null() {
    let codec = SchemaCodec::with_fields(["id", "name", "age"]).unwrap();
    let row = codec.object_to_array(&json!({"id": 1, "name": null})).unwrap();

    assert_eq!(row, vec![Some(json!(1)), Some(Value::Null), None]);
}

#[test]
fn test_object_to_array_drops_extra_fields() {
    let codec = SchemaCodec::with_fields(["id"]).unwrap();
    let row = codec.object_to_array(&json!({"id": 1, "extra": true})).unwrap();

    assert_eq!(row, vec![Some(json!(1))]);
}

#[test]
fn test_object_to_array_passthrough_for_non_object() {
    let codec = SchemaCodec::with_fields(["id"]).unwrap();

    assert_eq!(codec.object_to_array(&json!([1, 2])), None);
    assert_eq!(codec.object_to_array(&json!("text")), None);
}

#[test]
fn test_array_to_object_drops_missing() {
    let codec = SchemaCodec::with_fields(["id", "name", "age"]).unwrap();
    let object = codec.array_to_object(&[Some(json!(1)), None, Some(Value::Null)]);

    assert_eq!(object, json!({"id": 1, "age": null}));
}

#[test]
fn test_array_to_object_ignores_trailing_positions() {
    let codec = SchemaCodec::with_fields(["id"]).unwrap();
    let object = codec.array_to_object(&[Some(json!(1)), Some(json!("extra"))]);

    assert_eq!(object, json!({"id": 1}));
}

#[test]
fn test_round_trip_restricts_to_schema() {
    let codec = SchemaCodec::with_fields(["id", "name", "tags"]).unwrap();
    let record = json!({
        "id": 7,
        "name": "Bob",
        "tags": ["x", "y"],
        "ignored": {"deep": true}
    });

    let row = codec.object_to_array(&record).unwrap();
    let restored = codec.array_to_object(&row);

    assert_eq!(restored, json!({"id": 7, "name": "Bob", "tags": ["x", "y"]}));
}

#[test]
fn test_older_short_row_decodes_after_evolution() {
    let mut codec = SchemaCodec::with_fields(["id", "name"]).unwrap();
    let old_row = codec.object_to_array(&json!({"id": 1, "name": "old"})).unwrap();

    codec.add_field("email");
    let restored = codec.array_to_object(&old_row);

    assert_eq!(restored, json!({"id": 1, "name": "old"}));
    assert!(restored.get("email").is_none());
}

#[test]
fn test_stored_form_round_trip() {
    let codec = SchemaCodec::with_fields(["id", "name", "age"]).unwrap();
    let row = codec.object_to_array(&json!({"id": 1, "age": 40})).unwrap();

    let stored = SchemaCodec::row_to_value(&row);
    assert_eq!(stored, json!([1, null, 40]));

    let restored = codec.value_to_object(&stored).unwrap();
    assert_eq!(restored, json!({"id": 1, "name": null, "age": 40}));
    assert_eq!(codec.value_to_object(&json!({"id": 1})), None);
}

// =============================================================================
// Validation Tests
// =============================================================================

#[test]
fn test_validate_object() {
    let codec = SchemaCodec::with_fields(["id", "name"]).unwrap();

    assert!(codec.validate_object(&json!({"id": 1, "name": "a", "extra": 0})));
    assert!(codec.validate_object(&json!({"id": 1, "name": null})));
    assert!(!codec.validate_object(&json!({"id": 1})));
    assert!(!codec.validate_object(&json!([1, "a"])));
}
