//! Output shapes and message rendering.
use std::sync::Arc;

use jsonschema_eval::{JsonSchema, OutputFormat, SchemaRegistry};
use serde_json::{json, Value};

#[test]
fn flag_output_is_just_a_flag() {
    let results = jsonschema_eval::evaluate(&json!({"type": "integer"}), &json!(1)).unwrap();
    assert!(results.valid());
    assert!(results.evaluation_path().is_none());
    assert!(results.details().is_empty());
    assert_eq!(serde_json::to_value(&results).unwrap(), json!({"valid": true}));
}

#[test]
fn list_output_keeps_only_carrying_units() {
    let schema = json!({
        "title": "point",
        "properties": {
            "x": {"type": "number"},
            "y": {"type": "number"}
        }
    });
    let results = jsonschema_eval::options()
        .with_output_format(OutputFormat::List)
        .evaluate(&schema, &json!({"x": 1, "y": "two"}))
        .unwrap();
    assert!(!results.valid());
    // Every listed unit carries errors or annotations.
    for unit in results.details() {
        assert!(unit.errors().is_some() || unit.annotations().is_some());
        assert!(unit.evaluation_path().is_some());
        assert!(unit.instance_location().is_some());
        assert!(unit.details().is_empty());
    }
    let failed = results
        .details()
        .iter()
        .find(|unit| unit.errors().is_some())
        .unwrap();
    assert_eq!(failed.evaluation_path().unwrap().to_string(), "/properties/y");
    assert_eq!(failed.instance_location().unwrap().to_string(), "/y");
}

#[test]
fn hierarchical_output_keeps_the_tree() {
    let schema = json!({
        "allOf": [
            {"properties": {"a": {"type": "integer"}}}
        ]
    });
    let results = jsonschema_eval::options()
        .with_output_format(OutputFormat::Hierarchical)
        .evaluate(&schema, &json!({"a": "x"}))
        .unwrap();
    assert!(!results.valid());
    assert_eq!(results.evaluation_path().unwrap().to_string(), "");
    let branch = &results.details()[0];
    assert_eq!(branch.evaluation_path().unwrap().to_string(), "/allOf/0");
    let leaf = &branch.details()[0];
    assert_eq!(
        leaf.evaluation_path().unwrap().to_string(),
        "/allOf/0/properties/a"
    );
    assert!(leaf.errors().unwrap().contains_key("type"));

    // The same failure is reachable through `find`.
    assert!(results.find("/allOf/0/properties/a").is_some());
}

#[test]
fn schema_locations_are_absolute() {
    let schema = JsonSchema::from_value(&json!({
        "$id": "https://output.example/point",
        "properties": {"x": {"type": "number"}}
    }))
    .unwrap();
    let mut options = jsonschema_eval::options();
    let options = options
        .with_registry(Arc::new(SchemaRegistry::new()))
        .with_output_format(OutputFormat::List);
    let results = schema.evaluate(&json!({"x": "s"}), options).unwrap();
    let failed = results
        .details()
        .iter()
        .find(|unit| unit.errors().is_some())
        .unwrap();
    assert_eq!(
        failed.schema_location().unwrap(),
        "https://output.example/point#/properties/x"
    );
}

#[test]
fn annotations_survive_only_on_valid_units() {
    let schema = json!({"title": "count", "type": "integer"});
    let valid = jsonschema_eval::options()
        .with_output_format(OutputFormat::Hierarchical)
        .evaluate(&schema, &json!(2))
        .unwrap();
    assert_eq!(
        valid.annotations().and_then(|annotations| annotations.get("title")),
        Some(&json!("count"))
    );
    let invalid = jsonschema_eval::options()
        .with_output_format(OutputFormat::Hierarchical)
        .evaluate(&schema, &json!("two"))
        .unwrap();
    assert!(invalid.annotations().is_none());
}

#[test]
fn culture_selects_message_templates() {
    jsonschema_eval::messages::set_message(
        "minimum",
        Some("x-terse"),
        "[[received]] < [[limit]]",
    );
    let schema = json!({"minimum": 10});
    let results = jsonschema_eval::options()
        .with_culture("x-terse")
        .with_output_format(OutputFormat::List)
        .evaluate(&schema, &json!(3))
        .unwrap();
    assert_eq!(results.details()[0].errors().unwrap()["minimum"], json!("3 < 10"));

    // Unknown cultures fall back to the neutral table.
    let results = jsonschema_eval::options()
        .with_culture("x-unknown")
        .with_output_format(OutputFormat::List)
        .evaluate(&schema, &json!(3))
        .unwrap();
    assert_eq!(
        results.details()[0].errors().unwrap()["minimum"],
        json!("3 should be at least 10")
    );
}

#[test]
fn serialized_units_follow_the_output_specification() {
    let results = jsonschema_eval::options()
        .with_output_format(OutputFormat::List)
        .evaluate(&json!({"required": ["a"]}), &json!({}))
        .unwrap();
    let serialized = serde_json::to_value(&results).unwrap();
    let unit = &serialized["details"][0];
    assert_eq!(unit["valid"], Value::Bool(false));
    assert_eq!(unit["evaluationPath"], json!(""));
    assert_eq!(unit["instanceLocation"], json!(""));
    assert!(unit["schemaLocation"].is_string());
    assert_eq!(
        unit["errors"]["required"],
        json!("Required properties [\"a\"] are not present")
    );
}
