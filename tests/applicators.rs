//! Applicator composition, annotations and the `unevaluated*` keywords.
use jsonschema_eval::{paths::JsonPointer, OutputFormat};
use serde_json::{json, Value};
use test_case::test_case;

#[test_case(&json!({"a": 1}), true; "declared property")]
#[test_case(&json!({"b": 1}), false; "undeclared property")]
fn unevaluated_properties_see_through_all_of(instance: &Value, expected: bool) {
    let schema = json!({
        "allOf": [{"properties": {"a": true}}],
        "unevaluatedProperties": false
    });
    assert_eq!(jsonschema_eval::is_valid(&schema, instance), expected);
}

#[test]
fn unevaluated_properties_see_through_references() {
    let schema = json!({
        "$defs": {"named": {"properties": {"name": {"type": "string"}}}},
        "$ref": "#/$defs/named",
        "unevaluatedProperties": false
    });
    assert!(jsonschema_eval::is_valid(&schema, &json!({"name": "x"})));
    assert!(!jsonschema_eval::is_valid(&schema, &json!({"name": "x", "age": 3})));
}

#[test]
fn unevaluated_properties_ignore_failed_branches() {
    // Annotations of failed subschemas are dropped, so `a` counts as
    // unevaluated when the branch that covered it failed.
    let schema = json!({
        "anyOf": [
            {"properties": {"a": {"type": "integer"}}, "required": ["a"]},
            {"properties": {"b": true}, "required": ["b"]}
        ],
        "unevaluatedProperties": false
    });
    assert!(jsonschema_eval::is_valid(&schema, &json!({"a": 1})));
    assert!(!jsonschema_eval::is_valid(&schema, &json!({"a": "s", "b": 2})));
}

#[test]
fn unevaluated_items_respect_prefix_and_contains() {
    let schema = json!({
        "prefixItems": [{"type": "integer"}],
        "contains": {"type": "string"},
        "unevaluatedItems": false
    });
    assert!(jsonschema_eval::is_valid(&schema, &json!([1, "found"])));
    assert!(!jsonschema_eval::is_valid(&schema, &json!([1, "found", null])));
}

#[test]
fn items_apply_after_prefix_items() {
    let schema = json!({
        "prefixItems": [{"type": "string"}],
        "items": {"type": "integer"}
    });
    assert!(jsonschema_eval::is_valid(&schema, &json!(["head", 1, 2])));
    assert!(!jsonschema_eval::is_valid(&schema, &json!(["head", 1, "tail"])));
    assert!(!jsonschema_eval::is_valid(&schema, &json!([1])));
}

#[test]
fn legacy_tuple_items_and_additional_items() {
    let schema = json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "items": [{"type": "string"}, {"type": "integer"}],
        "additionalItems": {"type": "boolean"}
    });
    assert!(jsonschema_eval::is_valid(&schema, &json!(["a", 1, true, false])));
    assert!(!jsonschema_eval::is_valid(&schema, &json!(["a", 1, "nope"])));
    assert!(jsonschema_eval::is_valid(&schema, &json!(["a"])));
}

#[test]
fn legacy_dependencies() {
    let schema = json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "dependencies": {
            "credit_card": ["billing_address"],
            "name": {"properties": {"name": {"type": "string"}}}
        }
    });
    assert!(jsonschema_eval::is_valid(
        &schema,
        &json!({"credit_card": "4111", "billing_address": "x"})
    ));
    assert!(!jsonschema_eval::is_valid(&schema, &json!({"credit_card": "4111"})));
    assert!(!jsonschema_eval::is_valid(&schema, &json!({"name": 42})));
    assert!(jsonschema_eval::is_valid(&schema, &json!({"other": 1})));
}

#[test]
fn dependent_schemas() {
    let schema = json!({
        "dependentSchemas": {
            "credit_card": {"required": ["billing_address"]}
        }
    });
    assert!(!jsonschema_eval::is_valid(&schema, &json!({"credit_card": "4111"})));
    assert!(jsonschema_eval::is_valid(&schema, &json!({"other": 1})));
}

#[test_case(&json!([2, 3, 4]), false; "no match")]
#[test_case(&json!([2, 3, 10]), false; "too few")]
#[test_case(&json!([8, 9, 10]), true; "enough")]
#[test_case(&json!([6, 7, 8, 9]), false; "too many")]
fn contains_with_count_limits(instance: &Value, expected: bool) {
    let schema = json!({
        "contains": {"minimum": 5},
        "minContains": 2,
        "maxContains": 3
    });
    assert_eq!(jsonschema_eval::is_valid(&schema, instance), expected);
}

#[test]
fn min_contains_zero_accepts_empty_match_sets() {
    let schema = json!({"contains": {"minimum": 5}, "minContains": 0});
    assert!(jsonschema_eval::is_valid(&schema, &json!([1, 2])));
}

#[test]
fn min_contains_owns_the_count_failure() {
    // With a `minContains` sibling, an unsatisfied match count is reported
    // once, under `minContains`.
    let schema = json!({"contains": {"minimum": 5}, "minContains": 2});
    let results = jsonschema_eval::options()
        .with_output_format(OutputFormat::List)
        .evaluate(&schema, &json!([1, 2]))
        .unwrap();
    assert!(!results.valid());
    let root = results
        .details()
        .iter()
        .find(|unit| unit.evaluation_path().map_or(false, JsonPointer::is_empty))
        .expect("The root unit");
    let errors = root.errors().unwrap();
    assert!(errors.contains_key("minContains"));
    assert!(!errors.contains_key("contains"));
}

#[test]
fn then_and_else_skip_without_if() {
    // `then`/`else` alone have no effect.
    assert!(jsonschema_eval::is_valid(&json!({"then": {"minimum": 10}}), &json!(1)));
    assert!(jsonschema_eval::is_valid(&json!({"else": {"minimum": 10}}), &json!(1)));
}

#[test]
fn conditional_composition() {
    let schema = json!({
        "if": {"properties": {"kind": {"const": "card"}}, "required": ["kind"]},
        "then": {"required": ["number"]},
        "else": {"required": ["iban"]}
    });
    assert!(jsonschema_eval::is_valid(
        &schema,
        &json!({"kind": "card", "number": "4111"})
    ));
    assert!(!jsonschema_eval::is_valid(&schema, &json!({"kind": "card"})));
    assert!(jsonschema_eval::is_valid(
        &schema,
        &json!({"kind": "sepa", "iban": "DE02"})
    ));
    assert!(!jsonschema_eval::is_valid(&schema, &json!({"kind": "sepa"})));
}

#[test]
fn one_of_reports_the_match_count() {
    let schema = json!({"oneOf": [{"type": "integer"}, {"minimum": 2}]});
    let results = jsonschema_eval::options()
        .with_output_format(OutputFormat::List)
        .evaluate(&schema, &json!(3))
        .unwrap();
    let message = results.details()[0].errors().unwrap()["oneOf"]
        .as_str()
        .unwrap()
        .to_string();
    assert_eq!(message, "Value matches 2 schemas but exactly one is required");
}

#[test]
fn property_names_report_offenders() {
    let schema = json!({"propertyNames": {"maxLength": 3}});
    let results = jsonschema_eval::options()
        .with_output_format(OutputFormat::List)
        .evaluate(&schema, &json!({"ok": 1, "toolong": 2}))
        .unwrap();
    let message = results.details()[0].errors().unwrap()["propertyNames"]
        .as_str()
        .unwrap()
        .to_string();
    assert_eq!(
        message,
        "Property names [\"toolong\"] do not match the schema"
    );
}

#[test]
fn nested_applicators_compose() {
    let schema = json!({
        "type": "object",
        "properties": {
            "pets": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["name"],
                    "properties": {
                        "name": {"type": "string"},
                        "age": {"type": "integer", "minimum": 0}
                    }
                }
            }
        }
    });
    assert!(jsonschema_eval::is_valid(
        &schema,
        &json!({"pets": [{"name": "rex", "age": 3}]})
    ));
    assert!(!jsonschema_eval::is_valid(
        &schema,
        &json!({"pets": [{"name": "rex", "age": -1}]})
    ));
    assert!(!jsonschema_eval::is_valid(&schema, &json!({"pets": [{}]})));
}
