//! Reference resolution across resources, anchors and drafts.
use std::sync::Arc;

use anyhow::anyhow;
use jsonschema_eval::{
    Draft, Error, JsonSchema, SchemaRegistry, SchemaResolver, SchemaResolverError,
};
use serde_json::{json, Value};

fn isolated() -> Arc<SchemaRegistry> {
    Arc::new(SchemaRegistry::new())
}

#[test]
fn pointer_references_into_defs() {
    let schema = json!({
        "$ref": "#/$defs/positive",
        "$defs": {"positive": {"type": "integer", "exclusiveMinimum": 0}}
    });
    assert!(jsonschema_eval::is_valid(&schema, &json!(3)));
    assert!(!jsonschema_eval::is_valid(&schema, &json!(-3)));
}

#[test]
fn references_across_registered_documents() {
    let address = JsonSchema::from_value(&json!({
        "$id": "https://references.example/address",
        "type": "object",
        "required": ["city"],
        "properties": {"city": {"type": "string"}}
    }))
    .unwrap();
    let person = JsonSchema::from_value(&json!({
        "$id": "https://references.example/person",
        "type": "object",
        "properties": {"address": {"$ref": "address"}}
    }))
    .unwrap();
    let registry = isolated();
    registry
        .register("https://references.example/address", &address)
        .unwrap();
    let mut options = jsonschema_eval::options();
    let options = options.with_registry(registry);

    assert!(person
        .evaluate(&json!({"address": {"city": "Berlin"}}), options)
        .unwrap()
        .valid());
    assert!(!person
        .evaluate(&json!({"address": {}}), options)
        .unwrap()
        .valid());
}

#[test]
fn unresolved_references_abort() {
    let schema = JsonSchema::from_value(&json!({"$ref": "https://references.example/missing"}))
        .unwrap();
    let mut options = jsonschema_eval::options();
    let options = options.with_registry(isolated());
    let error = schema.evaluate(&json!(1), options).unwrap_err();
    assert!(matches!(error, Error::UnresolvedReference { .. }));
    assert_eq!(
        error.to_string(),
        "Reference 'https://references.example/missing' at '' cannot be resolved"
    );
}

struct MapResolver;

impl SchemaResolver for MapResolver {
    fn resolve(&self, uri: &str) -> Result<Value, SchemaResolverError> {
        if uri == "https://references.example/remote" {
            Ok(json!({"type": "string", "minLength": 2}))
        } else {
            Err(anyhow!("schema not found: {uri}"))
        }
    }
}

#[test]
fn resolver_supplies_unknown_documents() {
    let schema = JsonSchema::from_value(&json!({"$ref": "https://references.example/remote"}))
        .unwrap();
    let mut options = jsonschema_eval::options();
    let options = options.with_registry(isolated()).with_resolver(MapResolver);
    assert!(schema.evaluate(&json!("ok"), options).unwrap().valid());
    assert!(!schema.evaluate(&json!("x"), options).unwrap().valid());
}

#[test]
fn recursive_ref_extends_through_the_dynamic_scope() {
    let base = JsonSchema::from_value(&json!({
        "$schema": "https://json-schema.org/draft/2019-09/schema",
        "$id": "https://references.example/tree",
        "$recursiveAnchor": true,
        "type": "object",
        "properties": {"next": {"$recursiveRef": "#"}}
    }))
    .unwrap();
    let strict = JsonSchema::from_value(&json!({
        "$schema": "https://json-schema.org/draft/2019-09/schema",
        "$id": "https://references.example/strict-tree",
        "$recursiveAnchor": true,
        "$ref": "https://references.example/tree",
        "properties": {"name": {"type": "string"}}
    }))
    .unwrap();
    let registry = isolated();
    registry
        .register("https://references.example/tree", &base)
        .unwrap();
    let mut options = jsonschema_eval::options();
    let options = options.with_registry(registry);

    // Against the base schema alone, `name` is unconstrained.
    assert!(base
        .evaluate(&json!({"next": {"name": 42}}), options)
        .unwrap()
        .valid());
    // The extension re-binds the recursive anchor, so the nested object is
    // validated against the extension.
    assert!(!strict
        .evaluate(&json!({"next": {"name": 42}}), options)
        .unwrap()
        .valid());
    assert!(strict
        .evaluate(&json!({"next": {"name": "ok"}}), options)
        .unwrap()
        .valid());
}

#[test]
fn legacy_ref_suppresses_siblings() {
    // Under draft 7 any sibling of `$ref` is ignored.
    let schema = JsonSchema::from_value(&json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "definitions": {"s": {"type": "string"}},
        "properties": {
            "value": {
                "$ref": "#/definitions/s",
                "minimum": 100
            }
        }
    }))
    .unwrap();
    let mut options = jsonschema_eval::options();
    let options = options.with_registry(isolated());
    assert!(schema
        .evaluate(&json!({"value": "text"}), options)
        .unwrap()
        .valid());
}

#[test]
fn plain_name_id_fragments_declare_anchors_in_legacy_drafts() {
    let schema = JsonSchema::from_value(&json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "definitions": {"x": {"$id": "#leaf", "type": "boolean"}},
        "properties": {"flag": {"$ref": "#leaf"}}
    }))
    .unwrap();
    let mut options = jsonschema_eval::options();
    let options = options.with_registry(isolated());
    assert!(schema
        .evaluate(&json!({"flag": true}), options)
        .unwrap()
        .valid());
    assert!(!schema
        .evaluate(&json!({"flag": "no"}), options)
        .unwrap()
        .valid());
}

#[test]
fn legacy_root_ref_with_definitions() {
    let schema = JsonSchema::from_value(&json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "$ref": "#/definitions/positive",
        "definitions": {"positive": {"type": "integer", "minimum": 1}}
    }))
    .unwrap();
    let mut options = jsonschema_eval::options();
    let options = options.with_registry(isolated());
    assert!(schema.evaluate(&json!(2), options).unwrap().valid());
    assert!(!schema.evaluate(&json!(0), options).unwrap().valid());
}

#[test]
fn dynamic_constructs_are_rejected_under_legacy_drafts() {
    let schema = JsonSchema::from_value(&json!({"$dynamicRef": "#node"})).unwrap();
    let mut options = jsonschema_eval::options();
    let options = options.with_registry(isolated()).with_draft(Draft::Draft7);
    let error = schema.evaluate(&json!(1), options).unwrap_err();
    assert!(matches!(error, Error::UnsupportedSchema { .. }));
}

#[test]
fn self_referential_schemas_terminate() {
    // `{"$ref": "#"}` cannot make progress; crossing it twice at one
    // instance location is cut short instead of recursing forever.
    let schema = JsonSchema::from_value(&json!({"$ref": "#"})).unwrap();
    let mut options = jsonschema_eval::options();
    let options = options.with_registry(isolated());
    assert!(schema.evaluate(&json!({"a": 1}), options).unwrap().valid());
}

#[test]
fn custom_meta_schema_chains_terminate_at_known_drafts() {
    struct MetaResolver;
    impl SchemaResolver for MetaResolver {
        fn resolve(&self, uri: &str) -> Result<Value, SchemaResolverError> {
            match uri {
                "https://references.example/meta-a" => Ok(json!({
                    "$schema": "https://references.example/meta-b",
                    "$id": "https://references.example/meta-a"
                })),
                "https://references.example/meta-b" => Ok(json!({
                    "$schema": "https://json-schema.org/draft/2019-09/schema",
                    "$id": "https://references.example/meta-b"
                })),
                "https://references.example/cycle-a" => Ok(json!({
                    "$schema": "https://references.example/cycle-b",
                    "$id": "https://references.example/cycle-a"
                })),
                "https://references.example/cycle-b" => Ok(json!({
                    "$schema": "https://references.example/cycle-a",
                    "$id": "https://references.example/cycle-b"
                })),
                _ => Err(anyhow!("schema not found: {uri}")),
            }
        }
    }

    // The chain a -> b -> 2019-09 resolves, and the schema picks up
    // draft 2019-09 semantics: `$recursiveAnchor` is accepted.
    let schema = JsonSchema::from_value(&json!({
        "$schema": "https://references.example/meta-a",
        "$recursiveAnchor": true,
        "type": "integer"
    }))
    .unwrap();
    let mut options = jsonschema_eval::options();
    let options = options
        .with_registry(isolated())
        .with_resolver(MetaResolver);
    assert!(schema.evaluate(&json!(3), options).unwrap().valid());

    // A multi-step cycle fails instead of looping.
    let schema = JsonSchema::from_value(&json!({
        "$schema": "https://references.example/cycle-a",
        "type": "integer"
    }))
    .unwrap();
    let mut options = jsonschema_eval::options();
    let options = options
        .with_registry(isolated())
        .with_resolver(MetaResolver);
    let error = schema.evaluate(&json!(3), options).unwrap_err();
    assert!(matches!(error, Error::UnresolvableMetaSchema { .. }));
}
