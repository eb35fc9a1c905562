//! A JSON Schema evaluation engine for Rust.
//!
//! - Drafts 6, 7, 2019-09, 2020-12 and "next", with per-resource draft
//!   detection
//! - `$ref`, `$anchor`, `$dynamicRef`/`$dynamicAnchor` and
//!   `$recursiveRef`/`$recursiveAnchor` resolution
//! - Flag, list and hierarchical output following the JSON Schema 2020-12
//!   output specification
//! - Localizable, overridable error messages
//!
//! # Evaluation
//!
//! For a one-off check use [`is_valid`] or [`evaluate`]:
//!
//! ```
//! use serde_json::json;
//!
//! let schema = json!({"type": "string"});
//! assert!(jsonschema_eval::is_valid(&schema, &json!("Hello, world!")));
//! assert!(!jsonschema_eval::is_valid(&schema, &json!(42)));
//! ```
//!
//! When the same schema is evaluated repeatedly, parse it once and reuse it;
//! compiled constraints are cached on the schema:
//!
//! ```
//! # fn main() -> Result<(), jsonschema_eval::Error> {
//! use jsonschema_eval::JsonSchema;
//! use serde_json::json;
//!
//! let schema = JsonSchema::from_value(&json!({"minItems": 2}))?;
//! let options = jsonschema_eval::options();
//! assert!(schema.evaluate(&json!([1, 2]), &options)?.valid());
//! assert!(!schema.evaluate(&json!([1]), &options)?.valid());
//! # Ok(())
//! # }
//! ```
//!
//! # Output formats
//!
//! The default output is a plain flag; `List` and `Hierarchical` produce
//! output units with evaluation paths, schema locations and rendered error
//! messages:
//!
//! ```
//! # fn main() -> Result<(), jsonschema_eval::Error> {
//! use jsonschema_eval::OutputFormat;
//! use serde_json::json;
//!
//! let schema = json!({"properties": {"count": {"type": "integer"}}});
//! let results = jsonschema_eval::options()
//!     .with_output_format(OutputFormat::List)
//!     .evaluate(&schema, &json!({"count": "three"}))?;
//! assert!(!results.valid());
//! let unit = results
//!     .details()
//!     .iter()
//!     .find(|unit| unit.errors().is_some())
//!     .expect("A failed unit");
//! assert_eq!(
//!     unit.evaluation_path().unwrap().to_string(),
//!     "/properties/count"
//! );
//! # Ok(())
//! # }
//! ```
mod compiler;
mod drafts;
mod error;
mod evaluation;
mod init;
mod keywords;
pub mod messages;
mod meta;
mod options;
mod output;
pub mod paths;
mod primitive_type;
mod registry;
mod resolver;
mod schema;
mod uri;

use std::{str::FromStr, sync::Arc};

use serde_json::Value;

pub use crate::{
    drafts::Draft,
    error::{Error, UriError},
    options::EvaluationOptions,
    output::{OutputFormat, Results},
    primitive_type::PrimitiveType,
    registry::SchemaRegistry,
    resolver::{SchemaResolver, SchemaResolverError},
};

use crate::{
    compiler::{Context, DynamicScope},
    paths::JsonPointer,
    schema::Schema,
};

/// A parsed schema document.
///
/// Parsing is draft-agnostic; identifiers are resolved and the draft
/// determined on first evaluation (or when the document is registered in a
/// [`SchemaRegistry`]).
#[derive(Clone)]
pub struct JsonSchema {
    root: Arc<Schema>,
}

impl JsonSchema {
    /// Parse a schema from a JSON value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] when the value is neither a boolean nor an
    /// object, or a keyword argument is ill-typed.
    pub fn from_value(value: &Value) -> Result<JsonSchema, Error> {
        Ok(JsonSchema {
            root: Schema::parse(value)?,
        })
    }

    /// Parse a schema from a UTF-8 JSON byte stream.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] on malformed JSON or ill-typed keywords.
    pub fn from_reader(reader: impl std::io::Read) -> Result<JsonSchema, Error> {
        let value: Value = serde_json::from_reader(reader)?;
        JsonSchema::from_value(&value)
    }

    /// Serialize back to JSON. Keyword order and unrecognized keywords are
    /// preserved.
    #[must_use]
    pub fn to_value(&self) -> Value {
        self.root.to_value()
    }

    /// Evaluate an instance against this schema.
    ///
    /// Initialization (identifier assignment and registration) runs
    /// on every call and is idempotent; concurrent evaluations of one
    /// document are supported.
    ///
    /// # Errors
    ///
    /// Returns an error when a reference cannot be resolved, a custom
    /// meta-schema chain does not terminate, or the schema uses a construct
    /// unsupported under its draft. A failing instance is *not* an error.
    pub fn evaluate(
        &self,
        instance: &Value,
        options: &EvaluationOptions,
    ) -> Result<Results, Error> {
        let registry = options.registry();
        init::initialize(&self.root, &registry, options)?;
        let mut ctx = Context::new(DynamicScope::seeded(self.root.base_uri()), options);
        let constraint = compiler::constraint_for(
            &self.root,
            JsonPointer::default(),
            JsonPointer::default(),
            JsonPointer::default(),
            &mut ctx,
        )?;
        let evaluation = evaluation::evaluate(
            &constraint,
            instance,
            JsonPointer::default(),
            JsonPointer::default(),
            &mut ctx,
        )?;
        Ok(output::assemble(&evaluation, options))
    }

    pub(crate) fn root(&self) -> &Arc<Schema> {
        &self.root
    }

    pub(crate) fn from_root(root: Arc<Schema>) -> JsonSchema {
        JsonSchema { root }
    }
}

impl FromStr for JsonSchema {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let value: Value = serde_json::from_str(text)?;
        JsonSchema::from_value(&value)
    }
}

/// Get [`EvaluationOptions`] for configuring evaluation.
#[must_use]
pub fn options() -> EvaluationOptions {
    EvaluationOptions::default()
}

/// Evaluate `instance` against `schema` with default options, producing flag
/// output.
///
/// # Errors
///
/// Returns an error when the schema is malformed or a reference cannot be
/// resolved.
pub fn evaluate(schema: &Value, instance: &Value) -> Result<Results, Error> {
    EvaluationOptions::default().evaluate(schema, instance)
}

/// A shortcut for checking `instance` against `schema`.
///
/// ```
/// use serde_json::json;
///
/// assert!(jsonschema_eval::is_valid(&json!({"maxLength": 5}), &json!("foo")));
/// ```
///
/// # Panics
///
/// Panics if the schema is invalid.
#[must_use]
pub fn is_valid(schema: &Value, instance: &Value) -> bool {
    evaluate(schema, instance)
        .expect("Invalid schema")
        .valid()
}

#[cfg(test)]
pub(crate) mod tests_util {
    use serde_json::Value;

    pub(crate) fn is_valid(schema: &Value, instance: &Value) {
        assert!(
            crate::evaluate(schema, instance)
                .expect("Invalid schema")
                .valid(),
            "{instance} should be valid against {schema}"
        );
    }

    pub(crate) fn is_not_valid(schema: &Value, instance: &Value) {
        assert!(
            !crate::evaluate(schema, instance)
                .expect("Invalid schema")
                .valid(),
            "{instance} should not be valid against {schema}"
        );
    }

    pub(crate) fn error_message(schema: &Value, instance: &Value, keyword: &str) -> String {
        let results = crate::options()
            .with_output_format(crate::OutputFormat::List)
            .evaluate(schema, instance)
            .expect("Invalid schema");
        results
            .details()
            .iter()
            .find_map(|unit| {
                unit.errors()
                    .and_then(|errors| errors.get(keyword))
                    .and_then(Value::as_str)
                    .map(str::to_string)
            })
            .unwrap_or_else(|| panic!("No '{keyword}' error for {instance}"))
    }
}

#[cfg(test)]
mod tests {
    use super::{is_valid, tests_util};
    use serde_json::{json, Value};
    use test_case::test_case;

    #[test]
    fn test_is_valid() {
        let schema = json!({"minLength": 5});
        assert!(is_valid(&schema, &json!("foobar")));
        assert!(!is_valid(&schema, &json!("foo")));
    }

    #[test_case(&json!({"type": "integer"}), &json!(1))]
    #[test_case(&json!({"type": "number"}), &json!(1))]
    #[test_case(&json!({"type": ["integer", "string"]}), &json!("x"))]
    #[test_case(&json!({"enum": [1, 2]}), &json!(2.0))]
    #[test_case(&json!({"const": {"a": [1.0]}}), &json!({"a": [1]}))]
    #[test_case(&json!({"multipleOf": 0.5}), &json!(4.5))]
    #[test_case(&json!({"multipleOf": 2}), &json!(-8))]
    #[test_case(&json!({"multipleOf": 1.5}), &json!(-4.5))]
    #[test_case(&json!({"maximum": 3}), &json!(3))]
    #[test_case(&json!({"exclusiveMaximum": 3}), &json!(2.9))]
    #[test_case(&json!({"minimum": 1.5}), &json!(2))]
    #[test_case(&json!({"exclusiveMinimum": 1}), &json!(1.5))]
    #[test_case(&json!({"maxLength": 2}), &json!("ab"))]
    #[test_case(&json!({"minLength": 2}), &json!("ab"))]
    #[test_case(&json!({"pattern": "^a+$"}), &json!("aaa"))]
    #[test_case(&json!({"maxItems": 2}), &json!([1, 2]))]
    #[test_case(&json!({"uniqueItems": true}), &json!([1, 2]))]
    #[test_case(&json!({"maxProperties": 1}), &json!({"a": 1}))]
    #[test_case(&json!({"minProperties": 1}), &json!({"a": 1}))]
    #[test_case(&json!({"required": ["a"]}), &json!({"a": null}))]
    #[test_case(&json!({"dependentRequired": {"a": ["b"]}}), &json!({"a": 1, "b": 2}))]
    #[test_case(&json!({"allOf": [{"type": "integer"}, {"minimum": 0}]}), &json!(1))]
    #[test_case(&json!({"anyOf": [{"type": "integer"}, {"minimum": 2}]}), &json!(1))]
    #[test_case(&json!({"oneOf": [{"type": "integer"}, {"minimum": 2}]}), &json!(1))]
    #[test_case(&json!({"not": {"type": "integer"}}), &json!("a"))]
    #[test_case(&json!({"if": {"type": "integer"}, "then": {"minimum": 0}}), &json!(1))]
    #[test_case(&json!({"if": {"type": "integer"}, "else": {"minLength": 1}}), &json!("a"))]
    #[test_case(&json!({"items": {"type": "integer"}}), &json!([1, 2]))]
    #[test_case(&json!({"contains": {"minimum": 5}}), &json!([1, 6]))]
    #[test_case(&json!({"properties": {"a": {"type": "integer"}}}), &json!({"a": 1}))]
    #[test_case(&json!({"patternProperties": {"^x": {"type": "integer"}}}), &json!({"xa": 1}))]
    #[test_case(&json!({"propertyNames": {"maxLength": 3}}), &json!({"abc": 1}))]
    #[test_case(&json!({"additionalProperties": false, "properties": {"a": {}}}), &json!({"a": 1}))]
    // Keywords apply only to their own primitive type.
    #[test_case(&json!({"minimum": 10}), &json!("string"))]
    #[test_case(&json!({"minLength": 10}), &json!(5))]
    #[test_case(&json!({"minItems": 10}), &json!({"a": 1}))]
    #[test_case(&json!({"required": ["a"]}), &json!([1]))]
    fn accepts(schema: &Value, instance: &Value) {
        tests_util::is_valid(schema, instance);
    }

    #[test_case(&json!({"type": "integer"}), &json!(1.5))]
    #[test_case(&json!({"type": ["integer", "string"]}), &json!(null))]
    #[test_case(&json!({"enum": [1, 2]}), &json!(3))]
    #[test_case(&json!({"const": 2}), &json!(5))]
    #[test_case(&json!({"multipleOf": 2}), &json!(7); "multiple_of_2_positive_7")]
    #[test_case(&json!({"multipleOf": 2}), &json!(-7); "multiple_of_2_negative_7")]
    #[test_case(&json!({"multipleOf": 2}), &json!(3.5))]
    #[test_case(&json!({"multipleOf": 1.5}), &json!(-4))]
    #[test_case(&json!({"maximum": 3}), &json!(3.5))]
    #[test_case(&json!({"exclusiveMaximum": 3}), &json!(3))]
    #[test_case(&json!({"minimum": 3}), &json!(2.5))]
    #[test_case(&json!({"exclusiveMinimum": 1}), &json!(1))]
    #[test_case(&json!({"maxLength": 2}), &json!("abc"))]
    #[test_case(&json!({"minLength": 2}), &json!("a"))]
    #[test_case(&json!({"pattern": "^a+$"}), &json!("abc"))]
    #[test_case(&json!({"maxItems": 2}), &json!([1, 2, 3]))]
    #[test_case(&json!({"minItems": 2}), &json!([1]))]
    #[test_case(&json!({"uniqueItems": true}), &json!([1, 1.0]))]
    #[test_case(&json!({"maxProperties": 1}), &json!({"a": 1, "b": 2}))]
    #[test_case(&json!({"minProperties": 2}), &json!({"a": 1}))]
    #[test_case(&json!({"required": ["a", "b"]}), &json!({"a": 1}))]
    #[test_case(&json!({"dependentRequired": {"a": ["b"]}}), &json!({"a": 1}))]
    #[test_case(&json!({"allOf": [{"type": "integer"}, {"minimum": 2}]}), &json!(1))]
    #[test_case(&json!({"anyOf": [{"type": "string"}, {"minimum": 2}]}), &json!(1))]
    #[test_case(&json!({"oneOf": [{"type": "integer"}, {"minimum": 2}]}), &json!(3))]
    #[test_case(&json!({"not": {"type": "integer"}}), &json!(1))]
    #[test_case(&json!({"if": {"type": "integer"}, "then": {"minimum": 2}}), &json!(1))]
    #[test_case(&json!({"if": {"type": "string"}, "else": {"minimum": 2}}), &json!(1))]
    #[test_case(&json!({"items": {"type": "integer"}}), &json!([1, "a"]))]
    #[test_case(&json!({"contains": {"minimum": 5}}), &json!([1, 2]))]
    #[test_case(&json!({"properties": {"a": {"type": "integer"}}}), &json!({"a": "x"}))]
    #[test_case(&json!({"patternProperties": {"^x": {"type": "integer"}}}), &json!({"xa": "s"}))]
    #[test_case(&json!({"propertyNames": {"maxLength": 3}}), &json!({"toolong": 1}))]
    #[test_case(&json!({"additionalProperties": false, "properties": {"a": {}}}), &json!({"b": 1}))]
    fn rejects(schema: &Value, instance: &Value) {
        tests_util::is_not_valid(schema, instance);
    }

    #[test]
    fn incomplete_escape_in_pattern() {
        assert!(crate::evaluate(&json!({"pattern": "\\u"}), &json!("a")).is_err());
    }
}
