//! Configuration for schema evaluation.
use std::sync::Arc;

use serde_json::Value;

use crate::{
    drafts::Draft,
    error::Error,
    output::{OutputFormat, Results},
    registry::{self, SchemaRegistry},
    resolver::SchemaResolver,
    JsonSchema,
};

/// Configuration options for JSON Schema evaluation.
///
/// ```
/// use jsonschema_eval::{Draft, OutputFormat};
/// use serde_json::json;
///
/// let results = jsonschema_eval::options()
///     .with_draft(Draft::Draft7)
///     .with_output_format(OutputFormat::List)
///     .evaluate(&json!({"minimum": 2}), &json!(1))
///     .expect("Invalid schema");
/// assert!(!results.valid());
/// ```
#[derive(Clone, Default)]
pub struct EvaluationOptions {
    evaluate_as: Option<Draft>,
    output_format: OutputFormat,
    culture: Option<String>,
    registry: Option<Arc<SchemaRegistry>>,
    resolver: Option<Arc<dyn SchemaResolver>>,
    process_custom_keywords: bool,
}

impl EvaluationOptions {
    /// Request a specific draft instead of auto-detection.
    ///
    /// A recognized `$schema` in the document still wins.
    pub fn with_draft(&mut self, draft: Draft) -> &mut Self {
        self.evaluate_as = Some(draft);
        self
    }
    /// Select the shape of the produced [`Results`]. Defaults to
    /// [`OutputFormat::Flag`].
    pub fn with_output_format(&mut self, output_format: OutputFormat) -> &mut Self {
        self.output_format = output_format;
        self
    }
    /// Select the culture used for error messages; unset cultures fall back
    /// to the neutral message table.
    pub fn with_culture(&mut self, culture: impl Into<String>) -> &mut Self {
        self.culture = Some(culture.into());
        self
    }
    /// Use a dedicated registry instead of the process-wide default.
    pub fn with_registry(&mut self, registry: Arc<SchemaRegistry>) -> &mut Self {
        self.registry = Some(registry);
        self
    }
    /// Set a resolver for references to identifiers missing from the
    /// registry.
    pub fn with_resolver(&mut self, resolver: impl SchemaResolver + 'static) -> &mut Self {
        self.resolver = Some(Arc::new(resolver));
        self
    }
    /// Carry unrecognized keywords through to the output as annotations.
    pub fn with_process_custom_keywords(&mut self, process: bool) -> &mut Self {
        self.process_custom_keywords = process;
        self
    }

    /// Parse `schema` and evaluate `instance` against it using these options.
    ///
    /// # Errors
    ///
    /// Returns an error if the schema is malformed or a reference cannot be
    /// resolved.
    pub fn evaluate(&self, schema: &Value, instance: &Value) -> Result<Results, Error> {
        JsonSchema::from_value(schema)?.evaluate(instance, self)
    }

    pub(crate) fn evaluate_as(&self) -> Option<Draft> {
        self.evaluate_as
    }
    pub(crate) fn output_format(&self) -> OutputFormat {
        self.output_format
    }
    pub(crate) fn culture(&self) -> Option<&str> {
        self.culture.as_deref()
    }
    pub(crate) fn registry(&self) -> Arc<SchemaRegistry> {
        self.registry
            .clone()
            .unwrap_or_else(|| Arc::clone(&registry::GLOBAL))
    }
    pub(crate) fn resolver(&self) -> Option<&Arc<dyn SchemaResolver>> {
        self.resolver.as_ref()
    }
    pub(crate) fn process_custom_keywords(&self) -> bool {
        self.process_custom_keywords
    }
}
