//! The schema registry: the canonical store for resolvable resources.
use std::sync::Arc;

use ahash::AHashMap;
use fluent_uri::Uri;
use once_cell::sync::Lazy;
use parking_lot::Mutex;

use crate::{
    error::Error, init, meta, options::EvaluationOptions, schema::Schema, uri, JsonSchema,
};

/// The process-wide default registry, preloaded with the built-in
/// meta-schemas. Tests and embedders that need isolation pass their own
/// registry via [`EvaluationOptions::with_registry`].
pub(crate) static GLOBAL: Lazy<Arc<SchemaRegistry>> =
    Lazy::new(|| Arc::new(SchemaRegistry::new()));

/// Maps absolute identifiers to schema documents.
///
/// Identifiers are compared with their fragment stripped. Registering two
/// distinct documents under one identifier fails; re-registering the same
/// document is a no-op, which is what makes initialization idempotent.
pub struct SchemaRegistry {
    schemas: Mutex<AHashMap<Uri<String>, Arc<Schema>>>,
}

impl SchemaRegistry {
    /// Create a registry holding the built-in meta-schemas.
    #[must_use]
    pub fn new() -> SchemaRegistry {
        let registry = SchemaRegistry {
            schemas: Mutex::new(AHashMap::new()),
        };
        let options = EvaluationOptions::default();
        for (_, document) in meta::built_in() {
            let schema = Schema::parse(document).expect("Invalid built-in meta-schema");
            init::initialize(&schema, &registry, &options)
                .expect("Built-in meta-schemas always initialize");
        }
        registry
    }

    /// Register a parsed schema under an absolute identifier.
    ///
    /// The schema is initialized against this registry with `uri` as its
    /// base, so nested `$id` resources and anchors become resolvable as well.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateRegistration`] if a different schema is
    /// already registered under `uri`.
    pub fn register(&self, uri: &str, schema: &JsonSchema) -> Result<(), Error> {
        let uri = uri::from_str(uri::without_fragment(uri))?;
        let root = schema.root();
        if uri::is_synthetic(&root.base_uri()) {
            root.set_base_uri(uri.clone());
        }
        init::initialize(root, self, &EvaluationOptions::default())?;
        self.register_schema(uri, root)
    }

    /// Look up a schema document by its identifier.
    #[must_use]
    pub fn get(&self, uri: &str) -> Option<JsonSchema> {
        let uri = uri::from_str(uri::without_fragment(uri)).ok()?;
        self.get_schema(&uri).map(JsonSchema::from_root)
    }

    pub(crate) fn register_schema(
        &self,
        uri: Uri<String>,
        schema: &Arc<Schema>,
    ) -> Result<(), Error> {
        let mut schemas = self.schemas.lock();
        if let Some(existing) = schemas.get(&uri) {
            if Arc::ptr_eq(existing, schema) {
                return Ok(());
            }
            return Err(Error::duplicate_registration(uri.as_str()));
        }
        schemas.insert(uri, Arc::clone(schema));
        Ok(())
    }

    pub(crate) fn get_schema(&self, uri: &Uri<String>) -> Option<Arc<Schema>> {
        self.schemas.lock().get(uri).cloned()
    }

    /// Look up an identifier, consulting the configured resolver for unknown
    /// absolute identifiers. Resolved documents are initialized against this
    /// registry and cached.
    pub(crate) fn fetch(
        &self,
        uri: &Uri<String>,
        options: &EvaluationOptions,
    ) -> Result<Option<Arc<Schema>>, Error> {
        if let Some(found) = self.get_schema(uri) {
            return Ok(Some(found));
        }
        let Some(resolver) = options.resolver() else {
            return Ok(None);
        };
        let Ok(document) = resolver.resolve(uri.as_str()) else {
            return Ok(None);
        };
        let schema = Schema::parse(&document)?;
        schema.set_base_uri(uri.clone());
        // Register under the retrieval URI before initializing so that
        // cyclic meta-schema chains terminate instead of re-fetching.
        if self.register_schema(uri.clone(), &schema).is_err() {
            // Lost a race; the registered document wins.
            return Ok(self.get_schema(uri));
        }
        if let Err(error) = init::initialize(&schema, self, options) {
            self.schemas.lock().remove(uri);
            return Err(error);
        }
        Ok(Some(schema))
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        SchemaRegistry::new()
    }
}

#[cfg(test)]
mod tests {
    use super::SchemaRegistry;
    use crate::{Error, JsonSchema};
    use serde_json::json;

    #[test]
    fn built_in_meta_schemas_are_present() {
        let registry = SchemaRegistry::new();
        assert!(registry
            .get("https://json-schema.org/draft/2020-12/schema")
            .is_some());
        assert!(registry
            .get("http://json-schema.org/draft-07/schema#")
            .is_some());
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let registry = SchemaRegistry::new();
        let first = JsonSchema::from_value(&json!({"type": "string"})).unwrap();
        let second = JsonSchema::from_value(&json!({"type": "integer"})).unwrap();
        registry.register("https://example.com/s", &first).unwrap();
        // The same document again is fine.
        registry.register("https://example.com/s", &first).unwrap();
        let error = registry
            .register("https://example.com/s", &second)
            .unwrap_err();
        assert!(matches!(error, Error::DuplicateRegistration { .. }));
    }

    #[test]
    fn nested_resources_are_registered() {
        let registry = SchemaRegistry::new();
        let schema = JsonSchema::from_value(&json!({
            "$id": "https://example.com/root",
            "$defs": {
                "leaf": {"$id": "https://example.com/leaf", "type": "string"}
            }
        }))
        .unwrap();
        registry.register("https://example.com/root", &schema).unwrap();
        assert!(registry.get("https://example.com/leaf").is_some());
    }
}
