//! Logic for resolving schema identifiers unknown to the registry.
use serde_json::Value;

/// An opaque error type that is returned by resolvers on resolution failures.
pub type SchemaResolverError = anyhow::Error;

/// A resolver invoked when a referenced absolute identifier is not present in
/// the schema registry.
///
/// All operations are blocking and it is not possible to return futures. The
/// resolver is only consulted during initialization and first compilation of
/// a reference target; successfully resolved documents are cached in the
/// registry afterwards.
///
/// # Example
///
/// ```
/// use anyhow::anyhow;
/// use jsonschema_eval::{SchemaResolver, SchemaResolverError};
/// use serde_json::{json, Value};
///
/// struct StaticResolver;
///
/// impl SchemaResolver for StaticResolver {
///     fn resolve(&self, uri: &str) -> Result<Value, SchemaResolverError> {
///         if uri == "https://example.com/name" {
///             Ok(json!({"type": "string"}))
///         } else {
///             Err(anyhow!("schema not found: {uri}"))
///         }
///     }
/// }
/// ```
pub trait SchemaResolver: Send + Sync {
    /// Produce the schema document registered under `uri`.
    fn resolve(&self, uri: &str) -> Result<Value, SchemaResolverError>;
}
