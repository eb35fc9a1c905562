//! Compilation of schemas into constraint graphs.
//!
//! A [`SchemaConstraint`] is built per `(schema, dynamic scope)` pair and
//! cached on the schema. Static schemas (no reachable `$dynamicRef` /
//! `$recursiveRef`) use a single lock-free slot; dynamic schemas are cached
//! per scope snapshot behind the schema's lock.
use std::sync::Arc;

use fluent_uri::Uri;
use once_cell::sync::OnceCell;
use parking_lot::Mutex;

use crate::{
    error::Error,
    evaluation::KeywordConstraint,
    options::EvaluationOptions,
    paths::JsonPointer,
    registry::SchemaRegistry,
    schema::Schema,
};

/// The ordered stack of resource-root base identifiers entered so far.
///
/// Used both as the cache key for schema constraints and for resolving
/// dynamic and recursive references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DynamicScope(Vec<Uri<String>>);

impl DynamicScope {
    pub(crate) fn seeded(base: Uri<String>) -> DynamicScope {
        DynamicScope(vec![base])
    }
    pub(crate) fn top(&self) -> &Uri<String> {
        self.0.last().expect("Scopes are seeded with the root base")
    }
    /// Push `base` when it differs from the innermost entry; returns whether
    /// a matching pop is required.
    pub(crate) fn push_if_new(&mut self, base: &Uri<String>) -> bool {
        if self.top() != base {
            self.0.push(base.clone());
            true
        } else {
            false
        }
    }
    pub(crate) fn pop(&mut self) {
        self.0.pop();
    }
    /// Iterate outermost-first, the order dynamic anchors are resolved in.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &Uri<String>> {
        self.0.iter()
    }
    pub(crate) fn len(&self) -> usize {
        self.0.len()
    }
}

/// Shared state threaded through compilation and evaluation.
pub(crate) struct Context<'a> {
    pub(crate) scope: DynamicScope,
    pub(crate) options: &'a EvaluationOptions,
    pub(crate) registry: Arc<SchemaRegistry>,
    /// `(schema identity, instance location)` pairs of the references being
    /// crossed right now. Re-entering one means the reference cannot consume
    /// any further input, so the crossing is cut short instead of recursing
    /// forever (e.g. `{"$ref": "#"}`).
    active_references: Vec<(usize, JsonPointer)>,
}

impl<'a> Context<'a> {
    pub(crate) fn new(scope: DynamicScope, options: &'a EvaluationOptions) -> Context<'a> {
        Context {
            scope,
            registry: options.registry(),
            options,
            active_references: Vec::new(),
        }
    }
    pub(crate) fn enter_reference(&mut self, schema: &Arc<Schema>, location: &JsonPointer) -> bool {
        let key = (Arc::as_ptr(schema) as usize, location.clone());
        if self.active_references.contains(&key) {
            return false;
        }
        self.active_references.push(key);
        true
    }
    pub(crate) fn exit_reference(&mut self) {
        self.active_references.pop();
    }
}

/// A compiled schema within one dynamic scope.
pub(crate) struct SchemaConstraint {
    /// Path from the parent schema constraint, e.g. `/properties/foo`.
    pub(crate) relative_evaluation_path: JsonPointer,
    pub(crate) base_instance_location: JsonPointer,
    pub(crate) relative_instance_location: JsonPointer,
    pub(crate) base_uri: Uri<String>,
    schema: Arc<Schema>,
    /// Filled after the constraint is cached, so self-references observe a
    /// stable identity.
    constraints: OnceCell<Vec<KeywordConstraint>>,
    /// When the schema was already compiled in an equivalent scope, the
    /// keyword constraints of that compilation are reused.
    source: Option<Arc<SchemaConstraint>>,
}

impl std::fmt::Debug for SchemaConstraint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaConstraint")
            .field("relative_evaluation_path", &self.relative_evaluation_path)
            .field("base_instance_location", &self.base_instance_location)
            .field(
                "relative_instance_location",
                &self.relative_instance_location,
            )
            .field("base_uri", &self.base_uri.as_str())
            .field("source", &self.source.is_some())
            .finish()
    }
}

impl SchemaConstraint {
    pub(crate) fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }
    pub(crate) fn keyword_constraints(&self) -> &[KeywordConstraint] {
        if let Some(source) = &self.source {
            source.keyword_constraints()
        } else {
            self.constraints
                .get()
                .map(Vec::as_slice)
                .unwrap_or_default()
        }
    }
}

/// Per-schema constraint cache.
pub(crate) struct ConstraintCache {
    static_slot: OnceCell<Arc<SchemaConstraint>>,
    dynamic: Mutex<Vec<(DynamicScope, Arc<SchemaConstraint>)>>,
}

impl ConstraintCache {
    pub(crate) fn new() -> ConstraintCache {
        ConstraintCache {
            static_slot: OnceCell::new(),
            dynamic: Mutex::new(Vec::new()),
        }
    }
}

/// Get or build the constraint for `schema` under the context's dynamic
/// scope.
pub(crate) fn constraint_for(
    schema: &Arc<Schema>,
    relative_evaluation_path: JsonPointer,
    base_instance_location: JsonPointer,
    relative_instance_location: JsonPointer,
    ctx: &mut Context<'_>,
) -> Result<Arc<SchemaConstraint>, Error> {
    // Boolean schemas have no identifiers of their own and live in the
    // enclosing resource.
    let base_uri = if schema.as_bool().is_some() {
        ctx.scope.top().clone()
    } else {
        schema.base_uri()
    };
    let allocate = |source: Option<Arc<SchemaConstraint>>| SchemaConstraint {
        relative_evaluation_path: relative_evaluation_path.clone(),
        base_instance_location: base_instance_location.clone(),
        relative_instance_location: relative_instance_location.clone(),
        base_uri: base_uri.clone(),
        schema: Arc::clone(schema),
        constraints: OnceCell::new(),
        source,
    };

    if schema.is_dynamic() {
        let mut cache = schema.cache.dynamic.lock();
        if let Some((_, cached)) = cache.iter().find(|(scope, _)| scope == &ctx.scope) {
            let cached = Arc::clone(cached);
            drop(cache);
            return Ok(Arc::new(allocate(Some(cached))));
        }
        // Cache the fresh constraint before compiling its keywords; the lock
        // is held across the build so concurrent evaluations of the same
        // scope never observe an empty keyword list.
        let constraint = Arc::new(allocate(None));
        cache.push((ctx.scope.clone(), Arc::clone(&constraint)));
        if let Err(error) = build_keyword_constraints(&constraint, ctx) {
            cache.pop();
            return Err(error);
        }
        Ok(constraint)
    } else {
        if let Some(cached) = schema.cache.static_slot.get() {
            return Ok(Arc::new(allocate(Some(Arc::clone(cached)))));
        }
        let constraint = Arc::new(allocate(None));
        build_keyword_constraints(&constraint, ctx)?;
        // A concurrent build may have won the race; either constraint is
        // complete, so ours stays usable regardless.
        let _ = schema.cache.static_slot.set(Arc::clone(&constraint));
        Ok(constraint)
    }
}

fn build_keyword_constraints(
    constraint: &Arc<SchemaConstraint>,
    ctx: &mut Context<'_>,
) -> Result<(), Error> {
    let schema = constraint.schema();
    if schema.as_bool().is_some() {
        let _ = constraint.constraints.set(Vec::new());
        return Ok(());
    }

    // Under drafts 6 & 7 a `$ref` suppresses every sibling keyword.
    if schema.draft().ref_suppresses_siblings() {
        if let Some(reference) = schema.get("$ref") {
            let mut compiled = Vec::with_capacity(1);
            if let Some(keyword_constraint) = reference.build(schema, &compiled, ctx)? {
                compiled.push(keyword_constraint);
            }
            let _ = constraint.constraints.set(compiled);
            return Ok(());
        }
    }

    let pushed = ctx.scope.push_if_new(&constraint.base_uri);
    let result: Result<_, Error> = (|| {
        let mut ordered: Vec<&_> = schema.keywords().iter().collect();
        ordered.sort_by_key(|keyword| keyword.priority());
        let mut compiled = Vec::with_capacity(ordered.len());
        for keyword in ordered {
            if let Some(keyword_constraint) = keyword.build(schema, &compiled, ctx)? {
                compiled.push(keyword_constraint);
            }
        }
        Ok(compiled)
    })();
    if pushed {
        ctx.scope.pop();
    }
    let _ = constraint.constraints.set(result?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::DynamicScope;
    use crate::uri;

    #[test]
    fn scope_equality_is_elementwise() {
        let base = uri::from_str("https://example.com/a").unwrap();
        let other = uri::from_str("https://example.com/b").unwrap();
        let mut left = DynamicScope::seeded(base.clone());
        let mut right = DynamicScope::seeded(base.clone());
        assert_eq!(left, right);
        assert!(left.push_if_new(&other));
        assert_ne!(left, right);
        assert!(right.push_if_new(&other));
        assert_eq!(left, right);
        // Re-entering the innermost resource does not grow the stack.
        assert!(!left.push_if_new(&other));
        left.pop();
        right.pop();
        assert_eq!(left.top(), &base);
        assert_eq!(right.len(), 1);
    }
}
