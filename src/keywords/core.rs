//! Reference keywords.
//!
//! All three reference forms resolve lazily at evaluation time: the target's
//! schema constraint is looked up (or built) in the dynamic scope that is
//! active when the reference is crossed, which is what gives `$dynamicRef`
//! and `$recursiveRef` their scope-dependent behavior.
use std::sync::Arc;

use fluent_uri::Uri;

use crate::{
    compiler::{self, Context},
    error::Error,
    evaluation::{self, Evaluate, Evaluation, KeywordConstraint},
    keywords,
    paths::JsonPointer,
    schema::Schema,
    uri,
};

/// Resolve `reference` against `base` to a schema: registry lookup for the
/// location part, then pointer or anchor resolution for the fragment.
fn resolve_target(
    reference: &str,
    base: &Uri<String>,
    evaluation_path: &JsonPointer,
    ctx: &mut Context<'_>,
) -> Result<Arc<Schema>, Error> {
    let (location, fragment) = uri::split_fragment(reference);
    let target_uri = if location.is_empty() {
        base.clone()
    } else {
        uri::resolve_against(&base.borrow(), location)?
    };
    let unresolved = || Error::unresolved_reference(reference, evaluation_path.clone());
    let root = ctx
        .registry
        .fetch(&target_uri, ctx.options)?
        .ok_or_else(unresolved)?;
    match fragment {
        None | Some("") => Ok(root),
        Some(pointer) if pointer.starts_with('/') => {
            root.resolve_pointer(pointer).ok_or_else(unresolved)
        }
        Some(anchor) => root
            .anchor(anchor)
            .map(|(target, _)| target)
            .ok_or_else(unresolved),
    }
}

fn evaluate_target<'i>(
    keyword: &'static str,
    target: &Arc<Schema>,
    evaluation: &mut Evaluation<'i>,
    ctx: &mut Context<'_>,
) -> Result<(), Error> {
    if !ctx.enter_reference(target, &evaluation.instance_location) {
        // The same target at the same instance location is already being
        // evaluated above us; crossing again cannot make progress.
        return Ok(());
    }
    let result = (|| {
        let constraint = compiler::constraint_for(
            target,
            JsonPointer::default().join(keyword),
            evaluation.instance_location.clone(),
            JsonPointer::default(),
            ctx,
        )?;
        let child = evaluation::evaluate(
            &constraint,
            evaluation.instance,
            evaluation.evaluation_path.join(keyword),
            evaluation.instance_location.clone(),
            ctx,
        )?;
        evaluation.attach(child, true);
        Ok(())
    })();
    ctx.exit_reference();
    result
}

struct RefEvaluator {
    reference: String,
    base: Uri<String>,
}

impl Evaluate for RefEvaluator {
    fn evaluate<'i>(
        &self,
        evaluation: &mut Evaluation<'i>,
        ctx: &mut Context<'_>,
    ) -> Result<(), Error> {
        let target = resolve_target(&self.reference, &self.base, &evaluation.evaluation_path, ctx)?;
        evaluate_target("$ref", &target, evaluation, ctx)
    }
}

pub(crate) fn compile_ref(
    reference: &str,
    schema: &Schema,
    _: &mut Context<'_>,
) -> Result<Option<KeywordConstraint>, Error> {
    Ok(Some(KeywordConstraint::new(
        "$ref",
        RefEvaluator {
            reference: reference.to_string(),
            base: schema.base_uri(),
        },
    )))
}

struct DynamicRefEvaluator {
    reference: String,
    base: Uri<String>,
}

impl Evaluate for DynamicRefEvaluator {
    fn evaluate<'i>(
        &self,
        evaluation: &mut Evaluation<'i>,
        ctx: &mut Context<'_>,
    ) -> Result<(), Error> {
        // A plain-name fragment is matched against the dynamic scope,
        // outermost resource first; the first resource declaring the name as
        // a dynamic anchor wins.
        let (_, fragment) = uri::split_fragment(&self.reference);
        if let Some(anchor) = fragment.filter(|name| keywords::is_valid_anchor_name(name)) {
            let mut target = None;
            for scope_uri in ctx.scope.iter() {
                if let Some(resource) = ctx.registry.get_schema(scope_uri) {
                    if let Some((found, true)) = resource.anchor(anchor) {
                        target = Some(found);
                        break;
                    }
                }
            }
            if let Some(target) = target {
                return evaluate_target("$dynamicRef", &target, evaluation, ctx);
            }
        }
        // No dynamic anchor in scope: behaves like a static `$ref`.
        let target = resolve_target(&self.reference, &self.base, &evaluation.evaluation_path, ctx)?;
        evaluate_target("$dynamicRef", &target, evaluation, ctx)
    }
}

pub(crate) fn compile_dynamic_ref(
    reference: &str,
    schema: &Schema,
    _: &mut Context<'_>,
) -> Result<Option<KeywordConstraint>, Error> {
    Ok(Some(KeywordConstraint::new(
        "$dynamicRef",
        DynamicRefEvaluator {
            reference: reference.to_string(),
            base: schema.base_uri(),
        },
    )))
}

struct RecursiveRefEvaluator {
    base: Uri<String>,
}

impl Evaluate for RecursiveRefEvaluator {
    fn evaluate<'i>(
        &self,
        evaluation: &mut Evaluation<'i>,
        ctx: &mut Context<'_>,
    ) -> Result<(), Error> {
        // The outermost scope entry carrying `$recursiveAnchor: true` wins;
        // without one the reference collapses to `#`.
        let mut target = None;
        for scope_uri in ctx.scope.iter() {
            if let Some(resource) = ctx.registry.get_schema(scope_uri) {
                if let Some(found) = resource.recursive_anchor() {
                    target = Some(found);
                    break;
                }
            }
        }
        let target = match target {
            Some(target) => target,
            None => resolve_target("#", &self.base, &evaluation.evaluation_path, ctx)?,
        };
        evaluate_target("$recursiveRef", &target, evaluation, ctx)
    }
}

pub(crate) fn compile_recursive_ref(
    schema: &Schema,
    _: &mut Context<'_>,
) -> Result<Option<KeywordConstraint>, Error> {
    Ok(Some(KeywordConstraint::new(
        "$recursiveRef",
        RecursiveRefEvaluator {
            base: schema.base_uri(),
        },
    )))
}
