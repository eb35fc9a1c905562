//! The initialization pass: assigns base identifiers, detects resource
//! roots, collects anchors and registers resources.
//!
//! The pass is idempotent (every write repeats the same values), so it is
//! safe to run once per evaluation call, including against a different
//! registry.
use std::sync::Arc;

use ahash::AHashSet;
use fluent_uri::Uri;

use crate::{
    drafts::{self, Draft},
    error::Error,
    keywords::{self, Keyword},
    options::EvaluationOptions,
    paths::JsonPointer,
    registry::SchemaRegistry,
    schema::Schema,
    uri,
};

pub(crate) fn initialize(
    root: &Arc<Schema>,
    registry: &SchemaRegistry,
    options: &EvaluationOptions,
) -> Result<(), Error> {
    let draft = determine_draft(root, registry, options, options.evaluate_as())?;
    walk(
        root,
        &root.base_uri(),
        root,
        draft,
        JsonPointer::default(),
        registry,
        options,
        true,
        true,
    )
}

#[allow(clippy::too_many_arguments)]
fn walk(
    schema: &Arc<Schema>,
    current_base: &Uri<String>,
    resource_root: &Arc<Schema>,
    draft: Draft,
    location: JsonPointer,
    registry: &SchemaRegistry,
    options: &EvaluationOptions,
    outermost: bool,
    process_identifiers: bool,
) -> Result<(), Error> {
    schema.set_draft(draft);
    schema.set_location(location.clone());
    if schema.as_bool().is_some() {
        schema.set_base_uri(current_base.clone());
        return Ok(());
    }
    // Under drafts 6 & 7 a `$ref` suppresses sibling resolution: the subtree
    // is still walked so nested schemas know their base, draft and location,
    // but identifiers and anchors within it are not processed.
    let process_identifiers = process_identifiers
        && !(draft.ref_suppresses_siblings() && schema.get("$ref").is_some());

    let mut base = current_base.clone();
    let mut resource_root = resource_root;
    let mut draft = draft;
    let mut location = location;

    match identifier(schema, draft).filter(|_| process_identifiers) {
        Some(id) => {
            let anchor_in_id = if draft.supports_anchor_in_id() {
                id.strip_prefix('#')
                    .filter(|name| keywords::is_valid_anchor_name(name))
            } else {
                None
            };
            if let Some(name) = anchor_in_id {
                // A plain-name fragment declares an anchor on the enclosing
                // resource, not a new resource.
                resource_root.add_anchor(name.to_string(), schema, false);
                schema.set_base_uri(base.clone());
            } else {
                schema.mark_resource_root();
                base = uri::resolve_against(&current_base.borrow(), uri::without_fragment(id))?;
                schema.set_base_uri(base.clone());
                registry.register_schema(base.clone(), schema)?;
                draft = determine_draft(schema, registry, options, Some(draft))?;
                schema.set_draft(draft);
                resource_root = schema;
                location = JsonPointer::default();
                schema.set_location(location.clone());
            }
        }
        None => {
            schema.set_base_uri(base.clone());
            if outermost {
                registry.register_schema(base.clone(), schema)?;
            }
        }
    }

    if process_identifiers {
        for keyword in schema.keywords() {
            match keyword {
                Keyword::Anchor(name) if keyword.supported_drafts().contains(draft) => {
                    resource_root.add_anchor(name.clone(), schema, false);
                }
                Keyword::DynamicAnchor(name) if keyword.supported_drafts().contains(draft) => {
                    resource_root.add_anchor(name.clone(), schema, true);
                }
                Keyword::RecursiveAnchor(true) if keyword.supported_drafts().contains(draft) => {
                    resource_root.set_recursive_anchor(schema);
                }
                _ => {}
            }
        }
    }

    for keyword in schema.keywords() {
        for (chunks, child) in keyword.subschemas() {
            let mut child_location = location.clone();
            for chunk in chunks {
                child_location.push(chunk);
            }
            walk(
                child,
                &base,
                resource_root,
                draft,
                child_location,
                registry,
                options,
                false,
                process_identifiers,
            )?;
        }
    }
    Ok(())
}

fn identifier(schema: &Schema, draft: Draft) -> Option<&str> {
    let keyword = match draft {
        Draft::Draft6 => schema.get("$id").or_else(|| schema.get("id")),
        _ => schema.get("$id"),
    };
    match keyword {
        Some(Keyword::Id { value, .. }) => Some(value),
        _ => None,
    }
}

/// Determine the draft a schema is evaluated under.
///
/// A recognized `$schema` wins; a custom `$schema` is fetched and its own
/// `$schema` chain followed until a recognized identifier is found, with a
/// visited set so multi-step cycles fail instead of looping. Without a
/// `$schema` the inherited or requested draft applies, and failing that the
/// newest draft every present keyword supports.
pub(crate) fn determine_draft(
    schema: &Schema,
    registry: &SchemaRegistry,
    options: &EvaluationOptions,
    evaluating_as: Option<Draft>,
) -> Result<Draft, Error> {
    if let Some(Keyword::Schema(meta_schema)) = schema.get("$schema") {
        if let Some(draft) = Draft::from_meta_schema(meta_schema) {
            return Ok(draft);
        }
        return follow_meta_schema_chain(meta_schema, registry, options);
    }
    if let Some(draft) = evaluating_as {
        return Ok(draft);
    }
    Ok(drafts::newest_compatible(
        schema
            .keywords()
            .iter()
            .map(Keyword::supported_drafts),
    ))
}

fn follow_meta_schema_chain(
    start: &str,
    registry: &SchemaRegistry,
    options: &EvaluationOptions,
) -> Result<Draft, Error> {
    let mut visited = AHashSet::new();
    let mut current = uri::from_str(start)?;
    loop {
        if !visited.insert(current.clone()) {
            return Err(Error::unresolvable_meta_schema(start));
        }
        let meta = registry
            .fetch(&current, options)?
            .ok_or_else(|| Error::unresolvable_meta_schema(current.as_str()))?;
        let Some(Keyword::Schema(next)) = meta.get("$schema") else {
            return Err(Error::unresolvable_meta_schema(current.as_str()));
        };
        if let Some(draft) = Draft::from_meta_schema(next) {
            return Ok(draft);
        }
        current = uri::from_str(next)?;
    }
}

#[cfg(test)]
mod tests {
    use super::initialize;
    use crate::{options::EvaluationOptions, registry::SchemaRegistry, schema::Schema, Draft};
    use serde_json::json;

    #[test]
    fn resource_roots_and_anchors() {
        let registry = SchemaRegistry::new();
        let root = Schema::parse(&json!({
            "$id": "https://init.example/root",
            "$anchor": "top",
            "properties": {
                "leaf": {"type": "integer"},
                "nested": {
                    "$id": "sub",
                    "$defs": {"inner": {"$anchor": "deep", "type": "string"}}
                }
            }
        }))
        .unwrap();
        initialize(&root, &registry, &EvaluationOptions::default()).unwrap();

        assert!(root.is_resource_root());
        assert_eq!(root.base_uri().as_str(), "https://init.example/root");
        let (top, dynamic) = root.anchor("top").expect("An anchor on the root");
        assert!(std::sync::Arc::ptr_eq(&top, &root));
        assert!(!dynamic);

        let nested = root.resolve_pointer("/properties/nested").unwrap();
        assert!(nested.is_resource_root());
        assert_eq!(nested.base_uri().as_str(), "https://init.example/sub");
        // Anchors of the nested resource live on the nested root, not the
        // outer one.
        assert!(root.anchor("deep").is_none());
        let (deep, _) = nested.anchor("deep").expect("An anchor on the subresource");
        assert_eq!(deep.location().to_string(), "/$defs/inner");

        let leaf = root.resolve_pointer("/properties/leaf").unwrap();
        assert!(!leaf.is_resource_root());
        assert_eq!(leaf.location().to_string(), "/properties/leaf");
        assert_eq!(leaf.draft(), Draft::DraftNext);
    }

    #[test]
    fn initialization_runs_are_stable() {
        let registry = SchemaRegistry::new();
        let root = Schema::parse(&json!({
            "$id": "https://init.example/stable",
            "items": {"$anchor": "item"}
        }))
        .unwrap();
        for _ in 0..3 {
            initialize(&root, &registry, &EvaluationOptions::default()).unwrap();
            assert_eq!(root.base_uri().as_str(), "https://init.example/stable");
            assert!(root.anchor("item").is_some());
        }
    }
}
