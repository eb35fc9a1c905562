//! `unevaluatedItems` / `unevaluatedProperties`.
//!
//! Both run at maximum priority and look at the annotations left by every
//! other applicator, including those inside same-location subschema
//! evaluations such as `allOf` branches and `$ref` targets, to find what is
//! still uncovered.
use std::sync::Arc;

use ahash::AHashSet;
use serde_json::{json, Value};

use crate::{
    compiler::{self, Context, SchemaConstraint},
    error::Error,
    evaluation::{self, Evaluate, Evaluation, KeywordConstraint},
    paths::JsonPointer,
    schema::Schema,
};

const ITEM_SOURCES: &[&str] = &[
    "prefixItems",
    "items",
    "additionalItems",
    "unevaluatedItems",
];
const CONTAINS_SOURCES: &[&str] = &["contains"];
const PROPERTY_SOURCES: &[&str] = &[
    "properties",
    "patternProperties",
    "additionalProperties",
    "unevaluatedProperties",
];

struct UnevaluatedItemsEvaluator {
    child: Arc<SchemaConstraint>,
}

impl Evaluate for UnevaluatedItemsEvaluator {
    fn evaluate<'i>(
        &self,
        evaluation: &mut Evaluation<'i>,
        ctx: &mut Context<'_>,
    ) -> Result<(), Error> {
        let Value::Array(items) = evaluation.instance else {
            return Ok(());
        };
        let mut annotations = Vec::new();
        evaluation.collect_annotations(ITEM_SOURCES, &mut annotations);
        let mut prefix = 0usize;
        for annotation in &annotations {
            match annotation {
                // `true` means the rest of the array was covered.
                Value::Bool(true) => prefix = items.len(),
                Value::Number(index) => {
                    if let Some(index) = index.as_u64() {
                        prefix = prefix.max(index as usize + 1);
                    }
                }
                _ => {}
            }
        }
        let mut contained = Vec::new();
        evaluation.collect_annotations(CONTAINS_SOURCES, &mut contained);
        let contained: AHashSet<usize> = contained
            .iter()
            .filter_map(Value::as_array)
            .flatten()
            .filter_map(Value::as_u64)
            .map(|index| index as usize)
            .collect();

        let mut applied = false;
        for (index, item) in items.iter().enumerate().skip(prefix) {
            if contained.contains(&index) {
                continue;
            }
            let child = evaluation::evaluate(
                &self.child,
                item,
                evaluation.evaluation_path.join("unevaluatedItems"),
                evaluation.instance_location.join(index),
                ctx,
            )?;
            evaluation.attach(child, true);
            applied = true;
        }
        if applied {
            evaluation.annotate("unevaluatedItems", Value::Bool(true));
        }
        Ok(())
    }
}

pub(crate) fn compile_items(
    child: &Arc<Schema>,
    ctx: &mut Context<'_>,
) -> Result<Option<KeywordConstraint>, Error> {
    let child = compiler::constraint_for(
        child,
        JsonPointer::default().join("unevaluatedItems"),
        JsonPointer::default(),
        JsonPointer::default(),
        ctx,
    )?;
    Ok(Some(KeywordConstraint::new(
        "unevaluatedItems",
        UnevaluatedItemsEvaluator { child },
    )))
}

struct UnevaluatedPropertiesEvaluator {
    child: Arc<SchemaConstraint>,
}

impl Evaluate for UnevaluatedPropertiesEvaluator {
    fn evaluate<'i>(
        &self,
        evaluation: &mut Evaluation<'i>,
        ctx: &mut Context<'_>,
    ) -> Result<(), Error> {
        let Value::Object(object) = evaluation.instance else {
            return Ok(());
        };
        let mut annotations = Vec::new();
        evaluation.collect_annotations(PROPERTY_SOURCES, &mut annotations);
        let evaluated: AHashSet<&str> = annotations
            .iter()
            .filter_map(Value::as_array)
            .flatten()
            .filter_map(Value::as_str)
            .collect();

        let unevaluated: Vec<&String> = object
            .keys()
            .filter(|name| !evaluated.contains(name.as_str()))
            .collect();
        let mut applied = Vec::new();
        for name in unevaluated {
            let value = &object[name];
            let child = evaluation::evaluate(
                &self.child,
                value,
                evaluation.evaluation_path.join("unevaluatedProperties"),
                evaluation.instance_location.join(name.clone()),
                ctx,
            )?;
            evaluation.attach(child, true);
            applied.push(json!(name));
        }
        evaluation.annotate("unevaluatedProperties", Value::Array(applied));
        Ok(())
    }
}

pub(crate) fn compile_properties(
    child: &Arc<Schema>,
    ctx: &mut Context<'_>,
) -> Result<Option<KeywordConstraint>, Error> {
    let child = compiler::constraint_for(
        child,
        JsonPointer::default().join("unevaluatedProperties"),
        JsonPointer::default(),
        JsonPointer::default(),
        ctx,
    )?;
    Ok(Some(KeywordConstraint::new(
        "unevaluatedProperties",
        UnevaluatedPropertiesEvaluator { child },
    )))
}
