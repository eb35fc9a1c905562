//! Constraints for keywords that apply subschemas.
use std::sync::Arc;

use serde_json::{json, Value};

use crate::{
    compiler::{self, Context, SchemaConstraint},
    drafts::Draft,
    error::Error,
    evaluation::{self, Evaluate, Evaluation, KeywordConstraint},
    keywords::{helpers::Pattern, Dependency, ItemsForm, Keyword},
    paths::JsonPointer,
    schema::Schema,
};

fn child_constraint(
    child: &Arc<Schema>,
    relative_evaluation_path: JsonPointer,
    relative_instance_location: JsonPointer,
    ctx: &mut Context<'_>,
) -> Result<Arc<SchemaConstraint>, Error> {
    compiler::constraint_for(
        child,
        relative_evaluation_path,
        JsonPointer::default(),
        relative_instance_location,
        ctx,
    )
}

fn indexed_constraints(
    keyword: &'static str,
    children: &[Arc<Schema>],
    ctx: &mut Context<'_>,
) -> Result<Vec<Arc<SchemaConstraint>>, Error> {
    children
        .iter()
        .enumerate()
        .map(|(index, child)| {
            child_constraint(
                child,
                JsonPointer::default().join(keyword).join(index),
                JsonPointer::default(),
                ctx,
            )
        })
        .collect()
}

struct AllOfEvaluator {
    children: Vec<Arc<SchemaConstraint>>,
}

impl Evaluate for AllOfEvaluator {
    fn evaluate<'i>(
        &self,
        evaluation: &mut Evaluation<'i>,
        ctx: &mut Context<'_>,
    ) -> Result<(), Error> {
        for (index, constraint) in self.children.iter().enumerate() {
            let child = evaluation::evaluate(
                constraint,
                evaluation.instance,
                evaluation.evaluation_path.join("allOf").join(index),
                evaluation.instance_location.clone(),
                ctx,
            )?;
            evaluation.attach(child, true);
        }
        Ok(())
    }
}

pub(crate) fn compile_all_of(
    children: &[Arc<Schema>],
    ctx: &mut Context<'_>,
) -> Result<Option<KeywordConstraint>, Error> {
    let children = indexed_constraints("allOf", children, ctx)?;
    Ok(Some(KeywordConstraint::new(
        "allOf",
        AllOfEvaluator { children },
    )))
}

struct AnyOfEvaluator {
    children: Vec<Arc<SchemaConstraint>>,
}

impl Evaluate for AnyOfEvaluator {
    fn evaluate<'i>(
        &self,
        evaluation: &mut Evaluation<'i>,
        ctx: &mut Context<'_>,
    ) -> Result<(), Error> {
        let mut any_valid = false;
        for (index, constraint) in self.children.iter().enumerate() {
            let child = evaluation::evaluate(
                constraint,
                evaluation.instance,
                evaluation.evaluation_path.join("anyOf").join(index),
                evaluation.instance_location.clone(),
                ctx,
            )?;
            any_valid |= child.is_valid();
            evaluation.attach(child, false);
        }
        if !any_valid {
            evaluation.fail("anyOf", Vec::new());
        }
        Ok(())
    }
}

pub(crate) fn compile_any_of(
    children: &[Arc<Schema>],
    ctx: &mut Context<'_>,
) -> Result<Option<KeywordConstraint>, Error> {
    let children = indexed_constraints("anyOf", children, ctx)?;
    Ok(Some(KeywordConstraint::new(
        "anyOf",
        AnyOfEvaluator { children },
    )))
}

struct OneOfEvaluator {
    children: Vec<Arc<SchemaConstraint>>,
}

impl Evaluate for OneOfEvaluator {
    fn evaluate<'i>(
        &self,
        evaluation: &mut Evaluation<'i>,
        ctx: &mut Context<'_>,
    ) -> Result<(), Error> {
        let mut valid = 0u64;
        for (index, constraint) in self.children.iter().enumerate() {
            let child = evaluation::evaluate(
                constraint,
                evaluation.instance,
                evaluation.evaluation_path.join("oneOf").join(index),
                evaluation.instance_location.clone(),
                ctx,
            )?;
            if child.is_valid() {
                valid += 1;
            }
            evaluation.attach(child, false);
        }
        if valid != 1 {
            evaluation.fail("oneOf", vec![("count", json!(valid))]);
        }
        Ok(())
    }
}

pub(crate) fn compile_one_of(
    children: &[Arc<Schema>],
    ctx: &mut Context<'_>,
) -> Result<Option<KeywordConstraint>, Error> {
    let children = indexed_constraints("oneOf", children, ctx)?;
    Ok(Some(KeywordConstraint::new(
        "oneOf",
        OneOfEvaluator { children },
    )))
}

struct NotEvaluator {
    child: Arc<SchemaConstraint>,
}

impl Evaluate for NotEvaluator {
    fn evaluate<'i>(
        &self,
        evaluation: &mut Evaluation<'i>,
        ctx: &mut Context<'_>,
    ) -> Result<(), Error> {
        let child = evaluation::evaluate(
            &self.child,
            evaluation.instance,
            evaluation.evaluation_path.join("not"),
            evaluation.instance_location.clone(),
            ctx,
        )?;
        let matched = child.is_valid();
        evaluation.attach(child, false);
        if matched {
            evaluation.fail("not", Vec::new());
        }
        Ok(())
    }
}

pub(crate) fn compile_not(
    child: &Arc<Schema>,
    ctx: &mut Context<'_>,
) -> Result<Option<KeywordConstraint>, Error> {
    let child = child_constraint(
        child,
        JsonPointer::default().join("not"),
        JsonPointer::default(),
        ctx,
    )?;
    Ok(Some(KeywordConstraint::new("not", NotEvaluator { child })))
}

struct IfEvaluator {
    child: Arc<SchemaConstraint>,
}

impl Evaluate for IfEvaluator {
    fn evaluate<'i>(
        &self,
        evaluation: &mut Evaluation<'i>,
        ctx: &mut Context<'_>,
    ) -> Result<(), Error> {
        let child = evaluation::evaluate(
            &self.child,
            evaluation.instance,
            evaluation.evaluation_path.join("if"),
            evaluation.instance_location.clone(),
            ctx,
        )?;
        let outcome = child.is_valid();
        evaluation.attach(child, false);
        evaluation.annotate("if", Value::Bool(outcome));
        Ok(())
    }
}

pub(crate) fn compile_if(
    child: &Arc<Schema>,
    ctx: &mut Context<'_>,
) -> Result<Option<KeywordConstraint>, Error> {
    let child = child_constraint(
        child,
        JsonPointer::default().join("if"),
        JsonPointer::default(),
        ctx,
    )?;
    Ok(Some(KeywordConstraint::new("if", IfEvaluator { child })))
}

struct BranchEvaluator {
    keyword: &'static str,
    child: Arc<SchemaConstraint>,
    when: bool,
}

impl Evaluate for BranchEvaluator {
    fn evaluate<'i>(
        &self,
        evaluation: &mut Evaluation<'i>,
        ctx: &mut Context<'_>,
    ) -> Result<(), Error> {
        // The dependency on `if` guarantees the annotation exists.
        if evaluation.annotation("if").and_then(Value::as_bool) == Some(self.when) {
            let child = evaluation::evaluate(
                &self.child,
                evaluation.instance,
                evaluation.evaluation_path.join(self.keyword),
                evaluation.instance_location.clone(),
                ctx,
            )?;
            evaluation.attach(child, true);
        } else {
            evaluation.mark_skipped(self.keyword);
        }
        Ok(())
    }
}

pub(crate) fn compile_branch(
    keyword: &'static str,
    child: &Arc<Schema>,
    when: bool,
    ctx: &mut Context<'_>,
) -> Result<Option<KeywordConstraint>, Error> {
    let child = child_constraint(
        child,
        JsonPointer::default().join(keyword),
        JsonPointer::default(),
        ctx,
    )?;
    Ok(Some(
        KeywordConstraint::new(
            keyword,
            BranchEvaluator {
                keyword,
                child,
                when,
            },
        )
        .with_dependencies(&["if"]),
    ))
}

struct DependentSchemasEvaluator {
    keyword: &'static str,
    children: Vec<(String, Arc<SchemaConstraint>)>,
    required: Vec<(String, Vec<String>)>,
}

impl Evaluate for DependentSchemasEvaluator {
    fn evaluate<'i>(
        &self,
        evaluation: &mut Evaluation<'i>,
        ctx: &mut Context<'_>,
    ) -> Result<(), Error> {
        let Value::Object(object) = evaluation.instance else {
            return Ok(());
        };
        for (property, constraint) in &self.children {
            if !object.contains_key(property) {
                continue;
            }
            let child = evaluation::evaluate(
                constraint,
                evaluation.instance,
                evaluation
                    .evaluation_path
                    .join(self.keyword)
                    .join(property.clone()),
                evaluation.instance_location.clone(),
                ctx,
            )?;
            evaluation.attach(child, true);
        }
        for (property, required) in &self.required {
            if !object.contains_key(property) {
                continue;
            }
            let missing: Vec<Value> = required
                .iter()
                .filter(|name| !object.contains_key(*name))
                .map(|name| json!(name))
                .collect();
            if !missing.is_empty() {
                evaluation.fail(
                    self.keyword,
                    vec![
                        ("property", json!(property)),
                        ("missing", Value::Array(missing)),
                    ],
                );
                break;
            }
        }
        Ok(())
    }
}

pub(crate) fn compile_dependent_schemas(
    children: &[(String, Arc<Schema>)],
    ctx: &mut Context<'_>,
) -> Result<Option<KeywordConstraint>, Error> {
    let children = keyed_constraints("dependentSchemas", children, ctx)?;
    Ok(Some(KeywordConstraint::new(
        "dependentSchemas",
        DependentSchemasEvaluator {
            keyword: "dependentSchemas",
            children,
            required: Vec::new(),
        },
    )))
}

/// The legacy `dependencies` keyword mixes schema and required-property
/// dependencies in one object.
pub(crate) fn compile_dependencies(
    dependencies: &[(String, Dependency)],
    ctx: &mut Context<'_>,
) -> Result<Option<KeywordConstraint>, Error> {
    let mut children = Vec::new();
    let mut required = Vec::new();
    for (property, dependency) in dependencies {
        match dependency {
            Dependency::Schema(child) => {
                let constraint = child_constraint(
                    child,
                    JsonPointer::default()
                        .join("dependencies")
                        .join(property.clone()),
                    JsonPointer::default(),
                    ctx,
                )?;
                children.push((property.clone(), constraint));
            }
            Dependency::Required(names) => required.push((property.clone(), names.clone())),
        }
    }
    Ok(Some(KeywordConstraint::new(
        "dependencies",
        DependentSchemasEvaluator {
            keyword: "dependencies",
            children,
            required,
        },
    )))
}

fn keyed_constraints(
    keyword: &'static str,
    children: &[(String, Arc<Schema>)],
    ctx: &mut Context<'_>,
) -> Result<Vec<(String, Arc<SchemaConstraint>)>, Error> {
    children
        .iter()
        .map(|(name, child)| {
            let constraint = child_constraint(
                child,
                JsonPointer::default().join(keyword).join(name.clone()),
                JsonPointer::default(),
                ctx,
            )?;
            Ok((name.clone(), constraint))
        })
        .collect()
}

struct ItemsEvaluator {
    child: Arc<SchemaConstraint>,
    /// Number of leading items covered by `prefixItems` (Draft 2020-12).
    prefix: usize,
}

impl Evaluate for ItemsEvaluator {
    fn evaluate<'i>(
        &self,
        evaluation: &mut Evaluation<'i>,
        ctx: &mut Context<'_>,
    ) -> Result<(), Error> {
        let Value::Array(items) = evaluation.instance else {
            return Ok(());
        };
        let mut applied = false;
        for (index, item) in items.iter().enumerate().skip(self.prefix) {
            let child = evaluation::evaluate(
                &self.child,
                item,
                evaluation.evaluation_path.join("items"),
                evaluation.instance_location.join(index),
                ctx,
            )?;
            evaluation.attach(child, true);
            applied = true;
        }
        if applied {
            evaluation.annotate("items", Value::Bool(true));
        }
        Ok(())
    }
}

struct TupleItemsEvaluator {
    keyword: &'static str,
    children: Vec<Arc<SchemaConstraint>>,
}

impl Evaluate for TupleItemsEvaluator {
    fn evaluate<'i>(
        &self,
        evaluation: &mut Evaluation<'i>,
        ctx: &mut Context<'_>,
    ) -> Result<(), Error> {
        let Value::Array(items) = evaluation.instance else {
            return Ok(());
        };
        let covered = items.len().min(self.children.len());
        for (index, (item, constraint)) in items.iter().zip(&self.children).enumerate() {
            let child = evaluation::evaluate(
                constraint,
                item,
                evaluation.evaluation_path.join(self.keyword).join(index),
                evaluation.instance_location.join(index),
                ctx,
            )?;
            evaluation.attach(child, true);
        }
        // Largest covered index, or `true` when the whole array is covered.
        let annotation = if covered == items.len() {
            Value::Bool(true)
        } else if covered > 0 {
            json!(covered - 1)
        } else {
            return Ok(());
        };
        evaluation.annotate(self.keyword, annotation);
        Ok(())
    }
}

pub(crate) fn compile_items(
    form: &ItemsForm,
    schema: &Schema,
    ctx: &mut Context<'_>,
) -> Result<Option<KeywordConstraint>, Error> {
    match form {
        ItemsForm::Single(child) => {
            let prefix = match (schema.draft(), schema.get("prefixItems")) {
                (
                    Draft::Draft202012 | Draft::DraftNext,
                    Some(Keyword::PrefixItems(children)),
                ) => children.len(),
                _ => 0,
            };
            let child = child_constraint(
                child,
                JsonPointer::default().join("items"),
                JsonPointer::default(),
                ctx,
            )?;
            Ok(Some(KeywordConstraint::new(
                "items",
                ItemsEvaluator { child, prefix },
            )))
        }
        ItemsForm::Tuple(children) => {
            let children = indexed_constraints("items", children, ctx)?;
            Ok(Some(KeywordConstraint::new(
                "items",
                TupleItemsEvaluator {
                    keyword: "items",
                    children,
                },
            )))
        }
    }
}

pub(crate) fn compile_prefix_items(
    children: &[Arc<Schema>],
    ctx: &mut Context<'_>,
) -> Result<Option<KeywordConstraint>, Error> {
    let children = indexed_constraints("prefixItems", children, ctx)?;
    Ok(Some(KeywordConstraint::new(
        "prefixItems",
        TupleItemsEvaluator {
            keyword: "prefixItems",
            children,
        },
    )))
}

struct AdditionalItemsEvaluator {
    child: Arc<SchemaConstraint>,
    prefix: usize,
}

impl Evaluate for AdditionalItemsEvaluator {
    fn evaluate<'i>(
        &self,
        evaluation: &mut Evaluation<'i>,
        ctx: &mut Context<'_>,
    ) -> Result<(), Error> {
        let Value::Array(items) = evaluation.instance else {
            return Ok(());
        };
        let mut applied = false;
        for (index, item) in items.iter().enumerate().skip(self.prefix) {
            let child = evaluation::evaluate(
                &self.child,
                item,
                evaluation.evaluation_path.join("additionalItems"),
                evaluation.instance_location.join(index),
                ctx,
            )?;
            evaluation.attach(child, true);
            applied = true;
        }
        if applied {
            evaluation.annotate("additionalItems", Value::Bool(true));
        }
        Ok(())
    }
}

pub(crate) fn compile_additional_items(
    child: &Arc<Schema>,
    schema: &Schema,
    siblings: &[KeywordConstraint],
    ctx: &mut Context<'_>,
) -> Result<Option<KeywordConstraint>, Error> {
    // Only meaningful next to the tuple form of `items`; a single-schema
    // `items` already covers every element.
    let prefix = match schema.get("items") {
        Some(Keyword::Items(ItemsForm::Tuple(children)))
            if siblings.iter().any(|sibling| sibling.keyword == "items") =>
        {
            children.len()
        }
        _ => return Ok(None),
    };
    let child = child_constraint(
        child,
        JsonPointer::default().join("additionalItems"),
        JsonPointer::default(),
        ctx,
    )?;
    Ok(Some(KeywordConstraint::new(
        "additionalItems",
        AdditionalItemsEvaluator { child, prefix },
    )))
}

struct ContainsEvaluator {
    child: Arc<SchemaConstraint>,
    /// A sibling `minContains` owns the match-count requirement; without one
    /// the implicit threshold of one match applies here.
    has_min_contains: bool,
}

impl Evaluate for ContainsEvaluator {
    fn evaluate<'i>(
        &self,
        evaluation: &mut Evaluation<'i>,
        ctx: &mut Context<'_>,
    ) -> Result<(), Error> {
        let Value::Array(items) = evaluation.instance else {
            return Ok(());
        };
        let mut matched = Vec::new();
        for (index, item) in items.iter().enumerate() {
            let child = evaluation::evaluate(
                &self.child,
                item,
                evaluation.evaluation_path.join("contains"),
                evaluation.instance_location.join(index),
                ctx,
            )?;
            if child.is_valid() {
                matched.push(json!(index));
            }
            evaluation.attach(child, false);
        }
        if matched.is_empty() && !self.has_min_contains {
            evaluation.fail(
                "contains",
                vec![("received", json!(0)), ("limit", json!(1))],
            );
        }
        evaluation.annotate("contains", Value::Array(matched));
        Ok(())
    }
}

pub(crate) fn compile_contains(
    child: &Arc<Schema>,
    schema: &Schema,
    ctx: &mut Context<'_>,
) -> Result<Option<KeywordConstraint>, Error> {
    let has_min_contains = matches!(schema.get("minContains"), Some(Keyword::MinContains(_)));
    let child = child_constraint(
        child,
        JsonPointer::default().join("contains"),
        JsonPointer::default(),
        ctx,
    )?;
    Ok(Some(KeywordConstraint::new(
        "contains",
        ContainsEvaluator {
            child,
            has_min_contains,
        },
    )))
}

struct PropertiesEvaluator {
    children: Vec<(String, Arc<SchemaConstraint>)>,
}

impl Evaluate for PropertiesEvaluator {
    fn evaluate<'i>(
        &self,
        evaluation: &mut Evaluation<'i>,
        ctx: &mut Context<'_>,
    ) -> Result<(), Error> {
        let Value::Object(object) = evaluation.instance else {
            return Ok(());
        };
        let mut applied = Vec::new();
        for (name, constraint) in &self.children {
            let Some(value) = object.get(name) else {
                continue;
            };
            let child = evaluation::evaluate(
                constraint,
                value,
                evaluation
                    .evaluation_path
                    .join("properties")
                    .join(name.clone()),
                evaluation.instance_location.join(name.clone()),
                ctx,
            )?;
            evaluation.attach(child, true);
            applied.push(json!(name));
        }
        evaluation.annotate("properties", Value::Array(applied));
        Ok(())
    }
}

pub(crate) fn compile_properties(
    children: &[(String, Arc<Schema>)],
    ctx: &mut Context<'_>,
) -> Result<Option<KeywordConstraint>, Error> {
    let mut compiled = Vec::with_capacity(children.len());
    for (name, child) in children {
        let constraint = compiler::constraint_for(
            child,
            JsonPointer::default().join("properties").join(name.clone()),
            JsonPointer::default(),
            JsonPointer::default().join(name.clone()),
            ctx,
        )?;
        compiled.push((name.clone(), constraint));
    }
    Ok(Some(KeywordConstraint::new(
        "properties",
        PropertiesEvaluator { children: compiled },
    )))
}

struct PatternPropertiesEvaluator {
    children: Vec<(Pattern, Arc<SchemaConstraint>)>,
}

impl Evaluate for PatternPropertiesEvaluator {
    fn evaluate<'i>(
        &self,
        evaluation: &mut Evaluation<'i>,
        ctx: &mut Context<'_>,
    ) -> Result<(), Error> {
        let Value::Object(object) = evaluation.instance else {
            return Ok(());
        };
        let mut applied = Vec::new();
        for (name, value) in object {
            for (pattern, constraint) in &self.children {
                if !pattern.is_match(name) {
                    continue;
                }
                let child = evaluation::evaluate(
                    constraint,
                    value,
                    evaluation
                        .evaluation_path
                        .join("patternProperties")
                        .join(pattern.source().to_string()),
                    evaluation.instance_location.join(name.clone()),
                    ctx,
                )?;
                evaluation.attach(child, true);
                applied.push(json!(name));
            }
        }
        evaluation.annotate("patternProperties", Value::Array(applied));
        Ok(())
    }
}

pub(crate) fn compile_pattern_properties(
    patterns: &[(Pattern, Arc<Schema>)],
    ctx: &mut Context<'_>,
) -> Result<Option<KeywordConstraint>, Error> {
    let mut children = Vec::with_capacity(patterns.len());
    for (pattern, child) in patterns {
        let constraint = child_constraint(
            child,
            JsonPointer::default()
                .join("patternProperties")
                .join(pattern.source().to_string()),
            JsonPointer::default(),
            ctx,
        )?;
        children.push((pattern.clone(), constraint));
    }
    Ok(Some(KeywordConstraint::new(
        "patternProperties",
        PatternPropertiesEvaluator { children },
    )))
}

struct AdditionalPropertiesEvaluator {
    child: Arc<SchemaConstraint>,
    /// Property names covered by a sibling `properties`.
    names: Vec<String>,
    /// Patterns covered by a sibling `patternProperties`.
    patterns: Vec<Pattern>,
}

impl Evaluate for AdditionalPropertiesEvaluator {
    fn evaluate<'i>(
        &self,
        evaluation: &mut Evaluation<'i>,
        ctx: &mut Context<'_>,
    ) -> Result<(), Error> {
        let Value::Object(object) = evaluation.instance else {
            return Ok(());
        };
        let mut applied = Vec::new();
        for (name, value) in object {
            if self.names.iter().any(|covered| covered == name)
                || self.patterns.iter().any(|pattern| pattern.is_match(name))
            {
                continue;
            }
            let child = evaluation::evaluate(
                &self.child,
                value,
                evaluation.evaluation_path.join("additionalProperties"),
                evaluation.instance_location.join(name.clone()),
                ctx,
            )?;
            evaluation.attach(child, true);
            applied.push(json!(name));
        }
        evaluation.annotate("additionalProperties", Value::Array(applied));
        Ok(())
    }
}

pub(crate) fn compile_additional_properties(
    child: &Arc<Schema>,
    schema: &Schema,
    ctx: &mut Context<'_>,
) -> Result<Option<KeywordConstraint>, Error> {
    let names = match schema.get("properties") {
        Some(Keyword::Properties(children)) => {
            children.iter().map(|(name, _)| name.clone()).collect()
        }
        _ => Vec::new(),
    };
    let patterns = match schema.get("patternProperties") {
        Some(Keyword::PatternProperties(patterns)) => patterns
            .iter()
            .map(|(pattern, _)| pattern.clone())
            .collect(),
        _ => Vec::new(),
    };
    let child = child_constraint(
        child,
        JsonPointer::default().join("additionalProperties"),
        JsonPointer::default(),
        ctx,
    )?;
    Ok(Some(KeywordConstraint::new(
        "additionalProperties",
        AdditionalPropertiesEvaluator {
            child,
            names,
            patterns,
        },
    )))
}

struct PropertyNamesEvaluator {
    child: Arc<SchemaConstraint>,
}

impl Evaluate for PropertyNamesEvaluator {
    fn evaluate<'i>(
        &self,
        evaluation: &mut Evaluation<'i>,
        ctx: &mut Context<'_>,
    ) -> Result<(), Error> {
        let Value::Object(object) = evaluation.instance else {
            return Ok(());
        };
        let mut offending = Vec::new();
        for name in object.keys() {
            // Property names are evaluated as standalone string instances;
            // the verdict is recorded here rather than as a child node.
            let name_value = Value::String(name.clone());
            let outcome = evaluation::evaluate(
                &self.child,
                &name_value,
                evaluation.evaluation_path.join("propertyNames"),
                evaluation.instance_location.clone(),
                ctx,
            )?;
            if !outcome.is_valid() {
                offending.push(json!(name));
            }
        }
        if !offending.is_empty() {
            evaluation.fail(
                "propertyNames",
                vec![("properties", Value::Array(offending))],
            );
        }
        Ok(())
    }
}

pub(crate) fn compile_property_names(
    child: &Arc<Schema>,
    ctx: &mut Context<'_>,
) -> Result<Option<KeywordConstraint>, Error> {
    let child = child_constraint(
        child,
        JsonPointer::default().join("propertyNames"),
        JsonPointer::default(),
        ctx,
    )?;
    Ok(Some(KeywordConstraint::new(
        "propertyNames",
        PropertyNamesEvaluator { child },
    )))
}
