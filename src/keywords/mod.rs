//! The keyword-typed schema representation.
//!
//! Every recognized keyword is a variant of [`Keyword`] owning its parsed
//! arguments; property names that match no variant are preserved as
//! [`Keyword::Unrecognized`]. Subschema-bearing keywords expose their
//! children through [`Keyword::subschemas`] (anchor collection, dynamism
//! detection) and [`Keyword::find_subschema`] (JSON Pointer resolution).
pub(crate) mod annotations;
pub(crate) mod applicator;
pub(crate) mod core;
pub(crate) mod helpers;
pub(crate) mod unevaluated;
pub(crate) mod validation;

use std::sync::Arc;

use serde_json::{Number, Value};

use crate::{
    compiler::Context,
    drafts::{Draft, DraftSet},
    error::Error,
    evaluation::KeywordConstraint,
    paths::PathChunk,
    primitive_type::{PrimitiveType, TypeSet},
    schema::Schema,
};
use helpers::Pattern;

/// Keywords with the default priority run first, in schema order.
pub(crate) const PRIORITY_DEFAULT: i64 = 0;
/// Keywords that read sibling annotations produced at the default priority.
pub(crate) const PRIORITY_AFTER_SIBLINGS: i64 = 10;
/// `additionalProperties` / `additionalItems` run after the keywords whose
/// coverage they complement.
pub(crate) const PRIORITY_ADDITIONAL: i64 = 20;
/// `unevaluated*` keywords run last so that every other annotation source has
/// been recorded.
pub(crate) const PRIORITY_UNEVALUATED: i64 = i64::MAX;

/// The `items` keyword changed shape across drafts.
#[derive(Debug)]
pub(crate) enum ItemsForm {
    /// A single schema applied to items (all of them, or in Draft 2020-12
    /// those following `prefixItems`).
    Single(Arc<Schema>),
    /// The legacy tuple form, one schema per leading index.
    Tuple(Vec<Arc<Schema>>),
}

/// Legacy `dependencies` values.
#[derive(Debug)]
pub(crate) enum Dependency {
    Schema(Arc<Schema>),
    Required(Vec<String>),
}

#[derive(Debug)]
pub(crate) enum Keyword {
    // Identifiers and other core keywords.
    Schema(String),
    Id { value: String, legacy: bool },
    Anchor(String),
    DynamicAnchor(String),
    RecursiveAnchor(bool),
    Ref(String),
    DynamicRef(String),
    RecursiveRef,
    Defs {
        name: &'static str,
        schemas: Vec<(String, Arc<Schema>)>,
    },
    Vocabulary(Vec<(String, bool)>),
    Comment(String),
    // Applicators.
    AllOf(Vec<Arc<Schema>>),
    AnyOf(Vec<Arc<Schema>>),
    OneOf(Vec<Arc<Schema>>),
    Not(Arc<Schema>),
    If(Arc<Schema>),
    Then(Arc<Schema>),
    Else(Arc<Schema>),
    DependentSchemas(Vec<(String, Arc<Schema>)>),
    Dependencies(Vec<(String, Dependency)>),
    Items(ItemsForm),
    PrefixItems(Vec<Arc<Schema>>),
    AdditionalItems(Arc<Schema>),
    Contains(Arc<Schema>),
    Properties(Vec<(String, Arc<Schema>)>),
    PatternProperties(Vec<(Pattern, Arc<Schema>)>),
    AdditionalProperties(Arc<Schema>),
    PropertyNames(Arc<Schema>),
    UnevaluatedItems(Arc<Schema>),
    UnevaluatedProperties(Arc<Schema>),
    // Validation.
    Type(TypeSet),
    Enum(Vec<Value>),
    Const(Value),
    MultipleOf(Number),
    Maximum(Number),
    ExclusiveMaximum(Number),
    Minimum(Number),
    ExclusiveMinimum(Number),
    MaxLength(u64),
    MinLength(u64),
    Pattern(Pattern),
    MaxItems(u64),
    MinItems(u64),
    UniqueItems(bool),
    MaxContains(u64),
    MinContains(u64),
    MaxProperties(u64),
    MinProperties(u64),
    Required(Vec<String>),
    DependentRequired(Vec<(String, Vec<String>)>),
    // Annotations.
    Title(String),
    Description(String),
    DefaultValue(Value),
    Deprecated(bool),
    ReadOnly(bool),
    WriteOnly(bool),
    Examples(Vec<Value>),
    Format(String),
    ContentEncoding(String),
    ContentMediaType(String),
    ContentSchema(Arc<Schema>),
    // Anything else.
    Unrecognized { name: String, value: Value },
}

impl Keyword {
    /// Parse a schema property into its keyword representation.
    ///
    /// Unknown property names are preserved as [`Keyword::Unrecognized`];
    /// known names with ill-typed values fail parsing.
    pub(crate) fn parse(name: &str, value: &Value) -> Result<Keyword, Error> {
        Ok(match name {
            "$schema" => Keyword::Schema(helpers::expect_string(name, value)?),
            "$id" => Keyword::Id {
                value: helpers::expect_string(name, value)?,
                legacy: false,
            },
            // Draft 6 named its identifier keyword `id`; everywhere else the
            // name is ordinary data, so only string values are claimed.
            "id" => match value {
                Value::String(value) => Keyword::Id {
                    value: value.clone(),
                    legacy: true,
                },
                _ => Keyword::Unrecognized {
                    name: name.to_string(),
                    value: value.clone(),
                },
            },
            "$anchor" => Keyword::Anchor(parse_anchor_name(name, value)?),
            "$dynamicAnchor" => Keyword::DynamicAnchor(parse_anchor_name(name, value)?),
            "$recursiveAnchor" => Keyword::RecursiveAnchor(helpers::expect_bool(name, value)?),
            "$ref" => Keyword::Ref(helpers::expect_string(name, value)?),
            "$dynamicRef" => Keyword::DynamicRef(helpers::expect_string(name, value)?),
            "$recursiveRef" => {
                if value.as_str() == Some("#") {
                    Keyword::RecursiveRef
                } else {
                    return Err(Error::keyword_parse(name, "the only valid value is '#'"));
                }
            }
            "$defs" => Keyword::Defs {
                name: "$defs",
                schemas: helpers::expect_schema_map(name, value)?,
            },
            "definitions" => Keyword::Defs {
                name: "definitions",
                schemas: helpers::expect_schema_map(name, value)?,
            },
            "$vocabulary" => {
                let map = helpers::expect_object(name, value)?;
                let mut vocabularies = Vec::with_capacity(map.len());
                for (uri, required) in map {
                    vocabularies.push((uri.clone(), helpers::expect_bool(name, required)?));
                }
                Keyword::Vocabulary(vocabularies)
            }
            "$comment" => Keyword::Comment(helpers::expect_string(name, value)?),
            "allOf" => Keyword::AllOf(helpers::expect_schema_list(name, value)?),
            "anyOf" => Keyword::AnyOf(helpers::expect_schema_list(name, value)?),
            "oneOf" => Keyword::OneOf(helpers::expect_schema_list(name, value)?),
            "not" => Keyword::Not(helpers::expect_schema(name, value)?),
            "if" => Keyword::If(helpers::expect_schema(name, value)?),
            "then" => Keyword::Then(helpers::expect_schema(name, value)?),
            "else" => Keyword::Else(helpers::expect_schema(name, value)?),
            "dependentSchemas" => {
                Keyword::DependentSchemas(helpers::expect_schema_map(name, value)?)
            }
            "dependencies" => {
                let map = helpers::expect_object(name, value)?;
                let mut dependencies = Vec::with_capacity(map.len());
                for (property, dependency) in map {
                    let dependency = match dependency {
                        Value::Array(_) => {
                            Dependency::Required(helpers::expect_string_array(name, dependency)?)
                        }
                        _ => Dependency::Schema(helpers::expect_schema(name, dependency)?),
                    };
                    dependencies.push((property.clone(), dependency));
                }
                Keyword::Dependencies(dependencies)
            }
            "items" => match value {
                Value::Array(_) => {
                    Keyword::Items(ItemsForm::Tuple(helpers::expect_schema_list(name, value)?))
                }
                _ => Keyword::Items(ItemsForm::Single(helpers::expect_schema(name, value)?)),
            },
            "prefixItems" => Keyword::PrefixItems(helpers::expect_schema_list(name, value)?),
            "additionalItems" => Keyword::AdditionalItems(helpers::expect_schema(name, value)?),
            "contains" => Keyword::Contains(helpers::expect_schema(name, value)?),
            "properties" => Keyword::Properties(helpers::expect_schema_map(name, value)?),
            "patternProperties" => {
                let map = helpers::expect_object(name, value)?;
                let mut patterns = Vec::with_capacity(map.len());
                for (pattern, subschema) in map {
                    patterns.push((
                        Pattern::compile(name, pattern)?,
                        helpers::expect_schema(name, subschema)?,
                    ));
                }
                Keyword::PatternProperties(patterns)
            }
            "additionalProperties" => {
                Keyword::AdditionalProperties(helpers::expect_schema(name, value)?)
            }
            "propertyNames" => Keyword::PropertyNames(helpers::expect_schema(name, value)?),
            "unevaluatedItems" => Keyword::UnevaluatedItems(helpers::expect_schema(name, value)?),
            "unevaluatedProperties" => {
                Keyword::UnevaluatedProperties(helpers::expect_schema(name, value)?)
            }
            "type" => Keyword::Type(parse_type(name, value)?),
            "enum" => Keyword::Enum(helpers::expect_array(name, value)?.clone()),
            "const" => Keyword::Const(value.clone()),
            "multipleOf" => {
                let number = helpers::expect_number(name, value)?;
                if number.as_f64().map_or(true, |value| value <= 0.0) {
                    return Err(Error::keyword_parse(name, "expected a positive number"));
                }
                Keyword::MultipleOf(number)
            }
            "maximum" => Keyword::Maximum(helpers::expect_number(name, value)?),
            "exclusiveMaximum" => Keyword::ExclusiveMaximum(helpers::expect_number(name, value)?),
            "minimum" => Keyword::Minimum(helpers::expect_number(name, value)?),
            "exclusiveMinimum" => Keyword::ExclusiveMinimum(helpers::expect_number(name, value)?),
            "maxLength" => Keyword::MaxLength(helpers::expect_limit(name, value)?),
            "minLength" => Keyword::MinLength(helpers::expect_limit(name, value)?),
            "pattern" => Keyword::Pattern(Pattern::compile(name, &helpers::expect_string(name, value)?)?),
            "maxItems" => Keyword::MaxItems(helpers::expect_limit(name, value)?),
            "minItems" => Keyword::MinItems(helpers::expect_limit(name, value)?),
            "uniqueItems" => Keyword::UniqueItems(helpers::expect_bool(name, value)?),
            "maxContains" => Keyword::MaxContains(helpers::expect_limit(name, value)?),
            "minContains" => Keyword::MinContains(helpers::expect_limit(name, value)?),
            "maxProperties" => Keyword::MaxProperties(helpers::expect_limit(name, value)?),
            "minProperties" => Keyword::MinProperties(helpers::expect_limit(name, value)?),
            "required" => Keyword::Required(helpers::expect_string_array(name, value)?),
            "dependentRequired" => {
                let map = helpers::expect_object(name, value)?;
                let mut dependencies = Vec::with_capacity(map.len());
                for (property, required) in map {
                    dependencies.push((
                        property.clone(),
                        helpers::expect_string_array(name, required)?,
                    ));
                }
                Keyword::DependentRequired(dependencies)
            }
            "title" => Keyword::Title(helpers::expect_string(name, value)?),
            "description" => Keyword::Description(helpers::expect_string(name, value)?),
            "default" => Keyword::DefaultValue(value.clone()),
            "deprecated" => Keyword::Deprecated(helpers::expect_bool(name, value)?),
            "readOnly" => Keyword::ReadOnly(helpers::expect_bool(name, value)?),
            "writeOnly" => Keyword::WriteOnly(helpers::expect_bool(name, value)?),
            "examples" => Keyword::Examples(helpers::expect_array(name, value)?.clone()),
            "format" => Keyword::Format(helpers::expect_string(name, value)?),
            "contentEncoding" => Keyword::ContentEncoding(helpers::expect_string(name, value)?),
            "contentMediaType" => Keyword::ContentMediaType(helpers::expect_string(name, value)?),
            "contentSchema" => Keyword::ContentSchema(helpers::expect_schema(name, value)?),
            _ => Keyword::Unrecognized {
                name: name.to_string(),
                value: value.clone(),
            },
        })
    }

    pub(crate) fn name(&self) -> &str {
        match self {
            Keyword::Schema(_) => "$schema",
            Keyword::Id { legacy: false, .. } => "$id",
            Keyword::Id { legacy: true, .. } => "id",
            Keyword::Anchor(_) => "$anchor",
            Keyword::DynamicAnchor(_) => "$dynamicAnchor",
            Keyword::RecursiveAnchor(_) => "$recursiveAnchor",
            Keyword::Ref(_) => "$ref",
            Keyword::DynamicRef(_) => "$dynamicRef",
            Keyword::RecursiveRef => "$recursiveRef",
            Keyword::Defs { name, .. } => name,
            Keyword::Vocabulary(_) => "$vocabulary",
            Keyword::Comment(_) => "$comment",
            Keyword::AllOf(_) => "allOf",
            Keyword::AnyOf(_) => "anyOf",
            Keyword::OneOf(_) => "oneOf",
            Keyword::Not(_) => "not",
            Keyword::If(_) => "if",
            Keyword::Then(_) => "then",
            Keyword::Else(_) => "else",
            Keyword::DependentSchemas(_) => "dependentSchemas",
            Keyword::Dependencies(_) => "dependencies",
            Keyword::Items(_) => "items",
            Keyword::PrefixItems(_) => "prefixItems",
            Keyword::AdditionalItems(_) => "additionalItems",
            Keyword::Contains(_) => "contains",
            Keyword::Properties(_) => "properties",
            Keyword::PatternProperties(_) => "patternProperties",
            Keyword::AdditionalProperties(_) => "additionalProperties",
            Keyword::PropertyNames(_) => "propertyNames",
            Keyword::UnevaluatedItems(_) => "unevaluatedItems",
            Keyword::UnevaluatedProperties(_) => "unevaluatedProperties",
            Keyword::Type(_) => "type",
            Keyword::Enum(_) => "enum",
            Keyword::Const(_) => "const",
            Keyword::MultipleOf(_) => "multipleOf",
            Keyword::Maximum(_) => "maximum",
            Keyword::ExclusiveMaximum(_) => "exclusiveMaximum",
            Keyword::Minimum(_) => "minimum",
            Keyword::ExclusiveMinimum(_) => "exclusiveMinimum",
            Keyword::MaxLength(_) => "maxLength",
            Keyword::MinLength(_) => "minLength",
            Keyword::Pattern(_) => "pattern",
            Keyword::MaxItems(_) => "maxItems",
            Keyword::MinItems(_) => "minItems",
            Keyword::UniqueItems(_) => "uniqueItems",
            Keyword::MaxContains(_) => "maxContains",
            Keyword::MinContains(_) => "minContains",
            Keyword::MaxProperties(_) => "maxProperties",
            Keyword::MinProperties(_) => "minProperties",
            Keyword::Required(_) => "required",
            Keyword::DependentRequired(_) => "dependentRequired",
            Keyword::Title(_) => "title",
            Keyword::Description(_) => "description",
            Keyword::DefaultValue(_) => "default",
            Keyword::Deprecated(_) => "deprecated",
            Keyword::ReadOnly(_) => "readOnly",
            Keyword::WriteOnly(_) => "writeOnly",
            Keyword::Examples(_) => "examples",
            Keyword::Format(_) => "format",
            Keyword::ContentEncoding(_) => "contentEncoding",
            Keyword::ContentMediaType(_) => "contentMediaType",
            Keyword::ContentSchema(_) => "contentSchema",
            Keyword::Unrecognized { name, .. } => name,
        }
    }

    /// The drafts this keyword is declared for, used both for compilation and
    /// for detecting the draft of schemas without a `$schema`.
    pub(crate) fn supported_drafts(&self) -> DraftSet {
        match self {
            Keyword::Id { legacy: true, .. } => DraftSet::single(Draft::Draft6),
            Keyword::RecursiveAnchor(_) | Keyword::RecursiveRef => {
                DraftSet::single(Draft::Draft201909)
            }
            Keyword::DynamicAnchor(_) | Keyword::DynamicRef(_) | Keyword::PrefixItems(_) => {
                DraftSet::since(Draft::Draft202012)
            }
            Keyword::Anchor(_)
            | Keyword::Vocabulary(_)
            | Keyword::Defs { name: "$defs", .. }
            | Keyword::DependentSchemas(_)
            | Keyword::DependentRequired(_)
            | Keyword::MaxContains(_)
            | Keyword::MinContains(_)
            | Keyword::UnevaluatedItems(_)
            | Keyword::UnevaluatedProperties(_)
            | Keyword::Deprecated(_)
            | Keyword::ContentSchema(_) => DraftSet::MODERN,
            Keyword::Comment(_)
            | Keyword::If(_)
            | Keyword::Then(_)
            | Keyword::Else(_)
            | Keyword::ReadOnly(_)
            | Keyword::WriteOnly(_)
            | Keyword::ContentEncoding(_)
            | Keyword::ContentMediaType(_) => DraftSet::since(Draft::Draft7),
            Keyword::Dependencies(_) => DraftSet::LEGACY,
            Keyword::AdditionalItems(_) | Keyword::Items(ItemsForm::Tuple(_)) => {
                DraftSet::until(Draft::Draft201909)
            }
            _ => DraftSet::ALL,
        }
    }

    pub(crate) fn priority(&self) -> i64 {
        match self {
            Keyword::Then(_)
            | Keyword::Else(_)
            | Keyword::MaxContains(_)
            | Keyword::MinContains(_) => PRIORITY_AFTER_SIBLINGS,
            Keyword::AdditionalProperties(_) | Keyword::AdditionalItems(_) => PRIORITY_ADDITIONAL,
            Keyword::UnevaluatedItems(_) | Keyword::UnevaluatedProperties(_) => {
                PRIORITY_UNEVALUATED
            }
            _ => PRIORITY_DEFAULT,
        }
    }

    /// All owned subschemas together with their path below this keyword's
    /// parent schema.
    pub(crate) fn subschemas(&self) -> Vec<(Vec<PathChunk>, &Arc<Schema>)> {
        let keyword = |name: &'static str| PathChunk::Keyword(name);
        match self {
            Keyword::Not(child)
            | Keyword::If(child)
            | Keyword::Then(child)
            | Keyword::Else(child)
            | Keyword::AdditionalItems(child)
            | Keyword::Contains(child)
            | Keyword::AdditionalProperties(child)
            | Keyword::PropertyNames(child)
            | Keyword::UnevaluatedItems(child)
            | Keyword::UnevaluatedProperties(child)
            | Keyword::ContentSchema(child)
            | Keyword::Items(ItemsForm::Single(child)) => {
                vec![(vec![keyword(static_name(self.name()))], child)]
            }
            Keyword::AllOf(children)
            | Keyword::AnyOf(children)
            | Keyword::OneOf(children)
            | Keyword::PrefixItems(children)
            | Keyword::Items(ItemsForm::Tuple(children)) => children
                .iter()
                .enumerate()
                .map(|(index, child)| {
                    (
                        vec![keyword(static_name(self.name())), PathChunk::Index(index)],
                        child,
                    )
                })
                .collect(),
            Keyword::Defs { name, schemas } => schemas
                .iter()
                .map(|(key, child)| {
                    (
                        vec![keyword(*name), PathChunk::Property(key.clone().into())],
                        child,
                    )
                })
                .collect(),
            Keyword::Properties(schemas) | Keyword::DependentSchemas(schemas) => schemas
                .iter()
                .map(|(key, child)| {
                    (
                        vec![
                            keyword(static_name(self.name())),
                            PathChunk::Property(key.clone().into()),
                        ],
                        child,
                    )
                })
                .collect(),
            Keyword::PatternProperties(patterns) => patterns
                .iter()
                .map(|(pattern, child)| {
                    (
                        vec![
                            keyword("patternProperties"),
                            PathChunk::Property(pattern.source().into()),
                        ],
                        child,
                    )
                })
                .collect(),
            Keyword::Dependencies(dependencies) => dependencies
                .iter()
                .filter_map(|(key, dependency)| match dependency {
                    Dependency::Schema(child) => Some((
                        vec![
                            keyword("dependencies"),
                            PathChunk::Property(key.clone().into()),
                        ],
                        child,
                    )),
                    Dependency::Required(_) => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Resolve a JSON Pointer tail below this keyword to a subschema,
    /// returning how many segments were consumed.
    pub(crate) fn find_subschema(&self, segments: &[String]) -> Option<(&Arc<Schema>, usize)> {
        match self {
            Keyword::Not(child)
            | Keyword::If(child)
            | Keyword::Then(child)
            | Keyword::Else(child)
            | Keyword::AdditionalItems(child)
            | Keyword::Contains(child)
            | Keyword::AdditionalProperties(child)
            | Keyword::PropertyNames(child)
            | Keyword::UnevaluatedItems(child)
            | Keyword::UnevaluatedProperties(child)
            | Keyword::ContentSchema(child)
            | Keyword::Items(ItemsForm::Single(child)) => Some((child, 0)),
            Keyword::AllOf(children)
            | Keyword::AnyOf(children)
            | Keyword::OneOf(children)
            | Keyword::PrefixItems(children)
            | Keyword::Items(ItemsForm::Tuple(children)) => {
                let index = segments.first()?.parse::<usize>().ok()?;
                children.get(index).map(|child| (child, 1))
            }
            Keyword::Defs { schemas, .. }
            | Keyword::Properties(schemas)
            | Keyword::DependentSchemas(schemas) => {
                let key = segments.first()?;
                schemas
                    .iter()
                    .find(|(name, _)| name == key)
                    .map(|(_, child)| (child, 1))
            }
            Keyword::PatternProperties(patterns) => {
                let key = segments.first()?;
                patterns
                    .iter()
                    .find(|(pattern, _)| pattern.source() == key)
                    .map(|(_, child)| (child, 1))
            }
            Keyword::Dependencies(dependencies) => {
                let key = segments.first()?;
                dependencies
                    .iter()
                    .find_map(|(name, dependency)| match dependency {
                        Dependency::Schema(child) if name == key => Some((child, 1)),
                        _ => None,
                    })
            }
            _ => None,
        }
    }

    /// Compile this keyword into a constraint, or `None` for keywords that
    /// only affect identification, annotation collection or round-tripping.
    pub(crate) fn build(
        &self,
        schema: &Schema,
        siblings: &[KeywordConstraint],
        ctx: &mut Context<'_>,
    ) -> Result<Option<KeywordConstraint>, Error> {
        let draft = schema.draft();
        if !self.supported_drafts().contains(draft) {
            // Reference semantics silently changing with the draft would be
            // unsound; other out-of-draft keywords are inert.
            return match self {
                Keyword::Ref(_)
                | Keyword::DynamicRef(_)
                | Keyword::RecursiveRef
                | Keyword::Items(ItemsForm::Tuple(_)) => {
                    Err(Error::unsupported(self.name(), draft))
                }
                _ => Ok(None),
            };
        }
        match self {
            Keyword::Schema(_)
            | Keyword::Id { .. }
            | Keyword::Anchor(_)
            | Keyword::DynamicAnchor(_)
            | Keyword::RecursiveAnchor(_)
            | Keyword::Defs { .. }
            | Keyword::Vocabulary(_)
            | Keyword::Comment(_) => Ok(None),
            Keyword::Ref(reference) => core::compile_ref(reference, schema, ctx),
            Keyword::DynamicRef(reference) => core::compile_dynamic_ref(reference, schema, ctx),
            Keyword::RecursiveRef => core::compile_recursive_ref(schema, ctx),
            Keyword::AllOf(children) => applicator::compile_all_of(children, ctx),
            Keyword::AnyOf(children) => applicator::compile_any_of(children, ctx),
            Keyword::OneOf(children) => applicator::compile_one_of(children, ctx),
            Keyword::Not(child) => applicator::compile_not(child, ctx),
            Keyword::If(child) => applicator::compile_if(child, ctx),
            Keyword::Then(child) => applicator::compile_branch("then", child, true, ctx),
            Keyword::Else(child) => applicator::compile_branch("else", child, false, ctx),
            Keyword::DependentSchemas(children) => {
                applicator::compile_dependent_schemas(children, ctx)
            }
            Keyword::Dependencies(dependencies) => {
                applicator::compile_dependencies(dependencies, ctx)
            }
            Keyword::Items(form) => applicator::compile_items(form, schema, ctx),
            Keyword::PrefixItems(children) => applicator::compile_prefix_items(children, ctx),
            Keyword::AdditionalItems(child) => {
                applicator::compile_additional_items(child, schema, siblings, ctx)
            }
            Keyword::Contains(child) => applicator::compile_contains(child, schema, ctx),
            Keyword::Properties(children) => applicator::compile_properties(children, ctx),
            Keyword::PatternProperties(patterns) => {
                applicator::compile_pattern_properties(patterns, ctx)
            }
            Keyword::AdditionalProperties(child) => {
                applicator::compile_additional_properties(child, schema, ctx)
            }
            Keyword::PropertyNames(child) => applicator::compile_property_names(child, ctx),
            Keyword::UnevaluatedItems(child) => unevaluated::compile_items(child, ctx),
            Keyword::UnevaluatedProperties(child) => unevaluated::compile_properties(child, ctx),
            Keyword::Type(types) => Ok(Some(validation::type_constraint(*types))),
            Keyword::Enum(values) => Ok(Some(validation::enum_constraint(values.clone()))),
            Keyword::Const(value) => Ok(Some(validation::const_constraint(value.clone()))),
            Keyword::MultipleOf(divisor) => {
                Ok(Some(validation::multiple_of_constraint(divisor.clone())))
            }
            Keyword::Maximum(limit) => Ok(Some(validation::limit_constraint(
                "maximum",
                limit.clone(),
                validation::NumberBound::Maximum,
            ))),
            Keyword::ExclusiveMaximum(limit) => Ok(Some(validation::limit_constraint(
                "exclusiveMaximum",
                limit.clone(),
                validation::NumberBound::ExclusiveMaximum,
            ))),
            Keyword::Minimum(limit) => Ok(Some(validation::limit_constraint(
                "minimum",
                limit.clone(),
                validation::NumberBound::Minimum,
            ))),
            Keyword::ExclusiveMinimum(limit) => Ok(Some(validation::limit_constraint(
                "exclusiveMinimum",
                limit.clone(),
                validation::NumberBound::ExclusiveMinimum,
            ))),
            Keyword::MaxLength(limit) => Ok(Some(validation::max_length_constraint(*limit))),
            Keyword::MinLength(limit) => Ok(Some(validation::min_length_constraint(*limit))),
            Keyword::Pattern(pattern) => Ok(Some(validation::pattern_constraint(pattern))),
            Keyword::MaxItems(limit) => Ok(Some(validation::max_items_constraint(*limit))),
            Keyword::MinItems(limit) => Ok(Some(validation::min_items_constraint(*limit))),
            Keyword::UniqueItems(unique) => Ok(validation::unique_items_constraint(*unique)),
            Keyword::MaxContains(limit) => Ok(Some(validation::contains_limit_constraint(
                "maxContains",
                *limit,
            ))),
            Keyword::MinContains(limit) => Ok(Some(validation::contains_limit_constraint(
                "minContains",
                *limit,
            ))),
            Keyword::MaxProperties(limit) => {
                Ok(Some(validation::max_properties_constraint(*limit)))
            }
            Keyword::MinProperties(limit) => {
                Ok(Some(validation::min_properties_constraint(*limit)))
            }
            Keyword::Required(properties) => {
                Ok(Some(validation::required_constraint(properties.clone())))
            }
            Keyword::DependentRequired(dependencies) => Ok(Some(
                validation::dependent_required_constraint(dependencies.clone()),
            )),
            Keyword::Title(value) => Ok(Some(annotations::constraint("title", value.clone()))),
            Keyword::Description(value) => {
                Ok(Some(annotations::constraint("description", value.clone())))
            }
            Keyword::DefaultValue(value) => {
                Ok(Some(annotations::value_constraint("default", value.clone())))
            }
            Keyword::Deprecated(value) => {
                Ok(Some(annotations::value_constraint("deprecated", Value::Bool(*value))))
            }
            Keyword::ReadOnly(value) => {
                Ok(Some(annotations::value_constraint("readOnly", Value::Bool(*value))))
            }
            Keyword::WriteOnly(value) => {
                Ok(Some(annotations::value_constraint("writeOnly", Value::Bool(*value))))
            }
            Keyword::Examples(values) => Ok(Some(annotations::value_constraint(
                "examples",
                Value::Array(values.clone()),
            ))),
            Keyword::Format(value) => Ok(Some(annotations::constraint("format", value.clone()))),
            Keyword::ContentEncoding(value) => {
                Ok(Some(annotations::constraint("contentEncoding", value.clone())))
            }
            Keyword::ContentMediaType(value) => {
                Ok(Some(annotations::constraint("contentMediaType", value.clone())))
            }
            Keyword::ContentSchema(child) => annotations::compile_content_schema(child, ctx),
            Keyword::Unrecognized { name, value } => {
                Ok(Some(annotations::unrecognized_constraint(
                    name.clone(),
                    value.clone(),
                )))
            }
        }
    }

    /// Serialize the keyword argument back to JSON.
    pub(crate) fn to_value(&self) -> Value {
        match self {
            Keyword::Schema(value)
            | Keyword::Comment(value)
            | Keyword::Anchor(value)
            | Keyword::DynamicAnchor(value)
            | Keyword::Ref(value)
            | Keyword::DynamicRef(value)
            | Keyword::Title(value)
            | Keyword::Description(value)
            | Keyword::Format(value)
            | Keyword::ContentEncoding(value)
            | Keyword::ContentMediaType(value) => Value::String(value.clone()),
            Keyword::Id { value, .. } => Value::String(value.clone()),
            Keyword::RecursiveAnchor(value) => Value::Bool(*value),
            Keyword::RecursiveRef => Value::String("#".to_string()),
            Keyword::Defs { schemas, .. } => schema_map_to_value(schemas),
            Keyword::Vocabulary(vocabularies) => Value::Object(
                vocabularies
                    .iter()
                    .map(|(uri, required)| (uri.clone(), Value::Bool(*required)))
                    .collect(),
            ),
            Keyword::AllOf(children)
            | Keyword::AnyOf(children)
            | Keyword::OneOf(children)
            | Keyword::PrefixItems(children)
            | Keyword::Items(ItemsForm::Tuple(children)) => {
                Value::Array(children.iter().map(|child| child.to_value()).collect())
            }
            Keyword::Not(child)
            | Keyword::If(child)
            | Keyword::Then(child)
            | Keyword::Else(child)
            | Keyword::AdditionalItems(child)
            | Keyword::Contains(child)
            | Keyword::AdditionalProperties(child)
            | Keyword::PropertyNames(child)
            | Keyword::UnevaluatedItems(child)
            | Keyword::UnevaluatedProperties(child)
            | Keyword::ContentSchema(child)
            | Keyword::Items(ItemsForm::Single(child)) => child.to_value(),
            Keyword::DependentSchemas(schemas) | Keyword::Properties(schemas) => {
                schema_map_to_value(schemas)
            }
            Keyword::PatternProperties(patterns) => Value::Object(
                patterns
                    .iter()
                    .map(|(pattern, child)| (pattern.source().to_string(), child.to_value()))
                    .collect(),
            ),
            Keyword::Dependencies(dependencies) => Value::Object(
                dependencies
                    .iter()
                    .map(|(name, dependency)| {
                        let value = match dependency {
                            Dependency::Schema(child) => child.to_value(),
                            Dependency::Required(required) => string_array_to_value(required),
                        };
                        (name.clone(), value)
                    })
                    .collect(),
            ),
            Keyword::Type(types) => types.to_value(),
            Keyword::Enum(values) | Keyword::Examples(values) => Value::Array(values.clone()),
            Keyword::Const(value) | Keyword::DefaultValue(value) => value.clone(),
            Keyword::MultipleOf(number)
            | Keyword::Maximum(number)
            | Keyword::ExclusiveMaximum(number)
            | Keyword::Minimum(number)
            | Keyword::ExclusiveMinimum(number) => Value::Number(number.clone()),
            Keyword::MaxLength(limit)
            | Keyword::MinLength(limit)
            | Keyword::MaxItems(limit)
            | Keyword::MinItems(limit)
            | Keyword::MaxContains(limit)
            | Keyword::MinContains(limit)
            | Keyword::MaxProperties(limit)
            | Keyword::MinProperties(limit) => Value::from(*limit),
            Keyword::Pattern(pattern) => Value::String(pattern.source().to_string()),
            Keyword::UniqueItems(value)
            | Keyword::Deprecated(value)
            | Keyword::ReadOnly(value)
            | Keyword::WriteOnly(value) => Value::Bool(*value),
            Keyword::Required(properties) => string_array_to_value(properties),
            Keyword::DependentRequired(dependencies) => Value::Object(
                dependencies
                    .iter()
                    .map(|(name, required)| (name.clone(), string_array_to_value(required)))
                    .collect(),
            ),
            Keyword::Unrecognized { value, .. } => value.clone(),
        }
    }
}

fn schema_map_to_value(schemas: &[(String, Arc<Schema>)]) -> Value {
    Value::Object(
        schemas
            .iter()
            .map(|(name, child)| (name.clone(), child.to_value()))
            .collect(),
    )
}

fn string_array_to_value(values: &[String]) -> Value {
    Value::Array(values.iter().map(|value| Value::from(value.clone())).collect())
}

/// Anchor names are restricted to `^[A-Za-z_][A-Za-z0-9._-]*$`.
pub(crate) fn is_valid_anchor_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | '-'))
}

fn parse_anchor_name(keyword: &str, value: &Value) -> Result<String, Error> {
    let name = helpers::expect_string(keyword, value)?;
    if is_valid_anchor_name(&name) {
        Ok(name)
    } else {
        Err(Error::keyword_parse(
            keyword,
            format!("'{name}' is not a valid anchor name"),
        ))
    }
}

fn parse_type(keyword: &str, value: &Value) -> Result<TypeSet, Error> {
    let parse_one = |value: &Value| -> Result<PrimitiveType, Error> {
        let name = value
            .as_str()
            .ok_or_else(|| Error::keyword_parse(keyword, "expected a string"))?;
        PrimitiveType::from_keyword(name)
            .ok_or_else(|| Error::keyword_parse(keyword, format!("unknown type '{name}'")))
    };
    match value {
        Value::Array(types) => {
            let types = types.iter().map(parse_one).collect::<Result<Vec<_>, _>>()?;
            Ok(TypeSet::multiple(types.into_iter()))
        }
        _ => Ok(TypeSet::single(parse_one(value)?)),
    }
}

// `Keyword::name` already returns `&'static str` for every variant with
// subschemas; this keeps the path chunks allocation-free.
fn static_name(name: &str) -> &'static str {
    match name {
        "not" => "not",
        "if" => "if",
        "then" => "then",
        "else" => "else",
        "items" => "items",
        "prefixItems" => "prefixItems",
        "additionalItems" => "additionalItems",
        "contains" => "contains",
        "allOf" => "allOf",
        "anyOf" => "anyOf",
        "oneOf" => "oneOf",
        "properties" => "properties",
        "patternProperties" => "patternProperties",
        "additionalProperties" => "additionalProperties",
        "propertyNames" => "propertyNames",
        "unevaluatedItems" => "unevaluatedItems",
        "unevaluatedProperties" => "unevaluatedProperties",
        "dependentSchemas" => "dependentSchemas",
        "dependencies" => "dependencies",
        "contentSchema" => "contentSchema",
        "$defs" => "$defs",
        "definitions" => "definitions",
        _ => "unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::{is_valid_anchor_name, Keyword};
    use serde_json::json;
    use test_case::test_case;

    #[test_case("node", true)]
    #[test_case("_private", true)]
    #[test_case("a.b-c_d", true)]
    #[test_case("1digit", false)]
    #[test_case("", false)]
    #[test_case("with space", false)]
    fn anchor_names(name: &str, expected: bool) {
        assert_eq!(is_valid_anchor_name(name), expected);
    }

    #[test]
    fn unknown_names_are_preserved() {
        let keyword = Keyword::parse("x-mine", &json!({"y": 1})).unwrap();
        assert_eq!(keyword.name(), "x-mine");
        assert_eq!(keyword.to_value(), json!({"y": 1}));
    }

    #[test]
    fn ill_typed_values_fail() {
        assert!(Keyword::parse("minItems", &json!("nope")).is_err());
        assert!(Keyword::parse("pattern", &json!(1)).is_err());
        assert!(Keyword::parse("$recursiveRef", &json!("#/other")).is_err());
        assert!(Keyword::parse("multipleOf", &json!(0)).is_err());
    }

    #[test]
    fn non_string_id_is_not_an_identifier() {
        let keyword = Keyword::parse("id", &json!(42)).unwrap();
        assert!(matches!(keyword, Keyword::Unrecognized { .. }));
    }
}
