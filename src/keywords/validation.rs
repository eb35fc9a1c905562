//! Constraints for the value-validation keywords.
use std::cmp::Ordering;

use fraction::{BigFraction, BigUint};
use serde_json::{json, Number, Value};

use crate::{
    compiler::Context,
    error::Error,
    evaluation::{Evaluate, Evaluation, KeywordConstraint},
    keywords::helpers::{self, Pattern},
    primitive_type::{PrimitiveType, TypeSet},
};

struct TypeEvaluator {
    types: TypeSet,
}

impl Evaluate for TypeEvaluator {
    fn evaluate<'i>(
        &self,
        evaluation: &mut Evaluation<'i>,
        _: &mut Context<'_>,
    ) -> Result<(), Error> {
        if !self.types.matches(evaluation.instance) {
            let received = PrimitiveType::of(evaluation.instance).as_str();
            let expected = self.types.to_value();
            evaluation.fail(
                "type",
                vec![("received", json!(received)), ("expected", expected)],
            );
        }
        Ok(())
    }
}

pub(crate) fn type_constraint(types: TypeSet) -> KeywordConstraint {
    KeywordConstraint::new("type", TypeEvaluator { types })
}

struct EnumEvaluator {
    values: Vec<Value>,
}

impl Evaluate for EnumEvaluator {
    fn evaluate<'i>(
        &self,
        evaluation: &mut Evaluation<'i>,
        _: &mut Context<'_>,
    ) -> Result<(), Error> {
        if !self
            .values
            .iter()
            .any(|value| helpers::equal(value, evaluation.instance))
        {
            evaluation.fail("enum", vec![("values", Value::Array(self.values.clone()))]);
        }
        Ok(())
    }
}

pub(crate) fn enum_constraint(values: Vec<Value>) -> KeywordConstraint {
    KeywordConstraint::new("enum", EnumEvaluator { values })
}

struct ConstEvaluator {
    value: Value,
}

impl Evaluate for ConstEvaluator {
    fn evaluate<'i>(
        &self,
        evaluation: &mut Evaluation<'i>,
        _: &mut Context<'_>,
    ) -> Result<(), Error> {
        if !helpers::equal(&self.value, evaluation.instance) {
            evaluation.fail("const", vec![("value", self.value.clone())]);
        }
        Ok(())
    }
}

pub(crate) fn const_constraint(value: Value) -> KeywordConstraint {
    KeywordConstraint::new("const", ConstEvaluator { value })
}

struct MultipleOfIntegerEvaluator {
    divisor: Number,
}

impl Evaluate for MultipleOfIntegerEvaluator {
    fn evaluate<'i>(
        &self,
        evaluation: &mut Evaluation<'i>,
        _: &mut Context<'_>,
    ) -> Result<(), Error> {
        if let Value::Number(item) = evaluation.instance {
            let (Some(value), Some(divisor)) = (item.as_f64(), self.divisor.as_f64()) else {
                return Ok(());
            };
            // A value with a non-zero fractional part cannot be a multiple
            // of an integral divisor.
            let valid = value.fract() == 0.0 && value % divisor == 0.0;
            if !valid {
                fail_multiple_of(evaluation, item, &self.divisor);
            }
        }
        Ok(())
    }
}

struct MultipleOfFloatEvaluator {
    divisor: Number,
}

impl Evaluate for MultipleOfFloatEvaluator {
    fn evaluate<'i>(
        &self,
        evaluation: &mut Evaluation<'i>,
        _: &mut Context<'_>,
    ) -> Result<(), Error> {
        if let Value::Number(item) = evaluation.instance {
            let (Some(value), Some(divisor)) = (item.as_f64(), self.divisor.as_f64()) else {
                return Ok(());
            };
            let remainder = (value / divisor) % 1.0;
            let valid = if remainder.is_nan() {
                // Exact arithmetic for values outside the safe float range.
                let fraction = BigFraction::from(value) / BigFraction::from(divisor);
                fraction
                    .denom()
                    .map_or(true, |denom| denom == &BigUint::from(1_u8))
            } else {
                remainder.abs() < f64::EPSILON
            };
            if !valid {
                fail_multiple_of(evaluation, item, &self.divisor);
            }
        }
        Ok(())
    }
}

fn fail_multiple_of(evaluation: &mut Evaluation<'_>, item: &Number, divisor: &Number) {
    evaluation.fail(
        "multipleOf",
        vec![
            ("received", Value::Number(item.clone())),
            ("divisor", Value::Number(divisor.clone())),
        ],
    );
}

pub(crate) fn multiple_of_constraint(divisor: Number) -> KeywordConstraint {
    let integral = divisor.as_f64().map_or(false, |value| value.fract() == 0.0);
    if integral {
        KeywordConstraint::new("multipleOf", MultipleOfIntegerEvaluator { divisor })
    } else {
        KeywordConstraint::new("multipleOf", MultipleOfFloatEvaluator { divisor })
    }
}

#[derive(Clone, Copy)]
pub(crate) enum NumberBound {
    Maximum,
    ExclusiveMaximum,
    Minimum,
    ExclusiveMinimum,
}

impl NumberBound {
    fn is_within(self, ordering: Ordering) -> bool {
        match self {
            NumberBound::Maximum => ordering != Ordering::Greater,
            NumberBound::ExclusiveMaximum => ordering == Ordering::Less,
            NumberBound::Minimum => ordering != Ordering::Less,
            NumberBound::ExclusiveMinimum => ordering == Ordering::Greater,
        }
    }
}

struct LimitEvaluator {
    keyword: &'static str,
    limit: Number,
    bound: NumberBound,
}

impl Evaluate for LimitEvaluator {
    fn evaluate<'i>(
        &self,
        evaluation: &mut Evaluation<'i>,
        _: &mut Context<'_>,
    ) -> Result<(), Error> {
        if let Value::Number(item) = evaluation.instance {
            let within = helpers::compare(item, &self.limit)
                .map_or(true, |ordering| self.bound.is_within(ordering));
            if !within {
                evaluation.fail(
                    self.keyword,
                    vec![
                        ("received", Value::Number(item.clone())),
                        ("limit", Value::Number(self.limit.clone())),
                    ],
                );
            }
        }
        Ok(())
    }
}

pub(crate) fn limit_constraint(
    keyword: &'static str,
    limit: Number,
    bound: NumberBound,
) -> KeywordConstraint {
    KeywordConstraint::new(
        keyword,
        LimitEvaluator {
            keyword,
            limit,
            bound,
        },
    )
}

struct LengthEvaluator {
    keyword: &'static str,
    limit: u64,
    max: bool,
}

impl Evaluate for LengthEvaluator {
    fn evaluate<'i>(
        &self,
        evaluation: &mut Evaluation<'i>,
        _: &mut Context<'_>,
    ) -> Result<(), Error> {
        if let Value::String(item) = evaluation.instance {
            let length = item.chars().count() as u64;
            let within = if self.max {
                length <= self.limit
            } else {
                length >= self.limit
            };
            if !within {
                evaluation.fail(
                    self.keyword,
                    vec![("received", json!(length)), ("limit", json!(self.limit))],
                );
            }
        }
        Ok(())
    }
}

pub(crate) fn max_length_constraint(limit: u64) -> KeywordConstraint {
    KeywordConstraint::new(
        "maxLength",
        LengthEvaluator {
            keyword: "maxLength",
            limit,
            max: true,
        },
    )
}

pub(crate) fn min_length_constraint(limit: u64) -> KeywordConstraint {
    KeywordConstraint::new(
        "minLength",
        LengthEvaluator {
            keyword: "minLength",
            limit,
            max: false,
        },
    )
}

struct PatternEvaluator {
    pattern: Pattern,
}

impl Evaluate for PatternEvaluator {
    fn evaluate<'i>(
        &self,
        evaluation: &mut Evaluation<'i>,
        _: &mut Context<'_>,
    ) -> Result<(), Error> {
        if let Value::String(item) = evaluation.instance {
            if !self.pattern.is_match(item) {
                evaluation.fail(
                    "pattern",
                    vec![
                        ("received", json!(item)),
                        ("pattern", json!(self.pattern.source())),
                    ],
                );
            }
        }
        Ok(())
    }
}

pub(crate) fn pattern_constraint(pattern: &Pattern) -> KeywordConstraint {
    KeywordConstraint::new(
        "pattern",
        PatternEvaluator {
            pattern: pattern.clone(),
        },
    )
}

struct ItemCountEvaluator {
    keyword: &'static str,
    limit: u64,
    max: bool,
}

impl Evaluate for ItemCountEvaluator {
    fn evaluate<'i>(
        &self,
        evaluation: &mut Evaluation<'i>,
        _: &mut Context<'_>,
    ) -> Result<(), Error> {
        if let Value::Array(items) = evaluation.instance {
            let count = items.len() as u64;
            let within = if self.max {
                count <= self.limit
            } else {
                count >= self.limit
            };
            if !within {
                evaluation.fail(
                    self.keyword,
                    vec![("received", json!(count)), ("limit", json!(self.limit))],
                );
            }
        }
        Ok(())
    }
}

pub(crate) fn max_items_constraint(limit: u64) -> KeywordConstraint {
    KeywordConstraint::new(
        "maxItems",
        ItemCountEvaluator {
            keyword: "maxItems",
            limit,
            max: true,
        },
    )
}

pub(crate) fn min_items_constraint(limit: u64) -> KeywordConstraint {
    KeywordConstraint::new(
        "minItems",
        ItemCountEvaluator {
            keyword: "minItems",
            limit,
            max: false,
        },
    )
}

struct UniqueItemsEvaluator;

impl Evaluate for UniqueItemsEvaluator {
    fn evaluate<'i>(
        &self,
        evaluation: &mut Evaluation<'i>,
        _: &mut Context<'_>,
    ) -> Result<(), Error> {
        if let Value::Array(items) = evaluation.instance {
            for (first, left) in items.iter().enumerate() {
                for (offset, right) in items[first + 1..].iter().enumerate() {
                    if helpers::equal(left, right) {
                        evaluation.fail(
                            "uniqueItems",
                            vec![
                                ("first", json!(first)),
                                ("second", json!(first + 1 + offset)),
                            ],
                        );
                        return Ok(());
                    }
                }
            }
        }
        Ok(())
    }
}

pub(crate) fn unique_items_constraint(unique: bool) -> Option<KeywordConstraint> {
    // `uniqueItems: false` asserts nothing.
    unique.then(|| KeywordConstraint::new("uniqueItems", UniqueItemsEvaluator))
}

struct ContainsLimitEvaluator {
    keyword: &'static str,
    limit: u64,
    max: bool,
}

impl Evaluate for ContainsLimitEvaluator {
    fn evaluate<'i>(
        &self,
        evaluation: &mut Evaluation<'i>,
        _: &mut Context<'_>,
    ) -> Result<(), Error> {
        // The dependency on `contains` guarantees the annotation is present.
        let matched = evaluation
            .annotation("contains")
            .and_then(Value::as_array)
            .map_or(0, Vec::len) as u64;
        let within = if self.max {
            matched <= self.limit
        } else {
            matched >= self.limit
        };
        if !within {
            evaluation.fail(
                self.keyword,
                vec![("received", json!(matched)), ("limit", json!(self.limit))],
            );
        }
        Ok(())
    }
}

pub(crate) fn contains_limit_constraint(keyword: &'static str, limit: u64) -> KeywordConstraint {
    KeywordConstraint::new(
        keyword,
        ContainsLimitEvaluator {
            keyword,
            limit,
            max: keyword == "maxContains",
        },
    )
    .with_dependencies(&["contains"])
}

struct PropertyCountEvaluator {
    keyword: &'static str,
    limit: u64,
    max: bool,
}

impl Evaluate for PropertyCountEvaluator {
    fn evaluate<'i>(
        &self,
        evaluation: &mut Evaluation<'i>,
        _: &mut Context<'_>,
    ) -> Result<(), Error> {
        if let Value::Object(object) = evaluation.instance {
            let count = object.len() as u64;
            let within = if self.max {
                count <= self.limit
            } else {
                count >= self.limit
            };
            if !within {
                evaluation.fail(
                    self.keyword,
                    vec![("received", json!(count)), ("limit", json!(self.limit))],
                );
            }
        }
        Ok(())
    }
}

pub(crate) fn max_properties_constraint(limit: u64) -> KeywordConstraint {
    KeywordConstraint::new(
        "maxProperties",
        PropertyCountEvaluator {
            keyword: "maxProperties",
            limit,
            max: true,
        },
    )
}

pub(crate) fn min_properties_constraint(limit: u64) -> KeywordConstraint {
    KeywordConstraint::new(
        "minProperties",
        PropertyCountEvaluator {
            keyword: "minProperties",
            limit,
            max: false,
        },
    )
}

struct RequiredEvaluator {
    properties: Vec<String>,
}

impl Evaluate for RequiredEvaluator {
    fn evaluate<'i>(
        &self,
        evaluation: &mut Evaluation<'i>,
        _: &mut Context<'_>,
    ) -> Result<(), Error> {
        if let Value::Object(object) = evaluation.instance {
            let missing: Vec<Value> = self
                .properties
                .iter()
                .filter(|property| !object.contains_key(*property))
                .map(|property| json!(property))
                .collect();
            if !missing.is_empty() {
                evaluation.fail("required", vec![("missing", Value::Array(missing))]);
            }
        }
        Ok(())
    }
}

pub(crate) fn required_constraint(properties: Vec<String>) -> KeywordConstraint {
    KeywordConstraint::new("required", RequiredEvaluator { properties })
}

struct DependentRequiredEvaluator {
    dependencies: Vec<(String, Vec<String>)>,
}

impl Evaluate for DependentRequiredEvaluator {
    fn evaluate<'i>(
        &self,
        evaluation: &mut Evaluation<'i>,
        _: &mut Context<'_>,
    ) -> Result<(), Error> {
        if let Value::Object(object) = evaluation.instance {
            for (property, required) in &self.dependencies {
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
                        "dependentRequired",
                        vec![
                            ("property", json!(property)),
                            ("missing", Value::Array(missing)),
                        ],
                    );
                    return Ok(());
                }
            }
        }
        Ok(())
    }
}

pub(crate) fn dependent_required_constraint(
    dependencies: Vec<(String, Vec<String>)>,
) -> KeywordConstraint {
    KeywordConstraint::new(
        "dependentRequired",
        DependentRequiredEvaluator { dependencies },
    )
}
