//! Shared parsing and comparison helpers for keyword implementations.
use core::fmt;
use std::{cmp::Ordering, sync::Arc};

use num_cmp::NumCmp;
use serde_json::{Map, Number, Value};

use crate::{error::Error, schema::Schema};

/// A compiled regular expression that remembers its source for round-tripping.
#[derive(Debug, Clone)]
pub(crate) struct Pattern {
    source: String,
    regex: fancy_regex::Regex,
}

impl Pattern {
    pub(crate) fn compile(keyword: &str, source: &str) -> Result<Pattern, Error> {
        let regex = fancy_regex::Regex::new(source)
            .map_err(|error| Error::keyword_parse(keyword, error.to_string()))?;
        Ok(Pattern {
            source: source.to_string(),
            regex,
        })
    }
    pub(crate) fn source(&self) -> &str {
        &self.source
    }
    /// Fallible matches are treated as "no match", e.g. backtracking limits.
    pub(crate) fn is_match(&self, value: &str) -> bool {
        self.regex.is_match(value).unwrap_or(false)
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Compare two JSON numbers across integer and float representations.
pub(crate) fn compare(left: &Number, right: &Number) -> Option<Ordering> {
    if let (Some(left), Some(right)) = (left.as_u64(), right.as_u64()) {
        return Some(left.cmp(&right));
    }
    if let (Some(left), Some(right)) = (left.as_i64(), right.as_i64()) {
        return Some(left.cmp(&right));
    }
    let num_cmp = if let Some(left) = left.as_u64() {
        NumCmp::num_cmp(left, right.as_f64()?)
    } else if let Some(left) = left.as_i64() {
        NumCmp::num_cmp(left, right.as_f64()?)
    } else if let Some(right) = right.as_u64() {
        NumCmp::num_cmp(left.as_f64()?, right)
    } else if let Some(right) = right.as_i64() {
        NumCmp::num_cmp(left.as_f64()?, right)
    } else {
        left.as_f64()?.partial_cmp(&right.as_f64()?)
    };
    num_cmp
}

/// Structural equality with numeric equivalence, so `1` equals `1.0`.
pub(crate) fn equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(left), Value::Number(right)) => {
            compare(left, right) == Some(Ordering::Equal)
        }
        (Value::Array(left), Value::Array(right)) => {
            left.len() == right.len()
                && left.iter().zip(right.iter()).all(|(l, r)| equal(l, r))
        }
        (Value::Object(left), Value::Object(right)) => {
            left.len() == right.len()
                && left
                    .iter()
                    .all(|(key, l)| right.get(key).map_or(false, |r| equal(l, r)))
        }
        (left, right) => left == right,
    }
}

/// Parse a keyword value as a non-negative integer limit; integer-valued
/// floats are accepted.
pub(crate) fn expect_limit(keyword: &str, value: &Value) -> Result<u64, Error> {
    if let Some(limit) = value.as_u64() {
        return Ok(limit);
    }
    if let Some(limit) = value.as_f64() {
        if limit.trunc() == limit && limit >= 0.0 {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            return Ok(limit as u64);
        }
    }
    Err(Error::keyword_parse(
        keyword,
        "expected a non-negative integer",
    ))
}

pub(crate) fn expect_number(keyword: &str, value: &Value) -> Result<Number, Error> {
    match value {
        Value::Number(number) => Ok(number.clone()),
        _ => Err(Error::keyword_parse(keyword, "expected a number")),
    }
}

pub(crate) fn expect_string(keyword: &str, value: &Value) -> Result<String, Error> {
    match value {
        Value::String(value) => Ok(value.clone()),
        _ => Err(Error::keyword_parse(keyword, "expected a string")),
    }
}

pub(crate) fn expect_bool(keyword: &str, value: &Value) -> Result<bool, Error> {
    match value {
        Value::Bool(value) => Ok(*value),
        _ => Err(Error::keyword_parse(keyword, "expected a boolean")),
    }
}

pub(crate) fn expect_array<'v>(keyword: &str, value: &'v Value) -> Result<&'v Vec<Value>, Error> {
    match value {
        Value::Array(items) => Ok(items),
        _ => Err(Error::keyword_parse(keyword, "expected an array")),
    }
}

pub(crate) fn expect_object<'v>(
    keyword: &str,
    value: &'v Value,
) -> Result<&'v Map<String, Value>, Error> {
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(Error::keyword_parse(keyword, "expected an object")),
    }
}

pub(crate) fn expect_string_array(keyword: &str, value: &Value) -> Result<Vec<String>, Error> {
    expect_array(keyword, value)?
        .iter()
        .map(|item| expect_string(keyword, item))
        .collect()
}

/// Parse a subschema-valued keyword argument.
pub(crate) fn expect_schema(keyword: &str, value: &Value) -> Result<Arc<Schema>, Error> {
    match value {
        Value::Bool(_) | Value::Object(_) => Schema::parse(value),
        _ => Err(Error::keyword_parse(
            keyword,
            "expected a schema (boolean or object)",
        )),
    }
}

pub(crate) fn expect_schema_list(keyword: &str, value: &Value) -> Result<Vec<Arc<Schema>>, Error> {
    let items = expect_array(keyword, value)?;
    if items.is_empty() {
        return Err(Error::keyword_parse(keyword, "expected a non-empty array"));
    }
    items
        .iter()
        .map(|item| expect_schema(keyword, item))
        .collect()
}

pub(crate) fn expect_schema_map(
    keyword: &str,
    value: &Value,
) -> Result<Vec<(String, Arc<Schema>)>, Error> {
    expect_object(keyword, value)?
        .iter()
        .map(|(name, item)| Ok((name.clone(), expect_schema(keyword, item)?)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{compare, equal, expect_limit};
    use serde_json::json;
    use std::cmp::Ordering;
    use test_case::test_case;

    #[test_case(&json!(1), &json!(1.0), true)]
    #[test_case(&json!([1, 2]), &json!([1.0, 2.0]), true)]
    #[test_case(&json!({"a": 1}), &json!({"a": 1.0}), true)]
    #[test_case(&json!({"a": 1}), &json!({"a": 1, "b": 2}), false)]
    #[test_case(&json!("1"), &json!(1), false)]
    fn numeric_equivalence(left: &serde_json::Value, right: &serde_json::Value, expected: bool) {
        assert_eq!(equal(left, right), expected);
    }

    #[test]
    fn cross_type_comparison() {
        let left = json!(5);
        let right = json!(5.5);
        assert_eq!(
            compare(left.as_number().unwrap(), right.as_number().unwrap()),
            Some(Ordering::Less)
        );
    }

    #[test]
    fn limits() {
        assert_eq!(expect_limit("minItems", &json!(2)).unwrap(), 2);
        assert_eq!(expect_limit("minItems", &json!(2.0)).unwrap(), 2);
        assert!(expect_limit("minItems", &json!(2.5)).is_err());
        assert!(expect_limit("minItems", &json!(-1)).is_err());
    }
}
