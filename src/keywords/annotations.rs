//! Annotation-only keywords.
//!
//! Metadata keywords never fail; they record their value as an annotation at
//! the current location. `format` and the `content*` keywords are collected
//! the same way since assertion-mode format checking and content decoding are
//! provided by plugins, not by the engine.
use std::{borrow::Cow, sync::Arc};

use serde_json::Value;

use crate::{
    compiler::Context,
    error::Error,
    evaluation::{Evaluate, Evaluation, KeywordConstraint},
    schema::Schema,
};

struct AnnotationEvaluator {
    keyword: Cow<'static, str>,
    value: Value,
}

impl Evaluate for AnnotationEvaluator {
    fn evaluate<'i>(
        &self,
        evaluation: &mut Evaluation<'i>,
        _: &mut Context<'_>,
    ) -> Result<(), Error> {
        evaluation.annotate(self.keyword.clone(), self.value.clone());
        Ok(())
    }
}

pub(crate) fn constraint(keyword: &'static str, value: String) -> KeywordConstraint {
    value_constraint(keyword, Value::String(value))
}

pub(crate) fn value_constraint(keyword: &'static str, value: Value) -> KeywordConstraint {
    KeywordConstraint::new(
        keyword,
        AnnotationEvaluator {
            keyword: Cow::Borrowed(keyword),
            value,
        },
    )
}

pub(crate) fn compile_content_schema(
    child: &Arc<Schema>,
    _: &mut Context<'_>,
) -> Result<Option<KeywordConstraint>, Error> {
    Ok(Some(KeywordConstraint::new(
        "contentSchema",
        AnnotationEvaluator {
            keyword: Cow::Borrowed("contentSchema"),
            value: child.to_value(),
        },
    )))
}

/// Unrecognized keywords are carried through as annotations when the caller
/// opted in; the decision is made per evaluation, not at compile time, since
/// compiled constraints are shared across calls.
struct UnrecognizedEvaluator {
    keyword: String,
    value: Value,
}

impl Evaluate for UnrecognizedEvaluator {
    fn evaluate<'i>(
        &self,
        evaluation: &mut Evaluation<'i>,
        ctx: &mut Context<'_>,
    ) -> Result<(), Error> {
        if ctx.options.process_custom_keywords() {
            evaluation.annotate(self.keyword.clone(), self.value.clone());
        }
        Ok(())
    }
}

pub(crate) fn unrecognized_constraint(keyword: String, value: Value) -> KeywordConstraint {
    KeywordConstraint::new(
        keyword.clone(),
        UnrecognizedEvaluator { keyword, value },
    )
}
