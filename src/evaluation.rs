//! Execution of constraint graphs against instances.
use std::{borrow::Cow, sync::Arc};

use serde_json::Value;

use crate::{
    compiler::{Context, SchemaConstraint},
    error::Error,
    paths::JsonPointer,
};

/// A compiled keyword within a schema constraint.
pub(crate) struct KeywordConstraint {
    pub(crate) keyword: Cow<'static, str>,
    /// Sibling keywords whose annotations this keyword reads. The keyword is
    /// skipped when a dependency produced no annotation or was skipped.
    pub(crate) dependencies: &'static [&'static str],
    evaluator: Box<dyn Evaluate>,
}

impl KeywordConstraint {
    pub(crate) fn new(
        keyword: impl Into<Cow<'static, str>>,
        evaluator: impl Evaluate + 'static,
    ) -> KeywordConstraint {
        KeywordConstraint {
            keyword: keyword.into(),
            dependencies: &[],
            evaluator: Box::new(evaluator),
        }
    }
    pub(crate) fn with_dependencies(
        mut self,
        dependencies: &'static [&'static str],
    ) -> KeywordConstraint {
        self.dependencies = dependencies;
        self
    }
}

/// A keyword evaluator: reads the local instance and sibling annotations,
/// writes results and annotations into the evaluation.
pub(crate) trait Evaluate: Send + Sync {
    fn evaluate<'i>(
        &self,
        evaluation: &mut Evaluation<'i>,
        ctx: &mut Context<'_>,
    ) -> Result<(), Error>;
}

/// A failed keyword with its named message parameters.
pub(crate) struct Failure {
    pub(crate) keyword: Cow<'static, str>,
    pub(crate) params: Vec<(&'static str, Value)>,
}

pub(crate) struct Child<'i> {
    /// Whether this subschema's validity flows into the parent's; branches
    /// judged by their own keyword (`anyOf`, `not`, `if`, `contains`) do not
    /// contribute directly.
    pub(crate) contributes: bool,
    pub(crate) evaluation: Evaluation<'i>,
}

/// The per-call binding of a schema constraint to an instance location.
pub(crate) struct Evaluation<'i> {
    pub(crate) constraint: Arc<SchemaConstraint>,
    pub(crate) instance: &'i Value,
    pub(crate) evaluation_path: JsonPointer,
    pub(crate) instance_location: JsonPointer,
    annotations: Vec<(Cow<'static, str>, Value)>,
    failures: Vec<Failure>,
    skipped_keywords: Vec<Cow<'static, str>>,
    pub(crate) skipped: bool,
    children: Vec<Child<'i>>,
    valid: bool,
}

impl<'i> Evaluation<'i> {
    fn new(
        constraint: Arc<SchemaConstraint>,
        instance: &'i Value,
        evaluation_path: JsonPointer,
        instance_location: JsonPointer,
    ) -> Evaluation<'i> {
        Evaluation {
            constraint,
            instance,
            evaluation_path,
            instance_location,
            annotations: Vec::new(),
            failures: Vec::new(),
            skipped_keywords: Vec::new(),
            skipped: false,
            children: Vec::new(),
            valid: true,
        }
    }

    pub(crate) fn annotate(&mut self, keyword: impl Into<Cow<'static, str>>, value: Value) {
        self.annotations.push((keyword.into(), value));
    }

    pub(crate) fn annotation(&self, keyword: &str) -> Option<&Value> {
        self.annotations
            .iter()
            .find(|(name, _)| name == keyword)
            .map(|(_, value)| value)
    }

    pub(crate) fn annotations(&self) -> &[(Cow<'static, str>, Value)] {
        &self.annotations
    }

    pub(crate) fn fail(
        &mut self,
        keyword: impl Into<Cow<'static, str>>,
        params: Vec<(&'static str, Value)>,
    ) {
        self.failures.push(Failure {
            keyword: keyword.into(),
            params,
        });
    }

    pub(crate) fn failures(&self) -> &[Failure] {
        &self.failures
    }

    pub(crate) fn mark_skipped(&mut self, keyword: impl Into<Cow<'static, str>>) {
        self.skipped_keywords.push(keyword.into());
    }

    fn dependency_met(&self, dependency: &str) -> bool {
        self.annotation(dependency).is_some()
            && !self
                .skipped_keywords
                .iter()
                .any(|skipped| skipped == dependency)
    }

    pub(crate) fn attach(&mut self, evaluation: Evaluation<'i>, contributes: bool) {
        self.children.push(Child {
            contributes,
            evaluation,
        });
    }

    pub(crate) fn children(&self) -> &[Child<'i>] {
        &self.children
    }

    pub(crate) fn is_valid(&self) -> bool {
        self.valid
    }

    /// Clone the values of the given annotation keywords from this evaluation
    /// and from every valid subschema evaluation applied to the same instance
    /// location. This is how `unevaluated*` keywords see what their siblings
    /// and nested applicators covered.
    pub(crate) fn collect_annotations(&self, keywords: &[&str], out: &mut Vec<Value>) {
        for (name, value) in &self.annotations {
            if keywords.contains(&name.as_ref()) {
                out.push(value.clone());
            }
        }
        for child in &self.children {
            let child = &child.evaluation;
            if child.instance_location == self.instance_location && child.valid {
                child.collect_annotations(keywords, out);
            }
        }
    }

    fn finish(&mut self) {
        self.valid = self.failures.is_empty()
            && self
                .children
                .iter()
                .filter(|child| child.contributes)
                .all(|child| child.evaluation.valid);
    }
}

/// Bind `constraint` to an instance location and execute its keyword
/// constraints in order.
pub(crate) fn evaluate<'i>(
    constraint: &Arc<SchemaConstraint>,
    instance: &'i Value,
    evaluation_path: JsonPointer,
    instance_location: JsonPointer,
    ctx: &mut Context<'_>,
) -> Result<Evaluation<'i>, Error> {
    let mut evaluation = Evaluation::new(
        Arc::clone(constraint),
        instance,
        evaluation_path,
        instance_location,
    );
    match constraint.schema().as_bool() {
        Some(true) => {}
        Some(false) => evaluation.fail("falseSchema", Vec::new()),
        None => {
            let depth = ctx.scope.len();
            let pushed = ctx.scope.push_if_new(&constraint.base_uri);
            let result = run_keywords(&mut evaluation, constraint, ctx);
            if pushed {
                ctx.scope.pop();
            }
            debug_assert_eq!(ctx.scope.len(), depth, "Unbalanced dynamic scope");
            result?;
        }
    }
    evaluation.finish();
    Ok(evaluation)
}

fn run_keywords<'i>(
    evaluation: &mut Evaluation<'i>,
    constraint: &Arc<SchemaConstraint>,
    ctx: &mut Context<'_>,
) -> Result<(), Error> {
    for keyword_constraint in constraint.keyword_constraints() {
        if keyword_constraint
            .dependencies
            .iter()
            .any(|dependency| !evaluation.dependency_met(dependency))
        {
            evaluation.mark_skipped(keyword_constraint.keyword.clone());
            continue;
        }
        keyword_constraint.evaluator.evaluate(evaluation, ctx)?;
    }
    Ok(())
}
