//! Assembly of evaluation trees into the supported output shapes, following
//! the JSON Schema 2020-12 output specification.
use serde::ser::SerializeMap;
use serde_json::{Map, Value};

use crate::{
    evaluation::Evaluation, messages, options::EvaluationOptions, paths::JsonPointer, uri,
};

/// The shape of the produced [`Results`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// A single `valid` flag.
    #[default]
    Flag,
    /// A flat list of the output units that carry errors or annotations.
    List,
    /// The full evaluation tree.
    Hierarchical,
}

/// The outcome of evaluating a schema against an instance.
///
/// `Flag` results carry only the validity; `List` results carry a flat
/// `details` list; `Hierarchical` results keep the evaluation tree nested.
#[derive(Debug, Clone)]
pub struct Results {
    valid: bool,
    evaluation_path: Option<JsonPointer>,
    schema_location: Option<String>,
    instance_location: Option<JsonPointer>,
    errors: Option<Map<String, Value>>,
    annotations: Option<Map<String, Value>>,
    details: Option<Vec<Results>>,
}

impl Results {
    /// Whether the instance conforms to the schema.
    #[must_use]
    pub fn valid(&self) -> bool {
        self.valid
    }
    /// The path of keywords leading to this unit, e.g. `/properties/next/$ref`.
    #[must_use]
    pub fn evaluation_path(&self) -> Option<&JsonPointer> {
        self.evaluation_path.as_ref()
    }
    /// The absolute location of the producing schema.
    #[must_use]
    pub fn schema_location(&self) -> Option<&str> {
        self.schema_location.as_deref()
    }
    /// The location within the instance this unit applies to.
    #[must_use]
    pub fn instance_location(&self) -> Option<&JsonPointer> {
        self.instance_location.as_ref()
    }
    /// Rendered error messages keyed by the failed keyword.
    #[must_use]
    pub fn errors(&self) -> Option<&Map<String, Value>> {
        self.errors.as_ref()
    }
    /// Annotations keyed by keyword; only present on valid units.
    #[must_use]
    pub fn annotations(&self) -> Option<&Map<String, Value>> {
        self.annotations.as_ref()
    }
    /// Child output units.
    #[must_use]
    pub fn details(&self) -> &[Results] {
        self.details.as_deref().unwrap_or_default()
    }

    /// Recursively search this tree for a unit with the given evaluation
    /// path.
    #[must_use]
    pub fn find(&self, evaluation_path: &str) -> Option<&Results> {
        if self
            .evaluation_path
            .as_ref()
            .map_or(false, |path| path.to_string() == evaluation_path)
        {
            return Some(self);
        }
        self.details()
            .iter()
            .find_map(|detail| detail.find(evaluation_path))
    }
}

pub(crate) fn assemble(
    evaluation: &Evaluation<'_>,
    options: &EvaluationOptions,
) -> Results {
    match options.output_format() {
        OutputFormat::Flag => Results {
            valid: evaluation.is_valid(),
            evaluation_path: None,
            schema_location: None,
            instance_location: None,
            errors: None,
            annotations: None,
            details: None,
        },
        OutputFormat::Hierarchical => hierarchical(evaluation, options),
        OutputFormat::List => {
            let mut units = Vec::new();
            flatten(evaluation, options, &mut units);
            Results {
                valid: evaluation.is_valid(),
                evaluation_path: None,
                schema_location: None,
                instance_location: None,
                errors: None,
                annotations: None,
                details: Some(units),
            }
        }
    }
}

fn unit(evaluation: &Evaluation<'_>, options: &EvaluationOptions) -> Results {
    let schema = evaluation.constraint.schema();
    let schema_location = uri::with_pointer_fragment(
        &evaluation.constraint.base_uri,
        &schema.location().to_string(),
    );
    let errors = if evaluation.failures().is_empty() {
        None
    } else {
        let culture = options.culture();
        let mut errors = Map::new();
        for failure in evaluation.failures() {
            errors.insert(
                failure.keyword.to_string(),
                Value::String(messages::render(&failure.keyword, culture, &failure.params)),
            );
        }
        Some(errors)
    };
    // Annotations from failed schemas are dropped.
    let annotations = if evaluation.is_valid() && !evaluation.annotations().is_empty() {
        let mut annotations = Map::new();
        for (keyword, value) in evaluation.annotations() {
            annotations.insert(keyword.to_string(), value.clone());
        }
        Some(annotations)
    } else {
        None
    };
    Results {
        valid: evaluation.is_valid(),
        evaluation_path: Some(evaluation.evaluation_path.clone()),
        schema_location: Some(schema_location.as_str().to_string()),
        instance_location: Some(evaluation.instance_location.clone()),
        errors,
        annotations,
        details: None,
    }
}

fn hierarchical(evaluation: &Evaluation<'_>, options: &EvaluationOptions) -> Results {
    let mut node = unit(evaluation, options);
    let details: Vec<Results> = evaluation
        .children()
        .iter()
        .filter(|child| !child.evaluation.skipped)
        .map(|child| hierarchical(&child.evaluation, options))
        .collect();
    if !details.is_empty() {
        node.details = Some(details);
    }
    node
}

/// Depth-first flattening that keeps only units carrying errors or
/// annotations.
fn flatten(evaluation: &Evaluation<'_>, options: &EvaluationOptions, out: &mut Vec<Results>) {
    if evaluation.skipped {
        return;
    }
    let node = unit(evaluation, options);
    if node.errors.is_some() || node.annotations.is_some() {
        out.push(node);
    }
    for child in evaluation.children() {
        flatten(&child.evaluation, options, out);
    }
}

impl serde::Serialize for Results {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("valid", &self.valid)?;
        if let Some(evaluation_path) = &self.evaluation_path {
            map.serialize_entry("evaluationPath", evaluation_path)?;
        }
        if let Some(schema_location) = &self.schema_location {
            map.serialize_entry("schemaLocation", schema_location)?;
        }
        if let Some(instance_location) = &self.instance_location {
            map.serialize_entry("instanceLocation", instance_location)?;
        }
        if let Some(errors) = &self.errors {
            map.serialize_entry("errors", errors)?;
        }
        if let Some(annotations) = &self.annotations {
            map.serialize_entry("annotations", annotations)?;
        }
        if let Some(details) = &self.details {
            map.serialize_entry("details", details)?;
        }
        map.end()
    }
}
