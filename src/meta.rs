//! Built-in meta-schema documents.
//!
//! These are deliberately thin: they carry the canonical identifiers, the
//! anchors that reference resolution relies upon and no validation keywords.
//! Schemas are not validated against their meta-schemas here; the documents
//! exist so that `$schema` chains terminate and `$ref`s to the canonical
//! identifiers resolve.
use once_cell::sync::Lazy;
use serde_json::{json, Value};

use crate::drafts::Draft;

pub(crate) static DRAFT6: Lazy<Value> = Lazy::new(|| {
    json!({
        "$schema": "http://json-schema.org/draft-06/schema#",
        "$id": "http://json-schema.org/draft-06/schema#",
        "title": "Core schema meta-schema"
    })
});

pub(crate) static DRAFT7: Lazy<Value> = Lazy::new(|| {
    json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "$id": "http://json-schema.org/draft-07/schema#",
        "title": "Core schema meta-schema"
    })
});

pub(crate) static DRAFT201909: Lazy<Value> = Lazy::new(|| {
    json!({
        "$schema": "https://json-schema.org/draft/2019-09/schema",
        "$id": "https://json-schema.org/draft/2019-09/schema",
        "$recursiveAnchor": true,
        "title": "Core and Validation specifications meta-schema"
    })
});

pub(crate) static DRAFT202012: Lazy<Value> = Lazy::new(|| {
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "$id": "https://json-schema.org/draft/2020-12/schema",
        "$dynamicAnchor": "meta",
        "title": "Core and Validation specifications meta-schema"
    })
});

pub(crate) static DRAFT_NEXT: Lazy<Value> = Lazy::new(|| {
    json!({
        "$schema": "https://json-schema.org/draft/next/schema",
        "$id": "https://json-schema.org/draft/next/schema",
        "$dynamicAnchor": "meta",
        "title": "Core and Validation specifications meta-schema"
    })
});

/// All built-in meta-schemas, paired with the draft they describe.
pub(crate) fn built_in() -> [(Draft, &'static Value); 5] {
    [
        (Draft::Draft6, &DRAFT6),
        (Draft::Draft7, &DRAFT7),
        (Draft::Draft201909, &DRAFT201909),
        (Draft::Draft202012, &DRAFT202012),
        (Draft::DraftNext, &DRAFT_NEXT),
    ]
}
