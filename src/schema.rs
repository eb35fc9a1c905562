//! The parsed schema document.
//!
//! A [`Schema`] is either a boolean or an insertion-ordered keyword list. Its
//! identification metadata (base URI, anchors, declared draft) is written by
//! the initializer and read-only afterwards; the constraint cache is the only
//! other interior-mutable state, so initialized schemas can be evaluated from
//! multiple threads.
use std::{
    fmt,
    sync::{Arc, Weak},
};

use ahash::AHashMap;
use fluent_uri::Uri;
use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use serde_json::{Map, Value};

use crate::{
    compiler::ConstraintCache,
    drafts::Draft,
    error::Error,
    keywords::Keyword,
    paths::{decode_pointer, JsonPointer},
    uri,
};

pub(crate) struct Schema {
    kind: SchemaKind,
    meta: RwLock<Metadata>,
    pub(crate) cache: ConstraintCache,
    dynamic: OnceCell<bool>,
}

enum SchemaKind {
    Boolean(bool),
    Keywords(Vec<Keyword>),
}

struct Metadata {
    base_uri: Uri<String>,
    /// JSON Pointer of this schema within its resource root.
    location: JsonPointer,
    is_resource_root: bool,
    draft: Option<Draft>,
    /// Anchors declared within this resource; populated on resource roots.
    anchors: AHashMap<String, AnchorEntry>,
    recursive_anchor: Option<Weak<Schema>>,
}

struct AnchorEntry {
    schema: Weak<Schema>,
    dynamic: bool,
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            SchemaKind::Boolean(value) => f.debug_tuple("Schema").field(value).finish(),
            SchemaKind::Keywords(keywords) => f
                .debug_map()
                .entries(keywords.iter().map(|keyword| (keyword.name(), keyword.to_value())))
                .finish(),
        }
    }
}

impl Schema {
    fn new(kind: SchemaKind) -> Arc<Schema> {
        Arc::new(Schema {
            kind,
            meta: RwLock::new(Metadata {
                base_uri: uri::synthetic_base(),
                location: JsonPointer::default(),
                is_resource_root: false,
                draft: None,
                anchors: AHashMap::new(),
                recursive_anchor: None,
            }),
            cache: ConstraintCache::new(),
            dynamic: OnceCell::new(),
        })
    }

    /// Parse a JSON value into a schema tree.
    pub(crate) fn parse(value: &Value) -> Result<Arc<Schema>, Error> {
        match value {
            Value::Bool(value) => Ok(Schema::new(SchemaKind::Boolean(*value))),
            Value::Object(map) => {
                let mut keywords = Vec::with_capacity(map.len());
                for (name, value) in map {
                    keywords.push(Keyword::parse(name, value)?);
                }
                Ok(Schema::new(SchemaKind::Keywords(keywords)))
            }
            _ => Err(Error::parse("A schema must be a boolean or an object")),
        }
    }

    /// Serialize back to JSON, preserving keyword order and unrecognized
    /// keywords.
    pub(crate) fn to_value(&self) -> Value {
        match &self.kind {
            SchemaKind::Boolean(value) => Value::Bool(*value),
            SchemaKind::Keywords(keywords) => {
                let mut map = Map::with_capacity(keywords.len());
                for keyword in keywords {
                    map.insert(keyword.name().to_string(), keyword.to_value());
                }
                Value::Object(map)
            }
        }
    }

    pub(crate) fn as_bool(&self) -> Option<bool> {
        match &self.kind {
            SchemaKind::Boolean(value) => Some(*value),
            SchemaKind::Keywords(_) => None,
        }
    }

    pub(crate) fn keywords(&self) -> &[Keyword] {
        match &self.kind {
            SchemaKind::Boolean(_) => &[],
            SchemaKind::Keywords(keywords) => keywords,
        }
    }

    pub(crate) fn get(&self, name: &str) -> Option<&Keyword> {
        self.keywords()
            .iter()
            .find(|keyword| keyword.name() == name)
    }

    pub(crate) fn base_uri(&self) -> Uri<String> {
        self.meta.read().base_uri.clone()
    }

    pub(crate) fn set_base_uri(&self, base_uri: Uri<String>) {
        self.meta.write().base_uri = base_uri;
    }

    pub(crate) fn location(&self) -> JsonPointer {
        self.meta.read().location.clone()
    }

    pub(crate) fn set_location(&self, location: JsonPointer) {
        self.meta.write().location = location;
    }

    pub(crate) fn is_resource_root(&self) -> bool {
        self.meta.read().is_resource_root
    }

    pub(crate) fn mark_resource_root(&self) {
        self.meta.write().is_resource_root = true;
    }

    /// The draft this schema is evaluated under; assigned by the initializer.
    pub(crate) fn draft(&self) -> Draft {
        self.meta.read().draft.unwrap_or_default()
    }

    pub(crate) fn set_draft(&self, draft: Draft) {
        self.meta.write().draft = Some(draft);
    }

    pub(crate) fn add_anchor(&self, name: String, target: &Arc<Schema>, dynamic: bool) {
        self.meta.write().anchors.insert(
            name,
            AnchorEntry {
                schema: Arc::downgrade(target),
                dynamic,
            },
        );
    }

    /// Look up an anchor declared within this resource.
    pub(crate) fn anchor(&self, name: &str) -> Option<(Arc<Schema>, bool)> {
        let meta = self.meta.read();
        let entry = meta.anchors.get(name)?;
        entry.schema.upgrade().map(|schema| (schema, entry.dynamic))
    }

    pub(crate) fn set_recursive_anchor(&self, target: &Arc<Schema>) {
        self.meta.write().recursive_anchor = Some(Arc::downgrade(target));
    }

    pub(crate) fn recursive_anchor(&self) -> Option<Arc<Schema>> {
        self.meta
            .read()
            .recursive_anchor
            .as_ref()
            .and_then(Weak::upgrade)
    }

    /// Whether this schema transitively contains a `$dynamicRef` or
    /// `$recursiveRef` through its owned subschemas. Dynamic schemas need
    /// scope-keyed constraint caching.
    pub(crate) fn is_dynamic(&self) -> bool {
        *self.dynamic.get_or_init(|| {
            self.keywords().iter().any(|keyword| {
                matches!(keyword, Keyword::DynamicRef(_) | Keyword::RecursiveRef)
                    || keyword
                        .subschemas()
                        .iter()
                        .any(|(_, subschema)| subschema.is_dynamic())
            })
        })
    }

    /// Resolve a JSON Pointer fragment to a subschema by walking the keyword
    /// structure.
    pub(crate) fn resolve_pointer(self: &Arc<Self>, fragment: &str) -> Option<Arc<Schema>> {
        let segments = decode_pointer(fragment).ok()?;
        let mut current = Arc::clone(self);
        let mut index = 0;
        while index < segments.len() {
            let (child, consumed) = {
                let keyword = current.get(&segments[index])?;
                let (child, consumed) = keyword.find_subschema(&segments[index + 1..])?;
                (Arc::clone(child), consumed)
            };
            current = child;
            index += 1 + consumed;
        }
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::Schema;
    use serde_json::json;

    #[test]
    fn keyword_order_is_preserved() {
        let value = json!({"zeta": 1, "type": "string", "alpha": {"y": 1}});
        let schema = Schema::parse(&value).unwrap();
        let names: Vec<_> = schema
            .keywords()
            .iter()
            .map(|keyword| keyword.name().to_string())
            .collect();
        assert_eq!(names, ["zeta", "type", "alpha"]);
        assert_eq!(schema.to_value(), value);
    }

    #[test]
    fn pointer_resolution() {
        let schema = Schema::parse(&json!({
            "properties": {
                "a": {"items": [{"type": "string"}, {"type": "integer"}]}
            },
            "not": {"$defs": {"x": {"const": 1}}}
        }))
        .unwrap();
        let target = schema.resolve_pointer("/properties/a/items/1").unwrap();
        assert_eq!(target.to_value(), json!({"type": "integer"}));
        let target = schema.resolve_pointer("/not/$defs/x").unwrap();
        assert_eq!(target.to_value(), json!({"const": 1}));
        assert!(schema.resolve_pointer("/properties/missing").is_none());
    }

    #[test]
    fn dynamism_detection() {
        let stat = Schema::parse(&json!({"properties": {"a": {"$ref": "#"}}})).unwrap();
        assert!(!stat.is_dynamic());
        let dynamic =
            Schema::parse(&json!({"items": {"properties": {"a": {"$dynamicRef": "#node"}}}}))
                .unwrap();
        assert!(dynamic.is_dynamic());
    }
}
