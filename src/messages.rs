//! Localizable error-message templates.
//!
//! Messages are looked up by `(keyword, culture)` with a fallback to the
//! neutral culture. Templates may contain `[[name]]` tokens which are
//! substituted with the named parameters recorded by the failing keyword.
use ahash::AHashMap;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use serde_json::Value;

/// The neutral culture identifier.
const NEUTRAL: &str = "";

type CultureTable = AHashMap<String, AHashMap<String, String>>;

static MESSAGES: Lazy<RwLock<CultureTable>> = Lazy::new(|| {
    let mut neutral = AHashMap::with_capacity(32);
    for (keyword, template) in DEFAULT_MESSAGES {
        neutral.insert((*keyword).to_string(), (*template).to_string());
    }
    let mut table = CultureTable::new();
    table.insert(NEUTRAL.to_string(), neutral);
    RwLock::new(table)
});

const DEFAULT_MESSAGES: &[(&str, &str)] = &[
    ("falseSchema", "All values fail against the false schema"),
    ("type", "Value is [[received]] but should be [[expected]]"),
    ("enum", "Value should match one of the values specified by the enum"),
    ("const", "Value should be [[value]]"),
    ("minimum", "[[received]] should be at least [[limit]]"),
    ("maximum", "[[received]] should be at most [[limit]]"),
    ("exclusiveMinimum", "[[received]] should be greater than [[limit]]"),
    ("exclusiveMaximum", "[[received]] should be less than [[limit]]"),
    ("multipleOf", "[[received]] is not a multiple of [[divisor]]"),
    (
        "minLength",
        "Value is [[received]] characters long but should be at least [[limit]]",
    ),
    (
        "maxLength",
        "Value is [[received]] characters long but should be at most [[limit]]",
    ),
    (
        "pattern",
        "The string value is not a match for the indicated regular expression",
    ),
    (
        "minItems",
        "Value has [[received]] items but should have at least [[limit]]",
    ),
    (
        "maxItems",
        "Value has [[received]] items but should have at most [[limit]]",
    ),
    ("uniqueItems", "Value has duplicate items at [[first]] and [[second]]"),
    (
        "minProperties",
        "Value has [[received]] properties but should have at least [[limit]]",
    ),
    (
        "maxProperties",
        "Value has [[received]] properties but should have at most [[limit]]",
    ),
    ("required", "Required properties [[missing]] are not present"),
    (
        "dependentRequired",
        "Properties [[missing]] are required when '[[property]]' is present",
    ),
    (
        "dependencies",
        "Properties [[missing]] are required when '[[property]]' is present",
    ),
    (
        "contains",
        "Value has [[received]] matching items but should have at least [[limit]]",
    ),
    (
        "minContains",
        "Value has [[received]] matching items but should have at least [[limit]]",
    ),
    (
        "maxContains",
        "Value has [[received]] matching items but should have at most [[limit]]",
    ),
    ("anyOf", "Value does not match any of the schemas"),
    (
        "oneOf",
        "Value matches [[count]] schemas but exactly one is required",
    ),
    ("not", "Value matches the schema when it should not"),
    (
        "propertyNames",
        "Property names [[properties]] do not match the schema",
    ),
];

/// Override (or provide) the message template for a keyword.
///
/// Passing `None` as `culture` sets the neutral template, which is used when
/// no culture-specific one exists.
pub fn set_message(keyword: &str, culture: Option<&str>, template: &str) {
    MESSAGES
        .write()
        .entry(culture.unwrap_or(NEUTRAL).to_string())
        .or_default()
        .insert(keyword.to_string(), template.to_string());
}

/// Render the message for a failed keyword, substituting `[[name]]` tokens
/// from the recorded parameters.
pub(crate) fn render(
    keyword: &str,
    culture: Option<&str>,
    params: &[(&'static str, Value)],
) -> String {
    let table = MESSAGES.read();
    let template = culture
        .and_then(|culture| table.get(culture))
        .and_then(|messages| messages.get(keyword))
        .or_else(|| {
            table
                .get(NEUTRAL)
                .and_then(|messages| messages.get(keyword))
        });
    match template {
        Some(template) => substitute(template, params),
        None => format!("Value fails against the '{keyword}' keyword"),
    }
}

fn substitute(template: &str, params: &[(&'static str, Value)]) -> String {
    let mut output = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("[[") {
        output.push_str(&rest[..start]);
        let tail = &rest[start + 2..];
        if let Some(end) = tail.find("]]") {
            let name = &tail[..end];
            match params.iter().find(|(key, _)| *key == name) {
                Some((_, value)) => output.push_str(&display(value)),
                None => {
                    output.push_str("[[");
                    output.push_str(name);
                    output.push_str("]]");
                }
            }
            rest = &tail[end + 2..];
        } else {
            output.push_str(&rest[start..]);
            rest = "";
        }
    }
    output.push_str(rest);
    output
}

fn display(value: &Value) -> String {
    match value {
        Value::String(value) => value.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::{render, set_message, substitute};
    use serde_json::json;

    #[test]
    fn substitution() {
        let params = [("received", json!(1)), ("limit", json!(2))];
        assert_eq!(
            substitute("Value has [[received]] items but should have at least [[limit]]", &params),
            "Value has 1 items but should have at least 2"
        );
        assert_eq!(substitute("[[missing]] stays", &[]), "[[missing]] stays");
    }

    #[test]
    fn culture_fallback() {
        set_message("minItems", Some("x-test"), "zu wenige ([[received]] < [[limit]])");
        let params = [("received", json!(0)), ("limit", json!(3))];
        assert_eq!(
            render("minItems", Some("x-test"), &params),
            "zu wenige (0 < 3)"
        );
        assert_eq!(
            render("minItems", Some("x-other"), &params),
            "Value has 0 items but should have at least 3"
        );
    }

    #[test]
    fn unknown_keyword_gets_generic_message() {
        assert_eq!(
            render("x-mine", None, &[]),
            "Value fails against the 'x-mine' keyword"
        );
    }
}
