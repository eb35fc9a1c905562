//! Thin helpers over `fluent-uri` for base-identifier bookkeeping.
use std::sync::atomic::{AtomicU64, Ordering};

use fluent_uri::{Uri, UriRef};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

use crate::error::Error;

/// Scheme used for synthetic base identifiers of schemas that do not declare
/// an `$id`.
pub(crate) const SYNTHETIC_SCHEME: &str = "json-schema";

static NEXT_SYNTHETIC: AtomicU64 = AtomicU64::new(0);

/// A unique placeholder base identifier, assigned at schema creation and
/// overwritten by the initializer for resource roots.
pub(crate) fn synthetic_base() -> Uri<String> {
    let id = NEXT_SYNTHETIC.fetch_add(1, Ordering::Relaxed);
    let mut buffer = itoa::Buffer::new();
    Uri::parse(format!("{SYNTHETIC_SCHEME}:///{}", buffer.format(id)))
        .expect("Synthetic URIs are always valid")
}

pub(crate) fn is_synthetic(uri: &Uri<String>) -> bool {
    uri.scheme().as_str() == SYNTHETIC_SCHEME
}

/// Parse a URI reference, resolving scheme-less input against the synthetic
/// root so the result is always absolute.
pub(crate) fn from_str(uri: &str) -> Result<Uri<String>, Error> {
    let uriref = UriRef::parse(uri.to_string())?.normalize();
    if uriref.has_scheme() {
        Ok(Uri::try_from(uriref.as_str())?.into())
    } else {
        let root = Uri::parse(format!("{SYNTHETIC_SCHEME}:///")).expect("Valid URI");
        Ok(uriref.resolve_against(&root.borrow())?)
    }
}

/// Resolve `reference` against `base` and return the normalized target URI.
pub(crate) fn resolve_against(base: &Uri<&str>, reference: &str) -> Result<Uri<String>, Error> {
    Ok(UriRef::parse(reference)?
        .resolve_against(base)?
        .normalize())
}

/// Split a reference into its location part and an optional fragment.
pub(crate) fn split_fragment(reference: &str) -> (&str, Option<&str>) {
    match reference.split_once('#') {
        Some((location, fragment)) => (location, Some(fragment)),
        None => (reference, None),
    }
}

/// Return `uri` with its fragment (if any) removed.
pub(crate) fn without_fragment(uri: &str) -> &str {
    split_fragment(uri).0
}

// RFC 3986 `fragment` characters that must be percent-encoded.
const FRAGMENT_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'#')
    .add(b'%')
    .add(b'{')
    .add(b'}')
    .add(b'^')
    .add(b'|')
    .add(b'\\')
    .add(b'[')
    .add(b']');

/// Attach a JSON Pointer fragment to an absolute URI.
pub(crate) fn with_pointer_fragment(base: &Uri<String>, pointer: &str) -> Uri<String> {
    let encoded = utf8_percent_encode(pointer, FRAGMENT_SET);
    Uri::parse(format!("{}#{encoded}", without_fragment(base.as_str())))
        .expect("Pointer fragments are always valid after encoding")
}
