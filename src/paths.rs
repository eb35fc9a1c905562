//! Locations within schemas and evaluated instances.
use std::{fmt, fmt::Write, slice::Iter};

use crate::error::Error;

/// A key within a JSON object, an index within a JSON array or a schema
/// keyword. A sequence of chunks is a valid JSON Pointer.
///
/// Indexes are kept as numbers to avoid string conversion during evaluation.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum PathChunk {
    /// Property name within a JSON object.
    Property(Box<str>),
    /// Index within a JSON array.
    Index(usize),
    /// JSON Schema keyword.
    Keyword(&'static str),
}

/// JSON Pointer as a wrapper around individual path components.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct JsonPointer(Vec<PathChunk>);

impl JsonPointer {
    /// Return a new pointer with `chunk` appended.
    #[must_use]
    pub(crate) fn join(&self, chunk: impl Into<PathChunk>) -> Self {
        let mut new = self.clone();
        new.0.push(chunk.into());
        new
    }
    pub(crate) fn push(&mut self, chunk: impl Into<PathChunk>) {
        self.0.push(chunk.into());
    }
    /// Iterate over the underlying path components.
    pub fn iter(&self) -> Iter<'_, PathChunk> {
        self.0.iter()
    }
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
    /// The last pointer chunk.
    #[must_use]
    pub fn last(&self) -> Option<&PathChunk> {
        self.0.last()
    }
}

impl fmt::Display for JsonPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for chunk in &self.0 {
            f.write_char('/')?;
            match chunk {
                PathChunk::Property(value) => write_escaped(f, value)?,
                PathChunk::Index(idx) => f.write_str(itoa::Buffer::new().format(*idx))?,
                PathChunk::Keyword(keyword) => f.write_str(keyword)?,
            }
        }
        Ok(())
    }
}

fn write_escaped(f: &mut fmt::Formatter<'_>, value: &str) -> fmt::Result {
    for ch in value.chars() {
        match ch {
            '/' => f.write_str("~1")?,
            '~' => f.write_str("~0")?,
            _ => f.write_char(ch)?,
        }
    }
    Ok(())
}

impl serde::Serialize for JsonPointer {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl From<String> for PathChunk {
    #[inline]
    fn from(value: String) -> Self {
        PathChunk::Property(value.into_boxed_str())
    }
}

impl From<&'static str> for PathChunk {
    #[inline]
    fn from(value: &'static str) -> Self {
        PathChunk::Keyword(value)
    }
}

impl From<usize> for PathChunk {
    #[inline]
    fn from(value: usize) -> Self {
        PathChunk::Index(value)
    }
}

/// Decode the segments of a JSON Pointer fragment (`/a/b~1c`), reversing both
/// percent- and tilde-escaping.
///
/// The input must either be empty or start with `/`.
pub(crate) fn decode_pointer(fragment: &str) -> Result<Vec<String>, Error> {
    if fragment.is_empty() {
        return Ok(Vec::new());
    }
    let Some(rest) = fragment.strip_prefix('/') else {
        return Err(Error::parse(format!(
            "Invalid JSON Pointer fragment: '{fragment}'"
        )));
    };
    let decoded = percent_encoding::percent_decode_str(rest)
        .decode_utf8()
        .map_err(|_| Error::parse(format!("Invalid percent encoding in '{fragment}'")))?;
    Ok(decoded
        .split('/')
        .map(|segment| segment.replace("~1", "/").replace("~0", "~"))
        .collect())
}
