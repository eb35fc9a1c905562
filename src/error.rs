//! Structured errors surfaced by schema parsing, initialization and evaluation.
//!
//! A negative evaluation outcome is *not* an error: it is reported as
//! [`crate::Results`] with `valid == false`. The variants here abort the call
//! that produced them.
use core::fmt;

use fluent_uri::error::{ParseError, ResolveError};

use crate::{drafts::Draft, paths::JsonPointer};

/// Errors that can occur while parsing, initializing or evaluating a schema.
#[derive(Debug)]
pub enum Error {
    /// Schema JSON is malformed, or a keyword value does not satisfy the
    /// type and range constraints of its keyword.
    Parse {
        keyword: Option<Box<str>>,
        message: String,
    },
    /// A schema uses a construct that is incompatible with the draft it is
    /// evaluated under.
    UnsupportedSchema { keyword: Box<str>, draft: Draft },
    /// A `$ref`, `$dynamicRef` or `$recursiveRef` target cannot be located in
    /// the registry or via the configured resolver.
    UnresolvedReference {
        reference: String,
        evaluation_path: JsonPointer,
    },
    /// A custom meta-schema chain does not terminate at a supported draft
    /// identifier.
    UnresolvableMetaSchema { uri: String },
    /// Two distinct schemas attempted to register the same absolute identifier.
    DuplicateRegistration { uri: String },
    /// An error occurred while parsing or resolving a URI.
    InvalidUri(UriError),
}

impl Error {
    pub(crate) fn parse(message: impl Into<String>) -> Error {
        Error::Parse {
            keyword: None,
            message: message.into(),
        }
    }
    pub(crate) fn keyword_parse(keyword: &str, message: impl Into<String>) -> Error {
        Error::Parse {
            keyword: Some(keyword.into()),
            message: message.into(),
        }
    }
    pub(crate) fn unsupported(keyword: &str, draft: Draft) -> Error {
        Error::UnsupportedSchema {
            keyword: keyword.into(),
            draft,
        }
    }
    pub(crate) fn unresolved_reference(
        reference: impl Into<String>,
        evaluation_path: JsonPointer,
    ) -> Error {
        Error::UnresolvedReference {
            reference: reference.into(),
            evaluation_path,
        }
    }
    pub(crate) fn unresolvable_meta_schema(uri: impl Into<String>) -> Error {
        Error::UnresolvableMetaSchema { uri: uri.into() }
    }
    pub(crate) fn duplicate_registration(uri: impl Into<String>) -> Error {
        Error::DuplicateRegistration { uri: uri.into() }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Parse { keyword, message } => {
                if let Some(keyword) = keyword {
                    f.write_fmt(format_args!("Invalid '{keyword}' value: {message}"))
                } else {
                    f.write_str(message)
                }
            }
            Error::UnsupportedSchema { keyword, draft } => f.write_fmt(format_args!(
                "Keyword '{keyword}' is not supported under {draft}"
            )),
            Error::UnresolvedReference {
                reference,
                evaluation_path,
            } => f.write_fmt(format_args!(
                "Reference '{reference}' at '{evaluation_path}' cannot be resolved"
            )),
            Error::UnresolvableMetaSchema { uri } => f.write_fmt(format_args!(
                "Meta-schema chain starting at '{uri}' does not terminate at a supported draft"
            )),
            Error::DuplicateRegistration { uri } => f.write_fmt(format_args!(
                "A different schema is already registered under '{uri}'"
            )),
            Error::InvalidUri(error) => f.write_fmt(format_args!("Invalid URI: {error}")),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::InvalidUri(error) => Some(error),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Error::parse(error.to_string())
    }
}

/// URI parsing and resolution failures.
#[derive(Debug)]
pub enum UriError {
    Parse(ParseError),
    Resolve(ResolveError),
}

impl fmt::Display for UriError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UriError::Parse(err) => err.fmt(f),
            UriError::Resolve(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for UriError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            UriError::Parse(err) => Some(err),
            UriError::Resolve(err) => Some(err),
        }
    }
}

impl From<ParseError<String>> for Error {
    fn from(error: ParseError<String>) -> Self {
        Error::InvalidUri(UriError::Parse(error.strip_input()))
    }
}

impl From<ParseError> for Error {
    fn from(error: ParseError) -> Self {
        Error::InvalidUri(UriError::Parse(error))
    }
}

impl From<ResolveError> for Error {
    fn from(error: ResolveError) -> Self {
        Error::InvalidUri(UriError::Resolve(error))
    }
}
