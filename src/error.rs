//! Error types for geobind
//!
//! This module defines all error types used throughout the library,
//! covering schema resolution, instance parsing, binding execution and
//! the coordinate transformation pipeline.

use std::fmt;
use thiserror::Error;

use crate::namespaces::QName;

/// Result type alias using geobind Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for geobind operations
#[derive(Error, Debug)]
pub enum Error {
    /// Instance document parse failure (malformed input, binding error,
    /// unresolvable declaration under strict mode)
    #[error("parse failure: {0}")]
    Parse(#[from] ParseFailure),

    /// Schema document reading/building error
    #[error("schema error: {0}")]
    Schema(String),

    /// Caller contract violation (e.g. an element/type pair that do not
    /// actually relate, or mismatched transform dimensions)
    #[error("illegal argument: {0}")]
    Argument(String),

    /// Value error (text content not valid for a simple type)
    #[error("value error: {0}")]
    Value(String),

    /// Namespace error
    #[error("namespace error: {0}")]
    Namespace(String),

    /// Name error (invalid XML name)
    #[error("name error: {0}")]
    Name(String),

    /// A transform with no inverse was asked for one
    #[error("noninvertible transform: {0}")]
    NoninvertibleTransform(String),

    /// Limit exceeded error
    #[error("limit exceeded: {0}")]
    LimitExceeded(String),

    /// The streaming worker was cancelled before completing the document
    #[error("parse cancelled")]
    Cancelled,

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Low-level XML error
    #[error("XML error: {0}")]
    Xml(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

/// Structured parse failure with document context
///
/// Carries the qualified name of the offending element and its byte
/// position in the input, so callers can report where a document broke.
#[derive(Debug)]
pub struct ParseFailure {
    /// Error message
    pub message: String,
    /// Qualified name of the element being processed when the failure occurred
    pub element: Option<QName>,
    /// Byte offset into the input document
    pub position: Option<u64>,
    /// Underlying cause
    pub cause: Option<Box<Error>>,
}

impl ParseFailure {
    /// Create a new parse failure
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            element: None,
            position: None,
            cause: None,
        }
    }

    /// Set the offending element
    pub fn with_element(mut self, element: QName) -> Self {
        self.element = Some(element);
        self
    }

    /// Set the byte position in the input
    pub fn with_position(mut self, position: u64) -> Self {
        self.position = Some(position);
        self
    }

    /// Set the underlying cause
    pub fn with_cause(mut self, cause: Error) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }
}

impl fmt::Display for ParseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;

        if let Some(ref element) = self.element {
            write!(f, "\n\nElement: {}", element)?;
        }

        if let Some(position) = self.position {
            write!(f, "\n\nPosition: byte {}", position)?;
        }

        if let Some(ref cause) = self.cause {
            write!(f, "\n\nCaused by: {}", cause)?;
        }

        Ok(())
    }
}

impl std::error::Error for ParseFailure {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_failure_display() {
        let err = ParseFailure::new("binding for 'envelope' failed")
            .with_element(QName::namespaced("http://example.com/gml", "envelope"))
            .with_position(1042)
            .with_cause(Error::Value("not a number: 'abc'".to_string()));

        let msg = format!("{}", err);
        assert!(msg.contains("binding for 'envelope' failed"));
        assert!(msg.contains("Element:"));
        assert!(msg.contains("Position: byte 1042"));
        assert!(msg.contains("Caused by:"));
    }

    #[test]
    fn test_error_conversion() {
        let failure = ParseFailure::new("test");
        let err: Error = failure.into();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn test_noninvertible_is_typed() {
        let err = Error::NoninvertibleTransform("scale is zero".to_string());
        assert!(matches!(err, Error::NoninvertibleTransform(_)));
        assert!(format!("{}", err).contains("noninvertible"));
    }
}
