//! Error types for the XML crate.

use thiserror::Error;

/// Result type for XML operations.
pub type XmlResult<T> = Result<T, XmlError>;

/// Errors that can occur while parsing or interpreting XML.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum XmlError {
    /// Input ended before the document was complete.
    #[error("unexpected end of input")]
    UnexpectedEof,

    /// Input is not well-formed XML.
    #[error("malformed XML: {message}")]
    Malformed {
        /// Description of the syntax error.
        message: String,
    },

    /// A closing tag did not match the open element.
    #[error("mismatched closing tag: expected </{expected}>, found </{found}>")]
    MismatchedTag {
        /// Name of the element being closed.
        expected: String,
        /// Name found in the closing tag.
        found: String,
    },

    /// The same attribute appeared twice on one element.
    #[error("duplicate attribute '{attribute}' on element '{element}'")]
    DuplicateAttribute {
        /// The element carrying the duplicate.
        element: String,
        /// The repeated attribute name.
        attribute: String,
    },

    /// An entity reference could not be resolved.
    #[error("invalid entity reference '&{entity};'")]
    InvalidEntity {
        /// The unresolvable entity name.
        entity: String,
    },

    /// Element nesting exceeded the safety limit.
    #[error("element nesting exceeds depth limit")]
    DepthLimitExceeded,

    /// A document or fragment had the wrong root element.
    ///
    /// This is the "unknown node type" failure: deserializers check the
    /// element name before reading any field.
    #[error("unexpected element: expected <{expected}>, found <{found}>")]
    UnexpectedElement {
        /// The element name the caller required.
        expected: String,
        /// The element name actually present.
        found: String,
    },

    /// A required attribute was absent.
    #[error("element '{element}' is missing required attribute '{attribute}'")]
    MissingAttribute {
        /// The element inspected.
        element: String,
        /// The absent attribute.
        attribute: String,
    },

    /// A required child element was absent.
    #[error("element '{element}' is missing required child '{child}'")]
    MissingChild {
        /// The element inspected.
        element: String,
        /// The absent child element name.
        child: String,
    },

    /// An attribute or text value could not be interpreted.
    #[error("element '{element}' has invalid value '{value}' for '{attribute}'")]
    InvalidValue {
        /// The element inspected.
        element: String,
        /// The attribute (or child) holding the value.
        attribute: String,
        /// The offending value.
        value: String,
    },
}

impl XmlError {
    /// Create a malformed-input error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
        }
    }

    /// Create a mismatched-tag error.
    pub fn mismatched_tag(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::MismatchedTag {
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Create an unexpected-element error.
    pub fn unexpected_element(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::UnexpectedElement {
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Create a missing-attribute error.
    pub fn missing_attribute(element: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self::MissingAttribute {
            element: element.into(),
            attribute: attribute.into(),
        }
    }

    /// Create a missing-child error.
    pub fn missing_child(element: impl Into<String>, child: impl Into<String>) -> Self {
        Self::MissingChild {
            element: element.into(),
            child: child.into(),
        }
    }

    /// Create an invalid-value error.
    pub fn invalid_value(
        element: impl Into<String>,
        attribute: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            element: element.into(),
            attribute: attribute.into(),
            value: value.into(),
        }
    }
}
