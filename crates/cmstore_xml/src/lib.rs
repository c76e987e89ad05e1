//! # cmstore XML
//!
//! XML document model and codec for the cmstore persistence layer.
//!
//! Persisted components round-trip through a small element tree rather
//! than a serde data model: the wire layout of every component is fixed
//! and versioned, and deserialization must reject structural problems
//! with errors that name the offending element or attribute.
//!
//! This crate provides:
//! - [`XmlElement`]/[`XmlNode`]: the ordered, attribute-carrying tree
//! - [`to_xml_string`]: a deterministic writer (equal trees, equal output)
//! - [`from_xml_str`]: a validating parser with typed failures
//! - [`ToXml`]/[`FromXml`]: the traits component types implement
//!
//! ## Usage
//!
//! ```
//! use cmstore_xml::{from_xml_str, to_xml_string, XmlElement};
//!
//! let tree = XmlElement::new("Property")
//!     .with_attribute("name", "color")
//!     .with_child(XmlElement::new("Value").with_text("red"));
//!
//! let text = to_xml_string(&tree);
//! let parsed = from_xml_str(&text).unwrap();
//! assert_eq!(tree, parsed);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod element;
mod error;
mod parser;
mod writer;

pub use element::{XmlElement, XmlNode};
pub use error::{XmlError, XmlResult};
pub use parser::{from_xml_str, XmlParser, MAX_DEPTH};
pub use writer::{to_xml_string, XmlWriter};

/// Trait for types with a fixed XML representation.
pub trait ToXml {
    /// Builds the element tree for this value.
    fn to_xml(&self) -> XmlElement;
}

/// Trait for types reconstructible from their XML representation.
pub trait FromXml: Sized {
    /// Reconstructs a value from an element tree.
    ///
    /// Implementations validate the element name and required
    /// attributes before reading anything else; a failed call leaves
    /// no partially-built value behind.
    fn from_xml(element: &XmlElement) -> XmlResult<Self>;
}

impl ToXml for XmlElement {
    fn to_xml(&self) -> XmlElement {
        self.clone()
    }
}
