//! Dynamic XML element tree.

use crate::error::{XmlError, XmlResult};
use std::str::FromStr;

/// A node in an XML document: either a nested element or a run of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlNode {
    /// A nested element.
    Element(XmlElement),
    /// Character data.
    Text(String),
}

impl XmlNode {
    /// Returns the contained element, if this node is one.
    pub fn as_element(&self) -> Option<&XmlElement> {
        match self {
            XmlNode::Element(e) => Some(e),
            XmlNode::Text(_) => None,
        }
    }

    /// Returns the contained text, if this node is character data.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            XmlNode::Element(_) => None,
            XmlNode::Text(t) => Some(t),
        }
    }
}

/// An XML element: a name, ordered attributes, and ordered children.
///
/// Attribute and child order is preserved exactly as built or parsed,
/// so the writer produces deterministic output: equal trees serialize
/// to equal strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlElement {
    /// Element name.
    name: String,
    /// Attributes in declaration order.
    attributes: Vec<(String, String)>,
    /// Child nodes in document order.
    children: Vec<XmlNode>,
}

impl XmlElement {
    /// Creates an empty element with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Returns the element name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Adds an attribute, builder style.
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    /// Adds a child element, builder style.
    #[must_use]
    pub fn with_child(mut self, child: XmlElement) -> Self {
        self.children.push(XmlNode::Element(child));
        self
    }

    /// Adds a text child, builder style.
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(XmlNode::Text(text.into()));
        self
    }

    /// Appends an attribute.
    pub fn add_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attributes.push((name.into(), value.into()));
    }

    /// Appends a child element.
    pub fn add_child(&mut self, child: XmlElement) {
        self.children.push(XmlNode::Element(child));
    }

    /// Appends a text child.
    pub fn add_text(&mut self, text: impl Into<String>) {
        self.children.push(XmlNode::Text(text.into()));
    }

    /// Returns the attributes in declaration order.
    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    /// Returns the child nodes in document order.
    pub fn children(&self) -> &[XmlNode] {
        &self.children
    }

    /// Returns the value of an attribute.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Returns the value of a required attribute.
    ///
    /// # Errors
    ///
    /// Returns [`XmlError::MissingAttribute`] if absent.
    pub fn require_attribute(&self, name: &str) -> XmlResult<&str> {
        self.attribute(name)
            .ok_or_else(|| XmlError::missing_attribute(&self.name, name))
    }

    /// Parses an attribute value into `T`.
    ///
    /// # Errors
    ///
    /// Returns [`XmlError::MissingAttribute`] if absent and
    /// [`XmlError::InvalidValue`] if the value does not parse.
    pub fn parse_attribute<T: FromStr>(&self, name: &str) -> XmlResult<T> {
        let raw = self.require_attribute(name)?;
        raw.parse::<T>()
            .map_err(|_| XmlError::invalid_value(&self.name, name, raw))
    }

    /// Parses an optional attribute, returning `default` when absent.
    ///
    /// A present-but-unparsable value is still an error: absence has a
    /// documented default, corruption does not.
    pub fn parse_attribute_or<T: FromStr>(&self, name: &str, default: T) -> XmlResult<T> {
        match self.attribute(name) {
            None => Ok(default),
            Some(raw) => raw
                .parse::<T>()
                .map_err(|_| XmlError::invalid_value(&self.name, name, raw)),
        }
    }

    /// Returns the first child element with the given name.
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find_map(|node| match node {
            XmlNode::Element(e) if e.name == name => Some(e),
            _ => None,
        })
    }

    /// Returns the first child element with the given name, or an error.
    ///
    /// # Errors
    ///
    /// Returns [`XmlError::MissingChild`] if absent.
    pub fn require_child(&self, name: &str) -> XmlResult<&XmlElement> {
        self.child(name)
            .ok_or_else(|| XmlError::missing_child(&self.name, name))
    }

    /// Iterates over all child elements with the given name, in order.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.children.iter().filter_map(move |node| match node {
            XmlNode::Element(e) if e.name == name => Some(e),
            _ => None,
        })
    }

    /// Iterates over all child elements, in order.
    pub fn child_elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(XmlNode::as_element)
    }

    /// Returns the concatenated text of all direct text children.
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(XmlNode::as_text)
            .collect::<Vec<_>>()
            .concat()
    }

    /// Checks that this element has the given name.
    ///
    /// # Errors
    ///
    /// Returns [`XmlError::UnexpectedElement`] on mismatch.
    pub fn expect_name(&self, name: &str) -> XmlResult<()> {
        if self.name == name {
            Ok(())
        } else {
            Err(XmlError::unexpected_element(name, &self.name))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> XmlElement {
        XmlElement::new("Item")
            .with_attribute("id", "7")
            .with_attribute("state", "new")
            .with_child(XmlElement::new("Value").with_text("red"))
            .with_child(XmlElement::new("Value").with_text("blue"))
            .with_child(XmlElement::new("Description").with_text("a color"))
    }

    #[test]
    fn attribute_lookup() {
        let e = sample();
        assert_eq!(e.attribute("id"), Some("7"));
        assert_eq!(e.attribute("missing"), None);
        assert_eq!(e.require_attribute("state").unwrap(), "new");
        assert_eq!(
            e.require_attribute("missing"),
            Err(XmlError::missing_attribute("Item", "missing"))
        );
    }

    #[test]
    fn parse_attribute() {
        let e = sample();
        assert_eq!(e.parse_attribute::<u64>("id").unwrap(), 7);
        assert_eq!(
            e.parse_attribute::<u64>("state"),
            Err(XmlError::invalid_value("Item", "state", "new"))
        );
    }

    #[test]
    fn parse_attribute_or_defaults_only_when_absent() {
        let e = sample();
        assert_eq!(e.parse_attribute_or::<u64>("missing", 3).unwrap(), 3);
        assert!(e.parse_attribute_or::<u64>("state", 3).is_err());
    }

    #[test]
    fn child_lookup() {
        let e = sample();
        assert_eq!(e.child("Description").unwrap().text(), "a color");
        assert!(e.child("Nope").is_none());
        assert_eq!(
            e.require_child("Nope"),
            Err(XmlError::missing_child("Item", "Nope"))
        );
    }

    #[test]
    fn children_named_preserves_order() {
        let e = sample();
        let values: Vec<String> = e.children_named("Value").map(|c| c.text()).collect();
        assert_eq!(values, vec!["red", "blue"]);
    }

    #[test]
    fn text_concatenates() {
        let mut e = XmlElement::new("T");
        e.add_text("a");
        e.add_child(XmlElement::new("X"));
        e.add_text("b");
        assert_eq!(e.text(), "ab");
    }

    #[test]
    fn expect_name() {
        let e = sample();
        assert!(e.expect_name("Item").is_ok());
        assert_eq!(
            e.expect_name("Other"),
            Err(XmlError::unexpected_element("Other", "Item"))
        );
    }
}
