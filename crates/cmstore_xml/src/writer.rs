//! Deterministic XML writer.

use crate::element::{XmlElement, XmlNode};

/// Serializes an element tree to a compact XML string.
///
/// Output is deterministic: attributes and children appear in the order
/// they are stored, and no insignificant whitespace is emitted, so equal
/// trees serialize to equal strings.
pub fn to_xml_string(element: &XmlElement) -> String {
    let mut writer = XmlWriter::new();
    writer.write_element(element);
    writer.into_string()
}

/// A buffered XML writer.
pub struct XmlWriter {
    buffer: String,
}

impl XmlWriter {
    /// Creates a new writer.
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
        }
    }

    /// Creates a writer with the given initial capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: String::with_capacity(capacity),
        }
    }

    /// Writes an element and its subtree.
    pub fn write_element(&mut self, element: &XmlElement) {
        self.buffer.push('<');
        self.buffer.push_str(element.name());

        for (name, value) in element.attributes() {
            self.buffer.push(' ');
            self.buffer.push_str(name);
            self.buffer.push_str("=\"");
            self.write_escaped(value, true);
            self.buffer.push('"');
        }

        if element.children().is_empty() {
            self.buffer.push_str("/>");
            return;
        }

        self.buffer.push('>');
        for child in element.children() {
            match child {
                XmlNode::Element(e) => self.write_element(e),
                XmlNode::Text(t) => self.write_escaped(t, false),
            }
        }
        self.buffer.push_str("</");
        self.buffer.push_str(element.name());
        self.buffer.push('>');
    }

    /// Consumes the writer and returns the output.
    pub fn into_string(self) -> String {
        self.buffer
    }

    fn write_escaped(&mut self, text: &str, in_attribute: bool) {
        for ch in text.chars() {
            match ch {
                '&' => self.buffer.push_str("&amp;"),
                '<' => self.buffer.push_str("&lt;"),
                '>' => self.buffer.push_str("&gt;"),
                '"' if in_attribute => self.buffer.push_str("&quot;"),
                '\'' if in_attribute => self.buffer.push_str("&apos;"),
                _ => self.buffer.push(ch),
            }
        }
    }
}

impl Default for XmlWriter {
    fn default() -> Self {
        Self::new()
    }
}
