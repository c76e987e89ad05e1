//! Validating XML parser.

use crate::element::{XmlElement, XmlNode};
use crate::error::{XmlError, XmlResult};

/// Parses a document and returns its root element.
///
/// The parser accepts the subset of XML the persistence layer produces
/// and consumes: an optional declaration, comments, processing
/// instructions, a DOCTYPE (skipped, not validated), elements with
/// attributes in either quote style, CDATA sections, and the predefined
/// plus numeric character references. Whitespace-only text runs between
/// child elements are formatting and are dropped; in an element with no
/// child elements they are content and are kept, as is all other text.
///
/// # Errors
///
/// Returns a typed error for any structural problem: mismatched closing
/// tags, duplicate attributes, unresolvable entities, unterminated
/// constructs, content after the root element, or nesting beyond
/// [`MAX_DEPTH`].
pub fn from_xml_str(input: &str) -> XmlResult<XmlElement> {
    let mut parser = XmlParser::new(input);
    parser.parse_document()
}

/// Maximum element nesting depth.
/// Prevents stack exhaustion from untrusted input.
pub const MAX_DEPTH: usize = 256;

/// A non-streaming XML parser over a string slice.
pub struct XmlParser<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> XmlParser<'a> {
    /// Creates a parser over the given input.
    pub fn new(input: &'a str) -> Self {
        Self {
            data: input.as_bytes(),
            pos: 0,
        }
    }

    /// Parses a full document: prolog, one root element, trailing misc.
    pub fn parse_document(&mut self) -> XmlResult<XmlElement> {
        self.skip_misc()?;
        if self.starts_with(b"<!DOCTYPE") {
            self.skip_until(b">")?;
            self.skip_misc()?;
        }
        let root = self.parse_element(0)?;
        self.skip_misc()?;
        if self.pos < self.data.len() {
            return Err(XmlError::malformed("content after root element"));
        }
        Ok(root)
    }

    fn parse_element(&mut self, depth: usize) -> XmlResult<XmlElement> {
        if depth >= MAX_DEPTH {
            return Err(XmlError::DepthLimitExceeded);
        }
        self.expect(b"<")?;
        let name = self.read_name()?;
        let mut element = XmlElement::new(name.clone());

        loop {
            self.skip_whitespace();
            if self.starts_with(b"/>") {
                self.pos += 2;
                return Ok(element);
            }
            if self.starts_with(b">") {
                self.pos += 1;
                break;
            }
            let (attr, value) = self.parse_attribute()?;
            if element.attribute(&attr).is_some() {
                return Err(XmlError::DuplicateAttribute {
                    element: name,
                    attribute: attr,
                });
            }
            element.add_attribute(attr, value);
        }

        self.parse_children(&mut element, depth)?;

        // closing tag
        self.expect(b"</")?;
        let close = self.read_name()?;
        if close != name {
            return Err(XmlError::mismatched_tag(name, close));
        }
        self.skip_whitespace();
        self.expect(b">")?;
        Ok(element)
    }

    fn parse_children(&mut self, element: &mut XmlElement, depth: usize) -> XmlResult<()> {
        // Nodes are buffered with a significance flag: whitespace-only
        // text between child elements is formatting and is dropped, but
        // in an element with no child elements it is the content itself
        // (a whitespace property value must survive a round trip).
        let mut nodes: Vec<(XmlNode, bool)> = Vec::new();
        let mut has_elements = false;
        loop {
            if self.starts_with(b"</") {
                break;
            }
            if self.pos >= self.data.len() {
                return Err(XmlError::UnexpectedEof);
            }
            if self.starts_with(b"<!--") {
                self.skip_comment()?;
            } else if self.starts_with(b"<![CDATA[") {
                let text = self.read_cdata()?;
                nodes.push((XmlNode::Text(text), true));
            } else if self.starts_with(b"<?") {
                self.skip_until(b"?>")?;
            } else if self.starts_with(b"<") {
                let child = self.parse_element(depth + 1)?;
                has_elements = true;
                nodes.push((XmlNode::Element(child), true));
            } else {
                let text = self.read_text()?;
                let significant = !text.chars().all(char::is_whitespace);
                nodes.push((XmlNode::Text(text), significant));
            }
        }
        for (node, significant) in nodes {
            if !significant && has_elements {
                continue;
            }
            match node {
                XmlNode::Element(child) => element.add_child(child),
                XmlNode::Text(text) => element.add_text(text),
            }
        }
        Ok(())
    }

    fn parse_attribute(&mut self) -> XmlResult<(String, String)> {
        let name = self.read_name()?;
        self.skip_whitespace();
        self.expect(b"=")?;
        self.skip_whitespace();
        let quote = match self.peek() {
            Some(q @ (b'"' | b'\'')) => q,
            Some(_) => return Err(XmlError::malformed("attribute value must be quoted")),
            None => return Err(XmlError::UnexpectedEof),
        };
        self.pos += 1;
        let start = self.pos;
        while let Some(b) = self.peek() {
            if b == quote {
                let raw = std::str::from_utf8(&self.data[start..self.pos])
                    .map_err(|_| XmlError::malformed("attribute value is not valid UTF-8"))?;
                let value = decode_entities(raw)?;
                self.pos += 1;
                return Ok((name, value));
            }
            if b == b'<' {
                return Err(XmlError::malformed("'<' in attribute value"));
            }
            self.pos += 1;
        }
        Err(XmlError::UnexpectedEof)
    }

    fn read_text(&mut self) -> XmlResult<String> {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if b == b'<' {
                break;
            }
            self.pos += 1;
        }
        let raw = std::str::from_utf8(&self.data[start..self.pos])
            .map_err(|_| XmlError::malformed("text is not valid UTF-8"))?;
        decode_entities(raw)
    }

    fn read_cdata(&mut self) -> XmlResult<String> {
        self.expect(b"<![CDATA[")?;
        let start = self.pos;
        while self.pos < self.data.len() {
            if self.starts_with(b"]]>") {
                let raw = std::str::from_utf8(&self.data[start..self.pos])
                    .map_err(|_| XmlError::malformed("CDATA is not valid UTF-8"))?;
                self.pos += 3;
                return Ok(raw.to_string());
            }
            self.pos += 1;
        }
        Err(XmlError::UnexpectedEof)
    }

    fn read_name(&mut self) -> XmlResult<String> {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'.' | b':') {
                self.pos += 1;
            } else {
                break;
            }
        }
        if self.pos == start {
            return Err(XmlError::malformed("expected a name"));
        }
        let name = std::str::from_utf8(&self.data[start..self.pos])
            .map_err(|_| XmlError::malformed("name is not valid UTF-8"))?;
        if name.as_bytes()[0].is_ascii_digit() {
            return Err(XmlError::malformed(format!(
                "name '{name}' may not start with a digit"
            )));
        }
        Ok(name.to_string())
    }

    fn skip_misc(&mut self) -> XmlResult<()> {
        loop {
            self.skip_whitespace();
            if self.starts_with(b"<!--") {
                self.skip_comment()?;
            } else if self.starts_with(b"<?") {
                self.skip_until(b"?>")?;
            } else {
                return Ok(());
            }
        }
    }

    fn skip_comment(&mut self) -> XmlResult<()> {
        self.expect(b"<!--")?;
        self.skip_until(b"-->")
    }

    fn skip_until(&mut self, terminator: &[u8]) -> XmlResult<()> {
        while self.pos < self.data.len() {
            if self.starts_with(terminator) {
                self.pos += terminator.len();
                return Ok(());
            }
            self.pos += 1;
        }
        Err(XmlError::UnexpectedEof)
    }

    fn skip_whitespace(&mut self) {
        while let Some(b) = self.peek() {
            if b.is_ascii_whitespace() {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn expect(&mut self, token: &[u8]) -> XmlResult<()> {
        if self.starts_with(token) {
            self.pos += token.len();
            Ok(())
        } else if self.pos >= self.data.len() {
            Err(XmlError::UnexpectedEof)
        } else {
            Err(XmlError::malformed(format!(
                "expected '{}'",
                String::from_utf8_lossy(token)
            )))
        }
    }

    fn starts_with(&self, token: &[u8]) -> bool {
        self.data[self.pos..].starts_with(token)
    }

    fn peek(&self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }
}

/// Resolves entity and character references in a text run.
fn decode_entities(raw: &str) -> XmlResult<String> {
    if !raw.contains('&') {
        return Ok(raw.to_string());
    }
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.char_indices();
    while let Some((i, ch)) = chars.next() {
        if ch != '&' {
            out.push(ch);
            continue;
        }
        let rest = &raw[i + 1..];
        let end = rest.find(';').ok_or_else(|| XmlError::InvalidEntity {
            entity: rest.chars().take(8).collect(),
        })?;
        let entity = &rest[..end];
        match entity {
            "amp" => out.push('&'),
            "lt" => out.push('<'),
            "gt" => out.push('>'),
            "quot" => out.push('"'),
            "apos" => out.push('\''),
            _ => {
                let code = entity
                    .strip_prefix("#x")
                    .or_else(|| entity.strip_prefix("#X"))
                    .map(|hex| u32::from_str_radix(hex, 16))
                    .or_else(|| entity.strip_prefix('#').map(|dec| dec.parse::<u32>()))
                    .ok_or_else(|| XmlError::InvalidEntity {
                        entity: entity.to_string(),
                    })?
                    .map_err(|_| XmlError::InvalidEntity {
                        entity: entity.to_string(),
                    })?;
                let decoded = char::from_u32(code).ok_or_else(|| XmlError::InvalidEntity {
                    entity: entity.to_string(),
                })?;
                out.push(decoded);
            }
        }
        // advance past the entity body and the ';'
        for _ in 0..=end {
            chars.next();
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_element() {
        let e = from_xml_str("<Item/>").unwrap();
        assert_eq!(e.name(), "Item");
        assert!(e.children().is_empty());
    }

    #[test]
    fn attributes_both_quote_styles() {
        let e = from_xml_str("<E a=\"1\" b='two'/>").unwrap();
        assert_eq!(e.attribute("a"), Some("1"));
        assert_eq!(e.attribute("b"), Some("two"));
    }

    #[test]
    fn nested_with_text() {
        let e = from_xml_str("<Outer><Inner>hello</Inner></Outer>").unwrap();
        assert_eq!(e.child("Inner").unwrap().text(), "hello");
    }

    #[test]
    fn declaration_and_comments_skipped() {
        let e = from_xml_str("<?xml version=\"1.0\"?><!-- note --><E>x</E><!-- after -->")
            .unwrap();
        assert_eq!(e.text(), "x");
    }

    #[test]
    fn doctype_skipped() {
        let e = from_xml_str("<!DOCTYPE Item SYSTEM \"item.dtd\"><Item/>").unwrap();
        assert_eq!(e.name(), "Item");
    }

    #[test]
    fn entities_decoded() {
        let e = from_xml_str("<E>a &lt; b &amp; &#65;&#x42;</E>").unwrap();
        assert_eq!(e.text(), "a < b & AB");
    }

    #[test]
    fn cdata_kept_verbatim() {
        let e = from_xml_str("<E><![CDATA[a < b & c]]></E>").unwrap();
        assert_eq!(e.text(), "a < b & c");
    }

    #[test]
    fn whitespace_between_child_elements_dropped() {
        let e = from_xml_str("<Outer>\n  <Inner/>\n</Outer>").unwrap();
        assert_eq!(e.children().len(), 1);
        assert_eq!(e.text(), "");
    }

    #[test]
    fn whitespace_only_content_kept() {
        let e = from_xml_str("<Value> </Value>").unwrap();
        assert_eq!(e.text(), " ");

        let e = from_xml_str("<Value>\n\t</Value>").unwrap();
        assert_eq!(e.text(), "\n\t");
    }

    #[test]
    fn mismatched_tag_rejected() {
        let err = from_xml_str("<A><B></A></B>").unwrap_err();
        assert_eq!(err, XmlError::mismatched_tag("B", "A"));
    }

    #[test]
    fn duplicate_attribute_rejected() {
        let err = from_xml_str("<E a=\"1\" a=\"2\"/>").unwrap_err();
        assert!(matches!(err, XmlError::DuplicateAttribute { .. }));
    }

    #[test]
    fn bad_entity_rejected() {
        let err = from_xml_str("<E>&nope;</E>").unwrap_err();
        assert_eq!(
            err,
            XmlError::InvalidEntity {
                entity: "nope".to_string()
            }
        );
    }

    #[test]
    fn bare_ampersand_rejected() {
        assert!(from_xml_str("<E>a & b</E>").is_err());
    }

    #[test]
    fn trailing_content_rejected() {
        let err = from_xml_str("<E/><F/>").unwrap_err();
        assert_eq!(err, XmlError::malformed("content after root element"));
    }

    #[test]
    fn unterminated_element_rejected() {
        assert_eq!(from_xml_str("<E>"), Err(XmlError::UnexpectedEof));
        assert_eq!(from_xml_str("<E a=\"1"), Err(XmlError::UnexpectedEof));
    }

    #[test]
    fn depth_limit_enforced() {
        let mut doc = String::new();
        for _ in 0..(MAX_DEPTH + 1) {
            doc.push_str("<D>");
        }
        for _ in 0..(MAX_DEPTH + 1) {
            doc.push_str("</D>");
        }
        assert_eq!(from_xml_str(&doc), Err(XmlError::DepthLimitExceeded));
    }
}
