//! XML part to document tree conversion.
//!
//! Attributes go under `"$"`; an element with nothing but character data
//! collapses to a text leaf; other character data goes under `"_"`. Child
//! elements are appended in document order, so repeated tags stay
//! interleaved with their siblings.

use deckparse_core::tree::{ATTRS_KEY, TEXT_KEY};
use deckparse_core::{Element, Error, Node, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

struct OpenElement {
    name: String,
    element: Element,
    has_attrs: bool,
    has_children: bool,
    text: String,
}

impl OpenElement {
    fn new(start: &BytesStart) -> Self {
        let name = String::from_utf8_lossy(start.name().as_ref()).to_string();
        let mut attrs = Element::new();
        for attr in start.attributes().flatten() {
            let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
            let value = match attr.unescape_value() {
                Ok(v) => v.to_string(),
                Err(_) => String::from_utf8_lossy(&attr.value).to_string(),
            };
            attrs.push(key, Node::Text(value));
        }
        let has_attrs = !attrs.is_empty();
        let mut element = Element::new();
        if has_attrs {
            element.push(ATTRS_KEY, Node::Element(attrs));
        }
        Self {
            name,
            element,
            has_attrs,
            has_children: false,
            text: String::new(),
        }
    }

    fn finish(mut self) -> (String, Node) {
        let node = if !self.has_attrs && !self.has_children {
            Node::Text(self.text)
        } else {
            if !self.text.trim().is_empty() {
                self.element.push(TEXT_KEY, Node::Text(self.text));
            }
            Node::Element(self.element)
        };
        (self.name, node)
    }
}

/// Parse an XML document into a tree whose root element is keyed by its tag.
pub fn parse_xml(xml: &str) -> Result<Node> {
    let mut reader = Reader::from_str(xml);
    // Run text such as `<a:t> </a:t>` is significant.
    reader.trim_text(false);

    let mut stack: Vec<OpenElement> = Vec::new();
    let mut root = Element::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                stack.push(OpenElement::new(e));
            }
            Ok(Event::Empty(ref e)) => {
                let (name, node) = OpenElement::new(e).finish();
                attach(&mut stack, &mut root, name, node);
            }
            Ok(Event::End(_)) => {
                let Some(open) = stack.pop() else {
                    return Err(Error::XmlError("unbalanced end tag".to_string()));
                };
                let (name, node) = open.finish();
                attach(&mut stack, &mut root, name, node);
            }
            Ok(Event::Text(ref e)) => {
                if let Some(open) = stack.last_mut() {
                    match e.unescape() {
                        Ok(text) => open.text.push_str(&text),
                        Err(_) => open.text.push_str(&String::from_utf8_lossy(e)),
                    }
                }
            }
            Ok(Event::CData(e)) => {
                if let Some(open) = stack.last_mut() {
                    open.text.push_str(&String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::XmlError(format!(
                    "Error at position {}: {}",
                    reader.buffer_position(),
                    e
                )));
            }
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(Error::XmlError(format!(
            "unexpected end of document inside <{}>",
            stack.last().map(|o| o.name.as_str()).unwrap_or_default()
        )));
    }
    if root.is_empty() {
        return Err(Error::XmlError("document has no root element".to_string()));
    }
    Ok(Node::Element(root))
}

fn attach(stack: &mut [OpenElement], root: &mut Element, name: String, node: Node) {
    match stack.last_mut() {
        Some(parent) => {
            parent.has_children = true;
            parent.element.push(name, node);
        }
        None => root.push(name, node),
    }
}
