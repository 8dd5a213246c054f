//! Loosely-typed document tree with a defensive path accessor.
//!
//! The tree mirrors what an XML-to-object converter produces for OOXML parts:
//! an element is a map of qualified tag names to children, attributes live
//! under `"$"` and character data under `"_"`. Elements loaded by this crate
//! may repeat a key so that siblings keep their document order; trees that
//! arrive as JSON usually group same-named children into arrays instead.
//! Every accessor here tolerates both layouts.

use crate::error::{Error, Result};
use serde::de::{self, MapAccess, SeqAccess, Visitor};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Key holding an element's attributes.
pub const ATTRS_KEY: &str = "$";

/// Key holding an element's character data when it also has attributes or children.
pub const TEXT_KEY: &str = "_";

/// A value in the document tree.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Node {
    /// Absent value (JSON `null`).
    #[default]
    Empty,
    /// Character data or an attribute value.
    Text(String),
    /// A numeric leaf.
    Number(f64),
    /// An element: ordered, possibly repeating, key/value entries.
    Element(Element),
    /// An array of values.
    List(Vec<Node>),
}

/// Ordered entries of an element.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Element {
    entries: Vec<(String, Node)>,
}

impl Element {
    /// Create an empty element.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry, keeping any earlier entry with the same key.
    pub fn push(&mut self, key: impl Into<String>, value: Node) {
        self.entries.push((key.into(), value));
    }

    /// First value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&Node> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Entries in insertion (document) order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Distinct keys in first-seen order.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = Vec::new();
        for (k, _) in &self.entries {
            if !keys.contains(&k.as_str()) {
                keys.push(k);
            }
        }
        keys
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl Node {
    /// Build an element node from `(key, value)` pairs.
    pub fn element<K: Into<String>>(entries: impl IntoIterator<Item = (K, Node)>) -> Self {
        let mut el = Element::new();
        for (k, v) in entries {
            el.push(k, v);
        }
        Node::Element(el)
    }

    /// Build a text leaf.
    pub fn text_node(s: impl Into<String>) -> Self {
        Node::Text(s.into())
    }

    /// Parse a JSON document into a tree.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// The element behind this node, looking through a list to its first item.
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(el) => Some(el),
            Node::List(items) => items.first().and_then(Node::as_element),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Node::Empty => true,
            Node::Text(s) => s.is_empty(),
            Node::Number(_) => false,
            Node::Element(el) => el.is_empty(),
            Node::List(items) => items.is_empty(),
        }
    }

    /// Whether this node can carry children (is not a scalar leaf).
    pub fn is_structural(&self) -> bool {
        matches!(self, Node::Element(_) | Node::List(_))
    }

    /// Look up a direct child by key.
    pub fn get(&self, key: &str) -> Option<&Node> {
        match self {
            Node::Element(el) => el.get(key),
            Node::List(items) => {
                if let Ok(index) = key.parse::<usize>() {
                    items.get(index)
                } else {
                    items.first().and_then(|n| n.get(key))
                }
            }
            _ => None,
        }
    }

    /// Walk a dotted path such as `p:spPr.a:xfrm.a:off.$.x`.
    ///
    /// A numeric segment indexes into a list; a name segment applied to a
    /// list descends into its first item. Any missing segment yields `None`.
    pub fn path(&self, path: &str) -> Option<&Node> {
        if path.is_empty() {
            return Some(self);
        }
        let mut current = self;
        for segment in path.split('.') {
            current = current.get(segment)?;
        }
        Some(current)
    }

    /// Walk a dotted path, returning `default` when any segment is missing.
    pub fn path_or<'a>(&'a self, path: &str, default: &'a Node) -> &'a Node {
        self.path(path).unwrap_or(default)
    }

    /// Like [`Node::path`], but rejects a scalar root.
    ///
    /// Missing intermediate nodes are still `Ok(None)`; only a root that
    /// cannot possibly contain the path is an error.
    pub fn resolve(&self, path: &str) -> Result<Option<&Node>> {
        if !self.is_structural() {
            return Err(Error::MalformedTree(format!(
                "cannot resolve '{}' against a {} root",
                path,
                self.kind_name()
            )));
        }
        Ok(self.path(path))
    }

    /// First path among `paths` that resolves.
    pub fn first_path(&self, paths: &[&str]) -> Option<&Node> {
        paths.iter().find_map(|p| self.path(p))
    }

    /// Every item stored under `key`, flattening arrays and repeated keys.
    pub fn children(&self, key: &str) -> Vec<&Node> {
        let mut out = Vec::new();
        match self {
            Node::Element(el) => {
                for (k, v) in el.entries() {
                    if k == key {
                        push_flattened(v, &mut out);
                    }
                }
            }
            Node::List(items) => {
                if let Some(first) = items.first() {
                    return first.children(key);
                }
            }
            _ => {}
        }
        out
    }

    /// Child elements in document order as `(tag, node)` pairs, skipping
    /// attributes and character data.
    pub fn child_elements(&self) -> Vec<(&str, &Node)> {
        let mut out = Vec::new();
        if let Some(el) = self.as_element() {
            for (k, v) in el.entries() {
                if k == ATTRS_KEY || k == TEXT_KEY {
                    continue;
                }
                let mut items = Vec::new();
                push_flattened(v, &mut items);
                out.extend(items.into_iter().map(|item| (k, item)));
            }
        }
        out
    }

    /// Attribute value by name.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.get(ATTRS_KEY)?.get(name)?.as_str()
    }

    /// Attribute parsed as a number.
    pub fn attr_f64(&self, name: &str) -> Option<f64> {
        self.get(ATTRS_KEY)?.get(name)?.as_f64()
    }

    /// The string behind a scalar (or the first item of a list).
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::Text(s) => Some(s),
            Node::List(items) => items.first().and_then(Node::as_str),
            _ => None,
        }
    }

    /// Numeric value of a leaf, parsing text when needed.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Node::Number(n) => Some(*n),
            Node::Text(s) => s.trim().parse::<f64>().ok(),
            Node::List(items) => items.first().and_then(Node::as_f64),
            _ => None,
        }
    }

    /// Character data of this node: a text leaf or an element's `"_"` entry.
    pub fn text(&self) -> Option<&str> {
        match self {
            Node::Text(s) => Some(s),
            Node::Element(el) => el.get(TEXT_KEY).and_then(Node::as_str),
            Node::List(items) => items.first().and_then(Node::text),
            _ => None,
        }
    }

    /// Distinct keys of an element root, in order.
    pub fn keys(&self) -> Vec<&str> {
        self.as_element().map(Element::keys).unwrap_or_default()
    }

    fn kind_name(&self) -> &'static str {
        match self {
            Node::Empty => "empty",
            Node::Text(_) => "text",
            Node::Number(_) => "number",
            Node::Element(_) => "element",
            Node::List(_) => "list",
        }
    }
}

fn push_flattened<'a>(node: &'a Node, out: &mut Vec<&'a Node>) {
    match node {
        Node::List(items) => out.extend(items.iter()),
        other => out.push(other),
    }
}

/// Strip a namespace prefix from a qualified tag name (`p:sp` -> `sp`).
pub fn local_name(qualified: &str) -> &str {
    match qualified.rfind(':') {
        Some(pos) => &qualified[pos + 1..],
        None => qualified,
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Node::Empty => serializer.serialize_unit(),
            Node::Text(s) => serializer.serialize_str(s),
            Node::Number(n) => serializer.serialize_f64(*n),
            Node::Element(el) => {
                let mut map = serializer.serialize_map(Some(el.len()))?;
                for (k, v) in el.entries() {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
            Node::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
        }
    }
}

struct NodeVisitor;

impl<'de> Visitor<'de> for NodeVisitor {
    type Value = Node;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a document tree value")
    }

    fn visit_unit<E: de::Error>(self) -> std::result::Result<Node, E> {
        Ok(Node::Empty)
    }

    fn visit_none<E: de::Error>(self) -> std::result::Result<Node, E> {
        Ok(Node::Empty)
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> std::result::Result<Node, E> {
        Ok(Node::Text(v.to_string()))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<Node, E> {
        Ok(Node::Number(v as f64))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<Node, E> {
        Ok(Node::Number(v as f64))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> std::result::Result<Node, E> {
        Ok(Node::Number(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Node, E> {
        Ok(Node::Text(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> std::result::Result<Node, E> {
        Ok(Node::Text(v))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> std::result::Result<Node, A::Error> {
        let mut items = Vec::new();
        while let Some(item) = seq.next_element::<Node>()? {
            items.push(item);
        }
        Ok(Node::List(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<Node, A::Error> {
        let mut el = Element::new();
        while let Some((k, v)) = map.next_entry::<String, Node>()? {
            el.push(k, v);
        }
        Ok(Node::Element(el))
    }
}

impl<'de> Deserialize<'de> for Node {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Node, D::Error> {
        deserializer.deserialize_any(NodeVisitor)
    }
}
