//! Node payloads: elements, text, comments, fragments.

use std::any::Any;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::NodeId;

/// Markup namespace a node was created in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    Html,
    Svg,
}

/// A node in the document arena.
///
/// Tree structure is encoded as sibling/child links holding [`NodeId`]s;
/// there are no owning references between nodes, so arbitrary subtree
/// moves never touch the payloads.
#[derive(Debug)]
pub struct Node {
    pub(crate) parent: Option<NodeId>,
    pub(crate) first_child: Option<NodeId>,
    pub(crate) last_child: Option<NodeId>,
    pub(crate) prev_sibling: Option<NodeId>,
    pub(crate) next_sibling: Option<NodeId>,
    pub(crate) data: NodeData,
}

impl Node {
    pub(crate) fn new(data: NodeData) -> Self {
        Node {
            parent: None,
            first_child: None,
            last_child: None,
            prev_sibling: None,
            next_sibling: None,
            data,
        }
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn first_child(&self) -> Option<NodeId> {
        self.first_child
    }

    pub fn last_child(&self) -> Option<NodeId> {
        self.last_child
    }

    pub fn prev_sibling(&self) -> Option<NodeId> {
        self.prev_sibling
    }

    pub fn next_sibling(&self) -> Option<NodeId> {
        self.next_sibling
    }

    pub fn data(&self) -> &NodeData {
        &self.data
    }

    pub fn is_element(&self) -> bool {
        matches!(self.data, NodeData::Element(_))
    }

    pub fn is_text(&self) -> bool {
        matches!(self.data, NodeData::Text(_))
    }

    pub fn is_comment(&self) -> bool {
        matches!(self.data, NodeData::Comment(_))
    }

    pub fn as_element(&self) -> Option<&ElementData> {
        match &self.data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut ElementData> {
        match &mut self.data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match &self.data {
            NodeData::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_comment(&self) -> Option<&str> {
        match &self.data {
            NodeData::Comment(c) => Some(c),
            _ => None,
        }
    }
}

/// Node payload variants.
#[derive(Debug)]
pub enum NodeData {
    /// Element with tag name, namespace, attributes and properties.
    Element(ElementData),
    /// Character data, stored unescaped.
    Text(String),
    /// Comment contents (without the `<!--`/`-->` delimiters).
    Comment(String),
    /// Parentless container produced by the fragment parser.
    Fragment,
}

/// Element payload.
///
/// Attributes keep insertion order (serialization and tests observe it).
/// Properties are a separate side-table holding live values that never
/// round-trip through attribute strings.
#[derive(Debug)]
pub struct ElementData {
    pub(crate) tag_name: String,
    pub(crate) namespace: Namespace,
    pub(crate) attributes: IndexMap<String, String>,
    pub(crate) properties: IndexMap<String, PropertyValue>,
}

impl ElementData {
    pub(crate) fn new(tag_name: String, namespace: Namespace) -> Self {
        ElementData {
            tag_name,
            namespace,
            attributes: IndexMap::new(),
            properties: IndexMap::new(),
        }
    }

    pub fn tag_name(&self) -> &str {
        &self.tag_name
    }

    pub fn namespace(&self) -> Namespace {
        self.namespace
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.get(name)
    }
}

/// A value assigned directly to an element property, bypassing attribute
/// serialization.
///
/// Equality is strict: primitives compare by value within the same
/// variant, `Object` compares by reference identity. This is what lets
/// object-valued properties pass through unchanged when reference-equal.
#[derive(Debug, Clone)]
pub enum PropertyValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Object(Rc<dyn Any>),
}

impl PartialEq for PropertyValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (PropertyValue::Null, PropertyValue::Null) => true,
            (PropertyValue::Bool(a), PropertyValue::Bool(b)) => a == b,
            (PropertyValue::Int(a), PropertyValue::Int(b)) => a == b,
            (PropertyValue::Float(a), PropertyValue::Float(b)) => a == b,
            (PropertyValue::String(a), PropertyValue::String(b)) => a == b,
            (PropertyValue::Object(a), PropertyValue::Object(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}
