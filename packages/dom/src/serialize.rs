//! Escaping HTML serializer.
//!
//! Text and attribute values are escaped on the way out; together with
//! the rule that bound values only ever enter the tree through
//! `set_text`/`set_attribute`, this is what keeps interpolated markup
//! inert.

use crate::node::NodeData;
use crate::parser::{is_unescaped_raw_text_element, is_void_element};
use crate::{Document, NodeId};

/// Escape character data for a text position.
pub fn escape_text(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escape a value for a double-quoted attribute position.
pub fn escape_attribute(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            _ => out.push(c),
        }
    }
    out
}

impl Document {
    /// Serialize the children of `node`.
    pub fn inner_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        for child in self.children(node) {
            self.write_node(child, &mut out);
        }
        out
    }

    /// Serialize `node` itself (children included).
    pub fn outer_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.write_node(node, &mut out);
        out
    }

    fn write_node(&self, id: NodeId, out: &mut String) {
        match self.node(id).data() {
            NodeData::Fragment => {
                for child in self.children(id) {
                    self.write_node(child, out);
                }
            }
            NodeData::Text(t) => out.push_str(&escape_text(t)),
            NodeData::Comment(c) => {
                out.push_str("<!--");
                out.push_str(c);
                out.push_str("-->");
            }
            NodeData::Element(e) => {
                out.push('<');
                out.push_str(e.tag_name());
                for (name, value) in e.attributes() {
                    out.push(' ');
                    out.push_str(name);
                    if !value.is_empty() {
                        out.push_str("=\"");
                        out.push_str(&escape_attribute(value));
                        out.push('"');
                    } else {
                        out.push_str("=\"\"");
                    }
                }
                out.push('>');

                let name = e.tag_name();
                if is_void_element(name) {
                    return;
                }
                if is_unescaped_raw_text_element(name) {
                    // Script and style content round-trips unescaped.
                    for child in self.children(id) {
                        if let NodeData::Text(t) = self.node(child).data() {
                            out.push_str(t);
                        }
                    }
                } else {
                    for child in self.children(id) {
                        self.write_node(child, out);
                    }
                }
                out.push_str("</");
                out.push_str(name);
                out.push('>');
            }
        }
    }
}
