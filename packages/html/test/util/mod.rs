//! Shared fixtures for the engine's integration suites.
#![allow(dead_code)]

use lit_dom::{Document, NodeId};

/// A document with a `<div>` container ready to render into.
pub fn setup() -> (Document, NodeId) {
    let mut doc = Document::new();
    let container = doc.create_element("div");
    (doc, container)
}

/// Serialized trees carry part marker comments; strip every comment when
/// comparing visible structure.
pub fn strip_comments(html: &str) -> String {
    let mut out = String::new();
    let mut rest = html;
    while let Some(open) = rest.find("<!--") {
        out.push_str(&rest[..open]);
        match rest[open..].find("-->") {
            Some(close) => rest = &rest[open + close + 3..],
            None => return out,
        }
    }
    out.push_str(rest);
    out
}

/// Visible markup of a container's contents.
pub fn visible(doc: &Document, container: NodeId) -> String {
    strip_comments(&doc.inner_html(container))
}
