//! Prepared templates and the template cache.
//!
//! A [`Template`] is the parsed, reusable artifact behind one template
//! call site: a private prepared document fragment (markers still in
//! place) plus the ordered binding descriptors an instance needs to wire
//! live parts. Templates are cached by static-string identity and live
//! until the cache is cleared.

use std::collections::HashMap;
use std::collections::VecDeque;
use std::rc::Rc;

use lit_dom::{parse_fragment, Document, Namespace, NodeId};
use tracing::{debug, trace};

use crate::error::TemplateError;
use crate::scanner::{scan, AttributeKind, ScannedBinding, BINDINGS_ATTR, MARKER};
use crate::template_result::{TemplateIdentity, TemplateKind, TemplateResult};

/// One binding location in a prepared template. `index` is the node's
/// position in a pre-order walk of the fragment; instances walk their
/// clone in the same order to find the matching live node.
#[derive(Debug, Clone)]
pub(crate) enum TemplatePart {
    Child {
        index: usize,
    },
    Attribute {
        index: usize,
        name: String,
        kind: AttributeKind,
        statics: Vec<String>,
    },
    Element {
        index: usize,
    },
}

impl TemplatePart {
    pub(crate) fn value_count(&self) -> usize {
        match self {
            TemplatePart::Child { .. } | TemplatePart::Element { .. } => 1,
            TemplatePart::Attribute { statics, .. } => statics.len() - 1,
        }
    }
}

/// A parsed, cached template.
#[derive(Debug)]
pub struct Template {
    kind: TemplateKind,
    doc: Document,
    fragment: NodeId,
    parts: Vec<TemplatePart>,
    value_count: usize,
}

impl Template {
    /// Scan, parse and index a template's static strings.
    pub(crate) fn prepare(
        strings: &'static [&'static str],
        kind: TemplateKind,
    ) -> Result<Template, TemplateError> {
        let scanned = scan(strings)?;

        let mut doc = Document::new();
        let namespace = match kind {
            TemplateKind::Html => Namespace::Html,
            TemplateKind::Svg => Namespace::Svg,
        };
        let fragment = parse_fragment(&mut doc, &scanned.markup, namespace)?;

        let mut queue: VecDeque<ScannedBinding> = scanned.bindings.into();
        let mut parts = Vec::new();
        let mut flagged = Vec::new();

        for (index, node) in doc.descendants(fragment).iter().enumerate() {
            if doc.node(*node).as_comment() == Some(MARKER) {
                match queue.pop_front() {
                    Some(ScannedBinding::Child) => parts.push(TemplatePart::Child { index }),
                    _ => {
                        return Err(TemplateError::PreparedTemplateMismatch(
                            "marker comment without a matching child binding",
                        ))
                    }
                }
                continue;
            }

            let Some(count) = doc.attribute(*node, BINDINGS_ATTR) else {
                continue;
            };
            let count: usize = count.parse().map_err(|_| {
                TemplateError::PreparedTemplateMismatch("unreadable binding-count sentinel")
            })?;
            flagged.push(*node);

            for _ in 0..count {
                match queue.pop_front() {
                    Some(ScannedBinding::Attribute {
                        name,
                        kind,
                        statics,
                    }) => parts.push(TemplatePart::Attribute {
                        index,
                        name,
                        kind,
                        statics,
                    }),
                    Some(ScannedBinding::Element) => parts.push(TemplatePart::Element { index }),
                    _ => {
                        return Err(TemplateError::PreparedTemplateMismatch(
                            "flagged element without matching attribute bindings",
                        ))
                    }
                }
            }
        }

        if !queue.is_empty() {
            return Err(TemplateError::PreparedTemplateMismatch(
                "scanned bindings left over after the prepare walk",
            ));
        }

        for node in flagged {
            doc.remove_attribute(node, BINDINGS_ATTR);
        }

        let value_count = parts.iter().map(TemplatePart::value_count).sum();
        debug_assert_eq!(value_count, strings.len() - 1);

        Ok(Template {
            kind,
            doc,
            fragment,
            parts,
            value_count,
        })
    }

    pub fn kind(&self) -> TemplateKind {
        self.kind
    }

    pub(crate) fn doc(&self) -> &Document {
        &self.doc
    }

    pub(crate) fn fragment(&self) -> NodeId {
        self.fragment
    }

    pub(crate) fn parts(&self) -> &[TemplatePart] {
        &self.parts
    }

    /// Total number of interpolated values one commit consumes.
    pub fn value_count(&self) -> usize {
        self.value_count
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    identity: TemplateIdentity,
    scope: Option<String>,
}

/// The template cache: static-string identity (plus an optional scope
/// discriminator) to prepared [`Template`].
///
/// Owned by the caller's [`Renderer`](crate::Renderer) rather than being
/// process-global, so tests and memory-conscious hosts can hold isolated
/// caches. There is no eviction policy; `clear` is the caller's tool.
#[derive(Debug, Default)]
pub struct TemplateCache {
    map: HashMap<CacheKey, Rc<Template>>,
}

impl TemplateCache {
    pub fn new() -> Self {
        TemplateCache::default()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn clear(&mut self) {
        self.map.clear();
    }

    pub(crate) fn get_or_prepare(
        &mut self,
        result: &TemplateResult,
        scope: Option<&str>,
    ) -> Result<Rc<Template>, TemplateError> {
        let key = CacheKey {
            identity: result.identity(),
            scope: scope.map(String::from),
        };
        if let Some(template) = self.map.get(&key) {
            trace!(?key, "template cache hit");
            return Ok(Rc::clone(template));
        }
        let template = Rc::new(Template::prepare(result.strings(), result.kind())?);
        debug!(
            parts = template.parts.len(),
            values = template.value_count,
            "prepared template"
        );
        self.map.insert(key, Rc::clone(&template));
        Ok(template)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prepare_indexes_parts_in_document_order() {
        // <div a=${}><p>${}</p></div> : walk order is div(0), p(1), marker(2).
        static STRINGS: &[&str] = &["<div a=\"", "\"><p>", "</p></div>"];
        let t = Template::prepare(STRINGS, TemplateKind::Html).unwrap();
        assert_eq!(t.parts().len(), 2);
        match &t.parts()[0] {
            TemplatePart::Attribute { index, name, .. } => {
                assert_eq!(*index, 0);
                assert_eq!(name, "a");
            }
            other => panic!("expected attribute part, got {:?}", other),
        }
        match &t.parts()[1] {
            TemplatePart::Child { index } => assert_eq!(*index, 2),
            other => panic!("expected child part, got {:?}", other),
        }
        assert_eq!(t.value_count(), 2);
    }

    #[test]
    fn prepare_strips_the_sentinel_attribute() {
        static STRINGS: &[&str] = &["<div a=\"", "\"></div>"];
        let t = Template::prepare(STRINGS, TemplateKind::Html).unwrap();
        let div = t.doc().descendants(t.fragment())[0];
        assert!(!t.doc().has_attribute(div, BINDINGS_ATTR));
    }

    #[test]
    fn cache_hits_by_identity_not_content() {
        let mut cache = TemplateCache::new();
        let mk = |v: i64| crate::html!("<p>" {v} "</p>");
        let a = cache.get_or_prepare(&mk(1), None).unwrap();
        let b = cache.get_or_prepare(&mk(2), None).unwrap();
        assert!(Rc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn scope_discriminates_cache_entries() {
        let mut cache = TemplateCache::new();
        let mk = || crate::html!("<p></p>");
        let plain = cache.get_or_prepare(&mk(), None).unwrap();
        let scoped = cache.get_or_prepare(&mk(), Some("x-card")).unwrap();
        assert!(!Rc::ptr_eq(&plain, &scoped));
        assert_eq!(cache.len(), 2);
    }
}
