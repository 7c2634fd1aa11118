//! Template instances: one live DOM realization of a cached template.

use std::rc::Rc;

use crate::error::TemplateError;
use crate::part::{
    AttributePart, BooleanAttributePart, ChildPart, ElementPart, EventPart, PropertyPart,
};
use crate::render::RenderContext;
use crate::scanner::AttributeKind;
use crate::template::{Template, TemplatePart};
use crate::value::Value;
use lit_dom::NodeId;

#[derive(Debug)]
pub(crate) enum InstancePart {
    Child(ChildPart),
    Attribute(AttributePart),
    Property(PropertyPart),
    Boolean(BooleanAttributePart),
    Event(EventPart),
    Element(ElementPart),
}

impl InstancePart {
    fn set_connected(&mut self, connected: bool) {
        match self {
            InstancePart::Child(part) => part.set_connected(connected),
            InstancePart::Attribute(part) => part.set_connected(connected),
            InstancePart::Property(part) => part.set_connected(connected),
            InstancePart::Boolean(part) => part.set_connected(connected),
            InstancePart::Event(part) => part.set_connected(connected),
            InstancePart::Element(part) => part.set_connected(connected),
        }
    }
}

/// A clone of a prepared template wired to live parts, owned by the
/// child part it was committed into.
#[derive(Debug)]
pub(crate) struct TemplateInstance {
    template: Rc<Template>,
    parts: Vec<InstancePart>,
}

impl TemplateInstance {
    /// Clone the template's fragment into the live document and build one
    /// part per descriptor. `host_end` closes the range of any top-level
    /// child binding that has no following sibling of its own.
    ///
    /// Returns the instance plus the clone's top-level nodes, which the
    /// caller splices into position (sibling order preserved).
    pub(crate) fn instantiate(
        template: Rc<Template>,
        cx: &mut RenderContext<'_>,
        host_end: Option<NodeId>,
    ) -> (TemplateInstance, Vec<NodeId>) {
        let (fragment_copy, map) = cx.doc.import_subtree(template.doc(), template.fragment());
        let top_nodes = cx.doc.children(fragment_copy);

        let mut parts = Vec::with_capacity(template.parts().len());
        for descriptor in template.parts() {
            let part = match descriptor {
                TemplatePart::Child { index } => {
                    let marker = map[*index];
                    let end = match cx.doc.next_sibling(marker) {
                        Some(sibling) => Some(sibling),
                        None if cx.doc.parent(marker) == Some(fragment_copy) => host_end,
                        None => None,
                    };
                    InstancePart::Child(ChildPart::new(marker, end, cx.connected))
                }
                TemplatePart::Attribute {
                    index,
                    name,
                    kind,
                    statics,
                } => {
                    let element = map[*index];
                    match kind {
                        AttributeKind::Attribute => InstancePart::Attribute(AttributePart::new(
                            element,
                            name.clone(),
                            statics.clone(),
                        )),
                        AttributeKind::Property => InstancePart::Property(PropertyPart::new(
                            element,
                            name.clone(),
                            statics.clone(),
                        )),
                        AttributeKind::Boolean => InstancePart::Boolean(
                            BooleanAttributePart::new(element, name.clone()),
                        ),
                        AttributeKind::Event => {
                            InstancePart::Event(EventPart::new(element, name.clone()))
                        }
                    }
                }
                TemplatePart::Element { index } => {
                    InstancePart::Element(ElementPart::new(map[*index]))
                }
            };
            parts.push(part);
        }

        (TemplateInstance { template, parts }, top_nodes)
    }

    pub(crate) fn same_template(&self, other: &Rc<Template>) -> bool {
        Rc::ptr_eq(&self.template, other)
    }

    /// Commit one value per binding, in descriptor order. The descriptor
    /// list and the value list must agree on counts; a mismatch is an
    /// internal invariant violation, not a user error.
    pub(crate) fn commit(
        &mut self,
        values: Vec<Value>,
        cx: &mut RenderContext<'_>,
    ) -> Result<(), TemplateError> {
        let expected = self.template.value_count();
        if values.len() != expected {
            return Err(TemplateError::BindingCountMismatch {
                expected,
                got: values.len(),
            });
        }

        let mut values = values.into_iter();
        for part in self.parts.iter_mut() {
            match part {
                InstancePart::Child(p) => {
                    let value = values.next().expect("count verified above");
                    p.commit(value, cx)?;
                }
                InstancePart::Boolean(p) => {
                    let value = values.next().expect("count verified above");
                    p.commit(value, cx)?;
                }
                InstancePart::Event(p) => {
                    let value = values.next().expect("count verified above");
                    p.commit(value, cx)?;
                }
                InstancePart::Element(p) => {
                    let value = values.next().expect("count verified above");
                    p.commit(value, cx)?;
                }
                InstancePart::Attribute(p) => {
                    let slice: Vec<Value> =
                        values.by_ref().take(p.value_count()).collect();
                    p.commit(slice, cx)?;
                }
                InstancePart::Property(p) => {
                    let slice: Vec<Value> =
                        values.by_ref().take(p.value_count()).collect();
                    p.commit(slice, cx)?;
                }
            }
        }
        Ok(())
    }

    /// Top-down connection propagation across every part, in document
    /// order.
    pub(crate) fn set_connected(&mut self, connected: bool) {
        for part in self.parts.iter_mut() {
            part.set_connected(connected);
        }
    }
}
