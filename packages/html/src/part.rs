//! Parts: the atomic update units.
//!
//! Every part stores what it last committed and touches the document only
//! when the incoming value differs. A `ChildPart` owns the sibling range
//! between its two markers and everything committed into it; attribute,
//! property, boolean, event and element parts own one binding position on
//! one element. No part ever touches nodes outside its own range.

use lit_dom::{parse_fragment, EventListener, ListenerId, Namespace, NodeId};
use tracing::trace;

use crate::directive::{destroy, resolve_value, Binding, BoundPart, DirectiveInstance};
use crate::error::TemplateError;
use crate::instance::TemplateInstance;
use crate::render::RenderContext;
use crate::template_result::TemplateResult;
use crate::value::Value;

/// What a child part currently holds between its markers.
#[derive(Debug, Default)]
enum CommittedChild {
    #[default]
    None,
    Text {
        node: NodeId,
        content: String,
    },
    Instance(Box<TemplateInstance>),
    Items(Vec<ChildPart>),
}

/// A part managing the sibling range between a start marker and an
/// optional end boundary (`None` = to the end of the parent).
#[derive(Debug)]
pub struct ChildPart {
    start: NodeId,
    end: Option<NodeId>,
    committed: CommittedChild,
    directive: Option<DirectiveInstance>,
    connected: bool,
}

impl ChildPart {
    pub(crate) fn new(start: NodeId, end: Option<NodeId>, connected: bool) -> Self {
        ChildPart {
            start,
            end,
            committed: CommittedChild::None,
            directive: None,
            connected,
        }
    }

    pub(crate) fn start(&self) -> NodeId {
        self.start
    }

    pub(crate) fn connected(&self) -> bool {
        self.connected
    }

    /// Commit a value, diffing against the previous commit.
    pub(crate) fn commit(
        &mut self,
        value: Value,
        cx: &mut RenderContext<'_>,
    ) -> Result<(), TemplateError> {
        let resolved = {
            let slot = self.directive.take();
            let mut bound = BoundPart {
                cx: &mut *cx,
                binding: Binding::Child(&mut *self),
            };
            let (slot, resolved) = resolve_value(slot, value, &mut bound)?;
            self.directive = slot;
            resolved
        };

        match resolved {
            Value::NoChange => Ok(()),
            Value::Nothing | Value::Null => {
                self.clear(cx);
                Ok(())
            }
            Value::Template(result) => self.commit_template(result, cx),
            Value::List(items) => self.commit_items(items, cx),
            v @ (Value::Text(_) | Value::Int(_) | Value::Float(_) | Value::Bool(_)) => {
                let text = v.to_text().expect("primitive variants have a text form");
                self.commit_text(text, cx);
                Ok(())
            }
            v => Err(TemplateError::IncompatibleValue {
                part: "child",
                value: v.kind_name(),
            }),
        }
    }

    fn parent(&self, cx: &RenderContext<'_>) -> NodeId {
        cx.doc
            .parent(self.start)
            .expect("a part's start marker is always attached")
    }

    fn commit_text(&mut self, text: String, cx: &mut RenderContext<'_>) {
        if let CommittedChild::Text { node, content } = &mut self.committed {
            // Equal primitives are a no-op: zero writes.
            if *content != text {
                cx.doc.set_text(*node, &text);
                *content = text;
            }
            return;
        }
        self.clear(cx);
        let node = cx.doc.create_text(&text);
        let parent = self.parent(cx);
        cx.doc.insert_before(parent, node, self.end);
        self.committed = CommittedChild::Text {
            node,
            content: text,
        };
    }

    fn commit_template(
        &mut self,
        result: TemplateResult,
        cx: &mut RenderContext<'_>,
    ) -> Result<(), TemplateError> {
        let scope = cx.scope.clone();
        let template = cx.cache.get_or_prepare(&result, scope.as_deref())?;

        if let CommittedChild::Instance(instance) = &mut self.committed {
            if instance.same_template(&template) {
                // Structural reuse: re-commit the live parts, no node churn.
                trace!("template reuse");
                return instance.commit(result.take_values(), cx);
            }
        }

        self.clear(cx);
        let (mut instance, top_nodes) = TemplateInstance::instantiate(template, cx, self.end);
        let parent = self.parent(cx);
        for node in top_nodes {
            cx.doc.insert_before(parent, node, self.end);
        }
        instance.commit(result.take_values(), cx)?;
        self.committed = CommittedChild::Instance(Box::new(instance));
        Ok(())
    }

    fn commit_items(
        &mut self,
        items: Vec<Value>,
        cx: &mut RenderContext<'_>,
    ) -> Result<(), TemplateError> {
        let target = items.len();
        self.ensure_items(cx);

        let start = self.start;
        let end = self.end;
        let connected = self.connected;
        let CommittedChild::Items(parts) = &mut self.committed else {
            unreachable!("ensure_items just set list mode");
        };

        for (i, item) in items.into_iter().enumerate() {
            if i < parts.len() {
                parts[i].commit(item, cx)?;
            } else {
                let parent = cx
                    .doc
                    .parent(start)
                    .expect("a part's start marker is always attached");
                let m1 = cx.doc.create_comment("");
                let m2 = cx.doc.create_comment("");
                cx.doc.insert_before(parent, m1, end);
                cx.doc.insert_before(parent, m2, end);
                let mut part = ChildPart::new(m1, Some(m2), connected);
                part.commit(item, cx)?;
                parts.push(part);
            }
        }

        while parts.len() > target {
            let mut part = parts.pop().expect("length checked above");
            part.remove_including_markers(cx);
        }
        Ok(())
    }

    fn ensure_items(&mut self, cx: &mut RenderContext<'_>) {
        if !matches!(self.committed, CommittedChild::Items(_)) {
            self.clear(cx);
            self.committed = CommittedChild::Items(Vec::new());
        }
    }

    /// Remove everything between the markers and notify directives in the
    /// discarded content that they are going away.
    pub(crate) fn clear(&mut self, cx: &mut RenderContext<'_>) {
        match &mut self.committed {
            CommittedChild::Instance(instance) => instance.set_connected(false),
            CommittedChild::Items(parts) => {
                for part in parts.iter_mut() {
                    part.set_connected(false);
                }
            }
            _ => {}
        }
        self.committed = CommittedChild::None;

        let mut cursor = cx.doc.next_sibling(self.start);
        while cursor != self.end {
            let Some(node) = cursor else { break };
            let next = cx.doc.next_sibling(node);
            cx.doc.remove(node);
            cursor = next;
        }
    }

    /// Teardown for item parts: clear, then remove the markers too.
    fn remove_including_markers(&mut self, cx: &mut RenderContext<'_>) {
        self.set_connected(false);
        if let Some(directive) = self.directive.take() {
            destroy(Some(directive));
        }
        let end = self.end;
        let mut cursor = Some(self.start);
        while let Some(node) = cursor {
            let next = cx.doc.next_sibling(node);
            cx.doc.remove(node);
            if Some(node) == end {
                break;
            }
            cursor = next;
        }
    }

    /// Propagate a connection-state change: this part's directive first,
    /// then committed content in document order.
    pub(crate) fn set_connected(&mut self, connected: bool) {
        if self.connected == connected {
            return;
        }
        self.connected = connected;
        if let Some(directive) = &mut self.directive {
            directive.set_connected(connected);
        }
        match &mut self.committed {
            CommittedChild::Instance(instance) => instance.set_connected(connected),
            CommittedChild::Items(parts) => {
                for part in parts.iter_mut() {
                    part.set_connected(connected);
                }
            }
            _ => {}
        }
    }

    // ---- item operations used by list-managing directives -----------------

    pub(crate) fn item_count(&self) -> usize {
        match &self.committed {
            CommittedChild::Items(parts) => parts.len(),
            _ => 0,
        }
    }

    pub(crate) fn commit_item(
        &mut self,
        cx: &mut RenderContext<'_>,
        index: usize,
        value: Value,
    ) -> Result<(), TemplateError> {
        let CommittedChild::Items(parts) = &mut self.committed else {
            return Err(TemplateError::InvalidItemOperation);
        };
        let Some(part) = parts.get_mut(index) else {
            return Err(TemplateError::InvalidItemOperation);
        };
        part.commit(value, cx)
    }

    pub(crate) fn insert_item(
        &mut self,
        cx: &mut RenderContext<'_>,
        index: usize,
    ) -> Result<(), TemplateError> {
        self.ensure_items(cx);
        let start = self.start;
        let end = self.end;
        let connected = self.connected;
        let CommittedChild::Items(parts) = &mut self.committed else {
            unreachable!("ensure_items just set list mode");
        };
        if index > parts.len() {
            return Err(TemplateError::InvalidItemOperation);
        }
        let before = if index == parts.len() {
            end
        } else {
            Some(parts[index].start)
        };
        let parent = cx
            .doc
            .parent(start)
            .expect("a part's start marker is always attached");
        let m1 = cx.doc.create_comment("");
        let m2 = cx.doc.create_comment("");
        cx.doc.insert_before(parent, m1, before);
        cx.doc.insert_before(parent, m2, before);
        parts.insert(index, ChildPart::new(m1, Some(m2), connected));
        Ok(())
    }

    pub(crate) fn remove_item(
        &mut self,
        cx: &mut RenderContext<'_>,
        index: usize,
    ) -> Result<(), TemplateError> {
        let CommittedChild::Items(parts) = &mut self.committed else {
            return Err(TemplateError::InvalidItemOperation);
        };
        if index >= parts.len() {
            return Err(TemplateError::InvalidItemOperation);
        }
        let mut part = parts.remove(index);
        part.remove_including_markers(cx);
        Ok(())
    }

    /// Relocate the item at `from` to sit at `to`, moving its DOM range.
    pub(crate) fn move_item(
        &mut self,
        cx: &mut RenderContext<'_>,
        from: usize,
        to: usize,
    ) -> Result<(), TemplateError> {
        let end = self.end;
        let CommittedChild::Items(parts) = &mut self.committed else {
            return Err(TemplateError::InvalidItemOperation);
        };
        if from >= parts.len() || to >= parts.len() {
            return Err(TemplateError::InvalidItemOperation);
        }
        if from == to {
            return Ok(());
        }
        let part = parts.remove(from);
        let before = if to == parts.len() {
            end
        } else {
            Some(parts[to].start)
        };
        let parent = cx
            .doc
            .parent(part.start)
            .expect("a part's start marker is always attached");
        let last = part.end.expect("item parts always have an end marker");
        cx.doc.move_range(parent, part.start, last, before);
        parts.insert(to, part);
        Ok(())
    }

    /// Parse markup and splice the nodes into this range. Only reachable
    /// through the sanctioned unsafe directive path.
    pub(crate) fn insert_markup(
        &mut self,
        cx: &mut RenderContext<'_>,
        markup: &str,
    ) -> Result<(), TemplateError> {
        let parent = self.parent(cx);
        let namespace = cx
            .doc
            .node(parent)
            .as_element()
            .map(|e| e.namespace())
            .unwrap_or(Namespace::Html);
        let fragment = parse_fragment(cx.doc, markup, namespace)?;
        for child in cx.doc.children(fragment) {
            cx.doc.insert_before(parent, child, self.end);
        }
        Ok(())
    }
}

/// Serialized string attribute; possibly several interpolations joined
/// with static text.
#[derive(Debug)]
pub(crate) struct AttributePart {
    element: NodeId,
    name: String,
    statics: Vec<String>,
    committed: Vec<Value>,
    committed_once: bool,
    directives: Vec<Option<DirectiveInstance>>,
}

impl AttributePart {
    pub(crate) fn new(element: NodeId, name: String, statics: Vec<String>) -> Self {
        let slots = statics.len() - 1;
        AttributePart {
            element,
            name,
            statics,
            committed: vec![Value::Nothing; slots],
            committed_once: false,
            directives: (0..slots).map(|_| None).collect(),
        }
    }

    pub(crate) fn value_count(&self) -> usize {
        self.statics.len() - 1
    }

    fn is_single(&self) -> bool {
        self.statics.len() == 2 && self.statics[0].is_empty() && self.statics[1].is_empty()
    }

    pub(crate) fn commit(
        &mut self,
        values: Vec<Value>,
        cx: &mut RenderContext<'_>,
    ) -> Result<(), TemplateError> {
        debug_assert_eq!(values.len(), self.value_count());
        let mut changed = false;

        for (i, value) in values.into_iter().enumerate() {
            let slot = self.directives[i].take();
            let mut bound = BoundPart {
                cx: &mut *cx,
                binding: Binding::Attribute {
                    element: self.element,
                    name: &self.name,
                },
            };
            let (slot, resolved) = resolve_value(slot, value, &mut bound)?;
            self.directives[i] = slot;

            match resolved {
                Value::NoChange => {}
                v => {
                    if !matches!(v, Value::Nothing | Value::Null) && v.to_text().is_none() {
                        return Err(TemplateError::IncompatibleValue {
                            part: "attribute",
                            value: v.kind_name(),
                        });
                    }
                    if !v.strict_eq(&self.committed[i]) {
                        self.committed[i] = v;
                        changed = true;
                    }
                }
            }
        }

        // The first commit must establish the attribute even if every
        // slot stayed at its initial state, so static fragments around
        // absent values are not lost.
        if !changed && self.committed_once {
            return Ok(());
        }
        self.committed_once = true;

        if self.is_single() {
            match &self.committed[0] {
                Value::Nothing | Value::Null => cx.doc.remove_attribute(self.element, &self.name),
                v => {
                    let text = v.to_text().expect("validated above");
                    cx.doc.set_attribute(self.element, &self.name, &text);
                }
            }
            return Ok(());
        }

        // Reconstruct the full value from statics and committed slots;
        // exactly one attribute write.
        let mut out = String::new();
        for (i, fragment) in self.statics.iter().enumerate() {
            out.push_str(fragment);
            if let Some(v) = self.committed.get(i) {
                if let Some(text) = v.to_text() {
                    out.push_str(&text);
                }
            }
        }
        cx.doc.set_attribute(self.element, &self.name, &out);
        Ok(())
    }

    pub(crate) fn set_connected(&mut self, connected: bool) {
        for directive in self.directives.iter_mut().flatten() {
            directive.set_connected(connected);
        }
    }
}

/// Direct property assignment; strict identity diffing, no string
/// round-trip for single bindings.
#[derive(Debug)]
pub(crate) struct PropertyPart {
    element: NodeId,
    name: String,
    statics: Vec<String>,
    committed: Vec<Value>,
    committed_once: bool,
    directives: Vec<Option<DirectiveInstance>>,
}

impl PropertyPart {
    pub(crate) fn new(element: NodeId, name: String, statics: Vec<String>) -> Self {
        let slots = statics.len() - 1;
        PropertyPart {
            element,
            name,
            statics,
            committed: vec![Value::Nothing; slots],
            committed_once: false,
            directives: (0..slots).map(|_| None).collect(),
        }
    }

    pub(crate) fn value_count(&self) -> usize {
        self.statics.len() - 1
    }

    fn is_single(&self) -> bool {
        self.statics.len() == 2 && self.statics[0].is_empty() && self.statics[1].is_empty()
    }

    pub(crate) fn commit(
        &mut self,
        values: Vec<Value>,
        cx: &mut RenderContext<'_>,
    ) -> Result<(), TemplateError> {
        debug_assert_eq!(values.len(), self.value_count());
        let mut changed = false;

        for (i, value) in values.into_iter().enumerate() {
            let slot = self.directives[i].take();
            let mut bound = BoundPart {
                cx: &mut *cx,
                binding: Binding::Property {
                    element: self.element,
                    name: &self.name,
                },
            };
            let (slot, resolved) = resolve_value(slot, value, &mut bound)?;
            self.directives[i] = slot;

            match resolved {
                Value::NoChange => {}
                v => {
                    if v.to_property_value().is_none() {
                        return Err(TemplateError::IncompatibleValue {
                            part: "property",
                            value: v.kind_name(),
                        });
                    }
                    if !v.strict_eq(&self.committed[i]) {
                        self.committed[i] = v;
                        changed = true;
                    }
                }
            }
        }

        if !changed && self.committed_once {
            return Ok(());
        }
        self.committed_once = true;

        let property = if self.is_single() {
            self.committed[0]
                .to_property_value()
                .expect("validated above")
        } else {
            let mut out = String::new();
            for (i, fragment) in self.statics.iter().enumerate() {
                out.push_str(fragment);
                if let Some(v) = self.committed.get(i) {
                    if let Some(text) = v.to_text() {
                        out.push_str(&text);
                    }
                }
            }
            lit_dom::PropertyValue::String(out)
        };
        cx.doc.set_property(self.element, &self.name, property);
        Ok(())
    }

    pub(crate) fn set_connected(&mut self, connected: bool) {
        for directive in self.directives.iter_mut().flatten() {
            directive.set_connected(connected);
        }
    }
}

/// Attribute presence toggled by truthiness; never writes a "false"
/// string.
#[derive(Debug)]
pub(crate) struct BooleanAttributePart {
    element: NodeId,
    name: String,
    committed: Value,
    directive: Option<DirectiveInstance>,
}

impl BooleanAttributePart {
    pub(crate) fn new(element: NodeId, name: String) -> Self {
        BooleanAttributePart {
            element,
            name,
            committed: Value::Nothing,
            directive: None,
        }
    }

    pub(crate) fn commit(
        &mut self,
        value: Value,
        cx: &mut RenderContext<'_>,
    ) -> Result<(), TemplateError> {
        let slot = self.directive.take();
        let mut bound = BoundPart {
            cx: &mut *cx,
            binding: Binding::Boolean {
                element: self.element,
                name: &self.name,
            },
        };
        let (slot, resolved) = resolve_value(slot, value, &mut bound)?;
        self.directive = slot;

        let v = match resolved {
            Value::NoChange => return Ok(()),
            v => v,
        };
        if v.strict_eq(&self.committed) {
            return Ok(());
        }
        let was_present = self.committed.is_truthy();
        let present = v.is_truthy();
        self.committed = v;
        if present != was_present {
            if present {
                cx.doc.set_attribute(self.element, &self.name, "");
            } else {
                cx.doc.remove_attribute(self.element, &self.name);
            }
        }
        Ok(())
    }

    pub(crate) fn set_connected(&mut self, connected: bool) {
        if let Some(directive) = &mut self.directive {
            directive.set_connected(connected);
        }
    }
}

/// Event listener registration, diffed on listener identity and options.
#[derive(Debug)]
pub(crate) struct EventPart {
    element: NodeId,
    name: String,
    registered: Option<(EventListener, ListenerId)>,
    directive: Option<DirectiveInstance>,
}

impl EventPart {
    pub(crate) fn new(element: NodeId, name: String) -> Self {
        EventPart {
            element,
            name,
            registered: None,
            directive: None,
        }
    }

    pub(crate) fn commit(
        &mut self,
        value: Value,
        cx: &mut RenderContext<'_>,
    ) -> Result<(), TemplateError> {
        let slot = self.directive.take();
        let mut bound = BoundPart {
            cx: &mut *cx,
            binding: Binding::Event {
                element: self.element,
                name: &self.name,
            },
        };
        let (slot, resolved) = resolve_value(slot, value, &mut bound)?;
        self.directive = slot;

        match resolved {
            Value::NoChange => Ok(()),
            Value::Listener(listener) => {
                if let Some((old, id)) = &self.registered {
                    // Identical registration: no remove/add churn.
                    if old.same_registration(&listener) {
                        return Ok(());
                    }
                    cx.doc.remove_event_listener(self.element, *id);
                }
                let id = cx
                    .doc
                    .add_event_listener(self.element, &self.name, listener.clone());
                self.registered = Some((listener, id));
                Ok(())
            }
            Value::Nothing | Value::Null => {
                if let Some((_, id)) = self.registered.take() {
                    cx.doc.remove_event_listener(self.element, id);
                }
                Ok(())
            }
            v => Err(TemplateError::IncompatibleValue {
                part: "event",
                value: v.kind_name(),
            }),
        }
    }

    pub(crate) fn set_connected(&mut self, connected: bool) {
        if let Some(directive) = &mut self.directive {
            directive.set_connected(connected);
        }
    }
}

/// A directive applied to the element itself; commits no value of its
/// own.
#[derive(Debug)]
pub(crate) struct ElementPart {
    element: NodeId,
    directive: Option<DirectiveInstance>,
}

impl ElementPart {
    pub(crate) fn new(element: NodeId) -> Self {
        ElementPart {
            element,
            directive: None,
        }
    }

    pub(crate) fn commit(
        &mut self,
        value: Value,
        cx: &mut RenderContext<'_>,
    ) -> Result<(), TemplateError> {
        let slot = self.directive.take();
        let mut bound = BoundPart {
            cx: &mut *cx,
            binding: Binding::Element {
                element: self.element,
            },
        };
        let (slot, _resolved) = resolve_value(slot, value, &mut bound)?;
        self.directive = slot;
        Ok(())
    }

    pub(crate) fn set_connected(&mut self, connected: bool) {
        if let Some(directive) = &mut self.directive {
            directive.set_connected(connected);
        }
    }
}
