//! The directive protocol.
//!
//! A directive is a stateful value producer bound into a part. The part
//! keeps one instance alive for as long as the same directive class keeps
//! arriving at that location; the instance sees every commit and receives
//! synchronous connection-state notifications when its host subtree
//! leaves or re-enters the tree.

use std::any::TypeId;
use std::fmt;

use bitflags::bitflags;
use lit_dom::{Document, NodeId};

use crate::error::TemplateError;
use crate::part::ChildPart;
use crate::render::RenderContext;
use crate::value::Value;

bitflags! {
    /// Part kinds a directive declares compatibility with.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PartKinds: u8 {
        const CHILD = 1 << 0;
        const ATTRIBUTE = 1 << 1;
        const PROPERTY = 1 << 2;
        const BOOLEAN_ATTRIBUTE = 1 << 3;
        const EVENT = 1 << 4;
        const ELEMENT = 1 << 5;
    }
}

/// Custom per-part logic run on every commit.
///
/// `render` produces the value the part commits; `update` may instead
/// manipulate the part directly (keyed lists do) and return
/// [`Value::NoChange`] to suppress the part's own re-render while still
/// being tracked for connection notifications.
pub trait Directive {
    fn update(
        &mut self,
        part: &mut BoundPart<'_, '_>,
        args: Vec<Value>,
    ) -> Result<Value, TemplateError> {
        let _ = part;
        self.render(args)
    }

    fn render(&mut self, args: Vec<Value>) -> Result<Value, TemplateError>;

    /// Synchronous notification that the host subtree was disconnected
    /// (`false`) or reconnected (`true`).
    fn connection_changed(&mut self, connected: bool) {
        let _ = connected;
    }
}

/// Declaration metadata for a directive implementation.
pub trait DirectiveClass: Directive + Default + 'static {
    const NAME: &'static str;
    const COMPATIBLE: PartKinds;
}

/// The value form of a directive invocation: class identity, part-kind
/// compatibility, a constructor, and this render's arguments.
#[derive(Clone)]
pub struct DirectiveSpec {
    name: &'static str,
    type_id: TypeId,
    compatible: PartKinds,
    ctor: fn() -> Box<dyn Directive>,
    args: Vec<Value>,
}

impl DirectiveSpec {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn compatible(&self) -> PartKinds {
        self.compatible
    }
}

impl fmt::Debug for DirectiveSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectiveSpec")
            .field("name", &self.name)
            .field("args", &self.args.len())
            .finish()
    }
}

fn construct<D: DirectiveClass>() -> Box<dyn Directive> {
    Box::new(D::default())
}

/// Wrap a directive class and its arguments into a bindable [`Value`].
pub fn directive<D: DirectiveClass>(args: Vec<Value>) -> Value {
    Value::Directive(DirectiveSpec {
        name: D::NAME,
        type_id: TypeId::of::<D>(),
        compatible: D::COMPATIBLE,
        ctor: construct::<D>,
        args,
    })
}

/// A live directive bound to one part position.
pub(crate) struct DirectiveInstance {
    name: &'static str,
    type_id: TypeId,
    inner: Box<dyn Directive>,
    /// A directive returned by this one, persisted per level.
    child: Option<Box<DirectiveInstance>>,
    connected: bool,
}

impl fmt::Debug for DirectiveInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectiveInstance")
            .field("name", &self.name)
            .field("connected", &self.connected)
            .finish()
    }
}

impl DirectiveInstance {
    fn create(spec: &DirectiveSpec, connected: bool) -> DirectiveInstance {
        DirectiveInstance {
            name: spec.name,
            type_id: spec.type_id,
            inner: (spec.ctor)(),
            child: None,
            connected,
        }
    }

    /// Propagate a connection-state change, this level before the chained
    /// child, skipping levels already in the target state.
    pub(crate) fn set_connected(&mut self, connected: bool) {
        if self.connected != connected {
            self.connected = connected;
            self.inner.connection_changed(connected);
        }
        if let Some(child) = &mut self.child {
            child.set_connected(connected);
        }
    }
}

/// Resolve a value through the directive protocol for one part position.
///
/// `slot` is the position's persisted instance (taken out of the part for
/// the duration of the call); the returned slot replaces it. A
/// non-directive value destroys whatever instance was there; a directive
/// of a different class replaces the instance; the same class is reused
/// and updated in place. Directive-returning directives chain through the
/// instance's `child` slot.
pub(crate) fn resolve_value(
    slot: Option<DirectiveInstance>,
    value: Value,
    part: &mut BoundPart<'_, '_>,
) -> Result<(Option<DirectiveInstance>, Value), TemplateError> {
    match value {
        Value::Directive(spec) => {
            if !spec.compatible.contains(part.kind()) {
                return Err(TemplateError::IncompatibleDirective {
                    name: spec.name,
                    part: part.kind_name(),
                });
            }
            let mut instance = match slot {
                Some(instance) if instance.type_id == spec.type_id => instance,
                other => {
                    destroy(other);
                    DirectiveInstance::create(&spec, part.connected())
                }
            };
            let produced = instance.inner.update(part, spec.args)?;
            let child = instance.child.take().map(|boxed| *boxed);
            let (child, resolved) = match produced {
                Value::NoChange => (child, Value::NoChange),
                other => resolve_value(child, other, part)?,
            };
            instance.child = child.map(Box::new);
            Ok((Some(instance), resolved))
        }
        other => {
            destroy(slot);
            Ok((None, other))
        }
    }
}

/// Terminal state: disconnect, then drop.
pub(crate) fn destroy(slot: Option<DirectiveInstance>) {
    if let Some(mut instance) = slot {
        instance.set_connected(false);
    }
}

/// The part a directive is bound to, as seen from inside the directive.
pub struct BoundPart<'a, 'cx> {
    pub(crate) cx: &'a mut RenderContext<'cx>,
    pub(crate) binding: Binding<'a>,
}

pub(crate) enum Binding<'a> {
    Child(&'a mut ChildPart),
    Attribute { element: NodeId, name: &'a str },
    Property { element: NodeId, name: &'a str },
    Boolean { element: NodeId, name: &'a str },
    Event { element: NodeId, name: &'a str },
    Element { element: NodeId },
}

impl<'a, 'cx> BoundPart<'a, 'cx> {
    pub fn kind(&self) -> PartKinds {
        match self.binding {
            Binding::Child(_) => PartKinds::CHILD,
            Binding::Attribute { .. } => PartKinds::ATTRIBUTE,
            Binding::Property { .. } => PartKinds::PROPERTY,
            Binding::Boolean { .. } => PartKinds::BOOLEAN_ATTRIBUTE,
            Binding::Event { .. } => PartKinds::EVENT,
            Binding::Element { .. } => PartKinds::ELEMENT,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self.binding {
            Binding::Child(_) => "child",
            Binding::Attribute { .. } => "attribute",
            Binding::Property { .. } => "property",
            Binding::Boolean { .. } => "boolean-attribute",
            Binding::Event { .. } => "event",
            Binding::Element { .. } => "element",
        }
    }

    /// The bound element, for everything but child positions.
    pub fn element(&self) -> Option<NodeId> {
        match self.binding {
            Binding::Child(_) => None,
            Binding::Attribute { element, .. }
            | Binding::Property { element, .. }
            | Binding::Boolean { element, .. }
            | Binding::Event { element, .. }
            | Binding::Element { element } => Some(element),
        }
    }

    /// The bound attribute/property/event name, where one exists.
    pub fn name(&self) -> Option<&str> {
        match self.binding {
            Binding::Attribute { name, .. }
            | Binding::Property { name, .. }
            | Binding::Boolean { name, .. }
            | Binding::Event { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn doc(&mut self) -> &mut Document {
        self.cx.doc
    }

    pub fn connected(&self) -> bool {
        self.cx.connected
    }

    /// Number of item parts currently managed by this child position.
    pub fn item_count(&self) -> usize {
        match &self.binding {
            Binding::Child(part) => part.item_count(),
            _ => 0,
        }
    }

    /// Commit a value to the item part at `index`.
    pub fn commit_item(&mut self, index: usize, value: Value) -> Result<(), TemplateError> {
        let Binding::Child(part) = &mut self.binding else {
            return Err(TemplateError::ChildBindingRequired);
        };
        part.commit_item(self.cx, index, value)
    }

    /// Create an empty item part at `index`, shifting later items.
    pub fn insert_item(&mut self, index: usize) -> Result<(), TemplateError> {
        let Binding::Child(part) = &mut self.binding else {
            return Err(TemplateError::ChildBindingRequired);
        };
        part.insert_item(self.cx, index)
    }

    /// Tear down and remove the item part at `index`.
    pub fn remove_item(&mut self, index: usize) -> Result<(), TemplateError> {
        let Binding::Child(part) = &mut self.binding else {
            return Err(TemplateError::ChildBindingRequired);
        };
        part.remove_item(self.cx, index)
    }

    /// Move the item part at `from` so it sits at `to`, relocating its
    /// DOM range without recreating it.
    pub fn move_item(&mut self, from: usize, to: usize) -> Result<(), TemplateError> {
        let Binding::Child(part) = &mut self.binding else {
            return Err(TemplateError::ChildBindingRequired);
        };
        part.move_item(self.cx, from, to)
    }

    /// Clear everything committed at this child position.
    pub fn clear_children(&mut self) -> Result<(), TemplateError> {
        let Binding::Child(part) = &mut self.binding else {
            return Err(TemplateError::ChildBindingRequired);
        };
        part.clear(self.cx);
        Ok(())
    }

    /// Parse raw markup and splice the resulting nodes into this child
    /// position. This is the sanctioned unsafe path; ordinary text values
    /// are never interpreted as markup.
    pub fn insert_markup(&mut self, markup: &str) -> Result<(), TemplateError> {
        let Binding::Child(part) = &mut self.binding else {
            return Err(TemplateError::ChildBindingRequired);
        };
        part.insert_markup(self.cx, markup)
    }
}
