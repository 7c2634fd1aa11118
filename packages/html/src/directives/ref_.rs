//! Element reference binding.
//!
//! `ref_` populates an external holder (or callback) with the element a
//! template binding landed on. The sink only fires when the element
//! identity or the sink itself changes, is cleared on disconnect, and is
//! restored on reconnect.

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use lit_dom::NodeId;

use crate::directive::{directive, BoundPart, Directive, DirectiveClass, PartKinds};
use crate::error::TemplateError;
use crate::value::Value;

/// Shared holder for the element a `ref_` binding captured.
#[derive(Debug, Clone, Default)]
pub struct ElementRef {
    inner: Rc<RefCell<Option<NodeId>>>,
}

impl ElementRef {
    pub fn new() -> Self {
        ElementRef::default()
    }

    pub fn get(&self) -> Option<NodeId> {
        *self.inner.borrow()
    }

    fn set(&self, value: Option<NodeId>) {
        *self.inner.borrow_mut() = value;
    }

    fn same(&self, other: &ElementRef) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

/// Create a fresh [`ElementRef`].
pub fn create_ref() -> ElementRef {
    ElementRef::new()
}

enum RefSink {
    Holder(ElementRef),
    Callback(Rc<dyn Fn(Option<NodeId>)>),
}

impl RefSink {
    fn set(&self, value: Option<NodeId>) {
        match self {
            RefSink::Holder(holder) => holder.set(value),
            RefSink::Callback(callback) => callback(value),
        }
    }

    fn same(&self, other: &RefSink) -> bool {
        match (self, other) {
            (RefSink::Holder(a), RefSink::Holder(b)) => a.same(b),
            (RefSink::Callback(a), RefSink::Callback(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// Bind an [`ElementRef`] to the hosting element.
pub fn ref_(holder: &ElementRef) -> Value {
    directive::<RefDirective>(vec![Value::Object(Rc::new(RefSink::Holder(holder.clone())))])
}

/// Bind a callback invoked with the hosting element (and with `None` on
/// disconnect). Keep the `Rc` stable across renders to avoid re-firing.
pub fn ref_callback(callback: Rc<dyn Fn(Option<NodeId>)>) -> Value {
    directive::<RefDirective>(vec![Value::Object(Rc::new(RefSink::Callback(callback)))])
}

#[derive(Default)]
pub struct RefDirective {
    sink: Option<Rc<RefSink>>,
    element: Option<NodeId>,
}

impl Directive for RefDirective {
    fn update(
        &mut self,
        part: &mut BoundPart<'_, '_>,
        args: Vec<Value>,
    ) -> Result<Value, TemplateError> {
        let element = part
            .element()
            .expect("element bindings always carry an element");
        let arg = args
            .into_iter()
            .next()
            .ok_or(TemplateError::DirectiveArguments { name: Self::NAME })?;
        let Value::Object(object) = arg else {
            return Err(TemplateError::DirectiveArguments { name: Self::NAME });
        };
        let sink: Rc<RefSink> = object
            .downcast()
            .map_err(|_: Rc<dyn Any>| TemplateError::DirectiveArguments { name: Self::NAME })?;

        let unchanged = self.element == Some(element)
            && self.sink.as_ref().is_some_and(|old| old.same(&sink));
        if !unchanged {
            sink.set(Some(element));
            self.element = Some(element);
            self.sink = Some(sink);
        }
        Ok(Value::NoChange)
    }

    fn render(&mut self, _args: Vec<Value>) -> Result<Value, TemplateError> {
        Ok(Value::NoChange)
    }

    fn connection_changed(&mut self, connected: bool) {
        if let Some(sink) = &self.sink {
            sink.set(if connected { self.element } else { None });
        }
    }
}

impl DirectiveClass for RefDirective {
    const NAME: &'static str = "ref";
    const COMPATIBLE: PartKinds = PartKinds::ELEMENT;
}
