//! Event listener registry and capture/bubble dispatch.

use std::fmt;
use std::rc::Rc;

use smallvec::SmallVec;

use crate::{Document, NodeId};

/// Options a listener is registered with.
///
/// Two registrations of the same callback with different options are
/// different listeners; the engine diffs on both.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListenerOptions {
    /// Invoke during the capture phase (ancestors before target).
    pub capture: bool,
    /// Remove the listener after its first invocation.
    pub once: bool,
    /// Marker only; the document has no default actions to suppress.
    pub passive: bool,
}

/// A dispatched event, handed by reference to each listener.
#[derive(Debug, Clone)]
pub struct Event {
    pub name: String,
    pub target: NodeId,
    pub current_target: NodeId,
}

/// A callback plus registration options.
///
/// Identity is the `Rc` pointer: cloning an `EventListener` yields the
/// same listener, constructing a new one from an identical closure does
/// not.
#[derive(Clone)]
pub struct EventListener {
    pub(crate) callback: Rc<dyn Fn(&Event)>,
    pub(crate) options: ListenerOptions,
}

impl EventListener {
    pub fn new(callback: Rc<dyn Fn(&Event)>, options: ListenerOptions) -> Self {
        EventListener { callback, options }
    }

    pub fn from_fn(callback: impl Fn(&Event) + 'static) -> Self {
        EventListener {
            callback: Rc::new(callback),
            options: ListenerOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ListenerOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> ListenerOptions {
        self.options
    }

    /// Same callback identity and same options.
    pub fn same_registration(&self, other: &EventListener) -> bool {
        Rc::ptr_eq(&self.callback, &other.callback) && self.options == other.options
    }
}

impl fmt::Debug for EventListener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventListener")
            .field("callback", &Rc::as_ptr(&self.callback))
            .field("options", &self.options)
            .finish()
    }
}

/// Handle identifying one registration on one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

#[derive(Debug, Clone)]
pub(crate) struct ListenerEntry {
    pub(crate) id: ListenerId,
    pub(crate) event: String,
    pub(crate) listener: EventListener,
}

impl Document {
    /// Register a listener for `event` on `target`.
    pub fn add_event_listener(
        &mut self,
        target: NodeId,
        event: &str,
        listener: EventListener,
    ) -> ListenerId {
        let id = ListenerId(self.next_listener_id);
        self.next_listener_id += 1;
        self.listeners.entry(target).or_default().push(ListenerEntry {
            id,
            event: event.to_string(),
            listener,
        });
        self.count_listener_add();
        id
    }

    /// Remove a registration by handle. Returns whether it was present.
    pub fn remove_event_listener(&mut self, target: NodeId, id: ListenerId) -> bool {
        let Some(entries) = self.listeners.get_mut(&target) else {
            return false;
        };
        let before = entries.len();
        entries.retain(|e| e.id != id);
        let removed = entries.len() != before;
        if removed {
            self.count_listener_remove();
        }
        removed
    }

    /// Number of listeners registered for `event` on `target`.
    pub fn listener_count(&self, target: NodeId, event: &str) -> usize {
        self.listeners
            .get(&target)
            .map(|entries| entries.iter().filter(|e| e.event == event).count())
            .unwrap_or(0)
    }

    /// Dispatch an event at `target`: capture phase from the root down,
    /// then target and bubble phase back up. Returns the number of
    /// listeners invoked.
    ///
    /// Listeners are snapshotted per node before invocation, so a callback
    /// that mutates registrations does not affect the in-flight dispatch.
    pub fn dispatch_event(&mut self, target: NodeId, event: &str) -> usize {
        let mut path = Vec::new();
        let mut cursor = Some(target);
        while let Some(id) = cursor {
            path.push(id);
            cursor = self.parent(id);
        }

        let mut invoked = 0;
        // Capture: ancestors root-first, excluding the target.
        for &node in path.iter().skip(1).rev() {
            invoked += self.invoke_listeners(node, target, event, Some(true));
        }
        // At the target, capture and bubble listeners fire together in
        // registration order.
        invoked += self.invoke_listeners(target, target, event, None);
        // Bubble: ancestors target-side first.
        for &node in path.iter().skip(1) {
            invoked += self.invoke_listeners(node, target, event, Some(false));
        }
        invoked
    }

    fn invoke_listeners(
        &mut self,
        node: NodeId,
        target: NodeId,
        event: &str,
        capture: Option<bool>,
    ) -> usize {
        let snapshot: SmallVec<[ListenerEntry; 2]> = match self.listeners.get(&node) {
            Some(entries) => entries
                .iter()
                .filter(|e| {
                    e.event == event
                        && capture.is_none_or(|phase| e.listener.options.capture == phase)
                })
                .cloned()
                .collect(),
            None => return 0,
        };

        let mut invoked = 0;
        for entry in snapshot {
            // A once-listener may already have been removed by an earlier
            // callback in this dispatch.
            let still_there = self
                .listeners
                .get(&node)
                .is_some_and(|entries| entries.iter().any(|e| e.id == entry.id));
            if !still_there {
                continue;
            }
            if entry.listener.options.once {
                self.remove_event_listener(node, entry.id);
            }
            let ev = Event {
                name: event.to_string(),
                target,
                current_target: node,
            };
            (entry.listener.callback)(&ev);
            invoked += 1;
        }
        invoked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn bubble_order_is_target_first() {
        let mut doc = Document::new();
        let outer = doc.create_element("div");
        let inner = doc.create_element("span");
        doc.append_child(outer, inner);

        let log = Rc::new(RefCell::new(Vec::new()));
        let l1 = log.clone();
        doc.add_event_listener(
            inner,
            "click",
            EventListener::from_fn(move |_| l1.borrow_mut().push("inner")),
        );
        let l2 = log.clone();
        doc.add_event_listener(
            outer,
            "click",
            EventListener::from_fn(move |_| l2.borrow_mut().push("outer")),
        );

        assert_eq!(doc.dispatch_event(inner, "click"), 2);
        assert_eq!(*log.borrow(), vec!["inner", "outer"]);
    }

    #[test]
    fn capture_listeners_run_before_target() {
        let mut doc = Document::new();
        let outer = doc.create_element("div");
        let inner = doc.create_element("span");
        doc.append_child(outer, inner);

        let log = Rc::new(RefCell::new(Vec::new()));
        let l1 = log.clone();
        doc.add_event_listener(
            outer,
            "click",
            EventListener::from_fn(move |_| l1.borrow_mut().push("capture"))
                .with_options(ListenerOptions {
                    capture: true,
                    ..Default::default()
                }),
        );
        let l2 = log.clone();
        doc.add_event_listener(
            inner,
            "click",
            EventListener::from_fn(move |_| l2.borrow_mut().push("target")),
        );

        doc.dispatch_event(inner, "click");
        assert_eq!(*log.borrow(), vec!["capture", "target"]);
    }

    #[test]
    fn once_listener_fires_a_single_time() {
        let mut doc = Document::new();
        let el = doc.create_element("button");
        let hits = Rc::new(RefCell::new(0));
        let h = hits.clone();
        doc.add_event_listener(
            el,
            "click",
            EventListener::from_fn(move |_| *h.borrow_mut() += 1).with_options(ListenerOptions {
                once: true,
                ..Default::default()
            }),
        );

        doc.dispatch_event(el, "click");
        doc.dispatch_event(el, "click");
        assert_eq!(*hits.borrow(), 1);
        assert_eq!(doc.listener_count(el, "click"), 0);
    }
}
