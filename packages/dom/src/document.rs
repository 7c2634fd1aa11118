//! Arena-backed document tree and its mutation surface.

use std::collections::HashMap;

use smallvec::SmallVec;
use tracing::trace;

use crate::events::ListenerEntry;
use crate::node::{ElementData, Namespace, Node, NodeData, PropertyValue};
use crate::NodeId;

/// Running totals of every mutating call made against a [`Document`].
///
/// The template engine's contract is "no writes when nothing changed";
/// these counters are how that contract is observed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MutationCounters {
    pub node_inserts: u64,
    pub node_removes: u64,
    pub node_moves: u64,
    pub text_writes: u64,
    pub attribute_writes: u64,
    pub attribute_removes: u64,
    pub property_writes: u64,
    pub listener_adds: u64,
    pub listener_removes: u64,
}

impl MutationCounters {
    /// Sum of all counters, for coarse "did anything happen" checks.
    pub fn total(&self) -> u64 {
        self.node_inserts
            + self.node_removes
            + self.node_moves
            + self.text_writes
            + self.attribute_writes
            + self.attribute_removes
            + self.property_writes
            + self.listener_adds
            + self.listener_removes
    }
}

/// An arena of nodes forming one or more trees.
///
/// Node slots are never reused: a [`NodeId`] handed out stays valid for
/// the document's lifetime, which lets the engine hold ids across renders
/// without generation counters. Removed subtrees are unlinked, not freed.
#[derive(Debug, Default)]
pub struct Document {
    nodes: Vec<Node>,
    pub(crate) listeners: HashMap<NodeId, SmallVec<[ListenerEntry; 2]>>,
    pub(crate) next_listener_id: u64,
    counters: MutationCounters,
}

impl Document {
    pub fn new() -> Self {
        Document::default()
    }

    fn alloc(&mut self, data: NodeData) -> NodeId {
        let id = NodeId::new(self.nodes.len());
        self.nodes.push(Node::new(data));
        id
    }

    /// Create a detached HTML element.
    pub fn create_element(&mut self, tag_name: &str) -> NodeId {
        self.create_element_ns(tag_name, Namespace::Html)
    }

    /// Create a detached element in the given namespace.
    pub fn create_element_ns(&mut self, tag_name: &str, namespace: Namespace) -> NodeId {
        self.alloc(NodeData::Element(ElementData::new(
            tag_name.to_string(),
            namespace,
        )))
    }

    /// Create a detached text node.
    pub fn create_text(&mut self, content: &str) -> NodeId {
        self.alloc(NodeData::Text(content.to_string()))
    }

    /// Create a detached comment node.
    pub fn create_comment(&mut self, content: &str) -> NodeId {
        self.alloc(NodeData::Comment(content.to_string()))
    }

    /// Create a parentless container node.
    pub fn create_fragment(&mut self) -> NodeId {
        self.alloc(NodeData::Fragment)
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).first_child
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).next_sibling
    }

    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).prev_sibling
    }

    /// Child ids of `parent`, first to last.
    pub fn children(&self, parent: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut cursor = self.node(parent).first_child;
        while let Some(id) = cursor {
            out.push(id);
            cursor = self.node(id).next_sibling;
        }
        out
    }

    /// Pre-order walk of everything below `root`, excluding `root` itself.
    ///
    /// This ordering is the engine's binding-index ordering: template
    /// preparation and instance construction both walk with it.
    pub fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(root);
        stack.reverse();
        while let Some(id) = stack.pop() {
            out.push(id);
            let mut kids = self.children(id);
            kids.reverse();
            stack.extend(kids);
        }
        out
    }

    // ---- tree mutation ----------------------------------------------------

    fn unlink(&mut self, child: NodeId) {
        let (parent, prev, next) = {
            let n = self.node(child);
            (n.parent, n.prev_sibling, n.next_sibling)
        };
        let Some(parent) = parent else { return };

        match prev {
            Some(p) => self.node_mut(p).next_sibling = next,
            None => self.node_mut(parent).first_child = next,
        }
        match next {
            Some(nx) => self.node_mut(nx).prev_sibling = prev,
            None => self.node_mut(parent).last_child = prev,
        }
        let n = self.node_mut(child);
        n.parent = None;
        n.prev_sibling = None;
        n.next_sibling = None;
    }

    fn link_before(&mut self, parent: NodeId, child: NodeId, before: Option<NodeId>) {
        debug_assert_ne!(parent, child);
        match before {
            None => {
                let prev = self.node(parent).last_child;
                if let Some(p) = prev {
                    self.node_mut(p).next_sibling = Some(child);
                } else {
                    self.node_mut(parent).first_child = Some(child);
                }
                let n = self.node_mut(child);
                n.parent = Some(parent);
                n.prev_sibling = prev;
                n.next_sibling = None;
                self.node_mut(parent).last_child = Some(child);
            }
            Some(before) => {
                debug_assert_eq!(self.node(before).parent, Some(parent));
                let prev = self.node(before).prev_sibling;
                match prev {
                    Some(p) => self.node_mut(p).next_sibling = Some(child),
                    None => self.node_mut(parent).first_child = Some(child),
                }
                self.node_mut(before).prev_sibling = Some(child);
                let n = self.node_mut(child);
                n.parent = Some(parent);
                n.prev_sibling = prev;
                n.next_sibling = Some(before);
            }
        }
    }

    /// Append `child` as the last child of `parent`, unlinking it from any
    /// previous position first.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.insert_before(parent, child, None);
    }

    /// Insert `child` under `parent` before `before` (append when `None`).
    pub fn insert_before(&mut self, parent: NodeId, child: NodeId, before: Option<NodeId>) {
        self.unlink(child);
        self.link_before(parent, child, before);
        self.counters.node_inserts += 1;
        trace!(?parent, ?child, "insert");
    }

    /// Unlink `child` (and with it, its whole subtree) from the tree.
    pub fn remove(&mut self, child: NodeId) {
        self.unlink(child);
        self.counters.node_removes += 1;
        trace!(?child, "remove");
    }

    /// Move the sibling run `first..=last` before `before` under `parent`,
    /// preserving internal order and node identity.
    ///
    /// Counted as moves, not removes plus inserts: the distinction matters
    /// to keyed re-ordering, which must relocate live nodes.
    pub fn move_range(
        &mut self,
        parent: NodeId,
        first: NodeId,
        last: NodeId,
        before: Option<NodeId>,
    ) {
        let mut run = Vec::new();
        let mut cursor = Some(first);
        while let Some(id) = cursor {
            run.push(id);
            if id == last {
                break;
            }
            cursor = self.node(id).next_sibling;
        }
        for id in run {
            self.unlink(id);
            self.link_before(parent, id, before);
            self.counters.node_moves += 1;
        }
    }

    // ---- character data / attributes / properties -------------------------

    /// Overwrite the character data of a text node.
    pub fn set_text(&mut self, id: NodeId, content: &str) {
        if let NodeData::Text(t) = &mut self.node_mut(id).data {
            *t = content.to_string();
            self.counters.text_writes += 1;
        } else {
            debug_assert!(false, "set_text on a non-text node");
        }
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        self.node(id).as_text()
    }

    /// Set an attribute, counting the write (callers diff before calling).
    pub fn set_attribute(&mut self, element: NodeId, name: &str, value: &str) {
        if let Some(e) = self.node_mut(element).as_element_mut() {
            e.attributes.insert(name.to_string(), value.to_string());
            self.counters.attribute_writes += 1;
        } else {
            debug_assert!(false, "set_attribute on a non-element node");
        }
    }

    /// Remove an attribute entirely; a no-op if absent.
    pub fn remove_attribute(&mut self, element: NodeId, name: &str) {
        if let Some(e) = self.node_mut(element).as_element_mut() {
            if e.attributes.shift_remove(name).is_some() {
                self.counters.attribute_removes += 1;
            }
        }
    }

    pub fn attribute(&self, element: NodeId, name: &str) -> Option<&str> {
        self.node(element).as_element()?.attribute(name)
    }

    pub fn has_attribute(&self, element: NodeId, name: &str) -> bool {
        self.node(element)
            .as_element()
            .is_some_and(|e| e.has_attribute(name))
    }

    /// Assign a live property value, bypassing attribute serialization.
    pub fn set_property(&mut self, element: NodeId, name: &str, value: PropertyValue) {
        if let Some(e) = self.node_mut(element).as_element_mut() {
            e.properties.insert(name.to_string(), value);
            self.counters.property_writes += 1;
        } else {
            debug_assert!(false, "set_property on a non-element node");
        }
    }

    pub fn property(&self, element: NodeId, name: &str) -> Option<&PropertyValue> {
        self.node(element).as_element()?.property(name)
    }

    // ---- cross-document import --------------------------------------------

    /// Deep-copy `src_root`'s subtree from `src` into this document.
    ///
    /// Returns the id of the copied root plus the copies of
    /// `src.descendants(src_root)` in the same pre-order, which is how the
    /// engine maps prepared-template node indices onto a fresh clone.
    pub fn import_subtree(&mut self, src: &Document, src_root: NodeId) -> (NodeId, Vec<NodeId>) {
        let root = self.import_shallow(src, src_root);
        let mut map = Vec::new();
        self.import_children(src, src_root, root, &mut map);
        (root, map)
    }

    fn import_shallow(&mut self, src: &Document, id: NodeId) -> NodeId {
        match src.node(id).data() {
            NodeData::Element(e) => {
                let new_id = self.create_element_ns(e.tag_name(), e.namespace());
                if let Some(new_e) = self.node_mut(new_id).as_element_mut() {
                    for (k, v) in e.attributes() {
                        new_e.attributes.insert(k.to_string(), v.to_string());
                    }
                }
                new_id
            }
            NodeData::Text(t) => self.create_text(t),
            NodeData::Comment(c) => self.create_comment(c),
            NodeData::Fragment => self.create_fragment(),
        }
    }

    fn import_children(
        &mut self,
        src: &Document,
        src_parent: NodeId,
        dst_parent: NodeId,
        map: &mut Vec<NodeId>,
    ) {
        for src_child in src.children(src_parent) {
            let dst_child = self.import_shallow(src, src_child);
            map.push(dst_child);
            self.link_before(dst_parent, dst_child, None);
            self.import_children(src, src_child, dst_child, map);
        }
    }

    // ---- instrumentation --------------------------------------------------

    /// Snapshot the mutation counters.
    pub fn counters(&self) -> MutationCounters {
        self.counters
    }

    pub fn reset_counters(&mut self) {
        self.counters = MutationCounters::default();
    }

    pub(crate) fn count_listener_add(&mut self) {
        self.counters.listener_adds += 1;
    }

    pub(crate) fn count_listener_remove(&mut self) {
        self.counters.listener_removes += 1;
    }
}
