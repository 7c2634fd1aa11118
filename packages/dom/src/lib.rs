#![deny(clippy::all)]

//! In-memory document model for the lit template engine.
//!
//! The engine renders into a host document; this crate provides that
//! document: an arena-backed node tree with ordered attributes, a
//! JS-style property side-table, an event listener registry with
//! capture/bubble dispatch, an HTML fragment parser, and an escaping
//! serializer. Every mutation goes through [`Document`] methods so that
//! callers (and tests) can observe exactly which writes happened via
//! [`MutationCounters`].

mod document;
mod error;
mod events;
mod node;
mod parser;
mod serialize;

pub use document::{Document, MutationCounters};
pub use error::DomError;
pub use events::{Event, EventListener, ListenerId, ListenerOptions};
pub use node::{ElementData, Namespace, Node, NodeData, PropertyValue};
pub use parser::parse_fragment;
pub use serialize::{escape_attribute, escape_text};

/// Node identifier: an index into the owning [`Document`]'s arena.
///
/// Ids are never reused within a document, so a stored `NodeId` stays
/// valid (though possibly detached from the tree) for the document's
/// lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    pub(crate) fn new(index: usize) -> Self {
        NodeId(index as u32)
    }

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}
