//! Error types for document construction and parsing.

use thiserror::Error;

/// Errors surfaced by the document model.
#[derive(Debug, Clone, Error)]
pub enum DomError {
    /// The fragment parser ran out of input mid-construct.
    #[error("unexpected end of markup while parsing {context}")]
    UnexpectedEof { context: &'static str },

    /// A tag name started with an invalid character.
    #[error("invalid tag name at offset {offset}")]
    InvalidTagName { offset: usize },

    /// An attribute name contained an invalid character.
    #[error("invalid attribute name {name:?}")]
    InvalidAttributeName { name: String },

    /// A node was used with a document that does not own it.
    #[error("node is not owned by this document")]
    ForeignNode,

    /// The operation requires an element node.
    #[error("expected an element node")]
    NotAnElement,
}
