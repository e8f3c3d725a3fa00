//! Error types for XML parsing, serialization and tree mutation.

use crate::NodeId;
use thiserror::Error;

/// Result type alias for xmerge-xml operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reading, writing or mutating a document.
#[derive(Debug, Error)]
pub enum Error {
    /// XML syntax error reported by quick-xml.
    #[error("XML syntax error in {origin}: {message}")]
    XmlSyntax {
        origin: String,
        message: String,
        /// Byte offset where the error occurred.
        position: Option<u64>,
    },

    /// Unexpected end of input.
    #[error("Unexpected end of input in {origin}, expected {expected}")]
    UnexpectedEof { origin: String, expected: String },

    /// Mismatched end tag.
    #[error("Mismatched end tag in {origin}: expected </{expected}>, found </{found}>")]
    MismatchedEndTag {
        origin: String,
        expected: String,
        found: String,
    },

    /// Invalid XML structure.
    #[error("Invalid XML structure in {origin}: {message}")]
    InvalidStructure { origin: String, message: String },

    /// Empty document (no root element).
    #[error("Empty XML document {origin}: no root element found")]
    EmptyDocument { origin: String },

    /// Multiple root elements.
    #[error("Invalid XML in {origin}: multiple root elements")]
    MultipleRoots { origin: String },

    /// A prefix is used without a namespace declaration in scope.
    #[error("Unbound namespace prefix '{prefix}' on <{name}> in {origin}")]
    UnboundPrefix {
        origin: String,
        prefix: String,
        name: String,
    },

    /// The node is expected to have a parent but is detached.
    #[error("Node {0:?} has no parent")]
    Detached(NodeId),

    /// The node is already attached and must be detached first.
    #[error("Node {0:?} is already attached to a parent")]
    AlreadyAttached(NodeId),

    /// The operation requires an element (or document) node.
    #[error("Node {node:?} cannot {operation}")]
    InvalidNode { node: NodeId, operation: &'static str },

    /// Serialization failure.
    #[error("Failed to write XML: {message}")]
    Write { message: String },
}
