//! Error types for query compilation and evaluation.

use thiserror::Error;
use xmerge_xml::NodeId;

/// Errors that can occur while compiling or evaluating a query.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryError {
    /// The expression is not valid XPath 1.0.
    #[error("Invalid XPath '{expression}': {message}")]
    Syntax { expression: String, message: String },

    /// A name test uses a prefix with no binding.
    #[error("Unbound namespace prefix '{prefix}'")]
    UnboundPrefix { prefix: String },

    /// Evaluation failed, e.g. an unknown function or a wrong argument count.
    #[error("Failed to evaluate XPath '{expression}': {message}")]
    Evaluation { expression: String, message: String },

    /// The context node is not reachable from the document node.
    #[error("Context node #{} is not part of the document", .node.index())]
    DetachedContext { node: NodeId },

    /// A value of the wrong type, e.g. a number where nodes were expected.
    #[error("Type error: {message}")]
    Type { message: String },
}

/// Result type for query operations.
pub type QueryResult<T> = Result<T, QueryError>;
