//! Error types for the merge engine.

use thiserror::Error;
use xmerge_query::QueryError;

/// Errors that abort the merge of a subtree.
///
/// Every variant names the element it failed on, either by its diagnostic
/// path and document origin or, for ambiguous matches, by the paths on both
/// sides of the match.
#[derive(Debug, Error)]
pub enum MergeError {
    /// The template element declares no identity rule and none can be inferred.
    #[error("No merge:id value defined for element {path} in {origin}")]
    MissingIdentityRule { path: String, origin: String },

    /// The identity query does not compile or cannot be evaluated.
    #[error("Invalid XPath '{query}' for element {path} in {origin}: {source}")]
    InvalidQuery {
        query: String,
        path: String,
        origin: String,
        #[source]
        source: QueryError,
    },

    /// More than one target element matched under the fail-fast policy.
    #[error("{count} matches found for XPath {query} in workspace XML at {target_path} (template element {template_path})")]
    AmbiguousMatch {
        query: String,
        count: usize,
        template_path: String,
        target_path: String,
    },

    /// The declared strategy is not one of combine, override or keep.
    #[error("Unknown merge strategy '{value}' on element {path} in {origin}")]
    UnknownStrategy {
        value: String,
        path: String,
        origin: String,
    },

    /// The template and target document elements have different qualified names.
    #[error("Root elements differ: template {template_origin} has <{template}> but target {target_origin} has <{target}>")]
    RootMismatch {
        template: String,
        template_origin: String,
        target: String,
        target_origin: String,
    },

    /// A document operation failed while applying a strategy.
    #[error("Failed to {operation} element {path} in {origin}: {source}")]
    Document {
        operation: &'static str,
        path: String,
        origin: String,
        #[source]
        source: xmerge_xml::Error,
    },
}

/// Result type for merge operations.
pub type MergeResult<T> = Result<T, MergeError>;
