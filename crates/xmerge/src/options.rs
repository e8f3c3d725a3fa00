//! Run-wide merge configuration.

use crate::strategy::MergeStrategy;

/// The reserved namespace carrying merge-control attributes.
pub const MERGE_NAMESPACE: &str = "https://github.com/devonfw/IDEasy/merge";

/// Names of the merge-control attributes and their namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeVocabulary {
    /// Namespace URI of the control attributes.
    pub namespace: String,

    /// Local name of the identity rule attribute.
    pub id_attribute: String,

    /// Local name of the strategy attribute.
    pub strategy_attribute: String,
}

impl MergeVocabulary {
    /// The standard attribute names in a custom namespace.
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            ..Self::default()
        }
    }
}

impl Default for MergeVocabulary {
    fn default() -> Self {
        Self {
            namespace: MERGE_NAMESPACE.to_string(),
            id_attribute: "id".to_string(),
            strategy_attribute: "strategy".to_string(),
        }
    }
}

/// What to do when an identity query matches more than one target element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AmbiguityPolicy {
    /// Abort with [`MergeError::AmbiguousMatch`](crate::MergeError::AmbiguousMatch).
    Fail,

    /// Record a warning and merge into the first match in document order.
    #[default]
    WarnFirst,
}

impl AmbiguityPolicy {
    pub fn from_fail_fast(fail_fast: bool) -> Self {
        if fail_fast {
            AmbiguityPolicy::Fail
        } else {
            AmbiguityPolicy::WarnFirst
        }
    }
}

/// Options for one merge run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MergeOptions {
    pub vocabulary: MergeVocabulary,
    pub ambiguity: AmbiguityPolicy,

    /// Strategy for elements that declare none.
    pub default_strategy: MergeStrategy,
}

impl MergeOptions {
    pub fn with_ambiguity(mut self, ambiguity: AmbiguityPolicy) -> Self {
        self.ambiguity = ambiguity;
        self
    }

    pub fn with_vocabulary(mut self, vocabulary: MergeVocabulary) -> Self {
        self.vocabulary = vocabulary;
        self
    }
}
