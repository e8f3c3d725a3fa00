//! Classification of attributes into merge markup and content.

use xmerge_xml::Attribute;

use crate::options::MergeVocabulary;

/// One attribute of a merge node, judged against the merge vocabulary.
#[derive(Debug, Clone, Copy)]
pub struct MergeAttribute<'a> {
    attribute: &'a Attribute,
    vocabulary: &'a MergeVocabulary,
}

impl<'a> MergeAttribute<'a> {
    pub fn new(attribute: &'a Attribute, vocabulary: &'a MergeVocabulary) -> Self {
        Self {
            attribute,
            vocabulary,
        }
    }

    /// The wrapped attribute.
    pub fn attribute(&self) -> &'a Attribute {
        self.attribute
    }

    pub fn value(&self) -> &'a str {
        &self.attribute.value
    }

    /// Whether the attribute lives in the merge namespace, or declares it.
    ///
    /// Reserved attributes never reach the merged output.
    pub fn is_reserved(&self) -> bool {
        self.in_merge_namespace()
            || (self.attribute.is_namespace_declaration()
                && self.attribute.value == self.vocabulary.namespace)
    }

    /// Whether this is the identity rule attribute (`merge:id`).
    pub fn is_identity(&self) -> bool {
        self.in_merge_namespace() && self.attribute.local_name == self.vocabulary.id_attribute
    }

    /// Whether this is the strategy attribute (`merge:strategy`).
    pub fn is_strategy(&self) -> bool {
        self.in_merge_namespace() && self.attribute.local_name == self.vocabulary.strategy_attribute
    }

    fn in_merge_namespace(&self) -> bool {
        self.attribute.namespace.as_deref() == Some(self.vocabulary.namespace.as_str())
    }
}

/// Shorthand for [`MergeAttribute::is_reserved`].
pub fn is_reserved(attribute: &Attribute, vocabulary: &MergeVocabulary) -> bool {
    MergeAttribute::new(attribute, vocabulary).is_reserved()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::MERGE_NAMESPACE;

    #[test]
    fn test_reserved_attributes() {
        let vocabulary = MergeVocabulary::default();
        let id = Attribute::namespaced("merge", "id", MERGE_NAMESPACE, "@name");
        let strategy = Attribute::namespaced("m", "strategy", MERGE_NAMESPACE, "keep");
        let declaration = Attribute::namespace_declaration(Some("merge"), MERGE_NAMESPACE);
        let other_declaration = Attribute::namespace_declaration(Some("x"), "urn:x");
        let plain = Attribute::new("id", "1");

        assert!(MergeAttribute::new(&id, &vocabulary).is_reserved());
        assert!(MergeAttribute::new(&id, &vocabulary).is_identity());
        assert!(!MergeAttribute::new(&id, &vocabulary).is_strategy());
        assert!(MergeAttribute::new(&strategy, &vocabulary).is_reserved());
        assert!(MergeAttribute::new(&strategy, &vocabulary).is_strategy());
        assert!(MergeAttribute::new(&declaration, &vocabulary).is_reserved());
        assert!(!MergeAttribute::new(&declaration, &vocabulary).is_identity());
        assert!(!MergeAttribute::new(&other_declaration, &vocabulary).is_reserved());
        assert!(!MergeAttribute::new(&plain, &vocabulary).is_reserved());
        assert!(!MergeAttribute::new(&plain, &vocabulary).is_identity());
    }

    #[test]
    fn test_default_namespace_declaration_of_merge_namespace() {
        let vocabulary = MergeVocabulary::default();
        let declaration = Attribute::namespace_declaration(None, MERGE_NAMESPACE);
        assert!(is_reserved(&declaration, &vocabulary));
    }

    #[test]
    fn test_custom_vocabulary() {
        let vocabulary = MergeVocabulary::new("urn:custom");
        let id = Attribute::namespaced("c", "id", "urn:custom", "name()");
        let old = Attribute::namespaced("merge", "id", MERGE_NAMESPACE, "name()");
        assert!(MergeAttribute::new(&id, &vocabulary).is_identity());
        assert!(!is_reserved(&old, &vocabulary));
    }
}
