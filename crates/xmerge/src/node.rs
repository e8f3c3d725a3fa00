//! Read-only view of an element taking part in a merge.

use xmerge_xml::{Document, Element, NodeId, QName};

use crate::attribute::MergeAttribute;
use crate::error::{MergeError, MergeResult};
use crate::identity::IdentityRule;
use crate::options::MergeVocabulary;
use crate::strategy::MergeStrategy;

/// An element of a template or target document, seen through the merge vocabulary.
///
/// `MergeNode` never mutates its document. Strategies change the target
/// through [`Document`] directly.
#[derive(Debug, Clone, Copy)]
pub struct MergeNode<'a> {
    document: &'a Document,
    id: NodeId,
    element: &'a Element,
    vocabulary: &'a MergeVocabulary,
}

impl<'a> MergeNode<'a> {
    /// Wrap `id`, or `None` if it is not an element.
    pub fn new(document: &'a Document, id: NodeId, vocabulary: &'a MergeVocabulary) -> Option<Self> {
        let element = document.element(id)?;
        Some(Self {
            document,
            id,
            element,
            vocabulary,
        })
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn document(&self) -> &'a Document {
        self.document
    }

    pub fn element(&self) -> &'a Element {
        self.element
    }

    pub fn vocabulary(&self) -> &'a MergeVocabulary {
        self.vocabulary
    }

    /// Namespace URI and local name.
    pub fn qualified_name(&self) -> QName {
        self.element.qname()
    }

    /// Tag name as written, including its prefix.
    pub fn tag_name(&self) -> String {
        self.element.tag_name()
    }

    /// The diagnostics identity of the owning document.
    pub fn origin(&self) -> &'a str {
        self.document.origin()
    }

    pub fn attributes(&self) -> impl Iterator<Item = MergeAttribute<'a>> + 'a {
        let vocabulary = self.vocabulary;
        self.element
            .attributes
            .iter()
            .map(move |a| MergeAttribute::new(a, vocabulary))
    }

    /// Attributes that are content rather than merge markup or namespace declarations.
    pub fn content_attributes(&self) -> impl Iterator<Item = MergeAttribute<'a>> + 'a {
        self.attributes()
            .filter(|a| !a.is_reserved() && !a.attribute().is_namespace_declaration())
    }

    pub fn child_elements(&self) -> impl Iterator<Item = MergeNode<'a>> + 'a {
        let (document, vocabulary) = (self.document, self.vocabulary);
        document
            .child_elements(self.id)
            .filter_map(move |id| MergeNode::new(document, id, vocabulary))
    }

    /// Whether this is the document element.
    pub fn is_root(&self) -> bool {
        self.document.document_element() == Some(self.id)
    }

    pub fn text_content(&self) -> String {
        self.document.text_content(self.id)
    }

    /// The identity rule written on this element, if any.
    pub fn declared_identity(&self) -> Option<IdentityRule> {
        self.attributes()
            .find(|a| a.is_identity())
            .and_then(|a| IdentityRule::parse(a.value()))
    }

    /// The declared identity rule, or the one implied by the attributes.
    ///
    /// An element without attributes is matched by `name()`, one with an
    /// `id` or else a `name` attribute by that attribute. Any other element
    /// has no identity rule. Merge markup counts as an attribute here, only
    /// namespace declarations are ignored.
    pub fn identity_rule(&self) -> Option<IdentityRule> {
        self.declared_identity().or_else(|| self.implicit_identity())
    }

    fn implicit_identity(&self) -> Option<IdentityRule> {
        let has_attributes = self
            .attributes()
            .any(|a| !a.attribute().is_namespace_declaration());
        if !has_attributes {
            return Some(IdentityRule::Name);
        }
        ["id", "name"]
            .into_iter()
            .find(|name| self.element.has_attribute(name))
            .map(|name| IdentityRule::Attribute(name.to_string()))
    }

    /// The declared merge strategy, `None` when the element declares none.
    pub fn strategy(&self) -> MergeResult<Option<MergeStrategy>> {
        let Some(attribute) = self.attributes().find(|a| a.is_strategy()) else {
            return Ok(None);
        };
        attribute
            .value()
            .parse::<MergeStrategy>()
            .map(Some)
            .map_err(|_| MergeError::UnknownStrategy {
                value: attribute.value().to_string(),
                path: self.diagnostic_path(),
                origin: self.origin().to_string(),
            })
    }

    /// Slash-separated tag names from the document element down, e.g. `/project/component`.
    pub fn diagnostic_path(&self) -> String {
        self.path(false)
    }

    /// Like [`diagnostic_path`](Self::diagnostic_path), with the content
    /// attributes of every step, e.g. `/project/component[@name='Git']`.
    pub fn diagnostic_path_with_attributes(&self) -> String {
        self.path(true)
    }

    fn path(&self, with_attributes: bool) -> String {
        let mut steps: Vec<NodeId> = self
            .document
            .ancestors(self.id)
            .into_iter()
            .filter(|id| self.document.is_element(*id))
            .collect();
        steps.reverse();
        steps.push(self.id);

        let mut path = String::new();
        for step in steps.into_iter().filter_map(|id| MergeNode::new(self.document, id, self.vocabulary)) {
            path.push('/');
            path.push_str(&step.tag_name());
            if with_attributes {
                let attributes: Vec<String> = step
                    .content_attributes()
                    .map(|a| {
                        format!(
                            "@{}='{}'",
                            a.attribute().qualified_name(),
                            a.value().replace('\'', "&apos;")
                        )
                    })
                    .collect();
                if !attributes.is_empty() {
                    path.push('[');
                    path.push_str(&attributes.join(" "));
                    path.push(']');
                }
            }
        }
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xmerge_xml::parse;

    const TEMPLATE: &str = r#"<project xmlns:merge="https://github.com/devonfw/IDEasy/merge">
  <component name="Git's" merge:strategy="Override"/>
  <layout/>
  <entry key="a"/>
  <entry key="b" merge:id="@key"/>
  <item id="" name="n"/>
  <bad merge:strategy="replace"/>
  <pane merge:strategy="keep"/>
</project>"#;

    fn nodes(doc: &Document) -> Vec<NodeId> {
        doc.child_elements(doc.document_element().unwrap()).collect()
    }

    #[test]
    fn test_identity_rules() {
        let doc = parse(TEMPLATE, "template.xml").unwrap();
        let vocabulary = MergeVocabulary::default();
        let ids = nodes(&doc);
        let node = |i: usize| MergeNode::new(&doc, ids[i], &vocabulary).unwrap();

        assert_eq!(
            node(0).identity_rule(),
            Some(IdentityRule::Attribute("name".to_string()))
        );
        assert_eq!(node(1).identity_rule(), Some(IdentityRule::Name));
        assert_eq!(node(2).identity_rule(), None);
        assert_eq!(
            node(3).declared_identity(),
            Some(IdentityRule::Attribute("key".to_string()))
        );
        assert_eq!(
            node(4).identity_rule(),
            Some(IdentityRule::Attribute("id".to_string()))
        );
        // merge markup alone still needs an explicit rule
        assert_eq!(node(6).identity_rule(), None);
    }

    #[test]
    fn test_root_with_only_namespace_declarations_matches_by_name() {
        let doc = parse(TEMPLATE, "template.xml").unwrap();
        let vocabulary = MergeVocabulary::default();
        let root = MergeNode::new(&doc, doc.document_element().unwrap(), &vocabulary).unwrap();
        assert!(root.is_root());
        assert_eq!(root.identity_rule(), Some(IdentityRule::Name));
        assert_eq!(root.child_elements().count(), 7);
    }

    #[test]
    fn test_strategy() {
        let doc = parse(TEMPLATE, "template.xml").unwrap();
        let vocabulary = MergeVocabulary::default();
        let ids = nodes(&doc);

        let component = MergeNode::new(&doc, ids[0], &vocabulary).unwrap();
        assert_eq!(component.strategy().unwrap(), Some(MergeStrategy::Override));

        let layout = MergeNode::new(&doc, ids[1], &vocabulary).unwrap();
        assert_eq!(layout.strategy().unwrap(), None);

        let bad = MergeNode::new(&doc, ids[5], &vocabulary).unwrap();
        match bad.strategy() {
            Err(MergeError::UnknownStrategy {
                value,
                path,
                origin,
            }) => {
                assert_eq!(value, "replace");
                assert_eq!(path, "/project/bad");
                assert_eq!(origin, "template.xml");
            }
            other => panic!("expected UnknownStrategy, got {:?}", other),
        }
    }

    #[test]
    fn test_diagnostic_paths() {
        let doc = parse(TEMPLATE, "template.xml").unwrap();
        let vocabulary = MergeVocabulary::default();
        let ids = nodes(&doc);
        let component = MergeNode::new(&doc, ids[0], &vocabulary).unwrap();

        assert!(!component.is_root());
        assert_eq!(component.diagnostic_path(), "/project/component");
        assert_eq!(
            component.diagnostic_path_with_attributes(),
            "/project/component[@name='Git&apos;s']"
        );
    }

    #[test]
    fn test_non_element_is_not_a_merge_node() {
        let doc = parse("<a>text</a>", "inline").unwrap();
        let vocabulary = MergeVocabulary::default();
        let text = doc.children(doc.document_element().unwrap())[0];
        assert!(MergeNode::new(&doc, text, &vocabulary).is_none());
    }
}
