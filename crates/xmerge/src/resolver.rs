//! Evaluates identity rules against a target subtree.

use xmerge_query::{NamespaceBindings, Query};
use xmerge_xml::{Document, NodeId};

use crate::context::{MergeContext, MergeWarning};
use crate::error::{MergeError, MergeResult};
use crate::identity::IdentityRule;
use crate::node::MergeNode;
use crate::options::AmbiguityPolicy;

/// Finds the target counterpart of template elements sharing one identity rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityResolver {
    rule: IdentityRule,
}

impl IdentityResolver {
    pub fn new(rule: IdentityRule) -> Self {
        Self { rule }
    }

    pub fn rule(&self) -> &IdentityRule {
        &self.rule
    }

    /// Find the counterpart of `template` among the nodes the rule selects
    /// from `target_node`.
    ///
    /// Prefixes in the query resolve through the namespaces in scope at the
    /// template element.
    pub fn evaluate(
        &self,
        template: &MergeNode<'_>,
        target: &Document,
        target_node: NodeId,
        ambiguity: AmbiguityPolicy,
        context: &mut MergeContext,
    ) -> MergeResult<Option<NodeId>> {
        let source = self.rule.build_query(template);
        tracing::trace!(
            query = %source,
            template = %template.diagnostic_path(),
            "Evaluating identity query"
        );

        let invalid = |source_error| MergeError::InvalidQuery {
            query: source.clone(),
            path: template.diagnostic_path(),
            origin: template.origin().to_string(),
            source: source_error,
        };
        let query = Query::compile(&source).map_err(invalid)?;
        let bindings = NamespaceBindings::in_scope(template.document(), template.id());
        let matches = query
            .select_elements(target, target_node, &bindings)
            .map_err(invalid)?;

        match matches.as_slice() {
            [] => Ok(None),
            [single] => Ok(Some(*single)),
            [first, ..] => {
                let target_path = MergeNode::new(target, target_node, template.vocabulary())
                    .map(|n| n.diagnostic_path_with_attributes())
                    .unwrap_or_else(|| "/".to_string());
                match ambiguity {
                    AmbiguityPolicy::Fail => Err(MergeError::AmbiguousMatch {
                        query: source,
                        count: matches.len(),
                        template_path: template.diagnostic_path(),
                        target_path,
                    }),
                    AmbiguityPolicy::WarnFirst => {
                        context.warn(MergeWarning {
                            message: format!(
                                "{} matches found for XPath {} in workspace XML at {}",
                                matches.len(),
                                source,
                                target_path
                            ),
                            template_path: template.diagnostic_path(),
                            target_path,
                            query: Some(source.clone()),
                        });
                        Ok(Some(*first))
                    }
                }
            }
        }
    }
}
