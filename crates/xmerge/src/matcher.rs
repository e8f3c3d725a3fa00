//! Matching template elements to target elements.

use std::collections::HashMap;

use xmerge_xml::{Document, NodeId, QName};

use crate::context::MergeContext;
use crate::error::{MergeError, MergeResult};
use crate::identity::IdentityRule;
use crate::node::MergeNode;
use crate::options::AmbiguityPolicy;
use crate::resolver::IdentityResolver;

/// Matches template elements against target children for one merge run.
///
/// Identity rules are cached per qualified name: the first element of a name
/// fixes the rule for later elements of that name. An element declaring its
/// own rule uses it instead.
#[derive(Debug)]
pub struct ElementMatcher {
    resolvers: HashMap<QName, IdentityResolver>,
    ambiguity: AmbiguityPolicy,
}

impl ElementMatcher {
    pub fn new(ambiguity: AmbiguityPolicy) -> Self {
        Self {
            resolvers: HashMap::new(),
            ambiguity,
        }
    }

    pub fn ambiguity(&self) -> AmbiguityPolicy {
        self.ambiguity
    }

    /// The rule currently cached for `qname`.
    pub fn cached_rule(&self, qname: &QName) -> Option<&IdentityRule> {
        self.resolvers.get(qname).map(IdentityResolver::rule)
    }

    /// Replace the cached rule for `qname`.
    pub fn update_rule(&mut self, qname: QName, rule: IdentityRule) {
        if self.cached_rule(&qname).is_some_and(|cached| *cached != rule) {
            tracing::debug!(element = %qname, rule = %rule, "Identity rule replaced");
        }
        self.resolvers.insert(qname, IdentityResolver::new(rule));
    }

    /// Find the counterpart of `template` below `target_node`.
    ///
    /// Fails with [`MergeError::MissingIdentityRule`] when no rule is cached
    /// for the element's name and none can be declared or implied from it.
    pub fn match_element(
        &mut self,
        template: &MergeNode<'_>,
        target: &Document,
        target_node: NodeId,
        context: &mut MergeContext,
    ) -> MergeResult<Option<NodeId>> {
        let qname = template.qualified_name();
        let resolver = match template.declared_identity() {
            Some(rule) => {
                self.resolvers
                    .entry(qname)
                    .or_insert_with(|| IdentityResolver::new(rule.clone()));
                IdentityResolver::new(rule)
            }
            None => match self.resolvers.get(&qname) {
                Some(cached) => cached.clone(),
                None => {
                    let rule = template.identity_rule().ok_or_else(|| {
                        MergeError::MissingIdentityRule {
                            path: template.diagnostic_path_with_attributes(),
                            origin: template.origin().to_string(),
                        }
                    })?;
                    let resolver = IdentityResolver::new(rule);
                    self.resolvers.insert(qname, resolver.clone());
                    resolver
                }
            },
        };
        resolver.evaluate(template, target, target_node, self.ambiguity, context)
    }
}
