//! The merge strategies and the helpers they share.

mod combine;

use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use xmerge_xml::{Document, NodeId};

use crate::attribute::is_reserved;
use crate::context::MergeContext;
use crate::error::{MergeError, MergeResult};
use crate::matcher::ElementMatcher;
use crate::node::MergeNode;
use crate::options::{MergeOptions, MergeVocabulary};

/// How a template element is merged into its matched target element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MergeStrategy {
    /// Union of attributes and children, recursing into matched children.
    #[default]
    Combine,

    /// The template subtree replaces the target subtree.
    Override,

    /// The target subtree is left untouched.
    Keep,
}

/// A strategy name that is not `combine`, `override` or `keep`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown merge strategy '{0}'")]
pub struct ParseStrategyError(pub String);

impl FromStr for MergeStrategy {
    type Err = ParseStrategyError;

    /// Case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "combine" => Ok(MergeStrategy::Combine),
            "override" => Ok(MergeStrategy::Override),
            "keep" => Ok(MergeStrategy::Keep),
            _ => Err(ParseStrategyError(s.to_string())),
        }
    }
}

impl fmt::Display for MergeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MergeStrategy::Combine => "combine",
            MergeStrategy::Override => "override",
            MergeStrategy::Keep => "keep",
        })
    }
}

/// A strategy bound to the run-scoped state it works with.
///
/// Every strategy created during one run shares the same [`ElementMatcher`],
/// so identity rules learnt in one subtree apply to the next.
pub struct Strategy<'r> {
    kind: MergeStrategy,
    matcher: &'r mut ElementMatcher,
    options: &'r MergeOptions,
    context: &'r mut MergeContext,
}

impl<'r> Strategy<'r> {
    /// Bind `kind` to the state of a run.
    pub fn create(
        kind: MergeStrategy,
        matcher: &'r mut ElementMatcher,
        options: &'r MergeOptions,
        context: &'r mut MergeContext,
    ) -> Self {
        Self {
            kind,
            matcher,
            options,
            context,
        }
    }

    pub fn kind(&self) -> MergeStrategy {
        self.kind
    }

    /// A strategy for a child element sharing this one's run state.
    fn for_child(&mut self, kind: MergeStrategy) -> Strategy<'_> {
        Strategy {
            kind,
            matcher: &mut *self.matcher,
            options: self.options,
            context: &mut *self.context,
        }
    }

    /// Merge `template_node` into `target_node`, changing `target` in place.
    pub fn merge(
        &mut self,
        template: &Document,
        template_node: NodeId,
        target: &mut Document,
        target_node: NodeId,
    ) -> MergeResult<()> {
        let options = self.options;
        let node = MergeNode::new(template, template_node, &options.vocabulary).ok_or_else(|| {
            MergeError::Document {
                operation: "merge",
                path: format!("#{}", template_node.index()),
                origin: template.origin().to_string(),
                source: xmerge_xml::Error::InvalidNode {
                    node: template_node,
                    operation: "be merged",
                },
            }
        })?;
        self.merge_node(&node, target, target_node)
    }

    fn merge_node(
        &mut self,
        template: &MergeNode<'_>,
        target: &mut Document,
        target_node: NodeId,
    ) -> MergeResult<()> {
        tracing::debug!(
            strategy = %self.kind,
            template = %template.diagnostic_path(),
            "Merging element"
        );
        match self.kind {
            MergeStrategy::Combine => self.combine(template, target, target_node),
            MergeStrategy::Override => self.replace(template, target, target_node),
            MergeStrategy::Keep => Ok(()),
        }
    }

    fn replace(
        &mut self,
        template: &MergeNode<'_>,
        target: &mut Document,
        target_node: NodeId,
    ) -> MergeResult<()> {
        let copy = self.import_stripped(template, target)?;
        target
            .replace_child(target_node, copy)
            .and_then(|()| target.declare_missing_namespaces(copy))
            .map_err(document_error("override", template))
    }

    /// Import `template` into `target` as the last child of `parent`.
    fn append_whole(
        &mut self,
        template: &MergeNode<'_>,
        target: &mut Document,
        parent: NodeId,
    ) -> MergeResult<()> {
        tracing::debug!(
            template = %template.diagnostic_path(),
            "Appending unmatched element"
        );
        let copy = self.import_stripped(template, target)?;
        target
            .append_child(parent, copy)
            .and_then(|()| target.declare_missing_namespaces(copy))
            .map_err(document_error("append", template))
    }

    /// Deep-copy `template` into `target` without merge markup.
    ///
    /// Identity rules declared inside the subtree are recorded in the matcher
    /// first, since the copy no longer carries them.
    fn import_stripped(&mut self, template: &MergeNode<'_>, target: &mut Document) -> MergeResult<NodeId> {
        self.reserve_rules(template)?;
        let copy = target
            .import_node(template.document(), template.id())
            .map_err(document_error("import", template))?;
        strip_reserved(target, copy, &self.options.vocabulary)
            .map_err(document_error("strip", template))?;
        Ok(copy)
    }

    /// Record the rules declared in `template`'s subtree, failing on any
    /// unknown strategy value in it.
    fn reserve_rules(&mut self, template: &MergeNode<'_>) -> MergeResult<()> {
        let document = template.document();
        for id in document.descendants(template.id()) {
            let Some(node) = MergeNode::new(document, id, template.vocabulary()) else {
                continue;
            };
            node.strategy()?;
            if let Some(rule) = node.declared_identity() {
                self.matcher.update_rule(node.qualified_name(), rule);
            }
        }
        Ok(())
    }
}

/// Wrap a document error with the template element it happened on.
fn document_error<'n>(
    operation: &'static str,
    template: &'n MergeNode<'_>,
) -> impl FnOnce(xmerge_xml::Error) -> MergeError + 'n {
    move |source| MergeError::Document {
        operation,
        path: template.diagnostic_path(),
        origin: template.origin().to_string(),
        source,
    }
}

/// Remove merge markup from `node` and all elements below it.
///
/// Returns the number of attributes removed.
pub fn strip_reserved(
    document: &mut Document,
    node: NodeId,
    vocabulary: &MergeVocabulary,
) -> xmerge_xml::Result<usize> {
    let mut removed = 0;
    for id in document.descendants(node) {
        if document.is_element(id) {
            removed += document
                .retain_attributes(id, |a| !is_reserved(a, vocabulary))?
                .len();
        }
    }
    Ok(removed)
}
