//! Merge runs and whole-document merging.

use xmerge_xml::{Document, NodeId};

use crate::context::{MergeContext, MergeReport};
use crate::error::{MergeError, MergeResult};
use crate::matcher::ElementMatcher;
use crate::node::MergeNode;
use crate::options::MergeOptions;
use crate::strategy::{MergeStrategy, Strategy, strip_reserved};

/// State of one merge of a template into a target.
///
/// A run owns the identity rule cache, so each run must merge one pair of
/// documents only. Independent runs can proceed on separate threads.
#[derive(Debug)]
pub struct MergeRun {
    matcher: ElementMatcher,
    options: MergeOptions,
    context: MergeContext,
}

impl MergeRun {
    pub fn new(options: MergeOptions) -> Self {
        Self {
            matcher: ElementMatcher::new(options.ambiguity),
            options,
            context: MergeContext::new(),
        }
    }

    pub fn options(&self) -> &MergeOptions {
        &self.options
    }

    pub fn matcher(&self) -> &ElementMatcher {
        &self.matcher
    }

    pub fn context(&self) -> &MergeContext {
        &self.context
    }

    /// Merge `template_node` into `target_node` with `strategy`.
    pub fn merge(
        &mut self,
        strategy: MergeStrategy,
        template: &Document,
        template_node: NodeId,
        target: &mut Document,
        target_node: NodeId,
    ) -> MergeResult<()> {
        Strategy::create(
            strategy,
            &mut self.matcher,
            &self.options,
            &mut self.context,
        )
        .merge(template, template_node, target, target_node)
    }

    /// End the run, returning the warnings it produced.
    pub fn finish(self) -> MergeReport {
        self.context.into_report()
    }
}

/// Merge `template` into `target` starting at their document elements.
///
/// The root strategy is the one declared on the template's document element,
/// or the default strategy of `options`. Merge markup is removed from the
/// whole target afterwards.
pub fn merge_documents(
    template: &Document,
    target: &mut Document,
    options: &MergeOptions,
) -> MergeResult<MergeReport> {
    let (template_root, _) = document_elements(template, target)?;
    let root = MergeNode::new(template, template_root, &options.vocabulary);
    let strategy = match root {
        Some(root) => root.strategy()?.unwrap_or(options.default_strategy),
        None => options.default_strategy,
    };
    merge_documents_with(strategy, template, target, options)
}

/// Like [`merge_documents`], with an explicit root strategy.
pub fn merge_documents_with(
    strategy: MergeStrategy,
    template: &Document,
    target: &mut Document,
    options: &MergeOptions,
) -> MergeResult<MergeReport> {
    let (template_root, target_root) = document_elements(template, target)?;
    tracing::debug!(
        template = template.origin(),
        target = target.origin(),
        strategy = %strategy,
        "Merging documents"
    );

    let mut run = MergeRun::new(options.clone());
    run.merge(strategy, template, template_root, target, target_root)?;

    let root = target.root();
    strip_reserved(target, root, &options.vocabulary).map_err(|source| MergeError::Document {
        operation: "strip",
        path: "/".to_string(),
        origin: target.origin().to_string(),
        source,
    })?;
    Ok(run.finish())
}

fn document_elements(template: &Document, target: &Document) -> MergeResult<(NodeId, NodeId)> {
    let missing = |document: &Document| MergeError::Document {
        operation: "merge",
        path: "/".to_string(),
        origin: document.origin().to_string(),
        source: xmerge_xml::Error::EmptyDocument {
            origin: document.origin().to_string(),
        },
    };
    let template_root = template.document_element().ok_or_else(|| missing(template))?;
    let target_root = target.document_element().ok_or_else(|| missing(target))?;

    let (template_name, target_name) = (
        template.element(template_root).map(|e| e.qname()),
        target.element(target_root).map(|e| e.qname()),
    );
    if template_name != target_name {
        let describe = |name: Option<xmerge_xml::QName>| name.map(|n| n.to_string()).unwrap_or_default();
        return Err(MergeError::RootMismatch {
            template: describe(template_name),
            template_origin: template.origin().to_string(),
            target: describe(target_name),
            target_origin: target.origin().to_string(),
        });
    }
    Ok((template_root, target_root))
}
