//! The combine strategy: attribute union plus recursive child merge.

use xmerge_xml::{Attribute, Document, NodeId, NodeKind};

use super::{Strategy, document_error};
use crate::error::MergeResult;
use crate::node::MergeNode;

impl Strategy<'_> {
    pub(super) fn combine(
        &mut self,
        template: &MergeNode<'_>,
        target: &mut Document,
        target_node: NodeId,
    ) -> MergeResult<()> {
        self.combine_attributes(template, target, target_node)?;
        self.combine_children(template, target, target_node)
    }

    fn combine_attributes(
        &mut self,
        template: &MergeNode<'_>,
        target: &mut Document,
        target_node: NodeId,
    ) -> MergeResult<()> {
        let wrap = || document_error("combine attributes of", template);
        for attribute in template.attributes().filter(|a| !a.is_reserved()) {
            let attribute = attribute.attribute();
            match attribute.declared_prefix() {
                // Default namespace declarations would change the namespace of
                // the target element itself.
                Some(None) => {}
                Some(Some(prefix)) => {
                    if target.lookup_namespace_uri(target_node, Some(prefix)).is_none() {
                        target
                            .set_attribute(target_node, attribute.clone())
                            .map_err(wrap())?;
                    }
                }
                None => {
                    let attribute = bind_prefix(target, target_node, attribute).map_err(wrap())?;
                    target
                        .set_attribute(target_node, attribute)
                        .map_err(wrap())?;
                }
            }
        }
        Ok(())
    }

    fn combine_children(
        &mut self,
        template: &MergeNode<'_>,
        target: &mut Document,
        target_node: NodeId,
    ) -> MergeResult<()> {
        let document = template.document();
        for &child in document.children(template.id()) {
            match document.kind(child) {
                NodeKind::Element(_) => {
                    let Some(child) = MergeNode::new(document, child, template.vocabulary()) else {
                        continue;
                    };
                    let kind = child.strategy()?.unwrap_or(self.options.default_strategy);
                    match self
                        .matcher
                        .match_element(&child, target, target_node, self.context)?
                    {
                        Some(matched) => self.for_child(kind).merge_node(&child, target, matched)?,
                        None => self.append_whole(&child, target, target_node)?,
                    }
                }
                NodeKind::Text(text) | NodeKind::CData(text) if !text.trim().is_empty() => {
                    replace_text(document, child, text.trim(), target, target_node)
                        .map_err(document_error("combine text of", template))?;
                }
                _ => {}
            }
        }
        Ok(())
    }
}

/// Put the template text into the first non-blank text of the target, or
/// append a copy of the template text node if there is none.
fn replace_text(
    template: &Document,
    template_text: NodeId,
    text: &str,
    target: &mut Document,
    target_node: NodeId,
) -> xmerge_xml::Result<()> {
    let existing = target.children(target_node).iter().copied().find(|c| {
        target
            .text(*c)
            .is_some_and(|existing| !existing.trim().is_empty())
    });
    match existing {
        Some(existing) => target.set_text(existing, text),
        None => {
            let copy = target.import_node(template, template_text)?;
            target.append_child(target_node, copy)
        }
    }
}

/// Rewrite a namespaced attribute so its prefix resolves to its namespace at
/// `node`, declaring the namespace there if needed.
fn bind_prefix(
    target: &mut Document,
    node: NodeId,
    attribute: &Attribute,
) -> xmerge_xml::Result<Attribute> {
    let (Some(prefix), Some(namespace)) = (attribute.prefix.as_deref(), attribute.namespace.as_deref())
    else {
        return Ok(attribute.clone());
    };
    if target.lookup_namespace_uri(node, Some(prefix)) == Some(namespace) {
        return Ok(attribute.clone());
    }
    let bound = target.lookup_prefix(node, namespace).map(str::to_string);
    let prefix = match bound {
        Some(bound) => bound,
        None => {
            let prefix = if target.lookup_namespace_uri(node, Some(prefix)).is_none() {
                prefix.to_string()
            } else {
                (0..)
                    .map(|i| format!("ns{}", i))
                    .find(|p| target.lookup_namespace_uri(node, Some(p.as_str())).is_none())
                    .unwrap_or_default()
            };
            target.set_attribute(node, Attribute::namespace_declaration(Some(&prefix), namespace))?;
            prefix
        }
    };
    Ok(Attribute::namespaced(
        &prefix,
        attribute.local_name.clone(),
        namespace,
        attribute.value.clone(),
    ))
}
