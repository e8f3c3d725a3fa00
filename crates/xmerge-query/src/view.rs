//! The sxd-document copy of a [`Document`] that XPath evaluates against.

use std::collections::HashMap;

use sxd_document::{Package, QName, dom};
use sxd_xpath::nodeset::Node;
use xmerge_xml::{Document, NodeId, NodeKind};

use crate::{QueryNode, Value};

/// A copy of a document plus the way back from its nodes to the arena.
///
/// Only nodes reachable from the document node are copied. Namespace
/// declarations become prefix registrations rather than attributes.
pub(crate) struct View<'d> {
    document: dom::Document<'d>,
    nodes: HashMap<NodeId, Node<'d>>,
    origins: HashMap<Node<'d>, QueryNode>,
}

impl<'d> View<'d> {
    pub(crate) fn build(package: &'d Package, source: &Document) -> Self {
        let document = package.as_document();
        let root = document.root();
        let mut view = Self {
            document,
            nodes: HashMap::new(),
            origins: HashMap::new(),
        };
        view.record(source.root(), Node::from(root));

        for &child in source.children(source.root()) {
            match source.kind(child) {
                NodeKind::Element(_) => {
                    if let Some(element) = view.copy_element(source, child) {
                        root.append_child(element);
                    }
                }
                NodeKind::Comment(text) => {
                    let comment = view.document.create_comment(text);
                    view.record(child, Node::from(comment));
                    root.append_child(comment);
                }
                NodeKind::ProcessingInstruction(content) => {
                    let instruction = view.copy_processing_instruction(content);
                    view.record(child, Node::from(instruction));
                    root.append_child(instruction);
                }
                _ => {}
            }
        }
        view
    }

    /// The copy of `id`, `None` if it is detached from the document.
    pub(crate) fn node(&self, id: NodeId) -> Option<Node<'d>> {
        self.nodes.get(&id).copied()
    }

    /// Convert an XPath result, mapping selected nodes back to the arena.
    pub(crate) fn value(&self, value: sxd_xpath::Value<'d>) -> Value {
        match value {
            sxd_xpath::Value::Boolean(value) => Value::Boolean(value),
            sxd_xpath::Value::Number(value) => Value::Number(value),
            sxd_xpath::Value::String(value) => Value::String(value),
            sxd_xpath::Value::Nodeset(nodes) => Value::NodeSet(
                nodes
                    .document_order()
                    .into_iter()
                    .filter_map(|node| self.origins.get(&node).copied())
                    .collect(),
            ),
        }
    }

    fn record(&mut self, id: NodeId, node: Node<'d>) {
        self.nodes.insert(id, node);
        self.origins.insert(node, QueryNode::Node(id));
    }

    fn copy_element(&mut self, source: &Document, id: NodeId) -> Option<dom::Element<'d>> {
        let element = source.element(id)?;
        let copy = self.document.create_element(QName::with_namespace_uri(
            non_empty(element.namespace.as_deref()),
            &element.local_name,
        ));
        copy.set_preferred_prefix(element.prefix.as_deref());
        for (prefix, uri) in element.namespace_declarations() {
            if let Some(prefix) = prefix {
                copy.register_prefix(prefix, uri);
            }
        }
        for (index, attribute) in element.attributes.iter().enumerate() {
            if attribute.is_namespace_declaration() {
                continue;
            }
            let name = QName::with_namespace_uri(
                non_empty(attribute.namespace.as_deref()),
                &attribute.local_name,
            );
            let copied = copy.set_attribute_value(name, &attribute.value);
            self.origins
                .insert(Node::from(copied), QueryNode::Attribute(id, index));
        }
        self.record(id, Node::from(copy));

        for &child in source.children(id) {
            match source.kind(child) {
                NodeKind::Element(_) => {
                    if let Some(element) = self.copy_element(source, child) {
                        copy.append_child(element);
                    }
                }
                NodeKind::Text(text) | NodeKind::CData(text) => {
                    let text = self.document.create_text(text);
                    self.record(child, Node::from(text));
                    copy.append_child(text);
                }
                NodeKind::Comment(text) => {
                    let comment = self.document.create_comment(text);
                    self.record(child, Node::from(comment));
                    copy.append_child(comment);
                }
                NodeKind::ProcessingInstruction(content) => {
                    let instruction = self.copy_processing_instruction(content);
                    self.record(child, Node::from(instruction));
                    copy.append_child(instruction);
                }
                NodeKind::Document => {}
            }
        }
        Some(copy)
    }

    fn copy_processing_instruction(&self, content: &str) -> dom::ProcessingInstruction<'d> {
        let content = content.trim_start();
        match content.split_once(char::is_whitespace) {
            Some((target, value)) => self
                .document
                .create_processing_instruction(target, Some(value.trim_start())),
            None => self.document.create_processing_instruction(content, None),
        }
    }
}

fn non_empty(namespace: Option<&str>) -> Option<&str> {
    namespace.filter(|namespace| !namespace.is_empty())
}
