//! The mutable arena document.
//!
//! All nodes of a [`Document`] live in one vector and refer to each other by
//! [`NodeId`]. Detaching a node never frees its slot, so ids stay valid for
//! the lifetime of the document. Nodes never move between documents; a copy
//! is made with [`Document::import_node`] instead.

use crate::types::{Attribute, Element, NodeId, NodeKind, XML_NAMESPACE, XMLNS_NAMESPACE, XmlDeclaration};
use crate::{Error, Result};

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// A namespace-aware, mutable XML document.
#[derive(Debug, Clone)]
pub struct Document {
    /// Where the document came from (file path or label), used in diagnostics.
    origin: String,

    nodes: Vec<NodeData>,

    /// The `<?xml ...?>` declaration, if the source had one.
    pub declaration: Option<XmlDeclaration>,

    /// Raw DOCTYPE content, if the source had one.
    pub doctype: Option<String>,
}

impl Document {
    /// Create an empty document holding only the document node.
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            nodes: vec![NodeData {
                kind: NodeKind::Document,
                parent: None,
                children: Vec::new(),
            }],
            declaration: None,
            doctype: None,
        }
    }

    /// The diagnostics identity of this document.
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Change the diagnostics identity, e.g. after the document was saved elsewhere.
    pub fn set_origin(&mut self, origin: impl Into<String>) {
        self.origin = origin.into();
    }

    /// The synthetic document node.
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// The single top-level element, if any.
    pub fn document_element(&self) -> Option<NodeId> {
        self.child_elements(self.root()).next()
    }

    fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0]
    }

    fn data_mut(&mut self, id: NodeId) -> &mut NodeData {
        &mut self.nodes[id.0]
    }

    /// Kind and payload of a node.
    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.data(id).kind
    }

    /// Element data, if the node is an element.
    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match &self.data(id).kind {
            NodeKind::Element(element) => Some(element),
            _ => None,
        }
    }

    /// Mutable element data, if the node is an element.
    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match &mut self.data_mut(id).kind {
            NodeKind::Element(element) => Some(element),
            _ => None,
        }
    }

    /// Whether the node is an element.
    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.data(id).kind, NodeKind::Element(_))
    }

    /// Parent of a node, `None` for the document node and detached nodes.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.data(id).parent
    }

    /// Parent of a node if that parent is an element.
    pub fn parent_element(&self, id: NodeId) -> Option<NodeId> {
        self.parent(id).filter(|p| self.is_element(*p))
    }

    /// Children of a node in document order.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.data(id).children
    }

    /// Element children of a node in document order.
    pub fn child_elements(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(id)
            .iter()
            .copied()
            .filter(|c| self.is_element(*c))
    }

    /// Content of a text or CDATA node.
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.data(id).kind {
            NodeKind::Text(text) | NodeKind::CData(text) => Some(text),
            _ => None,
        }
    }

    /// Concatenated text of all text and CDATA descendants.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut content = String::new();
        for node in self.descendants(id) {
            if let Some(text) = self.text(node) {
                content.push_str(text);
            }
        }
        content
    }

    /// The node and all of its descendants in document order.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut stack = vec![id];
        while let Some(node) = stack.pop() {
            result.push(node);
            stack.extend(self.children(node).iter().rev().copied());
        }
        result
    }

    /// Ancestors of a node, nearest first, ending with the document node.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut current = self.parent(id);
        while let Some(node) = current {
            result.push(node);
            current = self.parent(node);
        }
        result
    }

    /// Whether `ancestor` is `node` or one of its ancestors.
    pub fn is_ancestor_or_self(&self, ancestor: NodeId, node: NodeId) -> bool {
        ancestor == node || self.ancestors(node).contains(&ancestor)
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData {
            kind,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    /// Create a detached element.
    pub fn create_element(&mut self, element: Element) -> NodeId {
        self.push(NodeKind::Element(element))
    }

    /// Create a detached text node.
    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.push(NodeKind::Text(text.into()))
    }

    /// Create a detached CDATA section.
    pub fn create_cdata(&mut self, text: impl Into<String>) -> NodeId {
        self.push(NodeKind::CData(text.into()))
    }

    /// Create a detached comment.
    pub fn create_comment(&mut self, text: impl Into<String>) -> NodeId {
        self.push(NodeKind::Comment(text.into()))
    }

    /// Create a detached processing instruction.
    pub fn create_processing_instruction(&mut self, content: impl Into<String>) -> NodeId {
        self.push(NodeKind::ProcessingInstruction(content.into()))
    }

    fn check_attachable(&self, parent: NodeId, child: NodeId) -> Result<()> {
        if !matches!(self.kind(parent), NodeKind::Element(_) | NodeKind::Document) {
            return Err(Error::InvalidNode {
                node: parent,
                operation: "have children",
            });
        }
        if child == self.root() || self.data(child).parent.is_some() {
            return Err(Error::AlreadyAttached(child));
        }
        if self.is_ancestor_or_self(child, parent) {
            return Err(Error::InvalidNode {
                node: child,
                operation: "become its own descendant",
            });
        }
        if parent == self.root() && self.is_element(child) && self.document_element().is_some() {
            return Err(Error::InvalidNode {
                node: child,
                operation: "become a second document element",
            });
        }
        Ok(())
    }

    /// Append a detached node as the last child of `parent`.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.check_attachable(parent, child)?;
        self.data_mut(child).parent = Some(parent);
        self.data_mut(parent).children.push(child);
        Ok(())
    }

    /// Replace the attached node `old` with the detached node `new`.
    ///
    /// `old` keeps its subtree but becomes detached.
    pub fn replace_child(&mut self, old: NodeId, new: NodeId) -> Result<()> {
        let parent = self.parent(old).ok_or(Error::Detached(old))?;
        if new == self.root() || self.data(new).parent.is_some() {
            return Err(Error::AlreadyAttached(new));
        }
        if self.is_ancestor_or_self(new, parent) {
            return Err(Error::InvalidNode {
                node: new,
                operation: "become its own descendant",
            });
        }
        let position = self
            .children(parent)
            .iter()
            .position(|c| *c == old)
            .ok_or(Error::Detached(old))?;
        self.data_mut(parent).children[position] = new;
        self.data_mut(new).parent = Some(parent);
        self.data_mut(old).parent = None;
        Ok(())
    }

    /// Remove a node from its parent.
    pub fn detach(&mut self, node: NodeId) -> Result<()> {
        let parent = self.parent(node).ok_or(Error::Detached(node))?;
        self.data_mut(parent).children.retain(|c| *c != node);
        self.data_mut(node).parent = None;
        Ok(())
    }

    fn element_for_update(&mut self, id: NodeId, operation: &'static str) -> Result<&mut Element> {
        self.element_mut(id)
            .ok_or(Error::InvalidNode { node: id, operation })
    }

    /// Set an attribute, replacing one with the same namespace and local name.
    ///
    /// A replaced attribute keeps its position and prefix.
    pub fn set_attribute(&mut self, element: NodeId, attribute: Attribute) -> Result<()> {
        let element = self.element_for_update(element, "carry attributes")?;
        match element
            .attributes
            .iter_mut()
            .find(|a| a.has_name(attribute.namespace.as_deref(), &attribute.local_name))
        {
            Some(existing) => existing.value = attribute.value,
            None => element.attributes.push(attribute),
        }
        Ok(())
    }

    /// Set the value of an existing attribute or add a no-namespace one.
    pub fn set_attribute_value(
        &mut self,
        element: NodeId,
        local_name: &str,
        value: impl Into<String>,
    ) -> Result<()> {
        self.set_attribute(element, Attribute::new(local_name, value))
    }

    /// Remove an attribute by namespace URI and local name.
    pub fn remove_attribute(
        &mut self,
        element: NodeId,
        namespace: Option<&str>,
        local_name: &str,
    ) -> Result<Option<Attribute>> {
        let element = self.element_for_update(element, "carry attributes")?;
        let position = element
            .attributes
            .iter()
            .position(|a| a.has_name(namespace, local_name));
        Ok(position.map(|p| element.attributes.remove(p)))
    }

    /// Keep only the attributes for which `keep` returns `true`.
    ///
    /// Returns the removed attributes in their original order.
    pub fn retain_attributes(
        &mut self,
        element: NodeId,
        mut keep: impl FnMut(&Attribute) -> bool,
    ) -> Result<Vec<Attribute>> {
        let element = self.element_for_update(element, "carry attributes")?;
        let (kept, removed) = std::mem::take(&mut element.attributes)
            .into_iter()
            .partition(|a| keep(a));
        element.attributes = kept;
        Ok(removed)
    }

    /// Replace the content of a text or CDATA node.
    pub fn set_text(&mut self, node: NodeId, value: impl Into<String>) -> Result<()> {
        match &mut self.data_mut(node).kind {
            NodeKind::Text(text) | NodeKind::CData(text) => {
                *text = value.into();
                Ok(())
            }
            _ => Err(Error::InvalidNode {
                node,
                operation: "hold text",
            }),
        }
    }

    /// Remove whitespace-only text nodes below `node`.
    ///
    /// CDATA sections are kept even when blank.
    pub fn remove_blank_text(&mut self, node: NodeId) {
        for id in self.descendants(node) {
            let blank = matches!(&self.data(id).kind, NodeKind::Text(text) if text.trim().is_empty());
            if blank && self.parent(id).is_some() {
                // parent checked above
                let _ = self.detach(id);
            }
        }
    }

    /// Deep-copy `node` of `source` into this document.
    ///
    /// The copy is detached; attach it with [`append_child`](Self::append_child)
    /// or [`replace_child`](Self::replace_child). Importing a document node
    /// imports its document element.
    pub fn import_node(&mut self, source: &Document, node: NodeId) -> Result<NodeId> {
        let node = match source.kind(node) {
            NodeKind::Document => source.document_element().ok_or(Error::InvalidNode {
                node,
                operation: "be imported without a document element",
            })?,
            _ => node,
        };
        let copy = self.push(source.kind(node).clone());
        for child in source.children(node) {
            let child_copy = self.import_node(source, *child)?;
            self.data_mut(child_copy).parent = Some(copy);
            self.data_mut(copy).children.push(child_copy);
        }
        Ok(copy)
    }

    /// Resolve a prefix to its namespace URI as seen from `node`.
    ///
    /// `None` asks for the default namespace. An empty declaration
    /// (`xmlns=""`) resolves to `None`.
    pub fn lookup_namespace_uri(&self, node: NodeId, prefix: Option<&str>) -> Option<&str> {
        match prefix {
            Some("xml") => return Some(XML_NAMESPACE),
            Some("xmlns") => return Some(XMLNS_NAMESPACE),
            _ => {}
        }
        let mut current = Some(node);
        while let Some(id) = current {
            if let Some(element) = self.element(id) {
                if let Some((_, uri)) = element
                    .namespace_declarations()
                    .find(|(declared, _)| *declared == prefix)
                {
                    return (!uri.is_empty()).then_some(uri);
                }
            }
            current = self.parent(id);
        }
        None
    }

    /// Find a non-default prefix bound to `uri` as seen from `node`.
    pub fn lookup_prefix(&self, node: NodeId, uri: &str) -> Option<&str> {
        self.in_scope_declarations(node)
            .into_iter()
            .find_map(|(prefix, bound)| match prefix {
                Some(prefix) if bound == uri => Some(prefix),
                _ => None,
            })
    }

    fn in_scope_declarations(&self, node: NodeId) -> Vec<(Option<&str>, &str)> {
        let mut seen: Vec<(Option<&str>, &str)> = Vec::new();
        let mut current = Some(node);
        while let Some(id) = current {
            if let Some(element) = self.element(id) {
                for (prefix, uri) in element.namespace_declarations() {
                    if !seen.iter().any(|(p, _)| *p == prefix) {
                        seen.push((prefix, uri));
                    }
                }
            }
            current = self.parent(id);
        }
        seen
    }

    /// All namespace bindings in scope at `node`, nearest declarations winning.
    ///
    /// `(None, uri)` is the default namespace; undeclared defaults are omitted.
    pub fn in_scope_namespaces(&self, node: NodeId) -> Vec<(Option<String>, String)> {
        self.in_scope_declarations(node)
            .into_iter()
            .filter(|(_, uri)| !uri.is_empty())
            .map(|(prefix, uri)| (prefix.map(str::to_string), uri.to_string()))
            .collect()
    }

    /// Add the namespace declarations the subtree at `node` needs at its
    /// current position.
    ///
    /// Every element and prefixed attribute records its namespace URI, so an
    /// imported subtree carries enough information to re-declare the bindings
    /// it lost when it was cut from its original ancestors. Declarations are
    /// placed on `node` where possible and on the element itself when a
    /// nested declaration shadows the prefix.
    pub fn declare_missing_namespaces(&mut self, node: NodeId) -> Result<()> {
        for id in self.descendants(node) {
            let Some(element) = self.element(id) else {
                continue;
            };
            let mut required: Vec<(Option<String>, Option<String>)> =
                vec![(element.prefix.clone(), element.namespace.clone())];
            for attribute in &element.attributes {
                if attribute.prefix.is_some() && !attribute.is_namespace_declaration() {
                    required.push((attribute.prefix.clone(), attribute.namespace.clone()));
                }
            }
            for (prefix, namespace) in required {
                if prefix.as_deref() == Some("xml") {
                    continue;
                }
                self.declare_binding(node, id, prefix.as_deref(), namespace.as_deref())?;
            }
        }
        Ok(())
    }

    fn declare_binding(
        &mut self,
        root: NodeId,
        element: NodeId,
        prefix: Option<&str>,
        namespace: Option<&str>,
    ) -> Result<()> {
        if self.lookup_namespace_uri(element, prefix) == namespace {
            return Ok(());
        }
        let declaration = Attribute::namespace_declaration(prefix, namespace.unwrap_or_default());
        let root_declares = self
            .element(root)
            .is_some_and(|e| e.namespace_declarations().any(|(p, _)| p == prefix));
        if !root_declares {
            self.set_attribute(root, declaration.clone())?;
            if self.lookup_namespace_uri(element, prefix) == namespace {
                return Ok(());
            }
        }
        self.set_attribute(element, declaration)
    }
}
