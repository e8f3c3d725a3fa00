//! Core types for the mutable XML document model.

use std::fmt;

/// Namespace URI bound to every `xmlns` / `xmlns:*` declaration attribute.
pub const XMLNS_NAMESPACE: &str = "http://www.w3.org/2000/xmlns/";

/// Namespace URI implicitly bound to the `xml` prefix.
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// Handle of a node inside one [`Document`](crate::Document) arena.
///
/// A `NodeId` is only meaningful for the document that created it. Moving a
/// node between documents always goes through
/// [`Document::import_node`](crate::Document::import_node).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Raw arena index, useful for diagnostics.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Qualified name: namespace URI plus local name.
///
/// The prefix is deliberately not part of the name, two elements written as
/// `a:item` and `b:item` are the same `QName` when both prefixes resolve to
/// the same URI.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QName {
    /// Namespace URI, `None` for names in no namespace.
    pub namespace: Option<String>,

    /// Local part of the name.
    pub local_name: String,
}

impl QName {
    /// Create a new qualified name.
    pub fn new(namespace: Option<&str>, local_name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.map(str::to_string),
            local_name: local_name.into(),
        }
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(namespace) => write!(f, "{{{}}}{}", namespace, self.local_name),
            None => f.write_str(&self.local_name),
        }
    }
}

/// An attribute of an element.
///
/// Namespace declarations are kept as ordinary attributes in the
/// [`XMLNS_NAMESPACE`] so that callers can inspect and strip them like any
/// other attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Prefix as written in the source, if any.
    pub prefix: Option<String>,

    /// Local name of the attribute.
    pub local_name: String,

    /// Resolved namespace URI, `None` for unprefixed attributes.
    pub namespace: Option<String>,

    /// Attribute value (entities already unescaped).
    pub value: String,
}

impl Attribute {
    /// Create an attribute in no namespace.
    pub fn new(local_name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            prefix: None,
            local_name: local_name.into(),
            namespace: None,
            value: value.into(),
        }
    }

    /// Create a namespaced attribute written as `prefix:local_name`.
    pub fn namespaced(
        prefix: impl Into<String>,
        local_name: impl Into<String>,
        namespace: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            prefix: Some(prefix.into()),
            local_name: local_name.into(),
            namespace: Some(namespace.into()),
            value: value.into(),
        }
    }

    /// Create a namespace declaration. `None` declares the default namespace.
    pub fn namespace_declaration(prefix: Option<&str>, uri: impl Into<String>) -> Self {
        match prefix {
            Some(prefix) => Self::namespaced("xmlns", prefix, XMLNS_NAMESPACE, uri),
            None => Self {
                prefix: None,
                local_name: "xmlns".to_string(),
                namespace: Some(XMLNS_NAMESPACE.to_string()),
                value: uri.into(),
            },
        }
    }

    /// The name as written, e.g. `merge:id` or `name`.
    pub fn qualified_name(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}:{}", prefix, self.local_name),
            None => self.local_name.clone(),
        }
    }

    /// Namespace URI plus local name.
    pub fn qname(&self) -> QName {
        QName::new(self.namespace.as_deref(), self.local_name.clone())
    }

    /// Whether this attribute is an `xmlns` or `xmlns:*` declaration.
    pub fn is_namespace_declaration(&self) -> bool {
        self.namespace.as_deref() == Some(XMLNS_NAMESPACE)
    }

    /// The prefix declared by this attribute.
    ///
    /// Returns `None` when the attribute is not a namespace declaration,
    /// `Some(None)` for a default namespace declaration and `Some(Some(p))`
    /// for `xmlns:p`.
    pub fn declared_prefix(&self) -> Option<Option<&str>> {
        if !self.is_namespace_declaration() {
            return None;
        }
        match self.prefix.as_deref() {
            Some(_) => Some(Some(self.local_name.as_str())),
            None => Some(None),
        }
    }

    /// Whether this attribute matches the given namespace and local name.
    pub fn has_name(&self, namespace: Option<&str>, local_name: &str) -> bool {
        self.namespace.as_deref() == namespace && self.local_name == local_name
    }
}

/// Data of an element node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Prefix as written in the source, if any.
    pub prefix: Option<String>,

    /// Local name of the element.
    pub local_name: String,

    /// Resolved namespace URI.
    pub namespace: Option<String>,

    /// Attributes in document order, unique by qualified name.
    pub attributes: Vec<Attribute>,
}

impl Element {
    /// Create an element without attributes.
    pub fn new(prefix: Option<&str>, local_name: impl Into<String>, namespace: Option<&str>) -> Self {
        Self {
            prefix: prefix.map(str::to_string),
            local_name: local_name.into(),
            namespace: namespace.map(str::to_string),
            attributes: Vec::new(),
        }
    }

    /// The tag name as written, e.g. `csl:text`.
    pub fn tag_name(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}:{}", prefix, self.local_name),
            None => self.local_name.clone(),
        }
    }

    /// Namespace URI plus local name.
    pub fn qname(&self) -> QName {
        QName::new(self.namespace.as_deref(), self.local_name.clone())
    }

    /// Find an attribute by namespace URI and local name.
    pub fn attribute(&self, namespace: Option<&str>, local_name: &str) -> Option<&Attribute> {
        self.attributes
            .iter()
            .find(|a| a.has_name(namespace, local_name))
    }

    /// Value of a no-namespace attribute.
    pub fn attribute_value(&self, local_name: &str) -> Option<&str> {
        self.attribute(None, local_name).map(|a| a.value.as_str())
    }

    /// Find an attribute by the name it is written with (`prefix:local` or `local`).
    pub fn attribute_by_qualified_name(&self, qualified_name: &str) -> Option<&Attribute> {
        self.attributes
            .iter()
            .find(|a| a.qualified_name() == qualified_name)
    }

    /// Whether a no-namespace attribute with this name exists.
    pub fn has_attribute(&self, local_name: &str) -> bool {
        self.attribute(None, local_name).is_some()
    }

    /// The namespace declarations made on this element.
    pub fn namespace_declarations(&self) -> impl Iterator<Item = (Option<&str>, &str)> {
        self.attributes
            .iter()
            .filter_map(|a| a.declared_prefix().map(|p| (p, a.value.as_str())))
    }
}

/// The kind and payload of a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// The synthetic document node owning the document element.
    Document,

    /// An element.
    Element(Element),

    /// Character data (entities already unescaped).
    Text(String),

    /// A CDATA section.
    CData(String),

    /// A comment.
    Comment(String),

    /// A processing instruction, target and content kept verbatim.
    ProcessingInstruction(String),
}

impl NodeKind {
    /// Whether this is a text or CDATA node.
    pub fn is_textual(&self) -> bool {
        matches!(self, NodeKind::Text(_) | NodeKind::CData(_))
    }
}

/// The `<?xml ...?>` declaration of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlDeclaration {
    pub version: String,
    pub encoding: Option<String>,
    pub standalone: Option<String>,
}

impl Default for XmlDeclaration {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            encoding: Some("UTF-8".to_string()),
            standalone: None,
        }
    }
}
