//! Prefix bindings used to resolve name tests.

use std::collections::HashMap;

use xmerge_xml::{Document, NodeId};

/// Prefix-to-URI bindings plus the namespace unprefixed element names match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamespaceBindings {
    default_element_namespace: Option<String>,
    prefixes: HashMap<String, String>,
}

impl NamespaceBindings {
    /// Bindings with no prefixes; unprefixed element names match no-namespace elements.
    pub fn new() -> Self {
        Self::default()
    }

    /// The bindings in scope at `node`, including its default namespace.
    pub fn in_scope(doc: &Document, node: NodeId) -> Self {
        let mut bindings = Self::new();
        for (prefix, uri) in doc.in_scope_namespaces(node) {
            match prefix {
                Some(prefix) => bindings.bind(prefix, uri),
                None => bindings.default_element_namespace = Some(uri),
            }
        }
        bindings
    }

    /// Set the namespace unprefixed element name tests match.
    pub fn with_default_element_namespace(mut self, namespace: Option<&str>) -> Self {
        self.default_element_namespace = namespace.map(str::to_string);
        self
    }

    /// Bind a prefix.
    pub fn bind(&mut self, prefix: impl Into<String>, uri: impl Into<String>) {
        self.prefixes.insert(prefix.into(), uri.into());
    }

    /// Resolve a prefix.
    pub fn resolve(&self, prefix: &str) -> Option<&str> {
        self.prefixes.get(prefix).map(String::as_str)
    }

    pub fn prefixes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.prefixes
            .iter()
            .map(|(prefix, uri)| (prefix.as_str(), uri.as_str()))
    }

    /// The default element namespace, `None` when unset or empty.
    pub fn default_element_namespace(&self) -> Option<&str> {
        self.default_element_namespace
            .as_deref()
            .filter(|namespace| !namespace.is_empty())
    }

    /// A prefix with no binding, for naming the default element namespace.
    pub(crate) fn unbound_prefix(&self) -> String {
        (0..)
            .map(|i| format!("default{}", i))
            .find(|prefix| !self.prefixes.contains_key(prefix))
            .unwrap_or_default()
    }
}
