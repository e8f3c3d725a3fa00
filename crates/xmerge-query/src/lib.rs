//! Structural queries over xmerge documents.
//!
//! Identity rules are XPath 1.0 expressions. Parsing and evaluation are done
//! by [`sxd_xpath`] against an [`sxd_document`] copy of the document; this
//! crate maps the result back to the arena and supplies the one thing XPath
//! 1.0 lacks for templates, a default element namespace (see
//! [`NamespaceBindings::in_scope`]).
//!
//! # Example
//!
//! ```rust
//! use xmerge_query::{NamespaceBindings, Query};
//! use xmerge_xml::parse;
//!
//! let doc = parse(r#"<list><item id="a"/><item id="b"/></list>"#, "inline").unwrap();
//! let root = doc.document_element().unwrap();
//!
//! let query = Query::compile("item[@id='b']").unwrap();
//! let found = query.select_elements(&doc, root, &NamespaceBindings::new()).unwrap();
//! assert_eq!(found.len(), 1);
//! ```

pub mod bindings;
pub mod error;
mod names;
mod view;

use std::fmt;

pub use bindings::NamespaceBindings;
pub use error::{QueryError, QueryResult};

use sxd_document::Package;
use sxd_xpath::{Context, Factory, XPath};
use xmerge_xml::{Document, NodeId};

use view::View;

/// A node selected by a query.
///
/// Attributes are not nodes of the document arena, so they are addressed
/// through their owner element and their index in its attribute list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryNode {
    Node(NodeId),
    Attribute(NodeId, usize),
}

impl QueryNode {
    /// The arena node, or the owner element of an attribute.
    pub fn node_id(self) -> NodeId {
        match self {
            QueryNode::Node(id) | QueryNode::Attribute(id, _) => id,
        }
    }
}

/// The four XPath 1.0 value types.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    NodeSet(Vec<QueryNode>),
    String(String),
    Number(f64),
    Boolean(bool),
}

/// A compiled query.
pub struct Query {
    source: String,
    xpath: XPath,
}

impl Query {
    /// Compile an XPath 1.0 expression.
    pub fn compile(source: &str) -> QueryResult<Self> {
        Ok(Self {
            source: source.to_string(),
            xpath: build(source)?,
        })
    }

    /// The expression as written.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Evaluate with `context` as the context node.
    ///
    /// Prefixes resolve through `bindings`. When the bindings carry a default
    /// element namespace, unprefixed element name tests match elements in it.
    pub fn evaluate(
        &self,
        doc: &Document,
        context: NodeId,
        bindings: &NamespaceBindings,
    ) -> QueryResult<Value> {
        let tests = names::name_tests(&self.source);
        if let Some(prefix) = tests
            .iter()
            .filter_map(|test| test.prefix)
            .find(|prefix| bindings.resolve(prefix).is_none())
        {
            return Err(QueryError::UnboundPrefix {
                prefix: prefix.to_string(),
            });
        }

        let default_namespace = bindings
            .default_element_namespace()
            .filter(|_| tests.iter().any(|test| test.is_unprefixed_element_name()))
            .map(|namespace| (bindings.unbound_prefix(), namespace));
        let qualified = match &default_namespace {
            Some((prefix, _)) => {
                let source = names::qualify_element_names(&self.source, prefix);
                tracing::trace!(query = %self.source, qualified = %source, "Qualified element names");
                Some(build(&source)?)
            }
            None => None,
        };
        let xpath = qualified.as_ref().unwrap_or(&self.xpath);

        let package = Package::new();
        let view = View::build(&package, doc);
        let node = view
            .node(context)
            .ok_or(QueryError::DetachedContext { node: context })?;

        let mut xpath_context = Context::new();
        for (prefix, uri) in bindings.prefixes() {
            xpath_context.set_namespace(prefix, uri);
        }
        if let Some((prefix, namespace)) = &default_namespace {
            xpath_context.set_namespace(prefix, namespace);
        }

        let value = xpath
            .evaluate(&xpath_context, node)
            .map_err(|err| QueryError::Evaluation {
                expression: self.source.clone(),
                message: err.to_string(),
            })?;
        Ok(view.value(value))
    }

    /// Evaluate to a node-set in document order without duplicates.
    pub fn select(
        &self,
        doc: &Document,
        context: NodeId,
        bindings: &NamespaceBindings,
    ) -> QueryResult<Vec<QueryNode>> {
        match self.evaluate(doc, context, bindings)? {
            Value::NodeSet(nodes) => Ok(nodes),
            other => Err(QueryError::Type {
                message: format!("query '{}' does not select nodes ({:?})", self.source, other),
            }),
        }
    }

    /// Like [`select`](Self::select), keeping element nodes only.
    pub fn select_elements(
        &self,
        doc: &Document,
        context: NodeId,
        bindings: &NamespaceBindings,
    ) -> QueryResult<Vec<NodeId>> {
        Ok(self
            .select(doc, context, bindings)?
            .into_iter()
            .filter_map(|node| match node {
                QueryNode::Node(id) if doc.is_element(id) => Some(id),
                _ => None,
            })
            .collect())
    }
}

fn build(source: &str) -> QueryResult<XPath> {
    Factory::new()
        .build(source)
        .map_err(|err| QueryError::Syntax {
            expression: source.to_string(),
            message: err.to_string(),
        })?
        .ok_or_else(|| QueryError::Syntax {
            expression: source.to_string(),
            message: "empty expression".to_string(),
        })
}

impl fmt::Debug for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query").field("source", &self.source).finish()
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
