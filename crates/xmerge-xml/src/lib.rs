//! Mutable, namespace-aware XML documents.
//!
//! This crate wraps [`quick-xml`] to provide an arena-backed [`Document`]
//! that can be parsed, navigated, edited and written back out. Every element
//! and attribute records the namespace URI its prefix resolved to at parse
//! time, so subtrees can be copied between documents with
//! [`Document::import_node`] and re-declared with
//! [`Document::declare_missing_namespaces`].
//!
//! # Example
//!
//! ```rust
//! use xmerge_xml::{parse, write_document, WriteOptions};
//!
//! let mut doc = parse(r#"<project><module name="core"/></project>"#, "inline").unwrap();
//! let root = doc.document_element().unwrap();
//! let module = doc.child_elements(root).next().unwrap();
//! doc.set_attribute_value(module, "name", "app").unwrap();
//!
//! let xml = write_document(&doc, &WriteOptions::compact()).unwrap();
//! assert_eq!(xml, r#"<project><module name="app"/></project>"#);
//! ```

pub mod document;
pub mod error;
pub mod parser;
pub mod types;
pub mod writer;

pub use document::Document;
pub use error::{Error, Result};
pub use parser::parse;
pub use types::{
    Attribute, Element, NodeId, NodeKind, QName, XML_NAMESPACE, XMLNS_NAMESPACE, XmlDeclaration,
};
pub use writer::{WriteOptions, write_document, write_node};
