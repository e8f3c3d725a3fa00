//! Rule-driven structural merging of XML documents.
//!
//! A template document describes elements that must exist in a target
//! document. Each template element is matched to its counterpart in the
//! target through an identity rule and merged with one of three strategies:
//!
//! - **combine** (default): template attributes overwrite or extend the
//!   target's, matched children are merged recursively and unmatched
//!   children are appended;
//! - **override**: the template subtree replaces the target subtree;
//! - **keep**: an existing target element is never touched.
//!
//! Rules and strategies are written as attributes in a reserved namespace
//! (see [`MERGE_NAMESPACE`]) that never reaches the merged output:
//!
//! ```xml
//! <project xmlns:merge="https://github.com/devonfw/IDEasy/merge">
//!   <component name="Git" merge:strategy="override"/>
//!   <option merge:id="@key" key="a" value="1"/>
//! </project>
//! ```
//!
//! Without a declared rule an element without attributes matches by
//! `name()`, and one with an `id` or `name` attribute matches by that
//! attribute.
//!
//! # Example
//!
//! ```rust
//! use xmerge::{MergeOptions, merge_documents};
//! use xmerge_xml::{WriteOptions, parse, write_document};
//!
//! let template = parse(r#"<list><item id="a" v="2"/></list>"#, "template.xml").unwrap();
//! let mut target = parse(r#"<list><item id="a" v="1" w="x"/></list>"#, "workspace.xml").unwrap();
//!
//! let report = merge_documents(&template, &mut target, &MergeOptions::default()).unwrap();
//! assert!(report.is_clean());
//! assert_eq!(
//!     write_document(&target, &WriteOptions::compact()).unwrap(),
//!     r#"<list><item id="a" v="2" w="x"/></list>"#
//! );
//! ```

pub mod attribute;
pub mod context;
pub mod error;
pub mod identity;
pub mod matcher;
pub mod merger;
pub mod node;
pub mod options;
pub mod resolver;
pub mod strategy;

pub use attribute::{MergeAttribute, is_reserved};
pub use context::{MergeContext, MergeReport, MergeWarning};
pub use error::{MergeError, MergeResult};
pub use identity::{IdentityRule, xpath_literal};
pub use matcher::ElementMatcher;
pub use merger::{MergeRun, merge_documents, merge_documents_with};
pub use node::MergeNode;
pub use options::{AmbiguityPolicy, MERGE_NAMESPACE, MergeOptions, MergeVocabulary};
pub use resolver::IdentityResolver;
pub use strategy::{MergeStrategy, ParseStrategyError, Strategy, strip_reserved};
