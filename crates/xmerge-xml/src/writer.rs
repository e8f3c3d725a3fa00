//! Serialization of [`Document`] trees.

use crate::types::{NodeId, NodeKind};
use crate::{Document, Error, Result};
use quick_xml::Writer;
use quick_xml::escape::partial_escape;
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesPI, BytesStart, BytesText, Event};

/// Output options for [`write_document`] and [`write_node`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOptions {
    /// Spaces per nesting level, `None` writes the tree as it is.
    pub indent: Option<usize>,

    /// Whether to write an `<?xml ...?>` declaration.
    pub declaration: bool,
}

impl WriteOptions {
    /// Indented output with a declaration, as used for saved files.
    pub fn pretty(indent: usize) -> Self {
        Self {
            indent: Some(indent),
            declaration: true,
        }
    }

    /// Unindented output without a declaration.
    pub fn compact() -> Self {
        Self {
            indent: None,
            declaration: false,
        }
    }
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self::pretty(2)
    }
}

fn write_error(err: impl std::fmt::Display) -> Error {
    Error::Write {
        message: err.to_string(),
    }
}

fn writer_for(options: &WriteOptions) -> Writer<Vec<u8>> {
    match options.indent {
        Some(indent) => Writer::new_with_indent(Vec::new(), b' ', indent),
        None => Writer::new(Vec::new()),
    }
}

fn finish(writer: Writer<Vec<u8>>, options: &WriteOptions) -> Result<String> {
    let mut output = String::from_utf8(writer.into_inner()).map_err(write_error)?;
    if options.indent.is_some() && !output.ends_with('\n') {
        output.push('\n');
    }
    Ok(output)
}

/// Serialize a whole document.
///
/// The declaration written is the one the document was parsed with, or a
/// UTF-8 1.0 declaration if it had none.
pub fn write_document(doc: &Document, options: &WriteOptions) -> Result<String> {
    let mut writer = writer_for(options);

    if options.declaration {
        let declaration = doc.declaration.clone().unwrap_or_default();
        writer
            .write_event(Event::Decl(BytesDecl::new(
                &declaration.version,
                declaration.encoding.as_deref(),
                declaration.standalone.as_deref(),
            )))
            .map_err(write_error)?;
        if options.indent.is_none() {
            writer
                .write_event(Event::Text(BytesText::from_escaped("\n")))
                .map_err(write_error)?;
        }
    }
    if let Some(doctype) = &doc.doctype {
        writer
            .write_event(Event::DocType(BytesText::from_escaped(doctype.as_str())))
            .map_err(write_error)?;
    }
    for child in doc.children(doc.root()) {
        write_tree(&mut writer, doc, *child)?;
    }

    finish(writer, options)
}

/// Serialize one node and its subtree.
///
/// Declarations are never written for a single node.
pub fn write_node(doc: &Document, node: NodeId, options: &WriteOptions) -> Result<String> {
    let mut writer = writer_for(options);
    write_tree(&mut writer, doc, node)?;
    finish(writer, options)
}

fn write_tree(writer: &mut Writer<Vec<u8>>, doc: &Document, node: NodeId) -> Result<()> {
    match doc.kind(node) {
        NodeKind::Document => {
            for child in doc.children(node) {
                write_tree(writer, doc, *child)?;
            }
        }
        NodeKind::Element(element) => {
            let name = element.tag_name();
            let mut start = BytesStart::new(name.as_str());
            for attribute in &element.attributes {
                let key = attribute.qualified_name();
                start.push_attribute((key.as_str(), attribute.value.as_str()));
            }
            let children = doc.children(node);
            if children.is_empty() {
                writer.write_event(Event::Empty(start)).map_err(write_error)?;
            } else {
                writer.write_event(Event::Start(start)).map_err(write_error)?;
                for child in children {
                    write_tree(writer, doc, *child)?;
                }
                writer
                    .write_event(Event::End(BytesEnd::new(name.as_str())))
                    .map_err(write_error)?;
            }
        }
        NodeKind::Text(text) => {
            writer
                .write_event(Event::Text(BytesText::from_escaped(partial_escape(text))))
                .map_err(write_error)?;
        }
        NodeKind::CData(text) => {
            writer
                .write_event(Event::CData(BytesCData::new(text.as_str())))
                .map_err(write_error)?;
        }
        NodeKind::Comment(text) => {
            writer
                .write_event(Event::Comment(BytesText::from_escaped(text.as_str())))
                .map_err(write_error)?;
        }
        NodeKind::ProcessingInstruction(content) => {
            writer
                .write_event(Event::PI(BytesPI::new(content.as_str())))
                .map_err(write_error)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_compact_roundtrip() {
        let source = r#"<root a="1"><child>text &amp; more</child><!--c--><empty/></root>"#;
        let doc = parse(source, "test").unwrap();
        assert_eq!(write_document(&doc, &WriteOptions::compact()).unwrap(), source);
    }

    #[test]
    fn test_pretty_output() {
        let mut doc = parse("<root>\n\n<a><b>x</b></a>   <c/></root>", "test").unwrap();
        let root = doc.root();
        doc.remove_blank_text(root);
        let output = write_document(&doc, &WriteOptions::pretty(2)).unwrap();
        assert_eq!(
            output,
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<root>\n  <a>\n    <b>x</b>\n  </a>\n  <c/>\n</root>\n"
        );
    }

    #[test]
    fn test_namespaced_output() {
        let source = r#"<m:root xmlns:m="urn:m" m:id="name()"><m:child/></m:root>"#;
        let doc = parse(source, "test").unwrap();
        assert_eq!(write_document(&doc, &WriteOptions::compact()).unwrap(), source);
    }

    #[test]
    fn test_write_node() {
        let doc = parse("<root><a x=\"1\"><b/></a></root>", "test").unwrap();
        let root = doc.document_element().unwrap();
        let a = doc.child_elements(root).next().unwrap();
        assert_eq!(
            write_node(&doc, a, &WriteOptions::compact()).unwrap(),
            "<a x=\"1\"><b/></a>"
        );
    }

    #[test]
    fn test_attribute_escaping() {
        let mut doc = parse("<root/>", "test").unwrap();
        let root = doc.document_element().unwrap();
        doc.set_attribute_value(root, "q", "a<\"b\"").unwrap();
        let output = write_document(&doc, &WriteOptions::compact()).unwrap();
        let reparsed = parse(&output, "test").unwrap();
        let root = reparsed.document_element().unwrap();
        assert_eq!(reparsed.element(root).unwrap().attribute_value("q"), Some("a<\"b\""));
    }
}
