//! XML parser that builds mutable [`Document`] trees.

use crate::types::{Attribute, Element, NodeId, XML_NAMESPACE, XMLNS_NAMESPACE, XmlDeclaration};
use crate::{Document, Error, Result};
use quick_xml::Reader;
use quick_xml::events::{BytesDecl, BytesStart, Event};

/// Parse XML from a string.
///
/// `origin` names the document in error messages and is kept as
/// [`Document::origin`].
///
/// # Example
///
/// ```rust
/// use xmerge_xml::parse;
///
/// let doc = parse(r#"<root xmlns:m="urn:m"><m:child/></root>"#, "inline").unwrap();
/// let root = doc.document_element().unwrap();
/// let child = doc.child_elements(root).next().unwrap();
/// assert_eq!(doc.element(child).unwrap().namespace.as_deref(), Some("urn:m"));
/// ```
///
/// # Errors
///
/// Returns an error if the XML is malformed, has no or several root
/// elements, or uses an undeclared namespace prefix.
pub fn parse(content: &str, origin: &str) -> Result<Document> {
    let mut parser = XmlParser::new(content, origin);
    parser.parse()
}

/// Internal parser state.
struct XmlParser<'a> {
    /// The quick-xml reader.
    reader: Reader<&'a [u8]>,

    /// The document being built.
    document: Document,

    /// Open elements with the tag name they were opened with.
    stack: Vec<(NodeId, String)>,

    /// Namespace declarations per open element.
    scopes: Vec<Vec<(Option<String>, String)>>,
}

impl<'a> XmlParser<'a> {
    fn new(source: &'a str, origin: &str) -> Self {
        let mut reader = Reader::from_str(source);
        reader.config_mut().trim_text_start = false;
        reader.config_mut().trim_text_end = false;

        Self {
            reader,
            document: Document::new(origin),
            stack: Vec::new(),
            scopes: Vec::new(),
        }
    }

    fn origin(&self) -> String {
        self.document.origin().to_string()
    }

    fn parse(&mut self) -> Result<Document> {
        loop {
            match self.reader.read_event() {
                Ok(Event::Start(e)) => {
                    let (id, name) = self.handle_start(&e)?;
                    self.stack.push((id, name));
                }
                Ok(Event::End(e)) => {
                    let found = String::from_utf8_lossy(e.name().as_ref()).to_string();
                    let (_, expected) = self.stack.pop().ok_or_else(|| Error::InvalidStructure {
                        origin: self.origin(),
                        message: format!("Unexpected closing tag </{}>", found),
                    })?;
                    self.scopes.pop();
                    if expected != found {
                        return Err(Error::MismatchedEndTag {
                            origin: self.origin(),
                            expected,
                            found,
                        });
                    }
                }
                Ok(Event::Empty(e)) => {
                    self.handle_start(&e)?;
                    self.scopes.pop();
                }
                Ok(Event::Text(e)) => {
                    let text = e.unescape().map_err(|err| Error::XmlSyntax {
                        origin: self.origin(),
                        message: format!("Invalid text content: {}", err),
                        position: Some(self.reader.buffer_position()),
                    })?;
                    self.handle_text(text.into_owned())?;
                }
                Ok(Event::CData(e)) => {
                    let text = String::from_utf8_lossy(e.as_ref()).to_string();
                    let id = self.document.create_cdata(text);
                    self.attach(id)?;
                }
                Ok(Event::Comment(e)) => {
                    let text = String::from_utf8_lossy(e.as_ref()).to_string();
                    let id = self.document.create_comment(text);
                    self.attach(id)?;
                }
                Ok(Event::PI(e)) => {
                    let content = String::from_utf8_lossy(e.as_ref()).to_string();
                    let id = self.document.create_processing_instruction(content);
                    self.attach(id)?;
                }
                Ok(Event::Decl(e)) => {
                    self.document.declaration = Some(self.read_declaration(&e)?);
                }
                Ok(Event::DocType(e)) => {
                    self.document.doctype = Some(String::from_utf8_lossy(e.as_ref()).to_string());
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(Error::XmlSyntax {
                        origin: self.origin(),
                        message: e.to_string(),
                        position: Some(self.reader.error_position()),
                    });
                }
            }
        }

        if let Some((_, name)) = self.stack.last() {
            return Err(Error::UnexpectedEof {
                origin: self.origin(),
                expected: format!("closing tag </{}>", name),
            });
        }
        if self.document.document_element().is_none() {
            return Err(Error::EmptyDocument {
                origin: self.origin(),
            });
        }

        let origin = self.origin();
        Ok(std::mem::replace(&mut self.document, Document::new(origin)))
    }

    /// Attach a node to the innermost open element, or to the document node.
    fn attach(&mut self, id: NodeId) -> Result<()> {
        let parent = self
            .stack
            .last()
            .map_or(self.document.root(), |(parent, _)| *parent);
        self.document.append_child(parent, id)
    }

    fn handle_start(&mut self, e: &BytesStart<'_>) -> Result<(NodeId, String)> {
        let tag_name = String::from_utf8_lossy(e.name().as_ref()).to_string();
        let (prefix, local_name) = split_name(&tag_name);

        let mut raw_attributes = Vec::new();
        for attr_result in e.attributes() {
            let attr = attr_result.map_err(|err| Error::XmlSyntax {
                origin: self.origin(),
                message: format!("Invalid attribute: {}", err),
                position: Some(self.reader.buffer_position()),
            })?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
            let value = attr.unescape_value().map_err(|err| Error::XmlSyntax {
                origin: self.origin(),
                message: format!("Invalid attribute value: {}", err),
                position: Some(self.reader.buffer_position()),
            })?;
            raw_attributes.push((key, value.into_owned()));
        }

        // Declarations on this element are in scope for its own name and attributes.
        let declarations = raw_attributes
            .iter()
            .filter_map(|(key, value)| match split_name(key) {
                (None, "xmlns") => Some((None, value.clone())),
                (Some("xmlns"), declared) => Some((Some(declared.to_string()), value.clone())),
                _ => None,
            })
            .collect();
        self.scopes.push(declarations);

        let namespace = self.resolve(prefix, &tag_name)?;
        let mut element = Element::new(prefix, local_name, namespace.as_deref());
        for (key, value) in raw_attributes {
            let attribute = match split_name(&key) {
                (None, "xmlns") => Attribute::namespace_declaration(None, value),
                (Some("xmlns"), declared) => Attribute::namespace_declaration(Some(declared), value),
                (Some(prefix), local) => {
                    let namespace = self.resolve(Some(prefix), &tag_name)?.unwrap_or_default();
                    Attribute::namespaced(prefix, local, namespace, value)
                }
                (None, local) => Attribute::new(local, value),
            };
            element.attributes.push(attribute);
        }

        let id = self.document.create_element(element);
        if self.stack.is_empty() && self.document.document_element().is_some() {
            return Err(Error::MultipleRoots {
                origin: self.origin(),
            });
        }
        self.attach(id)?;
        Ok((id, tag_name))
    }

    /// Resolve a prefix against the open scopes.
    fn resolve(&self, prefix: Option<&str>, element_name: &str) -> Result<Option<String>> {
        match prefix {
            Some("xml") => return Ok(Some(XML_NAMESPACE.to_string())),
            Some("xmlns") => return Ok(Some(XMLNS_NAMESPACE.to_string())),
            _ => {}
        }
        let bound = self
            .scopes
            .iter()
            .rev()
            .flat_map(|scope| scope.iter())
            .find(|(declared, _)| declared.as_deref() == prefix)
            .map(|(_, uri)| uri.clone());
        match (prefix, bound) {
            (None, bound) => Ok(bound.filter(|uri| !uri.is_empty())),
            (Some(_), Some(uri)) if !uri.is_empty() => Ok(Some(uri)),
            (Some(prefix), _) => Err(Error::UnboundPrefix {
                origin: self.origin(),
                prefix: prefix.to_string(),
                name: element_name.to_string(),
            }),
        }
    }

    fn handle_text(&mut self, text: String) -> Result<()> {
        if self.stack.is_empty() {
            if text.trim().is_empty() {
                return Ok(());
            }
            return Err(Error::InvalidStructure {
                origin: self.origin(),
                message: "Text content outside of the root element".to_string(),
            });
        }
        let id = self.document.create_text(text);
        self.attach(id)
    }

    fn read_declaration(&self, e: &BytesDecl<'_>) -> Result<XmlDeclaration> {
        let version = e.version().map_err(|err| self.declaration_error(err))?;
        let encoding = e
            .encoding()
            .transpose()
            .map_err(|err| self.declaration_error(err))?;
        let standalone = e
            .standalone()
            .transpose()
            .map_err(|err| self.declaration_error(err))?;
        Ok(XmlDeclaration {
            version: String::from_utf8_lossy(&version).to_string(),
            encoding: encoding.map(|v| String::from_utf8_lossy(&v).to_string()),
            standalone: standalone.map(|v| String::from_utf8_lossy(&v).to_string()),
        })
    }

    fn declaration_error(&self, err: impl std::fmt::Display) -> Error {
        Error::XmlSyntax {
            origin: self.origin(),
            message: format!("Invalid XML declaration: {}", err),
            position: Some(0),
        }
    }
}

/// Split `prefix:local` into its parts.
fn split_name(name: &str) -> (Option<&str>, &str) {
    match name.split_once(':') {
        Some((prefix, local)) => (Some(prefix), local),
        None => (None, name),
    }
}
