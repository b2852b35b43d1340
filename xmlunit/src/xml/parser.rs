//! XML parser that builds node trees.
//!
//! This parser uses quick-xml's streaming API and assembles the read-only
//! tree bottom-up: an element node is created when its end tag is seen.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::debug;

use super::{parse_doctype, resolve_reference};
use crate::error::{Error, Result};
use crate::node::{DocumentInfo, NamespaceContext, Node, NodeRef, QName};

/// An element whose end tag has not been seen yet.
struct OpenElement {
    name: QName,
    attributes: Vec<NodeRef>,
    namespace_decls: Vec<(String, String)>,
    children: Vec<NodeRef>,
}

/// XML parser that builds node trees.
#[derive(Debug, Default, Clone, Copy)]
pub struct XmlParser;

impl XmlParser {
    /// Creates a new parser.
    pub fn new() -> Self {
        XmlParser
    }

    /// Parses XML from a string.
    pub fn parse_str(&self, xml: &str) -> Result<NodeRef> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text_start = false;
        reader.config_mut().trim_text_end = false;
        self.parse_reader(&mut reader)
    }

    /// Parses XML from a file.
    pub fn parse_file<P: AsRef<Path>>(&self, path: P) -> Result<NodeRef> {
        debug!(path = %path.as_ref().display(), "loading document");
        let file = File::open(path)?;
        let mut reader = Reader::from_reader(BufReader::new(file));
        reader.config_mut().trim_text_start = false;
        reader.config_mut().trim_text_end = false;
        self.parse_reader(&mut reader)
    }

    /// Parses XML from a quick-xml Reader and returns the document node.
    pub fn parse_reader<R: BufRead>(&self, reader: &mut Reader<R>) -> Result<NodeRef> {
        let mut info = DocumentInfo::default();
        let mut top_level: Vec<NodeRef> = Vec::new();
        let mut stack: Vec<OpenElement> = Vec::new();
        let mut namespaces = NamespaceContext::new();
        let mut current_text: Option<String> = None;
        let mut buf = Vec::new();

        loop {
            let event = reader
                .read_event_into(&mut buf)
                .map_err(|e| Error::Parse(format!("XML parse error: {}", e)))?;

            // Text and references accumulate; anything else ends the run.
            match &event {
                Event::Text(_) | Event::GeneralRef(_) => {}
                _ => flush_text(&mut current_text, &mut stack, &mut top_level),
            }

            match event {
                Event::Start(ref e) => {
                    namespaces.push_scope();
                    let open = self.parse_element(e, reader, &mut namespaces)?;
                    stack.push(open);
                }
                Event::Empty(ref e) => {
                    namespaces.push_scope();
                    let open = self.parse_element(e, reader, &mut namespaces)?;
                    namespaces.pop_scope();
                    append(&mut stack, &mut top_level, close(open));
                }
                Event::End(_) => {
                    namespaces.pop_scope();
                    let open = stack
                        .pop()
                        .ok_or_else(|| Error::Parse("unbalanced end tag".to_string()))?;
                    append(&mut stack, &mut top_level, close(open));
                }
                Event::Text(e) => {
                    let raw =
                        std::str::from_utf8(e.as_ref()).map_err(|e| Error::Parse(e.to_string()))?;
                    let text = unescape(raw).map_err(|e| Error::Parse(e.to_string()))?;
                    current_text.get_or_insert_with(String::new).push_str(&text);
                }
                Event::GeneralRef(e) => {
                    let name =
                        std::str::from_utf8(e.as_ref()).map_err(|e| Error::Parse(e.to_string()))?;
                    let text = resolve_reference(name)?;
                    current_text.get_or_insert_with(String::new).push_str(&text);
                }
                Event::CData(e) => {
                    let text = String::from_utf8_lossy(e.as_ref()).to_string();
                    append(&mut stack, &mut top_level, Node::cdata(text));
                }
                Event::Comment(e) => {
                    let text = String::from_utf8_lossy(e.as_ref()).to_string();
                    append(&mut stack, &mut top_level, Node::comment(text));
                }
                Event::PI(e) => {
                    let raw = String::from_utf8_lossy(e.as_ref()).to_string();
                    let (target, data) = split_pi(&raw);
                    append(
                        &mut stack,
                        &mut top_level,
                        Node::processing_instruction(target, data),
                    );
                }
                Event::Decl(e) => {
                    let version = e.version().map_err(|e| Error::Parse(e.to_string()))?;
                    info.xml_version = String::from_utf8_lossy(&version).to_string();
                    if let Some(encoding) = e.encoding() {
                        let encoding = encoding.map_err(|e| Error::Parse(e.to_string()))?;
                        info.encoding = Some(String::from_utf8_lossy(&encoding).to_string());
                    }
                    if let Some(standalone) = e.standalone() {
                        let standalone = standalone.map_err(|e| Error::Parse(e.to_string()))?;
                        info.standalone = Some(standalone.as_ref() == b"yes");
                    }
                }
                Event::DocType(e) => {
                    let raw = String::from_utf8_lossy(e.as_ref()).to_string();
                    let (name, public_id, system_id) = parse_doctype(&raw);
                    info.doctype = Some(Node::document_type(name, public_id, system_id));
                }
                Event::Eof => break,
            }
            buf.clear();
        }

        if !stack.is_empty() {
            return Err(Error::Parse("unexpected end of document".to_string()));
        }
        if !top_level.iter().any(|n| n.is_element()) {
            return Err(Error::Parse("document has no root element".to_string()));
        }

        Ok(Node::document(info, top_level))
    }

    /// Parses an element's name, attributes and namespace declarations.
    ///
    /// The caller must have pushed a namespace scope for the element.
    fn parse_element<R: BufRead>(
        &self,
        e: &BytesStart,
        reader: &Reader<R>,
        namespaces: &mut NamespaceContext,
    ) -> Result<OpenElement> {
        let raw_name = reader
            .decoder()
            .decode(e.name().as_ref())
            .map_err(|e| Error::Parse(e.to_string()))?
            .to_string();

        let mut raw_attributes = Vec::new();
        for attr_result in e.attributes() {
            let attr = attr_result.map_err(|e| Error::Parse(format!("Attribute error: {}", e)))?;
            let key = reader
                .decoder()
                .decode(attr.key.as_ref())
                .map_err(|e| Error::Parse(e.to_string()))?
                .to_string();
            let value = attr
                .unescape_value()
                .map_err(|e| Error::Parse(e.to_string()))?
                .to_string();
            raw_attributes.push((key, value));
        }

        // Declarations must be in scope before any name is resolved.
        let namespace_decls =
            namespaces.declare(raw_attributes.iter().map(|(k, v)| (k.as_str(), v.as_str())));

        let attributes = raw_attributes
            .iter()
            .filter(|(key, _)| !crate::node::is_xmlns_attr(key))
            .map(|(key, value)| Node::attribute(namespaces.attribute_name(key), value.clone()))
            .collect();

        Ok(OpenElement {
            name: namespaces.element_name(&raw_name),
            attributes,
            namespace_decls,
            children: Vec::new(),
        })
    }
}

fn close(open: OpenElement) -> NodeRef {
    Node::element_with_namespaces(
        open.name,
        open.attributes,
        open.namespace_decls,
        open.children,
    )
}

/// Adds a finished node to the innermost open element, or to the document.
fn append(stack: &mut [OpenElement], top_level: &mut Vec<NodeRef>, node: NodeRef) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None => top_level.push(node),
    }
}

/// Turns accumulated character data into a text node.
///
/// Whitespace outside the document element is not part of the tree.
fn flush_text(
    current_text: &mut Option<String>,
    stack: &mut [OpenElement],
    top_level: &mut Vec<NodeRef>,
) {
    if let Some(text) = current_text.take() {
        if stack.is_empty() && text.trim().is_empty() {
            return;
        }
        append(stack, top_level, Node::text(text));
    }
}

/// Splits the body of a processing instruction into target and data.
pub(crate) fn split_pi(raw: &str) -> (String, String) {
    let raw = raw.trim_end_matches('?');
    match raw.find(char::is_whitespace) {
        Some(pos) => (raw[..pos].to_string(), raw[pos..].trim_start().to_string()),
        None => (raw.to_string(), String::new()),
    }
}

/// Parses XML from a file.
pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<NodeRef> {
    XmlParser::new().parse_file(path)
}

/// Parses XML from a string.
pub fn parse_str(xml: &str) -> Result<NodeRef> {
    XmlParser::new().parse_str(xml)
}
