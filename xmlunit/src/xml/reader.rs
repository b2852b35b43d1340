//! Forward-only node reader.
//!
//! [`XmlNodeReader`] exposes a document as a flat sequence of nodes in
//! document order, one per call to [`XmlNodeReader::read`]. Elements written
//! as `<x/>` are reported once with `is_empty_element` set and no matching
//! end node; `<x></x>` yields an element followed by an end element.

use std::collections::VecDeque;
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::parser::split_pi;
use super::{parse_doctype, resolve_reference};
use crate::error::{Error, Result};
use crate::node::{is_xmlns_attr, NamespaceContext, QName};

/// The kind of node a reader is positioned on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum XmlNodeType {
    XmlDeclaration,
    DocumentType,
    Element,
    EndElement,
    Text,
    CData,
    Whitespace,
    Comment,
    ProcessingInstruction,
}

impl fmt::Display for XmlNodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// How whitespace-only character data is reported.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WhitespaceHandling {
    /// Report whitespace-only runs as [`XmlNodeType::Whitespace`] nodes.
    #[default]
    All,
    /// Skip whitespace-only runs.
    None,
}

/// An attribute of the element a reader is positioned on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderAttribute {
    /// The name as written, e.g. `xsi:type`.
    pub name: String,
    /// The resolved name.
    pub qname: QName,
    pub value: String,
}

/// A node produced by [`XmlNodeReader`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderNode {
    pub node_type: XmlNodeType,
    /// Qualified name for elements, end elements and the DOCTYPE; target for
    /// processing instructions; empty otherwise.
    pub name: String,
    /// Character data, PI data or the declaration body.
    pub value: String,
    /// True for elements written as `<x/>`.
    pub is_empty_element: bool,
    pub attributes: Vec<ReaderAttribute>,
    /// DOCTYPE public and system identifiers.
    pub public_id: Option<String>,
    pub system_id: Option<String>,
}

impl ReaderNode {
    fn new(node_type: XmlNodeType, name: impl Into<String>, value: impl Into<String>) -> Self {
        ReaderNode {
            node_type,
            name: name.into(),
            value: value.into(),
            is_empty_element: false,
            attributes: Vec::new(),
            public_id: None,
            system_id: None,
        }
    }

    /// Looks up an attribute by the name it was written with.
    pub fn attribute(&self, name: &str) -> Option<(usize, &ReaderAttribute)> {
        self.attributes
            .iter()
            .enumerate()
            .find(|(_, a)| a.name == name)
    }

    /// Looks up an attribute by namespace URI and local name.
    pub fn attribute_ns(&self, qname: &QName) -> Option<(usize, &ReaderAttribute)> {
        self.attributes
            .iter()
            .enumerate()
            .find(|(_, a)| &a.qname == qname)
    }
}

/// Reads a document one node at a time.
pub struct XmlNodeReader<R: BufRead> {
    reader: Reader<R>,
    buf: Vec<u8>,
    namespaces: NamespaceContext,
    whitespace: WhitespaceHandling,
    /// Nodes decoded ahead of the current position.
    pending: VecDeque<ReaderNode>,
    current: Option<ReaderNode>,
    /// An empty element whose namespace scope must be closed on the next read.
    close_scope: bool,
    eof: bool,
}

impl<'a> XmlNodeReader<&'a [u8]> {
    /// Creates a reader over an in-memory document.
    pub fn from_xml(xml: &'a str) -> Self {
        Self::new(xml.as_bytes())
    }
}

impl XmlNodeReader<BufReader<File>> {
    /// Opens a reader over a file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::new(BufReader::new(File::open(path)?)))
    }
}

impl<R: BufRead> XmlNodeReader<R> {
    /// Creates a reader over any buffered input.
    pub fn new(input: R) -> Self {
        let mut reader = Reader::from_reader(input);
        reader.config_mut().trim_text_start = false;
        reader.config_mut().trim_text_end = false;
        XmlNodeReader {
            reader,
            buf: Vec::new(),
            namespaces: NamespaceContext::new(),
            whitespace: WhitespaceHandling::default(),
            pending: VecDeque::new(),
            current: None,
            close_scope: false,
            eof: false,
        }
    }

    /// Sets how whitespace-only character data is reported.
    pub fn with_whitespace_handling(mut self, whitespace: WhitespaceHandling) -> Self {
        self.whitespace = whitespace;
        self
    }

    /// Advances to the next node.
    ///
    /// Returns `false` once the document is exhausted.
    pub fn read(&mut self) -> Result<bool> {
        if self.close_scope {
            self.namespaces.pop_scope();
            self.close_scope = false;
        }
        loop {
            if let Some(node) = self.pending.pop_front() {
                if node.node_type == XmlNodeType::Whitespace
                    && self.whitespace == WhitespaceHandling::None
                {
                    continue;
                }
                if node.node_type == XmlNodeType::Element && node.is_empty_element {
                    self.close_scope = true;
                }
                self.current = Some(node);
                return Ok(true);
            }
            if self.eof {
                self.current = None;
                return Ok(false);
            }
            self.fill()?;
        }
    }

    /// The node the reader is positioned on.
    pub fn current(&self) -> Option<&ReaderNode> {
        self.current.as_ref()
    }

    /// The type of the current node.
    pub fn node_type(&self) -> Option<XmlNodeType> {
        self.current.as_ref().map(|n| n.node_type)
    }

    /// True when positioned on an element written as `<x/>`.
    pub fn is_empty_element(&self) -> bool {
        self.current.as_ref().is_some_and(|n| n.is_empty_element)
    }

    /// Decodes events until at least one node is queued or the input ends.
    fn fill(&mut self) -> Result<()> {
        let mut text: Option<String> = None;
        let mut buf = std::mem::take(&mut self.buf);

        let result = loop {
            buf.clear();
            let event = match self.reader.read_event_into(&mut buf) {
                Ok(event) => event,
                Err(e) => break Err(Error::Xml(e)),
            };
            match event {
                Event::Text(e) => {
                    let raw = match std::str::from_utf8(e.as_ref()) {
                        Ok(raw) => raw,
                        Err(e) => break Err(Error::Parse(e.to_string())),
                    };
                    match unescape(raw) {
                        Ok(t) => text.get_or_insert_with(String::new).push_str(&t),
                        Err(e) => break Err(Error::Parse(e.to_string())),
                    }
                }
                Event::GeneralRef(e) => {
                    let resolved = std::str::from_utf8(e.as_ref())
                        .map_err(|e| Error::Parse(e.to_string()))
                        .and_then(resolve_reference);
                    match resolved {
                        Ok(t) => text.get_or_insert_with(String::new).push_str(&t),
                        Err(e) => break Err(e),
                    }
                }
                Event::Eof => {
                    self.eof = true;
                    break Ok(None);
                }
                other => break self.convert(other).map(Some),
            }
        };
        self.buf = buf;

        let node = result?;
        if let Some(text) = text {
            let node_type = if text.trim().is_empty() {
                XmlNodeType::Whitespace
            } else {
                XmlNodeType::Text
            };
            self.pending.push_back(ReaderNode::new(node_type, "", text));
        }
        if let Some(node) = node {
            self.pending.push_back(node);
        }
        Ok(())
    }

    /// Converts a non-text event into a node.
    fn convert(&mut self, event: Event<'_>) -> Result<ReaderNode> {
        let node = match event {
            Event::Start(ref e) => {
                self.namespaces.push_scope();
                self.element(e)?
            }
            Event::Empty(ref e) => {
                // popped on the read after this node is handed out
                self.namespaces.push_scope();
                let mut node = self.element(e)?;
                node.is_empty_element = true;
                node
            }
            Event::End(ref e) => {
                self.namespaces.pop_scope();
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                ReaderNode::new(XmlNodeType::EndElement, name, "")
            }
            Event::CData(e) => ReaderNode::new(
                XmlNodeType::CData,
                "",
                String::from_utf8_lossy(e.as_ref()).to_string(),
            ),
            Event::Comment(e) => ReaderNode::new(
                XmlNodeType::Comment,
                "",
                String::from_utf8_lossy(e.as_ref()).to_string(),
            ),
            Event::PI(e) => {
                let raw = String::from_utf8_lossy(e.as_ref()).to_string();
                let (target, data) = split_pi(&raw);
                ReaderNode::new(XmlNodeType::ProcessingInstruction, target, data)
            }
            Event::Decl(e) => {
                let raw = String::from_utf8_lossy(e.as_ref()).to_string();
                let body = raw.strip_prefix("xml").unwrap_or(&raw).trim().to_string();
                ReaderNode::new(XmlNodeType::XmlDeclaration, "xml", body)
            }
            Event::DocType(e) => {
                let raw = String::from_utf8_lossy(e.as_ref()).to_string();
                let (name, public_id, system_id) = parse_doctype(&raw);
                let mut node = ReaderNode::new(XmlNodeType::DocumentType, name, raw.trim());
                node.public_id = public_id;
                node.system_id = system_id;
                node
            }
            Event::Text(_) | Event::GeneralRef(_) | Event::Eof => {
                return Err(Error::Parse("unexpected character data event".to_string()))
            }
        };
        Ok(node)
    }

    /// Builds an element node; the element's namespace scope must be open.
    fn element(&mut self, e: &BytesStart<'_>) -> Result<ReaderNode> {
        let name = self
            .reader
            .decoder()
            .decode(e.name().as_ref())
            .map_err(|e| Error::Parse(e.to_string()))?
            .to_string();

        let mut raw_attributes = Vec::new();
        for attr_result in e.attributes() {
            let attr = attr_result.map_err(|e| Error::Parse(format!("Attribute error: {}", e)))?;
            let key = self
                .reader
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

        self.namespaces
            .declare(raw_attributes.iter().map(|(k, v)| (k.as_str(), v.as_str())));

        let mut node = ReaderNode::new(XmlNodeType::Element, name, "");
        node.attributes = raw_attributes
            .into_iter()
            .filter(|(key, _)| !is_xmlns_attr(key))
            .map(|(key, value)| ReaderAttribute {
                qname: self.namespaces.attribute_name(&key),
                name: key,
                value,
            })
            .collect();
        Ok(node)
    }
}
