//! Read-only node tree consumed by the comparison engine.
//!
//! Nodes are shared through [`NodeRef`] (`Rc<Node>`) and never mutated once
//! built. A tree is assembled bottom-up: children and attributes are created
//! first and handed to their parent's constructor.

mod namespace;
mod transform;

pub use namespace::{
    is_xmlns_attr, split_qname, NamespaceContext, QName, XML_NS_URI, XSI_NS_URI,
};
pub use transform::{strip_comments, strip_whitespace};

use std::fmt;
use std::rc::Rc;

/// A reference-counted pointer to a node.
pub type NodeRef = Rc<Node>;

/// The kind of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    Document,
    DocumentType,
    Element,
    Attribute,
    Text,
    CData,
    Comment,
    ProcessingInstruction,
}

impl NodeType {
    /// Text, CDATA and comments all carry plain character data.
    pub fn is_character_data(self) -> bool {
        matches!(self, NodeType::Text | NodeType::CData | NodeType::Comment)
    }

    /// Text and CDATA hold document text; they are interchangeable for most
    /// comparison purposes.
    pub fn is_text(self) -> bool {
        matches!(self, NodeType::Text | NodeType::CData)
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeType::Document => "Document",
            NodeType::DocumentType => "DocumentType",
            NodeType::Element => "Element",
            NodeType::Attribute => "Attribute",
            NodeType::Text => "Text",
            NodeType::CData => "CDATA",
            NodeType::Comment => "Comment",
            NodeType::ProcessingInstruction => "ProcessingInstruction",
        };
        f.write_str(name)
    }
}

/// Document-level metadata taken from the XML declaration and DOCTYPE.
#[derive(Debug, Clone)]
pub struct DocumentInfo {
    /// XML version, `1.0` when the document has no declaration.
    pub xml_version: String,
    /// Declared encoding, if any.
    pub encoding: Option<String>,
    /// Declared standalone flag, `None` when the declaration omits it.
    pub standalone: Option<bool>,
    /// The DOCTYPE node, if the document has one.
    pub doctype: Option<NodeRef>,
}

impl Default for DocumentInfo {
    fn default() -> Self {
        DocumentInfo {
            xml_version: "1.0".to_string(),
            encoding: None,
            standalone: None,
            doctype: None,
        }
    }
}

/// Kind-specific data of a node.
#[derive(Debug, Clone)]
pub enum NodeContent {
    Document(DocumentInfo),
    DocumentType {
        name: String,
        public_id: Option<String>,
        system_id: Option<String>,
    },
    Element {
        name: QName,
        /// Attribute nodes in document order, namespace declarations excluded.
        attributes: Vec<NodeRef>,
        /// Namespace declarations made on this element as (prefix, uri).
        namespace_decls: Vec<(String, String)>,
    },
    Attribute {
        name: QName,
        value: String,
        /// False when the value was defaulted rather than written out.
        specified: bool,
    },
    Text(String),
    CData(String),
    Comment(String),
    ProcessingInstruction {
        target: String,
        data: String,
    },
}

/// A node in a parsed XML tree.
#[derive(Debug, Clone)]
pub struct Node {
    content: NodeContent,
    children: Vec<NodeRef>,
}

impl Node {
    fn new_ref(content: NodeContent, children: Vec<NodeRef>) -> NodeRef {
        Rc::new(Node { content, children })
    }

    /// Creates a document node.
    pub fn document(info: DocumentInfo, children: Vec<NodeRef>) -> NodeRef {
        Self::new_ref(NodeContent::Document(info), children)
    }

    /// Creates a DOCTYPE node.
    pub fn document_type(
        name: impl Into<String>,
        public_id: Option<String>,
        system_id: Option<String>,
    ) -> NodeRef {
        Self::new_ref(
            NodeContent::DocumentType {
                name: name.into(),
                public_id,
                system_id,
            },
            Vec::new(),
        )
    }

    /// Creates an element node.
    pub fn element(name: QName, attributes: Vec<NodeRef>, children: Vec<NodeRef>) -> NodeRef {
        Self::element_with_namespaces(name, attributes, Vec::new(), children)
    }

    /// Creates an element node that declares namespaces.
    pub fn element_with_namespaces(
        name: QName,
        attributes: Vec<NodeRef>,
        namespace_decls: Vec<(String, String)>,
        children: Vec<NodeRef>,
    ) -> NodeRef {
        Self::new_ref(
            NodeContent::Element {
                name,
                attributes,
                namespace_decls,
            },
            children,
        )
    }

    /// Creates an explicitly specified attribute node.
    pub fn attribute(name: QName, value: impl Into<String>) -> NodeRef {
        Self::new_ref(
            NodeContent::Attribute {
                name,
                value: value.into(),
                specified: true,
            },
            Vec::new(),
        )
    }

    /// Creates an attribute node whose value came from a default.
    pub fn defaulted_attribute(name: QName, value: impl Into<String>) -> NodeRef {
        Self::new_ref(
            NodeContent::Attribute {
                name,
                value: value.into(),
                specified: false,
            },
            Vec::new(),
        )
    }

    pub fn text(text: impl Into<String>) -> NodeRef {
        Self::new_ref(NodeContent::Text(text.into()), Vec::new())
    }

    pub fn cdata(text: impl Into<String>) -> NodeRef {
        Self::new_ref(NodeContent::CData(text.into()), Vec::new())
    }

    pub fn comment(text: impl Into<String>) -> NodeRef {
        Self::new_ref(NodeContent::Comment(text.into()), Vec::new())
    }

    pub fn processing_instruction(target: impl Into<String>, data: impl Into<String>) -> NodeRef {
        Self::new_ref(
            NodeContent::ProcessingInstruction {
                target: target.into(),
                data: data.into(),
            },
            Vec::new(),
        )
    }

    /// Returns a copy of this node with a different child list.
    pub fn with_children(&self, children: Vec<NodeRef>) -> NodeRef {
        Self::new_ref(self.content.clone(), children)
    }

    /// Returns a copy of this node with different character data.
    ///
    /// Nodes that carry no character data are copied unchanged.
    pub fn with_text(&self, text: impl Into<String>) -> NodeRef {
        let content = match &self.content {
            NodeContent::Text(_) => NodeContent::Text(text.into()),
            NodeContent::CData(_) => NodeContent::CData(text.into()),
            NodeContent::Comment(_) => NodeContent::Comment(text.into()),
            other => other.clone(),
        };
        Self::new_ref(content, self.children.clone())
    }

    pub fn content(&self) -> &NodeContent {
        &self.content
    }

    pub fn node_type(&self) -> NodeType {
        match &self.content {
            NodeContent::Document(_) => NodeType::Document,
            NodeContent::DocumentType { .. } => NodeType::DocumentType,
            NodeContent::Element { .. } => NodeType::Element,
            NodeContent::Attribute { .. } => NodeType::Attribute,
            NodeContent::Text(_) => NodeType::Text,
            NodeContent::CData(_) => NodeType::CData,
            NodeContent::Comment(_) => NodeType::Comment,
            NodeContent::ProcessingInstruction { .. } => NodeType::ProcessingInstruction,
        }
    }

    pub fn is_element(&self) -> bool {
        self.node_type() == NodeType::Element
    }

    /// Returns the qualified name of an element or attribute.
    pub fn name(&self) -> Option<&QName> {
        match &self.content {
            NodeContent::Element { name, .. } | NodeContent::Attribute { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn local_name(&self) -> Option<&str> {
        self.name().map(QName::local_name)
    }

    pub fn namespace_uri(&self) -> Option<&str> {
        self.name().and_then(QName::namespace_uri)
    }

    pub fn prefix(&self) -> Option<&str> {
        self.name().and_then(QName::prefix)
    }

    /// Returns the value of the node.
    ///
    /// This is the attribute value, the character data of text, CDATA and
    /// comment nodes, or the data of a processing instruction.
    pub fn value(&self) -> Option<&str> {
        match &self.content {
            NodeContent::Attribute { value, .. } => Some(value),
            NodeContent::Text(t) | NodeContent::CData(t) | NodeContent::Comment(t) => Some(t),
            NodeContent::ProcessingInstruction { data, .. } => Some(data),
            _ => None,
        }
    }

    /// Returns the target of a processing instruction.
    pub fn target(&self) -> Option<&str> {
        match &self.content {
            NodeContent::ProcessingInstruction { target, .. } => Some(target),
            _ => None,
        }
    }

    /// Returns whether an attribute was explicitly written in the document.
    pub fn is_specified(&self) -> Option<bool> {
        match &self.content {
            NodeContent::Attribute { specified, .. } => Some(*specified),
            _ => None,
        }
    }

    pub fn children(&self) -> &[NodeRef] {
        &self.children
    }

    /// Returns the attribute nodes of an element.
    pub fn attributes(&self) -> &[NodeRef] {
        match &self.content {
            NodeContent::Element { attributes, .. } => attributes,
            _ => &[],
        }
    }

    /// Looks up an attribute by namespace URI and local name.
    pub fn attribute_node(&self, name: &QName) -> Option<&NodeRef> {
        self.attributes()
            .iter()
            .find(|a| a.name().is_some_and(|n| n == name))
    }

    /// Returns the value of the attribute with the given expanded name.
    pub fn attribute_value(&self, name: &QName) -> Option<&str> {
        self.attribute_node(name).and_then(|a| a.value())
    }

    /// Returns the namespace declarations made on an element.
    pub fn namespace_decls(&self) -> &[(String, String)] {
        match &self.content {
            NodeContent::Element {
                namespace_decls, ..
            } => namespace_decls,
            _ => &[],
        }
    }

    /// Returns the document metadata of a document node.
    pub fn document_info(&self) -> Option<&DocumentInfo> {
        match &self.content {
            NodeContent::Document(info) => Some(info),
            _ => None,
        }
    }

    /// Returns the DOCTYPE node of a document node.
    pub fn doctype(&self) -> Option<&NodeRef> {
        self.document_info().and_then(|info| info.doctype.as_ref())
    }

    /// Returns (name, public id, system id) of a DOCTYPE node.
    pub fn doctype_ids(&self) -> Option<(&str, Option<&str>, Option<&str>)> {
        match &self.content {
            NodeContent::DocumentType {
                name,
                public_id,
                system_id,
            } => Some((name, public_id.as_deref(), system_id.as_deref())),
            _ => None,
        }
    }

    /// Returns the single element child of a document node.
    pub fn document_element(&self) -> Option<&NodeRef> {
        self.children.iter().find(|c| c.is_element())
    }

    /// Concatenates the character data of the direct Text and CDATA children.
    pub fn direct_text(&self) -> String {
        self.children
            .iter()
            .filter(|c| c.node_type().is_text())
            .filter_map(|c| c.value())
            .collect()
    }

    /// A short human readable name: the qualified name of elements and
    /// attributes, the target of processing instructions, `#text` and friends
    /// for the rest.
    pub fn display_name(&self) -> String {
        match &self.content {
            NodeContent::Document(_) => "#document".to_string(),
            NodeContent::DocumentType { name, .. } => name.clone(),
            NodeContent::Element { name, .. } | NodeContent::Attribute { name, .. } => {
                name.qualified()
            }
            NodeContent::Text(_) => "#text".to_string(),
            NodeContent::CData(_) => "#cdata-section".to_string(),
            NodeContent::Comment(_) => "#comment".to_string(),
            NodeContent::ProcessingInstruction { target, .. } => target.clone(),
        }
    }
}
