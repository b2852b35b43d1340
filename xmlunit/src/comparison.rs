//! The vocabulary of the difference engine: what was compared, where, and
//! how it came out.

use std::fmt;

use crate::node::{NodeRef, NodeType, QName};

/// The kind of an atomic check performed by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparisonType {
    /// Compares the XML version of two documents.
    XmlVersion,
    /// Compares the standalone flag of two documents.
    XmlStandalone,
    /// Compares the declared encoding of two documents.
    XmlEncoding,
    /// Do both documents carry a DOCTYPE?
    HasDoctypeDeclaration,
    DoctypeName,
    DoctypePublicId,
    DoctypeSystemId,
    /// Compares the `xsi:schemaLocation` attribute of two elements.
    SchemaLocation,
    /// Compares the `xsi:noNamespaceSchemaLocation` attribute of two elements.
    NoNamespaceSchemaLocation,
    NodeType,
    NamespacePrefix,
    NamespaceUri,
    /// Compares the content of Text, CDATA or comment nodes.
    TextValue,
    ProcessingInstructionTarget,
    ProcessingInstructionData,
    /// Compares the local names of two elements.
    ElementTagName,
    /// Was the attribute written out on both sides or defaulted?
    AttrValueExplicitlySpecified,
    ElementNumAttributes,
    AttrValue,
    ChildNodelistLength,
    /// Are the matched children in the same order on both sides?
    ChildNodelistSequence,
    /// A child node without a counterpart on the other side.
    ChildLookup,
    /// An attribute without a counterpart on the other side.
    AttrNameLookup,
}

impl ComparisonType {
    /// Every comparison type in engine order.
    pub const ALL: [ComparisonType; 23] = [
        ComparisonType::XmlVersion,
        ComparisonType::XmlStandalone,
        ComparisonType::XmlEncoding,
        ComparisonType::HasDoctypeDeclaration,
        ComparisonType::DoctypeName,
        ComparisonType::DoctypePublicId,
        ComparisonType::DoctypeSystemId,
        ComparisonType::SchemaLocation,
        ComparisonType::NoNamespaceSchemaLocation,
        ComparisonType::NodeType,
        ComparisonType::NamespacePrefix,
        ComparisonType::NamespaceUri,
        ComparisonType::TextValue,
        ComparisonType::ProcessingInstructionTarget,
        ComparisonType::ProcessingInstructionData,
        ComparisonType::ElementTagName,
        ComparisonType::AttrValueExplicitlySpecified,
        ComparisonType::ElementNumAttributes,
        ComparisonType::AttrValue,
        ComparisonType::ChildNodelistLength,
        ComparisonType::ChildNodelistSequence,
        ComparisonType::ChildLookup,
        ComparisonType::AttrNameLookup,
    ];

    /// Human readable description used when rendering differences.
    pub fn description(self) -> &'static str {
        match self {
            ComparisonType::XmlVersion => "xml version",
            ComparisonType::XmlStandalone => "xml standalone",
            ComparisonType::XmlEncoding => "xml encoding",
            ComparisonType::HasDoctypeDeclaration => "presence of doctype declaration",
            ComparisonType::DoctypeName => "doctype name",
            ComparisonType::DoctypePublicId => "doctype public id",
            ComparisonType::DoctypeSystemId => "doctype system id",
            ComparisonType::SchemaLocation => "schema location",
            ComparisonType::NoNamespaceSchemaLocation => "no namespace schema location",
            ComparisonType::NodeType => "node type",
            ComparisonType::NamespacePrefix => "namespace prefix",
            ComparisonType::NamespaceUri => "namespace URI",
            ComparisonType::TextValue => "text value",
            ComparisonType::ProcessingInstructionTarget => "processing instruction target",
            ComparisonType::ProcessingInstructionData => "processing instruction data",
            ComparisonType::ElementTagName => "element tag name",
            ComparisonType::AttrValueExplicitlySpecified => "attribute value explicitly specified",
            ComparisonType::ElementNumAttributes => "number of attributes",
            ComparisonType::AttrValue => "attribute value",
            ComparisonType::ChildNodelistLength => "child nodelist length",
            ComparisonType::ChildNodelistSequence => "child nodelist sequence",
            ComparisonType::ChildLookup => "child",
            ComparisonType::AttrNameLookup => "attribute name",
        }
    }
}

impl fmt::Display for ComparisonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Outcome of a comparison, ordered by severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum ComparisonResult {
    #[default]
    Equal,
    /// Different, but not in a way that matters by default.
    Similar,
    Different,
    /// Different, and the engine should stop descending.
    Critical,
}

impl fmt::Display for ComparisonResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ComparisonResult::Equal => "EQUAL",
            ComparisonResult::Similar => "SIMILAR",
            ComparisonResult::Different => "DIFFERENT",
            ComparisonResult::Critical => "CRITICAL",
        };
        f.write_str(s)
    }
}

/// The value compared on one side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComparisonValue {
    Str(String),
    Int(usize),
    Bool(bool),
    NodeType(NodeType),
    QName(QName),
}

impl fmt::Display for ComparisonValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComparisonValue::Str(s) => write!(f, "'{}'", s),
            ComparisonValue::Int(n) => write!(f, "{}", n),
            ComparisonValue::Bool(b) => write!(f, "{}", b),
            ComparisonValue::NodeType(t) => write!(f, "{}", t),
            ComparisonValue::QName(q) => write!(f, "{}", q),
        }
    }
}

impl From<&str> for ComparisonValue {
    fn from(s: &str) -> Self {
        ComparisonValue::Str(s.to_string())
    }
}

impl From<String> for ComparisonValue {
    fn from(s: String) -> Self {
        ComparisonValue::Str(s)
    }
}

impl From<usize> for ComparisonValue {
    fn from(n: usize) -> Self {
        ComparisonValue::Int(n)
    }
}

impl From<bool> for ComparisonValue {
    fn from(b: bool) -> Self {
        ComparisonValue::Bool(b)
    }
}

impl From<NodeType> for ComparisonValue {
    fn from(t: NodeType) -> Self {
        ComparisonValue::NodeType(t)
    }
}

impl From<QName> for ComparisonValue {
    fn from(q: QName) -> Self {
        ComparisonValue::QName(q)
    }
}

/// One side of a comparison. Every part may be absent.
#[derive(Debug, Clone, Default)]
pub struct Detail {
    pub target: Option<NodeRef>,
    pub xpath: Option<String>,
    pub value: Option<ComparisonValue>,
}

impl Detail {
    pub fn new(
        target: Option<NodeRef>,
        xpath: Option<String>,
        value: Option<ComparisonValue>,
    ) -> Self {
        Detail {
            target,
            xpath,
            value,
        }
    }

    /// A detail with no node, location or value.
    pub fn absent() -> Self {
        Detail::default()
    }
}

/// An atomic check between a control and a test value.
#[derive(Debug, Clone)]
pub struct Comparison {
    pub comparison_type: ComparisonType,
    pub control: Detail,
    pub test: Detail,
}

impl Comparison {
    pub fn new(comparison_type: ComparisonType, control: Detail, test: Detail) -> Self {
        Comparison {
            comparison_type,
            control,
            test,
        }
    }

    /// Equal when both values are equal, including both absent, otherwise
    /// Different.
    pub fn raw_result(&self) -> ComparisonResult {
        if self.control.value == self.test.value {
            ComparisonResult::Equal
        } else {
            ComparisonResult::Different
        }
    }
}

fn render_value(value: &Option<ComparisonValue>) -> String {
    value
        .as_ref()
        .map_or_else(|| "<absent>".to_string(), ToString::to_string)
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Expected {} {} but was {} - comparing {} at {} to {} at {}",
            self.comparison_type,
            render_value(&self.control.value),
            render_value(&self.test.value),
            self.control
                .target
                .as_ref()
                .map_or_else(|| "<absent>".to_string(), |n| n.display_name()),
            self.control.xpath.as_deref().unwrap_or("<absent>"),
            self.test
                .target
                .as_ref()
                .map_or_else(|| "<absent>".to_string(), |n| n.display_name()),
            self.test.xpath.as_deref().unwrap_or("<absent>"),
        )
    }
}
