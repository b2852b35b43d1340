//! The legacy difference taxonomy.

use std::fmt;

use crate::xml::XmlNodeType;

/// The kinds of difference the streaming comparison reports, with their
/// historic numeric ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DifferenceType {
    AttrValueExplicitlySpecified = 1,
    AttrNameNotFound = 2,
    AttrValue = 3,
    /// Attributes appear in a different order. Minor.
    AttrSequence = 4,
    CdataValue = 5,
    CommentValue = 6,
    DoctypeName = 7,
    DoctypePublicId = 8,
    DoctypeSystemId = 9,
    ElementTagName = 10,
    ElementNumAttributes = 11,
    ProcessingInstructionTarget = 12,
    ProcessingInstructionData = 13,
    TextValue = 14,
    NamespacePrefix = 15,
    NamespaceUri = 16,
    NodeType = 17,
    HasChildNodes = 18,
    ChildNodelistLength = 19,
    ChildNodelistSequence = 20,
    HasDoctypeDeclaration = 21,
    /// Only one document starts with an XML declaration. Minor.
    HasXmlDeclarationPrefix = 22,
}

impl DifferenceType {
    pub fn id(self) -> u8 {
        self as u8
    }

    /// Major differences make two documents unequal.
    pub fn is_major(self) -> bool {
        !matches!(
            self,
            DifferenceType::AttrSequence | DifferenceType::HasXmlDeclarationPrefix
        )
    }

    pub fn description(self) -> &'static str {
        match self {
            DifferenceType::AttrValueExplicitlySpecified => {
                "Comparing 2 attributes but only one has an explicitly specified value"
            }
            DifferenceType::AttrNameNotFound => "Comparing 2 attribute lists",
            DifferenceType::AttrValue => "Comparing 2 attributes with the same name but different values",
            DifferenceType::AttrSequence => "Comparing 2 attribute lists with the same attributes in different sequence",
            DifferenceType::CdataValue => "Comparing 2 CDATA sections with different values",
            DifferenceType::CommentValue => "Comparing 2 comments with different values",
            DifferenceType::DoctypeName => "Comparing 2 document types with different names",
            DifferenceType::DoctypePublicId => "Comparing 2 document types with different public identifiers",
            DifferenceType::DoctypeSystemId => "Comparing 2 document types with different system identifiers",
            DifferenceType::ElementTagName => "Comparing 2 nodes but different element tag names",
            DifferenceType::ElementNumAttributes => "Comparing 2 nodes but different numbers of attributes",
            DifferenceType::ProcessingInstructionTarget => {
                "Comparing 2 processing instructions with different targets"
            }
            DifferenceType::ProcessingInstructionData => {
                "Comparing 2 processing instructions with different instructions"
            }
            DifferenceType::TextValue => "Comparing 2 nodes with different text values",
            DifferenceType::NamespacePrefix => "Comparing 2 nodes with different namespace prefixes",
            DifferenceType::NamespaceUri => "Comparing 2 nodes with different namespace URIs",
            DifferenceType::NodeType => "Comparing 2 nodes of different type",
            DifferenceType::HasChildNodes => "Comparing 2 nodes but only one has any children",
            DifferenceType::ChildNodelistLength => {
                "Comparing 2 nodes with different numbers of children"
            }
            DifferenceType::ChildNodelistSequence => {
                "Comparing 2 nodes with children whose nodes are in different sequence"
            }
            DifferenceType::HasDoctypeDeclaration => {
                "Comparing 2 Documents only one of which has a doctype"
            }
            DifferenceType::HasXmlDeclarationPrefix => {
                "Comparing 2 Documents only one of which has an XML Prefix Declaration"
            }
        }
    }
}

/// A single recorded difference with the node types the readers were
/// positioned on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Difference {
    pub difference_type: DifferenceType,
    pub control_node_type: Option<XmlNodeType>,
    pub test_node_type: Option<XmlNodeType>,
}

impl Difference {
    pub fn new(
        difference_type: DifferenceType,
        control_node_type: Option<XmlNodeType>,
        test_node_type: Option<XmlNodeType>,
    ) -> Self {
        Difference {
            difference_type,
            control_node_type,
            test_node_type,
        }
    }

    pub fn is_major(&self) -> bool {
        self.difference_type.is_major()
    }
}

fn node_type_name(node_type: Option<XmlNodeType>) -> String {
    node_type.map_or_else(|| "None".to_string(), |t| t.to_string())
}

impl fmt::Display for Difference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Difference type {} ({}): {}, control node type {}, test node type {}",
            self.difference_type.id(),
            if self.is_major() { "major" } else { "minor" },
            self.difference_type.description(),
            node_type_name(self.control_node_type),
            node_type_name(self.test_node_type),
        )
    }
}
