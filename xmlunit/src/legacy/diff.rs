//! Lockstep comparison of two node readers.

use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::rc::Rc;

use tracing::{debug, trace};

use super::difference::{Difference, DifferenceType};
use crate::error::{Error, Result};
use crate::xml::{ReaderAttribute, ReaderNode, WhitespaceHandling, XmlNodeReader, XmlNodeType};

/// Settings of a streaming comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffConfiguration {
    /// Prefix of the rendered result.
    pub description: String,
    pub whitespace_handling: WhitespaceHandling,
    /// When false, attributes in a different order are reported as a minor
    /// [`DifferenceType::AttrSequence`] difference.
    pub ignore_attribute_order: bool,
}

impl Default for DiffConfiguration {
    fn default() -> Self {
        DiffConfiguration {
            description: "Diff".to_string(),
            whitespace_handling: WhitespaceHandling::All,
            ignore_attribute_order: true,
        }
    }
}

impl DiffConfiguration {
    pub fn new(
        description: impl Into<String>,
        whitespace_handling: WhitespaceHandling,
        ignore_attribute_order: bool,
    ) -> Self {
        DiffConfiguration {
            description: description.into(),
            whitespace_handling,
            ignore_attribute_order,
        }
    }
}

/// Outcome of a streaming comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffResult {
    identical: bool,
    equal: bool,
    differences: Vec<Difference>,
    description: String,
}

impl DiffResult {
    fn new(description: &str) -> Self {
        DiffResult {
            identical: true,
            equal: true,
            differences: Vec::new(),
            description: description.to_string(),
        }
    }

    fn record(&mut self, difference: Difference) {
        trace!(%difference, "difference found");
        self.identical = false;
        if difference.is_major() {
            self.equal = false;
        }
        self.differences.push(difference);
    }

    /// No differences of any kind.
    pub fn identical(&self) -> bool {
        self.identical
    }

    /// No major differences.
    pub fn equal(&self) -> bool {
        self.equal
    }

    /// The difference recorded last.
    pub fn difference(&self) -> Option<&Difference> {
        self.differences.last()
    }

    pub fn differences(&self) -> &[Difference] {
        &self.differences
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

impl fmt::Display for DiffResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description)?;
        if self.identical {
            return write!(f, " [identical]");
        }
        if self.equal {
            write!(f, " [equal]")?;
        } else {
            write!(f, " [different]")?;
        }
        for difference in &self.differences {
            write!(f, "\n  {}", difference)?;
        }
        Ok(())
    }
}

/// Why the walk stopped early.
enum Halt {
    /// A major difference, already recorded.
    Major(Difference),
    Read(Error),
}

impl From<Error> for Halt {
    fn from(e: Error) -> Self {
        Halt::Read(e)
    }
}

type Step = std::result::Result<(), Halt>;

/// Compares two documents node by node, stopping at the first major
/// difference.
///
/// The first call to [`compare`](Self::compare) consumes both readers; its
/// result is kept and handed out again by later calls.
pub struct Diff<C: BufRead, T: BufRead> {
    control: XmlNodeReader<C>,
    test: XmlNodeReader<T>,
    configuration: DiffConfiguration,
    result: Option<Rc<DiffResult>>,
}

impl<'a> Diff<&'a [u8], &'a [u8]> {
    /// Compares two in-memory documents with the default configuration.
    pub fn from_strs(control: &'a str, test: &'a str) -> Self {
        Self::new(XmlNodeReader::from_xml(control), XmlNodeReader::from_xml(test))
    }
}

impl Diff<BufReader<File>, BufReader<File>> {
    /// Compares two files with the default configuration.
    pub fn from_files<P: AsRef<Path>, Q: AsRef<Path>>(control: P, test: Q) -> Result<Self> {
        Ok(Self::new(
            XmlNodeReader::from_file(control)?,
            XmlNodeReader::from_file(test)?,
        ))
    }
}

impl<C: BufRead, T: BufRead> Diff<C, T> {
    pub fn new(control: XmlNodeReader<C>, test: XmlNodeReader<T>) -> Self {
        Self::with_configuration(control, test, DiffConfiguration::default())
    }

    /// Creates a comparison; the readers take the configured whitespace
    /// handling.
    pub fn with_configuration(
        control: XmlNodeReader<C>,
        test: XmlNodeReader<T>,
        configuration: DiffConfiguration,
    ) -> Self {
        Diff {
            control: control.with_whitespace_handling(configuration.whitespace_handling),
            test: test.with_whitespace_handling(configuration.whitespace_handling),
            configuration,
            result: None,
        }
    }

    pub fn configuration(&self) -> &DiffConfiguration {
        &self.configuration
    }

    /// Runs the comparison, or returns the result of the first run.
    ///
    /// Read and parse failures are returned as errors and not cached.
    pub fn compare(&mut self) -> Result<Rc<DiffResult>> {
        if let Some(result) = &self.result {
            return Ok(result.clone());
        }
        let mut result = DiffResult::new(&self.configuration.description);
        match self.walk(&mut result) {
            Ok(()) => {}
            Err(Halt::Major(difference)) => {
                debug!(%difference, "comparison halted");
            }
            Err(Halt::Read(e)) => return Err(e),
        }
        let result = Rc::new(result);
        self.result = Some(result.clone());
        Ok(result)
    }

    fn report(&self, result: &mut DiffResult, difference_type: DifferenceType) -> Step {
        let difference = Difference::new(
            difference_type,
            self.control.node_type(),
            self.test.node_type(),
        );
        result.record(difference.clone());
        if difference.is_major() {
            Err(Halt::Major(difference))
        } else {
            Ok(())
        }
    }

    fn walk(&mut self, result: &mut DiffResult) -> Step {
        loop {
            let control_read = self.control.read()?;
            let test_read = self.test.read()?;
            match (control_read, test_read) {
                (false, false) => return Ok(()),
                (true, true) => {
                    self.compare_nodes(result)?;
                    self.check_empty_or_at_end_element(result)?;
                }
                _ => return self.report(result, DifferenceType::ChildNodelistLength),
            }
        }
    }

    fn compare_nodes(&mut self, result: &mut DiffResult) -> Step {
        let control_type = self.control.node_type();
        let test_type = self.test.node_type();

        if control_type != test_type {
            if control_type == Some(XmlNodeType::XmlDeclaration) {
                self.report(result, DifferenceType::HasXmlDeclarationPrefix)?;
                if !self.control.read()? {
                    return self.report(result, DifferenceType::ChildNodelistLength);
                }
                return self.compare_nodes(result);
            }
            if test_type == Some(XmlNodeType::XmlDeclaration) {
                self.report(result, DifferenceType::HasXmlDeclarationPrefix)?;
                if !self.test.read()? {
                    return self.report(result, DifferenceType::ChildNodelistLength);
                }
                return self.compare_nodes(result);
            }
            return self.report(result, DifferenceType::NodeType);
        }

        let (Some(control), Some(test)) = (self.control.current(), self.test.current()) else {
            return Ok(());
        };
        match control.node_type {
            XmlNodeType::Element => self.compare_elements(result, control, test),
            XmlNodeType::Text | XmlNodeType::Whitespace => {
                self.compare_values(result, DifferenceType::TextValue, &control.value, &test.value)
            }
            XmlNodeType::CData => {
                self.compare_values(result, DifferenceType::CdataValue, &control.value, &test.value)
            }
            XmlNodeType::Comment => self.compare_values(
                result,
                DifferenceType::CommentValue,
                &control.value,
                &test.value,
            ),
            XmlNodeType::ProcessingInstruction => {
                self.compare_values(
                    result,
                    DifferenceType::ProcessingInstructionTarget,
                    &control.name,
                    &test.name,
                )?;
                self.compare_values(
                    result,
                    DifferenceType::ProcessingInstructionData,
                    &control.value,
                    &test.value,
                )
            }
            XmlNodeType::DocumentType => {
                self.compare_values(result, DifferenceType::DoctypeName, &control.name, &test.name)?;
                self.compare_values(
                    result,
                    DifferenceType::DoctypePublicId,
                    &control.public_id,
                    &test.public_id,
                )?;
                self.compare_values(
                    result,
                    DifferenceType::DoctypeSystemId,
                    &control.system_id,
                    &test.system_id,
                )
            }
            XmlNodeType::XmlDeclaration | XmlNodeType::EndElement => Ok(()),
        }
    }

    fn compare_values<V: PartialEq + ?Sized>(
        &self,
        result: &mut DiffResult,
        difference_type: DifferenceType,
        control: &V,
        test: &V,
    ) -> Step {
        if control == test {
            Ok(())
        } else {
            self.report(result, difference_type)
        }
    }

    fn compare_elements(
        &self,
        result: &mut DiffResult,
        control: &ReaderNode,
        test: &ReaderNode,
    ) -> Step {
        self.compare_values(result, DifferenceType::ElementTagName, &control.name, &test.name)?;
        if control.attributes.len() != test.attributes.len() {
            return self.report(result, DifferenceType::ElementNumAttributes);
        }
        self.compare_attributes(result, control, test)
    }

    fn compare_attributes(
        &self,
        result: &mut DiffResult,
        control: &ReaderNode,
        test: &ReaderNode,
    ) -> Step {
        let matches: Vec<Option<(usize, &ReaderAttribute)>> = control
            .attributes
            .iter()
            .map(|attr| {
                if attr.qname.namespace_uri().is_some() {
                    test.attribute_ns(&attr.qname)
                } else {
                    test.attribute(&attr.name)
                }
            })
            .collect();
        let all_found = matches.iter().all(Option::is_some);

        // sequence only makes sense when both sides hold the same attributes
        if !self.configuration.ignore_attribute_order
            && all_found
            && matches
                .iter()
                .enumerate()
                .any(|(i, m)| m.is_some_and(|(j, _)| i != j))
        {
            self.report(result, DifferenceType::AttrSequence)?;
        }

        let mut found_in_test = vec![false; test.attributes.len()];
        for (attr, found) in control.attributes.iter().zip(&matches) {
            let Some((j, test_attr)) = found else {
                continue;
            };
            found_in_test[*j] = true;
            self.compare_values(result, DifferenceType::AttrValue, &attr.value, &test_attr.value)?;
        }

        if !all_found || found_in_test.contains(&false) {
            return self.report(result, DifferenceType::AttrNameNotFound);
        }
        Ok(())
    }

    /// An element written as `<x/>` on one side must be closed right away
    /// on the other.
    fn check_empty_or_at_end_element(&mut self, result: &mut DiffResult) -> Step {
        let control_empty = self.control.is_empty_element();
        let test_empty = self.test.is_empty_element();
        if control_empty && !test_empty {
            let read = self.test.read()?;
            if !read || self.test.node_type() != Some(XmlNodeType::EndElement) {
                return self.report(result, DifferenceType::ChildNodelistLength);
            }
        } else if test_empty && !control_empty {
            let read = self.control.read()?;
            if !read || self.control.node_type() != Some(XmlNodeType::EndElement) {
                return self.report(result, DifferenceType::ChildNodelistLength);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compare(control: &str, test: &str) -> Rc<DiffResult> {
        Diff::from_strs(control, test).compare().unwrap()
    }

    fn compare_with(control: &str, test: &str, configuration: DiffConfiguration) -> Rc<DiffResult> {
        Diff::with_configuration(
            XmlNodeReader::from_xml(control),
            XmlNodeReader::from_xml(test),
            configuration,
        )
        .compare()
        .unwrap()
    }

    fn types(result: &DiffResult) -> Vec<DifferenceType> {
        result
            .differences()
            .iter()
            .map(|d| d.difference_type)
            .collect()
    }

    #[test]
    fn test_identical_documents() {
        let xml = r#"<?xml version="1.0"?><!DOCTYPE a SYSTEM "a.dtd"><a x="1"><!--c--><b>t</b><![CDATA[d]]><?p i?></a>"#;
        let result = compare(xml, xml);
        assert!(result.identical());
        assert!(result.equal());
        assert!(result.difference().is_none());
    }

    #[test]
    fn test_compare_is_memoised() {
        let mut diff = Diff::from_strs("<a>1</a>", "<a>2</a>");
        let first = diff.compare().unwrap();
        let second = diff.compare().unwrap();
        assert!(Rc::ptr_eq(&first, &second));
        assert!(!first.equal());
    }

    #[test]
    fn test_empty_element_forms() {
        let result = compare("<empty/>", "<empty></empty>");
        assert!(result.equal());
        let result = compare("<empty></empty>", "<empty/>");
        assert!(result.equal());

        let result = compare("<empty/>", "<empty>text</empty>");
        assert!(!result.equal());
        assert_eq!(types(&result), vec![DifferenceType::ChildNodelistLength]);
    }

    #[test]
    fn test_attribute_order() {
        let control = r#"<a><b x="1" y="2" z="3"/></a>"#;
        let test = r#"<a><b y="2" z="3" x="1"/></a>"#;
        assert!(compare(control, test).identical());

        let strict = DiffConfiguration {
            ignore_attribute_order: false,
            ..DiffConfiguration::default()
        };
        let result = compare_with(control, test, strict);
        assert_eq!(types(&result), vec![DifferenceType::AttrSequence]);
        assert!(!result.identical());
        assert!(result.equal());
    }

    #[test]
    fn test_sequence_needs_matching_attribute_sets() {
        let strict = DiffConfiguration {
            ignore_attribute_order: false,
            ..DiffConfiguration::default()
        };
        let result = compare_with(r#"<a x="1" y="2"/>"#, r#"<a z="1" x="1"/>"#, strict);
        assert_eq!(types(&result), vec![DifferenceType::AttrNameNotFound]);
    }

    #[test]
    fn test_attribute_differences_are_major() {
        let cases = [
            (r#"<a><b x="1"/></a>"#, "<a><b/></a>", DifferenceType::ElementNumAttributes),
            (r#"<a><b x="1"/></a>"#, r#"<a><b y="2"/></a>"#, DifferenceType::AttrNameNotFound),
            (r#"<a><b x="1"/></a>"#, r#"<a><b x="2"/></a>"#, DifferenceType::AttrValue),
        ];
        for (control, test, expected) in cases {
            let result = compare(control, test);
            assert!(!result.equal(), "{} vs {}", control, test);
            assert_eq!(result.difference().map(|d| d.difference_type), Some(expected));
        }
    }

    #[test]
    fn test_namespaced_attribute_lookup() {
        let result = compare(
            r#"<a xmlns:p="urn:x" p:id="1"/>"#,
            r#"<a xmlns:q="urn:x" q:id="1"/>"#,
        );
        assert!(result.identical(), "{}", result);
    }

    #[test]
    fn test_element_name_mismatch_stops_walk() {
        let result = compare("<a><b/></a>", "<b><a/></b>");
        assert!(!result.equal());
        assert_eq!(types(&result), vec![DifferenceType::ElementTagName]);
    }

    #[test]
    fn test_xml_declaration_on_one_side() {
        let result = compare(r#"<?xml version="1.0"?><a/>"#, "<a/>");
        assert!(result.equal());
        assert!(!result.identical());
        assert_eq!(types(&result), vec![DifferenceType::HasXmlDeclarationPrefix]);

        let result = compare("<a/>", r#"<?xml version="1.0"?><a/>"#);
        assert!(result.equal());
    }

    #[test]
    fn test_extra_nodes_on_either_side() {
        let result = compare("<a/><!--c-->", "<a/>");
        assert_eq!(types(&result), vec![DifferenceType::ChildNodelistLength]);
        assert_eq!(
            result.difference().and_then(|d| d.control_node_type),
            Some(XmlNodeType::Comment)
        );

        let result = compare("<a/>", "<a/><!--c-->");
        assert_eq!(types(&result), vec![DifferenceType::ChildNodelistLength]);
        assert!(!result.equal());
    }

    #[test]
    fn test_value_differences() {
        let cases = [
            ("<a>x</a>", "<a>y</a>", DifferenceType::TextValue),
            ("<a><![CDATA[x]]></a>", "<a><![CDATA[y]]></a>", DifferenceType::CdataValue),
            ("<a><!--x--></a>", "<a><!--y--></a>", DifferenceType::CommentValue),
            ("<a><?x d?></a>", "<a><?y d?></a>", DifferenceType::ProcessingInstructionTarget),
            ("<a><?x d?></a>", "<a><?x e?></a>", DifferenceType::ProcessingInstructionData),
            ("<a>x</a>", "<a><b/></a>", DifferenceType::NodeType),
            (
                r#"<!DOCTYPE a SYSTEM "a.dtd"><a/>"#,
                r#"<!DOCTYPE a SYSTEM "b.dtd"><a/>"#,
                DifferenceType::DoctypeSystemId,
            ),
        ];
        for (control, test, expected) in cases {
            let result = compare(control, test);
            assert_eq!(types(&result), vec![expected], "{} vs {}", control, test);
        }
    }

    #[test]
    fn test_whitespace_handling() {
        let control = "<a>\n  <b/>\n</a>";
        let test = "<a><b/></a>";
        let result = compare(control, test);
        assert_eq!(types(&result), vec![DifferenceType::NodeType]);

        let lenient = DiffConfiguration::new("lenient", WhitespaceHandling::None, true);
        let result = compare_with(control, test, lenient);
        assert!(result.identical(), "{}", result);
    }

    #[test]
    fn test_display() {
        let result = compare("<a/>", "<a/>");
        assert_eq!(result.to_string(), "Diff [identical]");

        let configuration = DiffConfiguration::new("texts", WhitespaceHandling::All, true);
        let result = compare_with("<a>x</a>", "<a>y</a>", configuration);
        let rendered = result.to_string();
        assert!(rendered.starts_with("texts [different]\n  Difference type 14 (major)"));
    }

    #[test]
    fn test_malformed_input_is_an_error() {
        let mut diff = Diff::from_strs("<a></b>", "<a></a>");
        assert!(diff.compare().is_err());
    }
}
