//! The difference engine.
//!
//! [`DomDifferenceEngine`] walks a control and a test tree in parallel. Every
//! atomic check becomes a [`Comparison`] whose raw outcome is passed through
//! the configured [`DifferenceEvaluator`] and then announced to the
//! registered listeners. A comparison evaluated as
//! [`ComparisonResult::Critical`] stops the walk at that point.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use rustc_hash::FxHashSet;
use tracing::{debug, trace};

use crate::comparison::{Comparison, ComparisonResult, ComparisonType, ComparisonValue, Detail};
use crate::error::Result;
use crate::evaluators::{self, DifferenceEvaluator};
use crate::matcher::{DefaultNodeMatcher, NodeMatcher};
use crate::node::{NodeRef, NodeType, QName, XSI_NS_URI};
use crate::source::Source;
use crate::xpath::XPathContext;

/// Receives every comparison together with its evaluated result.
pub trait ComparisonListener {
    fn comparison_performed(&self, comparison: &Comparison, outcome: ComparisonResult);
}

impl<F> ComparisonListener for F
where
    F: Fn(&Comparison, ComparisonResult),
{
    fn comparison_performed(&self, comparison: &Comparison, outcome: ComparisonResult) {
        self(comparison, outcome)
    }
}

/// Compares two node trees.
///
/// The engine keeps no state between calls to [`compare`](Self::compare);
/// configuration must be finished before comparing.
pub struct DomDifferenceEngine {
    node_matcher: Rc<dyn NodeMatcher>,
    difference_evaluator: Rc<dyn DifferenceEvaluator>,
    /// Namespace URI -> prefix used in XPath output.
    namespace_context: HashMap<String, String>,
    comparison_listeners: Vec<Rc<dyn ComparisonListener>>,
    match_listeners: Vec<Rc<dyn ComparisonListener>>,
    difference_listeners: Vec<Rc<dyn ComparisonListener>>,
}

impl Default for DomDifferenceEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DomDifferenceEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DomDifferenceEngine")
            .field("namespace_context", &self.namespace_context)
            .field("comparison_listeners", &self.comparison_listeners.len())
            .field("match_listeners", &self.match_listeners.len())
            .field("difference_listeners", &self.difference_listeners.len())
            .finish_non_exhaustive()
    }
}

impl DomDifferenceEngine {
    /// Creates an engine with the default node matcher and evaluator.
    pub fn new() -> Self {
        DomDifferenceEngine {
            node_matcher: Rc::new(DefaultNodeMatcher::default()),
            difference_evaluator: Rc::new(evaluators::default),
            namespace_context: HashMap::new(),
            comparison_listeners: Vec::new(),
            match_listeners: Vec::new(),
            difference_listeners: Vec::new(),
        }
    }

    pub fn set_node_matcher<M>(&mut self, matcher: M)
    where
        M: NodeMatcher + 'static,
    {
        self.node_matcher = Rc::new(matcher);
    }

    pub fn set_difference_evaluator<E>(&mut self, evaluator: E)
    where
        E: DifferenceEvaluator + 'static,
    {
        self.difference_evaluator = Rc::new(evaluator);
    }

    /// Sets the namespace URI -> prefix mapping used when rendering XPaths.
    pub fn set_namespace_context(&mut self, uri_to_prefix: HashMap<String, String>) {
        self.namespace_context = uri_to_prefix;
    }

    /// Registers a listener notified of every comparison.
    pub fn add_comparison_listener<L>(&mut self, listener: L)
    where
        L: ComparisonListener + 'static,
    {
        self.comparison_listeners.push(Rc::new(listener));
    }

    /// Registers a listener notified of comparisons evaluated as equal.
    pub fn add_match_listener<L>(&mut self, listener: L)
    where
        L: ComparisonListener + 'static,
    {
        self.match_listeners.push(Rc::new(listener));
    }

    /// Registers a listener notified of comparisons not evaluated as equal.
    pub fn add_difference_listener<L>(&mut self, listener: L)
    where
        L: ComparisonListener + 'static,
    {
        self.difference_listeners.push(Rc::new(listener));
    }

    /// Loads both sources and compares the resulting trees.
    ///
    /// Returns the most severe result of all comparisons performed.
    pub fn compare(&self, control: &dyn Source, test: &dyn Source) -> Result<ComparisonResult> {
        debug!(
            control = control.system_id().unwrap_or("<memory>"),
            test = test.system_id().unwrap_or("<memory>"),
            "comparing documents"
        );
        let control = control.load()?;
        let test = test.load()?;
        self.compare_nodes(&control, &test)
    }

    /// Compares two already loaded trees.
    pub fn compare_nodes(&self, control: &NodeRef, test: &NodeRef) -> Result<ComparisonResult> {
        let mut walk = Walk {
            engine: self,
            control_ctx: XPathContext::with_prefixes(&self.namespace_context),
            test_ctx: XPathContext::with_prefixes(&self.namespace_context),
        };
        let result = walk.compare_nodes(control, test)?;
        debug!(%result, "comparison finished");
        Ok(result)
    }

    /// Evaluates a comparison and notifies the listeners.
    fn perform(&self, comparison: Comparison) -> ComparisonResult {
        let outcome = comparison.raw_result();
        let result = self.difference_evaluator.evaluate(&comparison, outcome);

        for listener in &self.comparison_listeners {
            listener.comparison_performed(&comparison, result);
        }
        if result == ComparisonResult::Equal {
            for listener in &self.match_listeners {
                listener.comparison_performed(&comparison, result);
            }
        } else {
            trace!(%result, %comparison, "difference");
            for listener in &self.difference_listeners {
                listener.comparison_performed(&comparison, result);
            }
        }
        result
    }
}

/// Accumulates the results of a sequence of comparisons.
///
/// Once a step is critical the remaining steps are not evaluated.
#[derive(Debug, Default)]
struct ComparisonChain {
    result: ComparisonResult,
}

impl ComparisonChain {
    fn new() -> Self {
        ComparisonChain::default()
    }

    fn and_then<F>(&mut self, step: F) -> Result<()>
    where
        F: FnOnce() -> Result<ComparisonResult>,
    {
        if self.result != ComparisonResult::Critical {
            self.result = self.result.max(step()?);
        }
        Ok(())
    }

    fn finish(self) -> ComparisonResult {
        self.result
    }
}

/// State of a single comparison run: the engine plus one XPath tracker per
/// side.
struct Walk<'e> {
    engine: &'e DomDifferenceEngine,
    control_ctx: XPathContext,
    test_ctx: XPathContext,
}

fn schema_location() -> QName {
    QName::new(XSI_NS_URI, "schemaLocation")
}

fn no_namespace_schema_location() -> QName {
    QName::new(XSI_NS_URI, "noNamespaceSchemaLocation")
}

fn str_value(value: Option<&str>) -> Option<ComparisonValue> {
    value.map(ComparisonValue::from)
}

/// Value reported for a child without counterpart.
fn lookup_value(node: &NodeRef) -> ComparisonValue {
    match node.name() {
        Some(name) => ComparisonValue::QName(name.clone()),
        None => ComparisonValue::Str(node.display_name()),
    }
}

impl Walk<'_> {
    /// Compares two nodes at the current locations of both trackers.
    fn compare_values(
        &self,
        comparison_type: ComparisonType,
        control: &NodeRef,
        control_value: Option<ComparisonValue>,
        test: &NodeRef,
        test_value: Option<ComparisonValue>,
    ) -> ComparisonResult {
        self.engine.perform(Comparison::new(
            comparison_type,
            Detail::new(
                Some(control.clone()),
                Some(self.control_ctx.xpath()),
                control_value,
            ),
            Detail::new(Some(test.clone()), Some(self.test_ctx.xpath()), test_value),
        ))
    }

    fn compare_nodes(&mut self, control: &NodeRef, test: &NodeRef) -> Result<ComparisonResult> {
        let control_type = control.node_type();
        let test_type = test.node_type();
        let mut chain = ComparisonChain::new();

        chain.and_then(|| {
            Ok(self.compare_values(
                ComparisonType::NodeType,
                control,
                Some(control_type.into()),
                test,
                Some(test_type.into()),
            ))
        })?;

        let named = |t: NodeType| matches!(t, NodeType::Element | NodeType::Attribute);
        if named(control_type) && named(test_type) {
            chain.and_then(|| {
                Ok(self.compare_values(
                    ComparisonType::NamespaceUri,
                    control,
                    str_value(control.namespace_uri()),
                    test,
                    str_value(test.namespace_uri()),
                ))
            })?;
            chain.and_then(|| {
                Ok(self.compare_values(
                    ComparisonType::NamespacePrefix,
                    control,
                    str_value(control.prefix()),
                    test,
                    str_value(test.prefix()),
                ))
            })?;
        }

        let comparable = control_type == test_type
            || (control_type.is_character_data() && test_type.is_character_data());
        if comparable {
            chain.and_then(|| self.compare_by_kind(control, test))?;
        }
        Ok(chain.finish())
    }

    fn compare_by_kind(&mut self, control: &NodeRef, test: &NodeRef) -> Result<ComparisonResult> {
        match control.node_type() {
            NodeType::Document => self.compare_documents(control, test),
            NodeType::DocumentType => self.compare_doctypes(control, test),
            NodeType::Element => self.compare_elements(control, test),
            NodeType::Attribute => self.compare_attributes(control, test),
            NodeType::Text | NodeType::CData | NodeType::Comment => Ok(self.compare_values(
                ComparisonType::TextValue,
                control,
                str_value(control.value()),
                test,
                str_value(test.value()),
            )),
            NodeType::ProcessingInstruction => {
                let mut chain = ComparisonChain::new();
                chain.and_then(|| {
                    Ok(self.compare_values(
                        ComparisonType::ProcessingInstructionTarget,
                        control,
                        str_value(control.target()),
                        test,
                        str_value(test.target()),
                    ))
                })?;
                chain.and_then(|| {
                    Ok(self.compare_values(
                        ComparisonType::ProcessingInstructionData,
                        control,
                        str_value(control.value()),
                        test,
                        str_value(test.value()),
                    ))
                })?;
                Ok(chain.finish())
            }
        }
    }

    fn compare_documents(
        &mut self,
        control: &NodeRef,
        test: &NodeRef,
    ) -> Result<ComparisonResult> {
        let mut chain = ComparisonChain::new();
        let control_doctype = control.doctype();
        let test_doctype = test.doctype();

        chain.and_then(|| {
            Ok(self.compare_values(
                ComparisonType::HasDoctypeDeclaration,
                control,
                Some(control_doctype.is_some().into()),
                test,
                Some(test_doctype.is_some().into()),
            ))
        })?;
        if let (Some(cd), Some(td)) = (control_doctype, test_doctype) {
            chain.and_then(|| self.compare_doctypes(cd, td))?;
        }

        if let (Some(ci), Some(ti)) = (control.document_info(), test.document_info()) {
            chain.and_then(|| {
                Ok(self.compare_values(
                    ComparisonType::XmlVersion,
                    control,
                    Some(ci.xml_version.as_str().into()),
                    test,
                    Some(ti.xml_version.as_str().into()),
                ))
            })?;
            chain.and_then(|| {
                Ok(self.compare_values(
                    ComparisonType::XmlStandalone,
                    control,
                    ci.standalone.map(ComparisonValue::from),
                    test,
                    ti.standalone.map(ComparisonValue::from),
                ))
            })?;
            chain.and_then(|| {
                Ok(self.compare_values(
                    ComparisonType::XmlEncoding,
                    control,
                    str_value(ci.encoding.as_deref()),
                    test,
                    str_value(ti.encoding.as_deref()),
                ))
            })?;
        }

        chain.and_then(|| self.compare_children(control, test))?;
        Ok(chain.finish())
    }

    fn compare_doctypes(&mut self, control: &NodeRef, test: &NodeRef) -> Result<ComparisonResult> {
        let (Some(c), Some(t)) = (control.doctype_ids(), test.doctype_ids()) else {
            return Ok(ComparisonResult::Equal);
        };
        let mut chain = ComparisonChain::new();
        chain.and_then(|| {
            Ok(self.compare_values(
                ComparisonType::DoctypeName,
                control,
                Some(c.0.into()),
                test,
                Some(t.0.into()),
            ))
        })?;
        chain.and_then(|| {
            Ok(self.compare_values(
                ComparisonType::DoctypePublicId,
                control,
                str_value(c.1),
                test,
                str_value(t.1),
            ))
        })?;
        chain.and_then(|| {
            Ok(self.compare_values(
                ComparisonType::DoctypeSystemId,
                control,
                str_value(c.2),
                test,
                str_value(t.2),
            ))
        })?;
        Ok(chain.finish())
    }

    fn compare_elements(&mut self, control: &NodeRef, test: &NodeRef) -> Result<ComparisonResult> {
        let mut chain = ComparisonChain::new();
        for (comparison_type, name) in [
            (ComparisonType::SchemaLocation, schema_location()),
            (
                ComparisonType::NoNamespaceSchemaLocation,
                no_namespace_schema_location(),
            ),
        ] {
            chain.and_then(|| {
                Ok(self.compare_values(
                    comparison_type,
                    control,
                    str_value(control.attribute_value(&name)),
                    test,
                    str_value(test.attribute_value(&name)),
                ))
            })?;
        }
        chain.and_then(|| {
            Ok(self.compare_values(
                ComparisonType::ElementTagName,
                control,
                str_value(control.local_name()),
                test,
                str_value(test.local_name()),
            ))
        })?;
        chain.and_then(|| self.compare_element_attributes(control, test))?;
        chain.and_then(|| self.compare_children(control, test))?;
        Ok(chain.finish())
    }

    fn compare_element_attributes(
        &mut self,
        control: &NodeRef,
        test: &NodeRef,
    ) -> Result<ComparisonResult> {
        let schema = [schema_location(), no_namespace_schema_location()];
        let plain = |element: &NodeRef| -> Vec<(QName, NodeRef)> {
            element
                .attributes()
                .iter()
                .filter_map(|a| a.name().map(|n| (n.clone(), a.clone())))
                .filter(|(name, _)| !schema.contains(name))
                .collect()
        };
        let control_attrs = plain(control);
        let test_attrs = plain(test);

        let mut chain = ComparisonChain::new();
        chain.and_then(|| {
            Ok(self.compare_values(
                ComparisonType::ElementNumAttributes,
                control,
                Some(control_attrs.len().into()),
                test,
                Some(test_attrs.len().into()),
            ))
        })?;

        self.control_ctx
            .add_attributes(control_attrs.iter().map(|(name, _)| name));
        self.test_ctx
            .add_attributes(test_attrs.iter().map(|(name, _)| name));

        let mut found_in_test: FxHashSet<usize> = FxHashSet::default();
        for (name, control_attr) in &control_attrs {
            let found = test_attrs.iter().position(|(n, _)| n == name);

            self.control_ctx.navigate_to_attribute(name)?;
            chain.and_then(|| {
                let test_value = found.map(|i| ComparisonValue::QName(test_attrs[i].0.clone()));
                Ok(self.compare_values(
                    ComparisonType::AttrNameLookup,
                    control,
                    Some(name.clone().into()),
                    test,
                    test_value,
                ))
            })?;

            if let Some(i) = found {
                found_in_test.insert(i);
                let (test_name, test_attr) = &test_attrs[i];
                self.test_ctx.navigate_to_attribute(test_name)?;
                chain.and_then(|| self.compare_nodes(control_attr, test_attr))?;
                self.test_ctx.navigate_to_parent()?;
            }
            self.control_ctx.navigate_to_parent()?;
        }

        for (i, (name, _)) in test_attrs.iter().enumerate() {
            if found_in_test.contains(&i) {
                continue;
            }
            self.test_ctx.navigate_to_attribute(name)?;
            chain.and_then(|| {
                Ok(self.compare_values(
                    ComparisonType::AttrNameLookup,
                    control,
                    None,
                    test,
                    Some(name.clone().into()),
                ))
            })?;
            self.test_ctx.navigate_to_parent()?;
        }
        Ok(chain.finish())
    }

    fn compare_children(&mut self, control: &NodeRef, test: &NodeRef) -> Result<ComparisonResult> {
        let control_children = control.children();
        let test_children = test.children();
        self.control_ctx.set_children(control_children);
        self.test_ctx.set_children(test_children);

        let mut chain = ComparisonChain::new();
        chain.and_then(|| {
            Ok(self.compare_values(
                ComparisonType::ChildNodelistLength,
                control,
                Some(control_children.len().into()),
                test,
                Some(test_children.len().into()),
            ))
        })?;

        let pairs = self
            .engine
            .node_matcher
            .match_nodes(control_children, test_children);
        let matched_control: FxHashSet<usize> = pairs.iter().map(|p| p.control_index).collect();
        let matched_test: FxHashSet<usize> = pairs.iter().map(|p| p.test_index).collect();

        for (i, child) in control_children.iter().enumerate() {
            if matched_control.contains(&i) {
                continue;
            }
            self.control_ctx.navigate_to_child(i)?;
            chain.and_then(|| {
                Ok(self.engine.perform(Comparison::new(
                    ComparisonType::ChildLookup,
                    Detail::new(
                        Some(child.clone()),
                        Some(self.control_ctx.xpath()),
                        Some(lookup_value(child)),
                    ),
                    Detail::absent(),
                )))
            })?;
            self.control_ctx.navigate_to_parent()?;
        }
        for (i, child) in test_children.iter().enumerate() {
            if matched_test.contains(&i) {
                continue;
            }
            self.test_ctx.navigate_to_child(i)?;
            chain.and_then(|| {
                Ok(self.engine.perform(Comparison::new(
                    ComparisonType::ChildLookup,
                    Detail::absent(),
                    Detail::new(
                        Some(child.clone()),
                        Some(self.test_ctx.xpath()),
                        Some(lookup_value(child)),
                    ),
                )))
            })?;
            self.test_ctx.navigate_to_parent()?;
        }

        for pair in &pairs {
            self.control_ctx.navigate_to_child(pair.control_index)?;
            self.test_ctx.navigate_to_child(pair.test_index)?;
            chain.and_then(|| self.compare_nodes(&pair.control, &pair.test))?;
            self.test_ctx.navigate_to_parent()?;
            self.control_ctx.navigate_to_parent()?;
        }

        if !pairs.is_empty() {
            let in_order = pairs.windows(2).all(|w| w[0].test_index < w[1].test_index);
            chain.and_then(|| {
                Ok(self.compare_values(
                    ComparisonType::ChildNodelistSequence,
                    control,
                    Some(true.into()),
                    test,
                    Some(in_order.into()),
                ))
            })?;
        }
        Ok(chain.finish())
    }

    fn compare_attributes(&mut self, control: &NodeRef, test: &NodeRef) -> Result<ComparisonResult> {
        let mut chain = ComparisonChain::new();
        chain.and_then(|| {
            Ok(self.compare_values(
                ComparisonType::AttrValueExplicitlySpecified,
                control,
                control.is_specified().map(ComparisonValue::from),
                test,
                test.is_specified().map(ComparisonValue::from),
            ))
        })?;
        chain.and_then(|| {
            Ok(self.compare_values(
                ComparisonType::AttrValue,
                control,
                str_value(control.value()),
                test,
                str_value(test.value()),
            ))
        })?;
        Ok(chain.finish())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::matcher::DefaultNodeMatcher;
    use crate::selectors;
    use crate::source::StringSource;

    type Recorded = Rc<RefCell<Vec<(Comparison, ComparisonResult)>>>;

    fn recording(engine: &mut DomDifferenceEngine) -> Recorded {
        let differences: Recorded = Rc::new(RefCell::new(Vec::new()));
        let sink = differences.clone();
        engine.add_difference_listener(move |c: &Comparison, r: ComparisonResult| {
            sink.borrow_mut().push((c.clone(), r));
        });
        differences
    }

    fn compare(engine: &DomDifferenceEngine, control: &str, test: &str) -> ComparisonResult {
        engine
            .compare(&StringSource::new(control), &StringSource::new(test))
            .unwrap()
    }

    fn types(recorded: &Recorded) -> Vec<ComparisonType> {
        recorded
            .borrow()
            .iter()
            .map(|(c, _)| c.comparison_type)
            .collect()
    }

    #[test]
    fn test_identical_documents_are_equal() {
        let mut engine = DomDifferenceEngine::new();
        let differences = recording(&mut engine);
        let xml = r#"<?xml version="1.0"?><a x="1"><!-- c --><b>t</b><?pi data?></a>"#;
        assert_eq!(compare(&engine, xml, xml), ComparisonResult::Equal);
        assert!(differences.borrow().is_empty());
    }

    #[test]
    fn test_text_difference_with_xpath() {
        let mut engine = DomDifferenceEngine::new();
        let differences = recording(&mut engine);
        let result = compare(&engine, "<a><b>x</b></a>", "<a><b>y</b></a>");
        assert_eq!(result, ComparisonResult::Different);

        let recorded = differences.borrow();
        assert_eq!(recorded.len(), 1);
        let (c, r) = &recorded[0];
        assert_eq!(c.comparison_type, ComparisonType::TextValue);
        assert_eq!(*r, ComparisonResult::Different);
        assert_eq!(c.control.xpath.as_deref(), Some("/a[1]/b[1]/text()[1]"));
        assert_eq!(c.test.xpath.as_deref(), Some("/a[1]/b[1]/text()[1]"));
        assert_eq!(c.control.value, Some("x".into()));
        assert_eq!(c.test.value, Some("y".into()));
    }

    #[test]
    fn test_empty_element_forms_are_equal() {
        let engine = DomDifferenceEngine::new();
        assert_eq!(
            compare(&engine, "<empty/>", "<empty></empty>"),
            ComparisonResult::Equal
        );
        assert_ne!(
            compare(&engine, "<empty/>", "<empty>text</empty>"),
            ComparisonResult::Equal
        );
    }

    #[test]
    fn test_text_and_cdata_are_similar() {
        let mut engine = DomDifferenceEngine::new();
        let differences = recording(&mut engine);
        let result = compare(&engine, "<a>foo</a>", "<a><![CDATA[foo]]></a>");
        assert_eq!(result, ComparisonResult::Similar);
        assert_eq!(types(&differences), vec![ComparisonType::NodeType]);
    }

    #[test]
    fn test_missing_attribute_xpaths() {
        let mut engine = DomDifferenceEngine::new();
        let differences = recording(&mut engine);
        compare(&engine, r#"<a><b x="1"/></a>"#, "<a><b/></a>");

        let recorded = differences.borrow();
        assert_eq!(
            recorded.iter().map(|(c, _)| c.comparison_type).collect::<Vec<_>>(),
            vec![
                ComparisonType::ElementNumAttributes,
                ComparisonType::AttrNameLookup
            ]
        );
        let (lookup, _) = &recorded[1];
        assert_eq!(lookup.control.xpath.as_deref(), Some("/a[1]/b[1]/@x"));
        assert_eq!(lookup.test.xpath.as_deref(), Some("/a[1]/b[1]"));
        assert_eq!(lookup.test.value, None);
    }

    #[test]
    fn test_test_only_attribute() {
        let mut engine = DomDifferenceEngine::new();
        let differences = recording(&mut engine);
        compare(&engine, "<a/>", r#"<a y="2"/>"#);

        let recorded = differences.borrow();
        let (lookup, _) = &recorded[1];
        assert_eq!(lookup.comparison_type, ComparisonType::AttrNameLookup);
        assert_eq!(lookup.control.xpath.as_deref(), Some("/a[1]"));
        assert_eq!(lookup.control.value, None);
        assert_eq!(lookup.test.xpath.as_deref(), Some("/a[1]/@y"));
    }

    #[test]
    fn test_attribute_order_is_ignored() {
        let engine = DomDifferenceEngine::new();
        assert_eq!(
            compare(&engine, r#"<a x="1" y="2"/>"#, r#"<a y="2" x="1"/>"#),
            ComparisonResult::Equal
        );
    }

    #[test]
    fn test_attribute_value_difference() {
        let mut engine = DomDifferenceEngine::new();
        let differences = recording(&mut engine);
        compare(&engine, r#"<a><b x="1"/></a>"#, r#"<a><b x="2"/></a>"#);
        let recorded = differences.borrow();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].0.comparison_type, ComparisonType::AttrValue);
        assert_eq!(recorded[0].0.control.xpath.as_deref(), Some("/a[1]/b[1]/@x"));
    }

    #[test]
    fn test_unmatched_children_are_looked_up() {
        let mut engine = DomDifferenceEngine::new();
        engine.set_node_matcher(DefaultNodeMatcher::new(selectors::by_name));
        let differences = recording(&mut engine);
        compare(&engine, "<a><b/><c/></a>", "<a><b/><d/></a>");

        let recorded = differences.borrow();
        let lookups: Vec<&Comparison> = recorded
            .iter()
            .map(|(c, _)| c)
            .filter(|c| c.comparison_type == ComparisonType::ChildLookup)
            .collect();
        assert_eq!(lookups.len(), 2);
        assert_eq!(lookups[0].control.xpath.as_deref(), Some("/a[1]/c[1]"));
        assert!(lookups[0].test.target.is_none());
        assert!(lookups[0].test.xpath.is_none());
        assert_eq!(lookups[1].test.xpath.as_deref(), Some("/a[1]/d[1]"));
        assert!(lookups[1].control.target.is_none());
    }

    #[test]
    fn test_length_difference_does_not_stop_descent() {
        let mut engine = DomDifferenceEngine::new();
        let differences = recording(&mut engine);
        let result = compare(&engine, "<a><b>1</b></a>", "<a><b>2</b><c/></a>");
        assert_eq!(result, ComparisonResult::Different);
        assert_eq!(
            types(&differences),
            vec![
                ComparisonType::ChildNodelistLength,
                ComparisonType::ChildLookup,
                ComparisonType::TextValue,
            ]
        );
        let recorded = differences.borrow();
        assert_eq!(
            recorded[2].0.control.xpath.as_deref(),
            Some("/a[1]/b[1]/text()[1]")
        );
    }

    #[test]
    fn test_reordered_children_are_similar() {
        let mut engine = DomDifferenceEngine::new();
        engine.set_node_matcher(DefaultNodeMatcher::new(selectors::by_name));
        let differences = recording(&mut engine);
        let result = compare(&engine, "<a><b/><c/></a>", "<a><c/><b/></a>");
        assert_eq!(result, ComparisonResult::Similar);
        assert_eq!(types(&differences), vec![ComparisonType::ChildNodelistSequence]);
    }

    #[test]
    fn test_element_name_mismatch() {
        let engine = DomDifferenceEngine::new();
        assert_eq!(
            compare(&engine, "<a><b/></a>", "<b><a/></b>"),
            ComparisonResult::Different
        );
    }

    #[test]
    fn test_namespace_prefix_is_similar() {
        let mut engine = DomDifferenceEngine::new();
        let differences = recording(&mut engine);
        let result = compare(
            &engine,
            r#"<x:a xmlns:x="urn:a"/>"#,
            r#"<y:a xmlns:y="urn:a"/>"#,
        );
        assert_eq!(result, ComparisonResult::Similar);
        assert_eq!(types(&differences), vec![ComparisonType::NamespacePrefix]);
    }

    #[test]
    fn test_namespace_uri_is_different() {
        let mut engine = DomDifferenceEngine::new();
        let differences = recording(&mut engine);
        let result = compare(&engine, r#"<a xmlns="urn:a"/>"#, r#"<a xmlns="urn:b"/>"#);
        assert_eq!(result, ComparisonResult::Different);
        assert_eq!(types(&differences), vec![ComparisonType::NamespaceUri]);
    }

    #[test]
    fn test_namespace_context_in_xpath() {
        let mut engine = DomDifferenceEngine::new();
        let mut prefixes = HashMap::new();
        prefixes.insert("urn:a".to_string(), "p".to_string());
        engine.set_namespace_context(prefixes);
        let differences = recording(&mut engine);
        compare(
            &engine,
            r#"<a xmlns="urn:a"><b>1</b></a>"#,
            r#"<a xmlns="urn:a"><b>2</b></a>"#,
        );
        assert_eq!(
            differences.borrow()[0].0.control.xpath.as_deref(),
            Some("/p:a[1]/p:b[1]/text()[1]")
        );
    }

    #[test]
    fn test_doctype_presence_is_similar() {
        let mut engine = DomDifferenceEngine::new();
        let differences = recording(&mut engine);
        let result = compare(&engine, r#"<!DOCTYPE a SYSTEM "a.dtd"><a/>"#, "<a/>");
        assert_eq!(result, ComparisonResult::Similar);
        assert_eq!(
            types(&differences),
            vec![ComparisonType::HasDoctypeDeclaration]
        );
    }

    #[test]
    fn test_doctype_details() {
        let mut engine = DomDifferenceEngine::new();
        let differences = recording(&mut engine);
        let result = compare(
            &engine,
            r#"<!DOCTYPE a SYSTEM "a.dtd"><a/>"#,
            r#"<!DOCTYPE b SYSTEM "b.dtd"><a/>"#,
        );
        assert_eq!(result, ComparisonResult::Different);
        assert_eq!(
            types(&differences),
            vec![ComparisonType::DoctypeName, ComparisonType::DoctypeSystemId]
        );
    }

    #[test]
    fn test_xml_declaration_details() {
        let mut engine = DomDifferenceEngine::new();
        let differences = recording(&mut engine);
        compare(
            &engine,
            r#"<?xml version="1.0" standalone="yes"?><a/>"#,
            r#"<?xml version="1.1"?><a/>"#,
        );
        assert_eq!(
            types(&differences),
            vec![ComparisonType::XmlVersion, ComparisonType::XmlStandalone]
        );
    }

    #[test]
    fn test_undeclared_standalone_differs_from_no() {
        let mut engine = DomDifferenceEngine::new();
        let differences = recording(&mut engine);
        compare(
            &engine,
            r#"<?xml version="1.0" standalone="no"?><a/>"#,
            r#"<?xml version="1.0"?><a/>"#,
        );
        assert_eq!(types(&differences), vec![ComparisonType::XmlStandalone]);

        let mut engine = DomDifferenceEngine::new();
        let differences = recording(&mut engine);
        compare(&engine, r#"<?xml version="1.0"?><a/>"#, "<a/>");
        assert!(types(&differences).is_empty());
    }

    #[test]
    fn test_schema_location_is_similar() {
        let mut engine = DomDifferenceEngine::new();
        let differences = recording(&mut engine);
        let xsi = "http://www.w3.org/2001/XMLSchema-instance";
        let result = compare(
            &engine,
            &format!(r#"<a xmlns:xsi="{}" xsi:schemaLocation="urn:a a.xsd"/>"#, xsi),
            &format!(r#"<a xmlns:xsi="{}" xsi:schemaLocation="urn:a b.xsd"/>"#, xsi),
        );
        assert_eq!(result, ComparisonResult::Similar);
        assert_eq!(types(&differences), vec![ComparisonType::SchemaLocation]);
    }

    #[test]
    fn test_processing_instruction_and_comment() {
        let mut engine = DomDifferenceEngine::new();
        let differences = recording(&mut engine);
        compare(
            &engine,
            "<a><?t d?><!--x--></a>",
            "<a><?u d?><!--y--></a>",
        );
        let recorded = differences.borrow();
        assert_eq!(
            recorded.iter().map(|(c, _)| c.comparison_type).collect::<Vec<_>>(),
            vec![
                ComparisonType::ProcessingInstructionTarget,
                ComparisonType::TextValue
            ]
        );
        assert_eq!(
            recorded[1].0.control.xpath.as_deref(),
            Some("/a[1]/comment()[1]")
        );
    }

    #[test]
    fn test_stop_when_different_stops_descent() {
        let mut engine = DomDifferenceEngine::new();
        engine.set_difference_evaluator(evaluators::stop_when_different(evaluators::default));
        let differences = recording(&mut engine);
        let result = compare(
            &engine,
            "<a><b>1</b><c>2</c></a>",
            "<a><b>x</b><c>y</c></a>",
        );
        assert_eq!(result, ComparisonResult::Critical);
        assert_eq!(differences.borrow().len(), 1);
    }

    #[test]
    fn test_listener_fan_out() {
        let mut engine = DomDifferenceEngine::new();
        let all = Rc::new(RefCell::new(0usize));
        let matches = Rc::new(RefCell::new(0usize));
        let order = Rc::new(RefCell::new(Vec::new()));
        {
            let all = all.clone();
            let order = order.clone();
            engine.add_comparison_listener(move |_: &Comparison, _: ComparisonResult| {
                *all.borrow_mut() += 1;
                order.borrow_mut().push("first");
            });
        }
        {
            let order = order.clone();
            engine.add_comparison_listener(move |_: &Comparison, _: ComparisonResult| {
                order.borrow_mut().push("second");
            });
        }
        {
            let matches = matches.clone();
            engine.add_match_listener(move |_: &Comparison, r: ComparisonResult| {
                assert_eq!(r, ComparisonResult::Equal);
                *matches.borrow_mut() += 1;
            });
        }
        let differences = recording(&mut engine);
        compare(&engine, "<a><b>x</b></a>", "<a><b>y</b></a>");

        assert_eq!(*all.borrow(), *matches.borrow() + differences.borrow().len());
        assert!(*matches.borrow() > 0);
        let order = order.borrow();
        assert!(order.chunks(2).all(|pair| pair == ["first", "second"]));
    }
}
