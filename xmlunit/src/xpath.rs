//! XPath location tracking.
//!
//! An [`XPathContext`] mirrors the engine's descent into one of the two
//! trees. Before descending, the engine registers the children (and
//! attributes) of the current node; navigating then pushes the precomputed
//! step for one of them and `navigate_to_parent` pops it again. Every
//! navigate-in must be paired with a navigate-out.

use std::collections::HashMap;

use rustc_hash::FxHashMap;

use crate::error::{Error, Result};
use crate::node::{NodeRef, NodeType, QName};

const SEPARATOR: &str = "/";
const ATTRIBUTE: &str = "@";
const TEXT: &str = "text()";
const COMMENT: &str = "comment()";
const PI: &str = "processing-instruction()";
const OTHER: &str = "node()";

/// What a positional index counts.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum StepKind {
    Element(QName),
    Text,
    Comment,
    ProcessingInstruction,
    Other,
}

/// One step of the path, with the steps registered below it.
#[derive(Debug, Default)]
struct Level {
    expression: String,
    children: Vec<String>,
    attributes: FxHashMap<QName, String>,
    counts: FxHashMap<StepKind, usize>,
}

impl Level {
    fn new(expression: String) -> Self {
        Level {
            expression,
            ..Level::default()
        }
    }

    fn next_index(&mut self, kind: StepKind) -> usize {
        let count = self.counts.entry(kind).or_insert(0);
        *count += 1;
        *count
    }
}

/// Tracks the XPath of the node currently being compared.
#[derive(Debug)]
pub struct XPathContext {
    path: Vec<Level>,
    /// Namespace URI -> prefix used when rendering names.
    prefixes: FxHashMap<String, String>,
}

impl Default for XPathContext {
    fn default() -> Self {
        Self::new()
    }
}

impl XPathContext {
    /// Creates a context positioned at the document root. Names are rendered
    /// by local name only.
    pub fn new() -> Self {
        Self::with_prefixes(&HashMap::new())
    }

    /// Creates a context that renders names in the given namespaces
    /// (URI -> prefix) as `prefix:local`.
    pub fn with_prefixes(uri_to_prefix: &HashMap<String, String>) -> Self {
        XPathContext {
            path: vec![Level::new(String::new())],
            prefixes: uri_to_prefix
                .iter()
                .map(|(uri, prefix)| (uri.clone(), prefix.clone()))
                .collect(),
        }
    }

    /// Number of levels on the stack, 1 at the root.
    pub fn depth(&self) -> usize {
        self.path.len()
    }

    fn current(&mut self) -> &mut Level {
        // the root level is never popped
        let last = self.path.len() - 1;
        &mut self.path[last]
    }

    /// Replaces the registered children of the current node.
    pub fn set_children(&mut self, children: &[NodeRef]) {
        let level = self.current();
        level.children.clear();
        level.counts.clear();
        self.append_children(children);
    }

    /// Registers further children of the current node.
    ///
    /// Positional indexes continue from the children registered so far.
    pub fn append_children(&mut self, children: &[NodeRef]) {
        for child in children {
            let (kind, label) = match child.node_type() {
                NodeType::Element => {
                    let name = child.name().cloned().unwrap_or_else(|| QName::local(""));
                    let label = self.render(&name);
                    (StepKind::Element(name), label)
                }
                NodeType::Text | NodeType::CData => (StepKind::Text, TEXT.to_string()),
                NodeType::Comment => (StepKind::Comment, COMMENT.to_string()),
                NodeType::ProcessingInstruction => {
                    (StepKind::ProcessingInstruction, PI.to_string())
                }
                _ => (StepKind::Other, OTHER.to_string()),
            };
            let level = self.current();
            let index = level.next_index(kind);
            level.children.push(format!("{}[{}]", label, index));
        }
    }

    /// Registers the attributes of the current element.
    pub fn add_attributes<'a, I>(&mut self, names: I)
    where
        I: IntoIterator<Item = &'a QName>,
    {
        for name in names {
            let step = format!("{}{}", ATTRIBUTE, self.render(name));
            self.current().attributes.insert(name.clone(), step);
        }
    }

    /// Descends into the registered child at `index`.
    pub fn navigate_to_child(&mut self, index: usize) -> Result<()> {
        let step = self.current().children.get(index).cloned().ok_or_else(|| {
            Error::XPathNavigation(format!("no child registered at index {}", index))
        })?;
        self.path.push(Level::new(step));
        Ok(())
    }

    /// Descends into the registered attribute `name`.
    pub fn navigate_to_attribute(&mut self, name: &QName) -> Result<()> {
        let step = self
            .current()
            .attributes
            .get(name)
            .cloned()
            .ok_or_else(|| Error::XPathNavigation(format!("no attribute {} registered", name)))?;
        self.path.push(Level::new(step));
        Ok(())
    }

    /// Returns to the parent of the current node.
    pub fn navigate_to_parent(&mut self) -> Result<()> {
        if self.path.len() <= 1 {
            return Err(Error::XPathNavigation(
                "cannot navigate above the document root".to_string(),
            ));
        }
        self.path.pop();
        Ok(())
    }

    /// Renders the current location, `/` at the root.
    pub fn xpath(&self) -> String {
        let steps: Vec<&str> = self
            .path
            .iter()
            .skip(1)
            .map(|level| level.expression.as_str())
            .collect();
        format!("{}{}", SEPARATOR, steps.join(SEPARATOR))
    }

    /// Renders the location of the current node's parent.
    pub fn parent_xpath(&self) -> String {
        let steps: Vec<&str> = self
            .path
            .iter()
            .skip(1)
            .take(self.path.len().saturating_sub(2))
            .map(|level| level.expression.as_str())
            .collect();
        format!("{}{}", SEPARATOR, steps.join(SEPARATOR))
    }

    fn render(&self, name: &QName) -> String {
        match name
            .namespace_uri()
            .and_then(|uri| self.prefixes.get(uri))
            .filter(|prefix| !prefix.is_empty())
        {
            Some(prefix) => format!("{}:{}", prefix, name.local_name()),
            None => name.local_name().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Node;

    fn el(name: &str) -> NodeRef {
        Node::element(QName::local(name), vec![], vec![])
    }

    #[test]
    fn test_root_renders_as_slash() {
        let ctx = XPathContext::new();
        assert_eq!(ctx.xpath(), "/");
        assert_eq!(ctx.depth(), 1);
    }

    #[test]
    fn test_positional_element_steps() {
        let mut ctx = XPathContext::new();
        ctx.set_children(&[el("foo"), el("foo"), el("bar"), el("foo")]);

        ctx.navigate_to_child(2).unwrap();
        assert_eq!(ctx.xpath(), "/bar[1]");
        ctx.navigate_to_parent().unwrap();

        ctx.navigate_to_child(3).unwrap();
        assert_eq!(ctx.xpath(), "/foo[3]");
        ctx.navigate_to_parent().unwrap();
        assert_eq!(ctx.depth(), 1);
    }

    #[test]
    fn test_mixed_content_steps() {
        let mut ctx = XPathContext::new();
        ctx.set_children(&[el("root")]);
        ctx.navigate_to_child(0).unwrap();
        ctx.set_children(&[
            Node::text("a"),
            Node::comment("c"),
            Node::cdata("b"),
            Node::processing_instruction("pi", ""),
            Node::comment("d"),
            el("x"),
        ]);
        let expected = [
            "/root[1]/text()[1]",
            "/root[1]/comment()[1]",
            "/root[1]/text()[2]",
            "/root[1]/processing-instruction()[1]",
            "/root[1]/comment()[2]",
            "/root[1]/x[1]",
        ];
        for (i, xpath) in expected.iter().enumerate() {
            ctx.navigate_to_child(i).unwrap();
            assert_eq!(&ctx.xpath(), xpath);
            assert_eq!(ctx.parent_xpath(), "/root[1]");
            ctx.navigate_to_parent().unwrap();
        }
    }

    #[test]
    fn test_append_children_continues_numbering() {
        let mut ctx = XPathContext::new();
        ctx.set_children(&[el("a"), Node::text("t")]);
        ctx.append_children(&[Node::text("u")]);
        ctx.navigate_to_child(2).unwrap();
        assert_eq!(ctx.xpath(), "/text()[2]");
    }

    #[test]
    fn test_attributes() {
        let mut ctx = XPathContext::new();
        ctx.set_children(&[el("a")]);
        ctx.navigate_to_child(0).unwrap();
        let plain = QName::local("id");
        ctx.add_attributes([&plain]);
        ctx.navigate_to_attribute(&plain).unwrap();
        assert_eq!(ctx.xpath(), "/a[1]/@id");
        ctx.navigate_to_parent().unwrap();
        assert_eq!(ctx.xpath(), "/a[1]");
    }

    #[test]
    fn test_namespace_prefixes() {
        let mut prefixes = HashMap::new();
        prefixes.insert("urn:x".to_string(), "x".to_string());
        let mut ctx = XPathContext::with_prefixes(&prefixes);

        let mapped = Node::element(QName::new("urn:x", "a"), vec![], vec![]);
        let unmapped = Node::element(QName::new("urn:y", "b").with_prefix("y"), vec![], vec![]);
        ctx.set_children(&[mapped, unmapped]);

        ctx.navigate_to_child(0).unwrap();
        assert_eq!(ctx.xpath(), "/x:a[1]");
        let attr = QName::new("urn:x", "id");
        ctx.add_attributes([&attr]);
        ctx.navigate_to_attribute(&attr).unwrap();
        assert_eq!(ctx.xpath(), "/x:a[1]/@x:id");
        ctx.navigate_to_parent().unwrap();
        ctx.navigate_to_parent().unwrap();

        // no mapping: local name only, even though the document used a prefix
        ctx.navigate_to_child(1).unwrap();
        assert_eq!(ctx.xpath(), "/b[1]");
    }

    #[test]
    fn test_unregistered_steps_fail() {
        let mut ctx = XPathContext::new();
        ctx.set_children(&[el("a")]);
        assert!(matches!(
            ctx.navigate_to_child(1),
            Err(Error::XPathNavigation(_))
        ));
        assert!(ctx
            .navigate_to_attribute(&QName::local("missing"))
            .is_err());
        assert!(ctx.navigate_to_parent().is_err());
        assert_eq!(ctx.depth(), 1);
    }
}
