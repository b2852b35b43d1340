//! Node matching.
//!
//! A node matcher establishes which children of a control node correspond to
//! which children of the test node. The engine only compares matched pairs;
//! everything left over is reported as a missing child.

use std::fmt;
use std::rc::Rc;

use rustc_hash::FxHashSet;

use crate::node::{Node, NodeRef, NodeType};
use crate::selectors::{self, ElementSelector};

/// A control child paired with a test child, with their positions in the
/// respective child lists.
#[derive(Debug, Clone)]
pub struct NodePair {
    pub control_index: usize,
    pub control: NodeRef,
    pub test_index: usize,
    pub test: NodeRef,
}

/// Trait for sibling matching strategies.
pub trait NodeMatcher {
    /// Pairs up control and test siblings.
    ///
    /// Pairs are returned in control order. No node appears in more than one
    /// pair.
    fn match_nodes(&self, control: &[NodeRef], test: &[NodeRef]) -> Vec<NodePair>;
}

/// Decides whether two non-element nodes may be paired.
pub type NodeTypeMatcher = Rc<dyn Fn(NodeType, NodeType) -> bool>;

/// Nodes of the same kind may be paired, and Text may pair with CDATA.
pub fn same_kind_or_text(control: NodeType, test: NodeType) -> bool {
    control == test || (control.is_text() && test.is_text())
}

/// Greedy matcher: every control node takes the first acceptable test node
/// that is still free.
///
/// The search for a control node starts just after the test node matched
/// last, runs to the end of the list and then wraps around to the start.
/// Elements are paired using the element selector, all other nodes using
/// the node type matcher.
#[derive(Clone)]
pub struct DefaultNodeMatcher {
    element_selector: Rc<dyn ElementSelector>,
    node_type_matcher: NodeTypeMatcher,
}

impl Default for DefaultNodeMatcher {
    fn default() -> Self {
        Self::new(selectors::default)
    }
}

impl fmt::Debug for DefaultNodeMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefaultNodeMatcher").finish_non_exhaustive()
    }
}

impl DefaultNodeMatcher {
    /// Creates a matcher using `selector` for elements.
    pub fn new<S>(selector: S) -> Self
    where
        S: ElementSelector + 'static,
    {
        Self::from_selector(Rc::new(selector))
    }

    /// Creates a matcher from a shared selector.
    pub fn from_selector(element_selector: Rc<dyn ElementSelector>) -> Self {
        DefaultNodeMatcher {
            element_selector,
            node_type_matcher: Rc::new(same_kind_or_text),
        }
    }

    /// Replaces the rule used for non-element nodes.
    pub fn with_node_type_matcher<F>(mut self, matcher: F) -> Self
    where
        F: Fn(NodeType, NodeType) -> bool + 'static,
    {
        self.node_type_matcher = Rc::new(matcher);
        self
    }

    fn can_be_matched(&self, control: &Node, test: &Node) -> bool {
        match (control.node_type(), test.node_type()) {
            (NodeType::Element, NodeType::Element) => self
                .element_selector
                .can_be_compared(Some(control), Some(test)),
            (NodeType::Element, _) | (_, NodeType::Element) => false,
            (c, t) => (self.node_type_matcher)(c, t),
        }
    }

    /// Finds the first free test node acceptable for `control`, searching
    /// from `start` to the end and then from the beginning up to `start`.
    fn find_match(
        &self,
        control: &Node,
        test: &[NodeRef],
        used: &FxHashSet<usize>,
        start: usize,
    ) -> Option<usize> {
        let start = start.min(test.len());
        (start..test.len())
            .chain(0..start)
            .filter(|i| !used.contains(i))
            .find(|&i| self.can_be_matched(control, &test[i]))
    }
}

impl NodeMatcher for DefaultNodeMatcher {
    fn match_nodes(&self, control: &[NodeRef], test: &[NodeRef]) -> Vec<NodePair> {
        let mut pairs = Vec::new();
        let mut used: FxHashSet<usize> = FxHashSet::default();
        let mut last: Option<usize> = None;

        for (control_index, c) in control.iter().enumerate() {
            let start = last.map_or(0, |l| l + 1);
            if let Some(test_index) = self.find_match(c, test, &used, start) {
                used.insert(test_index);
                last = Some(test_index);
                pairs.push(NodePair {
                    control_index,
                    control: c.clone(),
                    test_index,
                    test: test[test_index].clone(),
                });
            }
        }
        pairs
    }
}

impl<F> NodeMatcher for F
where
    F: Fn(&[NodeRef], &[NodeRef]) -> Vec<NodePair>,
{
    fn match_nodes(&self, control: &[NodeRef], test: &[NodeRef]) -> Vec<NodePair> {
        self(control, test)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::QName;

    fn el(name: &str) -> NodeRef {
        Node::element(QName::local(name), vec![], vec![])
    }

    fn indices(pairs: &[NodePair]) -> Vec<(usize, usize)> {
        pairs
            .iter()
            .map(|p| (p.control_index, p.test_index))
            .collect()
    }

    #[test]
    fn test_in_order_match() {
        let control = vec![el("a"), el("b"), el("c")];
        let test = vec![el("a"), el("b"), el("c")];
        let pairs = DefaultNodeMatcher::new(selectors::by_name).match_nodes(&control, &test);
        assert_eq!(indices(&pairs), vec![(0, 0), (1, 1), (2, 2)]);
        assert!(Rc::ptr_eq(&pairs[1].test, &test[1]));
    }

    #[test]
    fn test_search_wraps_after_last_match() {
        let control = vec![el("c"), el("a"), el("b")];
        let test = vec![el("a"), el("b"), el("c")];
        let pairs = DefaultNodeMatcher::new(selectors::by_name).match_nodes(&control, &test);
        assert_eq!(indices(&pairs), vec![(0, 2), (1, 0), (2, 1)]);
    }

    #[test]
    fn test_search_prefers_nodes_after_last_match() {
        // the second control "a" takes the "a" after "b", not the first one
        let control = vec![el("b"), el("a")];
        let test = vec![el("a"), el("b"), el("a")];
        let pairs = DefaultNodeMatcher::new(selectors::by_name).match_nodes(&control, &test);
        assert_eq!(indices(&pairs), vec![(0, 1), (1, 2)]);
    }

    #[test]
    fn test_unmatched_nodes_are_left_out() {
        let control = vec![el("a"), el("x"), el("b")];
        let test = vec![el("b"), el("y")];
        let pairs = DefaultNodeMatcher::new(selectors::by_name).match_nodes(&control, &test);
        assert_eq!(indices(&pairs), vec![(2, 0)]);
    }

    #[test]
    fn test_default_selector_pairs_elements_in_order() {
        let control = vec![el("a"), el("b")];
        let test = vec![el("x"), el("y"), el("z")];
        let pairs = DefaultNodeMatcher::default().match_nodes(&control, &test);
        assert_eq!(indices(&pairs), vec![(0, 0), (1, 1)]);
    }

    #[test]
    fn test_text_and_cdata_are_compatible() {
        let control = vec![Node::text("foo"), Node::comment("c")];
        let test = vec![Node::comment("c"), Node::cdata("foo")];
        let pairs = DefaultNodeMatcher::default().match_nodes(&control, &test);
        assert_eq!(indices(&pairs), vec![(0, 1), (1, 0)]);
    }

    #[test]
    fn test_elements_never_pair_with_other_kinds() {
        let control = vec![el("a")];
        let test = vec![Node::text("a")];
        assert!(DefaultNodeMatcher::default()
            .match_nodes(&control, &test)
            .is_empty());
    }

    #[test]
    fn test_custom_node_type_matcher() {
        let control = vec![Node::text("foo")];
        let test = vec![Node::cdata("foo")];
        let strict = DefaultNodeMatcher::default().with_node_type_matcher(|c, t| c == t);
        assert!(strict.match_nodes(&control, &test).is_empty());
    }

    #[test]
    fn test_closure_matcher() {
        let reversed = |control: &[NodeRef], test: &[NodeRef]| -> Vec<NodePair> {
            control
                .iter()
                .enumerate()
                .zip(test.iter().enumerate().rev())
                .map(|((ci, c), (ti, t))| NodePair {
                    control_index: ci,
                    control: c.clone(),
                    test_index: ti,
                    test: t.clone(),
                })
                .collect()
        };
        let pairs = reversed.match_nodes(&[el("a"), el("b")], &[el("b"), el("a")]);
        assert_eq!(indices(&pairs), vec![(0, 1), (1, 0)]);
    }
}
