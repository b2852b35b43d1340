//! Element selectors decide which control and test elements may be paired.
//!
//! Every selector answers `false` when either side is absent.

use std::rc::Rc;

use crate::node::{Node, NodeRef, NodeType, QName};

/// Decides whether a control and a test element are candidates for
/// comparison.
pub trait ElementSelector {
    fn can_be_compared(&self, control: Option<&Node>, test: Option<&Node>) -> bool;
}

impl<F> ElementSelector for F
where
    F: Fn(Option<&Node>, Option<&Node>) -> bool,
{
    fn can_be_compared(&self, control: Option<&Node>, test: Option<&Node>) -> bool {
        self(control, test)
    }
}

/// Any two elements can be compared.
pub fn default(control: Option<&Node>, test: Option<&Node>) -> bool {
    control.is_some() && test.is_some()
}

/// Elements with the same expanded name can be compared.
pub fn by_name(control: Option<&Node>, test: Option<&Node>) -> bool {
    match (control, test) {
        (Some(c), Some(t)) => c.name() == t.name(),
        _ => false,
    }
}

/// Elements with the same expanded name and the same direct text content.
pub fn by_name_and_text(control: Option<&Node>, test: Option<&Node>) -> bool {
    match (control, test) {
        (Some(c), Some(t)) => by_name(control, test) && c.direct_text() == t.direct_text(),
        _ => false,
    }
}

/// Elements with the same expanded name and the same values for the given
/// attributes. An attribute missing on both sides counts as equal.
pub fn by_name_and_attributes(attributes: Vec<QName>) -> impl ElementSelector {
    move |control: Option<&Node>, test: Option<&Node>| match (control, test) {
        (Some(c), Some(t)) => {
            by_name(control, test)
                && attributes
                    .iter()
                    .all(|name| c.attribute_value(name) == t.attribute_value(name))
        }
        _ => false,
    }
}

/// Like [`by_name_and_attributes`], with the attribute names resolved in the
/// namespace of the control element.
pub fn by_name_and_attributes_control_ns(local_names: Vec<String>) -> impl ElementSelector {
    move |control: Option<&Node>, test: Option<&Node>| match (control, test) {
        (Some(c), Some(t)) => {
            let uri = c.namespace_uri().unwrap_or("");
            by_name(control, test)
                && local_names.iter().all(|local| {
                    let name = QName::new(uri, local.as_str());
                    c.attribute_value(&name) == t.attribute_value(&name)
                })
        }
        _ => false,
    }
}

/// Elements with the same expanded name and identical attribute sets.
pub fn by_name_and_all_attributes(control: Option<&Node>, test: Option<&Node>) -> bool {
    match (control, test) {
        (Some(c), Some(t)) => {
            by_name(control, test)
                && c.attributes().len() == t.attributes().len()
                && c.attributes().iter().all(|attr| {
                    attr.name()
                        .is_some_and(|name| t.attribute_value(name) == attr.value())
                })
        }
        _ => false,
    }
}

/// [`by_name_and_text`] applied to the whole subtree: the non-text children
/// must line up by node type, and element children must again match by name
/// and text, recursively.
pub fn by_name_and_text_rec(control: Option<&Node>, test: Option<&Node>) -> bool {
    let (Some(c), Some(t)) = (control, test) else {
        return false;
    };
    if !by_name_and_text(control, test) {
        return false;
    }
    let structural = |node: &Node| -> Vec<NodeRef> {
        node.children()
            .iter()
            .filter(|child| !child.node_type().is_text())
            .cloned()
            .collect()
    };
    let control_children = structural(c);
    let test_children = structural(t);
    if control_children.len() != test_children.len() {
        return false;
    }
    control_children
        .iter()
        .zip(&test_children)
        .all(|(cc, tc)| {
            cc.node_type() == tc.node_type()
                && (cc.node_type() != NodeType::Element
                    || by_name_and_text_rec(Some(&**cc), Some(&**tc)))
        })
}

/// True if any of the selectors is.
pub fn or(selectors: Vec<Rc<dyn ElementSelector>>) -> impl ElementSelector {
    move |control: Option<&Node>, test: Option<&Node>| {
        selectors.iter().any(|s| s.can_be_compared(control, test))
    }
}

/// True if all of the selectors are.
pub fn and(selectors: Vec<Rc<dyn ElementSelector>>) -> impl ElementSelector {
    move |control: Option<&Node>, test: Option<&Node>| {
        selectors.iter().all(|s| s.can_be_compared(control, test))
    }
}

/// Inverts `selector`. Absent sides still yield false.
pub fn not<S>(selector: S) -> impl ElementSelector
where
    S: ElementSelector,
{
    move |control: Option<&Node>, test: Option<&Node>| {
        control.is_some() && test.is_some() && !selector.can_be_compared(control, test)
    }
}

/// Applies `selector` only to control elements satisfying `predicate`;
/// other control elements cannot be compared.
pub fn conditional<P, S>(predicate: P, selector: S) -> impl ElementSelector
where
    P: Fn(&Node) -> bool,
    S: ElementSelector,
{
    move |control: Option<&Node>, test: Option<&Node>| {
        control.is_some_and(&predicate) && selector.can_be_compared(control, test)
    }
}
