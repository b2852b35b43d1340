//! Tree normalisation: rebuilt copies of a tree with some nodes dropped or
//! rewritten. The input tree is left untouched.

use super::{NodeRef, NodeType};

/// Rebuilds `node` bottom-up, passing every child through `map`.
///
/// Children for which `map` returns `None` are dropped. Text nodes that end
/// up next to each other are merged into one.
fn rebuild<F>(node: &NodeRef, map: &F) -> NodeRef
where
    F: Fn(&NodeRef) -> Option<NodeRef>,
{
    let mut children: Vec<NodeRef> = Vec::with_capacity(node.children().len());
    for child in node
        .children()
        .iter()
        .filter_map(|child| map(&rebuild(child, map)))
    {
        let adjacent_text = child.node_type() == NodeType::Text
            && children
                .last()
                .is_some_and(|last| last.node_type() == NodeType::Text);
        if !adjacent_text {
            children.push(child);
        } else if let Some(last) = children.last_mut() {
            let merged = format!(
                "{}{}",
                last.value().unwrap_or(""),
                child.value().unwrap_or("")
            );
            *last = last.with_text(merged);
        }
    }
    node.with_children(children)
}

/// Trims the character data of every Text and CDATA node and removes the
/// ones left empty.
pub fn strip_whitespace(node: &NodeRef) -> NodeRef {
    rebuild(node, &|child| {
        if !child.node_type().is_text() {
            return Some(child.clone());
        }
        let text = child.value().unwrap_or("");
        let trimmed = text.trim();
        if trimmed.is_empty() {
            None
        } else if trimmed.len() == text.len() {
            Some(child.clone())
        } else {
            Some(child.with_text(trimmed))
        }
    })
}

/// Removes every comment node.
pub fn strip_comments(node: &NodeRef) -> NodeRef {
    rebuild(node, &|child| {
        (child.node_type() != NodeType::Comment).then(|| child.clone())
    })
}
