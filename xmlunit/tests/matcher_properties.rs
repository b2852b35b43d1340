use std::collections::HashSet;

use proptest::{collection::vec, prelude::*};

use xmlunit::{selectors, DefaultNodeMatcher, Node, NodeMatcher, NodeRef, QName};

// Sibling lists drawn from a small alphabet so that names repeat
fn sibling_strategy() -> impl Strategy<Value = Vec<NodeRef>> {
    vec((0..4u8, 0..3u8), 0..12).prop_map(|specs| {
        specs
            .into_iter()
            .map(|(kind, name)| {
                let name = format!("e{}", name);
                match kind {
                    0 | 1 => Node::element(QName::local(name), Vec::new(), Vec::new()),
                    2 => Node::text(name),
                    _ => Node::comment(name),
                }
            })
            .collect()
    })
}

fn assert_unique(
    control: &[NodeRef],
    test: &[NodeRef],
    matcher: &dyn NodeMatcher,
) -> Result<(), TestCaseError> {
    let pairs = matcher.match_nodes(control, test);
    let mut control_seen = HashSet::new();
    let mut test_seen = HashSet::new();
    for pair in &pairs {
        prop_assert!(pair.control_index < control.len());
        prop_assert!(pair.test_index < test.len());
        prop_assert!(control_seen.insert(pair.control_index));
        prop_assert!(test_seen.insert(pair.test_index));
    }
    prop_assert!(pairs.len() <= control.len().min(test.len()));
    Ok(())
}

proptest! {
    #[test]
    fn test_default_selector_pairs_each_node_once(
        control in sibling_strategy(),
        test in sibling_strategy()
    ) {
        assert_unique(&control, &test, &DefaultNodeMatcher::default())?;
    }

    #[test]
    fn test_name_selector_pairs_each_node_once(
        control in sibling_strategy(),
        test in sibling_strategy()
    ) {
        assert_unique(&control, &test, &DefaultNodeMatcher::new(selectors::by_name))?;
    }

    #[test]
    fn test_pairs_follow_control_order(
        control in sibling_strategy(),
        test in sibling_strategy()
    ) {
        let pairs =
            DefaultNodeMatcher::new(selectors::by_name_and_text).match_nodes(&control, &test);
        prop_assert!(pairs.windows(2).all(|w| w[0].control_index < w[1].control_index));
    }
}
