//! Property tests: relative insertion and removal on arbitrary pipeline trees.

use orch_scheduler::{Node, NodeId, SchedulerError};
use proptest::prelude::*;
use proptest::sample::Index;

// ---------------------------------------------------------------------------
// Helpers / Strategies
// ---------------------------------------------------------------------------

/// Small alphabet so that duplicate identities are common.
fn arb_subtree() -> impl Strategy<Value = Node> {
    let leaf = "[a-e]".prop_map(|id: String| Node::new(id));
    leaf.prop_recursive(4, 48, 4, |inner| {
        ("[a-e]", prop::collection::vec(inner, 0..4))
            .prop_map(|(id, children): (String, Vec<Node>)| Node::new(id).with_children(children))
    })
}

fn arb_tree() -> impl Strategy<Value = Node> {
    prop::collection::vec(arb_subtree(), 1..5)
        .prop_map(|children| Node::new("root").with_children(children))
}

fn ids_below(node: &Node, out: &mut Vec<NodeId>) {
    for child in node.children() {
        out.push(child.id().clone());
        ids_below(child, out);
    }
}

fn existing_id(tree: &Node, pick: Index) -> NodeId {
    let mut ids = Vec::new();
    ids_below(tree, &mut ids);
    pick.get(&ids).clone()
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn insert_before_lands_immediately_before_anchor(tree in arb_tree(), pick in any::<Index>()) {
        let anchor = existing_id(&tree, pick);
        let anchored = tree.node_at(&tree.find(&anchor).unwrap()).unwrap().clone();
        let new_id = NodeId::from_static("inserted");

        let mut mutated = tree.clone();
        mutated.insert_before(Node::new(new_id.clone()), &anchor).unwrap();

        let path = mutated.find(&new_id).unwrap();
        let next = mutated.node_at(&path.next_sibling().unwrap()).unwrap();
        prop_assert_eq!(next, &anchored);
        prop_assert_eq!(mutated.count(), tree.count() + 1);

        mutated.remove(&new_id).unwrap();
        prop_assert_eq!(mutated, tree);
    }

    #[test]
    fn insert_after_lands_immediately_after_anchor(tree in arb_tree(), pick in any::<Index>()) {
        let anchor = existing_id(&tree, pick);
        let anchored = tree.node_at(&tree.find(&anchor).unwrap()).unwrap().clone();
        let new_id = NodeId::from_static("inserted");

        let mut mutated = tree.clone();
        mutated.insert_after(Node::new(new_id.clone()), &anchor).unwrap();

        let path = mutated.find(&new_id).unwrap();
        let previous = mutated.node_at(&path.previous_sibling().unwrap()).unwrap();
        prop_assert_eq!(previous, &anchored);
        prop_assert_eq!(mutated.count(), tree.count() + 1);

        mutated.remove(&new_id).unwrap();
        prop_assert_eq!(mutated, tree);
    }

    #[test]
    fn missing_anchor_leaves_tree_unchanged(tree in arb_tree()) {
        let mut mutated = tree.clone();
        let missing = NodeId::from_static("zz-not-there");

        let before = mutated.insert_before(Node::new("x"), &missing);
        let after = mutated.insert_after(Node::new("x"), &missing);

        let is_anchor_error = |result: &Result<_, SchedulerError>| {
            matches!(result, Err(SchedulerError::AnchorNotFound { .. }))
        };
        prop_assert!(is_anchor_error(&before));
        prop_assert!(is_anchor_error(&after));
        prop_assert_eq!(mutated.render(), tree.render());
        prop_assert_eq!(mutated, tree);
    }

    #[test]
    fn remove_drops_exactly_one_subtree(tree in arb_tree(), pick in any::<Index>()) {
        let target = existing_id(&tree, pick);
        let mut mutated = tree.clone();

        let removed = mutated.remove(&target).unwrap();
        prop_assert_eq!(removed.id(), &target);
        prop_assert_eq!(mutated.count() + removed.count(), tree.count());
    }
}
