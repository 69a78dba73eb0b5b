use crate::types::{BspNode, PaneId};

/// Result of removing a pane from a subtree (spec §4.8 `removePane`), ported
/// from the teacher's `RemoveResult`: either the subtree was unaffected
/// (`NotFound`, carrying the unchanged node back), or the target was found
/// and removed, possibly collapsing this subtree entirely.
enum RemoveResult {
    NotFound(BspNode),
    Removed(Option<BspNode>),
}

fn remove_from(node: BspNode, target_id: PaneId) -> RemoveResult {
    match node {
        BspNode::Pane { id, .. } if id == target_id => RemoveResult::Removed(None),
        leaf @ BspNode::Pane { .. } => RemoveResult::NotFound(leaf),
        BspNode::Split { direction, ratio, first, second } => match remove_from(*first, target_id) {
            RemoveResult::Removed(None) => RemoveResult::Removed(Some(*second)),
            RemoveResult::Removed(Some(new_first)) => RemoveResult::Removed(Some(BspNode::Split {
                direction,
                ratio,
                first: Box::new(new_first),
                second,
            })),
            RemoveResult::NotFound(first_node) => match remove_from(*second, target_id) {
                RemoveResult::Removed(None) => RemoveResult::Removed(Some(first_node)),
                RemoveResult::Removed(Some(new_second)) => RemoveResult::Removed(Some(BspNode::Split {
                    direction,
                    ratio,
                    first: Box::new(first_node),
                    second: Box::new(new_second),
                })),
                RemoveResult::NotFound(second_node) => RemoveResult::NotFound(BspNode::Split {
                    direction,
                    ratio,
                    first: Box::new(first_node),
                    second: Box::new(second_node),
                }),
            },
        },
    }
}

/// New root after removing `pane_id` (`None` if the tree is now empty) and
/// the pane to focus next: the first pane, in tree order, of whatever
/// remains (spec §4.8).
pub struct RemovePaneOutcome {
    pub root: Option<BspNode>,
    pub focus_next: Option<PaneId>,
}

pub fn remove_pane(root: BspNode, pane_id: PaneId) -> RemovePaneOutcome {
    let new_root = match remove_from(root, pane_id) {
        RemoveResult::Removed(new_root) => new_root,
        RemoveResult::NotFound(unchanged) => Some(unchanged),
    };
    let focus_next = new_root.as_ref().and_then(|r| r.all_pane_ids().into_iter().next());
    RemovePaneOutcome { root: new_root, focus_next }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SplitDirection;

    #[test]
    fn removing_one_child_promotes_sibling_in_place() {
        let root = BspNode::split(SplitDirection::Vertical, 0.5, BspNode::pane(1, None), BspNode::pane(2, None));
        let outcome = remove_pane(root, 1);
        assert_eq!(outcome.root, Some(BspNode::pane(2, None)));
        assert_eq!(outcome.focus_next, Some(2));
    }

    #[test]
    fn removing_last_pane_empties_the_tree() {
        let root = BspNode::pane(1, None);
        let outcome = remove_pane(root, 1);
        assert!(outcome.root.is_none());
        assert_eq!(outcome.focus_next, None);
    }

    #[test]
    fn focus_next_is_first_pane_in_tree_order_of_the_remainder() {
        let root = BspNode::split(
            SplitDirection::Vertical,
            0.5,
            BspNode::pane(1, None),
            BspNode::split(SplitDirection::Horizontal, 0.5, BspNode::pane(2, None), BspNode::pane(3, None)),
        );
        let outcome = remove_pane(root, 1);
        assert_eq!(outcome.focus_next, Some(2));
    }
}
