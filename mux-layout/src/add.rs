use crate::types::{BspNode, PaneId, SplitDirection};

/// Wraps `target_pane_id` in a new `Split`; the newly created pane becomes
/// `second` (spec §4.8 `addPane`). Recurses the way the teacher's
/// `split_node` does, threading the not-yet-placed new node back up until
/// the target leaf is found.
pub fn add_pane(
    root: BspNode,
    target_pane_id: PaneId,
    direction: SplitDirection,
    ratio: f32,
    new_pane_id: PaneId,
    new_pane_pty: Option<u64>,
) -> BspNode {
    fn insert(node: BspNode, target_id: PaneId, direction: SplitDirection, ratio: f32, new_pane: Option<BspNode>) -> (BspNode, Option<BspNode>) {
        match node {
            BspNode::Pane { id, pty_id, rectangle } if id == target_id => {
                let leaf = BspNode::Pane { id, pty_id, rectangle };
                let Some(new_pane) = new_pane else {
                    return (leaf, None);
                };
                (BspNode::split(direction, ratio, leaf, new_pane), None)
            }
            leaf @ BspNode::Pane { .. } => (leaf, new_pane),
            BspNode::Split { direction: split_dir, ratio: split_ratio, first, second } => {
                let (new_first, remaining) = insert(*first, target_id, direction, ratio, new_pane);
                if remaining.is_none() {
                    return (
                        BspNode::Split { direction: split_dir, ratio: split_ratio, first: Box::new(new_first), second },
                        None,
                    );
                }
                let (new_second, remaining) = insert(*second, target_id, direction, ratio, remaining);
                (
                    BspNode::Split { direction: split_dir, ratio: split_ratio, first: Box::new(new_first), second: Box::new(new_second) },
                    remaining,
                )
            }
        }
    }

    let new_pane = BspNode::pane(new_pane_id, new_pane_pty);
    insert(root, target_pane_id, direction, ratio, Some(new_pane)).0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_target_pane_with_new_pane_as_second() {
        let root = BspNode::pane(1, None);
        let root = add_pane(root, 1, SplitDirection::Vertical, 0.5, 2, None);
        match root {
            BspNode::Split { first, second, ratio, direction } => {
                assert_eq!(direction, SplitDirection::Vertical);
                assert_eq!(ratio, 0.5);
                assert_eq!(first.all_pane_ids(), vec![1]);
                assert_eq!(second.all_pane_ids(), vec![2]);
            }
            _ => panic!("expected a split"),
        }
    }

    #[test]
    fn new_collected_set_is_old_set_plus_new_pane() {
        let root = BspNode::pane(1, None);
        let root = add_pane(root, 1, SplitDirection::Horizontal, 0.5, 2, None);
        let root = add_pane(root, 2, SplitDirection::Vertical, 0.4, 3, None);
        let mut ids = root.all_pane_ids();
        ids.sort();
        assert_eq!(ids, vec![1, 2, 3]);
    }
}
