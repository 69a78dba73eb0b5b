use crate::navigate::find_adjacent_pane;
use crate::types::{BspNode, Direction, PaneId};

fn swap_contents(node: &mut BspNode, a: PaneId, b: PaneId, a_content: &mut Option<Option<u64>>, b_content: &mut Option<Option<u64>>) {
    match node {
        BspNode::Pane { id, pty_id, .. } if *id == a => {
            *a_content = Some(*pty_id);
        }
        BspNode::Pane { id, pty_id, .. } if *id == b => {
            *b_content = Some(*pty_id);
        }
        BspNode::Pane { .. } => {}
        BspNode::Split { first, second, .. } => {
            swap_contents(first, a, b, a_content, b_content);
            swap_contents(second, a, b, a_content, b_content);
        }
    }
}

/// Rewrites `a`'s and `b`'s `pty_id` with each other's captured content.
/// Identity (`id`) stays pinned to its position — only content moves.
fn apply_swap(node: &mut BspNode, a: PaneId, b_content: Option<u64>, b: PaneId, a_content: Option<u64>) {
    match node {
        BspNode::Pane { id, pty_id, .. } if *id == a => {
            *pty_id = b_content;
        }
        BspNode::Pane { id, pty_id, .. } if *id == b => {
            *pty_id = a_content;
        }
        BspNode::Pane { .. } => {}
        BspNode::Split { first, second, .. } => {
            apply_swap(first, a, b_content, b, a_content);
            apply_swap(second, a, b_content, b, a_content);
        }
    }
}

/// Swaps `pane_id`'s content with its adjacent pane in `direction`,
/// leaving both rectangles (positions) exactly where they were (spec
/// §4.8 `swapPaneInDirection`). A no-op if there is no adjacent pane.
pub fn swap_pane_in_direction(mut root: BspNode, pane_id: PaneId, direction: Direction) -> BspNode {
    let Some(other_id) = find_adjacent_pane(&root, pane_id, direction) else {
        return root;
    };

    let mut a_content = None;
    let mut b_content = None;
    swap_contents(&mut root, pane_id, other_id, &mut a_content, &mut b_content);

    if let (Some(a), Some(b)) = (a_content, b_content) {
        apply_swap(&mut root, pane_id, b, other_id, a);
    }
    root
}
