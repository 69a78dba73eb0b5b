use crate::types::{BspNode, Direction, MAX_RATIO, MIN_RATIO, PaneId};

/// Walks the ancestor chain from `pane_id` up to the root, adjusting the
/// ratio of the first ancestor split whose axis matches `direction` (spec
/// §4.8 `resizePane`). Ported from the teacher's `adjust_split_ratio`
/// first/second recursion, generalized with a direction sign: a pane in
/// the first (top/left) child grows when resized forward (south/east) and
/// shrinks when resized backward (north/west); a pane in the second
/// (bottom/right) child is the mirror image.
pub fn resize_pane(mut root: BspNode, pane_id: PaneId, direction: Direction, delta: f32) -> BspNode {
    adjust(&mut root, pane_id, direction, delta);
    root
}

fn is_forward(direction: Direction) -> bool {
    matches!(direction, Direction::South | Direction::East)
}

fn adjust(node: &mut BspNode, target_id: PaneId, direction: Direction, delta: f32) -> bool {
    let BspNode::Split { direction: split_dir, ratio, first, second } = node else {
        return false;
    };
    let axis = direction.axis();
    let forward = is_forward(direction);

    if first.all_pane_ids().contains(&target_id) {
        if adjust(first, target_id, direction, delta) {
            return true;
        }
        if *split_dir == axis {
            let sign = if forward { 1.0 } else { -1.0 };
            *ratio = (*ratio + sign * delta).clamp(MIN_RATIO, MAX_RATIO);
            return true;
        }
        return false;
    }

    if second.all_pane_ids().contains(&target_id) {
        if adjust(second, target_id, direction, delta) {
            return true;
        }
        if *split_dir == axis {
            let sign = if forward { -1.0 } else { 1.0 };
            *ratio = (*ratio + sign * delta).clamp(MIN_RATIO, MAX_RATIO);
            return true;
        }
        return false;
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SplitDirection;

    #[test]
    fn resizing_first_child_south_grows_its_ratio() {
        let root = BspNode::split(
            SplitDirection::Vertical,
            0.5,
            BspNode::pane(1, None),
            BspNode::split(SplitDirection::Horizontal, 0.5, BspNode::pane(2, None), BspNode::pane(3, None)),
        );
        let root = resize_pane(root, 2, Direction::South, 0.1);
        match root {
            BspNode::Split { second, .. } => match *second {
                BspNode::Split { ratio, .. } => assert!((ratio - 0.6).abs() < 1e-6),
                _ => panic!("expected inner split"),
            },
            _ => panic!("expected outer split"),
        }
    }

    #[test]
    fn ratio_clamps_at_bounds() {
        let root = BspNode::split(SplitDirection::Horizontal, 0.85, BspNode::pane(1, None), BspNode::pane(2, None));
        let root = resize_pane(root, 1, Direction::South, 0.5);
        match root {
            BspNode::Split { ratio, .. } => assert!((ratio - MAX_RATIO).abs() < 1e-6),
            _ => panic!("expected split"),
        }
    }

    #[test]
    fn mismatched_axis_ancestor_is_skipped() {
        let root = BspNode::split(
            SplitDirection::Vertical,
            0.5,
            BspNode::pane(1, None),
            BspNode::pane(2, None),
        );
        let root = resize_pane(root, 1, Direction::South, 0.1);
        match root {
            BspNode::Split { ratio, .. } => assert!((ratio - 0.5).abs() < 1e-6),
            _ => panic!("expected split"),
        }
    }
}
