use crate::bounds::Rect;

pub type PaneId = u64;

/// Axis a split divides its two children along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum SplitDirection {
    /// Children stacked top/bottom.
    Horizontal,
    /// Children side by side.
    Vertical,
}

/// Compass direction for pane navigation/resize (spec §4.8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Direction {
    North,
    South,
    East,
    West,
}

impl Direction {
    pub fn axis(self) -> SplitDirection {
        match self {
            Direction::North | Direction::South => SplitDirection::Horizontal,
            Direction::East | Direction::West => SplitDirection::Vertical,
        }
    }
}

/// Binary space partition node (spec §3 `BSP node`). `Pane`'s `rectangle` is
/// `None` until `calculate_bounds` has run at least once; `Split.ratio` is
/// always clamped to `[0.1, 0.9]`.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum BspNode {
    Pane {
        id: PaneId,
        pty_id: Option<u64>,
        rectangle: Option<Rect>,
    },
    Split {
        direction: SplitDirection,
        ratio: f32,
        first: Box<BspNode>,
        second: Box<BspNode>,
    },
}

pub const MIN_RATIO: f32 = 0.1;
pub const MAX_RATIO: f32 = 0.9;

impl BspNode {
    pub fn pane(id: PaneId, pty_id: Option<u64>) -> Self {
        BspNode::Pane { id, pty_id, rectangle: None }
    }

    pub fn split(direction: SplitDirection, ratio: f32, first: BspNode, second: BspNode) -> Self {
        BspNode::Split {
            direction,
            ratio: ratio.clamp(MIN_RATIO, MAX_RATIO),
            first: Box::new(first),
            second: Box::new(second),
        }
    }

    pub fn is_pane(&self) -> bool {
        matches!(self, BspNode::Pane { .. })
    }

    pub fn find_pane(&self, id: PaneId) -> Option<&BspNode> {
        match self {
            BspNode::Pane { id: pid, .. } => (*pid == id).then_some(self),
            BspNode::Split { first, second, .. } => first.find_pane(id).or_else(|| second.find_pane(id)),
        }
    }

    pub fn rectangle_of(&self, id: PaneId) -> Option<Rect> {
        match self.find_pane(id)? {
            BspNode::Pane { rectangle, .. } => *rectangle,
            BspNode::Split { .. } => None,
        }
    }

    pub fn all_pane_ids(&self) -> Vec<PaneId> {
        match self {
            BspNode::Pane { id, .. } => vec![*id],
            BspNode::Split { first, second, .. } => {
                let mut ids = first.all_pane_ids();
                ids.extend(second.all_pane_ids());
                ids
            }
        }
    }

    pub fn all_panes(&self) -> Vec<(PaneId, Rect)> {
        match self {
            BspNode::Pane { id, rectangle: Some(rect), .. } => vec![(*id, *rect)],
            BspNode::Pane { .. } => vec![],
            BspNode::Split { first, second, .. } => {
                let mut panes = first.all_panes();
                panes.extend(second.all_panes());
                panes
            }
        }
    }

    pub fn pane_count(&self) -> usize {
        match self {
            BspNode::Pane { .. } => 1,
            BspNode::Split { first, second, .. } => first.pane_count() + second.pane_count(),
        }
    }

    /// Distributes `bounds` across the tree, recording each pane's
    /// rectangle (spec's implicit bounds-calculation step; ported from
    /// the teacher's `PaneNode::calculate_bounds`).
    pub fn calculate_bounds(&mut self, bounds: Rect, divider_width: f32) {
        match self {
            BspNode::Pane { rectangle, .. } => *rectangle = Some(bounds),
            BspNode::Split { direction, ratio, first, second } => {
                let (first_bounds, second_bounds) = match direction {
                    SplitDirection::Horizontal => {
                        let first_height = (bounds.height - divider_width) * *ratio;
                        let second_height = bounds.height - first_height - divider_width;
                        (
                            Rect::new(bounds.x, bounds.y, bounds.width, first_height),
                            Rect::new(bounds.x, bounds.y + first_height + divider_width, bounds.width, second_height),
                        )
                    }
                    SplitDirection::Vertical => {
                        let first_width = (bounds.width - divider_width) * *ratio;
                        let second_width = bounds.width - first_width - divider_width;
                        (
                            Rect::new(bounds.x, bounds.y, first_width, bounds.height),
                            Rect::new(bounds.x + first_width + divider_width, bounds.y, second_width, bounds.height),
                        )
                    }
                };
                first.calculate_bounds(first_bounds, divider_width);
                second.calculate_bounds(second_bounds, divider_width);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bounds::Rect;

    /// A host persists the BSP tree as opaque JSON across restarts; the
    /// tree (rectangles included) must round-trip exactly.
    #[test]
    fn bsp_tree_round_trips_through_json() {
        let mut root = BspNode::split(
            SplitDirection::Vertical,
            0.5,
            BspNode::pane(1, Some(10)),
            BspNode::split(SplitDirection::Horizontal, 0.5, BspNode::pane(2, None), BspNode::pane(3, Some(30))),
        );
        root.calculate_bounds(Rect::new(0.0, 0.0, 100.0, 100.0), 1.0);

        let json = serde_json::to_string(&root).expect("serialize");
        let restored: BspNode = serde_json::from_str(&json).expect("deserialize");

        assert_eq!(restored, root);
        let mut ids = restored.all_pane_ids();
        ids.sort();
        assert_eq!(ids, vec![1, 2, 3]);
    }
}
