use crate::bounds::Rect;
use crate::types::{BspNode, Direction, PaneId};

/// Closest pane strictly on `direction`'s side of `pane_id`'s bounds, with
/// orthogonal overlap, breaking ties by minimum orthogonal distance (spec
/// §4.8 `findAdjacentPane`). Requires `calculate_bounds` to have already
/// populated every pane's rectangle.
pub fn find_adjacent_pane(root: &BspNode, pane_id: PaneId, direction: Direction) -> Option<PaneId> {
    let from_rect = root.rectangle_of(pane_id)?;

    let is_on_side = |candidate: &Rect| -> bool {
        match direction {
            Direction::West => candidate.x + candidate.width <= from_rect.x,
            Direction::East => candidate.x >= from_rect.x + from_rect.width,
            Direction::North => candidate.y + candidate.height <= from_rect.y,
            Direction::South => candidate.y >= from_rect.y + from_rect.height,
        }
    };

    let primary_axis = match direction {
        Direction::West | Direction::East => 0,
        Direction::North | Direction::South => 1,
    };
    let orthogonal_axis = 1 - primary_axis;

    let mut best: Option<(PaneId, f32)> = None;
    for (id, rect) in root.all_panes() {
        if id == pane_id || !is_on_side(&rect) {
            continue;
        }
        if !rect.overlaps_on_axis(&from_rect, orthogonal_axis) {
            continue;
        }
        let distance = match direction {
            Direction::West => from_rect.x - (rect.x + rect.width),
            Direction::East => rect.x - (from_rect.x + from_rect.width),
            Direction::North => from_rect.y - (rect.y + rect.height),
            Direction::South => rect.y - (from_rect.y + from_rect.height),
        };
        if best.is_none_or(|(_, best_distance)| distance < best_distance) {
            best = Some((id, distance));
        }
    }

    best.map(|(id, _)| id)
}
