use mux_cells::Cell;

use crate::surface::RenderSurface;

/// Thumb position/height for the one-column scrollbar overlay (spec §4.9
/// step 6), in cell-row units rather than pixels — ported from the
/// teacher's `par_term_render::Scrollbar::update` viewport-ratio math,
/// re-expressed without a window/device dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollbarGeometry {
    pub thumb_top: u16,
    pub thumb_height: u16,
}

/// Computes the thumb geometry, or `None` when the scrollbar shouldn't be
/// drawn at all (at bottom, or no scrollback yet).
pub fn compute(rows: u16, scrollback_length: usize, viewport_offset: usize, is_at_bottom: bool) -> Option<ScrollbarGeometry> {
    if is_at_bottom || scrollback_length == 0 || rows == 0 {
        return None;
    }

    let rows_f = f64::from(rows);
    let total = rows_f + scrollback_length as f64;
    let thumb_height = (rows_f * rows_f / total).floor().max(1.0).min(rows_f) as u16;

    let ratio = 1.0 - (viewport_offset as f64 / scrollback_length as f64);
    let thumb_top = (ratio * (rows_f - f64::from(thumb_height))).floor().max(0.0) as u16;

    Some(ScrollbarGeometry { thumb_top, thumb_height })
}

/// Paints the scrollbar overlay onto `column` (the rightmost pane column).
/// `row_at` supplies each row's current cell at that column so the thumb
/// can preserve the underlying character and foreground while tinting the
/// background, as spec §4.9 requires; `tint` darkens/lightens a bg triple
/// for the thumb vs. track.
pub fn paint(
    surface: &mut dyn RenderSurface,
    column: u16,
    rows: u16,
    geometry: ScrollbarGeometry,
    row_at: impl Fn(u16) -> Option<Cell>,
    tint: impl Fn([u8; 3]) -> [u8; 3],
) {
    let thumb_range = geometry.thumb_top..(geometry.thumb_top + geometry.thumb_height).min(rows);
    for y in 0..rows {
        let Some(cell) = row_at(y) else { continue };
        if thumb_range.contains(&y) {
            surface.set_cell(column, y, cell.ch, cell.fg, tint(cell.bg), cell.attrs);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hidden_at_bottom() {
        assert!(compute(24, 1000, 0, true).is_none());
    }

    #[test]
    fn hidden_with_no_scrollback() {
        assert!(compute(24, 0, 0, false).is_none());
    }

    #[test]
    fn thumb_height_is_at_least_one_row() {
        let geom = compute(24, 100_000, 50_000, false).unwrap();
        assert_eq!(geom.thumb_height, 1);
    }

    #[test]
    fn thumb_sits_at_top_when_scrolled_to_the_oldest_line() {
        let geom = compute(24, 1000, 1000, false).unwrap();
        assert_eq!(geom.thumb_top, 0);
    }

    #[test]
    fn thumb_sits_near_bottom_when_scrolled_close_to_live() {
        let geom = compute(24, 1000, 1, false).unwrap();
        assert!(geom.thumb_top > 0);
        assert!(geom.thumb_top + geom.thumb_height <= 24);
    }
}
