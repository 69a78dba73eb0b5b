use mux_cells::Cell;
use mux_selection::SelectionRange;

/// One row's worth of search-match column spans (inclusive), for the
/// "search matches" and "current match" overlay layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpan {
    pub start: u16,
    pub end: u16,
}

impl ColumnSpan {
    pub fn contains(&self, x: u16) -> bool {
        x >= self.start && x <= self.end
    }
}

/// Everything a row needs to know to paint its highlight layers, in the
/// fixed precedence order spec §4.9 step 5 gives: search matches, then
/// the current match, then selection, then the cursor — each later layer
/// overrides the colors of anything earlier.
#[derive(Default)]
pub struct RowHighlights<'a> {
    pub search_matches: &'a [ColumnSpan],
    pub current_match: Option<ColumnSpan>,
    pub selection: Option<&'a SelectionRange>,
    pub cursor_x: Option<u16>,
}

const SEARCH_MATCH_BG: [u8; 3] = [120, 100, 10];
const CURRENT_MATCH_BG: [u8; 3] = [200, 150, 20];
const SELECTION_BG: [u8; 3] = [60, 90, 160];
const CURSOR_BG: [u8; 3] = [255, 255, 255];

/// Applies `highlights` to one already-decoded row of cells for row
/// `abs_y`, in place. The base cells should already reflect the
/// packed/overlay base paint (spec §4.9 step 5: "draw the packed base
/// first, then paint highlights in layer order").
pub fn apply(row: &mut [Cell], abs_y: usize, highlights: &RowHighlights) {
    for (x, cell) in row.iter_mut().enumerate() {
        let x = x as u16;

        if highlights.search_matches.iter().any(|span| span.contains(x)) {
            cell.bg = SEARCH_MATCH_BG;
        }
        if highlights.current_match.is_some_and(|span| span.contains(x)) {
            cell.bg = CURRENT_MATCH_BG;
        }
        if highlights
            .selection
            .is_some_and(|sel| sel.is_cell_selected(x, abs_y))
        {
            cell.bg = SELECTION_BG;
        }
        if highlights.cursor_x == Some(x) {
            // Cursor rendering swaps fg<->bg: the new foreground is the
            // cell's own background, on a white cursor background (spec
            // §4.9 step 5/8).
            cell.fg = cell.bg;
            cell.bg = CURSOR_BG;
        }
    }
}
