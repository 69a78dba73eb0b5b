use mux_cells::{pack_batch, Cell};
use mux_term::{CursorState, DirtyTracker, PrefetchSnapshot, Prefetcher, ScrollState};

use crate::highlight::{self, RowHighlights};
use crate::row_cache::{fetch_viewport, RowSource};
use crate::scrollbar;
use crate::surface::RenderSurface;

/// One pane's render state across frames: the per-viewport dirty bitmap
/// and the scrollback prefetch state machine (spec §4.6), plus the
/// previous frame's `(has_selection, has_search)` flip-detection (spec
/// §4.9 step 4).
pub struct PaneRenderer {
    cols: u16,
    rows: u16,
    dirty: DirtyTracker,
    prefetcher: Prefetcher,
    had_selection: bool,
    had_search: bool,
}

/// Everything one call to [`PaneRenderer::render_frame`] needs, gathered
/// up front so the per-row loop (spec §4.9 step 5) stays a pure
/// function of this input.
pub struct FrameInput<'a> {
    pub scroll: ScrollState,
    pub cursor: CursorState,
    pub pane_focused: bool,
    pub has_selection: bool,
    pub has_search: bool,
    pub row_highlights: Box<dyn Fn(u16, usize) -> RowHighlights<'a> + 'a>,
}

/// A scrollback prefetch the caller must now issue via the worker pool
/// (spec §4.6 `Scheduled -> InFlight`).
pub struct PendingPrefetch {
    pub start: usize,
    pub count: usize,
}

impl PaneRenderer {
    pub fn new(cols: u16, rows: u16) -> Self {
        PaneRenderer {
            cols,
            rows,
            dirty: DirtyTracker::new(rows),
            prefetcher: Prefetcher::new(),
            had_selection: false,
            had_search: false,
        }
    }

    /// Spec §4.6 `Idle -> Idle` dimension-change handling.
    pub fn resize(&mut self, cols: u16, rows: u16) {
        self.cols = cols;
        self.rows = rows;
        self.dirty.on_dimensions_changed(rows);
    }

    pub fn on_viewport_changed(&mut self) {
        self.dirty.on_viewport_changed();
    }

    pub fn on_scrollback_rollover(&mut self) {
        self.dirty.on_scrollback_rollover();
    }

    pub fn mark_row_dirty(&mut self, y: u16) {
        self.dirty.mark_row(y);
    }

    /// Applies a prefetch reply: marks the returned absolute offsets
    /// dirty on a match, or everything dirty on a snapshot mismatch
    /// (spec §4.6 `InFlight -> Idle`, not an error per spec §7).
    pub fn on_prefetch_reply(&mut self, current: PrefetchSnapshot, rows: Vec<usize>) {
        match self.prefetcher.on_reply(current, rows) {
            mux_term::PrefetchOutcome::Applied(applied) => {
                let base = current.scrollback_length.saturating_sub(current.viewport_offset);
                for abs in applied {
                    if let Some(y) = abs.checked_sub(base) {
                        if y < current.rows as usize {
                            self.dirty.mark_row(y as u16);
                        }
                    }
                }
            }
            mux_term::PrefetchOutcome::Mismatch => self.dirty.mark_all(),
        }
    }

    /// Runs spec §4.9 steps 2-6 for one frame: fetches the viewport
    /// (scheduling a prefetch for any missing scrollback row), paints
    /// clean/unhighlighted rows as a contiguous packed-buffer blit,
    /// paints highlighted or dirty rows cell-by-cell, and overlays the
    /// scrollbar. Returns a prefetch request the caller should issue, if
    /// the fetch surfaced a gap in the scrollback cache.
    pub fn render_frame(
        &mut self,
        surface: &mut dyn RenderSurface,
        source: &dyn RowSource,
        input: &FrameInput,
    ) -> Option<PendingPrefetch> {
        if input.has_selection != self.had_selection || input.has_search != self.had_search {
            self.dirty.mark_all();
        }
        self.had_selection = input.has_selection;
        self.had_search = input.has_search;
        self.dirty.on_cursor_moved(input.cursor.y);

        let fetched = fetch_viewport(source, input.scroll, self.rows);
        let pending_prefetch = self.schedule_prefetch_if_needed(input.scroll, &fetched.missing_absolute);

        let show_cursor = input.scroll.is_at_bottom && input.pane_focused && input.cursor.visible;

        let mut batch_rows: Vec<Vec<Cell>> = Vec::new();
        let mut batch_indices: Vec<u16> = Vec::new();

        let flush = |surface: &mut dyn RenderSurface, rows: &mut Vec<Vec<Cell>>, indices: &mut Vec<u16>, cols: u16| {
            if rows.is_empty() {
                return;
            }
            let update = pack_batch(rows, indices, cols as usize);
            surface.draw_packed_buffer(&update.data, 0, indices[0], cols, indices.len() as u16);
            rows.clear();
            indices.clear();
        };

        for y in 0..self.rows {
            let Some(row) = &fetched.cells[y as usize] else {
                continue;
            };
            let abs_y = input.scroll.absolute_row(y as usize);

            let highlights = (input.row_highlights)(y, abs_y);
            let row_cursor_x = if show_cursor && input.cursor.y == y {
                Some(input.cursor.x)
            } else {
                None
            };
            let has_highlights = !highlights.search_matches.is_empty()
                || highlights.current_match.is_some()
                || highlights.selection.is_some()
                || row_cursor_x.is_some();

            if !self.dirty.is_row_dirty(y) && !has_highlights {
                batch_rows.push(row.clone());
                batch_indices.push(y);
                continue;
            }

            flush(surface, &mut batch_rows, &mut batch_indices, self.cols);

            let mut painted = row.clone();
            let highlights = RowHighlights {
                cursor_x: row_cursor_x,
                ..highlights
            };
            highlight::apply(&mut painted, abs_y, &highlights);
            let packed = pack_batch(std::slice::from_ref(&painted), &[y], self.cols as usize);
            surface.draw_packed_buffer(&packed.data, 0, y, self.cols, 1);
        }
        flush(surface, &mut batch_rows, &mut batch_indices, self.cols);

        if let Some(geometry) = scrollbar::compute(
            self.rows,
            input.scroll.scrollback_length,
            input.scroll.viewport_offset,
            input.scroll.is_at_bottom,
        ) {
            let column = self.cols.saturating_sub(1);
            scrollbar::paint(
                surface,
                column,
                self.rows,
                geometry,
                |y| fetched.cells[y as usize].as_ref().and_then(|row| row.get(column as usize).copied()),
                |bg| [bg[0] / 2, bg[1] / 2, bg[2] / 2],
            );
        }

        self.dirty.clear();
        pending_prefetch
    }

    fn schedule_prefetch_if_needed(&mut self, scroll: ScrollState, missing: &[usize]) -> Option<PendingPrefetch> {
        if missing.is_empty() {
            return None;
        }
        self.prefetcher.superseded_by(missing);
        if !self.prefetcher.is_idle() {
            return None;
        }
        let snapshot = PrefetchSnapshot {
            viewport_offset: scroll.viewport_offset,
            scrollback_length: scroll.scrollback_length,
            rows: self.rows,
        };
        self.prefetcher.observe_missing(snapshot, missing)?;
        let first = *missing.first()?;
        let last = *missing.last()?;
        let request = self.prefetcher.schedule(first, last)?;
        Some(PendingPrefetch { start: request.start, count: request.count })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::RecordingSurface;
    use mux_cells::Cell;
    use std::collections::HashMap;

    struct FakeSource {
        rows: HashMap<u16, Vec<Cell>>,
    }

    impl RowSource for FakeSource {
        fn live_row(&self, y: u16) -> Option<Vec<Cell>> {
            self.rows.get(&y).cloned()
        }
        fn scrollback_row(&self, _abs: usize) -> Option<Vec<Cell>> {
            None
        }
    }

    #[test]
    fn clean_rows_batch_into_one_packed_blit() {
        let mut rows = HashMap::new();
        for y in 0..4u16 {
            rows.insert(y, vec![Cell::default(); 4]);
        }
        let source = FakeSource { rows };
        let mut renderer = PaneRenderer::new(4, 4);
        let mut surface = RecordingSurface::new(4, 4);
        let scroll = ScrollState {
            viewport_offset: 0,
            scrollback_length: 0,
            is_at_bottom: true,
            is_at_scrollback_limit: false,
        };
        let cursor = CursorState { x: 0, y: 0, visible: false, style: mux_term::CursorStyle::Block };

        // First frame: everything dirty, so each row is painted one at a
        // time via the highlighted-row path, never batched.
        let input = FrameInput {
            scroll,
            cursor,
            pane_focused: false,
            has_selection: false,
            has_search: false,
            row_highlights: Box::new(|_, _| RowHighlights::default()),
        };
        renderer.render_frame(&mut surface, &source, &input);

        surface.clear_log();
        // Second frame: nothing moved, nothing dirty, no highlights -> a
        // single contiguous batch blit for all 4 rows.
        let input = FrameInput {
            scroll,
            cursor,
            pane_focused: false,
            has_selection: false,
            has_search: false,
            row_highlights: Box::new(|_, _| RowHighlights::default()),
        };
        renderer.render_frame(&mut surface, &source, &input);
        assert_eq!(surface.packed_blits.len(), 1);
        assert_eq!(surface.packed_blits[0].3, 4);
    }

    #[test]
    fn missing_scrollback_rows_schedule_a_prefetch() {
        let source = FakeSource { rows: HashMap::new() };
        let mut renderer = PaneRenderer::new(4, 4);
        let mut surface = RecordingSurface::new(4, 4);
        let scroll = ScrollState {
            viewport_offset: 10,
            scrollback_length: 100,
            is_at_bottom: false,
            is_at_scrollback_limit: false,
        };
        let cursor = CursorState { x: 0, y: 0, visible: false, style: mux_term::CursorStyle::Block };
        let input = FrameInput {
            scroll,
            cursor,
            pane_focused: false,
            has_selection: false,
            has_search: false,
            row_highlights: Box::new(|_, _| RowHighlights::default()),
        };
        let pending = renderer.render_frame(&mut surface, &source, &input);
        assert!(pending.is_some());
    }
}
