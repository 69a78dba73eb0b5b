use std::collections::HashMap;

use mux_cells::Cell;
use mux_protocol::{KittyTransmitCache, ModeState, PassthroughFilter, QueryContext};

use crate::alacritty_backend::AlacrittyEmulator;
use crate::config::EmulatorConfig;
use crate::emulator::{DirtyState, EmulatorInit, EmulatorOps};
use crate::prefetch::DirtyTracker;
use crate::scrollback_cache::{ScrollbackCache, TransitionCache};
use crate::state::{DirtyUpdate, ScrollState, TerminalState};

/// Modes a real terminal actually tracks and a host might DECRQM-query;
/// anything outside this list reports `Unknown` rather than `Reset`, per
/// spec §4.3's DECRQM state table.
const QUERYABLE_MODES: &[u16] = &[
    1, 4, 6, 7, 25, 47, 1000, 1002, 1003, 1004, 1005, 1006, 1015, 1047, 1049, 2004,
];

/// Result of feeding one chunk of PTY output through the wrapper.
pub struct WriteOutcome {
    pub update: DirtyUpdate,
    /// Bytes to write back to the PTY: synthesized query replies, ordered
    /// after any pending backend responses from the same call.
    pub pty_writes: Vec<u8>,
}

/// Adapts a pluggable `EmulatorOps` backend to the core model (spec
/// §4.2): runs every write through the query passthrough first, then
/// asks the backend to render, converts dirty rows into normalized
/// cells, and maintains the scrollback LRU cache and its eviction
/// invariants.
pub struct EmulatorWrapper {
    emulator: Box<dyn EmulatorOps>,
    passthrough: PassthroughFilter,
    kitty_cache: KittyTransmitCache,
    scrollback_cache: ScrollbackCache,
    transition_cache: TransitionCache,
    dirty_tracker: DirtyTracker,
    config: EmulatorConfig,
    fg: [u8; 3],
    bg: [u8; 3],
    cursor_color: [u8; 3],
    palette: [[u8; 3]; 16],
    cell_width_px: u16,
    cell_height_px: u16,
    window_width_px: u16,
    window_height_px: u16,
    prev_scrollback_length: usize,
    in_band_resize_pending: bool,
}

impl EmulatorWrapper {
    pub fn new(init: EmulatorInit, config: EmulatorConfig) -> Self {
        let rows = init.rows;
        let fg = init.fg;
        let bg = init.bg;
        let cursor_color = init.cursor_color;
        let palette = init.palette;
        Self::with_backend(Box::new(AlacrittyEmulator::new(&init)), config, fg, bg, cursor_color, palette, rows)
    }

    pub fn with_backend(
        emulator: Box<dyn EmulatorOps>,
        config: EmulatorConfig,
        fg: [u8; 3],
        bg: [u8; 3],
        cursor_color: [u8; 3],
        palette: [[u8; 3]; 16],
        rows: u16,
    ) -> Self {
        EmulatorWrapper {
            emulator,
            passthrough: PassthroughFilter::new(),
            kitty_cache: KittyTransmitCache::new(),
            scrollback_cache: ScrollbackCache::new(
                config.scrollback_cache_capacity,
                config.scrollback_cache_trim_target,
            ),
            transition_cache: TransitionCache::new(),
            dirty_tracker: DirtyTracker::new(rows),
            config,
            fg,
            bg,
            cursor_color,
            palette,
            cell_width_px: 8,
            cell_height_px: 16,
            window_width_px: 640,
            window_height_px: 384,
            prev_scrollback_length: 0,
            in_band_resize_pending: false,
        }
    }

    pub fn set_cell_pixel_size(&mut self, width: u16, height: u16) {
        self.cell_width_px = width;
        self.cell_height_px = height;
    }

    pub fn set_window_pixel_size(&mut self, width: u16, height: u16) {
        self.window_width_px = width;
        self.window_height_px = height;
    }

    fn build_query_context(&self) -> QueryContext {
        let cursor = self.emulator.get_cursor();
        let mut mode_states = HashMap::new();
        for &ps in QUERYABLE_MODES {
            let state = if self.emulator.get_mode(ps, false) {
                ModeState::Set
            } else {
                ModeState::Reset
            };
            mode_states.insert(ps, state);
        }
        QueryContext {
            cursor_x: cursor.x,
            cursor_y: cursor.y,
            cols: self.emulator.cols(),
            rows: self.emulator.rows(),
            fg: self.fg,
            bg: self.bg,
            cursor_color: self.cursor_color,
            palette: self.palette,
            kitty_keyboard_flags: 0,
            cell_width_px: self.cell_width_px,
            cell_height_px: self.cell_height_px,
            window_width_px: self.window_width_px,
            window_height_px: self.window_height_px,
            mode_states,
        }
    }

    /// Step 1-4 of spec §4.2: passthrough, feed to backend, render,
    /// re-convert dirty rows.
    pub fn write(&mut self, bytes: &[u8]) -> WriteOutcome {
        let ctx = self.build_query_context();
        let result = self.passthrough.process(bytes, &ctx, &mut self.kitty_cache);
        self.emulator.write(&result.filtered);
        let mut pty_writes = Vec::new();
        if self.emulator.has_response() {
            pty_writes.extend(self.emulator.read_response());
        }
        pty_writes.extend(result.replies);
        let update = self.extract_update(false);
        WriteOutcome { update, pty_writes }
    }

    /// Resize clears the scrollback cache unconditionally (spec §4.2
    /// invariant: "on every resize, clear").
    pub fn resize(&mut self, cols: u16, rows: u16) -> DirtyUpdate {
        self.emulator.resize(cols, rows);
        self.scrollback_cache.clear();
        self.transition_cache.clear();
        self.dirty_tracker.on_dimensions_changed(rows);
        self.kitty_cache.force_invalidate();
        self.in_band_resize_pending = true;
        self.extract_update(true)
    }

    pub fn reset(&mut self) {
        self.prev_scrollback_length = 0;
        self.scrollback_cache.clear();
        self.transition_cache.clear();
        self.dirty_tracker.mark_all();
    }

    fn is_at_scrollback_limit(&self, scrollback_length: usize) -> bool {
        scrollback_length >= self.config.scrollback_limit
    }

    fn extract_update(&mut self, force_full: bool) -> DirtyUpdate {
        let dirty_state = self.emulator.update();
        let scrollback_length = self.emulator.get_scrollback_length();
        let delta = scrollback_length as i64 - self.prev_scrollback_length as i64;
        let at_limit = self.is_at_scrollback_limit(scrollback_length);

        if at_limit && delta == 0 && self.prev_scrollback_length > 0 {
            // Rollover: lines are being evicted from the bottom of history
            // as fast as new ones arrive at the top; no cached offset can
            // be trusted to still name the same content (spec §4.2, §3).
            self.scrollback_cache.clear();
            self.transition_cache.clear();
            self.dirty_tracker.on_scrollback_rollover();
        } else if delta > 0 {
            let old_len = self.prev_scrollback_length;
            let new_rows: Vec<Vec<Cell>> = (0..delta as usize)
                .filter_map(|i| self.emulator.get_scrollback_line(old_len + i))
                .collect();
            self.transition_cache.capture(old_len, &new_rows);
        } else if delta < 0 {
            self.transition_cache.clear();
        }
        self.prev_scrollback_length = scrollback_length;

        let cols = self.emulator.cols();
        let rows = self.emulator.rows();
        let cursor = self.emulator.get_cursor();
        self.dirty_tracker.on_cursor_moved(cursor.y);

        let is_full = force_full || matches!(dirty_state, DirtyState::Full);

        let mut dirty_rows = HashMap::new();
        let mut full_state = None;

        if is_full {
            let viewport = self.read_viewport(cols, rows);
            full_state = Some(TerminalState {
                cols,
                rows,
                cells: viewport.clone(),
                cursor,
                alternate_screen: self.emulator.is_alternate_screen(),
                mouse_tracking: self.emulator.has_mouse_tracking(),
                cursor_key_mode: self.emulator.cursor_key_mode(),
            });
            for (y, row) in viewport.into_iter().enumerate() {
                dirty_rows.insert(y as u16, row);
            }
        } else {
            let viewport = self.read_viewport(cols, rows);
            for y in 0..rows {
                if self.emulator.is_row_dirty(y) || self.dirty_tracker.is_row_dirty(y) {
                    if let Some(row) = viewport.get(y as usize) {
                        dirty_rows.insert(y, row.clone());
                    }
                }
            }
        }

        self.emulator.mark_clean();
        self.dirty_tracker.clear();

        let in_band_resize = std::mem::take(&mut self.in_band_resize_pending);

        DirtyUpdate {
            dirty_rows,
            cursor,
            scroll_state: ScrollState {
                viewport_offset: 0,
                scrollback_length,
                is_at_bottom: true,
                is_at_scrollback_limit: at_limit,
            },
            cols,
            rows,
            is_full,
            full_state,
            packed_rows: None,
            alternate_screen: self.emulator.is_alternate_screen(),
            mouse_tracking: self.emulator.has_mouse_tracking(),
            cursor_key_mode: self.emulator.cursor_key_mode(),
            in_band_resize,
        }
    }

    fn read_viewport(&self, cols: u16, rows: u16) -> Vec<Vec<Cell>> {
        let flat = self.emulator.get_viewport();
        let cols = cols as usize;
        (0..rows as usize)
            .map(|y| {
                let start = y * cols;
                let end = start + cols;
                flat.get(start..end).map(|s| s.to_vec()).unwrap_or_default()
            })
            .collect()
    }

    /// Resolves one absolute scrollback line, consulting the transition
    /// cache and the LRU cache before falling back to the backend
    /// (caching the backend's answer for next time).
    pub fn get_scrollback_line(&mut self, offset: usize) -> Option<Vec<Cell>> {
        if let Some(row) = self.transition_cache.get(offset) {
            return Some(row.to_vec());
        }
        if let Some(row) = self.scrollback_cache.get(offset) {
            return Some(row.to_vec());
        }
        let row = self.emulator.get_scrollback_line(offset)?;
        self.scrollback_cache.insert(offset, row.clone());
        Some(row)
    }

    pub fn get_scrollback_lines(&mut self, start: usize, count: usize) -> Vec<(usize, Vec<Cell>)> {
        (start..start + count)
            .filter_map(|offset| self.get_scrollback_line(offset).map(|row| (offset, row)))
            .collect()
    }

    pub fn scrollback_length(&self) -> usize {
        self.emulator.get_scrollback_length()
    }

    pub fn cols(&self) -> u16 {
        self.emulator.cols()
    }

    pub fn rows(&self) -> u16 {
        self.emulator.rows()
    }

    /// Current live viewport as `rows` rows of `cols` cells, for callers
    /// (e.g. search) that need the rendered grid outside a `write`/`resize`
    /// call.
    pub fn viewport_rows(&self) -> Vec<Vec<Cell>> {
        self.read_viewport(self.emulator.cols(), self.emulator.rows())
    }

    pub fn force_invalidate_kitty_cache(&mut self) {
        self.kitty_cache.force_invalidate();
    }

    pub fn take_title(&mut self) -> Option<String> {
        self.emulator.take_title()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wrapper(cols: u16, rows: u16) -> EmulatorWrapper {
        EmulatorWrapper::new(
            EmulatorInit {
                cols,
                rows,
                scrollback_limit: 50,
                ..EmulatorInit::default()
            },
            EmulatorConfig {
                scrollback_limit: 50,
                scrollback_cache_capacity: 100,
                scrollback_cache_trim_target: 50,
            },
        )
    }

    #[test]
    fn first_write_produces_a_full_update() {
        let mut w = wrapper(10, 4);
        let outcome = w.write(b"hi");
        assert!(outcome.update.is_full);
        assert_eq!(outcome.update.cursor.x, 2);
    }

    #[test]
    fn query_reply_ordering_strips_cpr_and_queues_reply() {
        let mut w = wrapper(10, 10);
        // "hello" lands in its own write so the cursor is already at
        // column 5 by the time the next chunk's query context is built.
        w.write(b"hello");
        let outcome = w.write(b"\x1b[6nworld");
        assert_eq!(outcome.pty_writes, b"\x1b[1;6R");
        assert!(outcome.update.dirty_rows.contains_key(&0) || outcome.update.is_full);
    }

    #[test]
    fn resize_clears_scrollback_cache() {
        let mut w = wrapper(5, 2);
        for i in 0..10 {
            w.write(format!("line{i}\r\n").as_bytes());
        }
        assert!(w.get_scrollback_line(0).is_some());
        w.resize(8, 3);
        // A resized alacritty grid still has history, but our cache must
        // have been wiped regardless of whether offsets still resolve.
        assert!(w.scrollback_cache.is_empty());
    }
}
