use std::collections::HashMap;

use mux_cells::{Cell, PackedRowUpdate};

use crate::emulator::{CursorKeyMode, CursorState};

/// Snapshot of emulator-level terminal state (spec §3 `TerminalState`).
/// Invariant: `0 <= cursor.x < cols`, `0 <= cursor.y < rows`.
#[derive(Debug, Clone)]
pub struct TerminalState {
    pub cols: u16,
    pub rows: u16,
    pub cells: Vec<Vec<Cell>>,
    pub cursor: CursorState,
    pub alternate_screen: bool,
    pub mouse_tracking: bool,
    pub cursor_key_mode: CursorKeyMode,
}

/// Scrollback/viewport bookkeeping (spec §3 `ScrollState`).
///
/// `viewport_offset == 0 <=> is_at_bottom`. The absolute row index for
/// viewport row `y` is `scrollback_length - viewport_offset + y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollState {
    pub viewport_offset: usize,
    pub scrollback_length: usize,
    pub is_at_bottom: bool,
    pub is_at_scrollback_limit: bool,
}

impl ScrollState {
    pub fn absolute_row(&self, viewport_y: usize) -> usize {
        self.scrollback_length + viewport_y - self.viewport_offset
    }
}

/// One step of the unified terminal feed (spec §3 `DirtyUpdate`).
///
/// When `is_full` is true, `full_state` carries the complete viewport and
/// `dirty_rows` is only advisory; otherwise consumers must apply
/// `dirty_rows` onto their cached row sequence.
#[derive(Debug, Clone)]
pub struct DirtyUpdate {
    pub dirty_rows: HashMap<u16, Vec<Cell>>,
    pub cursor: CursorState,
    pub scroll_state: ScrollState,
    pub cols: u16,
    pub rows: u16,
    pub is_full: bool,
    pub full_state: Option<TerminalState>,
    pub packed_rows: Option<PackedRowUpdate>,
    pub alternate_screen: bool,
    pub mouse_tracking: bool,
    pub cursor_key_mode: CursorKeyMode,
    pub in_band_resize: bool,
}
