//! Out-of-process dirty serialization (spec §6.3), for hosts that
//! transport `DirtyUpdate`s across an IPC boundary rather than an
//! in-process channel.

use mux_cells::{pack_row, unpack_row, Cell, DecodeError, PackedRowUpdate};

use crate::emulator::{CursorKeyMode, CursorState, CursorStyle};
use crate::state::{DirtyUpdate, ScrollState, TerminalState};

pub const CURSOR_STYLE_BLOCK: u8 = 0;
pub const CURSOR_STYLE_UNDERLINE: u8 = 1;
pub const CURSOR_STYLE_BAR: u8 = 2;

fn cursor_style_to_wire(style: CursorStyle) -> u8 {
    match style {
        CursorStyle::Block => CURSOR_STYLE_BLOCK,
        CursorStyle::Underline => CURSOR_STYLE_UNDERLINE,
        CursorStyle::Bar => CURSOR_STYLE_BAR,
    }
}

fn cursor_style_from_wire(b: u8) -> CursorStyle {
    match b {
        CURSOR_STYLE_UNDERLINE => CursorStyle::Underline,
        CURSOR_STYLE_BAR => CursorStyle::Bar,
        _ => CursorStyle::Block,
    }
}

/// A flattened, wire-ready encoding of one `DirtyUpdate`. Field layout
/// mirrors spec §6.3's byte list; `dirty_row_data` is the concatenation
/// of each dirty row's packed bytes in `dirty_row_indices` order.
pub struct WireDirtyUpdate {
    pub dirty_row_indices: Vec<u16>,
    pub dirty_row_data: Vec<u8>,
    pub cursor_x: u16,
    pub cursor_y: u16,
    pub cursor_visible: u8,
    pub cursor_style: u8,
    pub cols: u16,
    pub rows: u16,
    pub scrollback_length: u32,
    pub is_full: u8,
    pub full_state_data: Option<Vec<u8>>,
    pub alternate_screen: u8,
    pub mouse_tracking: u8,
    pub cursor_key_mode: u8,
    pub in_band_resize: u8,
    pub packed_rows: Option<PackedRowUpdate>,
}

pub fn encode(update: &DirtyUpdate) -> WireDirtyUpdate {
    let mut dirty_row_indices: Vec<u16> = update.dirty_rows.keys().copied().collect();
    dirty_row_indices.sort_unstable();

    let mut dirty_row_data = Vec::with_capacity(dirty_row_indices.len() * update.cols as usize * 16);
    for idx in &dirty_row_indices {
        if let Some(row) = update.dirty_rows.get(idx) {
            dirty_row_data.extend(pack_row(row));
        }
    }

    let full_state_data = update.full_state.as_ref().map(|state| {
        let mut bytes = Vec::with_capacity(state.rows as usize * state.cols as usize * 16);
        for row in &state.cells {
            bytes.extend(pack_row(row));
        }
        bytes
    });

    WireDirtyUpdate {
        dirty_row_indices,
        dirty_row_data,
        cursor_x: update.cursor.x,
        cursor_y: update.cursor.y,
        cursor_visible: update.cursor.visible as u8,
        cursor_style: cursor_style_to_wire(update.cursor.style),
        cols: update.cols,
        rows: update.rows,
        scrollback_length: update.scroll_state.scrollback_length as u32,
        is_full: update.is_full as u8,
        full_state_data,
        alternate_screen: update.alternate_screen as u8,
        mouse_tracking: update.mouse_tracking as u8,
        cursor_key_mode: matches!(update.cursor_key_mode, CursorKeyMode::Application) as u8,
        in_band_resize: update.in_band_resize as u8,
        packed_rows: update.packed_rows.clone(),
    }
}

/// Reconstructs a `DirtyUpdate` from its wire encoding. `viewport_offset`
/// and `is_at_scrollback_limit` aren't carried on the wire struct above
/// (they're local viewport state the consumer already tracks) so the
/// caller supplies them.
pub fn decode(
    wire: &WireDirtyUpdate,
    viewport_offset: usize,
    is_at_scrollback_limit: bool,
) -> Result<DirtyUpdate, DecodeError> {
    let mut dirty_rows = std::collections::HashMap::new();
    let row_bytes = wire.cols as usize * 16;
    for (i, &idx) in wire.dirty_row_indices.iter().enumerate() {
        let start = i * row_bytes;
        let end = start + row_bytes;
        if end > wire.dirty_row_data.len() {
            return Err(DecodeError::Truncated {
                expected: end,
                got: wire.dirty_row_data.len(),
            });
        }
        let row = unpack_row(&wire.dirty_row_data[start..end])?;
        dirty_rows.insert(idx, row);
    }

    let full_state = match &wire.full_state_data {
        Some(bytes) => Some(decode_full_state(wire, bytes, viewport_offset, is_at_scrollback_limit)?),
        None => None,
    };

    Ok(DirtyUpdate {
        dirty_rows,
        cursor: CursorState {
            x: wire.cursor_x,
            y: wire.cursor_y,
            visible: wire.cursor_visible != 0,
            style: cursor_style_from_wire(wire.cursor_style),
        },
        scroll_state: ScrollState {
            viewport_offset,
            scrollback_length: wire.scrollback_length as usize,
            is_at_bottom: viewport_offset == 0,
            is_at_scrollback_limit,
        },
        cols: wire.cols,
        rows: wire.rows,
        is_full: wire.is_full != 0,
        full_state,
        packed_rows: wire.packed_rows.clone(),
        alternate_screen: wire.alternate_screen != 0,
        mouse_tracking: wire.mouse_tracking != 0,
        cursor_key_mode: if wire.cursor_key_mode != 0 {
            CursorKeyMode::Application
        } else {
            CursorKeyMode::Normal
        },
        in_band_resize: wire.in_band_resize != 0,
    })
}

fn decode_full_state(
    wire: &WireDirtyUpdate,
    bytes: &[u8],
    _viewport_offset: usize,
    _is_at_scrollback_limit: bool,
) -> Result<TerminalState, DecodeError> {
    let row_bytes = wire.cols as usize * 16;
    let mut cells: Vec<Vec<Cell>> = Vec::with_capacity(wire.rows as usize);
    for r in 0..wire.rows as usize {
        let start = r * row_bytes;
        let end = start + row_bytes;
        if end > bytes.len() {
            return Err(DecodeError::Truncated {
                expected: end,
                got: bytes.len(),
            });
        }
        cells.push(unpack_row(&bytes[start..end])?);
    }
    Ok(TerminalState {
        cols: wire.cols,
        rows: wire.rows,
        cells,
        cursor: CursorState {
            x: wire.cursor_x,
            y: wire.cursor_y,
            visible: wire.cursor_visible != 0,
            style: cursor_style_from_wire(wire.cursor_style),
        },
        alternate_screen: wire.alternate_screen != 0,
        mouse_tracking: wire.mouse_tracking != 0,
        cursor_key_mode: if wire.cursor_key_mode != 0 {
            CursorKeyMode::Application
        } else {
            CursorKeyMode::Normal
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn encode_decode_round_trips_dirty_rows() {
        let mut dirty_rows = HashMap::new();
        dirty_rows.insert(2u16, vec![Cell::default(); 4]);
        let update = DirtyUpdate {
            dirty_rows,
            cursor: CursorState {
                x: 1,
                y: 2,
                visible: true,
                style: CursorStyle::Bar,
            },
            scroll_state: ScrollState {
                viewport_offset: 0,
                scrollback_length: 10,
                is_at_bottom: true,
                is_at_scrollback_limit: false,
            },
            cols: 4,
            rows: 4,
            is_full: false,
            full_state: None,
            packed_rows: None,
            alternate_screen: false,
            mouse_tracking: false,
            cursor_key_mode: CursorKeyMode::Normal,
            in_band_resize: false,
        };

        let wire = encode(&update);
        let decoded = decode(&wire, 0, false).unwrap();
        assert_eq!(decoded.dirty_rows.get(&2).unwrap().len(), 4);
        assert_eq!(decoded.cursor.x, 1);
        assert!(decoded.scroll_state.is_at_bottom);
    }
}
