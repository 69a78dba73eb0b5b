use crate::cell::{Attributes, Cell};
use crate::error::DecodeError;
use crate::hyperlink::HyperlinkId;
use crate::PACKED_CELL_SIZE;

fn encode_cell(buf: &mut [u8], cell: &Cell) {
    debug_assert_eq!(buf.len(), PACKED_CELL_SIZE);
    buf[0..4].copy_from_slice(&(cell.ch as u32).to_le_bytes());
    buf[4..7].copy_from_slice(&cell.fg);
    buf[7..10].copy_from_slice(&cell.bg);
    buf[10..12].copy_from_slice(&cell.attrs.to_bits().to_le_bytes());
    buf[12] = cell.width;
    let hid = cell.hyperlink_id.map(HyperlinkId::get).unwrap_or(0);
    buf[13..15].copy_from_slice(&hid.to_le_bytes());
    buf[15] = 0;
}

fn decode_cell(buf: &[u8]) -> Result<Cell, DecodeError> {
    if buf.len() != PACKED_CELL_SIZE {
        return Err(DecodeError::Truncated {
            expected: PACKED_CELL_SIZE,
            got: buf.len(),
        });
    }
    let codepoint = u32::from_le_bytes(buf[0..4].try_into().unwrap());
    let ch = char::from_u32(codepoint).unwrap_or(' ');
    let fg = [buf[4], buf[5], buf[6]];
    let bg = [buf[7], buf[8], buf[9]];
    let attrs = Attributes::from_bits(u16::from_le_bytes(buf[10..12].try_into().unwrap()));
    let width = buf[12];
    let hid = u16::from_le_bytes(buf[13..15].try_into().unwrap());
    Ok(Cell {
        ch,
        fg,
        bg,
        attrs,
        width,
        hyperlink_id: HyperlinkId::new(hid),
    })
}

/// Encodes a full row, one packed record per cell, no overlay path.
///
/// `unpack_row(pack_row(r)) == r` for any row of normalized cells.
pub fn pack_row(cells: &[Cell]) -> Vec<u8> {
    let mut out = vec![0u8; cells.len() * PACKED_CELL_SIZE];
    for (i, cell) in cells.iter().enumerate() {
        encode_cell(&mut out[i * PACKED_CELL_SIZE..(i + 1) * PACKED_CELL_SIZE], cell);
    }
    out
}

pub fn unpack_row(bytes: &[u8]) -> Result<Vec<Cell>, DecodeError> {
    if bytes.len() % PACKED_CELL_SIZE != 0 {
        return Err(DecodeError::RowLengthMismatch {
            got: bytes.len(),
            cols: bytes.len() / PACKED_CELL_SIZE,
        });
    }
    bytes
        .chunks_exact(PACKED_CELL_SIZE)
        .map(decode_cell)
        .collect()
}

/// One overlay entry awaiting serialization; kept internal, the public type
/// exposes parallel arrays per §3/§6.3.
struct OverlayEntry {
    x: u16,
    codepoint: u32,
    attributes: u8,
    fg: [u8; 4],
    bg: [u8; 4],
}

/// Row-batch wire format: a packed `data` stream (overlay cells replaced by
/// SPACE) plus parallel overlay arrays for cells the packed path can't
/// represent inline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedRowUpdate {
    pub cols: usize,
    pub row_indices: Vec<u16>,
    pub data: Vec<u8>,
    pub overlay_row_starts: Vec<u32>,
    pub overlay_x: Vec<u16>,
    pub overlay_y: Vec<u16>,
    pub overlay_codepoint: Vec<u32>,
    pub overlay_attributes: Vec<u8>,
    pub overlay_fg: Vec<u8>,
    pub overlay_bg: Vec<u8>,
}

/// Packs a set of rows (each `cols` cells wide) into a `PackedRowUpdate`.
///
/// A cell goes to the overlay iff `codepoint > 0x7F ∨ attributes ≠ 0 ∨
/// width = 2`; its slot in `data` is replaced with SPACE carrying the
/// cell's fg/bg. The wide-trailing spacer that follows a wide leader is
/// also overlaid (with `codepoint = 0`) purely to mark the boundary for
/// `decode_packed`, even though on its own it wouldn't need one.
pub fn pack_batch(rows: &[Vec<Cell>], row_indices: &[u16], cols: usize) -> PackedRowUpdate {
    assert_eq!(rows.len(), row_indices.len());

    let mut data = vec![0u8; rows.len() * cols * PACKED_CELL_SIZE];
    let mut overlay_row_starts = Vec::with_capacity(rows.len() + 1);
    let mut overlays: Vec<OverlayEntry> = Vec::new();

    for (y, row) in rows.iter().enumerate() {
        overlay_row_starts.push(overlays.len() as u32);
        let row_base = y * cols * PACKED_CELL_SIZE;
        let mut prev_was_wide_leader = false;

        for (x, cell) in row.iter().enumerate().take(cols) {
            let cell_buf = &mut data[row_base + x * PACKED_CELL_SIZE..row_base + (x + 1) * PACKED_CELL_SIZE];

            if prev_was_wide_leader {
                // Spacer following a wide leader: always overlaid so the
                // decoder can tell it apart from an ordinary space cell.
                encode_cell(cell_buf, &Cell::spacer(cell.bg));
                overlays.push(OverlayEntry {
                    x: x as u16,
                    codepoint: 0,
                    attributes: 0,
                    fg: [cell.bg[0], cell.bg[1], cell.bg[2], 0],
                    bg: [cell.bg[0], cell.bg[1], cell.bg[2], 0],
                });
                prev_was_wide_leader = false;
                continue;
            }

            if cell.needs_overlay() {
                encode_cell(cell_buf, &Cell::spacer(cell.bg));
                overlays.push(OverlayEntry {
                    x: x as u16,
                    codepoint: cell.ch as u32,
                    attributes: cell.attrs.to_bits() as u8,
                    fg: [cell.fg[0], cell.fg[1], cell.fg[2], 0],
                    bg: [cell.bg[0], cell.bg[1], cell.bg[2], 0],
                });
                prev_was_wide_leader = cell.width == 2;
            } else {
                encode_cell(cell_buf, cell);
            }
        }
    }
    overlay_row_starts.push(overlays.len() as u32);

    let mut overlay_x = Vec::with_capacity(overlays.len());
    let mut overlay_y = Vec::with_capacity(overlays.len());
    let mut overlay_codepoint = Vec::with_capacity(overlays.len());
    let mut overlay_attributes = Vec::with_capacity(overlays.len());
    let mut overlay_fg = Vec::with_capacity(overlays.len() * 4);
    let mut overlay_bg = Vec::with_capacity(overlays.len() * 4);

    for (y, start) in overlay_row_starts.windows(2).enumerate() {
        let (lo, hi) = (start[0] as usize, start[1] as usize);
        for entry in &overlays[lo..hi] {
            overlay_x.push(entry.x);
            overlay_y.push(y as u16);
            overlay_codepoint.push(entry.codepoint);
            overlay_attributes.push(entry.attributes);
            overlay_fg.extend_from_slice(&entry.fg);
            overlay_bg.extend_from_slice(&entry.bg);
        }
    }

    PackedRowUpdate {
        cols,
        row_indices: row_indices.to_vec(),
        data,
        overlay_row_starts,
        overlay_x,
        overlay_y,
        overlay_codepoint,
        overlay_attributes,
        overlay_fg,
        overlay_bg,
    }
}

/// Reverses a `PackedRowUpdate` back into per-row cell vectors.
pub fn decode_packed(update: &PackedRowUpdate) -> Result<Vec<Vec<Cell>>, DecodeError> {
    let rows = update.row_indices.len();
    let expected_data_len = rows * update.cols * PACKED_CELL_SIZE;
    if update.data.len() != expected_data_len {
        return Err(DecodeError::Truncated {
            expected: expected_data_len,
            got: update.data.len(),
        });
    }
    if update.overlay_row_starts.len() != rows + 1 {
        return Err(DecodeError::RowIndexOutOfRange {
            row: update.overlay_row_starts.len(),
            rows,
        });
    }

    let mut out = Vec::with_capacity(rows);

    for y in 0..rows {
        let row_base = y * update.cols * PACKED_CELL_SIZE;
        let mut row: Vec<Cell> = (0..update.cols)
            .map(|x| decode_cell(&update.data[row_base + x * PACKED_CELL_SIZE..row_base + (x + 1) * PACKED_CELL_SIZE]))
            .collect::<Result<_, _>>()?;

        let lo = update.overlay_row_starts[y] as usize;
        let hi = update.overlay_row_starts[y + 1] as usize;
        if hi > update.overlay_x.len() {
            return Err(DecodeError::OverlayIndexOutOfRange {
                index: hi,
                rows,
            });
        }

        let mut i = lo;
        while i < hi {
            let x = update.overlay_x[i] as usize;
            if x >= update.cols {
                return Err(DecodeError::OverlayXOutOfRange {
                    x: update.overlay_x[i],
                    cols: update.cols,
                });
            }
            let codepoint = update.overlay_codepoint[i];
            let is_spacer_marker = codepoint == 0;
            let next_is_spacer_marker = i + 1 < hi
                && update.overlay_x[i + 1] as usize == x + 1
                && update.overlay_codepoint[i + 1] == 0;

            if is_spacer_marker {
                // A bare codepoint=0 overlay not preceded by its leader just
                // describes a standalone spacer cell (already the decoded
                // default); nothing further to do beyond fg/bg, which the
                // packed `data` stream already carried correctly.
                i += 1;
                continue;
            }

            let ch = char::from_u32(codepoint).unwrap_or(' ');
            let attrs = Attributes::from_bits(update.overlay_attributes[i] as u16);
            let fg = [
                update.overlay_fg[i * 4],
                update.overlay_fg[i * 4 + 1],
                update.overlay_fg[i * 4 + 2],
            ];
            let bg = [
                update.overlay_bg[i * 4],
                update.overlay_bg[i * 4 + 1],
                update.overlay_bg[i * 4 + 2],
            ];
            let width = if next_is_spacer_marker { 2 } else { 1 };
            row[x] = Cell {
                ch,
                fg,
                bg,
                attrs,
                width,
                hyperlink_id: None,
            };
            i += 1;
        }

        out.push(row);
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ascii_row(s: &str) -> Vec<Cell> {
        s.chars()
            .map(|ch| Cell {
                ch,
                ..Cell::default()
            })
            .collect()
    }

    #[test]
    fn pack_row_round_trips_plain_ascii() {
        let row = ascii_row("hello");
        let packed = pack_row(&row);
        assert_eq!(packed.len(), row.len() * PACKED_CELL_SIZE);
        assert_eq!(unpack_row(&packed).unwrap(), row);
    }

    #[test]
    fn pack_row_round_trips_attributed_cells() {
        let row = vec![Cell {
            ch: 'x',
            attrs: Attributes {
                bold: true,
                underline: true,
                ..Attributes::default()
            },
            hyperlink_id: HyperlinkId::new(7),
            ..Cell::default()
        }];
        let packed = pack_row(&row);
        assert_eq!(unpack_row(&packed).unwrap(), row);
    }

    #[test]
    fn unpack_row_rejects_misaligned_length() {
        let err = unpack_row(&[0u8; 17]).unwrap_err();
        assert!(matches!(err, DecodeError::RowLengthMismatch { .. }));
    }

    #[test]
    fn wide_cell_rendering_produces_expected_overlays() {
        // Pack a row [{'中', width:2}, {spacer}, {'a', width:1}].
        let leader = Cell {
            ch: '中',
            fg: [255, 255, 255],
            bg: [0, 0, 0],
            width: 2,
            ..Cell::default()
        };
        let spacer = Cell::spacer([0, 0, 0]);
        let tail = Cell {
            ch: 'a',
            ..Cell::default()
        };
        let row = vec![leader, spacer, tail];

        let update = pack_batch(&[row], &[0], 3);

        assert_eq!(update.overlay_x, vec![0, 1]);
        assert_eq!(update.overlay_codepoint, vec![0x4E2D, 0]);
        assert_eq!(update.overlay_fg[0..3], [255, 255, 255]);
        assert_eq!(update.overlay_bg[4..7], [0, 0, 0]);

        // Cell 2 ('a') is packed inline, not overlaid.
        let inline_cell = decode_cell(&update.data[2 * PACKED_CELL_SIZE..3 * PACKED_CELL_SIZE]).unwrap();
        assert_eq!(inline_cell.ch, 'a');
    }

    #[test]
    fn decode_packed_reconstructs_wide_spacer_width() {
        let leader = Cell {
            ch: '中',
            width: 2,
            ..Cell::default()
        };
        let spacer = Cell::spacer([0, 0, 0]);
        let tail = Cell {
            ch: 'a',
            ..Cell::default()
        };
        let row = vec![leader.clone(), spacer, tail.clone()];

        let update = pack_batch(&[row.clone()], &[0], 3);
        let decoded = decode_packed(&update).unwrap();

        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[0][0].ch, '中');
        assert_eq!(decoded[0][0].width, 2);
        assert_eq!(decoded[0][1].width, 1);
        assert_eq!(decoded[0][2].ch, 'a');
    }

    #[test]
    fn decode_packed_rejects_truncated_data() {
        let update = PackedRowUpdate {
            cols: 4,
            row_indices: vec![0],
            data: vec![0u8; 10],
            overlay_row_starts: vec![0, 0],
            overlay_x: vec![],
            overlay_y: vec![],
            overlay_codepoint: vec![],
            overlay_attributes: vec![],
            overlay_fg: vec![],
            overlay_bg: vec![],
        };
        assert!(matches!(
            decode_packed(&update).unwrap_err(),
            DecodeError::Truncated { .. }
        ));
    }
}
