use mux_cells::Attributes;

/// The host surface this crate paints onto (spec §6.2's `OptimizedBuffer`
/// contract). Expressed as a trait, not a concrete GPU type, so a test
/// harness can supply an in-memory implementation and a real host can wire
/// it to whatever surface it already renders with — the batch logic in
/// this crate never assumes a backend.
pub trait RenderSurface {
    /// Paints a single cell's character and colors/attributes.
    fn set_cell(&mut self, x: u16, y: u16, ch: char, fg: [u8; 3], bg: [u8; 3], attrs: Attributes);

    /// Draws one codepoint at a position (used for overlay entries and
    /// other non-batched single-cell paints).
    fn draw_char(&mut self, codepoint: u32, x: u16, y: u16, fg: [u8; 3], bg: [u8; 3], attrs: Attributes);

    /// Draws a run of text starting at `(x, y)`, one cell per character.
    fn draw_text(&mut self, text: &str, x: u16, y: u16, fg: [u8; 3], bg: [u8; 3], attrs: Attributes);

    /// Blits a contiguous packed-cell byte buffer (spec §4.1's 16-byte
    /// record layout) starting at `(x, y)`, clipped to `clip_w x clip_h`.
    fn draw_packed_buffer(&mut self, data: &[u8], x: u16, y: u16, clip_w: u16, clip_h: u16);
}

/// Minimal in-memory `RenderSurface` used by this crate's own tests and
/// suitable as a reference implementation for a host's test harness.
#[derive(Debug, Clone)]
pub struct RecordingSurface {
    pub width: u16,
    pub height: u16,
    pub cells: Vec<(u16, u16, char, [u8; 3], [u8; 3], Attributes)>,
    pub packed_blits: Vec<(u16, u16, u16, u16)>,
}

impl RecordingSurface {
    pub fn new(width: u16, height: u16) -> Self {
        RecordingSurface {
            width,
            height,
            cells: Vec::new(),
            packed_blits: Vec::new(),
        }
    }

    pub fn clear_log(&mut self) {
        self.cells.clear();
        self.packed_blits.clear();
    }
}

impl RenderSurface for RecordingSurface {
    fn set_cell(&mut self, x: u16, y: u16, ch: char, fg: [u8; 3], bg: [u8; 3], attrs: Attributes) {
        self.cells.push((x, y, ch, fg, bg, attrs));
    }

    fn draw_char(&mut self, codepoint: u32, x: u16, y: u16, fg: [u8; 3], bg: [u8; 3], attrs: Attributes) {
        let ch = char::from_u32(codepoint).unwrap_or(' ');
        self.cells.push((x, y, ch, fg, bg, attrs));
    }

    fn draw_text(&mut self, text: &str, x: u16, y: u16, fg: [u8; 3], bg: [u8; 3], attrs: Attributes) {
        for (i, ch) in text.chars().enumerate() {
            self.cells.push((x + i as u16, y, ch, fg, bg, attrs));
        }
    }

    fn draw_packed_buffer(&mut self, _data: &[u8], x: u16, y: u16, clip_w: u16, clip_h: u16) {
        self.packed_blits.push((x, y, clip_w, clip_h));
    }
}
