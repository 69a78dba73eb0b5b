use std::sync::{Arc, Mutex};

use alacritty_terminal::event::{Event, EventListener};
use alacritty_terminal::grid::Dimensions;
use alacritty_terminal::index::{Column, Line, Point};
use alacritty_terminal::term::cell::Flags;
use alacritty_terminal::term::{Config as AlacrittyConfig, Term, TermDamage, TermMode};
use alacritty_terminal::vte::ansi::{
    Color as AnsiColor, CursorShape as AlacrittyCursorShape, NamedColor, Processor, StdSyncHandler,
};

use mux_cells::{Attributes, Cell};

use crate::emulator::{Colors, CursorKeyMode, CursorState, CursorStyle, DirtyState, EmulatorInit, EmulatorOps};
use crate::normalize::{is_cjk_ideograph, normalize_char};

/// Alacritty events are drained synchronously after each `write` via the
/// shared handle `AlacrittyEmulator` keeps; the `Mutex` only exists to
/// satisfy `EventListener: Send + Sync`, nothing here actually contends.
#[derive(Default)]
struct ListenerState {
    title: Option<String>,
    bell: bool,
}

#[derive(Clone, Default)]
struct BufferingListener(Arc<Mutex<ListenerState>>);

impl EventListener for BufferingListener {
    fn send_event(&self, event: Event) {
        let mut state = self.0.lock().unwrap();
        match event {
            Event::Title(title) => state.title = Some(title),
            Event::Bell => state.bell = true,
            _ => {}
        }
    }
}

struct TermSize {
    cols: usize,
    rows: usize,
}

impl Dimensions for TermSize {
    fn total_lines(&self) -> usize {
        self.rows
    }

    fn screen_lines(&self) -> usize {
        self.rows
    }

    fn columns(&self) -> usize {
        self.cols
    }
}

fn resolve_color(color: AnsiColor, default: [u8; 3], palette: &[[u8; 3]; 16]) -> [u8; 3] {
    match color {
        AnsiColor::Named(NamedColor::Foreground) | AnsiColor::Named(NamedColor::Background) => default,
        AnsiColor::Named(name) => {
            let idx = name as usize;
            if idx < 16 {
                palette[idx]
            } else {
                default
            }
        }
        AnsiColor::Indexed(idx) => {
            if (idx as usize) < 16 {
                palette[idx as usize]
            } else {
                default
            }
        }
        AnsiColor::Spec(rgb) => [rgb.r, rgb.g, rgb.b],
    }
}

/// `EmulatorOps` backed by the `alacritty_terminal` VT engine.
///
/// The emulator's own display offset is never touched — scrollback
/// navigation is entirely the wrapper's concern (§4.2/§4.6), so this
/// backend always renders as if pinned to the bottom of history.
pub struct AlacrittyEmulator {
    term: Term<BufferingListener>,
    listener: BufferingListener,
    processor: Processor<StdSyncHandler>,
    fg: [u8; 3],
    bg: [u8; 3],
    palette: [[u8; 3]; 16],
    dirty_rows: Vec<bool>,
    dirty_state: DirtyState,
}

impl AlacrittyEmulator {
    pub fn new(init: &EmulatorInit) -> Self {
        let config = AlacrittyConfig {
            scrolling_history: init.scrollback_limit,
            ..AlacrittyConfig::default()
        };
        let size = TermSize {
            cols: init.cols as usize,
            rows: init.rows as usize,
        };
        let listener = BufferingListener::default();
        let term = Term::new(config, &size, listener.clone());
        AlacrittyEmulator {
            term,
            listener,
            processor: Processor::new(),
            fg: init.fg,
            bg: init.bg,
            palette: init.palette,
            dirty_rows: vec![false; init.rows as usize],
            dirty_state: DirtyState::None,
        }
    }

    fn history_size(&self) -> usize {
        let grid = self.term.grid();
        grid.total_lines().saturating_sub(grid.screen_lines())
    }

    fn convert_cell(&self, cell: &alacritty_terminal::term::cell::Cell) -> Cell {
        let flags = cell.flags;
        if flags.contains(Flags::WIDE_CHAR_SPACER) {
            let bg = resolve_color(cell.bg, self.bg, &self.palette);
            return Cell {
                ch: ' ',
                fg: bg,
                bg,
                attrs: Attributes::default(),
                width: 1,
                hyperlink_id: None,
            };
        }

        let width = if flags.contains(Flags::WIDE_CHAR) { 2 } else { 1 };
        // A CJK ideograph the backend itself reports as narrow renders as a
        // space rather than a wide glyph squeezed into one cell (spec §4.2
        // step 3).
        let ch = if width == 1 && is_cjk_ideograph(cell.c) {
            ' '
        } else {
            normalize_char(cell.c)
        };
        let fg = resolve_color(cell.fg, self.fg, &self.palette);
        let bg = resolve_color(cell.bg, self.bg, &self.palette);
        let attrs = Attributes {
            bold: flags.contains(Flags::BOLD),
            italic: flags.contains(Flags::ITALIC),
            underline: flags.intersects(Flags::ALL_UNDERLINES),
            strikethrough: flags.contains(Flags::STRIKEOUT),
            inverse: flags.contains(Flags::INVERSE),
            // alacritty_terminal does not track per-cell blink state.
            blink: false,
            dim: flags.contains(Flags::DIM),
        };

        Cell {
            ch,
            fg,
            bg,
            attrs,
            width,
            hyperlink_id: None,
        }
    }
}

impl EmulatorOps for AlacrittyEmulator {
    fn write(&mut self, bytes: &[u8]) {
        self.processor.advance(&mut self.term, bytes);
    }

    fn resize(&mut self, cols: u16, rows: u16) {
        let size = TermSize {
            cols: cols as usize,
            rows: rows as usize,
        };
        self.term.resize(size);
        self.dirty_rows = vec![true; rows as usize];
        self.dirty_state = DirtyState::Full;
    }

    fn update(&mut self) -> DirtyState {
        let rows = self.term.grid().screen_lines();
        if self.dirty_rows.len() != rows {
            self.dirty_rows = vec![false; rows];
        }

        match self.term.damage() {
            TermDamage::Full => {
                self.dirty_rows.iter_mut().for_each(|d| *d = true);
                self.dirty_state = DirtyState::Full;
            }
            TermDamage::Partial(lines) => {
                let mut any = false;
                for bounds in lines {
                    if bounds.line < self.dirty_rows.len() {
                        self.dirty_rows[bounds.line] = true;
                        any = true;
                    }
                }
                self.dirty_state = if any { DirtyState::Partial } else { DirtyState::None };
            }
        }
        self.dirty_state
    }

    fn mark_clean(&mut self) {
        self.term.reset_damage();
        self.dirty_rows.iter_mut().for_each(|d| *d = false);
        self.dirty_state = DirtyState::None;
    }

    fn is_row_dirty(&self, y: u16) -> bool {
        self.dirty_rows.get(y as usize).copied().unwrap_or(false)
    }

    fn get_cursor(&self) -> CursorState {
        let point = self.term.grid().cursor.point;
        let visible = self.term.mode().contains(TermMode::SHOW_CURSOR);
        let style = match self.term.cursor_style().shape {
            AlacrittyCursorShape::Beam => CursorStyle::Bar,
            AlacrittyCursorShape::Underline => CursorStyle::Underline,
            _ => CursorStyle::Block,
        };
        CursorState {
            x: point.column.0.max(0) as u16,
            y: point.line.0.max(0) as u16,
            visible,
            style,
        }
    }

    fn get_colors(&self) -> Colors {
        Colors {
            fg: self.fg,
            bg: self.bg,
        }
    }

    fn get_mode(&self, mode: u16, _ansi: bool) -> bool {
        let term_mode = self.term.mode();
        match mode {
            1 => term_mode.contains(TermMode::APP_CURSOR),
            4 => term_mode.contains(TermMode::INSERT),
            6 => term_mode.contains(TermMode::ORIGIN),
            7 => term_mode.contains(TermMode::LINE_WRAP),
            25 => term_mode.contains(TermMode::SHOW_CURSOR),
            47 | 1047 | 1049 => self.term.mode().contains(TermMode::ALT_SCREEN),
            1000 => term_mode.contains(TermMode::MOUSE_REPORT_CLICK),
            1002 => term_mode.contains(TermMode::MOUSE_DRAG),
            1003 => term_mode.contains(TermMode::MOUSE_MOTION),
            1004 => term_mode.contains(TermMode::FOCUS_IN_OUT),
            1005 => term_mode.contains(TermMode::UTF8_MOUSE),
            1006 => term_mode.contains(TermMode::SGR_MOUSE),
            1015 => term_mode.contains(TermMode::URXVT_MOUSE),
            2004 => term_mode.contains(TermMode::BRACKETED_PASTE),
            _ => false,
        }
    }

    fn is_alternate_screen(&self) -> bool {
        self.term.mode().contains(TermMode::ALT_SCREEN)
    }

    fn has_mouse_tracking(&self) -> bool {
        let mode = self.term.mode();
        mode.intersects(
            TermMode::MOUSE_REPORT_CLICK | TermMode::MOUSE_DRAG | TermMode::MOUSE_MOTION,
        )
    }

    fn cursor_key_mode(&self) -> CursorKeyMode {
        if self.term.mode().contains(TermMode::APP_CURSOR) {
            CursorKeyMode::Application
        } else {
            CursorKeyMode::Normal
        }
    }

    fn cols(&self) -> u16 {
        self.term.grid().columns() as u16
    }

    fn rows(&self) -> u16 {
        self.term.grid().screen_lines() as u16
    }

    fn get_scrollback_length(&self) -> usize {
        self.history_size()
    }

    fn get_scrollback_line(&self, offset: usize) -> Option<Vec<Cell>> {
        let history_size = self.history_size();
        if offset >= history_size {
            return None;
        }
        let grid = self.term.grid();
        let cols = grid.columns();
        let line = Line(offset as i32 - history_size as i32);
        Some(
            (0..cols)
                .map(|col| self.convert_cell(&grid[Point::new(line, Column(col))]))
                .collect(),
        )
    }

    fn is_row_wrapped(&self, y: u16) -> bool {
        let grid = self.term.grid();
        let cols = grid.columns();
        if cols == 0 {
            return false;
        }
        grid[Point::new(Line(y as i32), Column(cols - 1))]
            .flags
            .contains(Flags::WRAPLINE)
    }

    fn has_response(&self) -> bool {
        // Replies (DA/CPR/etc.) are synthesized entirely by the passthrough
        // layer from `QueryContext`; alacritty itself only emits `PtyWrite`
        // for features (e.g. clipboard OSC 52 set, answerback) this backend
        // doesn't wire a channel for yet.
        false
    }

    fn read_response(&mut self) -> Vec<u8> {
        Vec::new()
    }

    fn get_viewport(&self) -> Vec<Cell> {
        let grid = self.term.grid();
        let cols = grid.columns();
        let rows = grid.screen_lines();
        let mut out = Vec::with_capacity(cols * rows);
        for row in 0..rows {
            let line = Line(row as i32);
            for col in 0..cols {
                out.push(self.convert_cell(&grid[Point::new(line, Column(col))]));
            }
        }
        out
    }

    fn take_title(&mut self) -> Option<String> {
        self.listener.0.lock().unwrap().title.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn emulator(cols: u16, rows: u16) -> AlacrittyEmulator {
        AlacrittyEmulator::new(&EmulatorInit {
            cols,
            rows,
            scrollback_limit: 1000,
            ..EmulatorInit::default()
        })
    }

    #[test]
    fn writes_plain_text_and_advances_cursor() {
        let mut term = emulator(10, 4);
        term.write(b"hi");
        let cursor = term.get_cursor();
        assert_eq!((cursor.x, cursor.y), (2, 0));
    }

    #[test]
    fn update_reports_full_damage_after_construction() {
        let mut term = emulator(10, 4);
        term.write(b"x");
        assert_eq!(term.update(), DirtyState::Full);
        assert!(term.is_row_dirty(0));
        term.mark_clean();
        assert!(!term.is_row_dirty(0));
    }

    #[test]
    fn resize_changes_dimensions() {
        let mut term = emulator(10, 4);
        term.resize(20, 8);
        assert_eq!(term.cols(), 20);
        assert_eq!(term.rows(), 8);
    }

    #[test]
    fn scrollback_grows_as_lines_roll_off() {
        let mut term = emulator(5, 2);
        for i in 0..10 {
            term.write(format!("line{i}\r\n").as_bytes());
        }
        assert!(term.get_scrollback_length() > 0);
        assert!(term.get_scrollback_line(0).is_some());
    }

    #[test]
    fn out_of_range_scrollback_offset_returns_none() {
        let term = emulator(10, 4);
        assert!(term.get_scrollback_line(0).is_none());
    }
}
