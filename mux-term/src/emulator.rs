use mux_cells::Cell;

/// Cursor shape, mirrored 1:1 on the wire by `wire::CURSOR_STYLE_*`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorStyle {
    Block,
    Underline,
    Bar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorState {
    pub x: u16,
    pub y: u16,
    pub visible: bool,
    pub style: CursorStyle,
}

/// What changed since the backend's dirty bitmap was last cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirtyState {
    None,
    Partial,
    Full,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorKeyMode {
    Normal,
    Application,
}

/// Foreground/background as configured or reported by OSC 10/11.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Colors {
    pub fg: [u8; 3],
    pub bg: [u8; 3],
}

/// Construction-time parameters for an `EmulatorOps` backend (§6.1).
#[derive(Debug, Clone)]
pub struct EmulatorInit {
    pub cols: u16,
    pub rows: u16,
    pub scrollback_limit: usize,
    pub fg: [u8; 3],
    pub bg: [u8; 3],
    pub cursor_color: [u8; 3],
    pub palette: [[u8; 3]; 16],
}

impl Default for EmulatorInit {
    fn default() -> Self {
        EmulatorInit {
            cols: 80,
            rows: 24,
            scrollback_limit: 10_000,
            fg: [255, 255, 255],
            bg: [0, 0, 0],
            cursor_color: [255, 255, 255],
            palette: [[0, 0, 0]; 16],
        }
    }
}

/// One cached Kitty graphics placement, for re-attach without retransmit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KittyPlacement {
    pub image_id: u32,
    pub x: u16,
    pub y: u16,
}

/// The capability set a pluggable VT backend must expose (spec §6.1). The
/// core never depends on a concrete backend type, only on this trait
/// object (`Box<dyn EmulatorOps>`).
pub trait EmulatorOps: Send {
    fn write(&mut self, bytes: &[u8]);
    fn resize(&mut self, cols: u16, rows: u16);
    fn update(&mut self) -> DirtyState;
    fn mark_clean(&mut self);
    fn is_row_dirty(&self, y: u16) -> bool;

    fn get_cursor(&self) -> CursorState;
    fn get_colors(&self) -> Colors;
    fn get_mode(&self, mode: u16, ansi: bool) -> bool;
    fn is_alternate_screen(&self) -> bool;
    fn has_mouse_tracking(&self) -> bool;
    fn cursor_key_mode(&self) -> CursorKeyMode;

    fn cols(&self) -> u16;
    fn rows(&self) -> u16;

    fn get_scrollback_length(&self) -> usize;
    /// `offset` is absolute, `0` = oldest scrollback line.
    fn get_scrollback_line(&self, offset: usize) -> Option<Vec<Cell>>;
    fn is_row_wrapped(&self, y: u16) -> bool;

    fn has_response(&self) -> bool;
    fn read_response(&mut self) -> Vec<u8>;

    /// Full live viewport, `rows * cols` cells in row-major order.
    fn get_viewport(&self) -> Vec<Cell>;

    fn get_kitty_placements(&self) -> Vec<KittyPlacement> {
        Vec::new()
    }

    fn kitty_images_dirty(&self) -> bool {
        false
    }

    fn clear_kitty_images_dirty(&mut self) {}

    /// Drains the window title set since the last call, if the backend
    /// tracks one (e.g. via OSC 0/2). Default: no title tracking.
    fn take_title(&mut self) -> Option<String> {
        None
    }
}
