use thiserror::Error;

/// Decode paths are total: a malformed input always yields one of these
/// instead of a partially-constructed row.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("packed row length {got} is not a multiple of the cell size (cols={cols})")]
    RowLengthMismatch { got: usize, cols: usize },

    #[error("overlay index {index} is out of range for {rows} rows")]
    OverlayIndexOutOfRange { index: usize, rows: usize },

    #[error("overlay x {x} is out of range for {cols} columns")]
    OverlayXOutOfRange { x: u16, cols: usize },

    #[error("row index {row} is out of range for {rows} declared rows")]
    RowIndexOutOfRange { row: usize, rows: usize },

    #[error("truncated packed buffer: expected at least {expected} bytes, got {got}")]
    Truncated { expected: usize, got: usize },
}
