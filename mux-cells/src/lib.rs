//! Cell, row and packed-cell wire types shared by every other crate in the
//! workspace.
//!
//! This crate owns the one binary contract every worker/IPC boundary in the
//! workspace agrees on: a fixed 16-byte packed cell record. Nothing here
//! talks to a PTY or a VT parser — see `mux-term` for that.

mod cell;
mod codec;
mod error;
mod hyperlink;

pub use cell::{Attributes, Cell};
pub use codec::{PackedRowUpdate, decode_packed, pack_batch, pack_row, unpack_row};
pub use error::DecodeError;
pub use hyperlink::HyperlinkId;

/// Byte size of one packed cell record.
pub const PACKED_CELL_SIZE: usize = 16;
