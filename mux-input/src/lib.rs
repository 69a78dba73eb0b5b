//! Key and mouse to VT escape sequence encoding (spec §6.3): DECCKM-aware
//! cursor keys, xterm modifier codes, and SGR 1006 mouse reporting.
//!
//! This crate has no winit/crossterm dependency of its own — a host
//! translates its toolkit's key/mouse event types into [`Key`]/
//! [`Modifiers`]/[`MouseButton`] before calling [`encode_key`] or
//! [`encode_mouse_sgr`], the same seam the teacher's own input handler
//! draws between toolkit events and PTY bytes.

mod encode;
mod key;
mod mouse;

pub use encode::encode_key;
pub use key::{Key, Modifiers};
pub use mouse::{decode_mouse_sgr, encode_mouse_sgr, MouseButton, MouseEventKind};
