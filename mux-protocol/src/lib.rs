//! Streaming, chunk-boundary-safe extraction of host-targeted escape
//! sequences (status/attribute/capability queries, Kitty graphics APC)
//! from untrusted PTY output, with synthesized replies written back.
//!
//! Nothing here depends on a VT emulator: the caller supplies whatever
//! terminal state a reply needs via [`QueryContext`] and receives the
//! filtered bytes plus any synthesized reply bytes.

mod context;
mod filter;
mod kitty;
mod responses;

pub use context::{ModeState, QueryContext};
pub use filter::{PassthroughFilter, PassthroughResult};
pub use kitty::{ImageInfo, KittyOutcome, KittyTransmitCache};
