//! VT emulator wrapper, scrollback cache and dirty/prefetch engine.
//!
//! `EmulatorWrapper` is the crate's entry point: it owns a pluggable
//! `EmulatorOps` backend (the bundled `AlacrittyEmulator` by default),
//! runs every write through `mux_protocol`'s query passthrough, and
//! maintains the scrollback LRU cache and per-viewport dirty tracking
//! that the worker pool and renderer build on.

mod alacritty_backend;
mod config;
mod emulator;
mod normalize;
mod prefetch;
mod scrollback_cache;
mod state;
mod wire;
mod wrapper;

pub use alacritty_backend::AlacrittyEmulator;
pub use config::EmulatorConfig;
pub use emulator::{
    Colors, CursorKeyMode, CursorState, CursorStyle, DirtyState, EmulatorInit, EmulatorOps,
    KittyPlacement,
};
pub use normalize::normalize_char;
pub use prefetch::{DirtyTracker, PrefetchOutcome, PrefetchRequest, PrefetchSnapshot, Prefetcher};
pub use scrollback_cache::{ScrollbackCache, TransitionCache};
pub use state::{DirtyUpdate, ScrollState, TerminalState};
pub use wire::{decode, encode, WireDirtyUpdate};
pub use wrapper::{EmulatorWrapper, WriteOutcome};
