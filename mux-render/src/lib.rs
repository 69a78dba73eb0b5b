//! Render batch protocol (spec §4.9): the packed-row cache, the per-frame
//! batch draw contract consumed by a host [`RenderSurface`], and the
//! scrollbar/highlight overlays painted on top of it.
//!
//! This crate never touches a PTY or an emulator directly — it reads rows
//! through the [`RowSource`] trait (a host wires this to its worker
//! pool's live-viewport read and scrollback cache) and paints through the
//! [`RenderSurface`] trait (a host wires this to its GPU/terminal
//! surface). Both seams exist so the batch logic here is testable without
//! either dependency.

mod batch;
mod highlight;
mod row_cache;
mod scrollbar;
mod surface;

pub use batch::{FrameInput, PaneRenderer, PendingPrefetch};
pub use highlight::{apply as apply_highlights, ColumnSpan, RowHighlights};
pub use row_cache::{fetch_viewport, FetchedRows, RowSource};
pub use scrollbar::{compute as compute_scrollbar, paint as paint_scrollbar, ScrollbarGeometry};
pub use surface::{RecordingSurface, RenderSurface};
