//! Binary space partition tree for tiled panes (spec §4.8): ratio-based
//! splits, directional navigation/resize, and sibling-promoting removal.
//!
//! Every operation here is a pure tree transformation — `BspNode` carries
//! no pane content beyond an id and an optional PTY id, and no operation
//! in this crate touches a PTY, an emulator, or a host surface.

mod add;
mod bounds;
mod navigate;
mod remove;
mod resize;
mod swap;
mod types;

pub use add::add_pane;
pub use bounds::Rect;
pub use navigate::find_adjacent_pane;
pub use remove::{remove_pane, RemovePaneOutcome};
pub use resize::resize_pane;
pub use swap::swap_pane_in_direction;
pub use types::{BspNode, Direction, PaneId, SplitDirection, MAX_RATIO, MIN_RATIO};
