//! Selection geometry and text extraction (spec §4.7): an anchor/focus
//! point pair normalizes into an ordered `SelectionRange`, which answers
//! membership and per-row column queries in O(1) and can reconstruct the
//! selected text from an arbitrary row source.

mod autoscroll;
mod extract;
mod point;
mod range;

pub use autoscroll::{AutoScroll, AutoScrollDirection, DEFAULT_AUTO_SCROLL_HZ};
pub use extract::extract_selected_text;
pub use point::Point;
pub use range::SelectionRange;
