/// Direction auto-scroll should push the viewport while a selection drag
/// sits outside the pane's content area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoScrollDirection {
    Up,
    Down,
}

/// Default cadence for auto-scroll ticks while dragging past a pane edge
/// (spec §4.7: "steady cadence, default 20 Hz").
pub const DEFAULT_AUTO_SCROLL_HZ: u32 = 20;

/// Tracks whether a selection drag is currently past the pane's content
/// bounds and should be auto-scrolling. Pure state — the caller owns the
/// timer that drives repeated ticks at `DEFAULT_AUTO_SCROLL_HZ`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AutoScroll {
    direction: Option<AutoScrollDirection>,
}

impl AutoScroll {
    pub fn new() -> Self {
        AutoScroll { direction: None }
    }

    /// Re-evaluates auto-scroll state for a drag at `drag_y`, given the
    /// pane's content rows `[content_top, content_bottom)`. Returns the
    /// active direction, if any.
    pub fn update(&mut self, drag_y: i32, content_top: i32, content_bottom: i32) -> Option<AutoScrollDirection> {
        self.direction = if drag_y < content_top {
            Some(AutoScrollDirection::Up)
        } else if drag_y >= content_bottom {
            Some(AutoScrollDirection::Down)
        } else {
            None
        };
        self.direction
    }

    pub fn direction(&self) -> Option<AutoScrollDirection> {
        self.direction
    }

    /// Called when the mouse button is released: auto-scroll always stops,
    /// regardless of cursor position.
    pub fn stop(&mut self) {
        self.direction = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_scrolling_up_above_content_top() {
        let mut auto = AutoScroll::new();
        assert_eq!(auto.update(-5, 0, 24), Some(AutoScrollDirection::Up));
    }

    #[test]
    fn starts_scrolling_down_at_or_below_content_bottom() {
        let mut auto = AutoScroll::new();
        assert_eq!(auto.update(24, 0, 24), Some(AutoScrollDirection::Down));
    }

    #[test]
    fn stops_once_back_inside_bounds() {
        let mut auto = AutoScroll::new();
        auto.update(-5, 0, 24);
        assert_eq!(auto.update(10, 0, 24), None);
    }

    #[test]
    fn stop_clears_direction_regardless_of_position() {
        let mut auto = AutoScroll::new();
        auto.update(-5, 0, 24);
        auto.stop();
        assert_eq!(auto.direction(), None);
    }
}
