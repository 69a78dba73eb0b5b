//! Per-viewport dirty-row tracking and the scrollback prefetch state
//! machine (spec §4.6).

/// Tracks which of the `rows` viewport rows need repainting.
pub struct DirtyTracker {
    rows: Vec<bool>,
    dirty_all: bool,
    last_cursor_y: Option<u16>,
}

impl DirtyTracker {
    pub fn new(rows: u16) -> Self {
        DirtyTracker {
            rows: vec![true; rows as usize],
            dirty_all: true,
            last_cursor_y: None,
        }
    }

    pub fn mark_all(&mut self) {
        self.dirty_all = true;
    }

    pub fn mark_row(&mut self, y: u16) {
        if let Some(slot) = self.rows.get_mut(y as usize) {
            *slot = true;
        }
    }

    /// Called on dimension change or a selection/search state flip: per
    /// spec both force a full repaint.
    pub fn on_dimensions_changed(&mut self, rows: u16) {
        self.rows = vec![false; rows as usize];
        self.dirty_all = true;
    }

    /// Called on every update: always re-marks the previous and new
    /// cursor row (to erase/redraw the cursor) regardless of what the
    /// emulator's own dirty bitmap says.
    pub fn on_cursor_moved(&mut self, new_cursor_y: u16) {
        if let Some(prev) = self.last_cursor_y {
            self.mark_row(prev);
        }
        self.mark_row(new_cursor_y);
        self.last_cursor_y = Some(new_cursor_y);
    }

    pub fn on_viewport_changed(&mut self) {
        self.dirty_all = true;
    }

    pub fn on_scrollback_rollover(&mut self) {
        self.dirty_all = true;
    }

    pub fn is_row_dirty(&self, y: u16) -> bool {
        self.dirty_all || self.rows.get(y as usize).copied().unwrap_or(false)
    }

    pub fn is_dirty_all(&self) -> bool {
        self.dirty_all
    }

    /// Clears per-row and `dirty_all` state after a frame has been drawn.
    pub fn clear(&mut self) {
        self.rows.iter_mut().for_each(|d| *d = false);
        self.dirty_all = false;
    }
}

/// Snapshot of the viewport the instant a prefetch request is issued;
/// compared against the live state when the reply arrives to detect a
/// stale reply (spec §4.6 `InFlight -> Idle`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrefetchSnapshot {
    pub viewport_offset: usize,
    pub scrollback_length: usize,
    pub rows: u16,
}

/// A `getScrollbackLines` request the caller should issue to the worker
/// pool, buffered to 2x the viewport around the missing rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrefetchRequest {
    pub start: usize,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PrefetchPhase {
    Idle,
    Scheduled,
    InFlight,
}

/// At most one scrollback prefetch in flight per PTY (invariant 6, spec
/// §8). `Prefetcher` is the pure state machine; the caller is
/// responsible for actually issuing/cancelling the `getScrollbackLines`
/// request through the worker pool.
pub struct Prefetcher {
    phase: PrefetchPhase,
    snapshot: Option<PrefetchSnapshot>,
    pending_request: Option<PrefetchRequest>,
}

impl Default for Prefetcher {
    fn default() -> Self {
        Prefetcher {
            phase: PrefetchPhase::Idle,
            snapshot: None,
            pending_request: None,
        }
    }
}

/// Outcome of an `on_reply` call.
pub enum PrefetchOutcome {
    /// The reply matched the snapshot taken when the request was issued;
    /// these absolute offsets should be marked dirty and a re-render
    /// requested.
    Applied(Vec<usize>),
    /// The snapshot diverged from current state; not an error (spec §7)
    /// — mark every row dirty and let the next frame reschedule.
    Mismatch,
}

impl Prefetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.phase, PrefetchPhase::Idle)
    }

    /// `Idle -> Scheduled`: rendering observed missing scrollback rows in
    /// the viewport. `missing` holds the absolute offsets that weren't in
    /// cache, in ascending order.
    pub fn observe_missing(
        &mut self,
        snapshot: PrefetchSnapshot,
        missing: &[usize],
    ) -> Option<&PrefetchSnapshot> {
        if !self.is_idle() || missing.is_empty() {
            return None;
        }
        self.phase = PrefetchPhase::Scheduled;
        self.snapshot = Some(snapshot);
        Some(self.snapshot.as_ref().unwrap())
    }

    /// `Scheduled -> InFlight`: builds the buffered request (2x viewport)
    /// around the missing range and marks the request as issued.
    pub fn schedule(&mut self, first_missing: usize, last_missing: usize) -> Option<PrefetchRequest> {
        if self.phase != PrefetchPhase::Scheduled {
            return None;
        }
        let rows = self.snapshot.map(|s| s.rows as usize).unwrap_or(0);
        let start = first_missing.saturating_sub(rows * 2);
        let count = (last_missing - first_missing + 1) + rows * 2;
        let request = PrefetchRequest { start, count };
        self.phase = PrefetchPhase::InFlight;
        self.pending_request = Some(request);
        Some(request)
    }

    /// While `InFlight`, a newly-observed gap replaces the pending slot
    /// rather than issuing a second request — only the latest survives.
    pub fn superseded_by(&mut self, missing: &[usize]) {
        if self.phase == PrefetchPhase::InFlight && !missing.is_empty() {
            self.pending_request = None;
        }
    }

    /// `InFlight -> Idle`. `current` is the live viewport state at reply
    /// time; `rows` are the absolute offsets the reply actually covered.
    pub fn on_reply(&mut self, current: PrefetchSnapshot, rows: Vec<usize>) -> PrefetchOutcome {
        self.phase = PrefetchPhase::Idle;
        self.pending_request = None;
        match self.snapshot.take() {
            Some(snapshot) if snapshot == current => PrefetchOutcome::Applied(rows),
            _ => PrefetchOutcome::Mismatch,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefetch_lifecycle_schedules_buffered_request() {
        let mut p = Prefetcher::new();
        let snapshot = PrefetchSnapshot {
            viewport_offset: 300,
            scrollback_length: 1000,
            rows: 24,
        };
        let missing: Vec<usize> = (676..700).collect();
        p.observe_missing(snapshot, &missing).unwrap();
        let req = p.schedule(676, 699).unwrap();
        assert_eq!(req, PrefetchRequest { start: 628, count: 72 });
    }

    #[test]
    fn mismatched_reply_is_not_applied() {
        let mut p = Prefetcher::new();
        let snapshot = PrefetchSnapshot {
            viewport_offset: 300,
            scrollback_length: 1000,
            rows: 24,
        };
        p.observe_missing(snapshot, &[676]).unwrap();
        p.schedule(676, 699).unwrap();

        let changed = PrefetchSnapshot {
            scrollback_length: 1003,
            ..snapshot
        };
        assert!(matches!(p.on_reply(changed, vec![]), PrefetchOutcome::Mismatch));
        assert!(p.is_idle());
    }

    #[test]
    fn matching_reply_applies_rows() {
        let mut p = Prefetcher::new();
        let snapshot = PrefetchSnapshot {
            viewport_offset: 10,
            scrollback_length: 100,
            rows: 24,
        };
        p.observe_missing(snapshot, &[50]).unwrap();
        p.schedule(50, 50).unwrap();
        match p.on_reply(snapshot, vec![50, 51]) {
            PrefetchOutcome::Applied(rows) => assert_eq!(rows, vec![50, 51]),
            PrefetchOutcome::Mismatch => panic!("expected applied"),
        }
    }

    #[test]
    fn only_one_request_in_flight_at_a_time() {
        let mut p = Prefetcher::new();
        let snapshot = PrefetchSnapshot {
            viewport_offset: 0,
            scrollback_length: 10,
            rows: 5,
        };
        assert!(p.observe_missing(snapshot, &[1]).is_some());
        p.schedule(1, 1).unwrap();
        // Already in flight: a second observe_missing is ignored.
        assert!(p.observe_missing(snapshot, &[2]).is_none());
    }

    #[test]
    fn cursor_move_marks_both_old_and_new_row_dirty() {
        let mut tracker = DirtyTracker::new(24);
        tracker.clear();
        tracker.on_cursor_moved(3);
        assert!(tracker.is_row_dirty(3));
        tracker.clear();
        tracker.on_cursor_moved(5);
        assert!(tracker.is_row_dirty(3));
        assert!(tracker.is_row_dirty(5));
    }
}
