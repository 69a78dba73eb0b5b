use mux_cells::Cell;
use mux_term::ScrollState;

/// Rows the renderer needs to read to paint a viewport: live cells when
/// `viewport_offset == 0`, scrollback cells (addressed by absolute offset)
/// otherwise. A host wires this to its worker pool's live-viewport read
/// and its scrollback LRU/prefetch reply path; this crate only consumes
/// the trait.
pub trait RowSource {
    /// Current live viewport row `y` (`y < rows`), or `None` if the
    /// session has been torn down.
    fn live_row(&self, y: u16) -> Option<Vec<Cell>>;

    /// A scrollback row at absolute offset `abs`, if it's currently
    /// cached. `None` means the caller must treat this row as missing and
    /// let the prefetch engine (spec §4.6) backfill it.
    fn scrollback_row(&self, abs: usize) -> Option<Vec<Cell>>;
}

/// Result of fetching one viewport's worth of rows (spec §4.9 step 3).
pub struct FetchedRows {
    /// `cells[y]` is `Some` for every row that was available; `None` rows
    /// are the gaps the caller must schedule a prefetch for.
    pub cells: Vec<Option<Vec<Cell>>>,
    /// Absolute scrollback offsets of the missing rows, ascending.
    pub missing_absolute: Vec<usize>,
}

/// Reads every row of a `rows x cols`-sized viewport through `source`,
/// choosing live or scrollback rows per `scroll`'s offset. Rows that come
/// back `None` from `source` are reported in `missing_absolute` so the
/// caller can feed them to `mux_term::Prefetcher::observe_missing`.
pub fn fetch_viewport(source: &dyn RowSource, scroll: ScrollState, rows: u16) -> FetchedRows {
    let mut cells = Vec::with_capacity(rows as usize);
    let mut missing_absolute = Vec::new();

    for y in 0..rows {
        if scroll.is_at_bottom {
            cells.push(source.live_row(y));
            continue;
        }
        let abs = scroll.absolute_row(y as usize);
        match source.scrollback_row(abs) {
            Some(row) => cells.push(Some(row)),
            None => {
                missing_absolute.push(abs);
                cells.push(None);
            }
        }
    }

    FetchedRows { cells, missing_absolute }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct FakeSource {
        live: HashMap<u16, Vec<Cell>>,
        scrollback: HashMap<usize, Vec<Cell>>,
    }

    impl RowSource for FakeSource {
        fn live_row(&self, y: u16) -> Option<Vec<Cell>> {
            self.live.get(&y).cloned()
        }
        fn scrollback_row(&self, abs: usize) -> Option<Vec<Cell>> {
            self.scrollback.get(&abs).cloned()
        }
    }

    #[test]
    fn reads_live_rows_at_bottom() {
        let mut live = HashMap::new();
        live.insert(0u16, vec![Cell::default()]);
        let source = FakeSource { live, scrollback: HashMap::new() };
        let scroll = ScrollState {
            viewport_offset: 0,
            scrollback_length: 100,
            is_at_bottom: true,
            is_at_scrollback_limit: false,
        };
        let fetched = fetch_viewport(&source, scroll, 1);
        assert!(fetched.cells[0].is_some());
        assert!(fetched.missing_absolute.is_empty());
    }

    #[test]
    fn reports_missing_scrollback_rows_by_absolute_offset() {
        let source = FakeSource { live: HashMap::new(), scrollback: HashMap::new() };
        let scroll = ScrollState {
            viewport_offset: 300,
            scrollback_length: 1000,
            is_at_bottom: false,
            is_at_scrollback_limit: false,
        };
        let fetched = fetch_viewport(&source, scroll, 24);
        assert_eq!(fetched.missing_absolute.len(), 24);
        assert_eq!(fetched.missing_absolute[0], scroll.absolute_row(0));
    }
}
