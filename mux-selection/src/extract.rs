use mux_cells::Cell;

use crate::range::SelectionRange;

/// Renders one row's selected span to text, skipping the spacer cell that
/// trails a wide (double-width) character so it isn't duplicated.
fn extract_row(row: &[Cell], start: u16, end: u16) -> String {
    let mut line = String::with_capacity((end - start + 1) as usize);
    let mut skip_next = false;
    for cell in &row[start as usize..=(end as usize).min(row.len().saturating_sub(1))] {
        if skip_next {
            skip_next = false;
            continue;
        }
        line.push(cell.ch);
        skip_next = cell.width == 2;
    }
    line
}

/// Concatenates every row's selected characters, trims trailing whitespace
/// per line, and joins with `\n` (spec §4.7).
///
/// `get_line` resolves an absolute row index to its cells, scrollback or
/// viewport alike; rows the callback can't resolve are skipped rather than
/// aborting the whole extraction.
pub fn extract_selected_text(
    range: &SelectionRange,
    mut get_line: impl FnMut(usize) -> Option<Vec<Cell>>,
) -> String {
    let mut lines = Vec::new();
    for abs_y in range.start_y_abs..=range.end_y_abs {
        let Some(row) = get_line(abs_y) else { continue };
        if row.is_empty() {
            lines.push(String::new());
            continue;
        }
        let width = row.len() as u16;
        let Some((start, end)) = range.columns_for_row(abs_y, width) else {
            continue;
        };
        lines.push(extract_row(&row, start, end).trim_end().to_string());
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point::Point;

    fn cell(ch: char) -> Cell {
        Cell { ch, ..Cell::default() }
    }

    fn row(text: &str) -> Vec<Cell> {
        text.chars().map(cell).collect()
    }

    #[test]
    fn extracts_single_line_span() {
        let range = SelectionRange::normalize(Point::new(0, 0, 0), Point::new(4, 0, 0));
        let text = extract_selected_text(&range, |y| if y == 0 { Some(row("hello world")) } else { None });
        assert_eq!(text, "hell");
    }

    #[test]
    fn trims_trailing_whitespace_per_line() {
        let range = SelectionRange::normalize(Point::new(0, 0, 0), Point::new(2, 1, 0));
        let text = extract_selected_text(&range, |y| match y {
            0 => Some(row("hi        ")),
            1 => Some(row("bye       ")),
            _ => None,
        });
        assert_eq!(text, "hi\nby");
    }

    #[test]
    fn skips_wide_trailing_spacer() {
        let wide = Cell { ch: '界', width: 2, ..Cell::default() };
        let spacer = Cell { ch: ' ', width: 1, ..Cell::default() };
        let row = vec![cell('a'), wide, spacer, cell('b'), cell('c')];
        let range = SelectionRange::normalize(Point::new(0, 0, 0), Point::new(4, 0, 0));
        let text = extract_selected_text(&range, |_| Some(row.clone()));
        assert_eq!(text, "a界b");
    }
}
