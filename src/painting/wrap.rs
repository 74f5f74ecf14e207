use super::styled_text::Cell;

/// Maps visible cell widths to screen rows under a fixed terminal width.
///
/// With `delay_wrap` the terminal is assumed to hold the cursor on the last
/// column until the next glyph arrives, so text that exactly fills its rows
/// occupies exactly that many rows. Without it (the common eager-wrap case)
/// an exact fill spills a trailing empty row that the model must account
/// for, or painted state and screen state drift apart.
#[derive(Debug, Clone, Copy)]
pub struct WrapModel {
    pub width: usize,
    pub delay_wrap: bool,
}

impl WrapModel {
    pub fn new(width: usize, delay_wrap: bool) -> Self {
        WrapModel {
            width: width.max(1),
            delay_wrap,
        }
    }

    /// Screen rows occupied by `k` visible cells starting at column zero.
    pub fn rows_for_width(&self, k: usize) -> usize {
        if k == 0 {
            return 1;
        }
        let rows = k.div_ceil(self.width);
        if !self.delay_wrap && k % self.width == 0 {
            rows + 1
        } else {
            rows
        }
    }

    /// Wrap cells into rows, the first row starting at `first_col`.
    ///
    /// A wide cell that does not fit at the end of a row moves whole to the
    /// next row.
    pub fn wrap(&self, first_col: usize, cells: &[Cell]) -> Vec<Vec<Cell>> {
        let mut rows: Vec<Vec<Cell>> = vec![Vec::new()];
        let mut col = first_col.min(self.width);
        for cell in cells {
            let w = cell.width as usize;
            if col + w > self.width && w > 0 {
                rows.push(Vec::new());
                col = 0;
            }
            col += w;
            rows.last_mut().unwrap().push(cell.clone());
        }
        if !self.delay_wrap && col == self.width {
            rows.push(Vec::new());
        }
        rows
    }

    /// Screen position of the cell at `index` (or of the end position when
    /// `index == cells.len()`), first row starting at `first_col`.
    pub fn position(&self, first_col: usize, cells: &[Cell], index: usize) -> (usize, usize) {
        let mut row = 0;
        let mut col = first_col.min(self.width);
        for cell in cells.iter().take(index) {
            let w = cell.width as usize;
            if col + w > self.width && w > 0 {
                row += 1;
                col = 0;
            }
            col += w;
        }
        if col >= self.width && !self.delay_wrap {
            row += 1;
            col = 0;
        }
        (row, col)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nu_ansi_term::Style;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use rstest::rstest;

    fn cells(text: &str) -> Vec<Cell> {
        crate::painting::StyledText::plain(text).cells()
    }

    #[rstest]
    #[case(0, 1)]
    #[case(1, 1)]
    #[case(9, 1)]
    #[case(10, 2)] // exact fill spills a trailing empty row
    #[case(11, 2)]
    #[case(20, 3)]
    fn eager_wrap_row_counts(#[case] k: usize, #[case] rows: usize) {
        let model = WrapModel::new(10, false);
        assert_eq!(model.rows_for_width(k), rows);
    }

    #[rstest]
    #[case(10, 1)]
    #[case(20, 2)]
    #[case(21, 3)]
    fn delayed_wrap_row_counts(#[case] k: usize, #[case] rows: usize) {
        let model = WrapModel::new(10, true);
        assert_eq!(model.rows_for_width(k), rows);
    }

    #[test]
    fn wide_cell_moves_whole_to_next_row() {
        let model = WrapModel::new(4, true);
        let rows = model.wrap(0, &cells("abc日"));
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].len(), 3);
        assert_eq!(rows[1][0].text, "日");
    }

    #[test]
    fn first_col_offsets_the_first_row() {
        let model = WrapModel::new(5, true);
        // Prompt takes 3 cols, so only 2 cells fit on the first row
        let rows = model.wrap(3, &cells("abcd"));
        assert_eq!(rows[0].len(), 2);
        assert_eq!(rows[1].len(), 2);
    }

    #[test]
    fn position_tracks_wrap_points() {
        let model = WrapModel::new(5, true);
        let cs = cells("abcdefgh");
        assert_eq!(model.position(0, &cs, 0), (0, 0));
        assert_eq!(model.position(0, &cs, 4), (0, 4));
        assert_eq!(model.position(0, &cs, 5), (1, 0));
        assert_eq!(model.position(0, &cs, 8), (1, 3));
    }

    #[test]
    fn zero_width_cells_do_not_advance() {
        let model = WrapModel::new(5, true);
        let mut cs = vec![Cell::zero_width("\x1b[1m", Style::new())];
        cs.extend(cells("ab"));
        assert_eq!(model.position(0, &cs, 3), (0, 2));
    }

    proptest! {
        #[test]
        fn rows_match_ceiling_formula(k in 0usize..500, w in 1usize..120) {
            let eager = WrapModel::new(w, false);
            let delayed = WrapModel::new(w, true);
            let expect_delayed = if k == 0 { 1 } else { k.div_ceil(w) };
            let expect_eager = if k > 0 && k % w == 0 {
                expect_delayed + 1
            } else {
                expect_delayed
            };
            prop_assert_eq!(delayed.rows_for_width(k), expect_delayed);
            prop_assert_eq!(eager.rows_for_width(k), expect_eager);
        }
    }
}
