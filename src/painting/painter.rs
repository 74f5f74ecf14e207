use std::cmp::Ordering;
use std::io::{self, Write};

use crossterm::{
    cursor::{MoveDown, MoveRight, MoveToColumn, MoveUp},
    terminal::{Clear, ClearType},
    QueueableCommand,
};
use nu_ansi_term::Style;

use super::{styled_text::Cell, wrap::WrapModel};
use crate::terminal::{Capability, Terminal};

/// Differential screen painter.
///
/// Owns the last painted rows and the cursor position relative to the top
/// of the painted block. All motion is relative (plus column addressing),
/// so the block may scroll as a unit without invalidating the model; the
/// block is windowed to the usable screen height for the same reason.
#[derive(Debug)]
pub struct Painter {
    old_rows: Vec<Vec<Cell>>,
    /// Cursor position relative to the block start
    cursor: (usize, usize),
    /// Rows of the block that exist on screen
    painted_rows: usize,
    dirty: bool,
}

impl Default for Painter {
    fn default() -> Self {
        Self::new()
    }
}

impl Painter {
    pub fn new() -> Self {
        Painter {
            old_rows: Vec::new(),
            cursor: (0, 0),
            painted_rows: 1,
            dirty: false,
        }
    }

    /// Forget all painted state; the next update repaints from scratch at
    /// the current cursor position.
    pub fn reset(&mut self) {
        self.old_rows.clear();
        self.cursor = (0, 0);
        self.painted_rows = 1;
        self.dirty = false;
    }

    /// Force a full repaint on the next update (resize, failed flush).
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Reconcile the screen with `new_rows`, emitting as little as
    /// possible. Identical input with an unchanged cursor emits nothing.
    pub fn update(
        &mut self,
        term: &mut dyn Terminal,
        wrap: WrapModel,
        height: usize,
        mut new_rows: Vec<Vec<Cell>>,
        mut cursor: (usize, usize),
        flush: bool,
    ) -> io::Result<()> {
        let height = height.max(1);

        // Window the block to the usable height, keeping the cursor visible
        if new_rows.len() > height {
            let start = cursor.0.saturating_sub(height - 1).min(new_rows.len() - height);
            new_rows.drain(..start);
            new_rows.truncate(height);
            cursor.0 -= start;
            cursor.0 = cursor.0.min(height - 1);
        }

        if !self.dirty && new_rows == self.old_rows && cursor == self.cursor {
            return Ok(());
        }

        let mut out: Vec<u8> = Vec::new();
        let use_column_addressing = term.supports(Capability::CursorAddress);

        if self.dirty {
            self.queue_move_to(&mut out, 0, 0, use_column_addressing)?;
            out.queue(Clear(ClearType::FromCursorDown))?;
            self.old_rows.clear();
            self.dirty = false;
        }

        let row_count = new_rows.len().max(self.old_rows.len());
        for row in 0..row_count {
            let empty: Vec<Cell> = Vec::new();
            let old_row = self.old_rows.get(row).unwrap_or(&empty);
            let new_row = new_rows.get(row).unwrap_or(&empty);
            if old_row == new_row {
                continue;
            }

            let old_width: usize = old_row.iter().map(|c| c.width as usize).sum();
            let new_width: usize = new_row.iter().map(|c| c.width as usize).sum();

            // Common prefix is always safe to skip; the common suffix only
            // keeps its columns when both rows have the same total width.
            let mut prefix = 0;
            while prefix < old_row.len()
                && prefix < new_row.len()
                && old_row[prefix] == new_row[prefix]
            {
                prefix += 1;
            }
            let mut suffix = 0;
            if old_width == new_width {
                while suffix < old_row.len() - prefix
                    && suffix < new_row.len() - prefix
                    && old_row[old_row.len() - 1 - suffix] == new_row[new_row.len() - 1 - suffix]
                {
                    suffix += 1;
                }
            }

            let prefix_col: usize = new_row[..prefix].iter().map(|c| c.width as usize).sum();
            self.ensure_row(&mut out, row, use_column_addressing)?;
            self.queue_move_to(&mut out, row, prefix_col, use_column_addressing)?;

            let middle = &new_row[prefix..new_row.len() - suffix];
            let middle_width = self.queue_cells(&mut out, middle)?;
            let end_col = prefix_col + middle_width;
            self.cursor = (row, end_col);
            if !wrap.delay_wrap && end_col >= wrap.width && suffix == 0 {
                // Eager terminals have already moved on
                self.cursor = (row + 1, 0);
                if self.painted_rows <= row + 1 {
                    self.painted_rows = row + 2;
                }
            }

            if suffix == 0 && new_width < old_width {
                out.queue(Clear(ClearType::UntilNewLine))?;
            }
        }

        self.ensure_row(&mut out, cursor.0, use_column_addressing)?;
        self.queue_move_to(&mut out, cursor.0, cursor.1, use_column_addressing)?;

        term.write_all(&out)?;
        if flush {
            term.flush()?;
        }

        self.old_rows = new_rows;
        self.cursor = cursor;
        Ok(())
    }

    /// Print foreign text above the prompt block. The block is erased, the
    /// text scrolls in above it, and painted state resets so the next
    /// update repaints the prompt below the text.
    pub fn print_above(&mut self, term: &mut dyn Terminal, text: &str) -> io::Result<()> {
        let mut out: Vec<u8> = Vec::new();
        let use_column_addressing = term.supports(Capability::CursorAddress);
        self.queue_move_to(&mut out, 0, 0, use_column_addressing)?;
        out.queue(Clear(ClearType::FromCursorDown))?;
        for line in text.lines() {
            out.write_all(line.as_bytes())?;
            out.write_all(b"\r\n")?;
        }
        term.write_all(&out)?;
        term.flush()?;
        self.reset();
        Ok(())
    }

    /// Leave the painted block behind: cursor to the end of the last row
    /// and a fresh line below it (or erase the block entirely).
    pub fn finish(&mut self, term: &mut dyn Terminal, erase: bool) -> io::Result<()> {
        let mut out: Vec<u8> = Vec::new();
        let use_column_addressing = term.supports(Capability::CursorAddress);
        if erase {
            self.queue_move_to(&mut out, 0, 0, use_column_addressing)?;
            out.queue(Clear(ClearType::FromCursorDown))?;
        } else {
            let last = self.old_rows.len().saturating_sub(1);
            self.ensure_row(&mut out, last, use_column_addressing)?;
            let last_col: usize = self
                .old_rows
                .last()
                .map(|r| r.iter().map(|c| c.width as usize).sum())
                .unwrap_or(0);
            self.queue_move_to(&mut out, last, last_col, use_column_addressing)?;
            out.write_all(b"\r\n")?;
        }
        term.write_all(&out)?;
        term.flush()?;
        self.reset();
        Ok(())
    }

    /// Clear the whole screen and repaint from the top on the next update.
    pub fn clear_screen(&mut self, term: &mut dyn Terminal) -> io::Result<()> {
        term.write_all(b"\x1b[2J\x1b[H")?;
        term.flush()?;
        self.reset();
        Ok(())
    }

    fn ensure_row(
        &mut self,
        out: &mut Vec<u8>,
        row: usize,
        use_column_addressing: bool,
    ) -> io::Result<()> {
        while self.painted_rows <= row {
            let last = self.painted_rows - 1;
            self.queue_move_to(out, last, 0, use_column_addressing)?;
            out.write_all(b"\r\n")?;
            self.painted_rows += 1;
            self.cursor = (self.painted_rows - 1, 0);
        }
        Ok(())
    }

    fn queue_move_to(
        &mut self,
        out: &mut Vec<u8>,
        row: usize,
        col: usize,
        use_column_addressing: bool,
    ) -> io::Result<()> {
        match row.cmp(&self.cursor.0) {
            Ordering::Greater => {
                out.queue(MoveDown((row - self.cursor.0) as u16))?;
            }
            Ordering::Less => {
                out.queue(MoveUp((self.cursor.0 - row) as u16))?;
            }
            Ordering::Equal => {}
        }
        if col != self.cursor.1 || row != self.cursor.0 {
            if use_column_addressing {
                out.queue(MoveToColumn(col as u16))?;
            } else {
                out.write_all(b"\r")?;
                if col > 0 {
                    out.queue(MoveRight(col as u16))?;
                }
            }
        }
        self.cursor = (row, col);
        Ok(())
    }

    /// Write cells, grouping runs of equal style, resetting at style
    /// boundaries. Returns the total visible width written.
    fn queue_cells(&mut self, out: &mut Vec<u8>, cells: &[Cell]) -> io::Result<usize> {
        let mut width = 0;
        let mut i = 0;
        while i < cells.len() {
            let style = cells[i].style;
            let mut text = String::new();
            while i < cells.len() && cells[i].style == style {
                text.push_str(&cells[i].text);
                width += cells[i].width as usize;
                i += 1;
            }
            if style == Style::default() {
                out.write_all(text.as_bytes())?;
            } else {
                write!(out, "{}{}{}", style.prefix(), text, style.suffix())?;
            }
        }
        Ok(width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::painting::StyledText;
    use crate::terminal::ScriptedTerminal;
    use pretty_assertions::assert_eq;

    fn rows(lines: &[&str]) -> Vec<Vec<Cell>> {
        lines
            .iter()
            .map(|l| StyledText::plain(*l).cells())
            .collect()
    }

    fn wrap() -> WrapModel {
        WrapModel::new(80, true)
    }

    #[test]
    fn first_update_paints_everything() {
        let mut term = ScriptedTerminal::new();
        let mut painter = Painter::new();
        painter
            .update(&mut term, wrap(), 24, rows(&["> hello"]), (0, 7), true)
            .unwrap();
        assert_eq!(term.output_text(), "> hello");
    }

    #[test]
    fn identical_update_emits_nothing() {
        let mut term = ScriptedTerminal::new();
        let mut painter = Painter::new();
        let r = rows(&["> hello"]);
        painter
            .update(&mut term, wrap(), 24, r.clone(), (0, 7), true)
            .unwrap();
        term.take_output();
        painter
            .update(&mut term, wrap(), 24, r, (0, 7), true)
            .unwrap();
        assert_eq!(term.output(), b"");
    }

    #[test]
    fn appending_a_char_only_writes_the_tail() {
        let mut term = ScriptedTerminal::new();
        let mut painter = Painter::new();
        painter
            .update(&mut term, wrap(), 24, rows(&["> hell"]), (0, 6), true)
            .unwrap();
        term.take_output();
        painter
            .update(&mut term, wrap(), 24, rows(&["> hello"]), (0, 7), true)
            .unwrap();
        let text = term.output_text();
        assert!(text.contains('o'));
        assert!(!text.contains("hell"), "prefix was rewritten: {text:?}");
    }

    #[test]
    fn shrinking_a_row_clears_the_leftover() {
        let mut term = ScriptedTerminal::new();
        let mut painter = Painter::new();
        painter
            .update(&mut term, wrap(), 24, rows(&["> hello"]), (0, 7), true)
            .unwrap();
        term.take_output();
        painter
            .update(&mut term, wrap(), 24, rows(&["> h"]), (0, 3), true)
            .unwrap();
        // clr_eol
        assert!(String::from_utf8_lossy(&term.output()).contains("\x1b[K"));
    }

    #[test]
    fn dropping_a_row_blanks_it() {
        let mut term = ScriptedTerminal::new();
        let mut painter = Painter::new();
        painter
            .update(&mut term, wrap(), 24, rows(&["> one", "two"]), (1, 3), true)
            .unwrap();
        term.take_output();
        painter
            .update(&mut term, wrap(), 24, rows(&["> one"]), (0, 5), true)
            .unwrap();
        assert!(String::from_utf8_lossy(&term.output()).contains("\x1b[K"));
    }

    #[test]
    fn window_keeps_cursor_visible() {
        let mut term = ScriptedTerminal::new();
        let mut painter = Painter::new();
        let many: Vec<String> = (0..10).map(|i| format!("line{i}")).collect();
        let refs: Vec<&str> = many.iter().map(String::as_str).collect();
        painter
            .update(&mut term, wrap(), 4, rows(&refs), (9, 5), true)
            .unwrap();
        let text = term.output_text();
        assert!(text.contains("line9"));
        assert!(!text.contains("line0"));
    }

    #[test]
    fn print_above_erases_block_and_resets() {
        let mut term = ScriptedTerminal::new();
        let mut painter = Painter::new();
        painter
            .update(&mut term, wrap(), 24, rows(&["> cmd"]), (0, 5), true)
            .unwrap();
        term.take_output();
        painter.print_above(&mut term, "note").unwrap();
        painter
            .update(&mut term, wrap(), 24, rows(&["> cmd"]), (0, 5), true)
            .unwrap();
        let text = term.output_text();
        assert!(text.contains("note"));
        assert!(text.contains("> cmd"));
    }
}
