use std::io::{self, Write};

use nu_ansi_term::Style;
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

use super::StyledText;
use crate::terminal::{Capability, Terminal};

/// Lifecycle of the reserved status area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusState {
    #[default]
    Closed,
    Hidden,
    Shown,
    /// Updates are frozen; desired lines are recorded for `restore`
    Suspended,
}

/// Reserved rows at the bottom of the screen, carved out of the scrollable
/// area with a scroll region so the prompt never collides with them.
///
/// Every painted line is truncated with a trailing ellipsis or right-padded
/// with spaces to the full width, which doubles as erase-on-shrink.
#[derive(Debug, Default)]
pub struct StatusBar {
    lines: Vec<StyledText>,
    state: StatusState,
    border: bool,
    unsupported: bool,
    /// Rows (including border) currently painted at the bottom
    painted: usize,
}

impl StatusBar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_border(mut self, border: bool) -> Self {
        self.border = border;
        self
    }

    pub fn state(&self) -> StatusState {
        self.state
    }

    /// Rows the painter must keep its hands off.
    pub fn reserved_rows(&self) -> usize {
        if self.state == StatusState::Shown {
            self.painted
        } else {
            0
        }
    }

    /// Replace the status lines. Empty input hides the bar.
    pub fn update(&mut self, term: &mut dyn Terminal, lines: Vec<StyledText>) -> io::Result<()> {
        self.lines = lines;
        if self.state == StatusState::Suspended {
            // Frozen: remember the lines, repaint on restore
            return Ok(());
        }
        if self.lines.is_empty() {
            return self.hide(term);
        }
        self.repaint(term)
    }

    /// Erase the bar and give the rows back to the scrollable area.
    pub fn hide(&mut self, term: &mut dyn Terminal) -> io::Result<()> {
        // Erase against the previously painted rows before flipping state
        self.erase(term)?;
        if self.state != StatusState::Closed {
            self.state = StatusState::Hidden;
        }
        Ok(())
    }

    /// Freeze updates (e.g. while an external command owns the screen).
    pub fn suspend(&mut self, term: &mut dyn Terminal) -> io::Result<()> {
        self.erase(term)?;
        self.state = StatusState::Suspended;
        Ok(())
    }

    /// Replay the lines recorded while suspended.
    pub fn restore(&mut self, term: &mut dyn Terminal) -> io::Result<()> {
        if self.state == StatusState::Suspended {
            self.state = StatusState::Hidden;
            if !self.lines.is_empty() {
                return self.repaint(term);
            }
        }
        Ok(())
    }

    /// Re-derive the layout after a terminal resize.
    pub fn resize(&mut self, term: &mut dyn Terminal) -> io::Result<()> {
        if self.state == StatusState::Shown {
            self.painted = 0;
            self.repaint(term)?;
        }
        Ok(())
    }

    pub fn close(&mut self, term: &mut dyn Terminal) -> io::Result<()> {
        self.erase(term)?;
        self.lines.clear();
        self.state = StatusState::Closed;
        Ok(())
    }

    fn supported(&mut self, term: &dyn Terminal) -> bool {
        if self.unsupported || !term.supports(Capability::ScrollRegion) {
            return false;
        }
        let (cols, rows) = term.size();
        if cols == 0 || rows == 0 || rows >= 1000 {
            self.unsupported = true;
            return false;
        }
        true
    }

    fn repaint(&mut self, term: &mut dyn Terminal) -> io::Result<()> {
        if !self.supported(term) {
            return Ok(());
        }
        let (cols, rows) = term.size();
        let (cols, rows) = (cols as usize, rows as usize);
        let wanted = self.lines.len() + usize::from(self.border);
        if wanted + 1 >= rows {
            return self.hide(term);
        }

        let mut out: Vec<u8> = Vec::new();
        term.save_cursor()?;
        // Shrink the scrollable area; DECSTBM is 1-based and inclusive
        write!(out, "\x1b[1;{}r", rows - wanted)?;

        // Rows that used to belong to the bar but no longer do
        if self.painted > wanted {
            for row in (rows - self.painted)..(rows - wanted) {
                write!(out, "\x1b[{};1H\x1b[K", row + 1)?;
            }
        }

        let mut row = rows - wanted;
        if self.border {
            write!(out, "\x1b[{};1H", row + 1)?;
            out.write_all("─".repeat(cols).as_bytes())?;
            row += 1;
        }
        for line in &self.lines {
            write!(out, "\x1b[{};1H", row + 1)?;
            out.write_all(render_status_line(line, cols).as_bytes())?;
            row += 1;
        }

        term.write_all(&out)?;
        term.restore_cursor()?;
        term.flush()?;
        self.painted = wanted;
        self.state = StatusState::Shown;
        Ok(())
    }

    fn erase(&mut self, term: &mut dyn Terminal) -> io::Result<()> {
        if self.painted == 0 || !self.supported(term) {
            self.painted = 0;
            return Ok(());
        }
        let (_, rows) = term.size();
        let rows = rows as usize;
        let mut out: Vec<u8> = Vec::new();
        term.save_cursor()?;
        for row in (rows - self.painted)..rows {
            write!(out, "\x1b[{};1H\x1b[K", row + 1)?;
        }
        // Scroll region back to the full screen
        out.write_all(b"\x1b[r")?;
        term.write_all(&out)?;
        term.restore_cursor()?;
        term.flush()?;
        self.painted = 0;
        Ok(())
    }
}

/// Render one status line to exactly `cols` columns: over-long input is cut
/// with a trailing ellipsis, short input padded with spaces.
fn render_status_line(line: &StyledText, cols: usize) -> String {
    let limit = if line.width() > cols {
        cols.saturating_sub(1)
    } else {
        cols
    };
    let mut out = String::new();
    let mut width = 0;
    'runs: for (style, text) in line.runs() {
        let styled = *style != Style::default();
        if styled {
            out.push_str(&style.prefix().to_string());
        }
        for grapheme in text.graphemes(true) {
            let w = grapheme.width();
            if width + w > limit {
                if styled {
                    out.push_str(&style.suffix().to_string());
                }
                break 'runs;
            }
            out.push_str(grapheme);
            width += w;
        }
        if styled {
            out.push_str(&style.suffix().to_string());
        }
    }
    if limit < cols && width < cols {
        out.push('…');
        width += 1;
    }
    while width < cols {
        out.push(' ');
        width += 1;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terminal::ScriptedTerminal;
    use pretty_assertions::assert_eq;

    fn lines(texts: &[&str]) -> Vec<StyledText> {
        texts.iter().map(|t| StyledText::plain(*t)).collect()
    }

    #[test]
    fn update_shows_and_reserves_rows() {
        let mut term = ScriptedTerminal::with_size(40, 10);
        let mut bar = StatusBar::new();
        bar.update(&mut term, lines(&["mode: insert", "file: a.txt"]))
            .unwrap();
        assert_eq!(bar.state(), StatusState::Shown);
        assert_eq!(bar.reserved_rows(), 2);
        let raw = String::from_utf8_lossy(&term.output()).to_string();
        // Scroll region carved to the top 8 rows
        assert!(raw.contains("\x1b[1;8r"), "{raw:?}");
        assert!(raw.contains("mode: insert"));
    }

    #[test]
    fn empty_update_hides() {
        let mut term = ScriptedTerminal::with_size(40, 10);
        let mut bar = StatusBar::new();
        bar.update(&mut term, lines(&["x"])).unwrap();
        bar.update(&mut term, vec![]).unwrap();
        assert_eq!(bar.state(), StatusState::Hidden);
        assert_eq!(bar.reserved_rows(), 0);
        // Region restored to full screen
        assert!(String::from_utf8_lossy(&term.output()).contains("\x1b[r"));
    }

    #[test]
    fn lines_pad_to_full_width() {
        let rendered = render_status_line(&StyledText::plain("hi"), 8);
        assert_eq!(rendered, "hi      ");
    }

    #[test]
    fn long_lines_truncate_with_ellipsis() {
        let rendered = render_status_line(&StyledText::plain("abcdefghij"), 6);
        assert_eq!(rendered, "abcde…");
    }

    #[test]
    fn suspend_freezes_and_restore_replays() {
        let mut term = ScriptedTerminal::with_size(40, 10);
        let mut bar = StatusBar::new();
        bar.update(&mut term, lines(&["one"])).unwrap();
        bar.suspend(&mut term).unwrap();
        assert_eq!(bar.state(), StatusState::Suspended);
        term.take_output();

        // Updates while suspended only record desired lines
        bar.update(&mut term, lines(&["two"])).unwrap();
        assert_eq!(term.output(), b"");

        bar.restore(&mut term).unwrap();
        assert_eq!(bar.state(), StatusState::Shown);
        assert!(String::from_utf8_lossy(&term.output()).contains("two"));
    }

    #[test]
    fn absurd_geometry_disables_silently() {
        let mut term = ScriptedTerminal::with_size(0, 10);
        let mut bar = StatusBar::new();
        bar.update(&mut term, lines(&["x"])).unwrap();
        assert_eq!(bar.state(), StatusState::Closed);
        assert_eq!(term.output(), b"");
    }

    #[test]
    fn border_takes_an_extra_row() {
        let mut term = ScriptedTerminal::with_size(40, 10);
        let mut bar = StatusBar::new().with_border(true);
        bar.update(&mut term, lines(&["x"])).unwrap();
        assert_eq!(bar.reserved_rows(), 2);
        assert!(String::from_utf8_lossy(&term.output()).contains("─"));
    }
}
