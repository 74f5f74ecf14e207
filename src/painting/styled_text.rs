use nu_ansi_term::Style;
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

/// One screen cell: a grapheme cluster (or a zero-width escape sequence)
/// with its style and column width.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub text: String,
    pub style: Style,
    pub width: u8,
}

impl Cell {
    pub fn new(text: impl Into<String>, style: Style) -> Self {
        let text = text.into();
        let width = text.width() as u8;
        Cell { text, style, width }
    }

    /// A cell that occupies no columns (embedded escape sequences).
    pub fn zero_width(text: impl Into<String>, style: Style) -> Self {
        Cell {
            text: text.into(),
            style,
            width: 0,
        }
    }
}

/// Attributed text as a run vector of `(Style, String)` pairs.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StyledText {
    buffer: Vec<(Style, String)>,
}

impl StyledText {
    pub const fn new() -> Self {
        StyledText { buffer: vec![] }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        let mut styled = Self::new();
        styled.push(Style::new(), text.into());
        styled
    }

    pub fn push(&mut self, style: Style, text: String) {
        if !text.is_empty() || self.buffer.is_empty() {
            self.buffer.push((style, text));
        }
    }

    pub fn append(&mut self, other: StyledText) {
        self.buffer.extend(other.buffer);
    }

    pub fn runs(&self) -> &[(Style, String)] {
        &self.buffer
    }

    pub fn raw_string(&self) -> String {
        self.buffer.iter().map(|(_, text)| text.as_str()).collect()
    }

    pub fn width(&self) -> usize {
        self.buffer.iter().map(|(_, text)| text.width()).sum()
    }

    /// Restyle the byte range `from..to` of the raw string.
    pub fn style_range(&mut self, from: usize, to: usize, new_style: Style) {
        let (from, to) = if from > to { (to, from) } else { (from, to) };
        let mut rebuilt: Vec<(Style, String)> = Vec::with_capacity(self.buffer.len() + 2);
        let mut offset = 0;
        for (style, text) in self.buffer.drain(..) {
            let end = offset + text.len();
            if end <= from || offset >= to {
                rebuilt.push((style, text));
            } else {
                let cut_a = from.saturating_sub(offset).min(text.len());
                let cut_b = to.saturating_sub(offset).min(text.len());
                if cut_a > 0 {
                    rebuilt.push((style, text[..cut_a].to_string()));
                }
                if cut_b > cut_a {
                    rebuilt.push((new_style, text[cut_a..cut_b].to_string()));
                }
                if cut_b < text.len() {
                    rebuilt.push((style, text[cut_b..].to_string()));
                }
            }
            offset = end;
        }
        self.buffer = rebuilt;
    }

    /// Explode into per-grapheme cells.
    pub fn cells(&self) -> Vec<Cell> {
        let mut cells = Vec::new();
        for (style, text) in &self.buffer {
            for grapheme in text.graphemes(true) {
                cells.push(Cell::new(grapheme, *style));
            }
        }
        cells
    }
}

/// Cells of a string that may contain raw ANSI escape sequences; escapes
/// become zero-width cells so their columns are not counted.
pub fn cells_of_ansi_str(text: &str, style: Style) -> Vec<Cell> {
    let mut cells = Vec::new();
    let mut rest = text;
    while let Some(esc) = rest.find('\x1b') {
        for grapheme in rest[..esc].graphemes(true) {
            cells.push(Cell::new(grapheme, style));
        }
        rest = &rest[esc..];
        let end = escape_len(rest);
        cells.push(Cell::zero_width(&rest[..end], style));
        rest = &rest[end..];
    }
    for grapheme in rest.graphemes(true) {
        cells.push(Cell::new(grapheme, style));
    }
    cells
}

/// Byte length of the escape sequence starting at the front of `text`
/// (which begins with ESC).
fn escape_len(text: &str) -> usize {
    let bytes = text.as_bytes();
    if bytes.len() < 2 {
        return 1;
    }
    match bytes[1] {
        b'[' => {
            // CSI: parameters then a final byte in 0x40..=0x7e
            for (i, b) in bytes.iter().enumerate().skip(2) {
                if (0x40..=0x7e).contains(b) {
                    return i + 1;
                }
            }
            bytes.len()
        }
        b']' => {
            // OSC: terminated by BEL or ST
            for (i, b) in bytes.iter().enumerate().skip(2) {
                if *b == 0x07 {
                    return i + 1;
                }
                if *b == 0x1b && bytes.get(i + 1) == Some(&b'\\') {
                    return i + 2;
                }
            }
            bytes.len()
        }
        _ => 2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nu_ansi_term::Color;
    use pretty_assertions::assert_eq;

    #[test]
    fn style_range_splits_runs() {
        let mut styled = StyledText::plain("hello world");
        let green = Style::new().fg(Color::Green);
        styled.style_range(6, 11, green);
        assert_eq!(styled.raw_string(), "hello world");
        assert_eq!(styled.runs().len(), 2);
        assert_eq!(styled.runs()[1], (green, "world".to_string()));
    }

    #[test]
    fn cells_split_graphemes_with_widths() {
        let styled = StyledText::plain("a日");
        let cells = styled.cells();
        assert_eq!(cells.len(), 2);
        assert_eq!(cells[0].width, 1);
        assert_eq!(cells[1].width, 2);
    }

    #[test]
    fn ansi_cells_have_zero_width() {
        let cells = cells_of_ansi_str("\x1b[1m>\x1b[0m ", Style::new());
        let total: usize = cells.iter().map(|c| c.width as usize).sum();
        assert_eq!(total, 2);
        assert_eq!(cells[0].width, 0);
        assert_eq!(cells[0].text, "\x1b[1m");
    }

    #[test]
    fn width_ignores_nothing_for_plain_text() {
        assert_eq!(StyledText::plain("abc").width(), 3);
    }
}
