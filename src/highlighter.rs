use nu_ansi_term::{Color, Style};

use crate::painting::StyledText;

/// Turns the buffer into attributed text for display.
pub trait Highlighter: Send {
    fn highlight(&self, line: &str, cursor: usize) -> StyledText;
}

/// Highlighter that styles nothing.
#[derive(Debug, Default, Clone)]
pub struct NullHighlighter;

impl Highlighter for NullHighlighter {
    fn highlight(&self, line: &str, _cursor: usize) -> StyledText {
        let mut styled = StyledText::new();
        styled.push(Style::new(), line.to_string());
        styled
    }
}

/// Colors words found in a known-command list, the rest in a neutral style.
#[derive(Debug, Clone)]
pub struct DefaultHighlighter {
    known_words: Vec<String>,
    known_style: Style,
    neutral_style: Style,
}

impl Default for DefaultHighlighter {
    fn default() -> Self {
        Self::new(vec![])
    }
}

impl DefaultHighlighter {
    pub fn new(known_words: Vec<String>) -> Self {
        DefaultHighlighter {
            known_words,
            known_style: Style::new().fg(Color::Green),
            neutral_style: Style::new(),
        }
    }

    pub fn with_known_style(mut self, style: Style) -> Self {
        self.known_style = style;
        self
    }
}

impl Highlighter for DefaultHighlighter {
    fn highlight(&self, line: &str, _cursor: usize) -> StyledText {
        let mut styled = StyledText::new();
        let mut rest = line;
        while !rest.is_empty() {
            let word_start = rest
                .find(|c: char| !c.is_whitespace())
                .unwrap_or(rest.len());
            if word_start > 0 {
                styled.push(self.neutral_style, rest[..word_start].to_string());
                rest = &rest[word_start..];
                continue;
            }
            let word_end = rest.find(char::is_whitespace).unwrap_or(rest.len());
            let word = &rest[..word_end];
            let style = if self.known_words.iter().any(|w| w == word) {
                self.known_style
            } else {
                self.neutral_style
            };
            styled.push(style, word.to_string());
            rest = &rest[word_end..];
        }
        if line.is_empty() {
            styled.push(self.neutral_style, String::new());
        }
        styled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn known_words_get_the_known_style() {
        let hl = DefaultHighlighter::new(vec!["git".into()]);
        let styled = hl.highlight("git status", 0);
        let raw = styled.raw_string();
        assert_eq!(raw, "git status");
        assert_eq!(styled.runs()[0].1, "git");
        assert_ne!(styled.runs()[0].0, styled.runs()[2].0);
    }
}
