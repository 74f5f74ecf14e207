use unicode_segmentation::UnicodeSegmentation;

/// Controls how a sensitive line is echoed and whether it reaches history.
pub trait MaskingCallback: Send {
    /// The string to display in place of the buffer. An empty string echoes
    /// nothing at all.
    fn display(&self, line: &str) -> String;

    /// The string to store in history, or `None` to keep the line out of
    /// history entirely.
    fn history(&self, _line: &str) -> Option<String> {
        None
    }
}

/// Masks every grapheme with a fixed character, or echoes nothing when no
/// character is given.
#[derive(Debug, Clone, Copy)]
pub struct CharMask {
    mask: Option<char>,
}

impl CharMask {
    pub fn new(mask: char) -> Self {
        CharMask { mask: Some(mask) }
    }

    /// Suppress the echo completely.
    pub fn hidden() -> Self {
        CharMask { mask: None }
    }
}

impl MaskingCallback for CharMask {
    fn display(&self, line: &str) -> String {
        match self.mask {
            Some(mask) => line
                .graphemes(true)
                .map(|g| if g == "\n" { '\n' } else { mask })
                .collect(),
            None => String::new(),
        }
    }
}
