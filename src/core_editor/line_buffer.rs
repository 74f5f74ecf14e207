use tracing::warn;
use unicode_segmentation::UnicodeSegmentation;

/// What kind of region the mark currently delimits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RegionType {
    /// No active region
    #[default]
    None,
    /// Character-wise region between point and mark
    Char,
    /// Whole-line region
    Line,
    /// Region produced by a paste, replaceable by `yank-pop`
    Paste,
}

/// In-memory editable text with a cursor, an optional mark and an overwrite
/// flag.
///
/// Offsets are byte positions into the underlying `String`; every public
/// mutation and accessor keeps them on `char` boundaries. Out-of-range
/// positions coming from callers are clamped rather than panicking.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LineBuffer {
    buffer: String,
    insertion_point: usize,
    mark: Option<usize>,
    region_type: RegionType,
    overwrite: bool,
}

impl From<&str> for LineBuffer {
    fn from(input: &str) -> Self {
        let mut buf = LineBuffer::new();
        buf.buffer.push_str(input);
        buf.insertion_point = buf.buffer.len();
        buf
    }
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_buffer(&self) -> &str {
        &self.buffer
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn insertion_point(&self) -> usize {
        self.insertion_point
    }

    /// Move the cursor, clamping to the buffer and snapping to the nearest
    /// char boundary on the left.
    pub fn set_insertion_point(&mut self, pos: usize) {
        self.insertion_point = self.clamp(pos);
    }

    pub fn mark(&self) -> Option<usize> {
        self.mark
    }

    pub fn set_mark(&mut self, pos: usize, region_type: RegionType) {
        self.mark = Some(self.clamp(pos));
        self.region_type = region_type;
    }

    pub fn clear_mark(&mut self) {
        self.mark = None;
        self.region_type = RegionType::None;
    }

    pub fn region_type(&self) -> RegionType {
        self.region_type
    }

    pub fn swap_point_and_mark(&mut self) -> bool {
        match self.mark {
            Some(mark) => {
                self.mark = Some(self.insertion_point);
                self.insertion_point = mark;
                true
            }
            None => false,
        }
    }

    /// Point..mark (or mark..point) as an ordered byte range.
    pub fn region_range(&self) -> Option<std::ops::Range<usize>> {
        let mark = self.mark?;
        let (start, end) = if mark <= self.insertion_point {
            (mark, self.insertion_point)
        } else {
            (self.insertion_point, mark)
        };
        match self.region_type {
            RegionType::Line => {
                let start = self.start_of_line_at(start);
                let end = self.end_of_line_at(end);
                Some(start..end)
            }
            _ => Some(start..end),
        }
    }

    pub fn overwrite(&self) -> bool {
        self.overwrite
    }

    pub fn toggle_overwrite(&mut self) {
        self.overwrite = !self.overwrite;
    }

    /// Snap `pos` into the buffer and onto a char boundary. Logs when the
    /// caller was out of range since that is a programmer error.
    pub fn clamp(&self, pos: usize) -> usize {
        if pos > self.buffer.len() {
            warn!(pos, len = self.buffer.len(), "buffer position out of range, clamping");
            return self.buffer.len();
        }
        let mut pos = pos;
        while pos > 0 && !self.buffer.is_char_boundary(pos) {
            pos -= 1;
        }
        pos
    }

    pub fn substring(&self, range: std::ops::Range<usize>) -> &str {
        let start = self.clamp(range.start);
        let end = self.clamp(range.end).max(start);
        &self.buffer[start..end]
    }

    pub fn char_at(&self, pos: usize) -> Option<char> {
        self.buffer[self.clamp(pos)..].chars().next()
    }

    // --- raw mutations -----------------------------------------------------
    //
    // Only the undo machinery and the `Editor` call these; everything else
    // goes through `Editor::edit` so the operation gets logged.

    pub(crate) fn insert_at(&mut self, pos: usize, text: &str) {
        let pos = self.clamp(pos);
        self.buffer.insert_str(pos, text);
        self.insertion_point = pos + text.len();
        self.adjust_mark_after_insert(pos, text.len());
    }

    pub(crate) fn remove_range(&mut self, range: std::ops::Range<usize>) -> String {
        let start = self.clamp(range.start);
        let end = self.clamp(range.end).max(start);
        let removed: String = self.buffer.drain(start..end).collect();
        self.insertion_point = start;
        self.adjust_mark_after_remove(start, end);
        removed
    }

    fn adjust_mark_after_insert(&mut self, at: usize, len: usize) {
        if let Some(mark) = self.mark {
            if mark >= at {
                self.mark = Some(mark + len);
            }
        }
    }

    fn adjust_mark_after_remove(&mut self, start: usize, end: usize) {
        if let Some(mark) = self.mark {
            if mark >= end {
                self.mark = Some(mark - (end - start));
            } else if mark > start {
                self.mark = Some(start);
            }
        }
    }

    // --- grapheme steps ----------------------------------------------------

    pub fn grapheme_right_index(&self) -> usize {
        self.grapheme_right_index_from(self.insertion_point)
    }

    pub fn grapheme_left_index(&self) -> usize {
        self.grapheme_left_index_from(self.insertion_point)
    }

    pub fn grapheme_right_index_from(&self, pos: usize) -> usize {
        self.buffer[pos..]
            .grapheme_indices(true)
            .nth(1)
            .map(|(i, _)| pos + i)
            .unwrap_or_else(|| self.buffer.len())
    }

    pub fn grapheme_left_index_from(&self, pos: usize) -> usize {
        self.buffer[..pos]
            .grapheme_indices(true)
            .next_back()
            .map(|(i, _)| i)
            .unwrap_or(0)
    }

    // --- words -------------------------------------------------------------

    fn is_word_char(c: char, word_chars: &str) -> bool {
        c.is_alphanumeric() || word_chars.contains(c)
    }

    /// Start of the word left of the cursor.
    pub fn word_left_index(&self, word_chars: &str) -> usize {
        let mut pos = self.insertion_point;
        while pos > 0 {
            let prev = self.grapheme_left_index_from(pos);
            let c = self.buffer[prev..].chars().next().unwrap_or(' ');
            if Self::is_word_char(c, word_chars) {
                break;
            }
            pos = prev;
        }
        while pos > 0 {
            let prev = self.grapheme_left_index_from(pos);
            let c = self.buffer[prev..].chars().next().unwrap_or(' ');
            if !Self::is_word_char(c, word_chars) {
                break;
            }
            pos = prev;
        }
        pos
    }

    /// End of the word right of the cursor (readline `forward-word`).
    pub fn word_right_end_index(&self, word_chars: &str) -> usize {
        let mut pos = self.insertion_point;
        let len = self.buffer.len();
        while pos < len {
            let c = self.buffer[pos..].chars().next().unwrap_or(' ');
            if Self::is_word_char(c, word_chars) {
                break;
            }
            pos = self.grapheme_right_index_from(pos);
        }
        while pos < len {
            let c = self.buffer[pos..].chars().next().unwrap_or(' ');
            if !Self::is_word_char(c, word_chars) {
                break;
            }
            pos = self.grapheme_right_index_from(pos);
        }
        pos
    }

    /// Start of the next word (vi `w`).
    pub fn word_right_start_index(&self, word_chars: &str) -> usize {
        let mut pos = self.insertion_point;
        let len = self.buffer.len();
        let in_word = |s: &Self, p: usize| {
            s.buffer[p..]
                .chars()
                .next()
                .map(|c| Self::is_word_char(c, word_chars))
                .unwrap_or(false)
        };
        let started_in_word = in_word(self, pos);
        while pos < len && in_word(self, pos) == started_in_word && started_in_word {
            pos = self.grapheme_right_index_from(pos);
        }
        while pos < len && !in_word(self, pos) {
            pos = self.grapheme_right_index_from(pos);
        }
        pos
    }

    /// Start of the whitespace-delimited WORD left of the cursor.
    pub fn big_word_left_index(&self) -> usize {
        let mut pos = self.insertion_point;
        while pos > 0 {
            let prev = self.grapheme_left_index_from(pos);
            if !self.buffer[prev..].chars().next().unwrap_or(' ').is_whitespace() {
                break;
            }
            pos = prev;
        }
        while pos > 0 {
            let prev = self.grapheme_left_index_from(pos);
            if self.buffer[prev..].chars().next().unwrap_or(' ').is_whitespace() {
                break;
            }
            pos = prev;
        }
        pos
    }

    /// Past the end of the whitespace-delimited WORD right of the cursor.
    pub fn big_word_right_end_index(&self) -> usize {
        let mut pos = self.insertion_point;
        let len = self.buffer.len();
        while pos < len && self.buffer[pos..].chars().next().unwrap_or(' ').is_whitespace() {
            pos = self.grapheme_right_index_from(pos);
        }
        while pos < len && !self.buffer[pos..].chars().next().unwrap_or(' ').is_whitespace() {
            pos = self.grapheme_right_index_from(pos);
        }
        pos
    }

    /// Start of the next whitespace-delimited WORD (vi `W`).
    pub fn big_word_right_start_index(&self) -> usize {
        let mut pos = self.insertion_point;
        let len = self.buffer.len();
        while pos < len && !self.buffer[pos..].chars().next().unwrap_or(' ').is_whitespace() {
            pos = self.grapheme_right_index_from(pos);
        }
        while pos < len && self.buffer[pos..].chars().next().unwrap_or(' ').is_whitespace() {
            pos = self.grapheme_right_index_from(pos);
        }
        pos
    }

    /// Byte range of the word under (or before) the cursor.
    pub fn current_word_range(&self, word_chars: &str) -> std::ops::Range<usize> {
        let start = self.word_left_index(word_chars);
        let end = self.word_right_end_index(word_chars);
        start..end.max(start)
    }

    // --- logical lines -----------------------------------------------------

    pub fn start_of_line(&self) -> usize {
        self.start_of_line_at(self.insertion_point)
    }

    pub fn end_of_line(&self) -> usize {
        self.end_of_line_at(self.insertion_point)
    }

    fn start_of_line_at(&self, pos: usize) -> usize {
        self.buffer[..pos].rfind('\n').map(|i| i + 1).unwrap_or(0)
    }

    fn end_of_line_at(&self, pos: usize) -> usize {
        self.buffer[pos..]
            .find('\n')
            .map(|i| pos + i)
            .unwrap_or_else(|| self.buffer.len())
    }

    /// First non-blank character of the current line (vi `^`).
    pub fn first_non_blank_of_line(&self) -> usize {
        let start = self.start_of_line();
        let end = self.end_of_line();
        self.buffer[start..end]
            .char_indices()
            .find(|(_, c)| !c.is_whitespace())
            .map(|(i, _)| start + i)
            .unwrap_or(start)
    }

    /// Zero-based index of the line the cursor is on.
    pub fn line(&self) -> usize {
        self.buffer[..self.insertion_point].matches('\n').count()
    }

    pub fn num_lines(&self) -> usize {
        self.buffer.matches('\n').count() + 1
    }

    pub fn is_cursor_at_first_line(&self) -> bool {
        self.line() == 0
    }

    pub fn is_cursor_at_last_line(&self) -> bool {
        self.line() == self.num_lines() - 1
    }

    /// Cursor target one line up, keeping the column where possible.
    pub fn line_up_index(&self) -> Option<usize> {
        if self.is_cursor_at_first_line() {
            return None;
        }
        let col = self.insertion_point - self.start_of_line();
        let prev_end = self.start_of_line() - 1;
        let prev_start = self.start_of_line_at(prev_end);
        Some(self.clamp(prev_start + col.min(prev_end - prev_start)))
    }

    /// Cursor target one line down, keeping the column where possible.
    pub fn line_down_index(&self) -> Option<usize> {
        if self.is_cursor_at_last_line() {
            return None;
        }
        let col = self.insertion_point - self.start_of_line();
        let next_start = self.end_of_line() + 1;
        let next_end = self.end_of_line_at(next_start);
        Some(self.clamp(next_start + col.min(next_end - next_start)))
    }

    // --- character search --------------------------------------------------

    /// Index of the `count`-th occurrence of `c` right of the cursor.
    pub fn find_char_right(&self, c: char, count: usize) -> Option<usize> {
        let from = self.grapheme_right_index();
        self.buffer[from..]
            .char_indices()
            .filter(|(_, ch)| *ch == c)
            .nth(count.saturating_sub(1))
            .map(|(i, _)| from + i)
    }

    /// Index of the `count`-th occurrence of `c` left of the cursor.
    pub fn find_char_left(&self, c: char, count: usize) -> Option<usize> {
        self.buffer[..self.insertion_point]
            .char_indices()
            .rev()
            .filter(|(_, ch)| *ch == c)
            .nth(count.saturating_sub(1))
            .map(|(i, _)| i)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn buffer_with(content: &str, cursor: usize) -> LineBuffer {
        let mut buf = LineBuffer::from(content);
        buf.set_insertion_point(cursor);
        buf
    }

    #[test]
    fn cursor_stays_within_bounds() {
        let mut buf = LineBuffer::from("abc");
        buf.set_insertion_point(99);
        assert_eq!(buf.insertion_point(), 3);
    }

    #[test]
    fn clamp_snaps_to_char_boundary() {
        // 'é' is two bytes; position 1 is inside it
        let buf = LineBuffer::from("é");
        assert_eq!(buf.clamp(1), 0);
    }

    #[rstest]
    #[case("hello world", 11, 6)]
    #[case("hello world", 6, 0)]
    #[case("  spaced  ", 10, 2)]
    fn word_left_lands_on_word_start(#[case] text: &str, #[case] cursor: usize, #[case] expected: usize) {
        let buf = buffer_with(text, cursor);
        assert_eq!(buf.word_left_index(""), expected);
    }

    #[rstest]
    #[case("hello world", 0, 5)]
    #[case("hello world", 5, 11)]
    fn word_right_lands_past_word_end(#[case] text: &str, #[case] cursor: usize, #[case] expected: usize) {
        let buf = buffer_with(text, cursor);
        assert_eq!(buf.word_right_end_index(""), expected);
    }

    #[test]
    fn wordchars_extend_word_class() {
        let buf = buffer_with("foo-bar baz", 0);
        assert_eq!(buf.word_right_end_index(""), 3);
        assert_eq!(buf.word_right_end_index("-"), 7);
    }

    #[test]
    fn vi_word_start_skips_to_next_word() {
        let buf = buffer_with("one  two", 0);
        assert_eq!(buf.word_right_start_index(""), 5);
    }

    #[test]
    fn line_up_down_preserve_column() {
        let buf = buffer_with("alpha\nbe\ngamma", 12);
        assert_eq!(buf.line(), 2);
        assert_eq!(buf.line_up_index(), Some(8));
        let buf = buffer_with("alpha\nbe\ngamma", 2);
        assert_eq!(buf.line_down_index(), Some(8));
    }

    #[test]
    fn region_orders_point_and_mark() {
        let mut buf = buffer_with("hello world", 3);
        buf.set_mark(8, RegionType::Char);
        assert_eq!(buf.region_range(), Some(3..8));
        buf.set_insertion_point(10);
        assert_eq!(buf.region_range(), Some(8..10));
    }

    #[test]
    fn line_region_covers_whole_lines() {
        let mut buf = buffer_with("one\ntwo\nthree", 5);
        buf.set_mark(5, RegionType::Line);
        buf.set_insertion_point(9);
        assert_eq!(buf.region_range(), Some(4..13));
    }

    #[test]
    fn mark_follows_edits() {
        let mut buf = buffer_with("hello", 0);
        buf.set_mark(3, RegionType::Char);
        buf.insert_at(0, "xx");
        assert_eq!(buf.mark(), Some(5));
        buf.remove_range(0..2);
        assert_eq!(buf.mark(), Some(3));
    }

    #[test]
    fn char_search_counts_occurrences() {
        let buf = buffer_with("abcabcabc", 0);
        assert_eq!(buf.find_char_right('c', 1), Some(2));
        assert_eq!(buf.find_char_right('c', 2), Some(5));
        let buf = buffer_with("abcabcabc", 8);
        assert_eq!(buf.find_char_left('a', 1), Some(6));
        assert_eq!(buf.find_char_left('a', 2), Some(3));
    }

    #[test]
    fn grapheme_steps_handle_combining_marks() {
        // "e" + combining acute is a single grapheme
        let buf = buffer_with("e\u{301}x", 0);
        assert_eq!(buf.grapheme_right_index(), 3);
    }

    #[test]
    fn first_non_blank_skips_indentation() {
        let buf = buffer_with("   if x\nelse", 5);
        assert_eq!(buf.first_non_blank_of_line(), 3);
    }
}
