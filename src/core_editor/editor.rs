use super::{
    kill_ring::{KillDirection, KillRing},
    undo::{EditOp, UndoLog},
    LineBuffer,
};

/// Buffer plus undo log plus kill ring behind a single mutation entry.
///
/// Every text change funnels through [`Editor::apply`] so the undo log sees
/// it; widgets never touch the raw buffer mutators.
#[derive(Debug, Default)]
pub struct Editor {
    line_buffer: LineBuffer,
    undo: UndoLog,
    kill_ring: KillRing,
    atomic_depth: u32,
}

impl Editor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn line_buffer(&self) -> &LineBuffer {
        &self.line_buffer
    }

    pub fn kill_ring(&mut self) -> &mut KillRing {
        &mut self.kill_ring
    }

    pub fn set_undo_disabled(&mut self, disabled: bool) {
        self.undo.set_disabled(disabled);
    }

    pub fn undo_log_is_empty(&self) -> bool {
        self.undo.is_empty()
    }

    /// Replace the whole buffer without recording history (used when
    /// swapping in a history entry or restoring a saved line).
    pub fn reset_buffer_to(&mut self, text: &str, cursor: usize) {
        self.line_buffer = LineBuffer::from(text);
        self.line_buffer.set_insertion_point(cursor);
        self.undo.clear();
    }

    pub fn move_to(&mut self, pos: usize) {
        self.line_buffer.set_insertion_point(pos);
    }

    fn apply(&mut self, op: EditOp) {
        let before = self.line_buffer.insertion_point();
        match &op {
            EditOp::Insert { at, text } => self.line_buffer.insert_at(*at, text),
            EditOp::Delete { at, text } => {
                self.line_buffer.remove_range(*at..*at + text.len());
            }
        }
        let after = self.line_buffer.insertion_point();
        self.undo.record(op, before, after);
    }

    /// Insert at the cursor. In overwrite mode the inserted text replaces
    /// the same number of graphemes to the right (newlines excepted).
    pub fn insert_str(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if self.line_buffer.overwrite() && !text.contains('\n') {
            let mut end = self.line_buffer.insertion_point();
            for _ in text.chars() {
                if end >= self.line_buffer.len()
                    || self.line_buffer.char_at(end) == Some('\n')
                {
                    break;
                }
                end = self.line_buffer.grapheme_right_index_from(end);
            }
            self.replace_range(self.line_buffer.insertion_point()..end, text);
        } else {
            let at = self.line_buffer.insertion_point();
            self.apply(EditOp::Insert {
                at,
                text: text.to_string(),
            });
        }
    }

    /// Remove a byte range, returning the removed text.
    pub fn delete_range(&mut self, range: std::ops::Range<usize>) -> String {
        let start = self.line_buffer.clamp(range.start);
        let end = self.line_buffer.clamp(range.end).max(start);
        if start == end {
            return String::new();
        }
        let text = self.line_buffer.substring(start..end).to_string();
        self.apply(EditOp::Delete { at: start, text: text.clone() });
        text
    }

    /// Replace a byte range, returning the previous contents.
    pub fn replace_range(&mut self, range: std::ops::Range<usize>, text: &str) -> String {
        let old = self.delete_range(range);
        let at = self.line_buffer.insertion_point();
        if !text.is_empty() {
            self.apply(EditOp::Insert {
                at,
                text: text.to_string(),
            });
        }
        old
    }

    /// Cut a range into the kill ring.
    pub fn kill_range(
        &mut self,
        range: std::ops::Range<usize>,
        direction: KillDirection,
        merge: bool,
    ) {
        let text = self.delete_range(range);
        self.kill_ring.kill(&text, direction, merge);
    }

    /// Copy a range into the kill ring without deleting it.
    pub fn copy_range(&mut self, range: std::ops::Range<usize>, merge: bool) {
        let text = self.line_buffer.substring(range.start..range.end).to_string();
        self.kill_ring.kill(&text, KillDirection::Forward, merge);
    }

    pub fn undo(&mut self) -> bool {
        self.undo.undo(&mut self.line_buffer)
    }

    pub fn redo(&mut self) -> bool {
        self.undo.redo(&mut self.line_buffer)
    }

    pub fn split_undo(&mut self) {
        if self.atomic_depth == 0 {
            self.undo.split();
        }
    }

    /// Run a batch of edits as a single undo unit.
    pub fn edit_atomically<F: FnOnce(&mut Editor)>(&mut self, f: F) {
        self.undo.split();
        self.atomic_depth += 1;
        f(self);
        self.atomic_depth -= 1;
        if self.atomic_depth == 0 {
            self.undo.split();
        }
    }

    // --- cursor / mark conveniences used by widgets ------------------------

    pub fn set_mark(&mut self, pos: usize, region_type: super::line_buffer::RegionType) {
        self.line_buffer.set_mark(pos, region_type);
    }

    pub fn set_mark_at_cursor(&mut self, region_type: super::line_buffer::RegionType) {
        let point = self.line_buffer.insertion_point();
        self.line_buffer.set_mark(point, region_type);
    }

    pub fn clear_mark(&mut self) {
        self.line_buffer.clear_mark();
    }

    pub fn swap_point_and_mark(&mut self) -> bool {
        self.line_buffer.swap_point_and_mark()
    }

    pub fn toggle_overwrite(&mut self) {
        self.line_buffer.toggle_overwrite();
    }

    /// Overwrite buffer, undo log and kill ring with NULs, then clear.
    pub fn zero_out(&mut self) {
        let len = self.line_buffer.len();
        self.line_buffer.remove_range(0..len);
        self.line_buffer.insert_at(0, &"\0".repeat(len));
        self.line_buffer = LineBuffer::new();
        self.undo.clear();
        self.kill_ring.zero_out();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn insert_and_delete_round_trip_through_undo() {
        let mut ed = Editor::new();
        ed.insert_str("hello world");
        ed.split_undo();
        ed.delete_range(5..11);
        assert_eq!(ed.line_buffer().get_buffer(), "hello");

        assert!(ed.undo());
        assert_eq!(ed.line_buffer().get_buffer(), "hello world");
        assert!(ed.redo());
        assert_eq!(ed.line_buffer().get_buffer(), "hello");
    }

    #[test]
    fn overwrite_mode_replaces_instead_of_inserting() {
        let mut ed = Editor::new();
        ed.insert_str("abcdef");
        ed.move_to(2);
        ed.line_buffer.toggle_overwrite();
        ed.insert_str("XY");
        assert_eq!(ed.line_buffer().get_buffer(), "abXYef");
        assert_eq!(ed.line_buffer().insertion_point(), 4);
    }

    #[test]
    fn atomic_edits_undo_as_one_unit() {
        let mut ed = Editor::new();
        ed.insert_str("base ");
        ed.split_undo();
        ed.edit_atomically(|ed| {
            ed.insert_str("one ");
            ed.split_undo(); // ignored inside the atomic section
            ed.insert_str("two");
        });
        assert_eq!(ed.line_buffer().get_buffer(), "base one two");

        assert!(ed.undo());
        assert_eq!(ed.line_buffer().get_buffer(), "base ");
    }

    #[test]
    fn kill_and_copy_feed_the_ring() {
        let mut ed = Editor::new();
        ed.insert_str("hello world");
        ed.kill_range(5..11, KillDirection::Forward, false);
        assert_eq!(ed.line_buffer().get_buffer(), "hello");
        assert_eq!(ed.kill_ring().yank(), Some(" world"));

        ed.copy_range(0..5, false);
        assert_eq!(ed.kill_ring().yank(), Some("hello"));
    }

    #[test]
    fn replace_returns_previous_text() {
        let mut ed = Editor::new();
        ed.insert_str("hello world");
        let old = ed.replace_range(0..5, "goodbye");
        assert_eq!(old, "hello");
        assert_eq!(ed.line_buffer().get_buffer(), "goodbye world");
    }
}
