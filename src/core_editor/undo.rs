use super::LineBuffer;

/// A single reversible buffer mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOp {
    Insert { at: usize, text: String },
    Delete { at: usize, text: String },
}

impl EditOp {
    fn apply(&self, buffer: &mut LineBuffer) {
        match self {
            EditOp::Insert { at, text } => buffer.insert_at(*at, text),
            EditOp::Delete { at, text } => {
                buffer.remove_range(*at..*at + text.len());
            }
        }
    }

    fn inverse(&self) -> EditOp {
        match self {
            EditOp::Insert { at, text } => EditOp::Delete {
                at: *at,
                text: text.clone(),
            },
            EditOp::Delete { at, text } => EditOp::Insert {
                at: *at,
                text: text.clone(),
            },
        }
    }
}

#[derive(Debug, Clone)]
struct UndoGroup {
    ops: Vec<EditOp>,
    cursor_before: usize,
    cursor_after: usize,
}

const UNDO_LIMIT: usize = 1000;

/// Linear log of edit groups. `split` closes the open group so the next
/// mutation starts a fresh undo unit; `undo`/`redo` walk group-by-group and
/// restore the cursor exactly.
///
/// When disabled the log records nothing and holds no memory.
#[derive(Debug, Default)]
pub struct UndoLog {
    done: Vec<UndoGroup>,
    open: Option<UndoGroup>,
    undone: Vec<UndoGroup>,
    disabled: bool,
}

impl UndoLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
        if disabled {
            self.clear();
        }
    }

    pub fn is_empty(&self) -> bool {
        self.done.is_empty() && self.open.is_none() && self.undone.is_empty()
    }

    pub fn clear(&mut self) {
        self.done.clear();
        self.open = None;
        self.undone.clear();
    }

    /// Record an op that has already been applied to the buffer.
    pub fn record(&mut self, op: EditOp, cursor_before: usize, cursor_after: usize) {
        if self.disabled {
            return;
        }
        self.undone.clear();
        match &mut self.open {
            Some(group) => {
                group.ops.push(op);
                group.cursor_after = cursor_after;
            }
            None => {
                self.open = Some(UndoGroup {
                    ops: vec![op],
                    cursor_before,
                    cursor_after,
                });
            }
        }
    }

    /// Close the open group; the next recorded op starts a new undo unit.
    pub fn split(&mut self) {
        if let Some(group) = self.open.take() {
            self.done.push(group);
            if self.done.len() > UNDO_LIMIT {
                self.done.remove(0);
            }
        }
    }

    /// Revert the most recent group. Returns false when there is nothing to
    /// undo.
    pub fn undo(&mut self, buffer: &mut LineBuffer) -> bool {
        self.split();
        let Some(group) = self.done.pop() else {
            return false;
        };
        for op in group.ops.iter().rev() {
            op.inverse().apply(buffer);
        }
        buffer.set_insertion_point(group.cursor_before);
        self.undone.push(group);
        true
    }

    /// Re-apply the most recently undone group.
    pub fn redo(&mut self, buffer: &mut LineBuffer) -> bool {
        let Some(group) = self.undone.pop() else {
            return false;
        };
        for op in &group.ops {
            op.apply(buffer);
        }
        buffer.set_insertion_point(group.cursor_after);
        self.done.push(group);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn insert(log: &mut UndoLog, buf: &mut LineBuffer, text: &str) {
        let before = buf.insertion_point();
        let at = before;
        buf.insert_at(at, text);
        log.record(
            EditOp::Insert {
                at,
                text: text.into(),
            },
            before,
            buf.insertion_point(),
        );
    }

    #[test]
    fn undo_then_redo_round_trips_text_and_cursor() {
        let mut buf = LineBuffer::new();
        let mut log = UndoLog::new();

        insert(&mut log, &mut buf, "hello");
        log.split();
        insert(&mut log, &mut buf, " world");

        assert!(log.undo(&mut buf));
        assert_eq!(buf.get_buffer(), "hello");
        assert_eq!(buf.insertion_point(), 5);

        assert!(log.redo(&mut buf));
        assert_eq!(buf.get_buffer(), "hello world");
        assert_eq!(buf.insertion_point(), 11);

        assert!(log.undo(&mut buf));
        assert!(log.undo(&mut buf));
        assert_eq!(buf.get_buffer(), "");
        assert_eq!(buf.insertion_point(), 0);
        assert!(!log.undo(&mut buf));
    }

    #[test]
    fn splits_group_logical_units() {
        let mut buf = LineBuffer::new();
        let mut log = UndoLog::new();

        insert(&mut log, &mut buf, "a");
        insert(&mut log, &mut buf, "b");
        insert(&mut log, &mut buf, "c");

        // One open group, so one undo clears everything
        assert!(log.undo(&mut buf));
        assert_eq!(buf.get_buffer(), "");
    }

    #[test]
    fn new_edit_clears_redo() {
        let mut buf = LineBuffer::new();
        let mut log = UndoLog::new();

        insert(&mut log, &mut buf, "abc");
        log.split();
        log.undo(&mut buf);
        insert(&mut log, &mut buf, "xyz");

        assert!(!log.redo(&mut buf));
        assert_eq!(buf.get_buffer(), "xyz");
    }

    #[test]
    fn disabled_log_stays_empty() {
        let mut buf = LineBuffer::new();
        let mut log = UndoLog::new();
        log.set_disabled(true);

        insert(&mut log, &mut buf, "abc");
        assert!(log.is_empty());
        assert!(!log.undo(&mut buf));
        assert_eq!(buf.get_buffer(), "abc");
    }
}
