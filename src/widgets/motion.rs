use crate::engine::{EditSession, MotionKind};

/// Split a signed count into magnitude and direction.
pub(crate) fn directed(count: i64) -> (usize, bool) {
    if count < 0 {
        (count.unsigned_abs() as usize, false)
    } else {
        (count as usize, true)
    }
}

/// Apply `step` n times from the current cursor without committing moves,
/// returning the final target.
pub(crate) fn nth_target(
    s: &mut EditSession,
    n: usize,
    step: impl Fn(&crate::core_editor::LineBuffer) -> usize,
) -> usize {
    let origin = s.editor.line_buffer().insertion_point();
    let mut target = origin;
    for _ in 0..n.max(1) {
        s.editor.move_to(target);
        let next = step(s.editor.line_buffer());
        if next == target {
            break;
        }
        target = next;
    }
    s.editor.move_to(origin);
    target
}

pub(crate) fn forward_char(s: &mut EditSession) -> bool {
    let (n, forward) = directed(s.take_count());
    if !forward {
        return move_chars_left(s, n);
    }
    // At the end of the buffer the suggestion hint is accepted instead
    let buffer = s.editor.line_buffer();
    if buffer.insertion_point() == buffer.len() {
        if s.keymap_name == s.main_keymap {
            if let Some(hint) = s.hint.take() {
                s.editor.insert_str(&hint);
                return true;
            }
        }
        return false;
    }
    let target = nth_target(s, n, |b| b.grapheme_right_index());
    s.vi_motion(target, MotionKind::Exclusive)
}

pub(crate) fn backward_char(s: &mut EditSession) -> bool {
    let (n, forward) = directed(s.take_count());
    if !forward {
        s.pending_arg = Some(n as i64);
        return forward_char(s);
    }
    move_chars_left(s, n)
}

fn move_chars_left(s: &mut EditSession, n: usize) -> bool {
    if s.editor.line_buffer().insertion_point() == 0 {
        return false;
    }
    let target = nth_target(s, n, |b| b.grapheme_left_index());
    s.vi_motion(target, MotionKind::Exclusive)
}

pub(crate) fn forward_word(s: &mut EditSession) -> bool {
    let (n, forward) = directed(s.take_count());
    if !forward {
        s.pending_arg = Some(n as i64);
        return backward_word(s);
    }
    let wc = s.word_chars();
    let target = nth_target(s, n, |b| b.word_right_end_index(&wc));
    if target == s.editor.line_buffer().insertion_point() {
        return false;
    }
    s.vi_motion(target, MotionKind::Exclusive)
}

pub(crate) fn backward_word(s: &mut EditSession) -> bool {
    let (n, forward) = directed(s.take_count());
    if !forward {
        s.pending_arg = Some(n as i64);
        return forward_word(s);
    }
    let wc = s.word_chars();
    let target = nth_target(s, n, |b| b.word_left_index(&wc));
    if target == s.editor.line_buffer().insertion_point() {
        return false;
    }
    s.vi_motion(target, MotionKind::Exclusive)
}

/// Start of the current visual (logical) line.
pub(crate) fn beginning_of_line(s: &mut EditSession) -> bool {
    s.take_count();
    let target = s.editor.line_buffer().start_of_line();
    s.vi_motion(target, MotionKind::Exclusive)
}

pub(crate) fn end_of_line(s: &mut EditSession) -> bool {
    s.take_count();
    let buffer = s.editor.line_buffer();
    if buffer.insertion_point() == buffer.len()
        && s.vi.pending_op.is_none()
        && s.keymap_name == s.main_keymap
    {
        if let Some(hint) = s.hint.take() {
            s.editor.insert_str(&hint);
            return true;
        }
    }
    let target = s.editor.line_buffer().end_of_line();
    s.vi_motion(target, MotionKind::Exclusive)
}

/// Start of the whole buffer, not just the current line.
pub(crate) fn beginning_of_line_hist(s: &mut EditSession) -> bool {
    s.take_count();
    if s.editor.line_buffer().insertion_point() > 0 {
        s.editor.move_to(0);
        true
    } else {
        s.history_up(false)
    }
}

pub(crate) fn up_line_or_history(s: &mut EditSession) -> bool {
    s.take_count();
    if s.vi.pending_op.is_some() {
        let target = s
            .editor
            .line_buffer()
            .line_up_index()
            .unwrap_or_else(|| s.editor.line_buffer().insertion_point());
        return s.vi_motion(target, MotionKind::Linewise);
    }
    match s.editor.line_buffer().line_up_index() {
        Some(target) => {
            s.editor.move_to(target);
            true
        }
        None => s.history_up(false),
    }
}

pub(crate) fn down_line_or_history(s: &mut EditSession) -> bool {
    s.take_count();
    if s.vi.pending_op.is_some() {
        let target = s
            .editor
            .line_buffer()
            .line_down_index()
            .unwrap_or_else(|| s.editor.line_buffer().insertion_point());
        return s.vi_motion(target, MotionKind::Linewise);
    }
    match s.editor.line_buffer().line_down_index() {
        Some(target) => {
            s.editor.move_to(target);
            true
        }
        None => s.history_down(),
    }
}

pub(crate) fn vi_first_non_blank(s: &mut EditSession) -> bool {
    s.take_count();
    let target = s.editor.line_buffer().first_non_blank_of_line();
    s.vi_motion(target, MotionKind::Exclusive)
}
