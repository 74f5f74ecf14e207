use crate::engine::{EditSession, LoopStatus};

pub(crate) fn undo(s: &mut EditSession) -> bool {
    let n = s.take_count().max(1);
    let mut any = false;
    for _ in 0..n {
        if !s.editor.undo() {
            return any;
        }
        any = true;
    }
    any
}

pub(crate) fn redo(s: &mut EditSession) -> bool {
    let n = s.take_count().max(1);
    let mut any = false;
    for _ in 0..n {
        if !s.editor.redo() {
            return any;
        }
        any = true;
    }
    any
}

pub(crate) fn split_undo(s: &mut EditSession) -> bool {
    s.take_count();
    s.editor.split_undo();
    true
}

/// Accumulate a numeric argument from the digit that invoked the widget.
pub(crate) fn digit_argument(s: &mut EditSession) -> bool {
    let Some(digit) = s.last_key_digit() else {
        return neg_argument(s);
    };
    let current = s.pending_arg.unwrap_or(0);
    let next = if current < 0 {
        current.saturating_mul(10).saturating_sub(digit)
    } else {
        current.saturating_mul(10).saturating_add(digit)
    };
    s.pending_arg = Some(next);
    true
}

pub(crate) fn universal_argument(s: &mut EditSession) -> bool {
    s.pending_arg = Some(s.pending_arg.map_or(4, |n| n.saturating_mul(4)));
    true
}

pub(crate) fn neg_argument(s: &mut EditSession) -> bool {
    s.pending_arg = Some(match s.pending_arg {
        None => -1,
        Some(n) => -n,
    });
    true
}

pub(crate) fn accept_line(s: &mut EditSession) -> bool {
    s.take_count();
    s.try_accept()
}

pub(crate) fn abort(s: &mut EditSession) -> bool {
    s.pending_arg = None;
    s.status = LoopStatus::Aborted;
    true
}

pub(crate) fn send_break(s: &mut EditSession) -> bool {
    s.pending_arg = None;
    s.status = LoopStatus::Aborted;
    true
}

pub(crate) fn clear_screen(s: &mut EditSession) -> bool {
    s.take_count();
    s.clear_screen_now()
}

pub(crate) fn redraw_line(s: &mut EditSession) -> bool {
    s.take_count();
    s.painter.mark_dirty();
    true
}

pub(crate) fn redisplay(s: &mut EditSession) -> bool {
    s.take_count();
    true
}

pub(crate) fn beep(s: &mut EditSession) -> bool {
    s.take_count();
    s.ring_bell();
    true
}
