use crate::engine::EditSession;

pub(crate) fn up_history(s: &mut EditSession) -> bool {
    let n = s.take_count().max(1);
    let mut moved = false;
    for _ in 0..n {
        if !s.history_up(false) {
            return moved;
        }
        moved = true;
    }
    moved
}

pub(crate) fn down_history(s: &mut EditSession) -> bool {
    let n = s.take_count().max(1);
    let mut moved = false;
    for _ in 0..n {
        if !s.history_down() {
            return moved;
        }
        moved = true;
    }
    moved
}

pub(crate) fn beginning_of_history(s: &mut EditSession) -> bool {
    s.take_count();
    s.history_first()
}

pub(crate) fn end_of_history(s: &mut EditSession) -> bool {
    s.take_count();
    s.history_last()
}

/// Walk to older entries sharing the line up to the cursor as a prefix.
pub(crate) fn history_search_backward(s: &mut EditSession) -> bool {
    s.take_count();
    s.history_up(true)
}

pub(crate) fn history_search_forward(s: &mut EditSession) -> bool {
    s.take_count();
    s.history_down()
}

pub(crate) fn history_incremental_search_backward(s: &mut EditSession) -> bool {
    s.take_count();
    s.enter_search(true, false);
    true
}

pub(crate) fn history_incremental_search_forward(s: &mut EditSession) -> bool {
    s.take_count();
    s.enter_search(false, false);
    true
}

pub(crate) fn history_incremental_pattern_search_backward(s: &mut EditSession) -> bool {
    s.take_count();
    s.enter_search(true, true);
    true
}

pub(crate) fn history_incremental_pattern_search_forward(s: &mut EditSession) -> bool {
    s.take_count();
    s.enter_search(false, true);
    true
}
