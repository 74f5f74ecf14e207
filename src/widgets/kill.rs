use crate::core_editor::{KillDirection, RegionType};
use crate::engine::EditSession;

fn merge_with_last_kill(s: &EditSession) -> bool {
    s.last_widget
        .as_deref()
        .map(super::is_kill)
        .unwrap_or(false)
}

pub(crate) fn kill_word(s: &mut EditSession) -> bool {
    let n = s.take_count().max(1) as usize;
    let wc = s.word_chars();
    let cursor = s.editor.line_buffer().insertion_point();
    let target = super::motion::nth_target(s, n, |b| b.word_right_end_index(&wc));
    if target == cursor {
        return false;
    }
    let merge = merge_with_last_kill(s);
    s.editor
        .kill_range(cursor..target, KillDirection::Forward, merge);
    true
}

pub(crate) fn backward_kill_word(s: &mut EditSession) -> bool {
    let n = s.take_count().max(1) as usize;
    let wc = s.word_chars();
    let cursor = s.editor.line_buffer().insertion_point();
    let target = super::motion::nth_target(s, n, |b| b.word_left_index(&wc));
    if target == cursor {
        return false;
    }
    let merge = merge_with_last_kill(s);
    s.editor
        .kill_range(target..cursor, KillDirection::Backward, merge);
    true
}

/// Kill to the end of the line; at the end of a line, kill the newline.
pub(crate) fn kill_line(s: &mut EditSession) -> bool {
    s.take_count();
    let buffer = s.editor.line_buffer();
    let cursor = buffer.insertion_point();
    let eol = buffer.end_of_line();
    let end = if cursor == eol {
        if cursor == buffer.len() {
            return false;
        }
        cursor + 1
    } else {
        eol
    };
    let merge = merge_with_last_kill(s);
    s.editor
        .kill_range(cursor..end, KillDirection::Forward, merge);
    true
}

pub(crate) fn backward_kill_line(s: &mut EditSession) -> bool {
    s.take_count();
    let buffer = s.editor.line_buffer();
    let cursor = buffer.insertion_point();
    let bol = buffer.start_of_line();
    let start = if cursor == bol {
        if cursor == 0 {
            return false;
        }
        cursor - 1
    } else {
        bol
    };
    let merge = merge_with_last_kill(s);
    s.editor
        .kill_range(start..cursor, KillDirection::Backward, merge);
    true
}

pub(crate) fn kill_whole_line(s: &mut EditSession) -> bool {
    s.take_count();
    let buffer = s.editor.line_buffer();
    let start = buffer.start_of_line();
    let eol = buffer.end_of_line();
    let end = if eol < buffer.len() { eol + 1 } else { eol };
    if start == end {
        return false;
    }
    let merge = merge_with_last_kill(s);
    s.editor
        .kill_range(start..end, KillDirection::Forward, merge);
    true
}

pub(crate) fn set_mark_command(s: &mut EditSession) -> bool {
    s.take_count();
    s.editor.set_mark_at_cursor(RegionType::Char);
    true
}

pub(crate) fn exchange_point_and_mark(s: &mut EditSession) -> bool {
    s.take_count();
    s.editor.swap_point_and_mark()
}

pub(crate) fn kill_region(s: &mut EditSession) -> bool {
    s.take_count();
    let Some(range) = s.editor.line_buffer().region_range() else {
        return false;
    };
    let merge = merge_with_last_kill(s);
    s.editor.kill_range(range, KillDirection::Forward, merge);
    s.editor.clear_mark();
    true
}

pub(crate) fn copy_region_as_kill(s: &mut EditSession) -> bool {
    s.take_count();
    let Some(range) = s.editor.line_buffer().region_range() else {
        return false;
    };
    s.editor.copy_range(range, false);
    s.editor.clear_mark();
    true
}

/// Insert the top of the kill ring, marking the span for `yank-pop`.
pub(crate) fn yank(s: &mut EditSession) -> bool {
    let n = s.take_count().max(1) as usize;
    let Some(text) = s.editor.kill_ring().yank().map(str::to_string) else {
        return false;
    };
    let start = s.editor.line_buffer().insertion_point();
    for _ in 0..n {
        s.editor.insert_str(&text);
    }
    s.editor.set_mark(start, RegionType::Paste);
    true
}

/// Replace the just-yanked span with the previous ring entry.
pub(crate) fn yank_pop(s: &mut EditSession) -> bool {
    s.take_count();
    let was_yank = s
        .last_widget
        .as_deref()
        .map(super::is_yank)
        .unwrap_or(false);
    if !was_yank {
        return false;
    }
    let (Some(start), RegionType::Paste) = (
        s.editor.line_buffer().mark(),
        s.editor.line_buffer().region_type(),
    ) else {
        return false;
    };
    let Some(text) = s.editor.kill_ring().yank_pop().map(str::to_string) else {
        return false;
    };
    let cursor = s.editor.line_buffer().insertion_point();
    s.editor.replace_range(start..cursor, &text);
    s.editor.set_mark(start, RegionType::Paste);
    true
}
