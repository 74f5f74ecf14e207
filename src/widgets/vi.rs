use crate::core_editor::{KillDirection, RegionType};
use crate::engine::{EditSession, FindKind, MotionKind, ViOperator};

use super::motion::nth_target;

// --- mode switching -------------------------------------------------------

pub(crate) fn vi_cmd_mode(s: &mut EditSession) -> bool {
    let from_insert = s.keymap_name == "viins";
    s.vi.pending_op = None;
    s.vi.register = None;
    s.pending_arg = None;
    s.editor.clear_mark();
    if s.editor.line_buffer().overwrite() {
        s.editor.toggle_overwrite();
    }
    if from_insert {
        // Leaving insert mode steps back onto the last edited character
        let buffer = s.editor.line_buffer();
        let cursor = buffer.insertion_point();
        if cursor > buffer.start_of_line() {
            let left = buffer.grapheme_left_index();
            s.editor.move_to(left);
        }
    }
    s.set_keymap_internal("vicmd");
    true
}

pub(crate) fn vi_insert(s: &mut EditSession) -> bool {
    s.take_count();
    let keymap = s.vi_insert_keymap();
    s.set_keymap_internal(keymap);
    true
}

pub(crate) fn vi_insert_bol(s: &mut EditSession) -> bool {
    s.take_count();
    let target = s.editor.line_buffer().first_non_blank_of_line();
    s.editor.move_to(target);
    let keymap = s.vi_insert_keymap();
    s.set_keymap_internal(keymap);
    true
}

pub(crate) fn vi_add_next(s: &mut EditSession) -> bool {
    s.take_count();
    let buffer = s.editor.line_buffer();
    if buffer.insertion_point() < buffer.end_of_line() {
        let right = buffer.grapheme_right_index();
        s.editor.move_to(right);
    }
    let keymap = s.vi_insert_keymap();
    s.set_keymap_internal(keymap);
    true
}

pub(crate) fn vi_add_eol(s: &mut EditSession) -> bool {
    s.take_count();
    let target = s.editor.line_buffer().end_of_line();
    s.editor.move_to(target);
    let keymap = s.vi_insert_keymap();
    s.set_keymap_internal(keymap);
    true
}

pub(crate) fn vi_open_line_below(s: &mut EditSession) -> bool {
    s.take_count();
    let target = s.editor.line_buffer().end_of_line();
    s.editor.move_to(target);
    s.editor.insert_str("\n");
    let keymap = s.vi_insert_keymap();
    s.set_keymap_internal(keymap);
    true
}

pub(crate) fn vi_open_line_above(s: &mut EditSession) -> bool {
    s.take_count();
    let start = s.editor.line_buffer().start_of_line();
    s.editor.move_to(start);
    s.editor.insert_str("\n");
    s.editor.move_to(start);
    let keymap = s.vi_insert_keymap();
    s.set_keymap_internal(keymap);
    true
}

// --- motions --------------------------------------------------------------

pub(crate) fn vi_digit_or_beginning_of_line(s: &mut EditSession) -> bool {
    if s.pending_arg.is_some() {
        return super::misc::digit_argument(s);
    }
    let target = s.editor.line_buffer().start_of_line();
    s.vi_motion(target, MotionKind::Exclusive)
}

pub(crate) fn vi_forward_word(s: &mut EditSession) -> bool {
    let n = s.take_count().max(1) as usize;
    let wc = s.word_chars();
    // `cw` acts like `ce`, stopping short of trailing whitespace
    if s.vi.pending_op == Some(ViOperator::Change) {
        let target = nth_target(s, n, |b| b.word_right_end_index(&wc));
        return s.vi_motion(target, MotionKind::Exclusive);
    }
    let target = nth_target(s, n, |b| b.word_right_start_index(&wc));
    s.vi_motion(target, MotionKind::Exclusive)
}

pub(crate) fn vi_forward_blank_word(s: &mut EditSession) -> bool {
    let n = s.take_count().max(1) as usize;
    if s.vi.pending_op == Some(ViOperator::Change) {
        let target = nth_target(s, n, |b| b.big_word_right_end_index());
        return s.vi_motion(target, MotionKind::Exclusive);
    }
    let target = nth_target(s, n, |b| b.big_word_right_start_index());
    s.vi_motion(target, MotionKind::Exclusive)
}

pub(crate) fn vi_forward_word_end(s: &mut EditSession) -> bool {
    let n = s.take_count().max(1) as usize;
    let wc = s.word_chars();
    let end = nth_target(s, n, |b| b.word_right_end_index(&wc));
    if s.vi.pending_op.is_some() {
        return s.vi_motion(end, MotionKind::Exclusive);
    }
    // Movement lands on the last character, not past it
    let target = s.editor.line_buffer().grapheme_left_index_from(end);
    s.editor.move_to(target);
    true
}

pub(crate) fn vi_forward_blank_word_end(s: &mut EditSession) -> bool {
    let n = s.take_count().max(1) as usize;
    let end = nth_target(s, n, |b| b.big_word_right_end_index());
    if s.vi.pending_op.is_some() {
        return s.vi_motion(end, MotionKind::Exclusive);
    }
    let target = s.editor.line_buffer().grapheme_left_index_from(end);
    s.editor.move_to(target);
    true
}

pub(crate) fn vi_backward_word(s: &mut EditSession) -> bool {
    let n = s.take_count().max(1) as usize;
    let wc = s.word_chars();
    let target = nth_target(s, n, |b| b.word_left_index(&wc));
    s.vi_motion(target, MotionKind::Exclusive)
}

pub(crate) fn vi_backward_blank_word(s: &mut EditSession) -> bool {
    let n = s.take_count().max(1) as usize;
    let target = nth_target(s, n, |b| b.big_word_left_index());
    s.vi_motion(target, MotionKind::Exclusive)
}

// --- character search -----------------------------------------------------

fn find_target(s: &EditSession, kind: FindKind, c: char, n: usize) -> Option<(usize, MotionKind)> {
    let buffer = s.editor.line_buffer();
    match kind {
        FindKind::Next => buffer
            .find_char_right(c, n)
            .map(|i| (i, MotionKind::Inclusive)),
        FindKind::NextSkip => buffer
            .find_char_right(c, n)
            .map(|i| (buffer.grapheme_left_index_from(i), MotionKind::Inclusive)),
        FindKind::Prev => buffer
            .find_char_left(c, n)
            .map(|i| (i, MotionKind::Exclusive)),
        FindKind::PrevSkip => buffer
            .find_char_left(c, n)
            .map(|i| (buffer.grapheme_right_index_from(i), MotionKind::Exclusive)),
    }
}

fn char_search(s: &mut EditSession, kind: FindKind) -> bool {
    let n = s.take_count().max(1) as usize;
    let Some(c) = s.read_char() else {
        return false;
    };
    if c == '\x1b' {
        return false;
    }
    s.vi.last_find = Some((kind, c));
    match find_target(s, kind, c, n) {
        Some((target, motion)) => s.vi_motion(target, motion),
        None => {
            s.vi.pending_op = None;
            s.set_keymap_internal("vicmd");
            false
        }
    }
}

pub(crate) fn vi_find_next_char(s: &mut EditSession) -> bool {
    char_search(s, FindKind::Next)
}

pub(crate) fn vi_find_prev_char(s: &mut EditSession) -> bool {
    char_search(s, FindKind::Prev)
}

pub(crate) fn vi_find_next_char_skip(s: &mut EditSession) -> bool {
    char_search(s, FindKind::NextSkip)
}

pub(crate) fn vi_find_prev_char_skip(s: &mut EditSession) -> bool {
    char_search(s, FindKind::PrevSkip)
}

pub(crate) fn vi_repeat_find(s: &mut EditSession) -> bool {
    let n = s.take_count().max(1) as usize;
    let Some((kind, c)) = s.vi.last_find else {
        return false;
    };
    match find_target(s, kind, c, n) {
        Some((target, motion)) => s.vi_motion(target, motion),
        None => false,
    }
}

pub(crate) fn vi_rev_repeat_find(s: &mut EditSession) -> bool {
    let n = s.take_count().max(1) as usize;
    let Some((kind, c)) = s.vi.last_find else {
        return false;
    };
    let reversed = match kind {
        FindKind::Next => FindKind::Prev,
        FindKind::Prev => FindKind::Next,
        FindKind::NextSkip => FindKind::PrevSkip,
        FindKind::PrevSkip => FindKind::NextSkip,
    };
    match find_target(s, reversed, c, n) {
        Some((target, motion)) => s.vi_motion(target, motion),
        None => false,
    }
}

// --- simple edits ---------------------------------------------------------

fn vi_kill(s: &mut EditSession, range: std::ops::Range<usize>) {
    if let Some(register) = s.vi.register.take() {
        let text = s.editor.line_buffer().substring(range.clone()).to_string();
        s.editor.kill_ring().set_register(register, &text);
    }
    s.editor.kill_range(range, KillDirection::Forward, false);
}

pub(crate) fn vi_delete_char(s: &mut EditSession) -> bool {
    let n = s.take_count().max(1) as usize;
    let cursor = s.editor.line_buffer().insertion_point();
    let end = nth_target(s, n, |b| b.grapheme_right_index());
    if end == cursor {
        return false;
    }
    vi_kill(s, cursor..end);
    true
}

pub(crate) fn vi_backward_delete_char(s: &mut EditSession) -> bool {
    let n = s.take_count().max(1) as usize;
    let cursor = s.editor.line_buffer().insertion_point();
    let start = nth_target(s, n, |b| b.grapheme_left_index());
    if start == cursor {
        return false;
    }
    vi_kill(s, start..cursor);
    true
}

pub(crate) fn vi_replace_chars(s: &mut EditSession) -> bool {
    let n = s.take_count().max(1) as usize;
    let Some(c) = s.read_char() else {
        return false;
    };
    if c == '\x1b' {
        return false;
    }
    let cursor = s.editor.line_buffer().insertion_point();
    let end = nth_target(s, n, |b| b.grapheme_right_index());
    if end == cursor {
        return false;
    }
    let replacement: String = std::iter::repeat(c).take(n).collect();
    s.editor.replace_range(cursor..end, &replacement);
    let back = s.editor.line_buffer().grapheme_left_index();
    s.editor.move_to(back);
    true
}

/// `R`: insert mode with overwrite on; leaving command mode turns it off.
pub(crate) fn vi_replace(s: &mut EditSession) -> bool {
    s.take_count();
    if !s.editor.line_buffer().overwrite() {
        s.editor.toggle_overwrite();
    }
    let keymap = s.vi_insert_keymap();
    s.set_keymap_internal(keymap);
    true
}

pub(crate) fn vi_substitute(s: &mut EditSession) -> bool {
    let n = s.take_count().max(1) as usize;
    let cursor = s.editor.line_buffer().insertion_point();
    let end = nth_target(s, n, |b| b.grapheme_right_index());
    if end > cursor {
        vi_kill(s, cursor..end);
    }
    let keymap = s.vi_insert_keymap();
    s.set_keymap_internal(keymap);
    true
}

pub(crate) fn vi_change_whole_line(s: &mut EditSession) -> bool {
    s.take_count();
    let buffer = s.editor.line_buffer();
    let start = buffer.start_of_line();
    let end = buffer.end_of_line();
    if end > start {
        vi_kill(s, start..end);
    }
    let keymap = s.vi_insert_keymap();
    s.set_keymap_internal(keymap);
    true
}

pub(crate) fn vi_kill_eol(s: &mut EditSession) -> bool {
    s.take_count();
    let buffer = s.editor.line_buffer();
    let cursor = buffer.insertion_point();
    let end = buffer.end_of_line();
    if end == cursor {
        return false;
    }
    vi_kill(s, cursor..end);
    true
}

pub(crate) fn vi_change_eol(s: &mut EditSession) -> bool {
    vi_kill_eol(s);
    let keymap = s.vi_insert_keymap();
    s.set_keymap_internal(keymap);
    true
}

pub(crate) fn vi_swap_case(s: &mut EditSession) -> bool {
    let n = s.take_count().max(1) as usize;
    for _ in 0..n {
        let buffer = s.editor.line_buffer();
        let cursor = buffer.insertion_point();
        let end = buffer.grapheme_right_index();
        if end == cursor {
            return false;
        }
        let swapped: String = s
            .editor
            .line_buffer()
            .substring(cursor..end)
            .chars()
            .map(|c| {
                if c.is_uppercase() {
                    c.to_lowercase().next().unwrap_or(c)
                } else {
                    c.to_uppercase().next().unwrap_or(c)
                }
            })
            .collect();
        s.editor.replace_range(cursor..end, &swapped);
    }
    true
}

// --- operators ------------------------------------------------------------

pub(crate) fn vi_delete(s: &mut EditSession) -> bool {
    s.vi.pending_op = Some(ViOperator::Delete);
    s.set_keymap_internal("viopp");
    true
}

pub(crate) fn vi_change(s: &mut EditSession) -> bool {
    s.vi.pending_op = Some(ViOperator::Change);
    s.set_keymap_internal("viopp");
    true
}

pub(crate) fn vi_yank(s: &mut EditSession) -> bool {
    s.vi.pending_op = Some(ViOperator::Yank);
    s.set_keymap_internal("viopp");
    true
}

/// `dd`/`cc`/`yy`: the doubled operator works on whole lines.
pub(crate) fn vi_oper_doubled(s: &mut EditSession) -> bool {
    let Some(op) = s.vi.pending_op.take() else {
        s.set_keymap_internal("vicmd");
        return false;
    };
    let n = s.take_count().max(1) as usize;
    let buffer = s.editor.line_buffer();
    let start = buffer.start_of_line();
    let mut end = buffer.end_of_line();
    let text = buffer.get_buffer();
    for _ in 1..n {
        match text[end..].find('\n') {
            Some(_) if end < text.len() => {
                let next = end + 1;
                end = text[next..]
                    .find('\n')
                    .map(|i| next + i)
                    .unwrap_or(text.len());
            }
            _ => break,
        }
    }
    // Change keeps the line itself, only its content goes
    if op != ViOperator::Change && end < text.len() {
        end += 1;
    }
    s.apply_vi_operator(op, start, end)
}

pub(crate) fn vi_yank_whole_line(s: &mut EditSession) -> bool {
    s.take_count();
    let buffer = s.editor.line_buffer();
    let start = buffer.start_of_line();
    let end = (buffer.end_of_line() + 1).min(buffer.len());
    s.apply_vi_operator(ViOperator::Yank, start, end)
}

// --- put ------------------------------------------------------------------

fn put_text(s: &mut EditSession) -> Option<String> {
    match s.vi.register.take() {
        Some(register) => s.editor.kill_ring().register(register).map(str::to_string),
        None => s.editor.kill_ring().yank().map(str::to_string),
    }
}

fn put(s: &mut EditSession, after: bool) -> bool {
    let n = s.take_count().max(1) as usize;
    let Some(text) = put_text(s) else {
        return false;
    };
    let text = text.repeat(n);
    if text.ends_with('\n') {
        // Linewise paste opens its own line
        let buffer = s.editor.line_buffer();
        let target = if after {
            (buffer.end_of_line() + 1).min(buffer.len())
        } else {
            buffer.start_of_line()
        };
        let at_buffer_end = after && buffer.end_of_line() == buffer.len();
        s.editor.move_to(target);
        if at_buffer_end {
            let mut owned = text;
            owned.pop();
            owned.insert(0, '\n');
            s.editor.insert_str(&owned);
        } else {
            s.editor.insert_str(&text);
        }
        s.editor.move_to(target.min(s.editor.line_buffer().len()));
    } else {
        if after {
            let buffer = s.editor.line_buffer();
            if buffer.insertion_point() < buffer.end_of_line() {
                let right = buffer.grapheme_right_index();
                s.editor.move_to(right);
            }
        }
        s.editor.insert_str(&text);
        let back = s.editor.line_buffer().grapheme_left_index();
        s.editor.move_to(back);
    }
    true
}

pub(crate) fn vi_put_after(s: &mut EditSession) -> bool {
    put(s, true)
}

pub(crate) fn vi_put_before(s: &mut EditSession) -> bool {
    put(s, false)
}

// --- repeat and registers -------------------------------------------------

pub(crate) fn vi_repeat_change(s: &mut EditSession) -> bool {
    s.take_count();
    let Some(bytes) = s.vi_last_change.clone() else {
        return false;
    };
    s.decoder.push_macro(&bytes);
    true
}

pub(crate) fn vi_set_buffer(s: &mut EditSession) -> bool {
    let Some(c) = s.read_char() else {
        return false;
    };
    if !c.is_ascii_alphanumeric() {
        return false;
    }
    s.vi.register = Some(c);
    true
}

// --- text objects ---------------------------------------------------------

fn matching_pair(obj: char) -> Option<(char, char)> {
    match obj {
        '(' | ')' | 'b' => Some(('(', ')')),
        '{' | '}' | 'B' => Some(('{', '}')),
        '[' | ']' => Some(('[', ']')),
        '<' | '>' => Some(('<', '>')),
        _ => None,
    }
}

fn object_range(s: &EditSession, around: bool, obj: char) -> Option<(usize, usize)> {
    let buffer = s.editor.line_buffer();
    let text = buffer.get_buffer();
    let cursor = buffer.insertion_point();

    if obj == 'w' || obj == 'W' {
        let wc = s.word_chars();
        let range = buffer.current_word_range(&wc);
        let mut end = range.end;
        if around {
            while end < text.len() && text[end..].starts_with(' ') {
                end += 1;
            }
        }
        return Some((range.start, end));
    }

    if obj == '"' || obj == '\'' || obj == '`' {
        let line_start = buffer.start_of_line();
        let line_end = buffer.end_of_line();
        let line = &text[line_start..line_end];
        let rel = cursor - line_start;
        let open = line[..rel].rfind(obj).or_else(|| line[rel..].find(obj).map(|i| rel + i))?;
        let close = line[open + 1..].find(obj).map(|i| open + 1 + i)?;
        return if around {
            Some((line_start + open, line_start + close + 1))
        } else {
            Some((line_start + open + 1, line_start + close))
        };
    }

    let (open, close) = matching_pair(obj)?;
    let mut depth = 0i32;
    let mut start = None;
    for (i, c) in text[..cursor].char_indices().rev() {
        if c == close {
            depth += 1;
        } else if c == open {
            if depth == 0 {
                start = Some(i);
                break;
            }
            depth -= 1;
        }
    }
    let start = start?;
    let mut depth = 0i32;
    let mut end = None;
    for (i, c) in text[cursor..].char_indices() {
        if c == open && i > 0 {
            depth += 1;
        } else if c == close {
            if depth == 0 {
                end = Some(cursor + i);
                break;
            }
            depth -= 1;
        }
    }
    let end = end?;
    if around {
        Some((start, end + close.len_utf8()))
    } else {
        Some((start + open.len_utf8(), end))
    }
}

fn select_object(s: &mut EditSession, around: bool) -> bool {
    let Some(op) = s.vi.pending_op.take() else {
        s.set_keymap_internal("vicmd");
        return false;
    };
    let Some(obj) = s.read_char() else {
        s.set_keymap_internal("vicmd");
        return false;
    };
    match object_range(s, around, obj) {
        Some((start, end)) => s.apply_vi_operator(op, start, end),
        None => {
            s.set_keymap_internal("vicmd");
            false
        }
    }
}

pub(crate) fn vi_select_around(s: &mut EditSession) -> bool {
    select_object(s, true)
}

pub(crate) fn vi_select_inside(s: &mut EditSession) -> bool {
    select_object(s, false)
}

// --- visual mode ----------------------------------------------------------

pub(crate) fn visual_mode(s: &mut EditSession) -> bool {
    s.take_count();
    if s.keymap_name == "visual" {
        s.editor.clear_mark();
        s.set_keymap_internal("vicmd");
    } else {
        s.editor.set_mark_at_cursor(RegionType::Char);
        s.set_keymap_internal("visual");
    }
    true
}

pub(crate) fn visual_line_mode(s: &mut EditSession) -> bool {
    s.take_count();
    if s.keymap_name == "visual" && s.editor.line_buffer().region_type() == RegionType::Line {
        s.editor.clear_mark();
        s.set_keymap_internal("vicmd");
    } else {
        s.editor.set_mark_at_cursor(RegionType::Line);
        s.set_keymap_internal("visual");
    }
    true
}

fn visual_operate(s: &mut EditSession, op: ViOperator) -> bool {
    let Some(range) = s.editor.line_buffer().region_range() else {
        s.set_keymap_internal("vicmd");
        return false;
    };
    // Character-wise selections include the grapheme under the cursor
    let range = if s.editor.line_buffer().region_type() == RegionType::Char {
        let end = s.editor.line_buffer().grapheme_right_index_from(range.end);
        range.start..end.min(s.editor.line_buffer().len())
    } else {
        range
    };
    s.editor.clear_mark();
    s.apply_vi_operator(op, range.start, range.end)
}

pub(crate) fn vi_delete_visual(s: &mut EditSession) -> bool {
    s.take_count();
    visual_operate(s, ViOperator::Delete)
}

pub(crate) fn vi_yank_visual(s: &mut EditSession) -> bool {
    s.take_count();
    visual_operate(s, ViOperator::Yank)
}

pub(crate) fn vi_change_visual(s: &mut EditSession) -> bool {
    s.take_count();
    visual_operate(s, ViOperator::Change)
}

pub(crate) fn vi_swap_case_visual(s: &mut EditSession) -> bool {
    s.take_count();
    let Some(range) = s.editor.line_buffer().region_range() else {
        s.set_keymap_internal("vicmd");
        return false;
    };
    let swapped: String = s
        .editor
        .line_buffer()
        .substring(range.clone())
        .chars()
        .map(|c| {
            if c.is_uppercase() {
                c.to_lowercase().next().unwrap_or(c)
            } else {
                c.to_uppercase().next().unwrap_or(c)
            }
        })
        .collect();
    s.editor.replace_range(range.clone(), &swapped);
    s.editor.clear_mark();
    s.editor.move_to(range.start);
    s.set_keymap_internal("vicmd");
    true
}
